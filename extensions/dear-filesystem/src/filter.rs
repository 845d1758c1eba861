use crate::path;

/// Extension allow/deny lists applied to file listings.
///
/// Both lists are semicolon-separated on input (`".png;.jpg"`), matched
/// case-insensitively, and a missing leading dot is added (`"png"` equals
/// `".png"`). When the wanted list is non-empty it alone decides; otherwise
/// files whose extension is on the unwanted list are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
    wanted: Vec<String>,
    unwanted: Vec<String>,
}

fn parse_list(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let s = s.to_lowercase();
            if s.starts_with('.') { s } else { format!(".{s}") }
        })
        .collect()
}

impl ExtensionFilter {
    /// Parses semicolon-separated wanted and unwanted lists.
    pub fn parse(wanted: &str, unwanted: &str) -> Self {
        Self {
            wanted: parse_list(wanted),
            unwanted: parse_list(unwanted),
        }
    }

    /// Filter keeping only the given extensions.
    pub fn wanted(wanted: &str) -> Self {
        Self::parse(wanted, "")
    }

    /// Whether the filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty() && self.unwanted.is_empty()
    }

    /// Normalized wanted extensions (lower-case, dot included).
    pub fn wanted_extensions(&self) -> &[String] {
        &self.wanted
    }

    /// First wanted extension, used to complete save-file names.
    pub fn first_wanted(&self) -> Option<&str> {
        self.wanted.first().map(String::as_str)
    }

    /// Whether the extension (lower-case, dot included) is on the wanted list.
    pub fn is_wanted_extension(&self, ext: &str) -> bool {
        self.wanted.iter().any(|w| w == ext)
    }

    /// Whether a file called `name` passes the filter.
    pub fn matches(&self, name: &str) -> bool {
        let ext = path::extension(name);
        if !self.wanted.is_empty() {
            return self.is_wanted_extension(&ext);
        }
        !self.unwanted.iter().any(|u| *u == ext)
    }
}

/// Free-text filter typed in the dialog's filter box.
///
/// Comma-separated terms, each a case-insensitive substring. A term starting
/// with `-` excludes matching names. With at least one positive term a name
/// must contain one of them; with only exclusions everything else passes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameFilter {
    text: String,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl NameFilter {
    /// Parses the filter text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        for term in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match term.strip_prefix('-') {
                Some(rest) => {
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        exclude.push(rest.to_lowercase());
                    }
                }
                None => include.push(term.to_lowercase()),
            }
        }
        Self {
            text,
            include,
            exclude,
        }
    }

    /// Raw text as typed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether at least one term is in effect.
    pub fn is_active(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }

    /// Whether `name` passes.
    pub fn matches(&self, name: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        let lower = name.to_lowercase();
        if self.exclude.iter().any(|t| lower.contains(t.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|t| lower.contains(t.as_str()))
    }
}
