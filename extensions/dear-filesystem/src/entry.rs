use std::cmp::Ordering;
use std::time::SystemTime;

use crate::core::{EntryKind, SortBy, SortOrder};
use crate::path;

/// One listed directory or file, real or inside an archive.
///
/// Entries are rebuilt on every rescan and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Final path segment, case preserved
    pub name: String,
    /// Full path (archive entries use `<archive>/<inner>`)
    pub path: String,
    /// Directory or file
    pub kind: EntryKind,
    /// Size in bytes (files only)
    pub size: Option<u64>,
    /// Last modification time, when known
    pub modified: Option<SystemTime>,
    /// Lower-cased extension with dot, `""` if none
    pub extension: String,
    /// Encrypted archive entry
    pub encrypted: bool,
    /// File carrying the archive extension, browsable as a directory
    pub is_archive: bool,
}

impl DirEntry {
    /// Builds an entry, deriving `extension` and `is_archive` from `name`.
    pub fn new(name: impl Into<String>, full_path: impl Into<String>, kind: EntryKind) -> Self {
        let name = name.into();
        let (extension, is_archive) = match kind {
            EntryKind::File => (path::extension(&name), path::has_archive_extension(&name)),
            EntryKind::Directory => (String::new(), false),
        };
        Self {
            name,
            path: full_path.into(),
            kind,
            size: None,
            modified: None,
            extension,
            encrypted: false,
            is_archive,
        }
    }

    /// Sets the size.
    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// Sets the modification time.
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    /// Marks the entry as encrypted.
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Whether this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Name shown to the user; encrypted entries get a `*` suffix.
    pub fn display_name(&self) -> String {
        if self.encrypted {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Returns whether a directory entry name is hidden from listings
/// (dotfiles and editor backups ending in `~`).
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') || name.ends_with('~')
}

fn primary(a: &DirEntry, b: &DirEntry, by: SortBy) -> Ordering {
    match by {
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortBy::Modified => a.modified.cmp(&b.modified),
        SortBy::Size => a.size.unwrap_or(0).cmp(&b.size.unwrap_or(0)),
        SortBy::Extension => a.extension.cmp(&b.extension),
    }
}

/// Sorts entries in place.
///
/// The primary key follows `order`; ties fall back to the case-insensitive
/// name and then the full path, both ascending, so equal keys still sort
/// deterministically.
pub fn sort_entries(entries: &mut [DirEntry], order: SortOrder) {
    entries.sort_by(|a, b| {
        let p = primary(a, b, order.by);
        let p = if order.ascending { p } else { p.reverse() };
        p.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.path.cmp(&b.path))
    });
}
