use crate::path;

fn join_segments(segments: &[String]) -> String {
    let mut out = String::new();
    for segment in segments {
        path::append(&mut out, segment);
    }
    out
}

/// A browsing position decomposed into breadcrumb segments.
///
/// `full_path` is the deepest path known for this position and `current` the
/// path of the selected segment, so stepping back to a parent through the
/// breadcrumbs keeps the deeper segments visible. When the path crosses into
/// an archive, the archive segment index records where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    full_path: String,
    current: String,
    segments: Vec<String>,
    selected: usize,
    archive_segment: Option<usize>,
}

impl Location {
    /// Location at `path`, with the archive segment found by extension.
    pub fn from_path(path: &str) -> Self {
        let segments = path::split(path, true);
        let archive_segment = segments.iter().position(|s| {
            let label = path::segment_label(s);
            label.len() > path::ARCHIVE_EXTENSION.len() && path::has_archive_extension(label)
        });
        Self::build(segments, archive_segment)
    }

    /// Location at `path` inside the archive file `archive_base` (a prefix of
    /// `path`), or a plain location when `archive_base` is `None`.
    pub fn new(path: &str, archive_base: Option<&str>) -> Self {
        let segments = path::split(path, true);
        let archive_segment = archive_base
            .map(|base| path::split(base, true).len().saturating_sub(1))
            .filter(|i| *i < segments.len());
        Self::build(segments, archive_segment)
    }

    fn build(segments: Vec<String>, archive_segment: Option<usize>) -> Self {
        let full_path = join_segments(&segments);
        Self {
            current: full_path.clone(),
            full_path,
            selected: segments.len().saturating_sub(1),
            segments,
            archive_segment,
        }
    }

    /// Path of the selected segment.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Deepest path known for this location.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Breadcrumb segments of [`Location::full_path`]; all but the last keep
    /// a trailing separator.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments formatted for display.
    pub fn segment_labels(&self) -> Vec<&str> {
        self.segments.iter().map(|s| path::segment_label(s)).collect()
    }

    /// Index of the selected segment.
    pub fn selected_segment(&self) -> usize {
        self.selected
    }

    /// Index of the archive segment, reported only while the selected segment
    /// is at or below it.
    pub fn archive_segment(&self) -> Option<usize> {
        self.archive_segment.filter(|i| *i <= self.selected)
    }

    /// Whether the current path lies inside an archive.
    pub fn is_inside_archive(&self) -> bool {
        self.archive_segment().is_some()
    }

    /// Path of the archive file, while inside one.
    pub fn archive_path(&self) -> Option<String> {
        self.archive_segment()
            .map(|i| join_segments(&self.segments[..=i]))
    }

    /// Path inside the archive (no leading separator, `""` for the archive
    /// root), while inside one.
    pub fn archive_inner(&self) -> Option<String> {
        self.archive_segment().map(|i| {
            self.segments[i + 1..=self.selected]
                .iter()
                .map(|s| path::segment_label(s))
                .collect::<Vec<_>>()
                .join("/")
        })
    }

    /// Nearest real directory: the directory holding the archive when inside
    /// one, the current path otherwise.
    pub fn real_directory(&self) -> String {
        match self.archive_path() {
            Some(archive) => path::directory_name(&archive),
            None => self.current.clone(),
        }
    }

    /// Segment index whose recombined prefix equals `target`, if any.
    pub fn segment_index_for(&self, target: &str) -> Option<usize> {
        let wanted = path::unify_separators(path::trim_trailing_separators(target));
        let mut acc = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            path::append(&mut acc, segment);
            if acc == wanted {
                return Some(i);
            }
        }
        None
    }

    /// Same known path with a different segment selected; `None` when out of
    /// range.
    pub fn for_segment(&self, index: usize) -> Option<Self> {
        if index >= self.segments.len() {
            return None;
        }
        Some(Self {
            current: join_segments(&self.segments[..=index]),
            full_path: self.full_path.clone(),
            segments: self.segments.clone(),
            selected: index,
            archive_segment: self.archive_segment,
        })
    }

    /// Whether both locations point at the same current path.
    pub fn is_same_place(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_into_segments() {
        let loc = Location::from_path("/home/me/docs/");
        assert_eq!(loc.full_path(), "/home/me/docs");
        assert_eq!(loc.current(), "/home/me/docs");
        assert_eq!(loc.segment_labels(), ["/", "home", "me", "docs"]);
        assert_eq!(loc.selected_segment(), 3);
        assert_eq!(loc.archive_segment(), None);
        assert_eq!(loc.real_directory(), "/home/me/docs");
    }

    #[test]
    fn selecting_a_parent_segment_keeps_the_full_path() {
        let loc = Location::from_path("/home/me/docs");
        let parent = loc.for_segment(1).unwrap();
        assert_eq!(parent.current(), "/home");
        assert_eq!(parent.full_path(), "/home/me/docs");
        assert_eq!(parent.segment_index_for("/home/me"), Some(2));
        assert_eq!(loc.for_segment(0).unwrap().current(), "/");
        assert!(loc.for_segment(4).is_none());
        assert_eq!(loc.segment_index_for("/home/other"), None);
    }

    #[test]
    fn archive_segment_only_reported_when_crossed() {
        let loc = Location::new("/data/bundle.zip/docs", Some("/data/bundle.zip"));
        assert_eq!(loc.archive_segment(), Some(2));
        assert!(loc.is_inside_archive());
        assert_eq!(loc.archive_path().as_deref(), Some("/data/bundle.zip"));
        assert_eq!(loc.archive_inner().as_deref(), Some("docs"));
        assert_eq!(loc.real_directory(), "/data");

        let at_root = loc.for_segment(2).unwrap();
        assert_eq!(at_root.archive_inner().as_deref(), Some(""));

        let outside = loc.for_segment(1).unwrap();
        assert_eq!(outside.archive_segment(), None);
        assert!(!outside.is_inside_archive());
        assert_eq!(outside.real_directory(), "/data");
    }

    #[test]
    fn extension_based_detection_matches_explicit_base() {
        let a = Location::from_path("/data/bundle.zip/docs/img");
        let b = Location::new("/data/bundle.zip/docs/img", Some("/data/bundle.zip"));
        assert_eq!(a, b);
        assert_eq!(a.archive_inner().as_deref(), Some("docs/img"));
    }
}
