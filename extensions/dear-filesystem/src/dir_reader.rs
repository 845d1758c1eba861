use std::path::Path;

use crate::core::{EntryKind, FsError, SortOrder};
use crate::entry::{self, DirEntry};
use crate::filter::ExtensionFilter;
use crate::fs::FileSystem;
use crate::path;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Reads the visible entries of one kind from a real directory.
///
/// Hidden names (see [`entry::is_hidden_name`]) are skipped and `filter` is
/// applied to files only. The result is sorted by `order`, folded for
/// directories when the key does not apply to them.
pub fn read_entries(
    fs: &dyn FileSystem,
    dir: &str,
    kind: EntryKind,
    order: SortOrder,
    filter: Option<&ExtensionFilter>,
) -> Result<Vec<DirEntry>, FsError> {
    let raw = fs
        .read_dir(Path::new(dir))
        .map_err(|source| FsError::DirectoryUnreadable {
            path: dir.to_string(),
            source,
        })?;
    let want_dir = kind == EntryKind::Directory;
    let mut out: Vec<DirEntry> = raw
        .into_iter()
        .filter(|e| e.is_dir == want_dir && !entry::is_hidden_name(&e.name))
        .filter(|e| want_dir || filter.is_none_or(|f| f.matches(&e.name)))
        .map(|e| {
            let full = path::combine(dir, &e.name);
            DirEntry::new(e.name, full, kind)
                .with_size(if want_dir { None } else { e.size })
                .with_modified(e.modified)
        })
        .collect();
    entry::sort_entries(&mut out, order.for_kind(kind));
    trace_read(dir, kind, out.len());
    Ok(out)
}

/// Sorted subdirectories of `dir`; an unreadable directory lists as empty.
pub fn list_directories(fs: &dyn FileSystem, dir: &str, order: SortOrder) -> Vec<DirEntry> {
    read_entries(fs, dir, EntryKind::Directory, order, None).unwrap_or_else(|err| {
        trace_unreadable(&err);
        Vec::new()
    })
}

/// Sorted files of `dir` passing `filter`; an unreadable directory lists as
/// empty.
pub fn list_files(
    fs: &dyn FileSystem,
    dir: &str,
    order: SortOrder,
    filter: &ExtensionFilter,
) -> Vec<DirEntry> {
    read_entries(fs, dir, EntryKind::File, order, Some(filter)).unwrap_or_else(|err| {
        trace_unreadable(&err);
        Vec::new()
    })
}

#[cfg(feature = "tracing")]
fn trace_read(dir: &str, kind: EntryKind, entries: usize) {
    trace!(event = "dir.read", dir, ?kind, entries, "directory read");
}

#[cfg(not(feature = "tracing"))]
fn trace_read(_dir: &str, _kind: EntryKind, _entries: usize) {}

#[cfg(feature = "tracing")]
fn trace_unreadable(err: &FsError) {
    debug!(event = "dir.unreadable", error = %err, "listing degraded to empty");
}

#[cfg(not(feature = "tracing"))]
fn trace_unreadable(_err: &FsError) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SortBy;
    use crate::fs::memory::{MemoryFs, at};

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn sample() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_dir("/w/src")
            .add_dir("/w/Assets")
            .add_dir("/w/.git")
            .add_file_at("/w/a.png", b"1234", at(30))
            .add_file_at("/w/b.jpg", b"12", at(10))
            .add_file_at("/w/c.txt", b"123456", at(20))
            .add_file("/w/.hidden.png", b"")
            .add_file("/w/backup.png~", b"");
        fs
    }

    #[test]
    fn skips_hidden_and_backup_names() {
        let fs = sample();
        let dirs = list_directories(&fs, "/w", SortOrder::default());
        assert_eq!(names(&dirs), ["Assets", "src"]);
        let files = list_files(&fs, "/w", SortOrder::default(), &ExtensionFilter::default());
        assert_eq!(names(&files), ["a.png", "b.jpg", "c.txt"]);
        assert_eq!(files[0].path, "/w/a.png");
        assert_eq!(files[0].size, Some(4));
    }

    #[test]
    fn extension_filter_applies_to_files() {
        let fs = sample();
        let files = list_files(
            &fs,
            "/w",
            SortOrder::default(),
            &ExtensionFilter::wanted(".png;.jpg"),
        );
        assert_eq!(names(&files), ["a.png", "b.jpg"]);
    }

    #[test]
    fn file_sort_keys() {
        let fs = sample();
        let none = ExtensionFilter::default();
        let by_size = list_files(&fs, "/w", SortOrder::new(SortBy::Size, false), &none);
        assert_eq!(names(&by_size), ["c.txt", "a.png", "b.jpg"]);
        let by_time = list_files(&fs, "/w", SortOrder::new(SortBy::Modified, true), &none);
        assert_eq!(names(&by_time), ["b.jpg", "c.txt", "a.png"]);
    }

    #[test]
    fn directory_listing_folds_size_sort_to_name_keeping_direction() {
        let fs = sample();
        let dirs = list_directories(&fs, "/w", SortOrder::new(SortBy::Size, false));
        assert_eq!(names(&dirs), ["src", "Assets"]);
    }

    #[test]
    fn unreadable_directory_lists_empty_but_reports_through_read_entries() {
        let fs = sample();
        fs.mark_unreadable("/w");
        assert!(list_directories(&fs, "/w", SortOrder::default()).is_empty());
        let err = read_entries(&fs, "/w", EntryKind::File, SortOrder::default(), None).unwrap_err();
        assert!(matches!(err, FsError::DirectoryUnreadable { ref path, .. } if path == "/w"));
        assert!(list_files(&fs, "/missing", SortOrder::default(), &ExtensionFilter::default()).is_empty());
    }
}
