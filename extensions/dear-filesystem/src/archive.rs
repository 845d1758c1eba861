//! Read-only ZIP browsing.
//!
//! An [`ArchiveHandle`] decodes the central directory once on open and keeps
//! a table of entry records keyed by their normalized inner path (`/`
//! separated, no leading or trailing separator). Listings and existence
//! checks are answered from that table; only [`ArchiveHandle::read_file`]
//! touches the decoder again.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::core::{EntryKind, FsError, KindFilter, SortOrder};
use crate::entry::{self, DirEntry};
use crate::fs::{FileSystem, ReadSeek, StdFileSystem};
use crate::path::{self, ARCHIVE_EXTENSION, is_separator};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

#[derive(Clone, Debug)]
struct ArchiveRecord {
    kind: EntryKind,
    size: u64,
    modified: Option<SystemTime>,
    encrypted: bool,
    /// `None` for directories implied by deeper entries
    index: Option<usize>,
}

/// An opened ZIP archive.
pub struct ArchiveHandle {
    path: String,
    archive: ZipArchive<Box<dyn ReadSeek>>,
    records: IndexMap<String, ArchiveRecord>,
}

impl fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("path", &self.path)
            .field("entries", &self.records.len())
            .finish()
    }
}

/// Normalizes an inner archive path: unified separators, no leading or
/// trailing separators, empty and `.` segments dropped, `..` collapsed
/// (never above the archive root).
pub fn normalize_inner(inner: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for segment in inner.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            s => kept.push(s),
        }
    }
    kept.join("/")
}

fn parent_of(inner: &str) -> &str {
    match inner.rfind('/') {
        Some(i) => &inner[..i],
        None => "",
    }
}

fn dos_time_to_system(dt: zip::DateTime) -> Option<SystemTime> {
    let year = dt.year() as i64;
    let month = dt.month() as i64;
    let day = dt.day() as i64;
    // Days from the Unix epoch, civil calendar.
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 { month + 9 } else { month - 3 };
    let c = y / 100;
    let ya = y - 100 * c;
    let days = (146097 * c) / 4 + (1461 * ya) / 4 + (153 * m + 2) / 5 + day - 719469;
    let secs = days * 86400 + dt.hour() as i64 * 3600 + dt.minute() as i64 * 60 + dt.second() as i64;
    u64::try_from(secs)
        .ok()
        .and_then(|s| SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(s)))
}

impl ArchiveHandle {
    /// Opens the archive at `path` through `fs` and indexes its entries.
    pub fn open(fs: &dyn FileSystem, path: &str) -> Result<Self, FsError> {
        let open_err = |reason: String| FsError::ArchiveOpen {
            path: path.to_string(),
            reason,
        };
        let reader = fs.open_file(Path::new(path)).map_err(|e| open_err(e.to_string()))?;
        let mut archive = ZipArchive::new(reader).map_err(|e| open_err(e.to_string()))?;

        let mut records: IndexMap<String, ArchiveRecord> = IndexMap::new();
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i).map_err(|e| open_err(e.to_string()))?;
            let raw_name = file.name().replace('\\', "/");
            let name = normalize_inner(&raw_name);
            if name.is_empty() {
                continue;
            }
            let trailing = raw_name.ends_with('/');
            let kind = if trailing && file.size() == 0 && file.compressed_size() == 0 {
                EntryKind::Directory
            } else if trailing {
                // Directory-shaped name carrying data: not browsable either way.
                continue;
            } else {
                EntryKind::File
            };

            let mut parent = parent_of(&name);
            while !parent.is_empty() {
                records
                    .entry(parent.to_string())
                    .or_insert(ArchiveRecord {
                        kind: EntryKind::Directory,
                        size: 0,
                        modified: None,
                        encrypted: false,
                        index: None,
                    });
                parent = parent_of(parent);
            }

            records.insert(
                name,
                ArchiveRecord {
                    kind,
                    size: if kind == EntryKind::File { file.size() } else { 0 },
                    modified: file.last_modified().and_then(dos_time_to_system),
                    encrypted: file.encrypted(),
                    index: Some(i),
                },
            );
        }

        let handle = Self {
            path: path.to_string(),
            archive,
            records,
        };
        trace_archive_opened(&handle.path, handle.entry_count());
        Ok(handle)
    }

    /// Path of the archive file itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of indexed entries, implied directories included.
    pub fn entry_count(&self) -> usize {
        self.records.len()
    }

    fn directory_exists(&self, inner: &str) -> bool {
        inner.is_empty()
            || self
                .records
                .get(inner)
                .is_some_and(|r| r.kind == EntryKind::Directory)
    }

    /// Immediate children of the archive directory `inner` of one kind,
    /// sorted by `order`. The empty inner path is the archive root.
    pub fn list_entries(
        &self,
        inner: &str,
        kind: EntryKind,
        order: SortOrder,
    ) -> Result<Vec<DirEntry>, FsError> {
        let dir = normalize_inner(inner);
        if !self.directory_exists(&dir) {
            return Err(FsError::ArchiveEntryNotFound {
                archive: self.path.clone(),
                entry: dir,
            });
        }
        let mut out: Vec<DirEntry> = self
            .records
            .iter()
            .filter(|(name, rec)| rec.kind == kind && parent_of(name) == dir)
            .map(|(name, rec)| {
                DirEntry::new(path::file_name(name), path::combine(&self.path, name), kind)
                    .with_size((kind == EntryKind::File).then_some(rec.size))
                    .with_modified(rec.modified)
                    .with_encrypted(rec.encrypted)
            })
            .collect();
        entry::sort_entries(&mut out, order.for_kind(kind));
        Ok(out)
    }

    /// Whether `inner` names an entry accepted by `filter`. The empty inner
    /// path is the archive root directory.
    pub fn exists(&self, inner: &str, filter: KindFilter) -> bool {
        let inner = normalize_inner(inner);
        if inner.is_empty() {
            return filter.accepts(EntryKind::Directory);
        }
        self.records.get(&inner).is_some_and(|r| filter.accepts(r.kind))
    }

    /// Recorded uncompressed size of the file `inner`.
    pub fn file_size(&self, inner: &str) -> Option<u64> {
        self.records
            .get(&normalize_inner(inner))
            .filter(|r| r.kind == EntryKind::File)
            .map(|r| r.size)
    }

    /// Extracts the file `inner`.
    ///
    /// Encrypted entries need `password`. A decoded length that differs from
    /// the recorded size is an error.
    pub fn read_file(&mut self, inner: &str, password: Option<&str>) -> Result<Vec<u8>, FsError> {
        let name = normalize_inner(inner);
        let (index, expected) = match self.records.get(&name) {
            Some(ArchiveRecord {
                kind: EntryKind::File,
                index: Some(index),
                size,
                ..
            }) => (*index, *size),
            _ => {
                return Err(FsError::ArchiveEntryNotFound {
                    archive: self.path.clone(),
                    entry: name,
                });
            }
        };
        let read_err = |reason: String| FsError::ArchiveRead {
            archive: self.path.clone(),
            entry: name.clone(),
            reason,
        };

        let opened = match password {
            Some(pw) => self.archive.by_index_decrypt(index, pw.as_bytes()),
            None => self.archive.by_index(index),
        };
        let mut file = match opened {
            Ok(file) => file,
            Err(ZipError::InvalidPassword) => return Err(read_err("invalid password".into())),
            Err(e) => return Err(read_err(e.to_string())),
        };
        // Recorded sizes are untrusted: read at most one byte past them.
        let mut data = Vec::new();
        (&mut file)
            .take(expected.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| read_err(e.to_string()))?;
        drop(file);

        if data.len() as u64 != expected {
            return Err(read_err(format!(
                "decoded {} bytes, expected {expected}",
                data.len()
            )));
        }
        trace_archive_read(&self.path, &name, data.len());
        Ok(data)
    }
}

/// Result of [`split_first_archive_segment`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveSplit {
    /// Path up to and including the archive segment, or the whole input when
    /// no archive segment exists
    pub base: String,
    /// Remainder inside the archive, without leading separators
    pub inner: String,
    /// Whether an archive segment was found
    pub found: bool,
}

/// Splits `path` at its first segment (left to right) ending in
/// [`ARCHIVE_EXTENSION`], resolving the base through `fs` when
/// `resolve_base` is set.
pub fn split_first_archive_segment_with(
    fs: &dyn FileSystem,
    path: &str,
    resolve_base: bool,
) -> ArchiveSplit {
    let resolve = |base: &str| {
        if resolve_base {
            path::absolute_path_or_normalized(fs, base)
        } else {
            base.to_string()
        }
    };
    let mut start = 0;
    for (i, c) in path.char_indices().chain(std::iter::once((path.len(), '/'))) {
        if !is_separator(c) {
            continue;
        }
        let segment = &path[start..i];
        if segment.len() > ARCHIVE_EXTENSION.len() && path::has_archive_extension(segment) {
            return ArchiveSplit {
                base: resolve(&path[..i]),
                inner: path[i..].trim_start_matches(is_separator).to_string(),
                found: true,
            };
        }
        start = i + 1;
    }
    ArchiveSplit {
        base: resolve(path),
        inner: String::new(),
        found: false,
    }
}

/// [`split_first_archive_segment_with`] on the OS filesystem.
pub fn split_first_archive_segment(path: &str, resolve_base: bool) -> ArchiveSplit {
    split_first_archive_segment_with(&StdFileSystem, path, resolve_base)
}

#[cfg(feature = "tracing")]
fn trace_archive_opened(path: &str, entries: usize) {
    debug!(event = "archive.opened", path, entries, "archive opened");
}

#[cfg(not(feature = "tracing"))]
fn trace_archive_opened(_path: &str, _entries: usize) {}

#[cfg(feature = "tracing")]
fn trace_archive_read(path: &str, entry: &str, bytes: usize) {
    trace!(event = "archive.read", path, entry, bytes, "archive entry extracted");
}

#[cfg(not(feature = "tracing"))]
fn trace_archive_read(_path: &str, _entry: &str, _bytes: usize) {}
