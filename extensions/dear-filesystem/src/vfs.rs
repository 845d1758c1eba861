//! One interface over real directories and ZIP archive contents.

use std::path::Path;

use crate::archive::{self, ArchiveHandle};
use crate::core::{EntryKind, FsError, KindFilter, SortOrder};
use crate::dir_reader;
use crate::entry::DirEntry;
use crate::filter::ExtensionFilter;
use crate::fs::{FileSystem, StdFileSystem};
use crate::location::Location;
use crate::path;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// What to list at a location.
#[derive(Clone, Copy, Debug)]
pub struct ListRequest<'a> {
    /// Sort order (folded for directories)
    pub order: SortOrder,
    /// Whether files are listed at all
    pub include_files: bool,
    /// Extension filter applied to files
    pub extensions: Option<&'a ExtensionFilter>,
}

impl Default for ListRequest<'_> {
    fn default() -> Self {
        Self {
            order: SortOrder::default(),
            include_files: true,
            extensions: None,
        }
    }
}

/// Directories and files found at a location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    /// Subdirectories
    pub directories: Vec<DirEntry>,
    /// Files (empty when not requested)
    pub files: Vec<DirEntry>,
}

/// Real filesystem plus at most one open archive.
///
/// Opening a different archive closes the previous one first; listing a real
/// directory closes the open archive.
pub struct VirtualFilesystem {
    fs: Box<dyn FileSystem>,
    archive: Option<ArchiveHandle>,
}

impl std::fmt::Debug for VirtualFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFilesystem")
            .field("archive", &self.archive)
            .finish_non_exhaustive()
    }
}

impl Default for VirtualFilesystem {
    fn default() -> Self {
        Self::new(StdFileSystem)
    }
}

/// Archive file and inner path of `path`, when `path` crosses into an
/// existing archive file.
fn archive_target(fs: &dyn FileSystem, path: &str) -> Option<(String, String)> {
    let split = archive::split_first_archive_segment_with(fs, path, true);
    if !split.found {
        return None;
    }
    let is_file = fs
        .metadata(Path::new(&split.base))
        .map(|m| m.is_file)
        .unwrap_or(false);
    is_file.then(|| (split.base, archive::normalize_inner(&split.inner)))
}

/// Lexically collapsed form of `path` when it crosses into an archive and
/// contains `..`; the OS cannot resolve such paths itself.
fn collapse_archive_parents(fs: &dyn FileSystem, path: &str) -> Option<String> {
    let has_parent = path.split(path::is_separator).any(|s| s == "..");
    (has_parent && archive::split_first_archive_segment_with(fs, path, false).found)
        .then(|| path::normalize(path))
}

impl VirtualFilesystem {
    /// Virtual filesystem over `fs`.
    pub fn new(fs: impl FileSystem + 'static) -> Self {
        Self {
            fs: Box::new(fs),
            archive: None,
        }
    }

    /// Underlying filesystem.
    pub fn filesystem(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Currently open archive.
    pub fn archive(&self) -> Option<&ArchiveHandle> {
        self.archive.as_ref()
    }

    /// Closes the open archive, if any.
    pub fn close_archive(&mut self) {
        if let Some(handle) = self.archive.take() {
            trace_archive_closed(handle.path());
        }
    }

    fn ensure_archive(&mut self, archive_path: &str) -> Result<&mut ArchiveHandle, FsError> {
        let reuse = self
            .archive
            .as_ref()
            .is_some_and(|a| a.path() == archive_path);
        if !reuse {
            self.close_archive();
            let handle = ArchiveHandle::open(self.fs.as_ref(), archive_path)?;
            self.archive = Some(handle);
        }
        self.archive
            .as_mut()
            .ok_or(FsError::UnsupportedOperation("archive not open"))
    }

    /// Resolves `path` (empty means the working directory) to a browsable
    /// location.
    ///
    /// Real paths must name an existing directory. Paths crossing into an
    /// archive need the archive to be a readable file and the inner path to
    /// be a directory inside it.
    pub fn resolve(&mut self, path: &str) -> Result<Location, FsError> {
        let path = path.trim();
        let collapsed = collapse_archive_parents(self.fs.as_ref(), path);
        let path = collapsed.as_deref().unwrap_or(path);
        if let Some((base, inner)) = archive_target(self.fs.as_ref(), path) {
            let handle = self.ensure_archive(&base)?;
            if !handle.exists(&inner, KindFilter::Directories) {
                return Err(FsError::ArchiveEntryNotFound {
                    archive: base,
                    entry: inner,
                });
            }
            let full = if inner.is_empty() {
                base.clone()
            } else {
                path::combine(&base, &inner)
            };
            trace_resolved(path, &full);
            return Ok(Location::new(&full, Some(&base)));
        }

        let abs = path::absolute_path_with(self.fs.as_ref(), path)?;
        let meta = self
            .fs
            .metadata(Path::new(&abs))
            .map_err(|source| FsError::PathResolution {
                path: path.to_string(),
                source,
            })?;
        if !meta.is_dir {
            return Err(FsError::InvalidPath(format!("not a directory: {abs}")));
        }
        trace_resolved(path, &abs);
        Ok(Location::new(&abs, None))
    }

    /// Resolves `path`, walking up to the nearest ancestor that resolves and
    /// finally to the working directory.
    ///
    /// A broken archive is skipped by continuing from the directory that
    /// holds it.
    pub fn resolve_nearest(&mut self, path: &str) -> Location {
        let mut candidate = path.trim().to_string();
        while !candidate.is_empty() {
            match self.resolve(&candidate) {
                Ok(loc) => return loc,
                Err(err) => trace_resolve_failed(&candidate, &err),
            }
            let parent = path::directory_name(&candidate);
            if parent == candidate {
                break;
            }
            candidate = parent;
        }
        match self.resolve("") {
            Ok(loc) => loc,
            Err(err) => {
                trace_resolve_failed("", &err);
                Location::new(&path::SEPARATOR.to_string(), None)
            }
        }
    }

    /// Lists `location`.
    ///
    /// Inside an archive the entries come from the archive's index; otherwise
    /// the open archive is closed and the real directory is read.
    pub fn list(&mut self, location: &Location, request: ListRequest<'_>) -> Result<Listing, FsError> {
        let wants_files = request.include_files;
        if let (Some(base), Some(inner)) = (location.archive_path(), location.archive_inner()) {
            let handle = self.ensure_archive(&base)?;
            let directories = handle.list_entries(&inner, EntryKind::Directory, request.order)?;
            let mut files = if wants_files {
                handle.list_entries(&inner, EntryKind::File, request.order)?
            } else {
                Vec::new()
            };
            if let Some(filter) = request.extensions {
                files.retain(|f| filter.matches(&f.name));
            }
            return Ok(Listing { directories, files });
        }

        self.close_archive();
        let dir = location.current();
        let fs = self.fs.as_ref();
        let directories = dir_reader::read_entries(fs, dir, EntryKind::Directory, request.order, None)?;
        let files = if wants_files {
            dir_reader::read_entries(fs, dir, EntryKind::File, request.order, request.extensions)?
        } else {
            Vec::new()
        };
        Ok(Listing { directories, files })
    }

    /// Whether `path` exists with a kind accepted by `filter`, looking inside
    /// archives when the path crosses into one.
    pub fn exists(&mut self, path: &str, filter: KindFilter) -> bool {
        if let Some((base, inner)) = archive_target(self.fs.as_ref(), path) {
            return match self.ensure_archive(&base) {
                Ok(handle) => handle.exists(&inner, filter),
                Err(_) => inner.is_empty() && filter.accepts(EntryKind::File),
            };
        }
        match self.fs.metadata(Path::new(path)) {
            Ok(m) if m.is_dir => filter.accepts(EntryKind::Directory),
            Ok(m) if m.is_file => filter.accepts(EntryKind::File),
            _ => false,
        }
    }

    /// Creates the real directory `path`.
    pub fn create_directory(&mut self, path: &str) -> Result<(), FsError> {
        if archive_target(self.fs.as_ref(), path).is_some() {
            return Err(FsError::UnsupportedOperation(
                "cannot create directories inside an archive",
            ));
        }
        if self.fs.metadata(Path::new(path)).is_ok() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        self.fs.create_dir(Path::new(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
            _ => FsError::Io(e),
        })?;
        trace_directory_created(path);
        Ok(())
    }

    /// Reads a real file or a file inside an archive.
    pub fn read_file(&mut self, path: &str, password: Option<&str>) -> Result<Vec<u8>, FsError> {
        if let Some((base, inner)) = archive_target(self.fs.as_ref(), path) {
            return self.ensure_archive(&base)?.read_file(&inner, password);
        }
        Ok(self.fs.read_file(Path::new(path))?)
    }
}

#[cfg(feature = "tracing")]
fn trace_resolved(input: &str, resolved: &str) {
    trace!(event = "vfs.resolve", input, resolved, "path resolved");
}

#[cfg(not(feature = "tracing"))]
fn trace_resolved(_input: &str, _resolved: &str) {}

#[cfg(feature = "tracing")]
fn trace_resolve_failed(input: &str, err: &FsError) {
    debug!(event = "vfs.resolve_failed", input, error = %err, "path did not resolve");
}

#[cfg(not(feature = "tracing"))]
fn trace_resolve_failed(_input: &str, _err: &FsError) {}

#[cfg(feature = "tracing")]
fn trace_archive_closed(path: &str) {
    trace!(event = "vfs.archive_closed", path, "archive closed");
}

#[cfg(not(feature = "tracing"))]
fn trace_archive_closed(_path: &str) {}

#[cfg(feature = "tracing")]
fn trace_directory_created(path: &str) {
    debug!(event = "vfs.mkdir", path, "directory created");
}

#[cfg(not(feature = "tracing"))]
fn trace_directory_created(_path: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFs;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut w = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in files {
            if name.ends_with('/') {
                w.add_directory(*name, opts).unwrap();
            } else {
                w.start_file(*name, opts).unwrap();
                w.write_all(data).unwrap();
            }
        }
        w.finish().unwrap().into_inner()
    }

    fn vfs() -> VirtualFilesystem {
        let fs = MemoryFs::new();
        fs.add_dir("/data/sub")
            .add_file("/data/a.png", b"a")
            .add_file("/data/b.txt", b"b")
            .add_file(
                "/data/bundle.zip",
                &zip_bytes(&[
                    ("docs/", b""),
                    ("docs/img/", b""),
                    ("docs/readme.txt", b"read me"),
                    ("docs/pic.png", b"png"),
                ]),
            )
            .add_file("/data/other.zip", &zip_bytes(&[("x.txt", b"x")]))
            .add_file("/data/broken.zip", b"garbage");
        VirtualFilesystem::new(fs)
    }

    fn names(v: &[DirEntry]) -> Vec<&str> {
        v.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn resolves_real_and_archive_paths() {
        let mut v = vfs();
        let real = v.resolve("/data/sub/").unwrap();
        assert_eq!(real.current(), "/data/sub");
        assert!(!real.is_inside_archive());

        let inside = v.resolve("/data/bundle.zip/docs").unwrap();
        assert_eq!(inside.current(), "/data/bundle.zip/docs");
        assert_eq!(inside.archive_segment(), Some(2));
        assert_eq!(v.archive().map(|a| a.path()), Some("/data/bundle.zip"));

        assert!(matches!(
            v.resolve("/data/bundle.zip/docs/readme.txt"),
            Err(FsError::ArchiveEntryNotFound { .. })
        ));
        assert!(matches!(v.resolve("/data/a.png"), Err(FsError::InvalidPath(_))));
        assert!(matches!(v.resolve("/nope"), Err(FsError::PathResolution { .. })));
    }

    #[test]
    fn parent_segments_collapse_inside_archives() {
        let mut v = vfs();
        let img = v.resolve("/data/bundle.zip/docs/img/../../docs/./img").unwrap();
        assert_eq!(img.current(), "/data/bundle.zip/docs/img");
        assert!(img.is_inside_archive());

        let root = v.resolve("/data/bundle.zip/docs/..").unwrap();
        assert_eq!(root.current(), "/data/bundle.zip");
        assert!(root.is_inside_archive());

        let out = v.resolve("/data/bundle.zip/docs/../..").unwrap();
        assert_eq!(out.current(), "/data");
        assert!(!out.is_inside_archive());
    }

    #[test]
    fn lists_archive_directories_with_extension_filter() {
        let mut v = vfs();
        let loc = v.resolve("/data/bundle.zip/docs").unwrap();
        let filter = ExtensionFilter::wanted(".txt");
        let listing = v
            .list(
                &loc,
                ListRequest {
                    extensions: Some(&filter),
                    ..ListRequest::default()
                },
            )
            .unwrap();
        assert_eq!(names(&listing.directories), ["img"]);
        assert_eq!(names(&listing.files), ["readme.txt"]);
    }

    #[test]
    fn listing_a_real_directory_closes_the_archive() {
        let mut v = vfs();
        v.resolve("/data/bundle.zip").unwrap();
        assert!(v.archive().is_some());
        let loc = v.resolve("/data").unwrap();
        let listing = v.list(&loc, ListRequest::default()).unwrap();
        assert!(v.archive().is_none());
        assert_eq!(names(&listing.directories), ["sub"]);
        assert_eq!(
            names(&listing.files),
            ["a.png", "b.txt", "broken.zip", "bundle.zip", "other.zip"]
        );
        assert!(listing.files[3].is_archive);
    }

    #[test]
    fn opening_another_archive_replaces_the_handle() {
        let mut v = vfs();
        v.resolve("/data/bundle.zip").unwrap();
        v.resolve("/data/other.zip").unwrap();
        assert_eq!(v.archive().map(|a| a.path()), Some("/data/other.zip"));
    }

    #[test]
    fn nearest_resolution_skips_broken_archives() {
        let mut v = vfs();
        let loc = v.resolve_nearest("/data/broken.zip/inner");
        assert_eq!(loc.current(), "/data");
        let loc = v.resolve_nearest("/data/sub/missing/deeper");
        assert_eq!(loc.current(), "/data/sub");
    }

    #[test]
    fn existence_checks_cross_into_archives() {
        let mut v = vfs();
        assert!(v.exists("/data/bundle.zip/docs/readme.txt", KindFilter::Files));
        assert!(!v.exists("/data/bundle.zip/docs/readme.txt", KindFilter::Directories));
        assert!(v.exists("/data/bundle.zip", KindFilter::Directories));
        assert!(v.exists("/data/sub", KindFilter::Directories));
        assert!(!v.exists("/data/sub", KindFilter::Files));
        assert!(!v.exists("/data/none", KindFilter::Any));
    }

    #[test]
    fn directory_creation_rules() {
        let mut v = vfs();
        assert!(matches!(
            v.create_directory("/data/bundle.zip/new"),
            Err(FsError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            v.create_directory("/data/sub"),
            Err(FsError::AlreadyExists(_))
        ));
        v.create_directory("/data/fresh").unwrap();
        assert!(v.exists("/data/fresh", KindFilter::Directories));
    }

    #[test]
    fn reads_files_transparently() {
        let mut v = vfs();
        assert_eq!(v.read_file("/data/b.txt", None).unwrap(), b"b");
        assert_eq!(
            v.read_file("/data/bundle.zip/docs/readme.txt", None).unwrap(),
            b"read me"
        );
        assert!(v.read_file("/data/missing.txt", None).is_err());
    }
}
