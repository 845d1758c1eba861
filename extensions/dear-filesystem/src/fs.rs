use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Minimal metadata used by the navigation core.
#[derive(Clone, Debug)]
pub struct FsMetadata {
    /// Whether the path refers to a directory (symlinks followed).
    pub is_dir: bool,
    /// Whether the path refers to a regular file (symlinks followed).
    pub is_file: bool,
}

/// Directory entry returned by [`FileSystem::read_dir`].
#[derive(Clone, Debug)]
pub struct FsEntry {
    /// Base name (no parent path)
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Whether this entry is a directory (symlinks followed).
    pub is_dir: bool,
    /// File size in bytes (files only; `None` for directories or when unavailable).
    pub size: Option<u64>,
    /// Last modified timestamp (when available).
    pub modified: Option<std::time::SystemTime>,
}

/// Readable and seekable byte source, the shape archive decoders need.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// File system abstraction.
///
/// Everything the navigation core touches on disk goes through this trait,
/// so readers, the virtual filesystem and dialog sessions can be driven by an
/// in-memory implementation.
pub trait FileSystem {
    /// List entries of a directory.
    fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<FsEntry>>;
    /// Canonicalize a path (resolves `.`, `..` and symlinks).
    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf>;
    /// Fetch minimal metadata for a path.
    fn metadata(&self, path: &Path) -> std::io::Result<FsMetadata>;
    /// Create a directory.
    fn create_dir(&self, path: &Path) -> std::io::Result<()>;
    /// Open a file for reading.
    fn open_file(&self, path: &Path) -> std::io::Result<Box<dyn ReadSeek>>;
    /// Read a whole file.
    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.open_file(path)?.read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Default filesystem implementation using `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_dir(&self, dir: &Path) -> std::io::Result<Vec<FsEntry>> {
        let mut out = Vec::new();
        let rd = std::fs::read_dir(dir)?;
        for e in rd {
            let e = match e {
                Ok(v) => v,
                Err(_) => continue,
            };
            let ft = match e.file_type() {
                Ok(v) => v,
                Err(_) => continue,
            };
            let name = e.file_name().to_string_lossy().to_string();
            let path = e.path();
            // Follow links so a link to a directory browses like one.
            let meta = if ft.is_symlink() {
                std::fs::metadata(&path).ok()
            } else {
                e.metadata().ok()
            };
            let Some(meta) = meta else {
                continue;
            };
            let is_dir = meta.is_dir();
            if !is_dir && !meta.is_file() {
                continue;
            }
            out.push(FsEntry {
                name,
                path,
                is_dir,
                size: (!is_dir).then(|| meta.len()),
                modified: meta.modified().ok(),
            });
        }
        Ok(out)
    }

    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn metadata(&self, path: &Path) -> std::io::Result<FsMetadata> {
        let md = std::fs::metadata(path)?;
        Ok(FsMetadata {
            is_dir: md.is_dir(),
            is_file: md.is_file(),
        })
    }

    fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir(path)
    }

    fn open_file(&self, path: &Path) -> std::io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}
