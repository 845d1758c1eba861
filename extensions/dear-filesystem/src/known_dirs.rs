use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;

use crate::core::SortOrder;
use crate::dir_reader;
use crate::fs::{FileSystem, StdFileSystem};
use crate::path;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Unix roots under which removable media and extra volumes are mounted.
pub const MOUNT_ROOTS: [&str; 5] = ["/media", "/mnt", "/Volumes", "/vol", "/data"];

/// A labelled shortcut shown next to the file list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownDirectory {
    /// Display label
    pub label: String,
    /// Target directory
    pub path: String,
}

impl KnownDirectory {
    /// Creates a shortcut.
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Detected shortcuts: user folders first, then drives and mount points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownDirectories {
    entries: Vec<KnownDirectory>,
    user_count: usize,
}

impl KnownDirectories {
    /// Combines user folders and drives, dropping repeated paths (first
    /// occurrence wins).
    pub fn from_parts(user: Vec<KnownDirectory>, drives: Vec<KnownDirectory>) -> Self {
        let mut seen: IndexSet<String> = IndexSet::new();
        let mut entries = Vec::with_capacity(user.len() + drives.len());
        let mut user_count = 0;
        for d in user {
            if seen.insert(d.path.clone()) {
                entries.push(d);
                user_count += 1;
            }
        }
        for d in drives {
            if seen.insert(d.path.clone()) {
                entries.push(d);
            }
        }
        Self {
            entries,
            user_count,
        }
    }

    /// Detects shortcuts on this machine.
    pub fn detect() -> Self {
        let fs = StdFileSystem;
        let user = user_directories(&fs);
        let user_name = dirs::home_dir()
            .map(|h| path::file_name(&path::from_os_path(&h)).to_string())
            .filter(|s| !s.is_empty());
        let mut drives = Vec::new();
        if cfg!(windows) {
            drives.extend(drive_roots(&fs));
        } else {
            drives.extend(mount_directories(&fs, user_name.as_deref(), &MOUNT_ROOTS));
        }
        let out = Self::from_parts(user, drives);
        trace_detected(out.entries.len(), out.user_count);
        out
    }

    /// All shortcuts in display order.
    pub fn entries(&self) -> &[KnownDirectory] {
        &self.entries
    }

    /// Number of leading entries that are user folders rather than drives or
    /// mount points.
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&KnownDirectory> {
        self.entries.get(index)
    }

    /// Number of shortcuts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_dir(fs: &dyn FileSystem, p: &str) -> bool {
    fs.metadata(Path::new(p)).map(|m| m.is_dir).unwrap_or(false)
}

/// Home plus the standard user folders that exist.
pub fn user_directories(fs: &dyn FileSystem) -> Vec<KnownDirectory> {
    let candidates = [
        ("Home", dirs::home_dir()),
        ("Desktop", dirs::desktop_dir()),
        ("Documents", dirs::document_dir()),
        ("Downloads", dirs::download_dir()),
        ("Music", dirs::audio_dir()),
        ("Pictures", dirs::picture_dir()),
        ("Videos", dirs::video_dir()),
    ];
    candidates
        .into_iter()
        .filter_map(|(label, p)| p.map(|p| (label, path::from_os_path(&p))))
        .filter(|(_, p)| is_dir(fs, p))
        .map(|(label, p)| KnownDirectory::new(label, p))
        .collect()
}

/// Subdirectories of each mount root. When `<root>/<user>` exists its
/// subdirectories replace those of the root itself.
pub fn mount_directories(
    fs: &dyn FileSystem,
    user_name: Option<&str>,
    roots: &[&str],
) -> Vec<KnownDirectory> {
    let mut out = Vec::new();
    for root in roots {
        let per_user = user_name
            .map(|u| path::combine(root, u))
            .filter(|p| is_dir(fs, p));
        let listed = match per_user {
            Some(p) => p,
            None if is_dir(fs, root) => (*root).to_string(),
            None => continue,
        };
        for d in dir_reader::list_directories(fs, &listed, SortOrder::default()) {
            out.push(KnownDirectory::new(d.name, d.path));
        }
    }
    out
}

/// Existing drive roots `C:/` through `Z:/`.
pub fn drive_roots(fs: &dyn FileSystem) -> Vec<KnownDirectory> {
    (b'C'..=b'Z')
        .map(|c| format!("{}:/", c as char))
        .filter(|p| is_dir(fs, p))
        .map(|p| KnownDirectory::new(p.trim_end_matches('/'), p.clone()))
        .collect()
}

type Detector = dyn Fn() -> KnownDirectories + Send + Sync;

/// Process-wide known-directories snapshot.
///
/// Detection runs lazily on first use and again on [`refresh`], which builds
/// a complete new set before swapping it in; readers only ever see whole
/// snapshots. Clones share the same snapshot.
///
/// [`refresh`]: KnownDirectoryCache::refresh
#[derive(Clone)]
pub struct KnownDirectoryCache {
    current: Arc<RwLock<Option<Arc<KnownDirectories>>>>,
    detector: Arc<Detector>,
}

impl fmt::Debug for KnownDirectoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownDirectoryCache")
            .field("current", &*self.current.read())
            .finish_non_exhaustive()
    }
}

impl Default for KnownDirectoryCache {
    fn default() -> Self {
        Self::with_detector(KnownDirectories::detect)
    }
}

impl KnownDirectoryCache {
    /// Cache using machine detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache using a custom detector.
    pub fn with_detector(detector: impl Fn() -> KnownDirectories + Send + Sync + 'static) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            detector: Arc::new(detector),
        }
    }

    /// Cache that always reports `entries`.
    pub fn with_entries(entries: KnownDirectories) -> Self {
        Self::with_detector(move || entries.clone())
    }

    /// Current snapshot, detecting on first use.
    pub fn snapshot(&self) -> Arc<KnownDirectories> {
        if let Some(s) = self.current.read().as_ref() {
            return Arc::clone(s);
        }
        let mut guard = self.current.write();
        match guard.as_ref() {
            Some(s) => Arc::clone(s),
            None => {
                let s = Arc::new((self.detector)());
                *guard = Some(Arc::clone(&s));
                s
            }
        }
    }

    /// Re-detects and swaps in the new snapshot.
    pub fn refresh(&self) -> Arc<KnownDirectories> {
        let fresh = Arc::new((self.detector)());
        *self.current.write() = Some(Arc::clone(&fresh));
        fresh
    }
}

#[cfg(feature = "tracing")]
fn trace_detected(entries: usize, user_count: usize) {
    debug!(event = "known_dirs.detected", entries, user_count, "known directories detected");
}

#[cfg(not(feature = "tracing"))]
fn trace_detected(_entries: usize, _user_count: usize) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn per_user_mount_folder_supersedes_its_root() {
        let fs = MemoryFs::new();
        fs.add_dir("/media/me/USB")
            .add_dir("/media/other")
            .add_dir("/mnt/disk1")
            .add_dir("/mnt/disk2")
            .add_dir("/mnt/.hidden");
        let found = mount_directories(&fs, Some("me"), &MOUNT_ROOTS);
        let paths: Vec<_> = found.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["/media/me/USB", "/mnt/disk1", "/mnt/disk2"]);
        assert_eq!(found[0].label, "USB");
    }

    #[test]
    fn drive_roots_probe_c_to_z() {
        let fs = MemoryFs::new();
        fs.add_dir("C:/").add_dir("E:/");
        let drives = drive_roots(&fs);
        let labels: Vec<_> = drives.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["C:", "E:"]);
        assert_eq!(drives[0].path, "C:/");
    }

    #[test]
    fn repeated_paths_are_dropped_and_user_count_kept() {
        let set = KnownDirectories::from_parts(
            vec![
                KnownDirectory::new("Home", "/home/me"),
                KnownDirectory::new("Desktop", "/home/me/Desktop"),
                KnownDirectory::new("Dup", "/home/me"),
            ],
            vec![
                KnownDirectory::new("USB", "/media/me/USB"),
                KnownDirectory::new("Again", "/home/me/Desktop"),
            ],
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.user_count(), 2);
        assert_eq!(set.get(2).map(|d| d.label.as_str()), Some("USB"));
    }

    #[test]
    fn cache_detects_lazily_and_swaps_on_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = KnownDirectoryCache::with_detector(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            KnownDirectories::from_parts(
                vec![KnownDirectory::new(format!("gen{n}"), format!("/gen{n}"))],
                Vec::new(),
            )
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let first = cache.snapshot();
        let again = cache.clone().snapshot();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let fresh = cache.refresh();
        assert_eq!(fresh.entries()[0].label, "gen1");
        assert_eq!(first.entries()[0].label, "gen0");
        assert!(Arc::ptr_eq(&fresh, &cache.snapshot()));
    }
}
