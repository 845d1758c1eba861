//! One dialog's navigation state machine.
//!
//! The UI feeds [`SessionEvent`]s, calls [`DialogSession::tick`] once per
//! frame and draws from [`DialogSession::snapshot`]. Nothing here renders.

use std::sync::Arc;
use std::time::SystemTime;

use crate::config::{BrowserConfig, DialogRequest};
use crate::core::{DialogMode, EntryKind, FsError, SaveExtensionPolicy, SortBy, SortOrder};
use crate::entry::DirEntry;
use crate::filter::{ExtensionFilter, NameFilter};
use crate::fs::FileSystem;
use crate::history::NavigationHistory;
use crate::known_dirs::{KnownDirectories, KnownDirectory};
use crate::location::Location;
use crate::path;
use crate::vfs::{ListRequest, Listing, VirtualFilesystem};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Lifecycle of a [`DialogSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Not triggered, or closed by the user
    #[default]
    Closed,
    /// Triggered; the first listing happens on the next tick
    AwaitingFirstScan,
    /// Showing a listing
    Browsing,
    /// A path was chosen
    Confirmed,
}

impl SessionState {
    /// Whether the dialog accepts navigation events.
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::AwaitingFirstScan | SessionState::Browsing)
    }
}

/// Input to a [`DialogSession`].
///
/// Entry indices refer to the visible (name-filtered) lists of the latest
/// [`DialogSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Enter a listed directory.
    OpenDirectory(usize),
    /// Single-click a listed file.
    SelectFile(usize),
    /// Double-click (or Enter) a listed file.
    ActivateFile(usize),
    /// Browse into a listed archive file as if it were a directory.
    BrowseArchive(usize),
    /// Jump to a breadcrumb segment.
    Breadcrumb(usize),
    /// History back.
    Back,
    /// History forward.
    Forward,
    /// Navigate to a typed location (relative paths start at the current one).
    SubmitLocation(String),
    /// Jump to a known directory by index.
    KnownDirectory(usize),
    /// Replace the name filter text.
    SetNameFilter(String),
    /// Click a sort tab.
    SetSort(SortBy),
    /// Replace the save-name text.
    SetSaveName(String),
    /// Create a directory with this name at the current location.
    CreateDirectory(String),
    /// Press the confirm button.
    Confirm,
    /// Close without choosing.
    Close,
}

/// Side effect of applying a [`SessionEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Nothing changed (closed dialog, stale index, not applicable).
    None,
    /// State changed without needing a rescan.
    Updated,
    /// Location changed; the next tick rescans.
    Navigated,
    /// A directory was created at this path; the next tick rescans.
    DirectoryCreated(String),
    /// The dialog chose this path.
    Confirmed(String),
    /// The dialog was closed without a choice.
    Closed,
    /// The event failed; the error is available via
    /// [`DialogSession::take_error`] and the snapshot.
    Rejected,
}

/// One listed entry as the UI should draw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryView {
    /// Label (`*` suffix for encrypted archive entries)
    pub label: String,
    /// Full path
    pub path: String,
    /// Directory or file
    pub kind: EntryKind,
    /// File size
    pub size: Option<u64>,
    /// Modification time
    pub modified: Option<SystemTime>,
    /// Archive file (may be drawn with a distinct style)
    pub is_archive: bool,
    /// Archive file that can be browsed into from here
    pub browsable: bool,
    /// Currently selected file
    pub selected: bool,
}

/// Everything the UI needs to draw a dialog frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogSnapshot {
    /// Lifecycle state
    pub state: SessionState,
    /// Dialog mode
    pub mode: DialogMode,
    /// Default window title for the mode
    pub title: &'static str,
    /// Current path
    pub current_path: String,
    /// Breadcrumb labels of the deepest known path
    pub breadcrumbs: Vec<String>,
    /// Selected breadcrumb
    pub selected_breadcrumb: usize,
    /// Breadcrumb of the archive file, while inside one
    pub archive_breadcrumb: Option<usize>,
    /// Visible directories
    pub directories: Vec<EntryView>,
    /// Visible files
    pub files: Vec<EntryView>,
    /// History back available
    pub can_go_back: bool,
    /// History forward available
    pub can_go_forward: bool,
    /// Name filter text
    pub name_filter: String,
    /// Whether the filter box is offered
    pub filtering_offered: bool,
    /// Active sort order
    pub sort: SortOrder,
    /// Sort tabs that apply in this mode
    pub sort_options: Vec<SortBy>,
    /// Save-name buffer (current folder name in folder mode)
    pub save_name: String,
    /// Whether "create directory" is offered here
    pub can_create_directory: bool,
    /// Known-directory shortcuts (empty when the section is hidden)
    pub known_directories: Vec<KnownDirectory>,
    /// Leading known directories that are user folders
    pub known_user_count: usize,
    /// Display hint: row-major entry layout
    pub browse_per_row: bool,
    /// Chosen path once confirmed
    pub chosen_path: Option<String>,
    /// Message of the last unhandled error
    pub error: Option<String>,
}

/// State of one file dialog.
#[derive(Debug)]
pub struct DialogSession {
    config: BrowserConfig,
    vfs: VirtualFilesystem,
    history: NavigationHistory,
    state: SessionState,
    mode: DialogMode,
    extensions: ExtensionFilter,
    name_filter: NameFilter,
    sort: SortOrder,
    listing: Listing,
    needs_rescan: bool,
    generation: u64,
    save_name: String,
    selected_file: Option<String>,
    chosen_path: Option<String>,
    last_error: Option<FsError>,
    known_dirs: Option<Arc<KnownDirectories>>,
}

/// Reconciles a typed save name with the wanted extensions.
///
/// Without wanted extensions the name is kept as typed.
pub fn apply_save_extension(
    name: &str,
    filter: &ExtensionFilter,
    policy: SaveExtensionPolicy,
) -> String {
    let Some(first) = filter.first_wanted() else {
        return name.to_string();
    };
    let ext = path::extension(name);
    let accepted = !ext.is_empty() && filter.is_wanted_extension(&ext);
    match policy {
        SaveExtensionPolicy::KeepUser => name.to_string(),
        _ if accepted => name.to_string(),
        SaveExtensionPolicy::Append => format!("{name}{first}"),
        SaveExtensionPolicy::Replace => format!("{}{first}", strip_extension(name)),
    }
}

fn strip_extension(name: &str) -> &str {
    let base_start = name.len() - path::file_name(name).len();
    match name[base_start..].rfind('.') {
        Some(i) => &name[..base_start + i],
        None => name,
    }
}

impl DialogSession {
    /// Closed session over the OS filesystem.
    pub fn new(config: BrowserConfig) -> Self {
        Self::with_vfs(config, VirtualFilesystem::default())
    }

    /// Closed session over a custom filesystem.
    pub fn with_filesystem(config: BrowserConfig, fs: impl FileSystem + 'static) -> Self {
        Self::with_vfs(config, VirtualFilesystem::new(fs))
    }

    fn with_vfs(config: BrowserConfig, vfs: VirtualFilesystem) -> Self {
        Self {
            config,
            vfs,
            history: NavigationHistory::new(),
            state: SessionState::Closed,
            mode: DialogMode::OpenFile,
            extensions: ExtensionFilter::default(),
            name_filter: NameFilter::default(),
            sort: SortOrder::default(),
            listing: Listing::default(),
            needs_rescan: false,
            generation: 0,
            save_name: String::new(),
            selected_file: None,
            chosen_path: None,
            last_error: None,
            known_dirs: None,
        }
    }

    /// Opens (or re-opens) the dialog.
    ///
    /// Clears the chosen path, history and open archive, then starts at the
    /// nearest resolvable ancestor of the requested directory. The listing
    /// is read on the next [`DialogSession::tick`].
    pub fn trigger(&mut self, request: DialogRequest) {
        let DialogRequest {
            mode,
            directory,
            extensions,
            file_name,
        } = request;

        self.chosen_path = None;
        self.last_error = None;
        self.selected_file = None;
        self.history.reset();
        self.vfs.close_archive();
        self.listing = Listing::default();
        self.name_filter = NameFilter::default();

        self.mode = mode;
        self.extensions = extensions;
        self.save_name = file_name.unwrap_or_default();
        if mode == DialogMode::SelectFolder && !self.sort.by.is_applicable_to(EntryKind::Directory) {
            self.sort = SortOrder::default();
        }

        self.known_dirs = self.config.show_known_dirs.then(|| {
            let cache = &self.config.known_dirs;
            if self.config.refresh_known_dirs_on_open {
                cache.refresh()
            } else {
                cache.snapshot()
            }
        });

        let start = self.vfs.resolve_nearest(directory.as_deref().unwrap_or(""));
        trace_triggered(mode, start.current());
        self.history.switch_to(start);
        self.state = SessionState::AwaitingFirstScan;
        self.needs_rescan = true;
    }

    /// Rescans when the location changed since the last listing.
    ///
    /// Returns whether a rescan happened. A failing archive listing falls
    /// back to the real directory holding the archive.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_open() || !self.needs_rescan {
            return false;
        }
        let Some(location) = self.history.current().cloned() else {
            return false;
        };
        self.needs_rescan = false;
        self.generation += 1;

        let listing = match self.list(&location) {
            Ok(listing) => listing,
            Err(err) if location.is_inside_archive() => {
                trace_listing_fallback(location.current(), &err);
                self.last_error = Some(err);
                self.vfs.close_archive();
                let real = self.vfs.resolve_nearest(&location.real_directory());
                self.history.switch_to(real);
                self.relist_current()
            }
            Err(err) => {
                trace_listing_fallback(location.current(), &err);
                self.last_error = Some(err);
                Listing::default()
            }
        };
        self.listing = listing;

        if let Some(selected) = &self.selected_file {
            let still_listed = self.listing.files.iter().any(|f| &f.path == selected);
            if !still_listed {
                self.selected_file = None;
            }
        }
        if self.mode == DialogMode::SelectFolder {
            let current = self.current_path();
            let name = path::file_name(path::trim_trailing_separators(&current));
            self.save_name = if name.is_empty() { current.clone() } else { name.to_string() };
        }

        trace_rescanned(
            self.generation,
            &self.current_path(),
            self.listing.directories.len(),
            self.listing.files.len(),
        );
        self.state = SessionState::Browsing;
        true
    }

    fn list(&mut self, location: &Location) -> Result<Listing, FsError> {
        let request = ListRequest {
            order: self.sort,
            include_files: self.mode.lists_files(),
            extensions: self.mode.filters_extensions().then_some(&self.extensions),
        };
        self.vfs.list(location, request)
    }

    fn relist_current(&mut self) -> Listing {
        let Some(location) = self.history.current().cloned() else {
            return Listing::default();
        };
        self.list(&location).unwrap_or_else(|err| {
            trace_listing_fallback(location.current(), &err);
            self.last_error = Some(err);
            Listing::default()
        })
    }

    /// Applies one UI event.
    pub fn handle_event(&mut self, event: SessionEvent) -> EventOutcome {
        if !self.state.is_open() {
            return EventOutcome::None;
        }
        match event {
            SessionEvent::OpenDirectory(i) => {
                let target = self.visible_directories().nth(i).map(|d| d.path.clone());
                match target {
                    Some(target) => self.navigate_to(&target),
                    None => EventOutcome::None,
                }
            }
            SessionEvent::SelectFile(i) => self.select_file(i),
            SessionEvent::ActivateFile(i) => match self.select_file(i) {
                EventOutcome::Updated if self.mode != DialogMode::SelectFolder => self.confirm_event(),
                other => other,
            },
            SessionEvent::BrowseArchive(i) => {
                let inside = self.location().is_some_and(Location::is_inside_archive);
                let target = self
                    .visible_files()
                    .nth(i)
                    .filter(|f| f.is_archive && !inside)
                    .map(|f| f.path.clone());
                match target {
                    Some(target) => self.navigate_to(&target),
                    None => EventOutcome::None,
                }
            }
            SessionEvent::Breadcrumb(i) => {
                let Some(target) = self.location().and_then(|l| l.for_segment(i)) else {
                    return EventOutcome::None;
                };
                self.switch_to(target)
            }
            SessionEvent::Back => {
                if self.history.go_back() {
                    self.after_navigation();
                    EventOutcome::Navigated
                } else {
                    EventOutcome::None
                }
            }
            SessionEvent::Forward => {
                if self.history.go_forward() {
                    self.after_navigation();
                    EventOutcome::Navigated
                } else {
                    EventOutcome::None
                }
            }
            SessionEvent::SubmitLocation(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return EventOutcome::None;
                }
                let target = if path::is_absolute(text) {
                    text.to_string()
                } else {
                    path::combine(&self.current_path(), text)
                };
                self.navigate_to(&target)
            }
            SessionEvent::KnownDirectory(i) => {
                let target = self
                    .known_dirs
                    .as_ref()
                    .and_then(|k| k.get(i))
                    .map(|d| d.path.clone());
                match target {
                    Some(target) => self.navigate_to(&target),
                    None => EventOutcome::None,
                }
            }
            SessionEvent::SetNameFilter(text) => {
                if !self.config.allow_filtering {
                    return EventOutcome::None;
                }
                self.name_filter = NameFilter::new(text);
                EventOutcome::Updated
            }
            SessionEvent::SetSort(by) => {
                if self.mode == DialogMode::SelectFolder && !by.is_applicable_to(EntryKind::Directory) {
                    return EventOutcome::None;
                }
                self.sort = self.sort.toggled(by);
                self.needs_rescan = true;
                EventOutcome::Updated
            }
            SessionEvent::SetSaveName(text) => {
                if self.mode != DialogMode::SaveFile {
                    return EventOutcome::None;
                }
                self.save_name = text;
                EventOutcome::Updated
            }
            SessionEvent::CreateDirectory(name) => match self.create_directory(&name) {
                Ok(created) => EventOutcome::DirectoryCreated(created),
                Err(err) => self.reject(err),
            },
            SessionEvent::Confirm => self.confirm_event(),
            SessionEvent::Close => {
                self.close();
                EventOutcome::Closed
            }
        }
    }

    fn select_file(&mut self, index: usize) -> EventOutcome {
        let picked = self
            .visible_files()
            .nth(index)
            .map(|f| (f.path.clone(), f.name.clone()));
        let Some((file_path, name)) = picked else {
            return EventOutcome::None;
        };
        if self.mode == DialogMode::SaveFile {
            self.save_name = name;
        }
        self.selected_file = Some(file_path);
        EventOutcome::Updated
    }

    fn confirm_event(&mut self) -> EventOutcome {
        match self.confirm() {
            Ok(chosen) => EventOutcome::Confirmed(chosen),
            Err(err) => self.reject(err),
        }
    }

    fn reject(&mut self, err: FsError) -> EventOutcome {
        trace_rejected(&err);
        self.last_error = Some(err);
        EventOutcome::Rejected
    }

    fn after_navigation(&mut self) {
        self.selected_file = None;
        self.needs_rescan = true;
    }

    fn switch_to(&mut self, location: Location) -> EventOutcome {
        if self.history.switch_to(location) {
            self.after_navigation();
            EventOutcome::Navigated
        } else {
            EventOutcome::None
        }
    }

    /// Navigates to `target`, which must resolve to a directory (real or
    /// inside an archive).
    pub fn navigate_to(&mut self, target: &str) -> EventOutcome {
        if !self.state.is_open() {
            return EventOutcome::None;
        }
        match self.vfs.resolve(target) {
            Ok(location) => self.switch_to(location),
            Err(err) => self.reject(err),
        }
    }

    /// Confirms the dialog and returns the chosen path.
    ///
    /// Folder dialogs choose the current location, save dialogs the current
    /// location joined with the (extension-reconciled) save name, open
    /// dialogs the selected file.
    pub fn confirm(&mut self) -> Result<String, FsError> {
        if !self.state.is_open() {
            return Err(FsError::UnsupportedOperation("dialog is not open"));
        }
        let location = self
            .history
            .current()
            .cloned()
            .ok_or_else(|| FsError::InvalidPath("no current location".into()))?;

        let chosen = match self.mode {
            DialogMode::SelectFolder => location.current().to_string(),
            DialogMode::SaveFile => {
                let typed = self.save_name.trim();
                if typed.is_empty() {
                    return Err(FsError::InvalidPath("empty file name".into()));
                }
                if location.is_inside_archive() {
                    return Err(FsError::UnsupportedOperation("cannot save inside an archive"));
                }
                let policy = if self.config.filter_save_names {
                    self.config.save_extension_policy
                } else {
                    SaveExtensionPolicy::KeepUser
                };
                let name = apply_save_extension(typed, &self.extensions, policy);
                self.save_name = name.clone();
                path::combine(location.current(), &name)
            }
            DialogMode::OpenFile => self
                .selected_file
                .clone()
                .ok_or_else(|| FsError::InvalidPath("no file selected".into()))?,
        };

        trace_confirmed(&chosen);
        self.chosen_path = Some(chosen.clone());
        self.state = SessionState::Confirmed;
        self.vfs.close_archive();
        Ok(chosen)
    }

    /// Creates the directory `name` at the current location.
    ///
    /// Only folder and save dialogs offer this, never inside an archive. An
    /// existing target is rejected and the listing stays as it is.
    pub fn create_directory(&mut self, name: &str) -> Result<String, FsError> {
        if !self.state.is_open() {
            return Err(FsError::UnsupportedOperation("dialog is not open"));
        }
        if !(self.mode.offers_directory_creation() && self.config.allow_directory_creation) {
            return Err(FsError::UnsupportedOperation(
                "directory creation is not offered by this dialog",
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(FsError::InvalidPath("empty directory name".into()));
        }
        let Some(location) = self.history.current() else {
            return Err(FsError::InvalidPath("no current location".into()));
        };
        if location.is_inside_archive() {
            return Err(FsError::UnsupportedOperation(
                "cannot create directories inside an archive",
            ));
        }
        let target = path::combine(location.current(), name);
        self.vfs.create_directory(&target)?;
        self.needs_rescan = true;
        Ok(target)
    }

    /// Closes the dialog without choosing.
    pub fn close(&mut self) {
        self.vfs.close_archive();
        self.state = SessionState::Closed;
        self.needs_rescan = false;
    }

    fn visible<'a>(&'a self, entries: &'a [DirEntry]) -> impl Iterator<Item = &'a DirEntry> + 'a {
        entries.iter().filter(|e| self.name_filter.matches(&e.name))
    }

    fn visible_directories(&self) -> impl Iterator<Item = &DirEntry> + '_ {
        self.visible(&self.listing.directories)
    }

    fn visible_files(&self) -> impl Iterator<Item = &DirEntry> + '_ {
        self.visible(&self.listing.files)
    }

    /// Lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Dialog mode of the last trigger.
    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    /// Current location.
    pub fn location(&self) -> Option<&Location> {
        self.history.current()
    }

    /// Current path (`""` before the first trigger).
    pub fn current_path(&self) -> String {
        self.location()
            .map(|l| l.current().to_string())
            .unwrap_or_default()
    }

    /// Active sort order.
    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    /// Cached listing of the last rescan (before name filtering).
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Chosen path, set once on confirm and cleared on trigger.
    pub fn chosen_path(&self) -> Option<&str> {
        self.chosen_path.as_deref()
    }

    /// Takes the last error, clearing it from the snapshot.
    pub fn take_error(&mut self) -> Option<FsError> {
        self.last_error.take()
    }

    /// Virtual filesystem of this session, e.g. to read a chosen file that
    /// lives inside an archive.
    pub fn vfs_mut(&mut self) -> &mut VirtualFilesystem {
        &mut self.vfs
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Renderable state.
    pub fn snapshot(&self) -> DialogSnapshot {
        let location = self.location();
        let inside_archive = location.is_some_and(Location::is_inside_archive);
        let view = |e: &DirEntry| EntryView {
            label: e.display_name(),
            path: e.path.clone(),
            kind: e.kind,
            size: e.size,
            modified: e.modified,
            is_archive: e.is_archive,
            browsable: e.is_archive && !inside_archive,
            selected: self.selected_file.as_deref() == Some(e.path.as_str()),
        };
        let sort_options = SortBy::ALL
            .into_iter()
            .filter(|by| self.mode.lists_files() || by.is_applicable_to(EntryKind::Directory))
            .collect();
        let (known_directories, known_user_count) = match &self.known_dirs {
            Some(k) => (k.entries().to_vec(), k.user_count()),
            None => (Vec::new(), 0),
        };

        DialogSnapshot {
            state: self.state,
            mode: self.mode,
            title: self.mode.default_title(),
            current_path: self.current_path(),
            breadcrumbs: location
                .map(|l| l.segment_labels().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            selected_breadcrumb: location.map_or(0, Location::selected_segment),
            archive_breadcrumb: location.and_then(Location::archive_segment),
            directories: self.visible_directories().map(view).collect(),
            files: self.visible_files().map(view).collect(),
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
            name_filter: self.name_filter.text().to_string(),
            filtering_offered: self.config.allow_filtering,
            sort: self.sort,
            sort_options,
            save_name: self.save_name.clone(),
            can_create_directory: self.state.is_open()
                && self.mode.offers_directory_creation()
                && self.config.allow_directory_creation
                && !inside_archive,
            known_directories,
            known_user_count,
            browse_per_row: self.config.browse_per_row,
            chosen_path: self.chosen_path.clone(),
            error: self.last_error.as_ref().map(ToString::to_string),
        }
    }
}

#[cfg(feature = "tracing")]
fn trace_triggered(mode: DialogMode, start: &str) {
    debug!(event = "session.triggered", ?mode, start, "dialog triggered");
}

#[cfg(not(feature = "tracing"))]
fn trace_triggered(_mode: DialogMode, _start: &str) {}

#[cfg(feature = "tracing")]
fn trace_rescanned(generation: u64, cwd: &str, directories: usize, files: usize) {
    trace!(
        event = "session.rescan",
        generation, cwd, directories, files, "location rescanned"
    );
}

#[cfg(not(feature = "tracing"))]
fn trace_rescanned(_generation: u64, _cwd: &str, _directories: usize, _files: usize) {}

#[cfg(feature = "tracing")]
fn trace_listing_fallback(location: &str, err: &FsError) {
    debug!(event = "session.listing_failed", location, error = %err, "listing failed");
}

#[cfg(not(feature = "tracing"))]
fn trace_listing_fallback(_location: &str, _err: &FsError) {}

#[cfg(feature = "tracing")]
fn trace_rejected(err: &FsError) {
    debug!(event = "session.rejected", error = %err, "event rejected");
}

#[cfg(not(feature = "tracing"))]
fn trace_rejected(_err: &FsError) {}

#[cfg(feature = "tracing")]
fn trace_confirmed(chosen: &str) {
    debug!(event = "session.confirmed", chosen, "dialog confirmed");
}

#[cfg(not(feature = "tracing"))]
fn trace_confirmed(_chosen: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::{MemoryFs, at};
    use crate::known_dirs::KnownDirectoryCache;

    fn config() -> BrowserConfig {
        BrowserConfig::new().known_directories(KnownDirectoryCache::with_entries(
            KnownDirectories::from_parts(
                vec![KnownDirectory::new("Home", "/home/me")],
                vec![KnownDirectory::new("USB", "/media/me/USB")],
            ),
        ))
    }

    fn memory_fs() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_dir("/home/me/Docs")
            .add_dir("/home/me/Music")
            .add_dir("/media/me/USB")
            .add_dir_at("/w/old", at(1))
            .add_dir_at("/w/new", at(9))
            .add_file("/w/a.png", b"aaaa")
            .add_file("/w/b.jpg", b"bb")
            .add_file("/w/c.txt", b"c")
            .add_file("/w/report.png", b"r");
        fs
    }

    fn open(mode: DialogMode, dir: &str, exts: &str) -> DialogSession {
        let mut s = DialogSession::with_filesystem(config(), memory_fs());
        s.trigger(DialogRequest::new(mode).directory(dir).extensions(exts));
        assert_eq!(s.state(), SessionState::AwaitingFirstScan);
        assert!(s.tick());
        s
    }

    fn labels(v: &[EntryView]) -> Vec<&str> {
        v.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn first_tick_lists_once() {
        let mut s = open(DialogMode::OpenFile, "/w", ".png;.jpg");
        assert_eq!(s.state(), SessionState::Browsing);
        assert!(!s.tick());
        let snap = s.snapshot();
        assert_eq!(snap.current_path, "/w");
        assert_eq!(labels(&snap.directories), ["new", "old"]);
        assert_eq!(labels(&snap.files), ["a.png", "b.jpg", "report.png"]);
        assert_eq!(snap.breadcrumbs, ["/", "w"]);
        assert_eq!(snap.known_directories.len(), 2);
        assert_eq!(snap.known_user_count, 1);
    }

    #[test]
    fn folder_mode_lists_no_files_and_mirrors_folder_name() {
        let mut s = open(DialogMode::SelectFolder, "/home/me", "");
        let snap = s.snapshot();
        assert!(snap.files.is_empty());
        assert_eq!(snap.save_name, "me");
        assert_eq!(snap.sort_options, [SortBy::Name, SortBy::Modified]);
        assert!(snap.can_create_directory);
        assert_eq!(s.handle_event(SessionEvent::SetSort(SortBy::Size)), EventOutcome::None);
        assert_eq!(
            s.handle_event(SessionEvent::Confirm),
            EventOutcome::Confirmed("/home/me".into())
        );
    }

    #[test]
    fn folder_mode_resets_file_only_sort() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        s.handle_event(SessionEvent::SetSort(SortBy::Size));
        assert_eq!(s.sort_order().by, SortBy::Size);
        s.trigger(DialogRequest::new(DialogMode::SelectFolder).directory("/w"));
        assert_eq!(s.sort_order(), SortOrder::default());
    }

    #[test]
    fn sort_tab_twice_flips_direction_and_rescans() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert_eq!(s.handle_event(SessionEvent::SetSort(SortBy::Modified)), EventOutcome::Updated);
        assert!(s.tick());
        assert_eq!(labels(&s.snapshot().directories), ["old", "new"]);
        s.handle_event(SessionEvent::SetSort(SortBy::Modified));
        assert!(s.tick());
        assert!(!s.sort_order().ascending);
        assert_eq!(labels(&s.snapshot().directories), ["new", "old"]);
    }

    #[test]
    fn name_filter_narrows_visible_entries_and_indices() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        s.handle_event(SessionEvent::SetNameFilter("rep, -.txt".into()));
        let snap = s.snapshot();
        assert_eq!(labels(&snap.files), ["report.png"]);
        assert!(snap.directories.is_empty());
        assert_eq!(
            s.handle_event(SessionEvent::ActivateFile(0)),
            EventOutcome::Confirmed("/w/report.png".into())
        );
        assert_eq!(s.chosen_path(), Some("/w/report.png"));
    }

    #[test]
    fn filtering_can_be_disabled() {
        let mut s = DialogSession::with_filesystem(config().allow_filtering(false), memory_fs());
        s.trigger(DialogRequest::new(DialogMode::OpenFile).directory("/w"));
        s.tick();
        assert_eq!(s.handle_event(SessionEvent::SetNameFilter("x".into())), EventOutcome::None);
        assert!(!s.snapshot().filtering_offered);
    }

    #[test]
    fn navigation_and_history() {
        let mut s = open(DialogMode::OpenFile, "/home/me", "");
        assert_eq!(s.handle_event(SessionEvent::OpenDirectory(0)), EventOutcome::Navigated);
        s.tick();
        assert_eq!(s.current_path(), "/home/me/Docs");
        assert_eq!(s.handle_event(SessionEvent::Breadcrumb(1)), EventOutcome::Navigated);
        s.tick();
        let snap = s.snapshot();
        assert_eq!(snap.current_path, "/home");
        assert_eq!(snap.breadcrumbs, ["/", "home", "me", "Docs"]);
        assert_eq!(snap.selected_breadcrumb, 1);
        assert!(snap.can_go_back);

        assert_eq!(s.handle_event(SessionEvent::Back), EventOutcome::Navigated);
        s.tick();
        assert_eq!(s.current_path(), "/home/me/Docs");
        assert!(s.snapshot().can_go_forward);
        s.handle_event(SessionEvent::SubmitLocation("../Music".into()));
        s.tick();
        assert_eq!(s.current_path(), "/home/me/Music");
        assert!(!s.snapshot().can_go_forward);

        assert_eq!(s.handle_event(SessionEvent::KnownDirectory(1)), EventOutcome::Navigated);
        s.tick();
        assert_eq!(s.current_path(), "/media/me/USB");
    }

    #[test]
    fn unresolvable_location_is_rejected_and_kept() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert_eq!(
            s.handle_event(SessionEvent::SubmitLocation("/does/not/exist".into())),
            EventOutcome::Rejected
        );
        assert_eq!(s.current_path(), "/w");
        assert!(s.snapshot().error.is_some());
        assert!(matches!(s.take_error(), Some(FsError::PathResolution { .. })));
        assert!(s.snapshot().error.is_none());
    }

    #[test]
    fn trigger_falls_back_to_nearest_ancestor() {
        let mut s = DialogSession::with_filesystem(config(), memory_fs());
        s.trigger(DialogRequest::new(DialogMode::OpenFile).directory("/w/missing/deeper"));
        s.tick();
        assert_eq!(s.current_path(), "/w");
    }

    #[test]
    fn save_names_follow_the_extension_policy() {
        let f = ExtensionFilter::wanted(".png;.jpg");
        let append = SaveExtensionPolicy::Append;
        assert_eq!(apply_save_extension("result", &f, append), "result.png");
        assert_eq!(apply_save_extension("result.txt", &f, append), "result.txt.png");
        assert_eq!(apply_save_extension("result.JPG", &f, append), "result.JPG");
        let replace = SaveExtensionPolicy::Replace;
        assert_eq!(apply_save_extension("result.txt", &f, replace), "result.png");
        assert_eq!(apply_save_extension("dir.v2/result", &f, replace), "dir.v2/result.png");
        assert_eq!(
            apply_save_extension("result.txt", &f, SaveExtensionPolicy::KeepUser),
            "result.txt"
        );
        assert_eq!(
            apply_save_extension("result.txt", &ExtensionFilter::default(), append),
            "result.txt"
        );
    }

    #[test]
    fn save_dialog_confirms_combined_path() {
        let mut s = DialogSession::with_filesystem(config(), memory_fs());
        s.trigger(
            DialogRequest::new(DialogMode::SaveFile)
                .directory("/w")
                .extensions(".png")
                .file_name("/elsewhere/result"),
        );
        s.tick();
        assert_eq!(s.snapshot().save_name, "result");
        assert_eq!(
            s.handle_event(SessionEvent::Confirm),
            EventOutcome::Confirmed("/w/result.png".into())
        );
        assert_eq!(s.state(), SessionState::Confirmed);
        assert_eq!(s.handle_event(SessionEvent::Back), EventOutcome::None);
    }

    #[test]
    fn save_name_filtering_can_be_disabled() {
        let mut s = DialogSession::with_filesystem(config().filter_save_names(false), memory_fs());
        s.trigger(DialogRequest::new(DialogMode::SaveFile).directory("/w").extensions(".png"));
        s.tick();
        s.handle_event(SessionEvent::SetSaveName("notes.txt".into()));
        assert_eq!(s.confirm().unwrap(), "/w/notes.txt");
    }

    #[test]
    fn selecting_a_file_in_save_mode_copies_its_name() {
        let mut s = open(DialogMode::SaveFile, "/w", ".png");
        assert_eq!(s.handle_event(SessionEvent::SelectFile(0)), EventOutcome::Updated);
        let snap = s.snapshot();
        assert_eq!(snap.save_name, "a.png");
        assert!(snap.files[0].selected);
    }

    #[test]
    fn empty_save_name_is_rejected() {
        let mut s = open(DialogMode::SaveFile, "/w", ".png");
        assert_eq!(s.handle_event(SessionEvent::Confirm), EventOutcome::Rejected);
        assert!(matches!(s.take_error(), Some(FsError::InvalidPath(_))));
        assert_eq!(s.state(), SessionState::Browsing);
    }

    #[test]
    fn open_dialog_requires_a_selection() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert!(matches!(s.confirm(), Err(FsError::InvalidPath(_))));
        s.handle_event(SessionEvent::SelectFile(1));
        assert_eq!(s.confirm().unwrap(), "/w/b.jpg");
    }

    #[test]
    fn directory_creation_rules() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert!(matches!(
            s.create_directory("x"),
            Err(FsError::UnsupportedOperation(_))
        ));
        assert!(!s.snapshot().can_create_directory);

        let mut s = open(DialogMode::SaveFile, "/w", "");
        let before = s.snapshot().directories;
        assert_eq!(s.handle_event(SessionEvent::CreateDirectory("old".into())), EventOutcome::Rejected);
        assert!(matches!(s.take_error(), Some(FsError::AlreadyExists(_))));
        assert!(!s.tick());
        assert_eq!(s.snapshot().directories, before);

        assert_eq!(
            s.handle_event(SessionEvent::CreateDirectory("fresh".into())),
            EventOutcome::DirectoryCreated("/w/fresh".into())
        );
        assert!(s.tick());
        assert_eq!(labels(&s.snapshot().directories), ["fresh", "new", "old"]);

        let mut s = DialogSession::with_filesystem(config().allow_directory_creation(false), memory_fs());
        s.trigger(DialogRequest::new(DialogMode::SelectFolder).directory("/w"));
        s.tick();
        assert!(s.create_directory("y").is_err());
    }

    #[test]
    fn close_ignores_further_events() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert_eq!(s.handle_event(SessionEvent::Close), EventOutcome::Closed);
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.tick());
        assert_eq!(s.handle_event(SessionEvent::OpenDirectory(0)), EventOutcome::None);
        assert!(s.chosen_path().is_none());
    }

    #[test]
    fn stale_indices_are_ignored() {
        let mut s = open(DialogMode::OpenFile, "/w", "");
        assert_eq!(s.handle_event(SessionEvent::OpenDirectory(99)), EventOutcome::None);
        assert_eq!(s.handle_event(SessionEvent::SelectFile(99)), EventOutcome::None);
        assert_eq!(s.handle_event(SessionEvent::Breadcrumb(99)), EventOutcome::None);
        assert_eq!(s.handle_event(SessionEvent::KnownDirectory(99)), EventOutcome::None);
    }
}
