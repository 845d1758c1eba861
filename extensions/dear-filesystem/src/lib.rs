#![deny(missing_docs)]
//! Filesystem navigation core for `dear-imgui-rs` file dialogs.
//!
//! Everything a file/folder/save dialog needs except drawing it:
//! - string path algebra that treats `/` and `\` alike (see [`path`])
//! - sorted, filtered directory listings over a pluggable [`FileSystem`]
//! - read-only browsing into `.zip` archives as if they were directories
//! - breadcrumbs, back/forward history and known-directory shortcuts
//! - a per-dialog [`DialogSession`] driven by [`SessionEvent`]s, with a
//!   [`DialogSnapshot`] for the UI layer to render
//!
//! ```no_run
//! use dear_filesystem::{DialogMode, DialogRequest, DialogSession, BrowserConfig, SessionEvent};
//!
//! let mut dialog = DialogSession::new(BrowserConfig::default());
//! dialog.trigger(DialogRequest::new(DialogMode::SaveFile).extensions(".png;.jpg"));
//! dialog.tick();
//! dialog.handle_event(SessionEvent::SetSaveName("result".into()));
//! if let Ok(path) = dialog.confirm() {
//!     println!("saving to {path}");
//! }
//! ```

mod archive;
mod config;
mod core;
mod dir_reader;
mod entry;
mod filter;
mod fs;
mod history;
mod known_dirs;
mod location;
mod manager;
pub mod path;
mod session;
mod vfs;

pub use archive::{
    ArchiveHandle, ArchiveSplit, normalize_inner, split_first_archive_segment,
    split_first_archive_segment_with,
};
pub use config::{BrowserConfig, DialogRequest};
pub use core::{
    DialogMode, EntryKind, FsError, KindFilter, SaveExtensionPolicy, SortBy, SortOrder,
};
pub use dir_reader::{list_directories, list_files, read_entries};
pub use entry::{DirEntry, is_hidden_name, sort_entries};
pub use filter::{ExtensionFilter, NameFilter};
pub use fs::{FileSystem, FsEntry, FsMetadata, ReadSeek, StdFileSystem};
pub use history::{HistoryState, NavigationHistory};
pub use known_dirs::{
    KnownDirectories, KnownDirectory, KnownDirectoryCache, MOUNT_ROOTS, drive_roots,
    mount_directories, user_directories,
};
pub use location::Location;
pub use manager::{DialogId, DialogManager, DialogResult};
pub use session::{
    DialogSession, DialogSnapshot, EntryView, EventOutcome, SessionEvent, SessionState,
    apply_save_extension,
};
pub use vfs::{ListRequest, Listing, VirtualFilesystem};
