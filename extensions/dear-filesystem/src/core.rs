use thiserror::Error;

/// Dialog mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogMode {
    /// Pick a single existing file
    OpenFile,
    /// Pick a directory
    SelectFolder,
    /// Choose (or type) a file name to save to
    SaveFile,
}

impl DialogMode {
    /// Whether file entries are listed at all in this mode.
    pub fn lists_files(self) -> bool {
        !matches!(self, DialogMode::SelectFolder)
    }

    /// Whether the extension filter applies to file listings in this mode.
    pub fn filters_extensions(self) -> bool {
        matches!(self, DialogMode::OpenFile | DialogMode::SaveFile)
    }

    /// Whether the mode offers "create directory" (folder and save dialogs only).
    pub fn offers_directory_creation(self) -> bool {
        matches!(self, DialogMode::SelectFolder | DialogMode::SaveFile)
    }

    /// Default window title the UI may show for this mode.
    pub fn default_title(self) -> &'static str {
        match self {
            DialogMode::OpenFile => "Please choose a file",
            DialogMode::SelectFolder => "Please select a folder",
            DialogMode::SaveFile => "Please choose/create a file for saving",
        }
    }
}

/// Kind of a listed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A directory (or a directory record inside an archive)
    Directory,
    /// A regular file (or a file record inside an archive)
    File,
}

/// Restricts existence checks to one entry kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
    /// Files and directories both count
    #[default]
    Any,
    /// Only files count
    Files,
    /// Only directories count
    Directories,
}

impl KindFilter {
    /// Returns whether an entry of `kind` passes this filter.
    pub fn accepts(self, kind: EntryKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Files => kind == EntryKind::File,
            KindFilter::Directories => kind == EntryKind::Directory,
        }
    }
}

/// Sort keys for entry listings
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortBy {
    /// Case-insensitive name
    #[default]
    Name,
    /// Last modification time
    Modified,
    /// Size in bytes (files only)
    Size,
    /// Lower-cased extension (files only)
    Extension,
}

impl SortBy {
    /// All keys in the order a UI usually shows them as tabs.
    pub const ALL: [SortBy; 4] = [SortBy::Name, SortBy::Modified, SortBy::Size, SortBy::Extension];

    /// Directories carry no meaningful size or type, so only name and
    /// modification time apply to them.
    pub fn is_applicable_to(self, kind: EntryKind) -> bool {
        match self {
            SortBy::Name | SortBy::Modified => true,
            SortBy::Size | SortBy::Extension => kind == EntryKind::File,
        }
    }

    /// Short label for a sort tab.
    pub fn label(self) -> &'static str {
        match self {
            SortBy::Name => "Name",
            SortBy::Modified => "Modified",
            SortBy::Size => "Size",
            SortBy::Extension => "Type",
        }
    }
}

/// Sort key plus direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortOrder {
    /// Primary key
    pub by: SortBy,
    /// Ascending (A-Z, oldest first, smallest first) when `true`
    pub ascending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            by: SortBy::Name,
            ascending: true,
        }
    }
}

impl SortOrder {
    /// Creates a sort order.
    pub fn new(by: SortBy, ascending: bool) -> Self {
        Self { by, ascending }
    }

    /// The order to use for a listing of `kind`: keys that do not apply fold
    /// back to [`SortBy::Name`], keeping the direction.
    pub fn for_kind(self, kind: EntryKind) -> Self {
        if self.by.is_applicable_to(kind) {
            self
        } else {
            Self {
                by: SortBy::Name,
                ascending: self.ascending,
            }
        }
    }

    /// Tab-click semantics: picking the active key flips the direction,
    /// picking another key starts ascending.
    pub fn toggled(self, by: SortBy) -> Self {
        if self.by == by {
            Self {
                by,
                ascending: !self.ascending,
            }
        } else {
            Self {
                by,
                ascending: true,
            }
        }
    }
}

/// How a save-file name is reconciled with the dialog's extension filter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SaveExtensionPolicy {
    /// Missing extension: append the first filter extension. Extension not in
    /// the filter: append the first filter extension as an extra suffix
    /// (`result.txt` -> `result.txt.png`).
    #[default]
    Append,
    /// Missing or foreign extension is replaced by the first filter extension
    /// (`result.txt` -> `result.png`).
    Replace,
    /// Keep the typed name untouched.
    KeepUser,
}

/// Errors returned by the navigation core
#[derive(Error, Debug)]
pub enum FsError {
    /// Absolute-path resolution through the OS failed
    #[error("cannot resolve '{path}': {source}")]
    PathResolution {
        /// Input path
        path: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
    /// A real directory could not be listed
    #[error("cannot read directory '{path}': {source}")]
    DirectoryUnreadable {
        /// Directory path
        path: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
    /// The file is missing or is not a readable archive
    #[error("cannot open archive '{path}': {reason}")]
    ArchiveOpen {
        /// Archive path
        path: String,
        /// Decoder or OS message
        reason: String,
    },
    /// No entry with that path inside the archive
    #[error("'{entry}' not found in archive '{archive}'")]
    ArchiveEntryNotFound {
        /// Archive path
        archive: String,
        /// Path inside the archive
        entry: String,
    },
    /// Decoding an archive entry failed
    #[error("cannot read '{entry}' from archive '{archive}': {reason}")]
    ArchiveRead {
        /// Archive path
        archive: String,
        /// Path inside the archive
        entry: String,
        /// Decoder message
        reason: String,
    },
    /// Operation not available at this location (archives are read-only)
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// Target already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Invalid, empty or non-existing path
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
