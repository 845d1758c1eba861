use crate::core::{DialogMode, SaveExtensionPolicy};
use crate::filter::ExtensionFilter;
use crate::known_dirs::KnownDirectoryCache;

/// Settings shared by every dialog session of an application.
///
/// Examples
/// ```
/// use dear_filesystem::{BrowserConfig, SaveExtensionPolicy};
/// let cfg = BrowserConfig::new()
///     .allow_directory_creation(false)
///     .save_extension_policy(SaveExtensionPolicy::Replace);
/// assert!(!cfg.directory_creation_allowed());
/// ```
#[derive(Clone, Debug)]
pub struct BrowserConfig {
    pub(crate) known_dirs: KnownDirectoryCache,
    pub(crate) show_known_dirs: bool,
    pub(crate) refresh_known_dirs_on_open: bool,
    pub(crate) allow_directory_creation: bool,
    pub(crate) allow_filtering: bool,
    pub(crate) filter_save_names: bool,
    pub(crate) save_extension_policy: SaveExtensionPolicy,
    pub(crate) browse_per_row: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            known_dirs: KnownDirectoryCache::default(),
            show_known_dirs: true,
            refresh_known_dirs_on_open: false,
            allow_directory_creation: true,
            allow_filtering: true,
            filter_save_names: true,
            save_extension_policy: SaveExtensionPolicy::default(),
            browse_per_row: false,
        }
    }
}

impl BrowserConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific known-directories cache (clones share snapshots).
    pub fn known_directories(mut self, cache: KnownDirectoryCache) -> Self {
        self.known_dirs = cache;
        self
    }
    /// Show the known-directories section
    pub fn show_known_directories(mut self, yes: bool) -> Self {
        self.show_known_dirs = yes;
        self
    }
    /// Re-detect known directories every time a dialog is triggered
    pub fn refresh_known_directories_on_open(mut self, yes: bool) -> Self {
        self.refresh_known_dirs_on_open = yes;
        self
    }
    /// Offer "create directory" in folder and save dialogs
    pub fn allow_directory_creation(mut self, yes: bool) -> Self {
        self.allow_directory_creation = yes;
        self
    }
    /// Offer the name filter box
    pub fn allow_filtering(mut self, yes: bool) -> Self {
        self.allow_filtering = yes;
        self
    }
    /// Reconcile typed save names with the extension filter
    pub fn filter_save_names(mut self, yes: bool) -> Self {
        self.filter_save_names = yes;
        self
    }
    /// How typed save names are reconciled with the extension filter
    pub fn save_extension_policy(mut self, policy: SaveExtensionPolicy) -> Self {
        self.save_extension_policy = policy;
        self
    }
    /// Display hint: lay entries out row by row instead of column by column
    pub fn browse_per_row(mut self, yes: bool) -> Self {
        self.browse_per_row = yes;
        self
    }

    /// Shared known-directories cache.
    pub fn known_directories_cache(&self) -> &KnownDirectoryCache {
        &self.known_dirs
    }

    /// Whether the known-directories section is shown.
    pub fn known_directories_shown(&self) -> bool {
        self.show_known_dirs
    }

    /// Whether directory creation may be offered.
    pub fn directory_creation_allowed(&self) -> bool {
        self.allow_directory_creation
    }

    /// Whether the name filter box is offered.
    pub fn filtering_allowed(&self) -> bool {
        self.allow_filtering
    }

    /// Display hint for the UI.
    pub fn browses_per_row(&self) -> bool {
        self.browse_per_row
    }
}

/// What a single dialog opening asks for.
///
/// Examples
/// ```
/// use dear_filesystem::{DialogMode, DialogRequest};
/// let req = DialogRequest::new(DialogMode::SaveFile)
///     .directory("/tmp")
///     .extensions(".png;.jpg")
///     .file_name("some/dir/result.png");
/// assert_eq!(req.file_name_hint(), Some("result.png"));
/// ```
#[derive(Clone, Debug)]
pub struct DialogRequest {
    pub(crate) mode: DialogMode,
    pub(crate) directory: Option<String>,
    pub(crate) extensions: ExtensionFilter,
    pub(crate) file_name: Option<String>,
}

impl DialogRequest {
    /// Create a new request with the given mode
    pub fn new(mode: DialogMode) -> Self {
        Self {
            mode,
            directory: None,
            extensions: ExtensionFilter::default(),
            file_name: None,
        }
    }
    /// Starting directory (may point into an archive); defaults to the
    /// working directory
    pub fn directory(mut self, dir: impl Into<String>) -> Self {
        self.directory = Some(dir.into());
        self
    }
    /// Wanted extensions, semicolon-separated (`".png;.jpg"`)
    pub fn extensions(mut self, wanted: &str) -> Self {
        self.extensions = ExtensionFilter::wanted(wanted);
        self
    }
    /// Full extension filter
    pub fn extension_filter(mut self, filter: ExtensionFilter) -> Self {
        self.extensions = filter;
        self
    }
    /// Starting file name for save dialogs; only the final segment is kept
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.file_name = Some(crate::path::file_name(&name).to_string());
        self
    }

    /// Mode of the dialog.
    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    /// Starting file name, reduced to its final segment.
    pub fn file_name_hint(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}
