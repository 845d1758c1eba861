use std::collections::HashMap;

use crate::config::{BrowserConfig, DialogRequest};
use crate::session::{DialogSession, SessionEvent, SessionState};

/// Opaque identifier for a dialog owned by a [`DialogManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DialogId(u64);

/// How a managed dialog ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogResult {
    /// The user chose this path
    Chosen(String),
    /// The user closed the dialog
    Closed,
}

/// Several concurrent dialogs sharing one [`BrowserConfig`].
///
/// The caller opens a dialog and later drives it once per frame with
/// [`DialogManager::update`]; finished dialogs are removed and their result
/// returned.
#[derive(Debug, Default)]
pub struct DialogManager {
    config: BrowserConfig,
    next_id: u64,
    sessions: HashMap<DialogId, DialogSession>,
}

impl DialogManager {
    /// Manager with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager whose dialogs share `config` (and its known-directories cache).
    pub fn with_config(config: BrowserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Opens a dialog over the OS filesystem.
    pub fn open(&mut self, request: DialogRequest) -> DialogId {
        let mut session = DialogSession::new(self.config.clone());
        session.trigger(request);
        self.open_session(session)
    }

    /// Adopts an already configured (and usually triggered) session.
    pub fn open_session(&mut self, session: DialogSession) -> DialogId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = DialogId(self.next_id);
        self.sessions.insert(id, session);
        id
    }

    /// Removes a dialog and returns its session.
    pub fn close(&mut self, id: DialogId) -> Option<DialogSession> {
        self.sessions.remove(&id)
    }

    /// Returns `true` if the dialog exists in the manager.
    pub fn contains(&self, id: DialogId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Number of open dialogs.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no dialog is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Immutable access to a dialog.
    pub fn session(&self, id: DialogId) -> Option<&DialogSession> {
        self.sessions.get(&id)
    }

    /// Mutable access to a dialog.
    pub fn session_mut(&mut self, id: DialogId) -> Option<&mut DialogSession> {
        self.sessions.get_mut(&id)
    }

    /// Applies `events`, then ticks the dialog.
    ///
    /// Once the dialog is confirmed or closed it is removed from the manager
    /// and the result is returned.
    pub fn update(
        &mut self,
        id: DialogId,
        events: impl IntoIterator<Item = SessionEvent>,
    ) -> Option<DialogResult> {
        let session = self.sessions.get_mut(&id)?;
        for event in events {
            session.handle_event(event);
            if !session.state().is_open() {
                break;
            }
        }
        session.tick();
        let result = match session.state() {
            SessionState::Confirmed => session
                .chosen_path()
                .map(|p| DialogResult::Chosen(p.to_string()))
                .unwrap_or(DialogResult::Closed),
            SessionState::Closed => DialogResult::Closed,
            SessionState::AwaitingFirstScan | SessionState::Browsing => return None,
        };
        self.sessions.remove(&id);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DialogMode;
    use crate::fs::memory::MemoryFs;
    use crate::known_dirs::{KnownDirectories, KnownDirectoryCache};

    fn config() -> BrowserConfig {
        BrowserConfig::new()
            .known_directories(KnownDirectoryCache::with_entries(KnownDirectories::default()))
    }

    fn session(mode: DialogMode) -> DialogSession {
        let fs = MemoryFs::new();
        fs.add_dir("/w/sub").add_file("/w/a.txt", b"a");
        let mut s = DialogSession::with_filesystem(config(), fs);
        s.trigger(DialogRequest::new(mode).directory("/w"));
        s
    }

    #[test]
    fn open_close_roundtrip() {
        let mut mgr = DialogManager::with_config(config());
        let id1 = mgr.open_session(session(DialogMode::OpenFile));
        let id2 = mgr.open_session(session(DialogMode::SaveFile));
        assert_ne!(id1, id2);
        assert_eq!(mgr.len(), 2);

        let s1 = mgr.close(id1).unwrap();
        assert_eq!(s1.mode(), DialogMode::OpenFile);
        assert!(!mgr.contains(id1));
        assert!(mgr.contains(id2));
    }

    #[test]
    fn update_removes_finished_dialogs() {
        let mut mgr = DialogManager::new();
        let open = mgr.open_session(session(DialogMode::OpenFile));
        let folder = mgr.open_session(session(DialogMode::SelectFolder));

        assert_eq!(mgr.update(open, []), None);
        assert_eq!(mgr.session(open).map(|s| s.state()), Some(SessionState::Browsing));
        assert_eq!(
            mgr.update(open, [SessionEvent::ActivateFile(0)]),
            Some(DialogResult::Chosen("/w/a.txt".into()))
        );
        assert!(!mgr.contains(open));

        assert_eq!(mgr.update(folder, []), None);
        assert_eq!(mgr.update(folder, [SessionEvent::Close]), Some(DialogResult::Closed));
        assert!(mgr.is_empty());
        assert_eq!(mgr.update(folder, []), None);
    }
}
