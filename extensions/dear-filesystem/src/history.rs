use crate::location::Location;

/// Cursor position of a [`NavigationHistory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryState {
    /// Nothing visited yet
    Empty,
    /// Cursor on the entry at this index
    At(usize),
}

/// Browser-style back/forward history of locations.
///
/// Switching to a new place drops every entry ahead of the cursor and appends
/// the new one; back and forward only move the cursor.
#[derive(Clone, Debug, Default)]
pub struct NavigationHistory {
    entries: Vec<Location>,
    cursor: Option<usize>,
}

impl NavigationHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position.
    pub fn state(&self) -> HistoryState {
        match self.cursor {
            Some(i) => HistoryState::At(i),
            None => HistoryState::Empty,
        }
    }

    /// Location under the cursor.
    pub fn current(&self) -> Option<&Location> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    /// Number of stored locations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was visited yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets everything.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Moves to `location`.
    ///
    /// When the target path is a breadcrumb prefix of the current location,
    /// the current split path is reused with a different selected segment.
    /// Returns `false`, leaving the history untouched, when the target is the
    /// current place.
    pub fn switch_to(&mut self, location: Location) -> bool {
        let next = match self.current() {
            Some(cur) if cur.is_same_place(&location) => return false,
            Some(cur) => cur
                .segment_index_for(location.current())
                .and_then(|i| cur.for_segment(i))
                .unwrap_or(location),
            None => location,
        };
        let keep = self.cursor.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(next);
        self.cursor = Some(self.entries.len() - 1);
        true
    }

    /// [`NavigationHistory::switch_to`] with a location built from `path`
    /// (archive segment detected by extension).
    pub fn switch_to_path(&mut self, path: &str) -> bool {
        self.switch_to(Location::from_path(path))
    }

    /// Whether an older entry exists.
    pub fn can_go_back(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    /// Whether a newer entry exists.
    pub fn can_go_forward(&self) -> bool {
        matches!(self.cursor, Some(i) if i + 1 < self.entries.len())
    }

    /// Moves the cursor one entry back.
    pub fn go_back(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    /// Moves the cursor one entry forward.
    pub fn go_forward(&mut self) -> bool {
        if self.can_go_forward() {
            self.cursor = self.cursor.map(|i| i + 1);
            true
        } else {
            false
        }
    }
}
