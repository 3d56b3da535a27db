//! Dock entries for running and system apps.

use crate::model::app::AppId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockEntry {
    pub id: AppId,
    pub title: String,
    /// System entries stay in the dock after their window closes.
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dock {
    entries: Vec<DockEntry>,
}

impl Default for Dock {
    fn default() -> Self {
        Self::with_system_entries()
    }
}

impl Dock {
    pub fn with_system_entries() -> Self {
        let pinned = |id: AppId, title: &str| DockEntry {
            id,
            title: title.to_string(),
            pinned: true,
        };
        Self {
            entries: vec![
                pinned(AppId::finder(), "Finder"),
                pinned(AppId::editor(), "Code Studio"),
                pinned(AppId::settings(), "Settings"),
            ],
        }
    }

    /// Adds a running app; duplicates and preview scopes are ignored.
    pub fn add(&mut self, id: &AppId, title: &str) -> bool {
        if id.is_preview() || self.contains(id) {
            return false;
        }
        self.entries.push(DockEntry {
            id: id.clone(),
            title: title.to_string(),
            pinned: id.is_system(),
        });
        true
    }

    /// Removes a non-pinned entry; pinned entries are kept.
    pub fn remove(&mut self, id: &AppId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.pinned || &entry.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: &AppId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    pub fn entries(&self) -> &[DockEntry] {
        self.entries.as_slice()
    }
}
