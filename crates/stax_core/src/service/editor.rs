//! Editing surface collaborator.

use crate::model::app::{AppId, AppRecord};

/// The code editor as seen from the desktop.
pub trait EditorSurface {
    /// Loads `project` into the editor, or an empty workspace for `None`.
    fn open_project(&mut self, project: Option<&AppRecord>);
    /// Hides the editor; called when leaving edit mode.
    fn hide(&mut self);
}

/// Editor stand-in that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessEditor {
    project: Option<AppId>,
    visible: bool,
    handoffs: usize,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<&AppId> {
        self.project.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handoffs(&self) -> usize {
        self.handoffs
    }
}

impl EditorSurface for HeadlessEditor {
    fn open_project(&mut self, project: Option<&AppRecord>) {
        self.project = project.map(|record| record.id.clone());
        self.visible = true;
        self.handoffs += 1;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}
