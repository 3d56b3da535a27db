//! Mode and modal governance.
//!
//! # Responsibility
//! - Hold the process-wide run/edit mode and the modal stack.
//! - Admit or reject launch and window-open requests before any state changes.
//!
//! # Invariants
//! - The modal gate is consulted first; a rejection changes nothing except
//!   the shake cue on the active modal.
//! - In edit mode only the editor may launch.
//! - Leaving edit mode is refused while the editor reports unsaved changes.
//! - At most one modal is interactive at a time.

use crate::model::app::AppId;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// User apps may execute.
    #[default]
    Runner,
    /// Only the editor may launch; projects are inspected, not run.
    Edit,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runner => "runner",
            Self::Edit => "edit",
        }
    }
}

/// Identifier of an exclusive dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModalId(String);

impl ModalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ModalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Expected control-flow refusal, surfaced only as a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    /// A non-editor app was requested while in edit mode.
    EditModeLocked { app: AppId, name: String },
    /// The editor was requested while in runner mode.
    EditorRequiresEditMode,
    ModalActive { modal: ModalId },
    UnsavedChanges,
    /// A second modal was pushed while one is active.
    ModalAlreadyOpen { modal: ModalId },
}

impl GateRejection {
    /// User-visible notice text; `None` for silent rejections.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::EditModeLocked { name, .. } => Some(format!("Opened \"{name}\" in Code Studio")),
            Self::EditorRequiresEditMode => Some("Restricted: Switch to Edit Mode".to_string()),
            Self::ModalActive { .. } | Self::ModalAlreadyOpen { .. } => None,
            Self::UnsavedChanges => Some("Save your changes before switching modes".to_string()),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EditModeLocked { .. } => "edit_mode_locked",
            Self::EditorRequiresEditMode => "editor_requires_edit_mode",
            Self::ModalActive { .. } => "modal_active",
            Self::UnsavedChanges => "unsaved_changes",
            Self::ModalAlreadyOpen { .. } => "modal_already_open",
        }
    }
}

impl Display for GateRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EditModeLocked { app, .. } => {
                write!(f, "app `{app}` cannot run while in edit mode")
            }
            Self::EditorRequiresEditMode => write!(f, "editor requires edit mode"),
            Self::ModalActive { modal } => write!(f, "modal `{modal}` must be dismissed first"),
            Self::UnsavedChanges => write!(f, "editor reports unsaved changes"),
            Self::ModalAlreadyOpen { modal } => write!(f, "modal `{modal}` is already open"),
        }
    }
}

impl Error for GateRejection {}

/// Result of a mode switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: Mode,
    pub to: Mode,
    /// Entering runner mode requires the editor window to be hidden.
    pub hide_editor: bool,
}

/// What is being admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchTarget<'a> {
    Editor,
    App { id: &'a AppId, name: &'a str },
    /// Host-rendered window such as the launcher; only the modal gate applies.
    Internal,
}

#[derive(Debug, Default)]
pub struct Governor {
    mode: Mode,
    modals: Vec<ModalId>,
    unsaved_changes: bool,
    shake_pending: bool,
}

impl Governor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Checks both gates for a launch.
    pub fn admit_launch(&mut self, target: LaunchTarget<'_>) -> Result<(), GateRejection> {
        self.admit_window()?;
        let decision = match (self.mode, target) {
            (_, LaunchTarget::Internal) => Ok(()),
            (Mode::Edit, LaunchTarget::Editor) | (Mode::Runner, LaunchTarget::App { .. }) => Ok(()),
            (Mode::Runner, LaunchTarget::Editor) => Err(GateRejection::EditorRequiresEditMode),
            (Mode::Edit, LaunchTarget::App { id, name }) => Err(GateRejection::EditModeLocked {
                app: id.clone(),
                name: name.to_string(),
            }),
        };
        if let Err(rejection) = &decision {
            debug!(
                "event=gate module=governor status=rejected gate=mode reason={}",
                rejection.code()
            );
        }
        decision
    }

    /// Modal gate alone; flags the active modal for a shake cue on rejection.
    pub fn admit_window(&mut self) -> Result<(), GateRejection> {
        if let Some(modal) = self.modals.last() {
            self.shake_pending = true;
            debug!("event=gate module=governor status=rejected gate=modal modal={modal}");
            return Err(GateRejection::ModalActive {
                modal: modal.clone(),
            });
        }
        Ok(())
    }

    /// Editor-side dirty flag consulted when leaving edit mode.
    pub fn set_unsaved_changes(&mut self, unsaved: bool) {
        self.unsaved_changes = unsaved;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn switch_mode(&mut self, to: Mode) -> Result<ModeChange, GateRejection> {
        let from = self.mode;
        if from == Mode::Edit && to == Mode::Runner && self.unsaved_changes {
            info!("event=mode_switch module=governor status=rejected from=edit to=runner reason=unsaved_changes");
            return Err(GateRejection::UnsavedChanges);
        }
        self.mode = to;
        info!(
            "event=mode_switch module=governor status=ok from={} to={}",
            from.as_str(),
            to.as_str()
        );
        Ok(ModeChange {
            from,
            to,
            hide_editor: to == Mode::Runner,
        })
    }

    pub fn push_modal(&mut self, modal: ModalId) -> Result<(), GateRejection> {
        if let Some(active) = self.modals.last() {
            self.shake_pending = true;
            return Err(GateRejection::ModalAlreadyOpen {
                modal: active.clone(),
            });
        }
        self.modals.push(modal);
        Ok(())
    }

    /// Pops the top modal; `None` when the stack is empty.
    pub fn pop_modal(&mut self) -> Option<ModalId> {
        let popped = self.modals.pop();
        if self.modals.is_empty() {
            self.shake_pending = false;
        }
        popped
    }

    pub fn active_modal(&self) -> Option<&ModalId> {
        self.modals.last()
    }

    pub fn modal_depth(&self) -> usize {
        self.modals.len()
    }

    /// Consumes the pending shake cue for the active modal.
    pub fn take_shake_cue(&mut self) -> bool {
        std::mem::take(&mut self.shake_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::{GateRejection, Governor, LaunchTarget, ModalId, Mode};
    use crate::model::app::AppId;

    #[test]
    fn runner_admits_apps_and_refuses_editor() {
        let mut governor = Governor::new();
        let id = AppId::new("a");
        assert!(governor
            .admit_launch(LaunchTarget::App { id: &id, name: "A" })
            .is_ok());
        assert_eq!(
            governor.admit_launch(LaunchTarget::Editor),
            Err(GateRejection::EditorRequiresEditMode)
        );
    }

    #[test]
    fn edit_mode_locks_user_apps() {
        let mut governor = Governor::new();
        governor.switch_mode(Mode::Edit).expect("enter edit");
        let id = AppId::new("a");
        let rejection = governor
            .admit_launch(LaunchTarget::App { id: &id, name: "Game" })
            .expect_err("locked");
        assert_eq!(
            rejection.notice().as_deref(),
            Some("Opened \"Game\" in Code Studio")
        );
        assert!(governor.admit_launch(LaunchTarget::Editor).is_ok());
    }

    #[test]
    fn unsaved_changes_block_leaving_edit() {
        let mut governor = Governor::new();
        governor.switch_mode(Mode::Edit).expect("enter edit");
        governor.set_unsaved_changes(true);
        assert_eq!(
            governor.switch_mode(Mode::Runner),
            Err(GateRejection::UnsavedChanges)
        );
        assert_eq!(governor.mode(), Mode::Edit);

        governor.set_unsaved_changes(false);
        let change = governor.switch_mode(Mode::Runner).expect("leave edit");
        assert!(change.hide_editor);
    }

    #[test]
    fn modal_gate_precedes_mode_gate_and_sets_shake() {
        let mut governor = Governor::new();
        governor
            .push_modal(ModalId::new("confirm-delete"))
            .expect("push");
        assert!(matches!(
            governor.admit_launch(LaunchTarget::Editor),
            Err(GateRejection::ModalActive { .. })
        ));
        assert!(governor.take_shake_cue());
        assert!(!governor.take_shake_cue());
        assert_eq!(governor.mode(), Mode::Runner);
    }

    #[test]
    fn second_modal_is_refused() {
        let mut governor = Governor::new();
        governor.push_modal(ModalId::new("one")).expect("push");
        assert!(governor.push_modal(ModalId::new("two")).is_err());
        assert_eq!(governor.modal_depth(), 1);
        assert_eq!(governor.pop_modal(), Some(ModalId::new("one")));
        assert!(governor.admit_window().is_ok());
    }
}
