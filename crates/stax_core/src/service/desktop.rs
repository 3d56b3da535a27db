//! Desktop orchestration service.
//!
//! # Responsibility
//! - Run the launch flow: governor gates, window allocation, resolution,
//!   sandbox hand-off.
//! - Tear down failed or closed launches completely.
//! - Route bridge traffic from live instances to host-facing events.
//! - Apply persistence outcomes to in-memory state and the notifier.
//!
//! # Invariants
//! - Every failure path closes the window, releases its handles, unmounts the
//!   sandbox and drops its dock entry before the failure is reported.
//! - Bridge messages from instances without a live window are discarded.
//! - A persistence failure leaves the caller's record untouched.
//!
//! # See also
//! - crate::compositor for the window state machine.
//! - crate::governor for the mode and modal gates.

use crate::bridge::{BridgeHub, BridgeRouter, BridgeSender, DispatchContext, HostEvent, LogLevel};
use crate::compositor::{
    ClosedWindow, Compositor, DockAction, OpenOutcome, OpenRequest, SavedGeometry, WindowSurface,
};
use crate::config::ShellConfig;
use crate::governor::{GateRejection, Governor, LaunchTarget, ModalId, Mode, ModeChange};
use crate::linker::handles::{HandleMap, HandleStore};
use crate::linker::resolve::{Linker, ResolveError, ResolvedDocument};
use crate::model::app::{AppId, AppRecord, IconRef};
use crate::repo::app_repo::{AppStore, RepoError};
use crate::repo::geometry_repo::GeometryStore;
use crate::sandbox::{SandboxError, SandboxHost, SandboxPolicy};
use crate::service::catalog::{resolve_icon, IconSource};
use crate::service::editor::EditorSurface;
use crate::service::notify::Notifier;
use log::{debug, error, info, warn};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const NOTICE_LAUNCH_FAILED: &str = "App crashed on launch";
pub const NOTICE_SAVED: &str = "Saved Successfully!";
pub const NOTICE_SAVE_FAILED: &str = "Save Failed";
pub const NOTICE_DELETED: &str = "App Deleted";
pub const NOTICE_DELETE_FAILED: &str = "Delete Failed";
pub const NOTICE_PIN_FAILED: &str = "Could not update desktop shortcut";

#[derive(Debug)]
pub enum LaunchError {
    Gate(GateRejection),
    Resolve(ResolveError),
    Sandbox(SandboxError),
    Repo(RepoError),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gate(err) => write!(f, "launch refused: {err}"),
            Self::Resolve(err) => write!(f, "resolution failed: {err}"),
            Self::Sandbox(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LaunchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gate(err) => Some(err),
            Self::Resolve(err) => Some(err),
            Self::Sandbox(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<GateRejection> for LaunchError {
    fn from(value: GateRejection) -> Self {
        Self::Gate(value)
    }
}

impl From<ResolveError> for LaunchError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

impl From<SandboxError> for LaunchError {
    fn from(value: SandboxError) -> Self {
        Self::Sandbox(value)
    }
}

impl From<RepoError> for LaunchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Opened,
    /// Already open; brought to front.
    Focused,
    /// The window was closed before resolution finished.
    Discarded,
}

/// Window allocated, resolution still to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLaunch {
    id: AppId,
    /// Allocation this launch resolves for; a reopened window gets a new one.
    launch_token: u64,
    /// Read-only snapshot; later edits need a relaunch.
    snapshot: AppRecord,
    entry_override: Option<String>,
}

impl PendingLaunch {
    pub fn id(&self) -> &AppId {
        &self.id
    }

    /// Runs `path` instead of the discovered entry when it exists in the VFS.
    pub fn with_entry_override(mut self, path: impl Into<String>) -> Self {
        self.entry_override = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStart {
    Pending(PendingLaunch),
    Done(LaunchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: LogLevel,
    pub text: String,
}

pub struct Desktop<H, N, E, G>
where
    H: SandboxHost,
    N: Notifier,
    E: EditorSurface,
    G: GeometryStore,
{
    config: ShellConfig,
    linker: Linker,
    governor: Governor,
    compositor: Compositor,
    handles: HandleStore,
    policy: SandboxPolicy,
    hub: BridgeHub,
    router: BridgeRouter,
    sandbox: H,
    notifier: N,
    editor: E,
    geometry: G,
    console: HashMap<AppId, VecDeque<ConsoleEntry>>,
    preview: Option<(AppId, HandleMap)>,
    icon_handles: HashMap<AppId, HandleMap>,
}

impl<H, N, E, G> Desktop<H, N, E, G>
where
    H: SandboxHost,
    N: Notifier,
    E: EditorSurface,
    G: GeometryStore,
{
    pub fn new(config: ShellConfig, sandbox: H, notifier: N, editor: E, geometry: G) -> Self {
        Self {
            linker: Linker::from_config(&config),
            compositor: Compositor::new(config.clone()),
            handles: HandleStore::new(config.handle_scheme.clone()),
            governor: Governor::new(),
            policy: SandboxPolicy::default(),
            hub: BridgeHub::new(),
            router: BridgeRouter::with_default_handlers(),
            sandbox,
            notifier,
            editor,
            geometry,
            console: HashMap::new(),
            preview: None,
            icon_handles: HashMap::new(),
            config,
        }
    }

    /// Replaces the bridge dispatch table.
    pub fn with_router(mut self, router: BridgeRouter) -> Self {
        self.router = router;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.governor.mode()
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn handle_store(&self) -> &HandleStore {
        &self.handles
    }

    pub fn sandbox(&self) -> &H {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut H {
        &mut self.sandbox
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn geometry_store(&self) -> &G {
        &self.geometry
    }

    /// Full launch: gates, window, resolution, sandbox hand-off.
    pub fn open_app(&mut self, record: &AppRecord) -> Result<LaunchOutcome, LaunchError> {
        match self.begin_launch(record)? {
            LaunchStart::Pending(pending) => self.complete_launch(pending),
            LaunchStart::Done(outcome) => Ok(outcome),
        }
    }

    /// First half of a launch: admits the request and allocates the window.
    ///
    /// In edit mode a user app is refused and handed to the editor instead.
    pub fn begin_launch(&mut self, record: &AppRecord) -> Result<LaunchStart, LaunchError> {
        let target = if record.is_editor() {
            LaunchTarget::Editor
        } else if record.is_internal() {
            LaunchTarget::Internal
        } else {
            LaunchTarget::App {
                id: &record.id,
                name: record.name.as_str(),
            }
        };

        if let Err(rejection) = self.governor.admit_launch(target) {
            if matches!(rejection, GateRejection::EditModeLocked { .. }) {
                self.hand_to_editor(record, &rejection);
            } else if let Some(notice) = rejection.notice() {
                self.notifier.notify(notice.as_str(), true);
            }
            return Err(LaunchError::Gate(rejection));
        }

        if record.is_editor() || record.is_internal() {
            let request = OpenRequest::internal(record.id.clone(), record.name.clone());
            let outcome = self.compositor.open(request, None);
            if record.is_editor() && outcome == OpenOutcome::Opened {
                self.editor.open_project(None);
            }
            return Ok(LaunchStart::Done(open_outcome(outcome)));
        }

        if self.compositor.contains(&record.id) {
            self.compositor.focus(&record.id);
            return Ok(LaunchStart::Done(LaunchOutcome::Focused));
        }

        let saved = self.load_geometry(&record.id);
        self.compositor.open(
            OpenRequest::sandboxed(record.id.clone(), record.name.clone()),
            saved,
        );
        let Some(launch_token) = self.compositor.launch_token(&record.id) else {
            return Ok(LaunchStart::Done(LaunchOutcome::Discarded));
        };

        let mut snapshot = record.clone();
        snapshot.sanitize();
        info!(
            "event=app_launch module=desktop status=start app_id={} files={}",
            record.id,
            snapshot.files.len()
        );
        Ok(LaunchStart::Pending(PendingLaunch {
            id: record.id.clone(),
            launch_token,
            snapshot,
            entry_override: None,
        }))
    }

    /// Second half of a launch: resolves the snapshot and mounts it.
    ///
    /// A window closed in between, or closed and reopened by a newer launch,
    /// makes this a no-op.
    pub fn complete_launch(&mut self, pending: PendingLaunch) -> Result<LaunchOutcome, LaunchError> {
        let started_at = Instant::now();
        let PendingLaunch {
            id,
            launch_token,
            snapshot,
            entry_override,
        } = pending;

        match self.compositor.launch_token(&id) {
            Some(current) if current == launch_token => {}
            Some(_) => {
                debug!("event=app_launch module=desktop status=dropped app_id={id} reason=superseded");
                return Ok(LaunchOutcome::Discarded);
            }
            None => {
                debug!("event=app_launch module=desktop status=dropped app_id={id} reason=window_closed");
                return Ok(LaunchOutcome::Discarded);
            }
        }

        if snapshot.files.is_empty() && !snapshot.is_redirect() {
            return Err(self.fail_launch(&id, ResolveError::EmptyVfs.into()));
        }

        let resolved = match self.linker.resolve(
            &snapshot,
            id.as_str(),
            entry_override.as_deref(),
            &mut self.handles,
        ) {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail_launch(&id, err.into())),
        };

        let ResolvedDocument {
            document, handles, ..
        } = resolved;
        if let Err(orphaned) = self.compositor.attach_handles(&id, launch_token, handles) {
            let released = self.handles.revoke_map(&orphaned);
            debug!("event=app_launch module=desktop status=dropped app_id={id} released={released}");
            return Ok(LaunchOutcome::Discarded);
        }

        if let Err(err) = self.sandbox.mount(&id, document.as_str(), &self.policy) {
            return Err(self.fail_launch(&id, err.into()));
        }
        self.compositor.mark_live(&id);

        info!(
            "event=app_launch module=desktop status=ok app_id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(LaunchOutcome::Opened)
    }

    fn fail_launch(&mut self, id: &AppId, err: LaunchError) -> LaunchError {
        error!("event=app_launch module=desktop status=error app_id={id} error={err}");
        self.teardown(id);
        self.notifier.notify(NOTICE_LAUNCH_FAILED, true);
        err
    }

    fn hand_to_editor(&mut self, record: &AppRecord, rejection: &GateRejection) {
        self.editor.open_project(Some(record));
        let editor = AppRecord::editor_shell();
        self.compositor
            .open(OpenRequest::internal(editor.id, editor.name), None);
        if let Some(notice) = rejection.notice() {
            self.notifier.notify(notice.as_str(), false);
        }
        info!(
            "event=app_launch module=desktop status=rejected app_id={} reason=edit_mode handoff=editor",
            record.id
        );
    }

    fn load_geometry(&self, id: &AppId) -> Option<SavedGeometry> {
        match self.geometry.load(id) {
            Ok(saved) => saved,
            Err(err) => {
                warn!("event=geometry_load module=desktop status=error app_id={id} error={err}");
                None
            }
        }
    }

    fn save_geometry(&self, id: &AppId, saved: SavedGeometry) {
        if let Err(err) = self.geometry.save(id, saved) {
            warn!("event=geometry_save module=desktop status=error app_id={id} error={err}");
        }
    }

    /// Removes every trace of an instance; safe in any window state.
    fn teardown(&mut self, id: &AppId) -> Option<ClosedWindow> {
        let closed = self.compositor.close(id)?;
        let released = self.handles.revoke_map(&closed.handles);
        if closed.surface == WindowSurface::Sandboxed {
            self.sandbox.unmount(id);
        }
        self.console.remove(id);
        debug!("event=window_teardown module=desktop status=ok app_id={id} released={released}");
        Some(closed)
    }

    /// Closes a window from any state and releases its handles.
    pub fn close(&mut self, id: &AppId) -> bool {
        let Some(closed) = self.teardown(id) else {
            return false;
        };
        if closed.id == AppId::editor() {
            self.editor.hide();
        }
        true
    }

    /// First load signal from the sandbox; clears the loading indicator.
    pub fn on_sandbox_loaded(&mut self, id: &AppId) -> bool {
        self.compositor.mark_loaded(id)
    }

    pub fn focus(&mut self, id: &AppId) -> bool {
        self.compositor.focus(id)
    }

    pub fn minimize(&mut self, id: &AppId) -> bool {
        self.compositor.minimize(id)
    }

    pub fn toggle_maximize(&mut self, id: &AppId) -> Option<bool> {
        self.compositor.toggle_maximize(id)
    }

    pub fn begin_drag(&mut self, id: &AppId, pointer: (i32, i32)) -> bool {
        self.compositor.begin_drag(id, pointer)
    }

    pub fn drag_to(&mut self, pointer: (i32, i32)) -> bool {
        self.compositor.drag_to(pointer)
    }

    /// Ends a drag and persists the final geometry.
    pub fn end_drag(&mut self) -> Option<SavedGeometry> {
        let (id, saved) = self.compositor.end_drag()?;
        self.save_geometry(&id, saved);
        Some(saved)
    }

    pub fn resize(&mut self, id: &AppId, width: i32, height: i32) -> Option<SavedGeometry> {
        let saved = self.compositor.resize(id, width, height)?;
        self.save_geometry(id, saved);
        Some(saved)
    }

    pub fn dock_click(&mut self, id: &AppId) -> DockAction {
        self.compositor.dock_click(id)
    }

    /// Opens or closes the launcher; returns whether it is now open.
    pub fn toggle_launcher(&mut self) -> Result<bool, GateRejection> {
        let finder = AppRecord::finder_shell();
        if self.compositor.contains(&finder.id) {
            self.close(&finder.id);
            return Ok(false);
        }
        self.governor.admit_window()?;
        self.compositor
            .open(OpenRequest::internal(finder.id, finder.name), None);
        Ok(true)
    }

    /// Editor hand-off: resolves `record` under its preview scope.
    ///
    /// The previous preview's handles are released first.
    pub fn preview(
        &mut self,
        record: &AppRecord,
        entry_override: Option<&str>,
    ) -> Result<ResolvedDocument, ResolveError> {
        self.release_preview();
        let scope = record.id.preview_scope();
        let mut snapshot = record.clone();
        snapshot.sanitize();
        let resolved =
            self.linker
                .resolve(&snapshot, scope.as_str(), entry_override, &mut self.handles)?;
        self.preview = Some((scope, resolved.handles.clone()));
        Ok(resolved)
    }

    /// Releases the active preview, if any.
    pub fn release_preview(&mut self) -> usize {
        match self.preview.take() {
            Some((scope, map)) => {
                self.console.remove(&scope);
                self.handles.revoke_map(&map)
            }
            None => 0,
        }
    }

    pub fn preview_scope(&self) -> Option<&AppId> {
        self.preview.as_ref().map(|(scope, _)| scope)
    }

    /// Editor dirty flag, consulted when leaving edit mode.
    pub fn report_unsaved_changes(&mut self, unsaved: bool) {
        self.governor.set_unsaved_changes(unsaved);
    }

    /// Switches mode; entering runner closes the editor and its preview.
    pub fn switch_mode(&mut self, to: Mode) -> Result<ModeChange, GateRejection> {
        let change = match self.governor.switch_mode(to) {
            Ok(change) => change,
            Err(rejection) => {
                if let Some(notice) = rejection.notice() {
                    self.notifier.notify(notice.as_str(), true);
                }
                return Err(rejection);
            }
        };
        if change.hide_editor {
            self.teardown(&AppId::editor());
            self.release_preview();
            self.editor.hide();
        }
        Ok(change)
    }

    pub fn open_modal(&mut self, modal: ModalId) -> Result<(), GateRejection> {
        self.governor.push_modal(modal)
    }

    pub fn close_modal(&mut self) -> Option<ModalId> {
        self.governor.pop_modal()
    }

    pub fn take_shake_cue(&mut self) -> bool {
        self.governor.take_shake_cue()
    }

    /// Sandbox-side sender for `instance`.
    pub fn bridge_sender(&self, instance: &AppId) -> BridgeSender {
        self.hub.sender_for(instance)
    }

    /// Dispatches queued bridge messages from live instances.
    ///
    /// Console lines are also kept per instance, bounded by config.
    pub fn pump_bridge(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        for envelope in self.hub.drain() {
            let origin = match self.compositor.window_origin(&envelope.instance) {
                Some(origin) => origin,
                None if self.preview_scope() == Some(&envelope.instance) => (0, 0),
                None => {
                    debug!(
                        "event=bridge_dispatch module=desktop status=dropped instance={} reason=stale",
                        envelope.instance
                    );
                    continue;
                }
            };
            let context = DispatchContext {
                instance: &envelope.instance,
                window_origin: origin,
                title_bar_height: self.config.title_bar_height,
            };
            let Some(event) = self.router.dispatch(&context, &envelope.message) else {
                continue;
            };
            if let HostEvent::ConsoleLine {
                instance,
                level,
                text,
            } = &event
            {
                self.push_console(instance, *level, text.clone());
            }
            events.push(event);
        }
        events
    }

    fn push_console(&mut self, instance: &AppId, level: LogLevel, text: String) {
        let limit = self.config.console_history_limit;
        let lines = self.console.entry(instance.clone()).or_default();
        lines.push_back(ConsoleEntry { level, text });
        while lines.len() > limit {
            lines.pop_front();
        }
    }

    pub fn console_lines(&self, instance: &AppId) -> Vec<&ConsoleEntry> {
        self.console
            .get(instance)
            .map(|lines| lines.iter().collect())
            .unwrap_or_default()
    }

    pub fn clear_console(&mut self, instance: &AppId) {
        self.console.remove(instance);
    }

    /// Saves an edited record; on failure the record is left as it was.
    pub fn save_app<S: AppStore>(
        &mut self,
        store: &S,
        record: &mut AppRecord,
    ) -> Result<(), RepoError> {
        let mut updated = record.clone();
        updated.sanitize();
        updated.touch();
        match store.put(&updated) {
            Ok(_) => {
                *record = updated;
                self.governor.set_unsaved_changes(false);
                self.notifier.notify(NOTICE_SAVED, false);
                Ok(())
            }
            Err(err) => {
                warn!("event=app_save module=desktop status=error app_id={} error={err}", record.id);
                self.notifier.notify(NOTICE_SAVE_FAILED, true);
                Err(err)
            }
        }
    }

    /// Flips the desktop shortcut flag through the store.
    pub fn toggle_pin<S: AppStore>(
        &mut self,
        store: &S,
        record: &mut AppRecord,
    ) -> Result<bool, RepoError> {
        let mut updated = record.clone();
        updated.pinned_to_desktop = !updated.pinned_to_desktop;
        match store.put(&updated) {
            Ok(_) => {
                let pinned = updated.pinned_to_desktop;
                *record = updated;
                let notice = if pinned {
                    "Pinned to Desktop"
                } else {
                    "Removed from Desktop"
                };
                self.notifier.notify(notice, false);
                Ok(pinned)
            }
            Err(err) => {
                warn!("event=app_pin module=desktop status=error app_id={} error={err}", record.id);
                self.notifier.notify(NOTICE_PIN_FAILED, true);
                Err(err)
            }
        }
    }

    /// Deletes a record; its window, if open, is closed on success.
    pub fn delete_app<S: AppStore>(&mut self, store: &S, id: &AppId) -> Result<(), RepoError> {
        if let Err(err) = store.delete(id) {
            warn!("event=app_delete module=desktop status=error app_id={id} error={err}");
            self.notifier.notify(NOTICE_DELETE_FAILED, true);
            return Err(err);
        }
        self.close(id);
        if let Some(map) = self.icon_handles.remove(id) {
            self.handles.revoke_map(&map);
        }
        if self.preview_scope() == Some(&id.preview_scope()) {
            self.release_preview();
        }
        self.notifier.notify(NOTICE_DELETED, false);
        Ok(())
    }

    /// Resolves a record's icon, tracking any handle it needed.
    pub fn resolve_icon(&mut self, record: &AppRecord) -> IconSource {
        if let Some(previous) = self.icon_handles.remove(&record.id) {
            self.handles.revoke_map(&previous);
        }
        let source = resolve_icon(record, &mut self.handles);
        if let (IconSource::Handle(handle), Some(IconRef::VfsPath(path))) =
            (&source, record.icon.as_ref())
        {
            let mut map = HandleMap::new();
            map.insert_path(path.as_str(), handle.clone());
            self.icon_handles.insert(record.id.clone(), map);
        }
        source
    }
}

fn open_outcome(outcome: OpenOutcome) -> LaunchOutcome {
    match outcome {
        OpenOutcome::Opened => LaunchOutcome::Opened,
        OpenOutcome::Focused => LaunchOutcome::Focused,
    }
}
