//! Core engine of the Stax desktop shell.
//!
//! Turns authored multi-file projects into self-contained sandboxed documents
//! and manages the windows they run in.

pub mod bridge;
pub mod compositor;
pub mod config;
pub mod db;
pub mod governor;
pub mod linker;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sandbox;
pub mod service;

pub use bridge::{BridgeHub, BridgeMessage, BridgeRouter, BridgeSender, HostEvent, LogLevel};
pub use compositor::{
    Compositor, DockAction, Geometry, OpenOutcome, OpenRequest, Placement, SavedGeometry,
    WindowState, WindowSurface,
};
pub use config::{ConfigError, ShellConfig, Viewport};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, StoreLocation};
pub use governor::{GateRejection, Governor, ModalId, Mode};
pub use linker::{ContentHandle, HandleMap, HandleStore, Linker, ResolveError, ResolvedDocument};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::app::{AppId, AppKind, AppRecord, IconRef};
pub use model::import::{import_batch, ImportFile, ImportOutcome};
pub use model::vfs::{merge, normalize_path, FileEntry, FileKind, Vfs, VfsError};
pub use repo::app_repo::{AppStore, RepoError, RepoResult, SqliteAppStore};
pub use repo::geometry_repo::{GeometryStore, MemoryGeometryStore, SqliteGeometryStore};
pub use sandbox::{HeadlessSandboxHost, SandboxError, SandboxHost, SandboxPolicy};
pub use service::{
    BufferedNotifier, Desktop, EditorSurface, HeadlessEditor, LaunchError, LaunchOutcome,
    Notifier,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
