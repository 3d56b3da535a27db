//! Desktop use-case services.
//!
//! # Responsibility
//! - Orchestrate governor, compositor, linker and sandbox into launch flows.
//! - Define the external collaborators the core talks to (notifier, editor).

pub mod catalog;
pub mod desktop;
pub mod editor;
pub mod notify;

pub use catalog::{catalog_stacks, desktop_icons, filter_by_stack, IconSource};
pub use desktop::{
    ConsoleEntry, Desktop, LaunchError, LaunchOutcome, LaunchStart, PendingLaunch,
};
pub use editor::{EditorSurface, HeadlessEditor};
pub use notify::{BufferedNotifier, LogNotifier, Notice, Notifier};
