//! Sandbox runtime contracts.
//!
//! The host (browser frame, webview, headless harness) implements
//! `SandboxHost`. Code inside a mounted document can only reach the host
//! through the message bridge; nothing here hands out host state.

pub mod capability;
pub mod runtime;

pub use capability::{SandboxCapability, SandboxCapabilityError, SandboxPolicy};
pub use runtime::{HeadlessSandboxHost, SandboxError, SandboxHost};
