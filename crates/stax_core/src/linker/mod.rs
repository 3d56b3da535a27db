//! Resolution/linker: turns a VFS snapshot into one self-contained document.
//!
//! # Responsibility
//! - Pick the entry document.
//! - Materialize every file as a launch-scoped content handle.
//! - Rewrite relative references in the entry markup to those handles.
//! - Inject the message bridge bootstrap.
//!
//! # Invariants
//! - Candidate paths are rewritten longest-first.
//! - Unmatched or malformed references are left byte-for-byte untouched.
//! - Every handle produced for a launch is recorded in its `HandleMap`.

mod bootstrap;
pub mod handles;
pub mod mime;
pub mod resolve;

pub use handles::{ContentHandle, HandleError, HandleMap, HandleStore, Materialized};
pub use mime::mime_for_path;
pub use resolve::{Linker, ResolveError, ResolvedDocument};
