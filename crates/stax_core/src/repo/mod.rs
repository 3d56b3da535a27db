//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the keyed app-record store and the host-local geometry store.
//! - Keep SQL details out of the desktop orchestration layer.
//!
//! # Invariants
//! - App files are stored and returned in VFS insertion order.
//! - A missing geometry entry is `None`, never an error.

pub mod app_repo;
pub mod geometry_repo;
