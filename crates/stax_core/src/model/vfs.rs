//! Virtual file collection and path normalizer.
//!
//! # Responsibility
//! - Map normalized relative paths to text or binary file entries.
//! - Keep insertion order so entry fallback stays deterministic per instance.
//!
//! # Invariants
//! - Keys are always `normalize_path` output; lookups normalize too.
//! - One entry per normalized path; later writes replace earlier ones in place.
//! - Entries are only removed through explicit `remove` calls.

use crate::model::escape_html;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Path of the entry document seeded into empty projects.
pub const DEFAULT_ENTRY_PATH: &str = "index.html";

/// Canonicalizes a project-relative path.
///
/// Backslashes become `/` and every leading `/` is stripped. The function is
/// idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Returns the lower-cased extension of the final path segment, if any.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File payload category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Text,
    Binary,
}

/// One file in a project VFS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum FileEntry {
    /// Character content (markup, styles, scripts).
    Text(String),
    /// Opaque byte payload (images, fonts, media).
    Binary(Vec<u8>),
}

impl FileEntry {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn binary(content: impl Into<Vec<u8>>) -> Self {
        Self::Binary(content.into())
    }

    pub fn kind(&self) -> FileKind {
        match self {
            Self::Text(_) => FileKind::Text,
            Self::Binary(_) => FileKind::Binary,
        }
    }

    /// Raw bytes regardless of kind (UTF-8 for text entries).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(content) => content.as_bytes(),
            Self::Binary(content) => content.as_slice(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(content) => Some(content.as_str()),
            Self::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// VFS mutation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// Path is empty after normalization.
    EmptyPath(String),
    /// Source path of a rename does not exist.
    NotFound(String),
    /// Rename target is already occupied by another entry.
    PathExists(String),
}

impl Display for VfsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath(raw) => write!(f, "path is empty after normalization: `{raw}`"),
            Self::NotFound(path) => write!(f, "file not found: {path}"),
            Self::PathExists(path) => write!(f, "file already exists: {path}"),
        }
    }
}

impl Error for VfsError {}

/// Ordered mapping from normalized path to file entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, FileEntry>",
    into = "IndexMap<String, FileEntry>"
)]
pub struct Vfs {
    entries: IndexMap<String, FileEntry>,
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry and returns the normalized key.
    ///
    /// A replaced entry keeps its original insertion position.
    pub fn insert(&mut self, path: &str, entry: FileEntry) -> Result<String, VfsError> {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return Err(VfsError::EmptyPath(path.to_string()));
        }
        self.entries.insert(normalized.clone(), entry);
        Ok(normalized)
    }

    /// Builder-style insert used by fixtures and import code.
    ///
    /// A path that normalizes to empty is skipped rather than reported; use
    /// [`Vfs::insert`] when the caller needs the error.
    pub fn with_file(mut self, path: &str, entry: FileEntry) -> Self {
        if let Err(err) = self.insert(path, entry) {
            debug!("event=vfs_insert module=vfs status=dropped reason={err}");
        }
        self
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(normalize_path(path).as_str())
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.entries.get_mut(normalize_path(path).as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(normalize_path(path).as_str())
    }

    /// Removes one entry on explicit user request, preserving the order of the rest.
    pub fn remove(&mut self, path: &str) -> Option<FileEntry> {
        self.entries.shift_remove(normalize_path(path).as_str())
    }

    /// Moves an entry to a new path, keeping its insertion position.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<String, VfsError> {
        let source = normalize_path(from);
        let target = normalize_path(to);
        if target.is_empty() {
            return Err(VfsError::EmptyPath(to.to_string()));
        }
        let Some(index) = self.entries.get_index_of(source.as_str()) else {
            return Err(VfsError::NotFound(source));
        };
        if source == target {
            return Ok(target);
        }
        if self.entries.contains_key(target.as_str()) {
            return Err(VfsError::PathExists(target));
        }

        let Some((_, entry)) = self.entries.shift_remove_index(index) else {
            return Err(VfsError::NotFound(source));
        };
        let (new_index, _) = self.entries.insert_full(target.clone(), entry);
        self.entries.move_index(new_index, index);
        Ok(target)
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn first_path(&self) -> Option<&str> {
        self.entries.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlays `incoming` onto this VFS; incoming entries win on collision.
    pub fn merge_from(&mut self, incoming: Vfs) {
        for (path, entry) in incoming.entries {
            self.entries.insert(path, entry);
        }
    }

    /// Seeds a greeting entry document when the VFS has no entries at all.
    ///
    /// Returns `true` when the seed was inserted.
    pub fn seed_default_entry(&mut self, app_name: &str) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.entries.insert(
            DEFAULT_ENTRY_PATH.to_string(),
            FileEntry::Text(default_entry_document(app_name)),
        );
        true
    }
}

/// Returns a new VFS with `incoming` overlaid onto `base`.
pub fn merge(base: &Vfs, incoming: &Vfs) -> Vfs {
    let mut merged = base.clone();
    merged.merge_from(incoming.clone());
    merged
}

impl From<IndexMap<String, FileEntry>> for Vfs {
    fn from(value: IndexMap<String, FileEntry>) -> Self {
        let mut vfs = Vfs::new();
        for (path, entry) in value {
            // Unnormalizable keys (e.g. "/") carry no addressable path.
            let _ = vfs.insert(path.as_str(), entry);
        }
        vfs
    }
}

impl From<Vfs> for IndexMap<String, FileEntry> {
    fn from(value: Vfs) -> Self {
        value.entries
    }
}

fn default_entry_document(app_name: &str) -> String {
    let name = escape_html(app_name);
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{name}</title></head>\
         <body><h1>Hello {name}</h1></body></html>"
    )
}
