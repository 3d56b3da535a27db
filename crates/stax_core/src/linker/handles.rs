//! Launch-scoped content handles.
//!
//! # Responsibility
//! - Allocate dereferenceable handles for materialized file content.
//! - Track which handles belong to one launch so they can be revoked together.
//!
//! # Invariants
//! - A handle is derived from (scope, content type, path, bytes), so the same
//!   scope and VFS always yield the same handle string.
//! - A revoked handle fails to dereference until it is materialized again.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque dereferenceable identifier, e.g. `blob:stax/3f0c...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ContentHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Content held behind a live handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// Normalized VFS path the content came from.
    pub source_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// Handle was never issued or has been revoked.
    Invalid(String),
}

impl Display for HandleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(handle) => write!(f, "content handle is not live: {handle}"),
        }
    }
}

impl Error for HandleError {}

/// Per-launch mapping from path (and `./` variant) to handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleMap {
    entries: BTreeMap<String, ContentHandle>,
}

impl HandleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` under the bare path and its `./` variant.
    pub fn insert_path(&mut self, path: &str, handle: ContentHandle) {
        self.entries.insert(format!("./{path}"), handle.clone());
        self.entries.insert(path.to_string(), handle);
    }

    /// Looks up a reference as written in markup (`a.png`, `./a.png`, `/a.png`).
    pub fn get(&self, reference: &str) -> Option<&ContentHandle> {
        self.entries.get(reference).or_else(|| {
            let bare = reference.trim_start_matches("./").trim_start_matches('/');
            self.entries.get(bare)
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Distinct handles held by this map.
    pub fn handles(&self) -> BTreeSet<&ContentHandle> {
        self.entries.values().collect()
    }

    /// Number of keys, counting path variants separately.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another map, e.g. a dependency resolved in a separate pass.
    pub fn extend(&mut self, other: HandleMap) {
        self.entries.extend(other.entries);
    }
}

/// Process-wide registry of live handles.
#[derive(Debug)]
pub struct HandleStore {
    scheme: String,
    live: HashMap<ContentHandle, Materialized>,
}

impl HandleStore {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            live: HashMap::new(),
        }
    }

    /// Materializes content under `scope` and returns its handle.
    ///
    /// Re-materializing identical content in the same scope returns the same handle.
    pub fn materialize(
        &mut self,
        scope: &str,
        path: &str,
        mime: &'static str,
        bytes: Vec<u8>,
    ) -> ContentHandle {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, scope.as_bytes());
        let mut name = Vec::with_capacity(mime.len() + path.len() + bytes.len() + 2);
        name.extend_from_slice(mime.as_bytes());
        name.push(0);
        name.extend_from_slice(path.as_bytes());
        name.push(0);
        name.extend_from_slice(bytes.as_slice());
        let handle = ContentHandle(format!(
            "{}/{}",
            self.scheme,
            Uuid::new_v5(&namespace, name.as_slice())
        ));

        self.live.insert(
            handle.clone(),
            Materialized {
                mime,
                bytes,
                source_path: path.to_string(),
            },
        );
        handle
    }

    pub fn dereference(&self, handle: &ContentHandle) -> Result<&Materialized, HandleError> {
        self.live
            .get(handle)
            .ok_or_else(|| HandleError::Invalid(handle.to_string()))
    }

    pub fn is_live(&self, handle: &ContentHandle) -> bool {
        self.live.contains_key(handle)
    }

    pub fn revoke(&mut self, handle: &ContentHandle) -> bool {
        self.live.remove(handle).is_some()
    }

    /// Revokes every handle in `map`; returns how many were still live.
    pub fn revoke_map(&mut self, map: &HandleMap) -> usize {
        map.handles()
            .into_iter()
            .filter(|handle| self.live.remove(*handle).is_some())
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
