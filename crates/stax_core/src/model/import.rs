//! Batch import of host files into a project VFS.
//!
//! # Responsibility
//! - Strip a shared root folder and report it as a project name hint.
//! - Skip repository/tooling junk and dotfiles.
//! - Classify payloads as text or binary and merge them incoming-wins.

use crate::model::vfs::{extension_of, normalize_path, FileEntry, Vfs};
use log::info;

const TEXT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "html", "css", "scss", "json", "md", "txt", "svg", "xml", "vue",
    "gitignore", "env",
];

const JUNK_SEGMENTS: &[&str] = &[".git/", "node_modules/"];

/// One file handed over by the host (drop or picker import).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    /// Host-relative path, possibly including a top-level folder.
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result summary of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    /// Shared root folder that was stripped; callers may adopt it as project name.
    pub root_name: Option<String>,
}

/// Returns whether the path is treated as text on import.
pub fn is_text_path(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Imports `files` into `target`, overwriting existing paths.
pub fn import_batch(target: &mut Vfs, files: Vec<ImportFile>) -> ImportOutcome {
    let normalized: Vec<(String, Vec<u8>)> = files
        .into_iter()
        .map(|file| (normalize_path(&file.path), file.bytes))
        .collect();

    let root_name = shared_root(&normalized);
    let prefix = root_name
        .as_ref()
        .map(|root| format!("{root}/"))
        .unwrap_or_default();

    let mut outcome = ImportOutcome {
        root_name,
        ..ImportOutcome::default()
    };
    let mut incoming = Vfs::new();

    for (path, bytes) in normalized {
        let relative = path.strip_prefix(prefix.as_str()).unwrap_or(path.as_str());
        if is_junk(relative) {
            outcome.skipped += 1;
            continue;
        }

        let entry = if is_text_path(relative) {
            match String::from_utf8(bytes) {
                Ok(text) => FileEntry::Text(text),
                Err(err) => FileEntry::Binary(err.into_bytes()),
            }
        } else {
            FileEntry::Binary(bytes)
        };

        match incoming.insert(relative, entry) {
            Ok(_) => outcome.imported += 1,
            Err(_) => outcome.skipped += 1,
        }
    }

    target.merge_from(incoming);
    info!(
        "event=vfs_import module=model status=ok imported={} skipped={} root_stripped={}",
        outcome.imported,
        outcome.skipped,
        outcome.root_name.is_some()
    );
    outcome
}

fn shared_root(files: &[(String, Vec<u8>)]) -> Option<String> {
    let (first, _) = files.first()?;
    let (root, _) = first.split_once('/')?;
    if root.is_empty() {
        return None;
    }
    let prefix = format!("{root}/");
    files
        .iter()
        .all(|(path, _)| path.starts_with(prefix.as_str()))
        .then(|| root.to_string())
}

fn is_junk(path: &str) -> bool {
    path.is_empty()
        || path.starts_with('.')
        || JUNK_SEGMENTS.iter().any(|segment| path.contains(segment))
}
