//! App record domain model.
//!
//! # Responsibility
//! - Define the persisted project shape (identity, metadata, VFS).
//! - Model icon references as a tagged variant parsed in one place.
//!
//! # Invariants
//! - `id` is generated once and never reused for another record.
//! - A freshly created record always has a launchable entry document.
//! - `preview-` prefixed ids are editor preview scopes, never persisted.

use crate::model::now_epoch_ms;
use crate::model::vfs::{normalize_path, Vfs};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Reserved id of the code editor shell.
pub const EDITOR_APP_ID: &str = "editor";
/// Reserved id of the app launcher.
pub const FINDER_APP_ID: &str = "finder";
/// Reserved id of the settings panel.
pub const SETTINGS_APP_ID: &str = "settings";

const PREVIEW_PREFIX: &str = "preview-";

static SYMBOLIC_ICON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").expect("valid symbolic icon regex"));

/// Stable app identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn editor() -> Self {
        Self::new(EDITOR_APP_ID)
    }

    pub fn finder() -> Self {
        Self::new(FINDER_APP_ID)
    }

    pub fn settings() -> Self {
        Self::new(SETTINGS_APP_ID)
    }

    /// Preview scope id for the editor's live preview of `self`.
    pub fn preview_scope(&self) -> Self {
        Self(format!("{PREVIEW_PREFIX}{}", self.0))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_preview(&self) -> bool {
        self.0.starts_with(PREVIEW_PREFIX)
    }

    /// System entries are never fully removed from the dock.
    pub fn is_system(&self) -> bool {
        matches!(
            self.0.as_str(),
            EDITOR_APP_ID | FINDER_APP_ID | SETTINGS_APP_ID
        )
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Record category deciding how a launch request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    /// Authored project executed inside a sandbox.
    #[default]
    User,
    /// The code editor shell.
    Editor,
    /// Host-rendered window (launcher, settings) with no sandbox.
    Internal,
}

/// Icon reference attached to an app record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IconRef {
    /// Named glyph from the host icon font, e.g. `terminal`.
    Symbolic(String),
    /// Normalized path into the app's own VFS.
    VfsPath(String),
    /// Absolute URL, data URI or object URL used verbatim.
    RawReference(String),
}

impl IconRef {
    /// Classifies a raw icon string. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if SYMBOLIC_ICON_RE.is_match(trimmed) {
            return Some(Self::Symbolic(trimmed.to_string()));
        }
        if trimmed.contains("://") || trimmed.starts_with("data:") || trimmed.starts_with("blob:")
        {
            return Some(Self::RawReference(trimmed.to_string()));
        }
        Some(Self::VfsPath(normalize_path(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Symbolic(value) | Self::VfsPath(value) | Self::RawReference(value) => {
                value.as_str()
            }
        }
    }
}

impl From<IconRef> for String {
    fn from(value: IconRef) -> Self {
        match value {
            IconRef::Symbolic(value) | IconRef::VfsPath(value) | IconRef::RawReference(value) => {
                value
            }
        }
    }
}

impl TryFrom<String> for IconRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        IconRef::parse(value.as_str()).ok_or_else(|| "icon reference must not be blank".to_string())
    }
}

/// Canonical persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: AppId,
    pub name: String,
    /// Category label used by the launcher grouping.
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub kind: AppKind,
    #[serde(default)]
    pub icon: Option<IconRef>,
    #[serde(default)]
    pub pinned_to_desktop: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub files: Vfs,
    /// External location for link-only apps with no files.
    #[serde(default)]
    pub url: Option<String>,
    /// Unix epoch milliseconds of the last explicit save.
    pub last_modified_ms: i64,
}

impl AppRecord {
    /// Creates a new user project with a generated id and seeded entry document.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(AppId::generate(), name)
    }

    /// Creates a user project with a caller-provided id (import/restore paths).
    pub fn with_id(id: AppId, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut files = Vfs::new();
        files.seed_default_entry(name.as_str());
        Self {
            id,
            name,
            stack: String::new(),
            kind: AppKind::User,
            icon: None,
            pinned_to_desktop: false,
            favorite: false,
            files,
            url: None,
            last_modified_ms: now_epoch_ms(),
        }
    }

    /// Shell record for the code editor.
    pub fn editor_shell() -> Self {
        Self::system_shell(AppId::editor(), "Code Studio", AppKind::Editor, "terminal")
    }

    /// Shell record for the app launcher window.
    pub fn finder_shell() -> Self {
        Self::system_shell(AppId::finder(), "Finder", AppKind::Internal, "folder_open")
    }

    /// Shell record for the settings panel.
    pub fn settings_shell() -> Self {
        Self::system_shell(AppId::settings(), "Settings", AppKind::Internal, "settings")
    }

    fn system_shell(id: AppId, name: &str, kind: AppKind, icon: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            stack: String::new(),
            kind,
            icon: IconRef::parse(icon),
            pinned_to_desktop: false,
            favorite: false,
            files: Vfs::new(),
            url: None,
            last_modified_ms: 0,
        }
    }

    pub fn with_files(mut self, files: Vfs) -> Self {
        self.files = files;
        self
    }

    pub fn is_editor(&self) -> bool {
        self.kind == AppKind::Editor || self.id.as_str() == EDITOR_APP_ID
    }

    pub fn is_internal(&self) -> bool {
        self.kind == AppKind::Internal
    }

    /// Link-only record: external url and no files.
    pub fn is_redirect(&self) -> bool {
        self.url.is_some() && self.files.is_empty()
    }

    /// Re-seeds an empty VFS so the record stays launchable.
    ///
    /// Returns `true` when a default entry was inserted.
    pub fn sanitize(&mut self) -> bool {
        if self.is_redirect() {
            return false;
        }
        self.files.seed_default_entry(self.name.as_str())
    }

    /// Stamps the record as modified now.
    pub fn touch(&mut self) {
        self.last_modified_ms = now_epoch_ms();
    }

    /// Serializes the project as a portable `{meta, files}` document.
    pub fn export_json(&self) -> Result<String, ProjectExportError> {
        let export = ProjectExport {
            meta: ExportMeta {
                name: self.name.clone(),
                stack: self.stack.clone(),
                icon: self.icon.clone(),
            },
            files: self.files.clone(),
        };
        serde_json::to_string_pretty(&export).map_err(ProjectExportError::Json)
    }

    /// Builds a new record (fresh id) from an exported project document.
    pub fn from_export_json(json: &str) -> Result<Self, ProjectExportError> {
        let export: ProjectExport =
            serde_json::from_str(json).map_err(ProjectExportError::Json)?;
        let mut record = Self::new(export.meta.name);
        record.stack = export.meta.stack;
        record.icon = export.meta.icon;
        if !export.files.is_empty() {
            record.files = export.files;
        }
        Ok(record)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectExport {
    meta: ExportMeta,
    #[serde(default)]
    files: Vfs,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportMeta {
    name: String,
    #[serde(default)]
    stack: String,
    #[serde(default)]
    icon: Option<IconRef>,
}

/// Project export/import failures.
#[derive(Debug)]
pub enum ProjectExportError {
    Json(serde_json::Error),
}

impl Display for ProjectExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid project document: {err}"),
        }
    }
}

impl Error for ProjectExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}
