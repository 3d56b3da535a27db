//! Entry discovery, handle materialization and reference rewriting.

use crate::config::ShellConfig;
use crate::linker::bootstrap::{bridge_script, inject_before_body_close, js_string_literal};
use crate::linker::handles::{HandleMap, HandleStore};
use crate::linker::mime::mime_for_path;
use crate::model::app::AppRecord;
use crate::model::escape_html;
use crate::model::vfs::{normalize_path, FileEntry, Vfs};
use log::{debug, info};
use regex::{Captures, Regex};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Output of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    /// Self-contained document with references rewritten and the bridge injected.
    pub document: String,
    /// Every handle issued for this launch; must be revoked on close/relaunch.
    pub handles: HandleMap,
    /// Entry path used, `None` for synthesized placeholder/redirect documents.
    pub entry_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// VFS is still empty after seeding; callers must seed before launching.
    EmptyVfs,
    /// Selected entry holds binary content and cannot be rendered as markup.
    BinaryEntry(String),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyVfs => write!(f, "project has no files to resolve"),
            Self::BinaryEntry(path) => write!(f, "entry document is not text: {path}"),
        }
    }
}

impl Error for ResolveError {}

/// Resolution engine configured with the recognized entry names.
#[derive(Debug, Clone)]
pub struct Linker {
    entry_names: Vec<String>,
}

impl Linker {
    pub fn new(entry_names: Vec<String>) -> Self {
        Self {
            entry_names: entry_names
                .into_iter()
                .map(|name| name.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new(config.entry_names.clone())
    }

    /// Picks the entry path: a present override, then recognized names in
    /// priority order (matched on the final segment, case-insensitively),
    /// then the first inserted path.
    pub fn discover_entry(&self, files: &Vfs, entry_override: Option<&str>) -> Option<String> {
        if let Some(requested) = entry_override {
            let normalized = normalize_path(requested);
            if files.contains(normalized.as_str()) {
                return Some(normalized);
            }
        }

        for name in &self.entry_names {
            let found = files.paths().find(|path| {
                let file_name = path.rsplit('/').next().unwrap_or(path);
                file_name.eq_ignore_ascii_case(name)
            });
            if let Some(path) = found {
                return Some(path.to_string());
            }
        }

        files.first_path().map(str::to_string)
    }

    /// Resolves a record snapshot into a runnable document.
    ///
    /// `scope` identifies the launch (instance id or preview scope); handles
    /// are registered in `store` and listed in the returned map.
    pub fn resolve(
        &self,
        record: &AppRecord,
        scope: &str,
        entry_override: Option<&str>,
        store: &mut HandleStore,
    ) -> Result<ResolvedDocument, ResolveError> {
        let started_at = Instant::now();

        if record.is_redirect() {
            let url = record.url.as_deref().unwrap_or_default();
            return Ok(ResolvedDocument {
                document: redirect_document(url),
                handles: HandleMap::new(),
                entry_path: None,
            });
        }

        let files = &record.files;
        let Some(entry_path) = self.discover_entry(files, entry_override) else {
            let mut document = placeholder_document(record.name.as_str());
            inject_before_body_close(&mut document, &bridge_script(scope));
            return Ok(ResolvedDocument {
                document,
                handles: HandleMap::new(),
                entry_path: None,
            });
        };

        let source = match files.get(entry_path.as_str()) {
            Some(FileEntry::Text(content)) => content.clone(),
            Some(FileEntry::Binary(_)) => return Err(ResolveError::BinaryEntry(entry_path)),
            None => return Err(ResolveError::EmptyVfs),
        };

        let mut handles = HandleMap::new();
        for (path, entry) in files.iter() {
            let handle =
                store.materialize(scope, path, mime_for_path(path), entry.as_bytes().to_vec());
            handles.insert_path(path, handle);
        }

        let mut document = rewrite_references(source.as_str(), files, &handles);
        inject_before_body_close(&mut document, &bridge_script(scope));

        info!(
            "event=resolve module=linker status=ok scope={} entry={} files={} duration_ms={}",
            scope,
            entry_path,
            files.len(),
            started_at.elapsed().as_millis()
        );

        Ok(ResolvedDocument {
            document,
            handles,
            entry_path: Some(entry_path),
        })
    }
}

/// Rewrites attribute and `url(...)` references that name a known path.
///
/// Paths are processed longest-first so `my-style.css` is replaced before
/// `style.css` gets a chance to match inside it.
pub fn rewrite_references(markup: &str, files: &Vfs, handles: &HandleMap) -> String {
    let mut paths: Vec<&str> = files.paths().collect();
    paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut document = markup.to_string();
    for path in paths {
        let Some(handle) = handles.get(path) else {
            continue;
        };
        let Some(pattern) = reference_pattern(path) else {
            continue;
        };
        let rewritten = pattern.replace_all(document.as_str(), |caps: &Captures<'_>| {
            match reference_delimiters(caps) {
                Some((lead, tail)) => format!("{lead}{handle}{tail}"),
                None => caps[0].to_string(),
            }
        });
        if let std::borrow::Cow::Owned(next) = rewritten {
            debug!("event=rewrite module=linker status=ok path={path}");
            document = next;
        }
    }
    document
}

/// Matches `path` inside `href=`, `src=`, `action=` or `url(...)`.
///
/// Quoted references must close with the quote they opened with; a bare
/// `url(...)` must close with `)`.
fn reference_pattern(path: &str) -> Option<Regex> {
    let path = format!(r"(?:\./|/)?{}", regex::escape(path));
    let pattern = format!(
        r#"(?P<dq>(?:(?:href|src|action)=|url\()"){path}(?P<dq_end>")|(?P<sq>(?:(?:href|src|action)=|url\()'){path}(?P<sq_end>')|(?P<bare>url\(){path}(?P<bare_end>\))"#
    );
    Regex::new(pattern.as_str()).ok()
}

fn reference_delimiters<'h>(caps: &Captures<'h>) -> Option<(&'h str, &'h str)> {
    [("dq", "dq_end"), ("sq", "sq_end"), ("bare", "bare_end")]
        .into_iter()
        .find_map(|(lead, tail)| Some((caps.name(lead)?.as_str(), caps.name(tail)?.as_str())))
}

fn placeholder_document(app_name: &str) -> String {
    format!(
        "<h1>{}</h1><p>No index.html found</p>",
        escape_html(app_name)
    )
}

fn redirect_document(url: &str) -> String {
    format!(
        "<script>window.location.href={};</script>",
        js_string_literal(url)
    )
}

#[cfg(test)]
mod tests {
    use super::{reference_pattern, Linker};
    use crate::model::vfs::{FileEntry, Vfs};

    #[test]
    fn pattern_requires_closing_delimiter() {
        let pattern = reference_pattern("a.css").expect("pattern");
        assert!(pattern.is_match(r#"<link href="a.css">"#));
        assert!(pattern.is_match("url(./a.css)"));
        assert!(!pattern.is_match(r#"<link href="a.css.map">"#));
        assert!(!pattern.is_match(r#"<link href=a.css>"#));
    }

    #[test]
    fn pattern_requires_the_opening_quote_to_close() {
        let pattern = reference_pattern("a.png").expect("pattern");
        assert!(pattern.is_match(r#"<img src='a.png'>"#));
        assert!(pattern.is_match(r#"url("/a.png")"#));
        assert!(!pattern.is_match(r#"<img src='a.png">"#));
        assert!(!pattern.is_match(r#"<img src="a.png'>"#));
        assert!(!pattern.is_match(r#"url('a.png")"#));
        assert!(!pattern.is_match(r#"url(a.png')"#));
    }

    #[test]
    fn override_must_exist_to_win() {
        let linker = Linker::new(vec!["index.html".to_string()]);
        let files = Vfs::new()
            .with_file("index.html", FileEntry::text("i"))
            .with_file("other.html", FileEntry::text("o"));

        assert_eq!(
            linker.discover_entry(&files, Some("/other.html")).as_deref(),
            Some("other.html")
        );
        assert_eq!(
            linker.discover_entry(&files, Some("missing.html")).as_deref(),
            Some("index.html")
        );
    }
}
