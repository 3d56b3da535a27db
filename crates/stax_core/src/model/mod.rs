//! Domain model for authored mini-applications.
//!
//! # Responsibility
//! - Define the app record owned by persistence and borrowed by launch flows.
//! - Define the virtual file collection (VFS) and its path canonicalization.
//!
//! # Invariants
//! - Every VFS key is a normalized path (no leading slash, `/` separators).
//! - Every app record is identified by a stable `AppId`.

pub mod app;
pub mod import;
pub mod vfs;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall clock as Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Escapes text for safe embedding inside generated markup.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_html, now_epoch_ms};

    #[test]
    fn escape_html_replaces_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn clock_is_after_epoch() {
        assert!(now_epoch_ms() > 0);
    }
}
