//! Extension to content-type table used when materializing handles.

use crate::model::vfs::extension_of;

/// Content type used for unknown extensions.
pub const FALLBACK_MIME: &str = "text/plain";

const MIME_TABLE: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("js", "text/javascript"),
    ("jsx", "text/javascript"),
    ("mjs", "text/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("md", "text/markdown"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
];

const BINARY_ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "ico", "mp3", "mp4", "webm", "woff", "woff2", "ttf",
    "eot",
];

/// Returns the content type for a path, falling back to `text/plain`.
pub fn mime_for_path(path: &str) -> &'static str {
    let Some(ext) = extension_of(path) else {
        return FALLBACK_MIME;
    };
    MIME_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map_or(FALLBACK_MIME, |(_, mime)| *mime)
}

/// Media/font assets that are never edited as text.
pub fn is_binary_asset(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| BINARY_ASSET_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::{is_binary_asset, mime_for_path, FALLBACK_MIME};

    #[test]
    fn known_extensions_map_case_insensitively() {
        assert_eq!(mime_for_path("a/b/style.CSS"), "text/css");
        assert_eq!(mime_for_path("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for_path("icon.svg"), "image/svg+xml");
    }

    #[test]
    fn unknown_extensions_fall_back() {
        assert_eq!(mime_for_path("data.bin"), FALLBACK_MIME);
        assert_eq!(mime_for_path("LICENSE"), FALLBACK_MIME);
    }

    #[test]
    fn binary_assets() {
        assert!(is_binary_asset("fonts/a.woff2"));
        assert!(!is_binary_asset("app.js"));
    }
}
