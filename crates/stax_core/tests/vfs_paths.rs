use stax_core::model::import::{import_batch, ImportFile};
use stax_core::model::vfs::{merge, normalize_path, FileEntry, FileKind, Vfs};
use stax_core::AppRecord;

#[test]
fn normalize_is_idempotent() {
    for raw in [
        "index.html",
        "/index.html",
        "///css/site.css",
        "assets\\img\\logo.png",
        "\\\\share\\a.js",
        "./app.js",
        "",
    ] {
        let once = normalize_path(raw);
        assert_eq!(normalize_path(once.as_str()), once, "input: {raw:?}");
        assert!(!once.starts_with('/'));
        assert!(!once.contains('\\'));
    }
}

#[test]
fn insert_normalizes_and_last_writer_wins() {
    let mut files = Vfs::new();
    files
        .insert("/css\\site.css", FileEntry::text("a"))
        .expect("first insert");
    files
        .insert("css/site.css", FileEntry::text("b"))
        .expect("second insert");

    assert_eq!(files.len(), 1);
    assert_eq!(
        files.get("css/site.css").and_then(FileEntry::as_text),
        Some("b")
    );
}

#[test]
fn merge_prefers_incoming_and_keeps_base_order() {
    let base = Vfs::new()
        .with_file("index.html", FileEntry::text("old"))
        .with_file("app.js", FileEntry::text("js"));
    let incoming = Vfs::new()
        .with_file("index.html", FileEntry::text("new"))
        .with_file("logo.png", FileEntry::binary(vec![1]));

    let merged = merge(&base, &incoming);

    assert_eq!(
        merged.paths().collect::<Vec<_>>(),
        vec!["index.html", "app.js", "logo.png"]
    );
    assert_eq!(
        merged.get("index.html").and_then(FileEntry::as_text),
        Some("new")
    );
    assert_eq!(base.get("index.html").and_then(FileEntry::as_text), Some("old"));
}

#[test]
fn new_projects_are_seeded_with_an_entry_document() {
    let record = AppRecord::new("Tom & Jerry");
    let entry = record
        .files
        .get("index.html")
        .and_then(FileEntry::as_text)
        .expect("seeded index.html");
    assert!(entry.contains("Tom &amp; Jerry"));
}

#[test]
fn import_strips_shared_root_and_skips_junk() {
    let mut files = Vfs::new().with_file("index.html", FileEntry::text("keep"));
    let outcome = import_batch(
        &mut files,
        vec![
            ImportFile::new("game/index.html", b"<body></body>".to_vec()),
            ImportFile::new("game/img/hero.png", vec![0x89, 0x50]),
            ImportFile::new("game/data.json", vec![0xff, 0xfe]),
            ImportFile::new("game/.env", b"SECRET=1".to_vec()),
            ImportFile::new("game/node_modules/x/index.js", b"x".to_vec()),
            ImportFile::new("game/.git/HEAD", b"ref".to_vec()),
        ],
    );

    assert_eq!(outcome.root_name.as_deref(), Some("game"));
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.skipped, 3);
    assert_eq!(
        files.get("index.html").and_then(FileEntry::as_text),
        Some("<body></body>")
    );
    assert_eq!(
        files.get("img/hero.png").map(FileEntry::kind),
        Some(FileKind::Binary)
    );
    assert_eq!(
        files.get("data.json").map(FileEntry::kind),
        Some(FileKind::Binary)
    );
}
