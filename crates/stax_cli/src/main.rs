//! Command-line smoke check for `stax_core`.
//!
//! Resolves a project (the bundled demo, or an exported project JSON given
//! as the first argument) through a headless desktop and prints a summary.
//! Set `STAX_LOG_DIR` to an absolute path to enable file logging.

use log::info;
use stax_core::{
    AppRecord, BufferedNotifier, Desktop, FileEntry, HeadlessEditor, HeadlessSandboxHost,
    LaunchOutcome, MemoryGeometryStore, ShellConfig, Vfs,
};
use std::process::ExitCode;

fn demo_project() -> AppRecord {
    let files = Vfs::new()
        .with_file(
            "index.html",
            FileEntry::text(
                "<html><head><link href=\"style.css\" rel=\"stylesheet\"></head>\
                 <body><img src='./logo.png'><script src=\"/app.js\"></script></body></html>",
            ),
        )
        .with_file("style.css", FileEntry::text("body { background: url('logo.png'); }"))
        .with_file("app.js", FileEntry::text("console.log('ready');"))
        .with_file("logo.png", FileEntry::binary(vec![0x89, b'P', b'N', b'G']));
    AppRecord::new("Demo").with_files(files)
}

fn load_project(path: &str) -> Result<AppRecord, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{path}`: {err}"))?;
    AppRecord::from_export_json(json.as_str()).map_err(|err| err.to_string())
}

fn run() -> Result<(), String> {
    if let Ok(log_dir) = std::env::var("STAX_LOG_DIR") {
        stax_core::init_logging(stax_core::default_log_level(), log_dir.as_str())?;
    }

    println!("stax_core ping={}", stax_core::ping());
    println!("stax_core version={}", stax_core::core_version());

    let record = match std::env::args().nth(1) {
        Some(path) => load_project(path.as_str())?,
        None => demo_project(),
    };

    let mut desktop = Desktop::new(
        ShellConfig::default(),
        HeadlessSandboxHost::new(),
        BufferedNotifier::new(),
        HeadlessEditor::new(),
        MemoryGeometryStore::new(),
    );

    let resolved = desktop
        .preview(&record, None)
        .map_err(|err| err.to_string())?;
    println!(
        "project={:?} entry={} handles={} document_bytes={}",
        record.name,
        resolved.entry_path.as_deref().unwrap_or("<placeholder>"),
        resolved.handles.handles().len(),
        resolved.document.len()
    );

    let outcome = desktop.open_app(&record).map_err(|err| err.to_string())?;
    if outcome == LaunchOutcome::Opened {
        let mounted = desktop
            .sandbox()
            .mounted(&record.id)
            .map(|doc| doc.sandbox_attribute.clone())
            .unwrap_or_default();
        println!("launched sandbox={mounted:?}");
    }
    info!("event=cli_check module=cli status=ok app_id={}", record.id);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stax_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
