//! Launcher catalog helpers and icon resolution.

use crate::linker::handles::{ContentHandle, HandleStore};
use crate::linker::mime::mime_for_path;
use crate::model::app::{AppRecord, IconRef};
use std::collections::BTreeSet;

/// Catalog filter matching every record.
pub const ALL_STACKS: &str = "All";
/// Glyph shown when a record has no usable icon.
pub const FALLBACK_ICON: &str = "grid_view";

/// Distinct category labels, `All` first, then alphabetical.
pub fn catalog_stacks(records: &[AppRecord]) -> Vec<String> {
    let labels: BTreeSet<&str> = records
        .iter()
        .map(|record| record.stack.trim())
        .filter(|stack| !stack.is_empty() && *stack != ALL_STACKS)
        .collect();
    std::iter::once(ALL_STACKS.to_string())
        .chain(labels.into_iter().map(str::to_string))
        .collect()
}

pub fn filter_by_stack<'a>(records: &'a [AppRecord], stack: &str) -> Vec<&'a AppRecord> {
    records
        .iter()
        .filter(|record| stack == ALL_STACKS || record.stack.trim() == stack)
        .collect()
}

/// Records shown as desktop shortcuts.
pub fn desktop_icons(records: &[AppRecord]) -> Vec<&AppRecord> {
    records
        .iter()
        .filter(|record| record.pinned_to_desktop)
        .collect()
}

/// Renderable icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    Symbol(String),
    Handle(ContentHandle),
    Raw(String),
}

/// Resolves a record's icon; VFS paths are materialized under `icon-<id>`.
///
/// A missing icon, or a path absent from the VFS, yields the fallback glyph.
pub fn resolve_icon(record: &AppRecord, store: &mut HandleStore) -> IconSource {
    match record.icon.as_ref() {
        Some(IconRef::Symbolic(name)) => IconSource::Symbol(name.clone()),
        Some(IconRef::RawReference(value)) => IconSource::Raw(value.clone()),
        Some(IconRef::VfsPath(path)) => match record.files.get(path.as_str()) {
            Some(entry) => IconSource::Handle(store.materialize(
                icon_scope(record).as_str(),
                path.as_str(),
                mime_for_path(path.as_str()),
                entry.as_bytes().to_vec(),
            )),
            None => IconSource::Symbol(FALLBACK_ICON.to_string()),
        },
        None => IconSource::Symbol(FALLBACK_ICON.to_string()),
    }
}

pub(crate) fn icon_scope(record: &AppRecord) -> String {
    format!("icon-{}", record.id)
}

#[cfg(test)]
mod tests {
    use super::{catalog_stacks, desktop_icons, filter_by_stack, resolve_icon, IconSource};
    use crate::linker::handles::HandleStore;
    use crate::model::app::{AppRecord, IconRef};
    use crate::model::vfs::FileEntry;

    fn record(name: &str, stack: &str) -> AppRecord {
        let mut record = AppRecord::new(name);
        record.stack = stack.to_string();
        record
    }

    #[test]
    fn stacks_start_with_all_and_deduplicate() {
        let records = vec![record("a", "Games"), record("b", "Tools"), record("c", "Games"), record("d", "")];
        assert_eq!(catalog_stacks(&records), vec!["All", "Games", "Tools"]);
        assert_eq!(filter_by_stack(&records, "Games").len(), 2);
        assert_eq!(filter_by_stack(&records, "All").len(), 4);
    }

    #[test]
    fn desktop_icons_only_lists_pinned_records() {
        let mut pinned = record("a", "");
        pinned.pinned_to_desktop = true;
        let records = vec![pinned, record("b", "")];
        let icons = desktop_icons(&records);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].name, "a");
    }

    #[test]
    fn icon_dispatch_covers_every_variant() {
        let mut store = HandleStore::new("blob:stax");
        let mut app = record("a", "");
        assert_eq!(
            resolve_icon(&app, &mut store),
            IconSource::Symbol("grid_view".to_string())
        );

        app.icon = IconRef::parse("rocket");
        assert_eq!(resolve_icon(&app, &mut store), IconSource::Symbol("rocket".to_string()));

        app.icon = IconRef::parse("https://example.com/i.png");
        assert!(matches!(resolve_icon(&app, &mut store), IconSource::Raw(_)));

        app.files
            .insert("img/icon.png", FileEntry::binary(vec![1, 2, 3]))
            .expect("insert icon");
        app.icon = IconRef::parse("/img/icon.png");
        let IconSource::Handle(handle) = resolve_icon(&app, &mut store) else {
            panic!("expected a handle");
        };
        assert_eq!(store.dereference(&handle).expect("live").bytes, vec![1, 2, 3]);

        app.icon = IconRef::parse("missing.png");
        assert_eq!(
            resolve_icon(&app, &mut store),
            IconSource::Symbol("grid_view".to_string())
        );
    }
}
