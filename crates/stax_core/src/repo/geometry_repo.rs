//! Host-local window geometry store keyed by instance id.

use crate::compositor::geometry::SavedGeometry;
use crate::model::app::AppId;
use crate::model::now_epoch_ms;
use crate::repo::app_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;

pub trait GeometryStore {
    fn load(&self, id: &AppId) -> RepoResult<Option<SavedGeometry>>;
    fn save(&self, id: &AppId, geometry: SavedGeometry) -> RepoResult<()>;
}

pub struct SqliteGeometryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGeometryStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GeometryStore for SqliteGeometryStore<'_> {
    fn load(&self, id: &AppId) -> RepoResult<Option<SavedGeometry>> {
        let geometry = self
            .conn
            .query_row(
                "SELECT x, y, w, h FROM window_geometry WHERE instance_id = ?1;",
                params![id.as_str()],
                |row| {
                    Ok(SavedGeometry {
                        x: row.get(0)?,
                        y: row.get(1)?,
                        w: row.get(2)?,
                        h: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(geometry)
    }

    fn save(&self, id: &AppId, geometry: SavedGeometry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO window_geometry (instance_id, x, y, w, h, updated_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(instance_id) DO UPDATE SET
                x = excluded.x,
                y = excluded.y,
                w = excluded.w,
                h = excluded.h,
                updated_at_ms = excluded.updated_at_ms;",
            params![
                id.as_str(),
                geometry.x,
                geometry.y,
                geometry.w,
                geometry.h,
                now_epoch_ms()
            ],
        )?;
        Ok(())
    }
}

/// Process-local store for hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryGeometryStore {
    entries: RefCell<HashMap<AppId, SavedGeometry>>,
}

impl MemoryGeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl GeometryStore for MemoryGeometryStore {
    fn load(&self, id: &AppId) -> RepoResult<Option<SavedGeometry>> {
        Ok(self.entries.borrow().get(id).copied())
    }

    fn save(&self, id: &AppId, geometry: SavedGeometry) -> RepoResult<()> {
        self.entries.borrow_mut().insert(id.clone(), geometry);
        Ok(())
    }
}

impl<T: GeometryStore + ?Sized> GeometryStore for &T {
    fn load(&self, id: &AppId) -> RepoResult<Option<SavedGeometry>> {
        (**self).load(id)
    }

    fn save(&self, id: &AppId, geometry: SavedGeometry) -> RepoResult<()> {
        (**self).save(id, geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeometryStore, MemoryGeometryStore};
    use crate::compositor::geometry::SavedGeometry;
    use crate::model::app::AppId;

    #[test]
    fn memory_store_overwrites_per_instance() {
        let store = MemoryGeometryStore::new();
        let id = AppId::new("a");
        assert_eq!(store.load(&id).expect("load"), None);
        let first = SavedGeometry { x: 1, y: 1, w: 300, h: 200 };
        let second = SavedGeometry { x: 9, y: 9, w: 300, h: 200 };
        store.save(&id, first).expect("save");
        store.save(&id, second).expect("save");
        assert_eq!(store.load(&id).expect("load"), Some(second));
        assert_eq!(store.len(), 1);
    }
}
