//! App record store.

use crate::db::DbError;
use crate::model::app::{AppId, AppKind, AppRecord, IconRef};
use crate::model::vfs::{FileEntry, FileKind, Vfs};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const APP_SELECT_SQL: &str = "SELECT
    id,
    name,
    stack,
    kind,
    icon,
    pinned_to_desktop,
    favorite,
    url,
    last_modified_ms
FROM apps";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(AppId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "app not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted app data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed store of app records.
pub trait AppStore {
    fn get(&self, id: &AppId) -> RepoResult<Option<AppRecord>>;
    /// All records, ordered by name.
    fn list(&self) -> RepoResult<Vec<AppRecord>>;
    /// Inserts or replaces a record, files included.
    fn put(&self, record: &AppRecord) -> RepoResult<AppId>;
    fn delete(&self, id: &AppId) -> RepoResult<()>;
}

pub struct SqliteAppStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_files(&self, id: &AppId) -> RepoResult<Vfs> {
        let mut stmt = self.conn.prepare(
            "SELECT path, kind, content FROM app_files WHERE app_id = ?1 ORDER BY position ASC;",
        )?;
        let rows = stmt.query_map(params![id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })?;

        let mut files = Vfs::new();
        for row in rows {
            let (path, kind, content) = row?;
            let entry = match kind.as_str() {
                "text" => FileEntry::Text(String::from_utf8(content).map_err(|_| {
                    RepoError::InvalidData(format!("text file `{path}` is not valid UTF-8"))
                })?),
                "binary" => FileEntry::Binary(content),
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "unknown file kind `{other}` for `{path}`"
                    )))
                }
            };
            files
                .insert(path.as_str(), entry)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }
        Ok(files)
    }

    fn hydrate(&self, meta: AppMeta) -> RepoResult<AppRecord> {
        let files = self.load_files(&meta.id)?;
        Ok(AppRecord {
            id: meta.id,
            name: meta.name,
            stack: meta.stack,
            kind: meta.kind,
            icon: meta.icon,
            pinned_to_desktop: meta.pinned_to_desktop,
            favorite: meta.favorite,
            files,
            url: meta.url,
            last_modified_ms: meta.last_modified_ms,
        })
    }
}

impl AppStore for SqliteAppStore<'_> {
    fn get(&self, id: &AppId) -> RepoResult<Option<AppRecord>> {
        let meta = self
            .conn
            .query_row(
                &format!("{APP_SELECT_SQL} WHERE id = ?1;"),
                params![id.as_str()],
                parse_meta_row,
            )
            .optional()?;
        match meta {
            Some(meta) => Ok(Some(self.hydrate(meta?)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<AppRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{APP_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, id ASC;"))?;
        let metas = stmt
            .query_map([], parse_meta_row)?
            .collect::<Result<Vec<_>, _>>()?;

        metas
            .into_iter()
            .map(|meta| self.hydrate(meta?))
            .collect()
    }

    fn put(&self, record: &AppRecord) -> RepoResult<AppId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO apps (
                id,
                name,
                stack,
                kind,
                icon,
                pinned_to_desktop,
                favorite,
                url,
                last_modified_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                stack = excluded.stack,
                kind = excluded.kind,
                icon = excluded.icon,
                pinned_to_desktop = excluded.pinned_to_desktop,
                favorite = excluded.favorite,
                url = excluded.url,
                last_modified_ms = excluded.last_modified_ms;",
            params![
                record.id.as_str(),
                record.name.as_str(),
                record.stack.as_str(),
                kind_to_db(record.kind),
                record.icon.as_ref().map(IconRef::as_str),
                bool_to_int(record.pinned_to_desktop),
                bool_to_int(record.favorite),
                record.url.as_deref(),
                record.last_modified_ms,
            ],
        )?;
        tx.execute(
            "DELETE FROM app_files WHERE app_id = ?1;",
            params![record.id.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO app_files (app_id, path, position, kind, content)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, (path, entry)) in record.files.iter().enumerate() {
                let kind = match entry.kind() {
                    FileKind::Text => "text",
                    FileKind::Binary => "binary",
                };
                insert.execute(params![
                    record.id.as_str(),
                    path,
                    position as i64,
                    kind,
                    entry.as_bytes(),
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=app_put module=repo status=ok app_id={} files={}",
            record.id,
            record.files.len()
        );
        Ok(record.id.clone())
    }

    fn delete(&self, id: &AppId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM apps WHERE id = ?1;", params![id.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        info!("event=app_delete module=repo status=ok app_id={id}");
        Ok(())
    }
}

struct AppMeta {
    id: AppId,
    name: String,
    stack: String,
    kind: AppKind,
    icon: Option<IconRef>,
    pinned_to_desktop: bool,
    favorite: bool,
    url: Option<String>,
    last_modified_ms: i64,
}

/// Row-level decode; semantic failures are carried in the inner result.
fn parse_meta_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<AppMeta>> {
    let id: String = row.get(0)?;
    let kind: String = row.get(3)?;
    let icon: Option<String> = row.get(4)?;
    let pinned: i64 = row.get(5)?;
    let favorite: i64 = row.get(6)?;

    let kind = match kind_from_db(kind.as_str()) {
        Some(kind) => kind,
        None => {
            return Ok(Err(RepoError::InvalidData(format!(
                "unknown app kind `{kind}` for `{id}`"
            ))))
        }
    };

    Ok(Ok(AppMeta {
        id: AppId::new(id),
        name: row.get(1)?,
        stack: row.get(2)?,
        kind,
        icon: icon.as_deref().and_then(IconRef::parse),
        pinned_to_desktop: pinned != 0,
        favorite: favorite != 0,
        url: row.get(7)?,
        last_modified_ms: row.get(8)?,
    }))
}

fn kind_to_db(kind: AppKind) -> &'static str {
    match kind {
        AppKind::User => "user",
        AppKind::Editor => "editor",
        AppKind::Internal => "internal",
    }
}

fn kind_from_db(value: &str) -> Option<AppKind> {
    match value {
        "user" => Some(AppKind::User),
        "editor" => Some(AppKind::Editor),
        "internal" => Some(AppKind::Internal),
        _ => None,
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
