use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

use super::{MemoFields, MemoRow, MemoTable, StoreClient, StoreError};

const MEMO_COLUMNS: &str = "id, title, content, category, tags, created_at, updated_at";

/// SQLite-backed store. Every [`connect`](StoreClient::connect) opens a new
/// connection to the same database file.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = SqliteStore { path };
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS memos (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_memos_created_at ON memos(created_at DESC);
            "#,
        )?;
        Ok(())
    }
}

impl StoreClient for SqliteStore {
    type Session = SqliteSession;

    fn connect(&self) -> Result<SqliteSession, StoreError> {
        Ok(SqliteSession {
            conn: Connection::open(&self.path)?,
        })
    }
}

pub struct SqliteSession {
    conn: Connection,
}

impl MemoTable for SqliteSession {
    fn select_all(&self) -> Result<Vec<MemoRow>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMO_COLUMNS} FROM memos ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], read_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn select_by_id(&self, id: &str) -> Result<Option<MemoRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {MEMO_COLUMNS} FROM memos WHERE id = ?1"),
                params![id],
                read_row,
            )
            .optional()?)
    }

    fn insert(&self, fields: MemoFields<'_>) -> Result<MemoRow, StoreError> {
        let now = timestamp_now();
        // Same scheme as note ids elsewhere: md5 of title plus nanosecond clock.
        let id = format!(
            "{:x}",
            md5::compute(format!(
                "{}{}",
                fields.title,
                Utc::now().timestamp_nanos_opt().unwrap_or(0)
            ))
        );
        let tags = encode_tags(fields.tags)?;

        Ok(self.conn.query_row(
            &format!(
                "INSERT INTO memos ({MEMO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
                 RETURNING {MEMO_COLUMNS}"
            ),
            params![id, fields.title, fields.content, fields.category, tags, now],
            read_row,
        )?)
    }

    fn update(&self, id: &str, fields: MemoFields<'_>) -> Result<MemoRow, StoreError> {
        let tags = encode_tags(fields.tags)?;

        // Timestamps share one fixed-width format, so MAX() orders them correctly.
        self.conn
            .query_row(
                &format!(
                    "UPDATE memos SET title = ?2, content = ?3, category = ?4, tags = ?5, \
                     updated_at = MAX(?6, created_at) WHERE id = ?1 RETURNING {MEMO_COLUMNS}"
                ),
                params![
                    id,
                    fields.title,
                    fields.content,
                    fields.category,
                    tags,
                    timestamp_now()
                ],
                read_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownId)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM memos WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<MemoRow> {
    Ok(MemoRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        tags: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn encode_tags(tags: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(tags).map_err(|e| StoreError::Malformed(format!("tags: {}", e)))
}

fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
