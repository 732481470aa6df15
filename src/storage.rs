use crate::errors::StorageError;
use crate::models::{ListenerState, PersistedEvent};
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 複数のマネージャーで共有するストレージ
pub type SharedStorage = Arc<Mutex<NotifyStorage>>;

/// データベースを開いて共有可能な形で返す。親ディレクトリがなければ作成する
pub fn open_shared(db_path: &Path) -> Result<SharedStorage, StorageError> {
    if let Some(parent_dir) = db_path.parent()
        && !parent_dir.as_os_str().is_empty()
        && !parent_dir.exists()
    {
        std::fs::create_dir_all(parent_dir)?;
    }
    let storage = NotifyStorage::new(db_path)?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// 新規イベントの保存用データ
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub kind: &'a str,
    pub platform: &'a str,
    pub target: &'a str,
    pub content_id: &'a str,
    pub title: &'a str,
    pub url: &'a str,
    pub received_at: &'a str,
}

/// イベント履歴の検索条件
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub platform: Option<String>,
    pub target: Option<String>,
    /// RFC 3339 形式。この日時以降に受信したイベントのみ
    pub since: Option<String>,
    pub limit: Option<usize>,
}

/// 重複排除状態とイベント履歴を永続化するためのストレージ
pub struct NotifyStorage {
    conn: Connection,
}

impl NotifyStorage {
    /// 新しいNotifyStorageインスタンスを作成
    pub fn new(db_path: &Path) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// インメモリのストレージを作成（テスト用）
    pub fn in_memory() -> SqliteResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SqliteResult<Self> {
        // テーブルが存在しない場合は作成
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS listener_state (
                key TEXT PRIMARY KEY,
                target TEXT NOT NULL,
                latest TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                platform TEXT NOT NULL,
                target TEXT NOT NULL,
                content_id TEXT NOT NULL,
                title TEXT NOT NULL,
                url TEXT NOT NULL,
                received_at TEXT NOT NULL,
                UNIQUE(kind, content_id)
            );
            CREATE INDEX IF NOT EXISTS idx_events_received_at ON events(received_at);",
        )?;

        Ok(NotifyStorage { conn })
    }

    /// 重複排除状態を取得
    pub fn get_state(&self, key: &str) -> SqliteResult<Option<ListenerState>> {
        self.conn
            .query_row(
                "SELECT key, target, latest, updated_at FROM listener_state WHERE key = ?1",
                params![key],
                |row| {
                    Ok(ListenerState {
                        key: row.get(0)?,
                        target: row.get(1)?,
                        latest: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()
    }

    /// 重複排除状態を保存（既存の行は置き換える）
    pub fn put_state(&self, key: &str, target: &str, latest: Option<&str>) -> SqliteResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO listener_state (key, target, latest, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, target, latest, now],
        )?;
        Ok(())
    }

    /// 重複排除状態を削除。削除した行数を返す
    pub fn delete_state(&self, key: &str) -> SqliteResult<usize> {
        self.conn
            .execute("DELETE FROM listener_state WHERE key = ?1", params![key])
    }

    /// すべての重複排除状態を削除
    pub fn clear_state(&self) -> SqliteResult<usize> {
        self.conn.execute("DELETE FROM listener_state", params![])
    }

    /// すべての重複排除状態を取得
    pub fn list_states(&self) -> SqliteResult<Vec<ListenerState>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, target, latest, updated_at FROM listener_state ORDER BY key",
        )?;

        let states = stmt
            .query_map(params![], |row| {
                Ok(ListenerState {
                    key: row.get(0)?,
                    target: row.get(1)?,
                    latest: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<ListenerState>, _>>()?;

        Ok(states)
    }

    /// イベントを保存。既に保存済みの場合は false を返す
    pub fn insert_event(&self, event: &NewEvent<'_>) -> SqliteResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO events
            (kind, platform, target, content_id, title, url, received_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.kind,
                event.platform,
                event.target,
                event.content_id,
                event.title,
                event.url,
                event.received_at
            ],
        )?;
        Ok(inserted > 0)
    }

    /// 条件に一致するイベントを新しい順に取得
    pub fn query_events(&self, query: &EventQuery) -> SqliteResult<Vec<PersistedEvent>> {
        let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, platform, target, content_id, title, url, received_at
             FROM events
             WHERE (?1 IS NULL OR platform = ?1)
               AND (?2 IS NULL OR target = ?2)
               AND (?3 IS NULL OR received_at >= ?3)
             ORDER BY received_at DESC, id DESC
             LIMIT ?4",
        )?;

        let events = stmt
            .query_map(
                params![query.platform, query.target, query.since, limit],
                |row| {
                    Ok(PersistedEvent {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        platform: row.get(2)?,
                        target: row.get(3)?,
                        content_id: row.get(4)?,
                        title: row.get(5)?,
                        url: row.get(6)?,
                        received_at: row.get(7)?,
                    })
                },
            )?
            .collect::<Result<Vec<PersistedEvent>, _>>()?;

        Ok(events)
    }

    /// 保存されたイベントの数を取得
    pub fn event_count(&self) -> SqliteResult<u32> {
        self.conn
            .query_row("SELECT COUNT(*) FROM events", params![], |row| row.get(0))
    }
}
