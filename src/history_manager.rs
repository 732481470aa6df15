use crate::errors::StorageError;
use crate::events::NotifierEvent;
use crate::models::PersistedEvent;
use crate::storage::{EventQuery, NewEvent, NotifyStorage, SharedStorage};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::MutexGuard;

/// 通知イベントの履歴を管理するためのマネージャー
#[derive(Clone)]
pub struct HistoryManager {
    storage: SharedStorage,
}

impl HistoryManager {
    pub fn from_shared(storage: SharedStorage) -> Self {
        HistoryManager { storage }
    }

    fn lock(&self) -> Result<MutexGuard<'_, NotifyStorage>, StorageError> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// イベントを履歴として保存（重複チェック付き）
    ///
    /// コンテンツを持たないイベント（Ready, Created, Deleted）は保存しない。
    /// 保存した場合に true を返す。
    pub fn record(&self, event: &NotifierEvent) -> Result<bool, StorageError> {
        let received_at = Utc::now().to_rfc3339();

        let (platform, target, content_id, title, url) = match event {
            NotifierEvent::NewVideo(video) => (
                "youtube",
                video.channel_id.as_str(),
                video.id.as_str(),
                video.title.as_str(),
                video.url.clone(),
            ),
            NotifierEvent::WentLive(stream) => (
                "twitch",
                stream.user_login.as_str(),
                stream.id.as_str(),
                stream.title.as_str(),
                stream.channel_url(),
            ),
            _ => return Ok(false),
        };

        let new_event = NewEvent {
            kind: event.kind(),
            platform,
            target,
            content_id,
            title,
            url: &url,
            received_at: &received_at,
        };
        Ok(self.lock()?.insert_event(&new_event)?)
    }

    /// 条件に一致する履歴を新しい順に取得
    pub fn recent(&self, query: &EventQuery) -> Result<Vec<PersistedEvent>, StorageError> {
        Ok(self.lock()?.query_events(query)?)
    }

    /// 保存されたイベントの数を取得
    pub fn count(&self) -> Result<u32, StorageError> {
        Ok(self.lock()?.event_count()?)
    }
}

/// 履歴検索の `since` を RFC 3339 (UTC) に正規化する。日付のみの場合はその日の 00:00 UTC
pub fn parse_since(value: &str) -> Result<String, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).to_rfc3339());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_rfc3339())
        .ok_or_else(|| format!("Invalid date: {} (expected YYYY-MM-DD or RFC 3339)", value))
}
