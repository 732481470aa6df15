use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 監視対象のプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    Twitch,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Twitch => "twitch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "youtube" | "yt" => Some(Platform::YouTube),
            "twitch" => Some(Platform::Twitch),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::YouTube => write!(f, "YouTube"),
            Platform::Twitch => write!(f, "Twitch"),
        }
    }
}

// --- YouTube フィードモデル ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// フィードエントリのID（例: "yt:video:dQw4w9WgXcQ"）。重複排除に使用
    pub id: String,
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

// --- Twitch Helix API モデル ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub broadcaster_type: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitchStream {
    /// 配信ID。配信ごとに変わるため重複排除に使用
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub game_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
    pub started_at: Option<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl TwitchStream {
    pub fn channel_url(&self) -> String {
        format!("https://www.twitch.tv/{}", self.user_login)
    }
}

/// リスナーの監視対象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListenerTarget {
    YouTubeChannel { channel_id: String },
    TwitchUser(TwitchUser),
}

impl ListenerTarget {
    pub fn label(&self) -> &str {
        match self {
            ListenerTarget::YouTubeChannel { channel_id } => channel_id,
            ListenerTarget::TwitchUser(user) => &user.login,
        }
    }
}

/// 重複排除用の状態（監視対象ごとに1行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerState {
    pub key: String,
    pub target: String,
    /// 最後に確認したコンテンツID（未確認の場合は None）
    pub latest: Option<String>,
    pub updated_at: String,
}

// --- 永続化用の通知イベントモデル ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEvent {
    pub id: i64,
    pub kind: String,
    pub platform: String,
    pub target: String,
    pub content_id: String,
    pub title: String,
    pub url: String,
    pub received_at: String,
}
