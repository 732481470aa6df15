use crate::errors::{AppError, ListenerError};
use crate::events::NotifierEvent;
use crate::listener::{SeedPolicy, Source};
use crate::models::{ListenerTarget, Platform, TwitchStream};
use crate::twitch::client::TwitchClient;

/// チャンネルの配信開始を監視する取得元
pub struct TwitchSource {
    client: TwitchClient,
}

impl TwitchSource {
    pub fn new(client: TwitchClient) -> Self {
        TwitchSource { client }
    }

    /// 表示名から状態キーを作る（小文字化し、空白は '_' に置き換える）
    pub fn state_key_for(user_name: &str) -> String {
        format!("live_{}", user_name.replace(' ', "_").to_lowercase())
    }
}

impl Source for TwitchSource {
    type Item = TwitchStream;

    fn platform(&self) -> Platform {
        Platform::Twitch
    }

    fn seed_policy(&self) -> SeedPolicy {
        SeedPolicy::Empty
    }

    // ログイン名は大文字小文字を区別しない
    fn normalize_target(&self, target: &str) -> String {
        target.trim().to_lowercase()
    }

    async fn describe(&self, target: &str) -> Result<ListenerTarget, AppError> {
        match self.client.get_user(target).await? {
            Some(user) => Ok(ListenerTarget::TwitchUser(user)),
            None => Err(ListenerError::UnknownTarget {
                platform: Platform::Twitch.to_string(),
                target: target.to_string(),
            }
            .into()),
        }
    }

    async fn fetch_latest(&self, target: &str) -> Result<Option<TwitchStream>, AppError> {
        Ok(self.client.get_stream(target).await?)
    }

    fn state_key(&self, _target: &str, item: &TwitchStream) -> String {
        Self::state_key_for(&item.user_name)
    }

    fn content_id<'a>(&self, item: &'a TwitchStream) -> &'a str {
        &item.id
    }

    fn into_event(&self, item: TwitchStream) -> NotifierEvent {
        NotifierEvent::WentLive(item)
    }
}
