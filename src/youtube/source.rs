use crate::errors::AppError;
use crate::events::NotifierEvent;
use crate::listener::{SeedPolicy, Source};
use crate::models::{ListenerTarget, Platform, Video};
use crate::youtube::client::YouTubeClient;

/// チャンネルの動画フィードを監視する取得元
pub struct YouTubeSource {
    client: YouTubeClient,
}

impl YouTubeSource {
    pub fn new(client: YouTubeClient) -> Self {
        YouTubeSource { client }
    }

    pub fn client(&self) -> &YouTubeClient {
        &self.client
    }

    pub fn state_key_for(channel_id: &str) -> String {
        format!("video_{}", channel_id)
    }
}

impl Source for YouTubeSource {
    type Item = Video;

    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn seed_policy(&self) -> SeedPolicy {
        SeedPolicy::Silent
    }

    async fn describe(&self, target: &str) -> Result<ListenerTarget, AppError> {
        Ok(ListenerTarget::YouTubeChannel {
            channel_id: target.to_string(),
        })
    }

    async fn fetch_latest(&self, target: &str) -> Result<Option<Video>, AppError> {
        Ok(self.client.fetch_latest(target).await?)
    }

    fn state_key(&self, target: &str, _item: &Video) -> String {
        Self::state_key_for(target)
    }

    fn content_id<'a>(&self, item: &'a Video) -> &'a str {
        &item.id
    }

    fn into_event(&self, item: Video) -> NotifierEvent {
        NotifierEvent::NewVideo(item)
    }
}
