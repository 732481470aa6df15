use crate::models::{ListenerTarget, Platform, TwitchStream, Video};
use serde::Serialize;
use tokio::sync::broadcast;

/// 購読者に配信されるイベント
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum NotifierEvent {
    /// ウォッチャーの準備完了
    Ready { platform: Platform },
    /// リスナーの作成
    Created {
        platform: Platform,
        target: ListenerTarget,
    },
    /// 新しい動画の投稿
    NewVideo(Video),
    /// 配信の開始
    WentLive(TwitchStream),
    /// リスナーの停止
    Deleted {
        platform: Platform,
        target: ListenerTarget,
    },
}

impl NotifierEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotifierEvent::Ready { .. } => "ready",
            NotifierEvent::Created { .. } => "created",
            NotifierEvent::NewVideo(_) => "new_video",
            NotifierEvent::WentLive(_) => "went_live",
            NotifierEvent::Deleted { .. } => "deleted",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            NotifierEvent::Ready { platform }
            | NotifierEvent::Created { platform, .. }
            | NotifierEvent::Deleted { platform, .. } => *platform,
            NotifierEvent::NewVideo(_) => Platform::YouTube,
            NotifierEvent::WentLive(_) => Platform::Twitch,
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// イベントを全購読者へ配信するバス
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NotifierEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotifierEvent> {
        self.sender.subscribe()
    }

    /// イベントを配信する。購読者がいない場合は破棄される
    pub fn emit(&self, event: NotifierEvent) {
        let kind = event.kind();
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscribers for {} event", kind);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(NotifierEvent::Ready {
            platform: Platform::Twitch,
        });

        assert_eq!(first.recv().await.unwrap().kind(), "ready");
        assert_eq!(
            second.recv().await.unwrap(),
            NotifierEvent::Ready {
                platform: Platform::Twitch
            }
        );
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(NotifierEvent::Ready {
            platform: Platform::YouTube,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = NotifierEvent::Created {
            platform: Platform::YouTube,
            target: ListenerTarget::YouTubeChannel {
                channel_id: "UC123".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "created");
        assert_eq!(json["data"]["platform"], "youtube");
        assert_eq!(json["data"]["target"]["channel_id"], "UC123");
        assert_eq!(event.platform(), Platform::YouTube);
    }
}
