use crate::errors::AppError;
use crate::listener::source::{SeedPolicy, Source};
use crate::state::StateManager;

/// 1回分のポーリングを実行する
///
/// 最新コンテンツのIDが記録済みのIDと異なる場合のみ、状態を更新した上で
/// そのコンテンツを返す。
pub async fn poll_once<S: Source>(
    source: &S,
    state: &StateManager,
    target: &str,
) -> Result<Option<S::Item>, AppError> {
    let Some(item) = source.fetch_latest(target).await? else {
        tracing::trace!("{} {}: nothing to compare", source.platform(), target);
        return Ok(None);
    };

    let key = source.state_key(target, &item);
    let content_id = source.content_id(&item);

    match state.get(&key)? {
        None => {
            if source.seed_policy() == SeedPolicy::Silent {
                tracing::debug!(
                    "{} {}: seeding {} with {}",
                    source.platform(),
                    target,
                    key,
                    content_id
                );
                state.put(&key, target, Some(content_id))?;
                return Ok(None);
            }
        }
        Some(existing) if existing.latest.as_deref() == Some(content_id) => {
            return Ok(None);
        }
        Some(_) => {}
    }

    state.put(&key, target, Some(content_id))?;
    tracing::info!(
        "{} {}: new content {} (state key {})",
        source.platform(),
        target,
        content_id,
        key
    );
    Ok(Some(item))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::events::NotifierEvent;
    use crate::models::{ListenerTarget, Platform, Video};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 事前に用意した結果を順番に返すテスト用の取得元
    pub struct ScriptedSource {
        pub policy: SeedPolicy,
        pub responses: Mutex<VecDeque<Result<Option<Video>, String>>>,
        pub known_targets: Vec<String>,
        pub fetch_delay: std::time::Duration,
    }

    impl ScriptedSource {
        pub fn new(policy: SeedPolicy) -> Self {
            ScriptedSource {
                policy,
                responses: Mutex::new(VecDeque::new()),
                known_targets: Vec::new(),
                fetch_delay: std::time::Duration::ZERO,
            }
        }

        pub fn push(&self, response: Result<Option<Video>, String>) {
            self.responses.lock().unwrap().push_back(response);
        }
    }

    pub fn video(id: &str) -> Video {
        Video {
            id: format!("yt:video:{}", id),
            video_id: id.to_string(),
            channel_id: "UC123".to_string(),
            title: format!("Video {}", id),
            url: format!("https://www.youtube.com/watch?v={}", id),
            author: None,
            published: None,
        }
    }

    impl Source for ScriptedSource {
        type Item = Video;

        fn platform(&self) -> Platform {
            Platform::YouTube
        }

        fn seed_policy(&self) -> SeedPolicy {
            self.policy
        }

        async fn describe(&self, target: &str) -> Result<ListenerTarget, AppError> {
            if !self.known_targets.is_empty() && !self.known_targets.iter().any(|t| t == target) {
                return Err(crate::errors::ListenerError::UnknownTarget {
                    platform: "YouTube".to_string(),
                    target: target.to_string(),
                }
                .into());
            }
            Ok(ListenerTarget::YouTubeChannel {
                channel_id: target.to_string(),
            })
        }

        async fn fetch_latest(&self, _target: &str) -> Result<Option<Video>, AppError> {
            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(item)) => Ok(item),
                Some(Err(message)) => Err(AppError::Generic { message }),
                None => Ok(None),
            }
        }

        fn state_key(&self, target: &str, _item: &Video) -> String {
            format!("video_{}", target)
        }

        fn content_id<'a>(&self, item: &'a Video) -> &'a str {
            &item.id
        }

        fn into_event(&self, item: Video) -> NotifierEvent {
            NotifierEvent::NewVideo(item)
        }
    }
}
