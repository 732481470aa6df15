use crate::config::YouTubeConfig;
use crate::errors::YouTubeError;
use crate::http::{RetryPolicy, build_client, send_with_retry};
use crate::models::Video;
use crate::youtube::feed::parse_feed;
use reqwest::{Client, Response, StatusCode};
use url::Url;

const CHANNEL_ID_MARKER: &str = "channel_id=";
const CHANNEL_ID_LEN: usize = 24;

/// YouTubeフィードクライアント
pub struct YouTubeClient {
    client: Client,
    config: YouTubeConfig,
    retry: RetryPolicy,
}

impl YouTubeClient {
    /// 新しいYouTubeクライアントを作成
    pub fn new(config: YouTubeConfig) -> Result<Self, YouTubeError> {
        let client = build_client()?;
        let retry = RetryPolicy::new(config.retry_count, config.retry_interval_sec);
        Ok(YouTubeClient {
            client,
            config,
            retry,
        })
    }

    /// フィードのURLを組み立てる
    pub fn feed_url(&self, channel_id: &str) -> Result<Url, YouTubeError> {
        Ok(Url::parse_with_params(
            &self.config.feed_base_url,
            &[("channel_id", channel_id)],
        )?)
    }

    /// チャンネルの動画フィードを取得（新しい順）
    pub async fn fetch_feed(&self, channel_id: &str) -> Result<Vec<Video>, YouTubeError> {
        let url = self.feed_url(channel_id)?;
        tracing::trace!("Fetching feed {}", url);

        let response = send_with_retry(self.client.get(url), &self.retry).await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await?;
                parse_feed(&body, channel_id)
            }
            StatusCode::NOT_FOUND => Err(YouTubeError::ChannelNotFound {
                channel_id: channel_id.to_string(),
            }),
            _ => Err(Self::handle_error_response(response).await),
        }
    }

    /// チャンネルの最新動画を取得。フィードが空の場合は None
    pub async fn fetch_latest(&self, channel_id: &str) -> Result<Option<Video>, YouTubeError> {
        Ok(self.fetch_feed(channel_id).await?.into_iter().next())
    }

    /// チャンネルページのURLからチャンネルIDを取得
    pub async fn get_channel_id(&self, channel_url: &str) -> Result<String, YouTubeError> {
        let url = Url::parse(channel_url)?;
        let response = send_with_retry(self.client.get(url), &self.retry).await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let page = response.text().await?;
        extract_channel_id(&page).ok_or_else(|| YouTubeError::ChannelIdNotFound {
            url: channel_url.to_string(),
        })
    }

    /// エラーレスポンスを処理
    async fn handle_error_response(response: Response) -> YouTubeError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return YouTubeError::RateLimitExceeded;
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        YouTubeError::ServerError {
            status: status.as_u16(),
            message: text,
        }
    }
}

/// チャンネルページのHTMLからチャンネルIDを取り出す
///
/// 最初の `channel_id=` の直後24文字をチャンネルIDとみなす。
pub fn extract_channel_id(page: &str) -> Option<String> {
    let (_, rest) = page.split_once(CHANNEL_ID_MARKER)?;
    let candidate: String = rest.chars().take(CHANNEL_ID_LEN).collect();
    is_channel_id(&candidate).then_some(candidate)
}

/// チャンネルIDの形式（"UC" + 22文字）かどうか
pub fn is_channel_id(value: &str) -> bool {
    value.len() == CHANNEL_ID_LEN
        && value.starts_with("UC")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_channel_id() {
        let page = r#"<link rel="alternate" type="application/rss+xml" title="RSS" href="https://www.youtube.com/feeds/videos.xml?channel_id=UCXuqSBlHAE6Xw-yeJA0Tunw">"#;
        assert_eq!(
            extract_channel_id(page).as_deref(),
            Some("UCXuqSBlHAE6Xw-yeJA0Tunw")
        );
    }

    #[test]
    fn test_extract_channel_id_missing() {
        assert_eq!(extract_channel_id("<html></html>"), None);
        assert_eq!(extract_channel_id("channel_id=UCshort\""), None);
    }

    #[test]
    fn test_is_channel_id() {
        assert!(is_channel_id("UCXuqSBlHAE6Xw-yeJA0Tunw"));
        assert!(!is_channel_id("https://www.youtube.com/@LinusTechTips"));
        assert!(!is_channel_id("XXXuqSBlHAE6Xw-yeJA0Tunw"));
    }

    #[test]
    fn test_feed_url() {
        let client = YouTubeClient::new(YouTubeConfig::default()).unwrap();
        let url = client.feed_url("UCXuqSBlHAE6Xw-yeJA0Tunw").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UCXuqSBlHAE6Xw-yeJA0Tunw"
        );
    }
}
