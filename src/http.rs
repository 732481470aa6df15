use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// レートリミット時に待機する最大時間
const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);

/// 再試行ポリシー
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retry_count: u32,
    pub retry_interval: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, retry_interval_sec: u64) -> Self {
        RetryPolicy {
            retry_count,
            retry_interval: Duration::from_secs(retry_interval_sec),
        }
    }
}

/// 共通設定済みのHTTPクライアントを作成
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(format!("stream-notifier/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
}

/// リトライ付きでリクエスト送信
///
/// ネットワークエラー、429、5xx の場合に再試行する。再試行回数を使い切った場合は
/// 最後のレスポンス（またはエラー）をそのまま返す。
pub async fn send_with_retry(
    request_builder: RequestBuilder,
    policy: &RetryPolicy,
) -> Result<Response, reqwest::Error> {
    let mut attempt = 0;

    loop {
        // ボディがストリームの場合は複製できないので再試行しない
        let Some(request) = request_builder.try_clone() else {
            return request_builder.send().await;
        };

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let retryable =
                    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if !retryable || attempt >= policy.retry_count {
                    return Ok(response);
                }

                let wait = retry_delay(response.headers(), policy);
                tracing::warn!(
                    "Request to {} returned {}, retrying in {:?} (attempt {}/{})",
                    response.url(),
                    status,
                    wait,
                    attempt + 1,
                    policy.retry_count
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                if attempt >= policy.retry_count {
                    return Err(e);
                }
                tracing::warn!(
                    "Request failed: {}, retrying in {:?} (attempt {}/{})",
                    e,
                    policy.retry_interval,
                    attempt + 1,
                    policy.retry_count
                );
                tokio::time::sleep(policy.retry_interval).await;
            }
        }

        attempt += 1;
    }
}

/// 待機時間を決定する
///
/// `Retry-After`（秒）または Twitch の `Ratelimit-Reset`（UNIX時刻）を優先し、
/// どちらもなければポリシーの間隔を使う。
fn retry_delay(headers: &HeaderMap, policy: &RetryPolicy) -> Duration {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    let from_headers = if let Some(secs) = header_u64(RETRY_AFTER.as_str()) {
        Some(Duration::from_secs(secs))
    } else {
        header_u64("ratelimit-reset").map(|reset_at| {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            Duration::from_secs(reset_at.saturating_sub(now))
        })
    };

    from_headers
        .map(|wait| wait.min(MAX_RETRY_WAIT))
        .unwrap_or(policy.retry_interval)
}
