use crate::config::TwitchConfig;
use crate::errors::TwitchError;
use crate::http::{RetryPolicy, build_client, send_with_retry};
use crate::models::{TwitchStream, TwitchUser};
use crate::twitch::types::HelixResponse;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

/// Twitch Helix APIクライアント
pub struct TwitchClient {
    client: Client,
    config: TwitchConfig,
    client_id: String,
    token: SecretString,
    retry: RetryPolicy,
}

impl TwitchClient {
    /// 新しいTwitchクライアントを作成
    ///
    /// クライアントIDとトークンのどちらかが欠けている場合はエラー。
    pub fn new(config: TwitchConfig, token: Option<SecretString>) -> Result<Self, TwitchError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(TwitchError::MissingCredentials)?;
        let token = token
            .filter(|t| !t.expose_secret().trim().is_empty())
            .ok_or(TwitchError::MissingCredentials)?;

        let client = build_client()?;
        let retry = RetryPolicy::new(config.retry_count, config.retry_interval_sec);

        Ok(TwitchClient {
            client,
            config,
            client_id,
            token,
            retry,
        })
    }

    /// APIベースURLを取得
    pub fn get_api_base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    /// ログイン名からユーザーを取得
    pub async fn get_user(&self, login: &str) -> Result<Option<TwitchUser>, TwitchError> {
        let response: HelixResponse<TwitchUser> = self.get("users", &[("login", login)]).await?;
        Ok(response.into_first())
    }

    /// ログイン名から配信情報を取得。配信していない場合は None
    pub async fn get_stream(&self, login: &str) -> Result<Option<TwitchStream>, TwitchError> {
        let response: HelixResponse<TwitchStream> =
            self.get("streams", &[("user_login", login)]).await?;
        Ok(response.into_first())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<HelixResponse<T>, TwitchError> {
        let url = format!("{}/{}", self.get_api_base_url(), endpoint);

        let request_builder = self
            .client
            .get(&url)
            .query(query)
            .header("Client-ID", &self.client_id)
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            );

        let response = send_with_retry(request_builder, &self.retry).await?;
        let status = response.status();

        match status {
            status if status.is_success() => {
                let text = response.text().await?;
                Ok(serde_json::from_str(&text)?)
            }
            StatusCode::UNAUTHORIZED => Err(TwitchError::AuthenticationError),
            StatusCode::NOT_FOUND => Err(TwitchError::NotFound {
                endpoint: endpoint.to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(TwitchError::RateLimitExceeded),
            _ => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(TwitchError::ApiError {
                    status: status.as_u16(),
                    message: text,
                })
            }
        }
    }
}
