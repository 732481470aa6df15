use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// YouTube設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// 監視するチャンネル（チャンネルID、またはチャンネルページのURL）
    #[serde(default)]
    pub channels: Vec<String>,

    /// フィードのベースURL（省略可、デフォルト: https://www.youtube.com/feeds/videos.xml）
    #[serde(default = "default_youtube_feed_url")]
    pub feed_base_url: String,

    /// リクエスト失敗時の再試行回数
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// 再試行間隔（秒）
    #[serde(default = "default_retry_interval_sec")]
    pub retry_interval_sec: u64,
}

fn default_youtube_feed_url() -> String {
    "https://www.youtube.com/feeds/videos.xml".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            feed_base_url: default_youtube_feed_url(),
            retry_count: default_retry_count(),
            retry_interval_sec: default_retry_interval_sec(),
        }
    }
}

/// Twitch (Helix API) 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    /// アプリケーションのクライアントID
    #[serde(default)]
    pub client_id: Option<String>,

    /// アクセストークン（省略時は環境変数 TWITCH_TOKEN、次に保存済みトークンを使用）
    #[serde(default)]
    pub token: Option<String>,

    /// APIベースURL（省略可、デフォルト: https://api.twitch.tv/helix）
    #[serde(default = "default_twitch_api_url")]
    pub api_base_url: String,

    /// 監視するチャンネルのログイン名
    #[serde(default)]
    pub channels: Vec<String>,

    /// APIレートリミット超過時の再試行回数
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// 再試行間隔（秒）
    #[serde(default = "default_retry_interval_sec")]
    pub retry_interval_sec: u64,
}

fn default_twitch_api_url() -> String {
    "https://api.twitch.tv/helix".to_string()
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            token: None,
            api_base_url: default_twitch_api_url(),
            channels: Vec::new(),
            retry_count: default_retry_count(),
            retry_interval_sec: default_retry_interval_sec(),
        }
    }
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_interval_sec() -> u64 {
    5
}

/// ポーリング設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// ポーリング間隔（ミリ秒）
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// ストレージ設定
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// SQLiteデータベースのパス（省略可、デフォルト: データディレクトリ下の notify.sqlite）
    #[serde(default)]
    pub database_path: Option<String>,
}

/// 通知設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// デスクトップ通知を表示するかどうか（false の場合は標準出力に書き出す）
    #[serde(default = "default_desktop")]
    pub desktop: bool,

    /// 通知を永続的に表示するかどうか（自動消去しない）
    #[serde(default)]
    pub persistent: bool,
}

fn default_desktop() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            desktop: default_desktop(),
            persistent: false,
        }
    }
}

/// APIサーバー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// APIサーバーを有効にするかどうか
    #[serde(default)]
    pub enabled: bool,

    /// APIサーバーのポート番号
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_api_port(),
        }
    }
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// ログレベル（省略可、デフォルト: info）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルのパス（省略時は標準エラー出力）
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub youtube: YouTubeConfig,

    #[serde(default)]
    pub twitch: TwitchConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.polling.interval_ms)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn api_enabled(&self) -> bool {
        self.api.enabled
    }

    pub fn api_port(&self) -> u16 {
        self.api.port
    }

    /// データベースファイルのパスを取得
    pub fn database_path(&self) -> PathBuf {
        match &self.storage.database_path {
            Some(path) => PathBuf::from(path),
            None => app_data_dir().join("notify.sqlite"),
        }
    }

    /// 設定値の整合性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::ValidationError {
                reason: "polling.interval_ms must be greater than zero".to_string(),
            });
        }

        let has_client_id = self
            .twitch
            .client_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !self.twitch.channels.is_empty() && !has_client_id {
            return Err(ConfigError::ValidationError {
                reason: "twitch.client_id is required when twitch.channels is set".to_string(),
            });
        }

        Ok(())
    }
}

/// アプリケーションのデータディレクトリ
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("stream-notifier")
}

/// 設定ファイルのパスを取得
pub fn config_file_path() -> PathBuf {
    let mut path = dirs::config_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    path.push("stream-notifier");
    path.push("config.toml");
    path
}

/// 設定ファイルを読み込む
///
/// パスが明示された場合はファイルが存在しなければエラー。
/// デフォルトパスにファイルが存在しない場合はデフォルト設定を返す。
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            path.to_path_buf()
        }
        None => {
            let default_path = config_file_path();
            if !default_path.exists() {
                return Ok(Config::default());
            }
            default_path
        }
    };

    let contents = fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// 設定ファイルを保存する
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent_dir) = path.parent()
        && !parent_dir.exists()
    {
        fs::create_dir_all(parent_dir).map_err(|e| ConfigError::WriteError { source: e })?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|e| ConfigError::WriteError { source: e })?;
    Ok(())
}
