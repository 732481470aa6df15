use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug)]
pub enum AppError {
    /// 設定関連エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// YouTube関連エラー
    #[error("YouTube error: {0}")]
    YouTube(#[from] YouTubeError),

    /// Twitch関連エラー
    #[error("Twitch error: {0}")]
    Twitch(#[from] TwitchError),

    /// ストレージ関連エラー
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// リスナー関連エラー
    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    /// 通知関連エラー
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// 認証情報関連エラー
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// 汎用エラー
    #[error("{message}")]
    Generic { message: String },
}

/// 設定関連エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定ファイル読み込みエラー
    #[error("Failed to load config file: {source}")]
    LoadError {
        #[source]
        source: std::io::Error,
    },

    /// 設定ファイルパースエラー
    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    /// 設定ファイルのシリアライズエラー
    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },

    /// 設定ファイル書き込みエラー
    #[error("Failed to write config file: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// 指定された設定ファイルが存在しない
    #[error("Config file not found: {path}")]
    NotFound { path: String },

    /// 設定バリデーションエラー
    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },
}

/// YouTube関連エラー
#[derive(Error, Debug)]
pub enum YouTubeError {
    /// ネットワークエラー
    #[error("Network error: {source}")]
    NetworkError {
        #[source]
        source: reqwest::Error,
    },

    /// フィードのパースエラー
    #[error("Failed to parse feed: {source}")]
    FeedError {
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },

    /// URLの組み立てエラー
    #[error("Invalid URL: {source}")]
    InvalidUrl {
        #[source]
        source: url::ParseError,
    },

    /// チャンネルが存在しない
    #[error("Channel not found: {channel_id}")]
    ChannelNotFound { channel_id: String },

    /// チャンネルページからチャンネルIDを取り出せなかった
    #[error("No channel id found on page: {url}")]
    ChannelIdNotFound { url: String },

    /// レートリミット超過
    #[error("YouTube rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    /// サーバーエラー
    #[error("YouTube server error: {status} {message}")]
    ServerError { status: u16, message: String },
}

/// Twitch関連エラー
#[derive(Error, Debug)]
pub enum TwitchError {
    /// クライアントIDまたはトークンが未設定
    #[error("The Twitch client id or token has not been specified.")]
    MissingCredentials,

    /// ネットワークエラー
    #[error("Network error: {source}")]
    NetworkError {
        #[source]
        source: reqwest::Error,
    },

    /// レスポンスのパースエラー
    #[error("Response parsing failed: {source}")]
    ParseError {
        #[source]
        source: serde_json::Error,
    },

    /// 認証エラー
    #[error("Authentication failed. Please check your Twitch client id and token.")]
    AuthenticationError,

    /// エンドポイントが存在しない
    #[error("Twitch API endpoint not found: {endpoint}")]
    NotFound { endpoint: String },

    /// レートリミット超過
    #[error("Twitch API rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    /// APIエラー
    #[error("Twitch API error: {status} {message}")]
    ApiError { status: u16, message: String },
}

/// ストレージ関連エラー
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLiteエラー
    #[error("Database error: {source}")]
    Database {
        #[source]
        source: rusqlite::Error,
    },

    /// データベースディレクトリの作成エラー
    #[error("Failed to prepare database directory: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// ロック取得エラー
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// リスナー関連エラー
#[derive(Error, Debug)]
pub enum ListenerError {
    /// 対象が指定されていない
    #[error("You must specify the {platform} channel to create a listener")]
    MissingTarget { platform: String },

    /// 対象が存在しない
    #[error("Unknown {platform} channel: {target}")]
    UnknownTarget { platform: String, target: String },

    /// 既にリスナーが存在する
    #[error("Already listening to {target}")]
    AlreadyListening { target: String },

    /// 停止するリスナーが存在しない
    #[error("There are no listeners to interrupt.")]
    NoListeners,

    /// 指定された対象のリスナーが存在しない
    #[error("No listener is running for {target}")]
    NotListening { target: String },

    /// ポーリング間隔エラー
    #[error("Invalid polling interval: {interval_ms}ms")]
    InvalidInterval { interval_ms: u64 },
}

/// 通知関連エラー
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 通知送信エラー
    #[error("Failed to send notification: {source}")]
    SendError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 認証情報関連エラー
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Keyring操作エラー
    #[error("Keyring error: {source}")]
    KeyringError {
        #[source]
        source: keyring::Error,
    },

    /// ファイル操作エラー
    #[error("Token file error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// 入力が空
    #[error("Token cannot be empty")]
    EmptyToken,
}

impl From<reqwest::Error> for YouTubeError {
    fn from(error: reqwest::Error) -> Self {
        YouTubeError::NetworkError { source: error }
    }
}

impl From<feed_rs::parser::ParseFeedError> for YouTubeError {
    fn from(error: feed_rs::parser::ParseFeedError) -> Self {
        YouTubeError::FeedError { source: error }
    }
}

impl From<url::ParseError> for YouTubeError {
    fn from(error: url::ParseError) -> Self {
        YouTubeError::InvalidUrl { source: error }
    }
}

impl From<reqwest::Error> for TwitchError {
    fn from(error: reqwest::Error) -> Self {
        TwitchError::NetworkError { source: error }
    }
}

impl From<serde_json::Error> for TwitchError {
    fn from(error: serde_json::Error) -> Self {
        TwitchError::ParseError { source: error }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        StorageError::Database { source: error }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io { source: error }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(error: std::io::Error) -> Self {
        ConfigError::LoadError { source: error }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::SerializeError { source: error }
    }
}

impl From<keyring::Error> for CredentialError {
    fn from(error: keyring::Error) -> Self {
        CredentialError::KeyringError { source: error }
    }
}

impl From<std::io::Error> for CredentialError {
    fn from(error: std::io::Error) -> Self {
        CredentialError::Io { source: error }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        AppError::Storage(StorageError::Database { source: error })
    }
}
