pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod history_manager;
pub mod http;
pub mod listener;
pub mod logger;
pub mod models;
pub mod runtime;
pub mod state;
pub mod storage;
pub mod twitch;
pub mod youtube;

pub use config::{Config, load_config};
pub use dispatcher::{ConsoleNotifier, DesktopNotifier, Dispatcher, Notifier};
pub use errors::{
    AppError, ConfigError, CredentialError, ListenerError, NotificationError, StorageError,
    TwitchError, YouTubeError,
};
pub use events::{EventBus, NotifierEvent};
pub use history_manager::HistoryManager;
pub use listener::{SeedPolicy, Source, Watcher};
pub use models::{ListenerTarget, Platform, TwitchStream, TwitchUser, Video};
pub use state::StateManager;
pub use twitch::{TwitchClient, TwitchSource};
pub use youtube::{YouTubeClient, YouTubeSource};
