use crate::api::ApiServer;
use crate::config::Config;
use crate::credentials::{CredentialStore, resolve_twitch_token};
use crate::dispatcher::{Dispatcher, notifier_from_config};
use crate::errors::AppError;
use crate::events::EventBus;
use crate::history_manager::HistoryManager;
use crate::listener::{Source, Watcher};
use crate::state::StateManager;
use crate::storage::open_shared;
use crate::twitch::{TwitchClient, TwitchSource};
use crate::youtube::{YouTubeClient, YouTubeSource, is_channel_id};
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;

const DISPATCHER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// 監視サービスを起動し、シャットダウンシグナルを受けるまで実行する
pub async fn run_service(config: Config) -> Result<(), AppError> {
    config.validate()?;

    let storage = open_shared(&config.database_path())?;
    let state = StateManager::from_shared(storage.clone());
    let history = HistoryManager::from_shared(storage);
    let events = EventBus::new();

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel(1);

    // ウォッチャーより先に購読しておき、Ready イベントも受け取る
    let dispatcher = Dispatcher::new(
        notifier_from_config(&config.notification),
        history.clone(),
        config.notification.persistent,
    );
    let dispatcher_task = {
        let events_rx = events.subscribe();
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move { dispatcher.run(events_rx, shutdown_rx).await })
    };

    let api_handle = if config.api_enabled() {
        let server = ApiServer::new(history.clone(), state.clone(), config.api_port())
            .start()
            .map_err(|e| AppError::Generic {
                message: format!("Failed to start API server: {}", e),
            })?;
        let handle = server.handle();
        tokio::spawn(async move {
            if let Err(e) = server.await {
                tracing::error!("API server error: {}", e);
            }
        });
        Some(handle)
    } else {
        None
    };

    let mut youtube = start_youtube(&config, &state, &events).await?;
    let mut twitch = start_twitch(&config, &state, &events).await?;

    if youtube.is_none() && twitch.is_none() {
        tracing::warn!("No YouTube or Twitch channels configured, nothing to watch");
    }

    wait_for_shutdown_signal().await;
    tracing::info!("Shutdown signal received, attempting graceful shutdown...");

    if let Some(watcher) = youtube.as_mut() {
        watcher.stop_all().await;
    }
    if let Some(watcher) = twitch.as_mut() {
        watcher.stop_all().await;
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(DISPATCHER_SHUTDOWN_TIMEOUT, dispatcher_task).await {
        Ok(Ok(())) => tracing::info!("Dispatcher exited normally after shutdown signal"),
        Ok(Err(e)) => tracing::error!("Dispatcher join error after shutdown: {}", e),
        Err(_) => tracing::error!("Dispatcher did not complete within timeout, forcing shutdown"),
    }

    if let Some(handle) = api_handle {
        handle.stop(true).await;
    }

    tracing::info!("Stream Notifier shutdown complete");
    Ok(())
}

/// URL で指定されたチャンネルはチャンネルIDに解決する
pub async fn resolve_channel(client: &YouTubeClient, channel: &str) -> Result<String, AppError> {
    let channel = channel.trim();
    if channel.starts_with("http://") || channel.starts_with("https://") {
        Ok(client.get_channel_id(channel).await?)
    } else {
        Ok(channel.to_string())
    }
}

async fn start_youtube(
    config: &Config,
    state: &StateManager,
    events: &EventBus,
) -> Result<Option<Watcher<YouTubeSource>>, AppError> {
    if config.youtube.channels.is_empty() {
        return Ok(None);
    }

    let client = YouTubeClient::new(config.youtube.clone())?;
    let mut channel_ids = Vec::new();
    for channel in &config.youtube.channels {
        match resolve_channel(&client, channel).await {
            Ok(channel_id) => {
                if !is_channel_id(&channel_id) {
                    tracing::warn!("{} does not look like a YouTube channel ID", channel_id);
                }
                channel_ids.push(channel_id);
            }
            Err(e) => tracing::error!("Failed to resolve YouTube channel {}: {}", channel, e),
        }
    }

    let watcher = Watcher::new(
        YouTubeSource::new(client),
        state.clone(),
        events.clone(),
        config.poll_interval(),
    )?;
    Ok(Some(start_listeners(watcher, &channel_ids).await))
}

async fn start_twitch(
    config: &Config,
    state: &StateManager,
    events: &EventBus,
) -> Result<Option<Watcher<TwitchSource>>, AppError> {
    if config.twitch.channels.is_empty() {
        return Ok(None);
    }

    let token = resolve_twitch_token(&config.twitch, &CredentialStore::new())?;
    let client = TwitchClient::new(config.twitch.clone(), token)?;

    let watcher = Watcher::new(
        TwitchSource::new(client),
        state.clone(),
        events.clone(),
        config.poll_interval(),
    )?;
    Ok(Some(start_listeners(watcher, &config.twitch.channels).await))
}

// 個々の対象の失敗はログに残し、残りの対象の監視は続ける
async fn start_listeners<S: Source>(mut watcher: Watcher<S>, targets: &[String]) -> Watcher<S> {
    for target in targets {
        if let Err(e) = watcher.create_listener(target).await {
            tracing::error!("Failed to create listener for {}: {}", target, e);
        }
    }
    watcher
}

// Wait for a shutdown signal
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YouTubeConfig;

    #[tokio::test]
    async fn test_resolve_channel_passes_through_ids() {
        let client = YouTubeClient::new(YouTubeConfig::default()).unwrap();
        let resolved = resolve_channel(&client, " UCXuqSBlHAE6Xw-yeJA0Tunw ")
            .await
            .unwrap();
        assert_eq!(resolved, "UCXuqSBlHAE6Xw-yeJA0Tunw");
    }

    #[tokio::test]
    async fn test_start_youtube_without_channels() {
        let config = Config::default();
        let state = StateManager::from_shared(open_shared_in_memory());
        let watcher = start_youtube(&config, &state, &EventBus::new()).await.unwrap();
        assert!(watcher.is_none());
    }

    #[tokio::test]
    async fn test_start_twitch_without_channels() {
        let config = Config::default();
        let state = StateManager::from_shared(open_shared_in_memory());
        let watcher = start_twitch(&config, &state, &EventBus::new()).await.unwrap();
        assert!(watcher.is_none());
    }

    fn open_shared_in_memory() -> crate::storage::SharedStorage {
        std::sync::Arc::new(std::sync::Mutex::new(
            crate::storage::NotifyStorage::in_memory().unwrap(),
        ))
    }
}
