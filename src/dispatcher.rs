use crate::config::NotificationConfig;
use crate::errors::NotificationError;
use crate::events::NotifierEvent;
use crate::history_manager::HistoryManager;
use notify_rust::Notification;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

pub trait Notifier: Send + Sync {
    fn send_notification(
        &self,
        title: &str,
        body: &str,
        url: &str,
        persistent: bool,
    ) -> Result<(), NotificationError>;
}

/// デスクトップ通知
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn send_notification(
        &self,
        title: &str,
        body: &str,
        url: &str,
        persistent: bool,
    ) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .summary(title)
            .body(body)
            .icon("dialog-information");

        // ヒントは XDG 通知サーバーのみ対応
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            notification.hint(notify_rust::Hint::Transient(!persistent));
            notification.hint(notify_rust::Hint::Custom(
                "default-action".to_string(),
                url.to_string(),
            ));
        }
        #[cfg(not(all(unix, not(target_os = "macos"))))]
        let _ = (url, persistent);

        notification
            .show()
            .map_err(|e| NotificationError::SendError {
                source: Box::new(e),
            })?;
        Ok(())
    }
}

/// 標準出力に通知を書き出す（デスクトップ環境がない場合向け）
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send_notification(
        &self,
        title: &str,
        body: &str,
        url: &str,
        _persistent: bool,
    ) -> Result<(), NotificationError> {
        println!("{} - {} ({})", title, body, url);
        Ok(())
    }
}

/// 設定に応じた Notifier を作成
pub fn notifier_from_config(config: &NotificationConfig) -> Box<dyn Notifier> {
    if config.desktop {
        Box::new(DesktopNotifier)
    } else {
        Box::new(ConsoleNotifier)
    }
}

/// 通知のタイトル・本文・URL を組み立てる。コンテンツを持たないイベントは None
pub fn render(event: &NotifierEvent) -> Option<(String, String, String)> {
    match event {
        NotifierEvent::NewVideo(video) => {
            let author = video.author.as_deref().unwrap_or(&video.channel_id);
            Some((
                format!("{} uploaded a new video", author),
                video.title.clone(),
                video.url.clone(),
            ))
        }
        NotifierEvent::WentLive(stream) => {
            let body = if stream.game_name.is_empty() {
                stream.title.clone()
            } else {
                format!("{}\n{}", stream.title, stream.game_name)
            };
            Some((
                format!("{} is live on Twitch", stream.user_name),
                body,
                stream.channel_url(),
            ))
        }
        _ => None,
    }
}

/// イベントバスを購読し、履歴の保存と通知を行う
pub struct Dispatcher {
    notifier: Box<dyn Notifier>,
    history: HistoryManager,
    persistent: bool,
}

impl Dispatcher {
    pub fn new(notifier: Box<dyn Notifier>, history: HistoryManager, persistent: bool) -> Self {
        Dispatcher {
            notifier,
            history,
            persistent,
        }
    }

    /// 1件のイベントを処理する
    pub fn handle_event(&self, event: &NotifierEvent) {
        let Some((title, body, url)) = render(event) else {
            tracing::info!("{} event from {}", event.kind(), event.platform());
            return;
        };

        match self.history.record(event) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Event already recorded, skipping notification: {}", url);
                return;
            }
            Err(e) => tracing::error!("Failed to record event: {}", e),
        }

        tracing::info!("Notifying: {} - {}", title, body);
        if let Err(e) = self
            .notifier
            .send_notification(&title, &body, &url, self.persistent)
        {
            tracing::error!("Failed to send notification: {}", e);
        }
    }

    /// シャットダウンシグナルを受けるかバスが閉じるまでイベントを処理する
    ///
    /// シャットダウン時点でバスに残っているイベントは処理してから終了する。
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<NotifierEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;

                received = events.recv() => match received {
                    Ok(event) => self.handle_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Dispatcher lagged behind, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Event bus closed, dispatcher exiting");
                        return;
                    }
                },
                _ = shutdown_rx.recv() => {
                    self.drain(&mut events);
                    tracing::info!("Shutdown signal received, dispatcher exiting");
                    return;
                }
            }
        }
    }

    fn drain(&self, events: &mut broadcast::Receiver<NotifierEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.handle_event(&event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Dispatcher lagged behind, {} events skipped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return,
            }
        }
    }
}
