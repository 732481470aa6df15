use crate::errors::{AppError, ListenerError};
use crate::events::{EventBus, NotifierEvent};
use crate::listener::poll::poll_once;
use crate::listener::source::Source;
use crate::models::ListenerTarget;
use crate::state::StateManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// 停止時にポーリングタスクの終了を待つ最大時間
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct ActiveListener {
    target: String,
    info: ListenerTarget,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

/// 1つのプラットフォームについて、監視対象ごとのリスナーを管理する
pub struct Watcher<S: Source> {
    source: Arc<S>,
    state: StateManager,
    events: EventBus,
    interval: Duration,
    listeners: Vec<ActiveListener>,
}

impl<S: Source> Watcher<S> {
    /// 新しいウォッチャーを作成し、Ready イベントを配信する
    pub fn new(
        source: S,
        state: StateManager,
        events: EventBus,
        interval: Duration,
    ) -> Result<Self, ListenerError> {
        if interval.is_zero() {
            return Err(ListenerError::InvalidInterval { interval_ms: 0 });
        }

        let watcher = Watcher {
            source: Arc::new(source),
            state,
            events,
            interval,
            listeners: Vec::new(),
        };
        watcher.events.emit(NotifierEvent::Ready {
            platform: watcher.source.platform(),
        });
        tracing::info!("{} watcher ready", watcher.source.platform());
        Ok(watcher)
    }

    /// 監視中の対象（開始順）
    pub fn active_targets(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.target.as_str()).collect()
    }

    pub fn is_listening(&self, target: &str) -> bool {
        let target = self.source.normalize_target(target);
        self.listeners.iter().any(|l| l.target == target)
    }

    /// リスナーを作成してポーリングを開始する
    pub async fn create_listener(&mut self, target: &str) -> Result<(), AppError> {
        let target = self.source.normalize_target(target);
        let target = target.as_str();
        let platform = self.source.platform();

        if target.is_empty() {
            return Err(ListenerError::MissingTarget {
                platform: platform.to_string(),
            }
            .into());
        }
        if self.is_listening(target) {
            return Err(ListenerError::AlreadyListening {
                target: target.to_string(),
            }
            .into());
        }

        let info = self.source.describe(target).await?;
        self.events.emit(NotifierEvent::Created {
            platform,
            target: info.clone(),
        });

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(run_listener(
            self.source.clone(),
            self.state.clone(),
            self.events.clone(),
            target.to_string(),
            self.interval,
            shutdown_rx,
        ));

        tracing::info!("Started {} listener for {}", platform, target);
        self.listeners.push(ActiveListener {
            target: target.to_string(),
            info,
            shutdown_tx,
            task,
        });
        Ok(())
    }

    /// リスナーを停止する。対象を省略した場合は最初に開始したリスナーを停止する
    pub async fn stop_listener(&mut self, target: Option<&str>) -> Result<(), AppError> {
        if self.listeners.is_empty() {
            return Err(ListenerError::NoListeners.into());
        }

        let index = match target {
            None => 0,
            Some(target) => {
                let target = self.source.normalize_target(target);
                self.listeners
                    .iter()
                    .position(|l| l.target == target)
                    .ok_or_else(|| ListenerError::NotListening {
                        target: target.to_string(),
                    })?
            }
        };

        let listener = self.listeners.remove(index);
        self.shutdown(listener).await;
        Ok(())
    }

    /// すべてのリスナーを停止する
    pub async fn stop_all(&mut self) {
        for listener in std::mem::take(&mut self.listeners) {
            self.shutdown(listener).await;
        }
    }

    async fn shutdown(&self, mut listener: ActiveListener) {
        let platform = self.source.platform();
        let _ = listener.shutdown_tx.send(());

        match tokio::time::timeout(STOP_TIMEOUT, &mut listener.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("{} listener task join error: {}", platform, e),
            Err(_) => {
                tracing::error!(
                    "{} listener for {} did not stop within timeout, aborting",
                    platform,
                    listener.target
                );
                listener.task.abort();
                // abort 後のタスクが Deleted より後にイベントを出さないよう終了を待つ
                let _ = (&mut listener.task).await;
            }
        }

        tracing::info!("Stopped {} listener for {}", platform, listener.target);
        self.events.emit(NotifierEvent::Deleted {
            platform,
            target: listener.info,
        });
    }
}

/// 1つの監視対象のポーリングループ
///
/// 取得が間隔より長引いた場合、溜まったティックは捨てる。
/// 取得中でも停止シグナルを受けた時点で取得を打ち切る。
async fn run_listener<S: Source>(
    source: Arc<S>,
    state: StateManager,
    events: EventBus,
    target: String,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.recv() => break,
        }

        // poll_once は状態の書き込み後に await しない
        let polled = tokio::select! {
            polled = poll_once(source.as_ref(), &state, &target) => polled,
            _ = shutdown_rx.recv() => break,
        };

        match polled {
            Ok(Some(item)) => events.emit(source.into_event(item)),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                "{} listener for {} failed to poll: {}",
                source.platform(),
                target,
                e
            ),
        }
    }

    tracing::debug!("{} listener for {} received shutdown", source.platform(), target);
}

impl<S: Source> Drop for Watcher<S> {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.task.abort();
        }
    }
}
