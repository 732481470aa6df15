use crate::errors::AppError;
use crate::events::NotifierEvent;
use crate::models::{ListenerTarget, Platform};
use std::future::Future;

/// 監視対象の初回観測時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// 現在の最新IDを記録するだけで通知しない
    Silent,
    /// 空の状態を記録する。初回に観測したコンテンツも通知される
    Empty,
}

/// プラットフォームごとのコンテンツ取得元
pub trait Source: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn platform(&self) -> Platform;

    fn seed_policy(&self) -> SeedPolicy;

    /// 監視対象の表記を正規化する。同じ対象を二重に監視しないために使う
    fn normalize_target(&self, target: &str) -> String {
        target.trim().to_string()
    }

    /// リスナー作成時に監視対象の情報を取得する
    fn describe(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<ListenerTarget, AppError>> + Send;

    /// 最新のコンテンツを取得する。存在しない場合（配信していない等）は None
    fn fetch_latest(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<Option<Self::Item>, AppError>> + Send;

    /// 重複排除状態のキー
    fn state_key(&self, target: &str, item: &Self::Item) -> String;

    /// 重複排除に使うコンテンツID
    fn content_id<'a>(&self, item: &'a Self::Item) -> &'a str;

    fn into_event(&self, item: Self::Item) -> NotifierEvent;
}
