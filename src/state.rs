use crate::errors::StorageError;
use crate::models::ListenerState;
use crate::storage::{NotifyStorage, SharedStorage, open_shared};
use std::path::Path;
use std::sync::MutexGuard;

/// 重複排除状態（監視対象ごとの最終確認コンテンツID）を管理する
#[derive(Clone)]
pub struct StateManager {
    storage: SharedStorage,
}

impl StateManager {
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_shared(open_shared(db_path)?))
    }

    /// 既存のストレージを共有して作成
    pub fn from_shared(storage: SharedStorage) -> Self {
        StateManager { storage }
    }

    fn lock(&self) -> Result<MutexGuard<'_, NotifyStorage>, StorageError> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// 状態を取得
    pub fn get(&self, key: &str) -> Result<Option<ListenerState>, StorageError> {
        Ok(self.lock()?.get_state(key)?)
    }

    /// 最終確認IDを更新
    pub fn put(&self, key: &str, target: &str, latest: Option<&str>) -> Result<(), StorageError> {
        tracing::debug!("Updating dedup state {} -> {:?}", key, latest);
        Ok(self.lock()?.put_state(key, target, latest)?)
    }

    /// 状態を削除。削除されたかどうかを返す
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.delete_state(key)? > 0)
    }

    /// すべての状態を削除
    pub fn clear(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.clear_state()?)
    }

    pub fn list(&self) -> Result<Vec<ListenerState>, StorageError> {
        Ok(self.lock()?.list_states()?)
    }
}
