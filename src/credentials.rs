use crate::config::TwitchConfig;
use crate::errors::CredentialError;
use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::path::PathBuf;

const KEYRING_SERVICE: &str = "stream-notifier";
const KEYRING_USER: &str = "twitch_token";
pub const TOKEN_ENV_VAR: &str = "TWITCH_TOKEN";

/// Twitchトークンの保存先（Keyring、利用できない場合はファイル）
#[derive(Debug)]
pub struct CredentialStore {
    keyring_entry: Option<Entry>,
    token_file_path: PathBuf,
}

impl CredentialStore {
    pub fn new() -> Self {
        let keyring_entry = match Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    "Keyring is not available on this system ({}), will use file-based storage.",
                    e
                );
                None
            }
        };

        Self {
            keyring_entry,
            token_file_path: default_token_file_path(),
        }
    }

    /// Keyringを使わずファイルのみに保存するストア
    pub fn file_only(token_file_path: PathBuf) -> Self {
        Self {
            keyring_entry: None,
            token_file_path,
        }
    }

    pub fn save_token(&self, token: &SecretString) -> Result<(), CredentialError> {
        let value = token.expose_secret().trim();
        if value.is_empty() {
            return Err(CredentialError::EmptyToken);
        }

        if let Some(entry) = &self.keyring_entry {
            match entry.set_password(value) {
                Ok(()) => {
                    tracing::info!("Twitch token saved to keyring");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to save token to keyring: {:?}. Trying fallback storage.",
                        e
                    );
                }
            }
        }

        self.save_to_file(value)
    }

    fn save_to_file(&self, value: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.token_file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.token_file_path, value)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.token_file_path, fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!("Twitch token saved to file: {:?}", self.token_file_path);
        Ok(())
    }

    pub fn load_token(&self) -> Result<Option<SecretString>, CredentialError> {
        if let Some(entry) = &self.keyring_entry {
            match entry.get_password() {
                Ok(token) => return Ok(Some(SecretString::new(token))),
                Err(keyring::Error::NoEntry) => {
                    tracing::debug!("No token found in keyring, checking file storage");
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load token from keyring: {:?}. Checking file storage.",
                        e
                    );
                }
            }
        }

        if !self.token_file_path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.token_file_path)?;
        let token = contents.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SecretString::new(token.to_string())))
        }
    }

    /// 保存済みトークンを削除
    pub fn delete_token(&self) -> Result<(), CredentialError> {
        if let Some(entry) = &self.keyring_entry {
            match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => tracing::warn!("Failed to delete token from keyring: {:?}", e),
            }
        }

        if self.token_file_path.exists() {
            fs::remove_file(&self.token_file_path)?;
        }
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_token_file_path() -> PathBuf {
    let mut path = dirs::config_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    path.push("stream-notifier");
    path.push("twitch_token");
    path
}

/// Twitchトークンを解決する
///
/// 設定ファイル、環境変数 TWITCH_TOKEN、保存済みトークンの順に探す。
pub fn resolve_twitch_token(
    config: &TwitchConfig,
    store: &CredentialStore,
) -> Result<Option<SecretString>, CredentialError> {
    if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(Some(SecretString::new(token.trim().to_string())));
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR)
        && !token.trim().is_empty()
    {
        return Ok(Some(SecretString::new(token.trim().to_string())));
    }

    store.load_token()
}

/// 標準入力からトークンを読み取り保存する
pub fn prompt_and_save_token(store: &CredentialStore) -> Result<(), CredentialError> {
    use std::io::Write;

    print!("Enter your Twitch access token: ");
    std::io::stdout().flush()?;

    let token = rpassword::read_password()?;
    if token.trim().is_empty() {
        return Err(CredentialError::EmptyToken);
    }

    store.save_token(&SecretString::new(token.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::file_only(dir.path().join("nested").join("twitch_token"));

        assert!(store.load_token().unwrap().is_none());

        store
            .save_token(&SecretString::new("  abc123  ".to_string()))
            .unwrap();
        let loaded = store.load_token().unwrap().unwrap();
        assert_eq!(loaded.expose_secret(), "abc123");

        store.delete_token().unwrap();
        assert!(store.load_token().unwrap().is_none());
    }

    #[test]
    fn test_save_empty_token_rejected() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::file_only(dir.path().join("twitch_token"));
        assert!(matches!(
            store.save_token(&SecretString::new("   ".to_string())),
            Err(CredentialError::EmptyToken)
        ));
    }

    #[test]
    fn test_config_token_takes_precedence() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::file_only(dir.path().join("twitch_token"));
        store
            .save_token(&SecretString::new("stored".to_string()))
            .unwrap();

        let config = TwitchConfig {
            token: Some("from-config".to_string()),
            ..Default::default()
        };
        let token = resolve_twitch_token(&config, &store).unwrap().unwrap();
        assert_eq!(token.expose_secret(), "from-config");
    }
}
