//! Filesystem secret store
//!
//! One EIP-2335 keystore file per key, `<dir>/<pubG1>.json`. The directory
//! is created with owner-only permissions and files are written atomically
//! (temp file + rename) so a crash never leaves a half-written keystore.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cerberus_crypto::{EncryptedKeystore, KeyPair, KeystoreError};
use secrecy::ExposeSecret;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::{check_identity, SecretStore};

const KEY_FILE_EXTENSION: &str = "json";

/// Secret store backed by a local keystore directory.
pub struct FileStore {
    keystore_dir: PathBuf,
}

impl FileStore {
    /// Open (or create) the keystore directory.
    pub fn new<P: AsRef<Path>>(keystore_dir: P) -> StoreResult<Self> {
        let keystore_dir = keystore_dir.as_ref().to_path_buf();

        if !keystore_dir.exists() {
            fs::create_dir_all(&keystore_dir)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&keystore_dir, fs::Permissions::from_mode(0o700))?;
            }
        }

        info!(dir = %keystore_dir.display(), "opened keystore directory");
        Ok(Self { keystore_dir })
    }

    fn key_path(&self, pub_key: &str) -> PathBuf {
        self.keystore_dir
            .join(format!("{pub_key}.{KEY_FILE_EXTENSION}"))
    }

    /// Write `contents` to `path` atomically: a temp file in the same
    /// directory is renamed over the target.
    fn write_atomic(&self, path: &Path, contents: &str) -> StoreResult<()> {
        let tmp_path = self
            .keystore_dir
            .join(format!(".tmp-{}", Uuid::new_v4()));

        fs::write(&tmp_path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn retrieve_key(&self, pub_key: &str, password: &str) -> StoreResult<KeyPair> {
        let path = self.key_path(pub_key);
        if !path.exists() {
            return Err(StoreError::KeyNotFound(pub_key.to_string()));
        }

        let keystore = EncryptedKeystore::load(&path).map_err(keystore_error)?;
        let secret = keystore.decrypt(password).map_err(keystore_error)?;

        let key_pair = KeyPair::from_secret_bytes(secret.expose_secret())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        check_identity(&key_pair, pub_key)?;
        Ok(key_pair)
    }

    async fn store_key(&self, key_pair: &KeyPair, password: &str) -> StoreResult<String> {
        let pub_key = key_pair.pub_key_hex();

        let keystore = EncryptedKeystore::encrypt(
            &key_pair.private_key().to_be_bytes(),
            password,
            &pub_key,
        )
        .map_err(keystore_error)?;

        let json = serde_json::to_string_pretty(&keystore)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.write_atomic(&self.key_path(&pub_key), &json)?;

        Ok(pub_key)
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let mut pub_keys = Vec::new();

        for entry in fs::read_dir(&self.keystore_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().is_some_and(|ext| ext == KEY_FILE_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    pub_keys.push(stem.to_string());
                }
            }
        }

        pub_keys.sort();
        debug!(count = pub_keys.len(), "listed key files");
        Ok(pub_keys)
    }

    async fn delete_key(&self, pub_key: &str) -> StoreResult<()> {
        let path = self.key_path(pub_key);
        if !path.exists() {
            return Err(StoreError::KeyNotFound(pub_key.to_string()));
        }
        fs::remove_file(&path)?;
        Ok(())
    }
}

fn keystore_error(err: KeystoreError) -> StoreError {
    match err {
        KeystoreError::ChecksumMismatch => StoreError::InvalidPassword,
        KeystoreError::IoError(e) => StoreError::Io(e),
        other => StoreError::Corrupt(other.to_string()),
    }
}
