//! AWS Secrets Manager secret store
//!
//! One secret per key, named `cerberus/<pubG1>`, holding the hex-encoded
//! private scalar. At-rest encryption is delegated to Secrets Manager, so
//! the caller-supplied password is not used by this backend. Retrieval
//! always reads the `AWSCURRENT` stage.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use aws_sdk_secretsmanager::Client;
use cerberus_crypto::KeyPair;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::{check_identity, SecretStore};

const STORAGE_PREFIX: &str = "cerberus/";

/// Secret store backed by AWS Secrets Manager.
pub struct AwsSecretManagerStore {
    client: Client,
}

impl AwsSecretManagerStore {
    /// Build a client from the ambient environment (instance profile, SSO,
    /// shared config) for the given region and profile.
    pub async fn from_env(region: &str, profile: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .profile_name(profile)
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }

    /// Build a client from explicitly specified static credentials.
    pub async fn with_static_credentials(
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "cerberus");

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }

    fn secret_name(pub_key: &str) -> String {
        format!("{STORAGE_PREFIX}{pub_key}")
    }
}

#[async_trait]
impl SecretStore for AwsSecretManagerStore {
    async fn retrieve_key(&self, pub_key: &str, _password: &str) -> StoreResult<KeyPair> {
        let result = self
            .client
            .get_secret_value()
            .secret_id(Self::secret_name(pub_key))
            .version_stage("AWSCURRENT")
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    StoreError::KeyNotFound(pub_key.to_string())
                } else {
                    StoreError::StoreUnavailable(service_err.to_string())
                }
            })?;

        let secret_hex = result
            .secret_string()
            .ok_or_else(|| StoreError::Corrupt("secret has no string payload".to_string()))?;

        let key_pair = KeyPair::from_hex_str(secret_hex)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        check_identity(&key_pair, pub_key)?;
        Ok(key_pair)
    }

    async fn store_key(&self, key_pair: &KeyPair, _password: &str) -> StoreResult<String> {
        let pub_key = key_pair.pub_key_hex();
        let secret_hex = hex::encode(key_pair.private_key().to_be_bytes());

        self.client
            .create_secret()
            .name(Self::secret_name(&pub_key))
            .secret_string(secret_hex)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_resource_exists_exception() {
                    StoreError::AlreadyExists(pub_key.clone())
                } else {
                    StoreError::StoreUnavailable(service_err.to_string())
                }
            })?;

        Ok(pub_key)
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let filter = Filter::builder()
                .key(FilterNameStringType::Name)
                .values(STORAGE_PREFIX)
                .build();

            let result = self
                .client
                .list_secrets()
                .filters(filter)
                .set_next_token(next_token.clone())
                .send()
                .await
                .map_err(|e| StoreError::StoreUnavailable(e.into_service_error().to_string()))?;

            for secret in result.secret_list() {
                if let Some(name) = secret.name() {
                    if let Some(pub_key) = name.strip_prefix(STORAGE_PREFIX) {
                        keys.push(pub_key.to_string());
                    }
                }
            }

            match result.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = keys.len(), "listed secrets");
        Ok(keys)
    }

    async fn delete_key(&self, pub_key: &str) -> StoreResult<()> {
        self.client
            .delete_secret()
            .secret_id(Self::secret_name(pub_key))
            .force_delete_without_recovery(true)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    StoreError::KeyNotFound(pub_key.to_string())
                } else {
                    StoreError::StoreUnavailable(service_err.to_string())
                }
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_name_prefix() {
        assert_eq!(
            AwsSecretManagerStore::secret_name("a3111a"),
            "cerberus/a3111a"
        );
    }
}
