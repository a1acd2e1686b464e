//! Google Secret Manager secret store
//!
//! One secret per key, id `cerberus<pubG1>`, labeled `project=cerberus` so
//! `list` can filter a shared project down to this deployment's keys. The
//! payload is the raw private scalar bytes. Storing is create-secret plus
//! add-version; retrieval accesses `versions/latest`.
//!
//! The backend speaks the Secret Manager REST API directly, authenticating
//! with application-default credentials.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cerberus_crypto::KeyPair;
use gcp_auth::TokenProvider;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::{check_identity, SecretStore};

const STORAGE_PREFIX: &str = "cerberus";
const PROJECT_LABEL: &str = "project";
const API_BASE: &str = "https://secretmanager.googleapis.com/v1";
const CLOUD_SCOPE: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Secret store backed by Google Secret Manager.
pub struct GoogleSecretManagerStore {
    client: reqwest::Client,
    token_provider: Arc<dyn TokenProvider>,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSecretsResponse {
    #[serde(default)]
    secrets: Vec<SecretResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretResource {
    /// Full resource name: projects/<id>/secrets/cerberus<pubkey>
    name: String,
}

impl GoogleSecretManagerStore {
    /// Build a client using application-default credentials.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        let token_provider = gcp_auth::provider()
            .await
            .map_err(|e| StoreError::StoreUnavailable(format!("GCP auth: {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            token_provider,
            project_id: project_id.to_string(),
        })
    }

    fn secret_id(pub_key: &str) -> String {
        format!("{STORAGE_PREFIX}{pub_key}")
    }

    fn secret_url(&self, pub_key: &str) -> String {
        format!(
            "{API_BASE}/projects/{}/secrets/{}",
            self.project_id,
            Self::secret_id(pub_key)
        )
    }

    async fn bearer_token(&self) -> StoreResult<String> {
        let token = self
            .token_provider
            .token(CLOUD_SCOPE)
            .await
            .map_err(|e| StoreError::StoreUnavailable(format!("GCP auth: {e}")))?;
        Ok(token.as_str().to_string())
    }
}

#[async_trait]
impl SecretStore for GoogleSecretManagerStore {
    async fn retrieve_key(&self, pub_key: &str, _password: &str) -> StoreResult<KeyPair> {
        let token = self.bearer_token().await?;
        let url = format!("{}/versions/latest:access", self.secret_url(pub_key));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(StoreError::KeyNotFound(pub_key.to_string())),
            status => {
                return Err(StoreError::StoreUnavailable(format!(
                    "access secret version failed: {status}"
                )))
            }
        }

        let body: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let secret_bytes = BASE64
            .decode(body.payload.data)
            .map_err(|e| StoreError::Corrupt(format!("invalid payload base64: {e}")))?;

        let key_pair = KeyPair::from_hex_str(&hex::encode(secret_bytes))
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        check_identity(&key_pair, pub_key)?;
        Ok(key_pair)
    }

    async fn store_key(&self, key_pair: &KeyPair, _password: &str) -> StoreResult<String> {
        let pub_key = key_pair.pub_key_hex();
        let token = self.bearer_token().await?;

        // Create the secret shell with the deployment label.
        let create_url = format!(
            "{API_BASE}/projects/{}/secrets?secretId={}",
            self.project_id,
            Self::secret_id(&pub_key)
        );
        let create_body = json!({
            "replication": { "automatic": {} },
            "labels": { PROJECT_LABEL: STORAGE_PREFIX },
        });

        let response = self
            .client
            .post(&create_url)
            .bearer_auth(&token)
            .json(&create_body)
            .send()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::CONFLICT => return Err(StoreError::AlreadyExists(pub_key)),
            status => {
                return Err(StoreError::StoreUnavailable(format!(
                    "create secret failed: {status}"
                )))
            }
        }

        // The added version carries the actual key material.
        let version_url = format!("{}:addVersion", self.secret_url(&pub_key));
        let version_body = json!({
            "payload": { "data": BASE64.encode(key_pair.private_key().to_be_bytes()) },
        });

        let response = self
            .client
            .post(&version_url)
            .bearer_auth(&token)
            .json(&version_body)
            .send()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::StoreUnavailable(format!(
                "add secret version failed: {}",
                response.status()
            )));
        }

        debug!(pub_key = %pub_key, "stored key in secret manager");
        Ok(pub_key)
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let token = self.bearer_token().await?;
        let filter = format!("labels.{PROJECT_LABEL}={STORAGE_PREFIX}");

        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{API_BASE}/projects/{}/secrets", self.project_id))
                .bearer_auth(&token)
                .query(&[("filter", filter.as_str())]);
            if let Some(tok) = &page_token {
                request = request.query(&[("pageToken", tok.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;
            if !response.status().is_success() {
                return Err(StoreError::StoreUnavailable(format!(
                    "list secrets failed: {}",
                    response.status()
                )));
            }

            let body: ListSecretsResponse = response
                .json()
                .await
                .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

            for secret in body.secrets {
                if let Some(pub_key) = extract_pub_key(&secret.name) {
                    keys.push(pub_key);
                }
            }

            match body.next_page_token {
                Some(tok) => page_token = Some(tok),
                None => break,
            }
        }

        debug!(count = keys.len(), "listed secrets");
        Ok(keys)
    }

    async fn delete_key(&self, pub_key: &str) -> StoreResult<()> {
        let token = self.bearer_token().await?;

        let response = self
            .client
            .delete(self.secret_url(pub_key))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::KeyNotFound(pub_key.to_string())),
            status => Err(StoreError::StoreUnavailable(format!(
                "delete secret failed: {status}"
            ))),
        }
    }
}

/// Extract the public key from a secret resource name of the form
/// `projects/<id>/secrets/cerberus<pubkey>`.
fn extract_pub_key(resource: &str) -> Option<String> {
    let id = resource.rsplit('/').next()?;
    id.strip_prefix(STORAGE_PREFIX).map(|s| s.to_string())
}
