//! Daemon configuration
//!
//! Built from CLI flags (each with an uppercase environment fallback) and
//! validated before anything binds or connects. Validation failures are
//! startup failures: the process exits non-zero.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use cerberus_store::StorageKind;

/// How the AWS backend obtains credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwsAuthenticationMode {
    /// Ambient environment: instance profile, SSO, shared config
    #[default]
    Environment,
    /// Explicit access key id + secret access key from configuration
    Specified,
}

impl fmt::Display for AwsAuthenticationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwsAuthenticationMode::Environment => write!(f, "environment"),
            AwsAuthenticationMode::Specified => write!(f, "specified"),
        }
    }
}

impl FromStr for AwsAuthenticationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "environment" => Ok(AwsAuthenticationMode::Environment),
            "specified" => Ok(AwsAuthenticationMode::Specified),
            other => bail!("unsupported AWS authentication mode: {other}"),
        }
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub storage_type: StorageKind,

    // Filesystem backend
    pub keystore_dir: PathBuf,

    // AWS Secrets Manager backend
    pub aws_region: String,
    pub aws_profile: String,
    pub aws_authentication_mode: AwsAuthenticationMode,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,

    // Google Secret Manager backend
    pub gcp_project_id: String,

    // Metadata database
    pub postgres_database_url: String,

    // Listeners
    pub grpc_port: u16,
    pub admin_port: u16,
    pub metrics_port: u16,
    pub enable_admin: bool,

    // TLS is terminated by the deployment; the pair is validated here so a
    // half-configured setup fails fast.
    pub tls_ca_cert: Option<PathBuf>,
    pub tls_server_key: Option<PathBuf>,
}

impl Configuration {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.storage_type {
            StorageKind::Filesystem => {
                if self.keystore_dir.as_os_str().is_empty() {
                    bail!("keystore directory is required for the filesystem backend");
                }
            }
            StorageKind::AwsSecretsManager => {
                if self.aws_region.is_empty() {
                    bail!("AWS region is required");
                }
                if self.aws_authentication_mode == AwsAuthenticationMode::Specified {
                    if self.aws_access_key_id.is_empty() {
                        bail!("AWS access key ID is required");
                    }
                    if self.aws_secret_access_key.is_empty() {
                        bail!("AWS secret access key is required");
                    }
                }
            }
            StorageKind::GoogleSecretsManager => {
                if self.gcp_project_id.is_empty() {
                    bail!("GCP project ID is required");
                }
            }
        }

        if self.postgres_database_url.is_empty() {
            bail!("postgres database URL is required");
        }

        if self.tls_ca_cert.is_some() != self.tls_server_key.is_some() {
            bail!("TLS CA certificate and TLS server key must be provided together");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Configuration {
        Configuration {
            storage_type: StorageKind::Filesystem,
            keystore_dir: PathBuf::from("./data/keystore"),
            aws_region: "us-east-2".to_string(),
            aws_profile: "default".to_string(),
            aws_authentication_mode: AwsAuthenticationMode::Environment,
            aws_access_key_id: String::new(),
            aws_secret_access_key: String::new(),
            gcp_project_id: String::new(),
            postgres_database_url: "postgres://localhost/cerberus".to_string(),
            grpc_port: 50051,
            admin_port: 50052,
            metrics_port: 9091,
            enable_admin: false,
            tls_ca_cert: None,
            tls_server_key: None,
        }
    }

    #[test]
    fn test_valid_filesystem_config() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_missing_database_url() {
        let mut config = base();
        config.postgres_database_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tls_pair_required_together() {
        let mut config = base();
        config.tls_ca_cert = Some(PathBuf::from("ca.pem"));
        assert!(config.validate().is_err());

        config.tls_server_key = Some(PathBuf::from("key.pem"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aws_specified_requires_credentials() {
        let mut config = base();
        config.storage_type = StorageKind::AwsSecretsManager;
        config.aws_authentication_mode = AwsAuthenticationMode::Specified;
        assert!(config.validate().is_err());

        config.aws_access_key_id = "AKIA123".to_string();
        config.aws_secret_access_key = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gcp_requires_project_id() {
        let mut config = base();
        config.storage_type = StorageKind::GoogleSecretsManager;
        assert!(config.validate().is_err());

        config.gcp_project_id = "my-project".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_aws_auth_mode_from_str() {
        assert_eq!(
            AwsAuthenticationMode::from_str("environment").unwrap(),
            AwsAuthenticationMode::Environment
        );
        assert_eq!(
            AwsAuthenticationMode::from_str("Specified").unwrap(),
            AwsAuthenticationMode::Specified
        );
        assert!(AwsAuthenticationMode::from_str("iam").is_err());
    }
}
