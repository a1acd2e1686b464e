//! cerberus — remote BN254 BLS signer daemon
//!
//! Single-action binary: validate configuration, open the secret store and
//! the metadata database, then serve the signer/key-manager RPC surface
//! (plus optional admin and metrics listeners) until SIGINT/SIGTERM.

mod config;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use cerberus_db::{KeyMetadataRepository, PostgresKeyMetadataRepository};
use cerberus_signer::{
    AdminService, AuthInterceptor, KmsService, Server, ServerConfig, SigningService,
};
use cerberus_store::{
    AwsSecretManagerStore, FileStore, GoogleSecretManagerStore, SecretStore, StorageKind,
};

use config::{AwsAuthenticationMode, Configuration};

/// How long in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Remote BLS Signer
#[derive(Parser)]
#[command(name = "cerberus")]
#[command(version)]
#[command(about = "Remote BLS Signer", long_about = None)]
struct Cli {
    /// Directory where the keystore files are stored
    #[arg(long, env = "KEYSTORE_DIR", default_value = "./data/keystore")]
    keystore_dir: std::path::PathBuf,

    /// Port for the signer + key-manager RPC server
    #[arg(long, env = "GRPC_PORT", default_value_t = 50051)]
    grpc_port: u16,

    /// Port for the admin RPC server
    #[arg(long, env = "ADMIN_PORT", default_value_t = 50052)]
    admin_port: u16,

    /// Port for the metrics server
    #[arg(long, env = "METRICS_PORT", default_value_t = 9091)]
    metrics_port: u16,

    /// Log level - supported levels: debug, info, warn, error
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format - supported formats: text, json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// TLS CA certificate (terminated by the deployment; validated as a pair)
    #[arg(long, env = "TLS_CA_CERT")]
    tls_ca_cert: Option<std::path::PathBuf>,

    /// TLS server key
    #[arg(long, env = "TLS_SERVER_KEY")]
    tls_server_key: Option<std::path::PathBuf>,

    /// Storage type - supported: filesystem, aws-secrets-manager, google-secrets-manager
    #[arg(long, env = "STORAGE_TYPE", default_value = "filesystem")]
    storage_type: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-2")]
    aws_region: String,

    /// AWS profile
    #[arg(long, env = "AWS_PROFILE", default_value = "default")]
    aws_profile: String,

    /// AWS authentication mode - supported: environment, specified
    #[arg(long, env = "AWS_AUTHENTICATION_MODE", default_value = "environment")]
    aws_authentication_mode: String,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", default_value = "")]
    aws_access_key_id: String,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", default_value = "")]
    aws_secret_access_key: String,

    /// Project ID for Google Cloud Platform
    #[arg(long, env = "GCP_PROJECT_ID", default_value = "")]
    gcp_project_id: String,

    /// Postgres connection URL for the key-metadata database
    #[arg(long, env = "POSTGRES_DATABASE_URL", default_value = "")]
    postgres_database_url: String,

    /// Serve the admin RPC surface on the admin port
    #[arg(long, env = "ENABLE_ADMIN")]
    enable_admin: bool,
}

impl Cli {
    fn into_configuration(self) -> anyhow::Result<(Configuration, String, String)> {
        let storage_type = StorageKind::from_str(&self.storage_type)
            .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
        let aws_authentication_mode =
            AwsAuthenticationMode::from_str(&self.aws_authentication_mode)
                .context("invalid configuration")?;

        let configuration = Configuration {
            storage_type,
            keystore_dir: self.keystore_dir,
            aws_region: self.aws_region,
            aws_profile: self.aws_profile,
            aws_authentication_mode,
            aws_access_key_id: self.aws_access_key_id,
            aws_secret_access_key: self.aws_secret_access_key,
            gcp_project_id: self.gcp_project_id,
            postgres_database_url: self.postgres_database_url,
            grpc_port: self.grpc_port,
            admin_port: self.admin_port,
            metrics_port: self.metrics_port,
            enable_admin: self.enable_admin,
            tls_ca_cert: self.tls_ca_cert,
            tls_server_key: self.tls_server_key,
        };

        Ok((configuration, self.log_level, self.log_format))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (configuration, log_level, log_format) = match cli.into_configuration() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    init_tracing(&log_level, &log_format);

    if let Err(e) = run(configuration).await {
        tracing::error!("startup failed: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str, log_format: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match log_format {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

async fn run(configuration: Configuration) -> anyhow::Result<()> {
    configuration
        .validate()
        .context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        storage = %configuration.storage_type,
        "starting cerberus server"
    );

    // Secret store.
    let store = initialize_store(&configuration).await?;

    // Metadata database: pool + embedded migrations.
    let pool = cerberus_db::connect(&configuration.postgres_database_url)
        .await
        .context("failed to connect to database")?;
    cerberus_db::migrate(&pool)
        .await
        .context("failed to migrate database")?;
    let repo: Arc<dyn KeyMetadataRepository> = Arc::new(PostgresKeyMetadataRepository::new(pool));

    // Metrics listener.
    cerberus_metrics::init();
    let metrics_addr: SocketAddr = ([0, 0, 0, 0], configuration.metrics_port).into();
    let _metrics_handle = cerberus_metrics::spawn_metrics_server(metrics_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to start metrics server: {e}"))?;

    // Services and RPC listeners.
    let server_config = ServerConfig {
        rpc_addr: ([0, 0, 0, 0], configuration.grpc_port).into(),
        admin_addr: ([0, 0, 0, 0], configuration.admin_port).into(),
        enable_admin: configuration.enable_admin,
        ..ServerConfig::default()
    };

    let signing = SigningService::new(
        store.clone(),
        AuthInterceptor::new(repo.clone()),
        server_config.auth_required,
    );
    let kms = KmsService::new(store.clone(), repo.clone());
    let admin = AdminService::new(repo);
    let server = Server::start(&server_config, signing, kms, admin)
        .await
        .context("failed to start RPC server")?;

    wait_for_shutdown_signal().await;

    info!("shutdown signal received, draining in-flight requests");
    server.shutdown(SHUTDOWN_GRACE).await;
    info!("cerberus stopped");

    Ok(())
}

async fn initialize_store(configuration: &Configuration) -> anyhow::Result<Arc<dyn SecretStore>> {
    let store: Arc<dyn SecretStore> = match configuration.storage_type {
        StorageKind::Filesystem => Arc::new(
            FileStore::new(&configuration.keystore_dir)
                .context("failed to open keystore directory")?,
        ),
        StorageKind::AwsSecretsManager => match configuration.aws_authentication_mode {
            AwsAuthenticationMode::Environment => {
                info!("using environment credentials for AWS Secrets Manager");
                Arc::new(
                    AwsSecretManagerStore::from_env(
                        &configuration.aws_region,
                        &configuration.aws_profile,
                    )
                    .await,
                )
            }
            AwsAuthenticationMode::Specified => {
                info!("using specified credentials for AWS Secrets Manager");
                Arc::new(
                    AwsSecretManagerStore::with_static_credentials(
                        &configuration.aws_region,
                        &configuration.aws_access_key_id,
                        &configuration.aws_secret_access_key,
                    )
                    .await,
                )
            }
        },
        StorageKind::GoogleSecretsManager => Arc::new(
            GoogleSecretManagerStore::new(&configuration.gcp_project_id)
                .await
                .context("failed to create Google Secret Manager store")?,
        ),
    };

    Ok(store)
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
