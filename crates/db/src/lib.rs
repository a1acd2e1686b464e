//! Key-metadata persistence for the cerberus signer
//!
//! The durable registry binding a G1 public key to its G2 public key, the
//! hash of the issued API key, the lock flag and timestamps. A metadata row
//! exists iff the corresponding encrypted secret exists in the secret store;
//! the two are created and deleted as a pair by the KMS service.
//!
//! The production implementation is Postgres via sqlx with runtime-checked
//! queries (no live database needed to build). Schema migrations are
//! embedded in the binary and applied once at startup; re-running a clean
//! startup is a no-op.

pub mod error;
pub mod memory;
pub mod model;
pub mod repository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub use error::{DbError, DbResult};
pub use memory::InMemoryKeyMetadataRepository;
pub use model::KeyMetadata;
pub use repository::{KeyMetadataRepository, PostgresKeyMetadataRepository};

/// Open a connection pool against the configured Postgres URL.
pub async fn connect(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the embedded schema migrations. Idempotent.
pub async fn migrate(pool: &PgPool) -> DbResult<()> {
    info!("running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations completed");
    Ok(())
}
