//! RPC server lifecycle
//!
//! One jsonrpsee listener for the signer + key-manager surface and, when
//! enabled, a second one for admin on its own port. Binding failures are
//! startup errors. Shutdown stops accepting new requests, gives in-flight
//! calls a grace period, then force-closes.

use std::net::SocketAddr;
use std::time::Duration;

use jsonrpsee::server::{ServerBuilder, ServerHandle};
use tracing::{info, warn};

use crate::api::{self, RpcContext};
use crate::auth::BearerLayer;
use crate::config::ServerConfig;
use crate::error::{SignerError, SignerResult};
use crate::services::admin::AdminService;
use crate::services::kms::KmsService;
use crate::services::signing::SigningService;

/// Running RPC server(s).
pub struct Server {
    rpc_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    rpc_handle: ServerHandle,
    admin_handle: Option<ServerHandle>,
}

impl Server {
    /// Bind the listeners and start serving.
    pub async fn start(
        config: &ServerConfig,
        signing: SigningService,
        kms: KmsService,
        admin: AdminService,
    ) -> SignerResult<Self> {
        let http_middleware = tower::ServiceBuilder::new().layer(BearerLayer);

        let rpc_server = ServerBuilder::default()
            .max_connections(config.max_connections)
            .set_http_middleware(http_middleware)
            .build(config.rpc_addr)
            .await
            .map_err(|e| bind_error(config.rpc_addr, e))?;
        let rpc_addr = rpc_server
            .local_addr()
            .map_err(|e| SignerError::Internal(e.to_string()))?;

        let rpc_handle = rpc_server.start(api::rpc_module(RpcContext { signing, kms }));
        info!(addr = %rpc_addr, "RPC server started (signer + key manager)");

        let (admin_addr, admin_handle) = if config.enable_admin {
            let admin_server = ServerBuilder::default()
                .max_connections(config.max_connections)
                .build(config.admin_addr)
                .await
                .map_err(|e| bind_error(config.admin_addr, e))?;
            let addr = admin_server
                .local_addr()
                .map_err(|e| SignerError::Internal(e.to_string()))?;

            let handle = admin_server.start(api::admin_rpc_module(admin));
            info!(addr = %addr, "admin server started");
            (Some(addr), Some(handle))
        } else {
            (None, None)
        };

        Ok(Self {
            rpc_addr,
            admin_addr,
            rpc_handle,
            admin_handle,
        })
    }

    /// The bound signer/key-manager address (useful with port 0).
    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// The bound admin address, if the admin surface is enabled.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Stop accepting new requests and wait up to `grace` for in-flight
    /// calls to finish; anything still running afterwards is dropped.
    pub async fn shutdown(self, grace: Duration) {
        let mut waits = Vec::new();

        if self.rpc_handle.stop().is_ok() {
            waits.push(self.rpc_handle.stopped());
        }
        if let Some(handle) = self.admin_handle {
            if handle.stop().is_ok() {
                waits.push(handle.stopped());
            }
        }

        let drain = async {
            for wait in waits {
                wait.await;
            }
        };

        match tokio::time::timeout(grace, drain).await {
            Ok(()) => info!("all RPC servers stopped"),
            Err(_) => warn!("shutdown grace period elapsed, forcing server stop"),
        }
    }
}

fn bind_error(addr: SocketAddr, e: std::io::Error) -> SignerError {
    SignerError::Internal(format!(
        "failed to bind RPC server to {addr}; port {} may already be in use ({e})",
        addr.port()
    ))
}
