//! RPC server configuration

use std::net::SocketAddr;

/// Listener configuration for the RPC surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Signer + key-manager listener
    pub rpc_addr: SocketAddr,
    /// Admin listener; only bound when `enable_admin` is set
    pub admin_addr: SocketAddr,
    pub enable_admin: bool,
    /// Per-listener connection cap
    pub max_connections: u32,
    /// When false the signer surface skips per-request API-key checks
    /// (deployments gating it at the network layer instead). The key
    /// manager and admin surfaces are never interceptor-protected.
    pub auth_required: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rpc_addr: "0.0.0.0:50051".parse().expect("valid default addr"),
            admin_addr: "0.0.0.0:50052".parse().expect("valid default addr"),
            enable_admin: false,
            max_connections: 1024,
            auth_required: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.rpc_addr.port(), 50051);
        assert_eq!(config.admin_addr.port(), 50052);
        assert!(!config.enable_admin);
        assert!(config.auth_required);
    }
}
