//! Client configuration.

use serde::{Deserialize, Serialize};

use medvault_core::NetworkId;
use medvault_crypto::KdfParams;

use crate::error::{Result, VaultError};

/// Default number of recent heights scanned for registrations.
pub const DEFAULT_DISCOVERY_WINDOW: u64 = 10_000;

/// Configuration for a [`Vault`](crate::Vault).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Execution context the derived key is scoped to.
    pub network_id: NetworkId,
    /// Key derivation parameters.
    pub kdf: KdfParams,
    /// Record discovery.
    pub discovery: DiscoveryConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            network_id: NetworkId::new(1),
            kdf: KdfParams::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl VaultConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| VaultError::Config(e.to_string()))
    }
}

/// Bounds on best-effort record discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How many of the most recent heights to scan.
    pub window: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_DISCOVERY_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medvault_crypto::{CryptoError, DEFAULT_ITERATIONS};

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.network_id, NetworkId::new(1));
        assert_eq!(config.kdf.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(config.discovery.window, DEFAULT_DISCOVERY_WINDOW);
    }

    #[test]
    fn test_from_json() {
        let config = VaultConfig::from_json(
            r#"{"network_id": 11155111, "kdf": {"iterations": 200000}, "discovery": {"window": 500}}"#,
        )
        .unwrap();
        assert_eq!(config.network_id, NetworkId::new(11155111));
        assert_eq!(config.kdf.iterations(), 200_000);
        assert_eq!(config.discovery.window, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = VaultConfig::from_json(r#"{"network_id": 31337}"#).unwrap();
        assert_eq!(config.network_id, NetworkId::new(31337));
        assert_eq!(config.kdf, KdfParams::default());
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_weak_kdf_rejected() {
        let err = VaultConfig::from_json(r#"{"kdf": {"iterations": 1000}}"#).unwrap_err();
        let VaultError::Config(message) = err else {
            panic!("expected config error");
        };
        assert!(message.contains(&CryptoError::WeakKdfParams {
            iterations: 1000,
            minimum: 100_000
        }
        .to_string()));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = VaultConfig {
            network_id: NetworkId::new(5),
            kdf: KdfParams::minimum(),
            discovery: DiscoveryConfig { window: 42 },
        };
        let json = config.to_json().unwrap();
        assert_eq!(VaultConfig::from_json(&json).unwrap(), config);
    }
}
