//! # Gateway Configuration
//!
//! [`GatewayConfig`] describes one side of a gateway pair. It is loaded from
//! YAML (`.yaml`/`.yml`) or JSON (any other extension) and validated before a
//! [`crate::Gateway`] is built from it.
//!
//! ```yaml
//! address: "0x00000000000000000000000000000000000000a0"
//! remote_gateway: "0x00000000000000000000000000000000000000b0"
//! role: origin
//! bounty: "0x64"
//! message_box_position: 7
//! ```

use std::path::Path;

use mbus_core::{Address, IntentKind, U256};
use mbus_crypto::DEFAULT_MESSAGE_BOX_POSITION;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a gateway configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Config file path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML or JSON for a gateway config.
    #[error("cannot parse config '{path}': {reason}")]
    Parse {
        /// Config file path.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A field has an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which ledger a gateway lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayRole {
    /// The value token's home ledger. Outgoing transfers are stakes.
    Origin,
    /// The ledger holding the minted representation. Outgoing transfers are
    /// redemptions.
    Auxiliary,
}

impl GatewayRole {
    /// Kind of intent this gateway declares.
    pub fn outgoing_kind(&self) -> IntentKind {
        match self {
            Self::Origin => IntentKind::Stake,
            Self::Auxiliary => IntentKind::Redeem,
        }
    }

    /// Kind of intent this gateway confirms.
    pub fn incoming_kind(&self) -> IntentKind {
        match self {
            Self::Origin => IntentKind::Redeem,
            Self::Auxiliary => IntentKind::Stake,
        }
    }

    /// Returns the role name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Auxiliary => "auxiliary",
        }
    }
}

impl std::fmt::Display for GatewayRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn default_message_box_position() -> u64 {
    DEFAULT_MESSAGE_BOX_POSITION
}

/// Configuration of one gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Identity of this gateway. Bound into the intents it declares.
    pub address: Address,
    /// Identity of the counterpart gateway.
    pub remote_gateway: Address,
    /// Which ledger this gateway serves.
    pub role: GatewayRole,
    /// Bounty escrowed per outgoing transfer, in base-ledger units.
    #[serde(default)]
    pub bounty: U256,
    /// Storage position of the message box on both ledgers.
    #[serde(default = "default_message_box_position")]
    pub message_box_position: u64,
    /// Receiver of revocation bounties and penalties.
    #[serde(default)]
    pub burner: Address,
}

impl GatewayConfig {
    /// A config with default bounty, position and burner.
    pub fn new(address: Address, remote_gateway: Address, role: GatewayRole) -> Self {
        Self {
            address,
            remote_gateway,
            role,
            bounty: U256::ZERO,
            message_box_position: DEFAULT_MESSAGE_BOX_POSITION,
            burner: Address::ZERO,
        }
    }

    /// Set the bounty.
    pub fn with_bounty(mut self, bounty: U256) -> Self {
        self.bounty = bounty;
        self
    }

    /// Set the burner.
    pub fn with_burner(mut self, burner: Address) -> Self {
        self.burner = burner;
        self
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: format!("invalid YAML: {e}"),
            })?,
            _ => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: format!("invalid JSON: {e}"),
            })?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address == Address::ZERO {
            return Err(ConfigError::Invalid("address must not be zero".into()));
        }
        if self.remote_gateway == Address::ZERO {
            return Err(ConfigError::Invalid("remote_gateway must not be zero".into()));
        }
        if self.address == self.remote_gateway {
            return Err(ConfigError::Invalid(
                "address and remote_gateway must differ".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let file = write_temp(
            ".yaml",
            "address: \"0x00000000000000000000000000000000000000a0\"\n\
             remote_gateway: \"0x00000000000000000000000000000000000000b0\"\n\
             role: origin\n\
             bounty: \"0x64\"\n",
        );
        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.role, GatewayRole::Origin);
        assert_eq!(config.bounty, U256::from(100u64));
        assert_eq!(config.message_box_position, 7);
        assert_eq!(config.burner, Address::ZERO);
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(
            ".json",
            r#"{
                "address": "0x00000000000000000000000000000000000000a0",
                "remote_gateway": "0x00000000000000000000000000000000000000b0",
                "role": "auxiliary",
                "message_box_position": 3
            }"#,
        );
        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.role, GatewayRole::Auxiliary);
        assert_eq!(config.message_box_position, 3);
        assert_eq!(config.bounty, U256::ZERO);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = write_temp(
            ".json",
            r#"{
                "address": "0x00000000000000000000000000000000000000a0",
                "remote_gateway": "0x00000000000000000000000000000000000000b0",
                "role": "origin",
                "colour": "blue"
            }"#,
        );
        assert!(matches!(
            GatewayConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_same_address_rejected() {
        let file = write_temp(
            ".yml",
            "address: \"0x00000000000000000000000000000000000000a0\"\n\
             remote_gateway: \"0x00000000000000000000000000000000000000a0\"\n\
             role: origin\n",
        );
        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: address and remote_gateway must differ"
        );
    }

    #[test]
    fn test_zero_address_rejected() {
        let config = GatewayConfig::new(
            Address::ZERO,
            Address::repeat_byte(1),
            GatewayRole::Origin,
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = GatewayConfig::load(Path::new("/nonexistent/gateway.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_role_kinds() {
        assert_eq!(GatewayRole::Origin.outgoing_kind(), IntentKind::Stake);
        assert_eq!(GatewayRole::Origin.incoming_kind(), IntentKind::Redeem);
        assert_eq!(GatewayRole::Auxiliary.outgoing_kind(), IntentKind::Redeem);
        assert_eq!(GatewayRole::Auxiliary.incoming_kind(), IntentKind::Stake);
    }
}
