//! # Config Subcommand
//!
//! Loads and validates a gateway config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mbus_gateway::GatewayConfig;

/// Arguments for the config subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Gateway config file (`.yaml`, `.yml` or JSON).
    pub path: PathBuf,
}

/// Execute the config subcommand.
pub fn run_config(args: &ConfigArgs) -> Result<u8> {
    let config = GatewayConfig::load(&args.path)
        .with_context(|| format!("invalid gateway config: {}", args.path.display()))?;
    println!("  role:                 {}", config.role);
    println!("  address:              {}", config.address);
    println!("  remote_gateway:       {}", config.remote_gateway);
    println!("  bounty:               {}", config.bounty);
    println!("  message_box_position: {}", config.message_box_position);
    println!("  burner:               {}", config.burner);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_valid_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(
            b"address: \"0x00000000000000000000000000000000000000a0\"\n\
              remote_gateway: \"0x00000000000000000000000000000000000000b0\"\n\
              role: auxiliary\n",
        )
        .unwrap();
        let code = run_config(&ConfigArgs {
            path: file.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"address": "0x00000000000000000000000000000000000000a0"}"#)
            .unwrap();
        let err = run_config(&ConfigArgs {
            path: file.path().to_path_buf(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("invalid gateway config"));
    }
}
