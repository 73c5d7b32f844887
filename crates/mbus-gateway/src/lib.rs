//! # mbus-gateway — Transfer Orchestration
//!
//! Gateways move value between an origin ledger and an auxiliary ledger on
//! top of the message bus. Staking on the origin locks value and mints its
//! representation on the auxiliary ledger; redeeming burns on the auxiliary
//! ledger and releases on the origin.
//!
//! - [`Gateway`]: the outgoing and incoming transfer operations.
//! - [`ValueLedger`] / [`TokenLedger`]: escrow or mint/burn custody.
//! - [`RewardSplit`]: the facilitator reward taken out of the amount.
//! - [`GatewayConfig`]: identity, role, bounty and storage layout.

pub mod config;
pub mod gateway;
pub mod ledger;
pub mod reward;
pub mod transfer;

pub use config::{ConfigError, GatewayConfig, GatewayRole};
pub use gateway::{Gateway, GatewayError, REVOCATION_PENALTY_PERCENT};
pub use ledger::{Custody, LedgerError, TokenLedger, ValueLedger};
pub use reward::RewardSplit;
pub use transfer::{Bounty, IncomingIntent, PendingTransfer, TransferRequest};
