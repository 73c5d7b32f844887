#![deny(missing_docs)]

//! # mbus-cli — Message Bus Facilitator Tooling
//!
//! Offline helpers for facilitators relaying messages between ledgers.
//!
//! ## Subcommands
//!
//! - `hash` — intent hash, message hash and hash lock
//! - `storage-key` — outbox/inbox slot and trie key of a message
//! - `verify` — check a storage proof against a root
//! - `config` — load and validate a gateway config
//!
//! Handlers parse arguments and delegate to the library crates. Each
//! returns the process exit code.
//!
//! ```bash
//! mbus hash --amount 1000 --beneficiary 0x11.. --gateway 0x22.. \
//!     --sender 0x33.. --nonce 1 --gas-price 2 --gas-limit 50 --secret 0x5e..
//! mbus storage-key 0xfa5c..60e3 --side inbox
//! mbus verify proof.json --root 0x3564..fc2b --message-hash 0x11.. \
//!     --side inbox --status progressed
//! ```

pub mod config;
pub mod hash;
pub mod storage;
pub mod verify;

use clap::ValueEnum;
use mbus_core::{IntentKind, MessageStatus, Side};

/// Message box side, as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    /// Outgoing message box.
    Outbox,
    /// Incoming message box.
    Inbox,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Outbox => Side::Outbox,
            SideArg::Inbox => Side::Inbox,
        }
    }
}

/// Message status, as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Never declared on that side.
    Undeclared,
    /// Declared and waiting to progress.
    Declared,
    /// Completed.
    Progressed,
    /// Revocation asked for by the sender.
    DeclaredRevocation,
    /// Revoked.
    Revoked,
}

impl From<StatusArg> for MessageStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Undeclared => MessageStatus::Undeclared,
            StatusArg::Declared => MessageStatus::Declared,
            StatusArg::Progressed => MessageStatus::Progressed,
            StatusArg::DeclaredRevocation => MessageStatus::DeclaredRevocation,
            StatusArg::Revoked => MessageStatus::Revoked,
        }
    }
}

/// Intent kind, as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Stake on the origin ledger.
    Stake,
    /// Redeem on the auxiliary ledger.
    Redeem,
}

impl From<KindArg> for IntentKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Stake => IntentKind::Stake,
            KindArg::Redeem => IntentKind::Redeem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_arg_covers_every_status() {
        let mapped: Vec<MessageStatus> = StatusArg::value_variants()
            .iter()
            .map(|v| MessageStatus::from(*v))
            .collect();
        assert_eq!(mapped, MessageStatus::ALL.to_vec());
    }

    #[test]
    fn test_status_arg_names() {
        assert_eq!(
            StatusArg::from_str("declared-revocation", false).unwrap(),
            StatusArg::DeclaredRevocation
        );
    }
}
