//! # Message Status
//!
//! The five-valued status tracked independently on each side of a message.
//!
//! ## Transition Graph (per side)
//!
//! ```text
//! Undeclared ──declare/confirm──▶ Declared ──progress──▶ Progressed
//!     │                             │   │
//!     └──progress (inbox, proof)────┼───┘──────────────▶ Progressed
//!                                   │
//!                  declareRevocation│        progressRevocation
//!                                   ▼               │
//!                           DeclaredRevocation ─────┴──▶ Revoked
//! ```
//!
//! A Declared inbox may also move straight to Revoked once the remote outbox
//! is proven to be DeclaredRevocation, and a DeclaredRevocation outbox moves
//! to Progressed if the remote inbox is proven Progressed. Progressed and
//! Revoked are terminal.
//!
//! ## Storage Encoding
//!
//! The discriminants are the values written into ledger storage. They must
//! never be renumbered.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a message on one side of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum MessageStatus {
    /// Nothing is known about the message on this side.
    #[default]
    Undeclared = 0,
    /// The message has been declared and awaits progression.
    Declared = 1,
    /// The message has been progressed (terminal).
    Progressed = 2,
    /// The sender asked to revoke the message.
    DeclaredRevocation = 3,
    /// The message has been revoked (terminal).
    Revoked = 4,
}

impl MessageStatus {
    /// All statuses in discriminant order.
    pub const ALL: [MessageStatus; 5] = [
        Self::Undeclared,
        Self::Declared,
        Self::Progressed,
        Self::DeclaredRevocation,
        Self::Revoked,
    ];

    /// The storage encoding of this status.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a stored status value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Undeclared),
            1 => Some(Self::Declared),
            2 => Some(Self::Progressed),
            3 => Some(Self::DeclaredRevocation),
            4 => Some(Self::Revoked),
            _ => None,
        }
    }

    /// Returns the canonical status name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undeclared => "UNDECLARED",
            Self::Declared => "DECLARED",
            Self::Progressed => "PROGRESSED",
            Self::DeclaredRevocation => "DECLARED_REVOCATION",
            Self::Revoked => "REVOKED",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Progressed | Self::Revoked)
    }

    /// Whether `self → next` is an edge of the forward-only transition graph.
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Undeclared, Declared)
                | (Undeclared, Progressed)
                | (Declared, Progressed)
                | (Declared, DeclaredRevocation)
                | (Declared, Revoked)
                | (DeclaredRevocation, Revoked)
                | (DeclaredRevocation, Progressed)
        )
    }
}

impl TryFrom<u8> for MessageStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(value)
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which of the two per-message status fields an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Status on the originating ledger.
    Outbox,
    /// Status on the receiving ledger.
    Inbox,
}

impl Side {
    /// The field a proof about the other ledger must address.
    ///
    /// A local outbox is progressed against the remote inbox and vice versa.
    pub fn counterpart(self) -> Side {
        match self {
            Self::Outbox => Self::Inbox,
            Self::Inbox => Self::Outbox,
        }
    }

    /// Slot offset of this side's mapping inside the message box.
    pub fn slot_offset(self) -> u64 {
        match self {
            Self::Outbox => 0,
            Self::Inbox => 1,
        }
    }

    /// Returns the side name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Outbox => "outbox",
            Self::Inbox => "inbox",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
