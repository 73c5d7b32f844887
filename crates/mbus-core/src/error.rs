//! # Error Types
//!
//! Failures of the message bus and the proof verifier. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Reason Strings
//!
//! The `Display` output of [`MessageBusError`] is part of the external
//! contract: facilitators match on it to decide whether to retry with a
//! different proof, wait for a new anchor, or give up. Do not reword them.
//!
//! ## Kinds
//!
//! Every error reports an [`ErrorKind`]:
//!
//! - `InvalidInput`: a zero hash, an empty proof or a wrong secret.
//! - `PreconditionFailed`: an unanchored root, a claimed status the path
//!   does not accept, or a local status that does not allow the operation.
//! - `ProofVerificationFailed`: the proof does not authenticate the claim.

use crate::status::MessageStatus;
use thiserror::Error;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Arguments rejected before state was consulted.
    InvalidInput,
    /// Current state does not allow the operation.
    PreconditionFailed,
    /// The supplied proof does not authenticate the claim.
    ProofVerificationFailed,
}

impl ErrorKind {
    /// Returns the kind name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::PreconditionFailed => "precondition_failed",
            Self::ProofVerificationFailed => "proof_verification_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Detailed failure of Merkle-Patricia proof verification.
///
/// `depth` counts trie nodes visited from the root, starting at 0.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// No proof nodes were supplied.
    #[error("proof contains no nodes")]
    EmptyProof,

    /// A hash reference was reached but the proof has no more nodes.
    #[error("proof ended before the path was resolved (depth {depth})")]
    MissingNode {
        /// Depth of the missing node.
        depth: usize,
    },

    /// A proof node does not hash to the reference held by its parent.
    #[error("node hash does not match its reference (depth {depth})")]
    HashMismatch {
        /// Depth of the offending node.
        depth: usize,
    },

    /// A node could not be decoded.
    #[error("malformed trie node at depth {depth}: {reason}")]
    MalformedNode {
        /// Depth of the offending node.
        depth: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The path diverges from an extension or leaf.
    #[error("path diverges from the trie (depth {depth})")]
    PathMismatch {
        /// Depth of the diverging node.
        depth: usize,
    },

    /// The path selects an empty branch child.
    #[error("path selects an empty branch child (depth {depth})")]
    MissingChild {
        /// Depth of the branch node.
        depth: usize,
    },

    /// Nodes were left over after the value was found.
    #[error("proof has {unused} unused trailing node(s)")]
    TrailingNodes {
        /// Number of unconsumed nodes.
        unused: usize,
    },

    /// The proven value differs from the expected one.
    #[error("proven value does not match the expected value")]
    ValueMismatch,

    /// The serialized proof is not a single RLP list.
    #[error("malformed serialized proof: {0}")]
    MalformedEncoding(String),
}

/// Failure of a message bus operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageBusError {
    /// The message hash argument is zero.
    #[error("Message hash must not be zero")]
    MessageHashZero,

    /// The serialized proof decodes to no nodes.
    #[error("RLP parent nodes must not be zero")]
    ProofEmpty,

    /// No state root is anchored at the requested height.
    #[error("Storage root must not be zero")]
    RootUnset {
        /// Requested height.
        height: u64,
    },

    /// Local inbox is not in a state that accepts the operation.
    #[error("Message on target must be Declared.")]
    TargetNotDeclared {
        /// Status found.
        actual: MessageStatus,
    },

    /// Inbox already holds a status for this message.
    #[error("Message on target must be Undeclared.")]
    TargetNotUndeclared {
        /// Status found.
        actual: MessageStatus,
    },

    /// A DeclaredRevocation outbox needs the remote inbox to be Progressed.
    #[error("Message on target must be Progressed.")]
    TargetNotProgressed {
        /// Claimed remote status.
        claim: MessageStatus,
    },

    /// The claimed remote outbox status cannot progress an inbox.
    #[error("Message on source must be Declared or Progressed.")]
    InvalidSourceClaim {
        /// Claimed remote status.
        claim: MessageStatus,
    },

    /// The claimed remote inbox status cannot progress an outbox.
    #[error("Message on target must be Declared or Progressed.")]
    InvalidTargetClaim {
        /// Claimed remote status.
        claim: MessageStatus,
    },

    /// Local outbox is neither Declared nor DeclaredRevocation.
    #[error("Status of message on source must be Declared or DeclareRevocation.")]
    SourceNotDeclared {
        /// Status found.
        actual: MessageStatus,
    },

    /// The claimed remote status is not a revocation status.
    #[error("Status of message on source must be Declared or DeclareRevocation.")]
    InvalidRevocationClaim {
        /// Claimed remote status.
        claim: MessageStatus,
    },

    /// Local status is not Declared, so the secret path cannot progress it.
    #[error("Message on source must be Declared.")]
    NotDeclared {
        /// Status found.
        actual: MessageStatus,
    },

    /// The outbox already holds a status for this message.
    #[error("Message on source must be Undeclared.")]
    MessageAlreadyDeclared {
        /// Status found.
        actual: MessageStatus,
    },

    /// Local status cannot move to Revoked.
    #[error("Message status must be Declared or DeclaredRevocation.")]
    RevocationNotDeclarable {
        /// Status found.
        actual: MessageStatus,
    },

    /// Local status is not DeclaredRevocation, so the secret cannot revoke it.
    #[error("Message on source must be DeclaredRevocation.")]
    NotDeclaredRevocation {
        /// Status found.
        actual: MessageStatus,
    },

    /// The secret does not open the hash lock.
    #[error("Invalid unlock secret.")]
    InvalidUnlockSecret,

    /// The message body is not known to this bus.
    #[error("Message is not known to the bus.")]
    UnknownMessage,

    /// The registry refused a transition outside the status graph.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: MessageStatus,
        /// Requested status.
        to: MessageStatus,
    },

    /// The storage proof does not authenticate the claimed status.
    #[error("Merkle proof verification failed.")]
    ProofVerificationFailed(#[source] ProofError),
}

impl MessageBusError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MessageHashZero | Self::ProofEmpty | Self::InvalidUnlockSecret => {
                ErrorKind::InvalidInput
            }
            Self::RootUnset { .. }
            | Self::InvalidSourceClaim { .. }
            | Self::InvalidTargetClaim { .. }
            | Self::InvalidRevocationClaim { .. }
            | Self::TargetNotDeclared { .. }
            | Self::TargetNotUndeclared { .. }
            | Self::TargetNotProgressed { .. }
            | Self::SourceNotDeclared { .. }
            | Self::NotDeclared { .. }
            | Self::MessageAlreadyDeclared { .. }
            | Self::RevocationNotDeclarable { .. }
            | Self::NotDeclaredRevocation { .. }
            | Self::UnknownMessage
            | Self::InvalidTransition { .. } => ErrorKind::PreconditionFailed,
            Self::ProofVerificationFailed(_) => ErrorKind::ProofVerificationFailed,
        }
    }
}

impl From<ProofError> for MessageBusError {
    fn from(err: ProofError) -> Self {
        Self::ProofVerificationFailed(err)
    }
}
