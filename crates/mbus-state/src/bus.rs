//! # Message Bus
//!
//! The proof-authenticated message state machine of one ledger.
//!
//! A bus owns the [`MessageRegistry`] of its ledger. Outgoing messages live in
//! the outbox mapping, incoming ones in the inbox mapping. Claims about the
//! counterpart ledger are authenticated against a root read from a
//! [`StateRootProvider`] with a [`StorageProof`] of the counterpart's
//! mapping slot.
//!
//! ## Check Order
//!
//! Proof-driven operations reject, in this order: a zero message hash, an
//! empty proof, an unanchored height, a claim the operation does not accept,
//! a local status the operation cannot move, and finally a proof that does
//! not authenticate the claim. All checks run before the single registry
//! write, so a failed call leaves the bus untouched.
//!
//! Both ledgers are assumed to place their message box at the same storage
//! position.

use mbus_core::{
    Message, MessageBusError, MessageHash, MessageStatus, Side, B256,
};
use mbus_crypto::{
    encode_status, message_slot, message_trie_key, verify_value, StorageProof,
    DEFAULT_MESSAGE_BOX_POSITION,
};
use serde::{Deserialize, Serialize};

use crate::anchor::StateRootProvider;
use crate::registry::MessageRegistry;

/// Where the message box sits in ledger storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBoxLayout {
    /// Storage position of the outbox mapping. The inbox mapping follows it.
    pub position: u64,
}

impl Default for MessageBoxLayout {
    fn default() -> Self {
        Self {
            position: DEFAULT_MESSAGE_BOX_POSITION,
        }
    }
}

impl MessageBoxLayout {
    /// Layout with the message box at `position`.
    pub fn at(position: u64) -> Self {
        Self { position }
    }

    /// Storage slot of the `side` status of `hash`.
    pub fn slot(&self, side: Side, hash: &MessageHash) -> B256 {
        message_slot(self.position, side, hash)
    }

    /// Trie key of the `side` status of `hash`.
    pub fn trie_key(&self, side: Side, hash: &MessageHash) -> B256 {
        message_trie_key(self.position, side, hash)
    }
}

/// Message state machine of one ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBus {
    layout: MessageBoxLayout,
    registry: MessageRegistry,
}

impl MessageBus {
    /// Create an empty bus with the default layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bus with a custom layout.
    pub fn with_layout(layout: MessageBoxLayout) -> Self {
        Self {
            layout,
            registry: MessageRegistry::new(),
        }
    }

    /// The storage layout.
    pub fn layout(&self) -> MessageBoxLayout {
        self.layout
    }

    /// The underlying registry.
    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Status of `hash` on `side`.
    pub fn status(&self, hash: &MessageHash, side: Side) -> MessageStatus {
        self.registry.status(hash, side)
    }

    /// Stored body of `hash`.
    pub fn message(&self, hash: &MessageHash) -> Option<&Message> {
        self.registry.message(hash)
    }

    // ── Outbox ──────────────────────────────────────────────────────

    /// Record a new outgoing message; outbox → Declared.
    pub fn declare_message(&mut self, message: Message) -> Result<MessageHash, MessageBusError> {
        let hash = message.hash();
        let actual = self.status(&hash, Side::Outbox);
        if actual != MessageStatus::Undeclared {
            return Err(MessageBusError::MessageAlreadyDeclared { actual });
        }
        self.registry
            .advance(hash, Side::Outbox, MessageStatus::Declared, Some(message))?;
        Ok(hash)
    }

    /// Progress a Declared outbox with the unlock secret.
    pub fn progress_outbox(
        &mut self,
        hash: MessageHash,
        secret: &B256,
    ) -> Result<(), MessageBusError> {
        self.progress_with_secret(Side::Outbox, hash, secret)
    }

    /// Progress the outbox once the counterpart inbox is proven to be
    /// `claim` (Declared or Progressed). A DeclaredRevocation outbox only
    /// accepts a Progressed inbox.
    pub fn progress_outbox_with_proof(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), MessageBusError> {
        let root = anchored_root(&hash, proof, height, anchor)?;
        if !matches!(claim, MessageStatus::Declared | MessageStatus::Progressed) {
            return Err(MessageBusError::InvalidTargetClaim { claim });
        }
        let actual = self.status(&hash, Side::Outbox);
        match actual {
            MessageStatus::Declared => {}
            MessageStatus::DeclaredRevocation => {
                if claim != MessageStatus::Progressed {
                    return Err(MessageBusError::TargetNotProgressed { claim });
                }
            }
            _ => return Err(MessageBusError::SourceNotDeclared { actual }),
        }
        self.verify_remote(root, proof, &hash, Side::Inbox, claim)?;
        self.registry
            .advance(hash, Side::Outbox, MessageStatus::Progressed, None)?;
        Ok(())
    }

    /// Ask for revocation of a Declared outbox; outbox → DeclaredRevocation.
    pub fn declare_revocation_message(&mut self, hash: MessageHash) -> Result<(), MessageBusError> {
        if hash.is_zero() {
            return Err(MessageBusError::MessageHashZero);
        }
        let actual = self.status(&hash, Side::Outbox);
        if actual != MessageStatus::Declared {
            return Err(MessageBusError::NotDeclared { actual });
        }
        self.registry
            .advance(hash, Side::Outbox, MessageStatus::DeclaredRevocation, None)?;
        Ok(())
    }

    /// Revoke the outbox once the counterpart inbox is proven revoked.
    pub fn progress_outbox_revocation(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), MessageBusError> {
        self.revoke_with_proof(Side::Outbox, hash, proof, height, claim, anchor)
    }

    /// Revoke a DeclaredRevocation message with the unlock secret.
    ///
    /// The secret is public afterwards, and the counterpart inbox can then be
    /// progressed with it.
    pub fn progress_revocation_with_secret(
        &mut self,
        side: Side,
        hash: MessageHash,
        secret: &B256,
    ) -> Result<(), MessageBusError> {
        if hash.is_zero() {
            return Err(MessageBusError::MessageHashZero);
        }
        let actual = self.status(&hash, side);
        if actual != MessageStatus::DeclaredRevocation {
            return Err(MessageBusError::NotDeclaredRevocation { actual });
        }
        let message = self
            .registry
            .message(&hash)
            .ok_or(MessageBusError::UnknownMessage)?;
        if !message.unlocks_with(secret) {
            return Err(MessageBusError::InvalidUnlockSecret);
        }
        self.registry
            .advance(hash, side, MessageStatus::Revoked, None)?;
        Ok(())
    }

    // ── Inbox ───────────────────────────────────────────────────────

    /// Record an incoming message whose counterpart outbox is proven
    /// Declared; inbox → Declared.
    pub fn confirm_message(
        &mut self,
        message: Message,
        proof: &StorageProof,
        height: u64,
        anchor: &dyn StateRootProvider,
    ) -> Result<MessageHash, MessageBusError> {
        let hash = message.hash();
        let root = anchored_root(&hash, proof, height, anchor)?;
        let actual = self.status(&hash, Side::Inbox);
        if actual != MessageStatus::Undeclared {
            return Err(MessageBusError::TargetNotUndeclared { actual });
        }
        self.verify_remote(root, proof, &hash, Side::Outbox, MessageStatus::Declared)?;
        self.registry
            .advance(hash, Side::Inbox, MessageStatus::Declared, Some(message))?;
        Ok(hash)
    }

    /// Progress a Declared inbox with the unlock secret.
    pub fn progress_inbox(
        &mut self,
        hash: MessageHash,
        secret: &B256,
    ) -> Result<(), MessageBusError> {
        self.progress_with_secret(Side::Inbox, hash, secret)
    }

    /// Progress the inbox once the counterpart outbox is proven to be
    /// `claim` (Declared or Progressed). The inbox may still be Undeclared.
    pub fn progress_inbox_with_proof(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), MessageBusError> {
        let root = Self::check_inbox_claim(&hash, proof, height, claim, anchor)?;
        let actual = self.status(&hash, Side::Inbox);
        if !matches!(actual, MessageStatus::Undeclared | MessageStatus::Declared) {
            return Err(MessageBusError::TargetNotDeclared { actual });
        }
        self.verify_remote(root, proof, &hash, Side::Outbox, claim)?;
        self.registry
            .advance(hash, Side::Inbox, MessageStatus::Progressed, None)?;
        Ok(())
    }

    /// The checks of [`Self::progress_inbox_with_proof()`] that precede the
    /// local status check. Returns the anchored root.
    ///
    /// Callers that gate on their own view of the inbox use this to keep the
    /// reason order intact.
    pub fn check_inbox_claim(
        hash: &MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<B256, MessageBusError> {
        let root = anchored_root(hash, proof, height, anchor)?;
        if !matches!(claim, MessageStatus::Declared | MessageStatus::Progressed) {
            return Err(MessageBusError::InvalidSourceClaim { claim });
        }
        Ok(root)
    }

    /// Revoke the inbox once the counterpart outbox is proven to be asking
    /// for revocation.
    pub fn confirm_revocation(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), MessageBusError> {
        self.revoke_with_proof(Side::Inbox, hash, proof, height, claim, anchor)
    }

    // ── Storage ─────────────────────────────────────────────────────

    /// Root of this ledger's message box storage.
    pub fn storage_root(&self) -> B256 {
        self.registry.storage_trie(self.layout.position).root()
    }

    /// Proof of the `side` status of `hash` under [`Self::storage_root()`].
    pub fn storage_proof(&self, hash: &MessageHash, side: Side) -> StorageProof {
        let key = self.layout.trie_key(side, hash);
        StorageProof::new(
            self.registry
                .storage_trie(self.layout.position)
                .proof(key.as_slice()),
        )
    }

    // ── Internals ───────────────────────────────────────────────────

    fn progress_with_secret(
        &mut self,
        side: Side,
        hash: MessageHash,
        secret: &B256,
    ) -> Result<(), MessageBusError> {
        if hash.is_zero() {
            return Err(MessageBusError::MessageHashZero);
        }
        let actual = self.status(&hash, side);
        if actual != MessageStatus::Declared {
            return Err(match side {
                Side::Outbox => MessageBusError::NotDeclared { actual },
                Side::Inbox => MessageBusError::TargetNotDeclared { actual },
            });
        }
        let message = self
            .registry
            .message(&hash)
            .ok_or(MessageBusError::UnknownMessage)?;
        if !message.unlocks_with(secret) {
            return Err(MessageBusError::InvalidUnlockSecret);
        }
        self.registry
            .advance(hash, side, MessageStatus::Progressed, None)?;
        Ok(())
    }

    fn revoke_with_proof(
        &mut self,
        side: Side,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), MessageBusError> {
        let root = anchored_root(&hash, proof, height, anchor)?;
        if !matches!(
            claim,
            MessageStatus::DeclaredRevocation | MessageStatus::Revoked
        ) {
            return Err(MessageBusError::InvalidRevocationClaim { claim });
        }
        let actual = self.status(&hash, side);
        if !matches!(
            actual,
            MessageStatus::Declared | MessageStatus::DeclaredRevocation
        ) {
            return Err(MessageBusError::RevocationNotDeclarable { actual });
        }
        self.verify_remote(root, proof, &hash, side.counterpart(), claim)?;
        self.registry
            .advance(hash, side, MessageStatus::Revoked, None)?;
        Ok(())
    }

    fn verify_remote(
        &self,
        root: B256,
        proof: &StorageProof,
        hash: &MessageHash,
        remote_side: Side,
        claim: MessageStatus,
    ) -> Result<(), MessageBusError> {
        let key = self.layout.trie_key(remote_side, hash);
        verify_value(proof.nodes(), root, key.as_slice(), &encode_status(claim))?;
        Ok(())
    }
}

fn anchored_root(
    hash: &MessageHash,
    proof: &StorageProof,
    height: u64,
    anchor: &dyn StateRootProvider,
) -> Result<B256, MessageBusError> {
    if hash.is_zero() {
        return Err(MessageBusError::MessageHashZero);
    }
    if proof.is_empty() {
        return Err(MessageBusError::ProofEmpty);
    }
    match anchor.state_root(height) {
        Some(root) if root != B256::ZERO => Ok(root),
        _ => Err(MessageBusError::RootUnset { height }),
    }
}
