//! # Gateway
//!
//! Transfer orchestration on one ledger. A gateway owns the [`MessageBus`] of
//! its ledger, a value ledger, a base ledger for bounties, and the per-message
//! bookkeeping of in-flight transfers.
//!
//! ## Lifecycle
//!
//! Outgoing (stake on the origin, redeem on the auxiliary ledger):
//!
//! 1. `initiate_transfer`: lock value and bounty, declare the message.
//! 2. `progress_transfer` / `progress_transfer_with_proof`: outbox →
//!    Progressed, bounty paid to the caller.
//! 3. Or `revert_transfer` then `progress_revert_transfer` (or
//!    `progress_revert_transfer_with_secret`): the sender pays a penalty, the
//!    outbox is revoked, the value is returned and the bounty and penalty go
//!    to the burner.
//!
//! Incoming:
//!
//! 1. `confirm_transfer_intent`: prove the counterpart outbox is Declared and
//!    lock the receiving bounty from the confirming facilitator.
//! 2. `finalize_transfer` / `finalize_transfer_with_proof`: inbox →
//!    Progressed, reward and receiving bounty to the caller, principal to the
//!    beneficiary.
//! 3. Or `confirm_revert_transfer_intent`: inbox → Revoked, receiving bounty
//!    back to its payer.
//!
//! ## Atomicity
//!
//! Every operation runs against a scratch copy of the gateway state and is
//! committed only if it returns `Ok`. A failure in any step, including a
//! ledger movement after the message status changed, leaves the gateway as
//! it was.
//!
//! The scratch copy is a full clone of the state, and the storage root and
//! proofs rebuild the message box trie on each call. Both cost O(n) in the
//! number of registered messages.

use std::collections::BTreeMap;

use mbus_core::{
    Address, ErrorKind, MessageBusError, MessageHash, MessageStatus, Side, B256, U256,
};
use mbus_crypto::StorageProof;
use mbus_state::{MessageBoxLayout, MessageBus, StateRootProvider};
use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};
use crate::ledger::{LedgerError, ValueLedger};
use crate::reward::RewardSplit;
use crate::transfer::{Bounty, IncomingIntent, PendingTransfer, TransferRequest};

/// Penalty a sender escrows to revert a transfer, as a percentage of the
/// bounty.
pub const REVOCATION_PENALTY_PERCENT: u64 = 150;

/// Errors from gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A message bus precondition or proof check failed.
    #[error(transparent)]
    Bus(#[from] MessageBusError),

    /// A ledger movement failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The transfer amount is zero.
    #[error("amount must not be zero")]
    ZeroAmount,

    /// The beneficiary is the zero address.
    #[error("beneficiary address must not be zero")]
    ZeroBeneficiary,

    /// The sender is the zero address.
    #[error("sender address must not be zero")]
    ZeroSender,

    /// The hash lock is zero.
    #[error("hash lock must not be zero")]
    ZeroHashLock,

    /// The nonce is not the sender's next nonce.
    #[error("invalid nonce for {sender}: expected {expected}, got {actual}")]
    InvalidNonce {
        /// Sender the nonce belongs to.
        sender: Address,
        /// Next acceptable nonce.
        expected: U256,
        /// Nonce supplied.
        actual: U256,
    },

    /// No outgoing transfer is recorded for the message.
    #[error("no outgoing transfer is pending for message {0}")]
    UnknownTransfer(MessageHash),

    /// Someone other than the sender tried to revert.
    #[error("only the sender may revert a transfer, not {caller}")]
    NotSender {
        /// The rejected caller.
        caller: Address,
    },
}

impl GatewayError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Bus(err) => err.kind(),
            Self::ZeroAmount
            | Self::ZeroBeneficiary
            | Self::ZeroSender
            | Self::ZeroHashLock
            | Self::InvalidNonce { .. }
            | Self::NotSender { .. } => ErrorKind::InvalidInput,
            Self::Ledger(_) | Self::UnknownTransfer(_) => ErrorKind::PreconditionFailed,
        }
    }
}

#[derive(Debug, Clone)]
struct GatewayState<V, B> {
    bus: MessageBus,
    value: V,
    base: B,
    outgoing: BTreeMap<MessageHash, PendingTransfer>,
    incoming: BTreeMap<MessageHash, PendingTransfer>,
    bounties: BTreeMap<MessageHash, Bounty>,
    incoming_bounties: BTreeMap<MessageHash, Bounty>,
    penalties: BTreeMap<MessageHash, U256>,
    outbox_nonces: BTreeMap<Address, U256>,
    inbox_nonces: BTreeMap<Address, U256>,
}

/// Transfer orchestrator of one ledger.
#[derive(Debug, Clone)]
pub struct Gateway<V, B> {
    config: GatewayConfig,
    state: GatewayState<V, B>,
}

impl<V, B> Gateway<V, B>
where
    V: ValueLedger + Clone,
    B: ValueLedger + Clone,
{
    /// Build a gateway over the given value and base ledgers.
    pub fn new(config: GatewayConfig, value: V, base: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = MessageBoxLayout::at(config.message_box_position);
        Ok(Self {
            config,
            state: GatewayState {
                bus: MessageBus::with_layout(layout),
                value,
                base,
                outgoing: BTreeMap::new(),
                incoming: BTreeMap::new(),
                bounties: BTreeMap::new(),
                incoming_bounties: BTreeMap::new(),
                penalties: BTreeMap::new(),
                outbox_nonces: BTreeMap::new(),
                inbox_nonces: BTreeMap::new(),
            },
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The message bus of this ledger.
    pub fn bus(&self) -> &MessageBus {
        &self.state.bus
    }

    /// The value ledger.
    pub fn value_ledger(&self) -> &V {
        &self.state.value
    }

    /// Mutable access to the value ledger, for funding accounts.
    pub fn value_ledger_mut(&mut self) -> &mut V {
        &mut self.state.value
    }

    /// The base (bounty) ledger.
    pub fn base_ledger(&self) -> &B {
        &self.state.base
    }

    /// Mutable access to the base ledger, for funding accounts.
    pub fn base_ledger_mut(&mut self) -> &mut B {
        &mut self.state.base
    }

    /// Pending outgoing transfer of `hash`.
    pub fn outgoing(&self, hash: &MessageHash) -> Option<&PendingTransfer> {
        self.state.outgoing.get(hash)
    }

    /// Pending incoming transfer of `hash`.
    pub fn incoming(&self, hash: &MessageHash) -> Option<&PendingTransfer> {
        self.state.incoming.get(hash)
    }

    /// Escrowed bounty of `hash`.
    pub fn bounty(&self, hash: &MessageHash) -> Option<&Bounty> {
        self.state.bounties.get(hash)
    }

    /// Receiving bounty escrowed at confirmation of `hash`.
    pub fn incoming_bounty(&self, hash: &MessageHash) -> Option<&Bounty> {
        self.state.incoming_bounties.get(hash)
    }

    /// Next nonce `sender` must use for an outgoing transfer.
    pub fn next_outbox_nonce(&self, sender: &Address) -> U256 {
        next_nonce(&self.state.outbox_nonces, sender)
    }

    /// Next nonce an incoming transfer from `sender` must carry.
    pub fn next_inbox_nonce(&self, sender: &Address) -> U256 {
        next_nonce(&self.state.inbox_nonces, sender)
    }

    /// Storage root of this ledger's message box.
    pub fn storage_root(&self) -> B256 {
        self.state.bus.storage_root()
    }

    /// Storage proof of the `side` status of `hash`.
    pub fn storage_proof(&self, hash: &MessageHash, side: Side) -> StorageProof {
        self.state.bus.storage_proof(hash, side)
    }

    // ── Outgoing ────────────────────────────────────────────────────

    /// Lock `request.amount` from the sender and the configured bounty from
    /// `facilitator`, then declare the message.
    pub fn initiate_transfer(
        &mut self,
        request: TransferRequest,
        facilitator: Address,
    ) -> Result<MessageHash, GatewayError> {
        let hash = self.transact("initiate_transfer", |config, state| {
            validate_request(&request)?;
            let expected = next_nonce(&state.outbox_nonces, &request.sender);
            if request.nonce != expected {
                return Err(GatewayError::InvalidNonce {
                    sender: request.sender,
                    expected,
                    actual: request.nonce,
                });
            }

            let message = request.to_message(config.role.outgoing_kind(), config.address);
            let hash = state.bus.declare_message(message)?;
            state.value.lock(request.sender, request.amount)?;
            state.base.lock(facilitator, config.bounty)?;

            state.outgoing.insert(
                hash,
                PendingTransfer {
                    beneficiary: request.beneficiary,
                    amount: request.amount,
                },
            );
            state.bounties.insert(
                hash,
                Bounty {
                    payer: facilitator,
                    amount: config.bounty,
                },
            );
            state.outbox_nonces.insert(request.sender, request.nonce);
            Ok(hash)
        })?;

        tracing::info!(
            message_hash = %hash,
            role = %self.config.role,
            amount = %request.amount,
            nonce = %request.nonce,
            "transfer initiated"
        );
        Ok(hash)
    }

    /// Progress an outgoing transfer with the unlock secret. Returns the
    /// bounty paid to `caller`.
    pub fn progress_transfer(
        &mut self,
        hash: MessageHash,
        secret: &B256,
        caller: Address,
    ) -> Result<U256, GatewayError> {
        let bounty = self.transact("progress_transfer", |config, state| {
            state.bus.progress_outbox(hash, secret)?;
            state.settle_outgoing(hash, caller, config.burner)
        })?;
        tracing::info!(message_hash = %hash, bounty = %bounty, "transfer progressed");
        Ok(bounty)
    }

    /// Progress an outgoing transfer once the counterpart inbox is proven
    /// Declared or Progressed. Returns the bounty paid to `caller`.
    pub fn progress_transfer_with_proof(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        caller: Address,
        anchor: &dyn StateRootProvider,
    ) -> Result<U256, GatewayError> {
        let bounty = self.transact("progress_transfer_with_proof", |config, state| {
            state
                .bus
                .progress_outbox_with_proof(hash, proof, height, claim, anchor)?;
            state.settle_outgoing(hash, caller, config.burner)
        })?;
        tracing::info!(
            message_hash = %hash,
            height,
            bounty = %bounty,
            "transfer progressed with proof"
        );
        Ok(bounty)
    }

    /// Ask for revocation of an outgoing transfer. Only the sender may call
    /// this; it escrows the revocation penalty from the sender and returns
    /// its amount.
    pub fn revert_transfer(
        &mut self,
        hash: MessageHash,
        caller: Address,
    ) -> Result<U256, GatewayError> {
        let penalty = self.transact("revert_transfer", |_, state| {
            if hash.is_zero() {
                return Err(MessageBusError::MessageHashZero.into());
            }
            if !state.outgoing.contains_key(&hash) {
                return Err(GatewayError::UnknownTransfer(hash));
            }
            let sender = state.sender_of(&hash)?;
            if caller != sender {
                return Err(GatewayError::NotSender { caller });
            }

            state.bus.declare_revocation_message(hash)?;
            let bounty = state
                .bounties
                .get(&hash)
                .map(|b| b.amount)
                .unwrap_or_default();
            let penalty =
                bounty.saturating_mul(U256::from(REVOCATION_PENALTY_PERCENT)) / U256::from(100u64);
            state.base.lock(caller, penalty)?;
            state.penalties.insert(hash, penalty);
            Ok(penalty)
        })?;
        tracing::info!(message_hash = %hash, penalty = %penalty, "transfer revert declared");
        Ok(penalty)
    }

    /// Complete a revert once the counterpart inbox is proven revoked.
    /// Returns the amount given back to the sender.
    pub fn progress_revert_transfer(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        anchor: &dyn StateRootProvider,
    ) -> Result<U256, GatewayError> {
        let refunded = self.transact("progress_revert_transfer", |config, state| {
            state
                .bus
                .progress_outbox_revocation(hash, proof, height, claim, anchor)?;
            state.settle_revert(hash, config.burner)
        })?;
        tracing::info!(message_hash = %hash, refunded = %refunded, "transfer reverted");
        Ok(refunded)
    }

    /// Complete a revert with the unlock secret, without a proof from the
    /// counterpart ledger. Returns the amount given back to the sender.
    pub fn progress_revert_transfer_with_secret(
        &mut self,
        hash: MessageHash,
        secret: &B256,
    ) -> Result<U256, GatewayError> {
        let refunded = self.transact("progress_revert_transfer_with_secret", |config, state| {
            state
                .bus
                .progress_revocation_with_secret(Side::Outbox, hash, secret)?;
            state.settle_revert(hash, config.burner)
        })?;
        tracing::info!(message_hash = %hash, refunded = %refunded, "transfer reverted with secret");
        Ok(refunded)
    }

    // ── Incoming ────────────────────────────────────────────────────

    /// Record an incoming transfer whose counterpart outbox is proven
    /// Declared at `height`, and lock the configured bounty from
    /// `facilitator`. The bounty goes to whoever finalizes the transfer.
    pub fn confirm_transfer_intent(
        &mut self,
        intent: IncomingIntent,
        height: u64,
        proof: &StorageProof,
        facilitator: Address,
        anchor: &dyn StateRootProvider,
    ) -> Result<MessageHash, GatewayError> {
        let hash = self.transact("confirm_transfer_intent", |config, state| {
            validate_request(&intent)?;
            let expected = next_nonce(&state.inbox_nonces, &intent.sender);
            if intent.nonce != expected {
                return Err(GatewayError::InvalidNonce {
                    sender: intent.sender,
                    expected,
                    actual: intent.nonce,
                });
            }

            let message = intent.to_message(config.role.incoming_kind(), config.remote_gateway);
            let hash = state.bus.confirm_message(message, proof, height, anchor)?;
            state.base.lock(facilitator, config.bounty)?;
            state.incoming.insert(
                hash,
                PendingTransfer {
                    beneficiary: intent.beneficiary,
                    amount: intent.amount,
                },
            );
            state.incoming_bounties.insert(
                hash,
                Bounty {
                    payer: facilitator,
                    amount: config.bounty,
                },
            );
            state.inbox_nonces.insert(intent.sender, intent.nonce);
            Ok(hash)
        })?;
        tracing::info!(message_hash = %hash, height, "transfer intent confirmed");
        Ok(hash)
    }

    /// Finalize an incoming transfer with the unlock secret.
    pub fn finalize_transfer(
        &mut self,
        hash: MessageHash,
        secret: &B256,
        caller: Address,
    ) -> Result<RewardSplit, GatewayError> {
        let split = self.transact("finalize_transfer", |_, state| {
            if hash.is_zero() {
                return Err(MessageBusError::MessageHashZero.into());
            }
            let pending = state.pending_incoming(&hash)?;
            state.bus.progress_inbox(hash, secret)?;
            state.pay_out(hash, pending, caller)
        })?;
        log_finalized(&hash, &split);
        Ok(split)
    }

    /// Finalize an incoming transfer once the counterpart outbox is proven
    /// Declared or Progressed.
    pub fn finalize_transfer_with_proof(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        claim: MessageStatus,
        caller: Address,
        anchor: &dyn StateRootProvider,
    ) -> Result<RewardSplit, GatewayError> {
        let split = self.transact("finalize_transfer_with_proof", |_, state| {
            MessageBus::check_inbox_claim(&hash, proof, height, claim, anchor)?;
            let pending = state.pending_incoming(&hash)?;
            state
                .bus
                .progress_inbox_with_proof(hash, proof, height, claim, anchor)?;
            state.pay_out(hash, pending, caller)
        })?;
        log_finalized(&hash, &split);
        Ok(split)
    }

    /// Revoke an incoming transfer once the counterpart outbox is proven to
    /// be DeclaredRevocation.
    pub fn confirm_revert_transfer_intent(
        &mut self,
        hash: MessageHash,
        proof: &StorageProof,
        height: u64,
        anchor: &dyn StateRootProvider,
    ) -> Result<(), GatewayError> {
        self.transact("confirm_revert_transfer_intent", |_, state| {
            state.bus.confirm_revocation(
                hash,
                proof,
                height,
                MessageStatus::DeclaredRevocation,
                anchor,
            )?;
            state.incoming.remove(&hash);
            if let Some(bounty) = state.incoming_bounties.remove(&hash) {
                state.base.release(bounty.payer, bounty.amount)?;
            }
            Ok(())
        })?;
        tracing::info!(message_hash = %hash, height, "transfer intent revoked");
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    fn transact<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&GatewayConfig, &mut GatewayState<V, B>) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut scratch = self.state.clone();
        match op(&self.config, &mut scratch) {
            Ok(value) => {
                self.state = scratch;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    operation,
                    kind = %err.kind(),
                    error = %err,
                    "gateway operation rejected"
                );
                Err(err)
            }
        }
    }
}

impl<V, B> GatewayState<V, B>
where
    V: ValueLedger,
    B: ValueLedger,
{
    fn sender_of(&self, hash: &MessageHash) -> Result<Address, GatewayError> {
        self.bus
            .message(hash)
            .map(|m| m.sender)
            .ok_or(GatewayError::Bus(MessageBusError::UnknownMessage))
    }

    fn pending_incoming(&self, hash: &MessageHash) -> Result<PendingTransfer, GatewayError> {
        self.incoming.get(hash).cloned().ok_or_else(|| {
            MessageBusError::TargetNotDeclared {
                actual: self.bus.status(hash, Side::Inbox),
            }
            .into()
        })
    }

    fn settle_outgoing(
        &mut self,
        hash: MessageHash,
        caller: Address,
        burner: Address,
    ) -> Result<U256, GatewayError> {
        self.outgoing
            .remove(&hash)
            .ok_or(GatewayError::UnknownTransfer(hash))?;
        let bounty = self
            .bounties
            .remove(&hash)
            .map(|b| b.amount)
            .unwrap_or_default();
        self.base.release(caller, bounty)?;
        if let Some(penalty) = self.penalties.remove(&hash) {
            self.base.release(burner, penalty)?;
        }
        Ok(bounty)
    }

    fn settle_revert(&mut self, hash: MessageHash, burner: Address) -> Result<U256, GatewayError> {
        let pending = self
            .outgoing
            .remove(&hash)
            .ok_or(GatewayError::UnknownTransfer(hash))?;
        let sender = self.sender_of(&hash)?;
        let bounty = self
            .bounties
            .remove(&hash)
            .map(|b| b.amount)
            .unwrap_or_default();
        let penalty = self.penalties.remove(&hash).unwrap_or_default();

        self.value.release(sender, pending.amount)?;
        self.base.release(burner, bounty.saturating_add(penalty))?;
        Ok(pending.amount)
    }

    fn pay_out(
        &mut self,
        hash: MessageHash,
        pending: PendingTransfer,
        caller: Address,
    ) -> Result<RewardSplit, GatewayError> {
        let (gas_price, gas_limit) = self
            .bus
            .message(&hash)
            .map(|m| (m.gas_price, m.gas_limit))
            .ok_or(GatewayError::Bus(MessageBusError::UnknownMessage))?;
        let split = RewardSplit::compute(pending.amount, gas_price, gas_limit);
        self.incoming.remove(&hash);
        self.value.release(caller, split.reward)?;
        self.value.release(pending.beneficiary, split.principal)?;
        if let Some(bounty) = self.incoming_bounties.remove(&hash) {
            self.base.release(caller, bounty.amount)?;
        }
        Ok(split)
    }
}

fn next_nonce(nonces: &BTreeMap<Address, U256>, sender: &Address) -> U256 {
    nonces
        .get(sender)
        .copied()
        .unwrap_or_default()
        .saturating_add(U256::from(1u64))
}

fn validate_request(request: &TransferRequest) -> Result<(), GatewayError> {
    if request.amount.is_zero() {
        return Err(GatewayError::ZeroAmount);
    }
    if request.beneficiary == Address::ZERO {
        return Err(GatewayError::ZeroBeneficiary);
    }
    if request.sender == Address::ZERO {
        return Err(GatewayError::ZeroSender);
    }
    if request.hash_lock == B256::ZERO {
        return Err(GatewayError::ZeroHashLock);
    }
    Ok(())
}

fn log_finalized(hash: &MessageHash, split: &RewardSplit) {
    tracing::info!(
        message_hash = %hash,
        principal = %split.principal,
        reward = %split.reward,
        "transfer finalized"
    );
}
