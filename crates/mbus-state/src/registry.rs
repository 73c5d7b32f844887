//! # Message Registry
//!
//! The persistent `{outbox, inbox}` status record of every message known to
//! one ledger, keyed by [`MessageHash`].
//!
//! Records are never deleted. Every write goes through
//! [`MessageRegistry::advance()`], which enforces the forward-only status
//! graph of [`MessageStatus::can_advance_to()`] and leaves the record
//! untouched on rejection.
//!
//! ## Storage Export
//!
//! [`MessageRegistry::storage_trie()`] lays the statuses out the way the
//! ledger's storage holds them, so the resulting root is what an anchor on
//! the counterpart ledger records and what proofs are checked against.

use std::collections::BTreeMap;

use mbus_core::{Message, MessageBusError, MessageHash, MessageStatus, Side};
use mbus_crypto::{encode_status, message_trie_key, MemoryTrie};
use serde::{Deserialize, Serialize};

/// The two status fields of one message plus its body, if known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// The message body. Absent when the inbox was progressed by proof
    /// without a prior confirmation.
    pub message: Option<Message>,
    /// Status on the originating ledger.
    pub outbox: MessageStatus,
    /// Status on the receiving ledger.
    pub inbox: MessageStatus,
}

impl MessageRecord {
    /// Status of one side.
    pub fn status(&self, side: Side) -> MessageStatus {
        match side {
            Side::Outbox => self.outbox,
            Side::Inbox => self.inbox,
        }
    }

    fn status_mut(&mut self, side: Side) -> &mut MessageStatus {
        match side {
            Side::Outbox => &mut self.outbox,
            Side::Inbox => &mut self.inbox,
        }
    }
}

/// All message records of one ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRegistry {
    records: BTreeMap<MessageHash, MessageRecord>,
}

impl MessageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record of `hash`, if any status was ever written.
    pub fn get(&self, hash: &MessageHash) -> Option<&MessageRecord> {
        self.records.get(hash)
    }

    /// Status of `hash` on `side`. Unknown messages are Undeclared.
    pub fn status(&self, hash: &MessageHash, side: Side) -> MessageStatus {
        self.records
            .get(hash)
            .map(|r| r.status(side))
            .unwrap_or_default()
    }

    /// The stored message body.
    pub fn message(&self, hash: &MessageHash) -> Option<&Message> {
        self.records.get(hash).and_then(|r| r.message.as_ref())
    }

    /// Move `side` of `hash` to `to`, storing `message` if the record has no
    /// body yet. Returns the previous status.
    pub fn advance(
        &mut self,
        hash: MessageHash,
        side: Side,
        to: MessageStatus,
        message: Option<Message>,
    ) -> Result<MessageStatus, MessageBusError> {
        let from = self.status(&hash, side);
        if !from.can_advance_to(to) {
            return Err(MessageBusError::InvalidTransition { from, to });
        }

        let record = self.records.entry(hash).or_default();
        *record.status_mut(side) = to;
        if record.message.is_none() {
            record.message = message;
        }

        tracing::debug!(
            message_hash = %hash,
            side = %side,
            from = %from,
            to = %to,
            "message status advanced"
        );
        Ok(from)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no message is known.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&MessageHash, &MessageRecord)> {
        self.records.iter()
    }

    /// Storage trie of both status mappings for a message box at `position`.
    ///
    /// Undeclared entries are absent, as zero-valued slots are in ledger
    /// storage.
    pub fn storage_trie(&self, position: u64) -> MemoryTrie {
        let mut trie = MemoryTrie::new();
        for (hash, record) in &self.records {
            for side in [Side::Outbox, Side::Inbox] {
                let status = record.status(side);
                if status != MessageStatus::Undeclared {
                    let key = message_trie_key(position, side, hash);
                    trie.insert(key.as_slice(), &encode_status(status));
                }
            }
        }
        trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbus_core::{Address, B256, U256};
    use mbus_crypto::EMPTY_ROOT;

    fn message(nonce: u64) -> Message {
        Message {
            intent_hash: B256::repeat_byte(0xaa),
            nonce: U256::from(nonce),
            gas_price: U256::from(1u64),
            gas_limit: U256::from(1u64),
            sender: Address::repeat_byte(0x01),
            hash_lock: B256::repeat_byte(0xbb),
        }
    }

    #[test]
    fn test_unknown_message_is_undeclared() {
        let registry = MessageRegistry::new();
        let hash = message(1).hash();
        assert_eq!(registry.status(&hash, Side::Outbox), MessageStatus::Undeclared);
        assert_eq!(registry.status(&hash, Side::Inbox), MessageStatus::Undeclared);
        assert!(registry.get(&hash).is_none());
    }

    #[test]
    fn test_advance_records_message_and_status() {
        let mut registry = MessageRegistry::new();
        let m = message(1);
        let hash = m.hash();
        let from = registry
            .advance(hash, Side::Outbox, MessageStatus::Declared, Some(m.clone()))
            .unwrap();
        assert_eq!(from, MessageStatus::Undeclared);
        assert_eq!(registry.message(&hash), Some(&m));
        assert_eq!(registry.status(&hash, Side::Outbox), MessageStatus::Declared);
        assert_eq!(registry.status(&hash, Side::Inbox), MessageStatus::Undeclared);
    }

    #[test]
    fn test_sides_are_independent() {
        let mut registry = MessageRegistry::new();
        let hash = message(1).hash();
        registry
            .advance(hash, Side::Inbox, MessageStatus::Progressed, None)
            .unwrap();
        assert_eq!(registry.status(&hash, Side::Outbox), MessageStatus::Undeclared);
        assert!(registry.message(&hash).is_none());
    }

    #[test]
    fn test_terminal_status_rejects_everything() {
        let mut registry = MessageRegistry::new();
        let hash = message(1).hash();
        registry
            .advance(hash, Side::Outbox, MessageStatus::Declared, None)
            .unwrap();
        registry
            .advance(hash, Side::Outbox, MessageStatus::Progressed, None)
            .unwrap();
        for to in MessageStatus::ALL {
            let err = registry.advance(hash, Side::Outbox, to, None).unwrap_err();
            assert_eq!(
                err,
                MessageBusError::InvalidTransition {
                    from: MessageStatus::Progressed,
                    to
                }
            );
        }
        assert_eq!(registry.status(&hash, Side::Outbox), MessageStatus::Progressed);
    }

    #[test]
    fn test_existing_body_is_kept() {
        let mut registry = MessageRegistry::new();
        let m = message(1);
        let hash = m.hash();
        registry
            .advance(hash, Side::Outbox, MessageStatus::Declared, Some(m.clone()))
            .unwrap();
        registry
            .advance(hash, Side::Outbox, MessageStatus::Progressed, Some(message(2)))
            .unwrap();
        assert_eq!(registry.message(&hash), Some(&m));
    }

    #[test]
    fn test_registry_serde_roundtrip() {
        let mut registry = MessageRegistry::new();
        let m = message(3);
        registry
            .advance(m.hash(), Side::Outbox, MessageStatus::Declared, Some(m))
            .unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.contains("\"DECLARED\""));
        let back: MessageRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }

    #[test]
    fn test_storage_trie_skips_undeclared() {
        let mut registry = MessageRegistry::new();
        assert_eq!(registry.storage_trie(7).root(), EMPTY_ROOT);

        let hash = message(1).hash();
        registry
            .advance(hash, Side::Outbox, MessageStatus::Declared, None)
            .unwrap();
        let trie = registry.storage_trie(7);
        assert_eq!(trie.len(), 1);
        let key = message_trie_key(7, Side::Outbox, &hash);
        assert_eq!(trie.get(key.as_slice()), Some(&[0x01][..]));
    }
}
