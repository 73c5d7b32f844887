//! # Verify Subcommand
//!
//! Checks a storage proof offline: the proof must authenticate the claimed
//! status of a message under the given storage root.
//!
//! Proof files are JSON in either form:
//!
//! ```json
//! { "nodes": ["0xf8...", "0xe2..."] }
//! { "serializedProof": "0xf9..." }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use mbus_core::{Bytes, MessageHash, MessageStatus, ProofError, Side, B256};
use mbus_crypto::{
    encode_status, message_trie_key, verify_value, StorageProof, DEFAULT_MESSAGE_BOX_POSITION,
};
use serde::Deserialize;

use crate::{SideArg, StatusArg};

/// Arguments for the verify subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Proof file.
    pub proof: PathBuf,

    /// Trusted storage root of the proving ledger.
    #[arg(long)]
    pub root: B256,

    /// Message hash.
    #[arg(long)]
    pub message_hash: MessageHash,

    /// Which status mapping the proof covers.
    #[arg(long, value_enum)]
    pub side: SideArg,

    /// Claimed status.
    #[arg(long, value_enum)]
    pub status: StatusArg,

    /// Storage position of the message box.
    #[arg(long, default_value_t = DEFAULT_MESSAGE_BOX_POSITION)]
    pub position: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProofFile {
    Nodes(StorageProof),
    Serialized {
        #[serde(rename = "serializedProof")]
        serialized_proof: Bytes,
    },
}

/// Read a proof file in either supported form.
pub fn load_proof(path: &Path) -> Result<StorageProof> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read proof: {}", path.display()))?;
    let file: ProofFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse proof: {}", path.display()))?;
    match file {
        ProofFile::Nodes(proof) => Ok(proof),
        ProofFile::Serialized { serialized_proof } => StorageProof::from_rlp(&serialized_proof)
            .with_context(|| format!("malformed serialized proof: {}", path.display())),
    }
}

/// Check that `proof` shows `hash` at `status` on `side` under `root`.
pub fn check(
    proof: &StorageProof,
    root: B256,
    hash: &MessageHash,
    side: Side,
    status: MessageStatus,
    position: u64,
) -> Result<(), ProofError> {
    let key = message_trie_key(position, side, hash);
    verify_value(proof.nodes(), root, key.as_slice(), &encode_status(status))
}

/// Execute the verify subcommand. Exits 1 when the proof is rejected.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let proof = load_proof(&args.proof)?;
    let side = Side::from(args.side);
    let status = MessageStatus::from(args.status);

    tracing::debug!(nodes = proof.len(), %side, %status, "verifying proof");
    match check(&proof, args.root, &args.message_hash, side, status, args.position) {
        Ok(()) => {
            println!("  proof valid: {side} of {} is {status}", args.message_hash);
            Ok(0)
        }
        Err(e) => {
            println!("  proof rejected: {e}");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbus_crypto::MemoryTrie;
    use std::io::Write;

    fn hash() -> MessageHash {
        MessageHash(B256::repeat_byte(0x11))
    }

    fn fixture() -> (B256, StorageProof) {
        let mut trie = MemoryTrie::new();
        let key = message_trie_key(7, Side::Outbox, &hash());
        trie.insert(key.as_slice(), &encode_status(MessageStatus::Declared));
        let other = message_trie_key(7, Side::Inbox, &MessageHash(B256::repeat_byte(0x22)));
        trie.insert(other.as_slice(), &encode_status(MessageStatus::Progressed));
        (trie.root(), StorageProof::new(trie.proof(key.as_slice())))
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_check_accepts_claimed_status() {
        let (root, proof) = fixture();
        check(&proof, root, &hash(), Side::Outbox, MessageStatus::Declared, 7).unwrap();
    }

    #[test]
    fn test_check_rejects_other_status() {
        let (root, proof) = fixture();
        assert_eq!(
            check(&proof, root, &hash(), Side::Outbox, MessageStatus::Progressed, 7),
            Err(ProofError::ValueMismatch)
        );
        assert!(check(&proof, root, &hash(), Side::Inbox, MessageStatus::Declared, 7).is_err());
    }

    #[test]
    fn test_load_nodes_form() {
        let (_, proof) = fixture();
        let file = write_temp(&serde_json::to_string(&proof).unwrap());
        assert_eq!(load_proof(file.path()).unwrap(), proof);
    }

    #[test]
    fn test_load_serialized_form() {
        let (_, proof) = fixture();
        let serialized = serde_json::to_string(&Bytes::from(proof.to_rlp())).unwrap();
        let file = write_temp(&format!(r#"{{"serializedProof":{serialized}}}"#));
        assert_eq!(load_proof(file.path()).unwrap(), proof);
    }

    #[test]
    fn test_load_garbage_fails() {
        let file = write_temp(r#"{"proof": 1}"#);
        assert!(load_proof(file.path()).is_err());
    }
}
