//! # Merkle-Patricia Proof Verification
//!
//! Walks an ordered list of trie nodes from a trusted root down the nibble
//! path of a key and returns the value stored there.
//!
//! ## Algorithm
//!
//! The walk starts with the trusted root as the expected reference. At each
//! step the expected reference is either a hash, in which case the next proof
//! node is taken and must hash to it, or an inline child, in which case the
//! embedded bytes are decoded directly without consuming a proof node.
//!
//! - Branch: the next nibble selects a child. If the path is exhausted the
//!   branch value is the answer.
//! - Extension: its path must be a prefix of the remaining path.
//! - Leaf: its path must equal the remaining path. Its value is the answer.
//!
//! Every supplied node must be consumed. Leftover nodes are rejected.

use alloy_primitives::{keccak256, Bytes, B256};
use mbus_core::ProofError;

use crate::node::{to_nibbles, NodeRef, TrieNode};

enum Expected<'a> {
    Hash(B256),
    Inline(&'a [u8]),
}

/// Verify `nodes` against `root` for the key `path` and return the value.
///
/// `path` is the raw key; it is expanded into nibbles here. For storage
/// tries it is the keccak256 of the storage slot.
pub fn verify_proof(nodes: &[Bytes], root: B256, path: &[u8]) -> Result<Vec<u8>, ProofError> {
    if nodes.is_empty() {
        return Err(ProofError::EmptyProof);
    }

    let key = to_nibbles(path);
    let mut offset = 0usize;
    let mut consumed = 0usize;
    let mut expected = Expected::Hash(root);
    let mut depth = 0usize;

    let value: &[u8] = loop {
        let encoded: &[u8] = match expected {
            Expected::Hash(hash) => {
                let node = nodes
                    .get(consumed)
                    .ok_or(ProofError::MissingNode { depth })?;
                consumed += 1;
                if keccak256(node) != hash {
                    return Err(ProofError::HashMismatch { depth });
                }
                &node[..]
            }
            Expected::Inline(raw) => raw,
        };

        let node = TrieNode::decode(encoded).map_err(|e| ProofError::MalformedNode {
            depth,
            reason: e.to_string(),
        })?;

        let remaining = &key[offset..];
        let child = match node {
            TrieNode::Branch { children, value } => {
                let Some((&nibble, _)) = remaining.split_first() else {
                    break value;
                };
                offset += 1;
                children[usize::from(nibble)]
            }
            TrieNode::Extension { path, child } => {
                if !remaining.starts_with(&path) {
                    return Err(ProofError::PathMismatch { depth });
                }
                offset += path.len();
                child
            }
            TrieNode::Leaf { path, value } => {
                if remaining != path.as_slice() {
                    return Err(ProofError::PathMismatch { depth });
                }
                break value;
            }
        };

        expected = match child {
            NodeRef::Empty => return Err(ProofError::MissingChild { depth }),
            NodeRef::Hash(hash) => Expected::Hash(hash),
            NodeRef::Inline(raw) => Expected::Inline(raw),
        };
        depth += 1;
    };

    if consumed < nodes.len() {
        return Err(ProofError::TrailingNodes {
            unused: nodes.len() - consumed,
        });
    }
    Ok(value.to_vec())
}

/// Verify that `path` maps to exactly `expected` under `root`.
pub fn verify_value(
    nodes: &[Bytes],
    root: B256,
    path: &[u8],
    expected: &[u8],
) -> Result<(), ProofError> {
    let value = verify_proof(nodes, root, path)?;
    if value != expected {
        return Err(ProofError::ValueMismatch);
    }
    Ok(())
}
