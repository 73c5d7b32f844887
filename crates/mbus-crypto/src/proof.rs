//! # Storage Proofs
//!
//! [`StorageProof`] is the ordered list of trie node encodings, root first,
//! that authenticates one storage value. On the wire it travels as a single
//! RLP list whose items are the raw node encodings (`rlpParentNodes`).

use alloy_primitives::{Bytes, B256};
use alloy_rlp::Header;
use mbus_core::ProofError;
use serde::{Deserialize, Serialize};

use crate::mpt;
use crate::node::next_item;

/// Ordered trie nodes from the root down to the proven value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageProof {
    nodes: Vec<Bytes>,
}

impl StorageProof {
    /// Wrap an ordered node list.
    pub fn new(nodes: Vec<Bytes>) -> Self {
        Self { nodes }
    }

    /// Decode the serialized form. Empty input yields an empty proof.
    pub fn from_rlp(encoded: &[u8]) -> Result<Self, ProofError> {
        if encoded.is_empty() {
            return Ok(Self::default());
        }
        let mut buf = encoded;
        let outer =
            next_item(&mut buf).map_err(|e| ProofError::MalformedEncoding(e.to_string()))?;
        if !buf.is_empty() {
            return Err(ProofError::MalformedEncoding("trailing bytes".into()));
        }
        if !outer.list {
            return Err(ProofError::MalformedEncoding("expected an rlp list".into()));
        }

        let mut nodes = Vec::new();
        let mut payload = outer.payload;
        while !payload.is_empty() {
            let item =
                next_item(&mut payload).map_err(|e| ProofError::MalformedEncoding(e.to_string()))?;
            nodes.push(Bytes::copy_from_slice(item.raw));
        }
        Ok(Self { nodes })
    }

    /// Encode as a single RLP list of the raw node encodings.
    pub fn to_rlp(&self) -> Vec<u8> {
        let payload_length: usize = self.nodes.iter().map(|n| n.len()).sum();
        let mut out = Vec::with_capacity(payload_length + 9);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        for node in &self.nodes {
            out.extend_from_slice(node);
        }
        out
    }

    /// The node encodings, root first.
    pub fn nodes(&self) -> &[Bytes] {
        &self.nodes
    }

    /// Whether the proof holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Verify the proof for `key` under `root` and return the stored value.
    pub fn verify(&self, root: B256, key: &[u8]) -> Result<Vec<u8>, ProofError> {
        mpt::verify_proof(&self.nodes, root, key)
    }
}

impl From<Vec<Bytes>> for StorageProof {
    fn from(nodes: Vec<Bytes>) -> Self {
        Self::new(nodes)
    }
}
