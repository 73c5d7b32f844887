//! # Trie Nodes
//!
//! Decoding and encoding of Ethereum Merkle-Patricia trie nodes.
//!
//! ## Node Shapes
//!
//! - **Branch**: an RLP list of 17 items, 16 child references followed by a
//!   value.
//! - **Extension**: an RLP list of 2 items, a hex-prefixed path (flag 0 or 1)
//!   and a child reference.
//! - **Leaf**: an RLP list of 2 items, a hex-prefixed path (flag 2 or 3) and
//!   a value.
//!
//! A child reference is either empty (`0x80`), a 32-byte keccak256 hash of
//! the child encoding, or the child encoding itself when it is shorter than
//! 32 bytes.

use alloy_primitives::B256;
use alloy_rlp::{BufMut, Encodable, Header};
use thiserror::Error;

/// Structural decoding failure of a single node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The bytes are not valid RLP.
    #[error("invalid rlp: {0}")]
    Rlp(alloy_rlp::Error),

    /// The node is an RLP string rather than a list.
    #[error("node is not an rlp list")]
    NotAList,

    /// Bytes remain after the node encoding.
    #[error("trailing bytes after node")]
    TrailingBytes,

    /// The list holds neither 2 nor 17 items.
    #[error("unexpected item count {0}")]
    ItemCount(usize),

    /// A path or value item is an RLP list.
    #[error("expected an rlp string item")]
    UnexpectedList,

    /// The hex-prefix flag nibble is not 0-3, or padding is non-zero.
    #[error("invalid hex-prefix byte {0:#04x}")]
    HexPrefix(u8),

    /// The hex-prefix path is empty.
    #[error("empty hex-prefix path")]
    EmptyPath,

    /// A child reference is neither empty, a 32-byte hash, nor a short node.
    #[error("invalid child reference of {0} bytes")]
    BadReference(usize),
}

/// A reference from a parent node to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    /// No child.
    Empty,
    /// keccak256 of the child encoding.
    Hash(B256),
    /// The child encoding itself (shorter than 32 bytes).
    Inline(&'a [u8]),
}

/// A decoded trie node borrowing from its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieNode<'a> {
    /// Sixteen children plus an optional value (empty if absent).
    Branch {
        /// Child references indexed by nibble.
        children: [NodeRef<'a>; 16],
        /// Value stored at this node.
        value: &'a [u8],
    },
    /// A shared path segment followed by a single child.
    Extension {
        /// Shared nibbles.
        path: Vec<u8>,
        /// The child the extension points to.
        child: NodeRef<'a>,
    },
    /// The remaining path of a key and its value.
    Leaf {
        /// Remaining nibbles of the key.
        path: Vec<u8>,
        /// Stored value.
        value: &'a [u8],
    },
}

/// One RLP item with its header still attached.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RlpItem<'a> {
    pub(crate) list: bool,
    pub(crate) payload: &'a [u8],
    pub(crate) raw: &'a [u8],
}

/// Split the next RLP item off `buf`.
pub(crate) fn next_item<'a>(buf: &mut &'a [u8]) -> Result<RlpItem<'a>, alloy_rlp::Error> {
    let start: &'a [u8] = *buf;
    let mut cursor = start;
    let header = Header::decode(&mut cursor)?;
    if cursor.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (payload, rest) = cursor.split_at(header.payload_length);
    let consumed = start.len() - rest.len();
    *buf = rest;
    Ok(RlpItem {
        list: header.list,
        payload,
        raw: &start[..consumed],
    })
}

impl<'a> TrieNode<'a> {
    /// Decode a node from its exact RLP encoding.
    pub fn decode(encoded: &'a [u8]) -> Result<Self, NodeError> {
        let mut buf = encoded;
        let outer = next_item(&mut buf).map_err(NodeError::Rlp)?;
        if !buf.is_empty() {
            return Err(NodeError::TrailingBytes);
        }
        if !outer.list {
            return Err(NodeError::NotAList);
        }

        let mut items = Vec::with_capacity(17);
        let mut payload = outer.payload;
        while !payload.is_empty() {
            items.push(next_item(&mut payload).map_err(NodeError::Rlp)?);
        }

        match items.len() {
            17 => Self::decode_branch(&items),
            2 => Self::decode_short(items[0], items[1]),
            n => Err(NodeError::ItemCount(n)),
        }
    }

    fn decode_branch(items: &[RlpItem<'a>]) -> Result<Self, NodeError> {
        let mut children = [NodeRef::Empty; 16];
        for (slot, item) in children.iter_mut().zip(items) {
            *slot = decode_ref(*item)?;
        }
        let value = string_payload(items[16])?;
        Ok(Self::Branch { children, value })
    }

    fn decode_short(path_item: RlpItem<'a>, second: RlpItem<'a>) -> Result<Self, NodeError> {
        let (path, is_leaf) = hex_prefix_decode(string_payload(path_item)?)?;
        if is_leaf {
            let value = string_payload(second)?;
            Ok(Self::Leaf { path, value })
        } else {
            if path.is_empty() {
                return Err(NodeError::EmptyPath);
            }
            let child = decode_ref(second)?;
            if child == NodeRef::Empty {
                return Err(NodeError::BadReference(0));
            }
            Ok(Self::Extension { path, child })
        }
    }

    /// Encode this node.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        match self {
            Self::Branch { children, value } => {
                for child in children {
                    encode_ref(child, &mut payload);
                }
                value.encode(&mut payload);
            }
            Self::Extension { path, child } => {
                hex_prefix_encode(path, false).as_slice().encode(&mut payload);
                encode_ref(child, &mut payload);
            }
            Self::Leaf { path, value } => {
                hex_prefix_encode(path, true).as_slice().encode(&mut payload);
                value.encode(&mut payload);
            }
        }
        let mut out = Vec::with_capacity(payload.len() + 3);
        Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&payload);
        out
    }
}

fn string_payload(item: RlpItem<'_>) -> Result<&[u8], NodeError> {
    if item.list {
        return Err(NodeError::UnexpectedList);
    }
    Ok(item.payload)
}

fn decode_ref(item: RlpItem<'_>) -> Result<NodeRef<'_>, NodeError> {
    if item.list {
        if item.raw.len() >= 32 {
            return Err(NodeError::BadReference(item.raw.len()));
        }
        return Ok(NodeRef::Inline(item.raw));
    }
    match item.payload.len() {
        0 => Ok(NodeRef::Empty),
        32 => Ok(NodeRef::Hash(B256::from_slice(item.payload))),
        n => Err(NodeError::BadReference(n)),
    }
}

fn encode_ref(child: &NodeRef<'_>, out: &mut dyn BufMut) {
    match child {
        NodeRef::Empty => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        NodeRef::Hash(hash) => hash.as_slice().encode(out),
        NodeRef::Inline(raw) => out.put_slice(raw),
    }
}

// ─── Nibbles ─────────────────────────────────────────────────────────

/// Expand bytes into nibbles, high nibble first.
pub fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

/// Compact (hex-prefix) encoding of a nibble path.
pub fn hex_prefix_encode(path: &[u8], is_leaf: bool) -> Vec<u8> {
    let odd = path.len() % 2 == 1;
    let flag = (if is_leaf { 2 } else { 0 }) + u8::from(odd);
    let mut out = Vec::with_capacity(path.len() / 2 + 1);
    let rest = if odd {
        out.push((flag << 4) | path[0]);
        &path[1..]
    } else {
        out.push(flag << 4);
        path
    };
    for pair in rest.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    out
}

/// Decode a hex-prefix path, returning the nibbles and the leaf flag.
pub fn hex_prefix_decode(encoded: &[u8]) -> Result<(Vec<u8>, bool), NodeError> {
    let (&first, rest) = encoded.split_first().ok_or(NodeError::EmptyPath)?;
    let flag = first >> 4;
    if flag > 3 {
        return Err(NodeError::HexPrefix(first));
    }
    let is_leaf = flag >= 2;
    let odd = flag % 2 == 1;
    let mut path = Vec::with_capacity(rest.len() * 2 + 1);
    if odd {
        path.push(first & 0x0f);
    } else if first & 0x0f != 0 {
        return Err(NodeError::HexPrefix(first));
    }
    path.extend(to_nibbles(rest));
    Ok((path, is_leaf))
}
