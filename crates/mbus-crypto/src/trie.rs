//! # In-Memory Merkle-Patricia Trie
//!
//! A small, rebuild-on-demand trie over byte keys. Used by facilitators and
//! simulated ledgers to compute storage roots and to produce the ordered proof
//! nodes that [`crate::mpt::verify_proof`] consumes.
//!
//! The trie keeps its entries in a `BTreeMap` and encodes the node structure
//! from scratch on every `root()` or `proof()` call. Roots match the
//! go-ethereum reference implementation.

use std::collections::BTreeMap;

use alloy_primitives::{b256, keccak256, Bytes, B256};

use crate::node::{to_nibbles, NodeRef, TrieNode};

/// Root of the empty trie, `keccak256(rlp(""))`.
pub const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// Key-value store that can produce Merkle-Patricia roots and proofs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

struct Entry<'a> {
    path: Vec<u8>,
    value: &'a [u8],
}

impl MemoryTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. An empty value removes the key.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        if value.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_vec(), value.to_vec());
        }
    }

    /// Remove a key, returning its previous value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Look up a value.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compute the root hash.
    pub fn root(&self) -> B256 {
        if self.entries.is_empty() {
            return EMPTY_ROOT;
        }
        let entries = self.sorted_entries();
        let mut unused = Vec::new();
        keccak256(encode_subtrie(&entries, 0, None, &mut unused))
    }

    /// Ordered proof nodes (root first) along the path of `key`.
    ///
    /// Inline nodes are embedded in their parents and not listed. The proof
    /// of an absent key covers the path as far as the trie reaches.
    pub fn proof(&self, key: &[u8]) -> Vec<Bytes> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let entries = self.sorted_entries();
        let target = to_nibbles(key);
        let mut proof = Vec::new();
        let root = encode_subtrie(&entries, 0, Some(&target), &mut proof);
        proof.push(Bytes::from(root));
        proof.reverse();
        proof
    }

    fn sorted_entries(&self) -> Vec<Entry<'_>> {
        self.entries
            .iter()
            .map(|(key, value)| Entry {
                path: to_nibbles(key),
                value,
            })
            .collect()
    }
}

/// Encode the subtrie holding `entries` (all sharing `path[..depth]`).
///
/// Hashed nodes on the `target` path are appended to `proof` deepest first.
fn encode_subtrie(
    entries: &[Entry<'_>],
    depth: usize,
    target: Option<&[u8]>,
    proof: &mut Vec<Bytes>,
) -> Vec<u8> {
    if let [only] = entries {
        return TrieNode::Leaf {
            path: only.path[depth..].to_vec(),
            value: only.value,
        }
        .encode();
    }

    let shared = shared_prefix_len(entries, depth);
    if shared > 0 {
        let prefix = &entries[0].path[depth..depth + shared];
        let child_target = target.filter(|t| t.get(depth..depth + shared) == Some(prefix));
        let child = encode_subtrie(entries, depth + shared, child_target, proof);
        return TrieNode::Extension {
            path: prefix.to_vec(),
            child: child_ref(&child, child_target.is_some(), proof),
        }
        .encode();
    }

    let mut rest = entries;
    let mut value: &[u8] = &[];
    if let Some(first) = rest.first() {
        if first.path.len() == depth {
            value = first.value;
            rest = &rest[1..];
        }
    }

    let mut encoded_children = Vec::new();
    while let Some(first) = rest.first() {
        let nibble = first.path[depth];
        let end = rest
            .iter()
            .position(|e| e.path[depth] != nibble)
            .unwrap_or(rest.len());
        let (group, tail) = rest.split_at(end);
        let child_target = target.filter(|t| t.get(depth) == Some(&nibble));
        let encoded = encode_subtrie(group, depth + 1, child_target, proof);
        encoded_children.push((nibble, encoded, child_target.is_some()));
        rest = tail;
    }

    let mut children = [NodeRef::Empty; 16];
    for (nibble, encoded, on_path) in &encoded_children {
        children[usize::from(*nibble)] = child_ref(encoded, *on_path, proof);
    }
    TrieNode::Branch { children, value }.encode()
}

fn child_ref<'c>(encoded: &'c [u8], on_path: bool, proof: &mut Vec<Bytes>) -> NodeRef<'c> {
    if encoded.len() < 32 {
        return NodeRef::Inline(encoded);
    }
    if on_path {
        proof.push(Bytes::copy_from_slice(encoded));
    }
    NodeRef::Hash(keccak256(encoded))
}

fn shared_prefix_len(entries: &[Entry<'_>], depth: usize) -> usize {
    let first = &entries[0].path[depth..];
    entries[1..].iter().fold(first.len(), |len, entry| {
        first
            .iter()
            .zip(&entry.path[depth..])
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpt::verify_proof;
    use std::str::FromStr;

    #[test]
    fn test_empty_root() {
        assert_eq!(MemoryTrie::new().root(), EMPTY_ROOT);
        assert_eq!(EMPTY_ROOT, keccak256([0x80]));
        assert!(MemoryTrie::new().proof(b"any").is_empty());
    }

    #[test]
    fn test_reference_root_dogs() {
        let mut trie = MemoryTrie::new();
        trie.insert(b"doe", b"reindeer");
        trie.insert(b"dog", b"puppy");
        trie.insert(b"dogglesworth", b"cat");
        assert_eq!(
            trie.root(),
            B256::from_str("0x8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3")
                .unwrap()
        );
    }

    #[test]
    fn test_reference_root_with_branch_value() {
        let mut trie = MemoryTrie::new();
        trie.insert(b"do", b"verb");
        trie.insert(b"horse", b"stallion");
        trie.insert(b"doge", b"coin");
        trie.insert(b"dog", b"puppy");
        assert_eq!(
            trie.root(),
            B256::from_str("0x5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84")
                .unwrap()
        );
        let proof = trie.proof(b"do");
        assert_eq!(verify_proof(&proof, trie.root(), b"do").unwrap(), b"verb");
    }

    #[test]
    fn test_single_long_value_root() {
        let mut trie = MemoryTrie::new();
        trie.insert(b"A", &[b'a'; 67]);
        assert_eq!(
            trie.root(),
            B256::from_str("0xa7913e762c0df1b7325b55f75d95dd1af55bb8a5c9e1637143a75c1c3970ce70")
                .unwrap()
        );
    }

    #[test]
    fn test_insert_is_order_independent() {
        let mut a = MemoryTrie::new();
        let mut b = MemoryTrie::new();
        for i in 0..20u8 {
            a.insert(&keccak256([i]).0, &[i + 1]);
        }
        for i in (0..20u8).rev() {
            b.insert(&keccak256([i]).0, &[i + 1]);
        }
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_remove_restores_root() {
        let mut trie = MemoryTrie::new();
        trie.insert(b"dog", b"puppy");
        let before = trie.root();
        trie.insert(b"doge", b"coin");
        assert_ne!(trie.root(), before);
        assert_eq!(trie.remove(b"doge"), Some(b"coin".to_vec()));
        assert_eq!(trie.root(), before);
    }

    #[test]
    fn test_empty_value_deletes() {
        let mut trie = MemoryTrie::new();
        trie.insert(b"dog", b"puppy");
        trie.insert(b"dog", b"");
        assert!(trie.is_empty());
        assert_eq!(trie.get(b"dog"), None);
    }

    #[test]
    fn test_proof_starts_with_root_node() {
        let mut trie = MemoryTrie::new();
        for i in 0..50u8 {
            trie.insert(&keccak256([i]).0, &[i + 1]);
        }
        let key = keccak256([7u8]).0;
        let proof = trie.proof(&key);
        assert_eq!(keccak256(&proof[0]), trie.root());
        assert_eq!(verify_proof(&proof, trie.root(), &key).unwrap(), vec![8]);
    }
}
