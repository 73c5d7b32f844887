//! # Anchored State Roots
//!
//! Trusted `height → root` snapshots of the counterpart ledger's storage.
//!
//! Producing the roots (header relay, light client, committee) happens
//! outside this crate. The bus only reads them through
//! [`StateRootProvider`]. [`AnchoredRoots`] is the in-memory write-once
//! implementation used by gateways and tests.

use std::collections::BTreeMap;

use mbus_core::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from recording an anchored root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// The zero root cannot be anchored.
    #[error("refusing to anchor a zero root at height {height}")]
    ZeroRoot {
        /// Height of the rejected root.
        height: u64,
    },

    /// A different root is already anchored at this height.
    #[error("height {height} is already anchored to {existing}, refusing {proposed}")]
    Conflict {
        /// Height of the rejected root.
        height: u64,
        /// Root already recorded.
        existing: B256,
        /// Root that was proposed.
        proposed: B256,
    },
}

/// Read access to anchored storage roots of the counterpart ledger.
pub trait StateRootProvider {
    /// The root anchored at `height`, if any.
    fn state_root(&self, height: u64) -> Option<B256>;

    /// Highest anchored height.
    fn latest_height(&self) -> Option<u64>;
}

/// Write-once map of anchored roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredRoots {
    roots: BTreeMap<u64, B256>,
}

impl AnchoredRoots {
    /// Create an empty set of anchors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `root` at `height`.
    ///
    /// Returns `Ok(true)` when the root was newly recorded and `Ok(false)`
    /// when the identical root was already present.
    pub fn anchor(&mut self, height: u64, root: B256) -> Result<bool, AnchorError> {
        if root == B256::ZERO {
            return Err(AnchorError::ZeroRoot { height });
        }
        match self.roots.get(&height) {
            Some(existing) if *existing == root => Ok(false),
            Some(existing) => Err(AnchorError::Conflict {
                height,
                existing: *existing,
                proposed: root,
            }),
            None => {
                self.roots.insert(height, root);
                tracing::debug!(height, root = %root, "state root anchored");
                Ok(true)
            }
        }
    }

    /// Number of anchored heights.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether nothing is anchored.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl StateRootProvider for AnchoredRoots {
    fn state_root(&self, height: u64) -> Option<B256> {
        self.roots.get(&height).copied()
    }

    fn latest_height(&self) -> Option<u64> {
        self.roots.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_and_read() {
        let mut roots = AnchoredRoots::new();
        assert_eq!(roots.state_root(1), None);
        assert_eq!(roots.latest_height(), None);

        assert_eq!(roots.anchor(1, B256::repeat_byte(1)), Ok(true));
        assert_eq!(roots.anchor(5, B256::repeat_byte(5)), Ok(true));
        assert_eq!(roots.state_root(1), Some(B256::repeat_byte(1)));
        assert_eq!(roots.latest_height(), Some(5));
        assert_eq!(roots.len(), 2);
    }

    #[test]
    fn test_identical_rewrite_is_noop() {
        let mut roots = AnchoredRoots::new();
        roots.anchor(3, B256::repeat_byte(3)).unwrap();
        assert_eq!(roots.anchor(3, B256::repeat_byte(3)), Ok(false));
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_conflicting_rewrite_rejected() {
        let mut roots = AnchoredRoots::new();
        roots.anchor(3, B256::repeat_byte(3)).unwrap();
        let err = roots.anchor(3, B256::repeat_byte(4)).unwrap_err();
        assert!(matches!(err, AnchorError::Conflict { height: 3, .. }));
        assert_eq!(roots.state_root(3), Some(B256::repeat_byte(3)));
    }

    #[test]
    fn test_zero_root_rejected() {
        let mut roots = AnchoredRoots::new();
        assert_eq!(
            roots.anchor(1, B256::ZERO),
            Err(AnchorError::ZeroRoot { height: 1 })
        );
        assert!(roots.is_empty());
    }
}
