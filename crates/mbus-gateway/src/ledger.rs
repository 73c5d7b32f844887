//! # Value Ledgers
//!
//! The minimal token surface a gateway needs: lock value from an account
//! into gateway custody, release value from custody to an account, and read
//! balances.
//!
//! [`TokenLedger`] is an in-memory implementation with two custody models:
//!
//! - [`Custody::Escrow`]: locked value sits in a vault and releases are paid
//!   from it. Used for the origin value token and for bounty escrow.
//! - [`Custody::MintBurn`]: locking burns, releasing mints. Used for the
//!   auxiliary ledger's representation of the origin token.

use std::collections::BTreeMap;

use mbus_core::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from ledger movements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The account holds less than the amount to lock.
    #[error("insufficient balance for {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Debited account.
        account: Address,
        /// Amount requested.
        needed: U256,
        /// Amount held.
        available: U256,
    },

    /// The escrow vault holds less than the amount to release.
    #[error("insufficient custody: needed {needed}, available {available}")]
    InsufficientCustody {
        /// Amount requested.
        needed: U256,
        /// Amount held in custody.
        available: U256,
    },

    /// A balance or the supply would exceed `U256::MAX`.
    #[error("balance overflow")]
    Overflow,
}

/// Lock/release/balance surface of a token.
pub trait ValueLedger {
    /// Move `amount` from `from` into gateway custody.
    fn lock(&mut self, from: Address, amount: U256) -> Result<(), LedgerError>;

    /// Move `amount` from gateway custody to `to`.
    fn release(&mut self, to: Address, amount: U256) -> Result<(), LedgerError>;

    /// Current balance of `account`.
    fn balance_of(&self, account: &Address) -> U256;
}

/// How a [`TokenLedger`] holds locked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Custody {
    /// Locked value is held in a vault.
    Escrow,
    /// Locked value is burned and released value is minted.
    MintBurn,
}

/// In-memory token with gateway custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    custody: Custody,
    balances: BTreeMap<Address, U256>,
    vault: U256,
    total_supply: U256,
}

impl TokenLedger {
    /// Create an empty ledger.
    pub fn new(custody: Custody) -> Self {
        Self {
            custody,
            balances: BTreeMap::new(),
            vault: U256::ZERO,
            total_supply: U256::ZERO,
        }
    }

    /// An escrow ledger.
    pub fn escrow() -> Self {
        Self::new(Custody::Escrow)
    }

    /// A mint/burn ledger.
    pub fn mint_burn() -> Self {
        Self::new(Custody::MintBurn)
    }

    /// The custody model.
    pub fn custody(&self) -> Custody {
        self.custody
    }

    /// Issue `amount` to `account` outside any transfer.
    pub fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.add(account, amount)
    }

    /// Value currently held in the vault (always zero for mint/burn).
    pub fn vault(&self) -> U256 {
        self.vault
    }

    /// Total issued supply, including vault holdings.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn add(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account).or_default();
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}

impl ValueLedger for TokenLedger {
    fn lock(&mut self, from: Address, amount: U256) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(&from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        match self.custody {
            Custody::Escrow => {
                self.vault = self.vault.checked_add(amount).ok_or(LedgerError::Overflow)?;
            }
            Custody::MintBurn => {
                self.total_supply -= amount;
            }
        }
        self.balances.insert(from, available - amount);
        Ok(())
    }

    fn release(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        match self.custody {
            Custody::Escrow => {
                if self.vault < amount {
                    return Err(LedgerError::InsufficientCustody {
                        needed: amount,
                        available: self.vault,
                    });
                }
                self.add(to, amount)?;
                self.vault -= amount;
            }
            Custody::MintBurn => {
                self.total_supply = self
                    .total_supply
                    .checked_add(amount)
                    .ok_or(LedgerError::Overflow)?;
                self.add(to, amount)?;
            }
        }
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }
}
