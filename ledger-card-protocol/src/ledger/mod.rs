//! The narrow slice of the ledger the dealing protocol consumes.
//!
//! The ledger itself (signing rules, broadcast, storage, consensus) lives
//! outside this crate; [`Ledger`] and [`Signer`] are the seams it plugs into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod category;
mod memory;
mod signer;

pub use category::{Categories, Category, StepTag};
pub use memory::{InMemoryLedger, Transaction};
pub use signer::KeyedSigner;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A game is identified by the ledger reference of the transaction that
/// created it.
pub type GameId = TransactionId;

/// Failures of the ledger collaborator. All of them are treated as transient:
/// the poll that hit one simply retries on its next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a transaction from `signer` to the ledger.
    async fn publish(
        &self,
        signer: &dyn Signer,
        category: &Category,
        recipients: &[Address],
        payload: Vec<u8>,
    ) -> Result<TransactionId, LedgerError>;

    /// Payload of the most recent transaction `sender` made in `category`.
    async fn query_latest_by_sender(
        &self,
        category: &Category,
        sender: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Senders of the transactions in `category` addressed to `recipient`,
    /// in the order they first appeared.
    async fn query_latest_by_recipient(
        &self,
        category: &Category,
        recipient: &Address,
    ) -> Result<Vec<Address>, LedgerError>;
}

/// Per-player signing capability handed to the ledger write path. The
/// protocol never looks at signatures itself.
pub trait Signer: Send + Sync {
    fn address(&self) -> &Address;

    fn sign_message(&self, message: &[u8]) -> Vec<u8>;
}
