use crate::ledger::{Address, LedgerError};
use cipher_essentials::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid decimal encoding: {0:?}")]
    InvalidDecimal(String),

    #[error("Value does not fit the field: {0}")]
    OutOfRange(String),

    #[error("Point is not on the curve")]
    InvalidPoint,

    #[error("Unknown card encoding")]
    UnknownCard,

    #[error("Duplicate card in deck")]
    DuplicateCard,

    #[error("Deck holds {0} cards, expected {1}")]
    DeckSize(usize, usize),

    #[error("Player {0} is not seated at this table")]
    NotSeated(Address),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unreadable configuration: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
