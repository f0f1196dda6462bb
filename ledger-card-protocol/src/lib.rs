//! Dealing a shuffled, secret deck between mutually distrusting players whose
//! only channel is an append-only ledger.
//!
//! Each step of the deal is a pure planning function in [`coordinator`] that
//! looks at a [`session::GameSession`] plus whatever has been read from the
//! ledger and decides whether the local player must act. [`node::PlayerNode`]
//! is the host that polls the ledger, feeds the planners and publishes their
//! results.

pub mod cards;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod node;
pub mod payload;
pub mod rotation;
pub mod session;

use cipher_essentials::commutative::shared_secret;

// Choose elliptic curve setting
pub type Curve = ark_secp256k1::Projective;
pub type Scalar = ark_secp256k1::Fr;
pub type ECPoint = ark_secp256k1::Affine;

// Instantiate concrete types for the dealing protocol
pub type Cipher = shared_secret::SharedSecretCipher<Curve>;
pub type KeyPair = shared_secret::KeyPair<Curve>;

pub use cards::{Card, Deck};
pub use config::ProtocolConfig;
pub use error::ProtocolError;
pub use ledger::{Address, GameId, Ledger, Signer};
pub use node::PlayerNode;
pub use session::{GameSession, Phase};
