//! Curve-generic building blocks for dealing cards without a trusted dealer.
//!
//! The [`commutative`] module holds the cipher every shuffle and decryption
//! step is built on; [`utils`] carries the random sampling helpers shared by
//! the protocol crate, its tests and its demo.

pub mod commutative;
pub mod error;
pub mod utils;

pub use error::CryptoError;
