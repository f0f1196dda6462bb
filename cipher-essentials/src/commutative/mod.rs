use crate::error::CryptoError;

use ark_ff::PrimeField;
use ark_std::rand::Rng;

pub mod shared_secret;

/// A cipher over scalars whose layers commute: a message encrypted by several
/// key pairs can have the layers removed in any order, as long as every layer
/// is removed with the same pair of keys that added it.
///
/// Nothing in a ciphertext identifies the keys that produced it. Removing a
/// layer with the wrong keys yields a different, valid looking scalar rather
/// than an error.
pub trait CommutativeCipher<Scalar: PrimeField> {
    type PublicKey;
    type SecretKey;
    type KeyPair;

    fn keygen<R: Rng>(rng: &mut R) -> Result<Self::KeyPair, CryptoError>;

    fn encrypt(
        message: &Scalar,
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Scalar, CryptoError>;

    fn decrypt(
        ciphertext: &Scalar,
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Scalar, CryptoError>;

    /// Encrypt every message under the same pair of keys.
    fn encrypt_all(
        messages: &[Scalar],
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Vec<Scalar>, CryptoError>;

    /// Remove one layer from every ciphertext under the same pair of keys.
    fn decrypt_all(
        ciphertexts: &[Scalar],
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Vec<Scalar>, CryptoError>;
}
