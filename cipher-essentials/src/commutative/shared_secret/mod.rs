use crate::commutative::CommutativeCipher;
use crate::error::CryptoError;

use ark_ec::{AffineRepr, CurveGroup, Group};
use ark_ff::{BigInteger, Field, PrimeField, UniformRand, Zero};
use ark_std::ops::Mul;
use ark_std::{cfg_iter, fmt, marker::PhantomData, rand::Rng};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

mod test;

/// Multiplicative cipher keyed by a Diffie-Hellman shared point.
///
/// Both parties derive `S = counterparty_pk * own_sk`. A message `m` is
/// encrypted as `m * S.x` and decrypted as `c * S.x^-1`, all modulo the order
/// of the curve's scalar field.
#[derive(Clone)]
pub struct SharedSecretCipher<C: CurveGroup> {
    _group: PhantomData<C>,
}

pub type PublicKey<C> = <C as CurveGroup>::Affine;

pub type SecretKey<C> = <C as Group>::ScalarField;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeyPair<C: CurveGroup> {
    pub secret_key: SecretKey<C>,
    pub public_key: PublicKey<C>,
}

impl<C: CurveGroup> fmt::Debug for KeyPair<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl<C: CurveGroup> KeyPair<C> {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        // get a random element from the scalar field
        let secret_key = C::ScalarField::rand(rng);

        // compute secret_key*generator to derive the public key
        let public_key = C::generator().mul(secret_key).into_affine();

        Self {
            secret_key,
            public_key,
        }
    }
}

impl<C: CurveGroup> SharedSecretCipher<C>
where
    C::BaseField: PrimeField,
{
    /// The x coordinate of `counterparty * own`, reduced into the scalar field.
    pub fn shared_factor(
        counterparty: &PublicKey<C>,
        own: &SecretKey<C>,
    ) -> Result<C::ScalarField, CryptoError> {
        let shared = counterparty.mul_bigint(own.into_bigint()).into_affine();
        let (x, _) = shared
            .xy()
            .ok_or(CryptoError::DegenerateSharedSecret("point at infinity"))?;

        let factor = C::ScalarField::from_le_bytes_mod_order(&(*x).into_bigint().to_bytes_le());
        if factor.is_zero() {
            return Err(CryptoError::DegenerateSharedSecret("zero x coordinate"));
        }

        Ok(factor)
    }

    fn inverse_factor(
        counterparty: &PublicKey<C>,
        own: &SecretKey<C>,
    ) -> Result<C::ScalarField, CryptoError> {
        Self::shared_factor(counterparty, own)?
            .inverse()
            .ok_or(CryptoError::DegenerateSharedSecret("factor has no inverse"))
    }
}

impl<C: CurveGroup> CommutativeCipher<C::ScalarField> for SharedSecretCipher<C>
where
    C::BaseField: PrimeField,
{
    type PublicKey = PublicKey<C>;
    type SecretKey = SecretKey<C>;
    type KeyPair = KeyPair<C>;

    fn keygen<R: Rng>(rng: &mut R) -> Result<Self::KeyPair, CryptoError> {
        Ok(KeyPair::generate(rng))
    }

    fn encrypt(
        message: &C::ScalarField,
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<C::ScalarField, CryptoError> {
        Ok(*message * Self::shared_factor(counterparty, own)?)
    }

    fn decrypt(
        ciphertext: &C::ScalarField,
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<C::ScalarField, CryptoError> {
        Ok(*ciphertext * Self::inverse_factor(counterparty, own)?)
    }

    fn encrypt_all(
        messages: &[C::ScalarField],
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Vec<C::ScalarField>, CryptoError> {
        let factor = Self::shared_factor(counterparty, own)?;
        Ok(cfg_iter!(messages).map(|m| *m * factor).collect())
    }

    fn decrypt_all(
        ciphertexts: &[C::ScalarField],
        counterparty: &Self::PublicKey,
        own: &Self::SecretKey,
    ) -> Result<Vec<C::ScalarField>, CryptoError> {
        let factor = Self::inverse_factor(counterparty, own)?;
        Ok(cfg_iter!(ciphertexts).map(|c| *c * factor).collect())
    }
}
