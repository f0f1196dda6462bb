//! Wire format of the transactions the protocol publishes.
//!
//! Payloads are JSON objects whose numbers are base-10 strings, so that any
//! other implementation reading the same ledger can decode them:
//!
//! ```json
//! { "publicKey": { "x": "5506...", "y": "3267..." } }
//! { "deck": ["1093...", "7741...", ...] }
//! ```

use crate::cards::Deck;
use crate::error::ProtocolError;
use crate::{ECPoint, Scalar};

use ark_ec::AffineRepr;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

pub fn encode_field<F: PrimeField>(value: &F) -> String {
    let value: BigUint = (*value).into();
    value.to_str_radix(10)
}

/// Parses a canonical base-10 field element; values at or above the modulus
/// are rejected rather than reduced.
pub fn decode_field<F: PrimeField>(text: &str) -> Result<F, ProtocolError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidDecimal(text.to_string()));
    }
    let value = BigUint::parse_bytes(text.as_bytes(), 10)
        .ok_or_else(|| ProtocolError::InvalidDecimal(text.to_string()))?;
    let modulus: BigUint = F::MODULUS.into();
    if value >= modulus {
        return Err(ProtocolError::OutOfRange(text.to_string()));
    }
    Ok(F::from(value))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPayload {
    pub x: String,
    pub y: String,
}

impl PointPayload {
    pub fn encode(point: &ECPoint) -> Result<Self, ProtocolError> {
        let (x, y) = point.xy().ok_or(ProtocolError::InvalidPoint)?;
        Ok(Self {
            x: encode_field(x),
            y: encode_field(y),
        })
    }

    pub fn decode(&self) -> Result<ECPoint, ProtocolError> {
        let point = ECPoint::new_unchecked(decode_field(&self.x)?, decode_field(&self.y)?);
        if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(ProtocolError::InvalidPoint);
        }
        Ok(point)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyPayload {
    pub public_key: PointPayload,
}

impl PublicKeyPayload {
    pub fn new(public_key: &ECPoint) -> Result<Self, ProtocolError> {
        Ok(Self {
            public_key: PointPayload::encode(public_key)?,
        })
    }

    pub fn public_key(&self) -> Result<ECPoint, ProtocolError> {
        self.public_key.decode()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPayload {
    pub deck: Vec<String>,
}

impl DeckPayload {
    pub fn new(deck: &Deck<Scalar>) -> Self {
        Self {
            deck: deck.iter().map(encode_field).collect(),
        }
    }

    /// Decodes a full deck, rejecting short decks and repeated cards.
    pub fn deck(&self) -> Result<Deck<Scalar>, ProtocolError> {
        let cards = self
            .deck
            .iter()
            .map(|card| decode_field(card))
            .collect::<Result<Vec<Scalar>, _>>()?;
        Deck::full(cards)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
