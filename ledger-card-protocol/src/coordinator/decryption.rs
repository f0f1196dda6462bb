//! The player right after the dealer strips the layer it shares with its own
//! successor from the fully encrypted deck. Everyone then reads their hand
//! from that publication.

use crate::cards::{deal_hand, decrypt_deck, Deck};
use crate::error::ProtocolError;
use crate::ledger::Address;
use crate::rotation::next_player_after;
use crate::session::GameSession;
use crate::{ECPoint, KeyPair, Scalar};

#[derive(Clone, Debug, Default)]
pub struct DecryptionView {
    /// Latest deck published by the final shuffler, once the chain finished.
    pub finished_deck: Option<Deck<Scalar>>,
    /// A decryption transaction from the local player already exists.
    pub own_step_published: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionStep {
    /// The player after the decryptor, whose key the stripped layer was
    /// shared with.
    pub counterparty: Address,
    pub source: Deck<Scalar>,
}

/// The only player that decrypts: the one seated right after the dealer.
pub fn decryptor(session: &GameSession) -> Option<&Address> {
    next_player_after(session.players(), session.dealer())
}

pub fn plan_decryption(
    session: &GameSession,
    me: &Address,
    view: DecryptionView,
) -> Option<DecryptionStep> {
    if view.own_step_published || decryptor(session) != Some(me) {
        return None;
    }
    let counterparty = next_player_after(session.players(), me)?;
    if counterparty == me {
        return None;
    }
    Some(DecryptionStep {
        counterparty: counterparty.clone(),
        source: view.finished_deck?,
    })
}

pub fn apply_decryption(
    source: &Deck<Scalar>,
    counterparty: &ECPoint,
    key_pair: &KeyPair,
) -> Result<Deck<Scalar>, ProtocolError> {
    decrypt_deck(source, counterparty, key_pair)
}

/// The slice of the decrypted deck that belongs to `me`, or `None` when the
/// deck is too short for the table.
pub fn dealt_cards(
    session: &GameSession,
    me: &Address,
    deck: &Deck<Scalar>,
    cards_per_player: usize,
) -> Option<Vec<Scalar>> {
    if cards_per_player == 0 {
        return None;
    }
    deal_hand(deck, session.players(), session.dealer(), me, cards_per_player)
}
