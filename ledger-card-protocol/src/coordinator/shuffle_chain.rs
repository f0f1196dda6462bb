//! The deck travels once around the table, starting at the dealer. Each
//! player shuffles it and adds an encryption layer shared with the player
//! after them, then publishes it for that player to pick up.

use crate::cards::{build_deck, encode_deck, encrypt_deck, shuffle, Deck};
use crate::error::ProtocolError;
use crate::ledger::Address;
use crate::rotation::{next_player_after, previous_player_of};
use crate::session::GameSession;
use crate::{ECPoint, KeyPair, Scalar};

use rand::Rng;

/// What a player read from the ledger for this step on the current tick.
#[derive(Clone, Debug, Default)]
pub struct ShuffleChainView {
    /// A shuffle transaction from the local player already exists.
    pub own_step_published: bool,
    /// Latest deck published by the player before the local one. Never read
    /// for the dealer.
    pub previous_deck: Option<Deck<Scalar>>,
    pub keys_collected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShuffleInput {
    /// The dealer opens the chain with the canonical plain deck.
    PlainDeck,
    /// Everyone else continues from their predecessor's deck.
    Published(Deck<Scalar>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleStep {
    pub input: ShuffleInput,
    /// Whose public key the new layer is shared with.
    pub encrypt_for: Address,
}

/// The player whose deck `me` continues from; `None` for the dealer, who
/// opens the chain.
pub fn chain_predecessor<'a>(session: &'a GameSession, me: &Address) -> Option<&'a Address> {
    if me == session.dealer() {
        return None;
    }
    previous_player_of(session.players(), me)
}

/// The player seated right before the dealer applies the last layer; the
/// deck they publish is the fully encrypted deck.
pub fn final_shuffler(session: &GameSession) -> Option<&Address> {
    previous_player_of(session.players(), session.dealer())
}

pub fn plan_shuffle_step(
    session: &GameSession,
    me: &Address,
    view: ShuffleChainView,
) -> Option<ShuffleStep> {
    if view.own_step_published {
        return None;
    }
    let encrypt_for = next_player_after(session.players(), me)?.clone();
    if &encrypt_for == me {
        return None;
    }

    let input = if me == session.dealer() {
        if !view.keys_collected {
            return None;
        }
        ShuffleInput::PlainDeck
    } else {
        ShuffleInput::Published(view.previous_deck?)
    };

    Some(ShuffleStep { input, encrypt_for })
}

/// Shuffle the input deck and add the layer shared with `counterparty`.
pub fn apply_shuffle_step<R: Rng + ?Sized>(
    rng: &mut R,
    input: ShuffleInput,
    counterparty: &ECPoint,
    key_pair: &KeyPair,
) -> Result<Deck<Scalar>, ProtocolError> {
    let shuffled = match input {
        ShuffleInput::PlainDeck => encode_deck(&shuffle(rng, build_deck())),
        ShuffleInput::Published(deck) => shuffle(rng, deck),
    };
    encrypt_deck(&shuffled, counterparty, key_pair)
}
