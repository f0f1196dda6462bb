use crate::error::ProtocolError;
use crate::ledger::{Address, GameId};
use crate::Scalar;

use serde::Serialize;
use std::fmt;

/// How far the deal has progressed, as seen by one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    WaitingForPlayers,
    KeyExchange,
    Encrypting,
    Decrypting,
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::WaitingForPlayers => "WAITING_FOR_PLAYERS",
            Phase::KeyExchange => "KEY_EXCHANGE",
            Phase::Encrypting => "ENCRYPTING",
            Phase::Decrypting => "DECRYPTING",
            Phase::Ready => "READY",
        };
        f.write_str(name)
    }
}

/// Facts read from the ledger on a tick that the phase is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub keys_collected: bool,
    pub shuffle_finished: bool,
}

/// One game as seen by one player.
///
/// The seating order only ever grows by appending newly observed joiners, the
/// creator always holds the first seat and the stored phase never moves
/// backwards.
#[derive(Clone, Debug)]
pub struct GameSession {
    game_id: GameId,
    players: Vec<Address>,
    dealer: Address,
    creator: Address,
    phase: Phase,
    cards: Vec<Scalar>,
    seats: usize,
}

impl GameSession {
    /// A fresh session seated with its creator, who also deals.
    pub fn new(game_id: GameId, creator: Address) -> Self {
        Self {
            game_id,
            players: vec![creator.clone()],
            dealer: creator.clone(),
            creator,
            phase: Phase::WaitingForPlayers,
            cards: Vec::new(),
            seats: usize::MAX,
        }
    }

    /// Limit the table to `seats` players, creator included. Once they are
    /// taken the seating is final and later joiners are never seated.
    pub fn with_seats(mut self, seats: usize) -> Self {
        self.seats = seats.max(1);
        self
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.seats
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn players(&self) -> &[Address] {
        &self.players
    }

    pub fn dealer(&self) -> &Address {
        &self.dealer
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The local player's dealt cards, still masked by the layers the single
    /// decryption step leaves on.
    pub fn cards(&self) -> &[Scalar] {
        &self.cards
    }

    pub fn is_seated(&self, player: &Address) -> bool {
        self.players.contains(player)
    }

    /// Seat players in the order they joined until the table is full.
    /// Already seated players and the creator are skipped. Returns how many
    /// seats were added.
    pub fn seat_players<'a>(&mut self, joined: impl IntoIterator<Item = &'a Address>) -> usize {
        let before = self.players.len();
        for player in joined {
            if self.is_full() {
                break;
            }
            if !self.players.contains(player) {
                self.players.push(player.clone());
            }
        }
        self.players.len() - before
    }

    pub fn set_dealer(&mut self, dealer: Address) -> Result<(), ProtocolError> {
        if !self.is_seated(&dealer) {
            return Err(ProtocolError::NotSeated(dealer));
        }
        self.dealer = dealer;
        Ok(())
    }

    /// Record the dealt hand. Only the first non-empty hand is kept.
    pub fn set_cards(&mut self, cards: Vec<Scalar>) -> bool {
        if !self.cards.is_empty() || cards.is_empty() {
            return false;
        }
        self.cards = cards;
        true
    }

    /// Recompute the phase from `progress` and advance the stored phase to it
    /// when it is further along.
    pub fn observe(&mut self, progress: Progress, min_players: usize) -> Phase {
        let observed = observed_phase(self, progress, min_players);
        self.phase = self.phase.max(observed);
        self.phase
    }
}

/// The phase the facts point at, regardless of what was stored before.
pub fn observed_phase(session: &GameSession, progress: Progress, min_players: usize) -> Phase {
    if session.players().len() < min_players {
        Phase::WaitingForPlayers
    } else if !session.cards().is_empty() {
        Phase::Ready
    } else if progress.shuffle_finished {
        Phase::Decrypting
    } else if progress.keys_collected {
        Phase::Encrypting
    } else {
        Phase::KeyExchange
    }
}
