//! Playing cards, decks and the shuffle shared by plain and encrypted decks.

use crate::error::ProtocolError;
use crate::rotation::distance_from_dealer;
use crate::{Cipher, ECPoint, KeyPair, Scalar};

use ark_ff::{BigInteger, PrimeField};
use cipher_essentials::commutative::CommutativeCipher;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

pub const DECK_SIZE: usize = 52;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    fn symbol(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    fn symbol(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// A card before it enters the shuffle chain. Displays as its short token,
/// e.g. `"10H"` or `"AS"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Position in the canonical deck: suits in order, ranks within a suit.
    pub fn index(&self) -> usize {
        self.suit as usize * Rank::ALL.len() + self.rank as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= DECK_SIZE {
            return None;
        }
        Some(Self::new(
            Rank::ALL[index % Rank::ALL.len()],
            Suit::ALL[index / Rank::ALL.len()],
        ))
    }

    /// The scalar a card enters the first encryption as. Zero is skipped
    /// because every layer maps it to itself.
    pub fn encode(&self) -> Scalar {
        Scalar::from(self.index() as u64 + 1)
    }

    pub fn decode(value: &Scalar) -> Option<Self> {
        let bigint = value.into_bigint();
        if bigint.num_bits() > 8 {
            return None;
        }
        let small = bigint.as_ref()[0] as usize;
        small.checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Card {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let unknown = || ProtocolError::UnknownCard;
        let split = token.len().checked_sub(1).ok_or_else(unknown)?;
        if !token.is_char_boundary(split) {
            return Err(unknown());
        }
        let (rank, suit) = token.split_at(split);
        let rank = Rank::ALL
            .into_iter()
            .find(|r| r.symbol() == rank)
            .ok_or_else(unknown)?;
        let suit = Suit::ALL
            .into_iter()
            .find(|s| s.symbol().to_string() == suit)
            .ok_or_else(unknown)?;
        Ok(Self::new(rank, suit))
    }
}

/// An ordered collection of distinct cards. Plain decks hold [`Card`]s,
/// decks in the shuffle chain hold [`Scalar`]s; both compare by value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck<T>(Vec<T>);

impl<T: Eq + Hash> Deck<T> {
    /// Rejects collections that hold the same card twice.
    pub fn new(cards: Vec<T>) -> Result<Self, ProtocolError> {
        let mut seen = HashSet::with_capacity(cards.len());
        if !cards.iter().all(|card| seen.insert(card)) {
            return Err(ProtocolError::DuplicateCard);
        }
        Ok(Self(cards))
    }

    /// Like [`Deck::new`], additionally requiring all 52 cards.
    pub fn full(cards: Vec<T>) -> Result<Self, ProtocolError> {
        if cards.len() != DECK_SIZE {
            return Err(ProtocolError::DeckSize(cards.len(), DECK_SIZE));
        }
        Self::new(cards)
    }
}

impl<T> Deck<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<'a, T> IntoIterator for &'a Deck<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The 52 cards in canonical order.
pub fn build_deck() -> Deck<Card> {
    Deck((0..DECK_SIZE).filter_map(Card::from_index).collect())
}

/// Uniform shuffle: repeatedly take a uniformly chosen remaining card and put
/// it at the end of the output.
pub fn shuffle<T, R: Rng + ?Sized>(rng: &mut R, deck: Deck<T>) -> Deck<T> {
    let mut remaining = deck.0;
    let mut shuffled = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let i = rng.gen_range(0..remaining.len());
        shuffled.push(remaining.swap_remove(i));
    }
    Deck(shuffled)
}

pub fn encode_deck(deck: &Deck<Card>) -> Deck<Scalar> {
    Deck(deck.iter().map(Card::encode).collect())
}

/// Maps a fully decrypted deck back to cards.
pub fn decode_deck(deck: &Deck<Scalar>) -> Result<Deck<Card>, ProtocolError> {
    deck.iter()
        .map(|value| Card::decode(value).ok_or(ProtocolError::UnknownCard))
        .collect::<Result<Vec<_>, _>>()
        .map(Deck)
}

/// Add one encryption layer shared with `counterparty`.
///
/// Multiplying by a non-zero factor is a bijection, so the result keeps the
/// deck's distinctness.
pub fn encrypt_deck(
    deck: &Deck<Scalar>,
    counterparty: &ECPoint,
    key_pair: &KeyPair,
) -> Result<Deck<Scalar>, ProtocolError> {
    let cards = Cipher::encrypt_all(deck.as_slice(), counterparty, &key_pair.secret_key)?;
    Ok(Deck(cards))
}

/// Remove the encryption layer shared with `counterparty`.
pub fn decrypt_deck(
    deck: &Deck<Scalar>,
    counterparty: &ECPoint,
    key_pair: &KeyPair,
) -> Result<Deck<Scalar>, ProtocolError> {
    let cards = Cipher::decrypt_all(deck.as_slice(), counterparty, &key_pair.secret_key)?;
    Ok(Deck(cards))
}

/// The `cards_per_player` consecutive cards dealt to `player`.
///
/// Hands are handed out in rotation order starting with the player right
/// after the dealer; the dealer's hand comes last.
pub fn deal_hand<T: Clone, P: PartialEq>(
    deck: &Deck<T>,
    players: &[P],
    dealer: &P,
    player: &P,
    cards_per_player: usize,
) -> Option<Vec<T>> {
    let seat = distance_from_dealer(players, dealer, player)?;
    let start = (seat - 1) * cards_per_player;
    deck.as_slice()
        .get(start..start + cards_per_player)
        .map(<[T]>::to_vec)
}
