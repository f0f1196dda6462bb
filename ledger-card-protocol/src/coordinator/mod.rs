//! Decision logic of the three dealing steps.
//!
//! Every function here is pure: it looks at the session and at what the host
//! read from the ledger on this tick, and says what the local player should do.
//! Reading, publishing and timing are left to [`crate::node::PlayerNode`].

pub mod decryption;
pub mod key_exchange;
pub mod shuffle_chain;

use crate::ledger::Address;
use crate::ECPoint;

use std::collections::btree_map::{BTreeMap, Entry};

/// Public keys of the other players, filled in as their key transactions are
/// observed. The first key seen from a player is kept for good.
#[derive(Clone, Debug, Default)]
pub struct OtherPlayersPublicKeys {
    keys: BTreeMap<Address, ECPoint>,
}

impl OtherPlayersPublicKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the key was recorded; a later key from the same player
    /// is ignored.
    pub fn merge(&mut self, player: Address, key: ECPoint) -> bool {
        match self.keys.entry(player) {
            Entry::Vacant(entry) => {
                entry.insert(key);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, player: &Address) -> Option<&ECPoint> {
        self.keys.get(player)
    }

    pub fn contains(&self, player: &Address) -> bool {
        self.keys.contains_key(player)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
