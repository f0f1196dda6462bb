//! Every seated player publishes one public key before any shuffling starts.

use super::OtherPlayersPublicKeys;
use crate::ledger::Address;
use crate::session::GameSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyExchangeAction {
    /// Generate the local key pair and publish its public half to everyone
    /// currently seated.
    PublishKey { recipients: Vec<Address> },
}

/// A seated player without a key pair generates and publishes one.
pub fn plan_key_publication(
    session: &GameSession,
    me: &Address,
    has_local_key: bool,
) -> Option<KeyExchangeAction> {
    if has_local_key || !session.is_seated(me) {
        return None;
    }
    Some(KeyExchangeAction::PublishKey {
        recipients: session.players().to_vec(),
    })
}

/// Seated players whose key has not been recorded yet.
pub fn players_to_poll<'a>(
    session: &'a GameSession,
    me: &Address,
    keys: &OtherPlayersPublicKeys,
) -> Vec<&'a Address> {
    session
        .players()
        .iter()
        .filter(|player| *player != me && !keys.contains(player))
        .collect()
}

/// Complete once every other seat's key is known; the `+ 1` is the local key.
pub fn is_complete(session: &GameSession, keys: &OtherPlayersPublicKeys) -> bool {
    keys.len() + 1 == session.players().len()
}
