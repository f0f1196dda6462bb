//! Turn order around the table.
//!
//! The seating order is the join order recorded on the ledger and is treated
//! as a circle: the player after the last seat is the first seat. The dealer
//! anchors the circle for the shuffle and decryption chains.

/// Seat index of `player`, if seated.
pub fn position_of<T: PartialEq>(players: &[T], player: &T) -> Option<usize> {
    players.iter().position(|p| p == player)
}

/// The player who acts right after `player`.
pub fn next_player_after<'a, T: PartialEq>(players: &'a [T], player: &T) -> Option<&'a T> {
    let i = position_of(players, player)?;
    players.get((i + 1) % players.len())
}

/// The player who acts right before `player`.
pub fn previous_player_of<'a, T: PartialEq>(players: &'a [T], player: &T) -> Option<&'a T> {
    let i = position_of(players, player)?;
    players.get((i + players.len() - 1) % players.len())
}

/// Every seat once, starting at `dealer` and walking forward.
pub fn rotation_from<'a, T: PartialEq>(players: &'a [T], dealer: &T) -> Option<Vec<&'a T>> {
    let start = position_of(players, dealer)?;
    Some(
        players[start..]
            .iter()
            .chain(players[..start].iter())
            .collect(),
    )
}

/// How many steps after the dealer `player` sits: 1 for the player right
/// after the dealer, `players.len()` for the dealer itself.
pub fn distance_from_dealer<T: PartialEq>(players: &[T], dealer: &T, player: &T) -> Option<usize> {
    let d = position_of(players, dealer)?;
    let p = position_of(players, player)?;
    let n = players.len();
    match (p + n - d) % n {
        0 => Some(n),
        k => Some(k),
    }
}
