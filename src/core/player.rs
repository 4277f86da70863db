//! Seats at the table.
//!
//! `PlayerId` is a 0-based seat index; turn order follows seat order and
//! wraps. `PlayerMap` holds one value per seat and is indexed by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A seat index. `PlayerId(0)` takes the first turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every seat in a game of `player_count`.
    ///
    /// ```
    /// use ccg_rules::core::PlayerId;
    ///
    /// let seats: Vec<_> = PlayerId::all(3).collect();
    /// assert_eq!(seats, vec![PlayerId::new(0), PlayerId::new(1), PlayerId::new(2)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count.min(usize::from(u8::MAX)) as u8).map(PlayerId)
    }

    /// The other seats, starting with the one to this player's left.
    ///
    /// ```
    /// use ccg_rules::core::PlayerId;
    ///
    /// let opponents: Vec<_> = PlayerId::new(1).opponents(3).collect();
    /// assert_eq!(opponents, vec![PlayerId::new(2), PlayerId::new(0)]);
    /// ```
    pub fn opponents(self, player_count: usize) -> impl Iterator<Item = PlayerId> {
        (1..player_count).map(move |offset| PlayerId(((self.index() + offset) % player_count) as u8))
    }

    /// Whoever plays after this seat.
    #[must_use]
    pub fn next(self, player_count: usize) -> PlayerId {
        PlayerId(((self.index() + 1) % player_count.max(1)) as u8)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// One `T` per seat.
///
/// ```
/// use ccg_rules::core::{PlayerId, PlayerMap};
///
/// let mut lore = PlayerMap::new(2, |_| 0i64);
/// lore[PlayerId::new(1)] += 3;
///
/// assert_eq!(lore[PlayerId::new(0)], 0);
/// assert_eq!(lore[PlayerId::new(1)], 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    seats: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Build each seat's value from its id. Seats past 255 are dropped.
    pub fn new(player_count: usize, init: impl Fn(PlayerId) -> T) -> Self {
        Self {
            seats: PlayerId::all(player_count).map(init).collect(),
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// `None` for a seat that is not at this table.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&T> {
        self.seats.get(player.index())
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut T> {
        self.seats.get_mut(player.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.seats.iter().enumerate().map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.seats.len())
    }
}

/// Panics on a seat outside the table; use [`PlayerMap::get`] for
/// unchecked ids.
impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &T {
        &self.seats[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.seats[player.index()]
    }
}
