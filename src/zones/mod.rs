//! Zone system for card locations.
//!
//! Every player owns the same five zones. A card is in exactly one
//! player's zone at a time.
//!
//! ## Key Types
//!
//! - `Zone`: Hand, Deck, Discard, Inkwell, Play
//! - `ZoneManager`: Card location tracking and movement
//! - `ZonePosition`: Position specifier for insertion

pub mod manager;

pub use manager::{ZoneLocation, ZoneManager, ZonePosition};

use serde::{Deserialize, Serialize};

/// A named location a card can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    Hand,
    Deck,
    Discard,
    Inkwell,
    Play,
}

impl Zone {
    /// All zones, in a fixed scan order.
    pub const ALL: [Zone; 5] = [Zone::Hand, Zone::Deck, Zone::Discard, Zone::Inkwell, Zone::Play];
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Zone::Hand => "hand",
            Zone::Deck => "deck",
            Zone::Discard => "discard",
            Zone::Inkwell => "inkwell",
            Zone::Play => "play",
        };
        f.write_str(name)
    }
}
