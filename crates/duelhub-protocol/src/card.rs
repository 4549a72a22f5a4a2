//! The `Card` value type and its category.
//!
//! Cards are supplied by the external inventory store and treated as
//! immutable input data once drawn; the server never persists them. They
//! appear on the wire inside `PlayCard` / `OpponentPlayCard` events and
//! battle snapshots, which is why they live in the protocol crate rather
//! than next to the battle rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a card definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// The elemental category of a card, used by the type-effectiveness
/// damage resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Flame,
    Tide,
    Thorn,
    Light,
    Shade,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Flame => "Flame",
            Self::Tide => "Tide",
            Self::Thorn => "Thorn",
            Self::Light => "Light",
            Self::Shade => "Shade",
        };
        f.write_str(s)
    }
}

/// A collectible card as it exists in a player's deck, hand, or zone.
///
/// `tier` is the rarity bucket used both for loot probability weighting and
/// rough strength scaling. `hp` tracks the in-battle remaining health and is
/// the only field the battle machine ever lowers; `max_hp` is the printed
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub category: Category,
    pub attack: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub cost: u32,
    pub tier: u8,
}
