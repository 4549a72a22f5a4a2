//! Type-effectiveness damage resolution.
//!
//! A pure lookup: attacker category versus defender category yields a
//! multiplier, and `damage = floor(attack * multiplier)`. Deterministic for
//! fixed inputs, no state.

use duelhub_protocol::{Card, Category};

/// The result of a single attack resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Integer damage dealt, always `floor(attack * multiplier)`.
    pub damage: u32,
    /// The type-effectiveness multiplier that was applied.
    pub multiplier: f64,
}

/// Looks up the type-effectiveness multiplier for an attacker/defender
/// category pair.
///
/// The cycle Flame → Thorn → Tide → Flame hits hard forward and weakly
/// backward; Light and Shade punish each other. Any pairing the table does
/// not name resolves to exactly 1.0.
pub fn effectiveness(attacker: Category, defender: Category) -> f64 {
    use Category::*;
    match (attacker, defender) {
        (Flame, Thorn) | (Thorn, Tide) | (Tide, Flame) => 1.5,
        (Thorn, Flame) | (Tide, Thorn) | (Flame, Tide) => 0.5,
        (Light, Shade) | (Shade, Light) => 1.5,
        _ => 1.0,
    }
}

/// Resolves one attack of `attacker` against `defender`.
pub fn calc_damage(attacker: &Card, defender: &Card) -> Strike {
    let multiplier = effectiveness(attacker.category, defender.category);
    let damage = (attacker.attack as f64 * multiplier).floor() as u32;
    Strike { damage, multiplier }
}
