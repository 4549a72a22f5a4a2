//! The turn-based battle state machine.
//!
//! One `BattleState` per in-game room, owned by the lobby and mutated only
//! through the transitions here. Every rejected transition returns a
//! [`BattleError`] and leaves the state untouched.

use std::collections::HashMap;

use rand::Rng;

use duelhub_protocol::{
    BattleSnapshot, Card, CardId, FieldEvent, FieldEventKind, PlayerId,
    PlayerSide,
};

use crate::damage::{Strike, calc_damage};
use crate::error::BattleError;

/// Hp every player starts with, also the healing ceiling.
pub const MAX_HP: u32 = 100;
/// Cost ceiling; accrual and surges clamp here.
pub const MAX_COST: u32 = 10;
/// Cost available on the very first turn.
pub const START_COST: u32 = 1;
/// Cost granted to the new turn-holder on every turn change.
pub const COST_PER_TURN: u32 = 1;
/// Cards dealt off the top of each deck at battle start.
pub const HAND_SIZE: usize = 4;
/// Seconds on the turn clock; the presentation layer drives the countdown.
pub const TURN_SECONDS: u32 = 60;
/// A field event may fire every this many turns.
pub const FIELD_EVENT_INTERVAL: u32 = 5;

/// The outcome of a successful turn change, for broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnChange {
    pub next_player: PlayerId,
    pub turn_index: u32,
    /// The new turn-holder's cost after accrual.
    pub cost: u32,
}

/// The mutable battle sub-state of one in-game room.
///
/// `players` is the join-order snapshot taken at start; index 0 always acts
/// first and turn order alternates between exactly these two ids.
#[derive(Debug, Clone)]
pub struct BattleState {
    players: [PlayerId; 2],
    current_turn: PlayerId,
    turn_index: u32,
    time_left: u32,
    hp: HashMap<PlayerId, u32>,
    cost: HashMap<PlayerId, u32>,
    hands: HashMap<PlayerId, Vec<Card>>,
    decks: HashMap<PlayerId, Vec<Card>>,
    zones: HashMap<PlayerId, Vec<Card>>,
    graveyards: HashMap<PlayerId, Vec<Card>>,
    cards_played: HashMap<PlayerId, Option<Card>>,
}

impl BattleState {
    /// Initializes a battle: player 0 acts first, hp/cost seeded, and
    /// `HAND_SIZE` cards dealt off the top of each supplied deck.
    pub fn new(players: [PlayerId; 2], decks: [Vec<Card>; 2]) -> Self {
        let mut hands = HashMap::new();
        let mut deck_map = HashMap::new();
        for (player, mut deck) in players.into_iter().zip(decks) {
            let dealt = HAND_SIZE.min(deck.len());
            let hand: Vec<Card> = deck.drain(..dealt).collect();
            hands.insert(player, hand);
            deck_map.insert(player, deck);
        }

        let per_player =
            |v| players.iter().map(|p| (*p, v)).collect::<HashMap<_, _>>();

        Self {
            players,
            current_turn: players[0],
            turn_index: 0,
            time_left: TURN_SECONDS,
            hp: per_player(MAX_HP),
            cost: per_player(START_COST),
            hands,
            decks: deck_map,
            zones: players.iter().map(|p| (*p, Vec::new())).collect(),
            graveyards: players.iter().map(|p| (*p, Vec::new())).collect(),
            cards_played: players.iter().map(|p| (*p, None)).collect(),
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn players(&self) -> [PlayerId; 2] {
        self.players
    }

    pub fn current_turn(&self) -> PlayerId {
        self.current_turn
    }

    /// Strictly increasing across turn changes within one battle.
    pub fn turn_index(&self) -> u32 {
        self.turn_index
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn hp_of(&self, player: PlayerId) -> Option<u32> {
        self.hp.get(&player).copied()
    }

    pub fn cost_of(&self, player: PlayerId) -> Option<u32> {
        self.cost.get(&player).copied()
    }

    pub fn hand_of(&self, player: PlayerId) -> Option<&[Card]> {
        self.hands.get(&player).map(Vec::as_slice)
    }

    pub fn zone_of(&self, player: PlayerId) -> Option<&[Card]> {
        self.zones.get(&player).map(Vec::as_slice)
    }

    pub fn card_played(&self, player: PlayerId) -> Option<&Card> {
        self.cards_played.get(&player).and_then(Option::as_ref)
    }

    /// The other participant.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        let idx = self.players.iter().position(|p| *p == player)?;
        Some(self.players[(idx + 1) % 2])
    }

    /// True once either player's hp has reached zero.
    pub fn is_over(&self) -> bool {
        self.hp.values().any(|hp| *hp == 0)
    }

    /// The surviving player, once the battle is over.
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_over() {
            return None;
        }
        self.hp
            .iter()
            .find(|(_, hp)| **hp > 0)
            .map(|(player, _)| *player)
    }

    // -- Transitions ------------------------------------------------------

    /// Plays a card from the sender's hand.
    ///
    /// Turn ownership, hand membership, and affordability are all enforced
    /// here — the server is authoritative, nothing is left to the client.
    /// On success the cost is deducted, the card moves hand → zone, and a
    /// clone is returned for the opponent broadcast. Combat hp changes
    /// happen separately via [`resolve_strike`](Self::resolve_strike).
    pub fn play_card(
        &mut self,
        sender: PlayerId,
        card_id: CardId,
    ) -> Result<Card, BattleError> {
        self.check_turn(sender)?;

        let hand = self
            .hands
            .get(&sender)
            .ok_or(BattleError::NotInBattle(sender))?;
        let pos = hand
            .iter()
            .position(|c| c.id == card_id)
            .ok_or(BattleError::CardNotInHand(card_id))?;

        let need = hand[pos].cost;
        let have = self.cost.get(&sender).copied().unwrap_or(0);
        if have < need {
            return Err(BattleError::InsufficientCost { need, have });
        }

        // All checks passed; now mutate.
        self.cost.insert(sender, have - need);
        let card = self
            .hands
            .get_mut(&sender)
            .ok_or(BattleError::NotInBattle(sender))?
            .remove(pos);
        if let Some(zone) = self.zones.get_mut(&sender) {
            zone.push(card.clone());
        }
        self.cards_played.insert(sender, Some(card.clone()));
        Ok(card)
    }

    /// Resolves one attack against `defender`'s side of the board.
    ///
    /// If the defender has a card in their zone, the front card absorbs the
    /// type-adjusted damage and goes to the graveyard at zero hp; otherwise
    /// the defender takes the raw attack directly (no category to weigh,
    /// multiplier 1).
    pub fn resolve_strike(
        &mut self,
        attacker: &Card,
        defender: PlayerId,
    ) -> Result<Strike, BattleError> {
        let zone = self
            .zones
            .get_mut(&defender)
            .ok_or(BattleError::NotInBattle(defender))?;

        if let Some(front) = zone.first_mut() {
            let strike = calc_damage(attacker, front);
            front.hp = front.hp.saturating_sub(strike.damage);
            if front.hp == 0 {
                let fallen = zone.remove(0);
                if let Some(graveyard) = self.graveyards.get_mut(&defender) {
                    graveyard.push(fallen);
                }
            }
            return Ok(strike);
        }

        let strike = Strike { damage: attacker.attack, multiplier: 1.0 };
        self.damage_player(defender, strike.damage);
        Ok(strike)
    }

    /// Passes the turn to the other player.
    ///
    /// Clears the per-turn played cards, accrues cost to the new
    /// turn-holder (clamped at [`MAX_COST`]), resets the turn clock, and
    /// bumps `turn_index`. The machine does not care whether the caller or
    /// a timeout driver ended the turn.
    pub fn end_turn(
        &mut self,
        sender: PlayerId,
    ) -> Result<TurnChange, BattleError> {
        self.check_turn(sender)?;

        let next = self
            .opponent_of(sender)
            .ok_or(BattleError::NotInBattle(sender))?;

        self.current_turn = next;
        self.turn_index += 1;
        self.time_left = TURN_SECONDS;
        for played in self.cards_played.values_mut() {
            *played = None;
        }
        let cost = self
            .cost
            .get(&next)
            .copied()
            .unwrap_or(0)
            .saturating_add(COST_PER_TURN)
            .min(MAX_COST);
        self.cost.insert(next, cost);

        Ok(TurnChange {
            next_player: next,
            turn_index: self.turn_index,
            cost,
        })
    }

    /// Applies a field event's effect to one player, through the same
    /// bounded clamps as every other hp/cost mutation.
    pub fn apply_field_event(
        &mut self,
        player: PlayerId,
        event: FieldEvent,
    ) -> Result<(), BattleError> {
        if !self.players.contains(&player) {
            return Err(BattleError::NotInBattle(player));
        }
        match event.kind {
            FieldEventKind::Heal => {
                let hp = self.hp.get(&player).copied().unwrap_or(0);
                self.hp.insert(
                    player,
                    hp.saturating_add(event.magnitude).min(MAX_HP),
                );
            }
            FieldEventKind::CostSurge => {
                let cost = self.cost.get(&player).copied().unwrap_or(0);
                self.cost.insert(
                    player,
                    cost.saturating_add(event.magnitude).min(MAX_COST),
                );
            }
            FieldEventKind::Eruption => {
                self.damage_player(player, event.magnitude);
            }
        }
        Ok(())
    }

    /// Full-state snapshot for the `GameStart` broadcast, sides in
    /// turn order.
    pub fn snapshot(&self) -> BattleSnapshot {
        let sides = self
            .players
            .iter()
            .map(|player| PlayerSide {
                id: *player,
                hp: self.hp.get(player).copied().unwrap_or(0),
                cost: self.cost.get(player).copied().unwrap_or(0),
                hand: self.hands.get(player).cloned().unwrap_or_default(),
                deck_size: self.decks.get(player).map_or(0, Vec::len),
                zone: self.zones.get(player).cloned().unwrap_or_default(),
                graveyard_size: self
                    .graveyards
                    .get(player)
                    .map_or(0, Vec::len),
            })
            .collect();

        BattleSnapshot {
            current_turn: self.current_turn,
            turn_index: self.turn_index,
            time_left: self.time_left,
            sides,
        }
    }

    // -- Internals --------------------------------------------------------

    fn check_turn(&self, sender: PlayerId) -> Result<(), BattleError> {
        if !self.players.contains(&sender) {
            return Err(BattleError::NotInBattle(sender));
        }
        if self.current_turn != sender {
            return Err(BattleError::NotYourTurn(sender));
        }
        Ok(())
    }

    fn damage_player(&mut self, player: PlayerId, amount: u32) {
        if let Some(hp) = self.hp.get_mut(&player) {
            *hp = hp.saturating_sub(amount);
        }
    }
}

/// Rolls whether a field event fires on this turn.
///
/// The host process calls this once per turn change; an event fires on
/// every [`FIELD_EVENT_INTERVAL`]-th turn with a uniformly chosen kind and
/// a magnitude that scales with how deep into the battle we are.
pub fn roll_field_event<R: Rng + ?Sized>(
    turn_index: u32,
    rng: &mut R,
) -> Option<FieldEvent> {
    if turn_index == 0 || turn_index % FIELD_EVENT_INTERVAL != 0 {
        return None;
    }
    let depth = turn_index / FIELD_EVENT_INTERVAL;
    let (kind, base, step) = match rng.random_range(0..3u8) {
        0 => (FieldEventKind::Heal, 10, 2),
        1 => (FieldEventKind::CostSurge, 1, 1),
        _ => (FieldEventKind::Eruption, 8, 3),
    };
    Some(FieldEvent { kind, magnitude: base + depth * step })
}
