//! Weighted loot draws for card packs.
//!
//! One algorithm for every pack-opening call site: sample a tier by
//! cumulative-distribution inversion, then pick uniformly among the pool
//! cards of that tier.

use std::collections::BTreeMap;

use rand::Rng;

use duelhub_protocol::Card;

/// Per-tier draw probabilities for one pack grade.
///
/// Tiers are kept in ascending order (`BTreeMap`), which is what the
/// cumulative inversion in [`draw`] walks. Tables are expected to sum to 1;
/// that is asserted in debug builds but deliberately not enforced at
/// runtime — a drifted table degrades draw odds, it must not take the
/// store down.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTable {
    weights: BTreeMap<u8, f64>,
}

impl ProbabilityTable {
    /// Builds a table from `(tier, probability)` pairs.
    pub fn new(weights: impl IntoIterator<Item = (u8, f64)>) -> Self {
        let weights: BTreeMap<u8, f64> = weights.into_iter().collect();
        // An empty table is legal (draws from it yield nothing).
        debug_assert!(
            weights.is_empty()
                || (weights.values().sum::<f64>() - 1.0).abs() < 1e-6,
            "tier probabilities should sum to 1"
        );
        Self { weights }
    }

    /// Ascending iteration over `(tier, probability)`.
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.weights.iter().map(|(t, p)| (*t, *p))
    }

    /// The tier carrying the largest probability mass (lowest tier wins
    /// ties). Used as the rounding fallback in [`draw`].
    fn heaviest_tier(&self) -> Option<u8> {
        let mut best: Option<(u8, f64)> = None;
        for (tier, p) in self.iter() {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((tier, p)),
            }
        }
        best.map(|(tier, _)| tier)
    }
}

/// The fixed pack grades sold by the store, each with its reference
/// probability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackGrade {
    Bronze,
    Silver,
    Gold,
}

impl PackGrade {
    /// The tier table for this grade. Each sums to exactly 1.
    pub fn table(&self) -> ProbabilityTable {
        match self {
            Self::Bronze => ProbabilityTable::new([
                (1, 0.70),
                (2, 0.25),
                (3, 0.05),
            ]),
            Self::Silver => ProbabilityTable::new([
                (1, 0.45),
                (2, 0.40),
                (3, 0.15),
            ]),
            Self::Gold => ProbabilityTable::new([
                (1, 0.20),
                (2, 0.45),
                (3, 0.30),
                (4, 0.05),
            ]),
        }
    }
}

/// Draws up to `count` cards from `pool` according to `table`.
///
/// For each draw, a tier is sampled by walking the cumulative distribution
/// in ascending tier order and taking the first tier whose cumulative sum
/// reaches the sampled `r ∈ [0, 1)`. If floating-point accumulation leaves
/// `r` above the final sum, the heaviest tier is used instead of failing.
/// A sampled tier with no matching pool cards skips that draw, so the
/// result may hold fewer than `count` cards — callers must tolerate that.
pub fn draw<R: Rng + ?Sized>(
    table: &ProbabilityTable,
    pool: &[Card],
    count: usize,
    rng: &mut R,
) -> Vec<Card> {
    let mut drawn = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(tier) = sample_tier(table, rng) else {
            break; // empty table draws nothing
        };
        let matches: Vec<&Card> =
            pool.iter().filter(|c| c.tier == tier).collect();
        if matches.is_empty() {
            continue;
        }
        let pick = rng.random_range(0..matches.len());
        drawn.push(matches[pick].clone());
    }
    drawn
}

/// Samples one tier by cumulative-distribution inversion.
fn sample_tier<R: Rng + ?Sized>(
    table: &ProbabilityTable,
    rng: &mut R,
) -> Option<u8> {
    let r: f64 = rng.random();
    let mut cumulative = 0.0;
    for (tier, p) in table.iter() {
        cumulative += p;
        if cumulative >= r {
            return Some(tier);
        }
    }
    // Rounding left r beyond the final sum.
    table.heaviest_tier()
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelhub_protocol::{CardId, Category};

    fn card(id: u32, tier: u8) -> Card {
        Card {
            id: CardId(id),
            name: format!("card-{id}"),
            category: Category::Flame,
            attack: 10,
            hp: 10,
            max_hp: 10,
            cost: 1,
            tier,
        }
    }

    #[test]
    fn test_draw_returns_at_most_count() {
        let table = ProbabilityTable::new([(1, 0.6), (2, 0.4)]);
        let pool =
            vec![card(1, 1), card(2, 1), card(3, 1), card(4, 2), card(5, 2)];
        let mut rng = rand::rng();
        let drawn = draw(&table, &pool, 5, &mut rng);
        assert!(drawn.len() <= 5);
    }

    #[test]
    fn test_draw_only_returns_pool_cards() {
        let table = ProbabilityTable::new([(1, 0.6), (2, 0.4)]);
        let pool = vec![card(1, 1), card(2, 2)];
        let mut rng = rand::rng();
        for c in draw(&table, &pool, 100, &mut rng) {
            assert!(pool.iter().any(|p| p.id == c.id));
        }
    }

    #[test]
    fn test_draw_skips_tiers_missing_from_pool() {
        // Tier 2 has probability mass but no pool cards: those draws
        // are skipped, not retried.
        let table = ProbabilityTable::new([(1, 0.5), (2, 0.5)]);
        let pool = vec![card(1, 1)];
        let mut rng = rand::rng();
        let drawn = draw(&table, &pool, 200, &mut rng);
        assert!(drawn.len() < 200);
        assert!(drawn.iter().all(|c| c.tier == 1));
    }

    #[test]
    fn test_draw_from_empty_table_is_empty() {
        let table = ProbabilityTable::new(std::iter::empty::<(u8, f64)>());
        let pool = vec![card(1, 1)];
        let mut rng = rand::rng();
        assert!(draw(&table, &pool, 10, &mut rng).is_empty());
    }

    #[test]
    fn test_heaviest_tier_prefers_largest_mass() {
        let table = ProbabilityTable::new([(1, 0.2), (2, 0.5), (3, 0.3)]);
        assert_eq!(table.heaviest_tier(), Some(2));
    }

    #[test]
    fn test_heaviest_tier_ties_go_to_lowest() {
        let table = ProbabilityTable::new([(1, 0.5), (2, 0.5)]);
        assert_eq!(table.heaviest_tier(), Some(1));
    }

    // Statistical: the empirical tier distribution over many draws should
    // converge to the table. Tolerance is generous to keep the test stable.
    #[test]
    fn test_draw_distribution_converges() {
        let table = ProbabilityTable::new([(1, 0.6), (2, 0.4)]);
        let pool =
            vec![card(1, 1), card(2, 1), card(3, 1), card(4, 2), card(5, 2)];
        let mut rng = rand::rng();

        let drawn = draw(&table, &pool, 1000, &mut rng);
        assert_eq!(drawn.len(), 1000, "every tier is stocked, no skips");

        let tier1 = drawn.iter().filter(|c| c.tier == 1).count() as f64;
        let fraction = tier1 / drawn.len() as f64;
        assert!(
            (fraction - 0.6).abs() < 0.05,
            "tier-1 fraction {fraction} should be near 0.6"
        );
    }

    #[test]
    fn test_pack_grade_tables_sum_to_one() {
        for grade in [PackGrade::Bronze, PackGrade::Silver, PackGrade::Gold] {
            let sum: f64 = grade.table().iter().map(|(_, p)| p).sum();
            assert!((sum - 1.0).abs() < 1e-9, "{grade:?} sums to {sum}");
        }
    }
}
