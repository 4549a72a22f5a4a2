//! A runnable duelhub server with a built-in card catalog.
//!
//! Decks are drawn from the catalog with the Silver pack table, so every
//! match plays with a different spread of tiers. Tokens are plain numeric
//! ids; swap `TokenAuth` for a real credential-service client in anything
//! beyond local play.

use duelhub::prelude::*;

// ---------------------------------------------------------------------------
// Card catalog
// ---------------------------------------------------------------------------

fn card(
    id: u32,
    name: &str,
    category: Category,
    attack: u32,
    hp: u32,
    cost: u32,
    tier: u8,
) -> Card {
    Card {
        id: CardId(id),
        name: name.to_string(),
        category,
        attack,
        hp,
        max_hp: hp,
        cost,
        tier,
    }
}

/// The full demo catalog: every category represented, tiers 1 through 4.
fn catalog() -> Vec<Card> {
    use Category::*;
    vec![
        // Tier 1: cheap openers.
        card(1, "Ember Pup", Flame, 6, 8, 1, 1),
        card(2, "Tidepool Crab", Tide, 5, 10, 1, 1),
        card(3, "Bramble Sprout", Thorn, 4, 12, 1, 1),
        card(4, "Glimmer Moth", Light, 6, 7, 1, 1),
        card(5, "Gutter Shade", Shade, 7, 6, 1, 1),
        card(6, "Cinder Imp", Flame, 8, 5, 2, 1),
        card(7, "Brook Nymph", Tide, 5, 12, 2, 1),
        // Tier 2: the midgame.
        card(10, "Flarehorn Elk", Flame, 12, 14, 3, 2),
        card(11, "Reef Sentinel", Tide, 10, 20, 3, 2),
        card(12, "Thornback Boar", Thorn, 11, 16, 3, 2),
        card(13, "Dawn Herald", Light, 13, 12, 4, 2),
        card(14, "Dusk Stalker", Shade, 14, 11, 4, 2),
        // Tier 3: finishers.
        card(20, "Pyre Colossus", Flame, 20, 24, 6, 3),
        card(21, "Abyssal Leviathan", Tide, 18, 30, 6, 3),
        card(22, "Verdant Titan", Thorn, 16, 34, 6, 3),
        card(23, "Radiant Seraph", Light, 22, 20, 7, 3),
        card(24, "Umbral Wraith", Shade, 24, 18, 7, 3),
        // Tier 4: gold-pack exclusives.
        card(30, "Solar Phoenix", Flame, 28, 28, 9, 4),
        card(31, "Void Monarch", Shade, 30, 25, 9, 4),
    ]
}

/// Deals decks by opening Silver packs against the catalog.
struct CatalogCards {
    pool: Vec<Card>,
    deck_size: usize,
}

impl CatalogCards {
    fn new() -> Self {
        Self { pool: catalog(), deck_size: 8 }
    }
}

impl CardSource for CatalogCards {
    fn starting_deck(&self, player: PlayerId) -> Vec<Card> {
        let mut rng = rand::rng();
        let deck = draw(
            &PackGrade::Silver.table(),
            &self.pool,
            self.deck_size,
            &mut rng,
        );
        tracing::debug!(%player, cards = deck.len(), "dealt starting deck");
        deck
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Accepts any numeric token as the player's id. Demo only.
struct TokenAuth;

impl Authenticator for TokenAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let id: u64 = token
            .parse()
            .map_err(|_| AuthError("token must be a number".into()))?;
        Ok(PlayerId(id))
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = DuelhubServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(CatalogCards::new(), TokenAuth)
        .await?;

    tracing::info!("duel-server listening on 0.0.0.0:8080");
    server.run().await?;
    Ok(())
}
