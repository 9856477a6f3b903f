//! Reward roulette.
//!
//! Drop rates are a step function of the minutes tracked on the activity:
//! the longer the investment, the better the odds of a skin. A roll in
//! `[0, 100)` is matched against cumulative buckets in the fixed order
//! item, champion, skin, icon.

use serde::Serialize;

use crate::catalog::CatalogSnapshot;
use crate::error::RouletteError;
use crate::random::RandomSource;
use crate::types::{Rarity, RewardType};

/// Percentage split over the four reward types. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropRates {
    pub item: u32,
    pub champion: u32,
    pub skin: u32,
    pub icon: u32,
}

/// Tiers as `(minimum minutes, rates)`, highest first.
const DROP_RATE_TIERS: [(u64, DropRates); 5] = [
    (120, DropRates { item: 10, champion: 25, skin: 55, icon: 10 }),
    (60, DropRates { item: 15, champion: 30, skin: 40, icon: 15 }),
    (45, DropRates { item: 25, champion: 35, skin: 25, icon: 15 }),
    (30, DropRates { item: 30, champion: 50, skin: 10, icon: 10 }),
    (0, DropRates { item: 60, champion: 25, skin: 5, icon: 10 }),
];

impl DropRates {
    pub fn for_minutes(total_minutes: u64) -> Self {
        DROP_RATE_TIERS
            .iter()
            .find(|(min, _)| total_minutes >= *min)
            .map_or(DROP_RATE_TIERS[DROP_RATE_TIERS.len() - 1].1, |(_, rates)| *rates)
    }

    /// Buckets in draw order.
    pub fn buckets(&self) -> [(RewardType, u32); 4] {
        [
            (RewardType::Item, self.item),
            (RewardType::Champion, self.champion),
            (RewardType::Skin, self.skin),
            (RewardType::Icon, self.icon),
        ]
    }

    /// Map a roll in `[0, 100)` to a reward type.
    ///
    /// Buckets are half-open; a roll equal to a bucket's upper bound falls in
    /// the next one.
    pub fn pick(&self, roll: u32) -> RewardType {
        let mut upper = 0;
        for (kind, weight) in self.buckets() {
            upper += weight;
            if roll < upper {
                return kind;
            }
        }
        RewardType::Icon
    }
}

/// Draw a reward type for the given minutes.
pub fn spin(total_minutes: u64, rng: &mut dyn RandomSource) -> RewardType {
    let roll = rng.below(100);
    DropRates::for_minutes(total_minutes).pick(u32::try_from(roll).unwrap_or(u32::MAX))
}

/// A concrete collectible produced by the roulette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnReward {
    pub reward_type: RewardType,
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub rarity: Rarity,
}

/// Spin the roulette and resolve a concrete entry from the catalog.
///
/// Fails with [`RouletteError::EmptyCatalog`] when the chosen type has no
/// entries; nothing is drawn in that case.
pub fn draw(
    catalog: &CatalogSnapshot,
    total_minutes: u64,
    rng: &mut dyn RandomSource,
) -> Result<DrawnReward, RouletteError> {
    let reward_type = spin(total_minutes, rng);
    let empty = || RouletteError::EmptyCatalog(reward_type);

    let (external_id, name, image_url) = match reward_type {
        RewardType::Champion => {
            let champ = catalog.random_champion(rng).ok_or_else(empty)?;
            (
                champ.id.clone(),
                champ.name.clone(),
                catalog.champion_image_url(&champ.id),
            )
        }
        RewardType::Item => {
            let item = catalog.random_item(rng).ok_or_else(empty)?;
            (
                item.id.clone(),
                item.name.clone(),
                catalog.item_image_url(&item.id),
            )
        }
        RewardType::Skin => {
            let skin = catalog.random_skin(rng).ok_or_else(empty)?;
            (
                skin.external_id(),
                skin.name.clone(),
                catalog.skin_image_url(&skin.champion_id, skin.num),
            )
        }
        RewardType::Icon => {
            let icon = catalog.random_icon(rng).ok_or_else(empty)?;
            (
                icon.id.clone(),
                format!("Icon #{}", icon.id),
                catalog.icon_image_url(&icon.id),
            )
        }
    };

    tracing::debug!(%reward_type, %external_id, total_minutes, "roulette draw");

    Ok(DrawnReward {
        reward_type,
        external_id,
        name,
        image_url,
        rarity: reward_type.rarity(),
    })
}
