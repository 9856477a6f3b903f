//! In-memory catalog of collectibles.
//!
//! A [`CatalogSnapshot`] is immutable once built. [`CatalogStore`] hands out
//! `Arc`s to the current snapshot and replaces it wholesale on refresh, so a
//! reader either sees the old catalog or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DATA_DRAGON_BASE_URL;
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champion {
    pub id: String,
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub champion_id: String,
    pub champion_name: String,
    /// Skin index within the champion; 0 is the default skin and never listed.
    pub num: u32,
    pub name: String,
}

impl Skin {
    /// Catalog id of the skin, `{champion}_{num}`.
    pub fn external_id(&self) -> String {
        format!("{}_{}", self.champion_id, self.num)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub champions: usize,
    pub items: usize,
    pub icons: usize,
    pub skins: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    version: String,
    champions: Vec<Champion>,
    items: Vec<Item>,
    icons: Vec<Icon>,
    skins: Vec<Skin>,
    fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(
        version: impl Into<String>,
        champions: Vec<Champion>,
        items: Vec<Item>,
        icons: Vec<Icon>,
        skins: Vec<Skin>,
    ) -> Self {
        Self {
            version: version.into(),
            champions,
            items,
            icons,
            skins,
            fetched_at: Utc::now(),
        }
    }

    /// A catalog with nothing in it, used until the first fetch lands.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn champions(&self) -> &[Champion] {
        &self.champions
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            champions: self.champions.len(),
            items: self.items.len(),
            icons: self.icons.len(),
            skins: self.skins.len(),
        }
    }

    pub fn random_champion(&self, rng: &mut dyn RandomSource) -> Option<&Champion> {
        pick(&self.champions, rng)
    }

    pub fn random_item(&self, rng: &mut dyn RandomSource) -> Option<&Item> {
        pick(&self.items, rng)
    }

    pub fn random_icon(&self, rng: &mut dyn RandomSource) -> Option<&Icon> {
        pick(&self.icons, rng)
    }

    pub fn random_skin(&self, rng: &mut dyn RandomSource) -> Option<&Skin> {
        pick(&self.skins, rng)
    }

    // Image URL shapes are consumed by the frontend verbatim.

    pub fn champion_image_url(&self, champion_id: &str) -> String {
        format!(
            "{DATA_DRAGON_BASE_URL}/cdn/{}/img/champion/{champion_id}.png",
            self.version
        )
    }

    pub fn item_image_url(&self, item_id: &str) -> String {
        format!("{DATA_DRAGON_BASE_URL}/cdn/{}/img/item/{item_id}.png", self.version)
    }

    pub fn icon_image_url(&self, icon_id: &str) -> String {
        format!(
            "{DATA_DRAGON_BASE_URL}/cdn/{}/img/profileicon/{icon_id}.png",
            self.version
        )
    }

    pub fn skin_image_url(&self, champion_id: &str, num: u32) -> String {
        format!("{DATA_DRAGON_BASE_URL}/cdn/img/champion/splash/{champion_id}_{num}.jpg")
    }
}

fn pick<'a, T>(entries: &'a [T], rng: &mut dyn RandomSource) -> Option<&'a T> {
    if entries.is_empty() {
        return None;
    }
    entries.get(rng.below(entries.len()))
}

/// Shared holder of the current catalog snapshot.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a fully built snapshot, returning the one it replaced.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);

        let stats = guard.stats();
        tracing::info!(
            version = %guard.version,
            champions = stats.champions,
            items = stats.items,
            icons = stats.icons,
            skins = stats.skins,
            "catalog snapshot replaced"
        );

        previous
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(CatalogSnapshot::empty())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn sample_catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            "14.1.1",
            vec![
                Champion {
                    id: "Ahri".into(),
                    name: "Ahri".into(),
                    title: "the Nine-Tailed Fox".into(),
                },
                Champion {
                    id: "MonkeyKing".into(),
                    name: "Wukong".into(),
                    title: "the Monkey King".into(),
                },
            ],
            vec![Item {
                id: "3031".into(),
                name: "Infinity Edge".into(),
            }],
            vec![Icon { id: "588".into() }],
            vec![Skin {
                champion_id: "Ahri".into(),
                champion_name: "Ahri".into(),
                num: 1,
                name: "Dynasty Ahri".into(),
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::fixtures::sample_catalog;
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn image_urls_match_data_dragon_layout() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.champion_image_url("Ahri"),
            "https://ddragon.leagueoflegends.com/cdn/14.1.1/img/champion/Ahri.png"
        );
        assert_eq!(
            catalog.item_image_url("3031"),
            "https://ddragon.leagueoflegends.com/cdn/14.1.1/img/item/3031.png"
        );
        assert_eq!(
            catalog.icon_image_url("588"),
            "https://ddragon.leagueoflegends.com/cdn/14.1.1/img/profileicon/588.png"
        );
        assert_eq!(
            catalog.skin_image_url("Ahri", 12),
            "https://ddragon.leagueoflegends.com/cdn/img/champion/splash/Ahri_12.jpg"
        );
    }

    #[test]
    fn skin_external_id_handles_two_digit_numbers() {
        let skin = Skin {
            champion_id: "Lux".into(),
            champion_name: "Lux".into(),
            num: 17,
            name: "Elementalist Lux".into(),
        };
        assert_eq!(skin.external_id(), "Lux_17");
    }

    #[test]
    fn random_pick_uses_rng() {
        let catalog = sample_catalog();
        let mut rng = ScriptedRandom::new([1, 0]);
        assert_eq!(catalog.random_champion(&mut rng).unwrap().name, "Wukong");
        assert_eq!(catalog.random_champion(&mut rng).unwrap().name, "Ahri");
    }

    #[test]
    fn empty_collections_yield_none() {
        let catalog = CatalogSnapshot::empty();
        let mut rng = ScriptedRandom::default();
        assert!(catalog.random_champion(&mut rng).is_none());
        assert!(catalog.random_item(&mut rng).is_none());
        assert!(catalog.random_icon(&mut rng).is_none());
        assert!(catalog.random_skin(&mut rng).is_none());
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let store = CatalogStore::default();
        let before = store.snapshot();
        assert_eq!(before.stats().champions, 0);

        let previous = store.replace(sample_catalog());
        assert!(Arc::ptr_eq(&previous, &before));

        // Readers holding the old Arc keep their view.
        assert_eq!(before.stats().champions, 0);
        assert_eq!(store.snapshot().stats().champions, 2);
        assert_eq!(store.snapshot().version(), "14.1.1");
    }

    #[test]
    fn concurrent_readers_never_see_a_mix() {
        let store = Arc::new(CatalogStore::new(CatalogSnapshot::new(
            "old",
            vec![],
            vec![Item {
                id: "1".into(),
                name: "old".into(),
            }],
            vec![],
            vec![],
        )));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snap = store.snapshot();
                        let consistent = match snap.version() {
                            "old" => snap.stats().champions == 0 && snap.items()[0].name == "old",
                            "14.1.1" => {
                                snap.stats().champions == 2 && snap.items()[0].name == "Infinity Edge"
                            }
                            _ => false,
                        };
                        assert!(consistent);
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            store.replace(sample_catalog());
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
