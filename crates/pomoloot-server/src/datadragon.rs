//! Riot Data Dragon client.
//!
//! Builds a complete [`CatalogSnapshot`] off to the side and only then swaps
//! it into the shared [`CatalogStore`], so claims never see a half-fetched
//! catalog. Skins need one request per champion; those run concurrently and a
//! champion whose detail fails to load simply contributes no skins.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use pomoloot_shared::catalog::{CatalogStats, Champion, Icon, Item, Skin};
use pomoloot_shared::constants::DATA_DRAGON_LOCALE;
use pomoloot_shared::{CatalogSnapshot, CatalogStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SKIN_FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed Data Dragon payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data Dragon returned no versions")]
    NoVersion,
}

#[derive(Debug, Clone)]
pub struct DataDragon {
    client: reqwest::Client,
    base_url: String,
}

impl DataDragon {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pomoloot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch the newest version and build a full snapshot for it.
    pub async fn fetch_catalog(&self) -> Result<CatalogSnapshot, FetchError> {
        let version = self.latest_version().await?;
        debug!(%version, "fetching Data Dragon catalog");

        let champions = self.get_text(&self.data_url(&version, "champion.json")).await?;
        let champions = parse_champions(&champions)?;
        let items = self.get_text(&self.data_url(&version, "item.json")).await?;
        let items = parse_items(&items)?;
        let icons = self.get_text(&self.data_url(&version, "profileicon.json")).await?;
        let icons = parse_icons(&icons)?;
        let skins = self.fetch_skins(&version, &champions).await;

        Ok(CatalogSnapshot::new(version, champions, items, icons, skins))
    }

    pub async fn latest_version(&self) -> Result<String, FetchError> {
        let versions: Vec<String> = self
            .get_json(&format!("{}/api/versions.json", self.base_url))
            .await?;
        versions.into_iter().next().ok_or(FetchError::NoVersion)
    }

    async fn fetch_skins<'a>(&'a self, version: &'a str, champions: &'a [Champion]) -> Vec<Skin> {
        let fetches: Vec<_> = champions
            .iter()
            .map(|champ: &'a Champion| async move {
                let url = self.data_url(version, &format!("champion/{}.json", champ.id));
                let body = self.get_text(&url).await;
                (champ, body)
            })
            .collect();
        let results: Vec<_> = stream::iter(fetches)
            .buffer_unordered(SKIN_FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut skins = Vec::new();
        for (champ, body) in results {
            let parsed = body.and_then(|b| parse_skins(champ, &b).map_err(FetchError::from));
            match parsed {
                Ok(mut found) => skins.append(&mut found),
                Err(e) => warn!(champion = %champ.id, error = %e, "skipping champion skins"),
            }
        }
        skins.sort_by(|a, b| (&a.champion_id, a.num).cmp(&(&b.champion_id, b.num)));
        skins
    }

    fn data_url(&self, version: &str, file: &str) -> String {
        format!(
            "{}/cdn/{version}/data/{DATA_DRAGON_LOCALE}/{file}",
            self.base_url
        )
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        Ok(serde_json::from_str(&self.get_text(url).await?)?)
    }
}

/// Fetch a fresh catalog and publish it. The old snapshot stays in place on
/// any error.
pub async fn refresh_catalog(
    dragon: &DataDragon,
    store: &CatalogStore,
) -> Result<(String, CatalogStats), FetchError> {
    let snapshot = dragon.fetch_catalog().await?;
    let version = snapshot.version().to_string();
    let stats = snapshot.stats();

    store.replace(snapshot);
    info!(%version, "catalog refreshed");
    Ok((version, stats))
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DataMap<T> {
    data: HashMap<String, T>,
}

#[derive(Deserialize)]
struct ChampionEntry {
    id: String,
    name: String,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct ItemEntry {
    name: String,
}

#[derive(Deserialize)]
struct ChampionDetail {
    #[serde(default)]
    skins: Vec<SkinEntry>,
}

#[derive(Deserialize)]
struct SkinEntry {
    num: u32,
    name: String,
}

fn parse_champions(body: &str) -> Result<Vec<Champion>, serde_json::Error> {
    let map: DataMap<ChampionEntry> = serde_json::from_str(body)?;
    let mut champions: Vec<Champion> = map
        .data
        .into_values()
        .map(|c| Champion {
            id: c.id,
            name: c.name,
            title: c.title,
        })
        .collect();
    champions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(champions)
}

fn parse_items(body: &str) -> Result<Vec<Item>, serde_json::Error> {
    let map: DataMap<ItemEntry> = serde_json::from_str(body)?;
    let mut items: Vec<Item> = map
        .data
        .into_iter()
        .map(|(id, item)| Item {
            id,
            name: item.name,
        })
        .collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(items)
}

fn parse_icons(body: &str) -> Result<Vec<Icon>, serde_json::Error> {
    let map: DataMap<IgnoredAny> = serde_json::from_str(body)?;
    let mut icons: Vec<Icon> = map.data.into_keys().map(|id| Icon { id }).collect();
    icons.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(icons)
}

/// Non-default skins of one champion. Skin 0 is the base look.
fn parse_skins(champion: &Champion, body: &str) -> Result<Vec<Skin>, serde_json::Error> {
    let map: DataMap<ChampionDetail> = serde_json::from_str(body)?;
    Ok(map
        .data
        .into_values()
        .flat_map(|detail| detail.skins)
        .filter(|skin| skin.num != 0)
        .map(|skin| Skin {
            champion_id: champion.id.clone(),
            champion_name: champion.name.clone(),
            num: skin.num,
            name: skin.name,
        })
        .collect())
}
