use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identity of a registered user.
    UserId
);
uuid_id!(
    /// Identity of a tracked activity.
    ActivityId
);
uuid_id!(TimeEntryId);
uuid_id!(RewardId);

/// The four kinds of collectible a claim can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    Item,
    Champion,
    Skin,
    Icon,
}

impl RewardType {
    /// Stable tag used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Item => "item",
            RewardType::Champion => "champion",
            RewardType::Skin => "skin",
            RewardType::Icon => "icon",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "item" => Some(Self::Item),
            "champion" => Some(Self::Champion),
            "skin" => Some(Self::Skin),
            "icon" => Some(Self::Icon),
            _ => None,
        }
    }

    /// Display tier, fixed per type.
    pub fn rarity(&self) -> Rarity {
        match self {
            RewardType::Item | RewardType::Champion => Rarity::Common,
            RewardType::Skin => Rarity::Rare,
            RewardType::Icon => Rarity::Epic,
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            _ => None,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
