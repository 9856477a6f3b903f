/// Application name
pub const APP_NAME: &str = "pomoloot";

/// Length of one reward interval in seconds (15 minutes)
pub const REWARD_INTERVAL_SECS: u64 = 15 * 60;

/// Highest mastery level a champion can reach
pub const MAX_MASTERY_LEVEL: u8 = 7;

/// Data Dragon CDN root, also the prefix of every reward image URL
pub const DATA_DRAGON_BASE_URL: &str = "https://ddragon.leagueoflegends.com";

/// Data Dragon locale used for catalog data
pub const DATA_DRAGON_LOCALE: &str = "en_US";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8085;

/// Session lifetime in hours (7 days)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 7 * 24;

/// Maximum activity name length in characters
pub const MAX_ACTIVITY_NAME_LEN: usize = 200;

/// Maximum category / tag name length in characters
pub const MAX_LABEL_NAME_LEN: usize = 50;
