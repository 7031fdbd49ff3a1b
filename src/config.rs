use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. When unset the in-process store is used.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the content analysis cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// OCR endpoint used by the clickbait analyzer
    #[serde(default)]
    pub ocr_url: Option<String>,

    /// OCR endpoint API key
    #[serde(default)]
    pub ocr_api_key: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds an analysis result stays cached
    #[serde(default = "default_analysis_cache_ttl_secs")]
    pub analysis_cache_ttl_secs: u64,

    /// Most-recent items pulled into the candidate pool
    #[serde(default = "default_candidate_window")]
    pub candidate_window: usize,

    /// Minimum quality score for the showcase feed
    #[serde(default = "default_showcase_min_quality")]
    pub showcase_min_quality: f64,

    #[serde(default = "default_showcase_limit")]
    pub showcase_limit: usize,

    #[serde(default = "default_previews_limit")]
    pub previews_limit: usize,

    #[serde(default = "default_free_for_all_limit")]
    pub free_for_all_limit: usize,

    /// Items younger than this get the relevance recency bonus
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: i64,
}

/// Feed sizes and windows used by the ranker
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub candidate_window: usize,
    pub showcase_min_quality: f64,
    pub showcase_limit: usize,
    pub previews_limit: usize,
    pub free_for_all_limit: usize,
    pub recent_window_hours: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            candidate_window: default_candidate_window(),
            showcase_min_quality: default_showcase_min_quality(),
            showcase_limit: default_showcase_limit(),
            previews_limit: default_previews_limit(),
            free_for_all_limit: default_free_for_all_limit(),
            recent_window_hours: default_recent_window_hours(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_analysis_cache_ttl_secs() -> u64 {
    604800 // 1 week
}

fn default_candidate_window() -> usize {
    100
}

fn default_showcase_min_quality() -> f64 {
    70.0
}

fn default_showcase_limit() -> usize {
    10
}

fn default_previews_limit() -> usize {
    5
}

fn default_free_for_all_limit() -> usize {
    50
}

fn default_recent_window_hours() -> i64 {
    168
}

/// Largest recency window accepted, ten years
pub const MAX_RECENT_WINDOW_HOURS: i64 = 24 * 365 * 10;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the ranker cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0..=MAX_RECENT_WINDOW_HOURS).contains(&self.recent_window_hours) {
            anyhow::bail!(
                "RECENT_WINDOW_HOURS must be between 0 and {}, got {}",
                MAX_RECENT_WINDOW_HOURS,
                self.recent_window_hours
            );
        }
        Ok(())
    }

    /// Ranking parameters for the feed ranker
    pub fn ranking(&self) -> RankingConfig {
        RankingConfig {
            candidate_window: self.candidate_window,
            showcase_min_quality: self.showcase_min_quality,
            showcase_limit: self.showcase_limit,
            previews_limit: self.previews_limit,
            free_for_all_limit: self.free_for_all_limit,
            recent_window_hours: self.recent_window_hours,
        }
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
