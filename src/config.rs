use std::env;
use std::str::FromStr;

/// Scoring knobs for setlist generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Score every candidate starts from
    pub base_score: f64,
    /// Points lost per unit of distance from the target energy
    pub energy_weight: f64,
    /// Penalty for a third high-intensity vocal in a row
    pub fatigue_penalty: f64,
    /// Vocal intensity at or above which a song counts as demanding
    pub high_vocal_threshold: u8,
    /// Multiplier applied to freshness before it is added to the score
    pub freshness_bonus_ratio: f64,
    /// Upper bound on the freshness bonus
    pub freshness_bonus_cap: f64,
    /// Freshness days deducted per recorded play
    pub play_count_weight: u32,
    /// Upper bound on the play-count deduction
    pub play_count_penalty_cap: u32,
    /// Number of best-scoring candidates the random pick chooses between
    pub top_k: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_score: 100.0,
            energy_weight: 10.0,
            fatigue_penalty: 30.0,
            high_vocal_threshold: 4,
            freshness_bonus_ratio: 0.2,
            freshness_bonus_cap: 20.0,
            play_count_weight: 2,
            play_count_penalty_cap: 30,
            top_k: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub generation: GenerationConfig,
    /// Fixed seed for reproducible generation runs
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = GenerationConfig::default();

        let top_k = parse_var("SETLIST_TOP_K")?.unwrap_or(defaults.top_k);
        if top_k == 0 {
            return Err(anyhow::anyhow!("SETLIST_TOP_K must be at least 1"));
        }

        let high_vocal_threshold =
            parse_var("SETLIST_HIGH_VOCAL_THRESHOLD")?.unwrap_or(defaults.high_vocal_threshold);
        if !(1..=5).contains(&high_vocal_threshold) {
            return Err(anyhow::anyhow!(
                "SETLIST_HIGH_VOCAL_THRESHOLD must be between 1 and 5, got {}",
                high_vocal_threshold
            ));
        }

        let generation = GenerationConfig {
            top_k,
            high_vocal_threshold,
            fatigue_penalty: parse_var("SETLIST_FATIGUE_PENALTY")?
                .unwrap_or(defaults.fatigue_penalty),
            energy_weight: parse_var("SETLIST_ENERGY_WEIGHT")?.unwrap_or(defaults.energy_weight),
            ..defaults
        };

        Ok(Config {
            generation,
            seed: parse_var("SETLIST_SEED")?,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>, anyhow::Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", name, raw, e)),
        Err(_) => Ok(None),
    }
}
