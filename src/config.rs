use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub data_store: DataStoreConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataProvider {
    Supabase,
    Snapshot,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataStoreConfig {
    pub provider: DataProvider,
    /// Supabase project URL; `SUPABASE_URL` wins when set.
    pub url: Option<String>,
    /// JSON export used by the snapshot provider.
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_store_timeout")]
    pub request_timeout_ms: u64,
}

fn default_store_timeout() -> u64 { 5000 }

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Strategy service base URL; `STRATEGY_API_URL` wins when set.
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_predict_timeout")]
    pub predict_timeout_ms: u64,
    #[serde(default = "default_simulate_timeout")]
    pub simulate_timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_predict_timeout() -> u64 { 5000 }
fn default_simulate_timeout() -> u64 { 10000 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            predict_timeout_ms: default_predict_timeout(),
            simulate_timeout_ms: default_simulate_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn predict_timeout(&self) -> Duration {
        Duration::from_millis(self.predict_timeout_ms)
    }

    pub fn simulate_timeout(&self) -> Duration {
        Duration::from_millis(self.simulate_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldGoalMode {
    /// Good from `auto_make_loc` or closer, always.
    #[default]
    Threshold,
    /// Drawn against the stored make probability for the spot.
    Probabilistic,
}

/// Tunable football constants.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    pub extra_point_success: f64,
    pub two_point_success: f64,
    pub defense_weight: f64,
    /// Score differentials (scorer's view, before the try) that make an
    /// automated coach go for two.
    pub two_point_score_diffs: Vec<i32>,
    /// Go-for-two only applies with this many ticks or fewer left.
    pub two_point_max_time: i32,
    pub field_goal_mode: FieldGoalMode,
    /// Attempts from farther out are refused.
    pub field_goal_max_loc: i32,
    pub field_goal_auto_make_loc: i32,
    /// Missed kicks are spotted this many yards behind the line.
    pub field_goal_miss_offset: i32,
    /// Nearest kickoff return spot; spots run through `+ kickoff_spots - 1`.
    pub kickoff_min_loc: i32,
    pub kickoff_spots: i32,
    pub interception_touchback_loc: i32,
    /// Punt touchbacks, on the kicking team's scale before mirroring.
    pub punt_touchback_loc: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            extra_point_success: 0.945,
            two_point_success: 0.45,
            defense_weight: 0.3,
            two_point_score_diffs: vec![5, 1, -5, -9, -18],
            two_point_max_time: 30,
            field_goal_mode: FieldGoalMode::Threshold,
            field_goal_max_loc: 50,
            field_goal_auto_make_loc: 35,
            field_goal_miss_offset: 7,
            kickoff_min_loc: 66,
            kickoff_spots: 11,
            interception_touchback_loc: 80,
            punt_touchback_loc: 20,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }

    pub fn supabase_url(&self) -> Result<String> {
        match std::env::var("SUPABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(sanitize_key(&url)),
            _ => self
                .data_store
                .url
                .clone()
                .context("SUPABASE_URL is not set and data_store.url is missing"),
        }
    }

    pub fn supabase_key() -> Result<String> {
        match std::env::var("SUPABASE_KEY") {
            Ok(key) if !key.is_empty() => Ok(sanitize_key(&key)),
            _ => anyhow::bail!("SUPABASE_KEY is not set (environment or .env)"),
        }
    }

    pub fn backend_url(&self) -> String {
        match std::env::var("STRATEGY_API_URL") {
            Ok(url) if !url.is_empty() => sanitize_key(&url),
            _ => self.backend.base_url.clone(),
        }
    }
}

/// Strip carriage returns, BOM, and other invisible chars from a key/URL value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
