// src/config/oracle.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "ORACLE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/oracle.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("ORACLE_CONFIG_PATH points to non-existent path {0:?}")]
    MissingFile(PathBuf),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("no sources configured")]
    NoSources,
    #[error("per-source limit must be at least 1")]
    ZeroLimit,
}

/// Upstream listing client settings, handed to `RedditClient::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".into(),
            user_agent: "QuantOracle/1.0".into(),
            timeout_secs: 10,
        }
    }
}

/// Bounds of the simulated chain lookup latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: 50,
            max_ms: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".into(),
        }
    }
}

/// Everything one batch run (and the dashboard) needs. Resolved before the
/// pipeline starts and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub sources: Vec<String>,
    pub limit: usize,
    pub enable_sentiment: bool,
    pub enable_chain: bool,
    pub db_path: PathBuf,
    /// `None` skips the CSV export.
    pub csv_path: Option<PathBuf>,
    /// Prometheus textfile written at the end of a run.
    pub metrics_path: Option<PathBuf>,
    pub chain_delay: DelayConfig,
    pub reddit: RedditConfig,
    pub dashboard: DashboardConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            sources: vec!["quant".into(), "ethereum".into(), "python".into()],
            limit: 10,
            enable_sentiment: false,
            enable_chain: false,
            db_path: PathBuf::from("oracle_data.db"),
            csv_path: Some(PathBuf::from("oracle_feed.csv")),
            metrics_path: None,
            chain_delay: DelayConfig::default(),
            reddit: RedditConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

impl OracleConfig {
    /// Parse a TOML file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the run configuration:
    /// 1) $ORACLE_CONFIG_PATH (must exist)
    /// 2) config/oracle.toml
    /// 3) built-in defaults
    ///
    /// then environment overrides, then validation.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingFile(pb));
            }
            Self::load_from(&pb)?
        } else {
            let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                Self::load_from(&fallback)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ORACLE_SUBS") {
            self.sources = v.split(',').map(str::to_string).collect();
        }
        if let Some(v) = lookup("ORACLE_LIMIT") {
            self.limit = parse_num("ORACLE_LIMIT", &v)?;
        }
        if let Some(v) = lookup("ORACLE_SENTIMENT") {
            self.enable_sentiment = parse_flag("ORACLE_SENTIMENT", &v)?;
        }
        if let Some(v) = lookup("ORACLE_CHAIN") {
            self.enable_chain = parse_flag("ORACLE_CHAIN", &v)?;
        }
        if let Some(v) = lookup("ORACLE_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ORACLE_CSV_PATH") {
            // Empty disables the export.
            self.csv_path = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = lookup("ORACLE_METRICS_PATH") {
            self.metrics_path = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = lookup("REDDIT_BASE_URL") {
            self.reddit.base_url = v;
        }
        if let Some(v) = lookup("REDDIT_USER_AGENT") {
            self.reddit.user_agent = v;
        }
        if let Some(v) = lookup("REDDIT_TIMEOUT_SECS") {
            self.reddit.timeout_secs = parse_num("REDDIT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DASHBOARD_ADDR") {
            self.dashboard.bind_addr = v;
        }
        Ok(())
    }

    /// Trim and dedup sources (first occurrence wins), check limits.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        self.sources = std::mem::take(&mut self.sources)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.to_ascii_lowercase()))
            .collect();
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.chain_delay.min_ms > self.chain_delay.max_ms {
            std::mem::swap(&mut self.chain_delay.min_ms, &mut self.chain_delay.max_ms);
        }
        if self.reddit.timeout_secs == 0 {
            self.reddit.timeout_secs = RedditConfig::default().timeout_secs;
        }
        Ok(())
    }
}

fn non_empty(v: String) -> Option<String> {
    let t = v.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn parse_flag(var: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: v.to_string(),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(var: &'static str, v: &str) -> Result<T, ConfigError> {
    v.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: v.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: OracleConfig = toml::from_str(
            r#"
sources = ["ethereum"]
enable_sentiment = true

[reddit]
user_agent = "test-agent"
"#,
        )
        .unwrap();
        assert_eq!(cfg.sources, vec!["ethereum".to_string()]);
        assert!(cfg.enable_sentiment);
        assert!(!cfg.enable_chain);
        assert_eq!(cfg.limit, 10);
        assert_eq!(cfg.reddit.user_agent, "test-agent");
        assert_eq!(cfg.reddit.base_url, "https://www.reddit.com");
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut cfg = OracleConfig::default();
        cfg.apply_env(env_of(&[
            ("ORACLE_SUBS", "quant, ethereum,,Quant,python "),
            ("ORACLE_LIMIT", "25"),
            ("ORACLE_SENTIMENT", "yes"),
            ("ORACLE_CHAIN", "0"),
            ("ORACLE_CSV_PATH", ""),
        ]))
        .unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.sources, vec!["quant", "ethereum", "python"]);
        assert_eq!(cfg.limit, 25);
        assert!(cfg.enable_sentiment);
        assert!(!cfg.enable_chain);
        assert_eq!(cfg.csv_path, None);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut cfg = OracleConfig::default();
        let err = cfg
            .apply_env(env_of(&[("ORACLE_LIMIT", "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "ORACLE_LIMIT", .. }));

        let err = cfg
            .apply_env(env_of(&[("ORACLE_CHAIN", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "ORACLE_CHAIN", .. }));
    }

    #[test]
    fn validate_rejects_empty_sources_and_zero_limit() {
        let mut cfg = OracleConfig {
            sources: vec![" ".into(), "".into()],
            ..OracleConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::NoSources)));

        let mut cfg = OracleConfig {
            limit: 0,
            ..OracleConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroLimit)));
    }

    #[test]
    fn inverted_delay_range_is_swapped() {
        let mut cfg = OracleConfig {
            chain_delay: DelayConfig {
                min_ms: 200,
                max_ms: 20,
            },
            ..OracleConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.chain_delay, DelayConfig { min_ms: 20, max_ms: 200 });
    }
}
