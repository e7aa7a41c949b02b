//! Configuration loading.
//!
//! The default configuration file is `oxidized-rules.toml` in the current
//! working directory. Use [`Config::load`] to read it:
//!
//! ```rust,no_run
//! use oxidized_rules::config::Config;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert_eq!(config.limits.description_max_chars, 120);
//! ```

use crate::error::ConfigError;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "oxidized-rules.toml";

/// Main configuration for a check run.
///
/// All fields carry defaults so the config file can be omitted entirely.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// When strict mode is enabled, every document must follow the full
    /// `<rule>` schema.
    pub strict: StrictConfig,
    /// Numeric thresholds used by individual rules.
    pub limits: LimitsConfig,
    /// Which files a directory walk picks up.
    pub discovery: DiscoveryConfig,
    /// Per-rule toggles.
    pub rules: RulesConfig,
}

/// Strict-mode configuration.
///
/// In strict mode free-form documents are errors rather than skipped, and
/// example blocks must carry both demonstrations with their `conditions` and
/// `expected-result` attributes.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct StrictConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Descriptions longer than this (in characters) get a warning.
    pub description_max_chars: usize,
    /// Requirement descriptions with more sentences than this are flagged as
    /// possibly compound.
    pub requirement_max_sentences: usize,
}

/// File discovery settings.
///
/// # Examples
///
/// ```toml
/// [discovery]
/// extensions = ["mdc"]
/// exclude = ["drafts/**", "**/CHANGELOG.md"]
/// ```
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// File extensions (without the dot, case-insensitive) checked during a
    /// directory walk. Paths given explicitly are always checked.
    pub extensions: Vec<String>,
    /// Glob patterns, matched against the path relative to the walked root.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule IDs whose findings are dropped (e.g. `"structure/compound-requirement"`).
    pub disabled: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            description_max_chars: 120,
            requirement_max_sentences: 2,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            extensions: vec!["md".to_string(), "mdc".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try `oxidized-rules.toml` in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// Extensions are normalized to lowercase and exclude patterns are
    /// compiled once here so a bad pattern fails the run up front.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the explicit path does not exist, the
    /// file cannot be read, the TOML fails to parse, or an exclude pattern is
    /// not a valid glob.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        let Some(path) = config_path else {
            return Ok(Config::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.normalize();
        config.exclude_patterns()?;
        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn normalize(&mut self) {
        for ext in &mut self.discovery.extensions {
            *ext = ext.trim_start_matches('.').to_lowercase();
        }
    }

    /// Compiles [`DiscoveryConfig::exclude`] into glob patterns.
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>, ConfigError> {
        self.discovery
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|source| ConfigError::ExcludePattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Returns `true` unless the rule is listed in [`RulesConfig::disabled`].
    ///
    /// # Examples
    ///
    /// ```
    /// use oxidized_rules::config::Config;
    ///
    /// let mut config = Config::default();
    /// config.rules.disabled.push("structure/compound-requirement".into());
    /// assert!(!config.is_rule_enabled("structure/compound-requirement"));
    /// assert!(config.is_rule_enabled("frontmatter/unknown-key"));
    /// ```
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self.rules.disabled.iter().any(|r| r == rule_id)
    }

    pub fn is_strict(&self) -> bool {
        self.strict.enabled
    }
}
