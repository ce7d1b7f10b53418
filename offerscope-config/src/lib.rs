//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every section is optional)
//! 2. YAML files / inline snippets added with [`OffersConfigLoader::with_file`],
//!    [`OffersConfigLoader::with_optional_file`] or [`OffersConfigLoader::with_yaml_str`]
//! 3. `OFFERSCOPE__SECTION__KEY` environment variables
//!
//! After merging, string values are run through `${VAR}` expansion (bounded
//! depth) before the typed [`OffersConfig`] is materialised.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_CONFIG_FILE: &str = "offerscope.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OffersConfig {
    pub board: BoardConfig,
    pub scrape: ScrapeConfig,
    pub normalization: NormalizationConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Where the job board lives and which portal cells serve listing/detail pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub base_url: String,
    pub listing_cell: String,
    pub detail_cell: String,
    pub timeout_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://isa.epfl.ch/imoniteur_ISAP/".into(),
            listing_cell: "308197177".into(),
            detail_cell: "2742535167".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Cap on concurrent detail fetches; unset means every offer at once.
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationModeConfig {
    /// `clean-salaries` + `clean-locations`, authenticated with `X-API-Key`.
    #[default]
    Split,
    /// Single `format_offers` call carrying the user's email.
    Combined,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub mode: NormalizationModeConfig,
    pub api_base: String,
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub timeout_secs: u64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            mode: NormalizationModeConfig::Split,
            api_base: "http://localhost:8000/".into(),
            api_key: None,
            email: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON offer store; defaults to `<data dir>/offers.json` when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatConfig {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormatConfig,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormatConfig::Text,
            emit_stderr: false,
            filter: "info".into(),
            dir: None,
        }
    }
}

/// Expand `$VAR` / `${VAR}` in every string of the merged tree.
fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => *s = expand_str(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Re-expand until the string stops changing; cycles stop at the depth cap.
/// Unknown variables are left in place.
fn expand_str(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let Ok(next) = shellexpand::env(&current) else {
            break;
        };
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    current
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct OffersConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for OffersConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl OffersConfigLoader {
    /// Start with defaults; `OFFERSCOPE__*` env overrides are applied at load time.
    ///
    /// ```
    /// use offerscope_config::OffersConfigLoader;
    ///
    /// let config = OffersConfigLoader::new()
    ///     .with_yaml_str("scrape:\n  max_in_flight: 4")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.scrape.max_in_flight, Some(4));
    /// assert_eq!(config.board.listing_cell, "308197177");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "OFFERSCOPE".into(),
        }
    }

    /// Use another env prefix (tests use this to stay isolated).
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use offerscope_config::{NormalizationModeConfig, OffersConfigLoader};
    ///
    /// let cfg = OffersConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// normalization:
    ///   mode: combined
    ///   api_base: "https://normalizer.example.com/"
    ///   email: "student@epfl.ch"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.normalization.mode, NormalizationModeConfig::Combined);
    /// assert_eq!(cfg.normalization.email.as_deref(), Some("student@epfl.ch"));
    /// assert_eq!(cfg.normalization.timeout_secs, 60);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use offerscope_config::OffersConfigLoader;
    ///
    /// unsafe { std::env::set_var("NORMALIZER_KEY", "injected-from-env"); }
    ///
    /// let config = OffersConfigLoader::new()
    ///     .with_yaml_str("normalization:\n  api_key: \"${NORMALIZER_KEY}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.normalization.api_key.as_deref(), Some("injected-from-env"));
    ///
    /// unsafe { std::env::remove_var("NORMALIZER_KEY"); }
    /// ```
    pub fn load(self) -> Result<OffersConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: OffersConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_placeholders_inside_nested_sections() {
        temp_env::with_vars(
            [("OS_TEST_HOST", Some("normalizer.local")), ("OS_TEST_PORT", Some("8000"))],
            || {
                let mut v = json!({
                    "normalization": { "api_base": "http://${OS_TEST_HOST}:$OS_TEST_PORT/" },
                    "board": [ "${OS_TEST_HOST}", 30, false, null ]
                });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({
                        "normalization": { "api_base": "http://normalizer.local:8000/" },
                        "board": [ "normalizer.local", 30, false, null ]
                    })
                );
            },
        );
    }

    #[test]
    fn variables_pointing_at_variables_are_followed() {
        temp_env::with_vars(
            [
                ("OS_TEST_INNER", Some("secret")),
                ("OS_TEST_OUTER", Some("key-${OS_TEST_INNER}")),
            ],
            || assert_eq!(expand_str("${OS_TEST_OUTER}"), "key-secret"),
        );
    }

    #[test]
    fn self_referencing_variables_terminate() {
        temp_env::with_vars(
            [("OS_TEST_PING", Some("${OS_TEST_PONG}")), ("OS_TEST_PONG", Some("${OS_TEST_PING}"))],
            || {
                let out = expand_str("a-${OS_TEST_PING}-b");
                assert!(out.starts_with("a-") && out.ends_with("-b"));
                assert!(out.contains("${OS_TEST_P"));
            },
        );
    }

    #[test]
    fn unset_variables_stay_verbatim() {
        assert_eq!(expand_str("k-${OS_TEST_NEVER_SET}"), "k-${OS_TEST_NEVER_SET}");
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let cfg = OffersConfigLoader::new()
            .with_env_prefix("OFFERSCOPE_UNIT_EMPTY")
            .load()
            .unwrap();
        assert_eq!(cfg.board.base_url, "https://isa.epfl.ch/imoniteur_ISAP/");
        assert_eq!(cfg.board.detail_cell, "2742535167");
        assert_eq!(cfg.scrape.max_in_flight, None);
        assert_eq!(cfg.normalization.mode, NormalizationModeConfig::Split);
        assert_eq!(cfg.logging.filter, "info");
        assert!(cfg.store.path.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = OffersConfigLoader::new()
            .with_env_prefix("OFFERSCOPE_UNIT_MODE")
            .with_yaml_str("normalization:\n  mode: sideways")
            .load();
        assert!(err.is_err());
    }
}
