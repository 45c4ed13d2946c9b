//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/recipe-tree/recipe-tree.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `RECIPE_TREE__*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::domain::{
    LayoutEngine, LayoutParams, PrimitiveSet, TreeBuilder, DEFAULT_ICON_EXTENSION,
    DEFAULT_PRIMITIVES,
};

const ENV_PREFIX: &str = "RECIPE_TREE";

/// Default playback cadence in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Layout spacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Horizontal pixels per width unit
    pub unit_width: f64,
    /// Vertical pixels between depth levels
    pub vertical_gap: f64,
    /// Width of a leaf, in units
    pub leaf_width: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        let params = LayoutParams::default();
        Self {
            unit_width: params.unit_width,
            vertical_gap: params.vertical_gap,
            leaf_width: params.leaf_width,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Time between two revealed snapshots
    pub delay_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ItemSettings {
    /// Items that are never derived
    pub primitives: Vec<String>,
    /// Extension of generated icon file names
    pub icon_extension: String,
}

impl Default for ItemSettings {
    fn default() -> Self {
        Self {
            primitives: DEFAULT_PRIMITIVES.iter().map(|p| p.to_string()).collect(),
            icon_extension: DEFAULT_ICON_EXTENSION.to_string(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutSettings {
    pub unit_width: Option<f64>,
    pub vertical_gap: Option<f64>,
    pub leaf_width: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPlaybackSettings {
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawItemSettings {
    pub primitives: Option<Vec<String>>,
    pub icon_extension: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub layout: RawLayoutSettings,
    pub playback: RawPlaybackSettings,
    pub items: RawItemSettings,
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are appended to base, keeping base order
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Comparison ignores ASCII case; the first spelling wins
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(base.len() + overlay.len());
    for item in base {
        if !result.iter().any(|r| r.eq_ignore_ascii_case(item)) {
            result.push(item.clone());
        }
    }
    for pattern in overlay {
        if let Some(negated) = pattern.strip_prefix('!') {
            result.retain(|r| !r.eq_ignore_ascii_case(negated));
        } else if !result.iter().any(|r| r.eq_ignore_ascii_case(pattern)) {
            result.push(pattern.clone());
        }
    }
    result
}

/// Unified configuration for recipe-tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutSettings,
    pub playback: PlaybackSettings,
    pub items: ItemSettings,
}

/// Get the XDG config directory for recipe-tree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "recipe-tree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("recipe-tree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            layout: self.layout.overlay(&global.layout),
            playback: PlaybackSettings {
                delay_ms: global.playback.delay_ms.unwrap_or(self.playback.delay_ms),
            },
            items: ItemSettings {
                primitives: global
                    .items
                    .primitives
                    .clone()
                    .unwrap_or_else(|| self.items.primitives.clone()),
                icon_extension: global
                    .items
                    .icon_extension
                    .clone()
                    .unwrap_or_else(|| self.items.icon_extension.clone()),
            },
        }
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            layout: self.layout.overlay(&overlay.layout),
            playback: PlaybackSettings {
                delay_ms: overlay.playback.delay_ms.unwrap_or(self.playback.delay_ms),
            },
            items: ItemSettings {
                primitives: overlay
                    .items
                    .primitives
                    .as_ref()
                    .map(|o| merge_array(&self.items.primitives, o))
                    .unwrap_or_else(|| self.items.primitives.clone()),
                icon_extension: overlay
                    .items
                    .icon_extension
                    .clone()
                    .unwrap_or_else(|| self.items.icon_extension.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with `!item` negation
    /// - Any → Env vars: REPLACE
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let settings = Self::load_layers(global.as_deref(), local)?;
        settings.apply_env_overrides(Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults, then `global` if given, then `local` if given. No env vars.
    ///
    /// A missing `local` file is an error: it was asked for explicitly.
    #[instrument(level = "debug")]
    pub fn load_layers(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global {
            let raw = load_raw_settings(global_path)?;
            current = current.apply_global(&raw);
            debug!(path = %global_path.display(), "applied global config");
        }

        if let Some(local_path) = local {
            let raw = load_raw_settings(local_path)?;
            current = current.merge_with(&raw);
            debug!(path = %local_path.display(), "merged local config");
        }

        current.validate()?;
        Ok(current)
    }

    /// Apply `RECIPE_TREE__*` variables read from `env` as explicit overrides.
    ///
    /// `RECIPE_TREE__ITEMS__PRIMITIVES` is a comma separated list.
    pub fn apply_env_overrides(mut self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                env.separator("__")
                    .list_separator(",")
                    .with_list_parse_key("items.primitives")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_float("layout.unit_width") {
            self.layout.unit_width = val;
        }
        if let Ok(val) = config.get_float("layout.vertical_gap") {
            self.layout.vertical_gap = val;
        }
        if let Ok(val) = config.get_float("layout.leaf_width") {
            self.layout.leaf_width = val;
        }
        if let Ok(val) = config.get_int("playback.delay_ms") {
            self.playback.delay_ms = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("playback.delay_ms must not be negative, got {val}"),
            })?;
        }
        if let Ok(val) = config.get::<Vec<String>>("items.primitives") {
            self.items.primitives = val;
        }
        if let Ok(val) = config.get_string("items.icon_extension") {
            self.items.icon_extension = val;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let positive = [
            ("layout.unit_width", self.layout.unit_width),
            ("layout.vertical_gap", self.layout.vertical_gap),
            ("layout.leaf_width", self.layout.leaf_width),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ApplicationError::Config {
                    message: format!("{key} must be a positive number, got {value}"),
                });
            }
        }
        if self.playback.delay_ms == 0 {
            return Err(ApplicationError::Config {
                message: "playback.delay_ms must be greater than zero".into(),
            });
        }
        if self.items.icon_extension.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "items.icon_extension must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            unit_width: self.layout.unit_width,
            vertical_gap: self.layout.vertical_gap,
            leaf_width: self.layout.leaf_width,
        }
    }

    pub fn primitive_set(&self) -> PrimitiveSet {
        PrimitiveSet::new(self.items.primitives.iter().cloned())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.playback.delay_ms)
    }

    pub fn tree_builder(&self) -> TreeBuilder {
        TreeBuilder::new(self.primitive_set(), self.items.icon_extension.clone())
    }

    pub fn layout_engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.layout_params(), self.primitive_set())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# recipe-tree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/recipe-tree/recipe-tree.toml  (defines your baseline)
#   Local:  file given with --config                (per-run additions)
#   Env:    RECIPE_TREE__<SECTION>__<KEY> variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!Name" in local config to REMOVE an inherited item:
#     primitives = ["Time", "!Air"]  # adds Time, removes Air

[layout]
# Horizontal pixels per width unit
# unit_width = 120.0

# Vertical pixels between two depth levels
# vertical_gap = 200.0

# Width of a leaf, in units
# leaf_width = 1.5

[playback]
# Milliseconds between two search steps
# delay_ms = 1000

[items]
# Items that are never derived (matched case-insensitively)
# primitives = ["Water", "Fire", "Earth", "Air"]

# Extension of generated icon file names (<lowercase name>.<extension>)
# icon_extension = "png"
"#
        .to_string()
    }
}

impl LayoutSettings {
    fn overlay(&self, raw: &RawLayoutSettings) -> Self {
        Self {
            unit_width: raw.unit_width.unwrap_or(self.unit_width),
            vertical_gap: raw.vertical_gap.unwrap_or(self.vertical_gap),
            leaf_width: raw.leaf_width.unwrap_or(self.leaf_width),
        }
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn given_no_config_when_loading_layers_then_uses_defaults() {
        let settings = Settings::load_layers(None, None).expect("load defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.layout.unit_width, 120.0);
        assert_eq!(settings.playback.delay_ms, 1000);
        assert_eq!(settings.items.primitives, strings(&["Water", "Fire", "Earth", "Air"]));
    }

    #[test]
    fn test_merge_array_union() {
        let result = merge_array(&strings(&["a", "b"]), &strings(&["c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_array_negation() {
        let result = merge_array(&strings(&["a", "b"]), &strings(&["!a", "c"]));
        assert_eq!(result, strings(&["b", "c"]));
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let result = merge_array(&strings(&["a", "b"]), &strings(&["!x"]));
        assert_eq!(result, strings(&["a", "b"]));
    }

    #[test]
    fn test_merge_array_duplicates_ignore_case() {
        let result = merge_array(&strings(&["Water", "Fire"]), &strings(&["water", "Time"]));
        assert_eq!(result, strings(&["Water", "Fire", "Time"]));
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let global = RawSettings {
            items: RawItemSettings {
                primitives: Some(strings(&["Time"])),
                icon_extension: None,
            },
            ..Default::default()
        };
        let result = Settings::default().apply_global(&global);
        assert_eq!(result.items.primitives, strings(&["Time"]));
        assert_eq!(result.items.icon_extension, "png");
    }

    #[test]
    fn test_merge_with_unions_arrays_and_overrides_scalars() {
        let local = RawSettings {
            layout: RawLayoutSettings {
                unit_width: Some(60.0),
                ..Default::default()
            },
            items: RawItemSettings {
                primitives: Some(strings(&["Time", "!Air"])),
                icon_extension: Some("svg".into()),
            },
            ..Default::default()
        };
        let result = Settings::default().merge_with(&local);
        assert_eq!(result.layout.unit_width, 60.0);
        assert_eq!(result.layout.vertical_gap, 200.0);
        assert_eq!(result.items.primitives, strings(&["Water", "Fire", "Earth", "Time"]));
        assert_eq!(result.items.icon_extension, "svg");
    }

    #[test]
    fn given_env_vars_when_applying_overrides_then_replace_values() {
        let settings = Settings::default()
            .apply_env_overrides(env(&[
                ("RECIPE_TREE__PLAYBACK__DELAY_MS", "250"),
                ("RECIPE_TREE__LAYOUT__UNIT_WIDTH", "80"),
                ("RECIPE_TREE__ITEMS__PRIMITIVES", "Water,Fire"),
            ]))
            .expect("apply env");
        assert_eq!(settings.playback.delay_ms, 250);
        assert_eq!(settings.layout.unit_width, 80.0);
        assert_eq!(settings.items.primitives, strings(&["Water", "Fire"]));
    }

    #[test]
    fn given_zero_delay_in_env_when_applying_overrides_then_rejected() {
        let result = Settings::default().apply_env_overrides(env(&[("RECIPE_TREE__PLAYBACK__DELAY_MS", "0")]));
        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_non_positive_width_when_validating_then_rejected() {
        let mut settings = Settings::default();
        settings.layout.leaf_width = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_settings_when_serialized_then_template_keys_round_trip() {
        let toml = Settings::default().to_toml().expect("serialize");
        assert!(toml.contains("[layout]"));
        assert!(toml.contains("delay_ms = 1000"));
        let template: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(template.items.primitives.is_none());
    }
}
