//! Configuration file support for StreamLine.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/streamline/config.toml`.
//! Every section is optional; missing values fall back to defaults.

use crate::catalog::{default_drink_styles, default_ice_types};
use crate::{Error, IceType, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub settings: Settings,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which user's records the CLI works on when none is given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
        }
    }
}

/// Business settings used when costing drinks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// ISO currency code shown next to amounts
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Sales tax as a fraction (0.25 = 25%); prices include it
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    /// Target cost of goods, in percent of the pre-tax price
    #[serde(default = "default_cog_goal")]
    pub cog_goal_percent: f64,

    #[serde(default = "default_ice")]
    pub ice_types: Vec<IceType>,

    #[serde(default = "default_styles")]
    pub drink_styles: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            tax_rate: default_tax_rate(),
            cog_goal_percent: default_cog_goal(),
            ice_types: default_ice(),
            drink_styles: default_styles(),
        }
    }
}

impl Settings {
    /// Check the settings and return a list of problems (empty when valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.currency.trim().is_empty() {
            errors.push("Currency code must not be empty".to_string());
        }
        if !(self.tax_rate >= 0.0 && self.tax_rate.is_finite()) {
            errors.push(format!("Tax rate {} must be zero or positive", self.tax_rate));
        }
        if !(0.0..=100.0).contains(&self.cog_goal_percent) {
            errors.push(format!(
                "CoG goal {}% must be between 0 and 100",
                self.cog_goal_percent
            ));
        }

        let mut names = HashSet::new();
        for ice in &self.ice_types {
            if !names.insert(ice.name.as_str()) {
                errors.push(format!("Ice type '{}' is listed twice", ice.name));
            }
            if !(ice.cost >= 0.0 && ice.cost.is_finite()) {
                errors.push(format!(
                    "Ice type '{}' cost {} must be zero or positive",
                    ice.name, ice.cost
                ));
            }
        }

        errors
    }

    /// Add an ice type or replace the cost of an existing one
    pub fn upsert_ice_type(&mut self, ice: IceType) {
        match self.ice_types.iter_mut().find(|i| i.name == ice.name) {
            Some(existing) => existing.cost = ice.cost,
            None => self.ice_types.push(ice),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("streamline")
}

fn default_user() -> String {
    "local".into()
}

fn default_currency() -> String {
    "SEK".into()
}

fn default_tax_rate() -> f64 {
    0.25
}

fn default_cog_goal() -> f64 {
    20.0
}

fn default_ice() -> Vec<IceType> {
    default_ice_types().to_vec()
}

fn default_styles() -> Vec<String> {
    default_drink_styles().to_vec()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path, rejecting invalid settings
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        let errors = config.settings.validate();
        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("streamline").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let errors = self.settings.validate();
        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.settings.currency, "SEK");
        assert_eq!(config.settings.tax_rate, 0.25);
        assert_eq!(config.settings.cog_goal_percent, 20.0);
        assert_eq!(config.user.default_user, "local");
        assert!(config.settings.validate().is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.settings, parsed.settings);
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[settings]
currency = "EUR"

[[settings.ice_types]]
name = "Sphere"
cost = 8.5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.settings.currency, "EUR");
        assert_eq!(config.settings.tax_rate, 0.25); // default
        assert_eq!(config.settings.ice_types, vec![IceType::new("Sphere", 8.5)]);
        assert_eq!(config.settings.drink_styles.len(), 4);
    }

    #[test]
    fn test_invalid_settings_rejected_on_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[settings]\ntax_rate = -0.1\ncog_goal_percent = 140\n").unwrap();

        match Config::load_from(&path) {
            Err(Error::Config(msg)) => {
                assert!(msg.contains("Tax rate"));
                assert!(msg.contains("CoG goal"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.settings.tax_rate = 0.12;
        config.settings.upsert_ice_type(IceType::new("Cubes", 2.5));
        config.settings.upsert_ice_type(IceType::new("Sphere", 9.0));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.settings.tax_rate, 0.12);
        assert_eq!(loaded.settings.ice_types.len(), 4);
        assert!(loaded
            .settings
            .ice_types
            .contains(&IceType::new("Cubes", 2.5)));
    }

    #[test]
    fn test_duplicate_ice_type_flagged() {
        let mut settings = Settings::default();
        settings.ice_types.push(IceType::new("Cubes", 1.0));
        let errors = settings.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("listed twice"));
    }
}
