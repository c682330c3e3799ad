//! AirTable connection settings.
//!
//! Values are layered with figment: built-in defaults, then an optional TOML
//! file, then `AIRTABLE_`-prefixed environment variables
//! (`AIRTABLE_BASE_ID`, `AIRTABLE_API_KEY`, ...).

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ItemError;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_TABLE: &str = "Items";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirTableConfig {
    /// API root, without the base id.
    pub api_url: String,
    pub base_id: String,
    pub api_key: String,
    /// Table holding the item records.
    pub table: String,
    pub timeout_secs: u64,
}

/// Defaults for every optional key. `base_id` and `api_key` have none.
#[derive(Serialize)]
struct Defaults {
    api_url: &'static str,
    table: &'static str,
    timeout_secs: u64,
}

impl AirTableConfig {
    pub fn new(base_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_id: base_id.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Load from defaults, `file` (if given and present) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ItemError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Defaults {
            api_url: DEFAULT_API_URL,
            table: DEFAULT_TABLE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }));

        if let Some(path) = file {
            if !path.exists() {
                return Err(ItemError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.merge(Env::prefixed("AIRTABLE_")).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Base URL every table path is appended to.
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.base_id.trim_matches('/')
        )
    }

    fn validate(&self) -> Result<(), ItemError> {
        if self.base_id.trim().is_empty() {
            return Err(ItemError::Config("base_id must not be empty".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ItemError::Config("api_key must not be empty".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(ItemError::Config("table must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_fills_required_keys_and_defaults_apply() {
        Jail::expect_with(|jail| {
            jail.set_env("AIRTABLE_BASE_ID", "appTest");
            jail.set_env("AIRTABLE_API_KEY", "keyTest");

            let config = AirTableConfig::load(None).expect("config loads");
            assert_eq!(config.base_id, "appTest");
            assert_eq!(config.api_key, "keyTest");
            assert_eq!(config.api_url, DEFAULT_API_URL);
            assert_eq!(config.table, DEFAULT_TABLE);
            assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "items.toml",
                r#"
                    base_id = "appFile"
                    api_key = "keyFile"
                    table = "Contacts"
                "#,
            )?;
            jail.set_env("AIRTABLE_TABLE", "People");

            let config = AirTableConfig::load(Some(Path::new("items.toml"))).expect("config loads");
            assert_eq!(config.base_id, "appFile");
            assert_eq!(config.table, "People");
            Ok(())
        });
    }

    #[test]
    fn missing_api_key_is_config_error() {
        Jail::expect_with(|jail| {
            jail.set_env("AIRTABLE_BASE_ID", "appTest");
            let err = AirTableConfig::load(None).unwrap_err();
            assert!(matches!(err, ItemError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_config_error() {
        Jail::expect_with(|_| {
            let err = AirTableConfig::load(Some(Path::new("absent.toml"))).unwrap_err();
            assert!(matches!(err, ItemError::Config(msg) if msg.contains("absent.toml")));
            Ok(())
        });
    }

    #[test]
    fn base_url_joins_without_double_slash() {
        let config = AirTableConfig::new("appX", "key").with_api_url("http://localhost:3000/");
        assert_eq!(config.base_url(), "http://localhost:3000/appX");
    }
}
