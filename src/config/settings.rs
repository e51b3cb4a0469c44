//! Settings module for values read from the environment.
//!
//! `.env` is loaded first if present; variables set in the real environment win.
//! Discord credentials are not handled here, they belong to the interaction layer.

/// Default `SQLite` database URL, created on first connect
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/economy.sqlite?mode=rwc";

/// Default catalog location relative to the working directory
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Runtime settings for the economy core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SeaORM connection URL
    pub database_url: String,
    /// Path to the TOML item/chest catalog
    pub catalog_path: String,
}

impl Settings {
    /// Loads `.env` (non-fatal if missing) and reads `DATABASE_URL` and `CATALOG_PATH`.
    #[must_use]
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_ok() {
            tracing::debug!("Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            catalog_path: non_empty("CATALOG_PATH")
                .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.catalog_path, DEFAULT_CATALOG_PATH);
    }

    #[test]
    fn test_values_override_defaults() {
        let vars: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite::memory:"),
            ("CATALOG_PATH", "/etc/bot/catalog.toml"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|key| vars.get(key).map(ToString::to_string));
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.catalog_path, "/etc/bot/catalog.toml");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let settings = Settings::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
    }
}
