//! Item and chest catalog loading from catalog.toml
//!
//! The catalog is static reference data: it is parsed and validated once at
//! startup, then shared read-only (behind an `Arc`) with everything that needs
//! to look items up. Nothing mutates it at runtime.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Effect name that marks an item as a chest
pub const CHEST_EFFECT: &str = "chest";

/// Raw structure of catalog.toml
#[derive(Debug, Deserialize, Default)]
pub struct CatalogConfig {
    /// Shop items
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
    /// Chest reward pools
    #[serde(default)]
    pub chests: Vec<ChestDefinition>,
}

/// A single item the shop knows about
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ItemDefinition {
    /// Stable item id, used as the inventory key
    pub id: String,
    /// Display name
    pub name: String,
    /// Glyph shown next to the name
    #[serde(default)]
    pub emoji: String,
    /// Price in coins
    pub cost: i64,
    /// Shop page the item is listed on
    #[serde(default = "default_page")]
    pub page: u32,
    /// Effect triggered by using the item (e.g. `"chest"`)
    #[serde(default)]
    pub effect: Option<String>,
    /// Alternative names, matched case-insensitively
    #[serde(default)]
    pub aliases: Vec<String>,
}

const fn default_page() -> u32 {
    1
}

impl ItemDefinition {
    /// `emoji name`, or just the name when no glyph is set.
    #[must_use]
    pub fn label(&self) -> String {
        if self.emoji.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.emoji, self.name)
        }
    }
}

/// Reward pool for one chest item
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChestDefinition {
    /// Matches the id of an item whose effect is `"chest"`
    pub id: String,
    /// Possible drops, rolled in order
    #[serde(default)]
    pub pool: Vec<PoolEntry>,
}

/// One weighted possible drop
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PoolEntry {
    /// Item granted when this entry hits
    #[serde(rename = "itemid", alias = "item_id")]
    pub item_id: String,
    /// Fraction in [0, 1], or a percentage when above 1
    #[serde(default)]
    pub weight: Option<f64>,
    /// Lower bound of the granted amount (defaults to 1)
    #[serde(default)]
    pub min_amt: Option<f64>,
    /// Upper bound of the granted amount (defaults to `min_amt`)
    #[serde(default)]
    pub max_amt: Option<f64>,
}

/// Validated, indexed catalog
#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<ItemDefinition>,
    by_id: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    chests: HashMap<String, ChestDefinition>,
}

fn config_error(message: String) -> Error {
    Error::Config { message }
}

impl Catalog {
    /// Validates a parsed config and builds the lookup indexes.
    ///
    /// # Errors
    /// Returns `Error::Config` if:
    /// - two items share an id, or an alias collides with another item
    /// - an item has a negative cost, or a pool entry a negative weight
    /// - a chest has no matching `"chest"` item, or a `"chest"` item has no chest
    /// - a pool entry refers to an unknown item
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let mut by_id = HashMap::new();
        for (index, item) in config.items.iter().enumerate() {
            if item.cost < 0 {
                return Err(config_error(format!(
                    "Item '{}' has a negative cost ({})",
                    item.id, item.cost
                )));
            }
            if by_id.insert(item.id.clone(), index).is_some() {
                return Err(config_error(format!("Duplicate item id '{}'", item.id)));
            }
        }

        let mut by_alias = HashMap::new();
        for (index, item) in config.items.iter().enumerate() {
            for alias in &item.aliases {
                let key = alias.to_lowercase();
                let shadows_id = config
                    .items
                    .iter()
                    .enumerate()
                    .any(|(owner, other)| owner != index && other.id.to_lowercase() == key);
                let taken = by_alias.insert(key, index).is_some_and(|owner| owner != index);
                if shadows_id || taken {
                    return Err(config_error(format!(
                        "Alias '{alias}' of item '{}' is already in use",
                        item.id
                    )));
                }
            }
        }

        let mut chests = HashMap::new();
        for chest in config.chests {
            let Some(&index) = by_id.get(&chest.id) else {
                return Err(config_error(format!(
                    "Chest '{}' has no matching item",
                    chest.id
                )));
            };
            if config.items[index].effect.as_deref() != Some(CHEST_EFFECT) {
                return Err(config_error(format!(
                    "Chest '{}' matches an item without the chest effect",
                    chest.id
                )));
            }
            if let Some(entry) = chest.pool.iter().find(|e| !by_id.contains_key(&e.item_id)) {
                return Err(config_error(format!(
                    "Chest '{}' drops unknown item '{}'",
                    chest.id, entry.item_id
                )));
            }
            if let Some(entry) = chest.pool.iter().find(|e| e.weight.is_some_and(|w| w < 0.0)) {
                return Err(config_error(format!(
                    "Chest '{}' gives '{}' a negative weight",
                    chest.id, entry.item_id
                )));
            }
            if chests.contains_key(&chest.id) {
                return Err(config_error(format!("Duplicate chest id '{}'", chest.id)));
            }
            chests.insert(chest.id.clone(), chest);
        }

        if let Some(orphan) = config
            .items
            .iter()
            .find(|i| i.effect.as_deref() == Some(CHEST_EFFECT) && !chests.contains_key(&i.id))
        {
            return Err(config_error(format!(
                "Item '{}' is a chest but has no chest definition",
                orphan.id
            )));
        }

        Ok(Self {
            items: config.items,
            by_id,
            by_alias,
            chests,
        })
    }

    /// Parses and validates catalog TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(contents)
            .map_err(|e| config_error(format!("Failed to parse catalog: {e}")))?;
        Self::from_config(config)
    }

    /// Loads the catalog from a TOML file.
    ///
    /// # Errors
    /// `Error::Io` if the file can't be read, `Error::Config` if it is invalid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading catalog from {}", path.display());
        let contents = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::error!("Failed to read catalog file {}: {e}", path.display());
        })?;
        let catalog = Self::from_toml_str(&contents)?;
        tracing::info!(
            items = catalog.items.len(),
            chests = catalog.chests.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Looks an item up by its exact id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDefinition> {
        self.by_id.get(id).map(|&index| &self.items[index])
    }

    /// Resolves what a user typed: exact id first, then a case-insensitive alias.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<&ItemDefinition> {
        let query = query.trim();
        self.item(query).or_else(|| {
            self.by_alias
                .get(&query.to_lowercase())
                .map(|&index| &self.items[index])
        })
    }

    /// Chest definition for a chest item id.
    #[must_use]
    pub fn chest(&self, id: &str) -> Option<&ChestDefinition> {
        self.chests.get(id)
    }

    /// All items in declaration order.
    #[must_use]
    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    /// Distinct shop pages, ascending.
    #[must_use]
    pub fn pages(&self) -> Vec<u32> {
        self.items
            .iter()
            .map(|i| i.page)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Items listed on one shop page, in declaration order.
    #[must_use]
    pub fn items_on_page(&self, page: u32) -> Vec<&ItemDefinition> {
        self.items.iter().filter(|i| i.page == page).collect()
    }
}
