/// Item and chest catalog loading from catalog.toml
pub mod catalog;

/// Database connection and table creation
pub mod database;

/// Process settings read from the environment
pub mod settings;

pub use catalog::{Catalog, ChestDefinition, ItemDefinition, PoolEntry};
pub use settings::Settings;
