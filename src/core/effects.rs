//! Item effects - what happens when an item is used.
//!
//! An item's `effect` name is looked up in an [`EffectRegistry`]. Each handler
//! implements [`ItemEffect`] and only *computes* its outcome (rewards to grant
//! plus a reply line); the caller applies the grants to the ledger inside a
//! transaction scope. New effects are added by registering another handler.

use crate::{
    config::{Catalog, ItemDefinition, catalog::CHEST_EFFECT},
    core::loot::{self, Reward},
    errors::{Error, Result},
};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;

/// Inputs available to an effect handler
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    /// The item being used
    pub item: &'a ItemDefinition,
    /// Read-only catalog for further lookups
    pub catalog: &'a Catalog,
}

/// What one use of an item produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectOutcome {
    /// Items to credit to the user
    pub grants: Vec<Reward>,
    /// Human-readable result line
    pub message: String,
}

/// A named item effect
pub trait ItemEffect: Send + Sync {
    /// Name items refer to in their `effect` field.
    fn name(&self) -> &'static str;

    /// Computes the outcome of using one unit.
    fn apply(&self, ctx: &EffectContext<'_>, rng: &mut dyn RngCore) -> Result<EffectOutcome>;
}

/// Effect-name to handler table
#[derive(Clone, Default)]
pub struct EffectRegistry {
    handlers: HashMap<String, Arc<dyn ItemEffect>>,
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("EffectRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl EffectRegistry {
    /// Registry with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in effect.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ChestEffect);
        registry
    }

    /// Adds a handler, replacing any previous one with the same name.
    pub fn register<E: ItemEffect + 'static>(&mut self, effect: E) {
        self.handlers
            .insert(effect.name().to_string(), Arc::new(effect));
    }

    /// Handler for an effect name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ItemEffect>> {
        self.handlers.get(name).map(Arc::clone)
    }
}

/// Opens a chest: rolls its pool and grants whatever comes out
#[derive(Debug, Clone, Copy, Default)]
pub struct ChestEffect;

impl ItemEffect for ChestEffect {
    fn name(&self) -> &'static str {
        CHEST_EFFECT
    }

    fn apply(&self, ctx: &EffectContext<'_>, rng: &mut dyn RngCore) -> Result<EffectOutcome> {
        let chest = ctx.catalog.chest(&ctx.item.id).ok_or_else(|| Error::ChestNotFound {
            chest: ctx.item.id.clone(),
        })?;
        let rewards = loot::roll_chest(chest, rng)?;

        let contents = rewards
            .iter()
            .map(|reward| {
                let label = ctx
                    .catalog
                    .item(&reward.item_id)
                    .map_or_else(|| reward.item_id.clone(), ItemDefinition::label);
                format!("{}x {label}", reward.quantity)
            })
            .collect::<Vec<_>>()
            .join(", ");

        Ok(EffectOutcome {
            message: format!("Opened {} and found {contents}", ctx.item.label()),
            grants: rewards,
        })
    }
}
