//! Item use dispatch.
//!
//! Validation runs in a fixed order and each step can short-circuit the rest:
//! resolve the item, clamp the quantity, check ownership, find the effect
//! handler, run the handler once per unit. Only after every run succeeds does a
//! single scope grant all rewards and remove the used units together. Any
//! failure leaves the ledger exactly as it was.

use crate::{
    config::{Catalog, ItemDefinition},
    core::{
        effects::{EffectContext, EffectOutcome, EffectRegistry},
        ledger,
        transaction::TransactionScope,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Most units one use command may consume
pub const MAX_USE_QUANTITY: i64 = 25;

/// A completed item use
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUse {
    /// What was used
    pub item: ItemDefinition,
    /// Units consumed, after clamping
    pub quantity: i64,
    /// One result line per unit
    pub messages: Vec<String>,
}

/// Clamps a requested use quantity into `1..=MAX_USE_QUANTITY`.
#[must_use]
pub fn clamp_quantity(requested: i64) -> i64 {
    requested.clamp(1, MAX_USE_QUANTITY)
}

/// Uses `requested` units of the item matching `item_query`.
///
/// # Errors
/// - `ItemNotFound` if no id or alias matches
/// - `NoneOwned` / `InsufficientItems` if the user holds too few
/// - `NoEffect` if the item's effect has no registered handler
/// - any handler error (`ChestNotFound`, `EmptyRewardPool`, ...)
/// - `Database` on storage failure, after rolling the scope back
#[instrument(skip(db, catalog, effects))]
pub async fn use_item(
    db: &DatabaseConnection,
    catalog: &Catalog,
    effects: &EffectRegistry,
    user_id: &str,
    item_query: &str,
    requested: i64,
) -> Result<ItemUse> {
    let item = catalog
        .resolve(item_query)
        .ok_or_else(|| Error::ItemNotFound {
            query: item_query.to_string(),
        })?;
    let quantity = clamp_quantity(requested);

    let owned = ledger::get_item_quantity(db, user_id, &item.id).await?;
    if owned == 0 {
        return Err(Error::NoneOwned { item: item.label() });
    }
    if owned < quantity {
        return Err(Error::InsufficientItems {
            item: item.label(),
            owned,
            requested: quantity,
        });
    }

    let handler = item
        .effect
        .as_deref()
        .and_then(|name| effects.get(name))
        .ok_or_else(|| Error::NoEffect {
            item: item.label(),
            effect: item.effect.clone(),
        })?;

    let outcomes: Vec<EffectOutcome> = {
        let ctx = EffectContext { item, catalog };
        let mut rng = rand::rng();
        (0..quantity)
            .map(|_| handler.apply(&ctx, &mut rng))
            .collect::<Result<_>>()?
    };

    let scope = TransactionScope::begin(db, "use_item").await?;
    let applied: Result<()> = async {
        for grant in outcomes.iter().flat_map(|o| &o.grants) {
            ledger::add_to_inventory(scope.conn(), user_id, &grant.item_id, grant.quantity)
                .await?;
        }
        if !ledger::remove_from_inventory(scope.conn(), user_id, &item.id, quantity).await? {
            let owned = ledger::get_item_quantity(scope.conn(), user_id, &item.id).await?;
            return Err(Error::InsufficientItems {
                item: item.label(),
                owned,
                requested: quantity,
            });
        }
        Ok(())
    }
    .await;
    scope.finish(applied).await?;

    info!(item = %item.id, quantity, "Item used");
    Ok(ItemUse {
        item: item.clone(),
        quantity,
        messages: outcomes.into_iter().map(|o| o.message).collect(),
    })
}
