//! Service facade used by the interaction layer.
//!
//! [`Economy`] bundles the connection, the shared catalog, the effect registry
//! and the per-user locks. Its entry points never return expected failures as
//! errors: [`Economy::purchase`] and [`Economy::use_item`] always produce a
//! reply with `success` and a message ready to show the player. Storage and
//! configuration problems are logged here and replaced with a generic message.

use crate::{
    config::{Catalog, ItemDefinition, Settings, database},
    core::{effects::EffectRegistry, items, ledger, locks::UserLocks, shop},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const PURCHASE_FAILED: &str = "Could not complete purchase. Please try again later.";
const USE_FAILED: &str = "Could not process item. Please try again later.";

/// Reply to a purchase command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReply {
    /// Whether the item was bought
    pub success: bool,
    /// Text for the player
    pub message: String,
    /// Balance after the purchase, or the current balance when it was too low
    pub balance_after: Option<i64>,
}

/// Reply to a use command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseReply {
    /// Whether every unit was used
    pub success: bool,
    /// Text for the player, one line per unit on success
    pub message: String,
}

/// The economy service
#[derive(Debug)]
pub struct Economy {
    db: DatabaseConnection,
    catalog: Arc<Catalog>,
    effects: EffectRegistry,
    locks: UserLocks,
}

/// Turns a failure into player-facing text, logging anything unexpected.
fn failure_message(err: &Error, generic: &str) -> String {
    if err.is_user_facing() {
        debug!("Rejected: {err}");
        err.to_string()
    } else if err.is_storage() {
        error!("Storage failure: {err}");
        generic.to_string()
    } else {
        warn!("Configuration failure: {err}");
        generic.to_string()
    }
}

impl Economy {
    /// Wires a service from parts. The tables must already exist.
    #[must_use]
    pub fn new(db: DatabaseConnection, catalog: Arc<Catalog>, effects: EffectRegistry) -> Self {
        Self {
            db,
            catalog,
            effects,
            locks: UserLocks::new(),
        }
    }

    /// Connects to the configured database, ensures the tables and loads the catalog.
    #[instrument(skip(settings))]
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let catalog = Catalog::load(&settings.catalog_path)
            .inspect_err(|e| error!("Failed to load catalog: {e}"))?;
        let db = database::create_connection(&settings.database_url).await?;
        database::create_tables(&db)
            .await
            .inspect_err(|e| error!("Failed to create tables: {e}"))?;
        info!("Economy ready");
        Ok(Self::new(
            db,
            Arc::new(catalog),
            EffectRegistry::with_defaults(),
        ))
    }

    /// Shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Underlying connection.
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Buys one unit of an item for the caller.
    #[instrument(skip(self))]
    pub async fn purchase(&self, user_id: &str, username: &str, item_query: &str) -> PurchaseReply {
        let _guard = self.locks.lock(user_id).await;

        let result = async {
            ledger::ensure_user(&self.db, user_id, username).await?;
            shop::purchase(&self.db, &self.catalog, user_id, item_query).await
        }
        .await;

        match result {
            Ok(purchase) => PurchaseReply {
                success: true,
                message: format!(
                    "You bought {} for {} coins. You now own {} and have {} coins left.",
                    purchase.item.label(),
                    purchase.item.cost,
                    purchase.owned_after,
                    purchase.balance_after
                ),
                balance_after: Some(purchase.balance_after),
            },
            Err(err) => PurchaseReply {
                success: false,
                message: failure_message(&err, PURCHASE_FAILED),
                balance_after: match err {
                    Error::InsufficientFunds { balance, .. } => Some(balance),
                    _ => None,
                },
            },
        }
    }

    /// Uses `quantity` units of an item (clamped to `1..=25`).
    #[instrument(skip(self))]
    pub async fn use_item(
        &self,
        user_id: &str,
        username: &str,
        item_query: &str,
        quantity: i64,
    ) -> UseReply {
        let _guard = self.locks.lock(user_id).await;

        let result = async {
            ledger::ensure_user(&self.db, user_id, username).await?;
            items::use_item(
                &self.db,
                &self.catalog,
                &self.effects,
                user_id,
                item_query,
                quantity,
            )
            .await
        }
        .await;

        match result {
            Ok(used) => UseReply {
                success: true,
                message: used.messages.join("\n"),
            },
            Err(err) => UseReply {
                success: false,
                message: failure_message(&err, USE_FAILED),
            },
        }
    }

    /// Current balance, creating the account on first sighting.
    pub async fn balance(&self, user_id: &str, username: &str) -> Result<i64> {
        Ok(ledger::ensure_user(&self.db, user_id, username).await?.coins)
    }

    /// Adds coins to an account (operator top-ups, rewards from other features).
    #[instrument(skip(self))]
    pub async fn grant_coins(&self, user_id: &str, username: &str, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(Error::InvalidAmount { amount });
        }
        let _guard = self.locks.lock(user_id).await;
        ledger::ensure_user(&self.db, user_id, username).await?;
        ledger::add_coins(&self.db, user_id, amount).await
    }

    /// Items the user holds, in item id order, resolved against the catalog.
    ///
    /// Stacks whose item is no longer in the catalog are skipped.
    pub async fn inventory(&self, user_id: &str) -> Result<Vec<(ItemDefinition, i64)>> {
        let entries = ledger::list_inventory(&self.db, user_id).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let item = self.catalog.item(&entry.item_id);
                if item.is_none() {
                    warn!(item = %entry.item_id, "Inventory holds an item missing from the catalog");
                }
                item.map(|item| (item.clone(), entry.qty))
            })
            .collect())
    }

    /// Items listed on one shop page.
    #[must_use]
    pub fn shop_page(&self, page: u32) -> Vec<ItemDefinition> {
        self.catalog
            .items_on_page(page)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    async fn setup_economy() -> Result<Economy> {
        let db = setup_test_db().await?;
        Ok(Economy::new(
            db,
            Arc::new(test_catalog()),
            EffectRegistry::with_defaults(),
        ))
    }

    #[tokio::test]
    async fn test_buy_scenario() -> Result<()> {
        let economy = setup_economy().await?;
        economy.grant_coins("u1", "alice", 100).await?;

        let reply = economy.purchase("u1", "alice", "sword").await;
        assert!(reply.success);
        assert_eq!(reply.balance_after, Some(40));

        let reply = economy.purchase("u1", "alice", "sword").await;
        assert!(!reply.success);
        assert!(reply.message.contains("Insufficient"));
        assert_eq!(reply.balance_after, Some(40));

        assert_eq!(economy.balance("u1", "alice").await?, 40);
        let inventory = economy.inventory("u1").await?;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].0.id, "sword");
        assert_eq!(inventory[0].1, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_buy_then_open_chest() -> Result<()> {
        let economy = setup_economy().await?;
        economy.grant_coins("u1", "alice", 250).await?;

        assert!(economy.purchase("u1", "alice", "gem_chest").await.success);
        assert!(economy.purchase("u1", "alice", "GC").await.success);

        let reply = economy.use_item("u1", "alice", "gem_chest", 5).await;
        assert!(!reply.success);
        assert!(reply.message.contains("only have 2x"));

        let reply = economy.use_item("u1", "alice", "gem_chest", 2).await;
        assert!(reply.success);
        assert_eq!(reply.message.lines().count(), 2);
        assert!(reply.message.contains("1x 💎 Gem"));

        let inventory = economy.inventory("u1").await?;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].0.id, "gem");
        assert_eq!(inventory[0].1, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_username_refreshed_on_sighting() -> Result<()> {
        let economy = setup_economy().await?;
        economy.balance("u1", "alice").await?;
        economy.purchase("u1", "Alice B.", "cookie").await;

        let account = ledger::get_user(economy.database(), "u1").await?.unwrap();
        assert_eq!(account.username, "Alice B.");
        assert_eq!(account.coins, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic() -> Result<()> {
        let economy = setup_economy().await?;
        economy.grant_coins("u1", "alice", 100).await?;
        economy
            .database()
            .execute_unprepared("DROP TABLE inventory")
            .await?;

        let reply = economy.purchase("u1", "alice", "sword").await;
        assert!(!reply.success);
        assert_eq!(reply.message, PURCHASE_FAILED);
        assert_eq!(reply.balance_after, None);
        assert_eq!(economy.balance("u1", "alice").await?, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_grant_coins_rejects_non_positive() -> Result<()> {
        let economy = setup_economy().await?;
        let err = economy.grant_coins("u1", "alice", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { amount: 0 }));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_same_user() -> Result<()> {
        let economy = Arc::new(setup_economy().await?);
        economy.grant_coins("u1", "alice", 100).await?;

        let mut handles = Vec::new();
        for _ in 0..5 {
            let economy = Arc::clone(&economy);
            handles.push(tokio::spawn(async move {
                economy.purchase("u1", "alice", "sword").await
            }));
        }

        let mut bought = 0;
        for handle in handles {
            if handle.await.unwrap().success {
                bought += 1;
            }
        }

        assert_eq!(bought, 1);
        assert_eq!(economy.balance("u1", "alice").await?, 40);
        let inventory = economy.inventory("u1").await?;
        assert_eq!(inventory[0].1, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_shop_page() -> Result<()> {
        let economy = setup_economy().await?;
        let ids: Vec<String> = economy.shop_page(2).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["gem_chest", "lucky_chest", "empty_chest"]);
        assert!(economy.shop_page(9).is_empty());
        Ok(())
    }
}
