//! Shop purchase flow.
//!
//! A purchase debits the item's cost and credits one unit in the same
//! transaction scope, so either both happen or neither does.

use crate::{
    config::{Catalog, ItemDefinition},
    core::{ledger, transaction::TransactionScope},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// A completed purchase
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    /// What was bought
    pub item: ItemDefinition,
    /// Coins left afterwards
    pub balance_after: i64,
    /// Units of the item now owned
    pub owned_after: i64,
}

/// Buys one unit of the item matching `item_query` for `user_id`.
///
/// The account must already exist.
///
/// # Errors
/// - `ItemNotFound` if no id or alias matches
/// - `InsufficientFunds` (carrying the current balance) if the user can't afford it
/// - `Database` on storage failure; the debit is rolled back
#[instrument(skip(db, catalog))]
pub async fn purchase(
    db: &DatabaseConnection,
    catalog: &Catalog,
    user_id: &str,
    item_query: &str,
) -> Result<Purchase> {
    let item = catalog
        .resolve(item_query)
        .ok_or_else(|| Error::ItemNotFound {
            query: item_query.to_string(),
        })?;

    let scope = TransactionScope::begin(db, "purchase").await?;
    let outcome: Result<Purchase> = async {
        let debit = ledger::try_subtract_coins(scope.conn(), user_id, item.cost).await?;
        if !debit.success {
            return Err(Error::InsufficientFunds {
                balance: debit.balance_after,
                cost: item.cost,
            });
        }
        ledger::add_to_inventory(scope.conn(), user_id, &item.id, 1).await?;
        let owned_after = ledger::get_item_quantity(scope.conn(), user_id, &item.id).await?;
        Ok(Purchase {
            item: item.clone(),
            balance_after: debit.balance_after,
            owned_after,
        })
    }
    .await;
    let purchase = scope.finish(outcome).await?;

    info!(
        item = %purchase.item.id,
        cost = purchase.item.cost,
        balance_after = purchase.balance_after,
        "Purchase completed"
    );
    Ok(purchase)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_purchase_then_insufficient() -> Result<()> {
        let db = setup_user_with_coins("u1", 100).await?;
        let catalog = test_catalog();

        let bought = purchase(&db, &catalog, "u1", "sword").await?;
        assert_eq!(bought.balance_after, 40);
        assert_eq!(bought.owned_after, 1);
        assert_eq!(ledger::get_item_quantity(&db, "u1", "sword").await?, 1);

        let err = purchase(&db, &catalog, "u1", "sword").await.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                balance: 40,
                cost: 60
            }
        ));
        assert_eq!(ledger::get_balance(&db, "u1").await?, 40);
        assert_eq!(ledger::get_item_quantity(&db, "u1", "sword").await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_by_alias() -> Result<()> {
        let db = setup_user_with_coins("u1", 10).await?;
        let catalog = test_catalog();

        let bought = purchase(&db, &catalog, "u1", "BISCUIT").await?;
        assert_eq!(bought.item.id, "cookie");
        assert_eq!(bought.balance_after, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_unknown_item() -> Result<()> {
        let db = setup_user_with_coins("u1", 10).await?;
        let err = purchase(&db, &test_catalog(), "u1", "unicorn")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ItemNotFound { query } if query == "unicorn"));
        assert_eq!(ledger::get_balance(&db, "u1").await?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_credit_undoes_debit() -> Result<()> {
        let db = setup_user_with_coins("u1", 100).await?;
        let catalog = test_catalog();

        // Credit step now fails with a storage error after the debit succeeded
        db.execute_unprepared("DROP TABLE inventory").await?;

        let err = purchase(&db, &catalog, "u1", "sword").await.unwrap_err();
        assert!(err.is_storage());
        assert_eq!(ledger::get_balance(&db, "u1").await?, 100);
        Ok(())
    }
}
