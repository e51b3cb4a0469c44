//! Ledger store - coin balances and inventory quantities.
//!
//! Every function is generic over `ConnectionTrait`, so the same call works on a
//! plain connection or inside a [`crate::core::transaction::TransactionScope`].
//! Balance and quantity changes are single conditional `UPDATE` statements
//! (`coins = coins - n WHERE coins >= n`), which makes the check and the write
//! one atomic step in the storage engine instead of a read followed by a write.

use crate::{
    entities::{Inventory, User, inventory, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{debug, instrument};

/// Result of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debit {
    /// Whether the coins were taken
    pub success: bool,
    /// Balance after the attempt (unchanged when `success` is false)
    pub balance_after: i64,
}

/// Creates the account if it is missing and refreshes its display name.
///
/// New accounts start at zero coins. Existing balances are never touched.
#[instrument(skip(db))]
pub async fn ensure_user<C>(db: &C, user_id: &str, username: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();
    let account = user::ActiveModel {
        id: Set(user_id.to_string()),
        username: Set(username.to_string()),
        coins: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };

    User::insert(account)
        .on_conflict(
            OnConflict::column(user::Column::Id)
                .update_columns([user::Column::Username, user::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

/// Fetches an account, `None` if the user has never been seen.
pub async fn get_user<C>(db: &C, user_id: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Current balance; unknown users have zero coins.
pub async fn get_balance<C>(db: &C, user_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(get_user(db, user_id).await?.map_or(0, |u| u.coins))
}

async fn require_balance<C>(db: &C, user_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    get_user(db, user_id)
        .await?
        .map(|u| u.coins)
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

/// Adds `delta` coins and returns the new balance.
///
/// A negative delta is applied only if it leaves the balance non-negative,
/// otherwise `InsufficientFunds` is returned and nothing changes.
#[instrument(skip(db))]
pub async fn add_coins<C>(db: &C, user_id: &str, delta: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let mut update = User::update_many()
        .col_expr(user::Column::Coins, Expr::col(user::Column::Coins).add(delta))
        .col_expr(
            user::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(user::Column::Id.eq(user_id));
    if delta < 0 {
        update = update.filter(user::Column::Coins.gte(delta.saturating_neg()));
    }

    let result = update.exec(db).await?;
    let balance = require_balance(db, user_id).await?;
    if result.rows_affected == 0 {
        return Err(Error::InsufficientFunds {
            balance,
            cost: delta.saturating_neg(),
        });
    }

    debug!(balance, "Coins adjusted");
    Ok(balance)
}

/// Takes `amount` coins only if the balance covers it.
///
/// `amount` may be 0 (free items); a negative amount is `InvalidAmount`.
///
/// The comparison and the write are the same statement, so two concurrent
/// debits can never both pass against a stale balance.
#[instrument(skip(db))]
pub async fn try_subtract_coins<C>(db: &C, user_id: &str, amount: i64) -> Result<Debit>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let result = User::update_many()
        .col_expr(user::Column::Coins, Expr::col(user::Column::Coins).sub(amount))
        .col_expr(
            user::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Coins.gte(amount))
        .exec(db)
        .await?;

    let balance_after = require_balance(db, user_id).await?;
    let success = result.rows_affected == 1;
    debug!(success, balance_after, "Debit attempted");
    Ok(Debit {
        success,
        balance_after,
    })
}

/// Units of `item_id` the user holds; zero when there is no row.
pub async fn get_item_quantity<C>(db: &C, user_id: &str, item_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(
        Inventory::find_by_id((user_id.to_string(), item_id.to_string()))
            .one(db)
            .await?
            .map_or(0, |entry| entry.qty),
    )
}

/// Grants `qty` units, creating the row or adding to it.
#[instrument(skip(db))]
pub async fn add_to_inventory<C>(db: &C, user_id: &str, item_id: &str, qty: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if qty < 1 {
        return Err(Error::InvalidAmount { amount: qty });
    }

    let entry = inventory::ActiveModel {
        user_id: Set(user_id.to_string()),
        item_id: Set(item_id.to_string()),
        qty: Set(qty),
    };

    Inventory::insert(entry)
        .on_conflict(
            OnConflict::columns([inventory::Column::UserId, inventory::Column::ItemId])
                .value(
                    inventory::Column::Qty,
                    Expr::col((Inventory, inventory::Column::Qty)).add(qty),
                )
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Removes `qty` units if the user holds at least that many.
///
/// Returns `false` (and changes nothing) when they hold fewer. Rows that reach
/// zero are deleted.
#[instrument(skip(db))]
pub async fn remove_from_inventory<C>(
    db: &C,
    user_id: &str,
    item_id: &str,
    qty: i64,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if qty < 1 {
        return Err(Error::InvalidAmount { amount: qty });
    }

    let result = Inventory::update_many()
        .col_expr(
            inventory::Column::Qty,
            Expr::col(inventory::Column::Qty).sub(qty),
        )
        .filter(inventory::Column::UserId.eq(user_id))
        .filter(inventory::Column::ItemId.eq(item_id))
        .filter(inventory::Column::Qty.gte(qty))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Ok(false);
    }

    Inventory::delete_many()
        .filter(inventory::Column::UserId.eq(user_id))
        .filter(inventory::Column::ItemId.eq(item_id))
        .filter(inventory::Column::Qty.lte(0))
        .exec(db)
        .await?;

    Ok(true)
}

/// Everything the user holds, ordered by item id.
pub async fn list_inventory<C>(db: &C, user_id: &str) -> Result<Vec<inventory::Model>>
where
    C: ConnectionTrait,
{
    Inventory::find()
        .filter(inventory::Column::UserId.eq(user_id))
        .filter(inventory::Column::Qty.gt(0))
        .order_by_asc(inventory::Column::ItemId)
        .all(db)
        .await
        .map_err(Into::into)
}
