//! Transaction scope - all-or-nothing units of ledger work.
//!
//! A scope wraps one database transaction. Run the operations against
//! [`TransactionScope::conn`], then hand their combined result to
//! [`TransactionScope::finish`]: `Ok` commits, `Err` rolls everything back and
//! returns the original error. Dropping a scope without finishing it also rolls
//! back. Scopes are opened from a plain connection only, so they cannot nest.
//!
//! ```ignore
//! let scope = TransactionScope::begin(db, "purchase").await?;
//! let outcome = async {
//!     ledger::try_subtract_coins(scope.conn(), user_id, cost).await?;
//!     ledger::add_to_inventory(scope.conn(), user_id, item_id, 1).await
//! }
//! .await;
//! scope.finish(outcome).await?;
//! ```

use crate::errors::Result;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, error, warn};

/// An open, uncommitted unit of work
pub struct TransactionScope {
    txn: DatabaseTransaction,
    label: &'static str,
}

impl TransactionScope {
    /// Opens a new scope. `label` names the operation in logs.
    pub async fn begin(db: &DatabaseConnection, label: &'static str) -> Result<Self> {
        let txn = db.begin().await?;
        debug!(scope = label, "Transaction scope opened");
        Ok(Self { txn, label })
    }

    /// Connection to issue the scope's operations on.
    #[must_use]
    pub const fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits on `Ok`, rolls back on `Err`.
    ///
    /// A failed commit is returned as the error. A failed rollback is logged and
    /// the original error is returned, since the transaction is discarded either way.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        let label = self.label;
        match outcome {
            Ok(value) => {
                self.txn.commit().await.inspect_err(|e| {
                    error!(scope = label, "Commit failed: {e}");
                })?;
                debug!(scope = label, "Transaction scope committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.txn.rollback().await {
                    error!(scope = label, "Rollback failed: {rollback_err}");
                }
                warn!(scope = label, "Transaction scope rolled back: {e}");
                Err(e)
            }
        }
    }
}
