//! Error types shared by every layer of the economy.
//!
//! Variants fall into three groups: expected user-facing failures (reported back
//! to the player as-is), storage failures (logged, reported generically) and
//! configuration failures (a broken catalog entry, fatal only for the operation
//! that touched it).

use thiserror::Error;

/// Unified error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Any read/write failure against the ledger
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Invalid or unreadable configuration (settings or catalog)
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// I/O failure while reading configuration files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger has no account for this user
    #[error("No account found for user {user_id}")]
    UserNotFound {
        /// Platform user id
        user_id: String,
    },

    /// Neither an item id nor an alias matched
    #[error("Item '{query}' not found")]
    ItemNotFound {
        /// What the caller typed
        query: String,
    },

    /// The user owns zero units of the item
    #[error("You don't own any {item}")]
    NoneOwned {
        /// Item display name
        item: String,
    },

    /// The user owns some, but fewer than requested
    #[error("You only have {owned}x {item} but tried to use {requested}")]
    InsufficientItems {
        /// Item display name
        item: String,
        /// Units owned
        owned: i64,
        /// Units requested
        requested: i64,
    },

    /// Coin balance is below the cost
    #[error("Insufficient funds: you have {balance} coins but this costs {cost}")]
    InsufficientFunds {
        /// Balance at the time of the check
        balance: i64,
        /// Required amount
        cost: i64,
    },

    /// An item declares the chest effect but no chest definition exists
    #[error("No chest definition for '{chest}'")]
    ChestNotFound {
        /// Chest id
        chest: String,
    },

    /// The chest's reward pool has no entries
    #[error("Chest '{chest}' has an empty reward pool")]
    EmptyRewardPool {
        /// Chest id
        chest: String,
    },

    /// The item has no effect, or one without a registered handler
    #[error("{item} can't be used (no effect implemented)")]
    NoEffect {
        /// Item display name
        item: String,
        /// Declared effect name, if any
        effect: Option<String>,
    },

    /// Coin or quantity amount that must be positive was not
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: i64,
    },
}

impl Error {
    /// Whether this failure is an expected outcome that can be shown to the player verbatim.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound { .. }
                | Self::NoneOwned { .. }
                | Self::InsufficientItems { .. }
                | Self::InsufficientFunds { .. }
                | Self::EmptyRewardPool { .. }
                | Self::NoEffect { .. }
                | Self::InvalidAmount { .. }
        )
    }

    /// Whether this failure came from the storage layer.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert!(
            Error::InsufficientFunds {
                balance: 1,
                cost: 2
            }
            .is_user_facing()
        );
        assert!(Error::EmptyRewardPool { chest: "c".into() }.is_user_facing());
        assert!(!Error::ChestNotFound { chest: "c".into() }.is_user_facing());
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".into())).is_user_facing());
        assert!(Error::Database(sea_orm::DbErr::Custom("boom".into())).is_storage());
    }

    #[test]
    fn test_insufficient_funds_message_mentions_balance() {
        let err = Error::InsufficientFunds {
            balance: 40,
            cost: 60,
        };
        let text = err.to_string();
        assert!(text.contains("Insufficient"));
        assert!(text.contains("40"));
    }
}
