//! User entity - one account per platform user.
//!
//! Accounts are created on first sighting with a zero balance and never deleted.
//! The display name is overwritten every time the user is seen.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Discord user id (opaque string)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Last seen display name
    pub username: String,
    /// Coin balance, never negative
    pub coins: i64,
    /// When the account was first seen
    pub created_at: DateTime,
    /// When the account row was last written
    pub updated_at: DateTime,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many inventory entries
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
