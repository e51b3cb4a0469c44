//! Inventory entity - how many units of an item a user holds.
//!
//! Keyed by `(user_id, item_id)`. Rows whose quantity drops to zero are pruned,
//! so a missing row and a zero quantity mean the same thing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Owner's user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Catalog item id
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: String,
    /// Units held
    pub qty: i64,
}

/// Defines relationships between Inventory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
