//! Entity module - Contains all SeaORM entity definitions for the database.
//! The ledger is two tables: user accounts and per-(user, item) inventory.

pub mod inventory;
pub mod user;

// Re-export specific types to avoid conflicts
pub use inventory::{Column as InventoryColumn, Entity as Inventory, Model as InventoryModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
