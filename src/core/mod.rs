//! Core business logic, independent of the Discord layer.

/// Item effect handlers and the effect registry
pub mod effects;
/// Item use dispatch
pub mod items;
/// Coin balance and inventory storage primitives
pub mod ledger;
/// Per-user critical sections
pub mod locks;
/// Chest reward rolls
pub mod loot;
/// Shop purchase flow
pub mod shop;
/// All-or-nothing transaction scopes
pub mod transaction;
