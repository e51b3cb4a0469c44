//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases, funded accounts and a small
//! catalog that exercises every item kind.

use crate::{
    config::{Catalog, database},
    core::ledger,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// In-memory database holding one account with `coins` coins.
///
/// The account's display name is `"tester"`.
pub async fn setup_user_with_coins(user_id: &str, coins: i64) -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    ledger::ensure_user(&db, user_id, "tester").await?;
    if coins > 0 {
        ledger::add_coins(&db, user_id, coins).await?;
    }
    Ok(db)
}

/// Catalog used across tests.
///
/// * `cookie` - 5 coins, no effect, alias "Biscuit"
/// * `sword` - 60 coins, no effect
/// * `gem` - 250 coins, aliases "Diamond", "gems"
/// * `gem_chest` - chest whose only entry is `gem` with weight 0 (always the fallback)
/// * `lucky_chest` - chest with a certain cookie drop and a rare gem
/// * `empty_chest` - chest with no pool entries
/// * `scroll` - declares an effect nothing implements
pub const TEST_CATALOG: &str = r#"
    [[items]]
    id = "cookie"
    name = "Cookie"
    emoji = "🍪"
    cost = 5
    aliases = ["Biscuit"]

    [[items]]
    id = "sword"
    name = "Sword"
    emoji = "🗡️"
    cost = 60

    [[items]]
    id = "gem"
    name = "Gem"
    emoji = "💎"
    cost = 250
    aliases = ["Diamond", "gems"]

    [[items]]
    id = "gem_chest"
    name = "Gem Chest"
    emoji = "🎁"
    cost = 100
    page = 2
    effect = "chest"
    aliases = ["gc"]

    [[items]]
    id = "lucky_chest"
    name = "Lucky Chest"
    emoji = "🍀"
    cost = 40
    page = 2
    effect = "chest"

    [[items]]
    id = "empty_chest"
    name = "Empty Chest"
    emoji = "🗃️"
    cost = 1
    page = 2
    effect = "chest"

    [[items]]
    id = "scroll"
    name = "Scroll"
    emoji = "📜"
    cost = 15
    page = 3
    effect = "teleport"

    [[chests]]
    id = "gem_chest"
    [[chests.pool]]
    itemid = "gem"
    weight = 0
    min_amt = 1
    max_amt = 1

    [[chests]]
    id = "lucky_chest"
    [[chests.pool]]
    itemid = "cookie"
    weight = 100
    min_amt = 2
    max_amt = 4
    [[chests.pool]]
    itemid = "gem"
    weight = 0.01

    [[chests]]
    id = "empty_chest"
"#;

/// Parses [`TEST_CATALOG`].
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_catalog() -> Catalog {
    Catalog::from_toml_str(TEST_CATALOG).expect("test catalog is valid")
}
