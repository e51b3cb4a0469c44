//! Reward roll engine for chests.
//!
//! A roll runs two phases over the pool:
//!
//! 1. Every entry gets an independent trial against its normalised probability.
//!    Each hit becomes a reward, so one roll can drop several items.
//! 2. If nothing hit, one consolation entry is picked by a cumulative walk over
//!    the raw weights. A roll therefore never comes back empty.
//!
//! Weights above 1 are read as percentages (`60` means `0.6`); the result is
//! clamped to `[0, 1]`. That rule is applied as-is, so `0.5` always means 50%
//! and never 0.5%.

use crate::{
    config::{ChestDefinition, PoolEntry},
    errors::{Error, Result},
};
use rand::Rng;

/// One granted item stack, produced by a roll and applied straight to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    /// Item to grant
    pub item_id: String,
    /// Units to grant, at least 1
    pub quantity: i64,
}

/// Raw weight used by the fallback walk; missing, non-finite or negative counts as 0.
fn raw_weight(entry: &PoolEntry) -> f64 {
    entry
        .weight
        .filter(|w| w.is_finite())
        .map_or(0.0, |w| w.max(0.0))
}

/// Chance of the entry hitting in the independent phase.
#[must_use]
pub fn hit_probability(entry: &PoolEntry) -> f64 {
    let weight = raw_weight(entry);
    let p = if weight > 1.0 { weight / 100.0 } else { weight };
    p.clamp(0.0, 1.0)
}

/// Inclusive amount range for an entry.
///
/// `min_amt` defaults to 1 and is never below 1. `max_amt` defaults to the
/// minimum when absent or non-finite, and collapses to it when smaller.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn amount_range(entry: &PoolEntry) -> (i64, i64) {
    let min = entry
        .min_amt
        .filter(|m| m.is_finite())
        .map_or(1, |m| m.floor() as i64)
        .max(1);
    let max = entry
        .max_amt
        .filter(|m| m.is_finite())
        .map_or(min, |m| m.floor() as i64)
        .max(min);
    (min, max)
}

fn draw_reward<R: Rng + ?Sized>(entry: &PoolEntry, rng: &mut R) -> Reward {
    let (min, max) = amount_range(entry);
    Reward {
        item_id: entry.item_id.clone(),
        quantity: rng.random_range(min..=max),
    }
}

/// Weighted consolation pick: first entry whose cumulative weight reaches the draw.
fn fallback_entry<'a, R: Rng + ?Sized>(pool: &'a [PoolEntry], rng: &mut R) -> &'a PoolEntry {
    let total: f64 = pool.iter().map(raw_weight).sum();
    let total = if total > 0.0 { total } else { 1.0 };
    let draw = rng.random::<f64>() * total;

    let mut cumulative = 0.0;
    for entry in pool {
        cumulative += raw_weight(entry);
        if draw <= cumulative {
            return entry;
        }
    }
    &pool[0]
}

/// Rolls a chest's pool, returning at least one reward.
///
/// # Errors
/// Returns `Error::EmptyRewardPool` if the pool has no entries.
pub fn roll_chest<R: Rng + ?Sized>(chest: &ChestDefinition, rng: &mut R) -> Result<Vec<Reward>> {
    if chest.pool.is_empty() {
        return Err(Error::EmptyRewardPool {
            chest: chest.id.clone(),
        });
    }

    let hits: Vec<&PoolEntry> = chest
        .pool
        .iter()
        .filter(|entry| rng.random::<f64>() < hit_probability(entry))
        .collect();
    let mut rewards: Vec<Reward> = hits
        .into_iter()
        .map(|entry| draw_reward(entry, rng))
        .collect();

    if rewards.is_empty() {
        let entry = fallback_entry(&chest.pool, rng);
        tracing::trace!(chest = %chest.id, item = %entry.item_id, "No hits, using fallback");
        rewards.push(draw_reward(entry, rng));
    }

    Ok(rewards)
}
