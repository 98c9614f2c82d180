//! Single-instrument order book.
//!
//! Keeps two views of the same resting order set in lockstep:
//! - an order index (order id → price, remaining size, side)
//! - one price ladder per side (price → aggregate size, order count)
//!
//! Every mutation updates both views before returning. Operations on
//! unknown orders or with zero size are silent no-ops: this is a replay
//! tool and a bad row must never abort the run.

use ahash::AHashMap;

use crate::error::{ReplayError, Result};
use crate::lob::order_index::OrderIndex;
use crate::lob::price_level::{Ladder, PriceLevel};
use crate::lob::snapshot::BookSnapshot;
use crate::price::Price;
use crate::types::{BookUpdate, MboEvent, Order, Side, MBP_LEVELS};

/// What to do when an add arrives for an order id that is still resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAddPolicy {
    /// Overwrite the index entry and bump the new level without reversing
    /// the old entry's ladder contribution (default). Reproduces reference
    /// output exactly; the old contribution is orphaned in its level.
    #[default]
    Overwrite,

    /// Reverse the old entry's contribution first, i.e. treat the add as a
    /// modify. Keeps aggregates consistent with the index.
    Replace,
}

/// Configuration for order book behavior.
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Number of visible price levels per side
    pub levels: usize,

    /// Handling of adds for ids that are still active
    pub duplicate_add_policy: DuplicateAddPolicy,

    /// Whether to log skipped operations
    pub log_warnings: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            levels: MBP_LEVELS,
            duplicate_add_policy: DuplicateAddPolicy::Overwrite,
            log_warnings: true,
        }
    }
}

impl BookConfig {
    /// Create a new config with the given number of visible levels.
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            ..Default::default()
        }
    }

    /// Set duplicate-add handling.
    pub fn with_duplicate_add_policy(mut self, policy: DuplicateAddPolicy) -> Self {
        self.duplicate_add_policy = policy;
        self
    }

    /// Enable/disable logging of skipped operations.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_warnings = log;
        self
    }
}

/// Counters for monitoring book activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BookStats {
    /// Adds that inserted an order
    pub adds: u64,

    /// Cancels that removed size
    pub cancels: u64,

    /// Modifies processed (including those for unknown ids)
    pub modifies: u64,

    /// Executions that consumed resting size
    pub executions: u64,

    /// Cancels skipped (unknown id or zero size)
    pub noop_cancels: u64,

    /// Adds skipped (zero size or no side)
    pub noop_adds: u64,

    /// Executions skipped (zero size, no side, or no level at the price)
    pub dropped_executions: u64,

    /// Adds that arrived for an id already resting
    pub duplicate_adds: u64,
}

/// Order book for one instrument.
#[derive(Debug, Clone)]
pub struct OrderBook {
    config: BookConfig,
    orders: OrderIndex,
    bids: Ladder,
    asks: Ladder,
    stats: BookStats,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Create an empty book with 10 visible levels.
    ///
    /// # Example
    /// ```
    /// use mbp10_reconstructor::OrderBook;
    ///
    /// let book = OrderBook::new();
    /// assert_eq!(book.levels(), 10);
    /// ```
    pub fn new() -> Self {
        Self::with_config(BookConfig::default())
    }

    /// Create an empty book with custom configuration.
    pub fn with_config(config: BookConfig) -> Self {
        Self {
            config,
            orders: OrderIndex::new(),
            bids: Ladder::new(Side::Bid),
            asks: Ladder::new(Side::Ask),
            stats: BookStats::default(),
        }
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.config.levels
    }

    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Apply an add, cancel or modify event. Every other action is a no-op
    /// here; executions go through [`OrderBook::execute_trade`].
    pub fn process(&mut self, event: &MboEvent) {
        match event.book_update() {
            update @ (BookUpdate::Add { .. }
            | BookUpdate::Cancel { .. }
            | BookUpdate::Modify { .. }) => self.apply(update),
            BookUpdate::Execute { .. } | BookUpdate::Ignore => {}
        }
    }

    /// Apply any book update, executions included.
    pub fn apply(&mut self, update: BookUpdate) {
        match update {
            BookUpdate::Add {
                order_id,
                side,
                price,
                size,
            } => {
                self.add(order_id, side, price, size);
            }
            BookUpdate::Cancel { order_id, size } => {
                self.cancel(order_id, size);
            }
            BookUpdate::Modify {
                order_id,
                side,
                price,
                size,
            } => {
                self.modify(order_id, side, price, size);
            }
            BookUpdate::Execute {
                price,
                size,
                aggressor,
            } => {
                self.execute_trade(price, size, aggressor);
            }
            BookUpdate::Ignore => {}
        }
    }

    /// Insert a new resting order. Returns `false` if skipped.
    pub fn add(&mut self, order_id: u64, side: Side, price: Price, size: u64) -> bool {
        if size == 0 || side == Side::None {
            self.stats.noop_adds += 1;
            if self.config.log_warnings {
                log::trace!("Skipping add for order {order_id}: size={size} side={side:?}");
            }
            return false;
        }

        if let Some(previous) = self.orders.lookup(order_id) {
            self.stats.duplicate_adds += 1;
            if self.config.log_warnings {
                log::debug!(
                    "Add for active order {order_id} (resting {} @ {}), policy={:?}",
                    previous.size,
                    previous.price,
                    self.config.duplicate_add_policy
                );
            }
            if self.config.duplicate_add_policy == DuplicateAddPolicy::Replace {
                self.withdraw(order_id, previous);
            }
        }

        self.orders.upsert(order_id, Order { side, price, size });
        if let Some(ladder) = self.ladder_mut(side) {
            ladder.bump(price, size, 1);
        }
        self.stats.adds += 1;
        true
    }

    /// Remove up to `cancel_size` from an order.
    ///
    /// The size is an amount to remove, clamped to what the order holds.
    /// The level's order count drops only when the order is fully
    /// extinguished. Returns the size actually removed.
    pub fn cancel(&mut self, order_id: u64, cancel_size: u64) -> u64 {
        let order = match self.orders.lookup(order_id) {
            Some(order) if cancel_size > 0 => order,
            _ => {
                self.stats.noop_cancels += 1;
                if self.config.log_warnings {
                    log::trace!("Skipping cancel for order {order_id} (size {cancel_size})");
                }
                return 0;
            }
        };

        let removed = cancel_size.min(order.size);
        let extinguished = removed == order.size;

        if let Some(ladder) = self.ladder_mut(order.side) {
            ladder.debit(order.price, removed, u32::from(extinguished));
        }

        if extinguished {
            self.orders.remove(order_id);
        } else {
            self.orders.upsert(
                order_id,
                Order {
                    size: order.size - removed,
                    ..order
                },
            );
        }

        self.stats.cancels += 1;
        removed
    }

    /// Replace an order wholesale.
    ///
    /// Any existing contribution is withdrawn in full, then the order is
    /// added as new. Queue position is never preserved, even when price
    /// and side are unchanged. Returns `true` if the re-add took effect.
    pub fn modify(&mut self, order_id: u64, side: Side, price: Price, size: u64) -> bool {
        if let Some(previous) = self.orders.lookup(order_id) {
            self.withdraw(order_id, previous);
        }
        self.stats.modifies += 1;
        self.add(order_id, side, price, size)
    }

    /// Replay a trade print against the side opposite the aggressor.
    ///
    /// Consumes `min(level size, size)` from the level at `price`, then debits
    /// the same amount from individual orders resting there. Orders are
    /// debited in the order index's iteration order, which is unspecified:
    /// when a trade only partly consumes a level, which orders survive is
    /// not defined. Returns the size traded.
    pub fn execute_trade(&mut self, price: Price, size: u64, aggressor: Side) -> u64 {
        let resting = aggressor.opposite();
        let available = match self.ladder(resting).and_then(|l| l.get(price)) {
            Some(level) if size > 0 => level.aggregate_size,
            _ => {
                self.stats.dropped_executions += 1;
                if self.config.log_warnings {
                    log::trace!(
                        "Dropping execution of {size} @ {price}: no resting {resting:?} level"
                    );
                }
                return 0;
            }
        };

        let traded = available.min(size);
        let (debited, filled) = self.orders.debit_at(price, resting, traded);
        if debited != traded && self.config.log_warnings {
            log::warn!("Execution at {price} traded {traded} but only {debited} found on orders");
        }
        if let Some(ladder) = self.ladder_mut(resting) {
            ladder.debit(price, traded, filled);
        }

        self.stats.executions += 1;
        traded
    }

    /// Zero-based rank of the order's price level on its side, or `None`
    /// if the order is not resting.
    pub fn depth_of(&self, order_id: u64) -> Option<usize> {
        let order = self.orders.lookup(order_id)?;
        self.ladder(order.side)?.rank_of(order.price)
    }

    /// Top-of-book view with `levels()` rows.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot::capture(&self.bids, &self.asks, self.config.levels)
    }

    /// Refresh `out` in place, reusing its allocation.
    pub fn snapshot_into(&self, out: &mut BookSnapshot) {
        out.fill_from(&self.bids, &self.asks);
    }

    /// Recompute every level from the order index and compare against the
    /// ladders.
    pub fn check_invariants(&self) -> Result<()> {
        let mut expected: AHashMap<(Side, Price), PriceLevel> = AHashMap::new();
        for (id, order) in self.orders.iter() {
            if order.size == 0 {
                return Err(ReplayError::InconsistentState(format!(
                    "order {id} is indexed with zero size"
                )));
            }
            let level = expected.entry((order.side, order.price)).or_default();
            level.aggregate_size += order.size;
            level.order_count += 1;
        }

        let mut seen = 0usize;
        for ladder in [&self.bids, &self.asks] {
            for (price, level) in ladder.iter_best() {
                seen += 1;
                let want = expected.get(&(ladder.side(), price)).copied().unwrap_or_default();
                if level.aggregate_size == 0 || *level != want {
                    return Err(ReplayError::InconsistentState(format!(
                        "{:?} level {price}: ladder has {}/{} but orders sum to {}/{}",
                        ladder.side(),
                        level.aggregate_size,
                        level.order_count,
                        want.aggregate_size,
                        want.order_count
                    )));
                }
            }
        }

        if seen != expected.len() {
            return Err(ReplayError::InconsistentState(format!(
                "{} order price levels but {seen} ladder levels",
                expected.len()
            )));
        }
        Ok(())
    }

    /// Clear all orders and levels.
    pub fn reset(&mut self) {
        self.orders.clear();
        self.bids.clear();
        self.asks.clear();
        self.stats = BookStats::default();
    }

    /// Look up a resting order.
    #[inline]
    pub fn order(&self, order_id: u64) -> Option<Order> {
        self.orders.lookup(order_id)
    }

    /// Level at `(side, price)`, if non-empty.
    pub fn level(&self, side: Side, price: Price) -> Option<PriceLevel> {
        self.ladder(side)?.get(price).copied()
    }

    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    pub fn stats(&self) -> &BookStats {
        &self.stats
    }

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Number of non-empty bid levels.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of non-empty ask levels.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Take an order's whole contribution out of both views.
    fn withdraw(&mut self, order_id: u64, order: Order) {
        if let Some(ladder) = self.ladder_mut(order.side) {
            ladder.debit(order.price, order.size, 1);
        }
        self.orders.remove(order_id);
    }

    #[inline]
    fn ladder(&self, side: Side) -> Option<&Ladder> {
        match side {
            Side::Bid => Some(&self.bids),
            Side::Ask => Some(&self.asks),
            Side::None => None,
        }
    }

    #[inline]
    fn ladder_mut(&mut self, side: Side) -> Option<&mut Ladder> {
        match side {
            Side::Bid => Some(&mut self.bids),
            Side::Ask => Some(&mut self.asks),
            Side::None => None,
        }
    }
}
