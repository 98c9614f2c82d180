//! Order index: order id → resting order.
//!
//! Backed by an `AHashMap`, so iteration order is unspecified and may
//! change between runs or builds. Callers that walk the index (the
//! trade debit loop) must not rely on any particular order.

use ahash::AHashMap;

use crate::price::Price;
use crate::types::{Order, Side};

/// Mapping from order id to its current price, remaining size, and side.
#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    orders: AHashMap<u64, Order>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an order. No side effects.
    #[inline]
    pub fn lookup(&self, order_id: u64) -> Option<Order> {
        self.orders.get(&order_id).copied()
    }

    /// Insert or replace the mapping, returning the previous entry.
    #[inline]
    pub fn upsert(&mut self, order_id: u64, order: Order) -> Option<Order> {
        self.orders.insert(order_id, order)
    }

    /// Delete the mapping. No-op if absent.
    #[inline]
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.orders.remove(&order_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Iterate over all resting orders in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Order)> {
        self.orders.iter().map(|(&id, order)| (id, order))
    }

    /// Debit up to `amount` from orders resting at `(price, side)`.
    ///
    /// Orders are visited in the map's iteration order, not arrival order.
    /// Each order whose size reaches zero is evicted and counted. Returns
    /// `(debited, orders_removed)`.
    pub fn debit_at(&mut self, price: Price, side: Side, amount: u64) -> (u64, u32) {
        let mut remaining = amount;
        let mut removed = 0u32;

        self.orders.retain(|_, order| {
            if remaining == 0 || order.price != price || order.side != side {
                return true;
            }
            let debit = remaining.min(order.size);
            order.size -= debit;
            remaining -= debit;
            if order.size == 0 {
                removed += 1;
                false
            } else {
                true
            }
        });

        (amount - remaining, removed)
    }
}
