//! Price levels and per-side ladders.
//!
//! A `PriceLevel` only stores aggregates: the summed remaining size and the
//! number of orders resting at that price. Per-order detail lives in the
//! order index.
//!
//! # Invariant
//!
//! A level exists in a ladder only while `aggregate_size > 0`. Any debit
//! that takes the aggregate to zero removes the level, so `len()` always
//! equals the number of non-empty price levels.
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `bump` | O(log n) |
//! | `debit` | O(log n) |
//! | `rank_of` | O(rank) |

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::price::Price;
use crate::types::Side;

/// Aggregate state of one price on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceLevel {
    /// Sum of remaining size over resting orders at this price
    pub aggregate_size: u64,
    /// Number of resting orders at this price
    pub order_count: u32,
}

/// Ordered price levels for one side of the book.
///
/// Bids iterate highest price first, asks lowest price first. Storage is a
/// single ascending `BTreeMap`; the side decides which end is "best".
#[derive(Debug, Clone)]
pub struct Ladder {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl Ladder {
    /// Create an empty ladder. `side` must be `Bid` or `Ask`.
    pub fn new(side: Side) -> Self {
        debug_assert!(side != Side::None, "ladder needs a directional side");
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Add `size` and `orders` to the level at `price`, creating it if needed.
    #[inline]
    pub fn bump(&mut self, price: Price, size: u64, orders: u32) {
        let level = self.levels.entry(price).or_default();
        level.aggregate_size = level.aggregate_size.saturating_add(size);
        level.order_count = level.order_count.saturating_add(orders);
    }

    /// Remove `size` and `orders` from the level at `price`.
    ///
    /// The level is dropped when its aggregate reaches zero. Returns `false`
    /// if there was no level at `price`.
    #[inline]
    pub fn debit(&mut self, price: Price, size: u64, orders: u32) -> bool {
        let btree_map::Entry::Occupied(mut entry) = self.levels.entry(price) else {
            return false;
        };
        let level = entry.get_mut();
        level.aggregate_size = level.aggregate_size.saturating_sub(size);
        level.order_count = level.order_count.saturating_sub(orders);
        if level.aggregate_size == 0 {
            entry.remove();
        }
        true
    }

    /// Level at `price`, if any.
    #[inline]
    pub fn get(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Best price on this side.
    #[inline]
    pub fn best(&self) -> Option<(Price, &PriceLevel)> {
        self.iter_best().next()
    }

    /// Zero-based rank of `price` counted from the best level.
    pub fn rank_of(&self, price: Price) -> Option<usize> {
        self.iter_best().position(|(p, _)| p == price)
    }

    /// Iterate levels from best to worst.
    pub fn iter_best(&self) -> LadderIter<'_> {
        LadderIter {
            inner: self.levels.iter(),
            descending: self.side.is_bid(),
        }
    }

    /// Number of non-empty levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Best-first iterator over a [`Ladder`].
pub struct LadderIter<'a> {
    inner: btree_map::Iter<'a, Price, PriceLevel>,
    descending: bool,
}

impl<'a> Iterator for LadderIter<'a> {
    type Item = (Price, &'a PriceLevel);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = if self.descending {
            self.inner.next_back()
        } else {
            self.inner.next()
        };
        item.map(|(&p, level)| (p, level))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(units: i64) -> Price {
        Price::from_units(units)
    }

    #[test]
    fn test_new_ladder_is_empty() {
        let ladder = Ladder::new(Side::Bid);
        assert!(ladder.is_empty());
        assert!(ladder.best().is_none());
        assert_eq!(ladder.rank_of(px(100)), None);
    }

    #[test]
    fn test_bump_accumulates() {
        let mut ladder = Ladder::new(Side::Ask);
        ladder.bump(px(100), 10, 1);
        ladder.bump(px(100), 5, 1);

        let level = ladder.get(px(100)).unwrap();
        assert_eq!(level.aggregate_size, 15);
        assert_eq!(level.order_count, 2);
        assert_eq!(ladder.len(), 1);
    }

    #[test]
    fn test_debit_removes_empty_level() {
        let mut ladder = Ladder::new(Side::Bid);
        ladder.bump(px(100), 10, 1);

        assert!(ladder.debit(px(100), 4, 0));
        assert_eq!(ladder.get(px(100)).unwrap().aggregate_size, 6);
        assert_eq!(ladder.get(px(100)).unwrap().order_count, 1);

        assert!(ladder.debit(px(100), 6, 1));
        assert!(ladder.get(px(100)).is_none());
        assert!(ladder.is_empty());
    }

    #[test]
    fn test_debit_missing_level() {
        let mut ladder = Ladder::new(Side::Bid);
        assert!(!ladder.debit(px(100), 1, 1));
        assert!(ladder.is_empty());
    }

    #[test]
    fn test_bid_order_is_descending() {
        let mut ladder = Ladder::new(Side::Bid);
        for p in [99, 101, 100] {
            ladder.bump(px(p), 1, 1);
        }
        let prices: Vec<_> = ladder.iter_best().map(|(p, _)| p).collect();
        assert_eq!(prices, vec![px(101), px(100), px(99)]);
        assert_eq!(ladder.rank_of(px(99)), Some(2));
    }

    #[test]
    fn test_ask_order_is_ascending() {
        let mut ladder = Ladder::new(Side::Ask);
        for p in [102, 100, 101] {
            ladder.bump(px(p), 1, 1);
        }
        let prices: Vec<_> = ladder.iter_best().map(|(p, _)| p).collect();
        assert_eq!(prices, vec![px(100), px(101), px(102)]);
        assert_eq!(ladder.best().map(|(p, _)| p), Some(px(100)));
        assert_eq!(ladder.rank_of(px(102)), Some(2));
        assert_eq!(ladder.rank_of(px(103)), None);
    }
}
