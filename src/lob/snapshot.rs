//! Top-of-book snapshot.
//!
//! A read-only projection of the top N levels of each ladder. Sides are
//! ranked independently; a side with fewer than N levels is padded with
//! empty rows (zero price, zero size, zero count).

use serde::Serialize;

use crate::lob::price_level::{Ladder, PriceLevel};
use crate::price::Price;

/// One visible level on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelView {
    pub price: Price,
    pub size: u64,
    pub count: u32,
}

impl LevelView {
    /// The padding sentinel.
    pub const EMPTY: LevelView = LevelView {
        price: Price::ZERO,
        size: 0,
        count: 0,
    };

    fn from_level(price: Price, level: &PriceLevel) -> Self {
        Self {
            price,
            size: level.aggregate_size,
            count: level.order_count,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

/// Bid and ask at the same rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepthRow {
    pub bid: LevelView,
    pub ask: LevelView,
}

/// The visible book: exactly `levels()` rows, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSnapshot {
    rows: Vec<DepthRow>,
}

impl BookSnapshot {
    /// An all-empty snapshot with `levels` rows.
    pub fn empty(levels: usize) -> Self {
        Self {
            rows: vec![DepthRow::default(); levels],
        }
    }

    /// Project the top `levels` of each ladder.
    pub fn capture(bids: &Ladder, asks: &Ladder, levels: usize) -> Self {
        let mut snapshot = Self::empty(levels);
        snapshot.fill_from(bids, asks);
        snapshot
    }

    /// Overwrite this snapshot in place from the ladders, keeping its size.
    pub fn fill_from(&mut self, bids: &Ladder, asks: &Ladder) {
        let mut bid_iter = bids.iter_best();
        let mut ask_iter = asks.iter_best();
        for row in &mut self.rows {
            row.bid = bid_iter
                .next()
                .map_or(LevelView::EMPTY, |(p, l)| LevelView::from_level(p, l));
            row.ask = ask_iter
                .next()
                .map_or(LevelView::EMPTY, |(p, l)| LevelView::from_level(p, l));
        }
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn rows(&self) -> &[DepthRow] {
        &self.rows
    }

    #[inline]
    pub fn row(&self, rank: usize) -> Option<&DepthRow> {
        self.rows.get(rank)
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.rows
            .first()
            .filter(|r| !r.bid.is_empty())
            .map(|r| r.bid.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.rows
            .first()
            .filter(|r| !r.ask.is_empty())
            .map(|r| r.ask.price)
    }
}
