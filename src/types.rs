//! Core data types for MBO events and resting orders.
//!
//! Numeric fields that drive the book (`price`, `size`, `order_id`) are
//! decoded into typed values. Everything else on an input row is carried
//! through untouched as text for the output record.

use serde::{Deserialize, Serialize};

use crate::price::Price;

/// Number of price levels per side in an MBP-10 record.
pub const MBP_LEVELS: usize = 10;

/// MBO action type (what happened to the order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add new order to book
    Add,
    /// Modify existing order (loses queue position)
    Modify,
    /// Cancel some or all of an order's size
    Cancel,
    /// Trade print
    Trade,
    /// Fill print
    Fill,
    /// Book clear
    Clear,
    /// No action (status/heartbeat rows)
    None,
    /// Any other code, kept so it can be counted and ignored
    Other(u8),
}

impl Action {
    /// Parse action from a byte (Databento-style codes).
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'A' => Action::Add,
            b'M' => Action::Modify,
            b'C' => Action::Cancel,
            b'T' => Action::Trade,
            b'F' => Action::Fill,
            b'R' => Action::Clear,
            b'N' => Action::None,
            other => Action::Other(other),
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        match self {
            Action::Add => b'A',
            Action::Modify => b'M',
            Action::Cancel => b'C',
            Action::Trade => b'T',
            Action::Fill => b'F',
            Action::Clear => b'R',
            Action::None => b'N',
            Action::Other(b) => b,
        }
    }

    /// Trade and fill prints both execute against resting liquidity.
    #[inline(always)]
    pub fn is_execution(self) -> bool {
        matches!(self, Action::Trade | Action::Fill)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order (bid)
    Bid = b'B',
    /// Sell order (ask)
    Ask = b'A',
    /// Non-directional (trades without an aggressor)
    None = b'N',
}

impl Side {
    /// Parse side from a byte. Unknown bytes are treated as non-directional.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'B' => Side::Bid,
            b'A' => Side::Ask,
            _ => Side::None,
        }
    }

    /// Convert to byte representation.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// The other side of the book. `None` stays `None`.
    #[inline(always)]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
            Side::None => Side::None,
        }
    }

    #[inline(always)]
    pub fn is_bid(self) -> bool {
        matches!(self, Side::Bid)
    }
}

/// One decoded MBO event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MboEvent {
    /// Receive timestamp (pass-through text)
    pub ts_recv: String,
    /// Exchange event timestamp (pass-through text)
    pub ts_event: String,
    /// Record type (pass-through text)
    pub rtype: String,
    pub publisher_id: String,
    pub instrument_id: String,
    pub action: Action,
    pub side: Side,
    /// Fixed-point price; `Price::ZERO` when absent
    pub price: Price,
    pub size: u64,
    pub order_id: u64,
    pub flags: String,
    pub ts_in_delta: String,
    pub sequence: String,
    pub symbol: String,
}

impl MboEvent {
    /// Create an event with the book-relevant fields set and empty metadata.
    pub fn new(order_id: u64, action: Action, side: Side, price: Price, size: u64) -> Self {
        Self {
            ts_recv: String::new(),
            ts_event: String::new(),
            rtype: String::new(),
            publisher_id: String::new(),
            instrument_id: String::new(),
            action,
            side,
            price,
            size,
            order_id,
            flags: String::new(),
            ts_in_delta: String::new(),
            sequence: String::new(),
            symbol: String::new(),
        }
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set both timestamps.
    pub fn with_timestamps(
        mut self,
        ts_recv: impl Into<String>,
        ts_event: impl Into<String>,
    ) -> Self {
        self.ts_recv = ts_recv.into();
        self.ts_event = ts_event.into();
        self
    }

    /// A trade/fill with no aggressor side carries nothing to replay.
    #[inline]
    pub fn is_orphan_execution(&self) -> bool {
        self.action.is_execution() && self.side == Side::None
    }

    /// The book mutation this event asks for.
    pub fn book_update(&self) -> BookUpdate {
        match self.action {
            Action::Add => BookUpdate::Add {
                order_id: self.order_id,
                side: self.side,
                price: self.price,
                size: self.size,
            },
            Action::Cancel => BookUpdate::Cancel {
                order_id: self.order_id,
                size: self.size,
            },
            Action::Modify => BookUpdate::Modify {
                order_id: self.order_id,
                side: self.side,
                price: self.price,
                size: self.size,
            },
            Action::Trade | Action::Fill => BookUpdate::Execute {
                price: self.price,
                size: self.size,
                aggressor: self.side,
            },
            Action::Clear | Action::None | Action::Other(_) => BookUpdate::Ignore,
        }
    }
}

/// A book mutation with its payload.
///
/// Cancel sizes are amounts to remove, not target sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookUpdate {
    Add {
        order_id: u64,
        side: Side,
        price: Price,
        size: u64,
    },
    Cancel {
        order_id: u64,
        size: u64,
    },
    Modify {
        order_id: u64,
        side: Side,
        price: Price,
        size: u64,
    },
    Execute {
        price: Price,
        size: u64,
        aggressor: Side,
    },
    Ignore,
}

/// A resting order as tracked by the order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: Price,
    /// Remaining size; always > 0 while the order is indexed
    pub size: u64,
}
