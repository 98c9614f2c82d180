//! Order book reconstruction.
//!
//! The book state machine: order index, per-side price ladders, the
//! add/cancel/modify/execute operations, depth lookup and snapshots.

pub mod book;
pub mod order_index;
pub mod price_level;
pub mod snapshot;

pub use book::{BookConfig, BookStats, DuplicateAddPolicy, OrderBook};
pub use order_index::OrderIndex;
pub use price_level::{Ladder, PriceLevel};
pub use snapshot::{BookSnapshot, DepthRow, LevelView};
