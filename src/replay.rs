//! MBO → MBP-10 replay: the per-event emission decision.
//!
//! For each event the replayer snapshots the visible book, applies the
//! mutation, snapshots again, and decides whether the event produces an
//! output record:
//!
//! | Action | Emitted when | Reported depth |
//! |--------|--------------|----------------|
//! | trade / fill | always (unless side is `N`) | 0 |
//! | cancel | pre-cancel rank ≤ `cancel_window` | pre-cancel rank |
//! | add / modify | view changed, or rank == `levels` | post-mutation rank |
//! | other | never | |
//!
//! Trade and fill records are reported as `T` on the resting side (the
//! side that was hit), not the aggressor side.

use std::io::Write;
use std::time::Instant;

use serde::Serialize;

use crate::error::Result;
use crate::lob::{BookConfig, BookSnapshot, BookStats, OrderBook};
use crate::types::{Action, MboEvent, Side};
use crate::writer::Mbp10Writer;

/// Configuration for the replay loop.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Book configuration (visible levels, duplicate-add policy)
    pub book: BookConfig,

    /// Deepest pre-cancel rank that still emits a cancel record
    pub cancel_window: usize,

    /// Emit adds/modifies that land exactly one level outside the view
    pub boundary_emission: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self::new(BookConfig::default())
    }
}

impl ReplayConfig {
    /// Replay config for the given book; the cancel window is `levels + 1`.
    pub fn new(book: BookConfig) -> Self {
        Self {
            cancel_window: book.levels + 1,
            boundary_emission: true,
            book,
        }
    }

    pub fn with_cancel_window(mut self, window: usize) -> Self {
        self.cancel_window = window;
        self
    }

    pub fn with_boundary_emission(mut self, enabled: bool) -> Self {
        self.boundary_emission = enabled;
        self
    }
}

/// The action/side/depth an emitted record reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub action: Action,
    pub side: Side,
    /// `None` when the order is no longer resting (e.g. modified to size 0)
    pub depth: Option<usize>,
}

/// Decide whether an event is emitted.
///
/// `old_depth` is the pre-mutation rank (cancels only), `new_depth` the
/// post-mutation rank (adds/modifies only).
pub fn decide_emission(
    event: &MboEvent,
    before: &BookSnapshot,
    after: &BookSnapshot,
    old_depth: Option<usize>,
    new_depth: Option<usize>,
    config: &ReplayConfig,
) -> Option<Emission> {
    match event.action {
        Action::Trade | Action::Fill => Some(Emission {
            action: Action::Trade,
            side: event.side.opposite(),
            depth: Some(0),
        }),
        Action::Cancel => old_depth
            .filter(|&d| d <= config.cancel_window)
            .map(|d| Emission {
                action: Action::Cancel,
                side: event.side,
                depth: Some(d),
            }),
        Action::Add | Action::Modify => {
            let at_boundary = config.boundary_emission && new_depth == Some(config.book.levels);
            (before != after || at_boundary).then_some(Emission {
                action: event.action,
                side: event.side,
                depth: new_depth,
            })
        }
        Action::Clear | Action::None | Action::Other(_) => None,
    }
}

/// One MBP-10 output record.
#[derive(Debug, Clone, Copy)]
pub struct Mbp10Record<'a> {
    /// Source event (timestamps, ids, price, size, pass-through fields)
    pub event: &'a MboEvent,
    pub action: Action,
    pub side: Side,
    pub depth: Option<usize>,
    /// Post-mutation book
    pub book: &'a BookSnapshot,
}

/// Counters for one replay run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayStats {
    pub events_read: u64,
    pub rows_emitted: u64,
    pub adds: u64,
    pub cancels: u64,
    pub modifies: u64,
    pub trades: u64,
    pub fills: u64,
    /// Trades/fills with no aggressor side, skipped before touching the book
    pub orphan_executions_skipped: u64,
    /// Events with actions the book does not act on
    pub ignored_actions: u64,
    /// Numeric fields zeroed by the decoder
    pub malformed_fields: u64,
    pub resting_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub elapsed_secs: f64,
    pub book: BookStats,
}

/// Drives an [`OrderBook`] over an event stream and produces records.
///
/// Owns its book; one replayer per instrument.
#[derive(Debug, Clone)]
pub struct Mbp10Replayer {
    config: ReplayConfig,
    book: OrderBook,
    before: BookSnapshot,
    after: BookSnapshot,
    stats: ReplayStats,
}

impl Default for Mbp10Replayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mbp10Replayer {
    /// Replayer with 10 levels and default policies.
    pub fn new() -> Self {
        Self::with_config(ReplayConfig::default())
    }

    pub fn with_config(config: ReplayConfig) -> Self {
        let levels = config.book.levels;
        Self {
            book: OrderBook::with_config(config.book.clone()),
            before: BookSnapshot::empty(levels),
            after: BookSnapshot::empty(levels),
            stats: ReplayStats::default(),
            config,
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Process one event, returning the record to emit, if any.
    pub fn process<'a>(&'a mut self, event: &'a MboEvent) -> Option<Mbp10Record<'a>> {
        self.count(event.action);

        if event.is_orphan_execution() {
            self.stats.orphan_executions_skipped += 1;
            return None;
        }

        self.book.snapshot_into(&mut self.before);

        let old_depth = match event.action {
            Action::Cancel => self.book.depth_of(event.order_id),
            _ => None,
        };

        match event.action {
            Action::Add | Action::Modify | Action::Cancel => self.book.process(event),
            Action::Trade | Action::Fill => {
                self.book.execute_trade(event.price, event.size, event.side);
            }
            Action::Clear | Action::None | Action::Other(_) => {}
        }

        let new_depth = match event.action {
            Action::Add | Action::Modify => self.book.depth_of(event.order_id),
            _ => None,
        };

        // nothing mutates the book past this point, so this is also the
        // snapshot written with the record
        self.book.snapshot_into(&mut self.after);

        let emission = decide_emission(
            event,
            &self.before,
            &self.after,
            old_depth,
            new_depth,
            &self.config,
        )?;

        self.stats.rows_emitted += 1;
        Some(Mbp10Record {
            event,
            action: emission.action,
            side: emission.side,
            depth: emission.depth,
            book: &self.after,
        })
    }

    /// Replay a whole stream into `writer`. The header is written first.
    ///
    /// Stops at the first I/O error from either side.
    pub fn run<I, W>(&mut self, events: I, writer: &mut Mbp10Writer<W>) -> Result<()>
    where
        I: IntoIterator<Item = Result<MboEvent>>,
        W: Write,
    {
        let start = Instant::now();
        writer.write_header()?;

        for event in events {
            let event = event?;
            if let Some(record) = self.process(&event) {
                writer.write_record(&record)?;
            }
            if self.stats.events_read % 1_000_000 == 0 {
                log::debug!(
                    "{} events read, {} rows emitted, {} resting orders",
                    self.stats.events_read,
                    self.stats.rows_emitted,
                    self.book.order_count()
                );
            }
        }

        writer.flush()?;
        self.stats.elapsed_secs += start.elapsed().as_secs_f64();
        Ok(())
    }

    /// Record decoder-side recoveries in the run statistics.
    pub fn add_malformed_fields(&mut self, count: u64) {
        self.stats.malformed_fields += count;
    }

    /// Statistics so far, with the book's live counts filled in.
    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            resting_orders: self.book.order_count(),
            bid_levels: self.book.bid_levels(),
            ask_levels: self.book.ask_levels(),
            book: self.book.stats().clone(),
            ..self.stats.clone()
        }
    }

    fn count(&mut self, action: Action) {
        self.stats.events_read += 1;
        match action {
            Action::Add => self.stats.adds += 1,
            Action::Cancel => self.stats.cancels += 1,
            Action::Modify => self.stats.modifies += 1,
            Action::Trade => self.stats.trades += 1,
            Action::Fill => self.stats.fills += 1,
            Action::Clear | Action::None | Action::Other(_) => self.stats.ignored_actions += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lob::DuplicateAddPolicy;
    use crate::price::Price;

    fn replayer() -> Mbp10Replayer {
        Mbp10Replayer::with_config(ReplayConfig::new(BookConfig::default().with_logging(false)))
    }

    fn ev(order_id: u64, action: Action, side: Side, units: i64, size: u64) -> MboEvent {
        MboEvent::new(order_id, action, side, Price::from_units(units), size)
    }

    fn emitted(r: &mut Mbp10Replayer, event: &MboEvent) -> Option<Emission> {
        r.process(event).map(|rec| Emission {
            action: rec.action,
            side: rec.side,
            depth: rec.depth,
        })
    }

    #[test]
    fn test_add_that_changes_view_emits() {
        let mut r = replayer();
        let add = ev(1, Action::Add, Side::Bid, 100, 10);
        let record = r.process(&add).unwrap();
        assert_eq!(record.action, Action::Add);
        assert_eq!(record.side, Side::Bid);
        assert_eq!(record.depth, Some(0));
        let top = record.book.row(0).unwrap().bid;
        assert_eq!((top.price, top.size, top.count), (Price::from_units(100), 10, 1));
    }

    #[test]
    fn test_add_outside_view_is_silent_except_at_boundary() {
        let mut r = replayer();
        for i in 0..10 {
            r.process(&ev(i + 1, Action::Add, Side::Bid, 200 - i as i64, 1));
        }
        // rank 10: just outside the view, still emitted
        let boundary = ev(11, Action::Add, Side::Bid, 190, 1);
        assert_eq!(
            emitted(&mut r, &boundary),
            Some(Emission { action: Action::Add, side: Side::Bid, depth: Some(10) })
        );
        // rank 11: nothing visible changed
        let deeper = ev(12, Action::Add, Side::Bid, 189, 1);
        assert_eq!(emitted(&mut r, &deeper), None);
    }

    #[test]
    fn test_boundary_emission_can_be_disabled() {
        let config = ReplayConfig::new(BookConfig::default().with_logging(false))
            .with_boundary_emission(false);
        let mut r = Mbp10Replayer::with_config(config);
        for i in 0..10 {
            r.process(&ev(i + 1, Action::Add, Side::Ask, 100 + i as i64, 1));
        }
        assert_eq!(emitted(&mut r, &ev(11, Action::Add, Side::Ask, 110, 1)), None);
    }

    #[test]
    fn test_add_to_existing_visible_level_emits() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Ask, 101, 5));
        let e = emitted(&mut r, &ev(2, Action::Add, Side::Ask, 101, 5)).unwrap();
        assert_eq!(e.depth, Some(0));
    }

    #[test]
    fn test_cancel_reports_pre_cancel_depth() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 10));
        r.process(&ev(2, Action::Add, Side::Bid, 99, 10));

        let cancel = ev(2, Action::Cancel, Side::Bid, 99, 10);
        let record = r.process(&cancel).unwrap();
        assert_eq!(record.action, Action::Cancel);
        assert_eq!(record.depth, Some(1));
        assert!(record.book.row(1).unwrap().bid.is_empty());
    }

    #[test]
    fn test_cancel_window() {
        let mut r = replayer();
        for i in 0..13 {
            r.process(&ev(i + 1, Action::Add, Side::Ask, 100 + i as i64, 1));
        }
        // rank 12 is beyond levels + 1
        assert_eq!(emitted(&mut r, &ev(13, Action::Cancel, Side::Ask, 112, 1)), None);
        // rank 11 is inside the window even though it is not visible
        assert_eq!(
            emitted(&mut r, &ev(12, Action::Cancel, Side::Ask, 111, 1)).map(|e| e.depth),
            Some(Some(11))
        );
    }

    #[test]
    fn test_cancel_of_unknown_order_is_silent() {
        let mut r = replayer();
        assert!(r.process(&ev(9, Action::Cancel, Side::Bid, 100, 1)).is_none());
    }

    #[test]
    fn test_trade_reports_resting_side_at_depth_zero() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 20));

        let fill = ev(0, Action::Fill, Side::Ask, 100, 20);
        let record = r.process(&fill).unwrap();
        assert_eq!(record.action, Action::Trade);
        assert_eq!(record.side, Side::Bid);
        assert_eq!(record.depth, Some(0));
        assert!(record.book.row(0).unwrap().bid.is_empty());
        assert!(r.book().order(1).is_none());
    }

    #[test]
    fn test_trade_without_liquidity_still_emits() {
        let mut r = replayer();
        let e = emitted(&mut r, &ev(0, Action::Trade, Side::Bid, 50, 1)).unwrap();
        assert_eq!(e.side, Side::Ask);
    }

    #[test]
    fn test_orphan_trade_is_skipped() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 20));
        assert!(r.process(&ev(0, Action::Trade, Side::None, 100, 20)).is_none());
        assert_eq!(r.book().order(1).map(|o| o.size), Some(20));
        assert_eq!(r.stats().orphan_executions_skipped, 1);
    }

    #[test]
    fn test_other_actions_never_emit() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 20));
        assert!(r.process(&ev(0, Action::Clear, Side::None, 0, 0)).is_none());
        assert!(r.process(&ev(0, Action::Other(b'X'), Side::Bid, 100, 1)).is_none());
        assert_eq!(r.stats().ignored_actions, 2);
    }

    #[test]
    fn test_modify_in_place_is_silent_when_view_unchanged() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 10));
        // same price/side/size: level dips and returns, final view identical
        assert!(r.process(&ev(1, Action::Modify, Side::Bid, 100, 10)).is_none());
        let level = r.book().level(Side::Bid, Price::from_units(100));
        assert_eq!(level.map(|l| l.order_count), Some(1));
    }

    #[test]
    fn test_modify_to_zero_reports_no_depth() {
        let mut r = replayer();
        r.process(&ev(1, Action::Add, Side::Bid, 100, 10));
        let e = emitted(&mut r, &ev(1, Action::Modify, Side::Bid, 100, 0)).unwrap();
        assert_eq!(e.depth, None);
    }

    #[test]
    fn test_stats() {
        let config = ReplayConfig::new(
            BookConfig::default()
                .with_logging(false)
                .with_duplicate_add_policy(DuplicateAddPolicy::Replace),
        );
        let mut r = Mbp10Replayer::with_config(config);
        r.process(&ev(1, Action::Add, Side::Bid, 100, 10));
        r.process(&ev(2, Action::Add, Side::Ask, 101, 10));
        r.process(&ev(2, Action::Cancel, Side::Ask, 101, 4));
        r.process(&ev(0, Action::Trade, Side::Ask, 100, 3));

        let stats = r.stats();
        assert_eq!(stats.events_read, 4);
        assert_eq!(stats.rows_emitted, 4);
        assert_eq!(stats.adds, 2);
        assert_eq!(stats.cancels, 1);
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.resting_orders, 2);
        assert_eq!(stats.bid_levels, 1);
        assert_eq!(stats.book.executions, 1);
        r.book().check_invariants().unwrap();
    }
}
