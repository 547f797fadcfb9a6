//! Dual countdown clock with optimistic ticking and authoritative reconciliation
//!
//! Each color owns a [`SideClock`] with two readings:
//!
//! - `banked_ms`: authoritative remaining time as of the last reconciliation
//! - `display_ms`: locally predicted remaining time, shown to the players
//!
//! # Time Management
//!
//! - [`DualClock::tick`] runs on a fixed period (33 ms by default) and only
//!   touches the side to move. While the prediction is positive it is simply
//!   decremented by the period, without reading the wall clock. Once it hits
//!   zero the bank is reconciled against the real elapsed time, which is
//!   also where a timeout is detected.
//! - [`DualClock::reconcile_on_turn_change`] charges the side that just moved
//!   with the real elapsed time and re-stamps both sides, so scheduling
//!   jitter in the tick never accumulates across turns.
//! - An optional Fischer increment is credited to the mover on each
//!   reconciliation (10+5 means 10 minutes base, 5 seconds per move).

use crate::game::components::PieceColor;
use tracing::{debug, info};
use web_time::Instant;

/// Default tick period in milliseconds (~30 Hz)
pub const DEFAULT_TICK_PERIOD_MS: i64 = 33;

/// Clock readings for one color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideClock {
    /// Authoritative remaining time, may go negative before a timeout is flagged
    pub banked_ms: i64,
    /// Predicted remaining time, never negative
    pub display_ms: i64,
    /// Instant of the last authoritative update
    pub last_reconcile: Instant,
}

impl SideClock {
    fn new(starting_bank_ms: i64, now: Instant) -> Self {
        Self {
            banked_ms: starting_bank_ms,
            display_ms: starting_bank_ms.max(0),
            last_reconcile: now,
        }
    }

    /// Charge the real time elapsed since the last stamp against the bank
    fn settle(&mut self, now: Instant) {
        self.banked_ms -= elapsed_ms(self.last_reconcile, now);
        self.display_ms = self.banked_ms.max(0);
        self.last_reconcile = now;
    }
}

/// A color ran out of time; the opposing color wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTimeout {
    pub flagged: PieceColor,
}

impl ClockTimeout {
    pub fn winner(self) -> PieceColor {
        self.flagged.opposite()
    }
}

/// Two independent countdown clocks driven by one tick source
#[derive(Debug, Clone)]
pub struct DualClock {
    white: SideClock,
    black: SideClock,
    tick_period_ms: i64,
    increment_ms: i64,
    /// Set once a side flags; the clock is frozen until the next reset
    flagged: Option<PieceColor>,
}

impl DualClock {
    pub fn new(starting_bank_ms: i64, increment_ms: i64, tick_period_ms: i64, now: Instant) -> Self {
        Self {
            white: SideClock::new(starting_bank_ms, now),
            black: SideClock::new(starting_bank_ms, now),
            tick_period_ms: tick_period_ms.max(1),
            increment_ms: increment_ms.max(0),
            flagged: None,
        }
    }

    /// Restart both clocks at `starting_bank_ms`
    pub fn reset(&mut self, starting_bank_ms: i64, now: Instant) {
        self.white = SideClock::new(starting_bank_ms, now);
        self.black = SideClock::new(starting_bank_ms, now);
        self.flagged = None;
        info!("[CLOCK] Reset both clocks to {} ms", starting_bank_ms);
    }

    /// Restart a single color's clock, leaving the other untouched
    pub fn reset_side(&mut self, color: PieceColor, starting_bank_ms: i64, now: Instant) {
        *self.side_mut(color) = SideClock::new(starting_bank_ms, now);
        if self.flagged == Some(color) {
            self.flagged = None;
        }
    }

    /// Advance the prediction of `to_move` by one period
    ///
    /// Returns a timeout the first time `to_move` is found with an exhausted
    /// bank. The side not to move is never touched.
    pub fn tick(&mut self, to_move: PieceColor, now: Instant) -> Option<ClockTimeout> {
        if self.flagged.is_some() {
            return None;
        }

        let period = self.tick_period_ms;
        let clock = self.side_mut(to_move);

        if clock.display_ms > 0 {
            clock.display_ms = (clock.display_ms - period).max(0);
            return None;
        }

        clock.settle(now);
        debug!(
            "[CLOCK] {} reconciled on tick: banked={} ms",
            to_move, clock.banked_ms
        );

        if clock.banked_ms <= 0 {
            return Some(self.flag(to_move));
        }
        None
    }

    /// Authoritative correction after `mover` completed a move
    ///
    /// Charges `mover` with the real elapsed time, credits the increment and
    /// stamps both colors with `now`. Returns a timeout if `mover` had
    /// already run out of time when the move arrived.
    pub fn reconcile_on_turn_change(
        &mut self,
        mover: PieceColor,
        now: Instant,
    ) -> Option<ClockTimeout> {
        if self.flagged.is_some() {
            return None;
        }

        let increment = self.increment_ms;
        let clock = self.side_mut(mover);
        clock.settle(now);
        let exhausted = clock.banked_ms <= 0;
        if !exhausted {
            clock.banked_ms += increment;
            clock.display_ms = clock.banked_ms;
        }
        debug!(
            "[CLOCK] {} moved: banked={} ms",
            mover,
            self.side(mover).banked_ms
        );

        self.stamp(now);

        exhausted.then(|| self.flag(mover))
    }

    /// Stamp both colors' reconcile baseline with `now` without charging anyone
    pub fn stamp(&mut self, now: Instant) {
        self.white.last_reconcile = now;
        self.black.last_reconcile = now;
    }

    pub fn side(&self, color: PieceColor) -> &SideClock {
        match color {
            PieceColor::White => &self.white,
            PieceColor::Black => &self.black,
        }
    }

    /// Banked time for `color`, floored at zero
    pub fn remaining_ms(&self, color: PieceColor) -> i64 {
        self.side(color).banked_ms.max(0)
    }

    /// Predicted time for `color`, formatted for display
    pub fn display(&self, color: PieceColor) -> String {
        format_clock(self.side(color).display_ms)
    }

    /// The color that ran out of time, if any
    pub fn flagged(&self) -> Option<PieceColor> {
        self.flagged
    }

    fn side_mut(&mut self, color: PieceColor) -> &mut SideClock {
        match color {
            PieceColor::White => &mut self.white,
            PieceColor::Black => &mut self.black,
        }
    }

    fn flag(&mut self, color: PieceColor) -> ClockTimeout {
        self.side_mut(color).display_ms = 0;
        self.flagged = Some(color);
        info!("[CLOCK] {} flagged, {} wins on time", color, color.opposite());
        ClockTimeout { flagged: color }
    }
}

fn elapsed_ms(since: Instant, now: Instant) -> i64 {
    i64::try_from(now.saturating_duration_since(since).as_millis()).unwrap_or(i64::MAX)
}

/// Render milliseconds as `MM:SS`, or `MM:SS.CC` under one minute
pub fn format_clock(ms: i64) -> String {
    let ms = ms.max(0);
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;

    if minutes < 1 {
        format!("{minutes:02}:{seconds:02}.{centis:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
