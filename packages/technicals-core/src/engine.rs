use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::indicator::{Indicator, IndicatorBank};
use crate::sanitize::sanitize;
use crate::series::{SeriesBuffer, DEFAULT_CAPACITY};
use crate::settings::ParsedSettings;
use crate::snapshot::{Snapshot, SnapshotWriter};
use crate::{Candle, RawCandle, SeriesInput};

#[derive(Debug, Clone)]
struct Ready {
    settings: ParsedSettings,
    series: SeriesBuffer,
    /// State after every committed candle.
    bank: IndicatorBank,
    /// State after every committed candle but the newest; revisions of that candle
    /// are replayed from here.
    prior: IndicatorBank,
}

impl Ready {
    /// Sanitizes `raw` and decides whether it revises the newest committed candle.
    ///
    /// A finite time at or before the newest committed time is a revision of that
    /// candle and takes its time. So is any sample once the newest time is `i64::MAX`.
    fn accept(&self, raw: RawCandle) -> (Candle, bool) {
        let Some(last) = self.series.last_committed() else {
            return (sanitize(raw, None).0, false);
        };
        let revises = if raw.time.is_finite() {
            raw.time as i64 <= last.time
        } else {
            last.time == i64::MAX
        };
        if !revises {
            return (sanitize(raw, Some(&last)).0, false);
        }
        if raw.time.is_finite() && (raw.time as i64) < last.time {
            debug!(value = %raw.time, last = last.time, "stale sample time, revising the newest candle");
        }
        let before = self
            .series
            .len()
            .checked_sub(2)
            .and_then(|i| self.series.get(i));
        let raw = RawCandle {
            time: last.time as f64,
            ..raw
        };
        let (mut c, _) = sanitize(raw, before.as_ref());
        c.time = last.time;
        (c, true)
    }
}

/// Saved committed state of an [`Engine`], restorable with [`Engine::restore`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    state: Option<Ready>,
}

/// Incremental indicator engine for one symbol/timeframe.
///
/// `initialize` seeds every configured indicator over a history; `update` previews the
/// still-forming candle without touching committed state; `shift` commits a closed candle.
#[derive(Debug)]
pub struct Engine {
    capacity: usize,
    state: Option<Ready>,
    out: SnapshotWriter,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is the number of committed candles retained (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: None,
            out: SnapshotWriter::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Committed candles currently held.
    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.series.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn settings(&self) -> Option<&ParsedSettings> {
        self.state.as_ref().map(|s| &s.settings)
    }

    pub fn series(&self) -> Option<&SeriesBuffer> {
        self.state.as_ref().map(|s| &s.series)
    }

    /// Replaces all state with `history` and `settings_json`.
    ///
    /// On error the engine is left exactly as it was.
    pub fn initialize(&mut self, history: SeriesInput<'_>, settings_json: &str) -> Result<()> {
        let n = history.len();
        let lengths = history.column_lengths();
        if lengths.iter().any(|(_, len)| *len != n) {
            let detail = lengths
                .iter()
                .map(|(name, len)| format!("{name}={len}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(EngineError::LengthMismatch(detail));
        }

        let settings = ParsedSettings::parse(settings_json)?;

        let mut candles: Vec<Candle> = Vec::with_capacity(n);
        let mut repaired = 0usize;
        let mut dropped = 0usize;
        for i in 0..n {
            let (c, fixed) = sanitize(history.raw_candle(i), candles.last());
            if candles.last().is_some_and(|p| c.time <= p.time) {
                dropped += 1;
                continue;
            }
            repaired += usize::from(fixed);
            candles.push(c);
        }
        if repaired > 0 || dropped > 0 {
            warn!(repaired, dropped, total = n, "sanitized samples in seed history");
        }

        let mut prior = IndicatorBank::new(&settings);
        let lookback = prior.max_lookback();
        if candles.len() < lookback {
            debug!(
                history = candles.len(),
                lookback, "seed history shorter than the longest lookback; some indicators stay pending"
            );
        }
        let (head, newest) = match candles.split_last() {
            Some((newest, head)) => (head, Some(newest)),
            None => (&candles[..], None),
        };
        prior.seed(head);
        let mut bank = prior.clone();
        if let Some(newest) = newest {
            bank.step(newest);
        }

        let mut series = SeriesBuffer::new(self.capacity);
        series.load(&candles);

        debug!(
            candles = n,
            retained = series.len(),
            indicators = bank.len(),
            "engine initialized"
        );
        self.state = Some(Ready {
            settings,
            series,
            bank,
            prior,
        });
        Ok(())
    }

    /// Previews `raw` as the forming candle and returns the JSON snapshot.
    ///
    /// A sample timed at or before the newest committed candle is previewed as a
    /// replacement of that candle rather than as one more. Committed indicator state is not
    /// modified; the returned string borrows the engine's reusable output buffer.
    pub fn update(&mut self, raw: RawCandle) -> Result<&str> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        let (c, revises) = state.accept(raw);
        state.series.set_forming(c);
        let bank = if revises { &state.prior } else { &state.bank };
        self.out.write(bank.previews(&c))
    }

    /// Commits `raw` as a closed candle, advancing every indicator by one step.
    ///
    /// A sample timed at or before the newest committed candle rewrites that candle in
    /// place instead.
    pub fn shift(&mut self, raw: RawCandle) -> Result<()> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        let (c, revises) = state.accept(raw);
        if revises {
            let mut bank = state.prior.clone();
            bank.step(&c);
            state.bank = bank;
            state.series.update_last(c);
        } else {
            if let Some(last) = state.series.last_committed() {
                state.prior.step(&last);
            }
            state.bank.step(&c);
            state.series.commit(c);
        }
        Ok(())
    }

    /// Committed values (no preview).
    pub fn snapshot(&self) -> Result<Snapshot> {
        let state = self.state.as_ref().ok_or(EngineError::NotInitialized)?;
        Ok(Snapshot::collect(state.bank.values()))
    }

    /// Committed values as JSON, written into the reusable output buffer.
    pub fn snapshot_json(&mut self) -> Result<&str> {
        let state = self.state.as_ref().ok_or(EngineError::NotInitialized)?;
        self.out.write(state.bank.values())
    }

    pub fn indicator(&self, key: &str) -> Option<&dyn Indicator> {
        self.state.as_ref()?.bank.get(key)
    }

    /// Oldest/newest committed candle times held in the window of indicator `key`.
    pub fn window_span(&self, key: &str) -> Option<(i64, i64)> {
        self.indicator(key)?.window_span()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
        }
    }

    pub fn restore(&mut self, checkpoint: &Checkpoint) {
        self.state = checkpoint.state.clone();
    }

    /// Drops all state and buffers; the engine must be initialized again before use.
    pub fn free(&mut self) {
        self.state = None;
        self.out.release();
    }
}
