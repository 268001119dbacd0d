//! Incremental indicator bank.
//!
//! Every indicator owns the minimal state to produce its next value from one more candle.
//! `step` advances that state by one committed candle; `preview` answers "what would the
//! value be if this candle were committed" and never mutates.

use core::fmt;

use serde::Serialize;

use crate::settings::{IndicatorSpec, ParsedSettings};
use crate::{Candle, PriceSource};

mod accum;
mod ma;
mod oscillators;
mod pivots;
mod trend;
mod volatility;
mod volume;

pub use accum::{mean_stddev, weighted_mean, Smoothed, Window};
pub use ma::{Ema, Hma, Sma, Vwma, Wma};
pub use oscillators::{Ao, Cci, Mfi, Momentum, Rsi, Stoch, WilliamsR};
pub use pivots::Pivots;
pub use trend::{Adx, Macd, Psar, SuperTrend};
pub use volatility::{Atr, Bollinger, Chop};
pub use volume::{Obv, Vwap};

/// Current value of one indicator, as it appears in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    /// Not enough history yet. Serialized as `null`.
    #[default]
    Pending,
    Scalar(f64),
    Macd {
        macd: f64,
        signal: f64,
        histogram: f64,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
        width: f64,
        #[serde(rename = "percentB")]
        percent_b: f64,
    },
    Stoch {
        k: f64,
        d: f64,
    },
    Adx {
        adx: f64,
        #[serde(rename = "plusDi")]
        plus_di: f64,
        #[serde(rename = "minusDi")]
        minus_di: f64,
    },
    SuperTrend {
        value: f64,
        /// `1` up, `-1` down.
        direction: i8,
        upper: f64,
        lower: f64,
    },
    Pivots {
        p: f64,
        r1: f64,
        r2: f64,
        r3: f64,
        s1: f64,
        s2: f64,
        s3: f64,
    },
}

impl IndicatorValue {
    pub fn is_pending(&self) -> bool {
        matches!(self, IndicatorValue::Pending)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            IndicatorValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether every number carried is finite (`Pending` counts as finite).
    pub fn is_finite(&self) -> bool {
        use IndicatorValue::*;
        match *self {
            Pending => true,
            Scalar(v) => v.is_finite(),
            Macd {
                macd,
                signal,
                histogram,
            } => [macd, signal, histogram].iter().all(|v| v.is_finite()),
            Bands {
                upper,
                middle,
                lower,
                width,
                percent_b,
            } => [upper, middle, lower, width, percent_b]
                .iter()
                .all(|v| v.is_finite()),
            Stoch { k, d } => k.is_finite() && d.is_finite(),
            Adx {
                adx,
                plus_di,
                minus_di,
            } => [adx, plus_di, minus_di].iter().all(|v| v.is_finite()),
            SuperTrend {
                value, upper, lower, ..
            } => [value, upper, lower].iter().all(|v| v.is_finite()),
            Pivots {
                p,
                r1,
                r2,
                r3,
                s1,
                s2,
                s3,
            } => [p, r1, r2, r3, s1, s2, s3].iter().all(|v| v.is_finite()),
        }
    }
}

impl From<Option<f64>> for IndicatorValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(IndicatorValue::Pending, IndicatorValue::Scalar)
    }
}

/// One stateful indicator instance.
pub trait Indicator: fmt::Debug + Send {
    /// Candles needed before the first non-pending value.
    fn lookback(&self) -> usize;

    /// Back to the freshly constructed state.
    fn reset(&mut self);

    /// Rebuilds state from `history` (oldest first).
    fn seed(&mut self, history: &[Candle]) {
        self.reset();
        for c in history {
            self.step(c);
        }
    }

    /// Advances by one committed candle.
    fn step(&mut self, c: &Candle);

    /// Value if `c` were the next committed candle. Must not change observable state.
    fn preview(&self, c: &Candle) -> IndicatorValue;

    /// Value as of the last committed candle.
    fn value(&self) -> IndicatorValue;

    /// Oldest/newest candle times held in the indicator's window, for windowed indicators.
    fn window_span(&self) -> Option<(i64, i64)> {
        None
    }

    fn clone_box(&self) -> Box<dyn Indicator>;
}

impl Clone for Box<dyn Indicator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Builds the indicator described by `spec`.
pub fn build(spec: &IndicatorSpec) -> Box<dyn Indicator> {
    match *spec {
        IndicatorSpec::Sma(p) => Box::new(Sma::new(p.period, p.source)),
        IndicatorSpec::Ema(p) => Box::new(Ema::new(p.period, p.source)),
        IndicatorSpec::Wma(p) => Box::new(Wma::new(p.period, p.source)),
        IndicatorSpec::Hma(p) => Box::new(Hma::new(p.period, p.source)),
        IndicatorSpec::Vwma(p) => Box::new(Vwma::new(p.period, p.source)),
        IndicatorSpec::VolumeMa(p) => Box::new(Sma::new(p.period, PriceSource::Volume)),
        IndicatorSpec::Rsi(p) => Box::new(Rsi::new(p.period, p.source)),
        IndicatorSpec::Macd(p) => Box::new(Macd::new(p)),
        IndicatorSpec::Stoch(p) => Box::new(Stoch::new(p)),
        IndicatorSpec::Cci(p) => Box::new(Cci::new(p.period, p.source)),
        IndicatorSpec::Adx(p) => Box::new(Adx::new(p.period, p.di_period())),
        IndicatorSpec::Momentum(p) => Box::new(Momentum::new(p.period, p.source)),
        IndicatorSpec::WilliamsR(p) => Box::new(WilliamsR::new(p.period)),
        IndicatorSpec::Mfi(p) => Box::new(Mfi::new(p.period)),
        IndicatorSpec::Ao(p) => Box::new(Ao::new(p.fast, p.slow)),
        IndicatorSpec::Bollinger(p) => Box::new(Bollinger::new(p)),
        IndicatorSpec::Atr(p) => Box::new(Atr::new(p.period)),
        IndicatorSpec::Chop(p) => Box::new(Chop::new(p.period)),
        IndicatorSpec::SuperTrend(p) => Box::new(SuperTrend::new(p.period, p.multiplier)),
        IndicatorSpec::Psar(p) => Box::new(Psar::new(p)),
        IndicatorSpec::Vwap(p) => Box::new(Vwap::new(p)),
        IndicatorSpec::Obv(_) => Box::new(Obv::new()),
        IndicatorSpec::Pivots(p) => Box::new(Pivots::new(p)),
    }
}

struct Slot {
    key: String,
    indicator: Box<dyn Indicator>,
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            indicator: self.indicator.clone_box(),
        }
    }
}

/// All configured indicators, in settings order.
#[derive(Clone)]
pub struct IndicatorBank {
    slots: Vec<Slot>,
}

impl fmt::Debug for IndicatorBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorBank")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl IndicatorBank {
    pub fn new(settings: &ParsedSettings) -> Self {
        let slots = settings
            .entries()
            .iter()
            .map(|e| Slot {
                key: e.key.clone(),
                indicator: build(&e.spec),
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|s| s.key.as_str())
    }

    pub fn max_lookback(&self) -> usize {
        self.slots
            .iter()
            .map(|s| s.indicator.lookback())
            .max()
            .unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<&dyn Indicator> {
        self.slots
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.indicator.as_ref())
    }

    pub fn seed(&mut self, history: &[Candle]) {
        for slot in &mut self.slots {
            slot.indicator.seed(history);
        }
    }

    pub fn step(&mut self, c: &Candle) {
        for slot in &mut self.slots {
            slot.indicator.step(c);
        }
    }

    /// Committed values, in settings order.
    pub fn values(&self) -> impl Iterator<Item = (&str, IndicatorValue)> + '_ {
        self.slots
            .iter()
            .map(|s| (s.key.as_str(), s.indicator.value()))
    }

    /// Values with `c` as the forming candle, in settings order.
    pub fn previews<'a>(
        &'a self,
        c: &'a Candle,
    ) -> impl Iterator<Item = (&'a str, IndicatorValue)> + 'a {
        self.slots
            .iter()
            .map(move |s| (s.key.as_str(), s.indicator.preview(c)))
    }
}
