use super::accum::{mean_stddev, Smoothed, Window};
use super::{Indicator, IndicatorValue};
use crate::settings::BollingerParams;
use crate::Candle;

// ===== Bollinger Bands =====

/// SMA ± `std_dev`·σ with σ the population standard deviation of the window.
///
/// Mean and σ are both computed two-pass over the ring on every read, never from a running
/// sum of squares: at BTC-scale prices `Σx² − n·mean²` cancels most significant digits.
#[derive(Debug, Clone)]
pub struct Bollinger {
    params: BollingerParams,
    window: Window,
}

impl Bollinger {
    pub fn new(params: BollingerParams) -> Self {
        Self {
            params,
            window: Window::new(params.period),
        }
    }

    fn bands<I, F>(&self, values: F, last: f64) -> IndicatorValue
    where
        I: Iterator<Item = f64>,
        F: Fn() -> I,
    {
        let (middle, sd) = mean_stddev(values);
        let upper = middle + self.params.std_dev * sd;
        let lower = middle - self.params.std_dev * sd;
        let spread = upper - lower;
        let width = if middle == 0.0 { 0.0 } else { spread / middle };
        let percent_b = if spread > 0.0 {
            (last - lower) / spread
        } else {
            0.5
        };
        IndicatorValue::Bands {
            upper,
            middle,
            lower,
            width,
            percent_b,
        }
    }
}

impl Indicator for Bollinger {
    fn lookback(&self) -> usize {
        self.window.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        self.window.push(c.time, self.params.source.extract(c));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        if !self.window.peek_ready() {
            return IndicatorValue::Pending;
        }
        let x = self.params.source.extract(c);
        self.bands(|| self.window.peek(x), x)
    }

    fn value(&self) -> IndicatorValue {
        match self.window.newest() {
            Some(last) if self.window.is_full() => self.bands(|| self.window.iter(), last),
            _ => IndicatorValue::Pending,
        }
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.window.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== ATR =====

/// Wilder-smoothed true range. The first candle's true range is `high − low`.
#[derive(Debug, Clone, Copy)]
pub struct Atr {
    prev_close: Option<f64>,
    core: Smoothed,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            core: Smoothed::wilder(period),
        }
    }

    pub fn period(&self) -> usize {
        self.core.period()
    }

    /// Advances and returns the new ATR once seeded.
    pub fn push(&mut self, c: &Candle) -> Option<f64> {
        let tr = c.true_range(self.prev_close);
        self.prev_close = Some(c.close);
        self.core.push(tr)
    }

    pub fn current(&self) -> Option<f64> {
        self.core.value()
    }
}

impl Indicator for Atr {
    fn lookback(&self) -> usize {
        self.core.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.core.period());
    }

    fn step(&mut self, c: &Candle) {
        self.push(c);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.push(c).into()
    }

    fn value(&self) -> IndicatorValue {
        self.current().into()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== Choppiness =====

/// `100 · log10(ΣTR / (HH − LL)) / log10(n)`, clamped to `[0, 100]`.
#[derive(Debug, Clone)]
pub struct Chop {
    prev_close: Option<f64>,
    tr: Window,
    highs: Window,
    lows: Window,
}

impl Chop {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            tr: Window::new(period),
            highs: Window::new(period),
            lows: Window::new(period),
        }
    }

    fn chop(tr_sum: f64, highest: f64, lowest: f64, n: usize) -> f64 {
        let range = highest - lowest;
        if range <= 0.0 || tr_sum <= 0.0 || n < 2 {
            return 0.0;
        }
        let v = 100.0 * (tr_sum / range).log10() / (n as f64).log10();
        if v.is_finite() {
            v.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

impl Indicator for Chop {
    fn lookback(&self) -> usize {
        self.tr.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.tr.period());
    }

    fn step(&mut self, c: &Candle) {
        self.tr.push(c.time, c.true_range(self.prev_close));
        self.highs.push(c.time, c.high);
        self.lows.push(c.time, c.low);
        self.prev_close = Some(c.close);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let (Some(hh), Some(ll)) = (self.highs.peek_max(c.high), self.lows.peek_min(c.low)) else {
            return IndicatorValue::Pending;
        };
        let tr = c.true_range(self.prev_close);
        IndicatorValue::Scalar(Self::chop(self.tr.peek(tr).sum(), hh, ll, self.tr.period()))
    }

    fn value(&self) -> IndicatorValue {
        match (self.highs.max(), self.lows.min()) {
            (Some(hh), Some(ll)) => {
                IndicatorValue::Scalar(Self::chop(self.tr.iter().sum(), hh, ll, self.tr.period()))
            }
            _ => IndicatorValue::Pending,
        }
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.tr.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}
