//! Building blocks shared by the indicators: a seeded exponential smoother and a bounded
//! window with a running sum. Both support `peek`, the value the accumulator would hold
//! after one more sample, without mutating anything.

use crate::circular::CircularColumn;

/// Exponential smoother seeded by the simple average of its first `period` inputs.
///
/// `ema` uses `α = 2 / (period + 1)`, `wilder` uses `α = 1 / period`. `Copy`, so a preview
/// is a copy plus one `push`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    period: usize,
    alpha: f64,
    count: usize,
    seed_sum: f64,
    value: f64,
}

impl Smoothed {
    pub fn ema(period: usize) -> Self {
        Self::with_alpha(period, 2.0 / (period as f64 + 1.0))
    }

    pub fn wilder(period: usize) -> Self {
        Self::with_alpha(period, 1.0 / period.max(1) as f64)
    }

    fn with_alpha(period: usize, alpha: f64) -> Self {
        Self {
            period: period.max(1),
            alpha,
            count: 0,
            seed_sum: 0.0,
            value: f64::NAN,
        }
    }

    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.count >= self.period
    }

    /// Feeds one input; returns the smoothed value once `period` inputs were seen.
    #[inline]
    pub fn push(&mut self, x: f64) -> Option<f64> {
        self.count = self.count.saturating_add(1);
        if self.count < self.period {
            self.seed_sum += x;
            return None;
        }
        if self.count == self.period {
            self.seed_sum += x;
            self.value = self.seed_sum / self.period as f64;
        } else {
            self.value += self.alpha * (x - self.value);
        }
        Some(self.value)
    }

    #[inline]
    pub fn peek(&self, x: f64) -> Option<f64> {
        let mut next = *self;
        next.push(x)
    }

    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.is_ready().then_some(self.value)
    }
}

/// Bounded window of the last `period` values (with their candle times) plus a running sum.
///
/// The running sum is recomputed from the ring every `period` evictions so subtraction
/// error cannot accumulate past one window's worth of updates.
#[derive(Debug, Clone)]
pub struct Window {
    values: CircularColumn<f64>,
    times: CircularColumn<i64>,
    sum: f64,
    evictions: usize,
}

impl Window {
    pub fn new(period: usize) -> Self {
        Self {
            values: CircularColumn::new(period),
            times: CircularColumn::new(period),
            sum: 0.0,
            evictions: 0,
        }
    }

    #[inline]
    pub fn period(&self) -> usize {
        self.values.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.is_full()
    }

    /// Whether the window would be full after one more value.
    #[inline]
    pub fn peek_ready(&self) -> bool {
        self.len() + 1 >= self.period()
    }

    /// Appends `x` stamped with `time`; returns the evicted value.
    pub fn push(&mut self, time: i64, x: f64) -> Option<f64> {
        self.times.push(time);
        let evicted = self.values.push(x);
        match evicted {
            Some(old) => {
                self.sum += x - old;
                // resync from the ring once per full turnover
                self.evictions += 1;
                if self.evictions >= self.period() {
                    self.sum = self.values.iter().sum();
                    self.evictions = 0;
                }
            }
            None => self.sum += x,
        }
        evicted
    }

    /// `push` followed by `mean`.
    #[inline]
    pub fn push_mean(&mut self, time: i64, x: f64) -> Option<f64> {
        self.push(time, x);
        self.mean()
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Running sum after pushing `x`, bit-identical to what `push` would produce.
    pub fn peek_sum(&self, x: f64) -> f64 {
        match self.values.oldest() {
            Some(_) if self.is_full() && self.evictions + 1 >= self.period() => self.peek(x).sum(),
            Some(old) if self.is_full() => self.sum + (x - old),
            _ => self.sum + x,
        }
    }

    pub fn mean(&self) -> Option<f64> {
        self.is_full().then(|| self.sum / self.period() as f64)
    }

    pub fn peek_mean(&self, x: f64) -> Option<f64> {
        self.peek_ready()
            .then(|| self.peek_sum(x) / self.period() as f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter()
    }

    /// The window's contents as if `x` had been pushed.
    pub fn peek(&self, x: f64) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(usize::from(self.is_full()))
            .chain(core::iter::once(x))
    }

    #[inline]
    pub fn newest(&self) -> Option<f64> {
        self.values.newest()
    }

    #[inline]
    pub fn oldest(&self) -> Option<f64> {
        self.values.oldest()
    }

    /// Oldest value after pushing `x`.
    pub fn peek_oldest(&self, x: f64) -> f64 {
        let next = if self.is_full() {
            self.values.get(1)
        } else {
            self.values.oldest()
        };
        next.unwrap_or(x)
    }

    pub fn max(&self) -> Option<f64> {
        self.is_full().then(|| fold_max(self.iter()))
    }

    pub fn min(&self) -> Option<f64> {
        self.is_full().then(|| fold_min(self.iter()))
    }

    pub fn peek_max(&self, x: f64) -> Option<f64> {
        self.peek_ready().then(|| fold_max(self.peek(x)))
    }

    pub fn peek_min(&self, x: f64) -> Option<f64> {
        self.peek_ready().then(|| fold_min(self.peek(x)))
    }

    /// Oldest and newest timestamps held in the window.
    pub fn span(&self) -> Option<(i64, i64)> {
        Some((self.times.oldest()?, self.times.newest()?))
    }
}

fn fold_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

fn fold_min(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

/// Linearly weighted mean, weights `1..=n` from oldest to newest.
pub fn weighted_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (num, den, _) = values.fold((0.0, 0.0, 1.0), |(num, den, w), x| {
        (num + w * x, den + w, w + 1.0)
    });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Two-pass population mean and standard deviation.
///
/// `values` is called twice; the second pass sums squared deviations from the first
/// pass's mean, which stays exact at large price magnitudes.
pub fn mean_stddev<I, F>(values: F) -> (f64, f64)
where
    I: Iterator<Item = f64>,
    F: Fn() -> I,
{
    let (sum, n) = values().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let ss: f64 = values().map(|x| (x - mean) * (x - mean)).sum();
    (mean, (ss / n as f64).sqrt())
}
