use super::accum::{weighted_mean, Smoothed, Window};
use super::{Indicator, IndicatorValue};
use crate::{Candle, PriceSource};

// ===== SMA =====

#[derive(Debug, Clone)]
pub struct Sma {
    source: PriceSource,
    window: Window,
}

impl Sma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            window: Window::new(period),
        }
    }
}

impl Indicator for Sma {
    fn lookback(&self) -> usize {
        self.window.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.window.period(), self.source);
    }

    fn step(&mut self, c: &Candle) {
        self.window.push(c.time, self.source.extract(c));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        self.window.peek_mean(self.source.extract(c)).into()
    }

    fn value(&self) -> IndicatorValue {
        self.window.mean().into()
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.window.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== EMA =====

/// SMA-seeded exponential moving average.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    source: PriceSource,
    core: Smoothed,
}

impl Ema {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            core: Smoothed::ema(period),
        }
    }
}

impl Indicator for Ema {
    fn lookback(&self) -> usize {
        self.core.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.core.period(), self.source);
    }

    fn step(&mut self, c: &Candle) {
        self.core.push(self.source.extract(c));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        self.core.peek(self.source.extract(c)).into()
    }

    fn value(&self) -> IndicatorValue {
        self.core.value().into()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== WMA =====

#[derive(Debug, Clone)]
pub struct Wma {
    source: PriceSource,
    window: Window,
}

impl Wma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            window: Window::new(period),
        }
    }
}

impl Indicator for Wma {
    fn lookback(&self) -> usize {
        self.window.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.window.period(), self.source);
    }

    fn step(&mut self, c: &Candle) {
        self.window.push(c.time, self.source.extract(c));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        if !self.window.peek_ready() {
            return IndicatorValue::Pending;
        }
        IndicatorValue::Scalar(weighted_mean(self.window.peek(self.source.extract(c))))
    }

    fn value(&self) -> IndicatorValue {
        if !self.window.is_full() {
            return IndicatorValue::Pending;
        }
        IndicatorValue::Scalar(weighted_mean(self.window.iter()))
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.window.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== HMA =====

/// Hull moving average: `WMA(2·WMA(n/2) − WMA(n), round(√n))`.
#[derive(Debug, Clone)]
pub struct Hma {
    period: usize,
    source: PriceSource,
    half: Window,
    full: Window,
    diff: Window,
}

impl Hma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        let sqrt = ((period as f64).sqrt().round() as usize).max(1);
        Self {
            period,
            source,
            half: Window::new((period / 2).max(1)),
            full: Window::new(period),
            diff: Window::new(sqrt),
        }
    }
}

impl Indicator for Hma {
    fn lookback(&self) -> usize {
        self.full.period().saturating_add(self.diff.period()) - 1
    }

    fn reset(&mut self) {
        *self = Self::new(self.period, self.source);
    }

    fn step(&mut self, c: &Candle) {
        let x = self.source.extract(c);
        self.half.push(c.time, x);
        self.full.push(c.time, x);
        if self.full.is_full() {
            let d = 2.0 * weighted_mean(self.half.iter()) - weighted_mean(self.full.iter());
            self.diff.push(c.time, d);
        }
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        if !self.full.peek_ready() || !self.diff.peek_ready() {
            return IndicatorValue::Pending;
        }
        let x = self.source.extract(c);
        let d = 2.0 * weighted_mean(self.half.peek(x)) - weighted_mean(self.full.peek(x));
        IndicatorValue::Scalar(weighted_mean(self.diff.peek(d)))
    }

    fn value(&self) -> IndicatorValue {
        if !self.diff.is_full() {
            return IndicatorValue::Pending;
        }
        IndicatorValue::Scalar(weighted_mean(self.diff.iter()))
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.full.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== VWMA =====

/// Volume-weighted moving average; falls back to the plain SMA when the window has no
/// volume.
#[derive(Debug, Clone)]
pub struct Vwma {
    source: PriceSource,
    prices: Window,
    weighted: Window,
    volumes: Window,
}

impl Vwma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            prices: Window::new(period),
            weighted: Window::new(period),
            volumes: Window::new(period),
        }
    }

    fn vwma(price_sum: f64, weighted_sum: f64, volume_sum: f64, has_volume: bool, n: usize) -> f64 {
        if has_volume && volume_sum > 0.0 {
            weighted_sum / volume_sum
        } else {
            price_sum / n as f64
        }
    }
}

impl Indicator for Vwma {
    fn lookback(&self) -> usize {
        self.prices.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.prices.period(), self.source);
    }

    fn step(&mut self, c: &Candle) {
        let x = self.source.extract(c);
        self.prices.push(c.time, x);
        self.weighted.push(c.time, x * c.volume);
        self.volumes.push(c.time, c.volume);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        if !self.prices.peek_ready() {
            return IndicatorValue::Pending;
        }
        let x = self.source.extract(c);
        let has_volume = self.volumes.peek(c.volume).any(|v| v > 0.0);
        IndicatorValue::Scalar(Self::vwma(
            self.prices.peek_sum(x),
            self.weighted.peek_sum(x * c.volume),
            self.volumes.peek_sum(c.volume),
            has_volume,
            self.prices.period(),
        ))
    }

    fn value(&self) -> IndicatorValue {
        if !self.prices.is_full() {
            return IndicatorValue::Pending;
        }
        let has_volume = self.volumes.iter().any(|v| v > 0.0);
        IndicatorValue::Scalar(Self::vwma(
            self.prices.sum(),
            self.weighted.sum(),
            self.volumes.sum(),
            has_volume,
            self.prices.period(),
        ))
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.prices.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::{assert_close, candles};

    fn closes(data: &[Candle]) -> Vec<f64> {
        data.iter().map(|c| c.close).collect()
    }

    fn wma_ref(xs: &[f64]) -> f64 {
        let n = xs.len() as f64;
        let num: f64 = xs.iter().enumerate().map(|(i, x)| (i as f64 + 1.0) * x).sum();
        num / (n * (n + 1.0) / 2.0)
    }

    #[test]
    fn sma_over_window() {
        let data = candles(30);
        let mut sma = Sma::new(5, PriceSource::Close);
        sma.seed(&data);
        let xs = closes(&data);
        let expect: f64 = xs[25..].iter().sum::<f64>() / 5.0;
        assert_close(sma.value().as_scalar().unwrap(), expect);
        assert_eq!(sma.window_span(), Some((data[25].time, data[29].time)));
    }

    #[test]
    fn ema_pending_then_seeded() {
        let data = candles(12);
        let mut ema = Ema::new(10, PriceSource::Close);
        ema.seed(&data[..9]);
        assert!(ema.value().is_pending());
        ema.step(&data[9]);
        let xs = closes(&data);
        let sma: f64 = xs[..10].iter().sum::<f64>() / 10.0;
        assert_close(ema.value().as_scalar().unwrap(), sma);
        ema.step(&data[10]);
        let alpha = 2.0 / 11.0;
        assert_close(
            ema.value().as_scalar().unwrap(),
            sma + alpha * (xs[10] - sma),
        );
    }

    #[test]
    fn wma_and_hma_reference() {
        let data = candles(40);
        let xs = closes(&data);

        let mut wma = Wma::new(6, PriceSource::Close);
        wma.seed(&data);
        assert_close(wma.value().as_scalar().unwrap(), wma_ref(&xs[34..]));

        // HMA(9): half 4, full 9, sqrt 3
        let mut hma = Hma::new(9, PriceSource::Close);
        hma.seed(&data);
        let diff: Vec<f64> = (37..40)
            .map(|end| 2.0 * wma_ref(&xs[end + 1 - 4..=end]) - wma_ref(&xs[end + 1 - 9..=end]))
            .collect();
        assert_close(hma.value().as_scalar().unwrap(), wma_ref(&diff));
        assert_eq!(hma.lookback(), 11);
    }

    #[test]
    fn vwma_falls_back_without_volume() {
        let mut vwma = Vwma::new(3, PriceSource::Close);
        for (t, close) in [10.0, 20.0, 30.0].into_iter().enumerate() {
            vwma.step(&Candle::flat(t as i64, close, 0.0));
        }
        assert_eq!(vwma.value(), IndicatorValue::Scalar(20.0));

        let weighted = Candle::flat(3, 40.0, 2.0);
        assert_eq!(vwma.preview(&weighted), IndicatorValue::Scalar(40.0));
        vwma.step(&weighted);
        vwma.step(&Candle::flat(4, 10.0, 2.0));
        // (40*2 + 10*2) / 4
        assert_eq!(vwma.value(), IndicatorValue::Scalar(25.0));
    }
}
