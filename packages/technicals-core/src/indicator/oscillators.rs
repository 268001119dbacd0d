use super::accum::{Smoothed, Window};
use super::{Indicator, IndicatorValue};
use crate::settings::StochParams;
use crate::{Candle, PriceSource};

// ===== RSI =====

/// Wilder RSI. Flat input reads 50, gains without losses read 100.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    source: PriceSource,
    prev: Option<f64>,
    gain: Smoothed,
    loss: Smoothed,
}

impl Rsi {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            prev: None,
            gain: Smoothed::wilder(period),
            loss: Smoothed::wilder(period),
        }
    }

    fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_gain == 0.0 && avg_loss == 0.0 {
            return 50.0;
        }
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

impl Indicator for Rsi {
    fn lookback(&self) -> usize {
        self.gain.period().saturating_add(1)
    }

    fn reset(&mut self) {
        *self = Self::new(self.gain.period(), self.source);
    }

    fn step(&mut self, c: &Candle) {
        let x = self.source.extract(c);
        if let Some(prev) = self.prev {
            let change = x - prev;
            self.gain.push(change.max(0.0));
            self.loss.push((-change).max(0.0));
        }
        self.prev = Some(x);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        match (self.gain.value(), self.loss.value()) {
            (Some(g), Some(l)) => IndicatorValue::Scalar(Self::rsi_from(g, l)),
            _ => IndicatorValue::Pending,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== Stochastic =====

fn range_position(x: f64, highest: f64, lowest: f64) -> Option<f64> {
    let range = highest - lowest;
    (range > 0.0).then(|| (x - lowest) / range)
}

/// Slow stochastic: raw %K over `k`, smoothed by an SMA of `smooth`, %D an SMA of `d`.
#[derive(Debug, Clone)]
pub struct Stoch {
    params: StochParams,
    highs: Window,
    lows: Window,
    smooth: Window,
    d: Window,
}

impl Stoch {
    pub fn new(params: StochParams) -> Self {
        Self {
            params,
            highs: Window::new(params.k),
            lows: Window::new(params.k),
            smooth: Window::new(params.smooth),
            d: Window::new(params.d),
        }
    }

    fn raw_k(close: f64, highest: f64, lowest: f64) -> f64 {
        range_position(close, highest, lowest).map_or(50.0, |p| 100.0 * p)
    }
}

impl Indicator for Stoch {
    fn lookback(&self) -> usize {
        self.params
            .k
            .saturating_add(self.params.smooth)
            .saturating_add(self.params.d)
            .saturating_sub(2)
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        self.highs.push(c.time, c.high);
        self.lows.push(c.time, c.low);
        let (Some(hh), Some(ll)) = (self.highs.max(), self.lows.min()) else {
            return;
        };
        if let Some(k) = self.smooth.push_mean(c.time, Self::raw_k(c.close, hh, ll)) {
            self.d.push(c.time, k);
        }
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let (Some(hh), Some(ll)) = (self.highs.peek_max(c.high), self.lows.peek_min(c.low)) else {
            return IndicatorValue::Pending;
        };
        let Some(k) = self.smooth.peek_mean(Self::raw_k(c.close, hh, ll)) else {
            return IndicatorValue::Pending;
        };
        match self.d.peek_mean(k) {
            Some(d) => IndicatorValue::Stoch { k, d },
            None => IndicatorValue::Pending,
        }
    }

    fn value(&self) -> IndicatorValue {
        match (self.d.newest(), self.d.mean()) {
            (Some(k), Some(d)) => IndicatorValue::Stoch { k, d },
            _ => IndicatorValue::Pending,
        }
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.highs.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== CCI =====

/// Commodity channel index with the customary 0.015 constant. Zero mean deviation reads 0.
#[derive(Debug, Clone)]
pub struct Cci {
    source: PriceSource,
    window: Window,
}

impl Cci {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            window: Window::new(period),
        }
    }

    fn cci<I, F>(values: F, last: f64) -> f64
    where
        I: Iterator<Item = f64>,
        F: Fn() -> I,
    {
        let (sum, n) = values().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
        let mean = sum / n as f64;
        let mean_dev = values().map(|x| (x - mean).abs()).sum::<f64>() / n as f64;
        if mean_dev == 0.0 {
            0.0
        } else {
            (last - mean) / (0.015 * mean_dev)
        }
    }
}

impl Indicator for Cci {
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
        let x = self.source.extract(c);
        IndicatorValue::Scalar(Self::cci(|| self.window.peek(x), x))
    }

    fn value(&self) -> IndicatorValue {
        match self.window.newest() {
            Some(last) if self.window.is_full() => {
                IndicatorValue::Scalar(Self::cci(|| self.window.iter(), last))
            }
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

// ===== Momentum =====

/// `x_t − x_{t−period}`.
#[derive(Debug, Clone)]
pub struct Momentum {
    source: PriceSource,
    window: Window,
}

impl Momentum {
    pub fn new(period: usize, source: PriceSource) -> Self {
        Self {
            source,
            window: Window::new(period.saturating_add(1)),
        }
    }
}

impl Indicator for Momentum {
    fn lookback(&self) -> usize {
        self.window.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.window.period() - 1, self.source);
    }

    fn step(&mut self, c: &Candle) {
        self.window.push(c.time, self.source.extract(c));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        if !self.window.peek_ready() {
            return IndicatorValue::Pending;
        }
        let x = self.source.extract(c);
        IndicatorValue::Scalar(x - self.window.peek_oldest(x))
    }

    fn value(&self) -> IndicatorValue {
        match (self.window.newest(), self.window.oldest()) {
            (Some(last), Some(first)) if self.window.is_full() => {
                IndicatorValue::Scalar(last - first)
            }
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

// ===== Williams %R =====

/// In `[-100, 0]`; a flat window reads -50.
#[derive(Debug, Clone)]
pub struct WilliamsR {
    highs: Window,
    lows: Window,
    close: Option<f64>,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        Self {
            highs: Window::new(period),
            lows: Window::new(period),
            close: None,
        }
    }

    fn wr(close: f64, highest: f64, lowest: f64) -> f64 {
        range_position(close, highest, lowest).map_or(-50.0, |p| -100.0 * (1.0 - p))
    }
}

impl Indicator for WilliamsR {
    fn lookback(&self) -> usize {
        self.highs.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.highs.period());
    }

    fn step(&mut self, c: &Candle) {
        self.highs.push(c.time, c.high);
        self.lows.push(c.time, c.low);
        self.close = Some(c.close);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        match (self.highs.peek_max(c.high), self.lows.peek_min(c.low)) {
            (Some(hh), Some(ll)) => IndicatorValue::Scalar(Self::wr(c.close, hh, ll)),
            _ => IndicatorValue::Pending,
        }
    }

    fn value(&self) -> IndicatorValue {
        match (self.highs.max(), self.lows.min(), self.close) {
            (Some(hh), Some(ll), Some(close)) => IndicatorValue::Scalar(Self::wr(close, hh, ll)),
            _ => IndicatorValue::Pending,
        }
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.highs.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== MFI =====

/// Money flow index over typical price. No negative flow reads 100, or 50 when there is
/// no positive flow either.
#[derive(Debug, Clone)]
pub struct Mfi {
    prev_tp: Option<f64>,
    positive: Window,
    negative: Window,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        Self {
            prev_tp: None,
            positive: Window::new(period),
            negative: Window::new(period),
        }
    }

    fn flows(c: &Candle, prev_tp: f64) -> (f64, f64, f64) {
        let tp = c.hlc3();
        let flow = tp * c.volume;
        if tp > prev_tp {
            (tp, flow, 0.0)
        } else if tp < prev_tp {
            (tp, 0.0, flow)
        } else {
            (tp, 0.0, 0.0)
        }
    }

    fn mfi(pos: f64, neg: f64) -> f64 {
        if neg <= 0.0 {
            return if pos <= 0.0 { 50.0 } else { 100.0 };
        }
        100.0 - 100.0 / (1.0 + pos / neg)
    }
}

impl Indicator for Mfi {
    fn lookback(&self) -> usize {
        self.positive.period().saturating_add(1)
    }

    fn reset(&mut self) {
        *self = Self::new(self.positive.period());
    }

    fn step(&mut self, c: &Candle) {
        let Some(prev_tp) = self.prev_tp else {
            self.prev_tp = Some(c.hlc3());
            return;
        };
        let (tp, pos, neg) = Self::flows(c, prev_tp);
        self.positive.push(c.time, pos);
        self.negative.push(c.time, neg);
        self.prev_tp = Some(tp);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let Some(prev_tp) = self.prev_tp else {
            return IndicatorValue::Pending;
        };
        if !self.positive.peek_ready() {
            return IndicatorValue::Pending;
        }
        let (_, pos, neg) = Self::flows(c, prev_tp);
        IndicatorValue::Scalar(Self::mfi(
            self.positive.peek(pos).sum(),
            self.negative.peek(neg).sum(),
        ))
    }

    fn value(&self) -> IndicatorValue {
        if !self.positive.is_full() {
            return IndicatorValue::Pending;
        }
        IndicatorValue::Scalar(Self::mfi(
            self.positive.iter().sum(),
            self.negative.iter().sum(),
        ))
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.positive.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

// ===== Awesome oscillator =====

/// `SMA(hl2, fast) − SMA(hl2, slow)`.
#[derive(Debug, Clone)]
pub struct Ao {
    fast: Window,
    slow: Window,
}

impl Ao {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self {
            fast: Window::new(fast),
            slow: Window::new(slow),
        }
    }
}

impl Indicator for Ao {
    fn lookback(&self) -> usize {
        self.fast.period().max(self.slow.period())
    }

    fn reset(&mut self) {
        *self = Self::new(self.fast.period(), self.slow.period());
    }

    fn step(&mut self, c: &Candle) {
        self.fast.push(c.time, c.hl2());
        self.slow.push(c.time, c.hl2());
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        match (self.fast.peek_mean(c.hl2()), self.slow.peek_mean(c.hl2())) {
            (Some(f), Some(s)) => IndicatorValue::Scalar(f - s),
            _ => IndicatorValue::Pending,
        }
    }

    fn value(&self) -> IndicatorValue {
        match (self.fast.mean(), self.slow.mean()) {
            (Some(f), Some(s)) => IndicatorValue::Scalar(f - s),
            _ => IndicatorValue::Pending,
        }
    }

    fn window_span(&self) -> Option<(i64, i64)> {
        self.slow.span()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::{assert_close, candles};

    fn flat(n: usize, price: f64) -> Vec<Candle> {
        (0..n).map(|i| Candle::flat(i as i64, price, 1.0)).collect()
    }

    #[test]
    fn rsi_sentinels() {
        let mut rsi = Rsi::new(14, PriceSource::Close);
        rsi.seed(&flat(20, 100.0));
        assert_eq!(rsi.value(), IndicatorValue::Scalar(50.0));

        let rising: Vec<Candle> = (0..20).map(|i| Candle::flat(i, 100.0 + i as f64, 1.0)).collect();
        rsi.seed(&rising);
        assert_eq!(rsi.value(), IndicatorValue::Scalar(100.0));

        rsi.seed(&rising[..14]);
        assert!(rsi.value().is_pending());
        assert_eq!(rsi.lookback(), 15);
    }

    #[test]
    fn rsi_wilder_reference() {
        let data = candles(60);
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        let period = 14;
        let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let mut ag = diffs[..period].iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
        let mut al = diffs[..period].iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
        for d in &diffs[period..] {
            ag = (ag * (period as f64 - 1.0) + d.max(0.0)) / period as f64;
            al = (al * (period as f64 - 1.0) + (-d).max(0.0)) / period as f64;
        }
        let expect = 100.0 - 100.0 / (1.0 + ag / al);

        let mut rsi = Rsi::new(period, PriceSource::Close);
        rsi.seed(&data);
        assert_close(rsi.value().as_scalar().unwrap(), expect);
    }

    #[test]
    fn stoch_and_williams_flat_sentinels() {
        let data = flat(30, 42.0);
        let mut stoch = Stoch::new(StochParams::default());
        stoch.seed(&data);
        assert_eq!(stoch.value(), IndicatorValue::Stoch { k: 50.0, d: 50.0 });

        let mut wr = WilliamsR::new(14);
        wr.seed(&data);
        assert_eq!(wr.value(), IndicatorValue::Scalar(-50.0));
    }

    #[test]
    fn stoch_bounds_and_williams_relation() {
        let data = candles(80);
        let mut stoch = Stoch::new(StochParams { k: 14, smooth: 1, d: 3 });
        let mut wr = WilliamsR::new(14);
        stoch.seed(&data);
        wr.seed(&data);
        let IndicatorValue::Stoch { k, d } = stoch.value() else {
            panic!("stoch pending");
        };
        assert!((0.0..=100.0).contains(&k) && (0.0..=100.0).contains(&d));
        // unsmoothed %K and %R are the same position, offset by 100
        assert_close(wr.value().as_scalar().unwrap(), k - 100.0);
    }

    #[test]
    fn cci_zero_deviation_and_reference() {
        let mut cci = Cci::new(20, PriceSource::Hlc3);
        cci.seed(&flat(25, 7.0));
        assert_eq!(cci.value(), IndicatorValue::Scalar(0.0));

        let data = candles(50);
        cci.seed(&data);
        let tp: Vec<f64> = data[30..].iter().map(|c| c.hlc3()).collect();
        let mean = tp.iter().sum::<f64>() / 20.0;
        let md = tp.iter().map(|x| (x - mean).abs()).sum::<f64>() / 20.0;
        assert_close(cci.value().as_scalar().unwrap(), (tp[19] - mean) / (0.015 * md));
    }

    #[test]
    fn momentum_difference() {
        let data = candles(30);
        let mut mom = Momentum::new(10, PriceSource::Close);
        mom.seed(&data[..10]);
        assert!(mom.value().is_pending());
        mom.seed(&data);
        assert_close(mom.value().as_scalar().unwrap(), data[29].close - data[19].close);
    }

    #[test]
    fn mfi_sentinels() {
        let mut mfi = Mfi::new(5);
        mfi.seed(&flat(10, 3.0));
        assert_eq!(mfi.value(), IndicatorValue::Scalar(50.0));

        let rising: Vec<Candle> = (0..10).map(|i| Candle::flat(i, 10.0 + i as f64, 5.0)).collect();
        mfi.seed(&rising);
        assert_eq!(mfi.value(), IndicatorValue::Scalar(100.0));
    }

    #[test]
    fn ao_difference_of_means() {
        let data = candles(60);
        let mut ao = Ao::new(5, 34);
        ao.seed(&data);
        let hl2: Vec<f64> = data.iter().map(|c| c.hl2()).collect();
        let fast = hl2[55..].iter().sum::<f64>() / 5.0;
        let slow = hl2[26..].iter().sum::<f64>() / 34.0;
        assert_close(ao.value().as_scalar().unwrap(), fast - slow);
    }
}
