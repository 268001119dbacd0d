use super::accum::Smoothed;
use super::volatility::Atr;
use super::{Indicator, IndicatorValue};
use crate::settings::{MacdParams, PsarParams};
use crate::Candle;

// ===== MACD =====

/// `macd = EMA(fast) − EMA(slow)`, `signal = EMA(macd, signal)`, `histogram = macd − signal`.
///
/// The signal line is seeded by the SMA of the first `signal` MACD values, so the
/// indicator is pending for `max(fast, slow) + signal − 1` candles.
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    params: MacdParams,
    fast: Smoothed,
    slow: Smoothed,
    signal: Smoothed,
    line: Option<f64>,
}

impl Macd {
    pub fn new(params: MacdParams) -> Self {
        Self {
            params,
            fast: Smoothed::ema(params.fast),
            slow: Smoothed::ema(params.slow),
            signal: Smoothed::ema(params.signal),
            line: None,
        }
    }
}

impl Indicator for Macd {
    fn lookback(&self) -> usize {
        self.params
            .fast
            .max(self.params.slow)
            .saturating_add(self.params.signal)
            - 1
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        let x = self.params.source.extract(c);
        let (Some(fast), Some(slow)) = (self.fast.push(x), self.slow.push(x)) else {
            return;
        };
        let line = fast - slow;
        self.line = Some(line);
        self.signal.push(line);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        match (self.line, self.signal.value()) {
            (Some(macd), Some(signal)) => IndicatorValue::Macd {
                macd,
                signal,
                histogram: macd - signal,
            },
            _ => IndicatorValue::Pending,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== ADX =====

/// Wilder ADX with +DI/−DI over `di_period` and DX smoothed over `period`.
/// Zero true range or a zero DI sum reads 0.
#[derive(Debug, Clone, Copy)]
pub struct Adx {
    period: usize,
    di_period: usize,
    prev: Option<Candle>,
    tr: Smoothed,
    plus_dm: Smoothed,
    minus_dm: Smoothed,
    adx: Smoothed,
    di: Option<(f64, f64)>,
}

impl Adx {
    pub fn new(period: usize, di_period: usize) -> Self {
        Self {
            period,
            di_period,
            prev: None,
            tr: Smoothed::wilder(di_period),
            plus_dm: Smoothed::wilder(di_period),
            minus_dm: Smoothed::wilder(di_period),
            adx: Smoothed::wilder(period),
            di: None,
        }
    }

    fn ratio(num: f64, den: f64) -> f64 {
        if den > 0.0 {
            100.0 * num / den
        } else {
            0.0
        }
    }
}

impl Indicator for Adx {
    fn lookback(&self) -> usize {
        self.di_period.saturating_add(self.period)
    }

    fn reset(&mut self) {
        *self = Self::new(self.period, self.di_period);
    }

    fn step(&mut self, c: &Candle) {
        let Some(prev) = self.prev.replace(*c) else {
            return;
        };
        let up = c.high - prev.high;
        let down = prev.low - c.low;
        let plus = if up > down && up > 0.0 { up } else { 0.0 };
        let minus = if down > up && down > 0.0 { down } else { 0.0 };

        let tr = self.tr.push(c.true_range(Some(prev.close)));
        let pdm = self.plus_dm.push(plus);
        let mdm = self.minus_dm.push(minus);
        let (Some(tr), Some(pdm), Some(mdm)) = (tr, pdm, mdm) else {
            return;
        };
        let plus_di = Self::ratio(pdm, tr);
        let minus_di = Self::ratio(mdm, tr);
        self.di = Some((plus_di, minus_di));
        self.adx
            .push(Self::ratio((plus_di - minus_di).abs(), plus_di + minus_di));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        match (self.adx.value(), self.di) {
            (Some(adx), Some((plus_di, minus_di))) => IndicatorValue::Adx {
                adx,
                plus_di,
                minus_di,
            },
            _ => IndicatorValue::Pending,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== SuperTrend =====

/// ATR band flip. Starts in an up-trend; flips down when the close breaks the lower band
/// and back up when it breaks the upper band.
#[derive(Debug, Clone, Copy)]
pub struct SuperTrend {
    multiplier: f64,
    atr: Atr,
    prev_close: Option<f64>,
    /// Final (upper, lower) bands of the last committed candle.
    bands: Option<(f64, f64)>,
    direction: i8,
}

impl SuperTrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            multiplier,
            atr: Atr::new(period),
            prev_close: None,
            bands: None,
            direction: 1,
        }
    }
}

impl Indicator for SuperTrend {
    fn lookback(&self) -> usize {
        self.atr.period()
    }

    fn reset(&mut self) {
        *self = Self::new(self.atr.period(), self.multiplier);
    }

    fn step(&mut self, c: &Candle) {
        let prev_close = self.prev_close.replace(c.close);
        let Some(atr) = self.atr.push(c) else {
            return;
        };
        let basic_upper = c.hl2() + self.multiplier * atr;
        let basic_lower = c.hl2() - self.multiplier * atr;

        let (upper, lower) = match (self.bands, prev_close) {
            (Some((prev_upper, prev_lower)), Some(pc)) => {
                let upper = if basic_upper < prev_upper || pc > prev_upper {
                    basic_upper
                } else {
                    prev_upper
                };
                let lower = if basic_lower > prev_lower || pc < prev_lower {
                    basic_lower
                } else {
                    prev_lower
                };
                (upper, lower)
            }
            _ => (basic_upper, basic_lower),
        };

        if self.bands.is_some() {
            if self.direction == 1 && c.close < lower {
                self.direction = -1;
            } else if self.direction == -1 && c.close > upper {
                self.direction = 1;
            }
        }
        self.bands = Some((upper, lower));
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        let Some((upper, lower)) = self.bands else {
            return IndicatorValue::Pending;
        };
        IndicatorValue::SuperTrend {
            value: if self.direction == 1 { lower } else { upper },
            direction: self.direction,
            upper,
            lower,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== Parabolic SAR =====

#[derive(Debug, Clone, Copy)]
struct SarState {
    rising: bool,
    sar: f64,
    extreme: f64,
    af: f64,
}

/// Wilder's parabolic stop-and-reverse. The trend of the second candle is taken from the
/// direction of its close relative to the first.
#[derive(Debug, Clone, Copy)]
pub struct Psar {
    params: PsarParams,
    prev: Option<Candle>,
    prev2: Option<Candle>,
    state: Option<SarState>,
}

impl Psar {
    pub fn new(params: PsarParams) -> Self {
        Self {
            params,
            prev: None,
            prev2: None,
            state: None,
        }
    }

    fn advance(&self, s: SarState, c: &Candle, prev: &Candle) -> SarState {
        let PsarParams {
            start,
            increment,
            max,
        } = self.params;
        let mut sar = s.sar + s.af * (s.extreme - s.sar);
        if s.rising {
            sar = sar.min(prev.low);
            if let Some(p2) = self.prev2 {
                sar = sar.min(p2.low);
            }
            if c.low < sar {
                return SarState {
                    rising: false,
                    sar: s.extreme.max(c.high),
                    extreme: c.low,
                    af: start,
                };
            }
            let (extreme, af) = if c.high > s.extreme {
                (c.high, (s.af + increment).min(max))
            } else {
                (s.extreme, s.af)
            };
            SarState {
                rising: true,
                sar,
                extreme,
                af,
            }
        } else {
            sar = sar.max(prev.high);
            if let Some(p2) = self.prev2 {
                sar = sar.max(p2.high);
            }
            if c.high > sar {
                return SarState {
                    rising: true,
                    sar: s.extreme.min(c.low),
                    extreme: c.high,
                    af: start,
                };
            }
            let (extreme, af) = if c.low < s.extreme {
                (c.low, (s.af + increment).min(max))
            } else {
                (s.extreme, s.af)
            };
            SarState {
                rising: false,
                sar,
                extreme,
                af,
            }
        }
    }
}

impl Indicator for Psar {
    fn lookback(&self) -> usize {
        2
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        let Some(prev) = self.prev else {
            self.prev = Some(*c);
            return;
        };
        let next = match self.state {
            Some(s) => self.advance(s, c, &prev),
            None => {
                let rising = c.close >= prev.close;
                SarState {
                    rising,
                    sar: if rising { prev.low } else { prev.high },
                    extreme: if rising {
                        c.high.max(prev.high)
                    } else {
                        c.low.min(prev.low)
                    },
                    af: self.params.start,
                }
            }
        };
        self.state = Some(next);
        self.prev2 = Some(prev);
        self.prev = Some(*c);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        self.state.map(|s| s.sar).into()
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}
