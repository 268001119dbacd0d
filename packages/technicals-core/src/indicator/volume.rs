use super::{Indicator, IndicatorValue};
use crate::settings::{VwapAnchor, VwapParams};
use crate::Candle;

// ===== VWAP =====

/// Volume-weighted average of typical price since the anchor. With no volume accumulated
/// it reads the last typical price.
#[derive(Debug, Clone, Copy)]
pub struct Vwap {
    params: VwapParams,
    /// Start of the session the accumulators belong to.
    session: Option<i64>,
    pv: f64,
    volume: f64,
    last_tp: Option<f64>,
}

impl Vwap {
    pub fn new(params: VwapParams) -> Self {
        Self {
            params,
            session: None,
            pv: 0.0,
            volume: 0.0,
            last_tp: None,
        }
    }

    fn clear(&mut self) {
        self.pv = 0.0;
        self.volume = 0.0;
        self.last_tp = None;
    }
}

impl Indicator for Vwap {
    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        match self.params.anchor {
            VwapAnchor::Session => {
                let start = self.params.session.bucket_start(c.time);
                if self.session != Some(start) {
                    self.session = Some(start);
                    self.clear();
                }
            }
            VwapAnchor::Fixed => {
                if self.params.anchor_point.is_some_and(|at| c.time < at) {
                    return;
                }
            }
            VwapAnchor::Cumulative => {}
        }
        let tp = c.hlc3();
        self.pv += tp * c.volume;
        self.volume += c.volume;
        self.last_tp = Some(tp);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        let Some(tp) = self.last_tp else {
            return IndicatorValue::Pending;
        };
        if self.volume > 0.0 {
            IndicatorValue::Scalar(self.pv / self.volume)
        } else {
            IndicatorValue::Scalar(tp)
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

// ===== OBV =====

/// On-balance volume, starting at 0 on the first candle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Obv {
    prev_close: Option<f64>,
    obv: f64,
}

impl Obv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for Obv {
    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn step(&mut self, c: &Candle) {
        if let Some(prev) = self.prev_close {
            if c.close > prev {
                self.obv += c.volume;
            } else if c.close < prev {
                self.obv -= c.volume;
            }
        }
        self.prev_close = Some(c.close);
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        match self.prev_close {
            Some(_) => IndicatorValue::Scalar(self.obv),
            None => IndicatorValue::Pending,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}
