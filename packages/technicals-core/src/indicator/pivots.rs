use super::{Indicator, IndicatorValue};
use crate::settings::{PivotAnchor, PivotKind, PivotParams};
use crate::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    high: f64,
    low: f64,
    close: f64,
}

impl Range {
    fn of(c: &Candle) -> Self {
        Self {
            high: c.high,
            low: c.low,
            close: c.close,
        }
    }

    fn extend(&mut self, c: &Candle) {
        self.high = self.high.max(c.high);
        self.low = self.low.min(c.low);
        self.close = c.close;
    }
}

fn levels(kind: PivotKind, r: Range) -> IndicatorValue {
    let Range { high, low, close } = r;
    let span = high - low;
    let (p, r1, r2, r3, s1, s2, s3) = match kind {
        PivotKind::Classic | PivotKind::Woodie => {
            let p = if kind == PivotKind::Woodie {
                (high + low + 2.0 * close) / 4.0
            } else {
                (high + low + close) / 3.0
            };
            (
                p,
                2.0 * p - low,
                p + span,
                high + 2.0 * (p - low),
                2.0 * p - high,
                p - span,
                low - 2.0 * (high - p),
            )
        }
        PivotKind::Camarilla => {
            let k = span * 1.1;
            (
                close,
                close + k / 12.0,
                close + k / 6.0,
                close + k / 4.0,
                close - k / 12.0,
                close - k / 6.0,
                close - k / 4.0,
            )
        }
        PivotKind::Fibonacci => {
            let p = (high + low + close) / 3.0;
            (
                p,
                p + 0.382 * span,
                p + 0.618 * span,
                p + span,
                p - 0.382 * span,
                p - 0.618 * span,
                p - span,
            )
        }
    };
    IndicatorValue::Pivots {
        p,
        r1,
        r2,
        r3,
        s1,
        s2,
        s3,
    }
}

/// Pivot levels from the last completed range. With a `candle` anchor every candle is its own
/// bucket, so the levels come from the candle before the newest one; with a period anchor they
/// come from the last fully closed bucket. Recomputed only when a bucket closes.
#[derive(Debug, Clone, Copy)]
pub struct Pivots {
    params: PivotParams,
    /// Bucket start and running range of the bucket still open.
    open: Option<(i64, Range)>,
    completed: Option<Range>,
}

impl Pivots {
    pub fn new(params: PivotParams) -> Self {
        Self {
            params,
            open: None,
            completed: None,
        }
    }
}

impl Indicator for Pivots {
    fn lookback(&self) -> usize {
        // at least the first bucket has to close
        2
    }

    fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn step(&mut self, c: &Candle) {
        let start = match self.params.anchor {
            PivotAnchor::Candle => c.time,
            PivotAnchor::Period(period) => period.bucket_start(c.time),
        };
        match &mut self.open {
            Some((bucket, range)) if *bucket == start => range.extend(c),
            open => {
                if let Some((_, range)) = open.replace((start, Range::of(c))) {
                    self.completed = Some(range);
                }
            }
        }
    }

    fn preview(&self, c: &Candle) -> IndicatorValue {
        let mut next = *self;
        next.step(c);
        next.value()
    }

    fn value(&self) -> IndicatorValue {
        match self.completed {
            Some(r) => levels(self.params.kind, r),
            None => IndicatorValue::Pending,
        }
    }

    fn clone_box(&self) -> Box<dyn Indicator> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::testutil::assert_close;
    use crate::period::Period;

    const HOUR: i64 = 3_600_000;

    #[test]
    fn classic_levels_from_previous_candle() {
        let mut pivots = Pivots::new(PivotParams::default());
        let first = Candle::new(0, 100.0, 110.0, 90.0, 105.0, 1.0);
        pivots.step(&first);
        assert!(pivots.value().is_pending());
        // the forming candle's own range never feeds its levels
        let forming = Candle::new(60_000, 105.0, 200.0, 1.0, 150.0, 1.0);
        assert_eq!(
            pivots.preview(&forming),
            levels(PivotKind::Classic, Range::of(&first))
        );
        pivots.step(&forming);
        let IndicatorValue::Pivots { p, r1, s1, r2, s2, .. } = pivots.value() else {
            panic!("pivots pending");
        };
        assert_close(p, 305.0 / 3.0);
        assert_close(r1, 2.0 * p - 90.0);
        assert_close(s1, 2.0 * p - 110.0);
        assert_close(r2, p + 20.0);
        assert_close(s2, p - 20.0);
    }

    #[test]
    fn camarilla_and_fibonacci() {
        let bar = Candle::new(0, 100.0, 110.0, 90.0, 105.0, 1.0);
        let IndicatorValue::Pivots { p, r1, s3, .. } =
            levels(PivotKind::Camarilla, Range::of(&bar))
        else {
            panic!();
        };
        assert_eq!(p, 105.0);
        assert_close(r1, 105.0 + 22.0 / 12.0);
        assert_close(s3, 105.0 - 22.0 / 4.0);

        let IndicatorValue::Pivots { p, r3, s2, .. } = levels(PivotKind::Fibonacci, Range::of(&bar))
        else {
            panic!();
        };
        assert_close(r3, p + 20.0);
        assert_close(s2, p - 0.618 * 20.0);
    }

    #[test]
    fn woodie_weights_close_twice() {
        let bar = Candle::new(0, 100.0, 110.0, 90.0, 105.0, 1.0);
        let IndicatorValue::Pivots { p, r1, r2, r3, s1, s2, s3 } =
            levels(PivotKind::Woodie, Range::of(&bar))
        else {
            panic!();
        };
        assert_eq!(p, 102.5);
        assert_eq!((r1, s1), (115.0, 95.0));
        assert_eq!((r2, s2), (122.5, 82.5));
        assert_eq!((r3, s3), (135.0, 75.0));
    }

    #[test]
    fn daily_anchor_uses_last_closed_day() {
        let mut pivots = Pivots::new(PivotParams {
            kind: PivotKind::Classic,
            anchor: PivotAnchor::Period(Period::DAY),
        });
        let day = Period::DAY.as_ms();
        pivots.step(&Candle::new(0, 10.0, 12.0, 9.0, 11.0, 1.0));
        pivots.step(&Candle::new(HOUR, 11.0, 15.0, 10.0, 14.0, 1.0));
        assert!(pivots.value().is_pending());

        let first_of_day_two = Candle::new(day, 14.0, 14.5, 13.0, 13.5, 1.0);
        let expect = levels(
            PivotKind::Classic,
            Range {
                high: 15.0,
                low: 9.0,
                close: 14.0,
            },
        );
        assert_eq!(pivots.preview(&first_of_day_two), expect);
        pivots.step(&first_of_day_two);
        assert_eq!(pivots.value(), expect);

        // intraday candles do not move the levels
        pivots.step(&Candle::new(day + HOUR, 13.5, 30.0, 1.0, 2.0, 1.0));
        assert_eq!(pivots.value(), expect);
    }
}
