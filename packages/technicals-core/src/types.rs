use serde::Deserialize;

/// One OHLCV sample. `time` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A candle where every price equals `price`.
    pub fn flat(time: i64, price: f64, volume: f64) -> Self {
        Self::new(time, price, price, price, price, volume)
    }

    #[inline]
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    #[inline]
    pub fn hlc3(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    #[inline]
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    /// True range against the previous close (`high - low` when there is none).
    #[inline]
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            None => hl,
            Some(pc) => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
        }
    }
}

/// Which value of a candle an indicator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    Hl2,
    Hlc3,
    Ohlc4,
    Volume,
}

impl PriceSource {
    #[inline]
    pub fn extract(&self, c: &Candle) -> f64 {
        match self {
            PriceSource::Open => c.open,
            PriceSource::High => c.high,
            PriceSource::Low => c.low,
            PriceSource::Close => c.close,
            PriceSource::Hl2 => c.hl2(),
            PriceSource::Hlc3 => c.hlc3(),
            PriceSource::Ohlc4 => c.ohlc4(),
            PriceSource::Volume => c.volume,
        }
    }
}

/// Column-oriented history handed to [`crate::Engine::initialize`].
///
/// All columns must have the same length; `times` carries epoch milliseconds as `f64`
/// because that is how JS hosts hand them over.
#[derive(Debug, Clone, Copy)]
pub struct SeriesInput<'a> {
    pub times: &'a [f64],
    pub opens: &'a [f64],
    pub highs: &'a [f64],
    pub lows: &'a [f64],
    pub closes: &'a [f64],
    pub volumes: &'a [f64],
}

impl<'a> SeriesInput<'a> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Lengths of every column, in declaration order.
    pub(crate) fn column_lengths(&self) -> [(&'static str, usize); 6] {
        [
            ("times", self.times.len()),
            ("opens", self.opens.len()),
            ("highs", self.highs.len()),
            ("lows", self.lows.len()),
            ("closes", self.closes.len()),
            ("volumes", self.volumes.len()),
        ]
    }

    /// Raw (unsanitized) candle at `i`. Caller guarantees equal column lengths.
    pub(crate) fn raw_candle(&self, i: usize) -> RawCandle {
        RawCandle {
            time: self.times[i],
            open: self.opens[i],
            high: self.highs[i],
            low: self.lows[i],
            close: self.closes[i],
            volume: self.volumes[i],
        }
    }
}

/// A sample as it arrives from the host, before sanitization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCandle {
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl RawCandle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64, time: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<Candle> for RawCandle {
    fn from(c: Candle) -> Self {
        Self {
            time: c.time as f64,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_prices() {
        let c = Candle::new(0, 10.0, 14.0, 8.0, 12.0, 5.0);
        assert_eq!(c.hl2(), 11.0);
        assert_eq!(c.hlc3(), (14.0 + 8.0 + 12.0) / 3.0);
        assert_eq!(c.ohlc4(), 11.0);
        assert_eq!(PriceSource::Volume.extract(&c), 5.0);
    }

    #[test]
    fn true_range_uses_gap_to_previous_close() {
        let c = Candle::new(0, 10.0, 11.0, 9.0, 10.0, 0.0);
        assert_eq!(c.true_range(None), 2.0);
        assert_eq!(c.true_range(Some(5.0)), 6.0);
        assert_eq!(c.true_range(Some(14.0)), 5.0);
    }

    #[test]
    fn price_source_deserializes_lowercase() {
        let s: PriceSource = serde_json::from_str("\"hlc3\"").unwrap();
        assert_eq!(s, PriceSource::Hlc3);
        assert!(serde_json::from_str::<PriceSource>("\"median\"").is_err());
    }
}
