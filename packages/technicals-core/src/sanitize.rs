//! Defensive repair of incoming samples.
//!
//! One bad tick must not poison the rolling state, so malformed fields are replaced
//! instead of rejected. Every repair is reported through `tracing::warn!`.

use tracing::warn;

use crate::{Candle, RawCandle};

/// Repairs `raw` against `prev`, the candle it follows (if any).
///
/// - non-finite prices fall back to `prev`'s same field, then to the first finite price
///   of the sample, then to `0.0`
/// - non-finite or negative volume becomes `0.0`
/// - `high`/`low` are widened to envelope `open` and `close`
/// - a non-finite or non-increasing time becomes `prev.time + 1`; when `prev.time` is
///   already `i64::MAX` there is no later time and the sample is clamped to `i64::MAX`,
///   so callers must check that the result advances before committing it
///
/// Returns the repaired candle and whether anything was changed.
pub fn sanitize(raw: RawCandle, prev: Option<&Candle>) -> (Candle, bool) {
    let mut repaired = false;

    let fallback = [raw.close, raw.open, raw.high, raw.low]
        .into_iter()
        .find(|v| v.is_finite())
        .unwrap_or(0.0);
    let mut price = |name: &'static str, v: f64, prev_v: Option<f64>| {
        if v.is_finite() {
            return v;
        }
        let replacement = prev_v.unwrap_or(fallback);
        warn!(field = name, value = %v, replacement, "non-finite price in sample");
        repaired = true;
        replacement
    };
    let open = price("open", raw.open, prev.map(|p| p.open));
    let mut high = price("high", raw.high, prev.map(|p| p.high));
    let mut low = price("low", raw.low, prev.map(|p| p.low));
    let close = price("close", raw.close, prev.map(|p| p.close));

    let volume = if raw.volume.is_finite() && raw.volume >= 0.0 {
        raw.volume
    } else {
        warn!(value = %raw.volume, "invalid volume in sample, using 0");
        repaired = true;
        0.0
    };

    let envelope_high = open.max(close).max(high).max(low);
    let envelope_low = open.min(close).min(high).min(low);
    if high != envelope_high || low != envelope_low {
        warn!(high, low, open, close, "inconsistent high/low in sample, widening envelope");
        high = envelope_high;
        low = envelope_low;
        repaired = true;
    }

    let time = match prev {
        Some(p) if !raw.time.is_finite() || (raw.time as i64) <= p.time => {
            repaired = true;
            match p.time.checked_add(1) {
                Some(replacement) => {
                    warn!(value = %raw.time, previous = p.time, replacement, "out-of-order time in sample");
                    replacement
                }
                None => {
                    warn!(value = %raw.time, "previous sample is at the maximum time, clamping");
                    p.time
                }
            }
        }
        None if !raw.time.is_finite() => {
            warn!(value = %raw.time, "non-finite time in first sample, using 0");
            repaired = true;
            0
        }
        _ => raw.time as i64,
    };

    (
        Candle {
            time,
            open,
            high,
            low,
            close,
            volume,
        },
        repaired,
    )
}
