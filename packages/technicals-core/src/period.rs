use core::fmt;
use serde::{Deserialize, Deserializer};

use crate::error::SettingsError;

/// Fixed-width time bucket (ms) used to anchor session VWAP and period pivots.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    ms: i64,
}

impl fmt::Debug for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Period({}ms)", self.ms)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(i64, &str); 5] = [
            (604_800_000, "w"),
            (86_400_000, "d"),
            (3_600_000, "h"),
            (60_000, "m"),
            (1_000, "s"),
        ];
        for (size, unit) in UNITS {
            if self.ms % size == 0 {
                return write!(f, "{}{}", self.ms / size, unit);
            }
        }
        write!(f, "{}ms", self.ms)
    }
}

impl Period {
    pub const DAY: Period = Period { ms: 86_400_000 };

    /// `None` for non-positive widths.
    pub fn from_ms(ms: i64) -> Option<Self> {
        (ms > 0).then_some(Self { ms })
    }

    pub fn as_ms(&self) -> i64 {
        self.ms
    }

    /// Parses `<n><unit>` with unit one of `ms`, `s`, `m`, `h`, `d`, `w`.
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        let err = |reason| SettingsError::Period {
            input: s.to_string(),
            reason,
        };
        let t = s.trim();
        if t.is_empty() {
            return Err(err("empty period"));
        }
        let digits_end = t
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_digit())
            .map_or(t.len(), |(i, _)| i);
        if digits_end == 0 {
            return Err(err("missing number"));
        }
        let n: i64 = t[..digits_end].parse().map_err(|_| err("invalid number"))?;
        if n <= 0 {
            return Err(err("period must be > 0"));
        }
        let unit_ms = match t[digits_end..].trim().to_ascii_lowercase().as_str() {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            "w" => 604_800_000,
            _ => return Err(err("unsupported unit (use ms/s/m/h/d/w)")),
        };
        let ms = n.checked_mul(unit_ms).ok_or_else(|| err("period overflows"))?;
        Ok(Self { ms })
    }

    /// Start of the bucket containing `ts_ms` (floors toward negative infinity).
    #[inline]
    pub fn bucket_start(&self, ts_ms: i64) -> i64 {
        ts_ms.div_euclid(self.ms) * self.ms
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Period::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Period;

    #[test]
    fn parse_periods() {
        assert_eq!(Period::parse("15m").unwrap().as_ms(), 15 * 60_000);
        assert_eq!(Period::parse("4h").unwrap().as_ms(), 4 * 3_600_000);
        assert_eq!(Period::parse("1d").unwrap().as_ms(), 86_400_000);
        assert_eq!(Period::parse("1W").unwrap().as_ms(), 604_800_000);
        assert_eq!(Period::parse("500ms").unwrap().as_ms(), 500);
        assert!(Period::parse("0d").is_err());
        assert!(Period::parse("d").is_err());
        assert!(Period::parse("3y").is_err());
    }

    #[test]
    fn bucket_start() {
        let p = Period::parse("15m").unwrap();
        assert_eq!(p.bucket_start(0), 0);
        assert_eq!(p.bucket_start(1), 0);
        assert_eq!(p.bucket_start(15 * 60_000), 15 * 60_000);
        assert_eq!(p.bucket_start(15 * 60_000 + 1), 15 * 60_000);
        assert_eq!(p.bucket_start(-1), -15 * 60_000);
    }

    #[test]
    fn display_round_trips_units() {
        assert_eq!(Period::DAY.to_string(), "1d");
        assert_eq!(Period::parse("90m").unwrap().to_string(), "90m");
        assert_eq!(Period::parse("1500ms").unwrap().to_string(), "1500ms");
    }
}
