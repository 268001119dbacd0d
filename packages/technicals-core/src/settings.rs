//! Settings resolver: JSON blob -> typed, validated indicator specs.
//!
//! Shape: `{ "<indicator>": <entry>, ... }` where an entry is an object of parameter
//! overrides (one instance keyed by the indicator name), an array of such objects (one
//! instance per element, keyed `<indicator>_<params>`), `true` (defaults) or
//! `false`/`null`/`{"enabled": false}` (disabled). Unknown indicators and unknown
//! parameters are ignored; missing parameters take their defaults.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SettingsError;
use crate::period::Period;
use crate::PriceSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Wma,
    Hma,
    Vwma,
    VolumeMa,
    Rsi,
    Macd,
    Stoch,
    Cci,
    Adx,
    Momentum,
    WilliamsR,
    Mfi,
    Ao,
    Bollinger,
    Atr,
    Chop,
    SuperTrend,
    Psar,
    Vwap,
    Obv,
    Pivots,
}

impl IndicatorKind {
    /// Resolves a settings key (case-insensitive, with the host app's long-form aliases).
    pub fn from_key(key: &str) -> Option<Self> {
        use IndicatorKind::*;
        Some(match key.to_ascii_lowercase().as_str() {
            "sma" => Sma,
            "ema" => Ema,
            "wma" => Wma,
            "hma" => Hma,
            "vwma" => Vwma,
            "volma" | "volumema" => VolumeMa,
            "rsi" => Rsi,
            "macd" => Macd,
            "stoch" | "stochastic" => Stoch,
            "cci" => Cci,
            "adx" => Adx,
            "mom" | "momentum" => Momentum,
            "wr" | "williamsr" => WilliamsR,
            "mfi" => Mfi,
            "ao" => Ao,
            "bb" | "bollingerbands" => Bollinger,
            "atr" => Atr,
            "chop" | "choppiness" => Chop,
            "supertrend" => SuperTrend,
            "psar" | "parabolicsar" => Psar,
            "vwap" => Vwap,
            "obv" => Obv,
            "pivots" => Pivots,
            _ => return None,
        })
    }
}

// ===== Parameter structs =====

/// SMA / EMA / WMA / VWMA.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaParams {
    #[serde(alias = "length")]
    pub period: usize,
    pub source: PriceSource,
}

impl Default for MaParams {
    fn default() -> Self {
        Self {
            period: 20,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HmaParams {
    #[serde(alias = "length")]
    pub period: usize,
    pub source: PriceSource,
}

impl Default for HmaParams {
    fn default() -> Self {
        Self {
            period: 9,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeMaParams {
    #[serde(alias = "length")]
    pub period: usize,
}

impl Default for VolumeMaParams {
    fn default() -> Self {
        Self { period: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsiParams {
    #[serde(alias = "length")]
    pub period: usize,
    pub source: PriceSource,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MacdParams {
    #[serde(alias = "fastLength")]
    pub fast: usize,
    #[serde(alias = "slowLength")]
    pub slow: usize,
    #[serde(alias = "signalLength")]
    pub signal: usize,
    pub source: PriceSource,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StochParams {
    #[serde(alias = "kPeriod")]
    pub k: usize,
    #[serde(alias = "kSmoothing")]
    pub smooth: usize,
    #[serde(alias = "dPeriod")]
    pub d: usize,
}

impl Default for StochParams {
    fn default() -> Self {
        Self {
            k: 14,
            smooth: 1,
            d: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CciParams {
    #[serde(alias = "length")]
    pub period: usize,
    pub source: PriceSource,
}

impl Default for CciParams {
    fn default() -> Self {
        Self {
            period: 20,
            source: PriceSource::Hlc3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdxParams {
    /// ADX smoothing length.
    #[serde(alias = "length", alias = "adxSmoothing")]
    pub period: usize,
    /// Directional-movement length; defaults to `period`.
    #[serde(alias = "diLength")]
    pub di_period: Option<usize>,
}

impl Default for AdxParams {
    fn default() -> Self {
        Self {
            period: 14,
            di_period: None,
        }
    }
}

impl AdxParams {
    pub fn di_period(&self) -> usize {
        self.di_period.unwrap_or(self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MomentumParams {
    #[serde(alias = "length")]
    pub period: usize,
    pub source: PriceSource,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            period: 10,
            source: PriceSource::Close,
        }
    }
}

/// Williams %R / MFI / ATR / Choppiness: a bare length.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeriodParams {
    #[serde(alias = "length")]
    pub period: usize,
}

impl Default for PeriodParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AoParams {
    #[serde(alias = "fastLength")]
    pub fast: usize,
    #[serde(alias = "slowLength")]
    pub slow: usize,
}

impl Default for AoParams {
    fn default() -> Self {
        Self { fast: 5, slow: 34 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BollingerParams {
    #[serde(alias = "length")]
    pub period: usize,
    #[serde(alias = "std_dev", alias = "mult")]
    pub std_dev: f64,
    pub source: PriceSource,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
            source: PriceSource::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuperTrendParams {
    #[serde(alias = "length")]
    pub period: usize,
    #[serde(alias = "factor")]
    pub multiplier: f64,
}

impl Default for SuperTrendParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PsarParams {
    pub start: f64,
    pub increment: f64,
    pub max: f64,
}

impl Default for PsarParams {
    fn default() -> Self {
        Self {
            start: 0.02,
            increment: 0.02,
            max: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VwapAnchor {
    /// Resets whenever a candle opens a new `session` bucket.
    #[default]
    Session,
    /// Accumulates over everything the engine has seen.
    Cumulative,
    /// Accumulates from `anchor_point` onward.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VwapParams {
    pub anchor: VwapAnchor,
    pub session: Period,
    pub anchor_point: Option<i64>,
}

impl Default for VwapParams {
    fn default() -> Self {
        Self {
            anchor: VwapAnchor::Session,
            session: Period::DAY,
            anchor_point: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ObvParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotKind {
    #[default]
    Classic,
    Woodie,
    Camarilla,
    Fibonacci,
}

/// Which completed range feeds the pivot formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotAnchor {
    /// The previous committed candle.
    #[default]
    Candle,
    /// The last completed bucket of this width (e.g. `1d`, `1w`).
    Period(Period),
}

impl<'de> Deserialize<'de> for PivotAnchor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("candle") {
            return Ok(PivotAnchor::Candle);
        }
        Period::parse(&s)
            .map(PivotAnchor::Period)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PivotParams {
    #[serde(rename = "type", alias = "type_", alias = "kind")]
    pub kind: PivotKind,
    pub anchor: PivotAnchor,
}

impl Default for PivotParams {
    fn default() -> Self {
        Self {
            kind: PivotKind::Classic,
            anchor: PivotAnchor::Candle,
        }
    }
}

// ===== Specs =====

/// One configured indicator instance with its resolved parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorSpec {
    Sma(MaParams),
    Ema(MaParams),
    Wma(MaParams),
    Hma(HmaParams),
    Vwma(MaParams),
    VolumeMa(VolumeMaParams),
    Rsi(RsiParams),
    Macd(MacdParams),
    Stoch(StochParams),
    Cci(CciParams),
    Adx(AdxParams),
    Momentum(MomentumParams),
    WilliamsR(PeriodParams),
    Mfi(PeriodParams),
    Ao(AoParams),
    Bollinger(BollingerParams),
    Atr(PeriodParams),
    Chop(PeriodParams),
    SuperTrend(SuperTrendParams),
    Psar(PsarParams),
    Vwap(VwapParams),
    Obv(ObvParams),
    Pivots(PivotParams),
}

fn params<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, SettingsError> {
    T::deserialize(value).map_err(|source| SettingsError::Params {
        key: key.to_string(),
        source,
    })
}

/// Largest accepted window or smoothing length.
pub const MAX_PERIOD: usize = 100_000;

fn check_period(key: &str, param: &'static str, value: usize, min: usize) -> Result<(), SettingsError> {
    if value < min {
        return Err(SettingsError::PeriodTooSmall {
            key: key.to_string(),
            param,
            min,
            value,
        });
    }
    if value > MAX_PERIOD {
        return Err(SettingsError::PeriodTooLarge {
            key: key.to_string(),
            param,
            max: MAX_PERIOD,
            value,
        });
    }
    Ok(())
}

fn positive(key: &str, param: &'static str, value: f64) -> Result<(), SettingsError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SettingsError::NonPositive {
            key: key.to_string(),
            param,
            value,
        });
    }
    Ok(())
}

impl IndicatorSpec {
    /// Parses and validates the parameter object of one instance.
    pub fn parse(kind: IndicatorKind, key: &str, value: &Value) -> Result<Self, SettingsError> {
        use IndicatorKind as K;
        let spec = match kind {
            K::Sma => Self::Sma(params(key, value)?),
            K::Ema => Self::Ema(params(key, value)?),
            K::Wma => Self::Wma(params(key, value)?),
            K::Hma => Self::Hma(params(key, value)?),
            K::Vwma => Self::Vwma(params(key, value)?),
            K::VolumeMa => Self::VolumeMa(params(key, value)?),
            K::Rsi => Self::Rsi(params(key, value)?),
            K::Macd => Self::Macd(params(key, value)?),
            K::Stoch => Self::Stoch(params(key, value)?),
            K::Cci => Self::Cci(params(key, value)?),
            K::Adx => Self::Adx(params(key, value)?),
            K::Momentum => Self::Momentum(params(key, value)?),
            K::WilliamsR => Self::WilliamsR(params(key, value)?),
            K::Mfi => Self::Mfi(params(key, value)?),
            K::Ao => Self::Ao(params(key, value)?),
            K::Bollinger => Self::Bollinger(params(key, value)?),
            K::Atr => Self::Atr(params(key, value)?),
            K::Chop => Self::Chop(params(key, value)?),
            K::SuperTrend => Self::SuperTrend(params(key, value)?),
            K::Psar => Self::Psar(params(key, value)?),
            K::Vwap => Self::Vwap(params(key, value)?),
            K::Obv => Self::Obv(params(key, value)?),
            K::Pivots => Self::Pivots(params(key, value)?),
        };
        spec.validate(key)?;
        Ok(spec)
    }

    fn validate(&self, key: &str) -> Result<(), SettingsError> {
        match self {
            Self::Sma(p) | Self::Ema(p) | Self::Wma(p) | Self::Vwma(p) => {
                check_period(key, "period", p.period, 1)
            }
            Self::Hma(p) => check_period(key, "period", p.period, 2),
            Self::VolumeMa(p) => check_period(key, "period", p.period, 1),
            Self::Rsi(p) => check_period(key, "period", p.period, 1),
            Self::Macd(p) => {
                check_period(key, "fast", p.fast, 1)?;
                check_period(key, "slow", p.slow, 1)?;
                check_period(key, "signal", p.signal, 1)
            }
            Self::Stoch(p) => {
                check_period(key, "k", p.k, 1)?;
                check_period(key, "smooth", p.smooth, 1)?;
                check_period(key, "d", p.d, 1)
            }
            Self::Cci(p) => check_period(key, "period", p.period, 1),
            Self::Adx(p) => {
                check_period(key, "period", p.period, 1)?;
                check_period(key, "diPeriod", p.di_period(), 1)
            }
            Self::Momentum(p) => check_period(key, "period", p.period, 1),
            Self::WilliamsR(p) | Self::Mfi(p) | Self::Atr(p) => {
                check_period(key, "period", p.period, 1)
            }
            Self::Chop(p) => check_period(key, "period", p.period, 2),
            Self::Ao(p) => {
                check_period(key, "fast", p.fast, 1)?;
                check_period(key, "slow", p.slow, 1)
            }
            Self::Bollinger(p) => {
                check_period(key, "period", p.period, 1)?;
                positive(key, "stdDev", p.std_dev)
            }
            Self::SuperTrend(p) => {
                check_period(key, "period", p.period, 1)?;
                positive(key, "multiplier", p.multiplier)
            }
            Self::Psar(p) => {
                positive(key, "start", p.start)?;
                positive(key, "increment", p.increment)?;
                positive(key, "max", p.max)?;
                if p.max < p.start {
                    return Err(SettingsError::Invalid {
                        key: key.to_string(),
                        reason: format!("max ({}) must be >= start ({})", p.max, p.start),
                    });
                }
                Ok(())
            }
            Self::Vwap(p) => {
                if p.anchor == VwapAnchor::Fixed && p.anchor_point.is_none() {
                    return Err(SettingsError::Invalid {
                        key: key.to_string(),
                        reason: "anchor `fixed` requires `anchorPoint`".to_string(),
                    });
                }
                Ok(())
            }
            Self::Obv(_) | Self::Pivots(_) => Ok(()),
        }
    }

    /// Parameter suffix used to key array-form instances (`ema_9`, `macd_12-26-9`).
    pub fn label(&self) -> String {
        match self {
            Self::Sma(p) | Self::Ema(p) | Self::Wma(p) | Self::Vwma(p) => p.period.to_string(),
            Self::Hma(p) => p.period.to_string(),
            Self::VolumeMa(p) => p.period.to_string(),
            Self::Rsi(p) => p.period.to_string(),
            Self::Macd(p) => format!("{}-{}-{}", p.fast, p.slow, p.signal),
            Self::Stoch(p) => format!("{}-{}-{}", p.k, p.smooth, p.d),
            Self::Cci(p) => p.period.to_string(),
            Self::Adx(p) => match p.di_period {
                Some(di) if di != p.period => format!("{}-{}", p.period, di),
                _ => p.period.to_string(),
            },
            Self::Momentum(p) => p.period.to_string(),
            Self::WilliamsR(p) | Self::Mfi(p) | Self::Atr(p) | Self::Chop(p) => {
                p.period.to_string()
            }
            Self::Ao(p) => format!("{}-{}", p.fast, p.slow),
            Self::Bollinger(p) => format!("{}-{}", p.period, p.std_dev),
            Self::SuperTrend(p) => format!("{}-{}", p.period, p.multiplier),
            Self::Psar(p) => format!("{}-{}-{}", p.start, p.increment, p.max),
            Self::Vwap(p) => match p.anchor {
                VwapAnchor::Session => format!("session-{}", p.session),
                VwapAnchor::Cumulative => "cumulative".to_string(),
                VwapAnchor::Fixed => format!("fixed-{}", p.anchor_point.unwrap_or_default()),
            },
            Self::Obv(_) => String::new(),
            Self::Pivots(p) => {
                let kind = match p.kind {
                    PivotKind::Classic => "classic",
                    PivotKind::Woodie => "woodie",
                    PivotKind::Camarilla => "camarilla",
                    PivotKind::Fibonacci => "fibonacci",
                };
                match p.anchor {
                    PivotAnchor::Candle => kind.to_string(),
                    PivotAnchor::Period(period) => format!("{kind}-{period}"),
                }
            }
        }
    }
}

/// A named indicator instance. `key` is the name it carries in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorEntry {
    pub key: String,
    pub spec: IndicatorSpec,
}

/// Immutable, validated configuration. Built once per `initialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSettings {
    entries: Vec<IndicatorEntry>,
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn explicitly_disabled(obj: &Map<String, Value>) -> bool {
    matches!(obj.get("enabled"), Some(Value::Bool(false)))
}

impl ParsedSettings {
    pub fn parse(json: &str) -> Result<Self, SettingsError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, SettingsError> {
        let root = match value {
            Value::Object(obj) => obj,
            other => return Err(SettingsError::NotAnObject(json_type(other))),
        };

        let mut settings = ParsedSettings::default();
        for (key, entry) in root {
            let Some(kind) = IndicatorKind::from_key(key) else {
                debug!(key = key.as_str(), "ignoring unknown settings key");
                continue;
            };
            settings.parse_entry(kind, key, entry)?;
        }
        Ok(settings)
    }

    fn parse_entry(&mut self, kind: IndicatorKind, key: &str, entry: &Value) -> Result<(), SettingsError> {
        let empty = Value::Object(Map::new());
        match entry {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => {
                let spec = IndicatorSpec::parse(kind, key, &empty)?;
                self.push(key.to_string(), spec);
            }
            Value::Object(obj) => {
                if !explicitly_disabled(obj) {
                    let spec = IndicatorSpec::parse(kind, key, entry)?;
                    self.push(key.to_string(), spec);
                }
            }
            Value::Array(items) => {
                for item in items {
                    let spec = match item {
                        Value::Null | Value::Bool(false) => continue,
                        Value::Object(obj) if explicitly_disabled(obj) => continue,
                        Value::Object(_) => IndicatorSpec::parse(kind, key, item)?,
                        Value::Bool(true) => IndicatorSpec::parse(kind, key, &empty)?,
                        other => {
                            return Err(SettingsError::EntryShape {
                                key: key.to_string(),
                                found: json_type(other),
                            })
                        }
                    };
                    let label = spec.label();
                    let instance_key = if label.is_empty() {
                        key.to_string()
                    } else {
                        format!("{key}_{label}")
                    };
                    self.push(instance_key, spec);
                }
            }
            other => {
                return Err(SettingsError::EntryShape {
                    key: key.to_string(),
                    found: json_type(other),
                })
            }
        }
        Ok(())
    }

    fn push(&mut self, key: String, spec: IndicatorSpec) {
        if self.entries.iter().any(|e| e.key == key) {
            debug!(key = key.as_str(), "duplicate indicator key, keeping the first");
            return;
        }
        self.entries.push(IndicatorEntry { key, spec });
    }

    pub fn entries(&self) -> &[IndicatorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorSpec> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.spec)
    }
}

impl std::str::FromStr for ParsedSettings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_entry_with_partial_overrides() {
        let s = ParsedSettings::parse(r#"{ "rsi": { "period": 7 }, "macd": { "fast": 5 } }"#).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(
            s.get("rsi"),
            Some(&IndicatorSpec::Rsi(RsiParams {
                period: 7,
                source: PriceSource::Close
            }))
        );
        let Some(IndicatorSpec::Macd(m)) = s.get("macd") else {
            panic!("macd missing");
        };
        assert_eq!((m.fast, m.slow, m.signal), (5, 26, 9));
    }

    #[test]
    fn array_entries_get_param_suffixes() {
        let s = ParsedSettings::parse(
            r#"{ "ema": [{ "length": 9 }, { "length": 21 }, { "length": 9 }],
                 "bb": [{ "length": 20, "std_dev": 2 }] }"#,
        )
        .unwrap();
        let keys: Vec<&str> = s.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["ema_9", "ema_21", "bb_20-2"]);
    }

    #[test]
    fn missing_unknown_and_disabled_keys() {
        let s = ParsedSettings::parse(
            r#"{ "historyLimit": 750, "atr": false, "obv": null,
                 "cci": { "enabled": false }, "adx": true, "stochastic": { "kPeriod": 5 } }"#,
        )
        .unwrap();
        let keys: Vec<&str> = s.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["adx", "stochastic"]);
        let Some(IndicatorSpec::Stoch(p)) = s.get("stochastic") else {
            panic!("stoch missing");
        };
        assert_eq!((p.k, p.smooth, p.d), (5, 1, 3));
    }

    #[test]
    fn rejects_bad_periods() {
        let err = ParsedSettings::parse(r#"{ "rsi": { "period": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::PeriodTooSmall { value: 0, .. }), "{err}");

        let err = ParsedSettings::parse(r#"{ "ema": { "period": -3 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Params { .. }), "{err}");
        assert!(err.to_string().contains("ema"));

        let err = ParsedSettings::parse(r#"{ "hma": { "period": 1 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::PeriodTooSmall { min: 2, .. }));
    }

    #[test]
    fn rejects_oversized_periods() {
        let err = ParsedSettings::parse(r#"{ "sma": { "period": 9223372036854775807 } }"#)
            .unwrap_err();
        assert!(
            matches!(err, SettingsError::PeriodTooLarge { max: MAX_PERIOD, .. }),
            "{err}"
        );

        let err = ParsedSettings::parse(r#"{ "mom": { "period": 18446744073709551615 } }"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::PeriodTooLarge { .. }), "{err}");

        let err = ParsedSettings::parse(r#"{ "stochastic": { "k": 14, "d": 100001 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("stochastic.d"), "{err}");

        assert!(ParsedSettings::parse(r#"{ "sma": { "period": 100000 } }"#).is_ok());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            ParsedSettings::parse("{ not json").unwrap_err(),
            SettingsError::Json(_)
        ));
        assert!(matches!(
            ParsedSettings::parse("[1, 2]").unwrap_err(),
            SettingsError::NotAnObject("array")
        ));
        assert!(matches!(
            ParsedSettings::parse(r#"{ "rsi": 14 }"#).unwrap_err(),
            SettingsError::EntryShape { found: "number", .. }
        ));
        assert!(ParsedSettings::parse(r#"{ "bb": { "stdDev": 0 } }"#).is_err());
        assert!(ParsedSettings::parse(r#"{ "supertrend": { "factor": -1 } }"#).is_err());
        assert!(ParsedSettings::parse(r#"{ "rsi": { "source": "median" } }"#).is_err());
        assert!(ParsedSettings::parse(r#"{ "vwap": { "anchor": "fixed" } }"#).is_err());
        assert!(ParsedSettings::parse(r#"{ "pivots": { "anchor": "2y" } }"#).is_err());
    }

    #[test]
    fn pivot_and_vwap_anchors() {
        let s = ParsedSettings::parse(
            r#"{ "pivots": { "type": "camarilla", "anchor": "1d" },
                 "vwap": { "anchor": "session", "session": "4h" } }"#,
        )
        .unwrap();
        let Some(IndicatorSpec::Pivots(p)) = s.get("pivots") else {
            panic!("pivots missing");
        };
        assert_eq!(p.kind, PivotKind::Camarilla);
        assert_eq!(p.anchor, PivotAnchor::Period(Period::DAY));
        let Some(IndicatorSpec::Vwap(v)) = s.get("vwap") else {
            panic!("vwap missing");
        };
        assert_eq!(v.session.as_ms(), 4 * 3_600_000);
    }

    #[test]
    fn empty_object_enables_nothing() {
        assert!(ParsedSettings::parse("{}").unwrap().is_empty());
    }
}
