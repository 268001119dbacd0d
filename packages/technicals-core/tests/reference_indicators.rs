mod common;

use common::{assert_near, random_walk, Columns};
use technicals_core::{Candle, Engine, IndicatorValue, RawCandle, Snapshot};

/// Relative tolerance against the batch formulas.
const TOLERANCE: f64 = 1e-9;

fn run(candles: &[Candle], seed: usize, settings: &str) -> Snapshot {
    let mut engine = Engine::new();
    engine
        .initialize(Columns::from_candles(&candles[..seed]).input(), settings)
        .unwrap();
    for c in &candles[seed..] {
        engine.shift(RawCandle::from(*c)).unwrap();
    }
    engine.snapshot().unwrap()
}

fn scalar(snap: &Snapshot, key: &str) -> f64 {
    snap.get(key)
        .and_then(IndicatorValue::as_scalar)
        .unwrap_or_else(|| panic!("{key} has no scalar value"))
}

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[test]
fn sma_ema_match_reference() {
    let data = random_walk(600, 100.0, 17);
    let snap = run(
        &data,
        450,
        r#"{ "sma": [{ "period": 20 }, { "period": 50 }], "ema": [{ "period": 12 }, { "period": 200 }] }"#,
    );
    let xs = closes(&data);
    assert_near(scalar(&snap, "sma_20"), common::sma(&xs, 20), TOLERANCE, "sma_20");
    assert_near(scalar(&snap, "sma_50"), common::sma(&xs, 50), TOLERANCE, "sma_50");
    assert_near(scalar(&snap, "ema_12"), common::ema(&xs, 12), TOLERANCE, "ema_12");
    assert_near(scalar(&snap, "ema_200"), common::ema(&xs, 200), TOLERANCE, "ema_200");
}

#[test]
fn rsi_matches_wilder_reference() {
    let data = random_walk(400, 40.0, 23);
    let snap = run(&data, 100, r#"{ "rsi": [{ "period": 14 }, { "period": 7 }] }"#);
    let xs = closes(&data);
    assert_near(scalar(&snap, "rsi_14"), common::rsi(&xs, 14), TOLERANCE, "rsi_14");
    assert_near(scalar(&snap, "rsi_7"), common::rsi(&xs, 7), TOLERANCE, "rsi_7");
}

#[test]
fn atr_matches_wilder_reference() {
    let data = random_walk(300, 2_000.0, 29);
    let snap = run(&data, 150, r#"{ "atr": { "period": 14 } }"#);
    assert_near(scalar(&snap, "atr"), common::atr(&data, 14), TOLERANCE, "atr");
}

#[test]
fn macd_matches_reference() {
    let data = random_walk(300, 60.0, 31);
    let snap = run(&data, 200, r#"{ "macd": {} }"#);
    let (m, s, h) = common::macd(&closes(&data), 12, 26, 9);
    let Some(IndicatorValue::Macd {
        macd,
        signal,
        histogram,
    }) = snap.get("macd")
    else {
        panic!("macd missing");
    };
    assert_near(*macd, m, 1e-7, "macd");
    assert_near(*signal, s, 1e-7, "signal");
    assert_near(*histogram, h, 1e-7, "histogram");
}

#[test]
fn bollinger_keeps_two_pass_precision_at_btc_prices() {
    // long run so any drift in running sums would have time to accumulate
    let data = random_walk(5_000, 100_000.0, 37);
    let snap = run(&data, 1_000, r#"{ "bb": { "period": 20, "stdDev": 2 } }"#);
    let (mid, up, low) = common::bollinger(&closes(&data), 20, 2.0);
    let Some(IndicatorValue::Bands {
        upper,
        middle,
        lower,
        width,
        percent_b,
    }) = snap.get("bb")
    else {
        panic!("bb missing");
    };
    assert_near(*middle, mid, 1e-12, "middle");
    // absolute error on the band offset, in dollars
    assert!((upper - up).abs() < 1e-6, "upper {upper} vs {up}");
    assert!((lower - low).abs() < 1e-6, "lower {lower} vs {low}");
    assert_near(*width, (up - low) / mid, 1e-9, "width");
    let last = data[4_999].close;
    assert_near(*percent_b, (last - low) / (up - low), 1e-6, "percentB");
}

#[test]
fn btc_scale_update_matches_two_pass() {
    let data = random_walk(2_001, 98_000.0, 41);
    let mut engine = Engine::new();
    engine
        .initialize(Columns::from_candles(&data[..2_000]).input(), r#"{ "bb": {} }"#)
        .unwrap();
    let json = engine.update(RawCandle::from(data[2_000])).unwrap();
    let v: serde_json::Value = serde_json::from_str(json).unwrap();
    let (mid, up, _) = common::bollinger(&closes(&data), 20, 2.0);
    let middle = v["bb"]["middle"].as_f64().unwrap();
    let upper = v["bb"]["upper"].as_f64().unwrap();
    assert_near(middle, mid, 1e-12, "middle");
    assert!((upper - up).abs() < 1e-6, "upper {upper} vs {up}");
}
