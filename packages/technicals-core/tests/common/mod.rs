#![allow(dead_code)]

use technicals_core::{Candle, SeriesInput};

pub const MINUTE: i64 = 60_000;

/// Deterministic pseudo-random walk around `base` (xorshift, no external RNG).
pub fn random_walk(n: usize, base: f64, seed: u64) -> Vec<Candle> {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 10_000.0 - 0.5
    };
    let mut close = base;
    (0..n)
        .map(|i| {
            let open = close;
            close = (open * (1.0 + next() * 0.01)).max(base * 0.01);
            let high = open.max(close) * (1.0 + next().abs() * 0.004);
            let low = open.min(close) * (1.0 - next().abs() * 0.004);
            let volume = 50.0 + (next() + 0.5) * 200.0;
            Candle::new(i as i64 * MINUTE, open, high, low, close, volume)
        })
        .collect()
}

/// Column-oriented copy of a candle slice, as a host would hand it over.
pub struct Columns {
    pub times: Vec<f64>,
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl Columns {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            times: candles.iter().map(|c| c.time as f64).collect(),
            opens: candles.iter().map(|c| c.open).collect(),
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
            volumes: candles.iter().map(|c| c.volume).collect(),
        }
    }

    pub fn input(&self) -> SeriesInput<'_> {
        SeriesInput {
            times: &self.times,
            opens: &self.opens,
            highs: &self.highs,
            lows: &self.lows,
            closes: &self.closes,
            volumes: &self.volumes,
        }
    }
}

pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance * scale,
        "{context}: expected {expected}, got {actual}"
    );
}

// ===== Batch references (textbook formulas over full slices) =====

pub fn sma(xs: &[f64], period: usize) -> f64 {
    xs[xs.len() - period..].iter().sum::<f64>() / period as f64
}

pub fn ema(xs: &[f64], period: usize) -> f64 {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut v = xs[..period].iter().sum::<f64>() / period as f64;
    for x in &xs[period..] {
        v = alpha * x + (1.0 - alpha) * v;
    }
    v
}

pub fn ema_series(xs: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut v = xs[..period].iter().sum::<f64>() / period as f64;
    let mut out = vec![v];
    for x in &xs[period..] {
        v = alpha * x + (1.0 - alpha) * v;
        out.push(v);
    }
    out
}

pub fn rsi(xs: &[f64], period: usize) -> f64 {
    let diffs: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let p = period as f64;
    let mut gain = diffs[..period].iter().map(|d| d.max(0.0)).sum::<f64>() / p;
    let mut loss = diffs[..period].iter().map(|d| (-d).max(0.0)).sum::<f64>() / p;
    for d in &diffs[period..] {
        gain = (gain * (p - 1.0) + d.max(0.0)) / p;
        loss = (loss * (p - 1.0) + (-d).max(0.0)) / p;
    }
    if loss == 0.0 {
        return if gain == 0.0 { 50.0 } else { 100.0 };
    }
    100.0 - 100.0 / (1.0 + gain / loss)
}

pub fn atr(candles: &[Candle], period: usize) -> f64 {
    let tr: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let hl = c.high - c.low;
            match i.checked_sub(1) {
                None => hl,
                Some(j) => {
                    let pc = candles[j].close;
                    hl.max((c.high - pc).abs()).max((c.low - pc).abs())
                }
            }
        })
        .collect();
    let p = period as f64;
    let mut v = tr[..period].iter().sum::<f64>() / p;
    for t in &tr[period..] {
        v = (v * (p - 1.0) + t) / p;
    }
    v
}

/// (middle, upper, lower), two-pass population σ.
pub fn bollinger(xs: &[f64], period: usize, k: f64) -> (f64, f64, f64) {
    let w = &xs[xs.len() - period..];
    let mean = w.iter().sum::<f64>() / period as f64;
    let var = w.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / period as f64;
    let sd = var.sqrt();
    (mean, mean + k * sd, mean - k * sd)
}

/// (macd, signal, histogram)
pub fn macd(xs: &[f64], fast: usize, slow: usize, signal: usize) -> (f64, f64, f64) {
    let f = ema_series(xs, fast);
    let s = ema_series(xs, slow);
    // align both series on the candles where the slow EMA exists
    let offset = slow - fast;
    let line: Vec<f64> = s.iter().enumerate().map(|(i, sv)| f[i + offset] - sv).collect();
    let sig = ema(&line, signal);
    let m = *line.last().unwrap_or(&0.0);
    (m, sig, m - sig)
}
