use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::sync::{Arc, Mutex, Once};
use technicals_core::{Engine, EngineError, RawCandle, SeriesInput};
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Installs the addon-wide tracing subscriber once per process, filtered by
/// `TECHNICALS_LOG` (default `warn`).
fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let filter =
            EnvFilter::try_from_env("TECHNICALS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        // another addon in the process may already own the global subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

fn to_napi(e: EngineError) -> Error {
    Error::from_reason(e.to_string())
}

#[napi]
pub struct TechnicalsCalculator {
    inner: Arc<Mutex<Engine>>,
}

#[napi]
impl TechnicalsCalculator {
    #[napi(constructor)]
    pub fn new() -> Self {
        init_logging();
        Self {
            inner: Arc::new(Mutex::new(Engine::new())),
        }
    }

    /// Argument order follows the host bridge: volumes come before closes.
    #[napi]
    pub fn initialize(
        &self,
        times: Float64Array,
        opens: Float64Array,
        highs: Float64Array,
        lows: Float64Array,
        volumes: Float64Array,
        closes: Float64Array,
        settings_json: String,
    ) -> Result<()> {
        let mut engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        let input = SeriesInput {
            times: &times,
            opens: &opens,
            highs: &highs,
            lows: &lows,
            closes: &closes,
            volumes: &volumes,
        };
        engine.initialize(input, &settings_json).map_err(to_napi)
    }

    #[napi]
    pub fn update(
        &self,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        time: f64,
    ) -> Result<String> {
        let mut engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        let raw = RawCandle::new(open, high, low, close, volume, time);
        engine.update(raw).map(str::to_owned).map_err(to_napi)
    }

    #[napi]
    pub fn shift(
        &self,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        time: f64,
    ) -> Result<()> {
        let mut engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        let raw = RawCandle::new(open, high, low, close, volume, time);
        engine.shift(raw).map_err(to_napi)
    }

    /// Committed values as JSON.
    #[napi]
    pub fn snapshot(&self) -> Result<String> {
        let mut engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        engine.snapshot_json().map(str::to_owned).map_err(to_napi)
    }

    /// Number of committed candles held.
    #[napi]
    pub fn len(&self) -> Result<u32> {
        let engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        Ok(engine.len() as u32)
    }

    /// Releases buffers now instead of waiting for GC.
    #[napi]
    pub fn free(&self) -> Result<()> {
        let mut engine = self.inner.lock().map_err(|_| Error::from_reason("lock poisoned"))?;
        engine.free();
        Ok(())
    }
}
