//! WebAssembly module (wasm-bindgen).
//!
//! Build with: `wasm-pack build packages/technicals-core -- --features ffi-wasm`

use std::io::{self, Write};

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::prelude::*;

use crate::engine::Engine;
use crate::{RawCandle, SeriesInput};

/// Browser console method an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Error,
    Warn,
    Info,
    Log,
}

impl Channel {
    fn for_level(level: &Level) -> Self {
        if *level == Level::ERROR {
            Channel::Error
        } else if *level == Level::WARN {
            Channel::Warn
        } else if *level == Level::INFO {
            Channel::Info
        } else {
            Channel::Log
        }
    }

    fn emit(self, msg: &JsValue) {
        match self {
            Channel::Error => web_sys::console::error_1(msg),
            Channel::Warn => web_sys::console::warn_1(msg),
            Channel::Info => web_sys::console::info_1(msg),
            Channel::Log => web_sys::console::log_1(msg),
        }
    }
}

/// Collects one formatted event and hands it to the console when dropped.
struct ConsoleWriter {
    channel: Channel,
    buf: Vec<u8>,
}

impl Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let msg = String::from_utf8_lossy(&self.buf);
        self.channel.emit(&JsValue::from_str(msg.trim_end()));
    }
}

struct Console;

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            channel: Channel::Log,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            channel: Channel::for_level(meta.level()),
            buf: Vec::new(),
        }
    }
}

/// Routes `tracing` events to the browser console. Sanitization warnings are always kept;
/// debug builds also show lifecycle events.
fn init_log() {
    let max_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::WARN
    };
    // wasm32 has no clock, so events carry no timestamp
    let _ = tracing_subscriber::fmt()
        .with_writer(Console)
        .with_max_level(max_level)
        .without_time()
        .try_init();
}

/// Module start hook; runs once when the module is instantiated, not per engine.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    init_log();
}

fn to_js(e: crate::EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct TechnicalsCalculator {
    inner: Engine,
}

impl Default for TechnicalsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl TechnicalsCalculator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Engine::new(),
        }
    }

    /// Argument order follows the host bridge: volumes come before closes.
    pub fn initialize(
        &mut self,
        times: &[f64],
        opens: &[f64],
        highs: &[f64],
        lows: &[f64],
        volumes: &[f64],
        closes: &[f64],
        settings_json: &str,
    ) -> Result<(), JsValue> {
        let input = SeriesInput {
            times,
            opens,
            highs,
            lows,
            closes,
            volumes,
        };
        self.inner.initialize(input, settings_json).map_err(to_js)
    }

    pub fn update(
        &mut self,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        time: f64,
    ) -> Result<String, JsValue> {
        let raw = RawCandle::new(open, high, low, close, volume, time);
        self.inner.update(raw).map(str::to_owned).map_err(to_js)
    }

    pub fn shift(
        &mut self,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        time: f64,
    ) -> Result<(), JsValue> {
        let raw = RawCandle::new(open, high, low, close, volume, time);
        self.inner.shift(raw).map_err(to_js)
    }

    /// Committed values as JSON.
    pub fn snapshot(&mut self) -> Result<String, JsValue> {
        self.inner.snapshot_json().map(str::to_owned).map_err(to_js)
    }

    /// Releases the engine's buffers ahead of the JS wrapper's own `free()`.
    #[wasm_bindgen(js_name = release)]
    pub fn release(&mut self) {
        self.inner.free();
    }
}

#[cfg(test)]
mod tests {
    use super::Channel;
    use tracing::Level;

    #[test]
    fn levels_map_to_console_methods() {
        assert_eq!(Channel::for_level(&Level::ERROR), Channel::Error);
        assert_eq!(Channel::for_level(&Level::WARN), Channel::Warn);
        assert_eq!(Channel::for_level(&Level::INFO), Channel::Info);
        assert_eq!(Channel::for_level(&Level::DEBUG), Channel::Log);
        assert_eq!(Channel::for_level(&Level::TRACE), Channel::Log);
    }
}
