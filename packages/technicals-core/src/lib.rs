//! Incremental technical-indicator engine (ring-buffer SoA candles + stateful indicators).
//!
//! Pure computation: no I/O, single-threaded, deterministic given its inputs. Numbers are
//! IEEE-754 doubles throughout; callers holding decimal prices convert at the boundary.

mod types;
pub use types::*;

pub mod circular;
pub mod error;
pub mod period;
pub mod sanitize;
pub mod series;
pub mod settings;

pub mod indicator;
pub mod snapshot;

pub mod engine;

pub mod ffi;

pub use engine::{Checkpoint, Engine};
pub use error::{EngineError, Result, SettingsError};
pub use indicator::{Indicator, IndicatorValue};
pub use settings::ParsedSettings;
pub use snapshot::Snapshot;
