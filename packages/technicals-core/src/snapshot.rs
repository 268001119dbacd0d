//! Snapshot serializer: indicator values -> compact JSON object, keys in settings order.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::indicator::IndicatorValue;

/// Replaces non-finite output with `Pending`.
fn finite_or_pending(key: &str, v: IndicatorValue) -> IndicatorValue {
    if v.is_finite() {
        v
    } else {
        debug!(key, value = ?v, "non-finite indicator output reported as null");
        IndicatorValue::Pending
    }
}

/// Owned copy of every indicator's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, IndicatorValue)>,
}

impl Snapshot {
    pub(crate) fn collect<'a>(values: impl Iterator<Item = (&'a str, IndicatorValue)>) -> Self {
        Self {
            entries: values
                .map(|(k, v)| (k.to_string(), finite_or_pending(k, v)))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(EngineError::Serialize)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Reusable output buffer. `write` clears and refills it, so steady-state calls do not
/// allocate once the buffer has grown to the snapshot's size.
#[derive(Debug, Default, Clone)]
pub struct SnapshotWriter {
    buf: Vec<u8>,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<'a>(
        &mut self,
        values: impl Iterator<Item = (&'a str, IndicatorValue)>,
    ) -> Result<&str> {
        self.buf.clear();
        let mut ser = serde_json::Serializer::new(&mut self.buf);
        (&mut ser)
            .collect_map(values.map(|(k, v)| (k, finite_or_pending(k, v))))
            .map_err(EngineError::Serialize)?;
        std::str::from_utf8(&self.buf)
            .map_err(|e| EngineError::Serialize(serde_json::Error::custom(e)))
    }

    /// Drops the buffer's allocation.
    pub fn release(&mut self) {
        self.buf = Vec::new();
    }
}
