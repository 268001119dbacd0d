use crate::{circular::CircularColumn, Candle};

/// Default number of committed candles retained per engine.
pub const DEFAULT_CAPACITY: usize = 5_000;

/// Columnar (SoA) rolling buffer of committed candles plus the still-forming one.
///
/// Committed candles are append-only with oldest-first eviction. The forming candle is
/// what `update` keeps rewriting between two `shift` calls; it is never counted in
/// `len()`.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    time: CircularColumn<i64>,
    open: CircularColumn<f64>,
    high: CircularColumn<f64>,
    low: CircularColumn<f64>,
    close: CircularColumn<f64>,
    volume: CircularColumn<f64>,
    forming: Option<Candle>,
}

impl SeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            time: CircularColumn::new(capacity),
            open: CircularColumn::new(capacity),
            high: CircularColumn::new(capacity),
            low: CircularColumn::new(capacity),
            close: CircularColumn::new(capacity),
            volume: CircularColumn::new(capacity),
            forming: None,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.close.capacity()
    }

    /// Number of committed candles.
    #[inline]
    pub fn len(&self) -> usize {
        self.close.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk load, keeping the newest `capacity` candles.
    pub fn load(&mut self, candles: &[Candle]) {
        self.clear();
        let skip = candles.len().saturating_sub(self.capacity());
        for c in &candles[skip..] {
            self.push(*c);
        }
    }

    /// Appends a committed candle, returning the evicted oldest one when at capacity.
    #[inline]
    fn push(&mut self, c: Candle) -> Option<Candle> {
        let time = self.time.push(c.time);
        let open = self.open.push(c.open);
        let high = self.high.push(c.high);
        let low = self.low.push(c.low);
        let close = self.close.push(c.close);
        let volume = self.volume.push(c.volume);
        Some(Candle {
            time: time?,
            open: open?,
            high: high?,
            low: low?,
            close: close?,
            volume: volume?,
        })
    }

    /// Commits `c` and closes the forming slot.
    pub fn commit(&mut self, c: Candle) -> Option<Candle> {
        self.forming = None;
        self.push(c)
    }

    /// Rewrites the newest committed candle in place and closes the forming slot.
    /// Returns the candle it replaced, or `None` (and stores nothing) when empty.
    pub fn update_last(&mut self, c: Candle) -> Option<Candle> {
        self.forming = None;
        Some(Candle {
            time: self.time.update_last(c.time)?,
            open: self.open.update_last(c.open)?,
            high: self.high.update_last(c.high)?,
            low: self.low.update_last(c.low)?,
            close: self.close.update_last(c.close)?,
            volume: self.volume.update_last(c.volume)?,
        })
    }

    /// Replaces the forming candle and returns the previous one.
    pub fn set_forming(&mut self, c: Candle) -> Option<Candle> {
        self.forming.replace(c)
    }

    #[inline]
    pub fn forming(&self) -> Option<Candle> {
        self.forming
    }

    /// Committed candle by index from oldest (0 = oldest).
    #[inline]
    pub fn get(&self, i: usize) -> Option<Candle> {
        Some(Candle {
            time: self.time.get(i)?,
            open: self.open.get(i)?,
            high: self.high.get(i)?,
            low: self.low.get(i)?,
            close: self.close.get(i)?,
            volume: self.volume.get(i)?,
        })
    }

    /// Newest committed candle.
    #[inline]
    pub fn last_committed(&self) -> Option<Candle> {
        let i = self.len().checked_sub(1)?;
        self.get(i)
    }

    /// The last element of the series: the forming candle if any, else the newest committed.
    #[inline]
    pub fn last(&self) -> Option<Candle> {
        self.forming.or_else(|| self.last_committed())
    }

    pub fn iter(&self) -> impl Iterator<Item = Candle> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn time(&self) -> &CircularColumn<i64> {
        &self.time
    }

    pub fn close(&self) -> &CircularColumn<f64> {
        &self.close
    }

    fn clear(&mut self) {
        self.time.clear();
        self.open.clear();
        self.high.clear();
        self.low.clear();
        self.close.clear();
        self.volume.clear();
        self.forming = None;
    }
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
