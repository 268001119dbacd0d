/// Fixed-capacity ring column: appends overwrite the oldest slot once full.
///
/// Backs both the candle series (one column per OHLCV field) and the bounded windows
/// of the statistical indicators.
#[derive(Debug, Clone)]
pub struct CircularColumn<T: Copy + Default> {
    data: Vec<T>,
    /// Slot holding the oldest element.
    start: usize,
    len: usize,
}

impl<T: Copy + Default> CircularColumn<T> {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity.max(1)],
            start: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    #[inline]
    fn slot(&self, i: usize) -> usize {
        (self.start + i) % self.capacity()
    }

    /// Appends `v`; when full, the oldest element is overwritten and returned.
    #[inline]
    pub fn push(&mut self, v: T) -> Option<T> {
        if self.is_full() {
            let evicted = std::mem::replace(&mut self.data[self.start], v);
            self.start = self.slot(1);
            Some(evicted)
        } else {
            let at = self.slot(self.len);
            self.data[at] = v;
            self.len += 1;
            None
        }
    }

    /// Overwrites the newest element in place and returns the value it replaced.
    #[inline]
    pub fn update_last(&mut self, v: T) -> Option<T> {
        let at = self.slot(self.len.checked_sub(1)?);
        Some(std::mem::replace(&mut self.data[at], v))
    }

    /// Element `i` counted from the oldest.
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        (i < self.len).then(|| self.data[self.slot(i)])
    }

    #[inline]
    pub fn oldest(&self) -> Option<T> {
        self.get(0)
    }

    #[inline]
    pub fn newest(&self) -> Option<T> {
        self.get(self.len.checked_sub(1)?)
    }

    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + '_ {
        let end = self.start + self.len;
        let (wrapped, tail) = if end > self.capacity() {
            (end - self.capacity(), self.capacity())
        } else {
            (0, end)
        };
        self.data[self.start..tail]
            .iter()
            .chain(&self.data[..wrapped])
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::CircularColumn;

    fn contents<T: Copy + Default>(c: &CircularColumn<T>) -> Vec<T> {
        c.iter().collect()
    }

    #[test]
    fn push_returns_evicted_oldest() {
        let mut c = CircularColumn::<i32>::new(3);
        assert_eq!(c.push(1), None);
        assert_eq!(c.push(2), None);
        assert_eq!(c.push(3), None);
        assert!(c.is_full());
        assert_eq!(c.push(4), Some(1));
        assert_eq!(c.push(5), Some(2));
        assert_eq!(contents(&c), vec![3, 4, 5]);
        assert_eq!(c.iter().rev().collect::<Vec<_>>(), vec![5, 4, 3]);
    }

    #[test]
    fn indexing_across_the_wrap() {
        let mut c = CircularColumn::<i64>::new(4);
        for v in 1..=6 {
            c.push(v);
        }
        assert_eq!(c.oldest(), Some(3));
        assert_eq!(c.newest(), Some(6));
        assert_eq!(c.get(2), Some(5));
        assert_eq!(c.get(4), None);

        assert_eq!(c.update_last(60), Some(6));
        assert_eq!(contents(&c), vec![3, 4, 5, 60]);

        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.update_last(1), None);
        assert_eq!(c.newest(), None);
        c.push(9);
        assert_eq!(contents(&c), vec![9]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut c = CircularColumn::<f64>::new(0);
        c.push(1.0);
        assert_eq!(c.push(2.0), Some(1.0));
        assert_eq!(c.capacity(), 1);
        assert_eq!(contents(&c), vec![2.0]);
    }
}
