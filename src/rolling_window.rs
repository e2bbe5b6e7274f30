// Fixed-length FIFO history buffer backing the CPU and RAM charts.

use std::collections::VecDeque;

/// History length used when none is configured.
pub const DEFAULT_HISTORY_LEN: usize = 20;

/// Fixed-capacity buffer that always holds exactly `capacity` samples, oldest first.
///
/// The buffer is pre-filled with a neutral value at construction, so consumers see a
/// full-length series from the very first render, before any real sample has arrived.
/// Capacity never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow<T = f64> {
    buf: VecDeque<T>,
}

impl<T: Clone> RollingWindow<T> {
    /// Creates a window of `capacity` slots, each holding `fill`.
    pub fn new(capacity: usize, fill: T) -> Self {
        let mut buf = VecDeque::with_capacity(capacity);
        buf.resize(capacity, fill);
        Self { buf }
    }

    /// Appends `value` as the newest sample and evicts the oldest one, returning it.
    ///
    /// A zero-capacity window keeps nothing and hands `value` straight back.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.buf.is_empty() {
            return Some(value);
        }
        let evicted = self.buf.pop_front();
        self.buf.push_back(value);
        evicted
    }

    /// Copy of the samples in chronological order (most recent last).
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }
}

impl<T> RollingWindow<T> {
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Most recently pushed sample (or the fill value before any push).
    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }
}

impl<T: Clone + Default> RollingWindow<T> {
    /// Window pre-filled with `T::default()` (zero for numeric samples).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, T::default())
    }
}

impl Default for RollingWindow<f64> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LEN)
    }
}
