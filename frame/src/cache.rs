//! Bounded frame cache keyed by timestamp.

use crate::RawFrame;
use std::collections::{HashMap, VecDeque};

/// Keeps the most recently inserted frames, evicting the oldest insert first.
///
/// Dragging over a paused video requests the same timestamp over and over;
/// the cache turns those into lookups instead of fresh extractions.
#[derive(Debug, Default)]
pub struct FrameCache {
    capacity: usize,
    frames: HashMap<u64, RawFrame>,
    order: VecDeque<u64>,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames. Zero disables caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            frames: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up the frame cached for `timestamp_ms`.
    #[must_use]
    pub fn get(&self, timestamp_ms: u64) -> Option<RawFrame> {
        self.frames.get(&timestamp_ms).cloned()
    }

    /// Cache `frame` under `timestamp_ms`.
    pub fn insert(&mut self, timestamp_ms: u64, frame: RawFrame) {
        if self.capacity == 0 {
            return;
        }
        if self.frames.insert(timestamp_ms, frame).is_some() {
            return;
        }

        self.order.push_back(timestamp_ms);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.frames.remove(&oldest);
            }
        }
    }

    /// Number of cached frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every cached frame.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn frame(timestamp_ms: u64) -> RawFrame {
        RawFrame::from_rgba(RgbaImage::new(1, 1), timestamp_ms)
    }

    #[test]
    fn evicts_oldest_insert() {
        let mut cache = FrameCache::new(2);
        cache.insert(0, frame(0));
        cache.insert(33, frame(33));
        cache.insert(66, frame(66));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(0).is_none());
        assert_eq!(cache.get(66).map(|f| f.timestamp_ms), Some(66));
    }

    #[test]
    fn reinserting_does_not_grow() {
        let mut cache = FrameCache::new(2);
        cache.insert(10, frame(10));
        cache.insert(10, frame(10));
        cache.insert(20, frame(20));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(10).is_some());
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let mut cache = FrameCache::new(0);
        cache.insert(10, frame(10));
        assert!(cache.is_empty());
    }
}
