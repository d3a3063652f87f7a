use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::core::Frame;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// Batches must extend the loaded prefix exactly
    #[error("non-contiguous batch: expected start {expected}, got {got}")]
    NonContiguous { expected: usize, got: usize },
}

/// Append-only frame sequence for one session.
///
/// Frames arrive in contiguous batches while playback may already be running
/// over the loaded prefix. `loaded_count` only grows.
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: Vec<Arc<Frame>>,
    total: usize,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the frame count announced by the source
    pub fn set_total(&mut self, total: usize) {
        if total < self.frames.len() {
            warn!(
                "Source announced {} frames but {} are already loaded, keeping loaded count",
                total,
                self.frames.len()
            );
            self.total = self.frames.len();
        } else {
            self.total = total;
        }
    }

    /// Append a batch starting at `start`.
    ///
    /// Returns the number of frames actually appended. Frames past the
    /// announced total are dropped.
    pub fn append(&mut self, start: usize, frames: Vec<Frame>) -> Result<usize, StoreError> {
        if start != self.frames.len() {
            return Err(StoreError::NonContiguous {
                expected: self.frames.len(),
                got: start,
            });
        }

        let room = self.total.saturating_sub(self.frames.len());
        if frames.len() > room {
            warn!(
                "Dropping {} frames beyond the announced total of {}",
                frames.len() - room,
                self.total
            );
        }

        let before = self.frames.len();
        self.frames.extend(frames.into_iter().take(room).map(Arc::new));
        Ok(self.frames.len() - before)
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    pub fn loaded_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.frames.len() == self.total
    }

    /// Frame at `index`, or `None` while it has not arrived yet
    pub fn frame_at(&self, index: usize) -> Option<&Arc<Frame>> {
        self.frames.get(index)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.frames.len() as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn frames(start: usize, count: usize) -> Vec<Frame> {
        (start..start + count)
            .map(|i| Frame {
                t: i as f64 / 25.0,
                lap: 1,
                drivers: HashMap::new(),
                weather: None,
            })
            .collect()
    }

    #[test]
    fn test_empty_store() {
        let store = FrameStore::new();
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.loaded_count(), 0);
        assert!(!store.is_complete());
        assert!(store.frame_at(0).is_none());
        assert_eq!(store.progress_percent(), 0.0);
    }

    #[test]
    fn test_append_contiguous_batches() {
        let mut store = FrameStore::new();
        store.set_total(1500);

        assert_eq!(store.append(0, frames(0, 1000)), Ok(1000));
        assert_eq!(store.loaded_count(), 1000);
        assert!(store.frame_at(999).is_some());
        assert!(store.frame_at(1000).is_none());
        assert!(!store.is_complete());
        assert!((store.progress_percent() - 66.666).abs() < 0.01);

        assert_eq!(store.append(1000, frames(1000, 500)), Ok(500));
        assert!(store.is_complete());
        assert!((store.frame_at(1200).unwrap().t - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_gap_and_overlap() {
        let mut store = FrameStore::new();
        store.set_total(100);
        store.append(0, frames(0, 10)).unwrap();

        assert_eq!(
            store.append(20, frames(20, 10)),
            Err(StoreError::NonContiguous { expected: 10, got: 20 })
        );
        assert_eq!(
            store.append(5, frames(5, 10)),
            Err(StoreError::NonContiguous { expected: 10, got: 5 })
        );
        assert_eq!(store.loaded_count(), 10);
    }

    #[test]
    fn test_loaded_never_exceeds_total() {
        let mut store = FrameStore::new();
        store.set_total(8);

        let mut last = 0;
        for start in [0usize, 5] {
            let appended = store.append(start, frames(start, 5)).unwrap();
            assert!(store.loaded_count() >= last);
            assert!(store.loaded_count() <= store.total_count());
            last = store.loaded_count();
            if start == 5 {
                assert_eq!(appended, 3);
            }
        }
        assert!(store.is_complete());
    }
}
