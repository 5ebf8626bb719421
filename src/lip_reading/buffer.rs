//! Rolling history of per-frame openness and movement samples.

use std::collections::VecDeque;

/// Bounded openness/movement history with oldest-first eviction
///
/// The movement ring holds one fewer sample than the openness ring, so
/// every stored movement is the delta between two stored openness values.
#[derive(Debug, Clone)]
pub struct TemporalBuffer {
    capacity: usize,
    openness_history: VecDeque<f64>,
    movement_history: VecDeque<f64>,
}

impl TemporalBuffer {
    /// Create a buffer holding at most `capacity` openness samples
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            openness_history: VecDeque::with_capacity(capacity),
            movement_history: VecDeque::with_capacity(capacity - 1),
        }
    }

    /// Append an openness sample, returning the movement it produced
    pub fn push(&mut self, openness: f64) -> Option<f64> {
        let previous = self.openness_history.back().copied();

        if self.openness_history.len() >= self.capacity {
            self.openness_history.pop_front();
        }
        self.openness_history.push_back(openness);

        let movement = (openness - previous?).abs();
        if self.capacity > 1 {
            if self.movement_history.len() >= self.capacity - 1 {
                self.movement_history.pop_front();
            }
            self.movement_history.push_back(movement);
        }
        Some(movement)
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.openness_history.clear();
        self.movement_history.clear();
    }

    /// Number of openness samples held
    #[must_use]
    pub fn len(&self) -> usize {
        self.openness_history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.openness_history.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Openness samples, oldest first
    #[must_use]
    pub fn openness(&self) -> Vec<f64> {
        self.openness_history.iter().copied().collect()
    }

    /// Movement samples, oldest first
    #[must_use]
    pub fn movement(&self) -> Vec<f64> {
        self.movement_history.iter().copied().collect()
    }

    #[must_use]
    pub fn movement_len(&self) -> usize {
        self.movement_history.len()
    }

    /// Summary of the openness window, if any samples are held
    #[must_use]
    pub fn openness_stats(&self) -> Option<Statistics> {
        Statistics::of(&self.openness_history)
    }

    /// Summary of the movement window, if any samples are held
    #[must_use]
    pub fn movement_stats(&self) -> Option<Statistics> {
        Statistics::of(&self.movement_history)
    }
}

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
}

impl Statistics {
    fn of(data: &VecDeque<f64>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min: data.iter().copied().fold(f64::INFINITY, f64::min),
            max: data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}
