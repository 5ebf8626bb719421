//! Facial landmark types and providers.
//!
//! A [`LandmarkProvider`] turns a video frame into normalized face mesh
//! landmarks, or reports that no face is visible. The lip reader only reads
//! a handful of mouth indices, so landmarks are stored sparsely.

use crate::{Error, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

/// A landmark position normalized to `[0, 1]` image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    /// Horizontal position as a fraction of frame width
    pub x: f64,
    /// Vertical position as a fraction of frame height
    pub y: f64,
}

impl Point2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Landmarks of a single detected face, keyed by mesh index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    points: BTreeMap<usize, Point2>,
}

impl FaceLandmarks {
    /// Build from a dense mesh where the vector position is the index
    #[must_use]
    pub fn from_dense(points: Vec<Point2>) -> Self {
        Self {
            points: points.into_iter().enumerate().collect(),
        }
    }

    /// Build from an explicit index to point mapping
    pub fn from_indexed<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (usize, Point2)>,
    {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Landmark at `index`, if the provider produced it
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point2> {
        self.points.get(&index).copied()
    }

    /// Landmark at `index`, or a [`Error::LandmarkError`] if it is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the index is absent or its coordinates are not finite
    pub fn require(&self, index: usize) -> Result<Point2> {
        let point = self
            .get(index)
            .ok_or_else(|| Error::LandmarkError(format!("landmark {index} missing")))?;
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(Error::LandmarkError(format!(
                "landmark {index} is not finite: ({}, {})",
                point.x, point.y
            )));
        }
        Ok(point)
    }

    /// Number of landmarks present
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Source of facial landmarks for video frames
pub trait LandmarkProvider: Send {
    /// Extract landmarks of the first face in `frame`
    ///
    /// Returns `Ok(None)` when no face is visible.
    ///
    /// # Errors
    ///
    /// Returns an error when extraction itself fails
    fn extract(&mut self, frame: &RgbImage) -> Result<Option<FaceLandmarks>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Recorded landmark sequence, one entry per frame (`None` = no face)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkTrace {
    /// Width of the recorded frames in pixels
    pub width: u32,
    /// Height of the recorded frames in pixels
    pub height: u32,
    /// Per-frame landmarks as `index: [x, y]`
    pub frames: Vec<Option<BTreeMap<usize, [f64; 2]>>>,
}

impl LandmarkTrace {
    /// Load a trace from a `.json` file or, for any other extension, YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let trace: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        if trace.width == 0 || trace.height == 0 {
            return Err(Error::InvalidInput(format!(
                "trace frame size must be non-zero, got {}x{}",
                trace.width, trace.height
            )));
        }
        Ok(trace)
    }

    /// A black frame with the trace's dimensions
    #[must_use]
    pub fn blank_frame(&self) -> RgbImage {
        RgbImage::new(self.width, self.height)
    }

    /// Number of recorded frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Provider that replays a fixed landmark sequence, ignoring frame content
#[derive(Debug, Default)]
pub struct ScriptedLandmarks {
    queue: VecDeque<Option<FaceLandmarks>>,
}

impl ScriptedLandmarks {
    #[must_use]
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Option<FaceLandmarks>>,
    {
        Self {
            queue: frames.into_iter().collect(),
        }
    }

    /// Queue one more frame's result
    pub fn push(&mut self, landmarks: Option<FaceLandmarks>) {
        self.queue.push_back(landmarks);
    }

    /// Frames left to replay
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl From<&LandmarkTrace> for ScriptedLandmarks {
    fn from(trace: &LandmarkTrace) -> Self {
        Self::new(trace.frames.iter().map(|frame| {
            frame.as_ref().map(|points| {
                FaceLandmarks::from_indexed(
                    points
                        .iter()
                        .map(|(&index, &[x, y])| (index, Point2::new(x, y))),
                )
            })
        }))
    }
}

impl LandmarkProvider for ScriptedLandmarks {
    fn extract(&mut self, _frame: &RgbImage) -> Result<Option<FaceLandmarks>> {
        self.queue
            .pop_front()
            .ok_or_else(|| Error::LandmarkError("landmark script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "ScriptedLandmarks"
    }
}
