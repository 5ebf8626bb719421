//! Per-frame lip geometry.

use crate::{
    constants::{
        LEFT_MOUTH_CORNER_INDEX, LOWER_LIP_INDEX, OPENNESS_EPSILON, RIGHT_MOUTH_CORNER_INDEX, UPPER_LIP_INDEX,
    },
    landmarks::FaceLandmarks,
    utils::safe_cast::f64_to_i32,
    Result,
};
use serde::Serialize;

/// Mouth measurements derived from one frame's landmarks
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LipFeatures {
    /// Vertical lip gap over mouth width
    pub openness: f64,
    /// Normalized distance between upper and lower lip
    #[serde(rename = "vertical")]
    pub vertical_gap: f64,
    /// Normalized distance between the mouth corners
    #[serde(rename = "horizontal")]
    pub horizontal_width: f64,
}

impl LipFeatures {
    /// Compute features from the four mouth landmarks
    ///
    /// # Errors
    ///
    /// Returns an error if any of the mouth landmarks is missing or not finite
    pub fn from_landmarks(landmarks: &FaceLandmarks) -> Result<Self> {
        let upper = landmarks.require(UPPER_LIP_INDEX)?;
        let lower = landmarks.require(LOWER_LIP_INDEX)?;
        let left = landmarks.require(LEFT_MOUTH_CORNER_INDEX)?;
        let right = landmarks.require(RIGHT_MOUTH_CORNER_INDEX)?;

        let vertical_gap = (upper.y - lower.y).abs();
        let horizontal_width = (left.x - right.x).abs();

        Ok(Self {
            openness: vertical_gap / (horizontal_width + OPENNESS_EPSILON),
            vertical_gap,
            horizontal_width,
        })
    }
}

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Box enclosing `indices` of `landmarks`, scaled to a `width` x `height` frame
    ///
    /// # Errors
    ///
    /// Returns an error if any requested landmark is missing
    pub fn around(landmarks: &FaceLandmarks, indices: &[usize], width: u32, height: u32) -> Result<Self> {
        let (w, h) = (f64::from(width), f64::from(height));
        let mut bbox = Self {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for &index in indices {
            let point = landmarks.require(index)?;
            let (x, y) = (point.x * w, point.y * h);
            bbox.x_min = bbox.x_min.min(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_max = bbox.y_max.max(y);
        }
        Ok(bbox)
    }

    /// Corners truncated to integers as `[x_min, y_min, x_max, y_max]`
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate does not fit in `i32`
    pub fn to_pixels(&self) -> Result<[i32; 4]> {
        Ok([
            f64_to_i32(self.x_min)?,
            f64_to_i32(self.y_min)?,
            f64_to_i32(self.x_max)?,
            f64_to_i32(self.y_max)?,
        ])
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MOUTH_LANDMARKS;
    use crate::landmarks::Point2;

    fn mouth(gap: f64, width: f64) -> FaceLandmarks {
        FaceLandmarks::from_indexed([
            (UPPER_LIP_INDEX, Point2::new(0.5, 0.5)),
            (LOWER_LIP_INDEX, Point2::new(0.5, 0.5 + gap)),
            (LEFT_MOUTH_CORNER_INDEX, Point2::new(0.5 - width / 2.0, 0.52)),
            (RIGHT_MOUTH_CORNER_INDEX, Point2::new(0.5 + width / 2.0, 0.52)),
        ])
    }

    #[test]
    fn test_openness_ratio() {
        let features = LipFeatures::from_landmarks(&mouth(0.06, 0.2)).unwrap();
        assert!((features.vertical_gap - 0.06).abs() < 1e-12);
        assert!((features.horizontal_width - 0.2).abs() < 1e-12);
        assert!((features.openness - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_collapsed_mouth_width_is_guarded() {
        let features = LipFeatures::from_landmarks(&mouth(0.01, 0.0)).unwrap();
        assert!(features.openness.is_finite());
        assert!((features.openness - 0.01 / OPENNESS_EPSILON).abs() < 1e-3);
    }

    #[test]
    fn test_missing_corner_is_an_error() {
        let landmarks = FaceLandmarks::from_indexed([
            (UPPER_LIP_INDEX, Point2::new(0.5, 0.5)),
            (LOWER_LIP_INDEX, Point2::new(0.5, 0.55)),
        ]);
        assert!(LipFeatures::from_landmarks(&landmarks).is_err());
    }

    #[test]
    fn test_bounding_box_in_pixels() {
        let bbox = BoundingBox::around(&mouth(0.1, 0.2), &MOUTH_LANDMARKS, 640, 480).unwrap();
        assert!((bbox.x_min - 256.0).abs() < 1e-9);
        assert!((bbox.x_max - 384.0).abs() < 1e-9);
        assert!((bbox.y_min - 240.0).abs() < 1e-9);
        assert!((bbox.y_max - 288.0).abs() < 1e-9);
        assert!((bbox.width() - 128.0).abs() < 1e-9);
        assert_eq!(bbox.to_pixels().unwrap(), [256, 240, 384, 288]);
    }
}
