//! Placeholder whole-clip lip reader.
//!
//! This is not a neural model. It measures how much the mouth region
//! changes across a clip, maps that to one of three small candidate sets
//! and picks a word from the set at random. It exists so callers can wire
//! a clip-level reader end to end; the landmark-based [`crate::lip_reading`]
//! classifier is the real one.

use crate::{
    config::MotionConfig,
    constants::MOTION_FRAME_SIZE,
    utils::image_conversion::{mean_abs_diff, mean_intensity, to_square_grayscale},
    Error, Result,
};
use image::{GrayImage, RgbImage};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

const BRIGHT_STRONG_MOTION_WORDS: [&str; 3] = ["HELLO", "THANK YOU", "HELP"];
const DARK_STRONG_MOTION_WORDS: [&str; 3] = ["YES", "OK", "GOOD"];
const MODERATE_MOTION_WORDS: [&str; 3] = ["PLEASE", "SORRY", "WELCOME"];
const LOW_MOTION_WORDS: [&str; 3] = ["NO", "STOP", "BYE"];

/// Words a full clip-level model would be expected to cover
pub const COMMON_WORDS: [&str; 20] = [
    "HELLO", "YES", "NO", "THANK", "YOU", "PLEASE", "SORRY", "HELP", "STOP", "OK", "GOOD", "BAD", "WELCOME", "BYE",
    "MORNING", "EVENING", "NIGHT", "DAY", "TIME", "NOW",
];

/// Guess for one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionPrediction {
    pub word: String,
    pub confidence: f64,
    /// Mean absolute difference between consecutive frames (0-255 scale)
    pub movement: f64,
    /// Mean normalized intensity over the clip
    pub mean_intensity: f64,
}

/// Description of the reader for status endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionReaderInfo {
    pub method: &'static str,
    pub neural: bool,
    pub frame_size: u32,
    pub min_frames: usize,
    pub common_words: Vec<&'static str>,
}

/// Motion-threshold word picker
pub struct MotionHeuristicReader<R: Rng = StdRng> {
    config: MotionConfig,
    rng: R,
}

impl MotionHeuristicReader<StdRng> {
    /// Reader seeded from system entropy
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reader with reproducible picks
    #[must_use]
    pub fn seeded(config: MotionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MotionHeuristicReader<R> {
    #[must_use]
    pub fn with_rng(config: MotionConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Guess a word for a clip of mouth-region frames
    ///
    /// # Errors
    ///
    /// Returns an error if the clip is shorter than the configured minimum
    pub fn predict(&mut self, frames: &[RgbImage]) -> Result<MotionPrediction> {
        if frames.len() < self.config.min_frames {
            return Err(Error::InvalidInput(format!(
                "Need at least {} frames, got {}",
                self.config.min_frames,
                frames.len()
            )));
        }

        let gray: Vec<GrayImage> = frames
            .iter()
            .map(|frame| to_square_grayscale(frame, MOTION_FRAME_SIZE))
            .collect();

        let diffs = gray
            .windows(2)
            .map(|pair| mean_abs_diff(&pair[0], &pair[1]))
            .collect::<Result<Vec<f64>>>()?;
        let movement = if diffs.is_empty() {
            0.0
        } else {
            diffs.iter().sum::<f64>() / diffs.len() as f64
        };
        let intensity = mean_intensity(&gray);

        let candidates = self.candidates(movement, intensity);
        let word = candidates[self.rng.gen_range(0..candidates.len())];
        let confidence = (0.5 + movement / 50.0).min(self.config.max_confidence);

        info!("Motion heuristic picked {word} (confidence {confidence:.2}, movement {movement:.1})");

        Ok(MotionPrediction {
            word: word.to_string(),
            confidence,
            movement,
            mean_intensity: intensity,
        })
    }

    /// Candidate set for the measured motion
    #[must_use]
    pub fn candidates(&self, movement: f64, intensity: f64) -> &'static [&'static str] {
        if movement > self.config.strong_motion {
            if intensity > self.config.bright_intensity {
                &BRIGHT_STRONG_MOTION_WORDS
            } else {
                &DARK_STRONG_MOTION_WORDS
            }
        } else if movement > self.config.moderate_motion {
            &MODERATE_MOTION_WORDS
        } else {
            &LOW_MOTION_WORDS
        }
    }

    #[must_use]
    pub fn info(&self) -> MotionReaderInfo {
        MotionReaderInfo {
            method: "motion-heuristic",
            neural: false,
            frame_size: MOTION_FRAME_SIZE,
            min_frames: self.config.min_frames,
            common_words: COMMON_WORDS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn clip(values: &[u8]) -> Vec<RgbImage> {
        values
            .iter()
            .map(|&v| RgbImage::from_pixel(96, 96, Rgb([v, v, v])))
            .collect()
    }

    #[test]
    fn test_requires_min_frames() {
        let mut reader = MotionHeuristicReader::seeded(MotionConfig::default(), 7);
        assert!(matches!(reader.predict(&clip(&[0; 9])), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_still_clip_is_low_motion() {
        let mut reader = MotionHeuristicReader::seeded(MotionConfig::default(), 7);
        let prediction = reader.predict(&clip(&[128; 10])).unwrap();
        assert_eq!(prediction.movement, 0.0);
        assert_eq!(prediction.confidence, 0.5);
        assert!(LOW_MOTION_WORDS.contains(&prediction.word.as_str()));
    }

    #[test]
    fn test_alternating_bright_clip_is_strong_motion() {
        // Alternating 200/255 frames differ by 55 everywhere
        let values: Vec<u8> = (0..10).map(|i| if i % 2 == 0 { 200 } else { 255 }).collect();
        let mut reader = MotionHeuristicReader::seeded(MotionConfig::default(), 7);
        let prediction = reader.predict(&clip(&values)).unwrap();
        assert!((prediction.movement - 55.0).abs() < 1e-9);
        assert!(prediction.mean_intensity > 0.6);
        assert_eq!(prediction.confidence, 0.95);
        assert!(BRIGHT_STRONG_MOTION_WORDS.contains(&prediction.word.as_str()));
    }

    #[test]
    fn test_candidate_sets() {
        let reader = MotionHeuristicReader::seeded(MotionConfig::default(), 1);
        assert_eq!(reader.candidates(20.0, 0.3), &DARK_STRONG_MOTION_WORDS);
        assert_eq!(reader.candidates(10.0, 0.9), &MODERATE_MOTION_WORDS);
        assert_eq!(reader.candidates(5.0, 0.9), &LOW_MOTION_WORDS);
    }

    #[test]
    fn test_seeded_readers_agree() {
        let values: Vec<u8> = (0..12).map(|i| (i * 20) as u8).collect();
        let mut a = MotionHeuristicReader::seeded(MotionConfig::default(), 42);
        let mut b = MotionHeuristicReader::seeded(MotionConfig::default(), 42);
        assert_eq!(a.predict(&clip(&values)).unwrap(), b.predict(&clip(&values)).unwrap());
    }

    #[test]
    fn test_info_is_not_neural() {
        let info = MotionHeuristicReader::seeded(MotionConfig::default(), 0).info();
        assert!(!info.neural);
        assert_eq!(info.common_words.len(), 20);
        assert_eq!(info.frame_size, 96);
    }
}
