//! Temporal lip-pattern classifier.
//!
//! Every processed frame contributes one mouth-openness sample to a rolling
//! window. Once the window holds enough samples it is scored against the
//! word templates, and a confident match that passes the cooldown and
//! repeat checks is appended to the transcript. Emission consumes the
//! window, so the next word is always judged on fresh frames.

/// Rolling openness and movement history
pub mod buffer;

/// Lip geometry and bounding boxes
pub mod features;

/// Word templates and sequence scoring
pub mod templates;

use crate::{
    config::LipReadingConfig,
    constants::MOUTH_LANDMARKS,
    landmarks::{FaceLandmarks, LandmarkProvider},
    Error, Result,
};
use buffer::TemporalBuffer;
use features::{BoundingBox, LipFeatures};
use image::RgbImage;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use templates::{score_sequence, WordTemplate};

/// Status reported when the face leaves the frame
pub const NO_FACE_STATUS: &str = "no face detected";

/// Status reported by a reader whose landmark provider never initialized
pub const UNAVAILABLE_STATUS: &str = "landmark provider unavailable";

/// Result of ingesting one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    /// Best-scoring word for the current window, emitted or not
    pub matched_word: Option<String>,
    /// Score of `matched_word`, `0.0` when there is none
    pub confidence: f64,
    /// Mouth region in pixels
    pub bounding_box: Option<BoundingBox>,
    /// Human readable progress or failure message
    pub status: String,
    /// Raw features of this frame
    pub features: Option<LipFeatures>,
    /// Whether `matched_word` was appended to the transcript on this frame
    pub emitted: bool,
}

impl FrameOutcome {
    fn empty(status: impl Into<String>) -> Self {
        Self {
            matched_word: None,
            confidence: 0.0,
            bounding_box: None,
            status: status.into(),
            features: None,
            emitted: false,
        }
    }
}

/// Running counters of a reader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LipStats {
    /// Frames processed while available
    pub frames_seen: u64,
    /// Accepted detections
    pub detections_emitted: u64,
    /// Words appended to the transcript
    pub words_emitted: u64,
}

/// Lip reader for a single video session
pub struct LipReader {
    provider: Option<Box<dyn LandmarkProvider>>,
    unavailable_reason: Option<String>,
    buffer: TemporalBuffer,
    templates: Arc<[WordTemplate]>,
    min_sequence_length: usize,
    cooldown: Duration,
    scoring_floor: f64,
    emission_threshold: f64,
    current_text: String,
    last_word: Option<String>,
    last_word_at: Option<Instant>,
    stats: LipStats,
}

impl LipReader {
    /// Create a reader with the default configuration
    #[must_use]
    pub fn new(provider: Box<dyn LandmarkProvider>) -> Self {
        Self::with_config(provider, &LipReadingConfig::default())
    }

    /// Create a reader with explicit settings
    #[must_use]
    pub fn with_config(provider: Box<dyn LandmarkProvider>, config: &LipReadingConfig) -> Self {
        Self::with_templates(provider, config, config.templates.clone().into())
    }

    /// Create a reader scoring against an already shared template table
    ///
    /// `config.templates` is ignored in favour of `templates`.
    #[must_use]
    pub fn with_templates(
        provider: Box<dyn LandmarkProvider>,
        config: &LipReadingConfig,
        templates: Arc<[WordTemplate]>,
    ) -> Self {
        info!(
            "Initializing LipReader with {} ({} templates, window {}, min sequence {})",
            provider.name(),
            templates.len(),
            config.history_capacity,
            config.min_sequence_length
        );
        let mut reader = Self::disabled(config, None, templates);
        reader.provider = Some(provider);
        reader
    }

    /// Create a reader from a provider that may have failed to initialize
    ///
    /// A failed provider is reported once here; the reader then answers every
    /// frame with [`UNAVAILABLE_STATUS`] for its whole lifetime.
    #[must_use]
    pub fn from_provider(provider: Result<Box<dyn LandmarkProvider>>, config: &LipReadingConfig) -> Self {
        match provider {
            Ok(provider) => Self::with_config(provider, config),
            Err(e) => {
                error!("Landmark provider initialization failed: {e}");
                Self::disabled(config, Some(e.to_string()), config.templates.clone().into())
            }
        }
    }

    /// Create a permanently unavailable reader
    ///
    /// The caller is expected to have reported `reason` already.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>, config: &LipReadingConfig) -> Self {
        let reason = reason.into();
        debug!("Lip reading unavailable: {reason}");
        Self::disabled(config, Some(reason), config.templates.clone().into())
    }

    fn disabled(config: &LipReadingConfig, reason: Option<String>, templates: Arc<[WordTemplate]>) -> Self {
        Self {
            provider: None,
            unavailable_reason: reason,
            buffer: TemporalBuffer::new(config.history_capacity),
            templates,
            min_sequence_length: config.min_sequence_length,
            cooldown: Duration::try_from_secs_f64(config.cooldown_seconds).unwrap_or_default(),
            scoring_floor: config.scoring_floor,
            emission_threshold: config.emission_threshold,
            current_text: String::new(),
            last_word: None,
            last_word_at: None,
            stats: LipStats::default(),
        }
    }

    /// Process one frame at the current time
    pub fn ingest_frame(&mut self, frame: &RgbImage) -> FrameOutcome {
        self.ingest_frame_at(frame, Instant::now())
    }

    /// Process one frame as if observed at `now`
    pub fn ingest_frame_at(&mut self, frame: &RgbImage, now: Instant) -> FrameOutcome {
        let Some(provider) = self.provider.as_mut() else {
            return FrameOutcome::empty(UNAVAILABLE_STATUS);
        };
        self.stats.frames_seen += 1;

        let landmarks = match provider.extract(frame) {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => {
                self.buffer.clear();
                return FrameOutcome::empty(NO_FACE_STATUS);
            }
            Err(e) => return Self::failure(&e),
        };

        match self.analyze(frame, &landmarks, now) {
            Ok(outcome) => outcome,
            Err(e) => Self::failure(&e),
        }
    }

    fn analyze(&mut self, frame: &RgbImage, landmarks: &FaceLandmarks, now: Instant) -> Result<FrameOutcome> {
        // Both reads validate the landmarks before any state changes
        let features = LipFeatures::from_landmarks(landmarks)?;
        let bounding_box = BoundingBox::around(landmarks, &MOUTH_LANDMARKS, frame.width(), frame.height())?;

        self.buffer.push(features.openness);

        let (matched_word, confidence) = if self.buffer.len() < self.min_sequence_length {
            (None, 0.0)
        } else {
            self.score_window()
        };

        let emitted = match matched_word.as_deref() {
            Some(word) if self.may_emit(word, confidence, now) => {
                self.emit(word, confidence, now);
                true
            }
            _ => false,
        };

        Ok(FrameOutcome {
            matched_word,
            confidence,
            bounding_box: Some(bounding_box),
            status: format!(
                "Analyzing... ({}/{} frames)",
                self.buffer.len(),
                self.min_sequence_length
            ),
            features: Some(features),
            emitted,
        })
    }

    fn score_window(&self) -> (Option<String>, f64) {
        let openness = self.buffer.openness();
        let movement = self.buffer.movement();

        if let Some(stats) = self.buffer.openness_stats() {
            debug!(
                "Scoring {} samples: openness mean {:.3} std {:.3}",
                openness.len(),
                stats.mean,
                stats.std_dev
            );
        }

        match score_sequence(&openness, &movement, &self.templates, self.scoring_floor) {
            Some(best) => (Some(best.template.name.clone()), best.score),
            None => (None, 0.0),
        }
    }

    fn may_emit(&self, word: &str, confidence: f64, now: Instant) -> bool {
        let cooled_down = self
            .last_word_at
            .map_or(true, |at| now.saturating_duration_since(at) > self.cooldown);
        confidence > self.emission_threshold && cooled_down && self.last_word.as_deref() != Some(word)
    }

    fn emit(&mut self, word: &str, confidence: f64, now: Instant) {
        info!("Lip reading detected '{word}' (score {confidence:.3})");
        self.current_text.push_str(word);
        self.current_text.push(' ');
        self.last_word = Some(word.to_string());
        self.last_word_at = Some(now);
        self.stats.detections_emitted += 1;
        self.stats.words_emitted += 1;
        self.buffer.clear();
    }

    fn failure(e: &Error) -> FrameOutcome {
        warn!("Lip reading error: {e}");
        FrameOutcome::empty(format!("Error: {e}"))
    }

    /// Reset the transcript, the last word and the rolling window
    ///
    /// Counters are kept.
    pub fn clear_text(&mut self) {
        self.current_text.clear();
        self.last_word = None;
        self.buffer.clear();
    }

    #[must_use]
    pub fn stats(&self) -> LipStats {
        self.stats
    }

    /// Accumulated transcript, each word followed by a space
    #[must_use]
    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    #[must_use]
    pub fn last_word(&self) -> Option<&str> {
        self.last_word.as_deref()
    }

    /// Template table in scoring order
    #[must_use]
    pub fn templates(&self) -> &[WordTemplate] {
        &self.templates
    }

    /// Template names in scoring order
    #[must_use]
    pub fn detectable_words(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name.as_str()).collect()
    }

    /// Samples currently buffered
    #[must_use]
    pub fn sequence_length(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn min_sequence_length(&self) -> usize {
        self.min_sequence_length
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    #[must_use]
    pub fn buffer(&self) -> &TemporalBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Why the reader is disabled, if it is
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }
}
