//! Hand-sign transcription.
//!
//! A [`SignClassifier`] labels single frames; [`SignRecognizer`] turns the
//! stream of labels into text, appending a letter only when it is confident,
//! differs from the previous letter and arrives after the cooldown.

use crate::{
    config::SignConfig,
    constants::{DEFAULT_SIGN_CONFIDENCE, DEFAULT_SIGN_COOLDOWN_SECS, SIGN_CONFIDENCE_MAX, SIGN_CONFIDENCE_MIN},
    Error, Result,
};
use image::RgbImage;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Prediction shown when the classifier finds nothing confident
pub const NO_HAND_LABEL: &str = "No Hand";

/// Prediction shown when the classifier fails
pub const ERROR_LABEL: &str = "Error";

/// Best label of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignPrediction {
    pub label: String,
    pub confidence: f32,
}

impl SignPrediction {
    #[must_use]
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Per-frame sign classifier
pub trait SignClassifier: Send {
    /// Best prediction for a frame, `None` when no sign is visible
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn classify(&mut self, frame: &RgbImage) -> Result<Option<SignPrediction>>;

    /// Labels the classifier can produce
    fn labels(&self) -> &[String];

    /// Human readable classifier name
    fn name(&self) -> &str;

    /// Minimum score the classifier itself reports
    ///
    /// Classifiers without an internal cutoff ignore this.
    fn set_confidence_threshold(&mut self, _threshold: f32) {}
}

impl SignClassifier for Box<dyn SignClassifier> {
    fn classify(&mut self, frame: &RgbImage) -> Result<Option<SignPrediction>> {
        (**self).classify(frame)
    }

    fn labels(&self) -> &[String] {
        (**self).labels()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_confidence_threshold(&mut self, threshold: f32) {
        (**self).set_confidence_threshold(threshold);
    }
}

/// Classifier that replays a fixed sequence of results
///
/// Like a detector, it drops predictions scoring below its threshold.
#[derive(Debug, Default)]
pub struct ScriptedSigns {
    script: VecDeque<std::result::Result<Option<SignPrediction>, String>>,
    labels: Vec<String>,
    threshold: f32,
}

impl ScriptedSigns {
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            script: VecDeque::new(),
            labels,
            threshold: 0.0,
        }
    }

    /// Queue a prediction (or an empty frame for `None`)
    pub fn push(&mut self, prediction: Option<SignPrediction>) {
        self.script.push_back(Ok(prediction));
    }

    /// Queue an inference failure
    pub fn push_failure(&mut self, message: impl Into<String>) {
        self.script.push_back(Err(message.into()));
    }
}

impl SignClassifier for ScriptedSigns {
    fn classify(&mut self, _frame: &RgbImage) -> Result<Option<SignPrediction>> {
        match self.script.pop_front() {
            Some(Ok(prediction)) => Ok(prediction.filter(|p| p.confidence >= self.threshold)),
            Some(Err(message)) => Err(Error::ModelError(message)),
            None => Ok(None),
        }
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn set_confidence_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }
}

/// Stand-in for a classifier that failed to load; never sees a hand
#[derive(Debug)]
pub struct UnavailableSigns {
    reason: String,
}

impl UnavailableSigns {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!("Sign classifier unavailable: {reason}");
        Self { reason }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl SignClassifier for UnavailableSigns {
    fn classify(&mut self, _frame: &RgbImage) -> Result<Option<SignPrediction>> {
        Ok(None)
    }

    fn labels(&self) -> &[String] {
        &[]
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// How a frame was handled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignStatus {
    Success,
    NoDetection,
    Error(String),
}

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignOutcome {
    pub prediction: String,
    pub confidence: f32,
    pub current_text: String,
    pub status: SignStatus,
    /// Whether the prediction was appended to the text on this frame
    pub appended: bool,
}

/// Recognizer statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignStats {
    pub total_detections: u64,
    pub successful_detections: u64,
    pub average_confidence: f64,
    pub classifier: String,
    pub total_classes: usize,
    pub available_signs: Vec<String>,
}

/// Builds text from per-frame sign predictions
pub struct SignRecognizer<C: SignClassifier> {
    classifier: C,
    confidence_threshold: f32,
    cooldown: Duration,
    current_text: String,
    last_prediction: Option<String>,
    last_appended_at: Option<Instant>,
    total_detections: u64,
    successful_detections: u64,
    total_confidence: f64,
}

impl<C: SignClassifier> SignRecognizer<C> {
    /// Create a recognizer with the default threshold and cooldown
    #[must_use]
    pub fn new(classifier: C) -> Self {
        Self::with_config(
            classifier,
            &SignConfig {
                confidence_threshold: DEFAULT_SIGN_CONFIDENCE,
                cooldown_seconds: DEFAULT_SIGN_COOLDOWN_SECS,
            },
        )
    }

    #[must_use]
    pub fn with_config(mut classifier: C, config: &SignConfig) -> Self {
        classifier.set_confidence_threshold(config.confidence_threshold);
        info!(
            "Initializing SignRecognizer with {} ({} classes)",
            classifier.name(),
            classifier.labels().len()
        );
        Self {
            classifier,
            confidence_threshold: config.confidence_threshold,
            cooldown: Duration::try_from_secs_f64(config.cooldown_seconds).unwrap_or_default(),
            current_text: String::new(),
            last_prediction: None,
            last_appended_at: None,
            total_detections: 0,
            successful_detections: 0,
            total_confidence: 0.0,
        }
    }

    /// Process one frame at the current time
    pub fn process_image(&mut self, frame: &RgbImage) -> SignOutcome {
        self.process_image_at(frame, Instant::now())
    }

    /// Process one frame as if observed at `now`
    pub fn process_image_at(&mut self, frame: &RgbImage, now: Instant) -> SignOutcome {
        self.total_detections += 1;

        let prediction = match self.classifier.classify(frame) {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("Sign classification error: {e}");
                return self.outcome(ERROR_LABEL, 0.0, SignStatus::Error(e.to_string()), false);
            }
        };

        match prediction {
            Some(p) if p.confidence > self.confidence_threshold => {
                self.successful_detections += 1;
                self.total_confidence += f64::from(p.confidence);

                let appended = self.try_append(&p.label, now);
                self.outcome(&p.label, p.confidence, SignStatus::Success, appended)
            }
            _ => self.outcome(NO_HAND_LABEL, 0.0, SignStatus::NoDetection, false),
        }
    }

    fn try_append(&mut self, label: &str, now: Instant) -> bool {
        let cooled_down = self
            .last_appended_at
            .map_or(true, |at| now.saturating_duration_since(at) > self.cooldown);
        if !cooled_down || self.last_prediction.as_deref() == Some(label) {
            return false;
        }
        debug!("Appending sign '{label}'");
        self.current_text.push_str(label);
        self.last_prediction = Some(label.to_string());
        self.last_appended_at = Some(now);
        true
    }

    fn outcome(&self, prediction: &str, confidence: f32, status: SignStatus, appended: bool) -> SignOutcome {
        SignOutcome {
            prediction: prediction.to_string(),
            confidence,
            current_text: self.current_text.clone(),
            status,
            appended,
        }
    }

    /// Reset the text and the last appended sign
    pub fn clear_text(&mut self) {
        self.current_text.clear();
        self.last_prediction = None;
    }

    /// Append a word separator unless the text is empty or already ends with one
    pub fn add_space(&mut self) {
        if !self.current_text.is_empty() && !self.current_text.ends_with(' ') {
            self.current_text.push(' ');
        }
    }

    /// Remove the last character
    pub fn backspace(&mut self) {
        self.current_text.pop();
    }

    /// Set the acceptance threshold, clamped to the supported range
    pub fn set_confidence_threshold(&mut self, threshold: f32) {
        let clamped = if threshold.is_nan() {
            DEFAULT_SIGN_CONFIDENCE
        } else {
            threshold.clamp(SIGN_CONFIDENCE_MIN, SIGN_CONFIDENCE_MAX)
        };
        info!("Sign confidence threshold set to {clamped:.2}");
        self.confidence_threshold = clamped;
        self.classifier.set_confidence_threshold(clamped);
    }

    #[must_use]
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    #[must_use]
    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    #[must_use]
    pub fn stats(&self) -> SignStats {
        let average_confidence = if self.successful_detections > 0 {
            self.total_confidence / self.successful_detections as f64
        } else {
            0.0
        };
        SignStats {
            total_detections: self.total_detections,
            successful_detections: self.successful_detections,
            average_confidence,
            classifier: self.classifier.name().to_string(),
            total_classes: self.classifier.labels().len(),
            available_signs: self.classifier.labels().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["A", "B", "C"].iter().map(ToString::to_string).collect()
    }

    fn recognizer(script: &[Option<(&str, f32)>]) -> SignRecognizer<ScriptedSigns> {
        let mut classifier = ScriptedSigns::new(labels());
        for entry in script {
            classifier.push(entry.map(|(label, confidence)| SignPrediction::new(label, confidence)));
        }
        SignRecognizer::new(classifier)
    }

    #[test]
    fn test_confident_sign_is_appended() {
        let mut recognizer = recognizer(&[Some(("A", 0.9))]);
        let outcome = recognizer.process_image_at(&RgbImage::new(4, 4), Instant::now());
        assert_eq!(outcome.prediction, "A");
        assert_eq!(outcome.status, SignStatus::Success);
        assert!(outcome.appended);
        assert_eq!(outcome.current_text, "A");
    }

    #[test]
    fn test_low_confidence_is_no_detection() {
        let mut recognizer = recognizer(&[Some(("A", 0.65)), None]);
        let frame = RgbImage::new(4, 4);
        let outcome = recognizer.process_image(&frame);
        assert_eq!(outcome.prediction, NO_HAND_LABEL);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.status, SignStatus::NoDetection);
        assert_eq!(recognizer.process_image(&frame).status, SignStatus::NoDetection);

        let stats = recognizer.stats();
        assert_eq!(stats.total_detections, 2);
        assert_eq!(stats.successful_detections, 0);
        assert_eq!(stats.average_confidence, 0.0);
    }

    #[test]
    fn test_cooldown_and_duplicates() {
        let mut recognizer = recognizer(&[
            Some(("A", 0.9)),
            Some(("B", 0.9)),
            Some(("A", 0.8)),
            Some(("B", 0.8)),
        ]);
        let frame = RgbImage::new(4, 4);
        let start = Instant::now();

        assert!(recognizer.process_image_at(&frame, start).appended);
        // Inside the cooldown
        assert!(!recognizer.process_image_at(&frame, start + Duration::from_secs(1)).appended);
        // Same letter as the last one appended
        assert!(!recognizer.process_image_at(&frame, start + Duration::from_secs(2)).appended);
        assert!(recognizer.process_image_at(&frame, start + Duration::from_secs(3)).appended);
        assert_eq!(recognizer.current_text(), "AB");

        let stats = recognizer.stats();
        assert_eq!(stats.successful_detections, 4);
        assert!((stats.average_confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_classifier_error() {
        let mut classifier = ScriptedSigns::new(labels());
        classifier.push_failure("bad tensor");
        let mut recognizer = SignRecognizer::new(classifier);
        let outcome = recognizer.process_image(&RgbImage::new(4, 4));
        assert_eq!(outcome.prediction, ERROR_LABEL);
        assert!(matches!(outcome.status, SignStatus::Error(ref msg) if msg.contains("bad tensor")));
        assert_eq!(recognizer.stats().total_detections, 1);
    }

    #[test]
    fn test_text_editing() {
        let mut recognizer = recognizer(&[Some(("A", 0.9))]);
        recognizer.add_space();
        assert_eq!(recognizer.current_text(), "");

        recognizer.process_image(&RgbImage::new(4, 4));
        recognizer.add_space();
        recognizer.add_space();
        assert_eq!(recognizer.current_text(), "A ");

        recognizer.backspace();
        recognizer.backspace();
        recognizer.backspace();
        assert_eq!(recognizer.current_text(), "");

        recognizer.clear_text();
        assert_eq!(recognizer.current_text(), "");
    }

    #[test]
    fn test_threshold_clamping() {
        let mut recognizer = recognizer(&[]);
        recognizer.set_confidence_threshold(0.1);
        assert_eq!(recognizer.confidence_threshold(), SIGN_CONFIDENCE_MIN);
        recognizer.set_confidence_threshold(0.99);
        assert_eq!(recognizer.confidence_threshold(), SIGN_CONFIDENCE_MAX);
        recognizer.set_confidence_threshold(0.7);
        assert_eq!(recognizer.confidence_threshold(), 0.7);
    }

    #[test]
    fn test_lowered_threshold_reaches_classifier() {
        let mut recognizer = recognizer(&[Some(("A", 0.4)), Some(("A", 0.4))]);
        let frame = RgbImage::new(4, 4);

        // The classifier applies the configured 0.65 cutoff itself
        assert_eq!(recognizer.process_image(&frame).status, SignStatus::NoDetection);

        recognizer.set_confidence_threshold(0.3);
        let outcome = recognizer.process_image(&frame);
        assert_eq!(outcome.status, SignStatus::Success);
        assert_eq!(outcome.prediction, "A");
        assert_eq!(recognizer.current_text(), "A");
    }

    #[test]
    fn test_unavailable_classifier_reports_no_hand() {
        let mut recognizer = SignRecognizer::new(UnavailableSigns::new("model missing"));
        let outcome = recognizer.process_image(&RgbImage::new(4, 4));
        assert_eq!(outcome.status, SignStatus::NoDetection);
        assert!(recognizer.stats().available_signs.is_empty());
    }
}
