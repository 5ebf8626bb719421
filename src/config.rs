//! Configuration management for SignEase

use crate::{
    constants::{
        DEFAULT_EMISSION_THRESHOLD, DEFAULT_HISTORY_CAPACITY, DEFAULT_HISTORY_LIMIT, DEFAULT_MIN_SEQUENCE_LENGTH,
        DEFAULT_SCORING_FLOOR, DEFAULT_SIGN_CONFIDENCE, DEFAULT_SIGN_COOLDOWN_SECS, DEFAULT_WORD_COOLDOWN_SECS,
    },
    lip_reading::templates::{default_templates, WordTemplate},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lip reading classifier settings
    pub lip_reading: LipReadingConfig,

    /// Sign recognizer settings
    pub sign: SignConfig,

    /// Model file paths
    pub models: ModelConfig,

    /// Face mesh inference settings
    pub face_mesh: FaceMeshConfig,

    /// Placeholder motion reader settings
    pub motion: MotionConfig,

    /// History store settings
    pub history: HistoryConfig,
}

/// Temporal lip-pattern classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipReadingConfig {
    /// Openness samples kept in the rolling window
    pub history_capacity: usize,

    /// Samples required before scoring
    pub min_sequence_length: usize,

    /// Seconds that must pass between two emissions
    pub cooldown_seconds: f64,

    /// Templates must score above this to be considered
    pub scoring_floor: f64,

    /// Candidates must score above this to be emitted
    pub emission_threshold: f64,

    /// Word templates in scoring order
    pub templates: Vec<WordTemplate>,
}

/// Sign recognizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignConfig {
    /// Minimum detector confidence for a sign to count (0.0-1.0)
    pub confidence_threshold: f32,

    /// Seconds that must pass between two appended signs
    pub cooldown_seconds: f64,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the face mesh ONNX model
    pub face_mesh: PathBuf,

    /// Path to the sign detector ONNX model
    pub sign_detector: PathBuf,

    /// Sign class labels in model output order
    pub sign_labels: Vec<String>,
}

/// Face mesh inference parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMeshConfig {
    /// Square model input side in pixels
    pub input_size: u32,

    /// Minimum face presence score (0.0-1.0)
    pub min_detection_confidence: f32,
}

/// Placeholder motion reader parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Frames required for a prediction
    pub min_frames: usize,

    /// Mean pixel difference above which motion counts as strong
    pub strong_motion: f64,

    /// Mean pixel difference above which motion counts as moderate
    pub moderate_motion: f64,

    /// Normalized intensity separating the strong-motion candidate sets
    pub bright_intensity: f64,

    /// Upper bound on reported confidence
    pub max_confidence: f64,
}

/// History store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// `redb` database file; history is kept in memory when unset
    pub path: Option<PathBuf>,

    /// Default number of records returned by listings
    pub default_limit: usize,
}

impl Default for LipReadingConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_sequence_length: DEFAULT_MIN_SEQUENCE_LENGTH,
            cooldown_seconds: DEFAULT_WORD_COOLDOWN_SECS,
            scoring_floor: DEFAULT_SCORING_FLOOR,
            emission_threshold: DEFAULT_EMISSION_THRESHOLD,
            templates: default_templates(),
        }
    }
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_SIGN_CONFIDENCE,
            cooldown_seconds: DEFAULT_SIGN_COOLDOWN_SECS,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_mesh: PathBuf::from("assets/face_mesh.onnx"),
            sign_detector: PathBuf::from("assets/sign_detector.onnx"),
            sign_labels: ('A'..='Z').map(String::from).collect(),
        }
    }
}

impl Default for FaceMeshConfig {
    fn default() -> Self {
        Self {
            input_size: 192,
            min_detection_confidence: 0.5,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            min_frames: 10,
            strong_motion: 15.0,
            moderate_motion: 5.0,
            bright_intensity: 0.6,
            max_confidence: 0.95,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn check_unit_range(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")))
    }
}

impl LipReadingConfig {
    /// Validate classifier settings
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.min_sequence_length < 2 {
            return Err(Error::ConfigError(
                "Minimum sequence length must be at least 2".to_string(),
            ));
        }
        if self.history_capacity < self.min_sequence_length {
            return Err(Error::ConfigError(format!(
                "History capacity {} is smaller than minimum sequence length {}",
                self.history_capacity, self.min_sequence_length
            )));
        }
        if !self.cooldown_seconds.is_finite() || self.cooldown_seconds < 0.0 {
            return Err(Error::ConfigError(
                "Cooldown must be a non-negative number of seconds".to_string(),
            ));
        }
        check_unit_range("Scoring floor", self.scoring_floor)?;
        check_unit_range("Emission threshold", self.emission_threshold)?;

        if self.templates.is_empty() {
            return Err(Error::ConfigError("At least one word template is required".to_string()));
        }
        let mut seen = HashSet::new();
        for template in &self.templates {
            if template.name.trim().is_empty() {
                return Err(Error::ConfigError("Template names must not be empty".to_string()));
            }
            if !seen.insert(template.name.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Duplicate word template: {}",
                    template.name
                )));
            }
            if template.target_open_ratio < 0.0 || template.target_movement < 0.0 {
                return Err(Error::ConfigError(format!(
                    "Template {} has negative targets",
                    template.name
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        self.lip_reading.validate()?;

        check_unit_range("Sign confidence threshold", f64::from(self.sign.confidence_threshold))?;
        if !self.sign.cooldown_seconds.is_finite() || self.sign.cooldown_seconds < 0.0 {
            return Err(Error::ConfigError(
                "Sign cooldown must be a non-negative number of seconds".to_string(),
            ));
        }

        if self.models.sign_labels.is_empty() {
            return Err(Error::ConfigError("Sign labels must not be empty".to_string()));
        }

        if self.face_mesh.input_size == 0 {
            return Err(Error::ConfigError("Face mesh input size must be greater than 0".to_string()));
        }
        check_unit_range(
            "Face mesh detection confidence",
            f64::from(self.face_mesh.min_detection_confidence),
        )?;

        if self.motion.min_frames < 2 {
            return Err(Error::ConfigError("Motion reader needs at least 2 frames".to_string()));
        }
        if self.motion.moderate_motion > self.motion.strong_motion {
            return Err(Error::ConfigError(
                "Moderate motion threshold must not exceed strong motion threshold".to_string(),
            ));
        }
        check_unit_range("Motion max confidence", self.motion.max_confidence)?;

        if self.history.default_limit == 0 {
            return Err(Error::ConfigError("History limit must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# SignEase Configuration

# Temporal lip-pattern classifier
lip_reading:
  history_capacity: 30
  min_sequence_length: 10
  cooldown_seconds: 2.0
  scoring_floor: 0.6
  emission_threshold: 0.65
  templates:
    - { name: "hello", target_open_ratio: 0.35, target_movement: 0.12, target_duration: 0.8, pattern_thirds: [0.2, 0.4, 0.3] }
    - { name: "yes", target_open_ratio: 0.25, target_movement: 0.08, target_duration: 0.5, pattern_thirds: [0.2, 0.3, 0.2] }
    - { name: "no", target_open_ratio: 0.20, target_movement: 0.15, target_duration: 0.6, pattern_thirds: [0.2, 0.2, 0.2] }
    - { name: "thank you", target_open_ratio: 0.30, target_movement: 0.10, target_duration: 1.0, pattern_thirds: [0.3, 0.4, 0.2] }
    - { name: "please", target_open_ratio: 0.28, target_movement: 0.09, target_duration: 0.7, pattern_thirds: [0.2, 0.3, 0.3] }
    - { name: "help", target_open_ratio: 0.32, target_movement: 0.11, target_duration: 0.6, pattern_thirds: [0.3, 0.4, 0.2] }
    - { name: "water", target_open_ratio: 0.30, target_movement: 0.10, target_duration: 0.8, pattern_thirds: [0.3, 0.3, 0.3] }
    - { name: "food", target_open_ratio: 0.35, target_movement: 0.08, target_duration: 0.6, pattern_thirds: [0.4, 0.3, 0.2] }

# Sign recognizer
sign:
  confidence_threshold: 0.65
  cooldown_seconds: 1.5

# Model paths (used with the `onnx` feature)
models:
  face_mesh: "assets/face_mesh.onnx"
  sign_detector: "assets/sign_detector.onnx"

# Face mesh inference
face_mesh:
  input_size: 192
  min_detection_confidence: 0.5

# Placeholder motion reader
motion:
  min_frames: 10
  strong_motion: 15.0
  moderate_motion: 5.0
  bright_intensity: 0.6
  max_confidence: 0.95

# Conversion history
history:
  path: "history.redb"
  default_limit: 100
"#;
