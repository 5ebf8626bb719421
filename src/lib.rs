//! SignEase: assistive sign and lip reading pipelines.
//!
//! The library provides:
//! - A temporal lip-pattern classifier that scores a rolling window of mouth
//!   openness and movement against word templates
//! - A hand-sign recognizer that turns per-frame sign labels into text
//! - Text to ASL animation lookup
//! - An append-only conversion history with in-memory and JSON lines stores
//! - `ONNX` Runtime face mesh and sign detector backends (feature `onnx`)
//!
//! The lip reading pipeline consists of:
//! 1. Landmark extraction from a video frame
//! 2. Mouth openness from the lip and mouth corner landmarks
//! 3. Rolling openness and movement history
//! 4. Template scoring once enough frames are buffered
//! 5. Cooldown-gated emission of the best word
//!
//! # Examples
//!
//! ## Lip Reading
//!
//! ```no_run
//! use signease::landmarks::{LandmarkTrace, ScriptedLandmarks};
//! use signease::lip_reading::LipReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Replay recorded landmarks instead of running a face mesh model
//! let trace = LandmarkTrace::from_file("trace.yaml")?;
//! let frame = trace.blank_frame();
//! let mut reader = LipReader::new(Box::new(ScriptedLandmarks::from(&trace)));
//!
//! for _ in 0..trace.len() {
//!     let outcome = reader.ingest_frame(&frame);
//!     if outcome.emitted {
//!         println!("Detected: {:?} ({:.2})", outcome.matched_word, outcome.confidence);
//!     }
//! }
//! println!("Transcript: {}", reader.current_text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoring a Sequence
//!
//! ```
//! use signease::lip_reading::templates::{default_templates, score_sequence};
//!
//! let openness = vec![0.3; 12];
//! let movement = vec![0.1; 11];
//! let templates = default_templates();
//!
//! let best = score_sequence(&openness, &movement, &templates, 0.6).expect("a template matches");
//! assert_eq!(best.template.name, "water");
//! ```
//!
//! ## Text to ASL
//!
//! ```
//! let translation = signease::text_to_asl::translate("Hi, nice to meet you!")?;
//! assert_eq!(translation.words, vec!["hello", "nice to meet you"]);
//! # Ok::<(), signease::Error>(())
//! ```

/// Service facade wiring all pipelines and the history store
pub mod app;

/// Command line interface definition
pub mod cli;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// `ONNX` face mesh landmark provider
#[cfg(feature = "onnx")]
pub mod face_mesh;

/// Conversion history stores
pub mod history;

/// Landmark types, providers and recorded traces
pub mod landmarks;

/// Temporal lip-pattern classifier
pub mod lip_reading;

/// Placeholder motion-based clip reader
pub mod motion_heuristic;

/// Per-session lip reader registry
pub mod session;

/// Sign recognizer and classifier trait
pub mod sign;

/// `ONNX` YOLO-style sign detector
#[cfg(feature = "onnx")]
pub mod sign_detector;

/// Text to ASL animation lookup
pub mod text_to_asl;

/// Utility functions for image handling and numeric conversions
pub mod utils;

pub use error::{Error, Result};
