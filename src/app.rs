//! Transport-agnostic service facade.
//!
//! [`SignEaseApp`] owns every pipeline and the history store and answers
//! request-shaped calls with serializable responses. An HTTP or IPC layer
//! only needs to decode requests and encode the returned values.

use crate::{
    config::Config,
    history::{HistoryRecord, HistoryStatistics, HistoryStore, MemoryHistory, RedbHistory, NewRecord},
    lip_reading::{FrameOutcome, LipStats},
    motion_heuristic::{MotionHeuristicReader, MotionPrediction, MotionReaderInfo},
    session::{lock_session, shared_reader_factory, ReaderFactory, SessionRegistry},
    sign::{SignClassifier, SignOutcome, SignRecognizer, SignStats, SignStatus},
    text_to_asl::{self, Translation},
    utils::image_conversion::decode_data_url,
    Result,
};
use image::RgbImage;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

/// Response to one lip reading frame
#[derive(Debug, Clone, Serialize)]
pub struct LipResponse {
    #[serde(flatten)]
    pub outcome: FrameOutcome,
    pub current_text: String,
    pub stats: LipStats,
    pub detectable_words: Vec<String>,
    pub sequence_length: usize,
    pub min_required: usize,
}

/// Snapshot of one lip reading session
#[derive(Debug, Clone, Serialize)]
pub struct LipSessionStats {
    pub stats: LipStats,
    pub current_text: String,
    pub detectable_words: Vec<String>,
    pub sequence_length: usize,
    pub cooldown_seconds: f64,
    pub available: bool,
}

/// Main application struct
pub struct SignEaseApp {
    config: Config,
    sessions: SessionRegistry,
    signs: SignRecognizer<Box<dyn SignClassifier>>,
    motion: MotionHeuristicReader,
    history: Box<dyn HistoryStore>,
}

impl SignEaseApp {
    /// Assemble an application from explicit parts
    #[must_use]
    pub fn new(
        config: Config,
        sessions: SessionRegistry,
        classifier: Box<dyn SignClassifier>,
        history: Box<dyn HistoryStore>,
    ) -> Self {
        info!("Initializing SignEase application");
        let signs = SignRecognizer::with_config(classifier, &config.sign);
        let motion = MotionHeuristicReader::new(config.motion.clone());
        Self {
            config,
            sessions,
            signs,
            motion,
            history,
        }
    }

    /// Build every component from configuration
    ///
    /// Model failures disable the affected pipeline instead of failing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the history file
    /// cannot be opened
    pub fn from_config(config: Config) -> Result<Self> {
        let sessions = SessionRegistry::new(reader_factory(&config));
        Self::with_sessions(config, sessions)
    }

    /// Build from configuration with caller-supplied lip reading sessions
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the history file
    /// cannot be opened
    pub fn with_sessions(config: Config, sessions: SessionRegistry) -> Result<Self> {
        config.validate()?;

        let history: Box<dyn HistoryStore> = match &config.history.path {
            Some(path) => Box::new(RedbHistory::open(path)?),
            None => Box::new(MemoryHistory::new()),
        };

        let classifier = sign_classifier(&config);
        Ok(Self::new(config, sessions, classifier, history))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Run one frame through a session's lip reader
    pub fn predict_lip(&mut self, session_id: &str, frame: &RgbImage) -> LipResponse {
        self.predict_lip_at(session_id, frame, Instant::now())
    }

    /// Run one frame through a session's lip reader as if observed at `now`
    pub fn predict_lip_at(&mut self, session_id: &str, frame: &RgbImage, now: Instant) -> LipResponse {
        let handle = self.sessions.get_or_create(session_id);
        let response = {
            let mut reader = lock_session(&handle);
            let outcome = reader.ingest_frame_at(frame, now);
            let response = LipResponse {
                current_text: reader.current_text().to_string(),
                stats: reader.stats(),
                detectable_words: reader.detectable_words().into_iter().map(String::from).collect(),
                sequence_length: reader.sequence_length(),
                min_required: reader.min_sequence_length(),
                outcome,
            };
            response
        };

        if response.outcome.emitted {
            if let Some(word) = &response.outcome.matched_word {
                self.record(NewRecord::lip_reading(word, response.outcome.confidence));
            }
        }
        response
    }

    /// Decode a `data:` URL frame and run it through a session's lip reader
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded into an image
    pub fn predict_lip_data_url(&mut self, session_id: &str, data: &str) -> Result<LipResponse> {
        let frame = decode_data_url(data)?;
        Ok(self.predict_lip(session_id, &frame))
    }

    /// Current state of a session, `None` if it was never used
    #[must_use]
    pub fn lip_stats(&self, session_id: &str) -> Option<LipSessionStats> {
        let handle = self.sessions.get(session_id)?;
        let reader = lock_session(&handle);
        let stats = LipSessionStats {
            stats: reader.stats(),
            current_text: reader.current_text().to_string(),
            detectable_words: reader.detectable_words().into_iter().map(String::from).collect(),
            sequence_length: reader.sequence_length(),
            cooldown_seconds: reader.cooldown().as_secs_f64(),
            available: reader.is_available(),
        };
        Some(stats)
    }

    /// Clear a session's transcript, returning whether the session exists
    pub fn clear_lip_text(&mut self, session_id: &str) -> bool {
        match self.sessions.get(session_id) {
            Some(handle) => {
                lock_session(&handle).clear_text();
                true
            }
            None => false,
        }
    }

    /// Forget a session and its reader
    pub fn close_session(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id)
    }

    /// Run one frame through the sign recognizer
    pub fn predict_sign(&mut self, frame: &RgbImage) -> SignOutcome {
        self.predict_sign_at(frame, Instant::now())
    }

    /// Run one frame through the sign recognizer as if observed at `now`
    pub fn predict_sign_at(&mut self, frame: &RgbImage, now: Instant) -> SignOutcome {
        let outcome = self.signs.process_image_at(frame, now);
        if outcome.status == SignStatus::Success {
            self.record(NewRecord::sign(&outcome.prediction, f64::from(outcome.confidence)));
        }
        outcome
    }

    /// Decode a `data:` URL frame and run it through the sign recognizer
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded into an image
    pub fn predict_sign_data_url(&mut self, data: &str) -> Result<SignOutcome> {
        let frame = decode_data_url(data)?;
        Ok(self.predict_sign(&frame))
    }

    pub fn clear_sign_text(&mut self) {
        self.signs.clear_text();
    }

    /// Add a word break to the sign transcript and return it
    pub fn add_space(&mut self) -> &str {
        self.signs.add_space();
        self.signs.current_text()
    }

    /// Remove the last sign character and return the transcript
    pub fn backspace(&mut self) -> &str {
        self.signs.backspace();
        self.signs.current_text()
    }

    pub fn set_sign_threshold(&mut self, threshold: f32) {
        self.signs.set_confidence_threshold(threshold);
    }

    #[must_use]
    pub fn sign_stats(&self) -> SignStats {
        self.signs.stats()
    }

    /// Guess a word from a whole clip with the placeholder reader
    ///
    /// # Errors
    ///
    /// Returns an error if the clip is too short
    pub fn predict_motion(&mut self, frames: &[RgbImage]) -> Result<MotionPrediction> {
        self.motion.predict(frames)
    }

    #[must_use]
    pub fn motion_info(&self) -> MotionReaderInfo {
        self.motion.info()
    }

    /// Convert text to ASL words and animations
    ///
    /// # Errors
    ///
    /// Returns an error if the text has no words
    pub fn translate(&self, text: &str) -> Result<Translation> {
        text_to_asl::translate(text)
    }

    /// Newest history records, using the configured limit when `limit` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the history store cannot be read
    pub fn history(&self, limit: Option<usize>, kind: Option<&str>) -> Result<Vec<HistoryRecord>> {
        self.history
            .list(limit.unwrap_or(self.config.history.default_limit), kind)
    }

    /// # Errors
    ///
    /// Returns an error if the history store cannot be read
    pub fn statistics(&self) -> Result<HistoryStatistics> {
        self.history.statistics()
    }

    /// Store a record supplied by the caller
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored
    pub fn save_history(&mut self, record: NewRecord) -> Result<u64> {
        self.history.append(record)
    }

    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted
    pub fn delete_history(&mut self, id: u64) -> Result<bool> {
        self.history.delete(id)
    }

    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted
    pub fn clear_history(&mut self, kind: Option<&str>) -> Result<usize> {
        self.history.clear(kind)
    }

    /// Append a record produced by a pipeline; failures never reach the caller
    fn record(&mut self, record: NewRecord) {
        let kind = record.kind.clone();
        if let Err(e) = self.history.append(record) {
            warn!("Failed to auto-save {kind} history: {e}");
        }
    }
}

#[cfg(feature = "onnx")]
fn reader_factory(config: &Config) -> ReaderFactory {
    use crate::{face_mesh::FaceMeshProvider, landmarks::LandmarkProvider};

    shared_reader_factory(
        || {
            FaceMeshProvider::new(&config.models.face_mesh, &config.face_mesh)
                .map(|provider| Box::new(provider) as Box<dyn LandmarkProvider>)
        },
        &config.lip_reading,
    )
}

#[cfg(not(feature = "onnx"))]
fn reader_factory(config: &Config) -> ReaderFactory {
    shared_reader_factory(
        || Err(crate::Error::Unavailable("built without the `onnx` feature".into())),
        &config.lip_reading,
    )
}

#[cfg(feature = "onnx")]
fn sign_classifier(config: &Config) -> Box<dyn SignClassifier> {
    use crate::{sign::UnavailableSigns, sign_detector::SignDetector};

    match SignDetector::new(
        &config.models.sign_detector,
        config.models.sign_labels.clone(),
        config.sign.confidence_threshold,
    ) {
        Ok(detector) => Box::new(detector),
        Err(e) => Box::new(UnavailableSigns::new(e.to_string())),
    }
}

#[cfg(not(feature = "onnx"))]
fn sign_classifier(_config: &Config) -> Box<dyn SignClassifier> {
    Box::new(crate::sign::UnavailableSigns::new("built without the `onnx` feature"))
}
