//! One lip reader per video session.
//!
//! Readers are created on first use and live until removed. Each sits behind
//! its own mutex, so frames of one session never block or disturb another.
//! The landmark model and the template table are loaded once and shared by
//! every reader.

use crate::{
    config::LipReadingConfig,
    landmarks::{FaceLandmarks, LandmarkProvider},
    lip_reading::{templates::WordTemplate, LipReader},
    Result,
};
use image::RgbImage;
use log::{error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Builds the reader for a new session id
pub type ReaderFactory = Box<dyn Fn(&str) -> LipReader + Send + Sync>;

/// Shared handle to one session's reader
pub type SessionHandle = Arc<Mutex<LipReader>>;

/// Lock a session, recovering the reader if a previous holder panicked
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, LipReader> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One landmark provider used by the readers of many sessions
///
/// Extraction is serialized; each reader still keeps its own window.
#[derive(Clone)]
pub struct SharedLandmarks {
    name: String,
    inner: Arc<Mutex<Box<dyn LandmarkProvider>>>,
}

impl SharedLandmarks {
    #[must_use]
    pub fn new(provider: Box<dyn LandmarkProvider>) -> Self {
        Self {
            name: provider.name().to_string(),
            inner: Arc::new(Mutex::new(provider)),
        }
    }
}

impl LandmarkProvider for SharedLandmarks {
    fn extract(&mut self, frame: &RgbImage) -> Result<Option<FaceLandmarks>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).extract(frame)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a reader factory around a single provider initialization
///
/// `init` runs here, exactly once. A failure is logged once and every session
/// then gets an unavailable reader carrying the reason.
pub fn shared_reader_factory<F>(init: F, config: &LipReadingConfig) -> ReaderFactory
where
    F: FnOnce() -> Result<Box<dyn LandmarkProvider>>,
{
    let config = config.clone();
    match init() {
        Ok(provider) => {
            info!("Sharing landmark provider {} across sessions", provider.name());
            let provider = SharedLandmarks::new(provider);
            let templates: Arc<[WordTemplate]> = config.templates.clone().into();
            Box::new(move |_: &str| {
                LipReader::with_templates(Box::new(provider.clone()), &config, Arc::clone(&templates))
            })
        }
        Err(e) => {
            error!("Lip reading unavailable: {e}");
            let reason = e.to_string();
            Box::new(move |_: &str| LipReader::unavailable(reason.clone(), &config))
        }
    }
}

/// Session id to reader map
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    factory: ReaderFactory,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(factory: ReaderFactory) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reader for `id`, created with the factory if missing
    pub fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut sessions = self.sessions();
        if let Some(handle) = sessions.get(id) {
            return Arc::clone(handle);
        }
        info!("Creating lip reading session '{id}'");
        let handle = Arc::new(Mutex::new((self.factory)(id)));
        sessions.insert(id.to_string(), Arc::clone(&handle));
        handle
    }

    /// Reader for `id` if the session exists
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions().get(id).cloned()
    }

    /// Drop a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions().remove(id).is_some();
        if removed {
            info!("Closed lip reading session '{id}'");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Sorted session ids
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::ScriptedLandmarks;
    use crate::Error;
    use std::cell::Cell;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Box::new(|_: &str| LipReader::new(Box::new(ScriptedLandmarks::default()))))
    }

    #[test]
    fn test_get_or_create_reuses_reader() {
        let registry = registry();
        let a = registry.get_or_create("a");
        let again = registry.get_or_create("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.len(), 1);

        let b = registry.get_or_create("b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.session_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let registry = registry();
        assert!(registry.get("a").is_none());
        registry.get_or_create("a");
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_poisoned_session_is_recovered() {
        let registry = registry();
        let handle = registry.get_or_create("a");
        let poisoner = Arc::clone(&handle);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(handle.is_poisoned());
        assert_eq!(lock_session(&handle).sequence_length(), 0);
    }

    #[test]
    fn test_failed_provider_is_initialized_once() {
        let attempts = Cell::new(0);
        let factory = shared_reader_factory(
            || {
                attempts.set(attempts.get() + 1);
                Err(Error::Unavailable("face mesh model missing".into()))
            },
            &LipReadingConfig::default(),
        );
        let registry = SessionRegistry::new(factory);

        for id in ["a", "b", "c"] {
            let handle = registry.get_or_create(id);
            let reader = lock_session(&handle);
            assert!(!reader.is_available());
            assert_eq!(reader.unavailable_reason(), Some("Unavailable: face mesh model missing"));
        }
        assert_eq!(registry.len(), 3);
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_sessions_share_provider_and_templates() {
        let attempts = Cell::new(0);
        let factory = shared_reader_factory(
            || {
                attempts.set(attempts.get() + 1);
                Ok(Box::new(ScriptedLandmarks::default()) as Box<dyn LandmarkProvider>)
            },
            &LipReadingConfig::default(),
        );
        let registry = SessionRegistry::new(factory);
        let a = registry.get_or_create("a");
        let b = registry.get_or_create("b");
        assert_eq!(attempts.get(), 1);

        let (a, b) = (lock_session(&a), lock_session(&b));
        assert!(a.is_available() && b.is_available());
        assert!(std::ptr::eq(a.templates(), b.templates()));
        assert_eq!(a.templates().len(), LipReadingConfig::default().templates.len());
    }
}
