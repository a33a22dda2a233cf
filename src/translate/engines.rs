//! On-device translation engine cache.
//! Engine handles are expensive; the cache memoizes one per language pair
//! and releases every handle exactly once at pipeline teardown. Creating a
//! handle is cheap, downloading its model (`ensure_model`) is the expensive
//! async part, so creation can stay inside the map lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::LanguagePair;

/// One on-device translation engine, bound to a single language pair.
/// Only the cache owns handles; callers borrow them per call.
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// Make sure the translation model is present, downloading if needed.
    async fn ensure_model(&self) -> Result<(), EngineError>;
    /// Translate `text` along this engine's pair. Requires a ready model.
    async fn translate(&self, text: &str) -> Result<String, EngineError>;
    /// Release the engine resource. Called exactly once, by `close_all`.
    fn close(&self);
}

/// Constructs engine handles. The opaque on-device capability behind the
/// cache; injected so tests and the demo can substitute their own.
pub trait EngineProvider: Send + Sync {
    fn create(&self, pair: &LanguagePair) -> Arc<dyn LocalEngine>;
}

#[derive(Debug)]
pub enum EngineError {
    /// Model absent and the download failed.
    ModelUnavailable(String),
    /// The engine failed after its model was ready.
    Translation(String),
    /// The cache was already torn down.
    Closed,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::ModelUnavailable(msg) => write!(f, "model unavailable: {msg}"),
            EngineError::Translation(msg) => write!(f, "local translation failed: {msg}"),
            EngineError::Closed => write!(f, "engine cache closed"),
        }
    }
}

/// Memoizing, thread-safe engine map keyed by language pair.
/// `None` means `close_all` has run and no further `get` is valid.
pub struct EngineCache {
    provider: Box<dyn EngineProvider>,
    engines: Mutex<Option<HashMap<LanguagePair, Arc<dyn LocalEngine>>>>,
}

impl EngineCache {
    pub fn new(provider: Box<dyn EngineProvider>) -> Self {
        Self {
            provider,
            engines: Mutex::new(Some(HashMap::new())),
        }
    }

    /// Get the engine for `pair`, creating and memoizing it on first use.
    /// Creation happens under the map lock, so concurrent first use still
    /// yields one handle per distinct pair.
    pub fn get(&self, pair: &LanguagePair) -> Result<Arc<dyn LocalEngine>, EngineError> {
        let mut guard = self.engines.lock();
        let map = guard.as_mut().ok_or(EngineError::Closed)?;
        if let Some(engine) = map.get(pair) {
            return Ok(Arc::clone(engine));
        }
        debug!(pair = %pair, "creating translation engine");
        let engine = self.provider.create(pair);
        map.insert(pair.clone(), Arc::clone(&engine));
        Ok(engine)
    }

    /// Number of live engine handles. Zero after `close_all`.
    pub fn len(&self) -> usize {
        self.engines.lock().as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every handle. Idempotent, but the pipeline calls it once at
    /// teardown; any later `get` fails with `EngineError::Closed`.
    pub fn close_all(&self) {
        let taken = self.engines.lock().take();
        match taken {
            Some(map) => {
                info!(engines = map.len(), "closing translation engines");
                for (pair, engine) in map {
                    debug!(pair = %pair, "closing engine");
                    engine.close();
                }
            }
            None => warn!("engine cache close_all called twice"),
        }
    }
}

/// Engine provider stub: engines whose model download always fails, which
/// forces the resolver onto its remote path. Used by the demo binary.
pub struct StubEngineProvider;

struct StubEngine {
    pair: LanguagePair,
}

#[async_trait]
impl LocalEngine for StubEngine {
    async fn ensure_model(&self) -> Result<(), EngineError> {
        Err(EngineError::ModelUnavailable(format!(
            "no on-device model installed for {}",
            self.pair
        )))
    }

    async fn translate(&self, _text: &str) -> Result<String, EngineError> {
        Err(EngineError::Translation("stub engine".into()))
    }

    fn close(&self) {}
}

impl EngineProvider for StubEngineProvider {
    fn create(&self, pair: &LanguagePair) -> Arc<dyn LocalEngine> {
        Arc::new(StubEngine { pair: pair.clone() })
    }
}
