//! Hybrid translation resolver: on-device first, remote fallback, and on
//! total failure the original text. The resolver never surfaces an error to
//! its caller; a live overlay always gets *something* displayable.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::history::{now_unix, HistoryRecord, HistorySink, SessionContext, TranslationOrigin};
use crate::metrics::{metric_names, MetricsRegistry};

use super::cache::TranslationCache;
use super::engines::EngineCache;
use super::remote::RemoteTranslator;
use super::LanguagePair;

pub struct HybridResolver {
    engines: Arc<EngineCache>,
    remote: Arc<dyn RemoteTranslator>,
    cache: TranslationCache,
    history: Option<Arc<dyn HistorySink>>,
    metrics: Arc<MetricsRegistry>,
}

impl HybridResolver {
    pub fn new(
        engines: Arc<EngineCache>,
        remote: Arc<dyn RemoteTranslator>,
        cache: TranslationCache,
        history: Option<Arc<dyn HistorySink>>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            engines,
            remote,
            cache,
            history,
            metrics,
        }
    }

    /// Resolve display text for one detected region.
    ///
    /// Identity pairs short-circuit, locally supported pairs try the cached
    /// on-device engine (falling back to remote on model-download or engine
    /// failure), everything else goes remote directly. Remote failure
    /// degrades to the original text.
    pub async fn resolve(
        &self,
        text: &str,
        pair: &LanguagePair,
        session: &SessionContext,
    ) -> String {
        if text.trim().is_empty() || pair.is_identity() {
            return text.to_string();
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        let key = TranslationCache::compute_key(pair, text);
        if let Some(hit) = self.cache.get(&key) {
            debug!(request_id, pair = %pair, "translation cache hit");
            self.record(&request_id, text, &hit, pair, TranslationOrigin::Cache, session);
            return hit;
        }

        let (translated, origin) = if pair.has_local_support() {
            match self.try_local(text, pair).await {
                Some(local) => (local, TranslationOrigin::Local),
                None => match self.try_remote(text, pair).await {
                    Some(remote) => (remote, TranslationOrigin::Remote),
                    None => {
                        self.metrics.record(
                            metric_names::RESOLVE_DONE,
                            start.elapsed().as_micros() as f64,
                        );
                        return text.to_string();
                    }
                },
            }
        } else {
            match self.try_remote(text, pair).await {
                Some(remote) => (remote, TranslationOrigin::Remote),
                None => {
                    self.metrics.record(
                        metric_names::RESOLVE_DONE,
                        start.elapsed().as_micros() as f64,
                    );
                    return text.to_string();
                }
            }
        };

        self.cache.insert(key, translated.clone());
        self.record(&request_id, text, &translated, pair, origin, session);
        self.metrics
            .record(metric_names::RESOLVE_DONE, start.elapsed().as_micros() as f64);
        translated
    }

    /// On-device path. None means "fall back to remote for this call";
    /// the engine stays cached either way — failures are treated as
    /// transient, not as a broken handle.
    async fn try_local(&self, text: &str, pair: &LanguagePair) -> Option<String> {
        let engine = match self.engines.get(pair) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(pair = %pair, error = %e, "engine cache unavailable");
                return None;
            }
        };

        if let Err(e) = engine.ensure_model().await {
            debug!(pair = %pair, error = %e, "model unavailable, falling back to remote");
            return None;
        }

        let start = Instant::now();
        match engine.translate(text).await {
            Ok(translated) => {
                self.metrics.record(
                    metric_names::LOCAL_TRANSLATE,
                    start.elapsed().as_micros() as f64,
                );
                Some(translated)
            }
            Err(e) => {
                debug!(pair = %pair, error = %e, "local engine failed, falling back to remote");
                None
            }
        }
    }

    /// Remote path. None means total failure: the caller degrades to the
    /// original text.
    async fn try_remote(&self, text: &str, pair: &LanguagePair) -> Option<String> {
        let start = Instant::now();
        match self.remote.translate(text, pair).await {
            Ok(translated) => {
                self.metrics.record(
                    metric_names::REMOTE_TRANSLATE,
                    start.elapsed().as_micros() as f64,
                );
                Some(translated)
            }
            Err(e) => {
                info!(pair = %pair, error = %e, "remote translation failed, keeping original text");
                None
            }
        }
    }

    fn record(
        &self,
        request_id: &str,
        source: &str,
        translated: &str,
        pair: &LanguagePair,
        origin: TranslationOrigin,
        session: &SessionContext,
    ) {
        if !session.should_persist() {
            return;
        }
        let Some(sink) = self.history.as_ref() else {
            return;
        };
        let Some(user_id) = session.user_id() else {
            return;
        };
        sink.record(HistoryRecord {
            request_id: request_id.to_string(),
            user_id: user_id.to_string(),
            source_text: source.to_string(),
            translated_text: translated.to_string(),
            pair: pair.clone(),
            origin,
            created_at: now_unix(),
        });
    }
}
