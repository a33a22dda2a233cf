//! Pipeline controller: frame admission → detection → per-region translation
//! → overlay publication, with Live/Static mode switching and pass-scoped
//! cancellation so stale results never reach the overlay.

pub mod pass;
pub mod throttle;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::{CaptureControl, Frame, ImageData};
use crate::config::PipelineConfig;
use crate::detect::{RegionDetector, TextDetector};
use crate::geometry::Rotation;
use crate::history::{HistorySink, SessionContext};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::overlay::{OverlayItem, OverlayModel};
use crate::translate::cache::TranslationCache;
use crate::translate::engines::{EngineCache, EngineProvider};
use crate::translate::remote::RemoteTranslator;
use crate::translate::resolver::HybridResolver;
use crate::translate::LanguagePair;

use pass::{PassGuard, PassTracker};
use throttle::ThrottleGate;

/// Whether the pipeline is consuming the camera stream or frozen on a
/// single image (captured still or imported picture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    Live,
    Static,
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineMode::Live => write!(f, "Live"),
            PipelineMode::Static => write!(f, "Static"),
        }
    }
}

impl PipelineMode {
    /// Returns whether transitioning from `self` to `next` is valid.
    /// The two modes simply alternate; re-entering the current mode is
    /// rejected so double freeze/unfreeze requests surface as errors.
    pub fn can_transition_to(self, next: PipelineMode) -> bool {
        matches!(
            (self, next),
            (PipelineMode::Live, PipelineMode::Static)
                | (PipelineMode::Static, PipelineMode::Live)
        )
    }
}

#[derive(Debug)]
pub enum PipelineError {
    InvalidTransition {
        from: PipelineMode,
        to: PipelineMode,
    },
    TornDown,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidTransition { from, to } => {
                write!(f, "invalid mode transition {from} -> {to}")
            }
            PipelineError::TornDown => write!(f, "pipeline is torn down"),
        }
    }
}

/// External collaborators the controller is wired to at startup.
pub struct PipelineDeps {
    pub detector: Arc<dyn TextDetector>,
    pub engines: Box<dyn EngineProvider>,
    pub remote: Arc<dyn RemoteTranslator>,
    pub capture: Arc<dyn CaptureControl>,
    pub history: Option<Arc<dyn HistorySink>>,
}

pub struct PipelineController {
    mode: RwLock<PipelineMode>,
    mode_tx: watch::Sender<PipelineMode>,
    mode_rx: watch::Receiver<PipelineMode>,
    throttle: ThrottleGate,
    detector: RegionDetector,
    resolver: Arc<HybridResolver>,
    engines: Arc<EngineCache>,
    overlay: Arc<OverlayModel>,
    passes: PassTracker,
    frames_tx: mpsc::Sender<(Frame, Instant)>,
    languages: RwLock<LanguagePair>,
    session: RwLock<SessionContext>,
    capture: Arc<dyn CaptureControl>,
    metrics: Arc<MetricsRegistry>,
    torn_down: AtomicBool,
    worker_stop: CancellationToken,
}

impl PipelineController {
    /// Build the controller and start its analysis worker. Must be called
    /// from within a tokio runtime.
    pub fn spawn(config: &PipelineConfig, deps: PipelineDeps) -> Arc<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let engines = Arc::new(EngineCache::new(deps.engines));
        let resolver = Arc::new(HybridResolver::new(
            Arc::clone(&engines),
            deps.remote,
            TranslationCache::new(config.cache.capacity, config.cache_ttl()),
            deps.history,
            Arc::clone(&metrics),
        ));

        // Capacity 1: at most one frame analyzed, one waiting. Anything
        // beyond that is dropped at admission and released immediately.
        let (frames_tx, frames_rx) = mpsc::channel(1);
        let (mode_tx, mode_rx) = watch::channel(PipelineMode::Live);

        let controller = Arc::new(Self {
            mode: RwLock::new(PipelineMode::Live),
            mode_tx,
            mode_rx,
            throttle: ThrottleGate::new(config.min_frame_interval()),
            detector: RegionDetector::new(deps.detector),
            resolver,
            engines,
            overlay: Arc::new(OverlayModel::new()),
            passes: PassTracker::new(),
            frames_tx,
            languages: RwLock::new(LanguagePair::new(
                config.languages.source.clone(),
                config.languages.target.clone(),
            )),
            session: RwLock::new(SessionContext::guest()),
            capture: deps.capture,
            metrics,
            torn_down: AtomicBool::new(false),
            worker_stop: CancellationToken::new(),
        });

        tokio::spawn(Arc::clone(&controller).run_worker(frames_rx));
        info!(
            min_interval_ms = config.analysis.min_frame_interval_ms,
            languages = %controller.languages.read(),
            "pipeline started"
        );
        controller
    }

    /// Synchronous camera-frame entry point. Frames arriving too fast, in
    /// the wrong mode, or while the worker is busy are dropped here; the
    /// `Frame` release hook fires on drop either way.
    pub fn on_frame(&self, frame: Frame) {
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        if *self.mode.read() != PipelineMode::Live {
            return;
        }
        if !self.throttle.should_admit(Instant::now()) {
            return;
        }
        if self.frames_tx.try_send((frame, Instant::now())).is_err() {
            debug!("analysis busy, admitted frame dropped");
        }
    }

    /// Freeze on a just-captured still and analyze it once.
    pub async fn capture_still(&self, image: ImageData) -> Result<(), PipelineError> {
        self.freeze_on(image, "capture").await
    }

    /// Freeze on an imported picture and analyze it once.
    pub async fn import_image(&self, image: ImageData) -> Result<(), PipelineError> {
        self.freeze_on(image, "import").await
    }

    async fn freeze_on(&self, image: ImageData, origin: &str) -> Result<(), PipelineError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(PipelineError::TornDown);
        }
        self.transition(PipelineMode::Static)?;
        self.capture.suspend();
        info!(
            origin,
            width = image.width,
            height = image.height,
            "frozen for static analysis"
        );
        self.run_static_pass(image).await;
        Ok(())
    }

    /// Leave Static mode: abandon any in-flight static work, wipe the
    /// overlay, and hand the camera stream back to the live path.
    pub fn reset_to_live(&self) -> Result<(), PipelineError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(PipelineError::TornDown);
        }
        self.transition(PipelineMode::Live)?;
        self.passes.cancel_all();
        self.overlay.clear();
        self.capture.resume();
        info!("resumed live analysis");
        Ok(())
    }

    fn transition(&self, next: PipelineMode) -> Result<(), PipelineError> {
        let mut mode = self.mode.write();
        if !mode.can_transition_to(next) {
            warn!(from = %*mode, to = %next, "rejected mode transition");
            return Err(PipelineError::InvalidTransition { from: *mode, to: next });
        }
        info!(from = %*mode, to = %next, "mode transition");
        *mode = next;
        let _ = self.mode_tx.send(next);
        Ok(())
    }

    pub fn mode(&self) -> PipelineMode {
        *self.mode.read()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<PipelineMode> {
        self.mode_rx.clone()
    }

    /// Change the translation direction. Takes effect on the next pass;
    /// in-flight resolutions keep the pair they started with.
    pub fn set_languages(&self, pair: LanguagePair) {
        info!(languages = %pair, "translation direction changed");
        *self.languages.write() = pair;
    }

    pub fn languages(&self) -> LanguagePair {
        self.languages.read().clone()
    }

    pub fn set_session(&self, session: SessionContext) {
        *self.session.write() = session;
    }

    pub fn overlay(&self) -> Arc<OverlayModel> {
        Arc::clone(&self.overlay)
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// Tear the pipeline down. Idempotent; after the first call every
    /// entry point is inert and all in-flight passes are cancelled.
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.worker_stop.cancel();
        self.passes.cancel_all();
        self.capture.suspend();
        self.detector.close();
        self.engines.close_all();
        info!("pipeline torn down");
    }

    async fn run_worker(self: Arc<Self>, mut frames_rx: mpsc::Receiver<(Frame, Instant)>) {
        debug!("analysis worker started");
        loop {
            let (frame, admitted_at) = tokio::select! {
                _ = self.worker_stop.cancelled() => break,
                next = frames_rx.recv() => match next {
                    Some(item) => item,
                    None => break,
                },
            };
            // Admission happened before the frame was queued; a freeze or
            // teardown may have landed since. Analyzing the stale frame now
            // would overwrite the frozen overlay with live regions. The pass
            // id is issued under the mode lock so a freeze racing this check
            // always ends up with the newer pass, never the older one.
            let guard = {
                let mode = self.mode.read();
                if self.torn_down.load(Ordering::SeqCst) || *mode != PipelineMode::Live {
                    drop(frame);
                    continue;
                }
                self.passes.begin_pass()
            };
            self.metrics.record(
                metric_names::FRAME_QUEUE_WAIT,
                admitted_at.elapsed().as_micros() as f64,
            );
            self.run_live_pass(frame, guard).await;
        }
        debug!("analysis worker exiting");
    }

    async fn run_live_pass(&self, frame: Frame, guard: PassGuard) {
        let pass_span = self.metrics.span(metric_names::PASS_TOTAL);
        let rotation = frame.rotation();

        let detect_span = self.metrics.span(metric_names::DETECT_DONE);
        let detection = self.detector.detect(frame.image(), rotation).await;
        detect_span.finish();
        // The camera buffer is released here, before translation fan-out:
        // holding it longer would starve the capture source.
        drop(frame);

        if self.torn_down.load(Ordering::SeqCst) || !guard.should_continue() {
            return;
        }
        let detection = match detection {
            Ok(detection) => detection,
            Err(e) => {
                warn!(pass = guard.pass(), error = %e, "detection failed, pass skipped");
                return;
            }
        };

        if !self
            .overlay
            .begin_pass(guard.pass(), detection.width, detection.height)
        {
            return;
        }
        let pair = self.languages.read().clone();
        let session = self.session.read().clone();
        for region in detection.regions {
            let resolver = Arc::clone(&self.resolver);
            let overlay = Arc::clone(&self.overlay);
            let guard = guard.clone();
            let pair = pair.clone();
            let session = session.clone();
            // Each region resolves independently and lands on the overlay
            // as soon as it finishes; a newer pass cancels stragglers.
            tokio::spawn(async move {
                resolve_region(region.text, region.bounds, resolver, overlay, guard, pair, session)
                    .await;
            });
        }
        pass_span.finish();
    }

    async fn run_static_pass(&self, image: ImageData) {
        let guard = self.passes.begin_pass();

        let detect_span = self.metrics.span(metric_names::DETECT_DONE);
        let detection = self.detector.detect(&image, Rotation::Deg0).await;
        detect_span.finish();

        if !guard.should_continue() {
            return;
        }
        let detection = match detection {
            Ok(detection) => detection,
            Err(e) => {
                warn!(pass = guard.pass(), error = %e, "static detection failed");
                return;
            }
        };
        info!(
            pass = guard.pass(),
            regions = detection.regions.len(),
            "static analysis complete"
        );

        if !self
            .overlay
            .begin_pass(guard.pass(), detection.width, detection.height)
        {
            return;
        }
        let pair = self.languages.read().clone();
        let session = self.session.read().clone();
        let resolutions = detection.regions.into_iter().map(|region| {
            let resolver = Arc::clone(&self.resolver);
            let overlay = Arc::clone(&self.overlay);
            let guard = guard.clone();
            let pair = pair.clone();
            let session = session.clone();
            resolve_region(region.text, region.bounds, resolver, overlay, guard, pair, session)
        });
        tokio::select! {
            _ = futures_util::future::join_all(resolutions) => {}
            _ = guard.token().cancelled() => {
                debug!(pass = guard.pass(), "static pass abandoned");
            }
        }
    }
}

async fn resolve_region(
    text: String,
    bounds: crate::geometry::RectF,
    resolver: Arc<HybridResolver>,
    overlay: Arc<OverlayModel>,
    guard: PassGuard,
    pair: LanguagePair,
    session: SessionContext,
) {
    if !guard.should_continue() {
        return;
    }
    let display_text = tokio::select! {
        resolved = resolver.resolve(&text, &pair, &session) => resolved,
        _ = guard.token().cancelled() => return,
    };
    if !guard.should_continue() {
        return;
    }
    overlay.push(
        guard.pass(),
        OverlayItem {
            bounds,
            display_text,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_alternates() {
        assert!(PipelineMode::Live.can_transition_to(PipelineMode::Static));
        assert!(PipelineMode::Static.can_transition_to(PipelineMode::Live));
    }

    #[test]
    fn re_entering_current_mode_is_invalid() {
        assert!(!PipelineMode::Live.can_transition_to(PipelineMode::Live));
        assert!(!PipelineMode::Static.can_transition_to(PipelineMode::Static));
    }

    #[test]
    fn error_display() {
        let e = PipelineError::InvalidTransition {
            from: PipelineMode::Live,
            to: PipelineMode::Live,
        };
        assert_eq!(e.to_string(), "invalid mode transition Live -> Live");
        assert_eq!(PipelineError::TornDown.to_string(), "pipeline is torn down");
    }
}
