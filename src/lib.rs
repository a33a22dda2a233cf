//! LingoLens: live visual translation pipeline.
//!
//! Camera frames flow through throttled admission, text-region detection,
//! hybrid on-device/remote translation, and a coordinate-aware overlay
//! model. A pass-scoped cancellation scheme keeps stale results off the
//! overlay when frames, mode switches, or teardown race each other.

pub mod capture;
pub mod config;
pub mod detect;
pub mod geometry;
pub mod history;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod translate;

pub use capture::{CaptureControl, Frame, ImageData, NoopCapture};
pub use config::{load_config, ConfigError, PipelineConfig};
pub use detect::{DetectError, Detection, StubDetector, TextDetector, TextRegion};
pub use geometry::{RectF, Rotation};
pub use history::{HistoryRecord, HistorySink, MemoryHistory, SessionContext, TranslationOrigin};
pub use overlay::{OverlayItem, OverlayModel, OverlaySnapshot, RenderSurface, TextMeasurer};
pub use pipeline::{PipelineController, PipelineDeps, PipelineError, PipelineMode};
pub use translate::engines::{EngineProvider, LocalEngine, StubEngineProvider};
pub use translate::remote::{HttpRemoteClient, RemoteTranslator};
pub use translate::LanguagePair;
