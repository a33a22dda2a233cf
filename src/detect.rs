//! Text-region detection adapter.
//! The recognition capability itself is opaque (`TextDetector`); the adapter
//! adds what the pipeline actually needs: rotation-normalized dimensions next
//! to the raw regions, and uniform error reporting.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::capture::ImageData;
use crate::geometry::{normalized_dimensions, RectF, Rotation};

/// One detected text region: bounding box in detector image space plus the
/// recognized string.
#[derive(Debug, Clone)]
pub struct TextRegion {
    pub bounds: RectF,
    pub text: String,
}

/// Opaque text-detection capability.
/// `close` releases the underlying recognizer resource; the pipeline calls it
/// exactly once at teardown.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn process(&self, image: &ImageData) -> Result<Vec<TextRegion>, DetectError>;
    fn close(&self);
}

#[derive(Debug)]
pub enum DetectError {
    /// The capability rejected the image (malformed, unsupported format).
    BadImage(String),
    /// The capability failed internally.
    Engine(String),
}

impl std::fmt::Display for DetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectError::BadImage(msg) => write!(f, "bad image: {msg}"),
            DetectError::Engine(msg) => write!(f, "detection engine error: {msg}"),
        }
    }
}

/// Detection result for one frame or static image.
#[derive(Debug, Clone)]
pub struct Detection {
    pub regions: Vec<TextRegion>,
    /// Rotation-corrected source dimensions; the overlay scales against these.
    pub width: u32,
    pub height: u32,
}

/// Adapter over the detection capability: runs one detection pass and
/// computes the rotation-normalized dimensions the regions are expressed in.
pub struct RegionDetector {
    inner: Arc<dyn TextDetector>,
}

impl RegionDetector {
    pub fn new(inner: Arc<dyn TextDetector>) -> Self {
        Self { inner }
    }

    /// Detect text regions in `image` captured at `rotation`.
    /// Errors are recoverable at the caller: a failed pass means "zero
    /// regions, no overlay change", never a pipeline abort.
    pub async fn detect(
        &self,
        image: &ImageData,
        rotation: Rotation,
    ) -> Result<Detection, DetectError> {
        let regions = self.inner.process(image).await?;
        let (width, height) = normalized_dimensions(image.width, image.height, rotation);
        debug!(
            regions = regions.len(),
            width,
            height,
            %rotation,
            "detection pass complete"
        );
        Ok(Detection {
            regions,
            width,
            height,
        })
    }

    /// Release the underlying recognizer. Called once at pipeline teardown.
    pub fn close(&self) {
        self.inner.close();
    }
}

/// Detector stub: always reports zero regions. Used by the demo binary and
/// as a placeholder where no recognition capability is wired.
pub struct StubDetector;

#[async_trait]
impl TextDetector for StubDetector {
    async fn process(&self, _image: &ImageData) -> Result<Vec<TextRegion>, DetectError> {
        Ok(Vec::new())
    }

    fn close(&self) {}
}
