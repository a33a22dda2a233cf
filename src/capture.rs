//! Frame intake from the capture source.
//! A `Frame` is owned by exactly one in-flight analysis; its underlying
//! buffer release hook runs exactly once, on every path, because it is tied
//! to `Drop`. The capture device itself stays behind `CaptureControl` so the
//! pipeline can suspend it in static mode and on teardown.

use tracing::debug;

use crate::geometry::Rotation;

/// Raw image payload handed to the detector. Pixel layout is opaque to the
/// pipeline; only the dimensions matter for coordinate normalization.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes,
        }
    }
}

/// One camera sample: image + rotation + a release hook for the device
/// buffer. The hook fires when the frame is dropped, which covers the
/// throttled-skip, detection-failure and success paths uniformly.
pub struct Frame {
    image: ImageData,
    rotation: Rotation,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Frame {
    pub fn new(image: ImageData, rotation: Rotation) -> Self {
        Self {
            image,
            rotation,
            release: None,
        }
    }

    /// Attach the buffer release hook. Capture sources that recycle buffers
    /// (the common case) must hand each frame exactly one of these.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(hook));
        self
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .field("rotation", &self.rotation)
            .finish()
    }
}

/// Capture lifecycle adapter. The device delivers frames by calling
/// `PipelineController::on_frame` from its own thread; the pipeline only
/// drives suspend/resume around mode transitions and teardown.
pub trait CaptureControl: Send + Sync {
    /// Stop delivering frames (static mode, teardown).
    fn suspend(&self);
    /// Resume the live feed after a reset.
    fn resume(&self);
}

/// Capture stub for tests and the demo binary: no device, no frames.
pub struct NoopCapture;

impl CaptureControl for NoopCapture {
    fn suspend(&self) {
        debug!("capture suspend (noop)");
    }

    fn resume(&self) {
        debug!("capture resume (noop)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn test_image() -> ImageData {
        ImageData::new(640, 480, vec![0u8; 16])
    }

    #[test]
    fn release_hook_fires_exactly_once_on_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&releases);
        let frame = Frame::new(test_image(), Rotation::Deg0)
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(releases.load(Ordering::SeqCst), 0);
        drop(frame);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn frame_without_hook_drops_cleanly() {
        let frame = Frame::new(test_image(), Rotation::Deg90);
        assert_eq!(frame.rotation(), Rotation::Deg90);
        assert_eq!(frame.image().width, 640);
        drop(frame);
    }
}
