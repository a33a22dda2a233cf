//! Overlay model and render planning.
//! The model is the shared boundary between the background analysis context
//! (writer) and the display context (reader): one mutex guards the item list,
//! the source dimensions and the current pass id together, so clear-then-add
//! ordering and stale-pass rejection are atomic. The renderer never sees
//! internal iterators — it takes a snapshot.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::geometry::{scale_factors, RectF};

/// Padding around the translated text's background plate, in view pixels.
const PLATE_MARGIN: f32 = 20.0;
/// Inset of the text origin from the plate's left edge.
const TEXT_INSET_X: f32 = 10.0;
/// Baseline offset below the plate's top edge, added to the text height.
const TEXT_BASELINE_PAD: f32 = 5.0;

/// One drawable item: bounding box in detector image space plus the text to
/// display (translated, or original after degradation).
#[derive(Debug, Clone)]
pub struct OverlayItem {
    pub bounds: RectF,
    pub display_text: String,
}

/// Read-only copy of the overlay state for the display context.
#[derive(Debug, Clone, Default)]
pub struct OverlaySnapshot {
    pub items: Vec<OverlayItem>,
    pub image_width: u32,
    pub image_height: u32,
}

/// Display surface that gets poked whenever the overlay changes.
pub trait RenderSurface: Send + Sync {
    fn invalidate(&self);
}

/// Measures rendered text bounds (width, height) in view pixels. Owned by
/// the display side; the planner only needs the numbers.
pub trait TextMeasurer {
    fn measure(&self, text: &str) -> (f32, f32);
}

#[derive(Default)]
struct OverlayState {
    /// Analysis pass the current items belong to. Monotonic.
    pass: u64,
    image_width: u32,
    image_height: u32,
    items: Vec<OverlayItem>,
}

/// Thread-safe overlay collection with pass-scoped updates.
#[derive(Default)]
pub struct OverlayModel {
    state: Mutex<OverlayState>,
    surface: RwLock<Option<Arc<dyn RenderSurface>>>,
}

impl OverlayModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the display surface to notify on changes.
    pub fn set_surface(&self, surface: Arc<dyn RenderSurface>) {
        *self.surface.write() = Some(surface);
    }

    /// Start populating results for a new analysis pass: clears all items
    /// and records the pass's source-image dimensions. A pass id not newer
    /// than the current one is rejected — a superseded pass can never wipe a
    /// newer pass's items.
    pub fn begin_pass(&self, pass: u64, image_width: u32, image_height: u32) -> bool {
        {
            let mut state = self.state.lock();
            if pass <= state.pass && state.pass != 0 {
                debug!(pass, current = state.pass, "stale begin_pass ignored");
                return false;
            }
            state.pass = pass;
            state.image_width = image_width;
            state.image_height = image_height;
            state.items.clear();
        }
        self.invalidate();
        true
    }

    /// Append one resolved item for `pass`. Returns false (and drops the
    /// item) when `pass` is no longer current — late resolutions from a
    /// superseded frame must not leak into the new overlay.
    pub fn push(&self, pass: u64, item: OverlayItem) -> bool {
        {
            let mut state = self.state.lock();
            if pass != state.pass {
                debug!(pass, current = state.pass, "stale overlay item dropped");
                return false;
            }
            state.items.push(item);
        }
        self.invalidate();
        true
    }

    /// Remove all items and retire their pass (reset to live view). The
    /// retirement makes the wipe final: a straggler resolution still holding
    /// the cleared pass's id can no longer land its item afterwards.
    pub fn clear(&self) {
        {
            let mut state = self.state.lock();
            state.pass += 1;
            state.items.clear();
        }
        self.invalidate();
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        let state = self.state.lock();
        OverlaySnapshot {
            items: state.items.clone(),
            image_width: state.image_width,
            image_height: state.image_height,
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Source-space → view-space scale factors for the current dimensions.
    pub fn compute_scale(&self, view_width: u32, view_height: u32) -> (f32, f32) {
        let state = self.state.lock();
        scale_factors(state.image_width, state.image_height, view_width, view_height)
    }

    fn invalidate(&self) {
        if let Some(surface) = self.surface.read().as_ref() {
            surface.invalidate();
        }
    }
}

/// One planned draw: the scaled bounding box, a background plate below its
/// bottom-left corner sized to the measured text, and the text origin.
#[derive(Debug, Clone)]
pub struct DrawOp {
    pub box_rect: RectF,
    pub plate_rect: RectF,
    pub text_origin: (f32, f32),
    pub text: String,
}

/// Map a snapshot into view-space draw operations.
/// Box corners scale as (l·sx, t·sy, r·sx, b·sy); the text plate anchors at
/// the scaled box's bottom-left with `PLATE_MARGIN` around the measured text.
pub fn plan_draw_ops(
    snapshot: &OverlaySnapshot,
    view_width: u32,
    view_height: u32,
    measurer: &dyn TextMeasurer,
) -> Vec<DrawOp> {
    let (scale_x, scale_y) = scale_factors(
        snapshot.image_width,
        snapshot.image_height,
        view_width,
        view_height,
    );

    snapshot
        .items
        .iter()
        .map(|item| {
            let box_rect = item.bounds.scaled(scale_x, scale_y);
            let (text_w, text_h) = measurer.measure(&item.display_text);
            let x = box_rect.left;
            let y = box_rect.bottom;
            DrawOp {
                box_rect,
                plate_rect: RectF::new(x, y, x + text_w + PLATE_MARGIN, y + text_h + PLATE_MARGIN),
                text_origin: (x + TEXT_INSET_X, y + text_h + TEXT_BASELINE_PAD),
                text: item.display_text.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedMeasurer;

    impl TextMeasurer for FixedMeasurer {
        /// 8 px per char, 16 px tall.
        fn measure(&self, text: &str) -> (f32, f32) {
            (text.chars().count() as f32 * 8.0, 16.0)
        }
    }

    fn item(text: &str) -> OverlayItem {
        OverlayItem {
            bounds: RectF::new(100.0, 100.0, 200.0, 150.0),
            display_text: text.into(),
        }
    }

    #[test]
    fn begin_pass_clears_previous_items() {
        let model = OverlayModel::new();
        assert!(model.begin_pass(1, 1080, 1920));
        assert!(model.push(1, item("uno")));
        assert!(model.push(1, item("dos")));
        assert_eq!(model.len(), 2);

        assert!(model.begin_pass(2, 1080, 1920));
        assert!(model.is_empty());
    }

    #[test]
    fn stale_pass_items_are_rejected() {
        let model = OverlayModel::new();
        model.begin_pass(1, 1080, 1920);
        model.push(1, item("old"));
        model.begin_pass(2, 1080, 1920);
        model.push(2, item("new"));

        // Late resolution from pass 1 must not appear.
        assert!(!model.push(1, item("late")));
        let snapshot = model.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].display_text, "new");
    }

    #[test]
    fn clear_retires_the_cleared_pass() {
        let model = OverlayModel::new();
        model.begin_pass(1, 1080, 1920);
        assert!(model.push(1, item("menu")));

        model.clear();

        // A resolution finishing after the wipe must stay off the overlay.
        assert!(!model.push(1, item("straggler")));
        assert!(model.is_empty());

        // The next issued pass id is newer than the retired one (the pass
        // tracker advances on reset too) and proceeds normally.
        assert!(model.begin_pass(3, 1080, 1920));
        assert!(model.push(3, item("nuevo")));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn stale_begin_pass_cannot_wipe_newer_pass() {
        let model = OverlayModel::new();
        model.begin_pass(2, 1080, 1920);
        model.push(2, item("current"));
        assert!(!model.begin_pass(1, 640, 480));
        assert_eq!(model.len(), 1);
        let snapshot = model.snapshot();
        assert_eq!((snapshot.image_width, snapshot.image_height), (1080, 1920));
    }

    #[test]
    fn compute_scale_tracks_source_dimensions() {
        let model = OverlayModel::new();
        // 1080x1920 frame at 90° normalizes to 1920x1080 before reaching here.
        model.begin_pass(1, 1920, 1080);
        let (sx, sy) = model.compute_scale(1080, 1920);
        assert!((sx - 1080.0 / 1920.0).abs() < 1e-6);
        assert!((sy - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn surface_invalidated_on_every_mutation() {
        struct CountingSurface(AtomicUsize);
        impl RenderSurface for CountingSurface {
            fn invalidate(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let surface = Arc::new(CountingSurface(AtomicUsize::new(0)));
        let model = OverlayModel::new();
        model.set_surface(Arc::clone(&surface) as Arc<dyn RenderSurface>);

        model.begin_pass(1, 100, 100);
        model.push(1, item("x"));
        model.clear();
        assert_eq!(surface.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn draw_ops_scale_boxes_and_anchor_plates() {
        let model = OverlayModel::new();
        model.begin_pass(1, 1920, 1080);
        model.push(1, item("hello"));

        let ops = plan_draw_ops(&model.snapshot(), 960, 540, &FixedMeasurer);
        assert_eq!(ops.len(), 1);
        let op = &ops[0];
        assert_eq!(op.box_rect, RectF::new(50.0, 50.0, 100.0, 75.0));

        // Plate sits at the box's bottom-left, sized to the measured text.
        let (text_w, text_h) = (5.0 * 8.0, 16.0);
        assert_eq!(
            op.plate_rect,
            RectF::new(50.0, 75.0, 50.0 + text_w + 20.0, 75.0 + text_h + 20.0)
        );
        assert_eq!(op.text_origin, (60.0, 75.0 + text_h + 5.0));
        assert_eq!(op.text, "hello");
    }

    #[test]
    fn identity_scale_without_dimensions() {
        let model = OverlayModel::new();
        assert_eq!(model.compute_scale(800, 600), (1.0, 1.0));
    }
}
