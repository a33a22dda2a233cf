//! Pipeline timing metrics: sliding sample windows summarized at p50/p95.
//! Every analysis pass records detection, per-region resolution and whole
//! pass durations; a sample costs one lock and one deque write.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Samples kept per metric; older ones age out.
const WINDOW_CAPACITY: usize = 1024;

/// Measures elapsed time from creation to explicit end. Dropped without
/// `finish` (an abandoned pass), nothing is recorded.
pub struct TimingSpan {
    name: &'static str,
    started_at: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    /// End the span, recording the elapsed time under the span's metric.
    pub fn finish(self) -> Duration {
        let elapsed = self.started_at.elapsed();
        self.registry.record(self.name, elapsed.as_micros() as f64);
        elapsed
    }
}

/// The most recent samples for one metric.
struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Nearest-rank percentile over the window, `p` in 0..=100.
    fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = ((p / 100.0) * (sorted.len() as f64 - 1.0)).round() as usize;
        sorted[rank.min(sorted.len() - 1)]
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Sample windows for all named metrics.
#[derive(Default)]
pub struct MetricsRegistry {
    windows: Mutex<HashMap<&'static str, SampleWindow>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample (in microseconds) for the named metric.
    pub fn record(&self, name: &'static str, value_us: f64) {
        self.windows
            .lock()
            .entry(name)
            .or_insert_with(|| SampleWindow::new(WINDOW_CAPACITY))
            .push(value_us);
    }

    /// Start a timing span that records on finish.
    pub fn span(self: &Arc<Self>, name: &'static str) -> TimingSpan {
        TimingSpan {
            name,
            started_at: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    /// Snapshot every metric at p50/p95 with its sample count.
    pub fn summary(&self) -> HashMap<String, MetricSummary> {
        let windows = self.windows.lock();
        windows
            .iter()
            .map(|(&name, window)| {
                (
                    name.to_string(),
                    MetricSummary {
                        p50_us: window.percentile(50.0),
                        p95_us: window.percentile(95.0),
                        count: window.len(),
                    },
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MetricSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub count: usize,
}

/// Well-known metric names (constants to avoid typos).
pub mod metric_names {
    pub const DETECT_DONE: &str = "t_detect_done";
    pub const LOCAL_TRANSLATE: &str = "t_local_translate";
    pub const REMOTE_TRANSLATE: &str = "t_remote_translate";
    pub const RESOLVE_DONE: &str = "t_resolve_done";
    pub const PASS_TOTAL: &str = "t_pass_total";
    pub const FRAME_QUEUE_WAIT: &str = "queue_wait_frames";
}
