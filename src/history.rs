//! Translation history hook and session context.
//! Persistence itself lives outside this crate; the pipeline only decides
//! *whether* a completed translation is recorded (guest sessions are not)
//! and hands the record to a `HistorySink`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::translate::LanguagePair;

/// Where the displayed text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationOrigin {
    Local,
    Remote,
    Cache,
}

/// A single completed translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub request_id: String,
    pub user_id: String,
    pub source_text: String,
    pub translated_text: String,
    pub pair: LanguagePair,
    pub origin: TranslationOrigin,
    pub created_at: i64,
}

/// Destination for history records. Implementations own batching/storage.
pub trait HistorySink: Send + Sync {
    fn record(&self, record: HistoryRecord);
}

/// Opaque user/session identity. Only consulted to decide whether results
/// are recorded to history.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user_id: Option<String>,
}

impl SessionContext {
    /// An anonymous session: nothing is persisted.
    pub fn guest() -> Self {
        Self { user_id: None }
    }

    pub fn logged_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn should_persist(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// In-memory sink for tests and the demo binary.
#[derive(Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl HistorySink for MemoryHistory {
    fn record(&self, record: HistoryRecord) {
        self.records.lock().push(record);
    }
}

/// Current time as Unix timestamp (seconds).
pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
