//! In-memory LRU translation-result cache with TTL.
//! Live analysis re-reads the same region text on nearly every admitted
//! frame; a hit skips both translation paths for that region.
//! Key: blake3 hash of (source | target | text).

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::LanguagePair;

struct CachedTranslation {
    text: String,
    stored_at: Instant,
}

impl CachedTranslation {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct TranslationCache {
    inner: Mutex<LruCache<[u8; 32], CachedTranslation>>,
    ttl: Duration,
}

impl TranslationCache {
    /// A zero `capacity` (possible via a config file) is clamped to one
    /// entry rather than rejected; the cache is an optimization, not a
    /// requirement.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Compute the cache key for one (pair, text) lookup.
    pub fn compute_key(pair: &LanguagePair, text: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(pair.source.as_bytes());
        hasher.update(b"|");
        hasher.update(pair.target.as_bytes());
        hasher.update(b"|");
        hasher.update(text.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Look up a cached translation. Expired entries are evicted on read.
    pub fn get(&self, key: &[u8; 32]) -> Option<String> {
        let mut cache = self.inner.lock();
        match cache.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => Some(entry.text.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    /// Store a translation result under its key.
    pub fn insert(&self, key: [u8; 32], text: String) {
        self.inner.lock().put(
            key,
            CachedTranslation {
                text,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_pair_and_text() {
        let es_en = LanguagePair::new("es", "en");
        let a = TranslationCache::compute_key(&es_en, "hola");
        assert_eq!(a, TranslationCache::compute_key(&es_en, "hola"));
        assert_ne!(a, TranslationCache::compute_key(&es_en, "adios"));
        assert_ne!(
            a,
            TranslationCache::compute_key(&LanguagePair::new("en", "es"), "hola")
        );
    }

    #[test]
    fn insert_then_get() {
        let cache = TranslationCache::new(4, Duration::from_secs(60));
        let key = TranslationCache::compute_key(&LanguagePair::new("es", "en"), "hola");
        assert_eq!(cache.get(&key), None);
        cache.insert(key, "hello".into());
        assert_eq!(cache.get(&key), Some("hello".into()));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = TranslationCache::new(4, Duration::from_millis(0));
        let key = TranslationCache::compute_key(&LanguagePair::new("es", "en"), "hola");
        cache.insert(key, "hello".into());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn zero_capacity_clamps_to_one_entry() {
        let cache = TranslationCache::new(0, Duration::from_secs(60));
        let pair = LanguagePair::new("es", "en");
        let k1 = TranslationCache::compute_key(&pair, "uno");
        let k2 = TranslationCache::compute_key(&pair, "dos");
        cache.insert(k1, "one".into());
        cache.insert(k2, "two".into());
        assert_eq!(cache.get(&k1), None);
        assert_eq!(cache.get(&k2), Some("two".into()));
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let cache = TranslationCache::new(2, Duration::from_secs(60));
        let pair = LanguagePair::new("es", "en");
        let k1 = TranslationCache::compute_key(&pair, "uno");
        let k2 = TranslationCache::compute_key(&pair, "dos");
        let k3 = TranslationCache::compute_key(&pair, "tres");
        cache.insert(k1, "one".into());
        cache.insert(k2, "two".into());
        cache.insert(k3, "three".into());
        assert_eq!(cache.get(&k1), None);
        assert_eq!(cache.get(&k3), Some("three".into()));
    }
}
