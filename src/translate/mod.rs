//! Translation subsystem: language pairs, the on-device engine cache, the
//! remote client, and the hybrid resolver that ties them together.

pub mod cache;
pub mod engines;
pub mod remote;
pub mod resolver;

use serde::{Deserialize, Serialize};

/// Languages with an on-device translation engine. Pairs entirely inside
/// this set try the local path first; anything else goes straight to the
/// remote service.
pub const LOCAL_LANGUAGES: [&str; 8] = ["es", "en", "fr", "de", "it", "pt", "zh", "ja"];

/// Ordered (source, target) ISO 639-1 codes identifying a translation
/// direction. Cache key for engine handles and translation results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Source and target are the same language: translation is a no-op.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Both codes have an on-device engine available.
    pub fn has_local_support(&self) -> bool {
        LOCAL_LANGUAGES.contains(&self.source.as_str())
            && LOCAL_LANGUAGES.contains(&self.target.as_str())
    }
}

impl std::fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_pair() {
        assert!(LanguagePair::new("fr", "fr").is_identity());
        assert!(!LanguagePair::new("fr", "en").is_identity());
    }

    #[test]
    fn local_support_requires_both_codes() {
        assert!(LanguagePair::new("es", "en").has_local_support());
        assert!(LanguagePair::new("zh", "ja").has_local_support());
        assert!(!LanguagePair::new("es", "ko").has_local_support());
        assert!(!LanguagePair::new("ru", "uk").has_local_support());
    }

    #[test]
    fn display_is_dashed() {
        assert_eq!(LanguagePair::new("es", "en").to_string(), "es-en");
    }
}
