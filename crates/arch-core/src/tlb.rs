//! Address-translation cache storage owned transitively by a CPU state.
//!
//! The page-table walker that fills these caches is an external collaborator;
//! this layer only owns their lifetime. Each architecture keeps one cache per
//! MMU mode, and the plug-in release slot must free them together with the
//! CPU state. Control-register writes that change the MMU configuration
//! invalidate every cache.

/// One cached linear-to-physical translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TlbEntry {
    /// Linear (pre-translation) page address.
    pub linear: u64,
    /// Physical page address the walker resolved.
    pub physical: u64,
}

/// Per-MMU-mode translation cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TranslationCache {
    entries: Vec<TlbEntry>,
}

impl TranslationCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records a translation resolved by the external page-table walker.
    pub fn insert(&mut self, entry: TlbEntry) {
        self.entries.push(entry);
    }

    /// Looks up a previously cached translation.
    #[must_use]
    pub fn lookup(&self, linear: u64) -> Option<u64> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.linear == linear)
            .map(|entry| entry.physical)
    }

    /// Number of cached translations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no translations are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached translation and releases its backing storage.
    pub fn release(&mut self) {
        self.entries = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::{TlbEntry, TranslationCache};

    #[test]
    fn lookup_prefers_the_most_recent_translation() {
        let mut cache = TranslationCache::new();
        cache.insert(TlbEntry {
            linear: 0x1000,
            physical: 0x9000,
        });
        cache.insert(TlbEntry {
            linear: 0x1000,
            physical: 0xA000,
        });

        assert_eq!(cache.lookup(0x1000), Some(0xA000));
        assert_eq!(cache.lookup(0x2000), None);
    }

    #[test]
    fn release_frees_backing_storage() {
        let mut cache = TranslationCache::new();
        cache.insert(TlbEntry {
            linear: 0x1000,
            physical: 0x9000,
        });
        cache.release();

        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }
}
