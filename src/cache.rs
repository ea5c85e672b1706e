//! Memoized PID validation.

use std::sync::{PoisonError, RwLock};

use hashbrown::HashMap;

use crate::pid::{validate, PidValidation};

/// Validation results keyed by the exact PID string.
///
/// Entries never expire; validation is a pure function of the string so
/// a stored result is always current. Owned by whoever needs it, never
/// global. A bounded cache stops storing once full and keeps answering
/// from [`validate`] directly.
#[derive(Debug, Default)]
pub struct ValidationCache {
    entries: RwLock<HashMap<String, PidValidation>>,
    max_entries: Option<usize>,
}

impl ValidationCache {
    /// Cache without a size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_entries` results
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            entries: RwLock::default(),
            max_entries: Some(max_entries),
        }
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// Same result as [`validate`], computed once per distinct string
    pub fn validate(&self, pid: &str) -> PidValidation {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.get(pid) {
                return hit.clone();
            }
        }

        let validation = validate(pid);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.max_entries.map_or(true, |max| entries.len() < max) {
            entries
                .entry(pid.to_string())
                .or_insert_with(|| validation.clone());
        }
        validation
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_matches_uncached_validation() {
        let cache = ValidationCache::new();
        for pid in ["JP-13-113", "INVALID", "", "jp-13-c01", "JP-13!"] {
            assert_eq!(cache.validate(pid), validate(pid), "{:?}", pid);
            assert_eq!(cache.validate(pid), validate(pid), "{:?}", pid);
        }
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_keys_are_exact_strings() {
        let cache = ValidationCache::new();
        cache.validate("JP-13");
        cache.validate("jp-13");
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_cache_stops_growing() {
        let cache = ValidationCache::bounded(100);
        for i in 0..1_000 {
            let pid = format!("junk {}", i);
            assert_eq!(cache.validate(&pid), validate(&pid));
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.max_entries(), Some(100));

        // Stored entries still answer; new strings are computed
        assert!(!cache.validate("junk 0").valid);
        assert!(cache.validate("JP-13-113").valid);
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(ValidationCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.validate("JP-13-113-C01").valid)
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 1);
    }
}
