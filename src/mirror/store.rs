//! Shared store of captured resources
//!
//! The store owns every ResourceRecord for the duration of one run. It is
//! shared across workers, so all access goes through an internal lock; the
//! upsert is check-free because re-recording the same URL is idempotent
//! (bytes for a given URL are assumed stable within one run, so last write
//! wins).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::mirror::ResourceClass;

/// A captured resource: its original URL, classification, and where its
/// bytes were written. Never mutated after creation except by an idempotent
/// re-capture of the same URL.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    /// The URL the renderer requested
    pub original_url: String,

    /// Effective resource class (extension-first classification)
    pub class: ResourceClass,

    /// Where the bytes live on disk
    pub local_path: PathBuf,

    /// HTTP status of the capturing fetch
    pub status: u16,

    /// Response headers of the capturing fetch, replayed when the same URL
    /// is requested again
    pub headers: Vec<(String, String)>,
}

/// Registry of every resource captured so far in the run
///
/// Supplies the rewrite rules: each record's original URL is substituted in
/// page markup with a path relative to the page being saved.
#[derive(Debug, Default)]
pub struct ResourceStore {
    records: Mutex<HashMap<String, ResourceRecord>>,
}

impl ResourceStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a record, keyed by original URL. Last write wins.
    pub fn record(&self, record: ResourceRecord) {
        let mut records = self.records.lock().unwrap();
        records.insert(record.original_url.clone(), record);
    }

    /// Whether a resource URL has already been captured
    pub fn contains(&self, url: &str) -> bool {
        self.records.lock().unwrap().contains_key(url)
    }

    /// Looks up the record for a resource URL
    pub fn get(&self, url: &str) -> Option<ResourceRecord> {
        self.records.lock().unwrap().get(url).cloned()
    }

    /// Number of captured resources
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// True if nothing has been captured yet
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Snapshot of (original URL, local path) pairs for the rewriter.
    ///
    /// Only resources captured strictly before this call are included, so a
    /// page rewrite never sees mappings discovered by later pages.
    pub fn rewrite_rules(&self) -> Vec<(String, PathBuf)> {
        self.records
            .lock()
            .unwrap()
            .values()
            .map(|r| (r.original_url.clone(), r.local_path.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, path: &str) -> ResourceRecord {
        ResourceRecord {
            original_url: url.to_string(),
            class: ResourceClass::Stylesheet,
            local_path: PathBuf::from(path),
            status: 200,
            headers: vec![("content-type".to_string(), "text/css".to_string())],
        }
    }

    #[test]
    fn test_record_and_contains() {
        let store = ResourceStore::new();
        assert!(store.is_empty());

        store.record(record("https://kinsu.mx/a.css", "out/a.css"));
        assert!(store.contains("https://kinsu.mx/a.css"));
        assert!(!store.contains("https://kinsu.mx/b.css"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recapture_is_idempotent_last_write_wins() {
        let store = ResourceStore::new();
        store.record(record("https://kinsu.mx/a.css", "out/a.css"));
        store.record(record("https://kinsu.mx/a.css", "out/a.css"));

        assert_eq!(store.len(), 1);
        let rules = store.rewrite_rules();
        assert_eq!(rules, vec![(
            "https://kinsu.mx/a.css".to_string(),
            PathBuf::from("out/a.css"),
        )]);
    }

    #[test]
    fn test_rewrite_rules_snapshot() {
        let store = ResourceStore::new();
        store.record(record("https://kinsu.mx/a.css", "out/a.css"));
        let rules = store.rewrite_rules();

        // Records added after the snapshot are not visible in it
        store.record(record("https://kinsu.mx/b.css", "out/b.css"));
        assert_eq!(rules.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
