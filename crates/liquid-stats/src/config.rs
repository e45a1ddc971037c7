use std::collections::HashMap;

use liquid_core::Backend;
use serde::{Deserialize, Serialize};

use crate::aggregate::RunAggregate;

/// `backend designation -> fingerprint -> run aggregate`.
///
/// All eight canonical designations are always present, even when a bucket
/// is empty, matching the persisted-statistics contract in the spec.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistedConfig {
    #[serde(flatten)]
    buckets: HashMap<String, HashMap<String, RunAggregate>>,
}

impl PersistedConfig {
    /// A fresh config with all eight designation buckets present and empty.
    pub fn empty() -> Self {
        let mut buckets = HashMap::with_capacity(Backend::ALL.len());
        for backend in Backend::ALL {
            buckets.insert(backend.designation().to_string(), HashMap::new());
        }
        Self { buckets }
    }

    /// Normalize a config loaded from disk: ensure every canonical
    /// designation has a bucket, dropping unrecognized keys (a malformed or
    /// foreign key should not crash the dispatcher).
    fn normalized(mut self) -> Self {
        for backend in Backend::ALL {
            self.buckets
                .entry(backend.designation().to_string())
                .or_default();
        }
        self.buckets
            .retain(|key, _| Backend::from_designation(key).is_some());
        self
    }

    pub fn bucket(&self, backend: Backend) -> &HashMap<String, RunAggregate> {
        // `empty()`/`normalized()` guarantee every canonical bucket exists.
        self.buckets
            .get(backend.designation())
            .expect("canonical backend bucket always present")
    }

    pub fn bucket_mut(&mut self, backend: Backend) -> &mut HashMap<String, RunAggregate> {
        self.buckets
            .entry(backend.designation().to_string())
            .or_default()
    }

    pub fn get(&self, backend: Backend, fingerprint: &str) -> Option<&RunAggregate> {
        self.bucket(backend).get(fingerprint)
    }
}

/// Deserialize a config, tolerating malformed or missing data by returning
/// an empty (but fully-shaped) config instead.
pub fn parse_or_empty(text: &str) -> PersistedConfig {
    serde_json::from_str::<PersistedConfig>(text)
        .map(PersistedConfig::normalized)
        .unwrap_or_else(PersistedConfig::empty)
}
