use std::fs;
use std::path::{Path, PathBuf};

use liquid_core::{Backend, LiquidError, Result};

use crate::aggregate::RunAggregate;
use crate::config::{parse_or_empty, PersistedConfig};
use crate::identity::EngineIdentity;

/// Loads, mutates and persists one engine's run-time statistics file.
///
/// A missing or malformed file is treated as an empty config rather than an
/// error -- an engine with no history yet is a normal, expected state, not a
/// fault. A *write* failure, by contrast, is surfaced: silently losing a
/// freshly recorded measurement would quietly degrade future backend
/// selection.
pub struct StatsStore {
    path: PathBuf,
    config: PersistedConfig,
}

impl StatsStore {
    /// Load the statistics file for `identity` from the user-scoped config
    /// directory.
    pub fn load(identity: EngineIdentity) -> Self {
        Self::load_at(identity.config_path(None))
    }

    /// Load the statistics file for `identity` rooted under `base_dir`,
    /// bypassing the user-scoped config directory. Intended for tests.
    pub fn load_in(identity: EngineIdentity, base_dir: &Path) -> Self {
        Self::load_at(identity.config_path(Some(base_dir)))
    }

    fn load_at(path: PathBuf) -> Self {
        let config = fs::read_to_string(&path)
            .map(|text| parse_or_empty(&text))
            .unwrap_or_else(|_| PersistedConfig::empty());
        Self { path, config }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full in-memory configuration, all eight designation buckets.
    pub fn config(&self) -> &PersistedConfig {
        &self.config
    }

    /// Look up the aggregate recorded for an exact `(backend, fingerprint)`
    /// pair, if any runs have been recorded for it yet.
    pub fn get(&self, backend: Backend, fingerprint: &str) -> Option<&RunAggregate> {
        self.config.get(backend, fingerprint)
    }

    /// All recorded fingerprints and their aggregates for one backend, in no
    /// particular order.
    pub fn entries(&self, backend: Backend) -> impl Iterator<Item = (&str, &RunAggregate)> {
        self.config
            .bucket(backend)
            .iter()
            .map(|(fp, agg)| (fp.as_str(), agg))
    }

    /// Fold one more observed run into `(backend, fingerprint)`'s aggregate.
    /// Does not touch disk -- call [`StatsStore::persist`] to write it back.
    pub fn record(&mut self, backend: Backend, fingerprint: &str, elapsed_seconds: f64) {
        self.config
            .bucket_mut(backend)
            .entry(fingerprint.to_string())
            .or_default()
            .record(elapsed_seconds);
    }

    /// Write the current in-memory state to disk, creating parent
    /// directories as needed.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LiquidError::ConfigIOError {
                path: self.path.clone(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.config).expect("config is always valid json");
        fs::write(&self.path, json).map_err(|source| LiquidError::ConfigIOError {
            path: self.path.clone(),
            source,
        })
    }

    /// Record a run and persist immediately.
    pub fn record_and_persist(
        &mut self,
        backend: Backend,
        fingerprint: &str,
        elapsed_seconds: f64,
    ) -> Result<()> {
        self.record(backend, fingerprint, elapsed_seconds);
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> EngineIdentity {
        EngineIdentity::new("liquid_ops_demo", "IntensityScaleOp")
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::load_in(identity(), dir.path());
        assert!(store.get(Backend::Gpu, "anything").is_none());
    }

    #[test]
    fn record_and_persist_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fingerprint = "([shape(3, 64, 32)], {scale: number(4)})";

        let mut store = StatsStore::load_in(identity(), dir.path());
        store
            .record_and_persist(Backend::CpuThreaded, fingerprint, 0.02)
            .unwrap();

        let reloaded = StatsStore::load_in(identity(), dir.path());
        let agg = reloaded.get(Backend::CpuThreaded, fingerprint).unwrap();
        assert_eq!(agg.n, 1);
        assert!((agg.mean() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn malformed_file_on_disk_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let identity = identity();
        let path = identity.config_path(Some(dir.path()));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ this is not json").unwrap();

        let store = StatsStore::load_in(identity, dir.path());
        assert!(store.get(Backend::Gpu, "anything").is_none());
    }

    #[test]
    fn accumulates_multiple_runs_before_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = StatsStore::load_in(identity(), dir.path());
        store.record(Backend::CpuSequential, "fp", 0.1);
        store.record(Backend::CpuSequential, "fp", 0.3);
        let agg = store.get(Backend::CpuSequential, "fp").unwrap();
        assert_eq!(agg.n, 2);
        assert!((agg.mean() - 0.2).abs() < 1e-12);
    }
}
