use std::path::Path;
use std::time::Instant;

use liquid_core::{Backend, LiquidError, Result};
use liquid_fingerprint::fingerprint;
use liquid_select::{resolve, SelectionMode, Selector};
use liquid_stats::{EngineIdentity, PersistedConfig, RunAggregate, StatsStore};

use crate::capability::CapabilityFlags;
use crate::operation::Operation;

/// Ties together capability probing, statistics, selection and execution
/// for one operation.
///
/// Mutated only through [`LiquidEngine::run`] and [`LiquidEngine::benchmark`];
/// every completed run writes its statistics through immediately, so there
/// is no explicit teardown/flush step.
pub struct LiquidEngine<O: Operation> {
    operation: O,
    capability: CapabilityFlags,
    stats: StatsStore,
    selector: Selector,
    random_testing: bool,
    show_info: bool,
    last_run_type: Option<Backend>,
    last_run_time: Option<f64>,
}

impl<O: Operation> LiquidEngine<O> {
    /// Construct an engine that probes real host capability and persists to
    /// the user-scoped config directory.
    pub fn new(operation: O) -> Self {
        let identity = EngineIdentity::new(operation.module_path(), operation.class_name());
        Self::build(
            operation,
            CapabilityFlags::probe(),
            StatsStore::load(identity),
            Selector::new(),
        )
    }

    /// Construct an engine rooted at `base_dir` instead of the user-scoped
    /// config directory. Intended for tests.
    pub fn new_in(operation: O, base_dir: &Path) -> Self {
        let identity = EngineIdentity::new(operation.module_path(), operation.class_name());
        Self::build(
            operation,
            CapabilityFlags::probe(),
            StatsStore::load_in(identity, base_dir),
            Selector::new(),
        )
    }

    /// Construct an engine from fully-specified parts -- capability flags,
    /// stats store and selector -- for deterministic end-to-end tests.
    pub fn with_parts(
        operation: O,
        capability: CapabilityFlags,
        stats: StatsStore,
        selector: Selector,
    ) -> Self {
        Self::build(operation, capability, stats, selector)
    }

    fn build(operation: O, capability: CapabilityFlags, stats: StatsStore, selector: Selector) -> Self {
        Self {
            operation,
            capability,
            stats,
            selector,
            random_testing: true,
            show_info: false,
            last_run_type: None,
            last_run_time: None,
        }
    }

    pub fn is_gpu_enabled(&self) -> bool {
        self.capability.enabled(Backend::Gpu)
    }

    pub fn is_jit_enabled(&self) -> bool {
        self.capability.enabled(Backend::Jit)
    }

    pub fn set_gpu_enabled(&mut self, enabled: bool) {
        self.capability.set(Backend::Gpu, enabled);
    }

    pub fn set_jit_enabled(&mut self, enabled: bool) {
        self.capability.set(Backend::Jit, enabled);
    }

    /// Disable the GPU variant if the currently enabled device advertises no
    /// double-precision support. A no-op if the GPU is already disabled.
    pub fn set_gpu_disabled_if_no_double_support(&mut self) {
        if self.capability.enabled(Backend::Gpu) && !self.capability.gpu_has_double_support() {
            self.capability.set(Backend::Gpu, false);
        }
    }

    pub fn set_show_info(&mut self, show_info: bool) {
        self.show_info = show_info;
    }

    /// Turn the exploration policy on or off. On by default: a fresh engine
    /// explores until it has enough history to exploit confidently.
    pub fn set_random_testing(&mut self, enabled: bool) {
        self.random_testing = enabled;
    }

    pub fn last_run_type(&self) -> Option<Backend> {
        self.last_run_type
    }

    pub fn last_run_time(&self) -> Option<f64> {
        self.last_run_time
    }

    pub fn get_run_times_log(&self) -> &PersistedConfig {
        self.stats.config()
    }

    pub fn get_mean_std_run_time(
        &self,
        backend: Backend,
        args: &O::Args,
    ) -> (Option<f64>, Option<f64>, Option<u64>) {
        let fp = self.fingerprint_of(args);
        match self.stats.get(backend, &fp) {
            Some(agg) => (Some(agg.mean()), Some(agg.stdev()), Some(agg.n)),
            None => (None, None, None),
        }
    }

    fn fingerprint_of(&self, args: &O::Args) -> String {
        let (positional, keyword) = self.operation.fingerprint_args(args);
        fingerprint(&positional, &keyword)
    }

    fn is_eligible(&self, backend: Backend) -> bool {
        self.capability.enabled(backend) && self.operation.implemented_backends().contains(&backend)
    }

    fn eligible_backends(&self) -> Vec<Backend> {
        Backend::ALL.into_iter().filter(|b| self.is_eligible(*b)).collect()
    }

    fn invoke(&self, backend: Backend, args: &O::Args) -> anyhow::Result<O::Output> {
        match backend {
            Backend::Gpu => self.operation.run_gpu(args),
            Backend::CpuSequential => self.operation.run_cpu_sequential(args),
            Backend::CpuThreaded => self.operation.run_cpu_threaded(args),
            Backend::CpuThreadedStatic => self.operation.run_cpu_threaded_static(args),
            Backend::CpuThreadedDynamic => self.operation.run_cpu_threaded_dynamic(args),
            Backend::CpuThreadedGuided => self.operation.run_cpu_threaded_guided(args),
            Backend::Interpreted => self.operation.run_interpreted(args),
            Backend::Jit => self.operation.run_jit(args),
        }
    }

    fn lookup_with_similarity(&self, backend: Backend, fp: &str) -> Option<RunAggregate> {
        if let Some(agg) = self.stats.get(backend, fp) {
            return Some(*agg);
        }
        let known: Vec<&str> = self.stats.entries(backend).map(|(f, _)| f).collect();
        let resolved = resolve(fp, known)?;
        self.stats.get(backend, resolved).copied()
    }

    /// Pick a starting backend when the Statistics Store has no history at
    /// all yet. Prefers the operation's declared default; if that is GPU and
    /// GPU is ineligible on this host, falls back to CPU-Threaded
    /// specifically before falling further back to the first eligible
    /// backend in canonical order.
    fn default_eligible_backend(&self, eligible: &[Backend]) -> Backend {
        let preferred = self.operation.default_backend();
        if eligible.contains(&preferred) {
            return preferred;
        }
        if preferred == Backend::Gpu && eligible.contains(&Backend::CpuThreaded) {
            return Backend::CpuThreaded;
        }
        eligible[0]
    }

    fn select_backend(&mut self, fp: &str) -> Option<Backend> {
        let eligible = self.eligible_backends();
        if eligible.is_empty() {
            return None;
        }

        let mut candidates = Vec::new();
        for backend in &eligible {
            if let Some(agg) = self.lookup_with_similarity(*backend, fp) {
                candidates.push((agg.throughput(), *backend));
            }
        }

        if candidates.is_empty() {
            return Some(self.default_eligible_backend(&eligible));
        }

        let mode = if self.random_testing {
            SelectionMode::WeightedRandom
        } else {
            SelectionMode::Fastest
        };
        self.selector.choose(&candidates, mode)
    }

    /// Run the operation once, picking a backend automatically unless
    /// `explicit_backend` is given.
    pub fn run(&mut self, args: &O::Args, explicit_backend: Option<Backend>) -> Result<O::Output> {
        let fp = self.fingerprint_of(args);

        let backend = match explicit_backend {
            Some(backend) => {
                if !self.is_eligible(backend) {
                    return Err(LiquidError::BackendUnavailable {
                        backend: backend.designation(),
                    });
                }
                backend
            }
            None => self.select_backend(&fp).ok_or(LiquidError::NoBackendImplemented)?,
        };

        let start = Instant::now();
        let output = self.invoke(backend, args).map_err(LiquidError::Backend)?;
        let elapsed = start.elapsed().as_secs_f64();

        self.stats.record_and_persist(backend, &fp, elapsed)?;
        self.last_run_type = Some(backend);
        self.last_run_time = Some(elapsed);

        if self.show_info {
            println!("{} run time: {:.6}s", backend.designation(), elapsed);
        }

        Ok(output)
    }

    /// Run every enabled, implemented backend once on the same `args`,
    /// returning `(elapsed_seconds, designation, output)` sorted ascending
    /// by elapsed time.
    pub fn benchmark(&mut self, args: &O::Args) -> Result<Vec<(f64, &'static str, O::Output)>> {
        let fp = self.fingerprint_of(args);
        let eligible = self.eligible_backends();
        if eligible.is_empty() {
            return Err(LiquidError::NoBackendImplemented);
        }

        let mut results = Vec::new();
        for backend in eligible {
            if backend == Backend::Jit {
                if self.invoke(backend, args).is_err() && self.show_info {
                    println!("JIT warmup failed, proceeding to timed run anyway");
                }
            }

            let start = Instant::now();
            let output = self.invoke(backend, args).map_err(LiquidError::Backend)?;
            let elapsed = start.elapsed().as_secs_f64();
            self.stats.record_and_persist(backend, &fp, elapsed)?;

            if self.show_info {
                let (mean, stdev, n) = self.get_mean_std_run_time(backend, args);
                println!(
                    "{} elapsed {:.6}s (mean {:?}s stdev {:?}s n {:?})",
                    backend.designation(),
                    elapsed,
                    mean,
                    stdev,
                    n
                );
            }

            results.push((elapsed, backend.designation(), output));
        }

        results.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // These summary lines always print, mirroring the original engine's
        // plain `print()` calls for "Fastest run type"/"Slowest run type"/
        // ratio lines/"Recorded fastest" -- unlike the per-backend lines
        // above, they are not gated behind `show_info`.
        if let (Some(fastest), Some(slowest)) = (results.first(), results.last()) {
            println!("fastest: {} slowest: {}", fastest.1, slowest.1);
            for entry in &results[1..] {
                println!(
                    "{} / {} = {:.2}",
                    entry.1,
                    fastest.1,
                    entry.0 / fastest.0
                );
            }
        }
        let picked = self.select_backend(&fp);
        if let Some(picked) = picked {
            println!("selector would currently pick: {}", picked.designation());
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_fingerprint::{ArgValue, KeywordArg};
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct StubArgs {
        shape: (usize, usize, usize),
        scale: f64,
    }

    impl StubArgs {
        fn new(shape: (usize, usize, usize), scale: f64) -> Self {
            Self { shape, scale }
        }
    }

    const TWO_BACKENDS: [Backend; 2] = [Backend::CpuSequential, Backend::CpuThreaded];
    const ONE_BACKEND: [Backend; 1] = [Backend::CpuSequential];

    /// An operation whose backends sleep a configured duration instead of
    /// doing real work, so dispatch behavior can be asserted on without
    /// depending on real backend timings.
    struct StubOp {
        default_backend: Backend,
        implemented: &'static [Backend],
        sleeps: HashMap<Backend, Duration>,
    }

    impl StubOp {
        fn new(default_backend: Backend, implemented: &'static [Backend]) -> Self {
            Self {
                default_backend,
                implemented,
                sleeps: HashMap::new(),
            }
        }

        fn with_sleep(mut self, backend: Backend, duration: Duration) -> Self {
            self.sleeps.insert(backend, duration);
            self
        }

        fn run_stub(&self, backend: Backend) -> anyhow::Result<Backend> {
            if let Some(duration) = self.sleeps.get(&backend) {
                thread::sleep(*duration);
            }
            Ok(backend)
        }
    }

    impl Operation for StubOp {
        type Args = StubArgs;
        type Output = Backend;

        fn module_path(&self) -> &'static str {
            "liquid_engine::engine::tests"
        }

        fn class_name(&self) -> &'static str {
            "StubOp"
        }

        fn default_backend(&self) -> Backend {
            self.default_backend
        }

        fn implemented_backends(&self) -> &'static [Backend] {
            self.implemented
        }

        fn fingerprint_args(&self, args: &Self::Args) -> (Vec<ArgValue>, Vec<KeywordArg>) {
            let shape = vec![args.shape.0, args.shape.1, args.shape.2];
            (
                vec![ArgValue::Shape(shape)],
                vec![KeywordArg::new("scale", ArgValue::Number(args.scale))],
            )
        }

        fn run_cpu_sequential(&self, _args: &Self::Args) -> anyhow::Result<Self::Output> {
            self.run_stub(Backend::CpuSequential)
        }

        fn run_cpu_threaded(&self, _args: &Self::Args) -> anyhow::Result<Self::Output> {
            self.run_stub(Backend::CpuThreaded)
        }
    }

    fn engine_with(op: StubOp) -> (tempfile::TempDir, LiquidEngine<StubOp>) {
        let dir = tempfile::tempdir().unwrap();
        let identity = EngineIdentity::new(op.module_path(), op.class_name());
        let engine = LiquidEngine::with_parts(
            op,
            CapabilityFlags::all_enabled(),
            StatsStore::load_in(identity, dir.path()),
            Selector::new(),
        );
        (dir, engine)
    }

    /// Scenario 1: a fresh engine with no prior history accumulates a
    /// `RunAggregate` across repeated calls with identical args.
    #[test]
    fn fresh_engine_accumulates_history_across_identical_runs() {
        let op = StubOp::new(Backend::CpuSequential, &ONE_BACKEND)
            .with_sleep(Backend::CpuSequential, Duration::from_millis(5));
        let (_dir, mut engine) = engine_with(op);

        let args = StubArgs::new((3, 64, 32), 4.0);
        engine.run(&args, None).unwrap();
        assert_eq!(engine.last_run_type(), Some(Backend::CpuSequential));

        let bucket = engine.get_run_times_log().bucket(Backend::CpuSequential);
        assert_eq!(bucket.len(), 1);
        let agg = bucket.values().next().unwrap();
        assert_eq!(agg.n, 1);

        engine.run(&args, None).unwrap();
        let bucket = engine.get_run_times_log().bucket(Backend::CpuSequential);
        let agg = bucket.values().next().unwrap();
        assert_eq!(agg.n, 2);
    }

    /// Scenario 2: with exploration off, the engine exploits the
    /// higher-throughput backend once both have enough recorded history.
    #[test]
    fn exploitation_picks_the_faster_backend_once_warmed_up() {
        let op = StubOp::new(Backend::CpuSequential, &TWO_BACKENDS)
            .with_sleep(Backend::CpuSequential, Duration::from_millis(10))
            .with_sleep(Backend::CpuThreaded, Duration::from_millis(20));
        let (_dir, mut engine) = engine_with(op);
        engine.set_random_testing(false);

        let args = StubArgs::new((3, 64, 32), 4.0);
        for _ in 0..10 {
            engine.run(&args, Some(Backend::CpuSequential)).unwrap();
            engine.run(&args, Some(Backend::CpuThreaded)).unwrap();
        }

        engine.run(&args, None).unwrap();
        assert_eq!(engine.last_run_type(), Some(Backend::CpuSequential));
    }

    /// Scenario 4: with only one fingerprint recorded anywhere, the
    /// similarity resolver falls back to it for a previously unseen
    /// fingerprint, picking the backend that recorded it even though the
    /// operation's own declared default points elsewhere.
    #[test]
    fn similarity_resolver_falls_back_to_the_only_known_fingerprint() {
        let op = StubOp::new(Backend::CpuThreaded, &TWO_BACKENDS);
        let (_dir, mut engine) = engine_with(op);

        let seed_args = StubArgs::new((3, 64, 32), 4.0);
        engine.run(&seed_args, Some(Backend::CpuSequential)).unwrap();

        let probe_args = StubArgs::new((3, 128, 64), 4.0);
        engine.run(&probe_args, None).unwrap();

        assert_eq!(engine.last_run_type(), Some(Backend::CpuSequential));
    }

    /// Scenario 5: the benchmark harness returns results sorted ascending by
    /// elapsed time, with the slower backend roughly twice the faster one.
    #[test]
    fn benchmark_returns_sorted_results_with_expected_ratio() {
        let op = StubOp::new(Backend::CpuSequential, &TWO_BACKENDS)
            .with_sleep(Backend::CpuSequential, Duration::from_millis(20))
            .with_sleep(Backend::CpuThreaded, Duration::from_millis(40));
        let (_dir, mut engine) = engine_with(op);

        let args = StubArgs::new((3, 64, 32), 4.0);
        let results = engine.benchmark(&args).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, Backend::CpuSequential.designation());
        assert_eq!(results[1].1, Backend::CpuThreaded.designation());

        let ratio = results[1].0 / results[0].0;
        assert!((1.5..3.0).contains(&ratio), "unexpected ratio {ratio}");
    }

    /// Scenario 6: once capability probing disables the GPU backend, an
    /// explicit run against it fails with `BackendUnavailable` instead of
    /// being invoked.
    #[test]
    fn gpu_disabled_without_double_support_rejects_explicit_run() {
        let op = StubOp::new(Backend::CpuSequential, &TWO_BACKENDS);
        let (_dir, mut engine) = engine_with(op);

        engine.set_gpu_disabled_if_no_double_support();
        if engine.is_gpu_enabled() {
            // This host's GPU genuinely advertises double-precision support;
            // the disablement path this test targets never fires.
            eprintln!("skipping: host GPU advertises double-precision support");
            return;
        }

        let args = StubArgs::new((3, 64, 32), 4.0);
        match engine.run(&args, Some(Backend::Gpu)) {
            Err(LiquidError::BackendUnavailable { backend }) => {
                assert_eq!(backend, Backend::Gpu.designation());
            }
            other => panic!("expected BackendUnavailable, got {other:?}"),
        }
    }
}
