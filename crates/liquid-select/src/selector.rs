use liquid_core::Backend;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::RngCore;

/// How a candidate set of (throughput, backend) pairs is turned into a
/// single backend choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Pick randomly, weighted by squared throughput, so that faster
    /// backends are picked more often but slower ones still get explored
    /// occasionally -- this is what lets the dispatcher notice when a
    /// backend's relative performance has changed.
    WeightedRandom,
    /// Always pick the backend with the highest throughput.
    Fastest,
}

/// Chooses a backend from benchmarked throughputs.
///
/// The RNG is injected so that weighted-random selection is reproducible in
/// tests; production callers construct this with [`Selector::new`], which
/// seeds from entropy.
pub struct Selector {
    rng: Box<dyn RngCore + Send>,
}

impl Selector {
    pub fn new() -> Self {
        Self::with_rng(Box::new(rand::thread_rng()))
    }

    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Self { rng }
    }

    /// Choose one backend out of `candidates`, a list of
    /// `(throughput, backend)` pairs. Returns `None` for an empty slice.
    pub fn choose(&mut self, candidates: &[(f64, Backend)], mode: SelectionMode) -> Option<Backend> {
        match mode {
            SelectionMode::Fastest => pick_fastest(candidates),
            SelectionMode::WeightedRandom => self.pick_weighted_random(candidates),
        }
    }

    fn pick_weighted_random(&mut self, candidates: &[(f64, Backend)]) -> Option<Backend> {
        if candidates.is_empty() {
            return None;
        }
        let weights: Vec<f64> = candidates.iter().map(|(t, _)| t * t).collect();
        if weights.iter().all(|w| *w <= 0.0) {
            return pick_fastest(candidates);
        }
        let dist = WeightedIndex::new(&weights).ok()?;
        let index = dist.sample(&mut self.rng);
        Some(candidates[index].1)
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

/// The highest-throughput backend, breaking ties by first occurrence so
/// that selection is stable across runs with identical benchmarks.
fn pick_fastest(candidates: &[(f64, Backend)]) -> Option<Backend> {
    candidates
        .iter()
        .enumerate()
        .max_by(|(ai, (at, _)), (bi, (bt, _))| {
            at.partial_cmp(bt)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(bi.cmp(ai))
        })
        .map(|(_, (_, backend))| *backend)
}
