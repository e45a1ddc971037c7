use serde::{Deserialize, Serialize};

/// Running `(sum_t, sum_t_squared, n)` for one (backend, fingerprint) pair.
///
/// Serialized as a plain 3-element array — `[sum_t, sum_t_squared, n]` — to
/// match the persisted-statistics on-disk contract.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunAggregate {
    pub sum_t: f64,
    pub sum_t_squared: f64,
    pub n: u64,
}

impl RunAggregate {
    /// Fold one more observed `elapsed_seconds` into this aggregate.
    pub fn record(&mut self, elapsed_seconds: f64) {
        self.sum_t += elapsed_seconds;
        self.sum_t_squared += elapsed_seconds * elapsed_seconds;
        self.n += 1;
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum_t / self.n as f64
        }
    }

    pub fn stdev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let n = self.n as f64;
        let variance = (self.sum_t_squared - n * mean * mean) / (n - 1.0);
        variance.max(0.0).sqrt()
    }

    /// Runs per second; `0.0` if there is no recorded time to divide by.
    pub fn throughput(&self) -> f64 {
        if self.sum_t <= 0.0 {
            0.0
        } else {
            self.n as f64 / self.sum_t
        }
    }
}

impl Serialize for RunAggregate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        (self.sum_t, self.sum_t_squared, self.n).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RunAggregate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (sum_t, sum_t_squared, n) = <(f64, f64, u64)>::deserialize(deserializer)?;
        Ok(Self {
            sum_t,
            sum_t_squared,
            n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_run_has_zero_stdev() {
        let mut agg = RunAggregate::default();
        agg.record(0.5);
        assert_eq!(agg.n, 1);
        assert!((agg.mean() - 0.5).abs() < 1e-12);
        assert_eq!(agg.stdev(), 0.0);
    }

    #[test]
    fn mean_and_throughput_after_several_runs() {
        let mut agg = RunAggregate::default();
        agg.record(0.01);
        agg.record(0.02);
        agg.record(0.03);
        assert_eq!(agg.n, 3);
        assert!((agg.mean() - 0.02).abs() < 1e-12);
        assert!((agg.throughput() - 3.0 / 0.06).abs() < 1e-9);
        assert!(agg.stdev() > 0.0);
    }

    #[test]
    fn json_round_trips_as_three_element_array() {
        let mut agg = RunAggregate::default();
        agg.record(0.25);
        agg.record(0.75);
        let json = serde_json::to_string(&agg).unwrap();
        assert_eq!(json, "[1.0,0.625,2]");
        let back: RunAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, agg);
    }
}
