//! CPU backends, three of which realize distinct work-splitting policies
//! over `crossbeam::thread::scope`, mirroring the `static`/`dynamic`/`guided`
//! OpenMP scheduling clauses the original Cython backends were named after.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use rayon::prelude::*;

use crate::op::IntensityScaleArgs;

/// Chunk size dynamic scheduling pulls per claim.
const DYNAMIC_CHUNK: usize = 256;
/// Minimum chunk size guided scheduling shrinks to.
const GUIDED_FLOOR: usize = 64;

fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

pub fn run_sequential(args: &IntensityScaleArgs) -> Vec<f32> {
    args.data.iter().map(|x| x * args.scale).collect()
}

pub fn run_threaded(args: &IntensityScaleArgs) -> Vec<f32> {
    args.data.par_iter().map(|x| x * args.scale).collect()
}

/// Static scheduling: the input is pre-partitioned into equal contiguous
/// chunks, one per worker, up front.
pub fn run_static(args: &IntensityScaleArgs) -> Result<Vec<f32>> {
    let scale = args.scale;
    let data = &args.data;
    let mut out = vec![0f32; data.len()];
    let workers = worker_count().max(1);
    let chunk_len = ((data.len() + workers - 1) / workers).max(1);

    crossbeam::thread::scope(|scope| {
        for (in_chunk, out_chunk) in data.chunks(chunk_len).zip(out.chunks_mut(chunk_len)) {
            scope.spawn(move |_| {
                for (o, i) in out_chunk.iter_mut().zip(in_chunk) {
                    *o = i * scale;
                }
            });
        }
    })
    .map_err(|_| anyhow!("a static CPU worker panicked"))?;

    Ok(out)
}

/// Dynamic scheduling: workers share an atomic cursor and pull small
/// fixed-size chunks until the input is exhausted, so a worker that finishes
/// its chunk early picks up more work instead of idling.
pub fn run_dynamic(args: &IntensityScaleArgs) -> Result<Vec<f32>> {
    let scale = args.scale;
    let data = &args.data;
    let len = data.len();
    let cursor = AtomicUsize::new(0);
    let workers = worker_count().max(1);

    let partials: Vec<(usize, Vec<f32>)> = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cursor = &cursor;
                scope.spawn(move |_| {
                    let mut local = Vec::new();
                    loop {
                        let start = cursor.fetch_add(DYNAMIC_CHUNK, Ordering::Relaxed);
                        if start >= len {
                            break;
                        }
                        let end = (start + DYNAMIC_CHUNK).min(len);
                        let scaled: Vec<f32> = data[start..end].iter().map(|x| x * scale).collect();
                        local.push((start, scaled));
                    }
                    local
                })
            })
            .collect();

        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    })
    .map_err(|_| anyhow!("a dynamic CPU worker panicked"))?;

    Ok(scatter(len, partials))
}

/// Guided scheduling: each claim's chunk size shrinks geometrically toward
/// `GUIDED_FLOOR` as the remaining work shrinks, trading the coordination
/// overhead of many tiny dynamic claims for the load-balance of few large
/// static ones.
pub fn run_guided(args: &IntensityScaleArgs) -> Result<Vec<f32>> {
    let scale = args.scale;
    let data = &args.data;
    let len = data.len();
    let cursor = AtomicUsize::new(0);
    let workers = worker_count().max(1);

    let partials: Vec<(usize, Vec<f32>)> = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cursor = &cursor;
                scope.spawn(move |_| {
                    let mut local = Vec::new();
                    loop {
                        let start = cursor.load(Ordering::Relaxed);
                        if start >= len {
                            break;
                        }
                        let remaining = len - start;
                        let claim = (remaining / workers).max(GUIDED_FLOOR).min(remaining);
                        let end = start + claim;
                        if cursor
                            .compare_exchange(start, end, Ordering::Relaxed, Ordering::Relaxed)
                            .is_err()
                        {
                            continue;
                        }
                        let scaled: Vec<f32> = data[start..end].iter().map(|x| x * scale).collect();
                        local.push((start, scaled));
                    }
                    local
                })
            })
            .collect();

        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    })
    .map_err(|_| anyhow!("a guided CPU worker panicked"))?;

    Ok(scatter(len, partials))
}

fn scatter(len: usize, partials: Vec<(usize, Vec<f32>)>) -> Vec<f32> {
    let mut out = vec![0f32; len];
    for (start, chunk) in partials {
        out[start..start + chunk.len()].copy_from_slice(&chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> IntensityScaleArgs {
        let data: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        IntensityScaleArgs::new((1, 25, 40), 2.5, data)
    }

    #[test]
    fn all_cpu_variants_agree_with_sequential() {
        let args = args();
        let expected = run_sequential(&args);
        assert_eq!(run_threaded(&args), expected);
        assert_eq!(run_static(&args).unwrap(), expected);
        assert_eq!(run_dynamic(&args).unwrap(), expected);
        assert_eq!(run_guided(&args).unwrap(), expected);
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let args = IntensityScaleArgs::new((0, 0, 0), 3.0, vec![]);
        assert!(run_sequential(&args).is_empty());
        assert!(run_static(&args).unwrap().is_empty());
        assert!(run_dynamic(&args).unwrap().is_empty());
        assert!(run_guided(&args).unwrap().is_empty());
    }

    #[test]
    fn input_smaller_than_worker_count_is_not_lost() {
        let args = IntensityScaleArgs::new((1, 1, 3), 2.0, vec![1.0, 2.0, 3.0]);
        let expected = run_sequential(&args);
        assert_eq!(run_static(&args).unwrap(), expected);
        assert_eq!(run_dynamic(&args).unwrap(), expected);
        assert_eq!(run_guided(&args).unwrap(), expected);
    }
}
