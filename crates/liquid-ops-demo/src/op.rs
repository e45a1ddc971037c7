use liquid_core::Backend;
use liquid_engine::Operation;
use liquid_fingerprint::{ArgValue, KeywordArg};

use crate::jit::JitMultiplier;

/// Arguments for [`IntensityScaleOp`]: a flattened 3-D array and the scalar
/// factor every backend multiplies it by.
#[derive(Clone, Debug)]
pub struct IntensityScaleArgs {
    pub shape: (usize, usize, usize),
    pub scale: f32,
    pub data: Vec<f32>,
}

impl IntensityScaleArgs {
    pub fn new(shape: (usize, usize, usize), scale: f32, data: Vec<f32>) -> Self {
        let expected = shape.0 * shape.1 * shape.2;
        assert_eq!(
            data.len(),
            expected,
            "data length {} does not match shape {:?}",
            data.len(),
            shape
        );
        Self { shape, scale, data }
    }

    pub fn filled(shape: (usize, usize, usize), scale: f32, value: f32) -> Self {
        let expected = shape.0 * shape.1 * shape.2;
        Self {
            shape,
            scale,
            data: vec![value; expected],
        }
    }
}

/// A toy intensity-scaling transform (`out[i] = in[i] * scale`) over a
/// flattened 3-D array, implemented once per backend.
///
/// This stands in for the real image-processing kernels the dispatcher was
/// built to choose among: the bodies here are intentionally trivial so the
/// interesting behavior under test is the dispatcher's selection, statistics
/// and similarity logic, not numerical correctness of an interpolator.
pub struct IntensityScaleOp {
    jit: JitMultiplier,
}

impl IntensityScaleOp {
    pub fn new() -> Self {
        Self {
            jit: JitMultiplier::new(),
        }
    }
}

impl Default for IntensityScaleOp {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for IntensityScaleOp {
    type Args = IntensityScaleArgs;
    type Output = Vec<f32>;

    fn module_path(&self) -> &'static str {
        module_path!()
    }

    fn class_name(&self) -> &'static str {
        "IntensityScaleOp"
    }

    fn default_backend(&self) -> Backend {
        Backend::CpuThreaded
    }

    fn implemented_backends(&self) -> &'static [Backend] {
        &Backend::ALL
    }

    fn fingerprint_args(&self, args: &Self::Args) -> (Vec<ArgValue>, Vec<KeywordArg>) {
        let shape = vec![args.shape.0, args.shape.1, args.shape.2];
        (
            vec![ArgValue::Shape(shape)],
            vec![KeywordArg::new(
                "scale",
                ArgValue::Number(args.scale as f64),
            )],
        )
    }

    fn run_gpu(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        crate::gpu::run(args)
    }

    fn run_cpu_sequential(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        Ok(crate::cpu::run_sequential(args))
    }

    fn run_cpu_threaded(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        Ok(crate::cpu::run_threaded(args))
    }

    fn run_cpu_threaded_static(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        crate::cpu::run_static(args)
    }

    fn run_cpu_threaded_dynamic(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        crate::cpu::run_dynamic(args)
    }

    fn run_cpu_threaded_guided(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        crate::cpu::run_guided(args)
    }

    fn run_interpreted(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        Ok(crate::interpreted::run(args))
    }

    fn run_jit(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        self.jit.run(args)
    }
}
