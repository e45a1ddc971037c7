use liquid_core::Backend;
use liquid_fingerprint::{ArgValue, KeywordArg};

/// A logical image-processing operation that supplies one implementation per
/// backend it supports.
///
/// Implementors return a `Err` from the default method body of any backend
/// they do not implement; `implemented_backends()` should list only those
/// that are genuinely overridden, since the engine intersects it with host
/// capability before ever calling one.
pub trait Operation {
    type Args;
    type Output;

    /// Logical module path used to derive this operation's config file
    /// location, typically `module_path!()`.
    fn module_path(&self) -> &'static str;

    /// Class-like name used as the config file's base name, typically
    /// `stringify!(Self)`.
    fn class_name(&self) -> &'static str;

    /// The backend to fall back on when the Statistics Store has no history
    /// at all for this operation yet.
    fn default_backend(&self) -> Backend;

    /// Backends this operation provides a genuine implementation for.
    fn implemented_backends(&self) -> &'static [Backend];

    /// Reduce `args` to its cost-relevant positional and keyword values.
    fn fingerprint_args(&self, args: &Self::Args) -> (Vec<ArgValue>, Vec<KeywordArg>);

    fn run_gpu(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("GPU"))
    }

    fn run_cpu_sequential(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("CPU-Sequential"))
    }

    fn run_cpu_threaded(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("CPU-Threaded"))
    }

    fn run_cpu_threaded_static(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("CPU-Threaded-Static"))
    }

    fn run_cpu_threaded_dynamic(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("CPU-Threaded-Dynamic"))
    }

    fn run_cpu_threaded_guided(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("CPU-Threaded-Guided"))
    }

    fn run_interpreted(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("Interpreted"))
    }

    fn run_jit(&self, args: &Self::Args) -> anyhow::Result<Self::Output> {
        let _ = args;
        Err(unsupported("JIT"))
    }
}

fn unsupported(backend: &str) -> anyhow::Error {
    anyhow::anyhow!("this operation has no {backend} implementation")
}
