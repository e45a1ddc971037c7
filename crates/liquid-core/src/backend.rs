/// One of the eight interchangeable implementations of a dispatched
/// operation.
///
/// The variant set is closed and the on-disk `designation()` strings are
/// part of the persisted-statistics contract: they must never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    Gpu,
    CpuSequential,
    CpuThreaded,
    CpuThreadedStatic,
    CpuThreadedDynamic,
    CpuThreadedGuided,
    Interpreted,
    Jit,
}

impl Backend {
    /// Every backend variant, in canonical declaration order. Selection
    /// ties and benchmark enumeration both use this order for stability.
    pub const ALL: [Backend; 8] = [
        Backend::Gpu,
        Backend::CpuSequential,
        Backend::CpuThreaded,
        Backend::CpuThreadedStatic,
        Backend::CpuThreadedDynamic,
        Backend::CpuThreadedGuided,
        Backend::Interpreted,
        Backend::Jit,
    ];

    /// The stable, human-readable on-disk key for this backend.
    pub const fn designation(self) -> &'static str {
        match self {
            Backend::Gpu => "OpenCL",
            Backend::CpuSequential => "Unthreaded",
            Backend::CpuThreaded => "Threaded",
            Backend::CpuThreadedStatic => "Threaded_static",
            Backend::CpuThreadedDynamic => "Threaded_dynamic",
            Backend::CpuThreadedGuided => "Threaded_guided",
            Backend::Interpreted => "Python",
            Backend::Jit => "Numba",
        }
    }

    /// Parse a designation string back into its backend, if it is one of
    /// the eight canonical values.
    pub fn from_designation(designation: &str) -> Option<Backend> {
        Backend::ALL
            .into_iter()
            .find(|b| b.designation() == designation)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.designation())
    }
}
