use liquid_core::Backend;
use ocl::enums::DeviceInfo as OclDeviceInfo;
use ocl::{Device, DeviceType, Platform};

/// Per-instance availability of every backend variant.
///
/// A variant is eligible for selection only when both the host can actually
/// run it (this struct) *and* the owning operation implements it
/// (`Operation::implemented_backends`).
#[derive(Clone, Copy, Debug)]
pub struct CapabilityFlags {
    gpu: bool,
    cpu_sequential: bool,
    cpu_threaded: bool,
    cpu_threaded_static: bool,
    cpu_threaded_dynamic: bool,
    cpu_threaded_guided: bool,
    interpreted: bool,
    jit: bool,
}

impl CapabilityFlags {
    /// Probe the host for GPU and JIT availability; every CPU-side backend
    /// is assumed available (they are plain Rust, always runnable).
    pub fn probe() -> Self {
        Self {
            gpu: probe_gpu().is_some(),
            cpu_sequential: true,
            cpu_threaded: true,
            cpu_threaded_static: true,
            cpu_threaded_dynamic: true,
            cpu_threaded_guided: true,
            interpreted: true,
            jit: probe_jit(),
        }
    }

    /// Every backend enabled; useful for tests that stub out real GPU/JIT
    /// work and want to exercise dispatch logic without a real device.
    pub fn all_enabled() -> Self {
        Self {
            gpu: true,
            cpu_sequential: true,
            cpu_threaded: true,
            cpu_threaded_static: true,
            cpu_threaded_dynamic: true,
            cpu_threaded_guided: true,
            interpreted: true,
            jit: true,
        }
    }

    pub fn enabled(&self, backend: Backend) -> bool {
        match backend {
            Backend::Gpu => self.gpu,
            Backend::CpuSequential => self.cpu_sequential,
            Backend::CpuThreaded => self.cpu_threaded,
            Backend::CpuThreadedStatic => self.cpu_threaded_static,
            Backend::CpuThreadedDynamic => self.cpu_threaded_dynamic,
            Backend::CpuThreadedGuided => self.cpu_threaded_guided,
            Backend::Interpreted => self.interpreted,
            Backend::Jit => self.jit,
        }
    }

    pub fn set(&mut self, backend: Backend, value: bool) {
        match backend {
            Backend::Gpu => self.gpu = value,
            Backend::CpuSequential => self.cpu_sequential = value,
            Backend::CpuThreaded => self.cpu_threaded = value,
            Backend::CpuThreadedStatic => self.cpu_threaded_static = value,
            Backend::CpuThreadedDynamic => self.cpu_threaded_dynamic = value,
            Backend::CpuThreadedGuided => self.cpu_threaded_guided = value,
            Backend::Interpreted => self.interpreted = value,
            Backend::Jit => self.jit = value,
        }
    }

    /// Whether the currently enabled GPU device (if any) advertises
    /// double-precision support. Returns `false` if there is no GPU or it
    /// cannot be queried.
    pub fn gpu_has_double_support(&self) -> bool {
        self.gpu && gpu_supports_fp64().unwrap_or(false)
    }
}

/// Try to open the first GPU device, catching both OpenCL errors and
/// library panics (e.g. no ICD installed on this host).
fn probe_gpu() -> Option<()> {
    match std::panic::catch_unwind(first_gpu_device) {
        Ok(Some(_)) => Some(()),
        Ok(None) => None,
        Err(_) => None,
    }
}

fn first_gpu_device() -> Option<Device> {
    let platforms = Platform::list();
    for platform in platforms {
        if let Ok(devices) = Device::list(platform, Some(DeviceType::GPU)) {
            if let Some(device) = devices.into_iter().next() {
                return Some(device);
            }
        }
    }
    None
}

fn gpu_supports_fp64() -> Option<bool> {
    let device = match std::panic::catch_unwind(first_gpu_device) {
        Ok(Some(device)) => device,
        _ => return None,
    };
    let extensions = device.info(OclDeviceInfo::Extensions).ok()?.to_string();
    Some(extensions.contains("cl_khr_fp64"))
}

/// Try to construct a JIT builder; failure here means the target/host
/// combination cannot JIT-compile at all.
fn probe_jit() -> bool {
    std::panic::catch_unwind(|| {
        cranelift_jit::JITBuilder::new(cranelift_module::default_libcall_names())
    })
    .ok()
    .and_then(|r| r.ok())
    .is_some()
}
