//! OpenCL GPU backend.
//!
//! Compiles the embedded `intensity_scale` kernel once per call. A
//! production operation would cache the compiled [`ocl::Program`] across
//! calls; this demonstration operation favors clarity over reuse since it
//! exists to exercise the dispatcher, not to be fast.

use anyhow::{anyhow, Result};
use ocl::{Buffer, Context, Device, DeviceType, Kernel, MemFlags, Platform, Program, Queue};

use crate::op::IntensityScaleArgs;

const KERNEL_SRC: &str = include_str!("kernels/intensity_scale.cl");

pub fn run(args: &IntensityScaleArgs) -> Result<Vec<f32>> {
    let (platform, device) = first_gpu_device()?;

    let context = Context::builder()
        .platform(platform)
        .devices(device)
        .build()?;
    let queue = Queue::new(&context, device, None)?;
    let program = Program::builder().src(KERNEL_SRC).devices(device).build(&context)?;

    let len = args.data.len();
    let buf = Buffer::<f32>::builder()
        .queue(queue.clone())
        .flags(MemFlags::new().read_write())
        .len(len.max(1))
        .build()?;
    buf.write(&args.data[..]).enq()?;

    let kernel = Kernel::builder()
        .program(&program)
        .name("intensity_scale")
        .queue(queue.clone())
        .global_work_size(len.max(1))
        .arg(&buf)
        .arg(args.scale)
        .build()?;

    unsafe {
        kernel.enq()?;
    }
    queue.finish()?;

    let mut out = vec![0f32; len];
    if len > 0 {
        buf.read(&mut out[..]).enq()?;
    }
    Ok(out)
}

fn first_gpu_device() -> Result<(Platform, Device)> {
    for platform in Platform::list() {
        if let Ok(devices) = Device::list(platform, Some(DeviceType::GPU)) {
            if let Some(device) = devices.into_iter().next() {
                return Ok((platform, device));
            }
        }
    }
    Err(anyhow!("no OpenCL GPU device available on this host"))
}
