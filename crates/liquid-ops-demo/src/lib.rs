//! A small demonstration operation exercising every Liquid Engine backend.
//!
//! The real image-processing kernels (interpolators, drift estimation,
//! FFT cross-correlation) are out of scope for the dispatcher this repo
//! builds; `IntensityScaleOp` exists only to give the dispatcher eight
//! genuinely distinct, genuinely simple implementations to choose among.

mod cpu;
mod gpu;
mod interpreted;
mod jit;
mod op;

pub use op::{IntensityScaleArgs, IntensityScaleOp};
