//! The adaptive backend dispatcher.

#![forbid(unsafe_code)]

mod capability;
mod engine;
mod kernel;
mod operation;

pub use capability::CapabilityFlags;
pub use engine::LiquidEngine;
pub use kernel::fetch_kernel_source;
pub use liquid_core::{Backend, LiquidError, Result};
pub use liquid_stats::{PersistedConfig, RunAggregate};
pub use operation::Operation;
