//! Cranelift JIT backend.
//!
//! Compiles `fn(x, factor) -> x * factor` to native code once, on first use,
//! and caches the resulting function pointer for the lifetime of the
//! operation. Compiling a whole-array loop would exercise more of
//! Cranelift's IR surface for no benefit here -- the dispatcher's benchmark
//! harness already warms the JIT backend up before timing it (see
//! `LiquidEngine::benchmark`), so the one-time compile cost this backend
//! pays on its very first call is exactly what that warmup exists to hide.

use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use cranelift_codegen::ir::{types, AbiParam, InstBuilder};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, Linkage, Module};

use crate::op::IntensityScaleArgs;

type MulFn = unsafe extern "C" fn(f32, f32) -> f32;

/// Owns the JIT module for as long as `func` may be called -- dropping the
/// module would unmap the compiled code out from under the function
/// pointer.
struct CompiledMul {
    #[allow(dead_code)]
    module: JITModule,
    func: MulFn,
}

/// Lazily JIT-compiles the multiply and caches it across calls.
pub struct JitMultiplier {
    compiled: OnceLock<CompiledMul>,
}

impl JitMultiplier {
    pub fn new() -> Self {
        Self {
            compiled: OnceLock::new(),
        }
    }

    pub fn run(&self, args: &IntensityScaleArgs) -> Result<Vec<f32>> {
        let compiled = match self.compiled.get() {
            Some(compiled) => compiled,
            None => {
                let compiled = compile_multiplier()?;
                // Another thread may have won the race to compile first;
                // either way `get()` now returns a compiled function.
                let _ = self.compiled.set(compiled);
                self.compiled.get().expect("just initialized")
            }
        };

        Ok(args
            .data
            .iter()
            .map(|&x| unsafe { (compiled.func)(x, args.scale) })
            .collect())
    }
}

impl Default for JitMultiplier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_multiplier() -> Result<CompiledMul> {
    let builder = JITBuilder::new(default_libcall_names())
        .map_err(|e| anyhow!("failed to construct JIT builder: {e}"))?;
    let mut module = JITModule::new(builder);

    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(types::F32));
    sig.params.push(AbiParam::new(types::F32));
    sig.returns.push(AbiParam::new(types::F32));

    let func_id = module
        .declare_function("intensity_scale_mul", Linkage::Export, &sig)
        .map_err(|e| anyhow!("failed to declare JIT function: {e}"))?;

    let mut ctx = module.make_context();
    ctx.func.signature = sig;

    let mut fn_builder_ctx = FunctionBuilderContext::new();
    {
        let mut builder = FunctionBuilder::new(&mut ctx.func, &mut fn_builder_ctx);
        let entry = builder.create_block();
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);
        builder.seal_block(entry);

        let x = builder.block_params(entry)[0];
        let factor = builder.block_params(entry)[1];
        let product = builder.ins().fmul(x, factor);
        builder.ins().return_(&[product]);
        builder.finalize();
    }

    module
        .define_function(func_id, &mut ctx)
        .map_err(|e| anyhow!("failed to define JIT function: {e}"))?;
    module.clear_context(&mut ctx);
    module
        .finalize_definitions()
        .map_err(|e| anyhow!("failed to finalize JIT module: {e}"))?;

    let code_ptr = module.get_finalized_function(func_id);
    let func: MulFn = unsafe { std::mem::transmute::<*const u8, MulFn>(code_ptr) };

    Ok(CompiledMul { module, func })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jit_multiply_matches_plain_multiplication() {
        let jit = JitMultiplier::new();
        let args = IntensityScaleArgs::new((1, 1, 4), 2.5, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(jit.run(&args).unwrap(), vec![2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn compiled_function_is_reused_across_calls() {
        let jit = JitMultiplier::new();
        let a = IntensityScaleArgs::new((1, 1, 2), 2.0, vec![1.0, 2.0]);
        let b = IntensityScaleArgs::new((1, 1, 2), 3.0, vec![1.0, 2.0]);
        assert_eq!(jit.run(&a).unwrap(), vec![2.0, 4.0]);
        assert_eq!(jit.run(&b).unwrap(), vec![3.0, 6.0]);
    }
}
