use crate::backend::KernelOutput;
use crate::kernels::{map_binary, KernelArgs};
use crate::ComputeResult;

/// `out = a * factor_a + b * factor_b`
///
/// # Errors
/// `KernelExecutionFailed` on mismatched extents or missing factors.
pub fn handle_add_weighted_pixelwise(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let factor_a = f64::from(args.scalar(0)?);
    let factor_b = f64::from(args.scalar(1)?);
    map_binary(args, |a, b| a * factor_a + b * factor_b)
}
