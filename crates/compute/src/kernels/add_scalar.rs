use crate::backend::KernelOutput;
use crate::kernels::{map_unary, KernelArgs};
use crate::ComputeResult;

/// `out = src + scalar`
///
/// # Errors
/// `KernelExecutionFailed` if source and destination extents differ or the
/// scalar is missing.
pub fn handle_add_scalar(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let scalar = f64::from(args.scalar(0)?);
    map_unary(args, |v| v + scalar)
}
