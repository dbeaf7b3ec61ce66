use crate::backend::KernelOutput;
use crate::kernels::{map_binary, KernelArgs};
use crate::ComputeResult;

/// `out = a * b`
///
/// # Errors
/// `KernelExecutionFailed` if the three images differ in extents.
pub fn handle_multiply_pixelwise(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    map_binary(args, |a, b| a * b)
}
