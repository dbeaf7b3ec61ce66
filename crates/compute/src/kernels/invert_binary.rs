use crate::backend::KernelOutput;
use crate::kernels::{map_unary, KernelArgs};
use crate::ComputeResult;

/// Zero becomes one, everything else becomes zero.
///
/// # Errors
/// `KernelExecutionFailed` if the extents differ.
pub fn handle_invert_binary(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    map_unary(args, |v| if v == 0.0 { 1.0 } else { 0.0 })
}
