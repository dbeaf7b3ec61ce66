use crate::backend::KernelOutput;
use crate::kernels::KernelArgs;
use crate::ComputeResult;

/// Sum of every sample, read back as a scalar.
///
/// # Errors
/// `KernelExecutionFailed` if no buffer is bound.
pub fn handle_sum_pixels(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let sum: f64 = args.resource(0)?.samples().values().sum();
    Ok(KernelOutput::Scalar(sum))
}
