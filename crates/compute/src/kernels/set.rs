use crate::backend::KernelOutput;
use crate::kernels::KernelArgs;
use crate::ComputeResult;

/// Fills the buffer with the scalar, saturated to its type.
///
/// # Errors
/// `KernelExecutionFailed` if the buffer or the value is missing.
pub fn handle_set(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let value = f64::from(args.scalar(0)?);
    let (_, outputs) = args.split(0)?;
    outputs[0].fill(value);
    Ok(KernelOutput::Done)
}
