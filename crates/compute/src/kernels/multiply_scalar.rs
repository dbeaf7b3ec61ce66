use crate::backend::KernelOutput;
use crate::kernels::{map_unary, KernelArgs};
use crate::ComputeResult;

/// `out = src * scalar`
///
/// # Errors
/// `KernelExecutionFailed` on mismatched extents or a missing scalar.
pub fn handle_multiply_scalar(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let scalar = f64::from(args.scalar(0)?);
    map_unary(args, |v| v * scalar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Hyperstack, LogicalImage};
    use crate::kernels::test_util::stack;
    use crate::types::PixelType;
    use crate::Kernel;

    #[test]
    fn scales_into_float_output() {
        let src = stack(PixelType::UnsignedInt8, (2, 2, 1), |x, y, _| (x + 2 * y) as f64);
        let dst = LogicalImage::new(PixelType::Float32, src.extents());
        let mut args = KernelArgs::new(Kernel::MultiplyScalar, vec![src, dst], vec![1.5]);
        handle_multiply_scalar(&mut args).unwrap();
        let values: Vec<f64> = args.into_resources()[1].samples().values().collect();
        assert_eq!(values, [0.0, 1.5, 3.0, 4.5]);
    }
}
