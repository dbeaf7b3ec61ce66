use crate::backend::KernelOutput;
use crate::kernels::{map_binary, KernelArgs};
use crate::ComputeResult;

/// `out = a + b`
///
/// # Errors
/// `KernelExecutionFailed` if the three images differ in extents.
pub fn handle_add_pixelwise(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    map_binary(args, |a, b| a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Hyperstack, LogicalImage, PlaneIndex};
    use crate::kernels::test_util::stack;
    use crate::types::PixelType;
    use crate::Kernel;

    #[test]
    fn adds_and_saturates_to_output_type() {
        let a = stack(PixelType::UnsignedInt8, (3, 2, 1), |x, _, _| 125.0 * x as f64);
        let b = stack(PixelType::UnsignedInt8, (3, 2, 1), |_, y, _| 10.0 + y as f64);
        let out = LogicalImage::new(PixelType::UnsignedInt8, a.extents());
        let mut args = KernelArgs::new(Kernel::AddPixelwise, vec![a, b, out], Vec::new());
        handle_add_pixelwise(&mut args).unwrap();
        let out = &args.into_resources()[2];
        assert_eq!(out.get(PlaneIndex::slice(0), 0, 0), 10.0);
        assert_eq!(out.get(PlaneIndex::slice(0), 1, 1), 136.0);
        assert_eq!(out.get(PlaneIndex::slice(0), 2, 1), 255.0);
    }

    #[test]
    fn mixed_types_compute_in_wide_precision() {
        let a = stack(PixelType::SignedInt16, (2, 1, 1), |x, _, _| -300.0 + x as f64);
        let b = stack(PixelType::Float32, (2, 1, 1), |_, _, _| 0.5);
        let out = LogicalImage::new(PixelType::Float32, a.extents());
        let mut args = KernelArgs::new(Kernel::AddPixelwise, vec![a, b, out], Vec::new());
        handle_add_pixelwise(&mut args).unwrap();
        let out = &args.into_resources()[2];
        assert_eq!(out.get(PlaneIndex::slice(0), 0, 0), -299.5);
        assert_eq!(out.get(PlaneIndex::slice(0), 1, 0), -298.5);
    }
}
