use crate::backend::KernelOutput;
use crate::kernels::{map_unary, KernelArgs};
use crate::ComputeResult;

/// Copies `src` into `dst`, converting values to the destination type.
///
/// # Errors
/// `KernelExecutionFailed` if the extents differ.
pub fn handle_copy(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    map_unary(args, |v| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Hyperstack, LogicalImage};
    use crate::kernels::test_util::stack;
    use crate::types::PixelType;
    use crate::Kernel;

    #[test]
    fn copy_keeps_values() {
        let src = stack(PixelType::SignedInt16, (5, 4, 3), |x, y, z| (x * y) as f64 - z as f64);
        let dst = LogicalImage::new(PixelType::SignedInt16, src.extents());
        let mut args = KernelArgs::new(Kernel::Copy, vec![src.clone(), dst], Vec::new());
        handle_copy(&mut args).unwrap();
        assert_eq!(args.into_resources()[1], src);
    }
}
