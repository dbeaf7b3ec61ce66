use crate::backend::KernelOutput;
use crate::image::{Hyperstack, PlaneIndex};
use crate::kernels::KernelArgs;
use crate::ComputeResult;

/// Copies the region of `src` starting at `(start_x, start_y, start_z)` with
/// the destination's size.
///
/// # Errors
/// `KernelExecutionFailed` if the region does not fit inside the source.
pub fn handle_crop(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let (sx, sy, sz) = (args.index(0)?, args.index(1)?, args.index(2)?);
    let src_extents = args.resource(0)?.extents();
    let dst_extents = args.resource(1)?.extents();
    let within = |start: usize, len: usize, limit: usize| {
        start.checked_add(len).is_some_and(|end| end <= limit)
    };
    let fits = within(sx, dst_extents.width(), src_extents.width())
        && within(sy, dst_extents.height(), src_extents.height())
        && within(sz, dst_extents.depth(), src_extents.depth())
        && dst_extents.channels() == src_extents.channels()
        && dst_extents.frames() == src_extents.frames();
    if !fits {
        return Err(args.fail(format!(
            "{dst_extents} at ({sx}, {sy}, {sz}) does not fit in {src_extents}"
        )));
    }

    let (inputs, outputs) = args.split(1)?;
    let (src, dst) = (&inputs[0], &mut outputs[0]);
    for at in dst_extents.planes() {
        let plane = src.plane(PlaneIndex::new(at.channel, at.frame, at.slice + sz));
        for y in 0..dst_extents.height() {
            for x in 0..dst_extents.width() {
                dst.set(at, x, y, plane.get(x + sx, y + sy));
            }
        }
    }
    Ok(KernelOutput::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::LogicalImage;
    use crate::kernels::test_util::stack;
    use crate::types::PixelType;
    use crate::Kernel;

    #[test]
    fn crops_a_sub_volume() {
        let src = stack(PixelType::UnsignedInt16, (6, 5, 4), |x, y, z| (x + 10 * y + 100 * z) as f64);
        let dst = LogicalImage::stack(PixelType::UnsignedInt16, 2, 3, 2).unwrap();
        let mut args = KernelArgs::new(Kernel::Crop, vec![src, dst], vec![1.0, 2.0, 1.0]);
        handle_crop(&mut args).unwrap();
        let dst = &args.into_resources()[1];
        assert_eq!(dst.get(PlaneIndex::slice(0), 0, 0), 121.0);
        assert_eq!(dst.get(PlaneIndex::slice(1), 1, 2), 242.0);
    }

    #[test]
    fn region_past_the_edge_fails() {
        let src = LogicalImage::stack(PixelType::UnsignedInt16, 4, 4, 1).unwrap();
        let dst = LogicalImage::stack(PixelType::UnsignedInt16, 2, 2, 1).unwrap();
        let mut args = KernelArgs::new(Kernel::Crop, vec![src, dst], vec![3.0, 0.0, 0.0]);
        assert!(handle_crop(&mut args).is_err());
    }

    #[test]
    fn huge_offsets_fail_instead_of_overflowing() {
        let src = LogicalImage::stack(PixelType::UnsignedInt16, 4, 4, 1).unwrap();
        let dst = LogicalImage::stack(PixelType::UnsignedInt16, 2, 2, 1).unwrap();
        for start in [[1e20, 0.0, 0.0], [0.0, 1e20, 0.0], [0.0, 0.0, f32::MAX]] {
            let mut args = KernelArgs::new(Kernel::Crop, vec![src.clone(), dst.clone()], start.to_vec());
            let err = handle_crop(&mut args).unwrap_err();
            assert!(matches!(err, crate::ComputeError::KernelExecutionFailed { kernel: "crop", .. }));
        }
    }
}
