use crate::backend::KernelOutput;
use crate::image::{Extents, Hyperstack, PlaneIndex};
use crate::kernels::KernelArgs;
use crate::ComputeResult;

fn check_projection(args: &KernelArgs, src: Extents, dst: Extents) -> ComputeResult<()> {
    if dst.depth() != 1 || src.with_depth(1)? != dst {
        return Err(args.fail(format!("{dst} is not a projection of {src}")));
    }
    Ok(())
}

/// Maximum along z and the first slice index where it occurs, per pixel.
fn project(args: &mut KernelArgs, with_arg: bool) -> ComputeResult<KernelOutput> {
    let src_extents = args.resource(0)?.extents();
    check_projection(args, src_extents, args.resource(1)?.extents())?;
    if with_arg {
        check_projection(args, src_extents, args.resource(2)?.extents())?;
    }

    let (inputs, outputs) = args.split(1)?;
    let src = &inputs[0];
    for channel in 0..src_extents.channels() {
        for frame in 0..src_extents.frames() {
            let at = PlaneIndex::new(channel, frame, 0);
            for y in 0..src_extents.height() {
                for x in 0..src_extents.width() {
                    let mut max = src.get(at, x, y);
                    let mut arg = 0;
                    for z in 1..src_extents.depth() {
                        let v = src.get(PlaneIndex::new(channel, frame, z), x, y);
                        if v > max {
                            max = v;
                            arg = z;
                        }
                    }
                    outputs[0].set(at, x, y, max);
                    if with_arg {
                        outputs[1].set(at, x, y, arg as f64);
                    }
                }
            }
        }
    }
    Ok(KernelOutput::Done)
}

/// # Errors
/// `KernelExecutionFailed` unless the destination is the source with depth 1.
pub fn handle_max_projection(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    project(args, false)
}

/// # Errors
/// `KernelExecutionFailed` unless both destinations are the source with depth 1.
pub fn handle_arg_max_projection(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    project(args, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::LogicalImage;
    use crate::kernels::test_util::stack;
    use crate::types::PixelType;
    use crate::Kernel;

    #[test]
    fn max_and_first_arg_max() {
        // peak at z = x, with a tie at z = 3 for x = 0
        let src = stack(PixelType::UnsignedInt8, (3, 1, 4), |x, _, z| {
            if z == x || (x == 0 && z == 3) { 9.0 } else { z as f64 }
        });
        let max = LogicalImage::stack(PixelType::UnsignedInt8, 3, 1, 1).unwrap();
        let arg = LogicalImage::stack(PixelType::UnsignedInt16, 3, 1, 1).unwrap();
        let mut args = KernelArgs::new(Kernel::ArgMaxProjection, vec![src, max, arg], Vec::new());
        handle_arg_max_projection(&mut args).unwrap();
        let out = args.into_resources();
        assert_eq!(out[1].samples().values().collect::<Vec<_>>(), [9.0, 9.0, 9.0]);
        assert_eq!(out[2].samples().values().collect::<Vec<_>>(), [0.0, 1.0, 2.0]);
    }

    #[test]
    fn destination_must_be_flat() {
        let src = LogicalImage::stack(PixelType::Float32, 2, 2, 3).unwrap();
        let dst = LogicalImage::stack(PixelType::Float32, 2, 2, 2).unwrap();
        let mut args = KernelArgs::new(Kernel::MaxProjection, vec![src, dst], Vec::new());
        assert!(handle_max_projection(&mut args).is_err());
    }
}
