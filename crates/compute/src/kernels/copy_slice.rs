use crate::backend::KernelOutput;
use crate::image::{Hyperstack, PlaneIndex};
use crate::kernels::KernelArgs;
use crate::ComputeResult;

/// Copies one slice between a stack and a single-plane image.
///
/// With a single-plane destination, slice `z` of the source is extracted.
/// With a single-plane source, it is written into slice `z` of the
/// destination and the other slices are left alone.
///
/// # Errors
/// `KernelExecutionFailed` if neither side is single-plane, the planes
/// differ in size, or `z` is out of range.
pub fn handle_copy_slice(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    let z = args.index(0)?;
    let failure = |reason: String| args.fail(reason);
    let (src_extents, dst_extents) = (args.resource(0)?.extents(), args.resource(1)?.extents());
    if src_extents.with_depth(1)? != dst_extents.with_depth(1)? {
        return Err(failure(format!("planes of {src_extents} and {dst_extents} differ")));
    }
    let (from, to) = if dst_extents.depth() == 1 {
        (z, 0)
    } else if src_extents.depth() == 1 {
        (0, z)
    } else {
        return Err(failure("one side must be a single plane".to_string()));
    };
    if from >= src_extents.depth() || to >= dst_extents.depth() {
        return Err(failure(format!("slice {z} out of range")));
    }

    let (inputs, outputs) = args.split(1)?;
    let (src, dst) = (&inputs[0], &mut outputs[0]);
    for channel in 0..src_extents.channels() {
        for frame in 0..src_extents.frames() {
            let plane = src.plane(PlaneIndex::new(channel, frame, from));
            let at = PlaneIndex::new(channel, frame, to);
            for y in 0..plane.height() {
                for x in 0..plane.width() {
                    dst.set(at, x, y, plane.get(x, y));
                }
            }
        }
    }
    Ok(KernelOutput::Done)
}
