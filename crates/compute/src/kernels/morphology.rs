//! Binary dilation and erosion with the 6-connected (face) neighbourhood.
//!
//! Neighbours outside the image are ignored, so a foreground pixel on the
//! border is not eroded by the border itself.

use crate::backend::KernelOutput;
use crate::image::{Hyperstack, LogicalImage, PlaneIndex};
use crate::kernels::{require_same_extents, KernelArgs};
use crate::ComputeResult;

const NEIGHBOURS: [(isize, isize, isize); 6] =
    [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)];

fn neighbours(
    src: &LogicalImage,
    (channel, frame): (usize, usize),
    (x, y, z): (usize, usize, usize),
) -> impl Iterator<Item = f64> + '_ {
    let extents = src.extents();
    NEIGHBOURS.into_iter().filter_map(move |(dx, dy, dz)| {
        let nx = x.checked_add_signed(dx).filter(|&v| v < extents.width())?;
        let ny = y.checked_add_signed(dy).filter(|&v| v < extents.height())?;
        let nz = z.checked_add_signed(dz).filter(|&v| v < extents.depth())?;
        Some(src.get(PlaneIndex::new(channel, frame, nz), nx, ny))
    })
}

fn apply(args: &mut KernelArgs, dilate: bool) -> ComputeResult<KernelOutput> {
    let kernel = args.kernel();
    let (inputs, outputs) = args.split(1)?;
    let (src, dst) = (&inputs[0], &mut outputs[0]);
    let extents = src.extents();
    require_same_extents(kernel, extents, dst.extents())?;
    for at in extents.planes() {
        for y in 0..extents.height() {
            for x in 0..extents.width() {
                let centre = src.get(at, x, y) != 0.0;
                let mut around = neighbours(src, (at.channel, at.frame), (x, y, at.slice));
                let on = if dilate {
                    centre || around.any(|v| v != 0.0)
                } else {
                    centre && around.all(|v| v != 0.0)
                };
                dst.set(at, x, y, if on { 1.0 } else { 0.0 });
            }
        }
    }
    Ok(KernelOutput::Done)
}

/// # Errors
/// `KernelExecutionFailed` if the extents differ.
pub fn handle_dilate(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    apply(args, true)
}

/// # Errors
/// `KernelExecutionFailed` if the extents differ.
pub fn handle_erode(args: &mut KernelArgs) -> ComputeResult<KernelOutput> {
    apply(args, false)
}
