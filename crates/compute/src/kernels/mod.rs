// Reference handlers for every kernel the CPU backend runs.
//
// Handlers see decoded host copies of the bound resources, in positional
// order, followed by the scalar arguments. Resources bound to `Out` params
// are written back by the backend after the handler returns `Ok`.

use crate::backend::KernelOutput;
use crate::image::{Extents, Hyperstack, LogicalImage};
use crate::samples::Samples;
use crate::{ComputeError, ComputeResult, Kernel};

// Arithmetic
pub mod add_pixelwise;
pub use add_pixelwise::handle_add_pixelwise;
pub mod add_scalar;
pub use add_scalar::handle_add_scalar;
pub mod add_weighted;
pub use add_weighted::handle_add_weighted_pixelwise;
pub mod multiply_pixelwise;
pub use multiply_pixelwise::handle_multiply_pixelwise;
pub mod multiply_scalar;
pub use multiply_scalar::handle_multiply_scalar;

// Copies
pub mod copy;
pub use copy::handle_copy;
pub mod copy_slice;
pub use copy_slice::handle_copy_slice;
pub mod crop;
pub use crop::handle_crop;

// Projections
pub mod max_projection;
pub use max_projection::{handle_arg_max_projection, handle_max_projection};

// Binary morphology
pub mod invert_binary;
pub use invert_binary::handle_invert_binary;
pub mod morphology;
pub use morphology::{handle_dilate, handle_erode};

// Flat buffers
pub mod set;
pub use set::handle_set;
pub mod sum_pixels;
pub use sum_pixels::handle_sum_pixels;

pub type Handler = fn(&mut KernelArgs) -> ComputeResult<KernelOutput>;

#[must_use]
pub fn handler(kernel: Kernel) -> Handler {
    match kernel {
        Kernel::AddPixelwise => handle_add_pixelwise,
        Kernel::AddScalar => handle_add_scalar,
        Kernel::AddWeightedPixelwise => handle_add_weighted_pixelwise,
        Kernel::MultiplyPixelwise => handle_multiply_pixelwise,
        Kernel::MultiplyScalar => handle_multiply_scalar,
        Kernel::Copy => handle_copy,
        Kernel::CopySlice => handle_copy_slice,
        Kernel::Crop => handle_crop,
        Kernel::MaxProjection => handle_max_projection,
        Kernel::ArgMaxProjection => handle_arg_max_projection,
        Kernel::InvertBinary => handle_invert_binary,
        Kernel::Dilate => handle_dilate,
        Kernel::Erode => handle_erode,
        Kernel::Set => handle_set,
        Kernel::SumPixels => handle_sum_pixels,
    }
}

/// Decoded arguments of one invocation.
#[derive(Debug)]
pub struct KernelArgs {
    kernel: Kernel,
    resources: Vec<LogicalImage>,
    scalars: Vec<f32>,
}

impl KernelArgs {
    #[must_use]
    pub fn new(kernel: Kernel, resources: Vec<LogicalImage>, scalars: Vec<f32>) -> Self {
        Self { kernel, resources, scalars }
    }

    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    /// Error carrying this kernel's name.
    #[must_use]
    pub fn fail(&self, reason: impl Into<String>) -> ComputeError {
        ComputeError::KernelExecutionFailed { kernel: self.kernel.name(), reason: reason.into() }
    }

    /// # Errors
    /// If fewer than `index + 1` resources are bound.
    pub fn resource(&self, index: usize) -> ComputeResult<&LogicalImage> {
        self.resources
            .get(index)
            .ok_or_else(|| self.fail(format!("missing resource {index}")))
    }

    /// # Errors
    /// If fewer than `index + 1` scalars are bound.
    pub fn scalar(&self, index: usize) -> ComputeResult<f32> {
        self.scalars
            .get(index)
            .copied()
            .ok_or_else(|| self.fail(format!("missing scalar {index}")))
    }

    /// Scalar `index` read as a non-negative whole number.
    ///
    /// # Errors
    /// If the scalar is missing, negative or fractional.
    pub fn index(&self, index: usize) -> ComputeResult<usize> {
        let value = self.scalar(index)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(self.fail(format!("scalar {index} must be a non-negative integer, got {value}")));
        }
        Ok(value as usize)
    }

    /// Splits the resources into the first `inputs` and the rest.
    ///
    /// # Errors
    /// If fewer than `inputs` resources are bound, or none remain for output.
    pub fn split(&mut self, inputs: usize) -> ComputeResult<(&[LogicalImage], &mut [LogicalImage])> {
        if self.resources.len() <= inputs {
            return Err(self.fail(format!(
                "expected more than {inputs} resources, got {}",
                self.resources.len()
            )));
        }
        let (inputs, outputs) = self.resources.split_at_mut(inputs);
        Ok((inputs, outputs))
    }

    #[must_use]
    pub fn into_resources(self) -> Vec<LogicalImage> {
        self.resources
    }
}

pub(crate) fn require_same_extents(
    kernel: Kernel,
    expected: Extents,
    actual: Extents,
) -> ComputeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ComputeError::KernelExecutionFailed {
            kernel: kernel.name(),
            reason: format!("extents {actual} do not match {expected}"),
        })
    }
}

/// `dst[i] = f(src[i])`, saturated to the destination type.
pub(crate) fn map_unary(
    args: &mut KernelArgs,
    f: impl Fn(f64) -> f64,
) -> ComputeResult<KernelOutput> {
    let kernel = args.kernel();
    let (inputs, outputs) = args.split(1)?;
    let (src, dst) = (&inputs[0], &mut outputs[0]);
    require_same_extents(kernel, src.extents(), dst.extents())?;
    let values: Vec<f64> = src.samples().values().map(f).collect();
    dst.replace_samples(Samples::from_values(dst.pixel_type(), &values))?;
    Ok(KernelOutput::Done)
}

/// `dst[i] = f(a[i], b[i])`, saturated to the destination type.
pub(crate) fn map_binary(
    args: &mut KernelArgs,
    f: impl Fn(f64, f64) -> f64,
) -> ComputeResult<KernelOutput> {
    let kernel = args.kernel();
    let (inputs, outputs) = args.split(2)?;
    let (a, b, dst) = (&inputs[0], &inputs[1], &mut outputs[0]);
    require_same_extents(kernel, a.extents(), b.extents())?;
    require_same_extents(kernel, a.extents(), dst.extents())?;
    let values: Vec<f64> = a
        .samples()
        .values()
        .zip(b.samples().values())
        .map(|(x, y)| f(x, y))
        .collect();
    dst.replace_samples(Samples::from_values(dst.pixel_type(), &values))?;
    Ok(KernelOutput::Done)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelType;

    #[test]
    fn every_kernel_has_a_handler() {
        for kernel in Kernel::ALL {
            let mut args = KernelArgs::new(kernel, Vec::new(), Vec::new());
            // nothing bound: every handler must refuse rather than panic
            assert!(handler(kernel)(&mut args).is_err(), "{kernel:?}");
        }
    }

    #[test]
    fn mismatched_extents_fail_with_kernel_name() {
        let a = LogicalImage::stack(PixelType::Float32, 2, 2, 1).unwrap();
        let b = LogicalImage::stack(PixelType::Float32, 3, 2, 1).unwrap();
        let out = a.clone();
        let mut args = KernelArgs::new(Kernel::AddPixelwise, vec![a, b, out], Vec::new());
        let err = handle_add_pixelwise(&mut args).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::KernelExecutionFailed { kernel: "add_pixelwise", .. }
        ));
    }
}
