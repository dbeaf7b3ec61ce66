use crate::backend::ResourceKind;
use crate::Kernel;

/// Role of one positional kernel operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Read by the kernel.
    In(ResourceKind),
    /// Written by the kernel; converted operands are copied back.
    Out(ResourceKind),
    Scalar,
}

impl Param {
    #[must_use]
    pub const fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            Param::In(kind) | Param::Out(kind) => Some(*kind),
            Param::Scalar => None,
        }
    }

    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(self, Param::Out(_))
    }
}

const IMAGE_IN: Param = Param::In(ResourceKind::Image);
const IMAGE_OUT: Param = Param::Out(ResourceKind::Image);
const BUFFER_IN: Param = Param::In(ResourceKind::Buffer);
const BUFFER_OUT: Param = Param::Out(ResourceKind::Buffer);

/// Operand layout expected by each kernel.
#[must_use]
pub const fn signature(kernel: &Kernel) -> &'static [Param] {
    match kernel {
        Kernel::AddPixelwise | Kernel::MultiplyPixelwise => &[IMAGE_IN, IMAGE_IN, IMAGE_OUT],
        Kernel::AddScalar | Kernel::MultiplyScalar => &[IMAGE_IN, IMAGE_OUT, Param::Scalar],
        Kernel::AddWeightedPixelwise => {
            &[IMAGE_IN, IMAGE_IN, IMAGE_OUT, Param::Scalar, Param::Scalar]
        }
        Kernel::Copy
        | Kernel::MaxProjection
        | Kernel::InvertBinary
        | Kernel::Dilate
        | Kernel::Erode => &[IMAGE_IN, IMAGE_OUT],
        // slice index
        Kernel::CopySlice => &[IMAGE_IN, IMAGE_OUT, Param::Scalar],
        // start x, y, z
        Kernel::Crop => &[IMAGE_IN, IMAGE_OUT, Param::Scalar, Param::Scalar, Param::Scalar],
        // max, arg max
        Kernel::ArgMaxProjection => &[IMAGE_IN, IMAGE_OUT, IMAGE_OUT],
        Kernel::Set => &[BUFFER_OUT, Param::Scalar],
        Kernel::SumPixels => &[BUFFER_IN],
    }
}
