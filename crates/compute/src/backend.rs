use crate::image::Extents;
use crate::types::{to_device_type, PixelType};
use crate::{ComputeError, ComputeResult, Kernel};
use std::fmt;

/// Opaque handle of a device allocation, unique per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two device resource models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Flat memory region with an element type and count.
    Buffer,
    /// Backend-native, format-constrained multi-dimensional resource.
    Image,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Image => "image",
        })
    }
}

/// What to allocate. Only constructible for pixel types present in the
/// mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceDesc {
    kind: ResourceKind,
    pixel_type: PixelType,
    extents: Extents,
}

impl ResourceDesc {
    /// # Errors
    /// `UnsupportedPixelType` if `pixel_type` has no device mapping,
    /// `AllocationFailed` if the byte size does not fit in `usize`.
    pub fn new(kind: ResourceKind, pixel_type: PixelType, extents: Extents) -> ComputeResult<Self> {
        to_device_type(pixel_type)?;
        if extents.len().checked_mul(pixel_type.byte_size()).is_none() {
            return Err(ComputeError::AllocationFailed(format!(
                "{kind} of {extents} {pixel_type} samples exceeds the address space"
            )));
        }
        Ok(Self { kind, pixel_type, extents })
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub const fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
    }

    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.extents.len() * self.pixel_type.byte_size()
    }
}

/// One positional kernel argument as seen by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelArg {
    Resource { id: ResourceId, desc: ResourceDesc },
    Scalar(f32),
}

/// What a kernel invocation produced besides writing its output operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelOutput {
    Done,
    /// Value read back from the device, e.g. the result of a reduction.
    Scalar(f64),
}

impl KernelOutput {
    #[must_use]
    pub fn scalar(&self) -> Option<f64> {
        match self {
            KernelOutput::Done => None,
            KernelOutput::Scalar(value) => Some(*value),
        }
    }
}

pub trait ComputeBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Allocates an uninitialized (zeroed) resource.
    ///
    /// # Errors
    /// `AllocationFailed` when the backend cannot hold the resource.
    fn allocate(&self, desc: &ResourceDesc) -> ComputeResult<ResourceId>;

    /// Frees a resource. Releasing an unknown id is an error.
    ///
    /// # Errors
    /// `ResourceNotFound` for unknown or already released ids.
    fn release(&self, id: ResourceId) -> ComputeResult<()>;

    /// Host to device transfer of the whole resource.
    ///
    /// # Errors
    /// `TransferSizeMismatch` if `bytes` does not match the resource size.
    fn upload(&self, id: ResourceId, bytes: &[u8]) -> ComputeResult<()>;

    /// Device to host transfer of the whole resource. Blocks until complete.
    ///
    /// # Errors
    /// `ResourceNotFound` for unknown ids.
    fn download(&self, id: ResourceId) -> ComputeResult<Vec<u8>>;

    /// Device-side copy between resources of equal byte size, regardless of
    /// their kinds.
    ///
    /// # Errors
    /// `TransferSizeMismatch` if the sizes differ.
    fn copy(&self, src: ResourceId, dst: ResourceId) -> ComputeResult<()>;

    /// Runs `kernel` on positional `args`. Blocks until the device is done
    /// and any returned value has been read back.
    ///
    /// # Errors
    /// `KernelExecutionFailed` when the kernel rejects its operands or fails.
    fn dispatch(&self, kernel: &Kernel, args: &[KernelArg]) -> ComputeResult<KernelOutput>;

    /// Number of resources currently allocated.
    fn live_resources(&self) -> usize;

    /// Number of allocations ever made.
    fn total_allocations(&self) -> usize;
}
