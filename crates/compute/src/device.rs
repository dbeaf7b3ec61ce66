//! Device resource handles and the compute context.
//!
//! [`DeviceBuffer`] and [`DeviceImage`] exclusively own one backend
//! allocation each. Dropping a handle releases it; [`DeviceBuffer::release`]
//! and [`DeviceImage::release`] do the same but report backend failures.

use crate::backend::{ComputeBackend, KernelArg, ResourceDesc, ResourceId, ResourceKind};
use crate::image::{Extents, Hyperstack, LogicalImage};
use crate::samples::Samples;
use crate::types::{to_device_type, to_native_type, DeviceChannelType, NativeType, PixelType};
use crate::{ComputeError, ComputeResult};
use std::fmt;
use std::sync::Arc;

struct Allocation {
    id: ResourceId,
    desc: ResourceDesc,
    backend: Arc<dyn ComputeBackend>,
    live: bool,
}

impl Allocation {
    fn new(backend: &Arc<dyn ComputeBackend>, desc: ResourceDesc) -> ComputeResult<Self> {
        let id = backend.allocate(&desc)?;
        tracing::debug!(
            %id,
            kind = %desc.kind(),
            pixel_type = %desc.pixel_type(),
            extents = %desc.extents(),
            "allocated device resource"
        );
        Ok(Self { id, desc, backend: Arc::clone(backend), live: true })
    }

    fn release(mut self) -> ComputeResult<()> {
        self.live = false;
        tracing::debug!(id = %self.id, "releasing device resource");
        self.backend.release(self.id)
    }

    fn read(&self) -> ComputeResult<Samples> {
        let bytes = self.backend.download(self.id)?;
        Samples::from_bytes(self.desc.pixel_type(), &bytes)
    }

    fn write(&self, samples: &Samples) -> ComputeResult<()> {
        if samples.pixel_type() != self.desc.pixel_type() {
            return Err(ComputeError::PixelTypeMismatch {
                expected: self.desc.pixel_type(),
                actual: samples.pixel_type(),
            });
        }
        if samples.len() != self.desc.extents().len() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: self.desc.extents().len(),
                actual: samples.len(),
            });
        }
        self.backend.upload(self.id, &samples.to_bytes())
    }

    fn belongs_to(&self, ctx: &Context) -> bool {
        same_backend(&self.backend, &ctx.backend)
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.live {
            if let Err(e) = self.backend.release(self.id) {
                tracing::warn!(id = %self.id, "failed to release device resource on drop: {e}");
            }
        }
    }
}

fn same_backend(a: &Arc<dyn ComputeBackend>, b: &Arc<dyn ComputeBackend>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Flat device memory holding `extents.len()` elements of one native type.
pub struct DeviceBuffer {
    alloc: Allocation,
    native_type: NativeType,
}

impl DeviceBuffer {
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.alloc.id
    }

    #[must_use]
    pub fn desc(&self) -> ResourceDesc {
        self.alloc.desc
    }

    #[must_use]
    pub fn pixel_type(&self) -> PixelType {
        self.alloc.desc.pixel_type()
    }

    #[must_use]
    pub fn native_type(&self) -> NativeType {
        self.native_type
    }

    /// Logical extents the buffer was created for.
    #[must_use]
    pub fn extents(&self) -> Extents {
        self.alloc.desc.extents()
    }

    /// Element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extents().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downloads the contents.
    ///
    /// # Errors
    /// Backend transfer failures.
    pub fn read(&self) -> ComputeResult<Samples> {
        self.alloc.read()
    }

    /// Uploads `samples`, which must match the buffer's type and length.
    ///
    /// # Errors
    /// `PixelTypeMismatch`, `TransferSizeMismatch` or backend failures.
    pub fn write(&self, samples: &Samples) -> ComputeResult<()> {
        self.alloc.write(samples)
    }

    /// Releases the allocation now instead of on drop.
    ///
    /// # Errors
    /// Whatever the backend reports.
    pub fn release(self) -> ComputeResult<()> {
        self.alloc.release()
    }

    #[must_use]
    pub fn belongs_to(&self, ctx: &Context) -> bool {
        self.alloc.belongs_to(ctx)
    }

    pub(crate) fn arg(&self) -> KernelArg {
        KernelArg::Resource { id: self.alloc.id, desc: self.alloc.desc }
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("id", &self.alloc.id)
            .field("native_type", &self.native_type)
            .field("extents", &self.extents())
            .finish_non_exhaustive()
    }
}

/// Backend-native image with one channel type per sample.
pub struct DeviceImage {
    alloc: Allocation,
    channel_type: DeviceChannelType,
}

impl DeviceImage {
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.alloc.id
    }

    #[must_use]
    pub fn desc(&self) -> ResourceDesc {
        self.alloc.desc
    }

    #[must_use]
    pub fn pixel_type(&self) -> PixelType {
        self.alloc.desc.pixel_type()
    }

    #[must_use]
    pub fn channel_type(&self) -> DeviceChannelType {
        self.channel_type
    }

    #[must_use]
    pub fn extents(&self) -> Extents {
        self.alloc.desc.extents()
    }

    /// # Errors
    /// Backend transfer failures.
    pub fn read(&self) -> ComputeResult<Samples> {
        self.alloc.read()
    }

    /// # Errors
    /// `PixelTypeMismatch`, `TransferSizeMismatch` or backend failures.
    pub fn write(&self, samples: &Samples) -> ComputeResult<()> {
        self.alloc.write(samples)
    }

    /// # Errors
    /// Whatever the backend reports.
    pub fn release(self) -> ComputeResult<()> {
        self.alloc.release()
    }

    #[must_use]
    pub fn belongs_to(&self, ctx: &Context) -> bool {
        self.alloc.belongs_to(ctx)
    }

    pub(crate) fn arg(&self) -> KernelArg {
        KernelArg::Resource { id: self.alloc.id, desc: self.alloc.desc }
    }
}

impl fmt::Debug for DeviceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceImage")
            .field("id", &self.alloc.id)
            .field("channel_type", &self.channel_type)
            .field("extents", &self.extents())
            .finish_non_exhaustive()
    }
}

/// Handle to one compute backend. Cloning is cheap and shares the backend.
#[derive(Clone)]
pub struct Context {
    backend: Arc<dyn ComputeBackend>,
}

impl Context {
    #[must_use]
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self { backend }
    }

    /// Context on a fresh [`crate::CpuBackend`] with default limits.
    #[cfg(feature = "cpu")]
    #[must_use]
    pub fn cpu() -> Self {
        Self::new(Arc::new(crate::CpuBackend::new()))
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// # Errors
    /// `UnsupportedPixelType` for unmapped types, `AllocationFailed` from the
    /// backend.
    pub fn create_buffer(&self, pixel_type: PixelType, extents: Extents) -> ComputeResult<DeviceBuffer> {
        let native_type = to_native_type(pixel_type)?;
        let desc = ResourceDesc::new(ResourceKind::Buffer, pixel_type, extents)?;
        Ok(DeviceBuffer { alloc: Allocation::new(&self.backend, desc)?, native_type })
    }

    /// # Errors
    /// `UnsupportedPixelType` for unmapped types, `AllocationFailed` from the
    /// backend.
    pub fn create_image(&self, pixel_type: PixelType, extents: Extents) -> ComputeResult<DeviceImage> {
        let channel_type = to_device_type(pixel_type)?;
        let desc = ResourceDesc::new(ResourceKind::Image, pixel_type, extents)?;
        Ok(DeviceImage { alloc: Allocation::new(&self.backend, desc)?, channel_type })
    }

    /// Host image to a new device image of the same type and extents.
    ///
    /// # Errors
    /// Allocation or transfer failures.
    pub fn push(&self, host: &LogicalImage) -> ComputeResult<DeviceImage> {
        let image = self.create_image(host.pixel_type(), host.extents())?;
        image.write(host.samples())?;
        Ok(image)
    }

    /// Host image to a new device buffer of the same type and extents.
    ///
    /// # Errors
    /// Allocation or transfer failures.
    pub fn push_buffer(&self, host: &LogicalImage) -> ComputeResult<DeviceBuffer> {
        let buffer = self.create_buffer(host.pixel_type(), host.extents())?;
        buffer.write(host.samples())?;
        Ok(buffer)
    }

    /// Device image to a new host image.
    ///
    /// # Errors
    /// Transfer failures.
    pub fn pull(&self, image: &DeviceImage) -> ComputeResult<LogicalImage> {
        LogicalImage::from_samples(image.extents(), image.read()?)
    }

    /// Device buffer to a new host image.
    ///
    /// # Errors
    /// Transfer failures.
    pub fn pull_buffer(&self, buffer: &DeviceBuffer) -> ComputeResult<LogicalImage> {
        LogicalImage::from_samples(buffer.extents(), buffer.read()?)
    }

    /// Device-side copy from `src` into the existing resource `dst`.
    ///
    /// # Errors
    /// `PixelTypeMismatch` or `TransferSizeMismatch` when the resources are not
    /// layout compatible, or backend failures.
    pub fn copy(&self, src: &ResourceDesc, src_id: ResourceId, dst: &ResourceDesc, dst_id: ResourceId) -> ComputeResult<()> {
        if src.pixel_type() != dst.pixel_type() {
            return Err(ComputeError::PixelTypeMismatch {
                expected: dst.pixel_type(),
                actual: src.pixel_type(),
            });
        }
        if src.extents() != dst.extents() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: dst.extents().len(),
                actual: src.extents().len(),
            });
        }
        self.backend.copy(src_id, dst_id)
    }

    /// Buffer to a new image with the same type and extents, copied on device.
    ///
    /// # Errors
    /// Allocation or copy failures.
    pub fn buffer_to_image(&self, buffer: &DeviceBuffer) -> ComputeResult<DeviceImage> {
        let image = self.create_image(buffer.pixel_type(), buffer.extents())?;
        self.copy(&buffer.desc(), buffer.id(), &image.desc(), image.id())?;
        Ok(image)
    }

    /// Image to a new buffer with the same type and extents, copied on device.
    ///
    /// # Errors
    /// Allocation or copy failures.
    pub fn image_to_buffer(&self, image: &DeviceImage) -> ComputeResult<DeviceBuffer> {
        let buffer = self.create_buffer(image.pixel_type(), image.extents())?;
        self.copy(&image.desc(), image.id(), &buffer.desc(), buffer.id())?;
        Ok(buffer)
    }

    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.backend.live_resources()
    }

    #[must_use]
    pub fn total_allocations(&self) -> usize {
        self.backend.total_allocations()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("backend", &self.backend.name()).finish()
    }
}
