use crate::backend::{ComputeBackend, KernelArg, KernelOutput, ResourceDesc, ResourceId, ResourceKind};
use crate::config::BackendConfig;
use crate::image::LogicalImage;
use crate::kernels::{self, KernelArgs};
use crate::layout::Param;
use crate::samples::Samples;
use crate::{ComputeError, ComputeResult, Kernel};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy)]
struct Binding {
    id: ResourceId,
    desc: ResourceDesc,
    output: bool,
}

#[derive(Debug)]
struct Storage {
    desc: ResourceDesc,
    bytes: Vec<u8>,
}

/// Host-memory backend. Images and buffers are both plain byte vectors;
/// kernels run on decoded copies and their outputs are written back.
#[derive(Debug)]
pub struct CpuBackend {
    config: BackendConfig,
    resources: Mutex<HashMap<ResourceId, Storage>>,
    next_id: AtomicU64,
    allocations: AtomicUsize,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BackendConfig::default())
    }

    #[must_use]
    pub fn with_config(config: BackendConfig) -> Self {
        Self {
            config,
            resources: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            allocations: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn check_limits(&self, desc: &ResourceDesc) -> ComputeResult<()> {
        let extents = desc.extents();
        if desc.kind() == ResourceKind::Image {
            let largest = extents.width().max(extents.height()).max(extents.depth());
            if largest > self.config.max_image_extent {
                return Err(ComputeError::AllocationFailed(format!(
                    "image {extents} exceeds the maximum extent {}",
                    self.config.max_image_extent
                )));
            }
        }
        if desc.byte_len() > self.config.max_allocation_bytes {
            return Err(ComputeError::AllocationFailed(format!(
                "{} bytes exceed the allocation limit of {}",
                desc.byte_len(),
                self.config.max_allocation_bytes
            )));
        }
        Ok(())
    }

    /// Checks `args` against the kernel's signature and returns the bound
    /// resources in positional order along with the scalars.
    fn bind(kernel: &Kernel, args: &[KernelArg]) -> ComputeResult<(Vec<Binding>, Vec<f32>)> {
        let params = kernel.signature();
        let fail = |reason: String| ComputeError::KernelExecutionFailed { kernel: kernel.name(), reason };
        if params.len() != args.len() {
            return Err(fail(format!("expected {} arguments, got {}", params.len(), args.len())));
        }
        let mut resources = Vec::new();
        let mut scalars = Vec::new();
        for (position, (param, arg)) in params.iter().zip(args).enumerate() {
            match (param, arg) {
                (Param::Scalar, KernelArg::Scalar(value)) => scalars.push(*value),
                (Param::In(kind) | Param::Out(kind), KernelArg::Resource { id, desc }) if desc.kind() == *kind => {
                    resources.push(Binding { id: *id, desc: *desc, output: param.is_output() });
                }
                _ => return Err(fail(format!("argument {position} must be {param:?}, got {arg:?}"))),
            }
        }
        Ok((resources, scalars))
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn allocate(&self, desc: &ResourceDesc) -> ComputeResult<ResourceId> {
        self.check_limits(desc)?;
        let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let storage = Storage { desc: *desc, bytes: vec![0; desc.byte_len()] };
        self.resources.lock().insert(id, storage);
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    fn release(&self, id: ResourceId) -> ComputeResult<()> {
        self.resources
            .lock()
            .remove(&id)
            .map(drop)
            .ok_or(ComputeError::ResourceNotFound(id))
    }

    fn upload(&self, id: ResourceId, bytes: &[u8]) -> ComputeResult<()> {
        let mut resources = self.resources.lock();
        let storage = resources.get_mut(&id).ok_or(ComputeError::ResourceNotFound(id))?;
        if storage.bytes.len() != bytes.len() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: storage.bytes.len(),
                actual: bytes.len(),
            });
        }
        storage.bytes.copy_from_slice(bytes);
        Ok(())
    }

    fn download(&self, id: ResourceId) -> ComputeResult<Vec<u8>> {
        self.resources
            .lock()
            .get(&id)
            .map(|storage| storage.bytes.clone())
            .ok_or(ComputeError::ResourceNotFound(id))
    }

    fn copy(&self, src: ResourceId, dst: ResourceId) -> ComputeResult<()> {
        let mut resources = self.resources.lock();
        let bytes = resources
            .get(&src)
            .map(|storage| storage.bytes.clone())
            .ok_or(ComputeError::ResourceNotFound(src))?;
        let target = resources.get_mut(&dst).ok_or(ComputeError::ResourceNotFound(dst))?;
        if target.bytes.len() != bytes.len() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: target.bytes.len(),
                actual: bytes.len(),
            });
        }
        target.bytes = bytes;
        Ok(())
    }

    fn dispatch(&self, kernel: &Kernel, args: &[KernelArg]) -> ComputeResult<KernelOutput> {
        let (bound, scalars) = Self::bind(kernel, args)?;
        let images = {
            let resources = self.resources.lock();
            bound
                .iter()
                .map(|&Binding { id, desc, .. }| {
                    let storage = resources.get(&id).ok_or(ComputeError::ResourceNotFound(id))?;
                    if storage.desc != desc {
                        return Err(ComputeError::KernelExecutionFailed {
                            kernel: kernel.name(),
                            reason: format!("resource {id} does not match its descriptor"),
                        });
                    }
                    let samples = Samples::from_bytes(desc.pixel_type(), &storage.bytes)?;
                    LogicalImage::from_samples(desc.extents(), samples)
                })
                .collect::<ComputeResult<Vec<_>>>()?
        };
        tracing::debug!(kernel = kernel.name(), resources = images.len(), scalars = scalars.len(), "cpu dispatch");

        let mut kernel_args = KernelArgs::new(*kernel, images, scalars);
        let output = kernels::handler(*kernel)(&mut kernel_args)?;

        let mut resources = self.resources.lock();
        for (binding, image) in bound.iter().zip(kernel_args.into_resources()) {
            if !binding.output {
                continue;
            }
            let storage = resources
                .get_mut(&binding.id)
                .ok_or(ComputeError::ResourceNotFound(binding.id))?;
            storage.bytes = image.into_samples().to_bytes();
        }
        Ok(output)
    }

    fn live_resources(&self) -> usize {
        self.resources.lock().len()
    }

    fn total_allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }
}
