//! Kernel dispatch over whatever representation the caller holds.
//!
//! Each kernel position wants a buffer, an image or a scalar. Operands that
//! already have the wanted kind are passed through untouched. Anything else is
//! converted into a temporary through the converter registry, and outputs held
//! in another representation are copied back once the kernel has returned,
//! successfully or not.
//! Temporaries live in a per-call scratch list and are released on every exit
//! path.

use crate::backend::{KernelArg, KernelOutput, ResourceKind};
use crate::converters::{self, ConverterRegistry};
use crate::device::{Context, DeviceBuffer, DeviceImage};
use crate::image::LogicalImage;
use crate::layout::Param;
use crate::{ComputeError, ComputeResult, Kernel};

/// One positional kernel operand. The `*Out` variants mark operands the
/// kernel may write.
#[derive(Debug)]
pub enum Operand<'a> {
    Host(&'a LogicalImage),
    HostOut(&'a mut LogicalImage),
    Buffer(&'a DeviceBuffer),
    BufferOut(&'a mut DeviceBuffer),
    Image(&'a DeviceImage),
    ImageOut(&'a mut DeviceImage),
    Scalar(f32),
}

#[derive(Clone, Copy)]
enum Held<'b> {
    Host(&'b LogicalImage),
    Buffer(&'b DeviceBuffer),
    Image(&'b DeviceImage),
}

impl Operand<'_> {
    fn held(&self) -> Option<Held<'_>> {
        match self {
            Operand::Host(host) => Some(Held::Host(host)),
            Operand::HostOut(host) => Some(Held::Host(host)),
            Operand::Buffer(buffer) => Some(Held::Buffer(buffer)),
            Operand::BufferOut(buffer) => Some(Held::Buffer(buffer)),
            Operand::Image(image) => Some(Held::Image(image)),
            Operand::ImageOut(image) => Some(Held::Image(image)),
            Operand::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self, Operand::HostOut(_) | Operand::BufferOut(_) | Operand::ImageOut(_))
    }
}

enum Resource {
    Buffer(DeviceBuffer),
    Image(DeviceImage),
}

impl Resource {
    fn arg(&self) -> KernelArg {
        match self {
            Resource::Buffer(buffer) => buffer.arg(),
            Resource::Image(image) => image.arg(),
        }
    }

    fn release(self) -> ComputeResult<()> {
        match self {
            Resource::Buffer(buffer) => buffer.release(),
            Resource::Image(image) => image.release(),
        }
    }
}

/// A temporary created for operand `operand`.
struct Temporary {
    operand: usize,
    output: bool,
    resource: Resource,
}

/// Runs kernels on a [`Context`], converting operands with a
/// [`ConverterRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher<'r> {
    ctx: Context,
    registry: &'r ConverterRegistry,
}

impl Dispatcher<'static> {
    /// Dispatcher using the process-wide registry.
    ///
    /// # Errors
    /// `RegistryNotInitialized` before [`converters::initialize`].
    pub fn new(ctx: Context) -> ComputeResult<Self> {
        Ok(Self { ctx, registry: converters::global()? })
    }
}

impl<'r> Dispatcher<'r> {
    #[must_use]
    pub fn with_registry(ctx: Context, registry: &'r ConverterRegistry) -> Self {
        Self { ctx, registry }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Runs `kernel` on `operands`.
    ///
    /// Converted outputs are copied back into the caller's operands after the
    /// kernel returns, whether it succeeded or not. Temporaries are released
    /// on every path.
    ///
    /// # Errors
    /// - `ArityMismatch`, `OperandMismatch` or `DispatchConversionFailed`
    ///   when the operands cannot be prepared; the kernel does not run.
    /// - Backend errors from the kernel itself, unchanged. Copy-back and
    ///   cleanup failures behind a kernel error are only logged.
    /// - `CopyBackFailed` if a result cannot be written back.
    /// - `CleanupFailed` if a temporary could not be released and nothing
    ///   failed before it.
    pub fn dispatch(&self, kernel: Kernel, operands: &mut [Operand<'_>]) -> ComputeResult<KernelOutput> {
        let params = kernel.signature();
        if operands.len() != params.len() {
            return Err(ComputeError::ArityMismatch {
                kernel: kernel.name(),
                expected: params.len(),
                actual: operands.len(),
            });
        }

        for (index, (param, operand)) in params.iter().zip(operands.iter()).enumerate() {
            self.check(kernel, index, *param, operand)?;
        }

        // dropping `scratch` on an early return releases what was created so far
        let mut scratch = Vec::new();
        let mut args = Vec::with_capacity(params.len());
        for (index, (param, operand)) in params.iter().zip(operands.iter()).enumerate() {
            args.push(self.prepare(kernel, index, *param, operand, &mut scratch)?);
        }
        tracing::debug!(kernel = kernel.name(), temporaries = scratch.len(), "dispatching kernel");

        let result = self.ctx.backend().dispatch(&kernel, &args);
        if let Err(e) = &result {
            tracing::debug!(kernel = kernel.name(), "kernel failed, copying outputs back anyway: {e}");
        }
        let copied = self.copy_back(kernel, &scratch, operands);
        let cleanup = release_all(kernel, scratch);

        // the kernel error wins, then copy-back, then cleanup
        let mut secondary = [copied, cleanup].into_iter().filter_map(Result::err);
        match result {
            Err(e) => {
                for masked in secondary {
                    tracing::warn!(kernel = kernel.name(), "{masked}");
                }
                Err(e)
            }
            Ok(output) => match secondary.next() {
                Some(e) => {
                    for masked in secondary {
                        tracing::warn!(kernel = kernel.name(), "{masked}");
                    }
                    Err(e)
                }
                None => Ok(output),
            },
        }
    }

    /// Rejects operands that no conversion could make fit `param`.
    fn check(&self, kernel: Kernel, index: usize, param: Param, operand: &Operand<'_>) -> ComputeResult<()> {
        let mismatch = |expected: String| ComputeError::OperandMismatch {
            kernel: kernel.name(),
            operand: index,
            expected,
        };
        let Some(kind) = param.resource_kind() else {
            return match operand {
                Operand::Scalar(_) => Ok(()),
                _ => Err(mismatch("a scalar".to_string())),
            };
        };
        let Some(held) = operand.held() else {
            return Err(mismatch(format!("a {kind} or convertible resource")));
        };
        if param.is_output() && !operand.is_writable() {
            return Err(mismatch("a writable operand".to_string()));
        }
        let foreign = match held {
            Held::Host(_) => false,
            Held::Buffer(buffer) => !buffer.belongs_to(&self.ctx),
            Held::Image(image) => !image.belongs_to(&self.ctx),
        };
        if foreign {
            return Err(mismatch("a resource of the dispatching context".to_string()));
        }
        Ok(())
    }

    /// Argument for a checked operand, converting it into a temporary if its
    /// kind differs from the one `param` wants.
    fn prepare(
        &self,
        kernel: Kernel,
        index: usize,
        param: Param,
        operand: &Operand<'_>,
        scratch: &mut Vec<Temporary>,
    ) -> ComputeResult<KernelArg> {
        let (Some(kind), Some(held)) = (param.resource_kind(), operand.held()) else {
            return match operand {
                Operand::Scalar(value) => Ok(KernelArg::Scalar(*value)),
                _ => Err(ComputeError::OperandMismatch {
                    kernel: kernel.name(),
                    operand: index,
                    expected: "a scalar".to_string(),
                }),
            };
        };

        let converted = match (kind, held) {
            (ResourceKind::Buffer, Held::Buffer(buffer)) => return Ok(buffer.arg()),
            (ResourceKind::Image, Held::Image(image)) => return Ok(image.arg()),
            (ResourceKind::Buffer, Held::Host(host)) => self
                .coerce::<LogicalImage, DeviceBuffer>(host, param.is_output())
                .map(Resource::Buffer),
            (ResourceKind::Buffer, Held::Image(image)) => self
                .coerce::<DeviceImage, DeviceBuffer>(image, param.is_output())
                .map(Resource::Buffer),
            (ResourceKind::Image, Held::Host(host)) => self
                .coerce::<LogicalImage, DeviceImage>(host, param.is_output())
                .map(Resource::Image),
            (ResourceKind::Image, Held::Buffer(buffer)) => self
                .coerce::<DeviceBuffer, DeviceImage>(buffer, param.is_output())
                .map(Resource::Image),
        };
        let resource = converted.map_err(|source| ComputeError::DispatchConversionFailed {
            kernel: kernel.name(),
            operand: index,
            source: Box::new(source),
        })?;
        tracing::debug!(kernel = kernel.name(), operand = index, %kind, "converted operand");
        let arg = resource.arg();
        scratch.push(Temporary { operand: index, output: param.is_output(), resource });
        Ok(arg)
    }

    /// Converts `source` into a temporary `T`. For outputs the reverse
    /// converter must exist too, so a missing one fails before the kernel runs.
    fn coerce<S: 'static, T: 'static>(&self, source: &S, output: bool) -> ComputeResult<T> {
        if output {
            self.registry.get::<T, S>(&self.ctx)?;
        }
        self.registry.convert::<S, T>(&self.ctx, source)
    }

    fn copy_back(&self, kernel: Kernel, scratch: &[Temporary], operands: &mut [Operand<'_>]) -> ComputeResult<()> {
        for temp in scratch.iter().filter(|temp| temp.output) {
            let result = match (&temp.resource, &mut operands[temp.operand]) {
                (Resource::Buffer(buffer), Operand::HostOut(host)) => self
                    .registry
                    .get::<DeviceBuffer, LogicalImage>(&self.ctx)
                    .and_then(|converter| converter.convert_into(buffer, host)),
                (Resource::Image(image), Operand::HostOut(host)) => self
                    .registry
                    .get::<DeviceImage, LogicalImage>(&self.ctx)
                    .and_then(|converter| converter.convert_into(image, host)),
                (Resource::Buffer(buffer), Operand::ImageOut(target)) => self
                    .registry
                    .get::<DeviceBuffer, DeviceImage>(&self.ctx)
                    .and_then(|converter| converter.convert_into(buffer, target)),
                (Resource::Image(image), Operand::BufferOut(target)) => self
                    .registry
                    .get::<DeviceImage, DeviceBuffer>(&self.ctx)
                    .and_then(|converter| converter.convert_into(image, target)),
                _ => Err(ComputeError::OperandMismatch {
                    kernel: kernel.name(),
                    operand: temp.operand,
                    expected: "a writable operand".to_string(),
                }),
            };
            result.map_err(|source| ComputeError::CopyBackFailed {
                kernel: kernel.name(),
                operand: temp.operand,
                source: Box::new(source),
            })?;
            tracing::debug!(kernel = kernel.name(), operand = temp.operand, "copied output back");
        }
        Ok(())
    }
}

/// Releases every temporary, reporting the first failure.
fn release_all(kernel: Kernel, scratch: Vec<Temporary>) -> ComputeResult<()> {
    let mut failed = 0;
    let mut first = None;
    for temp in scratch {
        if let Err(e) = temp.resource.release() {
            tracing::warn!(kernel = kernel.name(), operand = temp.operand, "failed to release temporary: {e}");
            failed += 1;
            first.get_or_insert(e);
        }
    }
    match first {
        None => Ok(()),
        Some(source) => Err(ComputeError::CleanupFailed {
            kernel: kernel.name(),
            failed,
            source: Box::new(source),
        }),
    }
}

#[cfg(all(test, feature = "cpu"))]
mod tests {
    use super::*;
    use crate::backend::{ComputeBackend, ResourceDesc, ResourceId};
    use crate::converters::{Converter, HostToImage};
    use crate::image::{Extents, Hyperstack, PlaneIndex};
    use crate::types::PixelType;
    use crate::CpuBackend;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// CPU backend whose kernels or releases can be made to fail.
    #[derive(Default)]
    struct Flaky {
        inner: CpuBackend,
        fail_kernels: AtomicBool,
        fail_after_run: AtomicBool,
        fail_releases: AtomicBool,
    }

    impl ComputeBackend for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }
        fn allocate(&self, desc: &ResourceDesc) -> ComputeResult<ResourceId> {
            self.inner.allocate(desc)
        }
        fn release(&self, id: ResourceId) -> ComputeResult<()> {
            // the resource is freed either way, only the report differs
            self.inner.release(id)?;
            if self.fail_releases.load(Ordering::SeqCst) {
                return Err(ComputeError::BackendUnavailable("release lost".to_string()));
            }
            Ok(())
        }
        fn upload(&self, id: ResourceId, bytes: &[u8]) -> ComputeResult<()> {
            self.inner.upload(id, bytes)
        }
        fn download(&self, id: ResourceId) -> ComputeResult<Vec<u8>> {
            self.inner.download(id)
        }
        fn copy(&self, src: ResourceId, dst: ResourceId) -> ComputeResult<()> {
            self.inner.copy(src, dst)
        }
        fn dispatch(&self, kernel: &Kernel, args: &[KernelArg]) -> ComputeResult<KernelOutput> {
            if self.fail_kernels.load(Ordering::SeqCst) {
                return Err(ComputeError::KernelExecutionFailed {
                    kernel: kernel.name(),
                    reason: "device lost".to_string(),
                });
            }
            let output = self.inner.dispatch(kernel, args)?;
            if self.fail_after_run.load(Ordering::SeqCst) {
                return Err(ComputeError::KernelExecutionFailed {
                    kernel: kernel.name(),
                    reason: "lost after writing outputs".to_string(),
                });
            }
            Ok(output)
        }
        fn live_resources(&self) -> usize {
            self.inner.live_resources()
        }
        fn total_allocations(&self) -> usize {
            self.inner.total_allocations()
        }
    }

    fn flaky() -> (Arc<Flaky>, Context) {
        let backend = Arc::new(Flaky::default());
        let ctx = Context::new(backend.clone());
        (backend, ctx)
    }

    fn filled(value: f64) -> LogicalImage {
        let mut image = LogicalImage::stack(PixelType::Float32, 4, 3, 2).unwrap();
        image.fill(value);
        image
    }

    #[test]
    fn device_operands_pass_through() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let a = ctx.push(&filled(1.0)).unwrap();
        let b = ctx.push(&filled(2.0)).unwrap();
        let mut out = ctx.create_image(PixelType::Float32, a.extents()).unwrap();
        let before = ctx.total_allocations();

        Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(
                Kernel::AddPixelwise,
                &mut [Operand::Image(&a), Operand::Image(&b), Operand::ImageOut(&mut out)],
            )
            .unwrap();

        assert_eq!(ctx.total_allocations(), before);
        assert_eq!(ctx.pull(&out).unwrap(), filled(3.0));
    }

    #[test]
    fn host_operands_are_converted_and_released() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let mut sum = filled(0.0);

        Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(
                Kernel::AddPixelwise,
                &mut [
                    Operand::Host(&filled(1.5)),
                    Operand::Host(&filled(2.0)),
                    Operand::HostOut(&mut sum),
                ],
            )
            .unwrap();

        assert_eq!(sum, filled(3.5));
        assert_eq!(ctx.total_allocations(), 3);
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn image_kernel_writes_back_into_a_buffer() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let src = ctx.push_buffer(&filled(4.0)).unwrap();
        let mut dst = ctx.create_buffer(PixelType::Float32, src.extents()).unwrap();

        Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(
                Kernel::MultiplyScalar,
                &mut [Operand::Buffer(&src), Operand::BufferOut(&mut dst), Operand::Scalar(0.5)],
            )
            .unwrap();

        assert_eq!(ctx.pull_buffer(&dst).unwrap(), filled(2.0));
        assert_eq!(ctx.live_resources(), 2);
    }

    #[test]
    fn buffer_kernels_accept_host_images() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let dispatcher = Dispatcher::with_registry(ctx.clone(), &registry);
        let mut image = filled(0.0);

        dispatcher
            .dispatch(Kernel::Set, &mut [Operand::HostOut(&mut image), Operand::Scalar(7.0)])
            .unwrap();
        let sum = dispatcher
            .dispatch(Kernel::SumPixels, &mut [Operand::Host(&image)])
            .unwrap();

        assert_eq!(image, filled(7.0));
        assert_eq!(sum.scalar(), Some(7.0 * 24.0));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn kernel_failure_is_returned_unchanged_and_cleans_up() {
        let (backend, ctx) = flaky();
        backend.fail_kernels.store(true, Ordering::SeqCst);
        let registry = ConverterRegistry::with_builtin().unwrap();
        let mut out = filled(9.0);

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Host(&filled(1.0)), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::KernelExecutionFailed { kernel: "copy", .. }));
        assert!(!err.is_preparation_failure());
        // the temporary still held the caller's contents
        assert_eq!(out, filled(9.0));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn outputs_are_copied_back_after_a_failed_kernel() {
        let (backend, ctx) = flaky();
        backend.fail_after_run.store(true, Ordering::SeqCst);
        let registry = ConverterRegistry::with_builtin().unwrap();
        let mut out = filled(9.0);

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Host(&filled(1.0)), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::KernelExecutionFailed { kernel: "copy", .. }));
        assert_eq!(out, filled(1.0));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn kernel_error_takes_precedence_over_cleanup() {
        let (backend, ctx) = flaky();
        backend.fail_after_run.store(true, Ordering::SeqCst);
        backend.fail_releases.store(true, Ordering::SeqCst);
        let registry = ConverterRegistry::with_builtin().unwrap();
        let mut out = filled(0.0);

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Host(&filled(2.0)), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::KernelExecutionFailed { .. }));
        assert_eq!(out, filled(2.0));
    }

    #[test]
    fn conversion_failure_releases_earlier_temporaries() {
        let ctx = Context::cpu();
        // host images convert, device buffers do not
        let registry = ConverterRegistry::builder()
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceImage>>> {
                Ok(Box::new(HostToImage(ctx.clone())))
            })
            .unwrap()
            .build();
        let b = ctx.push_buffer(&filled(1.0)).unwrap();
        let mut out = ctx.create_image(PixelType::Float32, b.extents()).unwrap();

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(
                Kernel::AddPixelwise,
                &mut [Operand::Host(&filled(1.0)), Operand::Buffer(&b), Operand::ImageOut(&mut out)],
            )
            .unwrap_err();

        match &err {
            ComputeError::DispatchConversionFailed { operand, source, .. } => {
                assert_eq!(*operand, 1);
                assert!(matches!(**source, ComputeError::NoConverterFound { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.is_preparation_failure());
        // only `b` and `out` remain
        assert_eq!(ctx.live_resources(), 2);
    }

    #[test]
    fn missing_copy_back_converter_fails_before_the_kernel() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::builder()
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceImage>>> {
                Ok(Box::new(HostToImage(ctx.clone())))
            })
            .unwrap()
            .build();
        let mut out = filled(5.0);

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Host(&filled(1.0)), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::DispatchConversionFailed { operand: 1, .. }));
        assert_eq!(out, filled(5.0));
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn cleanup_failure_is_reported_after_success() {
        let (backend, ctx) = flaky();
        backend.fail_releases.store(true, Ordering::SeqCst);
        let registry = ConverterRegistry::with_builtin().unwrap();
        let mut out = filled(0.0);

        let err = Dispatcher::with_registry(ctx.clone(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Host(&filled(6.0)), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::CleanupFailed { kernel: "copy", failed: 2, .. }));
        assert_eq!(out, filled(6.0));
    }

    #[test]
    fn operands_are_checked_against_the_signature() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let dispatcher = Dispatcher::with_registry(ctx.clone(), &registry);
        let a = filled(1.0);

        let err = dispatcher.dispatch(Kernel::Copy, &mut [Operand::Host(&a)]).unwrap_err();
        assert!(matches!(err, ComputeError::ArityMismatch { expected: 2, actual: 1, .. }));

        let err = dispatcher
            .dispatch(Kernel::Copy, &mut [Operand::Host(&a), Operand::Host(&a)])
            .unwrap_err();
        assert!(matches!(err, ComputeError::OperandMismatch { operand: 1, .. }));

        let mut out = filled(0.0);
        let err = dispatcher
            .dispatch(Kernel::AddScalar, &mut [Operand::Scalar(1.0), Operand::HostOut(&mut out), Operand::Scalar(1.0)])
            .unwrap_err();
        assert!(matches!(err, ComputeError::OperandMismatch { operand: 0, .. }));

        let err = dispatcher
            .dispatch(Kernel::Set, &mut [Operand::HostOut(&mut out), Operand::Host(&a)])
            .unwrap_err();
        assert!(matches!(err, ComputeError::OperandMismatch { operand: 1, .. }));
        assert_eq!(ctx.total_allocations(), 0);
    }

    #[test]
    fn resources_of_another_context_are_rejected() {
        let registry = ConverterRegistry::with_builtin().unwrap();
        let other = Context::cpu();
        let foreign = other.push(&filled(1.0)).unwrap();
        let mut out = filled(0.0);

        let err = Dispatcher::with_registry(Context::cpu(), &registry)
            .dispatch(Kernel::Copy, &mut [Operand::Image(&foreign), Operand::HostOut(&mut out)])
            .unwrap_err();

        assert!(matches!(err, ComputeError::OperandMismatch { operand: 0, .. }));
    }

    #[test]
    fn copy_slice_output_keeps_untouched_slices() {
        let ctx = Context::cpu();
        let registry = ConverterRegistry::with_builtin().unwrap();
        let plane = {
            let mut plane = LogicalImage::stack(PixelType::Float32, 4, 3, 1).unwrap();
            plane.fill(8.0);
            plane
        };
        let mut stack = filled(1.0);

        Dispatcher::with_registry(ctx, &registry)
            .dispatch(
                Kernel::CopySlice,
                &mut [Operand::Host(&plane), Operand::HostOut(&mut stack), Operand::Scalar(1.0)],
            )
            .unwrap();

        assert_eq!(stack.get(PlaneIndex::slice(0), 2, 2), 1.0);
        assert_eq!(stack.get(PlaneIndex::slice(1), 2, 2), 8.0);
        assert_eq!(stack.extents(), Extents::volume(4, 3, 2).unwrap());
    }
}
