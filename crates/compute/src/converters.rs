//! Converters between host images and device resources.
//!
//! A [`ConverterRegistry`] maps an exact `(source type, target type)` pair to
//! a factory producing a [`Converter`] bound to a [`Context`]. Lookups never
//! fall back to related types: a pair that was not registered is
//! `NoConverterFound`.
//!
//! The process-wide registry is installed once with [`initialize`] and read
//! through [`global`] or [`convert`]. Code that wants isolation (tests, tools
//! with custom converters) can build and pass its own registry instead.

use crate::device::{Context, DeviceBuffer, DeviceImage};
use crate::image::{Hyperstack, LogicalImage};
use crate::{ComputeError, ComputeResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Converts values of `S` into `T`.
pub trait Converter<S, T>: Send + Sync {
    /// Produces a new `T` holding the contents of `source`.
    ///
    /// # Errors
    /// Allocation or transfer failures.
    fn convert(&self, source: &S) -> ComputeResult<T>;

    /// Overwrites the existing `target` with the contents of `source`.
    ///
    /// # Errors
    /// Shape or type mismatches between `source` and `target`, and transfer
    /// failures.
    fn convert_into(&self, source: &S, target: &mut T) -> ComputeResult<()>;
}

pub type ConverterFactory<S, T> =
    Arc<dyn Fn(&Context) -> ComputeResult<Box<dyn Converter<S, T>>> + Send + Sync>;

/// Readable names of a registered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConverterPair {
    pub source: &'static str,
    pub target: &'static str,
}

impl fmt::Display for ConverterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

type Key = (TypeId, TypeId);

struct Entry {
    pair: ConverterPair,
    // always a `ConverterFactory<S, T>` for the key's types
    factory: Box<dyn Any + Send + Sync>,
}

/// Last path segment of `T`'s name. Generic types keep their full name since
/// their parameters carry paths of their own.
fn short_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

fn key<S: 'static, T: 'static>() -> Key {
    (TypeId::of::<S>(), TypeId::of::<T>())
}

fn pair<S: 'static, T: 'static>() -> ConverterPair {
    ConverterPair { source: short_name::<S>(), target: short_name::<T>() }
}

#[derive(Default)]
pub struct ConverterRegistryBuilder {
    entries: HashMap<Key, Entry>,
}

impl ConverterRegistryBuilder {
    /// Adds a converter factory for `S -> T`.
    ///
    /// # Errors
    /// `DuplicateConverter` if the pair is already registered.
    pub fn register<S, T, F>(mut self, factory: F) -> ComputeResult<Self>
    where
        S: 'static,
        T: 'static,
        F: Fn(&Context) -> ComputeResult<Box<dyn Converter<S, T>>> + Send + Sync + 'static,
    {
        let pair = pair::<S, T>();
        if self.entries.contains_key(&key::<S, T>()) {
            return Err(ComputeError::DuplicateConverter { from: pair.source, to: pair.target });
        }
        let factory: ConverterFactory<S, T> = Arc::new(factory);
        self.entries.insert(key::<S, T>(), Entry { pair, factory: Box::new(factory) });
        tracing::debug!(%pair, "registered converter");
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ConverterRegistry {
        ConverterRegistry { entries: self.entries }
    }
}

pub struct ConverterRegistry {
    entries: HashMap<Key, Entry>,
}

impl ConverterRegistry {
    #[must_use]
    pub fn builder() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder::default()
    }

    /// Registry holding the six converters between [`LogicalImage`],
    /// [`DeviceBuffer`] and [`DeviceImage`].
    ///
    /// # Errors
    /// Only if the table below registers a pair twice.
    pub fn with_builtin() -> ComputeResult<Self> {
        Ok(Self::builder()
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceImage>>> {
                Ok(Box::new(HostToImage(ctx.clone())))
            })?
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceBuffer>>> {
                Ok(Box::new(HostToBuffer(ctx.clone())))
            })?
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<DeviceImage, LogicalImage>>> {
                Ok(Box::new(ImageToHost(ctx.clone())))
            })?
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<DeviceBuffer, LogicalImage>>> {
                Ok(Box::new(BufferToHost(ctx.clone())))
            })?
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<DeviceBuffer, DeviceImage>>> {
                Ok(Box::new(BufferToImage(ctx.clone())))
            })?
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<DeviceImage, DeviceBuffer>>> {
                Ok(Box::new(ImageToBuffer(ctx.clone())))
            })?
            .build())
    }

    /// Instantiates the converter registered for exactly `S -> T`.
    ///
    /// # Errors
    /// `NoConverterFound` if the pair is not registered,
    /// `ConverterInstantiationFailed` if its factory fails.
    pub fn get<S: 'static, T: 'static>(&self, ctx: &Context) -> ComputeResult<Box<dyn Converter<S, T>>> {
        let pair = pair::<S, T>();
        let entry = self
            .entries
            .get(&key::<S, T>())
            .ok_or(ComputeError::NoConverterFound { from: pair.source, to: pair.target })?;
        let failed = |reason: String| ComputeError::ConverterInstantiationFailed {
            from: pair.source,
            to: pair.target,
            reason,
        };
        let factory = entry
            .factory
            .downcast_ref::<ConverterFactory<S, T>>()
            .ok_or_else(|| failed("stored factory has a different shape".to_string()))?;
        factory(ctx).map_err(|e| failed(e.to_string()))
    }

    /// Converts `source` with the converter registered for `S -> T`.
    ///
    /// # Errors
    /// Lookup failures from [`ConverterRegistry::get`] and conversion failures.
    pub fn convert<S: 'static, T: 'static>(&self, ctx: &Context, source: &S) -> ComputeResult<T> {
        self.get::<S, T>(ctx)?.convert(source)
    }

    #[must_use]
    pub fn contains<S: 'static, T: 'static>(&self) -> bool {
        self.entries.contains_key(&key::<S, T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered pairs, sorted by name.
    #[must_use]
    pub fn pairs(&self) -> Vec<ConverterPair> {
        let mut pairs: Vec<_> = self.entries.values().map(|entry| entry.pair).collect();
        pairs.sort();
        pairs
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry").field("pairs", &self.pairs()).finish()
    }
}

static GLOBAL: OnceLock<ConverterRegistry> = OnceLock::new();

/// Installs the process-wide registry.
///
/// # Errors
/// `RegistryAlreadyInitialized` on every call after the first.
pub fn initialize(registry: ConverterRegistry) -> ComputeResult<()> {
    let pairs = registry.len();
    GLOBAL
        .set(registry)
        .map_err(|_| ComputeError::RegistryAlreadyInitialized)?;
    tracing::info!(pairs, "converter registry initialized");
    Ok(())
}

/// The process-wide registry.
///
/// # Errors
/// `RegistryNotInitialized` before [`initialize`] has been called.
pub fn global() -> ComputeResult<&'static ConverterRegistry> {
    GLOBAL.get().ok_or(ComputeError::RegistryNotInitialized)
}

/// Converts `source` to `T` through the process-wide registry.
///
/// # Errors
/// `RegistryNotInitialized`, lookup failures and conversion failures.
pub fn convert<S: 'static, T: 'static>(ctx: &Context, source: &S) -> ComputeResult<T> {
    global()?.convert(ctx, source)
}

fn check_shape(
    expected: (crate::PixelType, crate::Extents),
    actual: (crate::PixelType, crate::Extents),
) -> ComputeResult<()> {
    if expected.0 != actual.0 {
        return Err(ComputeError::PixelTypeMismatch { expected: expected.0, actual: actual.0 });
    }
    if expected.1 != actual.1 {
        return Err(ComputeError::TransferSizeMismatch {
            expected: expected.1.len(),
            actual: actual.1.len(),
        });
    }
    Ok(())
}

/// Uploads a host image into a new device image.
pub struct HostToImage(pub Context);

impl Converter<LogicalImage, DeviceImage> for HostToImage {
    fn convert(&self, source: &LogicalImage) -> ComputeResult<DeviceImage> {
        self.0.push(source)
    }

    fn convert_into(&self, source: &LogicalImage, target: &mut DeviceImage) -> ComputeResult<()> {
        check_shape(
            (target.pixel_type(), target.extents()),
            (source.pixel_type(), source.extents()),
        )?;
        target.write(source.samples())
    }
}

/// Uploads a host image into a new device buffer.
pub struct HostToBuffer(pub Context);

impl Converter<LogicalImage, DeviceBuffer> for HostToBuffer {
    fn convert(&self, source: &LogicalImage) -> ComputeResult<DeviceBuffer> {
        self.0.push_buffer(source)
    }

    fn convert_into(&self, source: &LogicalImage, target: &mut DeviceBuffer) -> ComputeResult<()> {
        check_shape(
            (target.pixel_type(), target.extents()),
            (source.pixel_type(), source.extents()),
        )?;
        target.write(source.samples())
    }
}

/// Reads a device image back to the host.
pub struct ImageToHost(pub Context);

impl Converter<DeviceImage, LogicalImage> for ImageToHost {
    fn convert(&self, source: &DeviceImage) -> ComputeResult<LogicalImage> {
        self.0.pull(source)
    }

    fn convert_into(&self, source: &DeviceImage, target: &mut LogicalImage) -> ComputeResult<()> {
        check_shape(
            (target.pixel_type(), target.extents()),
            (source.pixel_type(), source.extents()),
        )?;
        target.replace_samples(source.read()?)
    }
}

/// Reads a device buffer back to the host.
pub struct BufferToHost(pub Context);

impl Converter<DeviceBuffer, LogicalImage> for BufferToHost {
    fn convert(&self, source: &DeviceBuffer) -> ComputeResult<LogicalImage> {
        self.0.pull_buffer(source)
    }

    fn convert_into(&self, source: &DeviceBuffer, target: &mut LogicalImage) -> ComputeResult<()> {
        check_shape(
            (target.pixel_type(), target.extents()),
            (source.pixel_type(), source.extents()),
        )?;
        target.replace_samples(source.read()?)
    }
}

/// Device-side buffer to image copy.
pub struct BufferToImage(pub Context);

impl Converter<DeviceBuffer, DeviceImage> for BufferToImage {
    fn convert(&self, source: &DeviceBuffer) -> ComputeResult<DeviceImage> {
        self.0.buffer_to_image(source)
    }

    fn convert_into(&self, source: &DeviceBuffer, target: &mut DeviceImage) -> ComputeResult<()> {
        self.0.copy(&source.desc(), source.id(), &target.desc(), target.id())
    }
}

/// Device-side image to buffer copy.
pub struct ImageToBuffer(pub Context);

impl Converter<DeviceImage, DeviceBuffer> for ImageToBuffer {
    fn convert(&self, source: &DeviceImage) -> ComputeResult<DeviceBuffer> {
        self.0.image_to_buffer(source)
    }

    fn convert_into(&self, source: &DeviceImage, target: &mut DeviceBuffer) -> ComputeResult<()> {
        self.0.copy(&source.desc(), source.id(), &target.desc(), target.id())
    }
}

#[cfg(all(test, feature = "cpu"))]
mod tests {
    use super::*;
    use crate::image::PlaneIndex;
    use crate::types::PixelType;

    fn ramp() -> LogicalImage {
        let mut image = LogicalImage::stack(PixelType::SignedInt16, 5, 4, 2).unwrap();
        for (i, at) in [PlaneIndex::slice(0), PlaneIndex::slice(1)].into_iter().enumerate() {
            for y in 0..4 {
                for x in 0..5 {
                    image.set(at, x, y, (x as f64 - y as f64) * (i as f64 + 1.0) * 100.0);
                }
            }
        }
        image
    }

    #[test]
    fn generic_types_are_named_in_full() {
        let registry = ConverterRegistry::builder().build();
        let err = registry.get::<Vec<u8>, LogicalImage>(&Context::cpu()).err().unwrap();
        match err {
            ComputeError::NoConverterFound { from, to } => {
                assert_eq!(from, std::any::type_name::<Vec<u8>>());
                assert_eq!(to, "LogicalImage");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn builtin_table_has_six_pairs() {
        let registry = ConverterRegistry::with_builtin().unwrap();
        assert_eq!(registry.len(), 6);
        assert!(registry.contains::<LogicalImage, DeviceImage>());
        assert!(registry.contains::<DeviceImage, DeviceBuffer>());
        assert!(!registry.contains::<LogicalImage, LogicalImage>());
        assert!(registry
            .pairs()
            .contains(&ConverterPair { source: "DeviceBuffer", target: "LogicalImage" }));
    }

    #[test]
    fn every_route_preserves_content() {
        let registry = ConverterRegistry::with_builtin().unwrap();
        let ctx = Context::cpu();
        let host = ramp();

        let image: DeviceImage = registry.convert(&ctx, &host).unwrap();
        let buffer: DeviceBuffer = registry.convert(&ctx, &image).unwrap();
        let image2: DeviceImage = registry.convert(&ctx, &buffer).unwrap();
        let from_buffer: LogicalImage = registry.convert(&ctx, &buffer).unwrap();
        let from_image: LogicalImage = registry.convert(&ctx, &image2).unwrap();

        assert_eq!(from_buffer, host);
        assert_eq!(from_image, host);
    }

    #[test]
    fn lookup_is_exact() {
        let registry = ConverterRegistry::builder()
            .register(|ctx: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceImage>>> {
                Ok(Box::new(HostToImage(ctx.clone())))
            })
            .unwrap()
            .build();
        let ctx = Context::cpu();
        assert!(registry.get::<LogicalImage, DeviceImage>(&ctx).is_ok());
        let err = registry.get::<LogicalImage, DeviceBuffer>(&ctx).err().unwrap();
        assert!(matches!(
            err,
            ComputeError::NoConverterFound { from: "LogicalImage", to: "DeviceBuffer" }
        ));
        // the reverse direction is a different key
        assert!(registry.get::<DeviceImage, LogicalImage>(&ctx).is_err());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let factory = |ctx: &Context| -> ComputeResult<Box<dyn Converter<DeviceImage, LogicalImage>>> {
            Ok(Box::new(ImageToHost(ctx.clone())))
        };
        let result = ConverterRegistry::builder()
            .register(factory)
            .and_then(|builder| builder.register(factory));
        assert!(matches!(
            result.err(),
            Some(ComputeError::DuplicateConverter { from: "DeviceImage", to: "LogicalImage" })
        ));
    }

    #[test]
    fn failing_factory_reports_instantiation_failure() {
        let registry = ConverterRegistry::builder()
            .register(|_: &Context| -> ComputeResult<Box<dyn Converter<LogicalImage, DeviceImage>>> {
                Err(ComputeError::BackendUnavailable("images are not supported".to_string()))
            })
            .unwrap()
            .build();
        let err = registry.get::<LogicalImage, DeviceImage>(&Context::cpu()).err().unwrap();
        match err {
            ComputeError::ConverterInstantiationFailed { from, to, reason } => {
                assert_eq!((from, to), ("LogicalImage", "DeviceImage"));
                assert!(reason.contains("images are not supported"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn convert_into_rejects_other_shapes() {
        let registry = ConverterRegistry::with_builtin().unwrap();
        let ctx = Context::cpu();
        let image: DeviceImage = registry.convert(&ctx, &ramp()).unwrap();
        let mut small = LogicalImage::stack(PixelType::SignedInt16, 2, 2, 1).unwrap();
        let converter = registry.get::<DeviceImage, LogicalImage>(&ctx).unwrap();
        assert!(matches!(
            converter.convert_into(&image, &mut small),
            Err(ComputeError::TransferSizeMismatch { .. })
        ));
        let mut other_type = LogicalImage::new(PixelType::Float32, image.extents());
        assert!(matches!(
            converter.convert_into(&image, &mut other_type),
            Err(ComputeError::PixelTypeMismatch { .. })
        ));
    }

    #[test]
    fn global_registry_is_write_once() {
        // another test may already have installed it
        let _ = initialize(ConverterRegistry::with_builtin().unwrap());
        assert!(matches!(
            initialize(ConverterRegistry::with_builtin().unwrap()),
            Err(ComputeError::RegistryAlreadyInitialized)
        ));
        let ctx = Context::cpu();
        let image: DeviceImage = convert(&ctx, &ramp()).unwrap();
        assert_eq!(convert::<DeviceImage, LogicalImage>(&ctx, &image).unwrap(), ramp());
    }
}
