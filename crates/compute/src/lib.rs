#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
//! # imgcompute
//!
//! Type-safe conversion between host pixel data and device resources, and a
//! kernel dispatch layer that accepts whichever representation the caller
//! holds.
//!
//! ## Key Components
//!
//! -   **Type mapping:** [`types`] maps host [`PixelType`]s to device
//!     [`DeviceChannelType`]s and buffer [`NativeType`]s.
//! -   **Converters:** [`converters::ConverterRegistry`] holds converters
//!     keyed by exact `(source, target)` type pairs.
//! -   **Dispatch:** [`dispatch::Dispatcher`] coerces operands to the
//!     resource kind a [`Kernel`] requires, copies outputs back and always
//!     releases the temporaries it created.
//! -   **Oracle:** [`oracle::compare`] checks two hyperstacks for pixel-exact
//!     equality and reports the first difference.
//!
//! ```rust,ignore
//! use imgcompute::{converters, dispatch::{Dispatcher, Operand}, Context, Kernel};
//!
//! converters::initialize(converters::ConverterRegistry::with_builtin()?)?;
//! let ctx = Context::cpu();
//! let dispatcher = Dispatcher::new(ctx)?;
//! dispatcher.dispatch(
//!     Kernel::AddPixelwise,
//!     &mut [Operand::Host(&a), Operand::Host(&b), Operand::HostOut(&mut sum)],
//! )?;
//! ```

pub mod backend;
pub mod config;
pub mod converters;
pub mod device;
pub mod dispatch;
pub mod image;
pub mod layout;
pub mod oracle;
pub mod samples;
pub mod types;

#[cfg(feature = "cpu")]
pub mod cpu_backend;
#[cfg(feature = "cpu")]
pub mod kernels;

pub use backend::{ComputeBackend, KernelArg, KernelOutput, ResourceDesc, ResourceId, ResourceKind};
pub use config::{BackendConfig, BackendKind};
pub use device::{Context, DeviceBuffer, DeviceImage};
pub use image::{Axis, Extents, Hyperstack, LogicalImage, Plane, PlaneIndex};
pub use oracle::{Comparison, Coordinate, Mismatch};
pub use samples::Samples;
pub use types::{DeviceChannelType, NativeType, PixelType};

#[cfg(feature = "cpu")]
pub use cpu_backend::CpuBackend;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("unsupported pixel type: {0}")]
    UnsupportedPixelType(String),
    #[error("invalid extents: {0}")]
    InvalidExtents(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no converter found from {from} to {to}")]
    NoConverterFound { from: &'static str, to: &'static str },
    #[error("couldn't instantiate converter from {from} to {to}: {reason}")]
    ConverterInstantiationFailed {
        from: &'static str,
        to: &'static str,
        reason: String,
    },
    #[error("a converter from {from} to {to} is already registered")]
    DuplicateConverter { from: &'static str, to: &'static str },
    #[error("converter registry already initialized")]
    RegistryAlreadyInitialized,
    #[error("converter registry not initialized")]
    RegistryNotInitialized,

    #[error("{kernel}: could not prepare operand {operand}")]
    DispatchConversionFailed {
        kernel: &'static str,
        operand: usize,
        #[source]
        source: Box<ComputeError>,
    },
    #[error("{kernel}: could not copy operand {operand} back to the caller's resource")]
    CopyBackFailed {
        kernel: &'static str,
        operand: usize,
        #[source]
        source: Box<ComputeError>,
    },
    #[error("{kernel}: {failed} temporary resource(s) could not be released")]
    CleanupFailed {
        kernel: &'static str,
        failed: usize,
        #[source]
        source: Box<ComputeError>,
    },
    #[error("{kernel}: expected {expected} operands, got {actual}")]
    ArityMismatch {
        kernel: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{kernel}: operand {operand} must be {expected}")]
    OperandMismatch {
        kernel: &'static str,
        operand: usize,
        expected: String,
    },

    #[error("kernel {kernel} failed: {reason}")]
    KernelExecutionFailed { kernel: &'static str, reason: String },
    #[error("device resource {0} not found")]
    ResourceNotFound(ResourceId),
    #[error("allocation failed: {0}")]
    AllocationFailed(String),
    #[error("transfer size mismatch: expected {expected}, got {actual}")]
    TransferSizeMismatch { expected: usize, actual: usize },
    #[error("pixel type mismatch: expected {expected}, got {actual}")]
    PixelTypeMismatch { expected: PixelType, actual: PixelType },
    #[error("backend not available: {0}")]
    BackendUnavailable(String),

    #[error("shape mismatch: {axis} {expected} != {actual}")]
    ShapeMismatch {
        axis: Axis,
        expected: usize,
        actual: usize,
    },
    #[error("pixel mismatch at {at}: {expected} != {actual}")]
    PixelMismatch {
        at: Coordinate,
        expected: f64,
        actual: f64,
    },
}

impl ComputeError {
    /// `true` when dispatch failed before or around the kernel, as opposed to
    /// the kernel itself failing.
    #[must_use]
    pub fn is_preparation_failure(&self) -> bool {
        matches!(
            self,
            Self::DispatchConversionFailed { .. }
                | Self::CopyBackFailed { .. }
                | Self::CleanupFailed { .. }
                | Self::ArityMismatch { .. }
                | Self::OperandMismatch { .. }
        )
    }
}

pub type ComputeResult<T> = Result<T, ComputeError>;

/// Filter kernels known to the dispatch layer. Operand layouts live in
/// [`layout::signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    // Arithmetic
    AddPixelwise,
    AddScalar,
    AddWeightedPixelwise,
    MultiplyPixelwise,
    MultiplyScalar,

    // Copies
    Copy,
    CopySlice,
    Crop,

    // Projections
    MaxProjection,
    ArgMaxProjection,

    // Binary morphology
    InvertBinary,
    Dilate,
    Erode,

    // Flat buffer ops
    Set,
    SumPixels,
}

impl Kernel {
    pub const ALL: [Kernel; 15] = [
        Kernel::AddPixelwise,
        Kernel::AddScalar,
        Kernel::AddWeightedPixelwise,
        Kernel::MultiplyPixelwise,
        Kernel::MultiplyScalar,
        Kernel::Copy,
        Kernel::CopySlice,
        Kernel::Crop,
        Kernel::MaxProjection,
        Kernel::ArgMaxProjection,
        Kernel::InvertBinary,
        Kernel::Dilate,
        Kernel::Erode,
        Kernel::Set,
        Kernel::SumPixels,
    ];

    /// Name the backend invokes the kernel by.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Kernel::AddPixelwise => "add_pixelwise",
            Kernel::AddScalar => "add_scalar",
            Kernel::AddWeightedPixelwise => "add_weighted_pixelwise",
            Kernel::MultiplyPixelwise => "multiply_pixelwise",
            Kernel::MultiplyScalar => "multiply_scalar",
            Kernel::Copy => "copy",
            Kernel::CopySlice => "copy_slice",
            Kernel::Crop => "crop",
            Kernel::MaxProjection => "max_projection",
            Kernel::ArgMaxProjection => "arg_max_projection",
            Kernel::InvertBinary => "invert_binary",
            Kernel::Dilate => "dilate",
            Kernel::Erode => "erode",
            Kernel::Set => "set",
            Kernel::SumPixels => "sum_pixels",
        }
    }

    #[must_use]
    pub const fn signature(&self) -> &'static [layout::Param] {
        layout::signature(self)
    }
}

/// Returns a context on the backend selected by [`BackendConfig::from_env`],
/// falling back to the CPU backend when the configuration cannot be read.
#[cfg(feature = "cpu")]
#[must_use]
pub fn default_context() -> Context {
    let config = match BackendConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring backend configuration: {e}");
            BackendConfig::default()
        }
    };
    match config.kind {
        BackendKind::Cpu => {
            tracing::info!("Using CpuBackend.");
            Context::new(std::sync::Arc::new(CpuBackend::with_config(config)))
        }
    }
}

#[cfg(not(feature = "cpu"))]
compile_error!("No compute backend available. Enable the 'cpu' feature.");
