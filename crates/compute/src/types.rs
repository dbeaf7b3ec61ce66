//! Host pixel types, device channel types and the table that maps between them.
//!
//! Exactly five host encodings have a device counterpart. Everything that
//! needs to decide a device storage format goes through [`to_device_type`] /
//! [`to_host_type`] instead of matching on types inline. Buffer element types
//! are reached only through a channel type.

use crate::{ComputeError, ComputeResult};
use std::fmt;

/// Host-side numeric encoding of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    UnsignedInt8,
    SignedInt8,
    UnsignedInt16,
    SignedInt16,
    UnsignedInt32,
    SignedInt32,
    Float32,
    Float64,
}

/// Backend-side channel encoding of a device image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceChannelType {
    SignedNormalizedInt8,
    SignedNormalizedInt16,
    UnsignedNormalizedInt8,
    UnsignedNormalizedInt16,
    SignedInt8,
    SignedInt16,
    SignedInt32,
    UnsignedInt8,
    UnsignedInt16,
    UnsignedInt32,
    HalfFloat,
    Float,
}

/// Element type of a flat device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    UnsignedByte,
    Byte,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
    HalfFloat,
    Float,
    Double,
}

/// The closed set of host types with a device counterpart.
pub const SUPPORTED_PIXEL_TYPES: [PixelType; 5] = [
    PixelType::UnsignedInt8,
    PixelType::SignedInt8,
    PixelType::UnsignedInt16,
    PixelType::SignedInt16,
    PixelType::Float32,
];

/// Maps a host pixel type to the device channel type used to store it.
///
/// # Errors
/// `UnsupportedPixelType` for any host type outside [`SUPPORTED_PIXEL_TYPES`].
pub fn to_device_type(pixel_type: PixelType) -> ComputeResult<DeviceChannelType> {
    match pixel_type {
        PixelType::UnsignedInt8 => Ok(DeviceChannelType::UnsignedInt8),
        PixelType::SignedInt8 => Ok(DeviceChannelType::SignedInt8),
        PixelType::UnsignedInt16 => Ok(DeviceChannelType::UnsignedInt16),
        PixelType::SignedInt16 => Ok(DeviceChannelType::SignedInt16),
        PixelType::Float32 => Ok(DeviceChannelType::Float),
        other => Err(ComputeError::UnsupportedPixelType(other.to_string())),
    }
}

/// Inverse of [`to_device_type`].
///
/// # Errors
/// `UnsupportedPixelType` for channel types that have no host counterpart.
pub fn to_host_type(channel_type: DeviceChannelType) -> ComputeResult<PixelType> {
    match channel_type {
        DeviceChannelType::UnsignedInt8 => Ok(PixelType::UnsignedInt8),
        DeviceChannelType::SignedInt8 => Ok(PixelType::SignedInt8),
        DeviceChannelType::UnsignedInt16 => Ok(PixelType::UnsignedInt16),
        DeviceChannelType::SignedInt16 => Ok(PixelType::SignedInt16),
        DeviceChannelType::Float => Ok(PixelType::Float32),
        other => Err(ComputeError::UnsupportedPixelType(format!("{other:?}"))),
    }
}

/// Buffer element type behind each integer or float channel type.
const ELEMENT_TYPES: [(DeviceChannelType, NativeType); 8] = [
    (DeviceChannelType::UnsignedInt8, NativeType::UnsignedByte),
    (DeviceChannelType::SignedInt8, NativeType::Byte),
    (DeviceChannelType::UnsignedInt16, NativeType::UnsignedShort),
    (DeviceChannelType::SignedInt16, NativeType::Short),
    (DeviceChannelType::UnsignedInt32, NativeType::UnsignedInt),
    (DeviceChannelType::SignedInt32, NativeType::Int),
    (DeviceChannelType::HalfFloat, NativeType::HalfFloat),
    (DeviceChannelType::Float, NativeType::Float),
];

/// Buffer element type for a host pixel type.
///
/// # Errors
/// `UnsupportedPixelType` when the host type has no device mapping.
pub fn to_native_type(pixel_type: PixelType) -> ComputeResult<NativeType> {
    let channel_type = to_device_type(pixel_type)?;
    ELEMENT_TYPES
        .into_iter()
        .find_map(|(channel, native)| (channel == channel_type).then_some(native))
        .ok_or_else(|| ComputeError::UnsupportedPixelType(pixel_type.to_string()))
}

/// Host pixel type for a buffer element type.
///
/// # Errors
/// `UnsupportedPixelType` when the element type has no device mapping.
pub fn native_to_host_type(native_type: NativeType) -> ComputeResult<PixelType> {
    to_host_type(native_to_device_type(native_type)?)
}

/// Device image channel type matching a buffer element type.
///
/// # Errors
/// `UnsupportedPixelType` when the element type has no host counterpart.
pub fn native_to_device_type(native_type: NativeType) -> ComputeResult<DeviceChannelType> {
    let channel_type = ELEMENT_TYPES
        .into_iter()
        .find_map(|(channel, native)| (native == native_type).then_some(channel))
        .ok_or_else(|| ComputeError::UnsupportedPixelType(format!("{native_type:?}")))?;
    // only channel types with a host counterpart may back a buffer
    to_host_type(channel_type)?;
    Ok(channel_type)
}

impl PixelType {
    /// Size of one sample in bytes.
    #[must_use]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::UnsignedInt8 | Self::SignedInt8 => 1,
            Self::UnsignedInt16 | Self::SignedInt16 => 2,
            Self::UnsignedInt32 | Self::SignedInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Smallest and largest representable value.
    #[must_use]
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::UnsignedInt8 => (0.0, f64::from(u8::MAX)),
            Self::SignedInt8 => (f64::from(i8::MIN), f64::from(i8::MAX)),
            Self::UnsignedInt16 => (0.0, f64::from(u16::MAX)),
            Self::SignedInt16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
            Self::UnsignedInt32 => (0.0, f64::from(u32::MAX)),
            Self::SignedInt32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
            Self::Float32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
            Self::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Converts a computed value into this type's value domain.
    ///
    /// Integer types clamp to their range and truncate toward zero, NaN
    /// becomes 0. `Float32` rounds through `f32`.
    #[must_use]
    pub fn saturate(self, value: f64) -> f64 {
        match self {
            Self::Float32 => f64::from(value as f32),
            Self::Float64 => value,
            _ if value.is_nan() => 0.0,
            _ => {
                let (lo, hi) = self.range();
                value.trunc().clamp(lo, hi)
            }
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnsignedInt8 => "UnsignedInt8",
            Self::SignedInt8 => "SignedInt8",
            Self::UnsignedInt16 => "UnsignedInt16",
            Self::SignedInt16 => "SignedInt16",
            Self::UnsignedInt32 => "UnsignedInt32",
            Self::SignedInt32 => "SignedInt32",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        };
        f.write_str(name)
    }
}
