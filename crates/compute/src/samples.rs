//! Typed sample storage.
//!
//! Host images keep their samples in a [`Samples`] vector of the image's own
//! pixel type. Backends move data around as raw bytes; [`Samples::to_bytes`]
//! and [`Samples::from_bytes`] are the only places that reinterpret memory.

use crate::types::PixelType;
use crate::{ComputeError, ComputeResult};

/// A flat vector of samples of one pixel type.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    UnsignedInt8(Vec<u8>),
    SignedInt8(Vec<i8>),
    UnsignedInt16(Vec<u16>),
    SignedInt16(Vec<i16>),
    UnsignedInt32(Vec<u32>),
    SignedInt32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! with_vec {
    ($samples:expr, $v:ident => $body:expr) => {
        match $samples {
            Samples::UnsignedInt8($v) => $body,
            Samples::SignedInt8($v) => $body,
            Samples::UnsignedInt16($v) => $body,
            Samples::SignedInt16($v) => $body,
            Samples::UnsignedInt32($v) => $body,
            Samples::SignedInt32($v) => $body,
            Samples::Float32($v) => $body,
            Samples::Float64($v) => $body,
        }
    };
}

fn read_unaligned<T: bytemuck::Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

impl Samples {
    /// `len` zero samples of the given type.
    #[must_use]
    pub fn zeros(pixel_type: PixelType, len: usize) -> Self {
        match pixel_type {
            PixelType::UnsignedInt8 => Self::UnsignedInt8(vec![0; len]),
            PixelType::SignedInt8 => Self::SignedInt8(vec![0; len]),
            PixelType::UnsignedInt16 => Self::UnsignedInt16(vec![0; len]),
            PixelType::SignedInt16 => Self::SignedInt16(vec![0; len]),
            PixelType::UnsignedInt32 => Self::UnsignedInt32(vec![0; len]),
            PixelType::SignedInt32 => Self::SignedInt32(vec![0; len]),
            PixelType::Float32 => Self::Float32(vec![0.0; len]),
            PixelType::Float64 => Self::Float64(vec![0.0; len]),
        }
    }

    /// Builds samples of `pixel_type` from computed values, saturating each one.
    #[must_use]
    pub fn from_values(pixel_type: PixelType, values: &[f64]) -> Self {
        let mut samples = Self::zeros(pixel_type, values.len());
        for (i, &value) in values.iter().enumerate() {
            samples.set(i, value);
        }
        samples
    }

    #[must_use]
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::UnsignedInt8(_) => PixelType::UnsignedInt8,
            Self::SignedInt8(_) => PixelType::SignedInt8,
            Self::UnsignedInt16(_) => PixelType::UnsignedInt16,
            Self::SignedInt16(_) => PixelType::SignedInt16,
            Self::UnsignedInt32(_) => PixelType::UnsignedInt32,
            Self::SignedInt32(_) => PixelType::SignedInt32,
            Self::Float32(_) => PixelType::Float32,
            Self::Float64(_) => PixelType::Float64,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        with_vec!(self, v => v.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index` widened to `f64`. Every supported type widens exactly.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> f64 {
        with_vec!(self, v => f64::from(v[index]))
    }

    /// Stores `value` at `index` after saturating it to this storage's type.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: f64) {
        let value = self.pixel_type().saturate(value);
        match self {
            Self::UnsignedInt8(v) => v[index] = value as u8,
            Self::SignedInt8(v) => v[index] = value as i8,
            Self::UnsignedInt16(v) => v[index] = value as u16,
            Self::SignedInt16(v) => v[index] = value as i16,
            Self::UnsignedInt32(v) => v[index] = value as u32,
            Self::SignedInt32(v) => v[index] = value as i32,
            Self::Float32(v) => v[index] = value as f32,
            Self::Float64(v) => v[index] = value,
        }
    }

    /// Sets every sample to `value` (saturated).
    pub fn fill(&mut self, value: f64) {
        for i in 0..self.len() {
            self.set(i, value);
        }
    }

    /// Iterator over all samples widened to `f64`.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Native-endian byte image of the samples.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        with_vec!(self, v => bytemuck::cast_slice(v).to_vec())
    }

    /// Reinterprets `bytes` as samples of `pixel_type`.
    ///
    /// # Errors
    /// `TransferSizeMismatch` if the byte count is not a whole number of samples.
    pub fn from_bytes(pixel_type: PixelType, bytes: &[u8]) -> ComputeResult<Self> {
        let size = pixel_type.byte_size();
        if bytes.len() % size != 0 {
            return Err(ComputeError::TransferSizeMismatch {
                expected: bytes.len() / size * size,
                actual: bytes.len(),
            });
        }
        Ok(match pixel_type {
            PixelType::UnsignedInt8 => Self::UnsignedInt8(bytes.to_vec()),
            PixelType::SignedInt8 => Self::SignedInt8(read_unaligned(bytes)),
            PixelType::UnsignedInt16 => Self::UnsignedInt16(read_unaligned(bytes)),
            PixelType::SignedInt16 => Self::SignedInt16(read_unaligned(bytes)),
            PixelType::UnsignedInt32 => Self::UnsignedInt32(read_unaligned(bytes)),
            PixelType::SignedInt32 => Self::SignedInt32(read_unaligned(bytes)),
            PixelType::Float32 => Self::Float32(read_unaligned(bytes)),
            PixelType::Float64 => Self::Float64(read_unaligned(bytes)),
        })
    }
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for Samples {
                fn from(v: Vec<$t>) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_vec! {
    u8 => UnsignedInt8,
    i8 => SignedInt8,
    u16 => UnsignedInt16,
    i16 => SignedInt16,
    u32 => UnsignedInt32,
    i32 => SignedInt32,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_survive_a_trip_through_the_backend_format() {
        let samples = Samples::from(vec![1i16, -2, 300, i16::MIN]);
        let bytes = samples.to_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(Samples::from_bytes(PixelType::SignedInt16, &bytes).unwrap(), samples);
    }

    #[test]
    fn unaligned_input_is_accepted() {
        let samples = Samples::from(vec![1.5f32, -0.25]);
        let mut bytes = vec![0u8];
        bytes.extend(samples.to_bytes());
        assert_eq!(Samples::from_bytes(PixelType::Float32, &bytes[1..]).unwrap(), samples);
    }

    #[test]
    fn ragged_byte_count_is_rejected() {
        let err = Samples::from_bytes(PixelType::UnsignedInt16, &[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::TransferSizeMismatch { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn set_saturates_to_storage_type() {
        let mut samples = Samples::zeros(PixelType::UnsignedInt8, 2);
        samples.set(0, 1000.0);
        samples.set(1, 3.9);
        assert_eq!(samples.get(0), 255.0);
        assert_eq!(samples.get(1), 3.0);
    }
}
