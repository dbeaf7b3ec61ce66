//! Pixel-exact comparison of two hyperstacks.
//!
//! Shapes are compared first (width, height, channels, frames, slices) and
//! pixels are only visited when every axis agrees. Pixels are visited channel
//! by channel, then frame, slice, row and column, and the first difference
//! ends the scan. Values are compared as `f64` with `==`, so `NaN` never
//! matches and `-0.0` matches `0.0`. Pixel types are not compared.

use crate::image::{Axis, Hyperstack};
use crate::{ComputeError, ComputeResult};
use std::fmt;

/// Full position of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub channel: usize,
    pub frame: usize,
    pub slice: usize,
    pub x: usize,
    pub y: usize,
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "c={} t={} z={} y={} x={}",
            self.channel, self.frame, self.slice, self.y, self.x
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mismatch {
    Shape {
        axis: Axis,
        expected: usize,
        actual: usize,
    },
    Pixel {
        at: Coordinate,
        expected: f64,
        actual: f64,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Shape { axis, expected, actual } => {
                write!(f, "{axis} differs: {expected} != {actual}")
            }
            Mismatch::Pixel { at, expected, actual } => {
                write!(f, "pixel at {at} differs: {expected} != {actual}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Equal,
    Mismatch(Mismatch),
}

impl Comparison {
    #[must_use]
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    #[must_use]
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Comparison::Equal => None,
            Comparison::Mismatch(mismatch) => Some(mismatch),
        }
    }

    /// # Errors
    /// `ShapeMismatch` or `PixelMismatch` describing the first difference.
    pub fn into_result(self) -> ComputeResult<()> {
        match self {
            Comparison::Equal => Ok(()),
            Comparison::Mismatch(Mismatch::Shape { axis, expected, actual }) => {
                Err(ComputeError::ShapeMismatch { axis, expected, actual })
            }
            Comparison::Mismatch(Mismatch::Pixel { at, expected, actual }) => {
                Err(ComputeError::PixelMismatch { at, expected, actual })
            }
        }
    }
}

/// Compares `expected` with `actual` and reports the first difference.
#[must_use]
pub fn compare<A, B>(expected: &A, actual: &B) -> Comparison
where
    A: Hyperstack + ?Sized,
    B: Hyperstack + ?Sized,
{
    let (ea, eb) = (expected.extents(), actual.extents());
    for axis in Axis::COMPARISON_ORDER {
        let (left, right) = (axis.extent_of(&ea), axis.extent_of(&eb));
        if left != right {
            let mismatch = Mismatch::Shape { axis, expected: left, actual: right };
            tracing::debug!(%mismatch, "images differ");
            return Comparison::Mismatch(mismatch);
        }
    }

    for at in ea.planes() {
        let (left, right) = (expected.plane(at), actual.plane(at));
        for y in 0..ea.height() {
            for x in 0..ea.width() {
                let (a, b) = (left.get(x, y), right.get(x, y));
                if a != b {
                    let at = Coordinate { channel: at.channel, frame: at.frame, slice: at.slice, x, y };
                    let mismatch = Mismatch::Pixel { at, expected: a, actual: b };
                    tracing::debug!(%mismatch, "images differ");
                    return Comparison::Mismatch(mismatch);
                }
            }
        }
    }
    Comparison::Equal
}

/// `true` when [`compare`] finds no difference.
#[must_use]
pub fn images_equal<A, B>(a: &A, b: &B) -> bool
where
    A: Hyperstack + ?Sized,
    B: Hyperstack + ?Sized,
{
    compare(a, b).is_equal()
}
