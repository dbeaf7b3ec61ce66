//! Host-side logical images.
//!
//! A [`LogicalImage`] is an owned five-axis array (x, y, z, channel, frame)
//! of samples of one [`PixelType`]. Storage is x fastest, then y, z, channel
//! and frame, so every (channel, frame, slice) plane is a contiguous
//! row-major run of `width * height` samples.

use crate::samples::Samples;
use crate::types::PixelType;
use crate::{ComputeError, ComputeResult};
use std::fmt;

/// Per-axis extents. Every axis is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extents {
    width: usize,
    height: usize,
    depth: usize,
    channels: usize,
    frames: usize,
}

impl Extents {
    /// # Errors
    /// `InvalidExtents` if any axis is zero or the sample count does not fit
    /// in `usize`.
    pub fn new(
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
        frames: usize,
    ) -> ComputeResult<Self> {
        let extents = Self { width, height, depth, channels, frames };
        let axes = [width, height, depth, channels, frames];
        if axes.contains(&0) {
            return Err(ComputeError::InvalidExtents(extents.to_string()));
        }
        // `len` and friends multiply unchecked
        if axes.iter().try_fold(1usize, |acc, &axis| acc.checked_mul(axis)).is_none() {
            return Err(ComputeError::InvalidExtents(format!("{extents} holds too many samples")));
        }
        Ok(extents)
    }

    /// Single-channel, single-frame stack.
    ///
    /// # Errors
    /// `InvalidExtents` if any axis is zero.
    pub fn volume(width: usize, height: usize, depth: usize) -> ComputeResult<Self> {
        Self::new(width, height, depth, 1, 1)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    #[must_use]
    pub const fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Total number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.plane_len() * self.depth * self.channels * self.frames
    }

    /// Never true; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of the first sample of plane `at`.
    #[must_use]
    pub const fn plane_offset(&self, at: PlaneIndex) -> usize {
        ((at.frame * self.channels + at.channel) * self.depth + at.slice) * self.plane_len()
    }

    /// Linear index of `(x, y)` in plane `at`.
    #[must_use]
    pub const fn index(&self, at: PlaneIndex, x: usize, y: usize) -> usize {
        self.plane_offset(at) + y * self.width + x
    }

    #[must_use]
    pub const fn contains(&self, at: PlaneIndex, x: usize, y: usize) -> bool {
        at.channel < self.channels
            && at.frame < self.frames
            && at.slice < self.depth
            && x < self.width
            && y < self.height
    }

    /// Every plane in channel, then frame, then slice order.
    pub fn planes(&self) -> impl Iterator<Item = PlaneIndex> {
        let (channels, frames, depth) = (self.channels, self.frames, self.depth);
        (0..channels).flat_map(move |channel| {
            (0..frames).flat_map(move |frame| {
                (0..depth).map(move |slice| PlaneIndex { channel, frame, slice })
            })
        })
    }

    /// Copy of these extents with a different depth.
    ///
    /// # Errors
    /// `InvalidExtents` if `depth` is zero.
    pub fn with_depth(&self, depth: usize) -> ComputeResult<Self> {
        Self::new(self.width, self.height, depth, self.channels, self.frames)
    }
}

impl fmt::Display for Extents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} c{} t{}",
            self.width, self.height, self.depth, self.channels, self.frames
        )
    }
}

/// Selects one 2D plane of a hyperstack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaneIndex {
    pub channel: usize,
    pub frame: usize,
    pub slice: usize,
}

impl PlaneIndex {
    #[must_use]
    pub const fn new(channel: usize, frame: usize, slice: usize) -> Self {
        Self { channel, frame, slice }
    }

    /// Slice `slice` of the first channel and frame.
    #[must_use]
    pub const fn slice(slice: usize) -> Self {
        Self { channel: 0, frame: 0, slice }
    }
}

/// Structural axes, in the order shapes are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Width,
    Height,
    Channels,
    Frames,
    Slices,
}

impl Axis {
    pub const COMPARISON_ORDER: [Axis; 5] =
        [Axis::Width, Axis::Height, Axis::Channels, Axis::Frames, Axis::Slices];

    #[must_use]
    pub const fn extent_of(self, extents: &Extents) -> usize {
        match self {
            Axis::Width => extents.width,
            Axis::Height => extents.height,
            Axis::Channels => extents.channels,
            Axis::Frames => extents.frames,
            Axis::Slices => extents.depth,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Width => "width",
            Axis::Height => "height",
            Axis::Channels => "channels",
            Axis::Frames => "frames",
            Axis::Slices => "slices",
        })
    }
}

/// Read-only row-major view of one plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    samples: &'a Samples,
    offset: usize,
    width: usize,
    height: usize,
}

impl Plane<'_> {
    /// # Panics
    /// If `(x, y)` lies outside the plane.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside plane");
        self.samples.get(self.offset + y * self.width + x)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }
}

/// What the comparison oracle and the converters need from a host image.
pub trait Hyperstack {
    fn extents(&self) -> Extents;
    fn pixel_type(&self) -> PixelType;

    /// The plane at `at`.
    ///
    /// # Panics
    /// Implementations may panic if `at` lies outside [`Hyperstack::extents`].
    fn plane(&self, at: PlaneIndex) -> Plane<'_>;
}

/// Host-owned N-dimensional pixel array.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalImage {
    extents: Extents,
    samples: Samples,
}

impl LogicalImage {
    /// Zero-filled image.
    #[must_use]
    pub fn new(pixel_type: PixelType, extents: Extents) -> Self {
        Self { extents, samples: Samples::zeros(pixel_type, extents.len()) }
    }

    /// Zero-filled single-channel, single-frame stack.
    ///
    /// # Errors
    /// `InvalidExtents` if any axis is zero.
    pub fn stack(
        pixel_type: PixelType,
        width: usize,
        height: usize,
        depth: usize,
    ) -> ComputeResult<Self> {
        Ok(Self::new(pixel_type, Extents::volume(width, height, depth)?))
    }

    /// # Errors
    /// `TransferSizeMismatch` when `samples` does not hold exactly
    /// `extents.len()` values.
    pub fn from_samples(extents: Extents, samples: Samples) -> ComputeResult<Self> {
        if samples.len() != extents.len() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: extents.len(),
                actual: samples.len(),
            });
        }
        Ok(Self { extents, samples })
    }

    #[must_use]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Replaces the sample storage, keeping extents. The pixel type follows
    /// the new storage.
    ///
    /// # Errors
    /// `TransferSizeMismatch` if the sample count differs.
    pub fn replace_samples(&mut self, samples: Samples) -> ComputeResult<()> {
        if samples.len() != self.extents.len() {
            return Err(ComputeError::TransferSizeMismatch {
                expected: self.extents.len(),
                actual: samples.len(),
            });
        }
        self.samples = samples;
        Ok(())
    }

    /// # Panics
    /// If the coordinate lies outside the image.
    #[must_use]
    pub fn get(&self, at: PlaneIndex, x: usize, y: usize) -> f64 {
        assert!(self.extents.contains(at, x, y), "{at:?} ({x}, {y}) outside {}", self.extents);
        self.samples.get(self.extents.index(at, x, y))
    }

    /// Writes `value`, saturated to the image's pixel type.
    ///
    /// # Panics
    /// If the coordinate lies outside the image.
    pub fn set(&mut self, at: PlaneIndex, x: usize, y: usize, value: f64) {
        assert!(self.extents.contains(at, x, y), "{at:?} ({x}, {y}) outside {}", self.extents);
        let index = self.extents.index(at, x, y);
        self.samples.set(index, value);
    }

    pub fn fill(&mut self, value: f64) {
        self.samples.fill(value);
    }
}

impl Hyperstack for LogicalImage {
    fn extents(&self) -> Extents {
        self.extents
    }

    fn pixel_type(&self) -> PixelType {
        self.samples.pixel_type()
    }

    fn plane(&self, at: PlaneIndex) -> Plane<'_> {
        assert!(self.extents.contains(at, 0, 0), "{at:?} outside {}", self.extents);
        Plane {
            samples: &self.samples,
            offset: self.extents.plane_offset(at),
            width: self.extents.width,
            height: self.extents.height,
        }
    }
}
