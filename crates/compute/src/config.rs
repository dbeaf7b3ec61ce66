//! Backend configuration.
//!
//! Defaults suit tests and small tools. Deployments override them through
//! environment variables:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `IMGCOMPUTE_BACKEND` | backend name (`cpu`) |
//! | `IMGCOMPUTE_MAX_IMAGE_EXTENT` | largest width, height or depth of a device image |
//! | `IMGCOMPUTE_MAX_ALLOCATION_BYTES` | largest single allocation |

use crate::{ComputeError, ComputeResult};
use std::str::FromStr;

pub const ENV_BACKEND: &str = "IMGCOMPUTE_BACKEND";
pub const ENV_MAX_IMAGE_EXTENT: &str = "IMGCOMPUTE_MAX_IMAGE_EXTENT";
pub const ENV_MAX_ALLOCATION_BYTES: &str = "IMGCOMPUTE_MAX_ALLOCATION_BYTES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Host-memory reference backend.
    #[default]
    Cpu,
}

impl FromStr for BackendKind {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(BackendKind::Cpu),
            other => Err(ComputeError::InvalidConfig(format!("unknown backend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Device images may not exceed this along x, y or z.
    pub max_image_extent: usize,
    pub max_allocation_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Cpu,
            max_image_extent: 16_384,
            max_allocation_bytes: 1 << 30,
        }
    }
}

impl BackendConfig {
    /// Defaults overridden by whichever `IMGCOMPUTE_*` variables are set.
    ///
    /// # Errors
    /// `InvalidConfig` if a variable is set to something unparsable or zero.
    pub fn from_env() -> ComputeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BackendConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    /// `InvalidConfig` if a value is unparsable or zero.
    pub fn from_lookup<F>(lookup: F) -> ComputeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(kind) = lookup(ENV_BACKEND) {
            config.kind = kind.parse()?;
        }
        if let Some(value) = lookup(ENV_MAX_IMAGE_EXTENT) {
            config.max_image_extent = parse_positive(ENV_MAX_IMAGE_EXTENT, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_ALLOCATION_BYTES) {
            config.max_allocation_bytes = parse_positive(ENV_MAX_ALLOCATION_BYTES, &value)?;
        }
        Ok(config)
    }
}

fn parse_positive(key: &str, value: &str) -> ComputeResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ComputeError::InvalidConfig(format!("{key} must be positive"))),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ComputeError::InvalidConfig(format!("{key}={value}: {e}"))),
    }
}
