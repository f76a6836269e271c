#![allow(dead_code)]

use std::fmt;
use std::io;

/// Errors from reading/writing mesh, curve, and point-cloud files.
#[derive(Debug)]
pub enum MeshError {
    Io(io::Error),
    BadMagic,
    UnsupportedVersion(u32),
    UnknownAttribute(String),
    Malformed,
    Truncated,
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MeshError::Io(ref e) => write!(f, "i/o error: {}", e),
            MeshError::BadMagic => write!(f, "bad file magic"),
            MeshError::UnsupportedVersion(v) => write!(f, "unsupported file version: {}", v),
            MeshError::UnknownAttribute(ref name) => write!(f, "unknown attribute: {}", name),
            MeshError::Malformed => write!(f, "malformed file data"),
            MeshError::Truncated => write!(f, "file ended unexpectedly"),
        }
    }
}

impl std::error::Error for MeshError {}

impl From<io::Error> for MeshError {
    fn from(e: io::Error) -> MeshError {
        MeshError::Io(e)
    }
}

/// Errors from reading/writing `.fb`/`.pto` framebuffer files.
#[derive(Debug)]
pub enum FramebufferError {
    Io(io::Error),
    BadMagic,
    UnsupportedVersion(u32),
    UnsupportedChannelCount(usize),
    Malformed,
    Truncated,
}

impl fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FramebufferError::Io(ref e) => write!(f, "i/o error: {}", e),
            FramebufferError::BadMagic => write!(f, "bad file magic"),
            FramebufferError::UnsupportedVersion(v) => {
                write!(f, "unsupported file version: {}", v)
            }
            FramebufferError::UnsupportedChannelCount(c) => {
                write!(f, "unsupported channel count: {}", c)
            }
            FramebufferError::Malformed => write!(f, "malformed file data"),
            FramebufferError::Truncated => write!(f, "file ended unexpectedly"),
        }
    }
}

impl std::error::Error for FramebufferError {}

impl From<io::Error> for FramebufferError {
    fn from(e: io::Error) -> FramebufferError {
        FramebufferError::Io(e)
    }
}

/// Configuration errors: missing camera/framebuffer, double-build of an
/// accelerator, transform order out of range. These are fail-fast --
/// callers are expected to fix the configuration, not retry.
#[derive(Debug)]
pub enum ConfigError {
    NoCamera,
    NoFramebuffer,
    NoWorldGroup,
    AcceleratorAlreadyBuilt,
    AcceleratorNotBuilt,
    TransformOrderOutOfRange(usize),
    RotateOrderOutOfRange(usize),
    BothSurfaceAndVolume,
    NeitherSurfaceNorVolume,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::NoCamera => write!(f, "no camera assigned to renderer"),
            ConfigError::NoFramebuffer => write!(f, "no framebuffer assigned to renderer"),
            ConfigError::NoWorldGroup => write!(f, "no world group assigned to renderer"),
            ConfigError::AcceleratorAlreadyBuilt => write!(f, "accelerator already built"),
            ConfigError::AcceleratorNotBuilt => write!(f, "accelerator not built"),
            ConfigError::TransformOrderOutOfRange(i) => {
                write!(f, "transform_order index {} out of range [0,5]", i)
            }
            ConfigError::RotateOrderOutOfRange(i) => {
                write!(f, "rotate_order index {} out of range [6,11]", i)
            }
            ConfigError::BothSurfaceAndVolume => {
                write!(f, "object instance has both a surface and a volume")
            }
            ConfigError::NeitherSurfaceNorVolume => {
                write!(f, "object instance has neither a surface nor a volume")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Out-of-memory and similar resource exhaustion, kept distinct from
/// `ConfigError` so callers can tell "fix your scene" from "retry later".
#[derive(Debug)]
pub enum ResourceError {
    OutOfMemory,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ResourceError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Top-level renderer error, wrapping the subsystem-specific kinds above
/// plus the render driver's own configuration failures.
#[derive(Debug)]
pub enum RendererError {
    Config(ConfigError),
    Resource(ResourceError),
    Mesh(MeshError),
    Framebuffer(FramebufferError),
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RendererError::Config(ref e) => write!(f, "{}", e),
            RendererError::Resource(ref e) => write!(f, "{}", e),
            RendererError::Mesh(ref e) => write!(f, "{}", e),
            RendererError::Framebuffer(ref e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RendererError {}

impl From<ConfigError> for RendererError {
    fn from(e: ConfigError) -> RendererError {
        RendererError::Config(e)
    }
}

impl From<ResourceError> for RendererError {
    fn from(e: ResourceError) -> RendererError {
        RendererError::Resource(e)
    }
}

impl From<MeshError> for RendererError {
    fn from(e: MeshError) -> RendererError {
        RendererError::Mesh(e)
    }
}

impl From<FramebufferError> for RendererError {
    fn from(e: FramebufferError) -> RendererError {
        RendererError::Framebuffer(e)
    }
}
