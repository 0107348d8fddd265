//! Core pivot concepts shared by both sides of the bridge.
//!
//! - [`Interpolation`] - the interpolation classes a primvar can carry
//! - [`TimeCode`] / [`Interval`] / [`ChannelIntervals`] - time sampling and
//!   object-channel validity for animated conversion
//! - [`ValueType`] / [`ValueArray`] - typed primvar value storage

mod time;
mod value;

pub use time::*;
pub use value::*;

use serde::{Deserialize, Serialize};

/// Interpolation class of a primvar, relative to mesh topology granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpolation {
    /// One value for the whole mesh.
    #[default]
    Constant,
    /// One value per face.
    Uniform,
    /// One value per vertex, interpolated linearly. Treated like
    /// [`Interpolation::Vertex`] for data granularity.
    Varying,
    /// One value per vertex.
    Vertex,
    /// One value per face-corner.
    FaceVarying,
}

impl Interpolation {
    /// Parse from the schema token. Unknown tokens return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "constant" => Some(Self::Constant),
            "uniform" => Some(Self::Uniform),
            "varying" => Some(Self::Varying),
            "vertex" => Some(Self::Vertex),
            "faceVarying" => Some(Self::FaceVarying),
            _ => None,
        }
    }

    /// The schema token for this interpolation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Varying => "varying",
            Self::Vertex => "vertex",
            Self::FaceVarying => "faceVarying",
        }
    }

    /// Whether data is laid out one-value-per-vertex.
    #[inline]
    pub fn is_per_vertex(&self) -> bool {
        matches!(self, Self::Vertex | Self::Varying)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_tokens() {
        assert_eq!(Interpolation::parse("faceVarying"), Some(Interpolation::FaceVarying));
        assert_eq!(Interpolation::parse("vertex"), Some(Interpolation::Vertex));
        assert_eq!(Interpolation::parse("bogus"), None);
        assert_eq!(Interpolation::Uniform.as_str(), "uniform");
        assert!(Interpolation::Varying.is_per_vertex());
        assert!(!Interpolation::Uniform.is_per_vertex());
    }
}
