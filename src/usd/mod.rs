//! Schema-side mesh model.
//!
//! A lightweight stand-in for the scene-description library's mesh prim:
//! points, face-vertex topology, orientation, subdivision crease arrays and
//! named primvars, all stored as time-sampled attributes. The conversion
//! engine reads and writes this model; file and stage access belong to the
//! excluded host collaborator.

mod attribute;
mod mesh;

pub use attribute::Attribute;
pub use mesh::{
    GeomSubset, Orientation, Primvar, SubdivisionScheme, UsdMesh, DISPLAY_COLOR_PRIMVAR,
    DISPLAY_OPACITY_PRIMVAR, NORMALS_PRIMVAR,
};
