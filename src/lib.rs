//! # meshbridge
//!
//! Bidirectional translator between a DCC application's native polygon-mesh
//! representation and the USD geometric schema.
//!
//! The two host SDKs are represented by lightweight in-memory models owned by
//! this crate: [`native`] holds the DCC-side mesh kinds (an indexed n-gon
//! mesh with per-face-vertex map channels, and a fixed-arity triangle mesh),
//! [`usd`] holds the schema-side mesh (points, face-vertex topology,
//! interpolation-classed primvars, crease arrays) with time-sampled
//! attributes.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (errors, math re-exports, bounding boxes)
//! - [`core`] - Pivot concepts (interpolation classes, value types, time codes)
//! - [`native`] - DCC-side mesh models ([`native::PolyMesh`], [`native::TriMesh`])
//! - [`facade`] - Uniform query/mutate view over both native mesh kinds
//! - [`usd`] - Schema-side mesh model with time-sampled attributes
//! - [`convert`] - The conversion engine (builders, resolution, driver)
//!
//! ## Example
//!
//! ```ignore
//! use meshbridge::convert::{MeshConverter, MeshConversionOptions};
//! use meshbridge::facade::MeshFacade;
//! use meshbridge::usd::UsdMesh;
//!
//! let mut usd_mesh = UsdMesh::new("/root/box");
//! MeshConverter::convert_to_usd_mesh(
//!     &mut MeshFacade::from_poly(&mut poly),
//!     &mut usd_mesh,
//!     &MeshConversionOptions::default(),
//!     TimeCode::Default,
//!     false,
//!     &Default::default(),
//!     &mut Default::default(),
//! )?;
//! ```

pub mod util;
pub mod core;
pub mod native;
pub mod facade;
pub mod usd;
pub mod convert;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{BBox3f, Error, Result};
    pub use crate::core::{Interpolation, TimeCode, ValueArray, ValueType};
    pub use crate::native::{PolyMesh, TriMesh};
    pub use crate::facade::MeshFacade;
    pub use crate::usd::{Primvar, UsdMesh};
    pub use crate::convert::{
        MappedAttributeBuilder, MeshConversionOptions, MeshConverter, PrimvarMappingOptions,
    };
}
