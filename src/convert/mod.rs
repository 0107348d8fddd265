//! The conversion engine.
//!
//! - [`MappedAttributeBuilder`] - native map channel to primvar (export)
//! - [`MapBuilder`] / [`NormalsBuilder`] - primvar to native channel (import)
//! - [`PrimvarMappingOptions`] / [`resolve_channel_primvars`] - which primvar
//!   feeds which channel on import
//! - [`MeshConversionOptions`] - export-side configuration
//! - [`MeshConverter`] - the per-time-sample driver
//! - crease conversion between the native `[0, 1]` and schema `[0, 10]`
//!   sharpness domains

mod channel_builder;
mod creases;
mod converter;
mod mapped_attribute;
mod options;
mod primvar_mapping;
mod validate;

pub use channel_builder::{MapBuilder, NormalsBuilder};
pub use creases::{
    apply_native_edge_creases, apply_native_vertex_creases, apply_usd_edge_creases,
    apply_usd_vertex_creases, NATIVE_TO_USD_CREASE, USD_TO_NATIVE_CREASE,
};
pub use converter::{ExportTime, MeshConverter, DEFAULT_PLANAR_TOLERANCE};
pub use mapped_attribute::{DataLayout, MappedAttributeBuilder, MappedAttributeConfig, MappedData};
pub use options::{MeshConversionOptions, MeshFormat, NormalsMode, PrimvarLayoutInference};
pub use primvar_mapping::{resolve_channel_primvars, PrimvarMappingOptions, INVALID_CHANNEL};
pub use validate::validate_mapped_data_for_mesh;
