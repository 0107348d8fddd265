//! Primvar-to-channel resolution for import.
//!
//! Decides, deterministically, which authored primvar populates which native
//! map channel: explicit mappings first, then type-based inference for the
//! main UV and vertex color channels, then hole-filling for the rest. Given
//! identical input, two resolution runs produce identical assignments.

use crate::core::ValueType;
use crate::native::MAX_MESH_MAPS;
use crate::usd::{Primvar, UsdMesh, DISPLAY_COLOR_PRIMVAR, DISPLAY_OPACITY_PRIMVAR, NORMALS_PRIMVAR};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Sentinel channel meaning "explicitly not imported".
pub const INVALID_CHANNEL: i32 = i32::MIN;

/// Primvar-to-channel mapping options for import.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimvarMappingOptions {
    import_unmapped_primvars: bool,
    primvar_to_channel: BTreeMap<String, i32>,
}

impl Default for PrimvarMappingOptions {
    fn default() -> Self {
        let mut options = Self {
            import_unmapped_primvars: false,
            primvar_to_channel: BTreeMap::new(),
        };
        options.set_default_primvar_channel_mappings();
        options
    }
}

impl PrimvarMappingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the table to the default mappings: `displayOpacity` -> alpha,
    /// `mapShading` -> shading, `vertexColor` -> vertex color, `mapN` -> N,
    /// and the `st`/`uv` UV-set aliases (`st == st0 == st_0` -> 1, ...).
    pub fn set_default_primvar_channel_mappings(&mut self) {
        let mappings = &mut self.primvar_to_channel;
        mappings.clear();

        // Vertex color, alpha, shading...
        mappings.insert("displayOpacity".into(), crate::native::ALPHA_CHANNEL);
        mappings.insert("mapShading".into(), crate::native::SHADING_CHANNEL);
        mappings.insert("vertexColor".into(), crate::native::VERTEX_COLOR_CHANNEL);

        for channel in 1..MAX_MESH_MAPS {
            mappings.insert(format!("map{channel}"), channel);
        }

        // Pixar legacy, "st" very often used for UVs. Some exporters use "uv".
        mappings.insert("st".into(), 1);
        mappings.insert("uv".into(), 1);
        for i in 0..MAX_MESH_MAPS - 1 {
            mappings.insert(format!("st{i}"), i + 1);
            mappings.insert(format!("st_{i}"), i + 1);
            mappings.insert(format!("uv{i}"), i + 1);
            mappings.insert(format!("uv_{i}"), i + 1);
        }
    }

    /// Map a primvar to a channel. Use [`INVALID_CHANNEL`] to explicitly
    /// disable import of a primvar.
    pub fn set_primvar_channel_mapping(&mut self, primvar: &str, channel: i32) {
        self.primvar_to_channel.insert(primvar.to_string(), channel);
    }

    /// The channel a primvar is mapped to, if any.
    pub fn primvar_channel_mapping(&self, primvar: &str) -> Option<i32> {
        self.primvar_to_channel.get(primvar).copied()
    }

    pub fn is_mapped_primvar(&self, primvar: &str) -> bool {
        self.primvar_to_channel.contains_key(primvar)
    }

    /// All mapped primvar names, in sorted order.
    pub fn mapped_primvars(&self) -> Vec<&str> {
        self.primvar_to_channel.keys().map(String::as_str).collect()
    }

    pub fn clear_mapped_primvars(&mut self) {
        self.primvar_to_channel.clear();
    }

    pub fn import_unmapped_primvars(&self) -> bool {
        self.import_unmapped_primvars
    }

    pub fn set_import_unmapped_primvars(&mut self, import: bool) {
        self.import_unmapped_primvars = import;
    }
}

/// Fixed priority of value types for auto-assignment: texture coordinates
/// first (float before double before half, 2D before 3D), everything else
/// after, in authored-name order.
fn type_order(primvar: &Primvar) -> i32 {
    match primvar.type_name {
        ValueType::TexCoord2f => 1,
        ValueType::TexCoord2d => 2,
        ValueType::TexCoord2h => 3,
        ValueType::TexCoord3f => 4,
        ValueType::TexCoord3d => 5,
        ValueType::TexCoord3h => 6,
        _ => 7,
    }
}

fn is_uv_fallback_type(type_name: ValueType) -> bool {
    matches!(
        type_name,
        ValueType::Float2 | ValueType::Double2 | ValueType::Half2
    )
}

/// Resolves the target channels for the primvars of the given mesh, taking
/// care of incompatibilities and conflicts. After this call we know exactly
/// what channel will host the data of what primvar.
pub fn resolve_channel_primvars(
    mesh: &UsdMesh,
    options: &PrimvarMappingOptions,
) -> BTreeMap<i32, String> {
    let mut channel_primvars: BTreeMap<i32, String> = BTreeMap::new();
    let mut processed: HashSet<String> = HashSet::new();

    // Start with the explicit mappings. Primvars iterate in alphabetical
    // order, which fixes the winner of any conflict.
    for (name, primvar) in &mesh.primvars {
        let Some(channel) = options.primvar_channel_mapping(name) else {
            continue;
        };
        processed.insert(name.clone());

        // Explicitly ignored for import.
        if channel == INVALID_CHANNEL {
            continue;
        }
        // Not defined with a value on this mesh, nothing to do.
        if !primvar.has_value() {
            continue;
        }
        // Check that this primvar can actually fit into a map channel.
        let dimension = primvar.dimension();
        if dimension > 4 {
            warn!(
                "{} on {} is of dimension {} and cannot be imported to a map channel.",
                name, mesh.path, dimension
            );
            continue;
        }
        // Both map1 and st map to the main UV channel by default. They are
        // rarely authored on the same mesh, but when they are, first one in
        // wins and the conflict is logged.
        if let Some(existing) = channel_primvars.get(&channel) {
            warn!(
                "Found a primvar/channel mapping conflict when importing {}. Channel {} is \
                 already used by {}, {} will be skipped.",
                mesh.path, channel, existing, name
            );
            continue;
        }
        channel_primvars.insert(channel, name.clone());
    }

    if !options.import_unmapped_primvars() {
        return channel_primvars;
    }

    // Import the remaining unmapped primvars of dimension 1, 2 and 3 the
    // best we can. Channel 0 <- a color3 primvar. Channel 1 <- a texcoord
    // primvar, or a plain 2-component one if none. Channels 2+ <- the rest.

    // Some well-known primvars should not be loaded blindly into channels.
    let mut candidates: Vec<(&String, &Primvar)> = mesh
        .primvars
        .iter()
        .filter(|(name, primvar)| {
            name.as_str() != DISPLAY_OPACITY_PRIMVAR
                && name.as_str() != DISPLAY_COLOR_PRIMVAR
                && name.as_str() != NORMALS_PRIMVAR
                && primvar.dimension() <= 3
                && primvar.type_name.is_numeric()
                && primvar.has_value()
        })
        .collect();

    // Stable sort: same-type candidates keep their alphabetical order.
    candidates.sort_by_key(|&(_, primvar)| type_order(primvar));

    let main_uv_mapped = channel_primvars.contains_key(&1);
    let vc_mapped = channel_primvars.contains_key(&0);
    if !main_uv_mapped || !vc_mapped {
        let mut inferred_uv: Option<&String> = None;
        let mut inferred_vc: Option<&String> = None;
        let mut texcoord_uv_found = false;

        for &(name, primvar) in &candidates {
            if processed.contains(name) {
                continue;
            }

            if !main_uv_mapped && !texcoord_uv_found {
                if primvar.type_name.is_texcoord() {
                    inferred_uv = Some(name);
                    texcoord_uv_found = true;
                    if inferred_vc.is_some() {
                        break;
                    }
                    continue;
                }
                // A plain 2-component primvar can serve as UVs, but keep
                // looking in case a texcoord-typed one shows up.
                if is_uv_fallback_type(primvar.type_name) && inferred_uv.is_none() {
                    inferred_uv = Some(name);
                }
            }

            if !vc_mapped && inferred_vc.is_none() && primvar.type_name.is_color3() {
                inferred_vc = Some(name);
                if texcoord_uv_found {
                    break;
                }
            }
        }

        if !main_uv_mapped {
            if let Some(name) = inferred_uv {
                info!(
                    "No explicitly mapped primvar was found for the main UV channel (1) when \
                     importing {}, falling back to {}.",
                    mesh.path, name
                );
                channel_primvars.insert(1, name.clone());
            }
        }
        if !vc_mapped {
            if let Some(name) = inferred_vc {
                info!(
                    "No explicitly mapped primvar was found for the main vertex color channel \
                     (0) when importing {}, falling back to {}.",
                    mesh.path, name
                );
                channel_primvars.insert(0, name.clone());
            }
        }
    }
    for name in channel_primvars.values() {
        processed.insert(name.clone());
    }

    // Map everything left to the next available channels. The main UV and
    // vertex color channels are never filled by generic data, so the hole
    // search starts at 2.
    let mut next_channel = 2;
    for &(name, _) in &candidates {
        if processed.contains(name) {
            continue;
        }
        while channel_primvars.contains_key(&next_channel) {
            next_channel += 1;
        }
        info!(
            "Importing unmapped primvar {} on {} to channel {}.",
            name, mesh.path, next_channel
        );
        channel_primvars.insert(next_channel, (*name).clone());
        next_channel += 1;
    }

    channel_primvars
}
