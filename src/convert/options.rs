//! Export-side conversion options.

use crate::convert::MappedAttributeConfig;
use crate::core::ValueType;
use crate::native::MAX_MESH_MAPS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How normals are written to the target mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalsMode {
    /// As the `normals` primvar.
    #[default]
    AsPrimvar,
    /// As the mesh normals attribute.
    AsAttribute,
    /// Not exported.
    None,
}

/// Mesh format to convert to before export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshFormat {
    /// Keep whichever representation the scene provides.
    #[default]
    FromScene,
    /// Force n-gon faces.
    PolyMesh,
    /// Force triangles.
    TriMesh,
}

/// Whether the primvar data layout may be inferred per mesh, or must stay
/// fixed (face-varying, indexed) so it cannot change across animation
/// frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimvarLayoutInference {
    Never,
    #[default]
    IfStatic,
}

/// Options controlling native-to-schema mesh conversion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshConversionOptions {
    pub normals_mode: NormalsMode,
    pub mesh_format: MeshFormat,
    pub primvar_layout_inference: PrimvarLayoutInference,
    /// Bake the object-offset transform into the points instead of leaving
    /// it to a transform op.
    pub bake_object_offset_transform: bool,
    /// Split non-planar faces so the source edge structure is preserved
    /// exactly through tessellation on the other side.
    pub preserve_edge_orientation: bool,
    channel_primvar_configs: BTreeMap<i32, MappedAttributeConfig>,
}

impl Default for MeshConversionOptions {
    fn default() -> Self {
        Self {
            normals_mode: NormalsMode::default(),
            mesh_format: MeshFormat::default(),
            primvar_layout_inference: PrimvarLayoutInference::default(),
            bake_object_offset_transform: true,
            preserve_edge_orientation: false,
            channel_primvar_configs: Self::default_channel_primvar_configs(),
        }
    }
}

impl MeshConversionOptions {
    /// The default channel-to-primvar targets:
    /// alpha -> `displayOpacity`, shading -> `mapShading`, vertex color ->
    /// `vertexColor`, channel 1 -> `st`, channels 2..N -> `stN-1`.
    pub fn default_channel_primvar_configs() -> BTreeMap<i32, MappedAttributeConfig> {
        let mut configs = BTreeMap::new();
        configs.insert(
            crate::native::ALPHA_CHANNEL,
            MappedAttributeConfig::new("displayOpacity", ValueType::Float, false),
        );
        configs.insert(
            crate::native::SHADING_CHANNEL,
            MappedAttributeConfig::new("mapShading", ValueType::Color3f, false),
        );
        configs.insert(
            crate::native::VERTEX_COLOR_CHANNEL,
            MappedAttributeConfig::new("vertexColor", ValueType::Color3f, false),
        );
        configs.insert(1, MappedAttributeConfig::new("st", ValueType::TexCoord2f, false));
        for channel in 2..MAX_MESH_MAPS {
            configs.insert(
                channel,
                MappedAttributeConfig::new(
                    &format!("st{}", channel - 1),
                    ValueType::TexCoord2f,
                    false,
                ),
            );
        }
        configs
    }

    /// Configure how one channel is exported. An empty target primvar name
    /// disables export of the channel.
    pub fn set_channel_primvar_config(&mut self, channel: i32, config: MappedAttributeConfig) {
        self.channel_primvar_configs.insert(channel, config);
    }

    /// The primvar configuration for one channel. Unconfigured channels are
    /// not exported.
    pub fn channel_primvar_config(&self, channel: i32) -> MappedAttributeConfig {
        self.channel_primvar_configs
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| MappedAttributeConfig::new("", ValueType::TexCoord2f, false))
    }
}
