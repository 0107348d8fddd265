//! Native map channel to primvar conversion (export direction).
//!
//! [`MappedAttributeBuilder`] takes a flat value array plus a per-face-vertex
//! index list (a [`MappedData`]) and infers the most compact interpolation
//! class that reproduces the data exactly, then materializes it as an
//! indexed or flat primvar.

use crate::core::{Interpolation, TimeCode, ValueArray, ValueType};
use crate::usd::{Attribute, Primvar, UsdMesh};
use crate::util::{is_almost_zero, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Read-only bundle of mapped attribute data: the builder borrows the value
/// buffer (the caller must outlive the builder call) and shares the index
/// buffer, which is immutable after construction.
#[derive(Clone)]
pub struct MappedData<'a> {
    data: &'a [Vec3],
    face_data_indices: Arc<Vec<i32>>,
}

impl<'a> MappedData<'a> {
    pub fn new(data: &'a [Vec3], face_data_indices: Arc<Vec<i32>>) -> Self {
        Self { data, face_data_indices }
    }

    pub fn data(&self) -> &'a [Vec3] {
        self.data
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    pub fn face_data_indices(&self) -> &Arc<Vec<i32>> {
        &self.face_data_indices
    }
}

/// An inferred data layout: interpolation class plus whether an index array
/// is still required.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataLayout {
    interpolation: Interpolation,
    indexed: bool,
}

impl DataLayout {
    pub fn new(interpolation: Interpolation, indexed: bool) -> Self {
        Self { interpolation, indexed }
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }
}

/// Declarative description of one channel's target primvar: name, value
/// type, and whether the type may auto-expand dimensionally to fit the
/// observed data width. An empty primvar name means the channel is not
/// exported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedAttributeConfig {
    primvar_name: String,
    primvar_type: ValueType,
    auto_expand_type: bool,
}

impl Default for MappedAttributeConfig {
    fn default() -> Self {
        Self {
            primvar_name: String::new(),
            primvar_type: ValueType::TexCoord2f,
            auto_expand_type: false,
        }
    }
}

impl MappedAttributeConfig {
    pub fn new(primvar_name: &str, primvar_type: ValueType, auto_expand_type: bool) -> Self {
        Self {
            primvar_name: primvar_name.to_string(),
            primvar_type,
            auto_expand_type,
        }
    }

    pub fn primvar_name(&self) -> &str {
        &self.primvar_name
    }

    pub fn primvar_type(&self) -> ValueType {
        self.primvar_type
    }

    pub fn auto_expand_type(&self) -> bool {
        self.auto_expand_type
    }
}

/// Whether a name is usable as a primvar identifier.
pub(crate) fn is_valid_primvar_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builds primvars from per-face-vertex mapped data.
pub struct MappedAttributeBuilder<'a> {
    face_indices: Arc<Vec<i32>>,
    face_degrees: Vec<i32>,
    vertex_count: usize,
    mapped_data: MappedData<'a>,
}

impl<'a> MappedAttributeBuilder<'a> {
    /// The face topology (flattened face-vertex indices and per-face
    /// degrees) comes from the mesh facade; the mapped data is the channel
    /// being converted.
    pub fn new(
        face_indices: Arc<Vec<i32>>,
        face_degrees: Vec<i32>,
        vertex_count: usize,
        mapped_data: MappedData<'a>,
    ) -> Self {
        Self { face_indices, face_degrees, vertex_count, mapped_data }
    }

    /// Infers the most compact data layout that reproduces the mapped data
    /// exactly: constant if all values are equal, uniform if indices only
    /// vary across faces, vertex if every mesh vertex maps to a single
    /// value (index-free when the values can be reordered 1:1 onto the
    /// vertices), face-varying otherwise (index-free when there is exactly
    /// one value per face-corner).
    pub fn infer_data_layout(&self) -> DataLayout {
        let data = self.mapped_data.data();
        let count = self.mapped_data.data_count();

        // If the values are all identical, constant interpolation.
        let all_values_equal = count == 1 || data.windows(2).all(|w| w[0] == w[1]);
        if all_values_equal {
            return DataLayout::new(Interpolation::Constant, false);
        }

        let face_data_indices = self.mapped_data.face_data_indices();
        if self.face_indices.len() != face_data_indices.len() {
            warn!("Map channel topology mismatch. Unable to infer layout.");
            return DataLayout::new(Interpolation::FaceVarying, true);
        }

        // One data index per face: uniform, one value per face in face order.
        if !face_data_indices.is_empty() {
            let mut uniform = true;
            let mut offset = 0usize;
            for &degree in &self.face_degrees {
                let degree = degree as usize;
                if degree == 0 {
                    continue;
                }
                let first = face_data_indices[offset];
                if !face_data_indices[offset..offset + degree].iter().all(|&i| i == first) {
                    uniform = false;
                    break;
                }
                offset += degree;
            }
            if uniform {
                return DataLayout::new(Interpolation::Uniform, false);
            }
        }

        // As many values as face-corners: face varying without an index.
        if count == face_data_indices.len() {
            return DataLayout::new(Interpolation::FaceVarying, false);
        }

        // Data indices identical to the vertex indices: vertex, no index.
        if face_data_indices.as_slice() == self.face_indices.as_slice() {
            return DataLayout::new(Interpolation::Vertex, false);
        }

        // Vertex interpolation is possible if each vertex maps to a single
        // piece of data.
        let mut vertex_to_data: BTreeMap<i32, i32> = BTreeMap::new();
        let mut vertex_interpolation = true;
        for (i, &data_index) in face_data_indices.iter().enumerate() {
            let vertex = self.face_indices[i];
            match vertex_to_data.get(&vertex) {
                None => {
                    vertex_to_data.insert(vertex, data_index);
                }
                Some(&existing) => {
                    if existing != data_index {
                        // Same vertex mapped to different data.
                        vertex_interpolation = false;
                        break;
                    }
                }
            }
        }
        if vertex_interpolation {
            // With exactly one value per vertex no index is needed, though
            // the data will be reordered to vertex order.
            return DataLayout::new(Interpolation::Vertex, count != self.vertex_count);
        }
        DataLayout::new(Interpolation::FaceVarying, true)
    }

    /// Creates a new primvar on the target mesh and populates it with the
    /// mapped data. `animated` forces face-varying indexed layout so it
    /// cannot change across frames.
    pub fn build_primvar(
        &self,
        target: &mut UsdMesh,
        config: &MappedAttributeConfig,
        time: TimeCode,
        animated: bool,
    ) -> bool {
        // Inferring the data layout is costly and the result could change
        // over the course of an animation.
        let layout = if animated {
            DataLayout::new(Interpolation::FaceVarying, true)
        } else {
            self.infer_data_layout()
        };

        let mut primvar_type = config.primvar_type();
        let type_dimension = primvar_type.dimension().clamp(1, 3);
        if config.auto_expand_type() && type_dimension < 3 {
            let mut required_dimension = 1;
            for point in self.mapped_data.data() {
                if !is_almost_zero(point.z) {
                    required_dimension = 3;
                    break;
                }
                if required_dimension < 2 && !is_almost_zero(point.y) {
                    required_dimension = 2;
                }
            }
            if required_dimension > type_dimension {
                primvar_type = config.primvar_type().equivalent_for_dimension(required_dimension);
            }
        }

        if !is_valid_primvar_name(config.primvar_name()) {
            error!(
                "Unable to create the primvar {} on {}. The given name may be a reserved \
                 keyword or invalid.",
                config.primvar_name(),
                target.path
            );
            return false;
        }

        let primvar =
            target.create_primvar(config.primvar_name(), primvar_type, layout.interpolation());
        self.populate_primvar(primvar, &layout, primvar_type.dimension(), time)
    }

    /// Populates a primvar (values and, where required, indices).
    pub fn populate_primvar(
        &self,
        primvar: &mut Primvar,
        layout: &DataLayout,
        dimension: usize,
        time: TimeCode,
    ) -> bool {
        let Some((values, indices)) = self.build_values_and_indices(layout, dimension, true)
        else {
            return false;
        };
        primvar.values.set(time, values);
        if let Some(indices) = indices {
            primvar.indices.set(time, indices);
        }
        true
    }

    /// Populates a bare attribute. Attributes carry no index, so indexed
    /// layouts are flattened to one value per element.
    pub fn populate_attribute(
        &self,
        attribute: &mut Attribute<ValueArray>,
        layout: &DataLayout,
        dimension: usize,
        time: TimeCode,
    ) -> bool {
        let Some((values, _)) = self.build_values_and_indices(layout, dimension, false) else {
            return false;
        };
        attribute.set(time, values);
        true
    }

    fn build_values_and_indices(
        &self,
        layout: &DataLayout,
        dimension: usize,
        supports_indices: bool,
    ) -> Option<(ValueArray, Option<Vec<i32>>)> {
        let data = self.mapped_data.data();
        if data.is_empty() {
            return None;
        }
        let face_data_indices = self.mapped_data.face_data_indices();
        let at = |index: i32| data.get(index as usize).copied().unwrap_or(Vec3::ZERO);

        match layout.interpolation() {
            // All values are the same...
            Interpolation::Constant => {
                Some((ValueArray::from_points(&data[..1], dimension), None))
            }

            // One value per face, in face order.
            Interpolation::Uniform => {
                let mut points = Vec::with_capacity(self.face_degrees.len());
                let mut offset = 0usize;
                for &degree in &self.face_degrees {
                    let degree = degree as usize;
                    if degree == 0 {
                        points.push(Vec3::ZERO);
                        continue;
                    }
                    points.push(at(face_data_indices[offset]));
                    offset += degree;
                }
                Some((ValueArray::from_points(&points, dimension), None))
            }

            Interpolation::Vertex | Interpolation::Varying => {
                // Ordered map, as the mapped data indices must be ordered to
                // match the vertices. Vertex index to mapped data index.
                let mut vertex_to_data: BTreeMap<i32, i32> = BTreeMap::new();
                for (i, &vertex) in self.face_indices.iter().enumerate() {
                    let data_index = face_data_indices.get(i).copied().unwrap_or(0);
                    vertex_to_data.entry(vertex).or_insert(data_index);
                    if vertex_to_data.len() == self.vertex_count {
                        break;
                    }
                }

                if !layout.is_indexed() {
                    // Reorder the data to vertex order.
                    let points: Vec<Vec3> = (0..data.len() as i32)
                        .map(|v| at(vertex_to_data.get(&v).copied().unwrap_or(0)))
                        .collect();
                    return Some((ValueArray::from_points(&points, dimension), None));
                }

                if supports_indices {
                    // Add the index entries in vertex order. vertex_to_data
                    // may have missing entries in case of unused vertices,
                    // make sure we still add an index for every vertex.
                    let mut data_indices = Vec::with_capacity(self.vertex_count);
                    let mut next_required = 0i32;
                    for (&vertex, &data_index) in &vertex_to_data {
                        while vertex != next_required {
                            // Vertex at this index is not used, pad with
                            // data index 0.
                            data_indices.push(0);
                            next_required += 1;
                        }
                        data_indices.push(data_index);
                        next_required += 1;
                    }
                    while (next_required as usize) < self.vertex_count {
                        data_indices.push(0);
                        next_required += 1;
                    }

                    return Some((
                        ValueArray::from_points(data, dimension),
                        Some(data_indices),
                    ));
                }

                // No indexing on attributes: flatten to one data point per
                // mapped vertex, in vertex order.
                let points: Vec<Vec3> =
                    vertex_to_data.values().map(|&d| at(d)).collect();
                Some((ValueArray::from_points(&points, dimension), None))
            }

            Interpolation::FaceVarying => {
                if layout.is_indexed() && supports_indices {
                    return Some((
                        ValueArray::from_points(data, dimension),
                        Some(face_data_indices.as_ref().clone()),
                    ));
                }
                // Expand to one value per face-corner in face-then-corner
                // order.
                let points: Vec<Vec3> =
                    face_data_indices.iter().map(|&i| at(i)).collect();
                Some((ValueArray::from_points(&points, dimension), None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::MeshFacade;
    use crate::native::PolyMesh;

    /// 8-vertex, 6-quad cube.
    fn cube() -> PolyMesh {
        let mut mesh = PolyMesh::new();
        for z in [0.0, 1.0] {
            mesh.add_vert(Vec3::new(0.0, 0.0, z));
            mesh.add_vert(Vec3::new(1.0, 0.0, z));
            mesh.add_vert(Vec3::new(1.0, 1.0, z));
            mesh.add_vert(Vec3::new(0.0, 1.0, z));
        }
        mesh.add_face(&[0, 3, 2, 1]);
        mesh.add_face(&[4, 5, 6, 7]);
        mesh.add_face(&[0, 1, 5, 4]);
        mesh.add_face(&[1, 2, 6, 5]);
        mesh.add_face(&[2, 3, 7, 6]);
        mesh.add_face(&[3, 0, 4, 7]);
        mesh
    }

    fn builder_for<'a>(
        mesh: &mut PolyMesh,
        data: &'a [Vec3],
        indices: Vec<i32>,
    ) -> MappedAttributeBuilder<'a> {
        let mut facade = MeshFacade::from_poly(mesh);
        let face_indices = facade.face_indices();
        let face_degrees = facade.face_degrees();
        let vertex_count = facade.vertex_count();
        MappedAttributeBuilder::new(
            face_indices,
            face_degrees,
            vertex_count,
            MappedData::new(data, Arc::new(indices)),
        )
    }

    #[test]
    fn test_infer_constant() {
        let mut mesh = cube();
        let data = vec![Vec3::ONE];
        let builder = builder_for(&mut mesh, &data, vec![0; 24]);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Constant);
        assert!(!layout.is_indexed());
    }

    #[test]
    fn test_infer_constant_equal_values() {
        // Distinct indices but identical values still classify as constant.
        let mut mesh = cube();
        let data = vec![Vec3::ONE, Vec3::ONE];
        let indices: Vec<i32> = (0..24).map(|i| i % 2).collect();
        let builder = builder_for(&mut mesh, &data, indices);
        assert_eq!(builder.infer_data_layout().interpolation(), Interpolation::Constant);
    }

    #[test]
    fn test_infer_uniform() {
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..6).map(|i| Vec3::splat(i as f32)).collect();
        // Every corner of face f maps to value f.
        let indices: Vec<i32> = (0..6).flat_map(|f| [f; 4]).collect();
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Uniform);
        assert!(!layout.is_indexed());
    }

    #[test]
    fn test_infer_vertex_identity() {
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..8).map(|i| Vec3::splat(i as f32)).collect();
        let indices: Vec<i32> = {
            let mut facade = MeshFacade::from_poly(&mut mesh);
            facade.face_indices().as_ref().clone()
        };
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Vertex);
        assert!(!layout.is_indexed());
    }

    #[test]
    fn test_infer_vertex_indexed_shared_values() {
        // Even/odd vertices share two values: vertex interpolation with an
        // index (2 values != 8 vertices).
        let mut mesh = cube();
        let data = vec![Vec3::ZERO, Vec3::ONE];
        let indices: Vec<i32> = {
            let mut facade = MeshFacade::from_poly(&mut mesh);
            facade.face_indices().iter().map(|v| v % 2).collect()
        };
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Vertex);
        assert!(layout.is_indexed());
    }

    #[test]
    fn test_infer_face_varying_unindexed() {
        // One distinct value per face-corner.
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..24).map(|i| Vec3::splat(i as f32)).collect();
        let indices: Vec<i32> = (0..24).collect();
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::FaceVarying);
        assert!(!layout.is_indexed());
    }

    #[test]
    fn test_infer_face_varying_indexed() {
        // A vertex whose corners disagree, with fewer values than corners.
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..3).map(|i| Vec3::splat(i as f32)).collect();
        let mut indices = vec![0i32; 24];
        indices[0] = 1;
        indices[4] = 2; // both corners touch vertices also mapped to 0
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::FaceVarying);
        assert!(layout.is_indexed());
    }

    #[test]
    fn test_interpolation_minimality_never_overspecific() {
        // A constant-valued channel must never classify as vertex or
        // face-varying.
        let mut mesh = cube();
        let data = vec![Vec3::splat(7.0)];
        let indices = vec![0i32; 24];
        let builder = builder_for(&mut mesh, &data, indices);
        assert_eq!(builder.infer_data_layout().interpolation(), Interpolation::Constant);
    }

    #[test]
    fn test_build_constant_primvar() {
        let mut mesh = cube();
        let data = vec![Vec3::ONE];
        let builder = builder_for(&mut mesh, &data, vec![0; 24]);
        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("testPrimvar", ValueType::Float3, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));

        let primvar = target.primvar("testPrimvar").unwrap();
        assert_eq!(primvar.interpolation, Interpolation::Constant);
        assert!(!primvar.is_indexed(TimeCode::Default));
        assert_eq!(
            primvar.values.get(TimeCode::Default),
            Some(&ValueArray::Float3(vec![Vec3::ONE]))
        );
    }

    #[test]
    fn test_build_vertex_unindexed_reorders_to_vertex_order() {
        // One value per vertex, mapped through reversed data indices: the
        // index is eliminated and values reordered so that the value at
        // position v belongs to vertex v.
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..8).map(|i| Vec3::splat((7 - i) as f32 * 10.0)).collect();
        let indices: Vec<i32> = {
            let mut facade = MeshFacade::from_poly(&mut mesh);
            // Vertex v reads data index 7 - v.
            facade.face_indices().iter().map(|v| 7 - v).collect()
        };
        let builder = builder_for(&mut mesh, &data, indices);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Vertex);
        assert!(!layout.is_indexed());

        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("testPrimvar", ValueType::Float3, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        let primvar = target.primvar("testPrimvar").unwrap();
        // Index-free reconstruction: the value at vertex enumeration order
        // reproduces the original per-corner values. Vertex v mapped to
        // data[7 - v] = (7 - (7 - v)) * 10 = v * 10.
        assert_eq!(
            primvar.values.get(TimeCode::Default),
            Some(&ValueArray::Float3(
                (0..8).map(|v| Vec3::splat(v as f32 * 10.0)).collect()
            ))
        );
        assert!(!primvar.is_indexed(TimeCode::Default));
    }

    #[test]
    fn test_build_vertex_indexed_with_unused_vertices() {
        // Unused vertices scattered through the mesh: the vertex-indexed
        // primvar pads their index entries with data index 0.
        let mut mesh = PolyMesh::new();
        let unused = Vec3::splat(99.0);
        mesh.add_vert(unused); // 0: unused
        mesh.add_vert(unused); // 1: unused
        mesh.add_vert(Vec3::new(-1.0, -1.0, 0.0)); // 2
        mesh.add_vert(Vec3::new(1.0, -1.0, 0.0)); // 3
        mesh.add_vert(unused); // 4: unused
        mesh.add_vert(unused); // 5: unused
        mesh.add_vert(Vec3::new(1.0, 1.0, 0.0)); // 6
        mesh.add_vert(unused); // 7: unused
        mesh.add_vert(Vec3::new(-1.0, 1.0, 0.0)); // 8
        mesh.add_vert(unused); // 9: unused
        mesh.add_vert(unused); // 10: unused
        mesh.add_face(&[2, 3, 6, 8]);

        let data = vec![Vec3::ZERO, Vec3::ONE];
        let builder = builder_for(&mut mesh, &data, vec![0, 1, 0, 1]);
        let layout = builder.infer_data_layout();
        assert_eq!(layout.interpolation(), Interpolation::Vertex);
        assert!(layout.is_indexed());

        let mut target = UsdMesh::new("/sparse");
        let config = MappedAttributeConfig::new("testPrimvar", ValueType::Float3, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        let primvar = target.primvar("testPrimvar").unwrap();
        assert_eq!(
            primvar.values.get(TimeCode::Default),
            Some(&ValueArray::Float3(vec![Vec3::ZERO, Vec3::ONE]))
        );
        assert_eq!(
            primvar.indices.get(TimeCode::Default).unwrap().as_slice(),
            &[0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0]
        );
    }

    #[test]
    fn test_build_uniform_values_in_face_order() {
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..6).map(|i| Vec3::splat(i as f32 + 1.0)).collect();
        let indices: Vec<i32> = (0..6).flat_map(|f| [f; 4]).collect();
        let builder = builder_for(&mut mesh, &data, indices);
        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("perFace", ValueType::Float3, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        let primvar = target.primvar("perFace").unwrap();
        assert_eq!(primvar.interpolation, Interpolation::Uniform);
        assert_eq!(
            primvar.values.get(TimeCode::Default),
            Some(&ValueArray::Float3(data))
        );
        assert!(!primvar.is_indexed(TimeCode::Default));
    }

    #[test]
    fn test_auto_expand_type() {
        // 3-component data through a texcoord2 config with auto-expansion:
        // type widens to texcoord3.
        let mut mesh = cube();
        let data: Vec<Vec3> = (0..24).map(|i| Vec3::new(i as f32, 0.5, 1.0)).collect();
        let indices: Vec<i32> = (0..24).collect();
        let builder = builder_for(&mut mesh, &data, indices);
        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("uvw", ValueType::TexCoord2f, true);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        assert_eq!(target.primvar("uvw").unwrap().type_name, ValueType::TexCoord3f);

        // Without auto-expansion the configured type is kept and the third
        // component dropped.
        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("uvw", ValueType::TexCoord2f, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        assert_eq!(target.primvar("uvw").unwrap().type_name, ValueType::TexCoord2f);
        match target.primvar("uvw").unwrap().values.get(TimeCode::Default) {
            Some(ValueArray::Float2(values)) => assert_eq!(values.len(), 24),
            other => panic!("expected float2 values, got {other:?}"),
        }
    }

    #[test]
    fn test_animated_export_forces_face_varying_indexed() {
        let mut mesh = cube();
        let data = vec![Vec3::ONE];
        let builder = builder_for(&mut mesh, &data, vec![0; 24]);
        let mut target = UsdMesh::new("/cube");
        let config = MappedAttributeConfig::new("anim", ValueType::Float3, false);
        assert!(builder.build_primvar(&mut target, &config, TimeCode::Frame(1.0), true));
        let primvar = target.primvar("anim").unwrap();
        assert_eq!(primvar.interpolation, Interpolation::FaceVarying);
        assert!(primvar.is_indexed(TimeCode::Frame(1.0)));
    }

    #[test]
    fn test_invalid_primvar_name_rejected() {
        let mut mesh = cube();
        let data = vec![Vec3::ONE];
        let builder = builder_for(&mut mesh, &data, vec![0; 24]);
        let mut target = UsdMesh::new("/cube");
        for bad in ["", "1leading", "has space", "has-dash"] {
            let config = MappedAttributeConfig::new(bad, ValueType::Float3, false);
            assert!(!builder.build_primvar(&mut target, &config, TimeCode::Default, false));
        }
        assert!(target.primvars.is_empty());
    }
}
