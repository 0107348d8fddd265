//! Primvar to native channel conversion (import direction).
//!
//! [`MapBuilder`] rebuilds a map channel and [`NormalsBuilder`] an explicit
//! normal spec from primvar values, an interpolation class and an optional
//! index array. The shared driver walks the (already imported, already
//! winding-corrected) mesh faces and assigns one data index per corner.

use crate::convert::validate_mapped_data_for_mesh;
use crate::core::{Interpolation, TimeCode, ValueArray};
use crate::native::{MapChannel, NormalSpec, PolyFace, PolyMesh};
use crate::usd::Primvar;
use crate::util::Vec3;
use tracing::warn;

/// Target of one channel build: where values and per-corner indices land.
trait ChannelSink {
    fn setup(&mut self, face_count: usize, data_count: usize);
    fn set_value(&mut self, index: usize, value: Vec3);
    fn create_face(&mut self, face: usize, degree: usize);
    fn set_corner(&mut self, face: usize, corner: usize, data_index: i32);
    fn flip_face(&mut self, face: usize);
    fn finalize(&mut self);
}

struct MapSink<'m> {
    map: &'m mut MapChannel,
}

impl ChannelSink for MapSink<'_> {
    fn setup(&mut self, face_count: usize, data_count: usize) {
        self.map.reset(face_count, data_count);
    }

    fn set_value(&mut self, index: usize, value: Vec3) {
        self.map.values[index] = value;
    }

    fn create_face(&mut self, face: usize, degree: usize) {
        self.map.faces[face].verts.resize(degree, 0);
    }

    fn set_corner(&mut self, face: usize, corner: usize, data_index: i32) {
        self.map.faces[face].verts[corner] = data_index;
    }

    fn flip_face(&mut self, face: usize) {
        self.map.faces[face].flip();
    }

    fn finalize(&mut self) {}
}

struct NormalSink<'m> {
    spec: &'m mut NormalSpec,
}

impl ChannelSink for NormalSink<'_> {
    fn setup(&mut self, face_count: usize, data_count: usize) {
        self.spec.normals.clear();
        self.spec.normals.resize(data_count, Vec3::ZERO);
        self.spec.faces.clear();
        self.spec.faces.resize(face_count, Default::default());
    }

    fn set_value(&mut self, index: usize, value: Vec3) {
        self.spec.normals[index] = value;
    }

    fn create_face(&mut self, face: usize, degree: usize) {
        self.spec.faces[face].resize(degree, 0);
    }

    fn set_corner(&mut self, face: usize, corner: usize, data_index: i32) {
        self.spec.faces[face][corner] = data_index;
    }

    fn flip_face(&mut self, face: usize) {
        let corners = &mut self.spec.faces[face];
        if corners.len() > 1 {
            corners[1..].reverse();
        }
    }

    fn finalize(&mut self) {
        for normal in &mut self.spec.normals {
            *normal = normal.normalize_or_zero();
        }
    }
}

/// Shared driver: fills values (padded or cropped to three components) and
/// assigns one data index per face-corner according to the interpolation.
fn build_channel_data(
    faces: &[PolyFace],
    sink: &mut dyn ChannelSink,
    values: &ValueArray,
    interpolation: Interpolation,
    indices: Option<&[i32]>,
    left_handed: bool,
) -> bool {
    let value_count = values.len();
    sink.setup(faces.len(), value_count);

    // Channel values, zero-padded to three components where the source has
    // fewer, cropped where it has more.
    for i in 0..value_count {
        sink.set_value(i, values.get_point(i).unwrap_or(Vec3::ZERO));
    }

    let index_at = |list: &[i32], i: usize| list.get(i).copied().unwrap_or(0);
    let mut face_vertex_index = 0usize;
    for (f, face) in faces.iter().enumerate() {
        let degree = face.degree();
        sink.create_face(f, degree);
        for j in 0..degree {
            let data_index = match interpolation {
                // One value per vertex.
                Interpolation::Vertex | Interpolation::Varying => {
                    let vertex = face.verts[j];
                    match indices {
                        Some(list) => index_at(list, vertex as usize),
                        None => vertex,
                    }
                }
                // One value per face-vertex.
                Interpolation::FaceVarying => {
                    let data_index = match indices {
                        Some(list) => index_at(list, face_vertex_index),
                        None => face_vertex_index as i32,
                    };
                    face_vertex_index += 1;
                    data_index
                }
                // One value per face.
                Interpolation::Uniform => match indices {
                    Some(list) => index_at(list, f),
                    None => f as i32,
                },
                // One value for the whole mesh.
                Interpolation::Constant => 0,
            };
            sink.set_corner(f, j, data_index);
        }
        // A left-handed source only needs its channel faces flipped for
        // face-varying data. Vertex data is fetched through the imported
        // mesh's face, which is already flipped; uniform and constant data
        // are the same across the face, so corner order does not matter.
        if left_handed && interpolation == Interpolation::FaceVarying {
            sink.flip_face(f);
        }
    }
    sink.finalize();
    true
}

/// Checks a primvar's shape against the target mesh, returning its values
/// and indices at the requested time when usable.
fn checked_primvar_data<'p>(
    primvar: &'p Primvar,
    mesh: &PolyMesh,
    time: TimeCode,
    name: &str,
    prim_path: &str,
) -> Option<(&'p ValueArray, Option<&'p [i32]>)> {
    let dimension = primvar.dimension();
    if dimension > 4 {
        warn!(
            "{} on {} is of dimension {} and cannot be imported to a map channel.",
            name, prim_path, dimension
        );
        return None;
    }

    let values = primvar.values.get(time)?;
    if !values.is_numeric() {
        warn!(
            "{} on {} cannot be cast to a float array, and therefore cannot be imported \
             to a map channel.",
            name, prim_path
        );
        return None;
    }

    let indices = if primvar.is_indexed(time) {
        primvar.indices.get(time).map(|i| i.as_slice())
    } else {
        None
    };

    if !validate_mapped_data_for_mesh(
        values.len(),
        indices.unwrap_or(&[]),
        mesh,
        primvar.interpolation,
        indices.is_some(),
    ) {
        warn!(
            "The data of {} on {} is badly formed, and therefore cannot be imported to a \
             map channel.",
            name, prim_path
        );
        return None;
    }

    if dimension == 4 {
        warn!(
            "{} on {} is of dimension 4, it will be cropped to 3 dimensions in order to \
             import it to a map channel.",
            name, prim_path
        );
    }
    Some((values, indices))
}

/// Rebuilds one native map channel from a primvar.
pub struct MapBuilder<'m> {
    mesh: &'m mut PolyMesh,
    channel: i32,
    left_handed: bool,
}

impl<'m> MapBuilder<'m> {
    pub fn new(mesh: &'m mut PolyMesh, channel: i32, left_handed: bool) -> Self {
        Self { mesh, channel, left_handed }
    }

    /// Builds the channel. Returns false (leaving no channel behind) when
    /// the primvar cannot be represented.
    pub fn build(&mut self, name: &str, primvar: &Primvar, time: TimeCode, prim_path: &str) -> bool {
        let Some((values, indices)) =
            checked_primvar_data(primvar, self.mesh, time, name, prim_path)
        else {
            return false;
        };
        let interpolation = primvar.interpolation;
        let left_handed = self.left_handed;
        let (faces, map) = self.mesh.faces_and_map_mut(self.channel);
        let mut sink = MapSink { map };
        build_channel_data(faces, &mut sink, values, interpolation, indices, left_handed)
    }
}

/// Rebuilds the explicit normal spec from normal data.
pub struct NormalsBuilder<'m> {
    mesh: &'m mut PolyMesh,
    left_handed: bool,
}

impl<'m> NormalsBuilder<'m> {
    pub fn new(mesh: &'m mut PolyMesh, left_handed: bool) -> Self {
        Self { mesh, left_handed }
    }

    /// Builds explicit normals from values + interpolation + optional
    /// indices (the attribute form of normals is never indexed; the
    /// primvar form may be).
    pub fn build(
        &mut self,
        values: &ValueArray,
        interpolation: Interpolation,
        indices: Option<&[i32]>,
        prim_path: &str,
    ) -> bool {
        if !values.is_numeric() {
            warn!(
                "normals on {} cannot be cast to a float array and will not be imported.",
                prim_path
            );
            return false;
        }
        if !validate_mapped_data_for_mesh(
            values.len(),
            indices.unwrap_or(&[]),
            self.mesh,
            interpolation,
            indices.is_some(),
        ) {
            warn!("The normal data on {} is badly formed and will not be imported.", prim_path);
            return false;
        }
        let left_handed = self.left_handed;
        let (faces, spec) = self.mesh.faces_and_normals_mut();
        let mut sink = NormalSink { spec };
        build_channel_data(faces, &mut sink, values, interpolation, indices, left_handed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueType;
    use crate::util::Vec2;

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

    #[test]
    fn test_constant_primvar_to_channel() {
        // One value: every face-vertex of the channel points at index 0.
        let mut mesh = cube();
        let mut primvar = Primvar::new(ValueType::Float3, Interpolation::Constant);
        primvar.values.set(TimeCode::Default, ValueArray::Float3(vec![Vec3::ONE]));

        assert!(MapBuilder::new(&mut mesh, 1, false)
            .build("testPrimvar", &primvar, TimeCode::Default, "/cube"));

        let map = mesh.map(1).unwrap();
        assert_eq!(map.value_count(), 1);
        assert_eq!(map.face_count(), 6);
        for face in &map.faces {
            assert_eq!(face.verts.len(), 4);
            assert!(face.verts.iter().all(|&i| i == 0));
        }
    }

    #[test]
    fn test_vertex_indexed_primvar_to_channel() {
        // Two values indexed per vertex: face corners read the index of
        // their vertex.
        let mut mesh = cube();
        let mut primvar = Primvar::new(ValueType::Float3, Interpolation::Vertex);
        primvar
            .values
            .set(TimeCode::Default, ValueArray::Float3(vec![Vec3::ZERO, Vec3::ONE]));
        primvar
            .indices
            .set(TimeCode::Default, vec![0, 1, 1, 1, 1, 1, 1, 1]);

        assert!(MapBuilder::new(&mut mesh, 1, false)
            .build("testPrimvar", &primvar, TimeCode::Default, "/cube"));

        let map = mesh.map(1).unwrap();
        assert_eq!(map.value_count(), 2);
        // Face 0 is [0, 3, 2, 1]: the single special vertex is its first
        // corner.
        assert_eq!(map.faces[0].verts.as_slice(), &[0, 1, 1, 1]);
    }

    #[test]
    fn test_face_varying_indexed_primvar_to_channel() {
        // Two alternating values, fully indexed across the 24 corners.
        let mut mesh = cube();
        let mut primvar = Primvar::new(ValueType::Float3, Interpolation::FaceVarying);
        primvar
            .values
            .set(TimeCode::Default, ValueArray::Float3(vec![Vec3::ZERO, Vec3::ONE]));
        primvar
            .indices
            .set(TimeCode::Default, (0..24).map(|i| i % 2).collect());

        assert!(MapBuilder::new(&mut mesh, 1, false)
            .build("testPrimvar", &primvar, TimeCode::Default, "/cube"));

        let map = mesh.map(1).unwrap();
        assert_eq!(map.value_count(), 2);
        let flat: Vec<i32> = map.faces.iter().flat_map(|f| f.verts.clone()).collect();
        assert_eq!(flat, (0..24).map(|i| i % 2).collect::<Vec<i32>>());
    }

    #[test]
    fn test_uniform_primvar_to_channel() {
        let mut mesh = cube();
        let mut primvar = Primvar::new(ValueType::Float3, Interpolation::Uniform);
        primvar.values.set(
            TimeCode::Default,
            ValueArray::Float3((0..6).map(|i| Vec3::splat(i as f32)).collect()),
        );

        assert!(MapBuilder::new(&mut mesh, 1, false)
            .build("testPrimvar", &primvar, TimeCode::Default, "/cube"));

        let map = mesh.map(1).unwrap();
        for (f, face) in map.faces.iter().enumerate() {
            assert!(face.verts.iter().all(|&i| i == f as i32));
        }
    }

    #[test]
    fn test_face_varying_flip_for_left_handed_source() {
        // Face-varying corner data on a left-handed source: the channel
        // face is flipped (first corner fixed, remainder reversed).
        let mut mesh = PolyMesh::new();
        for p in [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ] {
            mesh.add_vert(p);
        }
        mesh.add_face(&[0, 1, 2, 3]);

        let mut primvar = Primvar::new(ValueType::TexCoord2f, Interpolation::FaceVarying);
        primvar.values.set(
            TimeCode::Default,
            ValueArray::Float2(vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]),
        );

        assert!(MapBuilder::new(&mut mesh, 1, true)
            .build("st", &primvar, TimeCode::Default, "/quad"));
        assert_eq!(mesh.map(1).unwrap().faces[0].verts.as_slice(), &[0, 3, 2, 1]);
    }

    #[test]
    fn test_unusable_primvar_is_skipped() {
        let mut mesh = cube();
        // Vertex interpolation with too few values.
        let mut primvar = Primvar::new(ValueType::Float3, Interpolation::Vertex);
        primvar
            .values
            .set(TimeCode::Default, ValueArray::Float3(vec![Vec3::ZERO; 7]));
        assert!(!MapBuilder::new(&mut mesh, 1, false)
            .build("short", &primvar, TimeCode::Default, "/cube"));
        assert!(mesh.map(1).is_none());

        // Non-numeric values.
        let mut primvar = Primvar::new(ValueType::String, Interpolation::Constant);
        primvar
            .values
            .set(TimeCode::Default, ValueArray::String(vec!["x".into()]));
        assert!(!MapBuilder::new(&mut mesh, 2, false)
            .build("text", &primvar, TimeCode::Default, "/cube"));
        assert!(mesh.map(2).is_none());
    }

    #[test]
    fn test_dimension_padding_and_cropping() {
        let mut mesh = cube();
        // Scalar data zero-pads to three components.
        let mut primvar = Primvar::new(ValueType::Float, Interpolation::Constant);
        primvar.values.set(TimeCode::Default, ValueArray::Float(vec![0.25]));
        assert!(MapBuilder::new(&mut mesh, 1, false)
            .build("scalar", &primvar, TimeCode::Default, "/cube"));
        assert_eq!(mesh.map(1).unwrap().values[0], Vec3::new(0.25, 0.0, 0.0));

        // 4-component data crops to three.
        let mut primvar = Primvar::new(ValueType::Color4f, Interpolation::Constant);
        primvar.values.set(
            TimeCode::Default,
            ValueArray::Float4(vec![crate::util::Vec4::new(1.0, 2.0, 3.0, 4.0)]),
        );
        assert!(MapBuilder::new(&mut mesh, 2, false)
            .build("rgba", &primvar, TimeCode::Default, "/cube"));
        assert_eq!(mesh.map(2).unwrap().values[0], Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_normals_builder_from_attribute_data() {
        let mut mesh = cube();
        let values = ValueArray::Float3(vec![Vec3::new(0.0, 0.0, 2.0); 8]);
        assert!(NormalsBuilder::new(&mut mesh, false).build(
            &values,
            Interpolation::Vertex,
            None,
            "/cube"
        ));
        let spec = mesh.normals.as_ref().unwrap();
        assert_eq!(spec.normals.len(), 8);
        // Normals are renormalized on finalize.
        assert_eq!(spec.normals[0], Vec3::Z);
        assert_eq!(spec.faces[0].as_slice(), &[0, 3, 2, 1]);
    }
}
