//! The per-time-sample conversion driver.
//!
//! Each call converts one mesh at one time code and is fully independent of
//! any other call: the only state carried across calls lives in the target
//! mesh's authored samples, and the object-channel validity intervals decide
//! whether an attribute needs a new sample at this time. When export
//! sanitization changes the mesh, the intervals collapse to the current
//! instant so no topology-derived data is reused across differing
//! topologies.

use crate::convert::{
    apply_native_edge_creases, apply_native_vertex_creases, apply_usd_edge_creases,
    apply_usd_vertex_creases, resolve_channel_primvars, MapBuilder, MappedAttributeBuilder,
    MappedData, DataLayout, MeshConversionOptions, NormalsBuilder, NormalsMode,
    MeshFormat, PrimvarLayoutInference, PrimvarMappingOptions,
};
use crate::core::{
    ChannelIntervals, Interpolation, Interval, ObjectChannel, TimeCode, ValueArray, ValueType,
};
use crate::facade::MeshFacade;
use crate::native::{CornerList, PolyFace, PolyMesh, PolyVert, NUM_HIDDEN_MAPS};
use crate::usd::{
    Attribute, GeomSubset, Orientation, SubdivisionScheme, UsdMesh, DISPLAY_COLOR_PRIMVAR,
    NORMALS_PRIMVAR,
};
use crate::util::{Error, Mat4, Result, Vec3};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum distance a vertex may sit off its face's best-fit plane before
/// the face is split during export sanitization.
pub const DEFAULT_PLANAR_TOLERANCE: f32 = 1e-5;

/// One entry of an export time range: the scene time being converted and
/// the target time code.
#[derive(Clone, Copy, Debug)]
pub struct ExportTime {
    pub frame: f64,
    pub usd_time: TimeCode,
    pub first_frame: bool,
}

impl ExportTime {
    pub fn new(frame: f64, usd_time: TimeCode, first_frame: bool) -> Self {
        Self { frame, usd_time, first_frame }
    }

    /// A single unanimated conversion at the default time.
    pub fn unanimated() -> Self {
        Self { frame: 0.0, usd_time: TimeCode::Default, first_frame: true }
    }
}

/// Snapshot of the counts an export cares about, used to detect that
/// sanitization modified the mesh.
#[derive(PartialEq, Eq)]
struct MeshInfo {
    vert_count: usize,
    face_count: usize,
    map_vert_counts: Vec<usize>,
}

fn get_mesh_info(facade: &MeshFacade) -> MeshInfo {
    let map_vert_counts = (-NUM_HIDDEN_MAPS..facade.map_count())
        .map(|channel| facade.map_data_count(channel))
        .collect();
    MeshInfo {
        vert_count: facade.vertex_count(),
        face_count: facade.face_count(),
        map_vert_counts,
    }
}

/// Checks if a mesh attribute needs to be written out at a given time,
/// considering the object channels it depends on.
fn check_write_attribute<T>(
    time: TimeCode,
    channels: &[ObjectChannel],
    attribute: &Attribute<T>,
    intervals: &ChannelIntervals,
) -> bool {
    // Intersect all the intervals of the channel dependencies.
    let mut intersect = Interval::FOREVER;
    for &channel in channels {
        match intervals.get(channel) {
            // Unknown channel: fall back to always writing.
            None => return true,
            Some(interval) => intersect = intersect.intersect(&interval),
        }
    }

    let Some(frame) = time.frame() else {
        return true;
    };

    // Always write the last sample of the interval, so that any time within
    // the interval resolves to the same value on the schema side.
    if frame == intersect.end {
        return true;
    }

    // Exactly one sample already within the validity interval: nothing to
    // do. More than one means some previous frame had to ignore the
    // intervals (e.g. sanitization modified the mesh), so they can no
    // longer be relied on; none means this is the first write.
    attribute.time_samples_in_interval(&intersect).len() != 1
}

/// Mesh conversion entry points.
///
/// Every conversion call runs to completion on the calling thread, owns no
/// shared state, and targets exactly one time code.
pub struct MeshConverter;

impl MeshConverter {
    /// Converts a native mesh (through its facade) to the schema mesh at
    /// one time. Returns the material-id to face-list mapping gathered
    /// while writing topology.
    ///
    /// The facade's mesh is sanitized in place (planarized when edge
    /// orientation must be preserved, convexified, cleaned), so callers
    /// exporting a scene mesh should hand in a copy.
    pub fn convert_to_usd_mesh(
        facade: &mut MeshFacade,
        usd_mesh: &mut UsdMesh,
        options: &MeshConversionOptions,
        time: TimeCode,
        animated: bool,
        channel_intervals: &ChannelIntervals,
        material_to_faces: &mut BTreeMap<u16, Vec<i32>>,
    ) -> Result<()> {
        let mut intervals = channel_intervals.clone();

        // Some sanitization/cleanup of the polys. MakeConvex and MakePlanar
        // can add new faces; if they do while exporting an animation the
        // geom validity intervals cannot be trusted, since these operations
        // may behave differently at other frames.
        {
            let before_sanitize = facade.face_count();
            if options.preserve_edge_orientation {
                facade.make_planar(DEFAULT_PLANAR_TOLERANCE);
            }
            // Concave polys are a constant source of trouble for
            // tessellation and auto-computed normals, on both sides of the
            // bridge. Only export convex polys.
            facade.make_convex();
            let after_sanitize = facade.face_count();

            let before_cleanup = get_mesh_info(facade);
            facade.cleanup();
            let after_cleanup = get_mesh_info(facade);

            if animated && (after_sanitize != before_sanitize || before_cleanup != after_cleanup)
            {
                if let Some(frame) = time.frame() {
                    intervals.collapse_to_instant(frame);
                }
            }
        }

        if facade.vertex_count() == 0 || facade.face_count() == 0 {
            return Err(Error::InvalidGeometry(format!(
                "{}: no usable geometry to export",
                usd_mesh.path
            )));
        }

        // Extent - depends on the topology and geometry channels.
        let write_extent = !animated
            || check_write_attribute(
                time,
                &[ObjectChannel::Topology, ObjectChannel::Geometry],
                &usd_mesh.extent,
                &intervals,
            );
        if write_extent {
            let bbox = facade.bounding_box();
            usd_mesh.extent.set(time, [bbox.min, bbox.max]);
        }

        // Points - depend on the geometry channel.
        let write_points = !animated
            || check_write_attribute(
                time,
                &[ObjectChannel::Geometry],
                &usd_mesh.points,
                &intervals,
            );
        if write_points {
            let points: Vec<Vec3> =
                (0..facade.vertex_count()).map(|i| facade.vertex(i)).collect();
            usd_mesh.points.set(time, points);
        }

        // Topology - counts and indices are always written as a pair, so
        // only one of them is checked.
        let write_topo = !animated
            || check_write_attribute(
                time,
                &[ObjectChannel::Topology],
                &usd_mesh.face_vertex_counts,
                &intervals,
            );
        if write_topo {
            let face_count = facade.face_count();
            let mut face_vertex_counts = Vec::with_capacity(face_count);
            let mut face_vertex_indices =
                Vec::with_capacity(facade.face_vertex_indices_count());
            for face_idx in 0..face_count {
                let degree = facade.face_degree(face_idx);
                if facade.face_is_dead(face_idx) || degree < 3 {
                    continue;
                }
                face_vertex_counts.push(degree as i32);
                for corner in 0..degree {
                    face_vertex_indices.push(facade.face_vertex(face_idx, corner));
                }
                material_to_faces
                    .entry(facade.face_material(face_idx))
                    .or_default()
                    .push(face_idx as i32);
            }
            usd_mesh.face_vertex_counts.set(time, face_vertex_counts);
            usd_mesh.face_vertex_indices.set(time, face_vertex_indices);
        }

        Self::apply_native_normals(facade, usd_mesh, options, &intervals, time, animated);
        Self::apply_native_map_channels(facade, usd_mesh, options, &intervals, time, animated);

        if facade.has_crease_support() {
            apply_native_vertex_creases(facade, usd_mesh, time);
            apply_native_edge_creases(facade, usd_mesh, time);
        }
        Ok(())
    }

    /// Full export wrapper for one time sample: applies the configured mesh
    /// format, bakes the object-offset transform when requested, converts,
    /// then authors material subsets and the wire-color display fallback.
    #[allow(clippy::too_many_arguments)]
    pub fn export_mesh(
        facade: &mut MeshFacade,
        usd_mesh: &mut UsdMesh,
        options: &MeshConversionOptions,
        object_offset: Option<&Mat4>,
        wire_color: Option<Vec3>,
        animated: bool,
        time: &ExportTime,
        channel_intervals: &ChannelIntervals,
    ) -> Result<()> {
        match options.mesh_format {
            MeshFormat::TriMesh => facade.triangulate(),
            MeshFormat::PolyMesh => facade.make_poly(),
            MeshFormat::FromScene => {}
        }

        if options.bake_object_offset_transform {
            if let Some(offset) = object_offset {
                facade.transform(offset);
            }
        }

        let mut material_to_faces = BTreeMap::new();
        Self::convert_to_usd_mesh(
            facade,
            usd_mesh,
            options,
            time.usd_time,
            animated,
            channel_intervals,
            &mut material_to_faces,
        )?;

        // Material ids are exported at the same frames as topology; nothing
        // to do if topology was not written at this frame.
        if !material_to_faces.is_empty() {
            Self::apply_native_material_ids(&material_to_faces, usd_mesh, time.usd_time);
        }

        // If the display color is not already authored, set it to the wire
        // color.
        if let Some(color) = wire_color {
            let authored = usd_mesh
                .display_color()
                .map(|p| p.has_value())
                .unwrap_or(false);
            if !authored {
                let primvar = usd_mesh.create_primvar(
                    DISPLAY_COLOR_PRIMVAR,
                    ValueType::Color3f,
                    Interpolation::Constant,
                );
                primvar
                    .values
                    .set(TimeCode::Default, ValueArray::Float3(vec![color]));
            }
        }
        Ok(())
    }

    /// Exports explicit normals, as the `normals` primvar or the normals
    /// attribute. Returns whether normals were written.
    fn apply_native_normals(
        facade: &mut MeshFacade,
        usd_mesh: &mut UsdMesh,
        options: &MeshConversionOptions,
        intervals: &ChannelIntervals,
        time: TimeCode,
        animated: bool,
    ) -> bool {
        if options.normals_mode == NormalsMode::None {
            return false;
        }

        // Normals mostly depend on the geometry channel, but they have a
        // complex history with modifiers, so the topology channel
        // invalidates them as well.
        if animated {
            let values = match options.normals_mode {
                NormalsMode::AsPrimvar => {
                    usd_mesh.primvar(NORMALS_PRIMVAR).map(|p| &p.values)
                }
                _ => Some(&usd_mesh.normals),
            };
            if let Some(values) = values {
                if !check_write_attribute(
                    time,
                    &[ObjectChannel::Topology, ObjectChannel::Geometry],
                    values,
                    intervals,
                ) {
                    return false;
                }
            }
        }

        facade.load_normals();
        if facade.normal_count() == 0 {
            return false;
        }

        // Normals should not be authored on a subdivided mesh, since
        // subdivision defines its own. Only polygonal meshes carry them.
        usd_mesh.subdivision_scheme = SubdivisionScheme::None;

        let face_indices = facade.face_indices();
        let face_degrees = facade.face_degrees();
        let vertex_count = facade.vertex_count();
        let Some(normal_indices) = facade.normal_indices() else {
            return false;
        };
        let Some(normal_data) = facade.normal_data() else {
            return false;
        };

        let mapped_data = MappedData::new(normal_data, normal_indices);
        let builder =
            MappedAttributeBuilder::new(face_indices, face_degrees, vertex_count, mapped_data);

        // Inferring the data layout is costly and the result could change
        // over the course of an animation.
        let layout = if options.primvar_layout_inference == PrimvarLayoutInference::Never
            || animated
        {
            DataLayout::new(Interpolation::FaceVarying, true)
        } else {
            builder.infer_data_layout()
        };

        match options.normals_mode {
            NormalsMode::AsPrimvar => {
                let primvar = usd_mesh.create_primvar(
                    NORMALS_PRIMVAR,
                    ValueType::Normal3f,
                    layout.interpolation(),
                );
                builder.populate_primvar(primvar, &layout, 3, time)
            }
            NormalsMode::AsAttribute => {
                usd_mesh.normals_interpolation = layout.interpolation();
                builder.populate_attribute(&mut usd_mesh.normals, &layout, 3, time)
            }
            NormalsMode::None => false,
        }
    }

    /// Exports every configured map channel to its primvar.
    fn apply_native_map_channels(
        facade: &mut MeshFacade,
        usd_mesh: &mut UsdMesh,
        options: &MeshConversionOptions,
        intervals: &ChannelIntervals,
        time: TimeCode,
        animated: bool,
    ) {
        for channel in -NUM_HIDDEN_MAPS..facade.map_count() {
            let config = options.channel_primvar_config(channel);
            Self::channel_to_primvar(
                facade, channel, usd_mesh, &config, intervals, time, animated,
            );
        }
    }

    fn channel_to_primvar(
        facade: &mut MeshFacade,
        channel: i32,
        usd_mesh: &mut UsdMesh,
        config: &crate::convert::MappedAttributeConfig,
        intervals: &ChannelIntervals,
        time: TimeCode,
        animated: bool,
    ) -> bool {
        // No target primvar set: this channel is not exported.
        if config.primvar_name().is_empty() {
            return false;
        }

        let face_count = facade.map_face_count(channel);
        if face_count == 0 {
            return false;
        }

        // Tools do not reliably distinguish the texmap and vertex-color
        // channels, so both are intersected to be safe.
        if animated {
            if let Some(primvar) = usd_mesh.primvar(config.primvar_name()) {
                if !check_write_attribute(
                    time,
                    &[
                        ObjectChannel::Topology,
                        ObjectChannel::TexMap,
                        ObjectChannel::VertexColor,
                    ],
                    &primvar.values,
                    intervals,
                ) {
                    return false;
                }
            }
        }

        let capacity = facade.face_vertex_indices_count();
        let face_indices = facade.face_indices();
        let face_degrees = facade.face_degrees();
        let vertex_count = facade.vertex_count();

        // Flatten the face map indices.
        let mut face_map_indices = Vec::with_capacity(capacity);
        for face_idx in 0..face_count {
            let degree = facade.map_face_degree(channel, face_idx);
            for corner in 0..degree {
                face_map_indices.push(facade.map_face_vertex(channel, face_idx, corner));
            }
        }

        let Some(map_data) = facade.map_data(channel) else {
            return false;
        };
        let mapped_data = MappedData::new(map_data, Arc::new(face_map_indices));
        let builder =
            MappedAttributeBuilder::new(face_indices, face_degrees, vertex_count, mapped_data);
        builder.build_primvar(usd_mesh, config, time, animated)
    }

    /// Authors material binding information on the schema mesh: a single
    /// material id becomes prim custom data, multiple ids become one
    /// partition subset each, carrying the source id (offset by one, to
    /// match the host UI numbering) as custom data.
    fn apply_native_material_ids(
        material_to_faces: &BTreeMap<u16, Vec<i32>>,
        usd_mesh: &mut UsdMesh,
        time: TimeCode,
    ) {
        if material_to_faces.len() == 1 {
            let mat_id = *material_to_faces.keys().next().expect("non-empty") as i32 + 1;
            usd_mesh.mat_id = Some(mat_id);
            return;
        }

        let create_subsets = usd_mesh.subsets.is_empty();
        for (subset_idx, (&mat_id, faces)) in material_to_faces.iter().enumerate() {
            if create_subsets {
                usd_mesh.subsets.push(GeomSubset {
                    name: format!("subset_{}", mat_id as i32 + 1),
                    indices: Attribute::new(),
                    mat_id: Some(mat_id as i32 + 1),
                });
            }
            if let Some(subset) = usd_mesh.subsets.get_mut(subset_idx) {
                subset.indices.set(time, faces.clone());
            }
        }
    }

    /// Converts a schema mesh to a native poly mesh at one time.
    /// `channel_names` receives the primvar name imported into each map
    /// channel. When `clean_mesh` is set, vertices not referenced by any
    /// face are collapsed away after import.
    pub fn convert_to_poly_mesh(
        usd_mesh: &UsdMesh,
        mesh: &mut PolyMesh,
        options: &PrimvarMappingOptions,
        channel_names: &mut BTreeMap<i32, String>,
        time: TimeCode,
        clean_mesh: bool,
    ) -> Result<()> {
        let vertices = usd_mesh.points.get(time).cloned().unwrap_or_default();
        let face_vertex_counts =
            usd_mesh.face_vertex_counts.get(time).cloned().unwrap_or_default();
        let face_vertex_indices =
            usd_mesh.face_vertex_indices.get(time).cloned().unwrap_or_default();

        if vertices.is_empty() || face_vertex_counts.is_empty() || face_vertex_indices.is_empty()
        {
            return Err(Error::InvalidGeometry(format!(
                "{} carries no usable mesh data",
                usd_mesh.path
            )));
        }

        let left_handed = usd_mesh.orientation == Orientation::LeftHanded;

        // Topology. Faces with fewer than 3 vertices, short counts or
        // out-of-range indices are dropped.
        *mesh = PolyMesh::new();
        let mut used = vec![false; vertices.len()];
        let mut cursor = 0usize;
        for &count in &face_vertex_counts {
            let count = count.max(0) as usize;
            let corners = face_vertex_indices.get(cursor..cursor + count);
            cursor += count;
            let Some(corners) = corners else {
                warn!(
                    "{}: face vertex indices are shorter than the declared face counts; \
                     remaining faces dropped.",
                    usd_mesh.path
                );
                break;
            };
            if count < 3 {
                continue;
            }
            if corners.iter().any(|&v| v < 0 || v as usize >= vertices.len()) {
                warn!("{}: face with out-of-range vertex index dropped.", usd_mesh.path);
                continue;
            }
            for &v in corners {
                used[v as usize] = true;
            }
            let mut face = PolyFace {
                verts: CornerList::from_slice(corners),
                ..Default::default()
            };
            if left_handed {
                face.flip();
            }
            mesh.faces.push(face);
        }

        if mesh.faces.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "{} has no face with at least 3 vertices",
                usd_mesh.path
            )));
        }

        mesh.verts = vertices
            .iter()
            .zip(used.iter())
            .map(|(&p, &is_used)| PolyVert { p, dead: !is_used })
            .collect();

        Self::apply_usd_normals(usd_mesh, mesh, time);
        Self::apply_usd_primvars(usd_mesh, mesh, options, channel_names, time);
        Self::apply_usd_material_ids(usd_mesh, mesh, time);

        mesh.fill_in_edges();

        apply_usd_vertex_creases(usd_mesh, mesh, time);
        apply_usd_edge_creases(usd_mesh, mesh, time);

        if clean_mesh {
            let removed = mesh.collapse_dead_verts();
            if removed > 0 {
                warn!(
                    "{} vertices were not imported from {} because they were not part of \
                     any face.",
                    removed, usd_mesh.path
                );
            }
        }
        Ok(())
    }

    /// Imports explicit normals; the `normals` primvar has precedence over
    /// the normals attribute.
    fn apply_usd_normals(usd_mesh: &UsdMesh, mesh: &mut PolyMesh, time: TimeCode) {
        let left_handed = usd_mesh.orientation == Orientation::LeftHanded;

        if let Some(primvar) = usd_mesh.primvar(NORMALS_PRIMVAR) {
            if primvar.has_value() {
                let Some(values) = primvar.values.get(time) else {
                    return;
                };
                let indices = if primvar.is_indexed(time) {
                    primvar.indices.get(time).map(|i| i.as_slice())
                } else {
                    None
                };
                NormalsBuilder::new(mesh, left_handed).build(
                    values,
                    primvar.interpolation,
                    indices,
                    &usd_mesh.path,
                );
                return;
            }
        }

        // The normals attribute is never indexed.
        if let Some(values) = usd_mesh.normals.get(time) {
            NormalsBuilder::new(mesh, left_handed).build(
                values,
                usd_mesh.normals_interpolation,
                None,
                &usd_mesh.path,
            );
        }
    }

    /// Resolves primvar-to-channel assignments and builds each map channel.
    fn apply_usd_primvars(
        usd_mesh: &UsdMesh,
        mesh: &mut PolyMesh,
        options: &PrimvarMappingOptions,
        channel_names: &mut BTreeMap<i32, String>,
        time: TimeCode,
    ) {
        // First figure out exactly what channels will be imported.
        let channel_primvars = resolve_channel_primvars(usd_mesh, options);
        let left_handed = usd_mesh.orientation == Orientation::LeftHanded;

        channel_names.clear();
        for (channel, name) in channel_primvars {
            let Some(primvar) = usd_mesh.primvar(&name) else {
                continue;
            };
            if !MapBuilder::new(mesh, channel, left_handed)
                .build(&name, primvar, time, &usd_mesh.path)
            {
                info!("Unable to import {} into channel {}.", name, channel);
                continue;
            }
            channel_names.insert(channel, name);
        }
    }

    /// Applies material ids from prim custom data or material-bind subsets.
    fn apply_usd_material_ids(usd_mesh: &UsdMesh, mesh: &mut PolyMesh, time: TimeCode) {
        // Custom data on the prim itself means all faces share one id.
        if let Some(mat_id) = usd_mesh.mat_id {
            let material = (mat_id - 1).max(0) as u16;
            for face in &mut mesh.faces {
                face.material = material;
            }
            return;
        }

        if usd_mesh.subsets.is_empty() {
            return;
        }

        let mut subsets: Vec<&GeomSubset> = usd_mesh.subsets.iter().collect();
        subsets.sort_by(|a, b| a.name.cmp(&b.name));

        // Subsets carrying a source id first, then generated ids for the
        // rest, skipping the ids already taken.
        let mut used_ids: Vec<i32> = Vec::new();
        let mut without_custom_data: Vec<&GeomSubset> = Vec::new();
        for subset in subsets {
            match subset.mat_id {
                Some(id) if id >= 1 => {
                    Self::apply_mat_id_to_mesh(subset, mesh, (id - 1) as u16, time);
                    used_ids.push(id - 1);
                }
                _ => without_custom_data.push(subset),
            }
        }

        let mut next_id = 0i32;
        for subset in without_custom_data {
            while used_ids.contains(&next_id) {
                next_id += 1;
            }
            Self::apply_mat_id_to_mesh(subset, mesh, next_id as u16, time);
            used_ids.push(next_id);
        }
    }

    fn apply_mat_id_to_mesh(
        subset: &GeomSubset,
        mesh: &mut PolyMesh,
        material: u16,
        time: TimeCode,
    ) {
        let Some(indices) = subset.indices.get(time) else {
            return;
        };
        for &face_idx in indices {
            // Safeguard against bad data.
            if face_idx >= 0 && (face_idx as usize) < mesh.faces.len() {
                mesh.faces[face_idx as usize].material = material;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_export_topology_and_points() {
        let mut mesh = cube();
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        let mut materials = BTreeMap::new();
        MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut materials,
        )
        .unwrap();

        assert_eq!(usd_mesh.points.get(TimeCode::Default).unwrap().len(), 8);
        assert_eq!(
            usd_mesh.face_vertex_counts.get(TimeCode::Default).unwrap().as_slice(),
            &[4, 4, 4, 4, 4, 4]
        );
        assert_eq!(
            usd_mesh.face_vertex_indices.get(TimeCode::Default).unwrap().len(),
            24
        );
        let extent = usd_mesh.extent.get(TimeCode::Default).unwrap();
        assert_eq!(extent[0], Vec3::ZERO);
        assert_eq!(extent[1], Vec3::ONE);
        // One material id over the whole mesh.
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[&0].len(), 6);
    }

    #[test]
    fn test_export_empty_mesh_fails() {
        let mut mesh = PolyMesh::new();
        let mut usd_mesh = UsdMesh::new("/empty");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        let result = MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut BTreeMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_export_skips_dead_faces() {
        let mut mesh = cube();
        mesh.faces[2].dead = true;
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(
            usd_mesh.face_vertex_counts.get(TimeCode::Default).unwrap().len(),
            5
        );
    }

    #[test]
    fn test_export_normals_as_primvar_disables_subdivision() {
        let mut mesh = cube();
        for face in &mut mesh.faces {
            face.smoothing_group = 1;
        }
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(usd_mesh.subdivision_scheme, SubdivisionScheme::None);
        assert!(usd_mesh.primvar(NORMALS_PRIMVAR).unwrap().has_value());
    }

    #[test]
    fn test_export_normals_mode_none() {
        let mut mesh = cube();
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        let mut options = MeshConversionOptions::default();
        options.normals_mode = NormalsMode::None;
        MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &options,
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut BTreeMap::new(),
        )
        .unwrap();
        assert!(usd_mesh.primvar(NORMALS_PRIMVAR).is_none());
        assert_eq!(usd_mesh.subdivision_scheme, SubdivisionScheme::CatmullClark);
    }

    #[test]
    fn test_export_map_channel_to_primvar() {
        let mut mesh = cube();
        let map = mesh.set_map_support(1);
        map.values = vec![Vec3::new(0.5, 0.5, 0.0)];
        map.faces = (0..6)
            .map(|_| crate::native::MapFace { verts: CornerList::from_slice(&[0, 0, 0, 0]) })
            .collect();

        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        MeshConverter::convert_to_usd_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            TimeCode::Default,
            false,
            &ChannelIntervals::new(),
            &mut BTreeMap::new(),
        )
        .unwrap();

        // Channel 1 exports under its default primvar name with constant
        // interpolation (all corners share the one value).
        let primvar = usd_mesh.primvar("st").unwrap();
        assert_eq!(primvar.interpolation, Interpolation::Constant);
        assert_eq!(primvar.type_name, ValueType::TexCoord2f);
    }

    #[test]
    fn test_material_subsets_authored_for_multiple_ids() {
        let mut mesh = cube();
        mesh.faces[0].material = 2;
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        MeshConverter::export_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            None,
            None,
            false,
            &ExportTime::unanimated(),
            &ChannelIntervals::new(),
        )
        .unwrap();

        assert_eq!(usd_mesh.subsets.len(), 2);
        assert!(usd_mesh.mat_id.is_none());
        let by_name: BTreeMap<&str, &GeomSubset> =
            usd_mesh.subsets.iter().map(|s| (s.name.as_str(), s)).collect();
        assert_eq!(
            by_name["subset_1"].indices.get(TimeCode::Default).unwrap().as_slice(),
            &[1, 2, 3, 4, 5]
        );
        assert_eq!(
            by_name["subset_3"].indices.get(TimeCode::Default).unwrap().as_slice(),
            &[0]
        );
        assert_eq!(by_name["subset_3"].mat_id, Some(3));
    }

    #[test]
    fn test_export_wire_color_fallback() {
        let mut mesh = cube();
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        MeshConverter::export_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            None,
            Some(Vec3::new(0.2, 0.4, 0.6)),
            false,
            &ExportTime::unanimated(),
            &ChannelIntervals::new(),
        )
        .unwrap();
        let display = usd_mesh.display_color().unwrap();
        assert_eq!(
            display.values.get(TimeCode::Default),
            Some(&ValueArray::Float3(vec![Vec3::new(0.2, 0.4, 0.6)]))
        );
    }

    #[test]
    fn test_bake_object_offset_transform() {
        let mut mesh = cube();
        let mut usd_mesh = UsdMesh::new("/cube");
        let mut facade = MeshFacade::from_poly(&mut mesh);
        let offset = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        MeshConverter::export_mesh(
            &mut facade,
            &mut usd_mesh,
            &MeshConversionOptions::default(),
            Some(&offset),
            None,
            false,
            &ExportTime::unanimated(),
            &ChannelIntervals::new(),
        )
        .unwrap();
        let points = usd_mesh.points.get(TimeCode::Default).unwrap();
        assert_eq!(points[0].x, 10.0);
    }

    #[test]
    fn test_check_write_attribute_gating() {
        // With a valid interval covering frames 0..10 and a sample already
        // written inside it, nothing new is written before the interval
        // end.
        let mut attr: Attribute<i32> = Attribute::new();
        attr.set(TimeCode::Frame(0.0), 1);
        let mut intervals = ChannelIntervals::new();
        intervals.set(ObjectChannel::Geometry, Interval { start: 0.0, end: 10.0 });

        assert!(!check_write_attribute(
            TimeCode::Frame(5.0),
            &[ObjectChannel::Geometry],
            &attr,
            &intervals
        ));
        // The last frame of the interval is always written.
        assert!(check_write_attribute(
            TimeCode::Frame(10.0),
            &[ObjectChannel::Geometry],
            &attr,
            &intervals
        ));
        // Unknown channels fall back to always writing.
        assert!(check_write_attribute(
            TimeCode::Frame(5.0),
            &[ObjectChannel::Topology],
            &attr,
            &intervals
        ));
        // No sample yet in the interval: write.
        let empty: Attribute<i32> = Attribute::new();
        assert!(check_write_attribute(
            TimeCode::Frame(5.0),
            &[ObjectChannel::Geometry],
            &empty,
            &intervals
        ));
    }

    #[test]
    fn test_import_basic_topology() {
        let mut usd_mesh = UsdMesh::new("/cube");
        usd_mesh.points.set(
            TimeCode::Default,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
        );
        usd_mesh.face_vertex_counts.set(TimeCode::Default, vec![4]);
        usd_mesh.face_vertex_indices.set(TimeCode::Default, vec![0, 1, 2, 3]);

        let mut mesh = PolyMesh::new();
        let mut channel_names = BTreeMap::new();
        MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut channel_names,
            TimeCode::Default,
            true,
        )
        .unwrap();

        assert_eq!(mesh.vert_count(), 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.faces[0].verts.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(mesh.edge_count(), 4);
    }

    #[test]
    fn test_import_left_handed_flips_faces() {
        let mut usd_mesh = UsdMesh::new("/quad");
        usd_mesh.orientation = Orientation::LeftHanded;
        usd_mesh.points.set(
            TimeCode::Default,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
        );
        usd_mesh.face_vertex_counts.set(TimeCode::Default, vec![4]);
        usd_mesh.face_vertex_indices.set(TimeCode::Default, vec![0, 1, 2, 3]);

        let mut mesh = PolyMesh::new();
        MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut BTreeMap::new(),
            TimeCode::Default,
            true,
        )
        .unwrap();

        // First corner fixed, remaining corners reversed.
        assert_eq!(mesh.faces[0].verts.as_slice(), &[0, 3, 2, 1]);
    }

    #[test]
    fn test_import_empty_mesh_fails() {
        let usd_mesh = UsdMesh::new("/empty");
        let mut mesh = PolyMesh::new();
        let result = MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut BTreeMap::new(),
            TimeCode::Default,
            true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_import_unused_vertices_collapsed() {
        let mut usd_mesh = UsdMesh::new("/tri");
        usd_mesh.points.set(
            TimeCode::Default,
            vec![
                Vec3::new(9.0, 9.0, 9.0), // unused
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
        );
        usd_mesh.face_vertex_counts.set(TimeCode::Default, vec![3]);
        usd_mesh.face_vertex_indices.set(TimeCode::Default, vec![1, 2, 3]);

        let mut mesh = PolyMesh::new();
        MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut BTreeMap::new(),
            TimeCode::Default,
            true,
        )
        .unwrap();
        assert_eq!(mesh.vert_count(), 3);

        // Without cleaning, the unused vertex stays, flagged dead.
        let mut mesh = PolyMesh::new();
        MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut BTreeMap::new(),
            TimeCode::Default,
            false,
        )
        .unwrap();
        assert_eq!(mesh.vert_count(), 4);
        assert!(mesh.verts[0].dead);
    }

    #[test]
    fn test_import_material_subsets() {
        let mut usd_mesh = UsdMesh::new("/two");
        usd_mesh.points.set(
            TimeCode::Default,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
        );
        usd_mesh.face_vertex_counts.set(TimeCode::Default, vec![4, 4]);
        usd_mesh
            .face_vertex_indices
            .set(TimeCode::Default, vec![0, 1, 2, 3, 1, 4, 5, 2]);
        let mut subset_a = GeomSubset {
            name: "a".into(),
            indices: Attribute::new(),
            mat_id: Some(5),
        };
        subset_a.indices.set(TimeCode::Default, vec![0]);
        let mut subset_b = GeomSubset {
            name: "b".into(),
            indices: Attribute::new(),
            mat_id: None,
        };
        subset_b.indices.set(TimeCode::Default, vec![1]);
        usd_mesh.subsets = vec![subset_b, subset_a];

        let mut mesh = PolyMesh::new();
        MeshConverter::convert_to_poly_mesh(
            &usd_mesh,
            &mut mesh,
            &PrimvarMappingOptions::default(),
            &mut BTreeMap::new(),
            TimeCode::Default,
            true,
        )
        .unwrap();
        // Subset "a" carries source id 5 -> material 4; subset "b" gets the
        // first free generated id, 0.
        assert_eq!(mesh.faces[0].material, 4);
        assert_eq!(mesh.faces[1].material, 0);
    }
}
