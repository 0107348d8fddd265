//! Indexed n-gon mesh with per-face-vertex map channels.
//!
//! This is the richer of the two native representations: faces of arbitrary
//! degree, dead-structure flags, an explicit edge list, per-vertex and
//! per-edge crease channels, and any number of map channels (negative
//! channels are hidden/special, 0 is vertex color, positive channels hold
//! UVs and generic data). Map channel faces are parallel to mesh faces and
//! index into the channel's own value array.

use crate::native::{compute_smoothed_normals, CornerList, TriMesh};
use crate::util::{is_convex, newell_normal, plane_deviation, BBox3f, Mat4, Vec3};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

/// One mesh vertex. Dead vertices are kept in place (indices stay stable)
/// until the mesh is compacted.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolyVert {
    pub p: Vec3,
    pub dead: bool,
}

/// One n-gon face.
#[derive(Clone, Debug, Default)]
pub struct PolyFace {
    pub verts: CornerList,
    pub material: u16,
    pub smoothing_group: u32,
    pub dead: bool,
}

impl PolyFace {
    #[inline]
    pub fn degree(&self) -> usize {
        self.verts.len()
    }

    /// Reverse winding, keeping the first corner in place.
    pub fn flip(&mut self) {
        if self.verts.len() > 1 {
            self.verts[1..].reverse();
        }
    }
}

/// One undirected edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolyEdge {
    pub v0: i32,
    pub v1: i32,
}

/// One face of a map channel, parallel to a mesh face. Corner entries index
/// into the channel's value array.
#[derive(Clone, Debug, Default)]
pub struct MapFace {
    pub verts: CornerList,
}

impl MapFace {
    /// Reverse winding, keeping the first corner in place.
    pub fn flip(&mut self) {
        if self.verts.len() > 1 {
            self.verts[1..].reverse();
        }
    }
}

/// One map channel: a flat value array plus per-face corner indices into it.
#[derive(Clone, Debug, Default)]
pub struct MapChannel {
    pub values: Vec<Vec3>,
    pub faces: Vec<MapFace>,
}

impl MapChannel {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Reset to `face_count` empty faces and `value_count` zeroed values.
    pub fn reset(&mut self, face_count: usize, value_count: usize) {
        self.faces.clear();
        self.faces.resize(face_count, MapFace::default());
        self.values.clear();
        self.values.resize(value_count, Vec3::ZERO);
    }
}

/// Explicit normals: a normal array plus per-face corner indices into it,
/// parallel to the mesh faces.
#[derive(Clone, Debug, Default)]
pub struct NormalSpec {
    pub normals: Vec<Vec3>,
    pub faces: Vec<CornerList>,
}

/// Indexed n-gon mesh.
#[derive(Clone, Debug, Default)]
pub struct PolyMesh {
    pub verts: Vec<PolyVert>,
    pub faces: Vec<PolyFace>,
    pub edges: Vec<PolyEdge>,
    pub maps: BTreeMap<i32, MapChannel>,
    /// Per-vertex crease channel in `[0, 1]`, present only when crease
    /// support is enabled.
    pub vertex_crease: Option<Vec<f32>>,
    /// Per-edge crease channel in `[0, 1]`, parallel to `edges`.
    pub edge_crease: Option<Vec<f32>>,
    /// Explicit normals, built lazily from smoothing groups when absent.
    pub normals: Option<NormalSpec>,
    edge_lookup: HashMap<(i32, i32), i32>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vert_count(&self) -> usize {
        self.verts.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Append a vertex, returning its index.
    pub fn add_vert(&mut self, p: Vec3) -> i32 {
        self.verts.push(PolyVert { p, dead: false });
        (self.verts.len() - 1) as i32
    }

    /// Append a face, returning its index.
    pub fn add_face(&mut self, corners: &[i32]) -> usize {
        self.faces.push(PolyFace {
            verts: CornerList::from_slice(corners),
            ..Default::default()
        });
        self.faces.len() - 1
    }

    /// Number of addressable positive map channels (one past the highest).
    pub fn map_count(&self) -> i32 {
        self.maps
            .keys()
            .filter(|&&channel| channel >= 0)
            .max()
            .map(|&channel| channel + 1)
            .unwrap_or(0)
    }

    pub fn map(&self, channel: i32) -> Option<&MapChannel> {
        self.maps.get(&channel)
    }

    pub fn map_mut(&mut self, channel: i32) -> Option<&mut MapChannel> {
        self.maps.get_mut(&channel)
    }

    /// Ensure a map channel exists, returning it.
    pub fn set_map_support(&mut self, channel: i32) -> &mut MapChannel {
        self.maps.entry(channel).or_default()
    }

    /// Split borrow: mesh faces (read) and one map channel (write), for
    /// builders that rebuild a channel from the face topology.
    pub fn faces_and_map_mut(&mut self, channel: i32) -> (&[PolyFace], &mut MapChannel) {
        self.maps.entry(channel).or_default();
        let map = self.maps.get_mut(&channel).expect("channel just inserted");
        (&self.faces, map)
    }

    /// Split borrow: mesh faces (read) and the normal spec (write).
    pub fn faces_and_normals_mut(&mut self) -> (&[PolyFace], &mut NormalSpec) {
        let spec = self.normals.get_or_insert_with(NormalSpec::default);
        (&self.faces, spec)
    }

    /// OR of the smoothing groups of all live faces.
    pub fn all_smoothing_groups(&self) -> u32 {
        self.faces
            .iter()
            .filter(|f| !f.dead)
            .fold(0, |acc, f| acc | f.smoothing_group)
    }

    /// Rebuild the edge list from the live faces. Existing edge crease
    /// values are carried over by vertex pair; edges that no longer exist
    /// lose theirs.
    pub fn fill_in_edges(&mut self) {
        let old_creases: Option<HashMap<(i32, i32), f32>> =
            self.edge_crease.as_ref().map(|creases| {
                self.edges
                    .iter()
                    .zip(creases.iter())
                    .map(|(e, &c)| (edge_key(e.v0, e.v1), c))
                    .collect()
            });

        self.edges.clear();
        self.edge_lookup.clear();
        for face in self.faces.iter().filter(|f| !f.dead) {
            let deg = face.degree();
            for j in 0..deg {
                let v0 = face.verts[j];
                let v1 = face.verts[(j + 1) % deg];
                if v0 == v1 {
                    continue;
                }
                let key = edge_key(v0, v1);
                if !self.edge_lookup.contains_key(&key) {
                    self.edge_lookup.insert(key, self.edges.len() as i32);
                    self.edges.push(PolyEdge { v0, v1 });
                }
            }
        }

        if let Some(old) = old_creases {
            self.edge_crease = Some(
                self.edges
                    .iter()
                    .map(|e| old.get(&edge_key(e.v0, e.v1)).copied().unwrap_or(0.0))
                    .collect(),
            );
        }
    }

    /// Find the edge between two vertices, in either direction.
    pub fn find_edge(&self, v0: i32, v1: i32) -> Option<i32> {
        self.edge_lookup.get(&edge_key(v0, v1)).copied()
    }

    /// Enable the per-vertex crease channel (zeroed) if absent.
    pub fn set_vertex_crease_support(&mut self) -> &mut Vec<f32> {
        let count = self.verts.len();
        self.vertex_crease.get_or_insert_with(|| vec![0.0; count])
    }

    /// Enable the per-edge crease channel (zeroed) if absent. Builds the
    /// edge list first when it has not been filled in yet.
    pub fn set_edge_crease_support(&mut self) -> &mut Vec<f32> {
        if self.edges.is_empty() && !self.faces.is_empty() {
            self.fill_in_edges();
        }
        let count = self.edges.len();
        self.edge_crease.get_or_insert_with(|| vec![0.0; count])
    }

    /// Apply an affine transform to all vertex positions (and explicit
    /// normals, renormalized) in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        for vert in &mut self.verts {
            vert.p = matrix.transform_point3(vert.p);
        }
        if let Some(spec) = &mut self.normals {
            for normal in &mut spec.normals {
                *normal = matrix.transform_vector3(*normal).normalize_or_zero();
            }
        }
    }

    /// Bounding box of the live vertices.
    pub fn bounding_box(&self) -> BBox3f {
        let mut bbox = BBox3f::EMPTY;
        for vert in self.verts.iter().filter(|v| !v.dead) {
            bbox.expand_by_point(vert.p);
        }
        bbox
    }

    /// Corner positions of one face.
    pub fn face_positions(&self, face_idx: usize) -> Vec<Vec3> {
        self.faces[face_idx]
            .verts
            .iter()
            .filter_map(|&v| self.verts.get(v as usize).map(|vert| vert.p))
            .collect()
    }

    /// Geometric normal of one face.
    pub fn face_normal(&self, face_idx: usize) -> Vec3 {
        newell_normal(&self.face_positions(face_idx))
    }

    /// Build the explicit normal spec from smoothing groups if absent.
    pub fn ensure_normals(&mut self) {
        if self.normals.is_some() {
            return;
        }
        let positions: Vec<Vec3> = self.verts.iter().map(|v| v.p).collect();
        let face_data: Vec<(CornerList, u32)> = self
            .faces
            .iter()
            .map(|f| {
                if f.dead {
                    (CornerList::new(), 0)
                } else {
                    (f.verts.clone(), f.smoothing_group)
                }
            })
            .collect();
        let (normals, face_ids) = compute_smoothed_normals(&positions, &face_data);
        self.normals = Some(NormalSpec { normals, faces: face_ids });
    }

    /// Split every face whose vertices deviate from its best-fit plane by
    /// more than `tolerance` into triangles, keeping map channels, explicit
    /// normals and material ids consistent on the new faces.
    pub fn make_planar(&mut self, tolerance: f32) {
        let mut splits: Vec<(usize, Vec<SmallVec<[usize; 4]>>)> = Vec::new();
        for (fi, face) in self.faces.iter().enumerate() {
            if face.dead || face.degree() <= 3 {
                continue;
            }
            let points = self.face_positions(fi);
            if points.len() < face.degree() {
                continue;
            }
            if plane_deviation(&points) > tolerance {
                splits.push((fi, fan_patterns(face.degree())));
            }
        }
        self.apply_face_splits(splits);
    }

    /// Split every concave face into triangles by ear clipping, keeping map
    /// channels, explicit normals and material ids consistent.
    pub fn make_convex(&mut self) {
        let mut splits: Vec<(usize, Vec<SmallVec<[usize; 4]>>)> = Vec::new();
        for (fi, face) in self.faces.iter().enumerate() {
            if face.dead || face.degree() <= 3 {
                continue;
            }
            let points = self.face_positions(fi);
            if points.len() < face.degree() || is_convex(&points) {
                continue;
            }
            let patterns = ear_clip(&points)
                .into_iter()
                .map(SmallVec::from_vec)
                .collect::<Vec<_>>();
            if !patterns.is_empty() {
                splits.push((fi, patterns));
            }
        }
        self.apply_face_splits(splits);
    }

    /// Replace faces with sub-faces described as corner-position patterns.
    /// The first pattern rewrites the face in place, the rest append. Map
    /// channel faces and normal spec faces follow the same pattern so no
    /// per-corner data is lost.
    fn apply_face_splits(&mut self, splits: Vec<(usize, Vec<SmallVec<[usize; 4]>>)>) {
        if splits.is_empty() {
            return;
        }
        // Mesh faces, map faces and normal faces grow in lockstep so the
        // parallel structure survives every split.
        let mut expected_len = self.faces.len();
        for (fi, patterns) in splits {
            let original = self.faces[fi].clone();
            for (pi, pattern) in patterns.iter().enumerate() {
                let corners: CornerList =
                    pattern.iter().map(|&c| original.verts[c]).collect();
                if pi == 0 {
                    self.faces[fi].verts = corners;
                } else {
                    self.faces.push(PolyFace {
                        verts: corners,
                        material: original.material,
                        smoothing_group: original.smoothing_group,
                        dead: false,
                    });
                }
            }

            for map in self.maps.values_mut() {
                if map.faces.len() != expected_len || fi >= map.faces.len() {
                    continue;
                }
                let map_original = map.faces[fi].clone();
                if map_original.verts.len() != original.verts.len() {
                    // Degree mismatch; duplicate the face so the channel
                    // stays parallel to the mesh.
                    for _ in 1..patterns.len() {
                        map.faces.push(map_original.clone());
                    }
                    continue;
                }
                for (pi, pattern) in patterns.iter().enumerate() {
                    let corners: CornerList =
                        pattern.iter().map(|&c| map_original.verts[c]).collect();
                    if pi == 0 {
                        map.faces[fi].verts = corners;
                    } else {
                        map.faces.push(MapFace { verts: corners });
                    }
                }
            }

            if let Some(spec) = &mut self.normals {
                if spec.faces.len() == expected_len && fi < spec.faces.len() {
                    let spec_original = spec.faces[fi].clone();
                    if spec_original.len() != original.verts.len() {
                        for _ in 1..patterns.len() {
                            spec.faces.push(spec_original.clone());
                        }
                    } else {
                        for (pi, pattern) in patterns.iter().enumerate() {
                            let corners: CornerList =
                                pattern.iter().map(|&c| spec_original[c]).collect();
                            if pi == 0 {
                                spec.faces[fi] = corners;
                            } else {
                                spec.faces.push(corners);
                            }
                        }
                    }
                }
            }

            expected_len += patterns.len() - 1;
        }

        if !self.edges.is_empty() {
            self.fill_in_edges();
        }
    }

    /// Remove dead and degenerate faces (duplicate or out-of-range corners)
    /// and compact the mesh, dropping unreferenced dead vertices.
    pub fn cleanup(&mut self) {
        let vert_count = self.verts.len();
        for face in &mut self.faces {
            if face.dead {
                continue;
            }
            let deg = face.degree();
            let out_of_range = face
                .verts
                .iter()
                .any(|&v| v < 0 || v as usize >= vert_count);
            let duplicated = (0..deg)
                .any(|i| (i + 1..deg).any(|j| face.verts[i] == face.verts[j]));
            if deg < 3 || out_of_range || duplicated {
                face.dead = true;
            }
        }
        self.remove_dead_faces();
        self.collapse_dead_verts();
    }

    /// Drop faces flagged dead, along with their parallel map channel and
    /// normal spec faces.
    pub fn remove_dead_faces(&mut self) {
        if self.faces.iter().all(|f| !f.dead) {
            return;
        }
        let keep: Vec<bool> = self.faces.iter().map(|f| !f.dead).collect();
        retain_by_mask(&mut self.faces, &keep);
        for map in self.maps.values_mut() {
            if map.faces.len() == keep.len() {
                retain_by_mask(&mut map.faces, &keep);
            }
        }
        if let Some(spec) = &mut self.normals {
            if spec.faces.len() == keep.len() {
                retain_by_mask(&mut spec.faces, &keep);
            }
        }
        if !self.edges.is_empty() {
            self.fill_in_edges();
        }
    }

    /// Drop dead vertices that no live face references, remapping face
    /// corner indices and the vertex crease channel. Returns the number of
    /// vertices removed.
    pub fn collapse_dead_verts(&mut self) -> usize {
        let mut used = vec![false; self.verts.len()];
        for face in self.faces.iter().filter(|f| !f.dead) {
            for &v in &face.verts {
                if let Some(flag) = used.get_mut(v as usize) {
                    *flag = true;
                }
            }
        }
        let keep: Vec<bool> = self
            .verts
            .iter()
            .enumerate()
            .map(|(i, v)| !v.dead || used[i])
            .collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        let mut remap = vec![-1i32; self.verts.len()];
        let mut next = 0i32;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                remap[i] = next;
                next += 1;
            }
        }

        retain_by_mask(&mut self.verts, &keep);
        if let Some(creases) = &mut self.vertex_crease {
            if creases.len() == keep.len() {
                retain_by_mask(creases, &keep);
            }
        }
        for face in &mut self.faces {
            for v in &mut face.verts {
                *v = remap.get(*v as usize).copied().unwrap_or(-1);
            }
        }
        if !self.edges.is_empty() {
            // Remap surviving edges first so crease values carry over under
            // the new vertex ids, then rebuild from the faces.
            let creases = self.edge_crease.take();
            let mut kept_edges = Vec::with_capacity(self.edges.len());
            let mut kept_creases = creases.as_ref().map(|_| Vec::new());
            for (i, edge) in self.edges.iter().enumerate() {
                let v0 = remap.get(edge.v0 as usize).copied().unwrap_or(-1);
                let v1 = remap.get(edge.v1 as usize).copied().unwrap_or(-1);
                if v0 >= 0 && v1 >= 0 {
                    kept_edges.push(PolyEdge { v0, v1 });
                    if let (Some(out), Some(src)) = (&mut kept_creases, &creases) {
                        out.push(src.get(i).copied().unwrap_or(0.0));
                    }
                }
            }
            self.edges = kept_edges;
            self.edge_crease = kept_creases;
            self.fill_in_edges();
        }
        removed
    }

    /// Triangulate into a [`TriMesh`], fanning each n-gon from its first
    /// corner. Map channels follow the same fan; explicit normals are left
    /// behind (rebuilt lazily on demand).
    pub fn to_tri_mesh(&self) -> TriMesh {
        let mut tri = TriMesh::new();
        tri.verts = self.verts.iter().map(|v| v.p).collect();

        for (channel, map) in &self.maps {
            let out = tri.set_map_support(*channel);
            out.values = map.values.clone();
        }

        for (fi, face) in self.faces.iter().enumerate() {
            if face.dead || face.degree() < 3 {
                continue;
            }
            for w in 1..face.degree() - 1 {
                tri.faces.push(crate::native::TriFace {
                    v: [face.verts[0], face.verts[w], face.verts[w + 1]],
                    material: face.material,
                    smoothing_group: face.smoothing_group,
                });
                for (channel, map) in &self.maps {
                    if map.faces.len() != self.faces.len() {
                        continue;
                    }
                    let src = &map.faces[fi].verts;
                    if src.len() == face.degree() {
                        if let Some(out) = tri.map_mut(*channel) {
                            out.faces.push([src[0], src[w], src[w + 1]]);
                        }
                    }
                }
            }
        }
        tri
    }

    /// Build from a [`TriMesh`]: one 3-gon face per triangle, map channels
    /// copied as-is.
    pub fn from_tri_mesh(tri: &TriMesh) -> Self {
        let mut mesh = Self::new();
        mesh.verts = tri
            .verts
            .iter()
            .map(|&p| PolyVert { p, dead: false })
            .collect();
        mesh.faces = tri
            .faces
            .iter()
            .map(|f| PolyFace {
                verts: CornerList::from_slice(&f.v),
                material: f.material,
                smoothing_group: f.smoothing_group,
                dead: false,
            })
            .collect();
        for (channel, map) in &tri.maps {
            let out = mesh.set_map_support(*channel);
            out.values = map.values.clone();
            out.faces = map
                .faces
                .iter()
                .map(|f| MapFace { verts: CornerList::from_slice(f) })
                .collect();
        }
        mesh
    }
}

#[inline]
fn edge_key(v0: i32, v1: i32) -> (i32, i32) {
    if v0 <= v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });
}

/// Triangle fan from corner 0, as corner-position patterns.
fn fan_patterns(degree: usize) -> Vec<SmallVec<[usize; 4]>> {
    (1..degree - 1)
        .map(|w| SmallVec::from_slice(&[0, w, w + 1]))
        .collect()
}

/// Ear-clip a (possibly concave) polygon into triangles of corner
/// positions. Falls back to a fan when numerically stuck.
fn ear_clip(points: &[Vec3]) -> Vec<Vec<usize>> {
    let normal = newell_normal(points);
    let mut ring: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    let signed_area = |a: Vec3, b: Vec3, c: Vec3| (b - a).cross(c - a).dot(normal);

    while ring.len() > 3 {
        let n = ring.len();
        let mut clipped = false;
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let current = ring[i];
            let next = ring[(i + 1) % n];
            if signed_area(points[prev], points[current], points[next]) <= 0.0 {
                continue;
            }
            let ear_blocked = ring.iter().any(|&other| {
                other != prev
                    && other != current
                    && other != next
                    && point_in_triangle(
                        points[other],
                        points[prev],
                        points[current],
                        points[next],
                        normal,
                    )
            });
            if ear_blocked {
                continue;
            }
            triangles.push(vec![prev, current, next]);
            ring.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            for w in 1..ring.len() - 1 {
                triangles.push(vec![ring[0], ring[w], ring[w + 1]]);
            }
            return triangles;
        }
    }
    triangles.push(vec![ring[0], ring[1], ring[2]]);
    triangles
}

fn point_in_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3, normal: Vec3) -> bool {
    let edge = |p0: Vec3, p1: Vec3| (p1 - p0).cross(p - p0).dot(normal);
    let d0 = edge(a, b);
    let d1 = edge(b, c);
    let d2 = edge(c, a);
    d0 >= 0.0 && d1 >= 0.0 && d2 >= 0.0
}
