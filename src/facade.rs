//! A facade to work with the two native mesh kinds transparently.
//!
//! All conversion algorithms go through this view instead of touching
//! [`PolyMesh`] or [`TriMesh`] directly. The concrete kind is selected once
//! at construction; no algorithm above the facade inspects it again.
//!
//! The facade memoizes the flattened face-vertex index list and its count,
//! assuming the mesh does not change behind its back. Mutating operations
//! (`triangulate`, `make_planar`, `make_convex`, `cleanup`) invalidate
//! those caches themselves.
//!
//! Read accessors never fail: where the underlying representation lacks a
//! concept (triangle meshes have no edges and no creases), they fall back
//! to a documented default (`None`, `0`, empty).

use crate::native::{PolyMesh, TriMesh};
use crate::util::{BBox3f, Mat4, Vec3};
use std::sync::Arc;

enum MeshRef<'a> {
    Poly(&'a mut PolyMesh),
    Tri(&'a mut TriMesh),
    OwnedPoly(Box<PolyMesh>),
    OwnedTri(Box<TriMesh>),
}

/// Uniform query/mutate view over one native mesh.
pub struct MeshFacade<'a> {
    mesh: MeshRef<'a>,
    face_indices: Option<Arc<Vec<i32>>>,
    normal_indices: Option<Arc<Vec<i32>>>,
    face_vertex_indices_count: Option<usize>,
}

impl<'a> MeshFacade<'a> {
    /// Wrap a caller-owned poly mesh.
    pub fn from_poly(mesh: &'a mut PolyMesh) -> Self {
        Self::new(MeshRef::Poly(mesh))
    }

    /// Wrap a caller-owned triangle mesh.
    pub fn from_tri(mesh: &'a mut TriMesh) -> Self {
        Self::new(MeshRef::Tri(mesh))
    }

    fn new(mesh: MeshRef<'a>) -> Self {
        Self {
            mesh,
            face_indices: None,
            normal_indices: None,
            face_vertex_indices_count: None,
        }
    }

    fn poly(&self) -> Option<&PolyMesh> {
        match &self.mesh {
            MeshRef::Poly(mesh) => Some(mesh),
            MeshRef::OwnedPoly(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn poly_mut(&mut self) -> Option<&mut PolyMesh> {
        match &mut self.mesh {
            MeshRef::Poly(mesh) => Some(mesh),
            MeshRef::OwnedPoly(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn tri(&self) -> Option<&TriMesh> {
        match &self.mesh {
            MeshRef::Tri(mesh) => Some(mesh),
            MeshRef::OwnedTri(mesh) => Some(mesh),
            _ => None,
        }
    }

    fn tri_mut(&mut self) -> Option<&mut TriMesh> {
        match &mut self.mesh {
            MeshRef::Tri(mesh) => Some(mesh),
            MeshRef::OwnedTri(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Whether the wrapped mesh is a poly mesh.
    pub fn is_poly(&self) -> bool {
        self.poly().is_some()
    }

    // Mesh data:

    pub fn vertex_count(&self) -> usize {
        match &self.mesh {
            MeshRef::Poly(m) => m.vert_count(),
            MeshRef::OwnedPoly(m) => m.vert_count(),
            MeshRef::Tri(m) => m.vert_count(),
            MeshRef::OwnedTri(m) => m.vert_count(),
        }
    }

    pub fn vertex(&self, i: usize) -> Vec3 {
        if let Some(poly) = self.poly() {
            return poly.verts.get(i).map(|v| v.p).unwrap_or(Vec3::ZERO);
        }
        self.tri()
            .and_then(|t| t.verts.get(i).copied())
            .unwrap_or(Vec3::ZERO)
    }

    pub fn face_count(&self) -> usize {
        if let Some(poly) = self.poly() {
            return poly.face_count();
        }
        self.tri().map(|t| t.face_count()).unwrap_or(0)
    }

    pub fn face_degree(&self, face_idx: usize) -> usize {
        if let Some(poly) = self.poly() {
            return poly.faces.get(face_idx).map(|f| f.degree()).unwrap_or(0);
        }
        if self.tri().map(|t| face_idx < t.face_count()).unwrap_or(false) {
            3
        } else {
            0
        }
    }

    pub fn face_vertex(&self, face_idx: usize, corner_idx: usize) -> i32 {
        if let Some(poly) = self.poly() {
            return poly
                .faces
                .get(face_idx)
                .and_then(|f| f.verts.get(corner_idx).copied())
                .unwrap_or(0);
        }
        self.tri()
            .and_then(|t| t.faces.get(face_idx))
            .and_then(|f| f.v.get(corner_idx).copied())
            .unwrap_or(0)
    }

    pub fn face_is_dead(&self, face_idx: usize) -> bool {
        self.poly()
            .and_then(|p| p.faces.get(face_idx))
            .map(|f| f.dead)
            .unwrap_or(false)
    }

    pub fn face_material(&self, face_idx: usize) -> u16 {
        if let Some(poly) = self.poly() {
            return poly.faces.get(face_idx).map(|f| f.material).unwrap_or(0);
        }
        self.tri()
            .and_then(|t| t.faces.get(face_idx))
            .map(|f| f.material)
            .unwrap_or(0)
    }

    /// Flattened face-vertex index list over all faces, memoized for the
    /// facade's lifetime.
    pub fn face_indices(&mut self) -> Arc<Vec<i32>> {
        if self.face_indices.is_none() {
            let mut indices = Vec::with_capacity(self.face_vertex_indices_count());
            for face_idx in 0..self.face_count() {
                for corner in 0..self.face_degree(face_idx) {
                    indices.push(self.face_vertex(face_idx, corner));
                }
            }
            self.face_indices = Some(Arc::new(indices));
        }
        self.face_indices.as_ref().expect("cache just filled").clone()
    }

    /// Sum of all face degrees, memoized for the facade's lifetime.
    pub fn face_vertex_indices_count(&mut self) -> usize {
        if let Some(count) = self.face_vertex_indices_count {
            return count;
        }
        let count = if let Some(tri) = self.tri() {
            tri.face_count() * 3
        } else {
            self.poly()
                .map(|p| p.faces.iter().map(|f| f.degree()).sum())
                .unwrap_or(0)
        };
        self.face_vertex_indices_count = Some(count);
        count
    }

    /// Per-face vertex degrees, in face order.
    pub fn face_degrees(&self) -> Vec<i32> {
        (0..self.face_count())
            .map(|f| self.face_degree(f) as i32)
            .collect()
    }

    pub fn all_smoothing_groups(&self) -> u32 {
        if let Some(poly) = self.poly() {
            return poly.all_smoothing_groups();
        }
        self.tri().map(|t| t.all_smoothing_groups()).unwrap_or(0)
    }

    // Normals:

    /// Make sure explicit normals exist (deriving them from smoothing
    /// groups when absent) and load the flattened normal index cache.
    pub fn load_normals(&mut self) {
        if let Some(poly) = self.poly_mut() {
            poly.ensure_normals();
            let spec = poly.normals.as_ref().expect("just ensured");
            let indices: Vec<i32> = spec.faces.iter().flat_map(|f| f.iter().copied()).collect();
            self.normal_indices = Some(Arc::new(indices));
            return;
        }
        if let Some(tri) = self.tri_mut() {
            tri.ensure_normals();
            let spec = tri.normals.as_ref().expect("just ensured");
            let indices: Vec<i32> = spec.faces.iter().flat_map(|f| f.iter().copied()).collect();
            self.normal_indices = Some(Arc::new(indices));
        }
    }

    pub fn normal_count(&self) -> usize {
        if let Some(poly) = self.poly() {
            return poly.normals.as_ref().map(|s| s.normals.len()).unwrap_or(0);
        }
        self.tri()
            .and_then(|t| t.normals.as_ref())
            .map(|s| s.normals.len())
            .unwrap_or(0)
    }

    pub fn normal_data(&self) -> Option<&[Vec3]> {
        if let Some(poly) = self.poly() {
            return poly.normals.as_ref().map(|s| s.normals.as_slice());
        }
        self.tri()
            .and_then(|t| t.normals.as_ref())
            .map(|s| s.normals.as_slice())
    }

    /// Flattened normal indices, populated by [`MeshFacade::load_normals`].
    pub fn normal_indices(&self) -> Option<Arc<Vec<i32>>> {
        self.normal_indices.clone()
    }

    // Map channel data:

    /// Number of addressable positive map channels.
    pub fn map_count(&self) -> i32 {
        if let Some(poly) = self.poly() {
            return poly.map_count();
        }
        self.tri().map(|t| t.map_count()).unwrap_or(0)
    }

    pub fn map_face_count(&self, channel: i32) -> usize {
        if let Some(poly) = self.poly() {
            return poly.map(channel).map(|m| m.face_count()).unwrap_or(0);
        }
        self.tri()
            .and_then(|t| t.map(channel))
            .map(|m| m.faces.len())
            .unwrap_or(0)
    }

    pub fn map_face_degree(&self, channel: i32, face_idx: usize) -> usize {
        if let Some(poly) = self.poly() {
            return poly
                .map(channel)
                .and_then(|m| m.faces.get(face_idx))
                .map(|f| f.verts.len())
                .unwrap_or(0);
        }
        if self
            .tri()
            .and_then(|t| t.map(channel))
            .map(|m| face_idx < m.faces.len())
            .unwrap_or(false)
        {
            3
        } else {
            0
        }
    }

    pub fn map_face_vertex(&self, channel: i32, face_idx: usize, corner_idx: usize) -> i32 {
        if let Some(poly) = self.poly() {
            return poly
                .map(channel)
                .and_then(|m| m.faces.get(face_idx))
                .and_then(|f| f.verts.get(corner_idx).copied())
                .unwrap_or(0);
        }
        self.tri()
            .and_then(|t| t.map(channel))
            .and_then(|m| m.faces.get(face_idx))
            .and_then(|f| f.get(corner_idx).copied())
            .unwrap_or(0)
    }

    pub fn map_data(&self, channel: i32) -> Option<&[Vec3]> {
        if let Some(poly) = self.poly() {
            return poly.map(channel).map(|m| m.values.as_slice());
        }
        self.tri().and_then(|t| t.map(channel)).map(|m| m.values.as_slice())
    }

    pub fn map_data_count(&self, channel: i32) -> usize {
        self.map_data(channel).map(|d| d.len()).unwrap_or(0)
    }

    // Vertex and edge creasing (poly meshes only; triangle meshes keep no
    // edge list and no crease channels):

    pub fn has_crease_support(&self) -> bool {
        self.poly().is_some()
    }

    pub fn edge_count(&self) -> usize {
        self.poly().map(|p| p.edge_count()).unwrap_or(0)
    }

    pub fn edge_vertex(&self, edge_idx: usize, start: bool) -> i32 {
        self.poly()
            .and_then(|p| p.edges.get(edge_idx))
            .map(|e| if start { e.v0 } else { e.v1 })
            .unwrap_or(0)
    }

    pub fn vertex_crease_data(&self) -> Option<&[f32]> {
        self.poly()
            .and_then(|p| p.vertex_crease.as_ref())
            .map(|c| c.as_slice())
    }

    pub fn edge_crease_data(&self) -> Option<&[f32]> {
        self.poly()
            .and_then(|p| p.edge_crease.as_ref())
            .map(|c| c.as_slice())
    }

    /// Rebuild the edge list of a poly mesh. No-op for triangle meshes.
    pub fn fill_in_edges(&mut self) {
        if let Some(poly) = self.poly_mut() {
            poly.fill_in_edges();
        }
    }

    pub fn bounding_box(&self) -> BBox3f {
        if let Some(poly) = self.poly() {
            return poly.bounding_box();
        }
        self.tri().map(|t| t.bounding_box()).unwrap_or_default()
    }

    // Mutators. These act in place on the wrapped mesh and invalidate the
    // facade's own caches, since they change topology.

    /// Apply an affine transform to all vertex positions in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        if let Some(poly) = self.poly_mut() {
            poly.transform(matrix);
        } else if let Some(tri) = self.tri_mut() {
            tri.transform(matrix);
        }
        self.clear_cached_data();
    }

    /// Convert n-gons to triangles. The facade swaps to an owned triangle
    /// mesh behind the scenes; the wrapped poly mesh is left untouched.
    pub fn triangulate(&mut self) {
        let tri = match &self.mesh {
            MeshRef::Tri(_) | MeshRef::OwnedTri(_) => return,
            MeshRef::Poly(mesh) => mesh.to_tri_mesh(),
            MeshRef::OwnedPoly(mesh) => mesh.to_tri_mesh(),
        };
        self.mesh = MeshRef::OwnedTri(Box::new(tri));
        self.clear_cached_data();
    }

    /// Convert a triangle mesh to an owned poly mesh. No-op for poly meshes.
    pub fn make_poly(&mut self) {
        let poly = match &self.mesh {
            MeshRef::Poly(_) | MeshRef::OwnedPoly(_) => return,
            MeshRef::Tri(mesh) => PolyMesh::from_tri_mesh(mesh),
            MeshRef::OwnedTri(mesh) => PolyMesh::from_tri_mesh(mesh),
        };
        self.mesh = MeshRef::OwnedPoly(Box::new(poly));
        self.clear_cached_data();
    }

    /// Split non-planar faces. No-op for triangle meshes.
    pub fn make_planar(&mut self, tolerance: f32) {
        if let Some(poly) = self.poly_mut() {
            poly.make_planar(tolerance);
            self.clear_cached_data();
        }
    }

    /// Split concave faces. No-op for triangle meshes.
    pub fn make_convex(&mut self) {
        if let Some(poly) = self.poly_mut() {
            poly.make_convex();
            self.clear_cached_data();
        }
    }

    /// Remove dead and degenerate structures and compact the mesh.
    pub fn cleanup(&mut self) {
        if let Some(poly) = self.poly_mut() {
            poly.cleanup();
        } else if let Some(tri) = self.tri_mut() {
            tri.remove_degenerate_faces();
        }
        self.clear_cached_data();
    }

    fn clear_cached_data(&mut self) {
        self.face_indices = None;
        self.normal_indices = None;
        self.face_vertex_indices_count = None;
    }
}
