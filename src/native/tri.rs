//! Fixed-arity triangle mesh.
//!
//! The simpler native representation: every face has exactly three corners,
//! there is no edge list and no crease support. Map channels mirror the
//! triangle topology with their own value arrays.

use crate::native::{compute_smoothed_normals, CornerList};
use crate::util::{BBox3f, Mat4, Vec3};
use std::collections::BTreeMap;

/// One triangle.
#[derive(Clone, Copy, Debug, Default)]
pub struct TriFace {
    pub v: [i32; 3],
    pub material: u16,
    pub smoothing_group: u32,
}

/// One triangle map channel: a flat value array plus per-face corner
/// indices into it.
#[derive(Clone, Debug, Default)]
pub struct TriMapChannel {
    pub values: Vec<Vec3>,
    pub faces: Vec<[i32; 3]>,
}

/// Explicit normals, parallel to the triangle faces.
#[derive(Clone, Debug, Default)]
pub struct TriNormalSpec {
    pub normals: Vec<Vec3>,
    pub faces: Vec<[i32; 3]>,
}

/// Fixed-arity triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct TriMesh {
    pub verts: Vec<Vec3>,
    pub faces: Vec<TriFace>,
    pub maps: BTreeMap<i32, TriMapChannel>,
    pub normals: Option<TriNormalSpec>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vert_count(&self) -> usize {
        self.verts.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
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

    pub fn map(&self, channel: i32) -> Option<&TriMapChannel> {
        self.maps.get(&channel)
    }

    pub fn map_mut(&mut self, channel: i32) -> Option<&mut TriMapChannel> {
        self.maps.get_mut(&channel)
    }

    /// Ensure a map channel exists, returning it.
    pub fn set_map_support(&mut self, channel: i32) -> &mut TriMapChannel {
        self.maps.entry(channel).or_default()
    }

    /// OR of the smoothing groups of all faces.
    pub fn all_smoothing_groups(&self) -> u32 {
        self.faces.iter().fold(0, |acc, f| acc | f.smoothing_group)
    }

    /// Apply an affine transform to all vertex positions (and explicit
    /// normals, renormalized) in place.
    pub fn transform(&mut self, matrix: &Mat4) {
        for vert in &mut self.verts {
            *vert = matrix.transform_point3(*vert);
        }
        if let Some(spec) = &mut self.normals {
            for normal in &mut spec.normals {
                *normal = matrix.transform_vector3(*normal).normalize_or_zero();
            }
        }
    }

    pub fn bounding_box(&self) -> BBox3f {
        BBox3f::from_points(&self.verts)
    }

    /// Drop triangles with duplicated or out-of-range corners, along with
    /// their parallel map channel and normal spec faces.
    pub fn remove_degenerate_faces(&mut self) {
        let vert_count = self.verts.len() as i32;
        let keep: Vec<bool> = self
            .faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.v;
                a != b
                    && b != c
                    && c != a
                    && f.v.iter().all(|&v| v >= 0 && v < vert_count)
            })
            .collect();
        if keep.iter().all(|&k| k) {
            return;
        }
        let face_total = keep.len();
        retain_mask(&mut self.faces, &keep);
        for map in self.maps.values_mut() {
            if map.faces.len() == face_total {
                retain_mask(&mut map.faces, &keep);
            }
        }
        if let Some(spec) = &mut self.normals {
            if spec.faces.len() == face_total {
                retain_mask(&mut spec.faces, &keep);
            }
        }
    }

    /// Build the explicit normal spec from smoothing groups if absent.
    pub fn ensure_normals(&mut self) {
        if self.normals.is_some() {
            return;
        }
        let face_data: Vec<(CornerList, u32)> = self
            .faces
            .iter()
            .map(|f| (CornerList::from_slice(&f.v), f.smoothing_group))
            .collect();
        let (normals, face_ids) = compute_smoothed_normals(&self.verts, &face_data);
        self.normals = Some(TriNormalSpec {
            normals,
            faces: face_ids.iter().map(|c| [c[0], c[1], c[2]]).collect(),
        });
    }
}

fn retain_mask<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let kept = keep[index];
        index += 1;
        kept
    });
}
