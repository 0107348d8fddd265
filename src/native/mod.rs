//! DCC-side native mesh models.
//!
//! Two structurally different representations exist on the native side:
//! [`PolyMesh`], an indexed n-gon mesh with per-face-vertex map channels,
//! edge list and crease channels, and [`TriMesh`], a simpler fixed-arity
//! triangle mesh without edges or creases. The conversion engine never
//! touches either directly - it goes through [`crate::facade::MeshFacade`].

pub mod poly;
pub mod tri;

pub use poly::{MapChannel, MapFace, NormalSpec, PolyEdge, PolyFace, PolyMesh, PolyVert};
pub use tri::{TriFace, TriMapChannel, TriMesh, TriNormalSpec};

use crate::util::{newell_normal, Vec3};
use smallvec::SmallVec;

/// Hidden alpha map channel.
pub const ALPHA_CHANNEL: i32 = -2;
/// Hidden shading map channel.
pub const SHADING_CHANNEL: i32 = -1;
/// Vertex color map channel.
pub const VERTEX_COLOR_CHANNEL: i32 = 0;
/// Number of hidden (negative) map channels.
pub const NUM_HIDDEN_MAPS: i32 = 2;
/// Total number of addressable positive map channels.
pub const MAX_MESH_MAPS: i32 = 100;

/// Corner list of one face. Most faces are tris or quads.
pub type CornerList = SmallVec<[i32; 4]>;

/// Builds explicit normals from face smoothing groups: faces sharing
/// smoothing-group bits at a vertex share one averaged normal there, faces
/// with no smoothing group stay faceted. Returns the normal array and one
/// normal-index list per face, parallel to the input faces.
pub(crate) fn compute_smoothed_normals(
    positions: &[Vec3],
    faces: &[(CornerList, u32)],
) -> (Vec<Vec3>, Vec<CornerList>) {
    let face_normals: Vec<Vec3> = faces
        .iter()
        .map(|(corners, _)| {
            let points: Vec<Vec3> = corners
                .iter()
                .filter_map(|&v| positions.get(v as usize).copied())
                .collect();
            newell_normal(&points)
        })
        .collect();

    let mut vert_faces: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
    for (fi, (corners, _)) in faces.iter().enumerate() {
        for &v in corners {
            if let Some(list) = vert_faces.get_mut(v as usize) {
                list.push(fi);
            }
        }
    }

    let mut normals: Vec<Vec3> = Vec::new();
    let mut face_normal_ids: Vec<CornerList> = faces
        .iter()
        .map(|(corners, _)| corners.iter().map(|_| 0).collect())
        .collect();

    for (v, incident) in vert_faces.iter().enumerate() {
        // Merge incident faces into smoothing clusters. Transitive: a face
        // sharing bits with any face of a cluster joins that cluster.
        let mut clusters: Vec<(u32, Vec<usize>)> = Vec::new();
        for &fi in incident {
            let sm = faces[fi].1;
            if sm == 0 {
                // No smoothing group: faceted corner.
                clusters.push((0, vec![fi]));
                continue;
            }
            let mut target: Option<usize> = None;
            let mut ci = 0;
            while ci < clusters.len() {
                if clusters[ci].0 != 0 && clusters[ci].0 & sm != 0 {
                    match target {
                        None => {
                            clusters[ci].0 |= sm;
                            clusters[ci].1.push(fi);
                            target = Some(ci);
                        }
                        Some(t) => {
                            let (bits, members) = clusters.remove(ci);
                            clusters[t].0 |= bits;
                            clusters[t].1.extend(members);
                            continue;
                        }
                    }
                }
                ci += 1;
            }
            if target.is_none() {
                clusters.push((sm, vec![fi]));
            }
        }

        for (_, members) in &clusters {
            let summed: Vec3 = members.iter().map(|&fi| face_normals[fi]).sum();
            let id = normals.len() as i32;
            normals.push(summed.normalize_or_zero());
            for &fi in members {
                for (j, &corner) in faces[fi].0.iter().enumerate() {
                    if corner as usize == v {
                        face_normal_ids[fi][j] = id;
                    }
                }
            }
        }
    }

    (normals, face_normal_ids)
}
