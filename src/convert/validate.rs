//! Pre-conversion validation of mapped data against a mesh.

use crate::core::Interpolation;
use crate::native::PolyMesh;

/// Returns whether a `(value_count, indices)` pair is usable for the
/// declared interpolation class on the given mesh.
///
/// Data requirements vary with the interpolation: constant needs one value,
/// vertex/varying one per vertex, uniform one per face, face-varying one per
/// face-corner. Indexed data instead needs that many indices, each in
/// `[0, value_count)`. Extra trailing values are tolerated - only
/// insufficient counts or out-of-range indices fail.
pub fn validate_mapped_data_for_mesh(
    value_count: usize,
    indices: &[i32],
    mesh: &PolyMesh,
    interpolation: Interpolation,
    indexed: bool,
) -> bool {
    let min_value_count = match interpolation {
        Interpolation::Constant => 1,
        Interpolation::Vertex | Interpolation::Varying => mesh.vert_count(),
        Interpolation::Uniform => mesh.face_count(),
        Interpolation::FaceVarying => mesh.faces.iter().map(|f| f.degree()).sum(),
    };

    if !indexed {
        return value_count >= min_value_count;
    }

    // Indexed: the index array takes over the cardinality requirement.
    let min_index_count = min_value_count;
    if indices.len() < min_index_count || value_count < 1 {
        return false;
    }
    indices
        .iter()
        .all(|&idx| idx >= 0 && (idx as usize) < value_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;

    fn quad_mesh() -> PolyMesh {
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
        mesh
    }

    #[test]
    fn test_minimum_counts_non_indexed() {
        let mesh = quad_mesh();
        // Exactly the minimum passes, one below fails, for every class.
        for (interpolation, min) in [
            (Interpolation::Constant, 1usize),
            (Interpolation::Vertex, 4),
            (Interpolation::Varying, 4),
            (Interpolation::Uniform, 1),
            (Interpolation::FaceVarying, 4),
        ] {
            assert!(
                validate_mapped_data_for_mesh(min, &[], &mesh, interpolation, false),
                "{interpolation:?} should accept {min} values"
            );
            if min > 0 {
                assert!(
                    !validate_mapped_data_for_mesh(min - 1, &[], &mesh, interpolation, false),
                    "{interpolation:?} should reject {} values",
                    min - 1
                );
            }
            // Extra trailing values are tolerated.
            assert!(validate_mapped_data_for_mesh(min + 5, &[], &mesh, interpolation, false));
        }
    }

    #[test]
    fn test_minimum_counts_indexed() {
        let mesh = quad_mesh();
        // Four indices needed for vertex interpolation, values can be fewer.
        assert!(validate_mapped_data_for_mesh(
            2,
            &[0, 1, 1, 0],
            &mesh,
            Interpolation::Vertex,
            true
        ));
        assert!(!validate_mapped_data_for_mesh(
            2,
            &[0, 1, 1],
            &mesh,
            Interpolation::Vertex,
            true
        ));
        // Out-of-range or negative indices fail.
        assert!(!validate_mapped_data_for_mesh(
            2,
            &[0, 1, 2, 0],
            &mesh,
            Interpolation::Vertex,
            true
        ));
        assert!(!validate_mapped_data_for_mesh(
            2,
            &[0, -1, 1, 0],
            &mesh,
            Interpolation::Vertex,
            true
        ));
        // Indexed with no values at all fails.
        assert!(!validate_mapped_data_for_mesh(
            0,
            &[0, 0, 0, 0],
            &mesh,
            Interpolation::Vertex,
            true
        ));
    }
}
