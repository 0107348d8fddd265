//! Crease data conversion.
//!
//! The native side stores per-vertex and per-edge sharpness floats in
//! `[0, 1]`; the schema side stores corner `(index, sharpness)` arrays and
//! edge-run `(index pairs, lengths, sharpness)` arrays in `[0, 10]`. The
//! scale factor between the two domains is exactly 10. Absence is
//! significant: when no non-zero crease exists, nothing is authored, and
//! empty arrays on import leave crease support disabled.

use crate::core::TimeCode;
use crate::facade::MeshFacade;
use crate::native::PolyMesh;
use crate::usd::UsdMesh;
use crate::util::{clamp, is_almost_zero};
use tracing::warn;

/// Scale from the native `[0, 1]` domain to the schema `[0, 10]` domain.
pub const NATIVE_TO_USD_CREASE: f32 = 10.0;
/// Scale from the schema `[0, 10]` domain to the native `[0, 1]` domain.
pub const USD_TO_NATIVE_CREASE: f32 = 0.1;

/// Writes the native vertex creases as corner sharpness arrays. Only
/// non-zero entries are emitted; nothing is authored when there are none.
pub fn apply_native_vertex_creases(facade: &MeshFacade, usd_mesh: &mut UsdMesh, time: TimeCode) {
    let Some(crease_data) = facade.vertex_crease_data() else {
        return;
    };

    let mut corner_indices: Vec<i32> = Vec::new();
    let mut corner_sharpnesses: Vec<f32> = Vec::new();
    for i in 0..facade.vertex_count() {
        let crease = clamp(crease_data.get(i).copied().unwrap_or(0.0), 0.0, 1.0);
        if !is_almost_zero(crease) {
            corner_indices.push(i as i32);
            corner_sharpnesses.push(crease * NATIVE_TO_USD_CREASE);
        }
    }

    if !corner_indices.is_empty() {
        usd_mesh.corner_indices.set(time, corner_indices);
        usd_mesh.corner_sharpnesses.set(time, corner_sharpnesses);
    }
}

/// Reads corner sharpness arrays into the native vertex crease channel,
/// enabling crease support only when at least one entry exists.
pub fn apply_usd_vertex_creases(usd_mesh: &UsdMesh, mesh: &mut PolyMesh, time: TimeCode) {
    let corner_indices = usd_mesh.corner_indices.get(time).cloned().unwrap_or_default();
    let corner_sharpnesses =
        usd_mesh.corner_sharpnesses.get(time).cloned().unwrap_or_default();

    // No creasing at this time.
    if corner_indices.is_empty() || corner_sharpnesses.is_empty() {
        return;
    }

    if corner_indices.len() != corner_sharpnesses.len() {
        warn!(
            "Vertex creasing data on {} cannot be imported because it is inconsistent: the \
             sizes of cornerIndices and cornerSharpnesses should be equal.",
            usd_mesh.path
        );
        return;
    }

    let dead: Vec<bool> = mesh.verts.iter().map(|v| v.dead).collect();
    let creases = mesh.set_vertex_crease_support();
    for (i, &vertex) in corner_indices.iter().enumerate() {
        let vertex = vertex as usize;
        if vertex >= dead.len() || dead[vertex] {
            continue;
        }
        // The native side only handles sharpness in [0, 1]; schema creases
        // range 0 to 10, anything above being perfectly sharp. Negative
        // values clamp to 0, values over 10 to 1 after rescaling.
        creases[vertex] =
            clamp(corner_sharpnesses[i] * USD_TO_NATIVE_CREASE, 0.0, 1.0);
    }
}

/// Writes the native edge creases as edge-run sharpness arrays. Every run
/// covers exactly one edge (length 2). Only non-zero entries are emitted;
/// nothing is authored when there are none.
pub fn apply_native_edge_creases(facade: &MeshFacade, usd_mesh: &mut UsdMesh, time: TimeCode) {
    let Some(crease_data) = facade.edge_crease_data() else {
        return;
    };

    let mut crease_indices: Vec<i32> = Vec::new();
    let mut crease_lengths: Vec<i32> = Vec::new();
    let mut crease_sharpnesses: Vec<f32> = Vec::new();
    for edge in 0..facade.edge_count() {
        let crease = clamp(crease_data.get(edge).copied().unwrap_or(0.0), 0.0, 1.0);
        if !is_almost_zero(crease) {
            crease_indices.push(facade.edge_vertex(edge, true));
            crease_indices.push(facade.edge_vertex(edge, false));
            crease_lengths.push(2);
            crease_sharpnesses.push(crease * NATIVE_TO_USD_CREASE);
        }
    }

    if !crease_indices.is_empty() {
        usd_mesh.crease_indices.set(time, crease_indices);
        usd_mesh.crease_lengths.set(time, crease_lengths);
        usd_mesh.crease_sharpnesses.set(time, crease_sharpnesses);
    }
}

/// Reads edge-run sharpness arrays into the native edge crease channel,
/// enabling crease support only when at least one entry exists. Runs of
/// any length are accepted: each consecutive vertex pair of a run gets the
/// run's sharpness.
pub fn apply_usd_edge_creases(usd_mesh: &UsdMesh, mesh: &mut PolyMesh, time: TimeCode) {
    let crease_indices = usd_mesh.crease_indices.get(time).cloned().unwrap_or_default();
    let crease_lengths = usd_mesh.crease_lengths.get(time).cloned().unwrap_or_default();
    let crease_sharpnesses =
        usd_mesh.crease_sharpnesses.get(time).cloned().unwrap_or_default();

    // No creasing at this time.
    if crease_indices.is_empty() || crease_lengths.is_empty() || crease_sharpnesses.is_empty() {
        return;
    }

    // The run lengths must sum to the index count, and there must be one
    // sharpness per run.
    let index_total: i32 = crease_lengths.iter().sum();
    if crease_indices.len() != index_total.max(0) as usize
        || crease_lengths.len() != crease_sharpnesses.len()
    {
        warn!(
            "Edge creasing data on {} cannot be imported because it is inconsistent: the \
             size of creaseIndices should be the sum of all creaseLengths, and the sizes of \
             creaseLengths and creaseSharpnesses should be equal.",
            usd_mesh.path
        );
        return;
    }

    mesh.set_edge_crease_support();

    // Resolve each run's vertex pairs to edge indices first; the crease
    // channel is written in one pass after.
    let mut writes: Vec<(usize, f32)> = Vec::new();
    let mut base = 0usize;
    for (run, &length) in crease_lengths.iter().enumerate() {
        let length = length.max(0) as usize;
        for i in 0..length.saturating_sub(1) {
            if let Some(edge) =
                mesh.find_edge(crease_indices[base + i], crease_indices[base + i + 1])
            {
                writes.push((
                    edge as usize,
                    clamp(crease_sharpnesses[run] * USD_TO_NATIVE_CREASE, 0.0, 1.0),
                ));
            }
        }
        base += length;
    }

    if let Some(creases) = &mut mesh.edge_crease {
        for (edge, value) in writes {
            if edge < creases.len() {
                creases[edge] = value;
            }
        }
    }
}
