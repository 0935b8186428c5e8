//! Position evaluation: the Catmull-Clark stencils.
//!
//! Given frozen [`Topology`] tables and the current seed positions, this
//! module fills the refined position array. The three stages run in a
//! fixed order — face centers, edge centers, base-vertex updates — because
//! the edge-center stencil reads the face centers written by the first
//! stage. Every stencil is a linear combination of seed positions with
//! weights summing to one, so refined positions are affine in the seed
//! positions (morph interpolation on the seed commutes with refinement).
//!
//! All arithmetic is single precision. A pass is linear in the number of
//! active vertices, faces, and edges, with `O(max_faces)` work per base
//! vertex.

use nalgebra::{Point3, Vector3};

use super::topology::Topology;

/// Evaluate all refined positions.
///
/// `out` must hold [`Topology::num_refined_vertices`] entries; its layout
/// is the three contiguous ranges `[0, cbase)` base, `[cbase, ebase)` face
/// centers, `[ebase, ..)` edge centers.
pub(crate) fn evaluate_positions(
    topo: &Topology,
    seed: &[Point3<f32>],
    out: &mut [Point3<f32>],
) {
    debug_assert_eq!(out.len(), topo.num_refined_vertices());
    face_points(topo, seed, out);
    edge_points(topo, seed, out);
    base_points(topo, seed, out);
}

/// Stage 1: one point per active face, at the mean of its four corners.
fn face_points(topo: &Topology, seed: &[Point3<f32>], out: &mut [Point3<f32>]) {
    let cbase = topo.cbase();
    for (af, corners) in topo.face_verts.iter().enumerate() {
        let mut sum = Vector3::zeros();
        for &vi in corners {
            sum += seed[vi as usize].coords;
        }
        out[cbase + af] = Point3::from(sum * 0.25);
    }
}

/// Stage 2: one point per canonical edge.
///
/// Interior edges average the two endpoints with the two adjacent face
/// centers; boundary edges (aliased face slots) take the plain midpoint,
/// which keeps mesh borders from pulling inward.
fn edge_points(topo: &Topology, seed: &[Point3<f32>], out: &mut [Point3<f32>]) {
    let cbase = topo.cbase();
    let ebase = topo.ebase();
    for (eid, edge) in topo.edges.iter().enumerate() {
        let pa = seed[topo.vtx_map[edge.verts[0] as usize] as usize].coords;
        let pb = seed[topo.vtx_map[edge.verts[1] as usize] as usize].coords;
        out[ebase + eid] = if edge.is_boundary() {
            Point3::from((pa + pb) * 0.5)
        } else {
            let c1 = out[cbase + edge.faces[0] as usize].coords;
            let c2 = out[cbase + edge.faces[1] as usize].coords;
            Point3::from((pa + pb + c1 + c2) * 0.25)
        };
    }
}

/// Stage 3: reposition each base vertex from its incident edges and faces.
///
/// Three cases, tested in order:
/// 1. fewer than three incident faces (corners and sparse poles): pull
///    toward the edge midpoints, `(3R - Q) / 2`;
/// 2. as many incident edges as faces (interior vertex): the classic
///    `(Q + 2R + (n-3)S) / n` stencil;
/// 3. otherwise (interior vertex touching a boundary): average the
///    boundary edge midpoints with the original position, all weighted
///    `1 / (nb + 1)`.
fn base_points(topo: &Topology, seed: &[Point3<f32>], out: &mut [Point3<f32>]) {
    let cbase = topo.cbase();
    for v in 0..cbase {
        let vs = topo.vtx_map[v] as usize;
        let original = seed[vs].coords;
        let n = topo.nfaces[v] as usize;
        let m = topo.nedges[v] as usize;

        let mut mid_sum = Vector3::zeros();
        let mut boundary_mid_sum = Vector3::zeros();
        let mut num_boundary = 0usize;
        for &eid in topo.edges_of(v) {
            let edge = &topo.edges[eid as usize];
            let pa = seed[topo.vtx_map[edge.verts[0] as usize] as usize].coords;
            let pb = seed[topo.vtx_map[edge.verts[1] as usize] as usize].coords;
            let mid = (pa + pb) * 0.5;
            mid_sum += mid;
            if edge.is_boundary() {
                boundary_mid_sum += mid;
                num_boundary += 1;
            }
        }
        let edge_mean = mid_sum / m as f32;

        let mut center_sum = Vector3::zeros();
        for &af in topo.faces_of(v) {
            center_sum += out[cbase + af as usize].coords;
        }
        let face_mean = center_sum / n as f32;

        out[v] = if n < 3 {
            Point3::from((edge_mean * 3.0 - face_mean) * 0.5)
        } else if m == n {
            let nf = n as f32;
            Point3::from((face_mean + edge_mean * 2.0 + original * (nf - 3.0)) / nf)
        } else {
            // The original position shares the boundary denominator so the
            // weights stay affine.
            Point3::from((boundary_mid_sum + original) / (num_boundary + 1) as f32)
        };
    }
}
