//! Attribute lifting: everything refined that is a linear remap of seed data.
//!
//! Positions get their own evaluator; every other refined quantity — UVs,
//! group tags, visibility bits, vertex colors, host-side bone weights —
//! is produced here by pushing seed values through the parent maps or by
//! replicating per-face metadata onto the four sub-faces.
//!
//! The parent map is the contract that makes morph targets and skinning
//! weights liftable without re-solving: each refined vertex lists the seed
//! vertices that define it (one for base vertices, four face corners for
//! face centers, two endpoints for edge centers) with uniform weights, and
//! the inverse map lists, per seed vertex, every refined vertex it helps
//! define. Unused slots hold `-1`.

use nalgebra::{Vector2, Vector3, Vector4};

use super::topology::{Topology, NONE};

/// Per-refined-vertex parent data and its inverse.
#[derive(Debug, Clone)]
pub struct ParentMaps {
    /// One row per refined vertex: up to four seed-vertex parents, `-1`
    /// padded.
    pub(crate) rows: Vec<[i32; 4]>,
    /// The uniform weight of each row's parents: 1, 1/4, or 1/2.
    pub(crate) weights: Vec<f32>,
    /// One row per *seed* vertex, flattened with stride
    /// [`row_len`](ParentMaps::row_len): the refined base vertex, then up
    /// to `max_faces` refined face centers, then up to `max_faces` refined
    /// edge centers. `-1` padded; rows of inactive seed vertices are all
    /// `-1`.
    pub(crate) inverse: Vec<i32>,
    row_len: usize,
}

impl ParentMaps {
    /// Populate both maps from the frozen topology.
    pub(crate) fn build(topo: &Topology, seed_vertices: usize) -> Self {
        let cbase = topo.cbase();
        let ebase = topo.ebase();
        let mut rows = vec![[NONE; 4]; topo.num_refined_vertices()];
        let mut weights = vec![0.0f32; topo.num_refined_vertices()];

        for v in 0..cbase {
            rows[v][0] = topo.vtx_map[v] as i32;
            weights[v] = 1.0;
        }
        for (af, corners) in topo.face_verts.iter().enumerate() {
            for (c, &vi) in corners.iter().enumerate() {
                rows[cbase + af][c] = vi as i32;
            }
            weights[cbase + af] = 0.25;
        }
        for (eid, edge) in topo.edges.iter().enumerate() {
            rows[ebase + eid][0] = topo.vtx_map[edge.verts[0] as usize] as i32;
            rows[ebase + eid][1] = topo.vtx_map[edge.verts[1] as usize] as i32;
            weights[ebase + eid] = 0.5;
        }

        let row_len = 1 + 2 * topo.max_faces;
        let mut inverse = vec![NONE; seed_vertices * row_len];
        for v in 0..cbase {
            let vs = topo.vtx_map[v] as usize;
            let row = &mut inverse[vs * row_len..(vs + 1) * row_len];
            row[0] = v as i32;
            for (i, &af) in topo.faces_of(v).iter().enumerate() {
                row[1 + i] = (cbase + af as usize) as i32;
            }
            for (i, &eid) in topo.edges_of(v).iter().enumerate() {
                row[1 + topo.max_faces + i] = (ebase + eid as usize) as i32;
            }
        }

        Self {
            rows,
            weights,
            inverse,
            row_len,
        }
    }

    /// One row per refined vertex, `-1` padded.
    #[inline]
    pub fn rows(&self) -> &[[i32; 4]] {
        &self.rows
    }

    /// Per-refined-vertex parent weight.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// The flattened inverse map.
    #[inline]
    pub fn inverse(&self) -> &[i32] {
        &self.inverse
    }

    /// Stride of the inverse map (`1 + 2 * max_faces`).
    #[inline]
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Push a per-seed-vertex array through the parent map.
    ///
    /// `values` must be indexable by every seed vertex referenced by the
    /// refined mesh. Each refined value is the weighted sum of its parents,
    /// i.e. base values copy through, edge centers average two parents and
    /// face centers four.
    pub fn lift<T: LiftValue>(&self, values: &[T]) -> Vec<T> {
        self.rows
            .iter()
            .zip(self.weights.iter())
            .map(|(row, &w)| {
                let mut acc = T::lift_zero();
                for &parent in row {
                    if parent != NONE {
                        acc = acc.lift_add(values[parent as usize].lift_scale(w));
                    }
                }
                acc
            })
            .collect()
    }
}

/// Element types that can be lifted through the parent map.
///
/// Positions, UVs, scalar weights, and colors all follow the same
/// three-range averaging pattern; this trait is the small seam that lets
/// one combinator serve them all.
pub trait LiftValue: Copy {
    /// The additive identity.
    fn lift_zero() -> Self;
    /// Componentwise addition.
    fn lift_add(self, other: Self) -> Self;
    /// Uniform scale.
    fn lift_scale(self, s: f32) -> Self;
}

impl LiftValue for f32 {
    fn lift_zero() -> Self {
        0.0
    }
    fn lift_add(self, other: Self) -> Self {
        self + other
    }
    fn lift_scale(self, s: f32) -> Self {
        self * s
    }
}

macro_rules! impl_lift_for_vector {
    ($($ty:ty),*) => {
        $(impl LiftValue for $ty {
            fn lift_zero() -> Self {
                Self::zeros()
            }
            fn lift_add(self, other: Self) -> Self {
                self + other
            }
            fn lift_scale(self, s: f32) -> Self {
                self * s
            }
        })*
    };
}

impl_lift_for_vector!(Vector2<f32>, Vector3<f32>, Vector4<f32>);

/// Refined per-face data: connectivity, metadata, and the seed face each
/// sub-face descends from.
pub(crate) struct SubFaces {
    pub fvert: Vec<[u32; 4]>,
    pub fuvs: Vec<[u32; 4]>,
    pub group: Vec<u16>,
    pub face_mask: Vec<bool>,
}

/// Build the four sub-faces of every active face.
///
/// Sub-face corners follow the fixed order: base vertex, center of the
/// edge toward the next corner, face center, center of the edge toward
/// the previous corner. The four sub-faces of active face `i` occupy
/// refined face indices `[4i, 4i + 4)` and inherit the seed face's group
/// tag and current visibility bit.
pub(crate) fn build_subfaces(
    topo: &Topology,
    seed_groups: &[u16],
    seed_mask: &[bool],
) -> SubFaces {
    let cbase = topo.cbase() as u32;
    let ebase = topo.ebase() as u32;
    let tcbase = topo.tcbase() as u32;
    let tebase = topo.tebase() as u32;
    let num = topo.num_active_faces();

    let mut fvert = Vec::with_capacity(num * 4);
    let mut fuvs = Vec::with_capacity(num * 4);
    let mut group = Vec::with_capacity(num * 4);
    let mut face_mask = Vec::with_capacity(num * 4);

    for af in 0..num {
        let sf = topo.face_map[af] as usize;
        let tag = seed_groups[sf];
        let visible = seed_mask[sf];
        for c in 0..4 {
            let base = topo.vtx_rmap[topo.face_verts[af][c] as usize] as u32;
            let e_next = topo.face_edges[af][c];
            let e_prev = topo.face_edges[af][(c + 3) % 4];
            fvert.push([
                base,
                ebase + e_next,
                cbase + af as u32,
                ebase + e_prev,
            ]);

            let uv_base = topo.uv_rmap[topo.face_uv_corners[af][c] as usize] as u32;
            let ue_next = topo.face_uv_edges[af][c];
            let ue_prev = topo.face_uv_edges[af][(c + 3) % 4];
            fuvs.push([
                uv_base,
                tebase + ue_next,
                tcbase + af as u32,
                tebase + ue_prev,
            ]);

            group.push(tag);
            face_mask.push(visible);
        }
    }

    SubFaces {
        fvert,
        fuvs,
        group,
        face_mask,
    }
}

/// Build the refined UV array.
///
/// Base UVs copy through unchanged, face-center UVs average the four
/// corner UVs, and edge-center UVs are plain endpoint midpoints — every UV
/// edge is treated as a boundary, which keeps seams and chart borders
/// sharp.
pub(crate) fn build_refined_uvs(topo: &Topology, seed_texco: &[Vector2<f32>]) -> Vec<Vector2<f32>> {
    let mut out = Vec::with_capacity(topo.num_refined_uvs());

    for &ts in &topo.uv_map {
        out.push(seed_texco[ts as usize]);
    }
    for corners in &topo.face_uv_corners {
        let mut sum = Vector2::zeros();
        for &ti in corners {
            sum += seed_texco[ti as usize];
        }
        out.push(sum * 0.25);
    }
    for edge in &topo.uv_edges {
        let a = seed_texco[topo.uv_map[edge.verts[0] as usize] as usize];
        let b = seed_texco[topo.uv_map[edge.verts[1] as usize] as usize];
        out.push((a + b) * 0.5);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::subdivide::SubdivideOptions;
    use nalgebra::Point3;

    fn unit_quad() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(1.0, 1.0),
                Vector2::new(0.0, 1.0),
            ],
            vec![[0, 1, 2, 3]],
            vec![[0, 1, 2, 3]],
        )
        .unwrap()
    }

    fn build(mesh: &Mesh) -> (Topology, ParentMaps) {
        let topo = Topology::build(mesh, None, &SubdivideOptions::default()).unwrap();
        let maps = ParentMaps::build(&topo, mesh.num_vertices());
        (topo, maps)
    }

    #[test]
    fn test_single_quad_parent_weights() {
        let mesh = unit_quad();
        let (_, maps) = build(&mesh);
        assert_eq!(
            maps.weights(),
            &[1.0, 1.0, 1.0, 1.0, 0.25, 0.5, 0.5, 0.5, 0.5]
        );
    }

    #[test]
    fn test_parent_rows_by_range() {
        let mesh = unit_quad();
        let (topo, maps) = build(&mesh);

        // Base rows: a single parent, weight 1.
        for v in 0..topo.cbase() {
            let row = maps.rows()[v];
            assert_eq!(row[0], topo.vtx_map[v] as i32);
            assert_eq!(&row[1..], &[NONE; 3]);
        }

        // The face-center row lists the four corners of the parent face.
        let row = maps.rows()[topo.cbase()];
        assert_eq!(row, [0, 1, 2, 3]);

        // Edge-center rows list exactly the two endpoints.
        for eid in 0..topo.num_edges() {
            let row = maps.rows()[topo.ebase() + eid];
            let edge = &topo.edges()[eid];
            assert_eq!(row[0], topo.vtx_map[edge.verts[0] as usize] as i32);
            assert_eq!(row[1], topo.vtx_map[edge.verts[1] as usize] as i32);
            assert_eq!(&row[2..], &[NONE; 2]);
        }
    }

    #[test]
    fn test_parent_weight_rows_sum_to_one() {
        let mesh = unit_quad();
        let (_, maps) = build(&mesh);
        for (row, &w) in maps.rows().iter().zip(maps.weights().iter()) {
            let total: f32 = row.iter().filter(|&&p| p != NONE).map(|_| w).sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_inverse_map_round_trip() {
        let mesh = unit_quad();
        let (_, maps) = build(&mesh);
        let stride = maps.row_len();
        for vs in 0..mesh.num_vertices() {
            let refined = maps.inverse()[vs * stride];
            assert_ne!(refined, NONE);
            assert_eq!(maps.rows()[refined as usize][0], vs as i32);
        }
    }

    #[test]
    fn test_inverse_map_lists_incident_centers() {
        let mesh = unit_quad();
        let (topo, maps) = build(&mesh);
        let stride = maps.row_len();
        let max_faces = (stride - 1) / 2;

        // Every seed corner of the quad sees the single face center and
        // its two incident edge centers.
        for vs in 0..4 {
            let row = &maps.inverse()[vs * stride..(vs + 1) * stride];
            let faces: Vec<i32> = row[1..1 + max_faces]
                .iter()
                .copied()
                .filter(|&x| x != NONE)
                .collect();
            assert_eq!(faces, vec![topo.cbase() as i32]);
            let edges: Vec<i32> = row[1 + max_faces..]
                .iter()
                .copied()
                .filter(|&x| x != NONE)
                .collect();
            assert_eq!(edges.len(), 2);
            for e in edges {
                assert!(e >= topo.ebase() as i32);
            }
        }
    }

    #[test]
    fn test_lift_scalar_partition_of_unity() {
        // A constant field lifts to the same constant everywhere.
        let mesh = unit_quad();
        let (_, maps) = build(&mesh);
        let lifted = maps.lift(&[1.0f32, 1.0, 1.0, 1.0]);
        for w in lifted {
            assert!((w - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_lift_matches_position_stencils() {
        // Lifting the seed positions reproduces face and edge centers of a
        // boundary-only mesh exactly.
        let mesh = unit_quad();
        let (topo, maps) = build(&mesh);
        let lifted = maps.lift(mesh.coords().iter().map(|p| p.coords).collect::<Vec<_>>().as_slice());
        assert!((lifted[topo.cbase()] - Vector3::new(0.5, 0.5, 0.0)).norm() < 1e-6);
        for eid in 0..topo.num_edges() {
            let edge = &topo.edges()[eid];
            let a = mesh.coords()[topo.vtx_map[edge.verts[0] as usize] as usize].coords;
            let b = mesh.coords()[topo.vtx_map[edge.verts[1] as usize] as usize].coords;
            assert!((lifted[topo.ebase() + eid] - (a + b) * 0.5).norm() < 1e-6);
        }
    }

    #[test]
    fn test_subface_layout_and_inheritance() {
        let coord = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let texco = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.5, 0.0),
            Vector2::new(0.5, 1.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
        ];
        let mesh = Mesh::new(
            coord,
            texco,
            vec![[0, 1, 2, 3], [1, 4, 5, 2]],
            vec![[0, 1, 2, 3], [1, 4, 5, 2]],
        )
        .unwrap()
        .with_groups(vec![3, 9])
        .unwrap()
        .with_face_mask(vec![true, false])
        .unwrap();

        let topo = Topology::build(&mesh, None, &SubdivideOptions::default()).unwrap();
        let sub = build_subfaces(&topo, mesh.groups(), mesh.face_mask());

        assert_eq!(sub.fvert.len(), 8);
        assert_eq!(&sub.group, &[3, 3, 3, 3, 9, 9, 9, 9]);
        assert_eq!(
            &sub.face_mask,
            &[true, true, true, true, false, false, false, false]
        );

        let cbase = topo.cbase() as u32;
        let ebase = topo.ebase() as u32;
        for (i, face) in sub.fvert.iter().enumerate() {
            let af = (i / 4) as u32;
            // Corner order: base, edge center, face center, edge center.
            assert!(face[0] < cbase);
            assert!(face[1] >= ebase);
            assert_eq!(face[2], cbase + af);
            assert!(face[3] >= ebase);
        }
    }

    #[test]
    fn test_seam_preserved_in_refined_corners() {
        // Two quads share the position edge 1-2 but use disjoint UV
        // islands: refined corners on the seam share position vertices and
        // keep distinct UV vertices.
        let coord = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let texco = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.45, 0.0),
            Vector2::new(0.45, 1.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(0.55, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.55, 1.0),
        ];
        let mesh = Mesh::new(
            coord,
            texco,
            vec![[0, 1, 2, 3], [1, 4, 5, 2]],
            vec![[0, 1, 2, 3], [4, 5, 6, 7]],
        )
        .unwrap();

        let topo = Topology::build(&mesh, None, &SubdivideOptions::default()).unwrap();
        let sub = build_subfaces(&topo, mesh.groups(), mesh.face_mask());

        // Face 0 corner 1 (seed vertex 1) and face 1 corner 0 (also seed
        // vertex 1) map to sub-faces 1 and 4 respectively.
        assert_eq!(sub.fvert[1][0], sub.fvert[4][0]);
        assert_ne!(sub.fuvs[1][0], sub.fuvs[4][0]);

        // The sub-face edges running along the seam share the position
        // edge center but not the UV edge center.
        assert_eq!(sub.fvert[1][1], sub.fvert[4][3]);
        assert_ne!(sub.fuvs[1][1], sub.fuvs[4][3]);
    }

    #[test]
    fn test_refined_uvs_follow_boundary_rule() {
        let mesh = unit_quad();
        let topo = Topology::build(&mesh, None, &SubdivideOptions::default()).unwrap();
        let uvs = build_refined_uvs(&topo, mesh.texcos());
        assert_eq!(uvs.len(), topo.num_refined_uvs());

        // Base UVs copy through.
        for t in 0..topo.tcbase() {
            let ts = topo.uv_map[t] as usize;
            assert_eq!(uvs[t], mesh.texcos()[ts]);
        }
        // Face-center UV at the chart centroid.
        assert!((uvs[topo.tcbase()] - Vector2::new(0.5, 0.5)).norm() < 1e-6);
        // Edge-center UVs at endpoint midpoints, never pulled by the face.
        for (eid, edge) in topo.uv_edges().iter().enumerate() {
            let a = mesh.texcos()[topo.uv_map[edge.verts[0] as usize] as usize];
            let b = mesh.texcos()[topo.uv_map[edge.verts[1] as usize] as usize];
            assert!((uvs[topo.tebase() + eid] - (a + b) * 0.5).norm() < 1e-6);
        }
    }
}
