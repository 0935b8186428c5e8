//! Immutable topology tables driving subdivision.
//!
//! [`Topology::build`] filters a seed mesh through a static face mask and
//! produces the dense tables the position evaluator and attribute lifter
//! consume: active-set index maps, canonical edge lists (position and UV
//! space independently, so seams split), per-face edge references, and
//! per-vertex incidence lists. The tables are fully determined by the seed
//! arrays and the mask — no floating-point comparison influences them —
//! and are frozen for the lifetime of the refined mesh.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::debug;

use super::{PolePolicy, SubdivideOptions};
use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Sentinel for unused slots in signed index arrays.
pub const NONE: i32 = -1;

/// Sentinel for unused slots in unsigned incidence arrays.
pub(crate) const UNUSED: u32 = u32::MAX;

/// A canonical (deduplicated, unordered) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Endpoints in active-vertex space, `verts[0] <= verts[1]`.
    pub verts: [u32; 2],
    /// Active indices of the two incident faces. A boundary edge has one
    /// incident face; the empty slot aliases the occupied one.
    pub faces: [u32; 2],
}

impl Edge {
    /// Whether only one active face touches this edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.faces[0] == self.faces[1]
    }
}

/// Frozen topology tables for one refined mesh.
///
/// All faces, vertices, and edges here are *active*: included under the
/// static face mask supplied at construction. Index maps translate between
/// seed space and active space, with [`NONE`] marking filtered-out
/// elements.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) max_faces: usize,

    /// Seed face index per active face.
    pub(crate) face_map: Vec<u32>,
    /// Seed -> active face index, `NONE` for masked-out faces.
    pub(crate) face_rmap: Vec<i32>,
    /// Seed vertex index per active base vertex.
    pub(crate) vtx_map: Vec<u32>,
    /// Seed -> active base vertex index, `NONE` for inactive.
    pub(crate) vtx_rmap: Vec<i32>,
    /// Seed UV index per active UV vertex.
    pub(crate) uv_map: Vec<u32>,
    /// Seed -> active UV vertex index, `NONE` for inactive.
    pub(crate) uv_rmap: Vec<i32>,

    /// Seed-space corner vertex indices per active face, snapshotted at
    /// build time (seed topology is frozen for the refined mesh lifetime).
    pub(crate) face_verts: Vec<[u32; 4]>,
    /// Seed-space corner UV indices per active face.
    pub(crate) face_uv_corners: Vec<[u32; 4]>,

    /// Canonical active edges in position space.
    pub(crate) edges: Vec<Edge>,
    /// Canonical active edges in UV space. A seam edge appears once per
    /// side here while being a single entry in `edges`.
    pub(crate) uv_edges: Vec<Edge>,
    /// Per active face: canonical edge id of the edge leaving each corner.
    pub(crate) face_edges: Vec<[u32; 4]>,
    /// Per active face: which face slot (0 or 1) of each edge it occupies.
    pub(crate) face_edge_slots: Vec<[u8; 4]>,
    /// Per active face: canonical UV edge id of the edge leaving each corner.
    pub(crate) face_uv_edges: Vec<[u32; 4]>,

    /// Incident canonical edges per active base vertex, stride `max_faces`.
    pub(crate) vert_edges: Vec<u32>,
    /// Incident edge count per active base vertex.
    pub(crate) nedges: Vec<u32>,
    /// Incident active faces per active base vertex, stride `max_faces`.
    pub(crate) vert_faces: Vec<u32>,
    /// Incident face count per active base vertex.
    pub(crate) nfaces: Vec<u32>,
}

impl Topology {
    /// Build the tables from a seed mesh and an optional static face mask.
    ///
    /// A missing mask is treated as all-ones. Fails with
    /// [`MeshError::MaskSizeMismatch`] on a wrongly sized mask and, under
    /// [`PolePolicy::Fail`], with [`MeshError::PoleCountExceeded`] when a
    /// vertex has more than `options.max_faces` incident active edges or
    /// faces.
    pub fn build(
        seed: &Mesh,
        static_mask: Option<&[bool]>,
        options: &SubdivideOptions,
    ) -> Result<Self> {
        if let Some(mask) = static_mask {
            if mask.len() != seed.num_faces() {
                return Err(MeshError::MaskSizeMismatch {
                    expected: seed.num_faces(),
                    actual: mask.len(),
                });
            }
        }
        let max_faces = options.max_faces;

        // Active faces, in seed order.
        let mut face_map = Vec::new();
        let mut face_rmap = vec![NONE; seed.num_faces()];
        for f in 0..seed.num_faces() {
            if static_mask.map_or(true, |m| m[f]) {
                face_rmap[f] = face_map.len() as i32;
                face_map.push(f as u32);
            }
        }

        // A base vertex is active iff it appears as a corner of an active
        // face; same for UV vertices. First-seen order keeps the maps
        // deterministic.
        let mut vtx_map = Vec::new();
        let mut vtx_rmap = vec![NONE; seed.num_vertices()];
        let mut uv_map = Vec::new();
        let mut uv_rmap = vec![NONE; seed.num_uvs()];
        for &sf in &face_map {
            for &vi in &seed.fverts()[sf as usize] {
                if vtx_rmap[vi as usize] == NONE {
                    vtx_rmap[vi as usize] = vtx_map.len() as i32;
                    vtx_map.push(vi);
                }
            }
            for &ti in &seed.fuvs()[sf as usize] {
                if uv_rmap[ti as usize] == NONE {
                    uv_rmap[ti as usize] = uv_map.len() as i32;
                    uv_map.push(ti);
                }
            }
        }

        let face_verts: Vec<[u32; 4]> = face_map
            .iter()
            .map(|&sf| seed.fverts()[sf as usize])
            .collect();
        let face_uv_corners: Vec<[u32; 4]> = face_map
            .iter()
            .map(|&sf| seed.fuvs()[sf as usize])
            .collect();

        let (edges, face_edges, face_edge_slots) =
            build_edge_table(&face_map, seed.fverts(), &vtx_rmap);
        let (uv_edges, face_uv_edges, _) = build_edge_table(&face_map, seed.fuvs(), &uv_rmap);

        let incidence = build_incidence(
            &face_map,
            seed.fverts(),
            &vtx_rmap,
            &edges,
            vtx_map.len(),
            max_faces,
            options.pole_policy,
            &vtx_map,
        )?;

        debug!(
            "topology: {} active faces, {} base vertices, {} edges, {} uv edges",
            face_map.len(),
            vtx_map.len(),
            edges.len(),
            uv_edges.len()
        );

        Ok(Self {
            max_faces,
            face_map,
            face_rmap,
            vtx_map,
            vtx_rmap,
            uv_map,
            uv_rmap,
            face_verts,
            face_uv_corners,
            edges,
            uv_edges,
            face_edges,
            face_edge_slots,
            face_uv_edges,
            vert_edges: incidence.vert_edges,
            nedges: incidence.nedges,
            vert_faces: incidence.vert_faces,
            nfaces: incidence.nfaces,
        })
    }

    // ==================== Derived counts ====================

    /// Number of active faces (`F'`).
    #[inline]
    pub fn num_active_faces(&self) -> usize {
        self.face_map.len()
    }

    /// Number of active base vertices (`cbase`).
    #[inline]
    pub fn num_active_vertices(&self) -> usize {
        self.vtx_map.len()
    }

    /// Number of active UV vertices (`tcbase`).
    #[inline]
    pub fn num_active_uvs(&self) -> usize {
        self.uv_map.len()
    }

    /// Number of canonical active edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of canonical active UV edges.
    #[inline]
    pub fn num_uv_edges(&self) -> usize {
        self.uv_edges.len()
    }

    /// Start of the face-center range in the refined vertex layout.
    #[inline]
    pub fn cbase(&self) -> usize {
        self.vtx_map.len()
    }

    /// Start of the edge-center range in the refined vertex layout.
    #[inline]
    pub fn ebase(&self) -> usize {
        self.cbase() + self.face_map.len()
    }

    /// Total refined vertex count.
    #[inline]
    pub fn num_refined_vertices(&self) -> usize {
        self.ebase() + self.edges.len()
    }

    /// Start of the face-center range in the refined UV layout.
    #[inline]
    pub fn tcbase(&self) -> usize {
        self.uv_map.len()
    }

    /// Start of the edge-center range in the refined UV layout.
    #[inline]
    pub fn tebase(&self) -> usize {
        self.tcbase() + self.face_map.len()
    }

    /// Total refined UV vertex count.
    #[inline]
    pub fn num_refined_uvs(&self) -> usize {
        self.tebase() + self.uv_edges.len()
    }

    /// The canonical active edges.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The canonical active UV edges.
    #[inline]
    pub fn uv_edges(&self) -> &[Edge] {
        &self.uv_edges
    }

    /// Incident edge ids of active base vertex `v`.
    #[inline]
    pub(crate) fn edges_of(&self, v: usize) -> &[u32] {
        let start = v * self.max_faces;
        &self.vert_edges[start..start + self.nedges[v] as usize]
    }

    /// Incident active face ids of active base vertex `v`.
    #[inline]
    pub(crate) fn faces_of(&self, v: usize) -> &[u32] {
        let start = v * self.max_faces;
        &self.vert_faces[start..start + self.nfaces[v] as usize]
    }
}

/// Deduplicate the directed corner edges of the active faces into a
/// canonical table, assigning each face into the left or right slot of
/// every edge it touches (first encountered face left, second right;
/// boundary edges alias the left occupant into the right slot).
fn build_edge_table(
    face_map: &[u32],
    corners: &[[u32; 4]],
    rmap: &[i32],
) -> (Vec<Edge>, Vec<[u32; 4]>, Vec<[u8; 4]>) {
    let mut ids: HashMap<(u32, u32), u32> = HashMap::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut face_edges = vec![[UNUSED; 4]; face_map.len()];
    let mut face_slots = vec![[0u8; 4]; face_map.len()];

    for (af, &sf) in face_map.iter().enumerate() {
        let face = &corners[sf as usize];
        for c in 0..4 {
            let a = rmap[face[c] as usize] as u32;
            let b = rmap[face[(c + 1) % 4] as usize] as u32;
            let key = if a <= b { (a, b) } else { (b, a) };
            let (eid, slot) = match ids.entry(key) {
                Entry::Vacant(entry) => {
                    let eid = edges.len() as u32;
                    entry.insert(eid);
                    edges.push(Edge {
                        verts: [key.0, key.1],
                        faces: [af as u32, af as u32],
                    });
                    (eid, 0u8)
                }
                Entry::Occupied(entry) => {
                    let eid = *entry.get();
                    let edge = &mut edges[eid as usize];
                    if edge.faces[0] == af as u32 {
                        (eid, 0)
                    } else if edge.is_boundary() {
                        edge.faces[1] = af as u32;
                        (eid, 1)
                    } else {
                        // Already two distinct occupants; a third face on
                        // one edge is outside the two-manifold contract.
                        (eid, 1)
                    }
                }
            };
            face_edges[af][c] = eid;
            face_slots[af][c] = slot;
        }
    }

    (edges, face_edges, face_slots)
}

struct Incidence {
    vert_edges: Vec<u32>,
    nedges: Vec<u32>,
    vert_faces: Vec<u32>,
    nfaces: Vec<u32>,
}

/// Build per-vertex incidence lists, enforcing the pole limit.
///
/// Degrees are counted before anything is stored so an overflow error can
/// report the true incidence count of the offending vertex.
#[allow(clippy::too_many_arguments)]
fn build_incidence(
    face_map: &[u32],
    fvert: &[[u32; 4]],
    vtx_rmap: &[i32],
    edges: &[Edge],
    num_base: usize,
    max_faces: usize,
    policy: PolePolicy,
    vtx_map: &[u32],
) -> Result<Incidence> {
    let mut edge_degree = vec![0u32; num_base];
    for edge in edges {
        edge_degree[edge.verts[0] as usize] += 1;
        if edge.verts[1] != edge.verts[0] {
            edge_degree[edge.verts[1] as usize] += 1;
        }
    }

    let mut face_degree = vec![0u32; num_base];
    for &sf in face_map {
        for v in distinct_corners(&fvert[sf as usize]) {
            face_degree[vtx_rmap[v as usize] as usize] += 1;
        }
    }

    for v in 0..num_base {
        let count = edge_degree[v].max(face_degree[v]) as usize;
        if count > max_faces {
            match policy {
                PolePolicy::Fail => {
                    return Err(MeshError::PoleCountExceeded {
                        vertex: vtx_map[v] as usize,
                        count,
                        limit: max_faces,
                    });
                }
                PolePolicy::Clamp => {
                    log::warn!(
                        "vertex {} has {} incidences, clamping to {}",
                        vtx_map[v],
                        count,
                        max_faces
                    );
                }
            }
        }
    }

    let mut vert_edges = vec![UNUSED; num_base * max_faces];
    let mut nedges = vec![0u32; num_base];
    for (eid, edge) in edges.iter().enumerate() {
        for &v in distinct_endpoints(edge).iter().flatten() {
            let v = v as usize;
            if (nedges[v] as usize) < max_faces {
                vert_edges[v * max_faces + nedges[v] as usize] = eid as u32;
                nedges[v] += 1;
            }
        }
    }

    let mut vert_faces = vec![UNUSED; num_base * max_faces];
    let mut nfaces = vec![0u32; num_base];
    for (af, &sf) in face_map.iter().enumerate() {
        for vi in distinct_corners(&fvert[sf as usize]) {
            let v = vtx_rmap[vi as usize] as usize;
            if (nfaces[v] as usize) < max_faces {
                vert_faces[v * max_faces + nfaces[v] as usize] = af as u32;
                nfaces[v] += 1;
            }
        }
    }

    Ok(Incidence {
        vert_edges,
        nedges,
        vert_faces,
        nfaces,
    })
}

/// The corner vertices of a face with duplicates removed (a triangle
/// written as a quad repeats one corner).
fn distinct_corners(face: &[u32; 4]) -> impl Iterator<Item = u32> + '_ {
    face.iter()
        .enumerate()
        .filter(|(i, v)| !face[..*i].contains(v))
        .map(|(_, &v)| v)
}

fn distinct_endpoints(edge: &Edge) -> [Option<u32>; 2] {
    if edge.verts[0] == edge.verts[1] {
        [Some(edge.verts[0]), None]
    } else {
        [Some(edge.verts[0]), Some(edge.verts[1])]
    }
}
