//! Quad mesh subdivision.
//!
//! This module implements one Catmull-Clark-style refinement step for
//! quad-dominant meshes (Catmull & Clark, 1978), specialized for
//! interactive character modeling: the seed mesh carries seamed UVs,
//! per-face group tags, and a visibility mask, and the refined mesh keeps
//! parent maps so per-vertex data (morph targets, bone weights) can be
//! lifted without re-solving.
//!
//! # Refinement step
//!
//! 1. A static face mask selects the active subset of seed faces; frozen
//!    topology tables are built for it ([`Topology`]).
//! 2. One face-center point per active face, one edge-center point per
//!    canonical active edge, and one updated point per active base vertex
//!    are evaluated from the seed positions.
//! 3. Each active face becomes four quads wired through the three
//!    refined-vertex ranges, inheriting group tag and visibility.
//!
//! Seed positions may keep changing afterwards;
//! [`Subdivided::update_positions`] re-evaluates positions and normals
//! against the frozen topology. The *static* mask cannot change — build a
//! new refined mesh for that — but the *dynamic* per-face visibility can
//! be retargeted cheaply with [`Subdivided::change_face_mask`].
//!
//! # Example
//!
//! ```
//! use quadling::mesh::Mesh;
//! use quadling::subdivide::{subdivide, SubdivideOptions};
//! use nalgebra::{Point3, Vector2};
//!
//! let seed = Mesh::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![
//!         Vector2::new(0.0, 0.0),
//!         Vector2::new(1.0, 0.0),
//!         Vector2::new(1.0, 1.0),
//!         Vector2::new(0.0, 1.0),
//!     ],
//!     vec![[0, 1, 2, 3]],
//!     vec![[0, 1, 2, 3]],
//! )
//! .unwrap();
//!
//! let refined = subdivide(&seed, None, &SubdivideOptions::default()).unwrap();
//! assert_eq!(refined.mesh().num_faces(), 4);
//! assert_eq!(refined.mesh().num_vertices(), 9);
//! ```
//!
//! # References
//!
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline
//!   surfaces on arbitrary topological meshes." Computer-Aided Design,
//!   10(6), 350-355.

mod attributes;
mod evaluate;
mod topology;

pub use attributes::{LiftValue, ParentMaps};
pub use topology::{Edge, Topology, NONE};

use log::debug;
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{DirtyBits, Mesh};

/// What to do when a vertex exceeds the incidence limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolePolicy {
    /// Fail construction with [`MeshError::PoleCountExceeded`].
    #[default]
    Fail,
    /// Keep the first `max_faces` incidences in encounter order and drop
    /// the rest. Lossy; the refined surface is only approximate around the
    /// offending pole.
    Clamp,
}

/// Options for building a refined mesh.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Upper bound on faces (and edges) incident to any one vertex.
    /// Determines the inverse-parent-map row width `1 + 2 * max_faces`.
    pub max_faces: usize,

    /// Behavior when `max_faces` is exceeded.
    pub pole_policy: PolePolicy,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self {
            max_faces: 8,
            pole_policy: PolePolicy::Fail,
        }
    }
}

impl SubdivideOptions {
    /// Set the per-vertex incidence limit.
    pub fn with_max_faces(mut self, max_faces: usize) -> Self {
        self.max_faces = max_faces;
        self
    }

    /// Set the pole-overflow policy.
    pub fn with_pole_policy(mut self, policy: PolePolicy) -> Self {
        self.pole_policy = policy;
        self
    }
}

/// The space a dynamic face mask is expressed in.
#[derive(Debug, Clone, Copy)]
pub enum MaskSource<'a> {
    /// One bit per *seed* face; each active face's bit is replicated to
    /// its four sub-faces (bits of statically masked-out faces are
    /// ignored — they have no sub-faces).
    Seed(&'a [bool]),
    /// One bit per *refined* face, applied verbatim.
    Refined(&'a [bool]),
}

/// Fingerprint of the seed mesh a refined mesh was built from.
///
/// The refined mesh holds no reference to its seed; operations that read
/// seed data take `&Mesh` and are checked against this stamp so a stale or
/// swapped seed surfaces as an error instead of silent garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeedStamp {
    vertices: usize,
    uvs: usize,
    faces: usize,
}

impl SeedStamp {
    fn of(seed: &Mesh) -> Self {
        Self {
            vertices: seed.num_vertices(),
            uvs: seed.num_uvs(),
            faces: seed.num_faces(),
        }
    }

    fn check(&self, seed: &Mesh) -> Result<()> {
        if *self != Self::of(seed) {
            return Err(MeshError::StaleSeed {
                expected_vertices: self.vertices,
                expected_faces: self.faces,
                actual_vertices: seed.num_vertices(),
                actual_faces: seed.num_faces(),
            });
        }
        Ok(())
    }
}

/// A refined mesh: the output of one subdivision step.
///
/// Owns its own [`Mesh`] entity plus the frozen [`Topology`] and
/// [`ParentMaps`] that relate it to the seed. The refined vertex array is
/// laid out as three contiguous ranges — base vertices, face centers, edge
/// centers — whose boundaries are exposed by [`cbase`](Subdivided::cbase)
/// and [`ebase`](Subdivided::ebase) (and `tcbase`/`tebase` for UVs).
#[derive(Debug, Clone)]
pub struct Subdivided {
    mesh: Mesh,
    topo: Topology,
    maps: ParentMaps,
    stamp: SeedStamp,
    dirty: DirtyBits,
}

/// Build a refined mesh from a seed mesh snapshot.
///
/// `static_mask` selects which seed faces participate (`None` = all); it
/// is frozen into the topology and cannot change for the lifetime of the
/// result. Construction is all-or-nothing: on error nothing is returned.
///
/// # Errors
///
/// [`MeshError::MaskSizeMismatch`] on a wrongly sized mask,
/// [`MeshError::PoleCountExceeded`] when a vertex exceeds
/// [`SubdivideOptions::max_faces`] under [`PolePolicy::Fail`].
pub fn subdivide(
    seed: &Mesh,
    static_mask: Option<&[bool]>,
    options: &SubdivideOptions,
) -> Result<Subdivided> {
    let topo = Topology::build(seed, static_mask, options)?;
    let maps = ParentMaps::build(&topo, seed.num_vertices());

    let mut coord = vec![Point3::origin(); topo.num_refined_vertices()];
    evaluate::evaluate_positions(&topo, seed.coords(), &mut coord);

    let texco = attributes::build_refined_uvs(&topo, seed.texcos());
    let sub = attributes::build_subfaces(&topo, seed.groups(), seed.face_mask());
    let colors = maps.lift(seed.colors());

    let mesh = Mesh::new(coord, texco, sub.fvert, sub.fuvs)?
        .with_groups(sub.group)?
        .with_colors(colors)?
        .with_face_mask(sub.face_mask)?;

    debug!(
        "subdivide: {} active faces -> {} faces, {} vertices, {} uvs",
        topo.num_active_faces(),
        mesh.num_faces(),
        mesh.num_vertices(),
        mesh.num_uvs()
    );

    Ok(Subdivided {
        mesh,
        topo,
        maps,
        stamp: SeedStamp::of(seed),
        dirty: DirtyBits::NONE,
    })
}

impl Subdivided {
    // ==================== Accessors ====================

    /// The refined mesh entity.
    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The frozen topology tables.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// Per-refined-vertex seed parents, `-1` padded.
    #[inline]
    pub fn parent_map(&self) -> &[[i32; 4]] {
        self.maps.rows()
    }

    /// Per-refined-vertex parent weight: 1 for base vertices, 1/4 for face
    /// centers, 1/2 for edge centers.
    #[inline]
    pub fn parent_weights(&self) -> &[f32] {
        self.maps.weights()
    }

    /// Flattened inverse parent map, one row per seed vertex with stride
    /// [`inverse_row_len`](Subdivided::inverse_row_len).
    #[inline]
    pub fn inverse_parent_map(&self) -> &[i32] {
        self.maps.inverse()
    }

    /// Stride of [`inverse_parent_map`](Subdivided::inverse_parent_map).
    #[inline]
    pub fn inverse_row_len(&self) -> usize {
        self.maps.row_len()
    }

    /// Start of the face-center vertex range.
    #[inline]
    pub fn cbase(&self) -> usize {
        self.topo.cbase()
    }

    /// Start of the edge-center vertex range.
    #[inline]
    pub fn ebase(&self) -> usize {
        self.topo.ebase()
    }

    /// Start of the face-center UV range.
    #[inline]
    pub fn tcbase(&self) -> usize {
        self.topo.tcbase()
    }

    /// Start of the edge-center UV range.
    #[inline]
    pub fn tebase(&self) -> usize {
        self.topo.tebase()
    }

    /// Push a per-seed-vertex array through the parent map.
    ///
    /// The canonical route for lifting morph deltas, bone weights, or any
    /// other per-vertex quantity onto the refined mesh.
    #[inline]
    pub fn lift<T: LiftValue>(&self, values: &[T]) -> Vec<T> {
        self.maps.lift(values)
    }

    /// Whether every refined buffer is valid.
    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.dirty.is_clean()
    }

    // ==================== Staleness notifications ====================

    /// Note that the seed positions changed.
    pub fn mark_positions_stale(&mut self) {
        self.dirty.insert(DirtyBits::POSITIONS);
    }

    /// Note that the seed's dynamic face mask changed.
    pub fn mark_face_mask_stale(&mut self) {
        self.dirty.insert(DirtyBits::FACE_MASK);
    }

    // ==================== Revalidation ====================

    /// Re-run whatever the dirty bits demand against the given seed.
    ///
    /// The single entry point for lazy revalidation: position staleness
    /// re-evaluates positions and normals, mask staleness re-expands the
    /// seed's current face mask. Fresh meshes return immediately.
    pub fn validate(&mut self, seed: &Mesh) -> Result<()> {
        if self.dirty.contains(DirtyBits::POSITIONS) {
            self.update_positions(seed)?;
        }
        if self.dirty.contains(DirtyBits::FACE_MASK) {
            self.stamp.check(seed)?;
            self.change_face_mask(MaskSource::Seed(seed.face_mask()))?;
        }
        Ok(())
    }

    /// Re-evaluate refined positions and normals from the current seed
    /// positions.
    ///
    /// Topology, UVs, metadata, and parent maps are untouched. The seed
    /// must be the mesh this refinement was built from
    /// ([`MeshError::StaleSeed`] otherwise).
    pub fn update_positions(&mut self, seed: &Mesh) -> Result<()> {
        self.stamp.check(seed)?;
        evaluate::evaluate_positions(&self.topo, seed.coords(), self.mesh.coords_mut());
        self.mesh.calc_normals(None, None);
        self.dirty.remove(DirtyBits::POSITIONS);
        Ok(())
    }

    /// Retarget the dynamic visibility mask and rebuild the render index
    /// buffer.
    ///
    /// No topology, position, or parent-map data changes; consumers may
    /// cache everything except the index buffer across this call.
    pub fn change_face_mask(&mut self, mask: MaskSource<'_>) -> Result<()> {
        let expanded = match mask {
            MaskSource::Seed(bits) => {
                if bits.len() != self.stamp.faces {
                    return Err(MeshError::MaskSizeMismatch {
                        expected: self.stamp.faces,
                        actual: bits.len(),
                    });
                }
                let mut expanded = Vec::with_capacity(self.mesh.num_faces());
                for &sf in &self.topo.face_map {
                    expanded.extend_from_slice(&[bits[sf as usize]; 4]);
                }
                expanded
            }
            MaskSource::Refined(bits) => {
                if bits.len() != self.mesh.num_faces() {
                    return Err(MeshError::MaskSizeMismatch {
                        expected: self.mesh.num_faces(),
                        actual: bits.len(),
                    });
                }
                bits.to_vec()
            }
        };
        self.mesh.change_face_mask(expanded)?;
        self.dirty.remove(DirtyBits::FACE_MASK);
        Ok(())
    }
}
