//! Core mesh data structures.
//!
//! This module provides the [`Mesh`] entity used for both the seed
//! (control) mesh and the refined output of subdivision.
//!
//! # Overview
//!
//! A [`Mesh`] is stored as flat parallel arrays rather than a pointer-based
//! connectivity structure: positions, UV coordinates, per-face corner
//! indices into each, and per-face metadata (group tag, visibility mask).
//! Position and UV indexing are independent so UV seams can be expressed.
//! Adjacency is not kept on the entity itself; the subdivision engine
//! builds its own frozen topology tables from these arrays (see
//! [`crate::subdivide`]).
//!
//! # Dirty tracking
//!
//! Derived quantities — normals and the render index buffer — are
//! recomputed lazily. Mutation paths set bits in a [`DirtyBits`] mask and
//! the recomputation entry points clear them, so hosts can batch edits and
//! revalidate once.
//!
//! # Construction
//!
//! ```
//! use quadling::mesh::Mesh;
//! use nalgebra::{Point3, Vector2};
//!
//! let mesh = Mesh::new(
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
//! assert_eq!(mesh.num_vertices(), 4);
//! ```

mod dirty;
mod entity;

pub use dirty::DirtyBits;
pub use entity::Mesh;
