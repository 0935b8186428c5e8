//! # Quadling
//!
//! A Catmull-Clark-style quad mesh subdivision engine for interactive
//! character modeling.
//!
//! Quadling refines a quad-dominant control ("seed") mesh — positions,
//! seamed UVs, per-face group tags, a per-face visibility mask — into a
//! mesh with four quads per active seed face, and keeps the bookkeeping
//! that character pipelines need on top of the geometry:
//!
//! - **Parent maps**: every refined vertex knows the seed vertices that
//!   define it (and vice versa), so morph targets and skinning weights on
//!   the seed can be lifted to the refined mesh without re-solving.
//! - **Incremental re-evaluation**: seed positions may change freely;
//!   refined positions and normals are re-evaluated against frozen
//!   topology tables at interactive rates.
//! - **Selective refinement**: a static face mask restricts refinement to
//!   a subset of seed faces, and a separate dynamic mask toggles sub-face
//!   visibility without touching topology.
//!
//! ## Quick start
//!
//! ```
//! use quadling::prelude::*;
//! use nalgebra::{Point3, Vector2};
//!
//! // A single quad in the z = 0 plane.
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
//! // One refinement step: 1 quad -> 4 quads, 9 vertices.
//! let refined = subdivide(&seed, None, &SubdivideOptions::default()).unwrap();
//! assert_eq!(refined.mesh().num_faces(), 4);
//! assert_eq!(refined.mesh().num_vertices(), 9);
//!
//! // Every refined vertex knows its seed parents.
//! assert_eq!(refined.parent_map()[0], [0, -1, -1, -1]);
//! ```
//!
//! ## Incremental updates
//!
//! ```
//! # use quadling::prelude::*;
//! # use nalgebra::{Point3, Vector2};
//! # let mut seed = Mesh::new(
//! #     vec![
//! #         Point3::new(0.0, 0.0, 0.0),
//! #         Point3::new(1.0, 0.0, 0.0),
//! #         Point3::new(1.0, 1.0, 0.0),
//! #         Point3::new(0.0, 1.0, 0.0),
//! #     ],
//! #     vec![
//! #         Vector2::new(0.0, 0.0),
//! #         Vector2::new(1.0, 0.0),
//! #         Vector2::new(1.0, 1.0),
//! #         Vector2::new(0.0, 1.0),
//! #     ],
//! #     vec![[0, 1, 2, 3]],
//! #     vec![[0, 1, 2, 3]],
//! # )
//! # .unwrap();
//! let mut refined = subdivide(&seed, None, &SubdivideOptions::default()).unwrap();
//!
//! // The host edits seed positions (a morph target, a pose change)...
//! let mut coord = seed.coords().to_vec();
//! coord[0].z = 0.5;
//! seed.set_coord(coord).unwrap();
//!
//! // ...and the refined mesh follows without rebuilding topology.
//! refined.update_positions(&seed).unwrap();
//! ```
//!
//! The engine is single-threaded and synchronous; all operations run on
//! the calling thread and a pass always runs to completion. See
//! [`subdivide`](crate::subdivide) for the refinement rules and
//! [`mesh`](crate::mesh) for the entity layout.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mesh;
pub mod subdivide;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use quadling::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{DirtyBits, Mesh};
    pub use crate::subdivide::{
        subdivide, MaskSource, PolePolicy, SubdivideOptions, Subdivided,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
