//! Error types for quadling.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh construction and refinement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A face references a vertex index outside the coordinate array.
    #[error("face {face} references invalid vertex index {vertex} (mesh has {vertices} vertices)")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
        /// The vertex count of the mesh.
        vertices: usize,
    },

    /// A face references a UV index outside the texture-coordinate array.
    #[error("face {face} references invalid UV index {uv} (mesh has {uvs} UV vertices)")]
    InvalidUvIndex {
        /// The face index.
        face: usize,
        /// The invalid UV index.
        uv: usize,
        /// The UV vertex count of the mesh.
        uvs: usize,
    },

    /// An array was supplied with a length inconsistent with the mesh.
    #[error("array `{array}` has length {actual}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        array: &'static str,
        /// The required length.
        expected: usize,
        /// The supplied length.
        actual: usize,
    },

    /// A seed vertex has more incident active edges than the configured limit.
    ///
    /// The host can raise the limit via
    /// [`SubdivideOptions::with_max_faces`](crate::subdivide::SubdivideOptions::with_max_faces)
    /// and rebuild, or repair the mesh.
    #[error("vertex {vertex} has {count} incident edges, exceeding the limit of {limit}")]
    PoleCountExceeded {
        /// The offending seed vertex index.
        vertex: usize,
        /// The observed incidence count.
        count: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A face mask was supplied with the wrong length.
    #[error("face mask has length {actual}, expected {expected}")]
    MaskSizeMismatch {
        /// The required length.
        expected: usize,
        /// The supplied length.
        actual: usize,
    },

    /// The seed mesh no longer matches the one the refined mesh was built from.
    #[error("seed mesh does not match the refined mesh (expected {expected_vertices} vertices, {expected_faces} faces; got {actual_vertices} vertices, {actual_faces} faces)")]
    StaleSeed {
        /// Seed vertex count captured at build time.
        expected_vertices: usize,
        /// Seed face count captured at build time.
        expected_faces: usize,
        /// Vertex count of the mesh supplied now.
        actual_vertices: usize,
        /// Face count of the mesh supplied now.
        actual_faces: usize,
    },
}
