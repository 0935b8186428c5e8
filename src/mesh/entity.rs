//! The mesh entity: contiguous attribute arrays for a quad-dominant mesh.
//!
//! A [`Mesh`] owns raw numeric arrays: positions, seamed UV coordinates,
//! face corner indices (vertex and UV indexing are independent so seams can
//! be expressed), per-face metadata, and derived per-vertex/per-face data.
//! All faces are 4-corner primitives; a triangle is written as a quad with
//! its last corner repeated.
//!
//! Derived quantities (normals, the render index buffer) are recomputed
//! lazily through dirty-flag driven entry points rather than eagerly on
//! every edit, so a localized morph edit only pays for the vertices it
//! touched.

use nalgebra::{Point3, Vector2, Vector3, Vector4};

use super::dirty::DirtyBits;
use crate::error::{MeshError, Result};

/// A quad-dominant polygonal mesh with seamed UVs and per-face metadata.
///
/// Face corners index into [`coords`](Mesh::coords) and
/// [`texcos`](Mesh::texcos) independently: two corners may share a position
/// vertex while referencing different UV vertices, which is how UV seams
/// are represented.
#[derive(Debug, Clone)]
pub struct Mesh {
    coord: Vec<Point3<f32>>,
    texco: Vec<Vector2<f32>>,
    fvert: Vec<[u32; 4]>,
    fuvs: Vec<[u32; 4]>,
    group: Vec<u16>,
    face_mask: Vec<bool>,
    vnorm: Vec<Vector3<f32>>,
    vtang: Vec<Vector4<f32>>,
    color: Vec<Vector4<f32>>,
    fnorm: Vec<Vector3<f32>>,
    index_buffer: Vec<u32>,
    dirty: DirtyBits,
    dirty_verts: Vec<u32>,
}

impl Mesh {
    /// Create a mesh from positions, UVs, and per-face corner indices.
    ///
    /// Every entry of `fvert` must index into `coord` and every entry of
    /// `fuvs` into `texco`; the two arrays must have the same length.
    /// Group tags default to zero and all faces start visible. Normals and
    /// the render index buffer are computed before returning.
    ///
    /// # Example
    /// ```
    /// use quadling::mesh::Mesh;
    /// use nalgebra::{Point3, Vector2};
    ///
    /// let mesh = Mesh::new(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(1.0, 1.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     vec![
    ///         Vector2::new(0.0, 0.0),
    ///         Vector2::new(1.0, 0.0),
    ///         Vector2::new(1.0, 1.0),
    ///         Vector2::new(0.0, 1.0),
    ///     ],
    ///     vec![[0, 1, 2, 3]],
    ///     vec![[0, 1, 2, 3]],
    /// )
    /// .unwrap();
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn new(
        coord: Vec<Point3<f32>>,
        texco: Vec<Vector2<f32>>,
        fvert: Vec<[u32; 4]>,
        fuvs: Vec<[u32; 4]>,
    ) -> Result<Self> {
        if fuvs.len() != fvert.len() {
            return Err(MeshError::LengthMismatch {
                array: "fuvs",
                expected: fvert.len(),
                actual: fuvs.len(),
            });
        }
        for (fi, face) in fvert.iter().enumerate() {
            for &vi in face {
                if vi as usize >= coord.len() {
                    return Err(MeshError::InvalidVertexIndex {
                        face: fi,
                        vertex: vi as usize,
                        vertices: coord.len(),
                    });
                }
            }
        }
        for (fi, face) in fuvs.iter().enumerate() {
            for &ti in face {
                if ti as usize >= texco.len() {
                    return Err(MeshError::InvalidUvIndex {
                        face: fi,
                        uv: ti as usize,
                        uvs: texco.len(),
                    });
                }
            }
        }

        let num_verts = coord.len();
        let num_faces = fvert.len();
        let mut mesh = Self {
            coord,
            texco,
            fvert,
            fuvs,
            group: vec![0; num_faces],
            face_mask: vec![true; num_faces],
            vnorm: vec![Vector3::zeros(); num_verts],
            vtang: vec![Vector4::zeros(); num_verts],
            color: vec![Vector4::new(1.0, 1.0, 1.0, 1.0); num_verts],
            fnorm: vec![Vector3::zeros(); num_faces],
            index_buffer: Vec::new(),
            dirty: DirtyBits::NONE,
            dirty_verts: Vec::new(),
        };
        mesh.calc_normals(None, None);
        mesh.update_index_buffer();
        Ok(mesh)
    }

    /// Attach per-face group tags (length must equal the face count).
    pub fn with_groups(mut self, group: Vec<u16>) -> Result<Self> {
        if group.len() != self.fvert.len() {
            return Err(MeshError::LengthMismatch {
                array: "group",
                expected: self.fvert.len(),
                actual: group.len(),
            });
        }
        self.group = group;
        Ok(self)
    }

    /// Attach a per-face visibility mask (length must equal the face count).
    pub fn with_face_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        if mask.len() != self.fvert.len() {
            return Err(MeshError::MaskSizeMismatch {
                expected: self.fvert.len(),
                actual: mask.len(),
            });
        }
        self.face_mask = mask;
        self.update_index_buffer();
        Ok(self)
    }

    /// Attach per-vertex colors (length must equal the vertex count).
    pub fn with_colors(mut self, color: Vec<Vector4<f32>>) -> Result<Self> {
        if color.len() != self.coord.len() {
            return Err(MeshError::LengthMismatch {
                array: "color",
                expected: self.coord.len(),
                actual: color.len(),
            });
        }
        self.color = color;
        Ok(self)
    }

    // ==================== Accessors ====================

    /// Number of position vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.coord.len()
    }

    /// Number of UV vertices.
    #[inline]
    pub fn num_uvs(&self) -> usize {
        self.texco.len()
    }

    /// Number of faces, including masked-out ones.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.fvert.len()
    }

    /// Vertex positions.
    #[inline]
    pub fn coords(&self) -> &[Point3<f32>] {
        &self.coord
    }

    /// UV coordinates.
    #[inline]
    pub fn texcos(&self) -> &[Vector2<f32>] {
        &self.texco
    }

    /// Per-face vertex indices.
    #[inline]
    pub fn fverts(&self) -> &[[u32; 4]] {
        &self.fvert
    }

    /// Per-face UV indices.
    #[inline]
    pub fn fuvs(&self) -> &[[u32; 4]] {
        &self.fuvs
    }

    /// Per-face group tags.
    #[inline]
    pub fn groups(&self) -> &[u16] {
        &self.group
    }

    /// Per-face visibility mask.
    #[inline]
    pub fn face_mask(&self) -> &[bool] {
        &self.face_mask
    }

    /// Per-vertex normals.
    #[inline]
    pub fn vertex_normals(&self) -> &[Vector3<f32>] {
        &self.vnorm
    }

    /// Per-face normals.
    #[inline]
    pub fn face_normals(&self) -> &[Vector3<f32>] {
        &self.fnorm
    }

    /// Per-vertex tangents (xyz direction, w handedness).
    #[inline]
    pub fn tangents(&self) -> &[Vector4<f32>] {
        &self.vtang
    }

    /// Per-vertex colors.
    #[inline]
    pub fn colors(&self) -> &[Vector4<f32>] {
        &self.color
    }

    /// The render-visible corner index list, four entries per visible face,
    /// monotonic in face order.
    #[inline]
    pub fn index_buffer(&self) -> &[u32] {
        &self.index_buffer
    }

    /// The position of vertex `v`.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<f32> {
        &self.coord[v]
    }

    /// In-place access to the position array for re-evaluation passes.
    #[inline]
    pub(crate) fn coords_mut(&mut self) -> &mut [Point3<f32>] {
        &mut self.coord
    }

    /// The four corner positions of face `f`.
    pub fn face_positions(&self, f: usize) -> [Point3<f32>; 4] {
        let [a, b, c, d] = self.fvert[f];
        [
            self.coord[a as usize],
            self.coord[b as usize],
            self.coord[c as usize],
            self.coord[d as usize],
        ]
    }

    /// The centroid of face `f` (mean of its four corners).
    pub fn face_centroid(&self, f: usize) -> Point3<f32> {
        let [p0, p1, p2, p3] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords + p3.coords) * 0.25)
    }

    /// The currently stale quantities.
    #[inline]
    pub fn dirty(&self) -> DirtyBits {
        self.dirty
    }

    /// Vertices recorded stale via [`mark`](Mesh::mark).
    ///
    /// An empty list while a dirty bit is set means the whole mesh is
    /// stale (the state [`set_coord`](Mesh::set_coord) leaves behind).
    #[inline]
    pub fn dirty_vertices(&self) -> &[u32] {
        &self.dirty_verts
    }

    // ==================== Mutation ====================

    /// Replace all vertex positions.
    ///
    /// The replacement must have the same length as the current coordinate
    /// array; seed topology is fixed for the lifetime of the mesh. Marks
    /// positions and normals stale for the whole mesh.
    pub fn set_coord(&mut self, new_coord: Vec<Point3<f32>>) -> Result<()> {
        if new_coord.len() != self.coord.len() {
            return Err(MeshError::LengthMismatch {
                array: "coord",
                expected: self.coord.len(),
                actual: new_coord.len(),
            });
        }
        self.coord = new_coord;
        self.dirty_verts.clear();
        self.dirty.insert(DirtyBits::POSITIONS | DirtyBits::NORMALS);
        Ok(())
    }

    /// Replace per-vertex tangents.
    pub fn set_tangents(&mut self, vtang: Vec<Vector4<f32>>) -> Result<()> {
        if vtang.len() != self.coord.len() {
            return Err(MeshError::LengthMismatch {
                array: "vtang",
                expected: self.coord.len(),
                actual: vtang.len(),
            });
        }
        self.vtang = vtang;
        self.dirty.remove(DirtyBits::TANGENTS);
        Ok(())
    }

    /// Flag per-vertex quantities as stale for a vertex subset.
    ///
    /// Repeated calls accumulate; the recorded subset is consumed (and
    /// cleared) by the next [`calc_normals`](Mesh::calc_normals).
    pub fn mark(&mut self, subset: &[u32], kinds: DirtyBits) {
        self.dirty_verts.extend_from_slice(subset);
        self.dirty.insert(kinds);
    }

    /// Replace the per-face visibility mask and rebuild the index buffer.
    ///
    /// Topology and per-vertex data are untouched.
    pub fn change_face_mask(&mut self, mask: Vec<bool>) -> Result<()> {
        if mask.len() != self.fvert.len() {
            return Err(MeshError::MaskSizeMismatch {
                expected: self.fvert.len(),
                actual: mask.len(),
            });
        }
        self.face_mask = mask;
        self.dirty.insert(DirtyBits::FACE_MASK);
        self.update_index_buffer();
        Ok(())
    }

    /// Faces with at least one corner in `verts`, ascending.
    ///
    /// This is the scoping primitive for localized recomputation: after a
    /// morph edit touches a vertex subset, pass the result as the face
    /// subset of [`calc_normals`](Mesh::calc_normals).
    pub fn faces_for_vertices(&self, verts: &[u32]) -> Vec<u32> {
        let mut in_set = vec![false; self.coord.len()];
        for &v in verts {
            if (v as usize) < in_set.len() {
                in_set[v as usize] = true;
            }
        }
        let mut faces = Vec::new();
        for (fi, face) in self.fvert.iter().enumerate() {
            if face.iter().any(|&vi| in_set[vi as usize]) {
                faces.push(fi as u32);
            }
        }
        faces
    }

    // ==================== Derived data ====================

    /// Recompute face and vertex normals for the given subsets.
    ///
    /// `None` means all. A face normal is the normalized cross product of
    /// the quad's diagonals; degenerate (zero-area) faces contribute a zero
    /// vector. Vertex normals accumulate the unnormalized diagonal cross of
    /// incident faces, so larger faces weigh more, then normalize.
    ///
    /// When both subsets are given, `face_subset` must cover every face
    /// incident to `vert_subset` (see
    /// [`faces_for_vertices`](Mesh::faces_for_vertices)); vertices whose
    /// incident faces are excluded would otherwise lose contributions.
    /// Idempotent for fixed subsets.
    pub fn calc_normals(&mut self, vert_subset: Option<&[u32]>, face_subset: Option<&[u32]>) {
        // Face normals first; vertex accumulation reads the raw cross
        // product again so normalization order does not matter.
        match face_subset {
            Some(faces) => {
                for &f in faces {
                    self.fnorm[f as usize] = self.quad_normal(f as usize, true);
                }
            }
            None => {
                for f in 0..self.fvert.len() {
                    self.fnorm[f] = self.quad_normal(f, true);
                }
            }
        }

        let mut in_set = Vec::new();
        if let Some(verts) = vert_subset {
            in_set = vec![false; self.coord.len()];
            for &v in verts {
                in_set[v as usize] = true;
            }
            for &v in verts {
                self.vnorm[v as usize] = Vector3::zeros();
            }
        } else {
            for n in &mut self.vnorm {
                *n = Vector3::zeros();
            }
        }

        let face_range: Vec<usize> = match face_subset {
            Some(faces) => faces.iter().map(|&f| f as usize).collect(),
            None => (0..self.fvert.len()).collect(),
        };
        for f in face_range {
            let n = self.quad_normal(f, false);
            for &vi in &self.fvert[f] {
                if in_set.is_empty() || in_set[vi as usize] {
                    self.vnorm[vi as usize] += n;
                }
            }
        }

        match vert_subset {
            Some(verts) => {
                for &v in verts {
                    normalize_or_zero(&mut self.vnorm[v as usize]);
                }
            }
            None => {
                for n in &mut self.vnorm {
                    normalize_or_zero(n);
                }
            }
        }

        self.dirty.remove(DirtyBits::POSITIONS | DirtyBits::NORMALS);
        self.dirty_verts.clear();
    }

    /// Rebuild the render-visible corner index list from the face mask.
    ///
    /// Visible faces appear in ascending face order, four corner indices
    /// each.
    pub fn update_index_buffer(&mut self) {
        self.index_buffer.clear();
        for (fi, face) in self.fvert.iter().enumerate() {
            if self.face_mask[fi] {
                self.index_buffer.extend_from_slice(face);
            }
        }
        self.dirty.remove(DirtyBits::FACE_MASK);
    }

    fn quad_normal(&self, f: usize, normalized: bool) -> Vector3<f32> {
        let [p0, p1, p2, p3] = self.face_positions(f);
        // Diagonal cross: exact for planar quads, a stable average for
        // non-planar ones, and collapses to the triangle normal when the
        // last corner is repeated.
        let mut n = (p2 - p0).cross(&(p3 - p1));
        if normalized {
            normalize_or_zero(&mut n);
        }
        n
    }
}

fn normalize_or_zero(v: &mut Vector3<f32>) {
    let len = v.norm();
    if len > 1e-12 {
        *v /= len;
    } else {
        *v = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn two_quads() -> Mesh {
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
        let fvert = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        let fuvs = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        Mesh::new(coord, texco, fvert, fuvs).unwrap()
    }

    #[test]
    fn test_invalid_vertex_index() {
        let result = Mesh::new(
            vec![Point3::origin()],
            vec![Vector2::zeros()],
            vec![[0, 1, 0, 0]],
            vec![[0, 0, 0, 0]],
        );
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_uv_index() {
        let result = Mesh::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![Vector2::zeros()],
            vec![[0, 1, 0, 1]],
            vec![[0, 0, 0, 7]],
        );
        assert!(matches!(
            result,
            Err(MeshError::InvalidUvIndex { face: 0, uv: 7, .. })
        ));
    }

    #[test]
    fn test_fuvs_length_mismatch() {
        let result = Mesh::new(
            vec![Point3::origin()],
            vec![Vector2::zeros()],
            vec![[0, 0, 0, 0]],
            vec![],
        );
        assert!(matches!(result, Err(MeshError::LengthMismatch { array: "fuvs", .. })));
    }

    #[test]
    fn test_planar_quad_normal() {
        let mesh = unit_quad();
        let n = mesh.face_normals()[0];
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        for vn in mesh.vertex_normals() {
            assert!((vn - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_face_zero_normal() {
        // All four corners coincide: zero area, zero normal.
        let mesh = Mesh::new(
            vec![Point3::origin()],
            vec![Vector2::zeros()],
            vec![[0, 0, 0, 0]],
            vec![[0, 0, 0, 0]],
        )
        .unwrap();
        assert_eq!(mesh.face_normals()[0], Vector3::zeros());
        assert_eq!(mesh.vertex_normals()[0], Vector3::zeros());
    }

    #[test]
    fn test_set_coord_length_checked() {
        let mut mesh = unit_quad();
        let err = mesh.set_coord(vec![Point3::origin()]);
        assert!(matches!(err, Err(MeshError::LengthMismatch { array: "coord", .. })));
    }

    #[test]
    fn test_set_coord_marks_dirty() {
        let mut mesh = unit_quad();
        assert!(mesh.dirty().is_clean());
        mesh.set_coord(mesh.coords().to_vec()).unwrap();
        assert!(mesh.dirty().contains(DirtyBits::POSITIONS));
        assert!(mesh.dirty().contains(DirtyBits::NORMALS));
        mesh.calc_normals(None, None);
        assert!(mesh.dirty().is_clean());
    }

    #[test]
    fn test_index_buffer_monotonic_and_masked() {
        let mut mesh = two_quads();
        assert_eq!(mesh.index_buffer(), &[0, 1, 2, 3, 1, 4, 5, 2]);

        mesh.change_face_mask(vec![false, true]).unwrap();
        assert_eq!(mesh.index_buffer(), &[1, 4, 5, 2]);
    }

    #[test]
    fn test_change_face_mask_wrong_length() {
        let mut mesh = two_quads();
        let err = mesh.change_face_mask(vec![true]);
        assert!(matches!(
            err,
            Err(MeshError::MaskSizeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_faces_for_vertices() {
        let mesh = two_quads();
        assert_eq!(mesh.faces_for_vertices(&[0]), vec![0]);
        assert_eq!(mesh.faces_for_vertices(&[4]), vec![1]);
        // Vertex 2 lies on the shared edge.
        assert_eq!(mesh.faces_for_vertices(&[2]), vec![0, 1]);
        assert_eq!(mesh.faces_for_vertices(&[]), Vec::<u32>::new());
    }

    #[test]
    fn test_subset_normal_recompute_matches_full() {
        let mut mesh = two_quads();
        let mut coord = mesh.coords().to_vec();
        coord[2].z = 0.5;
        mesh.set_coord(coord).unwrap();

        let touched = vec![2u32];
        let faces = mesh.faces_for_vertices(&touched);
        mesh.calc_normals(Some(&touched), Some(&faces));
        let subset_normal = mesh.vertex_normals()[2];

        mesh.calc_normals(None, None);
        assert!((mesh.vertex_normals()[2] - subset_normal).norm() < 1e-6);
    }

    #[test]
    fn test_mark_accumulates() {
        let mut mesh = unit_quad();
        mesh.mark(&[0, 2], DirtyBits::NORMALS);
        mesh.mark(&[1], DirtyBits::TANGENTS);
        assert_eq!(mesh.dirty_vertices(), &[0, 2, 1]);
        assert!(mesh.dirty().contains(DirtyBits::NORMALS | DirtyBits::TANGENTS));
    }

    #[test]
    fn test_triangle_as_quad() {
        // Repeated last corner: still a valid 4-corner primitive.
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Vector2::zeros(), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)],
            vec![[0, 1, 2, 2]],
            vec![[0, 1, 2, 2]],
        )
        .unwrap();
        let n = mesh.face_normals()[0];
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }
}
