//! Triangle-mesh container for deformation input.
//!
//! A [`SurfaceMesh`] carries vertex positions, a triangle index list and
//! optional per-vertex normals. Positions and normals are parallel buffers:
//! index `i` in both refers to the same vertex, and deformation output keeps
//! that indexing intact.

use super::{Point3, Vec3};

/// Errors raised by mesh validation.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// Index buffer length is not a multiple of three.
    #[error("mesh indices are not a triangle list (len % 3 != 0)")]
    NotTriangleList,

    /// One or more vertex coordinates are NaN or infinite.
    #[error("mesh has invalid vertex coordinates (NaN/Inf)")]
    InvalidVertices,

    /// An index refers to a vertex beyond the position buffer.
    #[error("mesh has out-of-bounds vertex indices")]
    IndexOutOfBounds,

    /// The normal buffer length does not match the position buffer length.
    #[error("mesh normals length ({normals_len}) does not match positions length ({positions_len})")]
    NormalsLengthMismatch {
        positions_len: usize,
        normals_len: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl SurfaceMesh {
    /// Create a new mesh with positions and indices only.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
        }
    }

    /// Create a new mesh with explicit per-vertex normals.
    #[must_use]
    pub fn with_normals(
        positions: Vec<[f64; 3]>,
        indices: Vec<u32>,
        normals: Vec<[f64; 3]>,
    ) -> Self {
        Self {
            positions,
            indices,
            normals: Some(normals),
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    /// Check structural invariants: triangle index list, finite vertex data,
    /// in-range indices and matching attribute lengths.
    pub fn validate(&self) -> Result<(), MeshError> {
        if !self.has_triangle_indices() {
            return Err(MeshError::NotTriangleList);
        }
        if self.has_invalid_vertices() {
            return Err(MeshError::InvalidVertices);
        }
        if !self.has_valid_indices() {
            return Err(MeshError::IndexOutOfBounds);
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(MeshError::NormalsLengthMismatch {
                    positions_len: self.positions.len(),
                    normals_len: normals.len(),
                });
            }
        }
        Ok(())
    }

    /// Per-vertex normals for deformation.
    ///
    /// Uses the stored normal buffer when present (rejecting a length
    /// mismatch rather than silently recomputing); otherwise computes
    /// area-weighted smooth normals from the triangle list.
    pub fn vertex_normals(&self) -> Result<Vec<Vec3>, MeshError> {
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(MeshError::NormalsLengthMismatch {
                    positions_len: self.positions.len(),
                    normals_len: normals.len(),
                });
            }
            return Ok(normals.iter().map(|n| Vec3::from_array(*n)).collect());
        }
        Ok(compute_smooth_normals(&self.positions, &self.indices))
    }

    /// Returns the position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    ///
    /// This is a zero-copy view over `positions`, useful for wasm/JS adapters
    /// that expect packed numeric buffers.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        flatten_f64_array_slice(&self.positions)
    }

    /// Returns the normal buffer as a flat slice: `[nx0, ny0, nz0, ...]`.
    ///
    /// This is a zero-copy view over `normals` when present.
    #[must_use]
    pub fn normals_flat(&self) -> Option<&[f64]> {
        self.normals.as_deref().map(flatten_f64_array_slice)
    }
}

/// Compute area-weighted smooth vertex normals from a triangle list.
///
/// Each face normal (unnormalized cross product, so larger faces weigh more)
/// is accumulated onto its three corners, then the sums are normalized.
/// Vertices with no well-defined normal (unused, or only degenerate faces)
/// end up with a zero normal, which downstream deformation treats as "no
/// normal-axis contribution" rather than an error.
#[must_use]
pub fn compute_smooth_normals(positions: &[[f64; 3]], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;

        let (Some(p0), Some(p1), Some(p2)) = (
            positions.get(i0),
            positions.get(i1),
            positions.get(i2),
        ) else {
            continue;
        };

        let a = Point3::from_array(*p0);
        let b = Point3::from_array(*p1);
        let c = Point3::from_array(*p2);

        let face_normal = b.sub_point(a).cross(c.sub_point(a));

        normals[i0] = normals[i0].add(face_normal);
        normals[i1] = normals[i1].add(face_normal);
        normals[i2] = normals[i2].add(face_normal);
    }

    for n in &mut normals {
        if let Some(unit) = n.normalized() {
            *n = unit;
        } else {
            *n = Vec3::ZERO;
        }
    }

    normals
}

fn flatten_f64_array_slice(data: &[[f64; 3]]) -> &[f64] {
    let count = data.len().checked_mul(3).unwrap_or(0);
    let ptr = data.as_ptr().cast::<f64>();
    // SAFETY: `[[f64; 3]]` is stored contiguously, and we compute the element count as `len * 3`.
    unsafe { std::slice::from_raw_parts(ptr, count) }
}
