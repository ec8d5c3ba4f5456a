//! Radial push deformation.
//!
//! Simulates an object pressing the mesh outward from an influence origin:
//! every vertex inside the displace radius moves along a blend of its own
//! surface normal and the radial direction away from the origin. The push
//! fades linearly with distance and vanishes at the radius, so geometry far
//! from the influence point never moves.
//!
//! The per-vertex computation has no cross-vertex dependency; with the
//! `parallel` feature the vertices are distributed over rayon workers and
//! gathered back in input order, bit-identical to the sequential path.
//!
//! # Example
//!
//! ```ignore
//! use push_engine::geom::{push_mesh, PushOptions, Point3, Tolerance, WeightMap};
//!
//! let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
//! let (pushed, diag) = push_mesh(&mesh, &WeightMap::default(), options, Tolerance::default_geom())?;
//! ```

use super::mesh::{MeshError, SurfaceMesh};
use super::weights::{WeightMap, WeightMapError};
use super::{Point3, Tolerance, Transform, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during a push evaluation.
///
/// All of these are contract violations detected before any output is
/// produced; degenerate per-vertex geometry (zero-length normals or a vertex
/// sitting exactly on the origin) is handled silently instead.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The input mesh has no vertices.
    #[error("input mesh has no vertices")]
    EmptyMesh,

    /// The input mesh failed structural validation.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The weight map does not fit the mesh.
    #[error(transparent)]
    Weights(#[from] WeightMapError),

    /// Amplitude, displace radius or envelope contain NaN or Inf.
    #[error("push parameters contain NaN or Inf")]
    InvalidParameters,

    /// The influence origin is not finite.
    #[error("influence origin must be finite")]
    InvalidInfluence,
}

// ============================================================================
// Options
// ============================================================================

/// How the displacement splits between the radial axis and the normal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleBlend {
    /// Absolute dot product of the raw normal and raw offset vectors.
    ///
    /// The factor scales with both vector magnitudes, so the radial share of
    /// the push grows as a vertex sits farther from the origin. This is the
    /// behavior the deformer has always shipped with and remains the
    /// default; switching to [`AngleBlend::Cosine`] changes numerical output.
    #[default]
    Scaled,

    /// True cosine of the angle between unit normal and unit offset,
    /// clamped to `[0, 1]`. Degenerate normals or a vertex coinciding with
    /// the origin yield 0.
    Cosine,
}

/// Options for the push deformation.
///
/// `amplitude` is the signed push strength, `displace_radius` the distance
/// at which the effect has fully faded, and `envelope` a global intensity
/// multiplier (defaults to 1.0). None of the scalars are clamped here; range
/// limits are the host boundary's business.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushOptions {
    /// Point the push radiates from.
    pub origin: Point3,
    /// Signed push strength.
    pub amplitude: f64,
    /// Falloff radius; vertices at or beyond it never move.
    pub displace_radius: f64,
    /// Global intensity multiplier, typically in `[0, 1]`.
    pub envelope: f64,
    /// Radial/normal blend mode.
    pub blend: AngleBlend,
}

impl PushOptions {
    /// Create new push options.
    ///
    /// # Arguments
    /// * `origin` - Point the push radiates from
    /// * `amplitude` - Signed push strength
    /// * `displace_radius` - Falloff radius
    #[must_use]
    pub fn new(origin: Point3, amplitude: f64, displace_radius: f64) -> Self {
        Self {
            origin,
            amplitude,
            displace_radius,
            envelope: 1.0,
            blend: AngleBlend::default(),
        }
    }

    /// Create push options from an influence transform.
    ///
    /// Only the translation component of the transform is consumed; rotation
    /// and scale do not affect the deformation.
    #[must_use]
    pub fn from_influence(influence: Transform, amplitude: f64, displace_radius: f64) -> Self {
        let t = influence.translation();
        Self::new(Point3::new(t.x, t.y, t.z), amplitude, displace_radius)
    }

    /// Set the global envelope multiplier.
    #[must_use]
    pub const fn envelope(mut self, envelope: f64) -> Self {
        self.envelope = envelope;
        self
    }

    /// Set the radial/normal blend mode.
    #[must_use]
    pub const fn blend(mut self, blend: AngleBlend) -> Self {
        self.blend = blend;
        self
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Diagnostics specific to a push evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushDiagnostics {
    /// Number of vertices in the mesh.
    pub vertex_count: usize,
    /// Number of vertices that actually moved.
    pub influenced_vertex_count: usize,
    /// Number of vertices whose normal was zero-length (push suppressed).
    pub degenerate_normal_count: usize,
    /// Minimum displacement distance applied.
    pub min_displacement: f64,
    /// Maximum displacement distance applied.
    pub max_displacement: f64,
    /// Average displacement distance applied.
    pub avg_displacement: f64,
    /// Warnings generated during the operation.
    pub warnings: Vec<String>,
}

// ============================================================================
// Kernel
// ============================================================================

/// Push a single vertex.
///
/// This is the pure per-vertex kernel: given a position, its normal and its
/// influence weight, return the pushed position. It never fails; degenerate
/// inputs simply contribute nothing along the affected axis.
#[must_use]
pub fn push_vertex(position: Point3, normal: Vec3, weight: f64, options: &PushOptions) -> Point3 {
    let direction = position.sub_point(options.origin);
    let distance = direction.length();

    // Linear falloff: full strength at the origin, zero at the radius.
    let falloff = (options.displace_radius - distance).max(0.0);
    let power = falloff * options.amplitude * weight * options.envelope;

    let angle_factor = match options.blend {
        AngleBlend::Scaled => normal.dot(direction).abs(),
        AngleBlend::Cosine => match (normal.normalized(), direction.normalized()) {
            (Some(n), Some(d)) => n.dot(d).abs().min(1.0),
            _ => 0.0,
        },
    };

    let push_power = power * angle_factor;
    let normal_power = power - push_power;

    position
        .add_vec(direction.mul_scalar(push_power))
        .add_vec(normal.mul_scalar(normal_power))
}

/// Apply the push deformation to a mesh.
///
/// Produces a fresh mesh with the same index buffer and vertex ordering;
/// only positions change. Stored input normals are carried over unchanged.
/// After a push they describe the undeformed surface; recomputing them is
/// the host's call.
///
/// # Arguments
/// * `mesh` - The input mesh to deform.
/// * `weights` - Per-vertex influence weights.
/// * `options` - Push options.
/// * `tol` - Tolerance used for diagnostics thresholds.
///
/// # Returns
/// A tuple of the pushed mesh and diagnostics.
///
/// # Errors
/// Returns an error if the mesh is empty or structurally invalid, the weight
/// map does not fit, or any scalar parameter or the origin is non-finite.
pub fn push_mesh(
    mesh: &SurfaceMesh,
    weights: &WeightMap,
    options: PushOptions,
    tol: Tolerance,
) -> Result<(SurfaceMesh, PushDiagnostics), PushError> {
    if mesh.positions.is_empty() {
        return Err(PushError::EmptyMesh);
    }
    mesh.validate()?;
    weights.validate(mesh.vertex_count())?;
    validate_options(&options)?;

    let normals = mesh.vertex_normals()?;

    let pushed = apply_push(&mesh.positions, &normals, weights, &options);

    // Statistics pass over the realized displacements.
    let mut min_disp = f64::MAX;
    let mut max_disp = f64::MIN;
    let mut sum = 0.0;
    let mut influenced = 0usize;
    for (before, after) in mesh.positions.iter().zip(&pushed) {
        let d = Point3::from_array(*after).distance_to(Point3::from_array(*before));
        min_disp = min_disp.min(d);
        max_disp = max_disp.max(d);
        sum += d;
        if d > tol.eps {
            influenced += 1;
        }
    }
    let avg_disp = sum / pushed.len() as f64;

    let degenerate_normal_count = normals
        .iter()
        .filter(|n| Tolerance::ZERO_LENGTH.is_zero_vec3(**n))
        .count();

    let mut warnings = Vec::new();
    if degenerate_normal_count > 0 {
        warnings.push(format!(
            "{degenerate_normal_count} vertices have zero-length normals; push suppressed there"
        ));
    }
    if !(0.0..=1.0).contains(&options.envelope) {
        warnings.push(format!(
            "envelope {} is outside the usual [0, 1] range",
            options.envelope
        ));
    }

    let diagnostics = PushDiagnostics {
        vertex_count: mesh.vertex_count(),
        influenced_vertex_count: influenced,
        degenerate_normal_count,
        min_displacement: min_disp,
        max_displacement: max_disp,
        avg_displacement: avg_disp,
        warnings,
    };

    let result = SurfaceMesh {
        positions: pushed,
        indices: mesh.indices.clone(),
        normals: mesh.normals.clone(),
    };

    Ok((result, diagnostics))
}

/// Push a mesh with the origin taken from an influence transform.
///
/// Convenience wrapper over [`push_mesh`]; only the transform's translation
/// reaches the kernel.
pub fn push_mesh_from(
    mesh: &SurfaceMesh,
    weights: &WeightMap,
    influence: Transform,
    amplitude: f64,
    displace_radius: f64,
    tol: Tolerance,
) -> Result<(SurfaceMesh, PushDiagnostics), PushError> {
    push_mesh(
        mesh,
        weights,
        PushOptions::from_influence(influence, amplitude, displace_radius),
        tol,
    )
}

/// Push a mesh with full influence on every vertex.
///
/// Convenience wrapper over [`push_mesh`] with a uniform weight of 1.0.
pub fn push_mesh_uniform(
    mesh: &SurfaceMesh,
    options: PushOptions,
    tol: Tolerance,
) -> Result<(SurfaceMesh, PushDiagnostics), PushError> {
    push_mesh(mesh, &WeightMap::default(), options, tol)
}

/// Push parallel position/normal sequences directly.
///
/// The sequence-level contract without the mesh container: positions and
/// normals are parallel buffers indexed identically, the weight map supplies
/// one scalar per index, and the output has the same length and ordering as
/// the input. Useful when the host already maintains its own normals and
/// topology.
///
/// # Errors
/// Returns an error on mismatched sequence lengths, a weight map that does
/// not fit, non-finite positions, or non-finite parameters.
pub fn push_points(
    positions: &[Point3],
    normals: &[Vec3],
    weights: &WeightMap,
    options: &PushOptions,
) -> Result<Vec<Point3>, PushError> {
    if normals.len() != positions.len() {
        return Err(PushError::Mesh(MeshError::NormalsLengthMismatch {
            positions_len: positions.len(),
            normals_len: normals.len(),
        }));
    }
    if positions.iter().any(|p| !p.is_finite()) {
        return Err(PushError::Mesh(MeshError::InvalidVertices));
    }
    weights.validate(positions.len())?;
    validate_options(options)?;

    Ok(positions
        .iter()
        .enumerate()
        .map(|(i, &p)| push_vertex(p, normals[i], weights.value_at(i), options))
        .collect())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn validate_options(options: &PushOptions) -> Result<(), PushError> {
    if !options.amplitude.is_finite()
        || !options.displace_radius.is_finite()
        || !options.envelope.is_finite()
    {
        return Err(PushError::InvalidParameters);
    }
    if !options.origin.is_finite() {
        return Err(PushError::InvalidInfluence);
    }
    Ok(())
}

/// Run the kernel over every vertex, sequentially or on the rayon pool.
///
/// Both paths perform identical per-vertex arithmetic and gather results by
/// index, so the output is bit-identical regardless of worker count.
fn apply_push(
    positions: &[[f64; 3]],
    normals: &[Vec3],
    weights: &WeightMap,
    options: &PushOptions,
) -> Vec<[f64; 3]> {
    let eval = |(i, pos): (usize, &[f64; 3])| -> [f64; 3] {
        push_vertex(
            Point3::from_array(*pos),
            normals[i],
            weights.value_at(i),
            options,
        )
        .to_array()
    };

    #[cfg(feature = "parallel")]
    {
        positions.par_iter().enumerate().map(eval).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        positions.iter().enumerate().map(eval).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_normals(n: usize, normal: Vec3) -> Vec<Vec3> {
        vec![normal; n]
    }

    #[test]
    fn test_push_vertex_reference_values() {
        // Vertex on the X axis, normal along X, all parameters at 1.
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
        let p = push_vertex(Point3::new(5.0, 0.0, 0.0), Vec3::X, 1.0, &options);
        // falloff 5, power 5, angle |1*5| = 5, push 25, normal 5-25 = -20:
        // 5 + 5*25 - 20 = 110.
        assert_eq!(p, Point3::new(110.0, 0.0, 0.0));
    }

    #[test]
    fn test_push_vertex_zero_weight_is_identity() {
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
        let p = push_vertex(Point3::new(5.0, 0.0, 0.0), Vec3::X, 0.0, &options);
        assert_eq!(p, Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_push_vertex_beyond_radius_is_identity() {
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
        let p = push_vertex(Point3::new(20.0, 0.0, 0.0), Vec3::X, 1.0, &options);
        assert_eq!(p, Point3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn test_push_vertex_zero_normal_is_identity() {
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
        let p = push_vertex(Point3::new(5.0, 0.0, 0.0), Vec3::ZERO, 1.0, &options);
        // Zero normal: angle factor 0, the whole push lands on the normal
        // axis with zero magnitude.
        assert_eq!(p, Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_push_vertex_at_origin_is_safe() {
        let options = PushOptions::new(Point3::ORIGIN, 2.0, 10.0);
        // Vertex coincides with the origin: direction is zero, angle factor
        // is zero, so the entire power lands on the normal axis.
        let p = push_vertex(Point3::ORIGIN, Vec3::Z, 1.0, &options);
        assert_eq!(p, Point3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_cosine_blend_differs_from_scaled() {
        let scaled = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
        let cosine = scaled.blend(AngleBlend::Cosine);

        let position = Point3::new(5.0, 0.0, 0.0);
        let p_scaled = push_vertex(position, Vec3::X, 1.0, &scaled);
        let p_cosine = push_vertex(position, Vec3::X, 1.0, &cosine);

        // Cosine: angle 1, push 5, normal 0: 5 + 5*5 = 30.
        assert_eq!(p_cosine, Point3::new(30.0, 0.0, 0.0));
        assert_ne!(p_scaled, p_cosine);
    }

    #[test]
    fn test_cosine_blend_degenerate_direction() {
        let options = PushOptions::new(Point3::ORIGIN, 2.0, 10.0).blend(AngleBlend::Cosine);
        let p = push_vertex(Point3::ORIGIN, Vec3::Z, 1.0, &options);
        // Degenerate direction: angle 0, everything on the normal axis.
        assert_eq!(p, Point3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_push_points_order_and_length() {
        let positions = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let normals = unit_normals(3, Vec3::X);
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);

        let pushed = push_points(&positions, &normals, &WeightMap::default(), &options).unwrap();
        assert_eq!(pushed.len(), 3);
        // The out-of-radius vertex keeps its slot and position.
        assert_eq!(pushed[1], positions[1]);
        assert!(pushed[0].x > positions[0].x);
    }

    #[test]
    fn test_push_points_rejects_length_mismatch() {
        let positions = vec![Point3::ORIGIN; 3];
        let normals = unit_normals(2, Vec3::X);
        let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);

        let result = push_points(&positions, &normals, &WeightMap::default(), &options);
        assert!(matches!(
            result,
            Err(PushError::Mesh(MeshError::NormalsLengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_validate_options_non_finite() {
        let options = PushOptions::new(Point3::ORIGIN, f64::NAN, 10.0);
        assert!(matches!(
            validate_options(&options),
            Err(PushError::InvalidParameters)
        ));

        let options = PushOptions::new(Point3::new(f64::INFINITY, 0.0, 0.0), 1.0, 10.0);
        assert!(matches!(
            validate_options(&options),
            Err(PushError::InvalidInfluence)
        ));
    }

    #[test]
    fn test_from_influence_ignores_rotation_and_scale() {
        let influence = Transform::translate(Vec3::new(1.0, 2.0, 3.0))
            .compose(Transform::rotate_z(1.2))
            .compose(Transform::scale(4.0, 4.0, 4.0));
        let options = PushOptions::from_influence(influence, 1.0, 10.0);
        assert_eq!(options.origin, Point3::new(1.0, 2.0, 3.0));
    }
}
