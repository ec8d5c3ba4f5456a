//! Tests for the push deformation (falloff, blending, contract guarantees).

use crate::geom::{
    AngleBlend, MeshError, Point3, PushError, PushOptions, SurfaceMesh, Tolerance, Transform,
    Vec3, WeightMap, WeightMapError, push_mesh, push_mesh_from, push_mesh_uniform, push_points,
};

// ============================================================================
// Test mesh factories
// ============================================================================

/// Create a simple cube mesh (2x2x2 centered at origin).
fn create_test_cube() -> SurfaceMesh {
    let positions = vec![
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    let indices = vec![
        // Bottom face
        0, 2, 1, 0, 3, 2, // Top face
        4, 5, 6, 4, 6, 7, // Front face
        0, 1, 5, 0, 5, 4, // Back face
        2, 3, 7, 2, 7, 6, // Left face
        0, 7, 3, 0, 4, 7, // Right face
        1, 2, 6, 1, 6, 5,
    ];
    SurfaceMesh::new(positions, indices)
}

/// Single triangle on the X axis with explicit X-facing normals.
fn create_x_triangle() -> SurfaceMesh {
    SurfaceMesh::with_normals(
        vec![[5.0, 0.0, 0.0], [5.0, 1.0, 0.0], [5.0, 0.0, 1.0]],
        vec![0, 1, 2],
        vec![[1.0, 0.0, 0.0]; 3],
    )
}

fn default_options() -> PushOptions {
    PushOptions::new(Point3::ORIGIN, 1.0, 10.0)
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_reference_push_on_axis() {
    // Vertex at (5,0,0), normal (1,0,0), amplitude 1, radius 10, envelope 1,
    // weight 1: falloff 5, power 5, angle |(1,0,0)·(5,0,0)| = 5, push 25,
    // normal -20, result (5 + 125 - 20, 0, 0) = (110, 0, 0).
    let mesh = create_x_triangle();
    let (pushed, diag) = push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom())
        .expect("push should succeed");

    assert_eq!(pushed.positions[0][0], 110.0);
    assert_eq!(pushed.positions[0][1], 0.0);
    assert_eq!(pushed.positions[0][2], 0.0);
    assert_eq!(diag.vertex_count, 3);
    assert_eq!(diag.influenced_vertex_count, 3);
}

#[test]
fn test_zero_weight_is_identity() {
    let mesh = create_x_triangle();
    let weights = WeightMap::uniform(0.0);
    let (pushed, diag) =
        push_mesh(&mesh, &weights, default_options(), Tolerance::default_geom()).unwrap();

    assert_eq!(pushed.positions, mesh.positions);
    assert_eq!(diag.influenced_vertex_count, 0);
    assert_eq!(diag.max_displacement, 0.0);
}

#[test]
fn test_zero_envelope_is_identity() {
    let mesh = create_x_triangle();
    let options = default_options().envelope(0.0);
    let (pushed, _) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();
    assert_eq!(pushed.positions, mesh.positions);
}

#[test]
fn test_zero_amplitude_is_identity() {
    let mesh = create_test_cube();
    let options = PushOptions::new(Point3::ORIGIN, 0.0, 10.0);
    let (pushed, _) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();
    assert_eq!(pushed.positions, mesh.positions);
}

#[test]
fn test_vertices_beyond_radius_never_move() {
    // Vertex at distance 20 with radius 10: falloff clamps to zero no matter
    // how aggressive the other parameters are.
    let mesh = SurfaceMesh::with_normals(
        vec![[20.0, 0.0, 0.0], [21.0, 0.0, 0.0], [20.0, 1.0, 0.0]],
        vec![0, 1, 2],
        vec![[1.0, 0.0, 0.0]; 3],
    );
    let options = PushOptions::new(Point3::ORIGIN, 100.0, 10.0).envelope(1.0);
    let (pushed, diag) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();

    assert_eq!(pushed.positions, mesh.positions);
    assert_eq!(diag.influenced_vertex_count, 0);
}

#[test]
fn test_vertex_exactly_at_radius_does_not_move() {
    let mesh = SurfaceMesh::with_normals(
        vec![[10.0, 0.0, 0.0], [11.0, 0.0, 0.0], [10.0, 1.0, 0.0]],
        vec![0, 1, 2],
        vec![[1.0, 0.0, 0.0]; 3],
    );
    let (pushed, _) =
        push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom()).unwrap();
    assert_eq!(pushed.positions[0], [10.0, 0.0, 0.0]);
}

#[test]
fn test_negative_displace_radius_is_identity() {
    let mesh = create_test_cube();
    let options = PushOptions::new(Point3::ORIGIN, 1.0, -5.0);
    let (pushed, _) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();
    assert_eq!(pushed.positions, mesh.positions);
}

// ============================================================================
// Contract guarantees
// ============================================================================

#[test]
fn test_order_and_length_preserved() {
    let mesh = create_test_cube();
    let weights = WeightMap::per_vertex(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    let (pushed, _) =
        push_mesh(&mesh, &weights, default_options(), Tolerance::default_geom()).unwrap();

    assert_eq!(pushed.positions.len(), mesh.positions.len());
    assert_eq!(pushed.indices, mesh.indices);
    // Zero-weight vertices keep their slots and their positions.
    for i in [0usize, 2, 4, 6] {
        assert_eq!(pushed.positions[i], mesh.positions[i]);
    }
    for i in [1usize, 3, 5, 7] {
        assert_ne!(pushed.positions[i], mesh.positions[i]);
    }
}

#[test]
fn test_determinism() {
    let mesh = create_test_cube();
    let weights = WeightMap::per_vertex(vec![0.1, 0.9, 0.3, 0.7, 0.5, 0.5, 0.2, 0.8]);
    let options = PushOptions::new(Point3::new(0.3, -0.2, 0.9), 2.5, 6.0).envelope(0.8);

    let (a, _) = push_mesh(&mesh, &weights, options, Tolerance::default_geom()).unwrap();
    let (b, _) = push_mesh(&mesh, &weights, options, Tolerance::default_geom()).unwrap();

    // Bit-identical across repeat evaluations.
    assert_eq!(a.positions, b.positions);
}

#[test]
fn test_input_mesh_is_not_mutated() {
    let mesh = create_test_cube();
    let original = mesh.clone();
    let _ = push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom()).unwrap();
    assert_eq!(mesh, original);
}

#[test]
fn test_degenerate_normal_suppresses_push() {
    let mesh = SurfaceMesh::with_normals(
        vec![[5.0, 0.0, 0.0], [5.0, 1.0, 0.0], [5.0, 0.0, 1.0]],
        vec![0, 1, 2],
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
    );
    let (pushed, diag) =
        push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom()).unwrap();

    // The zero-normal vertex stays put; its neighbors still move.
    assert_eq!(pushed.positions[0], [5.0, 0.0, 0.0]);
    assert_ne!(pushed.positions[1], mesh.positions[1]);
    assert_eq!(diag.degenerate_normal_count, 1);
    assert!(!diag.warnings.is_empty());
}

#[test]
fn test_negative_amplitude_pulls_inward() {
    let mesh = create_x_triangle();
    let options = PushOptions::new(Point3::ORIGIN, -1.0, 10.0);
    let (pushed, _) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();
    // Mirrored displacement: (5,0,0) goes to 5 - 125 + 20 = -100.
    assert_eq!(pushed.positions[0][0], -100.0);
}

// ============================================================================
// Influence frame
// ============================================================================

#[test]
fn test_influence_uses_translation_only() {
    let mesh = create_x_triangle();
    let plain = Transform::translate(Vec3::new(0.0, 0.0, 0.0));
    let decorated = plain
        .compose(Transform::rotate_z(2.1))
        .compose(Transform::scale(3.0, 3.0, 3.0));

    let (a, _) = push_mesh_from(
        &mesh,
        &WeightMap::default(),
        plain,
        1.0,
        10.0,
        Tolerance::default_geom(),
    )
    .unwrap();
    let (b, _) = push_mesh_from(
        &mesh,
        &WeightMap::default(),
        decorated,
        1.0,
        10.0,
        Tolerance::default_geom(),
    )
    .unwrap();

    assert_eq!(a.positions, b.positions);
}

#[test]
fn test_moving_the_origin_moves_the_effect() {
    let mesh = create_x_triangle();
    let near = Transform::translate(Vec3::new(4.0, 0.0, 0.0));
    let far = Transform::translate(Vec3::new(-40.0, 0.0, 0.0));

    let (near_pushed, near_diag) = push_mesh_from(
        &mesh,
        &WeightMap::default(),
        near,
        1.0,
        10.0,
        Tolerance::default_geom(),
    )
    .unwrap();
    let (far_pushed, far_diag) = push_mesh_from(
        &mesh,
        &WeightMap::default(),
        far,
        1.0,
        10.0,
        Tolerance::default_geom(),
    )
    .unwrap();

    assert!(near_diag.influenced_vertex_count > 0);
    assert_ne!(near_pushed.positions, mesh.positions);
    // All vertices sit ≥ 40 units from the far origin, beyond the radius.
    assert_eq!(far_diag.influenced_vertex_count, 0);
    assert_eq!(far_pushed.positions, mesh.positions);
}

// ============================================================================
// Blend variants
// ============================================================================

#[test]
fn test_cosine_blend_is_a_distinct_contract() {
    let mesh = create_x_triangle();
    let scaled = default_options();
    let cosine = default_options().blend(AngleBlend::Cosine);

    let (a, _) = push_mesh_uniform(&mesh, scaled, Tolerance::default_geom()).unwrap();
    let (b, _) = push_mesh_uniform(&mesh, cosine, Tolerance::default_geom()).unwrap();

    // Cosine for vertex 0: angle 1, push 5, result (30, 0, 0).
    assert_eq!(a.positions[0][0], 110.0);
    assert_eq!(b.positions[0][0], 30.0);
}

// ============================================================================
// Error paths
// ============================================================================

#[test]
fn test_empty_mesh_error() {
    let mesh = SurfaceMesh::new(vec![], vec![]);
    let result = push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom());
    assert!(matches!(result, Err(PushError::EmptyMesh)));
}

#[test]
fn test_invalid_geometry_error() {
    let mesh = SurfaceMesh::new(
        vec![[f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
        vec![0, 1, 2],
    );
    let result = push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom());
    assert!(matches!(
        result,
        Err(PushError::Mesh(MeshError::InvalidVertices))
    ));
}

#[test]
fn test_weight_count_mismatch_error() {
    let mesh = create_test_cube();
    let weights = WeightMap::per_vertex(vec![1.0; 3]);
    let result = push_mesh(&mesh, &weights, default_options(), Tolerance::default_geom());
    assert!(matches!(
        result,
        Err(PushError::Weights(WeightMapError::CountMismatch {
            expected: 8,
            got: 3
        }))
    ));
}

#[test]
fn test_normals_length_mismatch_error() {
    let mut mesh = create_test_cube();
    mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 2]);
    let result = push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom());
    assert!(matches!(
        result,
        Err(PushError::Mesh(MeshError::NormalsLengthMismatch { .. }))
    ));
}

#[test]
fn test_non_finite_parameters_error() {
    let mesh = create_test_cube();
    let options = PushOptions::new(Point3::ORIGIN, 1.0, f64::INFINITY);
    let result = push_mesh_uniform(&mesh, options, Tolerance::default_geom());
    assert!(matches!(result, Err(PushError::InvalidParameters)));

    let options = default_options().envelope(f64::NAN);
    let result = push_mesh_uniform(&mesh, options, Tolerance::default_geom());
    assert!(matches!(result, Err(PushError::InvalidParameters)));
}

// ============================================================================
// Sequence-level entry point
// ============================================================================

#[test]
fn test_push_points_matches_mesh_path() {
    let mesh = create_x_triangle();
    let positions: Vec<Point3> = mesh.positions.iter().map(|p| Point3::from_array(*p)).collect();
    let normals: Vec<Vec3> = mesh
        .normals
        .as_ref()
        .unwrap()
        .iter()
        .map(|n| Vec3::from_array(*n))
        .collect();

    let options = default_options();
    let from_points =
        push_points(&positions, &normals, &WeightMap::default(), &options).unwrap();
    let (from_mesh, _) =
        push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();

    for (a, b) in from_points.iter().zip(&from_mesh.positions) {
        assert_eq!(a.to_array(), *b);
    }
}

#[test]
fn test_push_points_rejects_non_finite_positions() {
    let positions = vec![Point3::new(f64::NAN, 0.0, 0.0)];
    let normals = vec![Vec3::X];
    let result = push_points(
        &positions,
        &normals,
        &WeightMap::default(),
        &default_options(),
    );
    assert!(matches!(
        result,
        Err(PushError::Mesh(MeshError::InvalidVertices))
    ));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_displacement_stats() {
    let mesh = create_x_triangle();
    let (_, diag) =
        push_mesh_uniform(&mesh, default_options(), Tolerance::default_geom()).unwrap();

    assert!(diag.min_displacement >= 0.0);
    assert!(diag.max_displacement >= diag.min_displacement);
    assert!(diag.avg_displacement <= diag.max_displacement);
    assert!(diag.max_displacement > 0.0);
}

#[test]
fn test_envelope_outside_unit_range_warns() {
    let mesh = create_x_triangle();
    let options = default_options().envelope(2.0);
    let (_, diag) = push_mesh_uniform(&mesh, options, Tolerance::default_geom()).unwrap();
    assert!(diag.warnings.iter().any(|w| w.contains("envelope")));
}
