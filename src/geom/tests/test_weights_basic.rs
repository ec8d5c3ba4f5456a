//! Tests for weight maps driving the push deformation.

use crate::geom::{
    Point3, PushOptions, SurfaceMesh, Tolerance, WeightMap, WeightMapError, push_mesh,
};

fn create_strip() -> SurfaceMesh {
    // Four vertices along X, two triangles, explicit X normals.
    SurfaceMesh::with_normals(
        vec![
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [5.0, 0.0, 0.0],
        ],
        vec![0, 1, 2, 1, 3, 2],
        vec![[1.0, 0.0, 0.0]; 4],
    )
}

#[test]
fn test_painted_weights_scale_the_push() {
    let mesh = create_strip();
    let weights = WeightMap::per_vertex(vec![0.0, 0.5, 0.5, 1.0]);
    let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);

    let (pushed, _) = push_mesh(&mesh, &weights, options, Tolerance::default_geom()).unwrap();

    // Weight zero pins the first vertex.
    assert_eq!(pushed.positions[0], mesh.positions[0]);

    // Half weight moves half as far as full weight would for the same vertex.
    let full = WeightMap::uniform(1.0);
    let (full_pushed, _) = push_mesh(&mesh, &full, options, Tolerance::default_geom()).unwrap();
    let half_delta = pushed.positions[1][0] - mesh.positions[1][0];
    let full_delta = full_pushed.positions[1][0] - mesh.positions[1][0];
    // The displacement vector is linear in power, hence in weight.
    assert!((half_delta - full_delta * 0.5).abs() < 1e-9);
}

#[test]
fn test_uniform_map_covers_any_vertex_count() {
    let mesh = create_strip();
    let weights = WeightMap::uniform(0.25);
    assert!(weights.validate(mesh.vertex_count()).is_ok());
    let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
    let (pushed, diag) = push_mesh(&mesh, &weights, options, Tolerance::default_geom()).unwrap();
    assert_eq!(diag.influenced_vertex_count, 4);
    assert_ne!(pushed.positions, mesh.positions);
}

#[test]
fn test_short_weight_array_rejected_before_output() {
    let mesh = create_strip();
    let weights = WeightMap::per_vertex(vec![1.0, 1.0, 1.0]);
    let options = PushOptions::new(Point3::ORIGIN, 1.0, 10.0);
    let result = push_mesh(&mesh, &weights, options, Tolerance::default_geom());
    assert!(result.is_err());
}

#[test]
fn test_nan_weight_rejected() {
    let map = WeightMap::per_vertex(vec![0.2, f64::NAN, 0.4, 0.8]);
    assert!(matches!(
        map.validate(4),
        Err(WeightMapError::NonFiniteWeights)
    ));
}

#[test]
fn test_out_of_range_lookup_is_zero() {
    let map = WeightMap::per_vertex(vec![0.7]);
    assert_eq!(map.value_at(0), 0.7);
    assert_eq!(map.value_at(5), 0.0);
}
