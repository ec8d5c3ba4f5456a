mod core;
mod mesh;
mod push;
mod weights;

pub use self::core::{Point3, Tolerance, Transform, Vec3};
pub use mesh::{MeshError, SurfaceMesh, compute_smooth_normals};
pub use push::{
    AngleBlend, PushDiagnostics, PushError, PushOptions, push_mesh, push_mesh_from,
    push_mesh_uniform, push_points, push_vertex,
};
pub use weights::{WeightMap, WeightMapError};

#[cfg(test)]
mod tests;
