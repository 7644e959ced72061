//! Linear algebra for the affine (orthographic) transform pipeline.

pub mod batch;
pub mod mat3x4;
pub mod vec3;
