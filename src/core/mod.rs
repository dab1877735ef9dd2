//! Core primitives.
//!
//! Small value types shared by the view builders: positions, stable
//! identifiers and lenient JSON coercion.

pub mod hash;
pub mod value;
pub mod vec3;

// Re-export core types
pub use hash::{PlayerId, SmokeKey};
pub use vec3::Vec3;
