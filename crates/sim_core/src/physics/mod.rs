//! Physics module for collision detection and response
//!
//! Narrow-phase resolvers for sphere, plane, edge and ring primitives, the
//! dispatcher that routes between them, ray casting, and a per-scene
//! [`CollisionWorld`] that ties them to the octree broad phase.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod error;
pub mod settings;
pub mod solver;

pub use collision::{
    cast_ray, collides, does_collide, handle_collision, BoundingSphere, Contact, EdgeRestriction,
    PlaneRestriction, Primitive, PrimitiveKind, Ray, RayHit,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{CollisionEvent, CollisionPair, CollisionWorld};
pub use error::{CollisionError, SolverError};
pub use settings::{CollisionConfig, WorldConfig};
pub use solver::{solve_linear_equation, solve_linear_equation4};
