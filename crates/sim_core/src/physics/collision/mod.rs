//! Narrow-phase collision detection
//!
//! Shapes are stored in their owning body's local space and carried into world
//! space only while a test runs, so a primitive never holds stale coordinates.
//!
//! # Module Organization
//!
//! - [`primitives`] - shape variants, restrictions, rays and world-space forms
//! - [`resolvers`] - one function per supported shape pair
//! - [`dispatch`] - routing from two primitives to a resolver, exit correction
//! - [`raycast`] - ray queries against primitives

pub mod dispatch;
pub mod primitives;
pub mod raycast;
pub mod resolvers;

pub use dispatch::{collides, does_collide, does_collide_with, handle_collision};
pub use primitives::{
    BoundedEdge, BoundedPlane, BoundingSphere, Composite, Contact, Edge, EdgeRestriction, Plane,
    PlaneRestriction, Primitive, PrimitiveKind, Ray, RayHit, Ring, Sphere, WorldEdge, WorldPlane,
    WorldSphere,
};
pub use raycast::{cast_ray, cast_ray_with};
