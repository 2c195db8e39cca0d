//! # Sim Core
//!
//! Spatial index and narrow-phase collision substrate for a real-time simulation.
//!
//! ## Features
//!
//! - **Octree**: lazily subdivided cubic partition of the world for bodies that
//!   move every step, with point, sphere and multi-sphere insertion
//! - **Collision primitives**: spheres, planes, edges, rings and composites that
//!   derive their world placement from an owning body at query time
//! - **Dispatch**: closed `(kind, kind)` routing to pairwise resolvers
//! - **Ray casting**: nearest-hit queries against primitives and whole worlds
//!
//! ## Quick Start
//!
//! ```rust
//! use sim_core::prelude::*;
//!
//! let mut bodies = Bodies::new();
//! let a = bodies.insert(Transform::from_position(Vec3::new(0.0, 0.0, 0.0)));
//! let b = bodies.insert(Transform::from_position(Vec3::new(1.5, 0.0, 0.0)));
//!
//! let sphere_a = Primitive::sphere(a, 1.0);
//! let sphere_b = Primitive::sphere(b, 1.0);
//!
//! let contact = does_collide(&sphere_a, &sphere_b, &bodies)?;
//! assert!(contact.is_some());
//! # Ok::<(), sim_core::physics::CollisionError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod spatial;

/// Common imports for users of the core
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        foundation::math::{Mat3, Quat, Transform, Vec3, Vec4},
        physics::{
            cast_ray, collides, does_collide, handle_collision, BoundingSphere, CollisionConfig,
            CollisionError, CollisionEvent, CollisionLayers, CollisionWorld, Contact,
            EdgeRestriction, PlaneRestriction, Primitive, Ray, RayHit, WorldConfig,
        },
        scene::{Bodies, BodyId},
        spatial::{Octree, OctreeConfig},
    };
}
