//! Body storage consumed by the collision core
//!
//! The core never walks a scene graph itself; it only needs each body's resolved
//! world placement. [`Bodies`] keeps the minimal position/rotation/scale hierarchy
//! that collision primitives and the octree read from at query time.

mod body;

pub use body::{Bodies, Body, BodyId};
