//! Spatial partitioning data structures
//!
//! Provides the octree used to keep moving bodies indexed by position so that
//! neighbour queries do not need a linear scan of the scene.

mod octree;

pub use octree::{octant_of, NodeId, Octree, OctreeConfig, OctreeEntry, OctreeNode};
