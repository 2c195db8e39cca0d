//! Octree spatial partitioning structure
//!
//! Divides a cubic world region of half-extent `2^current_size` into a hierarchy
//! of octants. Nodes are created lazily while inserting: an object descends into
//! a child only while its bounds fit entirely inside that child's octant and the
//! node is still above the minimum size. Anything that straddles an octant
//! boundary terminates at the deepest node that fully contains it, so every
//! object lives in exactly one node.
//!
//! Nodes live in a `slotmap` arena and refer to each other by [`NodeId`]. Each
//! stored object also has a back-reference to its node, which lets removal find
//! an object even when the caller's idea of its position is out of date.

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;
use crate::physics::BoundingSphere;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

slotmap::new_key_type! {
    /// Handle to a node inside an [`Octree`] arena
    pub struct NodeId;
}

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Depth level of the root; the world half-extent is `2^current_size`
    pub current_size: i32,

    /// Level at which nodes stop subdividing
    pub minimum_size: i32,

    /// Fudge factor added to every radius test so near-zero radii do not flap
    /// across octant boundaries
    pub precision: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            current_size: 10,
            minimum_size: 2,
            precision: 0.01,
        }
    }
}

impl Config for OctreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_size > self.current_size {
            return Err(ConfigError::Invalid(format!(
                "octree minimum_size {} exceeds current_size {}",
                self.minimum_size, self.current_size
            )));
        }
        if !self.precision.is_finite() || self.precision < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "octree precision must be finite and non-negative, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Object stored in the octree with the bounds it was inserted with
#[derive(Debug, Clone, PartialEq)]
pub struct OctreeEntry<T> {
    /// Caller's handle for the object
    pub item: T,
    /// Position the object was inserted at
    pub position: Vec3,
    /// Radius of a sphere around `position` enclosing the object
    pub radius: f32,
}

/// Octant code for `point` relative to `center`
///
/// Bit 2 is set for `x >= center.x`, bit 1 for `y >= center.y` and bit 0 for
/// `z >= center.z`. The code indexes both the children array and the corner
/// array of a node.
pub fn octant_of(center: &Vec3, point: &Vec3) -> usize {
    let x_bit = usize::from(point.x >= center.x);
    let y_bit = usize::from(point.y >= center.y);
    let z_bit = usize::from(point.z >= center.z);
    (x_bit << 2) | (y_bit << 1) | z_bit
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode<T> {
    min: Vec3,
    max: Vec3,
    center: Vec3,
    current_size: i32,
    corners: [Vec3; 8],
    children: Option<[NodeId; 8]>,
    entries: Vec<OctreeEntry<T>>,
    parent: Option<NodeId>,
}

impl<T> OctreeNode<T> {
    fn new(center: Vec3, current_size: i32, parent: Option<NodeId>) -> Self {
        let half = 2f32.powi(current_size);
        let extent = Vec3::new(half, half, half);
        let min = center - extent;
        let max = center + extent;

        let corners = std::array::from_fn(|octant| {
            Vec3::new(
                if octant & 4 != 0 { max.x } else { min.x },
                if octant & 2 != 0 { max.y } else { min.y },
                if octant & 1 != 0 { max.z } else { min.z },
            )
        });

        Self {
            min,
            max,
            center,
            current_size,
            corners,
            children: None,
            entries: Vec::new(),
            parent,
        }
    }

    /// Minimum corner of the node's cube
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner of the node's cube
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Center of the node's cube
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Depth level of this node (half-extent is `2^current_size`)
    pub fn current_size(&self) -> i32 {
        self.current_size
    }

    /// Half the edge length of the node's cube
    pub fn half_extent(&self) -> f32 {
        2f32.powi(self.current_size)
    }

    /// Cube corner for an octant code
    pub fn corner(&self, octant: usize) -> Vec3 {
        self.corners[octant & 7]
    }

    /// Child node ids, present only once the node has been subdivided
    pub fn children(&self) -> Option<&[NodeId; 8]> {
        self.children.as_ref()
    }

    /// Parent node id (`None` for the root)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Objects that terminate at this node
    pub fn entries(&self) -> &[OctreeEntry<T>] {
        &self.entries
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Octant of this node that `point` falls into
    pub fn octant(&self, point: &Vec3) -> usize {
        octant_of(&self.center, point)
    }

    fn child_center(&self, octant: usize) -> Vec3 {
        let quarter = self.half_extent() * 0.5;
        let sign = |bit: usize| if octant & bit != 0 { quarter } else { -quarter };
        self.center + Vec3::new(sign(4), sign(2), sign(1))
    }

    /// Whether a sphere can reach the half-spaces that make up `octant`
    fn sphere_reaches_octant(&self, center: &Vec3, radius: f32, octant: usize) -> bool {
        (0..3).all(|axis| {
            let bit = 4 >> axis;
            if octant & bit != 0 {
                center[axis] + radius >= self.center[axis]
            } else {
                center[axis] - radius < self.center[axis]
            }
        })
    }
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree<T> {
    nodes: SlotMap<NodeId, OctreeNode<T>>,
    root: NodeId,
    config: OctreeConfig,
    locations: HashMap<T, NodeId>,
}

impl<T> Octree<T>
where
    T: Clone + Eq + Hash + Debug,
{
    /// Create an octree centered on the origin with half-extent `2^current_size`
    pub fn new(current_size: i32, minimum_size: i32, precision: f32) -> Self {
        Self::with_config(OctreeConfig {
            current_size,
            minimum_size,
            precision,
        })
    }

    /// Create an octree from a configuration
    pub fn with_config(config: OctreeConfig) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(OctreeNode::new(Vec3::zeros(), config.current_size, None));
        Self {
            nodes,
            root,
            config,
            locations: HashMap::new(),
        }
    }

    /// Configuration the tree was built with
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node by id
    pub fn node(&self, id: NodeId) -> Option<&OctreeNode<T>> {
        self.nodes.get(id)
    }

    /// Node currently holding `item`
    pub fn node_of(&self, item: &T) -> Option<NodeId> {
        self.locations.get(item).copied()
    }

    /// Whether `item` is stored anywhere in the tree
    pub fn contains(&self, item: &T) -> bool {
        self.locations.contains_key(item)
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of allocated nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels below the root that have been created
    pub fn depth(&self) -> i32 {
        self.nodes
            .values()
            .map(|node| self.config.current_size - node.current_size)
            .max()
            .unwrap_or(0)
    }

    /// Insert a point or sphere object
    ///
    /// With `radius + precision <= 0` the object is treated as a point and
    /// descends by octant sign down to the minimum size. Otherwise it descends
    /// only while its sphere stays inside a single child octant.
    pub fn add_object(&mut self, item: T, radius: f32, position: Vec3) {
        self.evict_existing(&item);

        let precision = self.config.precision;
        let is_point = radius + precision <= 0.0;
        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id];
            if node.current_size <= self.config.minimum_size {
                break;
            }
            let octant = if is_point {
                node.octant(&position)
            } else {
                match self.should_subpartition(node, &position, radius) {
                    Some(octant) => octant,
                    None => break,
                }
            };
            node_id = self.child_or_subdivide(node_id, octant);
        }

        self.store(node_id, OctreeEntry { item, position, radius });
    }

    /// Insert an object bounded by several spheres
    ///
    /// Sphere centers are offsets from `position` and, like the radii, are
    /// multiplied by `max_scale`. The object descends only while every sphere
    /// fits in the same child octant, so it is never split across leaves.
    pub fn add_object_spheres(
        &mut self,
        item: T,
        position: Vec3,
        max_scale: f32,
        spheres: &[BoundingSphere],
    ) {
        if spheres.is_empty() {
            self.add_object(item, 0.0, position);
            return;
        }
        self.evict_existing(&item);

        let world_spheres: Vec<(Vec3, f32)> = spheres
            .iter()
            .map(|sphere| (position + sphere.center * max_scale, sphere.radius * max_scale))
            .collect();
        let bounding_radius = world_spheres
            .iter()
            .map(|(center, radius)| (center - position).magnitude() + radius)
            .fold(0.0_f32, f32::max);

        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id];
            if node.current_size <= self.config.minimum_size {
                break;
            }
            let candidate = node.octant(&world_spheres[0].0);
            let all_fit = world_spheres.iter().all(|(center, radius)| {
                self.should_subpartition(node, center, *radius) == Some(candidate)
            });
            if !all_fit {
                break;
            }
            node_id = self.child_or_subdivide(node_id, candidate);
        }

        self.store(
            node_id,
            OctreeEntry {
                item,
                position,
                radius: bounding_radius,
            },
        );
    }

    /// Remove an object
    ///
    /// Walks the octant path implied by `position` first. If the object is not
    /// on that path (the position is stale) the stored back-reference is used
    /// instead. Returns `false` only when the object is not in the tree.
    pub fn remove_object(&mut self, item: &T, position: Vec3) -> bool {
        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id];
            if node.entries.iter().any(|entry| entry.item == *item) {
                return self.detach(item, node_id);
            }
            match node.children {
                Some(children) => node_id = children[node.octant(&position)],
                None => break,
            }
        }

        match self.locations.get(item).copied() {
            Some(node_id) => {
                log::debug!("Octree: {item:?} not on path of {position:?}, removing via back-reference");
                self.detach(item, node_id)
            }
            None => false,
        }
    }

    /// Re-index a point or sphere object after it moved
    ///
    /// Returns whether the old entry was found. The object is inserted at the new
    /// position either way and never ends up stored twice.
    pub fn move_object(&mut self, item: T, old_position: Vec3, new_position: Vec3, radius: f32) -> bool {
        let removed = self.remove_object(&item, old_position);
        self.add_object(item, radius, new_position);
        removed
    }

    /// Re-index a multi-sphere object after it moved
    pub fn move_object_spheres(
        &mut self,
        item: T,
        old_position: Vec3,
        new_position: Vec3,
        max_scale: f32,
        spheres: &[BoundingSphere],
    ) -> bool {
        let removed = self.remove_object(&item, old_position);
        self.add_object_spheres(item, new_position, max_scale, spheres);
        removed
    }

    /// Every stored object at and below the root
    pub fn get_all_objects(&self) -> Vec<T> {
        self.get_all_objects_where(|_| true)
    }

    /// Every stored object accepted by `predicate`
    pub fn get_all_objects_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut results = Vec::with_capacity(self.locations.len());
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            results.extend(
                node.entries
                    .iter()
                    .filter(|entry| predicate(&entry.item))
                    .map(|entry| entry.item.clone()),
            );
            if let Some(children) = node.children {
                stack.extend(children.iter().rev());
            }
        }
        results
    }

    /// Objects stored on the root-to-leaf path of `point`
    ///
    /// These are the only objects whose inserted bounds can cover the point.
    pub fn get_objects_near(&self, point: Vec3) -> Vec<T> {
        let mut results = Vec::new();
        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id];
            results.extend(node.entries.iter().map(|entry| entry.item.clone()));
            match node.children {
                Some(children) => node_id = children[node.octant(&point)],
                None => break,
            }
        }
        results
    }

    /// Entries whose stored sphere overlaps the query sphere
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<OctreeEntry<T>> {
        let mut results = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            for entry in &node.entries {
                let combined = radius + entry.radius.max(0.0);
                if (entry.position - center).magnitude_squared() <= combined * combined {
                    results.push(entry.clone());
                }
            }
            if let Some(children) = node.children {
                for (octant, child) in children.iter().enumerate() {
                    if node.sphere_reaches_octant(&center, radius, octant) {
                        stack.push(*child);
                    }
                }
            }
        }
        results
    }

    /// Drop every node and object, leaving an empty childless root
    pub fn clear(&mut self) {
        log::debug!(
            "Octree: clearing {} objects across {} nodes",
            self.locations.len(),
            self.nodes.len()
        );
        self.nodes.clear();
        self.locations.clear();
        self.root = self
            .nodes
            .insert(OctreeNode::new(Vec3::zeros(), self.config.current_size, None));
    }

    /// Octant the sphere fits in, or `None` if it straddles a boundary
    fn should_subpartition(&self, node: &OctreeNode<T>, position: &Vec3, radius: f32) -> Option<usize> {
        let octant = node.octant(position);
        let reach = radius + self.config.precision;
        for axis in 0..3 {
            for sign in [-1.0_f32, 1.0] {
                let mut probe = *position;
                probe[axis] += sign * reach;
                if node.octant(&probe) != octant {
                    return None;
                }
            }
        }
        Some(octant)
    }

    fn child_or_subdivide(&mut self, node_id: NodeId, octant: usize) -> NodeId {
        if let Some(children) = self.nodes[node_id].children {
            return children[octant];
        }

        let (centers, child_size) = {
            let node = &self.nodes[node_id];
            let centers: [Vec3; 8] = std::array::from_fn(|o| node.child_center(o));
            (centers, node.current_size - 1)
        };
        let children: [NodeId; 8] = std::array::from_fn(|o| {
            self.nodes
                .insert(OctreeNode::new(centers[o], child_size, Some(node_id)))
        });
        log::trace!("Octree: subdivided node at level {}", child_size + 1);
        self.nodes[node_id].children = Some(children);
        children[octant]
    }

    fn store(&mut self, node_id: NodeId, entry: OctreeEntry<T>) {
        self.locations.insert(entry.item.clone(), node_id);
        self.nodes[node_id].entries.push(entry);
    }

    fn detach(&mut self, item: &T, node_id: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return false;
        };
        match node.entries.iter().position(|entry| entry.item == *item) {
            Some(index) => {
                node.entries.swap_remove(index);
                self.locations.remove(item);
                true
            }
            None => false,
        }
    }

    fn evict_existing(&mut self, item: &T) {
        if let Some(node_id) = self.locations.get(item).copied() {
            log::debug!("Octree: {item:?} re-added, replacing previous entry");
            self.detach(item, node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Octree<u32> {
        Octree::new(6, 2, 0.01)
    }

    #[test]
    fn test_octant_numbering() {
        let center = Vec3::zeros();
        assert_eq!(octant_of(&center, &Vec3::new(-1.0, -1.0, -1.0)), 0);
        assert_eq!(octant_of(&center, &Vec3::new(-1.0, -1.0, 1.0)), 1);
        assert_eq!(octant_of(&center, &Vec3::new(-1.0, 1.0, -1.0)), 2);
        assert_eq!(octant_of(&center, &Vec3::new(1.0, -1.0, -1.0)), 4);
        assert_eq!(octant_of(&center, &Vec3::new(0.0, 0.0, 0.0)), 7);
    }

    #[test]
    fn test_corners_follow_octant_code() {
        let octree = tree();
        let root = octree.node(octree.root()).unwrap();
        assert_eq!(root.corner(0), Vec3::new(-64.0, -64.0, -64.0));
        assert_eq!(root.corner(7), Vec3::new(64.0, 64.0, 64.0));
        assert_eq!(root.corner(4), Vec3::new(64.0, -64.0, -64.0));
        assert_eq!(root.corner(1), Vec3::new(-64.0, -64.0, 64.0));
    }

    #[test]
    fn test_point_descends_to_minimum_size() {
        let mut octree = tree();
        octree.add_object(1, -1.0, Vec3::new(10.0, 10.0, 10.0));

        let node = octree.node(octree.node_of(&1).unwrap()).unwrap();
        assert_eq!(node.current_size(), 2);
        assert_eq!(octree.depth(), 4);
        // Each subdivision allocates all eight children at once
        assert_eq!(octree.node_count(), 1 + 8 * 4);
    }

    #[test]
    fn test_straddling_sphere_stays_at_root() {
        let mut octree = tree();
        octree.add_object(1, 2.0, Vec3::new(0.5, 20.0, 20.0));

        assert_eq!(octree.node_of(&1), Some(octree.root()));
        assert!(octree.node(octree.root()).unwrap().is_leaf());
    }

    #[test]
    fn test_sphere_stops_where_it_no_longer_fits() {
        let mut octree = tree();
        // Fits in the +++ root octant (center 32) but straddles x = 32 one level down
        octree.add_object(1, 1.0, Vec3::new(32.5, 10.0, 10.0));

        let node = octree.node(octree.node_of(&1).unwrap()).unwrap();
        assert_eq!(node.current_size(), 5);
        assert_eq!(node.center(), Vec3::new(32.0, 32.0, 32.0));
    }

    #[test]
    fn test_remove_with_stale_position_uses_back_reference() {
        crate::foundation::logging::init_for_tests();
        let mut octree = tree();
        octree.add_object(7, 0.5, Vec3::new(-20.0, -20.0, -20.0));

        assert!(octree.remove_object(&7, Vec3::new(20.0, 20.0, 20.0)));
        assert!(octree.get_all_objects().is_empty());
        assert!(!octree.remove_object(&7, Vec3::new(-20.0, -20.0, -20.0)));
    }

    #[test]
    fn test_move_never_duplicates() {
        let mut octree = tree();
        octree.add_object(3, 0.5, Vec3::new(-20.0, 5.0, 5.0));

        // Caller lost track of the real position
        let found = octree.move_object(3, Vec3::new(40.0, 40.0, 40.0), Vec3::new(20.0, 5.0, 5.0), 0.5);
        assert!(found);
        assert_eq!(octree.get_all_objects(), vec![3]);

        octree.add_object(3, 0.5, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(octree.object_count(), 1);
    }

    #[test]
    fn test_multi_sphere_object_is_one_leaf() {
        let mut octree = tree();
        let spheres = [
            BoundingSphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0),
            BoundingSphere::new(Vec3::new(-25.0, 0.0, 0.0), 1.0),
        ];
        octree.add_object_spheres(9, Vec3::new(20.0, 20.0, 20.0), 1.0, &spheres);

        // The second sphere lands on the other side of x = 0
        assert_eq!(octree.node_of(&9), Some(octree.root()));

        let compact = [
            BoundingSphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0),
            BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0),
        ];
        octree.add_object_spheres(10, Vec3::new(20.0, 20.0, 20.0), 1.0, &compact);
        let node = octree.node(octree.node_of(&10).unwrap()).unwrap();
        assert!(node.current_size() < 6);
        assert_eq!(octree.object_count(), 2);
    }

    #[test]
    fn test_multi_sphere_scale_blocks_subdivision() {
        let mut octree = tree();
        let spheres = [BoundingSphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0)];

        octree.add_object_spheres(1, Vec3::new(10.0, 10.0, 10.0), 1.0, &spheres);
        octree.add_object_spheres(2, Vec3::new(10.0, 10.0, 10.0), 20.0, &spheres);

        let small = octree.node(octree.node_of(&1).unwrap()).unwrap().current_size();
        let large = octree.node(octree.node_of(&2).unwrap()).unwrap().current_size();
        assert!(small < large);
    }

    #[test]
    fn test_query_radius() {
        let mut octree = tree();
        octree.add_object(1, 1.0, Vec3::new(0.0, 0.0, 0.0));
        octree.add_object(2, 1.0, Vec3::new(5.0, 0.0, 0.0));
        octree.add_object(3, 1.0, Vec3::new(50.0, 0.0, 0.0));

        let mut found: Vec<u32> = octree
            .query_radius(Vec3::new(0.0, 0.0, 0.0), 10.0)
            .into_iter()
            .map(|entry| entry.item)
            .collect();
        found.sort_unstable();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_objects_near_point_follow_path() {
        let mut octree = tree();
        octree.add_object(1, 3.0, Vec3::new(0.0, 0.0, 0.0));
        octree.add_object(2, 0.5, Vec3::new(20.0, 20.0, 20.0));
        octree.add_object(3, 0.5, Vec3::new(-20.0, -20.0, -20.0));

        let mut near = octree.get_objects_near(Vec3::new(21.0, 21.0, 21.0));
        near.sort_unstable();
        assert_eq!(near, vec![1, 2]);
    }

    #[test]
    fn test_predicate_filter_and_clear() {
        let mut octree = tree();
        for i in 0..10u32 {
            octree.add_object(i, 0.0, Vec3::new(i as f32 * 3.0 - 15.0, 1.0, 1.0));
        }

        let mut even = octree.get_all_objects_where(|item| item % 2 == 0);
        even.sort_unstable();
        assert_eq!(even, vec![0, 2, 4, 6, 8]);

        octree.clear();
        assert!(octree.get_all_objects().is_empty());
        assert_eq!(octree.node_count(), 1);
        assert!(octree.node(octree.root()).unwrap().is_leaf());
    }

    #[test]
    fn test_config_validation() {
        let bad = OctreeConfig {
            current_size: 2,
            minimum_size: 4,
            precision: 0.01,
        };
        assert!(bad.validate().is_err());
        assert!(OctreeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let parsed = OctreeConfig::from_str_with_format(
            "current_size = 8\nminimum_size = 1\nprecision = 0.5\n",
            "octree.toml",
        )
        .unwrap();
        assert_eq!(parsed.current_size, 8);
        assert_eq!(parsed.minimum_size, 1);
        assert!((parsed.precision - 0.5).abs() < f32::EPSILON);
    }
}
