//! Body arena with an optional parent hierarchy

use crate::foundation::math::{Transform, Vec3};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a body in [`Bodies`]
    pub struct BodyId;
}

/// A body: local transform plus an optional parent it is expressed relative to
#[derive(Debug, Clone, Default)]
pub struct Body {
    /// Transform relative to the parent (or to the world for root bodies)
    pub transform: Transform,
    parent: Option<BodyId>,
}

impl Body {
    /// Parent of this body, if any
    pub fn parent(&self) -> Option<BodyId> {
        self.parent
    }
}

/// Arena of bodies keyed by [`BodyId`]
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    bodies: SlotMap<BodyId, Body>,
}

impl Bodies {
    /// Create an empty body store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root body
    pub fn insert(&mut self, transform: Transform) -> BodyId {
        self.bodies.insert(Body {
            transform,
            parent: None,
        })
    }

    /// Insert a body whose transform is relative to `parent`
    ///
    /// Returns `None` if the parent does not exist.
    pub fn insert_child(&mut self, parent: BodyId, transform: Transform) -> Option<BodyId> {
        if !self.bodies.contains_key(parent) {
            return None;
        }
        Some(self.bodies.insert(Body {
            transform,
            parent: Some(parent),
        }))
    }

    /// Remove a body; its children become root bodies keeping their local transforms
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let removed = self.bodies.remove(id)?;
        for body in self.bodies.values_mut() {
            if body.parent == Some(id) {
                body.parent = None;
            }
        }
        Some(removed)
    }

    /// Re-parent a body. Rejects unknown ids and links that would form a cycle.
    pub fn set_parent(&mut self, id: BodyId, parent: Option<BodyId>) -> bool {
        if !self.bodies.contains_key(id) {
            return false;
        }
        if let Some(parent) = parent {
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current == id {
                    return false;
                }
                cursor = match self.bodies.get(current) {
                    Some(body) => body.parent,
                    None => return false,
                };
            }
        }
        if let Some(body) = self.bodies.get_mut(id) {
            body.parent = parent;
        }
        true
    }

    /// Borrow a body
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Mutably borrow a body
    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    /// Whether the id refers to a live body
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(id)
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True if no bodies are stored
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterate over all body ids
    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys()
    }

    /// Resolve the world transform by composing parents from the root down
    pub fn world_transform(&self, id: BodyId) -> Option<Transform> {
        let body = self.bodies.get(id)?;
        match body.parent {
            Some(parent) => Some(self.world_transform(parent)?.combine(&body.transform)),
            None => Some(body.transform.clone()),
        }
    }

    /// World-space position of a body
    pub fn world_position(&self, id: BodyId) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.position)
    }

    /// Uniform world scale (largest component of the composed scale)
    pub fn world_scale(&self, id: BodyId) -> Option<f32> {
        self.world_transform(id).map(|t| t.max_scale())
    }

    /// Move a body so that its world position becomes `position`
    pub fn set_world_position(&mut self, id: BodyId, position: Vec3) -> bool {
        let parent = match self.bodies.get(id) {
            Some(body) => body.parent,
            None => return false,
        };
        let local = match parent.and_then(|p| self.world_transform(p)) {
            Some(parent_world) => parent_world.inverse_transform_point(&position),
            None => position,
        };
        if let Some(body) = self.bodies.get_mut(id) {
            body.transform.position = local;
        }
        true
    }
}
