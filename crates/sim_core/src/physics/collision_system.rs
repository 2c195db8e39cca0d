//! Per-scene collision world
//!
//! Ties the octree broad phase to the narrow-phase dispatcher: bodies are
//! re-indexed when they move, candidate pairs come from octree sphere queries,
//! pairs are filtered by layer and then handed to the dispatcher. The owning
//! scene drives it once per simulation step from a single thread.

use super::collision::{cast_ray_with, does_collide_with, handle_collision, Contact, Primitive, Ray, RayHit};
use super::collision_layers::CollisionLayers;
use super::error::CollisionError;
use super::settings::{CollisionConfig, WorldConfig};
use crate::foundation::math::Vec3;
use crate::scene::{Bodies, BodyId};
use crate::spatial::Octree;
use std::collections::{BTreeMap, HashSet};

/// Unordered pair of bodies, stored with the smaller id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller body id
    pub body_a: BodyId,
    /// Larger body id
    pub body_b: BodyId,
}

impl CollisionPair {
    /// Create a new collision pair (always stores the smaller id first)
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        if body_a <= body_b {
            Self { body_a, body_b }
        } else {
            Self {
                body_a: body_b,
                body_b: body_a,
            }
        }
    }
}

/// Confirmed contact between two registered colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Body whose primitive was tested first; the normal is its exit direction
    pub collider: BodyId,
    /// Body it ran into
    pub collidable: BodyId,
    /// Contact seen from `collider`
    pub contact: Contact,
}

#[derive(Debug, Clone)]
struct ColliderData {
    primitive: Primitive,
    layer: CollisionLayers,
    mask: CollisionLayers,
    indexed_position: Vec3,
    bounding_radius: f32,
}

impl ColliderData {
    fn is_trigger(&self) -> bool {
        self.layer.contains(CollisionLayers::TRIGGER)
    }
}

/// Broad phase plus narrow phase for one scene
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    octree: Octree<BodyId>,
    colliders: BTreeMap<BodyId, ColliderData>,
    config: CollisionConfig,
    current_pairs: HashSet<CollisionPair>,
    previous_pairs: HashSet<CollisionPair>,
}

impl CollisionWorld {
    /// Create an empty world
    pub fn new(config: WorldConfig) -> Self {
        Self {
            octree: Octree::with_config(config.octree),
            colliders: BTreeMap::new(),
            config: config.collision,
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
        }
    }

    /// Register the primitive's owning body as a collider
    ///
    /// Registering the same body again replaces its primitive and layers.
    pub fn register_collider(
        &mut self,
        primitive: Primitive,
        layer: CollisionLayers,
        mask: CollisionLayers,
        bodies: &Bodies,
    ) -> Result<BodyId, CollisionError> {
        let body = primitive.body();
        let position = bodies
            .world_position(body)
            .ok_or(CollisionError::UnknownBody(body))?;
        let bounding_radius = primitive.bounding_radius(bodies)?;

        self.octree.add_object(body, bounding_radius, position);
        self.colliders.insert(
            body,
            ColliderData {
                primitive,
                layer,
                mask,
                indexed_position: position,
                bounding_radius,
            },
        );
        log::debug!("Registered collider for {body:?} (radius {bounding_radius})");
        Ok(body)
    }

    /// Forget a collider; returns whether it was registered
    pub fn unregister_collider(&mut self, body: BodyId) -> bool {
        match self.colliders.remove(&body) {
            Some(data) => {
                self.octree.remove_object(&body, data.indexed_position);
                true
            }
            None => false,
        }
    }

    /// Re-index one body from its current world position
    ///
    /// Returns `false` if the body has no collider.
    pub fn sync_body(&mut self, body: BodyId, bodies: &Bodies) -> Result<bool, CollisionError> {
        let Some(data) = self.colliders.get_mut(&body) else {
            return Ok(false);
        };
        let position = bodies
            .world_position(body)
            .ok_or(CollisionError::UnknownBody(body))?;
        let radius = data.primitive.bounding_radius(bodies)?;

        self.octree
            .move_object(body, data.indexed_position, position, radius);
        data.indexed_position = position;
        data.bounding_radius = radius;
        Ok(true)
    }

    /// Re-index every registered body
    pub fn sync_all(&mut self, bodies: &Bodies) -> Result<(), CollisionError> {
        let ids: Vec<BodyId> = self.colliders.keys().copied().collect();
        for body in ids {
            self.sync_body(body, bodies)?;
        }
        Ok(())
    }

    /// Find all colliding pairs for this step
    ///
    /// Pairs where neither side has a sphere to test with are skipped, as are
    /// pairs rejected by the layer masks. Events come out ordered by body id.
    pub fn detect_collisions(&mut self, bodies: &Bodies) -> Result<Vec<CollisionEvent>, CollisionError> {
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();

        let mut events = Vec::new();
        for (&body, data) in &self.colliders {
            let mut candidates: Vec<BodyId> = self
                .octree
                .query_radius(data.indexed_position, data.bounding_radius)
                .into_iter()
                .map(|entry| entry.item)
                .filter(|&other| other > body)
                .collect();
            candidates.sort_unstable();
            candidates.dedup();

            for other in candidates {
                let Some(other_data) = self.colliders.get(&other) else {
                    continue;
                };
                if !CollisionLayers::should_collide(data.layer, data.mask, other_data.layer, other_data.mask) {
                    continue;
                }

                // Put the side that can be pushed out first
                let (collider, first, collidable, second) = if data.primitive.exit_radius() > 0.0 {
                    (body, data, other, other_data)
                } else if other_data.primitive.exit_radius() > 0.0 {
                    (other, other_data, body, data)
                } else {
                    continue;
                };

                if let Some(contact) =
                    does_collide_with(&first.primitive, &second.primitive, bodies, &self.config)?
                {
                    self.current_pairs.insert(CollisionPair::new(collider, collidable));
                    events.push(CollisionEvent {
                        collider,
                        collidable,
                        contact,
                    });
                }
            }
        }
        log::trace!("Narrow phase produced {} contacts", events.len());
        Ok(events)
    }

    /// Detect collisions and push every colliding sphere out along its normal
    ///
    /// Pairs involving a trigger are reported but not corrected. Corrected
    /// bodies are re-indexed immediately.
    pub fn resolve_collisions(&mut self, bodies: &mut Bodies) -> Result<Vec<CollisionEvent>, CollisionError> {
        let events = self.detect_collisions(bodies)?;
        for event in &events {
            let moved = match (self.colliders.get(&event.collider), self.colliders.get(&event.collidable)) {
                (Some(collider), Some(collidable)) if !collider.is_trigger() && !collidable.is_trigger() => {
                    handle_collision(&collider.primitive, &event.contact, bodies)?
                }
                _ => false,
            };
            if moved {
                self.sync_body(event.collider, bodies)?;
            }
        }
        Ok(events)
    }

    /// Pairs colliding now that were not colliding last step
    pub fn collisions_entered(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self
            .current_pairs
            .difference(&self.previous_pairs)
            .copied()
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Pairs that were colliding last step and are not any more
    pub fn collisions_exited(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self
            .previous_pairs
            .difference(&self.current_pairs)
            .copied()
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// All pairs colliding in the latest step
    pub fn current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Nearest ray hit across every registered collider
    pub fn cast_ray(&self, ray: &Ray, bodies: &Bodies) -> Result<Option<(BodyId, RayHit)>, CollisionError> {
        let mut nearest: Option<(BodyId, RayHit)> = None;
        for (&body, data) in &self.colliders {
            if let Some(hit) = cast_ray_with(ray, &data.primitive, bodies, &self.config)? {
                if nearest.map_or(true, |(_, best)| hit.distance < best.distance) {
                    nearest = Some((body, hit));
                }
            }
        }
        Ok(nearest)
    }

    /// Spatial index, for inspection
    pub fn octree(&self) -> &Octree<BodyId> {
        &self.octree
    }

    /// Primitive registered for a body
    pub fn collider(&self, body: BodyId) -> Option<&Primitive> {
        self.colliders.get(&body).map(|data| &data.primitive)
    }

    /// Check if a body is registered
    pub fn has_collider(&self, body: BodyId) -> bool {
        self.colliders.contains_key(&body)
    }

    /// Number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Drop every collider, the octree contents and pair history
    pub fn clear(&mut self) {
        self.octree.clear();
        self.colliders.clear();
        self.current_pairs.clear();
        self.previous_pairs.clear();
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
