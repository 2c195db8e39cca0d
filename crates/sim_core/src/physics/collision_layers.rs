//! Collision layer filtering
//!
//! Each collider sits on one or more layers and carries a mask of the layers it
//! wants to hit. A pair is tested only when each side's layer is in the other
//! side's mask.

use bitflags::bitflags;

bitflags! {
    /// Layer membership and collision masks
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Ordinary moving bodies
        const DYNAMIC = 1 << 0;
        /// Static level geometry (walls, floors, seams)
        const STATIC = 1 << 1;
        /// Fast-moving projectiles
        const PROJECTILE = 1 << 2;
        /// Zones that report contact but are never pushed
        const TRIGGER = 1 << 3;
        /// Bodies controlled by a player
        const PLAYER = 1 << 4;
    }
}

impl CollisionLayers {
    /// Every layer, including ones not named above
    pub const ALL: Self = Self::from_bits_retain(u32::MAX);

    /// Whether two colliders should be tested against each other
    ///
    /// ```
    /// use sim_core::physics::CollisionLayers;
    ///
    /// let ball = CollisionLayers::DYNAMIC;
    /// let ball_mask = CollisionLayers::STATIC | CollisionLayers::DYNAMIC;
    /// let wall = CollisionLayers::STATIC;
    /// let wall_mask = CollisionLayers::DYNAMIC;
    ///
    /// assert!(CollisionLayers::should_collide(ball, ball_mask, wall, wall_mask));
    /// ```
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::DYNAMIC
    }
}
