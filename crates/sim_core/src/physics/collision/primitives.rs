//! Collision primitives and their world-space forms
//!
//! Primitives store their geometry in the owning body's local space and are
//! carried into world space on demand, every time they are tested. Nothing here
//! caches world coordinates.

use crate::foundation::math::{Transform, Vec3};
use crate::physics::error::CollisionError;
use crate::scene::{Bodies, BodyId};
use std::fmt;
use std::sync::Arc;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized on construction)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// A zero-length direction is kept as zero; such a ray never hits anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros),
        }
    }

    /// Whether the ray has a finite origin and a unit direction
    pub fn is_valid(&self) -> bool {
        let length_sq = self.direction.magnitude_squared();
        self.origin.iter().all(|c| c.is_finite()) && length_sq.is_finite() && length_sq > f32::EPSILON
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// Unit surface normal at the intersection point
    ///
    /// Planar hits report the side facing the ray origin. Sphere hits report
    /// the outward normal, which faces away from a ray that starts inside.
    pub normal: Vec3,
    /// In-plane span coordinates of the hit for planar primitives
    pub params: Option<(f32, f32)>,
}

/// A bounding sphere, used to describe multi-sphere octree extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Contact reported by a resolver
///
/// `normal` is the exit direction of the first primitive passed to the
/// resolver: moving the first body along it separates the pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Contact point in world space
    pub position: Vec3,
    /// Unit contact normal
    pub normal: Vec3,
}

impl Contact {
    /// Same contact seen from the other primitive
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            position: self.position,
            normal: -self.normal,
        }
    }
}

type PlanePredicate = Arc<dyn Fn(f32, f32) -> bool + Send + Sync>;
type EdgePredicate = Arc<dyn Fn(f32, f32) -> bool + Send + Sync>;

/// Carves a finite region out of a plane from its span coordinates `(s1, s2)`
#[derive(Clone, Default)]
pub enum PlaneRestriction {
    /// Accept everything
    #[default]
    Unbounded,
    /// Accept `min.0 <= s1 <= max.0` and `min.1 <= s2 <= max.1`
    Rectangle {
        /// Lower bounds for `(s1, s2)`
        min: (f32, f32),
        /// Upper bounds for `(s1, s2)`
        max: (f32, f32),
    },
    /// Accept `s1² + s2² <= radius²`
    Disk {
        /// Radius in span units
        radius: f32,
    },
    /// Arbitrary pure predicate
    Custom(PlanePredicate),
}

impl PlaneRestriction {
    /// The parallelogram spanned by the two span vectors
    pub fn unit_square() -> Self {
        Self::Rectangle {
            min: (0.0, 0.0),
            max: (1.0, 1.0),
        }
    }

    /// Wrap a closure; it must be side-effect free
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(f32, f32) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Evaluate the restriction on span coordinates
    pub fn accepts(&self, s1: f32, s2: f32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Rectangle { min, max } => {
                (min.0..=max.0).contains(&s1) && (min.1..=max.1).contains(&s2)
            }
            Self::Disk { radius } => s1 * s1 + s2 * s2 <= radius * radius,
            Self::Custom(predicate) => predicate(s1, s2),
        }
    }

    /// Span coordinates of a region that encloses everything accepted, if finite
    fn span_corners(&self) -> Option<Vec<(f32, f32)>> {
        match self {
            Self::Rectangle { min, max } => Some(vec![
                (min.0, min.1),
                (max.0, min.1),
                (min.0, max.1),
                (max.0, max.1),
            ]),
            Self::Disk { radius } => Some(vec![
                (-radius, -radius),
                (*radius, -radius),
                (-radius, *radius),
                (*radius, *radius),
            ]),
            Self::Unbounded | Self::Custom(_) => None,
        }
    }
}

impl fmt::Debug for PlaneRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("Unbounded"),
            Self::Rectangle { min, max } => f
                .debug_struct("Rectangle")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Disk { radius } => f.debug_struct("Disk").field("radius", radius).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Carves a finite piece out of a line from `(scale, distance)`
///
/// `scale` is the projection parameter along the span vector, `distance` the
/// perpendicular distance of the tested point from the line.
#[derive(Clone, Default)]
pub enum EdgeRestriction {
    /// Accept everything
    #[default]
    Unbounded,
    /// Accept `min <= scale <= max`
    Range {
        /// Lower bound on the projection parameter
        min: f32,
        /// Upper bound on the projection parameter
        max: f32,
    },
    /// Arbitrary pure predicate over `(scale, distance)`
    Custom(EdgePredicate),
}

impl EdgeRestriction {
    /// The segment from the origin to `origin + span`
    pub fn segment() -> Self {
        Self::Range { min: 0.0, max: 1.0 }
    }

    /// Wrap a closure; it must be side-effect free
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(f32, f32) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Wrap a closure that only looks at the projection parameter
    pub fn custom_scale<F>(predicate: F) -> Self
    where
        F: Fn(f32) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(move |scale, _| predicate(scale)))
    }

    /// Evaluate the restriction
    pub fn accepts(&self, scale: f32, distance: f32) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Range { min, max } => (*min..=*max).contains(&scale),
            Self::Custom(predicate) => predicate(scale, distance),
        }
    }
}

impl fmt::Debug for EdgeRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("Unbounded"),
            Self::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Sphere centered on its owning body
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Owning body
    pub body: BodyId,
    /// Radius before the body's scale is applied
    pub radius: f32,
}

/// Infinite plane through `origin` spanned by two vectors, all in body space
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Owning body
    pub body: BodyId,
    /// Point on the plane
    pub origin: Vec3,
    /// First span vector
    pub span1: Vec3,
    /// Second span vector
    pub span2: Vec3,
}

/// Plane limited by a restriction on its span coordinates
#[derive(Debug, Clone)]
pub struct BoundedPlane {
    /// Underlying infinite plane
    pub plane: Plane,
    /// Accepted region
    pub restriction: PlaneRestriction,
}

/// Infinite line through `origin` along `span`, in body space
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Owning body
    pub body: BodyId,
    /// Point on the line
    pub origin: Vec3,
    /// Direction and unit length of the line parameter
    pub span: Vec3,
}

/// Line limited by a restriction on `(scale, distance)`
#[derive(Debug, Clone)]
pub struct BoundedEdge {
    /// Underlying infinite line
    pub edge: Edge,
    /// Accepted region
    pub restriction: EdgeRestriction,
}

/// Planar annulus around the plane origin
#[derive(Debug, Clone)]
pub struct Ring {
    /// Plane the ring lies in; its origin is the ring center
    pub plane: Plane,
    /// Outer radius before scaling
    pub radius: f32,
    /// Inner radius before scaling
    pub inner_radius: f32,
    /// Extra restriction on the span coordinates
    pub restriction: PlaneRestriction,
}

/// Ordered group of primitives sharing one body
#[derive(Debug, Clone)]
pub struct Composite {
    /// Owning body
    pub body: BodyId,
    /// Members, tested in order
    pub members: Vec<Primitive>,
}

/// Discriminant of a [`Primitive`], used for dispatch diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// [`Sphere`]
    Sphere,
    /// [`Plane`]
    Plane,
    /// [`BoundedPlane`]
    BoundedPlane,
    /// [`Edge`]
    Edge,
    /// [`BoundedEdge`]
    BoundedEdge,
    /// [`Ring`]
    Ring,
    /// [`Composite`]
    Composite,
}

/// Collidable shape attached to a body
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Sphere
    Sphere(Sphere),
    /// Infinite plane
    Plane(Plane),
    /// Restricted plane
    BoundedPlane(BoundedPlane),
    /// Infinite line
    Edge(Edge),
    /// Restricted line
    BoundedEdge(BoundedEdge),
    /// Planar annulus
    Ring(Ring),
    /// Group of primitives
    Composite(Composite),
}

impl Primitive {
    /// Sphere of `radius` centered on `body`
    pub fn sphere(body: BodyId, radius: f32) -> Self {
        Self::Sphere(Sphere { body, radius })
    }

    /// Infinite plane
    pub fn plane(body: BodyId, origin: Vec3, span1: Vec3, span2: Vec3) -> Self {
        Self::Plane(Plane {
            body,
            origin,
            span1,
            span2,
        })
    }

    /// Plane limited to the region accepted by `restriction`
    pub fn bounded_plane(
        body: BodyId,
        origin: Vec3,
        span1: Vec3,
        span2: Vec3,
        restriction: PlaneRestriction,
    ) -> Self {
        Self::BoundedPlane(BoundedPlane {
            plane: Plane {
                body,
                origin,
                span1,
                span2,
            },
            restriction,
        })
    }

    /// Infinite line
    pub fn edge(body: BodyId, origin: Vec3, span: Vec3) -> Self {
        Self::Edge(Edge { body, origin, span })
    }

    /// Line limited by `restriction`
    pub fn bounded_edge(body: BodyId, origin: Vec3, span: Vec3, restriction: EdgeRestriction) -> Self {
        Self::BoundedEdge(BoundedEdge {
            edge: Edge { body, origin, span },
            restriction,
        })
    }

    /// Annulus centered on `origin` in the plane of the two spans
    pub fn ring(
        body: BodyId,
        origin: Vec3,
        span1: Vec3,
        span2: Vec3,
        radius: f32,
        inner_radius: f32,
    ) -> Self {
        Self::Ring(Ring {
            plane: Plane {
                body,
                origin,
                span1,
                span2,
            },
            radius,
            inner_radius,
            restriction: PlaneRestriction::Unbounded,
        })
    }

    /// Group of primitives owned by `body`
    ///
    /// Members keep their own bodies, which need not be `body`. Every member is
    /// resolved against its own body, and the composite's bounding radius is
    /// measured from `body` out to the farthest member.
    pub fn composite(body: BodyId, members: Vec<Self>) -> Self {
        Self::Composite(Composite { body, members })
    }

    /// Variant discriminant
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Sphere(_) => PrimitiveKind::Sphere,
            Self::Plane(_) => PrimitiveKind::Plane,
            Self::BoundedPlane(_) => PrimitiveKind::BoundedPlane,
            Self::Edge(_) => PrimitiveKind::Edge,
            Self::BoundedEdge(_) => PrimitiveKind::BoundedEdge,
            Self::Ring(_) => PrimitiveKind::Ring,
            Self::Composite(_) => PrimitiveKind::Composite,
        }
    }

    /// Owning body
    pub fn body(&self) -> BodyId {
        match self {
            Self::Sphere(sphere) => sphere.body,
            Self::Plane(plane) => plane.body,
            Self::BoundedPlane(bounded) => bounded.plane.body,
            Self::Edge(edge) => edge.body,
            Self::BoundedEdge(bounded) => bounded.edge.body,
            Self::Ring(ring) => ring.plane.body,
            Self::Composite(composite) => composite.body,
        }
    }

    /// Unscaled radius used for exit correction; zero for shapes without one
    pub fn exit_radius(&self) -> f32 {
        match self {
            Self::Sphere(sphere) => sphere.radius,
            Self::Composite(composite) => composite
                .members
                .iter()
                .map(Self::exit_radius)
                .fold(0.0, f32::max),
            _ => 0.0,
        }
    }

    /// Radius of a sphere around the owning body's world position that encloses
    /// the primitive; infinite for unbounded planes and lines
    pub fn bounding_radius(&self, bodies: &Bodies) -> Result<f32, CollisionError> {
        let transform = world_transform(bodies, self.body())?;
        let Self::Composite(composite) = self else {
            return Ok(self.bounding_radius_in(&transform));
        };

        // Members may hang off other bodies, so measure each from its own body
        let mut radius = 0.0_f32;
        for member in &composite.members {
            let member_position = world_transform(bodies, member.body())?.position;
            let reach = (member_position - transform.position).magnitude() + member.bounding_radius(bodies)?;
            radius = radius.max(reach);
        }
        Ok(radius)
    }

    fn bounding_radius_in(&self, transform: &Transform) -> f32 {
        match self {
            Self::Sphere(sphere) => sphere.radius * transform.max_scale(),
            Self::Plane(_) | Self::Edge(_) => f32::INFINITY,
            Self::BoundedPlane(bounded) => {
                let Some(corners) = bounded.restriction.span_corners() else {
                    return f32::INFINITY;
                };
                let plane = bounded.plane.world_in(transform);
                corners
                    .into_iter()
                    .map(|(s1, s2)| {
                        (plane.origin + plane.span1 * s1 + plane.span2 * s2 - transform.position)
                            .magnitude()
                    })
                    .fold(0.0, f32::max)
            }
            Self::BoundedEdge(bounded) => match bounded.restriction {
                EdgeRestriction::Range { min, max } => {
                    let edge = bounded.edge.world_in(transform);
                    [min, max]
                        .into_iter()
                        .map(|s| (edge.origin + edge.span * s - transform.position).magnitude())
                        .fold(0.0, f32::max)
                }
                _ => f32::INFINITY,
            },
            Self::Ring(ring) => {
                let origin = transform.transform_point(&ring.plane.origin);
                (origin - transform.position).magnitude() + ring.radius * transform.max_scale()
            }
            // Measured per member body in `bounding_radius`
            Self::Composite(_) => f32::INFINITY,
        }
    }
}

/// Sphere resolved into world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSphere {
    /// World center
    pub center: Vec3,
    /// Scaled radius
    pub radius: f32,
}

/// Plane resolved into world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPlane {
    /// World point on the plane
    pub origin: Vec3,
    /// World first span
    pub span1: Vec3,
    /// World second span
    pub span2: Vec3,
    /// `normalize(span1 × span2)`, or `None` for parallel spans
    pub normal: Option<Vec3>,
    /// Uniform scale of the owning body
    pub scale: f32,
}

/// Line resolved into world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldEdge {
    /// World point on the line
    pub origin: Vec3,
    /// World span
    pub span: Vec3,
}

pub(crate) fn world_transform(bodies: &Bodies, body: BodyId) -> Result<Transform, CollisionError> {
    bodies
        .world_transform(body)
        .ok_or(CollisionError::UnknownBody(body))
}

impl Sphere {
    /// Resolve against the current body transform
    pub fn to_world(&self, bodies: &Bodies) -> Result<WorldSphere, CollisionError> {
        let transform = world_transform(bodies, self.body)?;
        Ok(WorldSphere {
            center: transform.position,
            radius: self.radius * transform.max_scale(),
        })
    }
}

impl Plane {
    /// Resolve against the current body transform
    pub fn to_world(&self, bodies: &Bodies) -> Result<WorldPlane, CollisionError> {
        Ok(self.world_in(&world_transform(bodies, self.body)?))
    }

    fn world_in(&self, transform: &Transform) -> WorldPlane {
        let basis = transform.rotation_scale_matrix();
        let span1 = basis * self.span1;
        let span2 = basis * self.span2;
        WorldPlane {
            origin: transform.transform_point(&self.origin),
            span1,
            span2,
            normal: span1.cross(&span2).try_normalize(f32::EPSILON),
            scale: transform.max_scale(),
        }
    }
}

impl Edge {
    /// Resolve against the current body transform
    pub fn to_world(&self, bodies: &Bodies) -> Result<WorldEdge, CollisionError> {
        Ok(self.world_in(&world_transform(bodies, self.body)?))
    }

    fn world_in(&self, transform: &Transform) -> WorldEdge {
        WorldEdge {
            origin: transform.transform_point(&self.origin),
            span: transform.transform_vector(&self.span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_world_space_follows_body() {
        let mut bodies = Bodies::new();
        let body = bodies.insert(
            Transform::from_position_rotation(
                Vec3::new(0.0, 5.0, 0.0),
                Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2),
            )
            .with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        let plane = Plane {
            body,
            origin: Vec3::new(1.0, 0.0, 0.0),
            span1: Vec3::new(1.0, 0.0, 0.0),
            span2: Vec3::new(0.0, 1.0, 0.0),
        };

        let world = plane.to_world(&bodies).unwrap();
        assert_relative_eq!(world.origin, Vec3::new(2.0, 5.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.span2, Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
        // Local +Z rotated a quarter turn about X ends up on -Y
        assert_relative_eq!(world.normal.unwrap(), Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);

        bodies.get_mut(body).unwrap().transform.position = Vec3::zeros();
        assert_relative_eq!(plane.to_world(&bodies).unwrap().origin, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_restrictions() {
        let square = PlaneRestriction::unit_square();
        assert!(square.accepts(0.5, 1.0));
        assert!(!square.accepts(1.5, 0.5));

        let disk = PlaneRestriction::Disk { radius: 2.0 };
        assert!(disk.accepts(1.0, 1.0));
        assert!(!disk.accepts(2.0, 1.0));

        let custom = PlaneRestriction::custom(|s1, s2| s1 > s2);
        assert!(custom.accepts(2.0, 1.0));
        assert!(!custom.accepts(1.0, 2.0));

        let segment = EdgeRestriction::segment();
        assert!(segment.accepts(0.0, 100.0));
        assert!(!segment.accepts(-0.1, 0.0));

        let near = EdgeRestriction::custom(|_, distance| distance < 0.5);
        assert!(near.accepts(7.0, 0.25));
        let positive = EdgeRestriction::custom_scale(|scale| scale > 0.0);
        assert!(!positive.accepts(-1.0, 0.0));
    }

    #[test]
    fn test_bounding_radius() {
        let mut bodies = Bodies::new();
        let body = bodies.insert(Transform::from_position(Vec3::new(3.0, 0.0, 0.0)).with_scale(Vec3::new(1.0, 2.0, 1.0)));

        assert_relative_eq!(Primitive::sphere(body, 1.5).bounding_radius(&bodies).unwrap(), 3.0);
        assert!(Primitive::plane(body, Vec3::zeros(), Vec3::x(), Vec3::z())
            .bounding_radius(&bodies)
            .unwrap()
            .is_infinite());

        let quad = Primitive::bounded_plane(
            body,
            Vec3::zeros(),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
            PlaneRestriction::unit_square(),
        );
        assert_relative_eq!(quad.bounding_radius(&bodies).unwrap(), 5.0, epsilon = 1e-5);

        let composite = Primitive::composite(body, vec![Primitive::sphere(body, 1.0), quad]);
        assert_relative_eq!(composite.bounding_radius(&bodies).unwrap(), 5.0, epsilon = 1e-5);
        assert_relative_eq!(composite.exit_radius(), 1.0);
    }

    #[test]
    fn test_composite_radius_reaches_members_on_other_bodies() {
        let mut bodies = Bodies::new();
        let hub = bodies.insert(Transform::identity());
        let satellite = bodies.insert(Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));

        let composite = Primitive::composite(
            hub,
            vec![Primitive::sphere(hub, 1.0), Primitive::sphere(satellite, 2.0)],
        );
        assert_relative_eq!(composite.bounding_radius(&bodies).unwrap(), 12.0, epsilon = 1e-5);

        bodies.remove(satellite);
        assert_eq!(composite.bounding_radius(&bodies), Err(CollisionError::UnknownBody(satellite)));
    }

    #[test]
    fn test_zero_direction_ray_is_invalid() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::zeros());
        assert!(!ray.is_valid());
        assert_eq!(ray.direction, Vec3::zeros());
        assert!(Ray::new(Vec3::zeros(), Vec3::new(0.0, 3.0, 0.0)).is_valid());
    }

    #[test]
    fn test_unknown_body_is_an_error() {
        let mut bodies = Bodies::new();
        let body = bodies.insert(Transform::identity());
        bodies.remove(body);

        let sphere = Sphere { body, radius: 1.0 };
        assert_eq!(sphere.to_world(&bodies), Err(CollisionError::UnknownBody(body)));
    }
}
