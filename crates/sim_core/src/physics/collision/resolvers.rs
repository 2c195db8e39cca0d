//! Pairwise narrow-phase resolvers
//!
//! Every resolver takes a sphere first and reports the contact from the
//! sphere's point of view: the normal is the direction that moves the sphere
//! out of the other primitive. Bounded variants run the unbounded test and then
//! gate the result through their restriction.

use super::primitives::{
    Contact, EdgeRestriction, PlaneRestriction, WorldEdge, WorldPlane, WorldSphere,
};
use crate::foundation::math::Vec3;
use crate::physics::settings::CollisionConfig;
use crate::physics::solver::solve_linear_equation_with;

/// Sphere projected onto a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneProjection {
    /// Foot of the perpendicular from the sphere center, with exit normal
    pub contact: Contact,
    /// Whether the sphere reaches the plane
    pub penetrating: bool,
    /// Span coordinates `(s1, s2)` of the contact point, `None` if the spans
    /// could not be solved for
    pub params: Option<(f32, f32)>,
}

/// Sphere projected onto a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeProjection {
    /// Closest point on the line, with exit normal
    pub contact: Contact,
    /// Whether the sphere reaches the line
    pub penetrating: bool,
    /// Projection parameter along the span
    pub scale: f32,
    /// Distance of the sphere center from the line
    pub distance: f32,
}

/// Sphere against sphere
///
/// Collides when the centers are strictly closer than the sum of the radii.
/// Coincident centers yield a non-finite normal.
pub fn sphere_sphere(a: &WorldSphere, b: &WorldSphere) -> Option<Contact> {
    let delta = a.center - b.center;
    let reach = a.radius + b.radius;
    if delta.magnitude_squared() >= reach * reach {
        return None;
    }
    let normal = delta.normalize();
    Some(Contact {
        position: b.center + normal * b.radius,
        normal,
    })
}

/// Project a sphere onto an infinite plane
///
/// Returns `None` when the plane's spans are parallel and it has no normal.
pub fn project_sphere_on_plane(
    sphere: &WorldSphere,
    plane: &WorldPlane,
    config: &CollisionConfig,
) -> Option<PlaneProjection> {
    let Some(normal) = plane.normal else {
        log::debug!("Sphere-plane: degenerate plane spans {:?} {:?}", plane.span1, plane.span2);
        return None;
    };

    // Signed distance from the sphere center to the plane along the normal
    let t = (plane.origin - sphere.center).dot(&normal);
    let position = sphere.center + normal * t;
    let exit = if t > 0.0 { -normal } else { normal };
    let penetrating = (normal * t).magnitude_squared() <= sphere.radius * sphere.radius - config.plane_epsilon;

    let params = solve_linear_equation_with(
        &plane.span1,
        &plane.span2,
        &normal,
        &(position - plane.origin),
        config.solver_epsilon,
    )
    .ok()
    .map(|solved| (solved.x, solved.y));

    Some(PlaneProjection {
        contact: Contact {
            position,
            normal: exit,
        },
        penetrating,
        params,
    })
}

/// Sphere against infinite plane
pub fn sphere_plane(sphere: &WorldSphere, plane: &WorldPlane, config: &CollisionConfig) -> Option<Contact> {
    project_sphere_on_plane(sphere, plane, config)
        .filter(|projection| projection.penetrating)
        .map(|projection| projection.contact)
}

/// Sphere against a plane restricted on its span coordinates
pub fn sphere_bounded_plane(
    sphere: &WorldSphere,
    plane: &WorldPlane,
    restriction: &PlaneRestriction,
    config: &CollisionConfig,
) -> Option<Contact> {
    let projection = project_sphere_on_plane(sphere, plane, config)?;
    let (s1, s2) = projection.params?;
    (projection.penetrating && restriction.accepts(s1, s2)).then_some(projection.contact)
}

/// Sphere against an annulus around the plane origin
///
/// `radius` and `inner_radius` are already scaled into world units.
pub fn sphere_ring(
    sphere: &WorldSphere,
    plane: &WorldPlane,
    radius: f32,
    inner_radius: f32,
    restriction: &PlaneRestriction,
    config: &CollisionConfig,
) -> Option<Contact> {
    let projection = project_sphere_on_plane(sphere, plane, config)?;
    let (s1, s2) = projection.params?;
    let from_center = (projection.contact.position - plane.origin).magnitude();
    let in_band = (inner_radius..=radius).contains(&from_center);
    (projection.penetrating && in_band && restriction.accepts(s1, s2)).then_some(projection.contact)
}

/// Project a sphere onto an infinite line
///
/// Returns `None` for a zero-length span.
pub fn project_sphere_on_edge(sphere: &WorldSphere, edge: &WorldEdge) -> Option<EdgeProjection> {
    let span_sq = edge.span.magnitude_squared();
    if span_sq <= f32::EPSILON {
        log::debug!("Sphere-edge: degenerate edge span {:?}", edge.span);
        return None;
    }

    let scale = edge.span.dot(&(sphere.center - edge.origin)) / span_sq;
    let position = edge.origin + edge.span * scale;
    let offset = sphere.center - position;
    let distance = offset.magnitude();
    let normal = offset
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(|| any_perpendicular(&edge.span));

    Some(EdgeProjection {
        contact: Contact { position, normal },
        penetrating: distance < sphere.radius,
        scale,
        distance,
    })
}

/// Sphere against infinite line
pub fn sphere_edge(sphere: &WorldSphere, edge: &WorldEdge) -> Option<Contact> {
    project_sphere_on_edge(sphere, edge)
        .filter(|projection| projection.penetrating)
        .map(|projection| projection.contact)
}

/// Sphere against a restricted line
pub fn sphere_bounded_edge(
    sphere: &WorldSphere,
    edge: &WorldEdge,
    restriction: &EdgeRestriction,
) -> Option<Contact> {
    project_sphere_on_edge(sphere, edge)
        .filter(|projection| {
            projection.penetrating && restriction.accepts(projection.scale, projection.distance)
        })
        .map(|projection| projection.contact)
}

/// Unit vector perpendicular to `v`, for spheres centered exactly on a line
fn any_perpendicular(v: &Vec3) -> Vec3 {
    let axis = if v.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    v.cross(&axis).normalize()
}
