//! Ray casting against primitives
//!
//! A miss is `Ok(None)`, including the parallel-ray case where the plane solve
//! is singular and rays with no usable direction. Only programmer errors (unknown body, empty composite) come back
//! as `Err`.

use super::primitives::{Primitive, Ray, RayHit, WorldPlane, WorldSphere};
use crate::physics::error::CollisionError;
use crate::physics::settings::CollisionConfig;
use crate::physics::solver::solve_linear_equation_with;
use crate::scene::Bodies;

/// Nearest intersection of `ray` with `primitive`
pub fn cast_ray(ray: &Ray, primitive: &Primitive, bodies: &Bodies) -> Result<Option<RayHit>, CollisionError> {
    cast_ray_with(ray, primitive, bodies, &CollisionConfig::default())
}

/// [`cast_ray`] with explicit tolerances
pub fn cast_ray_with(
    ray: &Ray,
    primitive: &Primitive,
    bodies: &Bodies,
    config: &CollisionConfig,
) -> Result<Option<RayHit>, CollisionError> {
    if !ray.is_valid() {
        log::debug!("Ray cast with degenerate ray {ray:?}; reporting a miss");
        return Ok(None);
    }
    let hit = match primitive {
        Primitive::Sphere(sphere) => ray_sphere(ray, &sphere.to_world(bodies)?),
        Primitive::Plane(plane) => ray_plane(ray, &plane.to_world(bodies)?, config),
        Primitive::BoundedPlane(bounded) => {
            ray_plane(ray, &bounded.plane.to_world(bodies)?, config).filter(|hit| {
                hit.params
                    .is_some_and(|(u, v)| bounded.restriction.accepts(u, v))
            })
        }
        Primitive::Ring(ring) => {
            let plane = ring.plane.to_world(bodies)?;
            let (inner, outer) = (ring.inner_radius * plane.scale, ring.radius * plane.scale);
            ray_plane(ray, &plane, config).filter(|hit| {
                let from_center = (hit.point - plane.origin).magnitude();
                (inner..=outer).contains(&from_center)
                    && hit.params.is_some_and(|(u, v)| ring.restriction.accepts(u, v))
            })
        }
        Primitive::Composite(composite) => {
            if composite.members.is_empty() {
                return Err(CollisionError::EmptyComposite);
            }
            let mut nearest: Option<RayHit> = None;
            for member in &composite.members {
                if let Some(hit) = cast_ray_with(ray, member, bodies, config)? {
                    if nearest.map_or(true, |best| hit.distance < best.distance) {
                        nearest = Some(hit);
                    }
                }
            }
            nearest
        }
        Primitive::Edge(_) | Primitive::BoundedEdge(_) => {
            log::warn!("No ray resolver for {:?}; reporting a miss", primitive.kind());
            None
        }
    };
    Ok(hit)
}

/// Ray against sphere by projecting the center onto the ray
///
/// Misses when the sphere center is behind the origin or the closest approach
/// is farther than the radius. A ray starting inside the sphere hits the far
/// side.
pub fn ray_sphere(ray: &Ray, sphere: &WorldSphere) -> Option<RayHit> {
    let to_center = sphere.center - ray.origin;
    let along = to_center.dot(&ray.direction);
    if along < 0.0 {
        return None;
    }

    let closest_sq = to_center.magnitude_squared() - along * along;
    let radius_sq = sphere.radius * sphere.radius;
    if closest_sq > radius_sq {
        return None;
    }

    let half_chord = (radius_sq - closest_sq).max(0.0).sqrt();
    let near = along - half_chord;
    let distance = if near >= 0.0 { near } else { along + half_chord };
    if !distance.is_finite() {
        return None;
    }

    let point = ray.point_at(distance);
    Some(RayHit {
        distance,
        point,
        normal: (point - sphere.center).normalize(),
        params: None,
    })
}

/// Ray against infinite plane
///
/// Solves `origin + t·dir = plane.origin + u·span1 + v·span2` for `(t, u, v)`.
/// Parallel rays and hits behind the origin are misses.
pub fn ray_plane(ray: &Ray, plane: &WorldPlane, config: &CollisionConfig) -> Option<RayHit> {
    let solved = solve_linear_equation_with(
        &ray.direction,
        &(-plane.span1),
        &(-plane.span2),
        &(plane.origin - ray.origin),
        config.solver_epsilon,
    )
    .ok()?;

    let distance = solved.x;
    if !distance.is_finite() || distance < 0.0 {
        return None;
    }
    let normal = plane.normal?;
    let facing = if normal.dot(&ray.direction) > 0.0 { -normal } else { normal };

    Some(RayHit {
        distance,
        point: ray.point_at(distance),
        normal: facing,
        params: Some((solved.y, solved.z)),
    })
}
