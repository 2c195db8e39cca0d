//! Runtime routing from two primitives to the matching resolver
//!
//! The variant set is closed, so dispatch is a single `match` on the pair of
//! variants. Composites fan out over their members in order and stop at the
//! first hit. Pairs with a sphere on the right are answered by the mirrored
//! resolver with the normal negated. Every other pair has no resolver: it is
//! logged and reported as no collision.

use super::primitives::{world_transform, Contact, Primitive, Sphere};
use super::resolvers;
use crate::foundation::math::Vec3;
use crate::physics::error::CollisionError;
use crate::physics::settings::CollisionConfig;
use crate::scene::Bodies;

/// Test two primitives and report the contact, seen from `a`
pub fn does_collide(a: &Primitive, b: &Primitive, bodies: &Bodies) -> Result<Option<Contact>, CollisionError> {
    does_collide_with(a, b, bodies, &CollisionConfig::default())
}

/// [`does_collide`] with explicit tolerances
pub fn does_collide_with(
    a: &Primitive,
    b: &Primitive,
    bodies: &Bodies,
    config: &CollisionConfig,
) -> Result<Option<Contact>, CollisionError> {
    match (a, b) {
        (Primitive::Composite(composite), _) => {
            first_hit(&composite.members, |member| does_collide_with(member, b, bodies, config))
        }
        (_, Primitive::Composite(composite)) => {
            first_hit(&composite.members, |member| does_collide_with(a, member, bodies, config))
        }
        (Primitive::Sphere(sphere), other) => sphere_against(sphere, other, bodies, config),
        (other, Primitive::Sphere(sphere)) => {
            Ok(sphere_against(sphere, other, bodies, config)?.map(Contact::negated))
        }
        _ => {
            log::warn!(
                "No collision resolver for {:?} vs {:?}; reporting no collision",
                a.kind(),
                b.kind()
            );
            Ok(None)
        }
    }
}

/// Boolean form of [`does_collide`]
///
/// Unresolvable pairs report `false`, same as the contact form.
pub fn collides(a: &Primitive, b: &Primitive, bodies: &Bodies) -> Result<bool, CollisionError> {
    Ok(does_collide(a, b, bodies)?.is_some())
}

fn sphere_against(
    sphere: &Sphere,
    other: &Primitive,
    bodies: &Bodies,
    config: &CollisionConfig,
) -> Result<Option<Contact>, CollisionError> {
    let world_sphere = sphere.to_world(bodies)?;
    let contact = match other {
        Primitive::Sphere(other) => resolvers::sphere_sphere(&world_sphere, &other.to_world(bodies)?),
        Primitive::Plane(plane) => {
            resolvers::sphere_plane(&world_sphere, &plane.to_world(bodies)?, config)
        }
        Primitive::BoundedPlane(bounded) => resolvers::sphere_bounded_plane(
            &world_sphere,
            &bounded.plane.to_world(bodies)?,
            &bounded.restriction,
            config,
        ),
        Primitive::Edge(edge) => resolvers::sphere_edge(&world_sphere, &edge.to_world(bodies)?),
        Primitive::BoundedEdge(bounded) => resolvers::sphere_bounded_edge(
            &world_sphere,
            &bounded.edge.to_world(bodies)?,
            &bounded.restriction,
        ),
        Primitive::Ring(ring) => {
            let plane = ring.plane.to_world(bodies)?;
            resolvers::sphere_ring(
                &world_sphere,
                &plane,
                ring.radius * plane.scale,
                ring.inner_radius * plane.scale,
                &ring.restriction,
                config,
            )
        }
        Primitive::Composite(composite) => {
            return first_hit(&composite.members, |member| {
                sphere_against(sphere, member, bodies, config)
            });
        }
    };
    log::trace!("Sphere vs {:?}: {:?}", other.kind(), contact);
    Ok(contact)
}

/// First member (in order) reporting a contact
fn first_hit<F>(members: &[Primitive], mut test: F) -> Result<Option<Contact>, CollisionError>
where
    F: FnMut(&Primitive) -> Result<Option<Contact>, CollisionError>,
{
    if members.is_empty() {
        return Err(CollisionError::EmptyComposite);
    }
    for member in members {
        if let Some(contact) = test(member)? {
            return Ok(Some(contact));
        }
    }
    Ok(None)
}

/// Push the collider's body out along the contact normal
///
/// Moves the body so its world position becomes
/// `contact.position + contact.normal * radius * scale`, where the radius is the
/// collider's sphere radius. Returns `false` without moving anything when the
/// collider has no radius to exit by or the contact is not finite (coincident
/// sphere centers have no defined normal).
pub fn handle_collision(
    collider: &Primitive,
    contact: &Contact,
    bodies: &mut Bodies,
) -> Result<bool, CollisionError> {
    let radius = collider.exit_radius();
    if radius <= 0.0 {
        log::debug!("Exit correction skipped for {:?} collider", collider.kind());
        return Ok(false);
    }
    let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
    if !finite(&contact.position) || !finite(&contact.normal) {
        log::debug!("Exit correction skipped for non-finite contact {contact:?}");
        return Ok(false);
    }
    let body = collider.body();
    let scale = world_transform(bodies, body)?.max_scale();
    let target = contact.position + contact.normal * radius * scale;
    if bodies.set_world_position(body, target) {
        Ok(true)
    } else {
        Err(CollisionError::UnknownBody(body))
    }
}
