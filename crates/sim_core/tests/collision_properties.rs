//! Narrow-phase, ray and solver behaviour through the public API

use approx::assert_relative_eq;
use sim_core::physics::{solve_linear_equation, solve_linear_equation4, SolverError};
use sim_core::prelude::*;

fn sphere_at(bodies: &mut Bodies, position: Vec3, radius: f32) -> Primitive {
    let body = bodies.insert(Transform::from_position(position));
    Primitive::sphere(body, radius)
}

#[test]
fn test_sphere_pair_is_symmetric_under_role_swap() {
    let cases = [
        (Vec3::new(0.0, 0.0, 0.0), 1.0, Vec3::new(1.2, 0.3, -0.4), 0.8),
        (Vec3::new(-3.0, 2.0, 1.0), 2.5, Vec3::new(-1.0, 1.0, 2.0), 0.5),
        (Vec3::new(10.0, -4.0, 7.5), 0.3, Vec3::new(10.1, -4.2, 7.4), 0.3),
    ];

    for (pos_a, radius_a, pos_b, radius_b) in cases {
        let mut bodies = Bodies::new();
        let a = sphere_at(&mut bodies, pos_a, radius_a);
        let b = sphere_at(&mut bodies, pos_b, radius_b);

        let ab = does_collide(&a, &b, &bodies).unwrap().unwrap();
        let ba = does_collide(&b, &a, &bodies).unwrap().unwrap();
        assert_relative_eq!(ab.normal, -ba.normal, epsilon = 1e-6);
        assert_relative_eq!(ab.normal.magnitude(), 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_touching_spheres_do_not_collide() {
    let mut bodies = Bodies::new();
    let a = sphere_at(&mut bodies, Vec3::zeros(), 1.0);
    let touching = sphere_at(&mut bodies, Vec3::new(3.0, 0.0, 0.0), 2.0);
    let overlapping = sphere_at(&mut bodies, Vec3::new(3.0 - 1e-3, 0.0, 0.0), 2.0);

    assert!(!collides(&a, &touching, &bodies).unwrap());
    assert!(collides(&a, &overlapping, &bodies).unwrap());
}

#[test]
fn test_ray_hits_sphere_at_distance_minus_radius() {
    let mut bodies = Bodies::new();
    let radius = 2.5;
    let sphere = sphere_at(&mut bodies, Vec3::zeros(), radius);

    for distance in [3.0_f32, 10.0, 250.0] {
        let ray = Ray::new(Vec3::new(distance, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let hit = cast_ray(&ray, &sphere, &bodies).unwrap().unwrap();

        assert_relative_eq!(hit.distance, distance - radius, epsilon = 1e-4);
        assert_relative_eq!(hit.normal, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }
}

#[test]
fn test_bounded_plane_rejects_contacts_outside_restriction() {
    let mut bodies = Bodies::new();
    let ground = bodies.insert(Transform::identity());
    let span1 = Vec3::new(1.0, 0.0, 0.0);
    let span2 = Vec3::new(0.0, 0.0, -1.0);

    let unbounded = Primitive::plane(ground, Vec3::zeros(), span1, span2);
    let bounded = Primitive::bounded_plane(
        ground,
        Vec3::zeros(),
        span1,
        span2,
        PlaneRestriction::custom(|s1, s2| (0.0..=1.0).contains(&s1) && (0.0..=1.0).contains(&s2)),
    );

    // In-plane parameters (1.5, 0.5)
    let outside = sphere_at(&mut bodies, Vec3::new(1.5, 0.4, -0.5), 1.0);
    assert!(collides(&outside, &unbounded, &bodies).unwrap());
    assert!(!collides(&outside, &bounded, &bodies).unwrap());

    // In-plane parameters (0.5, 0.5)
    let inside = sphere_at(&mut bodies, Vec3::new(0.5, 0.4, -0.5), 1.0);
    let contact = does_collide(&inside, &bounded, &bodies).unwrap().unwrap();
    assert_relative_eq!(contact.position, Vec3::new(0.5, 0.0, -0.5), epsilon = 1e-5);
    assert_relative_eq!(contact.normal, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
}

#[test]
fn test_solver_recovers_coefficients_and_rejects_zero_vectors() {
    let a = Vec3::new(2.0, 0.0, 1.0);
    let b = Vec3::new(0.0, 1.0, -1.0);
    let c = Vec3::new(1.0, 1.0, 1.0);
    let x = a * 2.0 + b * 3.0 + c;
    assert_relative_eq!(
        solve_linear_equation(&a, &b, &c, &x).unwrap(),
        Vec3::new(2.0, 3.0, 1.0),
        epsilon = 1e-5
    );
    assert_eq!(
        solve_linear_equation(&a, &b, &Vec3::zeros(), &x),
        Err(SolverError::ZeroLengthBasis { index: 2 })
    );

    let a4 = Vec4::new(1.0, 0.0, 0.0, 0.0);
    let b4 = Vec4::new(0.0, 1.0, 0.0, 0.0);
    let c4 = Vec4::new(0.0, 0.0, 1.0, 0.0);
    let d4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
    assert_eq!(
        solve_linear_equation4(&a4, &b4, &c4, &Vec4::zeros(), &a4),
        Err(SolverError::ZeroLengthBasis { index: 3 })
    );
    let x4 = a4 * 2.0 + b4 * 3.0 + c4 + d4 * -4.0;
    assert_relative_eq!(
        solve_linear_equation4(&a4, &b4, &c4, &d4, &x4).unwrap(),
        Vec4::new(2.0, 3.0, 1.0, -4.0),
        epsilon = 1e-5
    );
}

#[test]
fn test_world_steps_a_ball_resting_on_a_floor() {
    let mut bodies = Bodies::new();
    let mut world = CollisionWorld::new(WorldConfig::default());

    let ground = bodies.insert(Transform::identity());
    let floor = Primitive::plane(ground, Vec3::zeros(), Vec3::z(), Vec3::x());
    world
        .register_collider(floor, CollisionLayers::STATIC, CollisionLayers::ALL, &bodies)
        .unwrap();

    let ball = bodies.insert(Transform::from_position(Vec3::new(4.0, 3.0, -2.0)));
    world
        .register_collider(Primitive::sphere(ball, 0.5), CollisionLayers::DYNAMIC, CollisionLayers::ALL, &bodies)
        .unwrap();

    // Fall in fixed steps until the ball sinks into the floor
    for _ in 0..10 {
        bodies.get_mut(ball).unwrap().transform.position.y -= 0.4;
        world.sync_body(ball, &bodies).unwrap();
        world.resolve_collisions(&mut bodies).unwrap();
    }

    assert_relative_eq!(bodies.world_position(ball).unwrap().y, 0.5, epsilon = 1e-5);
    assert_eq!(world.current_collisions().len(), 1);
}
