//! Octree behaviour across tree configurations

use sim_core::prelude::*;
use std::collections::HashMap;

const LAYOUTS: [(i32, i32, f32); 5] = [(4, 4, 0.01), (6, 2, 0.0), (10, 2, 0.01), (5, 0, 0.5), (8, 3, 2.0)];

/// Distinct points on a lattice that straddles every octant boundary of the root
fn lattice() -> Vec<Vec3> {
    let mut points = Vec::new();
    for i in -3..=3 {
        for j in -2..=2 {
            for k in -2..=2 {
                points.push(Vec3::new(i as f32 * 5.5, j as f32 * 3.25 + 0.5, k as f32 * 7.0));
            }
        }
    }
    points
}

fn counts(items: &[usize]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(*item).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_insert_then_remove_leaves_empty_index() {
    let points = lattice();
    for (current_size, minimum_size, precision) in LAYOUTS {
        let mut octree = Octree::new(current_size, minimum_size, precision);
        for (item, position) in points.iter().enumerate() {
            octree.add_object(item, 0.0, *position);
        }
        assert_eq!(octree.object_count(), points.len());

        for (item, position) in points.iter().enumerate() {
            assert!(
                octree.remove_object(&item, *position),
                "item {item} missing for layout ({current_size}, {minimum_size}, {precision})"
            );
        }
        assert!(octree.get_all_objects().is_empty());
        assert_eq!(octree.object_count(), 0);
    }
}

#[test]
fn test_all_objects_is_exactly_the_inserted_set() {
    let points = lattice();
    let expected: Vec<usize> = (0..points.len()).collect();

    for (current_size, minimum_size, precision) in LAYOUTS {
        let mut octree = Octree::new(current_size, minimum_size, precision);
        for (item, position) in points.iter().enumerate() {
            octree.add_object(item, 0.0, *position);
        }

        let found = octree.get_all_objects();
        assert_eq!(found.len(), expected.len());
        assert_eq!(counts(&found), counts(&expected));
    }
}

#[test]
fn test_moves_keep_the_set_intact() {
    let points = lattice();
    let mut octree = Octree::new(6, 1, 0.01);
    for (item, position) in points.iter().enumerate() {
        octree.add_object(item, 0.25, *position);
    }

    // Shift everything through the origin, passing one stale position in three
    for (item, position) in points.iter().enumerate() {
        let old = if item % 3 == 0 { Vec3::new(99.0, 99.0, 99.0) } else { *position };
        octree.move_object(item, old, -*position, 0.25);
    }

    let expected: Vec<usize> = (0..points.len()).collect();
    assert_eq!(counts(&octree.get_all_objects()), counts(&expected));
}

#[test]
fn test_query_radius_matches_brute_force() {
    let points = lattice();
    let mut octree = Octree::new(6, 2, 0.01);
    for (item, position) in points.iter().enumerate() {
        octree.add_object(item, 0.5, *position);
    }

    let center = Vec3::new(3.0, 1.0, -4.0);
    let radius = 6.0;
    let mut found: Vec<usize> = octree
        .query_radius(center, radius)
        .into_iter()
        .map(|entry| entry.item)
        .collect();
    found.sort_unstable();

    let expected: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, position)| (*position - center).magnitude() <= radius + 0.5)
        .map(|(item, _)| item)
        .collect();
    assert_eq!(found, expected);
}
