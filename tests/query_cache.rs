//! Filter cache staleness rules against the two version counters

use lattice_ecs::{Filter, World};

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct Frozen;

#[test]
fn structural_change_rebuilds_archetype_list() {
    let mut world = World::new();
    world.spawn((Position { x: 0.0, y: 0.0 },));

    let mut filter = Filter::<(Position,)>::new(&mut world);
    assert_eq!(filter.matching_archetype_count(), 1);

    // A new matching archetype appears: {P, V}
    world.spawn((Position { x: 1.0, y: 1.0 }, Velocity { dx: 0.0, dy: 0.0 }));
    assert_eq!(filter.count(&world), 2);
    assert_eq!(filter.matching_archetype_count(), 2);
}

#[test]
fn mutation_rebuilds_snapshot_only() {
    let mut world = World::new();
    let first = world.spawn((Position { x: 0.0, y: 0.0 },));

    let mut filter = Filter::<(Position,)>::new(&mut world);
    assert_eq!(filter.entities(&world), &[first]);
    let archetypes_before = filter.matching_archetype_count();

    // Same archetype shape: a pure mutation, no structural change
    let second = world.spawn((Position { x: 1.0, y: 0.0 },));
    let snapshot = filter.entities(&world);
    assert_eq!(snapshot, &[first, second]);
    assert_eq!(filter.matching_archetype_count(), archetypes_before);
}

#[test]
fn snapshot_shrinks_after_entity_removal() {
    let mut world = World::new();
    let entities: Vec<_> = (0..6)
        .map(|i| world.spawn((Position { x: i as f32, y: 0.0 },)))
        .collect();

    let mut filter = Filter::<(Position,)>::new(&mut world);
    assert_eq!(filter.entities(&world).len(), 6);

    world.remove_entity(entities[2]);
    world.remove_entity(entities[4]);
    let snapshot = filter.entities(&world);
    assert_eq!(snapshot.len(), 4);
    assert!(!snapshot.contains(&entities[2]));
    assert!(!snapshot.contains(&entities[4]));
}

#[test]
fn snapshot_tracks_archetype_migration() {
    let mut world = World::new();
    let e = world.spawn((Position { x: 0.0, y: 0.0 },));

    let mut moving = Filter::<(Position, Velocity)>::new(&mut world);
    assert!(moving.entities(&world).is_empty());

    world.add::<(Velocity,)>(e);
    assert_eq!(moving.entities(&world), &[e]);

    world.remove::<(Velocity,)>(e);
    assert!(moving.entities(&world).is_empty());
}

#[test]
fn excluded_filter_reacts_to_component_changes() {
    let mut world = World::new();
    let e = world.spawn((Position { x: 0.0, y: 0.0 },));

    let mut active = Filter::<(Position,)>::new(&mut world).exclude::<(Frozen,)>(&mut world);
    assert_eq!(active.count(&world), 1);

    world.add::<(Frozen,)>(e);
    assert_eq!(active.count(&world), 0);

    world.remove::<(Frozen,)>(e);
    assert_eq!(active.count(&world), 1);
}

#[test]
fn filters_over_one_world_stay_independent() {
    let mut world = World::new();
    world.spawn((Position { x: 0.0, y: 0.0 },));
    world.spawn((Position { x: 1.0, y: 0.0 }, Velocity { dx: 0.0, dy: 0.0 }));

    let mut all = Filter::<(Position,)>::new(&mut world);
    let mut moving = Filter::<(Position, Velocity)>::new(&mut world);
    let mut parked = Filter::<(Position,)>::new(&mut world).exclude::<(Velocity,)>(&mut world);

    assert_eq!(all.count(&world), 2);
    assert_eq!(moving.count(&world), 1);
    assert_eq!(parked.count(&world), 1);
}

#[test]
fn remove_entities_invalidates_snapshot() {
    let mut world = World::new();
    for i in 0..5 {
        world.spawn((Position { x: i as f32, y: 0.0 },));
    }
    let bystander = world.spawn((Velocity { dx: 0.0, dy: 0.0 },));

    let mut filter = Filter::<(Position,)>::new(&mut world);
    assert_eq!(filter.entities(&world).len(), 5);

    filter.remove_entities(&mut world);
    assert!(filter.entities(&world).is_empty());
    assert_eq!(world.entity_count(), 1);
    assert!(world.is_valid(bystander));
    world.assert_invariants();
}

#[test]
fn stale_filter_catches_up_after_many_changes() {
    let mut world = World::new();
    let mut filter = Filter::<(Position,)>::new(&mut world);

    // Burst of structural changes while the filter sits idle
    let mut entities = Vec::new();
    for i in 0..8 {
        let e = world.spawn((Position { x: i as f32, y: 0.0 },));
        if i % 2 == 0 {
            world.add::<(Velocity,)>(e);
        }
        if i % 4 == 0 {
            world.add::<(Frozen,)>(e);
        }
        entities.push(e);
    }
    world.remove_entity(entities[1]);

    assert_eq!(filter.count(&world), 7);
    assert_eq!(filter.entities(&world).len(), 7);
}
