//! Generational-handle safety across id recycling

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

#[test]
fn stale_handles_fail_after_every_recycling_round() {
    let mut world = World::new();

    let mut stale = Vec::new();
    let mut handle = world.spawn((Position { x: 0.0, y: 0.0 },));
    for round in 1..10 {
        world.remove_entity(handle);
        stale.push(handle);

        handle = world.spawn((Position { x: round as f32, y: 0.0 },));
        assert_eq!(handle.id(), stale[0].id());
        assert_eq!(handle.version(), round + 1);

        for &old in &stale {
            assert!(!world.is_valid(old));
            assert!(world.get::<Position>(old).is_none());
            assert!(!world.set(old, (Position { x: -1.0, y: -1.0 },)));
            assert!(!world.add::<(Velocity,)>(old));
            assert!(!world.remove::<(Position,)>(old));
            assert!(!world.remove_entity(old));
        }
        // The live incarnation is untouched by the stale attempts
        assert_eq!(
            world.get::<Position>(handle),
            Some(&Position { x: round as f32, y: 0.0 })
        );
    }
    world.assert_invariants();
}

#[test]
fn stale_handles_never_appear_in_queries() {
    let mut world = World::new();
    let doomed = world.spawn((Position { x: 1.0, y: 1.0 },));
    world.remove_entity(doomed);
    let alive = world.spawn((Position { x: 2.0, y: 2.0 },));

    let mut filter = Filter::<(Position,)>::new(&mut world);
    let found: Vec<_> = filter.iter(&world).map(|(e, _)| e).collect();
    assert_eq!(found, vec![alive]);
    // Recycled id, bumped version
    assert_eq!(alive.id(), doomed.id());
    assert_ne!(alive.version(), doomed.version());
}

#[test]
fn clear_invalidates_every_outstanding_handle() {
    let mut world = World::new();
    let handles: Vec<_> = (0..8)
        .map(|i| world.spawn((Position { x: i as f32, y: 0.0 },)))
        .collect();

    world.clear_entities();

    for &old in &handles {
        assert!(!world.is_valid(old));
        assert!(!world.set(old, (Position { x: 0.0, y: 0.0 },)));
    }

    // Recycled ids come back with higher versions
    let fresh = world.create_entity();
    let old = handles.iter().find(|h| h.id() == fresh.id()).unwrap();
    assert!(fresh.version() > old.version());
    world.assert_invariants();
}

#[test]
fn versions_start_at_one_and_only_grow() {
    let mut world = World::new();
    let first = world.create_entity();
    assert_eq!(first.version(), 1);

    world.remove_entity(first);
    let second = world.create_entity();
    assert_eq!(second.id(), first.id());
    assert_eq!(second.version(), 2);

    world.remove_entity(second);
    let third = world.create_entity();
    assert_eq!(third.version(), 3);
}
