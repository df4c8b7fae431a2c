//! # Scheduled Query Integration
//!
//! Drives a world through a mixed pipeline of jobs and checks that no column
//! was ever found busy, and that the results match a plain sequential run.
//!
//! Run with: cargo test --package warden_ecs --test scheduled_queries

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::bounded;
use parking_lot::Mutex;
use warden_core::{AccessSet, CoordinatorConfig};
use warden_ecs::{Component, EntityId, Query, StoreError, World};
use warden_jobs::{JobHandle, JobPool, JobPoolConfig};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Position {
    x: i64,
    y: i64,
}

impl Component for Position {
    const ID: u8 = 0;
    const NAME: &'static str = "Position";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Velocity {
    x: i64,
    y: i64,
}

impl Component for Velocity {
    const ID: u8 = 1;
    const NAME: &'static str = "Velocity";
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct Mass(i64);

impl Component for Mass {
    const ID: u8 = 2;
    const NAME: &'static str = "Mass";
}

fn world(capacity: usize, workers: usize) -> World {
    let pool = JobPool::new(&JobPoolConfig::with_workers(workers)).unwrap();
    let mut world = World::with_pool(capacity, pool, &CoordinatorConfig::default()).unwrap();
    world.register::<Position>().unwrap();
    world.register::<Velocity>().unwrap();
    world.register::<Mass>().unwrap();
    world
}

fn populate(world: &mut World, count: i64) -> Vec<EntityId> {
    (0..count)
        .map(|i| {
            let id = world.spawn().unwrap();
            world.insert(id, Position { x: i, y: -i }).unwrap();
            world.insert(id, Velocity { x: 1, y: i % 3 }).unwrap();
            if i % 2 == 0 {
                world.insert(id, Mass(i + 1)).unwrap();
            }
            id
        })
        .collect()
}

#[test]
fn test_pipeline_matches_sequential_run() {
    let mut world = world(512, 4);
    let ids = populate(&mut world, 256);

    // Sequential shadow of the same pipeline.
    let mut positions: Vec<(i64, i64)> = (0..256).map(|i| (i, -i)).collect();
    let mut velocities: Vec<(i64, i64)> = (0..256).map(|i| (1, i % 3)).collect();
    let mut expected_sums = Vec::new();

    let observed = Arc::new(Mutex::new(Vec::new()));

    for round in 0..12_i64 {
        world
            .schedule_map::<Velocity, Position, _>(|_, vel, pos| {
                pos.x += vel.x;
                pos.y += vel.y;
            })
            .unwrap();
        for (pos, vel) in positions.iter_mut().zip(&velocities) {
            pos.0 += vel.0;
            pos.1 += vel.1;
        }

        if round % 3 == 0 {
            world
                .schedule_update::<Velocity, _>(move |_, vel| vel.x += round)
                .unwrap();
            for vel in &mut velocities {
                vel.0 += round;
            }
        }

        let sink = Arc::clone(&observed);
        world
            .schedule_read::<Position, _>({
                let mut sum = 0_i64;
                let mut seen = 0_usize;
                move |_, pos| {
                    sum += pos.x + pos.y;
                    seen += 1;
                    if seen == 256 {
                        sink.lock().push((round, sum));
                    }
                }
            })
            .unwrap();
        expected_sums.push((round, positions.iter().map(|p| p.0 + p.1).sum::<i64>()));
    }

    world.complete_all().unwrap();

    let mut observed = observed.lock().clone();
    observed.sort_unstable();
    assert_eq!(observed, expected_sums);
    assert_eq!(world.hazard_violations(), 0);

    for (i, id) in ids.iter().enumerate() {
        let (x, y) = positions[i];
        assert_eq!(world.get::<Position>(*id).unwrap(), Some(Position { x, y }));
    }
}

#[test]
fn test_custom_query_with_extra_access() {
    let mut world = world(64, 2);
    let ids = populate(&mut world, 32);

    // Reads Position and Velocity, writes Mass only for entities carrying all three.
    let query = Query::new()
        .write::<Mass>()
        .with_access(&AccessSet::new().read(Position::key()).read(Velocity::key()));
    world
        .schedule(query, |view| {
            let (Ok(pos), Ok(vel), Ok(mut mass)) = (
                view.column::<Position>(),
                view.column::<Velocity>(),
                view.column_mut::<Mass>(),
            ) else {
                return;
            };
            for id in view.matching() {
                let index = id.index() as usize;
                let slots = (pos.get(index), vel.get(index), mass.get_mut(index));
                if let (Some(p), Some(v), Some(m)) = slots {
                    m.0 = p.x + v.y;
                }
            }
        })
        .unwrap();

    for (i, id) in ids.iter().enumerate() {
        let i = i as i64;
        let expected = (i % 2 == 0).then(|| Mass(i + i % 3));
        assert_eq!(world.get::<Mass>(*id).unwrap(), expected);
    }
    assert_eq!(world.hazard_violations(), 0);
}

#[test]
fn test_undeclared_column_is_refused_inside_job() {
    let mut world = world(8, 2);
    populate(&mut world, 4);

    let outcome = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&outcome);
    world
        .schedule(Query::new().read::<Position>(), move |view| {
            *slot.lock() = Some(view.column_mut::<Position>().err());
        })
        .unwrap();
    world.complete_all().unwrap();

    assert_eq!(
        outcome.lock().take(),
        Some(Some(StoreError::UndeclaredAccess {
            component: "Position",
            write: true,
        }))
    );
}

#[test]
fn test_readers_of_one_column_overlap() {
    let mut world = world(8, 2);
    populate(&mut world, 4);

    let (to_b, from_a) = bounded::<()>(1);
    let (to_a, from_b) = bounded::<()>(1);
    let met = Arc::new(Mutex::new(Vec::new()));

    for (name, tx, rx) in [("a", to_b, from_b), ("b", to_a, from_a)] {
        let met = Arc::clone(&met);
        world
            .schedule(Query::new().read::<Velocity>(), move |view| {
                let _column = view.column::<Velocity>();
                let _ = tx.send(());
                if rx.recv_timeout(Duration::from_secs(5)).is_ok() {
                    met.lock().push(name);
                }
            })
            .unwrap();
    }

    world.complete_all().unwrap();
    let mut met = met.lock().clone();
    met.sort_unstable();
    assert_eq!(met, vec!["a", "b"]);
    assert_eq!(world.hazard_violations(), 0);
}

#[test]
fn test_structural_changes_wait_for_jobs() {
    let mut world = world(32, 4);
    let ids = populate(&mut world, 16);

    let handles: Vec<JobHandle> = (0..4)
        .map(|_| {
            world
                .schedule_update::<Velocity, _>(|_, vel| {
                    thread::sleep(Duration::from_micros(200));
                    vel.x += 1;
                })
                .unwrap()
        })
        .collect();

    world.despawn(ids[0]).unwrap();
    assert!(handles.iter().all(JobHandle::is_complete));
    assert!(!world.is_alive(ids[0]));
    assert_eq!(world.get::<Velocity>(ids[1]).unwrap(), Some(Velocity { x: 5, y: 1 }));
    assert_eq!(world.hazard_violations(), 0);
}
