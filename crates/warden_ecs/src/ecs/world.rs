//! # ECS World
//!
//! The store: entity slots, component columns, and the coordinator that
//! orders every job touching them.
//!
//! ## Rules
//!
//! - Queries run as jobs; the coordinator orders them by declared access
//! - Structural changes drain every outstanding job first
//! - Direct reads and writes from the coordinating thread wait only on the
//!   jobs that conflict with them

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use warden_core::{AccessSet, Coordinator, CoordinatorConfig};
use warden_jobs::{JobHandle, JobPool};

use super::component::{Component, ComponentKey, MAX_COMPONENTS};
use super::entity::{Entity, EntityId};
use super::query::{Query, QueryView};
use super::storage::{downcast, Column, ComponentStorage};
use crate::config::WorldConfig;
use crate::error::{StoreError, StoreResult};

/// The entity/component store.
///
/// Entity slots are pre-allocated at creation; columns are pre-allocated to
/// the same capacity when their component is registered.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new(&WorldConfig::with_capacity(1_000))?;
/// world.register::<Position>()?;
/// world.register::<Velocity>()?;
///
/// let e = world.spawn()?;
/// world.insert(e, Position::default())?;
/// world.insert(e, Velocity::new(1.0, 0.0, 0.0))?;
///
/// world.schedule_map::<Velocity, Position, _>(|_, vel, pos| pos.x += vel.x)?;
/// let pos = world.get::<Position>(e)?;
/// ```
pub struct World {
    /// Entity slots. Shared with scheduled jobs; copied on write if a job
    /// still holds it.
    entities: Arc<Vec<Entity>>,
    /// Free slot indices, popped on spawn.
    free_indices: Vec<u32>,
    alive_count: usize,
    capacity: usize,

    /// One column per registered component.
    columns: HashMap<ComponentKey, Arc<dyn Column>>,
    /// Registered component name per id.
    component_names: [Option<&'static str>; MAX_COMPONENTS as usize],

    coordinator: Coordinator<ComponentKey, JobPool>,
    /// Busy columns observed by jobs or by the coordinating thread.
    violations: Arc<AtomicUsize>,
}

impl World {
    /// Creates a world with its own worker pool.
    ///
    /// The calling thread becomes the coordinating thread.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` is invalid, or
    /// [`StoreError::Jobs`] if the worker pool cannot start.
    pub fn new(config: &WorldConfig) -> StoreResult<Self> {
        config.validate()?;
        let pool = JobPool::new(&config.jobs)?;
        Self::with_pool(config.capacity, pool, &config.coordinator)
    }

    /// Creates a world that schedules onto an existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `capacity` is zero or does
    /// not fit entity indices.
    pub fn with_pool(
        capacity: usize,
        pool: JobPool,
        coordinator: &CoordinatorConfig,
    ) -> StoreResult<Self> {
        let slots = match u32::try_from(capacity) {
            Ok(slots) if slots > 0 => slots,
            _ => {
                return Err(StoreError::InvalidConfig(format!(
                    "capacity must be between 1 and {}, got {capacity}",
                    u32::MAX
                )))
            }
        };

        tracing::debug!(capacity, workers = pool.worker_count(), "world created");

        Ok(Self {
            entities: Arc::new(vec![Entity::dead(); capacity]),
            free_indices: (0..slots).rev().collect(),
            alive_count: 0,
            capacity,
            columns: HashMap::new(),
            component_names: [None; MAX_COMPONENTS as usize],
            coordinator: Coordinator::with_config(pool, coordinator),
            violations: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Maximum number of live entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// The coordinator ordering this world's jobs.
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &Coordinator<ComponentKey, JobPool> {
        &self.coordinator
    }

    /// The worker pool jobs run on.
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &JobPool {
        self.coordinator.jobs()
    }

    /// Number of times a column was found busy when it should have been free.
    ///
    /// Always zero unless jobs were ordered incorrectly.
    #[must_use]
    pub fn hazard_violations(&self) -> usize {
        self.violations.load(Ordering::Relaxed)
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.live_entity(id).is_ok()
    }

    /// Copy of a live entity's slot.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.live_entity(id).ok()
    }

    /// Registers component type `C`, allocating its column.
    ///
    /// Registering the same type twice is a no-op. This is a structural
    /// change: outstanding jobs are drained first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidComponentId`] if `C::ID` is 64 or more
    /// - [`StoreError::ComponentIdInUse`] if another component has `C::ID`
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn register<C: Component>(&mut self) -> StoreResult<()> {
        if C::ID >= MAX_COMPONENTS {
            return Err(StoreError::InvalidComponentId {
                name: C::NAME,
                id: C::ID,
            });
        }
        if let Some(existing) = self.component_names[usize::from(C::ID)] {
            if existing == C::NAME {
                return Ok(());
            }
            return Err(StoreError::ComponentIdInUse {
                id: C::ID,
                existing,
                requested: C::NAME,
            });
        }

        self.coordinator.synchronize()?;
        let storage = ComponentStorage::<C>::new(self.capacity);
        let column: Arc<dyn Column> = Arc::new(RwLock::new(storage));
        self.columns.insert(C::key(), column);
        self.component_names[usize::from(C::ID)] = Some(C::NAME);

        tracing::debug!(component = C::NAME, id = C::ID, "component registered");
        Ok(())
    }

    /// Spawns an entity with no components.
    ///
    /// Structural change: outstanding jobs are drained first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CapacityExhausted`] if every slot is in use
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn spawn(&mut self) -> StoreResult<EntityId> {
        if self.free_indices.is_empty() {
            return Err(StoreError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        self.coordinator.synchronize()?;

        let Some(index) = self.free_indices.pop() else {
            return Err(StoreError::CapacityExhausted {
                capacity: self.capacity,
            });
        };
        let id = Arc::make_mut(&mut self.entities)[index as usize].occupy(index);
        self.alive_count += 1;

        Ok(id)
    }

    /// Despawns an entity and resets its components.
    ///
    /// Structural change: outstanding jobs are drained first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntityNotFound`] if `id` is null, stale or dead
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn despawn(&mut self, id: EntityId) -> StoreResult<()> {
        let entity = self.live_entity(id)?;
        self.coordinator.synchronize()?;

        let index = id.index() as usize;
        for (key, column) in &self.columns {
            if entity.has_component(key.id()) && !column.try_reset(index) {
                return Err(self.violation(key.name()));
            }
        }

        Arc::make_mut(&mut self.entities)[index].vacate();
        self.free_indices.push(id.index());
        self.alive_count -= 1;

        Ok(())
    }

    /// Attaches (or overwrites) component `C` on an entity.
    ///
    /// Structural change: outstanding jobs are drained first.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntityNotFound`] if `id` is not alive
    /// - [`StoreError::ComponentNotRegistered`] if `C` was never registered
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn insert<C: Component>(&mut self, id: EntityId, value: C) -> StoreResult<()> {
        self.live_entity(id)?;
        self.storage::<C>()?;
        self.coordinator.synchronize()?;

        let index = id.index() as usize;
        {
            let storage = self.storage::<C>()?;
            let Some(mut column) = storage.try_write() else {
                return Err(self.violation(C::NAME));
            };
            column.set(index, value);
        }
        Arc::make_mut(&mut self.entities)[index].add_component(C::ID);

        Ok(())
    }

    /// Detaches component `C` from an entity, returning its last value.
    ///
    /// Returns `Ok(None)` without draining jobs if the entity never had `C`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntityNotFound`] if `id` is not alive
    /// - [`StoreError::ComponentNotRegistered`] if `C` was never registered
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn remove<C: Component>(&mut self, id: EntityId) -> StoreResult<Option<C>> {
        let entity = self.live_entity(id)?;
        self.storage::<C>()?;
        if !entity.has_component(C::ID) {
            return Ok(None);
        }
        self.coordinator.synchronize()?;

        let index = id.index() as usize;
        let previous = {
            let storage = self.storage::<C>()?;
            let Some(mut column) = storage.try_write() else {
                return Err(self.violation(C::NAME));
            };
            column.reset(index)
        };
        Arc::make_mut(&mut self.entities)[index].remove_component(C::ID);

        Ok(previous)
    }

    /// Reads component `C` of an entity from the coordinating thread.
    ///
    /// Waits for outstanding writers of `C` only.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntityNotFound`] if `id` is not alive
    /// - [`StoreError::ComponentNotRegistered`] if `C` was never registered
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn get<C: Component>(&mut self, id: EntityId) -> StoreResult<Option<C>> {
        let entity = self.live_entity(id)?;
        self.storage::<C>()?;
        if !entity.has_component(C::ID) {
            return Ok(None);
        }
        self.coordinator.complete(&AccessSet::read_only(C::key()))?;

        let storage = self.storage::<C>()?;
        let column = storage.try_read().ok_or_else(|| self.violation(C::NAME))?;
        Ok(column.get(id.index() as usize).copied())
    }

    /// Overwrites component `C` of an entity from the coordinating thread.
    ///
    /// Waits for outstanding readers and writers of `C` only.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EntityNotFound`] if `id` is not alive
    /// - [`StoreError::ComponentMissing`] if the entity does not carry `C`
    /// - [`StoreError::ComponentNotRegistered`] if `C` was never registered
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn set<C: Component>(&mut self, id: EntityId, value: C) -> StoreResult<()> {
        let entity = self.live_entity(id)?;
        self.storage::<C>()?;
        if !entity.has_component(C::ID) {
            return Err(StoreError::ComponentMissing {
                entity: id,
                component: C::NAME,
            });
        }
        self.coordinator.complete(&AccessSet::write_only(C::key()))?;

        let storage = self.storage::<C>()?;
        let mut column = storage.try_write().ok_or_else(|| self.violation(C::NAME))?;
        column.set(id.index() as usize, value);
        Ok(())
    }

    /// Schedules `job` with the access declared by `query`.
    ///
    /// The job starts after every earlier job it conflicts with and before
    /// every later one that conflicts with it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ComponentNotRegistered`] if the query names an
    ///   unregistered component
    /// - [`StoreError::Hazard`] off the coordinating thread
    pub fn schedule<F>(&mut self, query: Query, job: F) -> StoreResult<JobHandle>
    where
        F: FnOnce(&QueryView) + Send + 'static,
    {
        let mut view = QueryView::new(
            Arc::clone(&self.entities),
            query.mask(),
            Arc::clone(&self.violations),
        );
        let access = query.into_access();
        for key in access.writes() {
            view.add_column(*key, Arc::clone(self.column(key)?), true);
        }
        for key in access.reads() {
            view.add_column(*key, Arc::clone(self.column(key)?), false);
        }

        let handle = self
            .coordinator
            .schedule_with(access, |pool, dep| pool.schedule(dep, move || job(&view)))?;
        Ok(handle)
    }

    /// Schedules `f` over every entity carrying `C`, with write access to `C`.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule).
    pub fn schedule_update<C, F>(&mut self, mut f: F) -> StoreResult<JobHandle>
    where
        C: Component,
        F: FnMut(EntityId, &mut C) + Send + 'static,
    {
        self.schedule(Query::new().write::<C>(), move |view| {
            let Ok(mut column) = view.column_mut::<C>() else {
                return;
            };
            for id in view.matching() {
                if let Some(value) = column.get_mut(id.index() as usize) {
                    f(id, value);
                }
            }
        })
    }

    /// Schedules `f` over every entity carrying `C`, with read access to `C`.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule).
    pub fn schedule_read<C, F>(&mut self, mut f: F) -> StoreResult<JobHandle>
    where
        C: Component,
        F: FnMut(EntityId, &C) + Send + 'static,
    {
        self.schedule(Query::new().read::<C>(), move |view| {
            let Ok(column) = view.column::<C>() else {
                return;
            };
            for id in view.matching() {
                if let Some(value) = column.get(id.index() as usize) {
                    f(id, value);
                }
            }
        })
    }

    /// Schedules `f` over every entity carrying both `R` and `W`, reading `R`
    /// and writing `W`. `R` and `W` must be different components.
    ///
    /// # Errors
    ///
    /// As [`schedule`](Self::schedule).
    pub fn schedule_map<R, W, F>(&mut self, mut f: F) -> StoreResult<JobHandle>
    where
        R: Component,
        W: Component,
        F: FnMut(EntityId, &R, &mut W) + Send + 'static,
    {
        self.schedule(Query::new().read::<R>().write::<W>(), move |view| {
            let (Ok(input), Ok(mut output)) = (view.column::<R>(), view.column_mut::<W>()) else {
                return;
            };
            for id in view.matching() {
                let index = id.index() as usize;
                if let (Some(r), Some(w)) = (input.get(index), output.get_mut(index)) {
                    f(id, r, w);
                }
            }
        })
    }

    /// Blocks until every scheduled job has finished.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Hazard`] off the coordinating thread.
    pub fn complete_all(&mut self) -> StoreResult<()> {
        self.coordinator.synchronize()?;
        Ok(())
    }

    fn live_entity(&self, id: EntityId) -> StoreResult<Entity> {
        if id.is_null() {
            return Err(StoreError::EntityNotFound(id));
        }
        match self.entities.get(id.index() as usize) {
            Some(entity) if entity.holds(id) => Ok(*entity),
            _ => Err(StoreError::EntityNotFound(id)),
        }
    }

    fn column(&self, key: &ComponentKey) -> StoreResult<&Arc<dyn Column>> {
        self.columns
            .get(key)
            .ok_or(StoreError::ComponentNotRegistered(key.name()))
    }

    fn storage<C: Component>(&self) -> StoreResult<&RwLock<ComponentStorage<C>>> {
        self.columns
            .get(&C::key())
            .and_then(|column| downcast::<C>(column.as_ref()))
            .ok_or(StoreError::ComponentNotRegistered(C::NAME))
    }

    fn violation(&self, component: &'static str) -> StoreError {
        self.violations.fetch_add(1, Ordering::Relaxed);
        tracing::error!(component, "column busy on the coordinating thread");
        StoreError::HazardViolation(component)
    }
}
