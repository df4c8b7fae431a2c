//! # Queries
//!
//! A [`Query`] is the access declaration of a job: which components it reads
//! and which it writes. The world resolves it against the coordinator,
//! schedules the job, and hands the job a [`QueryView`] that only opens the
//! declared columns.
//!
//! ## Column Locks
//!
//! Columns sit behind `RwLock`s, but a view only ever *tries* to lock. If
//! scheduling is correct the lock is always free. A busy column means two
//! conflicting jobs overlapped; the view reports it as a hazard violation
//! instead of blocking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use warden_core::AccessSet;

use super::component::{Component, ComponentKey};
use super::entity::{Entity, EntityId};
use super::storage::{downcast, Column, ComponentStorage};
use crate::error::{StoreError, StoreResult};

/// Read access to a column from inside a job.
pub type ColumnRef<'a, C> = RwLockReadGuard<'a, ComponentStorage<C>>;

/// Write access to a column from inside a job.
pub type ColumnMut<'a, C> = RwLockWriteGuard<'a, ComponentStorage<C>>;

/// Declared component access of a job.
///
/// # Example
///
/// ```rust,ignore
/// let query = Query::new().read::<Velocity>().write::<Position>();
/// world.schedule(query, |view| {
///     let velocities = view.column::<Velocity>()?;
///     let mut positions = view.column_mut::<Position>()?;
///     // ...
/// })?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    access: AccessSet<ComponentKey>,
}

impl Query {
    /// A query that touches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a read of `C`.
    #[must_use]
    pub fn read<C: Component>(mut self) -> Self {
        self.access.add_read(C::key());
        self
    }

    /// Declares a write of `C`.
    #[must_use]
    pub fn write<C: Component>(mut self) -> Self {
        self.access.add_write(C::key());
        self
    }

    /// Adds explicitly declared access on top of what the query touches.
    ///
    /// A component declared as both read and write is a write.
    #[must_use]
    pub fn with_access(mut self, extra: &AccessSet<ComponentKey>) -> Self {
        self.access.merge(extra);
        self
    }

    /// The merged access set.
    #[inline]
    #[must_use]
    pub fn access(&self) -> &AccessSet<ComponentKey> {
        &self.access
    }

    pub(crate) fn into_access(self) -> AccessSet<ComponentKey> {
        self.access
    }

    /// Mask of every component the query declares.
    #[must_use]
    pub fn mask(&self) -> u64 {
        self.access
            .reads()
            .iter()
            .chain(self.access.writes())
            .fold(0, |mask, key| mask | key.mask())
    }
}

struct ViewColumn {
    key: ComponentKey,
    column: Arc<dyn Column>,
    writable: bool,
}

/// A job's window onto the store.
///
/// Holds the entity table as it was when the job was scheduled (structural
/// changes cannot happen while the job is outstanding) and the declared
/// columns.
pub struct QueryView {
    entities: Arc<Vec<Entity>>,
    columns: Vec<ViewColumn>,
    mask: u64,
    violations: Arc<AtomicUsize>,
}

impl QueryView {
    pub(crate) fn new(entities: Arc<Vec<Entity>>, mask: u64, violations: Arc<AtomicUsize>) -> Self {
        Self {
            entities,
            columns: Vec::new(),
            mask,
            violations,
        }
    }

    pub(crate) fn add_column(
        &mut self,
        key: ComponentKey,
        column: Arc<dyn Column>,
        writable: bool,
    ) {
        self.columns.push(ViewColumn { key, column, writable });
    }

    /// Every live entity.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive)
    }

    /// Live entities that carry every declared component.
    pub fn matching(&self) -> impl Iterator<Item = EntityId> + '_ {
        let mask = self.mask;
        self.entities()
            .filter(move |e| e.has_all(mask))
            .map(|e| e.id)
    }

    /// Opens the column of `C` for reading.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UndeclaredAccess`] if the query did not declare `C`
    /// - [`StoreError::HazardViolation`] if a conflicting job holds the column
    pub fn column<C: Component>(&self) -> StoreResult<ColumnRef<'_, C>> {
        let slot = self.slot::<C>(false)?;
        let storage = downcast::<C>(slot.column.as_ref())
            .ok_or(StoreError::ComponentNotRegistered(C::NAME))?;
        storage.try_read().ok_or_else(|| self.violation::<C>())
    }

    /// Opens the column of `C` for writing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UndeclaredAccess`] if the query did not declare a write of `C`
    /// - [`StoreError::HazardViolation`] if another job, or another open
    ///   view of the same column in this job, holds the column
    pub fn column_mut<C: Component>(&self) -> StoreResult<ColumnMut<'_, C>> {
        let slot = self.slot::<C>(true)?;
        let storage = downcast::<C>(slot.column.as_ref())
            .ok_or(StoreError::ComponentNotRegistered(C::NAME))?;
        storage.try_write().ok_or_else(|| self.violation::<C>())
    }

    fn slot<C: Component>(&self, write: bool) -> StoreResult<&ViewColumn> {
        let key = C::key();
        self.columns
            .iter()
            .find(|c| c.key == key && (c.writable || !write))
            .ok_or(StoreError::UndeclaredAccess {
                component: C::NAME,
                write,
            })
    }

    fn violation<C: Component>(&self) -> StoreError {
        self.violations.fetch_add(1, Ordering::Relaxed);
        tracing::error!(component = C::NAME, "column busy: conflicting jobs overlapped");
        StoreError::HazardViolation(C::NAME)
    }
}
