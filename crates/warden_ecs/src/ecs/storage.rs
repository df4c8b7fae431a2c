//! # Component Storage
//!
//! Pre-allocated, dense component columns.
//!
//! - All slots are allocated when the component is registered
//! - Access is O(1) via entity index
//! - A column is shared with jobs behind a try-only lock

use std::any::Any;

use parking_lot::RwLock;

use super::component::Component;

/// Dense storage for a single component type, one slot per entity index.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Position> = ComponentStorage::new(1_000);
/// storage.set(0, Position::new(1.0, 2.0, 3.0));
/// ```
pub struct ComponentStorage<C: Component> {
    data: Box<[C]>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates storage with `capacity` default-initialized slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Component at `index`, or `None` if out of bounds.
    ///
    /// Slots of entities without this component hold the default value.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Mutable component at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Overwrites the slot at `index`. Returns `false` if out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> bool {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = component;
            true
        } else {
            false
        }
    }

    /// Resets the slot at `index` to the default value, returning the old one.
    #[inline]
    pub fn reset(&mut self, index: usize) -> Option<C> {
        self.data.get_mut(index).map(std::mem::take)
    }

    /// All slots.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// All slots, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }
}

/// Type-erased column as held by the world and by query views.
pub(crate) trait Column: Send + Sync {
    /// Resets one slot. Returns `false` if the column was busy.
    fn try_reset(&self, index: usize) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl<C: Component> Column for RwLock<ComponentStorage<C>> {
    fn try_reset(&self, index: usize) -> bool {
        match self.try_write() {
            Some(mut storage) => {
                storage.reset(index);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcasts an erased column to its concrete storage.
pub(crate) fn downcast<C: Component>(column: &dyn Column) -> Option<&RwLock<ComponentStorage<C>>> {
    column.as_any().downcast_ref::<RwLock<ComponentStorage<C>>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Mass(f32);

    impl Component for Mass {
        const ID: u8 = 0;
        const NAME: &'static str = "Mass";
    }

    #[test]
    fn test_storage_get_set() {
        let mut storage: ComponentStorage<Mass> = ComponentStorage::new(100);
        assert_eq!(storage.capacity(), 100);
        assert!(storage.set(50, Mass(2.5)));
        assert_eq!(storage.get(50), Some(&Mass(2.5)));
        assert!(!storage.set(100, Mass(1.0)));
        assert!(storage.get(100).is_none());
    }

    #[test]
    fn test_reset_returns_previous() {
        let mut storage: ComponentStorage<Mass> = ComponentStorage::new(4);
        storage.set(1, Mass(7.0));
        assert_eq!(storage.reset(1), Some(Mass(7.0)));
        assert_eq!(storage.get(1), Some(&Mass::default()));
    }

    #[test]
    fn test_erased_column_downcast() {
        let column: Box<dyn Column> = Box::new(RwLock::new(ComponentStorage::<Mass>::new(4)));
        assert!(downcast::<Mass>(column.as_ref()).is_some());

        let busy = downcast::<Mass>(column.as_ref()).unwrap().read();
        assert!(!column.try_reset(0));
        drop(busy);
        assert!(column.try_reset(0));
    }
}
