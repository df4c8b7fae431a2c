//! # Entity Slots
//!
//! The world owns a fixed table of slots. A slot is occupied by at most one
//! entity at a time; every occupation bumps the slot's generation, so an id
//! handed out for an earlier occupant no longer matches the slot.
//!
//! ```text
//!   slot 3:  vacant(g0) ──occupy──► live(3,g1) ──vacate──► vacant(g1) ──occupy──► live(3,g2)
//!                                     ▲                                              │
//!                         id (3,g1) matches here                 id (3,g1) is stale here
//! ```

/// Generation-checked handle to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Id that never matches a slot.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Builds an id for `index` at `generation`.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot this id points at; also the row in every component column.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Occupation of the slot this id was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` for [`EntityId::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// One slot of the entity table.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    /// Current occupant, or the last one if the slot is vacant.
    pub id: EntityId,
    /// Components attached to the occupant, bit `n` for component id `n`.
    pub component_mask: u64,
    /// Whether the slot is occupied.
    pub alive: bool,
}

impl Entity {
    /// An occupied slot with no components.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            component_mask: 0,
            alive: true,
        }
    }

    /// A slot that has never been occupied.
    #[inline]
    #[must_use]
    pub const fn dead() -> Self {
        Self {
            id: EntityId::new(0, 0),
            component_mask: 0,
            alive: false,
        }
    }

    /// Returns `true` if `id` is the slot's live occupant.
    #[inline]
    #[must_use]
    pub fn holds(self, id: EntityId) -> bool {
        self.alive && self.id == id
    }

    /// Returns `true` if the component with `component_id` is attached.
    #[inline]
    #[must_use]
    pub const fn has_component(self, component_id: u8) -> bool {
        component_id < 64 && (self.component_mask & (1 << component_id)) != 0
    }

    /// Returns `true` if every component in `mask` is attached.
    #[inline]
    #[must_use]
    pub const fn has_all(self, mask: u64) -> bool {
        self.component_mask & mask == mask
    }

    /// Occupies the slot at `index` with a fresh generation, returning its id.
    pub(crate) fn occupy(&mut self, index: u32) -> EntityId {
        let id = EntityId::new(index, self.id.generation().wrapping_add(1));
        *self = Self::new(id);
        id
    }

    /// Vacates the slot. The id is kept so the next occupant gets a newer
    /// generation.
    pub(crate) fn vacate(&mut self) {
        self.alive = false;
        self.component_mask = 0;
    }

    #[inline]
    pub(crate) fn add_component(&mut self, component_id: u8) {
        self.component_mask |= 1 << component_id;
    }

    #[inline]
    pub(crate) fn remove_component(&mut self, component_id: u8) {
        self.component_mask &= !(1 << component_id);
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_id_never_held() {
        assert!(EntityId::default().is_null());
        assert!(!EntityId::new(0, 0).is_null());
        assert!(!Entity::dead().holds(EntityId::NULL));
        assert!(!Entity::dead().holds(EntityId::new(0, 0)));
    }

    #[test]
    fn test_reoccupied_slot_rejects_stale_id() {
        let mut slot = Entity::dead();

        let first = slot.occupy(3);
        assert_eq!((first.index(), first.generation()), (3, 1));
        assert!(slot.holds(first));

        slot.add_component(2);
        slot.vacate();
        assert!(!slot.holds(first));
        assert!(!slot.has_component(2));

        let second = slot.occupy(3);
        assert_eq!(second.generation(), 2);
        assert!(slot.holds(second));
        assert!(!slot.holds(first));
    }

    #[test]
    fn test_component_bits() {
        let mut slot = Entity::new(EntityId::new(1, 1));
        slot.add_component(5);
        slot.add_component(63);
        assert!(slot.has_all((1 << 5) | (1 << 63)));
        assert!(!slot.has_component(64));

        slot.remove_component(5);
        assert!(!slot.has_component(5));
        assert!(slot.has_component(63));
    }
}
