//! # Components
//!
//! Components are plain data. The store tracks jobs per component kind, so
//! every component type maps to one [`ComponentKey`] in the coordinator.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Marker trait for store components.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {
///     const ID: u8 = 3;
///     const NAME: &'static str = "Health";
/// }
/// ```
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// Also the component's bit in [`Entity::component_mask`](crate::Entity).
    const ID: u8;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;

    /// Resource key the coordinator tracks this component under.
    #[inline]
    #[must_use]
    fn key() -> ComponentKey {
        ComponentKey::new(Self::ID, Self::NAME)
    }
}

/// Highest component id plus one.
pub const MAX_COMPONENTS: u8 = 64;

/// Coordinator resource key for one component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    id: u8,
    name: &'static str,
}

impl ComponentKey {
    /// Creates a key.
    #[inline]
    #[must_use]
    pub const fn new(id: u8, name: &'static str) -> Self {
        Self { id, name }
    }

    /// Component id (bit position in entity masks).
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self.id
    }

    /// Component name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// This component's bit in an entity mask, or `0` for an out-of-range id.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u64 {
        if self.id < MAX_COMPONENTS {
            1 << self.id
        } else {
            0
        }
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}
