//! # Access Sets
//!
//! A unit of work declares up front which resources it reads and which it
//! writes. The coordinator only ever sees these declarations, never the data.
//!
//! ## Overlap
//!
//! A key declared as both read and write is a write. Writing already orders
//! the job after every reader and the last writer, so the read adds nothing.

use std::fmt::Debug;
use std::hash::Hash;

/// Identifier for one resource category (one per component kind).
///
/// Blanket-implemented for any hashable, comparable, cloneable key.
pub trait ResourceKey: Eq + Hash + Clone + Debug {}

impl<T: Eq + Hash + Clone + Debug> ResourceKey for T {}

/// The declared reads and writes of one unit of work.
///
/// Both lists are deduplicated and kept in insertion order. `reads` and
/// `writes` never share a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessSet<K> {
    reads: Vec<K>,
    writes: Vec<K>,
}

impl<K> Default for AccessSet<K> {
    fn default() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }
}

impl<K: ResourceKey> AccessSet<K> {
    /// Creates an empty access set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an access set from read and write keys.
    ///
    /// Keys present in both are kept as writes only.
    pub fn from_keys<R, W>(reads: R, writes: W) -> Self
    where
        R: IntoIterator<Item = K>,
        W: IntoIterator<Item = K>,
    {
        let mut set = Self::new();
        for key in writes {
            set.add_write(key);
        }
        for key in reads {
            set.add_read(key);
        }
        set
    }

    /// Access set that reads a single key.
    #[must_use]
    pub fn read_only(key: K) -> Self {
        Self::new().read(key)
    }

    /// Access set that writes a single key.
    #[must_use]
    pub fn write_only(key: K) -> Self {
        Self::new().write(key)
    }

    /// Adds a read, builder style.
    #[must_use]
    pub fn read(mut self, key: K) -> Self {
        self.add_read(key);
        self
    }

    /// Adds a write, builder style.
    #[must_use]
    pub fn write(mut self, key: K) -> Self {
        self.add_write(key);
        self
    }

    /// Declares a read of `key`.
    ///
    /// Ignored if `key` is already declared, as either a read or a write.
    pub fn add_read(&mut self, key: K) {
        if self.writes.contains(&key) {
            tracing::debug!(?key, "read folded into existing write");
            return;
        }
        if !self.reads.contains(&key) {
            self.reads.push(key);
        }
    }

    /// Declares a write of `key`, dropping any read of the same key.
    pub fn add_write(&mut self, key: K) {
        if let Some(pos) = self.reads.iter().position(|k| *k == key) {
            tracing::debug!(?key, "read promoted to write");
            self.reads.remove(pos);
        }
        if !self.writes.contains(&key) {
            self.writes.push(key);
        }
    }

    /// Unions another access set into this one.
    ///
    /// Used to combine what a query touches implicitly with what the caller
    /// declared on top.
    pub fn merge(&mut self, other: &Self) {
        for key in &other.writes {
            self.add_write(key.clone());
        }
        for key in &other.reads {
            self.add_read(key.clone());
        }
    }

    /// Keys this unit of work reads.
    #[inline]
    #[must_use]
    pub fn reads(&self) -> &[K] {
        &self.reads
    }

    /// Keys this unit of work writes.
    #[inline]
    #[must_use]
    pub fn writes(&self) -> &[K] {
        &self.writes
    }

    /// Returns `true` if the set declares `key` as a read.
    #[inline]
    #[must_use]
    pub fn reads_key(&self, key: &K) -> bool {
        self.reads.contains(key)
    }

    /// Returns `true` if the set declares `key` as a write.
    #[inline]
    #[must_use]
    pub fn writes_key(&self, key: &K) -> bool {
        self.writes.contains(key)
    }

    /// Returns `true` if nothing is declared.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }

    /// Returns `true` if the two sets cannot safely run concurrently.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.writes
            .iter()
            .any(|k| other.writes.contains(k) || other.reads.contains(k))
            || other.writes.iter().any(|k| self.reads.contains(k))
    }
}
