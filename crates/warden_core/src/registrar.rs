//! # Access Registrar
//!
//! Per-resource bookkeeping of who is reading and who last wrote.
//!
//! ```text
//! key "Position":  writer = J3   readers = [J4, J5]
//! key "Velocity":  writer = -    readers = [J2]
//! ```
//!
//! A new writer waits on the current reader generation, or on the last writer
//! if nobody read since. A new reader waits on the last writer only.
//! Registering a write starts a fresh reader generation.

use std::collections::HashMap;

use crate::access::{AccessSet, ResourceKey};

/// Current readers and last writer of one resource.
#[derive(Clone, Debug)]
pub struct AccessRecord<H> {
    readers: Vec<H>,
    writer: Option<H>,
}

impl<H> AccessRecord<H> {
    /// Creates an empty record with room for `reader_capacity` readers.
    #[must_use]
    pub fn with_reader_capacity(reader_capacity: usize) -> Self {
        Self {
            readers: Vec::with_capacity(reader_capacity),
            writer: None,
        }
    }

    /// Readers registered since the last writer, in registration order.
    #[inline]
    #[must_use]
    pub fn readers(&self) -> &[H] {
        &self.readers
    }

    /// The most recently registered writer.
    #[inline]
    #[must_use]
    pub fn writer(&self) -> Option<&H> {
        self.writer.as_ref()
    }
}

impl<H: Clone> AccessRecord<H> {
    /// Handles a new writer of this resource must wait on.
    ///
    /// Every current reader was registered after the current writer and
    /// already depends on it, so the readers alone cover the writer.
    fn write_hazards(&self, out: &mut Vec<H>) {
        if self.readers.is_empty() {
            out.extend(self.writer.iter().cloned());
        } else {
            out.extend_from_slice(&self.readers);
        }
    }

    /// Handles a new reader of this resource must wait on.
    fn read_hazards(&self, out: &mut Vec<H>) {
        out.extend(self.writer.iter().cloned());
    }

    fn push_reader(&mut self, handle: H) {
        self.readers.push(handle);
    }

    fn set_writer(&mut self, handle: H) {
        // Clearing keeps the allocation for the next reader generation.
        self.readers.clear();
        self.writer = Some(handle);
    }
}

/// Mapping from resource key to its [`AccessRecord`].
///
/// Records are created on first publication and never removed. A key with
/// no record behaves exactly like a key with an empty record.
#[derive(Clone, Debug)]
pub struct AccessRegistrar<K, H> {
    records: HashMap<K, AccessRecord<H>>,
    reader_capacity: usize,
}

impl<K: ResourceKey, H: Clone> AccessRegistrar<K, H> {
    /// Creates an empty registrar.
    ///
    /// # Arguments
    ///
    /// * `reader_capacity` - Initial reader list capacity for new records
    #[must_use]
    pub fn new(reader_capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            reader_capacity,
        }
    }

    /// Looks up the record for `key`, if one was ever created.
    #[inline]
    #[must_use]
    pub fn record(&self, key: &K) -> Option<&AccessRecord<H>> {
        self.records.get(key)
    }

    fn record_mut(&mut self, key: &K) -> &mut AccessRecord<H> {
        let reader_capacity = self.reader_capacity;
        self.records
            .entry(key.clone())
            .or_insert_with(|| AccessRecord::with_reader_capacity(reader_capacity))
    }

    /// Number of resource keys that have a record.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was ever published.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends every handle a job with `access` must wait on to `out`.
    ///
    /// The same handle may be appended more than once when it covers
    /// several keys; combining handles is idempotent.
    pub fn collect_dependencies(&self, access: &AccessSet<K>, out: &mut Vec<H>) {
        for key in access.writes() {
            if let Some(record) = self.records.get(key) {
                record.write_hazards(out);
            }
        }
        for key in access.reads() {
            if let Some(record) = self.records.get(key) {
                record.read_hazards(out);
            }
        }
    }

    /// Records `handle` as a reader of every read key and as the writer of
    /// every write key.
    pub fn publish(&mut self, access: &AccessSet<K>, handle: &H) {
        for key in access.reads() {
            self.record_mut(key).push_reader(handle.clone());
        }
        for key in access.writes() {
            self.record_mut(key).set_writer(handle.clone());
        }
    }

    /// Appends every handle still referenced by any record to `out`.
    pub fn collect_outstanding(&self, out: &mut Vec<H>) {
        for record in self.records.values() {
            out.extend(record.writer.iter().cloned());
            out.extend_from_slice(&record.readers);
        }
    }
}
