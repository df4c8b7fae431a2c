//! # Scratch Dependency Buffer
//!
//! A handle list that is cleared and refilled on every call instead of being
//! allocated per call.

/// Reusable list of work handles.
///
/// Only the coordinator holds one, and it never hands out the list beyond
/// the call that filled it.
///
/// # Example
///
/// ```rust,ignore
/// let mut scratch: ScratchBuffer<JobHandle> = ScratchBuffer::new(64);
///
/// let deps = scratch.begin();
/// registrar.collect_dependencies(&access, deps);
/// let combined = jobs.combine(scratch.finish());
/// ```
#[derive(Debug)]
pub struct ScratchBuffer<H> {
    /// The backing list. Length is meaningless between calls.
    items: Vec<H>,
    /// Largest number of handles held by a single call.
    high_water: usize,
}

impl<H> ScratchBuffer<H> {
    /// Creates a buffer with room for `capacity` handles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            high_water: 0,
        }
    }

    /// Clears the buffer and returns it for filling.
    ///
    /// Capacity is kept, so refilling to a previous size does not allocate.
    #[inline]
    pub fn begin(&mut self) -> &mut Vec<H> {
        self.items.clear();
        &mut self.items
    }

    /// Ends a fill and returns what was collected.
    #[inline]
    pub fn finish(&mut self) -> &[H] {
        self.high_water = self.high_water.max(self.items.len());
        &self.items
    }

    /// Drops every held handle without releasing capacity.
    ///
    /// Called after each use so the buffer does not keep finished work alive.
    #[inline]
    pub fn release(&mut self) {
        self.items.clear();
    }

    /// Current allocated capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Largest number of handles a single call has collected.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_clears_previous_contents() {
        let mut scratch = ScratchBuffer::new(4);
        scratch.begin().extend([1, 2, 3]);
        assert_eq!(scratch.finish(), &[1, 2, 3]);

        scratch.begin().push(9);
        assert_eq!(scratch.finish(), &[9]);
        assert_eq!(scratch.high_water(), 3);
    }

    #[test]
    fn test_release_keeps_capacity() {
        let mut scratch = ScratchBuffer::new(2);
        scratch.begin().extend(0..32);
        let _ = scratch.finish();
        let grown = scratch.capacity();

        scratch.release();
        assert!(scratch.capacity() >= grown);
        assert!(scratch.begin().is_empty());
    }
}
