// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A fixed-capacity min-heap
//!
//! The removal pass keeps one of these per row, holding the columns
//! that seams pass through in that row.  The storage is allocated
//! exactly once, sized to the number of seams being removed, and never
//! grows: pushing past capacity is an error, not a reallocation.

use crate::error::{CarveError, Result};

/// A classic binary min-heap over a dense array.  Slot 0 is unused so
/// the root lives at 1 and the children of `k` are `2k` and `2k + 1`.
#[derive(Debug, Clone, Default)]
pub struct FixedMinHeap<T: Ord + Copy + Default> {
    heap: Vec<T>,
    len: usize,
}

impl<T: Ord + Copy + Default> FixedMinHeap<T> {
    /// An empty heap with no storage.  It must be `allocate`d before
    /// anything can be pushed.
    pub fn new() -> Self {
        FixedMinHeap {
            heap: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut heap = Self::new();
        heap.allocate(capacity)?;
        Ok(heap)
    }

    /// Reserve storage for up to `capacity` elements.
    pub fn allocate(&mut self, capacity: usize) -> Result<()> {
        if !self.heap.is_empty() {
            return Err(CarveError::QueueAlreadyAllocated {
                capacity: self.capacity(),
            });
        }
        if capacity == 0 {
            return Err(CarveError::ZeroCapacity);
        }
        self.heap = vec![T::default(); capacity + 1];
        self.len = 0;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.heap.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forget every element but keep the storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn push(&mut self, element: T) -> Result<()> {
        if self.len >= self.capacity() {
            return Err(CarveError::QueueCapacityExceeded {
                capacity: self.capacity(),
            });
        }
        self.len += 1;
        self.heap[self.len] = element;
        self.swim(self.len);
        Ok(())
    }

    pub fn peek_min(&self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.heap[1])
        }
    }

    pub fn pop_min(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(CarveError::QueueEmpty);
        }
        let min = self.heap[1];
        self.heap.swap(1, self.len);
        self.len -= 1;
        self.sink(1);
        Ok(min)
    }

    // Promote element k while it is smaller than its parent.
    fn swim(&mut self, mut k: usize) {
        while k > 1 && self.heap[k] < self.heap[k / 2] {
            self.heap.swap(k, k / 2);
            k /= 2;
        }
    }

    // Demote element k while it is larger than its smaller child.
    fn sink(&mut self, mut k: usize) {
        while 2 * k <= self.len {
            let mut j = 2 * k;
            if j < self.len && self.heap[j + 1] < self.heap[j] {
                j += 1;
            }
            if self.heap[k] <= self.heap[j] {
                break;
            }
            self.heap.swap(k, j);
            k = j;
        }
    }
}
