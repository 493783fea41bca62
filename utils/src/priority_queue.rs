//! A binary heap ordered by a comparator supplied at construction.
//!
//! [PriorityQueue] stores items in a contiguous, 0-indexed buffer laid out as a complete binary
//! tree: the children of slot `i` live at `2i + 1` and `2i + 2`. The root is always the item that
//! compares lowest under the comparator (a comparator returning [Ordering::Less] for `(a, b)` means
//! `a` must sit above `b`).
//!
//! # Capacity
//!
//! The queue tracks a logical capacity separately from the backing [Vec]. When a push finds the
//! queue full, the capacity doubles (minimum 1) and the buffer is grown with
//! [Vec::try_reserve_exact], so allocation failure surfaces as [Error::Allocation] instead of
//! aborting. Capacity never shrinks, not even when the queue drains.
//!
//! # Handles
//!
//! The queue never inspects what an item refers to. Callers that need to route owned records
//! through several queues should store small `Copy` handles (an index or an id plus whatever key the
//! comparator needs) rather than the records themselves.
//!
//! # Example
//!
//! ```rust
//! use postal_utils::PriorityQueue;
//!
//! let mut queue = PriorityQueue::new(2, |a: &u32, b: &u32| a.cmp(b)).unwrap();
//! queue.push(5).unwrap();
//! queue.push(3).unwrap();
//! queue.push(8).unwrap();
//! assert_eq!(queue.capacity(), 4);
//! assert_eq!(queue.pop().unwrap(), 3);
//! assert_eq!(*queue.peek().unwrap(), 5);
//! ```

use std::cmp::Ordering;
use thiserror::Error;

/// Orders two items. [Ordering::Less] means the first item belongs closer to the root.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Errors that can occur when interacting with a [PriorityQueue].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("capacity must be greater than zero")]
    InvalidCapacity,
    #[error("failed to grow backing storage")]
    Allocation,
    #[error("queue is empty")]
    Empty,
    #[error("no matching item")]
    NotFound,
}

/// A min-ordered binary heap over a caller-supplied [Comparator].
#[derive(Clone)]
pub struct PriorityQueue<T> {
    data: Vec<T>,
    capacity: usize,
    cmp: Comparator<T>,
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue that can hold `capacity` items before growing.
    pub fn new(capacity: usize, cmp: Comparator<T>) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation)?;
        Ok(Self {
            data,
            capacity,
            cmp,
        })
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical capacity (grows by doubling, never shrinks).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items in storage (heap layout) order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Return the root without removing it.
    pub fn peek(&self) -> Result<&T, Error> {
        self.data.first().ok_or(Error::Empty)
    }

    /// Ensure there is room for `additional` more items without reallocating during a push.
    ///
    /// Follows the same doubling policy as [Self::push], so a successful reservation followed by
    /// `additional` pushes never fails.
    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        let needed = self.data.len() + additional;
        let mut capacity = self.capacity;
        while capacity < needed {
            capacity = capacity.saturating_mul(2).max(1);
        }
        self.grow_to(capacity)
    }

    /// Insert an item, doubling capacity first if the queue is full.
    ///
    /// On [Error::Allocation] the queue is left exactly as it was.
    pub fn push(&mut self, item: T) -> Result<(), Error> {
        if self.data.len() >= self.capacity {
            let capacity = self.capacity.saturating_mul(2).max(1);
            self.grow_to(capacity)?;
        }
        self.data.push(item);
        self.sift_up(self.data.len() - 1);
        Ok(())
    }

    /// Remove and return the root.
    pub fn pop(&mut self) -> Result<T, Error> {
        if self.data.is_empty() {
            return Err(Error::Empty);
        }
        let item = self.data.swap_remove(0);
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        Ok(item)
    }

    /// Replace the contents with `items` and restore heap order bottom-up in O(n).
    ///
    /// Capacity is raised to `items.len()` if it is smaller. On [Error::Allocation] the queue
    /// is left exactly as it was.
    pub fn build(&mut self, items: Vec<T>) -> Result<(), Error> {
        let n = items.len();
        if n > self.capacity {
            self.grow_to(n)?;
        }
        self.data.clear();
        self.data.extend(items);
        for index in (0..n / 2).rev() {
            self.sift_down(index);
        }
        Ok(())
    }

    /// Remove the first item (in storage order) that compares equal to `target` under `cmp`.
    ///
    /// Two distinct items that compare equal are indistinguishable here. Use
    /// [Self::remove_where] when identity matters.
    pub fn remove_match(&mut self, target: &T, cmp: Comparator<T>) -> Result<T, Error> {
        self.remove_where(|item| cmp(item, target) == Ordering::Equal)
    }

    /// Remove the first item (in storage order) satisfying `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Result<T, Error> {
        let index = self
            .data
            .iter()
            .position(|item| predicate(item))
            .ok_or(Error::NotFound)?;
        let item = self.data.swap_remove(index);

        // The replacement may belong above its new parent or below its new children
        if index < self.data.len() {
            self.sift_down(index);
            self.sift_up(index);
        }
        Ok(item)
    }

    /// Compare two queues slot by slot in storage order.
    ///
    /// This is a layout comparison, not a multiset comparison: two queues holding the same items
    /// in different (but valid) heap layouts compare unequal.
    pub fn equals(&self, other: &Self, cmp: Comparator<T>) -> bool {
        if self.data.len() != other.data.len() {
            return false;
        }
        self.data
            .iter()
            .zip(other.data.iter())
            .all(|(a, b)| cmp(a, b) == Ordering::Equal)
    }

    fn grow_to(&mut self, capacity: usize) -> Result<(), Error> {
        if capacity <= self.capacity {
            return Ok(());
        }
        let additional = capacity.saturating_sub(self.data.len());
        self.data
            .try_reserve_exact(additional)
            .map_err(|_| Error::Allocation)?;
        self.capacity = capacity;
        Ok(())
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.cmp)(&self.data[index], &self.data[parent]) != Ordering::Less {
                break;
            }
            self.data.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.data.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            // The right child only wins when strictly below the left one
            if left < len && (self.cmp)(&self.data[left], &self.data[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && (self.cmp)(&self.data[right], &self.data[smallest]) == Ordering::Less
            {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.data.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("data", &self.data)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ascending(a: &u32, b: &u32) -> Ordering {
        a.cmp(b)
    }

    fn assert_heap(queue: &PriorityQueue<u32>) {
        let data: Vec<_> = queue.iter().copied().collect();
        for i in 0..data.len() {
            for child in [2 * i + 1, 2 * i + 2] {
                if child < data.len() {
                    assert!(data[i] <= data[child], "heap violated at {i}: {data:?}");
                }
            }
        }
    }

    fn drain(queue: &mut PriorityQueue<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Ok(item) = queue.pop() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        assert_eq!(
            PriorityQueue::new(0, ascending).unwrap_err(),
            Error::InvalidCapacity
        );
    }

    #[test]
    fn test_empty() {
        let mut queue = PriorityQueue::new(5, ascending).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.peek().unwrap_err(), Error::Empty);
        assert_eq!(queue.pop().unwrap_err(), Error::Empty);
    }

    #[test]
    fn test_push_pop() {
        let mut queue = PriorityQueue::new(10, ascending).unwrap();
        for value in [5, 3, 8, 1, 9] {
            queue.push(value).unwrap();
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(*queue.peek().unwrap(), 1);
        assert_eq!(queue.pop().unwrap(), 1);
        assert_eq!(queue.pop().unwrap(), 3);
        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&mut queue), vec![5, 8, 9]);
    }

    #[test]
    fn test_build() {
        let mut queue = PriorityQueue::new(1, ascending).unwrap();
        queue.build(vec![5, 3, 8, 1, 9]).unwrap();
        assert_eq!(queue.capacity(), 5);
        assert_heap(&queue);
        assert_eq!(drain(&mut queue), vec![1, 3, 5, 8, 9]);
    }

    #[test]
    fn test_build_replaces_contents() {
        let mut queue = PriorityQueue::new(8, ascending).unwrap();
        queue.push(42).unwrap();
        queue.build(vec![7, 2]).unwrap();
        assert_eq!(queue.capacity(), 8);
        assert_eq!(drain(&mut queue), vec![2, 7]);
    }

    #[test]
    fn test_capacity_doubles_and_never_shrinks() {
        let mut queue = PriorityQueue::new(1, ascending).unwrap();
        queue.push(1).unwrap();
        assert_eq!(queue.capacity(), 1);
        queue.push(2).unwrap();
        assert_eq!(queue.capacity(), 2);
        queue.push(3).unwrap();
        assert_eq!(queue.capacity(), 4);
        queue.push(4).unwrap();
        queue.push(5).unwrap();
        assert_eq!(queue.capacity(), 8);

        drain(&mut queue);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 8);
    }

    #[test]
    fn test_reserve() {
        let mut queue = PriorityQueue::new(3, ascending).unwrap();
        queue.reserve(2).unwrap();
        assert_eq!(queue.capacity(), 3);
        queue.reserve(4).unwrap();
        assert_eq!(queue.capacity(), 6);
    }

    #[test]
    fn test_ties_prefer_left_child() {
        // Only the first element of each pair participates in ordering
        fn by_key(a: &(u32, char), b: &(u32, char)) -> Ordering {
            a.0.cmp(&b.0)
        }
        let mut queue = PriorityQueue::new(4, by_key).unwrap();
        queue.build(vec![(9, 'r'), (1, 'a'), (1, 'b')]).unwrap();
        assert_eq!(queue.pop().unwrap(), (1, 'a'));
        assert_eq!(queue.pop().unwrap(), (1, 'b'));
        assert_eq!(queue.pop().unwrap(), (9, 'r'));
    }

    #[test]
    fn test_remove_match() {
        let mut queue = PriorityQueue::new(4, ascending).unwrap();
        queue.build(vec![1, 4, 2, 7, 8, 3]).unwrap();
        assert_eq!(queue.remove_match(&7, ascending).unwrap(), 7);
        assert_heap(&queue);
        assert_eq!(
            queue.remove_match(&100, ascending).unwrap_err(),
            Error::NotFound
        );
        assert_eq!(drain(&mut queue), vec![1, 2, 3, 4, 8]);
    }

    #[test]
    fn test_remove_requires_sift_up() {
        let mut queue = PriorityQueue::new(8, ascending).unwrap();
        queue.build(vec![1, 10, 2, 11, 12, 3, 4]).unwrap();
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 10, 2, 11, 12, 3, 4]);

        // The last leaf (4) lands under 10 and must climb above it
        queue.remove_where(|v| *v == 11).unwrap();
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 4, 2, 10, 12, 3]);
        assert_heap(&queue);
        assert_eq!(drain(&mut queue), vec![1, 2, 3, 4, 10, 12]);
    }

    #[test]
    fn test_remove_where_by_identity() {
        fn by_priority(a: &(u32, u64), b: &(u32, u64)) -> Ordering {
            b.0.cmp(&a.0)
        }
        let mut queue = PriorityQueue::new(4, by_priority).unwrap();
        queue.push((3, 1)).unwrap();
        queue.push((3, 2)).unwrap();
        queue.push((5, 3)).unwrap();

        // Value matching would take whichever priority-3 item comes first
        let removed = queue.remove_where(|(_, id)| *id == 2).unwrap();
        assert_eq!(removed, (3, 2));
        assert_eq!(queue.pop().unwrap(), (5, 3));
        assert_eq!(queue.pop().unwrap(), (3, 1));
    }

    #[test]
    fn test_equals_is_layout_sensitive() {
        let mut a = PriorityQueue::new(4, ascending).unwrap();
        let mut b = PriorityQueue::new(4, ascending).unwrap();
        a.build(vec![1, 2, 3]).unwrap();
        b.build(vec![1, 2, 3]).unwrap();
        assert!(a.equals(&b, ascending));

        // Same items, different valid layout
        b.build(vec![1, 3, 2]).unwrap();
        assert_heap(&b);
        assert!(!a.equals(&b, ascending));

        b.pop().unwrap();
        assert!(!a.equals(&b, ascending));
    }

    #[test]
    fn test_random_operations() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut queue = PriorityQueue::new(1, ascending).unwrap();
        let mut shadow: Vec<u32> = Vec::new();
        for _ in 0..2_000 {
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let value = rng.gen_range(0..100);
                    queue.push(value).unwrap();
                    shadow.push(value);
                }
                2 => {
                    let popped = queue.pop().ok();
                    shadow.sort_unstable();
                    let expected = if shadow.is_empty() {
                        None
                    } else {
                        Some(shadow.remove(0))
                    };
                    assert_eq!(popped, expected);
                }
                _ => {
                    let value = rng.gen_range(0..100);
                    let removed = queue.remove_match(&value, ascending).ok();
                    match shadow.iter().position(|v| *v == value) {
                        Some(index) => {
                            shadow.swap_remove(index);
                            assert_eq!(removed, Some(value));
                        }
                        None => assert_eq!(removed, None),
                    }
                }
            }
            assert_eq!(queue.len(), shadow.len());
            assert!(queue.len() <= queue.capacity());
            if let Ok(root) = queue.peek() {
                assert!(shadow.iter().all(|v| root <= v));
            }
            assert_heap(&queue);
        }
    }
}
