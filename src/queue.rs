//! Decrease-key min-priority queue over `(priority, element)` pairs.
//!
//! Built on [`std::collections::BinaryHeap`] with lazy deletion: updating or
//! removing an element never touches the heap, it only invalidates the
//! element's current entry; stale entries are skipped when they surface.
//! Elements are unique, and ties between equal priorities are broken by the
//! element's insertion sequence number. A reprioritized element keeps its
//! original sequence number, so tie order is stable across decrease-key
//! operations. This stability is what makes the shortest-hypertree output
//! reproducible.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::hash::Hash;

use ahash::AHashMap;

struct Entry<T> {
    priority: f64,
    seq: u64,
    element: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority).is_eq() && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-priority queue with unique elements and lazy decrease-key.
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    // element -> (priority bits, seq) of its single live entry
    live: AHashMap<T, (u64, u64)>,
    counter: u64,
}

impl<T: Clone + Eq + Hash> PriorityQueue<T> {
    pub fn new() -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            live: AHashMap::new(),
            counter: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.live.contains_key(element)
    }

    /// Inserts an element with the given priority.
    ///
    /// The element must not already be in the queue; use [`reprioritize`] to
    /// change the priority of a present element.
    ///
    /// [`reprioritize`]: PriorityQueue::reprioritize
    pub fn push(&mut self, priority: f64, element: T) {
        debug_assert!(!self.contains(&element), "element already queued");
        self.counter += 1;
        let seq = self.counter;
        self.live
            .insert(element.clone(), (priority.to_bits(), seq));
        self.heap.push(Reverse(Entry {
            priority,
            seq,
            element,
        }));
    }

    /// Updates the priority of a queued element, keeping its original
    /// sequence number. Returns false if the element is not queued.
    pub fn reprioritize(&mut self, priority: f64, element: T) -> bool {
        let Some(slot) = self.live.get_mut(&element) else {
            return false;
        };
        let seq = slot.1;
        slot.0 = priority.to_bits();
        self.heap.push(Reverse(Entry {
            priority,
            seq,
            element,
        }));
        true
    }

    /// Lazily removes an element. Returns false if it is not queued.
    pub fn remove(&mut self, element: &T) -> bool {
        self.live.remove(element).is_some()
    }

    /// Pops the element with the smallest priority.
    pub fn pop(&mut self) -> Option<(f64, T)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            match self.live.get(&entry.element) {
                Some(&(bits, seq)) if bits == entry.priority.to_bits() && seq == entry.seq => {
                    self.live.remove(&entry.element);
                    return Some((entry.priority, entry.element));
                }
                // Stale entry from a reprioritize or remove; skip it.
                _ => {}
            }
        }
        None
    }

    /// The element with the smallest priority, without popping it.
    pub fn peek(&mut self) -> Option<(f64, &T)> {
        loop {
            let stale = match self.heap.peek() {
                None => return None,
                Some(Reverse(entry)) => !matches!(
                    self.live.get(&entry.element),
                    Some(&(bits, seq)) if bits == entry.priority.to_bits() && seq == entry.seq
                ),
            };
            if stale {
                self.heap.pop();
            } else {
                break;
            }
        }
        self.heap
            .peek()
            .map(|Reverse(entry)| (entry.priority, &entry.element))
    }
}

impl<T: Clone + Eq + Hash> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::PriorityQueue;

    #[test]
    fn pops_in_priority_order() {
        let mut q = PriorityQueue::new();
        q.push(3.0, "c");
        q.push(1.0, "a");
        q.push(2.0, "b");
        assert_eq!(q.pop(), Some((1.0, "a")));
        assert_eq!(q.pop(), Some((2.0, "b")));
        assert_eq!(q.pop(), Some((3.0, "c")));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let mut q = PriorityQueue::new();
        q.push(1.0, "x");
        q.push(1.0, "y");
        q.push(1.0, "z");
        assert_eq!(q.pop(), Some((1.0, "x")));
        assert_eq!(q.pop(), Some((1.0, "y")));
        assert_eq!(q.pop(), Some((1.0, "z")));
    }

    #[test]
    fn reprioritize_keeps_original_sequence() {
        let mut q = PriorityQueue::new();
        q.push(5.0, "early");
        q.push(5.0, "late");
        // "late" is lowered to tie with "early"; "early" still wins the tie
        // because sequence numbers survive reprioritization.
        assert!(q.reprioritize(5.0, "late"));
        q.push(9.0, "tail");
        assert!(q.reprioritize(5.0, "early"));
        assert_eq!(q.pop(), Some((5.0, "early")));
        assert_eq!(q.pop(), Some((5.0, "late")));
        assert_eq!(q.pop(), Some((9.0, "tail")));
    }

    #[test]
    fn decrease_key_moves_element_up() {
        let mut q = PriorityQueue::new();
        q.push(10.0, "far");
        q.push(4.0, "near");
        assert!(q.reprioritize(1.0, "far"));
        assert_eq!(q.pop(), Some((1.0, "far")));
        assert_eq!(q.pop(), Some((4.0, "near")));
    }

    #[test]
    fn remove_is_lazy_but_effective() {
        let mut q = PriorityQueue::new();
        q.push(1.0, "gone");
        q.push(2.0, "kept");
        assert!(q.remove(&"gone"));
        assert!(!q.remove(&"gone"));
        assert!(!q.contains(&"gone"));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), Some((2.0, "kept")));
        assert!(q.is_empty());
    }

    #[test]
    fn peek_skips_stale_entries() {
        let mut q = PriorityQueue::new();
        q.push(1.0, "a");
        q.push(2.0, "b");
        q.remove(&"a");
        assert_eq!(q.peek(), Some((2.0, &"b")));
        assert_eq!(q.pop(), Some((2.0, "b")));
        assert_eq!(q.peek(), None);
    }

    #[test]
    fn missing_element_cannot_be_reprioritized() {
        let mut q: PriorityQueue<&str> = PriorityQueue::new();
        assert!(!q.reprioritize(1.0, "ghost"));
    }
}
