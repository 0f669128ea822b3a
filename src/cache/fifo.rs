//! FIFO Queue Module
//!
//! Insertion-order tracking for oldest-first eviction.

use std::collections::VecDeque;

// == FIFO Queue ==
/// Tracks insertion order of cache keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest inserted
/// - Back = Newest inserted
///
/// Reads never reorder. Re-inserting a key moves it to the back.
#[derive(Debug, Default)]
pub struct FifoQueue {
    order: VecDeque<String>,
}

impl FifoQueue {
    // == Constructor ==
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records `key` as the newest insertion, dropping any earlier position.
    pub fn push(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the queue.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest inserted key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    /// Returns the oldest inserted key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_new() {
        let fifo = FifoQueue::new();
        assert!(fifo.is_empty());
        assert_eq!(fifo.peek_oldest(), None);
    }

    #[test]
    fn test_fifo_push_keeps_insertion_order() {
        let mut fifo = FifoQueue::new();

        fifo.push("key1");
        fifo.push("key2");
        fifo.push("key3");

        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.peek_oldest(), Some(&"key1".to_string()));
        let keys: Vec<&String> = fifo.iter().collect();
        assert_eq!(keys, ["key1", "key2", "key3"]);
    }

    #[test]
    fn test_fifo_repush_moves_to_newest() {
        let mut fifo = FifoQueue::new();

        fifo.push("a");
        fifo.push("b");
        fifo.push("c");
        fifo.push("a");

        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.pop_oldest(), Some("b".to_string()));
        assert_eq!(fifo.pop_oldest(), Some("c".to_string()));
        assert_eq!(fifo.pop_oldest(), Some("a".to_string()));
        assert_eq!(fifo.pop_oldest(), None);
    }

    #[test]
    fn test_fifo_remove() {
        let mut fifo = FifoQueue::new();

        fifo.push("key1");
        fifo.push("key2");
        fifo.push("key3");
        fifo.remove("key2");
        fifo.remove("nonexistent");

        assert_eq!(fifo.len(), 2);
        assert!(!fifo.contains("key2"));
        assert!(fifo.contains("key1"));
        assert!(fifo.contains("key3"));
    }

    #[test]
    fn test_fifo_clear() {
        let mut fifo = FifoQueue::new();
        fifo.push("x");
        fifo.push("y");
        fifo.clear();
        assert!(fifo.is_empty());
    }
}
