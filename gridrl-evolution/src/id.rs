use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Source of monotonically increasing genome ids.
///
/// Clones share the same counter, so ids handed out by any of them are
/// never reused. Independent allocators give independent sequences.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator(Arc<AtomicU64>);

impl IdAllocator {
    /// Allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shared_counter() {
        let a = IdAllocator::new();
        let b = a.clone();
        assert_eq!(a.next_id(), 0);
        assert_eq!(b.next_id(), 1);
        assert_eq!(a.next_id(), 2);
        assert_eq!(IdAllocator::new().next_id(), 0);
        assert_eq!(b.allocated(), 3);
    }
}
