//! Time-ordered id sources.
//!
//! The engine never calls a global id function: an [`IdGenerator`] is handed
//! to [`EngineBuilder`](crate::EngineBuilder) so tests can pin the sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of unique ids whose string form sorts in creation order.
pub trait IdGenerator: Send + Sync + std::fmt::Debug {
    fn next_id(&self) -> Uuid;
}

/// Default generator backed by UUIDv7 (millisecond timestamp + randomness).
#[derive(Debug, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

/// Deterministic generator: `00000000-0000-0000-0000-000000000001`, `…02`, …
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.saturating_sub(1)),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Uuid {
        let value = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_sort_as_strings() {
        let ids = SequentialIdGenerator::default();
        let a = ids.next_id().to_string();
        let b = ids.next_id().to_string();
        assert_eq!(a, "00000000-0000-0000-0000-000000000001");
        assert!(a < b);
    }

    #[test]
    fn v7_ids_are_monotonic_as_strings() {
        let ids = UuidV7Generator;
        let a = ids.next_id().to_string();
        let b = ids.next_id().to_string();
        assert!(a < b);
    }
}
