//! Identifier generation for palettes and session-local color ids.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces identifiers suitable for use as map keys.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs, the production generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix><n>` identifiers for tests and reproducible output.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, value)
    }
}
