//! Allocation accounting for a global context.
//!
//! Objects themselves live in `Rc` cells; the heap only tracks how many bytes
//! the context's live objects use so that a host can cap a root scope.
//! Exceeding the cap raises a `RangeError`, which is how native-type boxing
//! fails. The context gives bytes back once the objects it charged are dropped.

use crate::runner::ds::error::JErrorType;

/// Nominal size charged for every object the engine creates.
pub const OBJECT_COST: usize = 64;

/// Configuration for the heap manager.
#[derive(Debug, Clone, Default)]
pub struct HeapConfig {
    /// Maximum heap size in bytes. None means unlimited.
    pub max_bytes: Option<usize>,
}

impl HeapConfig {
    pub fn unlimited() -> Self {
        HeapConfig { max_bytes: None }
    }

    pub fn with_limit(max_bytes: usize) -> Self {
        HeapConfig {
            max_bytes: Some(max_bytes),
        }
    }
}

#[derive(Debug, Default)]
pub struct Heap {
    config: HeapConfig,
    allocated_bytes: usize,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            config,
            allocated_bytes: 0,
        }
    }

    /// Returns an error if the allocation would exceed the memory limit.
    pub fn allocate(&mut self, bytes: usize) -> Result<(), JErrorType> {
        if !self.can_allocate(bytes) {
            return Err(JErrorType::RangeError("Out of memory".to_string()));
        }
        self.allocated_bytes += bytes;
        Ok(())
    }

    /// Charges `count` objects at once; either all of them fit or none is charged.
    pub fn allocate_objects(&mut self, count: usize) -> Result<(), JErrorType> {
        self.allocate(count * OBJECT_COST)
    }

    pub fn deallocate(&mut self, bytes: usize) {
        self.allocated_bytes = self.allocated_bytes.saturating_sub(bytes);
    }

    pub fn deallocate_objects(&mut self, count: usize) {
        self.deallocate(count * OBJECT_COST)
    }

    pub fn get_allocated(&self) -> usize {
        self.allocated_bytes
    }

    pub fn can_allocate(&self, bytes: usize) -> bool {
        match self.config.max_bytes {
            Some(max_bytes) => self.allocated_bytes + bytes <= max_bytes,
            None => true,
        }
    }

    pub fn available_bytes(&self) -> Option<usize> {
        self.config
            .max_bytes
            .map(|max| max.saturating_sub(self.allocated_bytes))
    }
}
