//! Thread-safe accumulators shared by concurrent branches of a run
//!
//! These are the only pieces of mutable state shared across deck and note
//! workers. Each wraps a container in a mutex and only ever appends.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::error::Failures;
use crate::{Error, Result};

/// Append-only collection filled from several threads
#[derive(Debug)]
pub struct Accumulator<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Accumulator<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects errors from independent branches without stopping any of them
#[derive(Debug, Default)]
pub struct FailureCollector {
    errors: Accumulator<Error>,
}

impl FailureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: Error) {
        self.errors.push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` if nothing was recorded, otherwise one composite error holding every cause
    pub fn into_result(self) -> Result<()> {
        let errors = self.errors.into_inner();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Multiple(Failures::new(errors)))
        }
    }
}

/// Deck names seen so far in a run, used to flag duplicate declarations
#[derive(Debug, Default)]
pub struct DeckRegistry {
    seen: Mutex<HashSet<String>>,
}

impl DeckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` and returns `true` if it had already been seen
    pub fn observe(&self, name: &str) -> bool {
        !self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }
}
