//! In-memory ordered snapshot of entities last fetched from the backend.
//!
//! # Design
//! Entries live in a `Vec` so table order is exactly the order the server
//! listed them in, and `replace` keeps an edited row where it was. Keys are
//! unique within the snapshot; every mutation checks that before touching it.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Anything the store can hold: a value with a stable key.
pub trait Entity {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display;

    fn id(&self) -> Self::Id;
}

/// Store misuse. Correct callers never see these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("an entity with id {0} is already stored")]
    DuplicateKey(String),

    #[error("no entity with id {0} is stored")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct EntityStore<T: Entity> {
    entries: Vec<T>,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `entities` as the snapshot, in input order.
    ///
    /// A sequence with a repeated key is rejected and the previous snapshot
    /// stays in place.
    pub fn replace_all(&mut self, entities: Vec<T>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.id()) {
                return Err(StoreError::DuplicateKey(entity.id().to_string()));
            }
        }
        self.entries = entities;
        Ok(())
    }

    /// Append a new entity.
    pub fn insert(&mut self, entity: T) -> Result<(), StoreError> {
        if self.position(entity.id()).is_some() {
            return Err(StoreError::DuplicateKey(entity.id().to_string()));
        }
        self.entries.push(entity);
        Ok(())
    }

    /// Swap in `entity` at the position of the stored entity with the same key.
    pub fn replace(&mut self, entity: T) -> Result<(), StoreError> {
        let index = self
            .position(entity.id())
            .ok_or_else(|| StoreError::NotFound(entity.id().to_string()))?;
        self.entries[index] = entity;
        Ok(())
    }

    /// Remove the entity with `id`. Absent keys are not an error, so a
    /// repeated delete confirmation is harmless.
    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        self.position(id).map(|index| self.entries.remove(index))
    }

    pub fn all(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.iter().find(|entity| entity.id() == id)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: T::Id) -> Option<usize> {
        self.entries.iter().position(|entity| entity.id() == id)
    }
}
