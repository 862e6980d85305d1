use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::Result;
use crate::primitives::ShapeKind;

/// Per-shape resources created on first use and kept for the registry's lifetime.
///
/// Backends keep one of these instead of building every shape up front; a
/// demo that never draws the "F" never uploads it. Initialization runs at most
/// once per kind. A failed initializer stores nothing, so the next request
/// tries again.
#[derive(Debug)]
pub struct ShapeRegistry<R> {
    resources: HashMap<ShapeKind, R>,
}

impl<R> Default for ShapeRegistry<R> {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }
}

impl<R> ShapeRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resource for `kind`, creating it with `init` if needed.
    pub fn get_or_init(
        &mut self,
        kind: ShapeKind,
        init: impl FnOnce(ShapeKind) -> Result<R>,
    ) -> Result<&R> {
        match self.resources.entry(kind) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let resource = init(kind)?;
                log::debug!("initialized {} resources", kind.label());
                Ok(entry.insert(resource))
            }
        }
    }

    pub fn get(&self, kind: ShapeKind) -> Option<&R> {
        self.resources.get(&kind)
    }

    pub fn is_initialized(&self, kind: ShapeKind) -> bool {
        self.resources.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
