//! Schema registry collaborator and descriptor caching.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{ResourceDescriptor, RestResult};

/// Supplies a [`ResourceDescriptor`] per type name, on demand.
pub trait SchemaRegistry: Send + Sync {
    /// Returns the descriptor for the given type name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RestError::NotFound`] for unknown type names.
    fn descriptor(&self, type_name: &str) -> RestResult<Arc<ResourceDescriptor>>;
}

/// A load-once caching wrapper around another registry.
///
/// Descriptors are built once per resource type and read-only afterwards,
/// so the cache only ever grows. Safe for concurrent lazy initialization:
/// two racing lookups may both build the descriptor, but the cache settles
/// on one and both callers get a valid value.
pub struct CachedRegistry<R> {
    inner: R,
    cache: RwLock<HashMap<String, Arc<ResourceDescriptor>>>,
}

impl<R: SchemaRegistry> CachedRegistry<R> {
    /// Wraps a registry with a descriptor cache.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of cached descriptors.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl<R: SchemaRegistry> SchemaRegistry for CachedRegistry<R> {
    fn descriptor(&self, type_name: &str) -> RestResult<Arc<ResourceDescriptor>> {
        if let Some(descriptor) = self.cache.read().get(type_name) {
            return Ok(Arc::clone(descriptor));
        }
        let descriptor = self.inner.descriptor(type_name)?;
        self.cache
            .write()
            .entry(type_name.to_string())
            .or_insert_with(|| Arc::clone(&descriptor));
        Ok(descriptor)
    }
}
