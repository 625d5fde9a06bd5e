//! The persistence boundary trait.

use crate::{Criteria, Resource, RestResult, Value};

/// One page of search results plus the unpaged total.
pub struct SearchPage {
    /// The resources on the requested page.
    pub items: Vec<Box<dyn Resource>>,
    /// The total number of matching resources across all pages.
    pub total: u64,
}

/// The external persistence collaborator.
///
/// The core never touches storage directly: every load, search, and
/// mutation goes through this trait. Calls are synchronous; any async
/// host wraps the dispatcher, not this trait.
pub trait ResourceStore: Send + Sync {
    /// Finds a resource by primary key, honoring the criteria's embed
    /// set and scopes. Returns `Ok(None)` when no such resource exists.
    fn find_by_primary_key(
        &self,
        type_name: &str,
        pk: &Value,
        criteria: &Criteria,
    ) -> RestResult<Option<Box<dyn Resource>>>;

    /// Searches a resource collection, applying query text, filters,
    /// scopes, and paging from the criteria.
    fn search(&self, type_name: &str, criteria: &Criteria) -> RestResult<SearchPage>;

    /// Instantiates a new, unsaved resource of the given type. The
    /// scenario names the intent (`create`, `replace`, ...) for stores
    /// that vary defaults or validation by scenario.
    fn instantiate(&self, type_name: &str, scenario: &str) -> RestResult<Box<dyn Resource>>;

    /// Validates and saves a resource. Returns `Ok(false)` when
    /// validation failed; the errors are recorded on the resource.
    fn save(&self, resource: &mut dyn Resource) -> RestResult<bool>;

    /// Deletes a resource. Returns `Ok(false)` when validation blocked
    /// the delete; the errors are recorded on the resource.
    fn delete(&self, resource: &mut dyn Resource) -> RestResult<bool>;

    /// Computes statistics for a single resource.
    fn stats(&self, resource: &dyn Resource) -> RestResult<Value>;

    /// Computes aggregate statistics for a resource collection.
    fn aggregate(&self, type_name: &str) -> RestResult<Value>;
}
