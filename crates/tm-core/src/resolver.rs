//! Dependency discovery via a per-visit name resolver.
//!
//! The dependency graph is never declared upfront: it emerges from executing
//! a model's SQL closure against a `NameResolver`. Every `model()` call both
//! resolves the dependency's table name (for embedding into the SQL text)
//! and records the dependency. One resolver is created per model visit and
//! discarded as soon as the closure returns.

use crate::error::{CoreError, CoreResult};
use crate::model::ModelRef;
use crate::table_name::{NameResolution, TableFullName};
use std::cell::RefCell;
use std::sync::Arc;

/// Recorder passed into a model's SQL closure.
///
/// SQL closures return plain `String`, so a name-resolution failure inside
/// the closure cannot be propagated at the call site. The resolver keeps the
/// first such error and [`finish`](Self::finish) surfaces it once discovery
/// completes; the SQL produced by a failed discovery is discarded.
pub struct NameResolver<'a> {
    rules: &'a NameResolution,
    self_name: TableFullName,
    recorded: RefCell<Vec<ModelRef>>,
    deferred: RefCell<Option<CoreError>>,
}

impl<'a> NameResolver<'a> {
    /// Create a resolver for one model visit. `self_name` is the visited
    /// model's already-resolved table name.
    pub fn new(rules: &'a NameResolution, self_name: TableFullName) -> Self {
        Self {
            rules,
            self_name,
            recorded: RefCell::new(Vec::new()),
            deferred: RefCell::new(None),
        }
    }

    /// The visited model's own fully-resolved name.
    pub fn self_name(&self) -> &TableFullName {
        &self.self_name
    }

    /// Record `dependency` as a dependency of the visited model and return
    /// its resolved name for embedding into SQL text.
    ///
    /// Registration order is preserved and duplicates are recorded as-is;
    /// deduplication happens later via per-run memoization.
    pub fn model(&self, dependency: &ModelRef) -> TableFullName {
        match self.rules.resolve(dependency.name()) {
            Ok(name) => {
                self.recorded.borrow_mut().push(Arc::clone(dependency));
                name
            }
            Err(err) => {
                let mut deferred = self.deferred.borrow_mut();
                if deferred.is_none() {
                    *deferred = Some(err);
                }
                // Placeholder; the generated SQL is discarded once finish()
                // reports the error.
                TableFullName::new("", "", dependency.name().table.clone())
            }
        }
    }

    /// Consume the resolver, yielding the recorded dependencies or the first
    /// resolution error hit inside the closure.
    pub fn finish(self) -> CoreResult<Vec<ModelRef>> {
        if let Some(err) = self.deferred.into_inner() {
            return Err(err);
        }
        Ok(self.recorded.into_inner())
    }
}
