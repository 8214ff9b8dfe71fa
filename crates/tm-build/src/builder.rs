//! Model build orchestration.
//!
//! `ModelBuilder::build` runs the dependency walk twice over the same model:
//! a dry run that discovers the full graph and validates it (name conflicts,
//! cycles) without touching the warehouse destructively, then a real run
//! that repeats the traversal and executes jobs bottom-up. A validation
//! failure therefore never leaves the real run partially applied.
//!
//! The graph is not declared anywhere: it emerges from invoking each model's
//! SQL closure against a per-visit [`NameResolver`], which records every
//! referenced model as a dependency. Because of the two passes, every SQL
//! closure is invoked exactly twice per successful build; closures must be
//! idempotent apart from dependency registration.

use crate::error::{BuildError, BuildResult};
use crate::execute::{self, BuildMode};
use futures::future::BoxFuture;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tm_core::{ModelKind, ModelRef, NameResolution, NameResolver, TableFullName};
use tm_warehouse::Warehouse;

/// Builder configuration: name-resolution rules plus job labels attached to
/// every submitted job for cost attribution.
#[derive(Debug, Default)]
pub struct BuilderConfig {
    pub names: NameResolution,
    pub job_labels: BTreeMap<String, String>,
}

/// Builds models and their transitive dependencies against one warehouse.
///
/// A builder instance runs one build at a time: overlapping `build` calls
/// are rejected, not queued.
pub struct ModelBuilder {
    warehouse: Arc<dyn Warehouse>,
    config: BuilderConfig,
    building: AtomicBool,
}

impl ModelBuilder {
    pub fn new(warehouse: Arc<dyn Warehouse>, config: BuilderConfig) -> Self {
        Self {
            warehouse,
            config,
            building: AtomicBool::new(false),
        }
    }

    /// Build `model` and everything it transitively depends on.
    ///
    /// Dependencies always build before their dependents, and each model
    /// builds at most once per run regardless of how many paths reference
    /// it. Fails without submitting any job when the graph has a name
    /// conflict or a circular dependency.
    pub async fn build(&self, model: &ModelRef) -> BuildResult<()> {
        let _session = SessionGuard::acquire(&self.building)?;

        let mut used_in_run = HashMap::new();
        self.build_step(model, true, &mut used_in_run, &[]).await?;

        let mut used_in_run = HashMap::new();
        self.build_step(model, false, &mut used_in_run, &[]).await?;

        Ok(())
    }

    /// A model's fully-resolved table name under this builder's rules,
    /// without building anything.
    pub fn full_name(&self, model: &ModelRef) -> BuildResult<TableFullName> {
        Ok(self.config.names.resolve(model.name())?)
    }

    /// One traversal step: visit `model`, recurse into its discovered
    /// dependencies (post-order), and execute the job unless `dry_run`.
    fn build_step<'a>(
        &'a self,
        model: &'a ModelRef,
        dry_run: bool,
        used_in_run: &'a mut HashMap<String, ModelRef>,
        chain: &'a [ModelRef],
    ) -> BoxFuture<'a, BuildResult<()>> {
        Box::pin(async move {
            // External models are never built, only named by their
            // dependents.
            if matches!(model.kind(), ModelKind::External) {
                return Ok(());
            }

            let name = self.config.names.resolve(model.name())?;
            let key = name.to_string();

            // At-most-once per run, and same-name conflict detection. The
            // key is the canonical name; the value is the instance that
            // claimed it.
            if let Some(claimant) = used_in_run.get(&key) {
                if Arc::ptr_eq(claimant, model) {
                    return Ok(());
                }
                return Err(BuildError::NameConflict { name: key });
            }
            used_in_run.insert(key, Arc::clone(model));

            log::info!("Started building '{name}'.");

            let (mode, sql, dependencies) = self.plan(model, &name).await?;

            let child_chain: Vec<ModelRef> = chain
                .iter()
                .cloned()
                .chain(std::iter::once(Arc::clone(model)))
                .collect();

            for dependency in &dependencies {
                if chain.iter().any(|ancestor| Arc::ptr_eq(ancestor, dependency)) {
                    return Err(BuildError::CircularDependency {
                        path: self.cycle_path(chain, model, dependency),
                    });
                }
                self.build_step(dependency, dry_run, used_in_run, &child_chain)
                    .await?;
            }

            if !dry_run {
                execute::execute(
                    self.warehouse.as_ref(),
                    &self.config,
                    &name,
                    &sql,
                    mode,
                    model,
                )
                .await?;
            }

            log::info!("Finished building '{name}'.");
            Ok(())
        })
    }

    /// Decide the build mode and produce the SQL plus the dependencies it
    /// registered.
    ///
    /// Runs in both passes with identical rules; for incremental models the
    /// target's existence is queried fresh each pass, since the real run's
    /// execution stage may have created it since the dry run.
    async fn plan(
        &self,
        model: &ModelRef,
        name: &TableFullName,
    ) -> BuildResult<(BuildMode, String, Vec<ModelRef>)> {
        match model.kind() {
            // Never reached: build_step returns before planning externals.
            ModelKind::External => Ok((BuildMode::FullRefresh, String::new(), Vec::new())),
            ModelKind::FullRefresh { sql } => {
                let resolver = NameResolver::new(&self.config.names, name.clone());
                let text = sql(&resolver);
                Ok((BuildMode::FullRefresh, text, resolver.finish()?))
            }
            ModelKind::Incremental {
                sql_full,
                sql_incremental,
            } => {
                let metadata = self
                    .warehouse
                    .table_metadata(name)
                    .await
                    .map_err(|source| BuildError::Execution {
                        table: name.to_string(),
                        source,
                    })?;

                let resolver = NameResolver::new(&self.config.names, name.clone());
                match metadata {
                    None => {
                        let text = sql_full(&resolver);
                        Ok((BuildMode::FullRefresh, text, resolver.finish()?))
                    }
                    Some(metadata) => {
                        let columns = metadata.schema.column_names();
                        let text = sql_incremental(&resolver, &columns);
                        Ok((BuildMode::Incremental, text, resolver.finish()?))
                    }
                }
            }
        }
    }

    /// Render the cycle for the error message, `a -> b -> c -> a` style,
    /// starting at the dependency that closes it.
    fn cycle_path(&self, chain: &[ModelRef], current: &ModelRef, dependency: &ModelRef) -> String {
        let start = chain
            .iter()
            .position(|m| Arc::ptr_eq(m, dependency))
            .unwrap_or(0);

        let mut names: Vec<String> = chain[start..].iter().map(|m| self.display_name(m)).collect();
        names.push(self.display_name(current));
        names.push(self.display_name(dependency));
        names.join(" -> ")
    }

    fn display_name(&self, model: &ModelRef) -> String {
        self.config
            .names
            .resolve(model.name())
            .map(|name| name.to_string())
            .unwrap_or_else(|_| model.name().table.clone())
    }
}

/// Exclusive-build flag with guaranteed release: the flag clears when the
/// guard drops, whatever path the build exits through.
struct SessionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SessionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> BuildResult<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .map_err(|_| BuildError::BuildInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
