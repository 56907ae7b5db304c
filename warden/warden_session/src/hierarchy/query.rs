//! Scope hierarchy read from the backing store.

use warden_core::error::Result;
use warden_core::traits::{
    run_query, with_connection, PlanCache, QueryExecutor, ScopeHierarchy, Statement,
};
use warden_core::types::{ParamType, Value};
use warden_core::ScopeKey;

const SUPERIOR_SCOPES: Statement = Statement {
    sql: "select superior_scope_type_id, superior_scope_id \
          from warden.all_superior_scopes \
          where scope_type_id = $1 \
          and scope_id = $2",
    param_types: &[ParamType::Int, ParamType::Int],
    read_only: true,
};

/// A scope hierarchy answered by the `all_superior_scopes` relation.
///
/// The relation holds the transitive closure of the hierarchy, so one
/// query yields every superior. It carries no distance, so the order of
/// visits is whatever the store returns.
pub struct QueryHierarchy<E> {
    executor: E,
    plans: PlanCache,
}

impl<E: QueryExecutor> QueryHierarchy<E> {
    /// Create a hierarchy issuing queries through `executor`.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            plans: PlanCache::new(),
        }
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: QueryExecutor> ScopeHierarchy for QueryHierarchy<E> {
    fn superiors_of(
        &mut self,
        scope: ScopeKey,
        visit: &mut dyn FnMut(ScopeKey) -> bool,
    ) -> Result<()> {
        let plans = &mut self.plans;
        let params = [Value::from(scope.scope_type), Value::from(scope.scope_id)];

        with_connection(&mut self.executor, |executor| {
            run_query(
                executor,
                &SUPERIOR_SCOPES,
                &params,
                Some(plans.slot(&SUPERIOR_SCOPES)),
                &mut |row| {
                    let superior = ScopeKey::new(row.int32(0)?, row.int32(1)?);
                    if superior == scope {
                        return Ok(true);
                    }
                    Ok(visit(superior))
                },
            )
        })?;
        Ok(())
    }
}
