//! Query executor trait and helpers.
//!
//! A query executor runs parameterized statements against the backing
//! relational store and hands rows, one at a time, to a callback. The
//! callback decides whether to keep going, which lets callers stop at the
//! first interesting row.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::types::{ParamType, Row, Value};

/// Handle of a prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanHandle(pub u64);

impl fmt::Display for PlanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan#{}", self.0)
    }
}

/// Trait for query executors.
pub trait QueryExecutor {
    /// Open a connection for a batch of statements.
    fn connect(&mut self) -> Result<()>;

    /// Close the connection opened by `connect`.
    fn finish(&mut self) -> Result<()>;

    /// Prepare a statement.
    fn prepare(&mut self, sql: &str, param_types: &[ParamType]) -> Result<PlanHandle>;

    /// Execute a prepared statement.
    ///
    /// # Arguments
    ///
    /// * `plan` - The prepared statement.
    /// * `params` - Parameter values, matching the prepared types.
    /// * `read_only` - Whether the statement may modify data.
    /// * `on_row` - Called for each result row; returning `Ok(false)` stops
    ///   processing.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Rows handed to `on_row`, including the one that
    ///   stopped processing.
    /// * `Err` - If execution failed.
    fn execute(
        &mut self,
        plan: PlanHandle,
        params: &[Value],
        read_only: bool,
        on_row: &mut dyn FnMut(&Row) -> Result<bool>,
    ) -> Result<usize>;
}

/// A statement with its parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Statement {
    /// Statement text.
    pub sql: &'static str,

    /// Parameter types.
    pub param_types: &'static [ParamType],

    /// Whether the statement only reads.
    pub read_only: bool,
}

/// Saved plans, one per statement.
///
/// A plan cache belongs to whoever issues the statements; it is never
/// global, since plan handles are only meaningful to the executor that
/// prepared them.
#[derive(Debug, Clone, Default)]
pub struct PlanCache {
    plans: HashMap<&'static str, Option<PlanHandle>>,
}

impl PlanCache {
    /// Create an empty plan cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The plan slot for a statement.
    pub fn slot(&mut self, statement: &Statement) -> &mut Option<PlanHandle> {
        self.plans.entry(statement.sql).or_insert(None)
    }

    /// Number of statements with a saved plan.
    pub fn len(&self) -> usize {
        self.plans.values().filter(|p| p.is_some()).count()
    }

    /// Whether no plan has been saved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every saved plan.
    pub fn clear(&mut self) {
        self.plans.clear();
    }
}

/// Run a statement, preparing it unless a saved plan is available.
///
/// When `saved_plan` is given and empty, the freshly prepared plan is stored
/// there for the next call from the same call site.
pub fn run_query<E: QueryExecutor + ?Sized>(
    executor: &mut E,
    statement: &Statement,
    params: &[Value],
    saved_plan: Option<&mut Option<PlanHandle>>,
    on_row: &mut dyn FnMut(&Row) -> Result<bool>,
) -> Result<usize> {
    let plan = match saved_plan {
        Some(Some(plan)) => *plan,
        Some(slot) => {
            let plan = executor.prepare(statement.sql, statement.param_types)?;
            *slot = Some(plan);
            plan
        }
        None => executor.prepare(statement.sql, statement.param_types)?,
    };

    executor.execute(plan, params, statement.read_only, on_row)
}

/// Run a statement for its side effects, ignoring any rows.
pub fn run_command<E: QueryExecutor + ?Sized>(
    executor: &mut E,
    statement: &Statement,
    params: &[Value],
    saved_plan: Option<&mut Option<PlanHandle>>,
) -> Result<usize> {
    run_query(executor, statement, params, saved_plan, &mut |_| Ok(true))
}

/// Run a statement and read the first column of its first row as a bool.
///
/// # Returns
///
/// * `Ok(Some(bool))` - The value from the first row.
/// * `Ok(None)` - The statement returned no rows.
pub fn bool_from_query<E: QueryExecutor + ?Sized>(
    executor: &mut E,
    statement: &Statement,
    params: &[Value],
    saved_plan: Option<&mut Option<PlanHandle>>,
) -> Result<Option<bool>> {
    let mut result = None;
    run_query(executor, statement, params, saved_plan, &mut |row| {
        result = Some(row.bool(0)?);
        Ok(false)
    })?;
    Ok(result)
}

/// Run `body` between `connect` and `finish`.
///
/// `finish` runs even when `body` fails; the body's error wins.
pub fn with_connection<E, T, F>(executor: &mut E, body: F) -> Result<T>
where
    E: QueryExecutor + ?Sized,
    F: FnOnce(&mut E) -> Result<T>,
{
    executor.connect()?;
    let result = body(executor);
    let finished = executor.finish();
    let value = result?;
    finished?;
    Ok(value)
}
