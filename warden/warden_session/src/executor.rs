//! Sharing one query executor between collaborators.
//!
//! A query-backed store and a query-backed hierarchy normally talk to the
//! same connection. Each wants to own its executor, so they are handed
//! clones of a `SharedExecutor` instead.

use std::sync::Arc;

use parking_lot::Mutex;
use warden_core::error::Result;
use warden_core::traits::{PlanHandle, QueryExecutor};
use warden_core::types::{ParamType, Row, Value};

/// A cloneable handle to one query executor.
pub struct SharedExecutor<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> SharedExecutor<E> {
    /// Wrap an executor.
    pub fn new(executor: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(executor)),
        }
    }
}

impl<E> Clone for SharedExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: QueryExecutor> QueryExecutor for SharedExecutor<E> {
    fn connect(&mut self) -> Result<()> {
        self.inner.lock().connect()
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.lock().finish()
    }

    fn prepare(&mut self, sql: &str, param_types: &[ParamType]) -> Result<PlanHandle> {
        self.inner.lock().prepare(sql, param_types)
    }

    fn execute(
        &mut self,
        plan: PlanHandle,
        params: &[Value],
        read_only: bool,
        on_row: &mut dyn FnMut(&Row) -> Result<bool>,
    ) -> Result<usize> {
        self.inner.lock().execute(plan, params, read_only, on_row)
    }
}
