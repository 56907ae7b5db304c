//! Shared helpers for session integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use warden_core::error::{Result, StoreError};
use warden_core::traits::{PlanHandle, QueryExecutor};
use warden_core::types::{ParamType, Row, Value};

/// One statement execution seen by the executor.
#[derive(Debug, Clone)]
pub struct Execution {
    pub sql: String,
    pub params: Vec<Value>,
    pub read_only: bool,
}

/// A query executor that answers from canned rows and records what it
/// was asked to run.
///
/// Responses are matched on a fragment of the statement text; statements
/// with no matching response return no rows.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: Vec<(String, Vec<Row>)>,
    plans: HashMap<u64, String>,
    pub prepared: Vec<String>,
    pub executed: Vec<Execution>,
    pub connects: usize,
    pub finishes: usize,
    pub fail_connect: bool,
    pub fail_on: Option<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `fragment` with `rows`.
    pub fn respond(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.responses.push((fragment.to_string(), rows));
        self
    }

    /// Number of executions whose text contains `fragment`.
    pub fn executions_of(&self, fragment: &str) -> usize {
        self.executed
            .iter()
            .filter(|e| e.sql.contains(fragment))
            .count()
    }

    /// Number of prepares whose text contains `fragment`.
    pub fn prepares_of(&self, fragment: &str) -> usize {
        self.prepared.iter().filter(|s| s.contains(fragment)).count()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn connect(&mut self) -> Result<()> {
        if self.fail_connect {
            return Err(StoreError::ConnectFailed("scripted".to_string()).into());
        }
        self.connects += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finishes += 1;
        Ok(())
    }

    fn prepare(&mut self, sql: &str, _param_types: &[ParamType]) -> Result<PlanHandle> {
        let id = self.plans.len() as u64 + 1;
        self.plans.insert(id, sql.to_string());
        self.prepared.push(sql.to_string());
        Ok(PlanHandle(id))
    }

    fn execute(
        &mut self,
        plan: PlanHandle,
        params: &[Value],
        read_only: bool,
        on_row: &mut dyn FnMut(&Row) -> Result<bool>,
    ) -> Result<usize> {
        let sql = self.plans.get(&plan.0).cloned().unwrap_or_default();
        self.executed.push(Execution {
            sql: sql.clone(),
            params: params.to_vec(),
            read_only,
        });

        if let Some(fragment) = &self.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(StoreError::ExecuteFailed {
                    query: sql,
                    reason: "scripted failure".to_string(),
                }
                .into());
            }
        }

        let rows = self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();

        let mut processed = 0;
        for row in &rows {
            processed += 1;
            if !on_row(row)? {
                break;
            }
        }
        Ok(processed)
    }
}

pub fn row(values: Vec<Value>) -> Row {
    Row::new(values)
}
