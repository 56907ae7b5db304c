//! Session store backed by a relational store.
//!
//! The relations are temporary tables private to the connection. The
//! inspection query reads the catalog: a relation is restricted when it
//! carries no access-control list, i.e. nobody has been granted anything on
//! it since the session created it.

use tracing::trace;
use warden_core::error::{Result, StoreError};
use warden_core::traits::{
    run_command, run_query, with_connection, PlanCache, PrivilegeRow, QueryExecutor, Relation,
    SessionStore, Statement, StoreStatus,
};
use warden_core::types::{ParamType, Row, SessionContext, Value};
use warden_core::ScopeKey;

const INSPECT: Statement = Statement {
    sql: "select count(*)::integer, \
          coalesce(sum(case when c.relacl is null then 1 else 0 end), 0)::integer \
          from pg_catalog.pg_class c \
          where c.relname in ('warden_session_privileges', \
                              'warden_orig_privileges', \
                              'warden_session_context') \
          and c.relkind = 'r' \
          and c.relpersistence = 't'",
    param_types: &[],
    read_only: true,
};

const CREATE_SESSION_PRIVILEGES: Statement = Statement {
    sql: "create temporary table warden_session_privileges ( \
          scope_type integer not null, \
          scope_id integer not null, \
          roles bitmap, \
          privs bitmap, \
          primary key (scope_type, scope_id))",
    param_types: &[],
    read_only: false,
};

const CREATE_ORIG_PRIVILEGES: Statement = Statement {
    sql: "create temporary table warden_orig_privileges \
          (like warden_session_privileges including all)",
    param_types: &[],
    read_only: false,
};

const CREATE_SESSION_CONTEXT: Statement = Statement {
    sql: "create temporary table warden_session_context ( \
          accessor_id integer not null, \
          session_id bigint not null, \
          login_context_type_id integer not null, \
          login_context_id integer not null, \
          session_context_type_id integer not null, \
          session_context_id integer not null, \
          mapping_context_type_id integer not null, \
          mapping_context_id integer not null, \
          parent_session_id bigint)",
    param_types: &[],
    read_only: false,
};

const TRUNCATE_SESSION_PRIVILEGES: Statement = Statement {
    sql: "truncate table warden_session_privileges",
    param_types: &[],
    read_only: false,
};

const TRUNCATE_ORIG_PRIVILEGES: Statement = Statement {
    sql: "truncate table warden_orig_privileges",
    param_types: &[],
    read_only: false,
};

const TRUNCATE_SESSION_CONTEXT: Statement = Statement {
    sql: "truncate table warden_session_context",
    param_types: &[],
    read_only: false,
};

const SCAN_PRIVILEGES: Statement = Statement {
    sql: "select scope_type, scope_id, roles, privs \
          from warden_session_privileges \
          order by scope_type, scope_id",
    param_types: &[],
    read_only: true,
};

const INSERT_PRIVILEGES: Statement = Statement {
    sql: "insert into warden_session_privileges (scope_type, scope_id, roles, privs) \
          values ($1, $2, $3, $4) \
          on conflict (scope_type, scope_id) \
          do update set roles = excluded.roles, privs = excluded.privs",
    param_types: &[ParamType::Int, ParamType::Int, ParamType::Bitmap, ParamType::Bitmap],
    read_only: false,
};

const INSERT_CONTEXT: Statement = Statement {
    sql: "insert into warden_session_context \
          values ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    param_types: &[
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
        ParamType::Int,
    ],
    read_only: false,
};

const SELECT_CONTEXT: Statement = Statement {
    sql: "select accessor_id, session_id, \
          login_context_type_id, login_context_id, \
          session_context_type_id, session_context_id, \
          mapping_context_type_id, mapping_context_id, \
          parent_session_id \
          from warden_session_context",
    param_types: &[],
    read_only: true,
};

const SAVE_ORIGINAL: Statement = Statement {
    sql: "insert into warden_orig_privileges select * from warden_session_privileges",
    param_types: &[],
    read_only: false,
};

const RESTORE_ORIGINAL: Statement = Statement {
    sql: "insert into warden_session_privileges select * from warden_orig_privileges",
    param_types: &[],
    read_only: false,
};

fn truncate_statement(relation: Relation) -> &'static Statement {
    match relation {
        Relation::SessionPrivileges => &TRUNCATE_SESSION_PRIVILEGES,
        Relation::OriginalPrivileges => &TRUNCATE_ORIG_PRIVILEGES,
        Relation::SessionContext => &TRUNCATE_SESSION_CONTEXT,
    }
}

fn privilege_row(row: &Row) -> Result<PrivilegeRow> {
    Ok(PrivilegeRow {
        scope: ScopeKey::new(row.int32(0)?, row.int32(1)?),
        roles: row.bitmap(2)?,
        privileges: row.bitmap(3)?,
    })
}

fn context_row(row: &Row) -> Result<SessionContext> {
    Ok(SessionContext::new(
        row.int32(0)?,
        row.int(1)?,
        ScopeKey::new(row.int32(2)?, row.int32(3)?),
        ScopeKey::new(row.int32(4)?, row.int32(5)?),
        ScopeKey::new(row.int32(6)?, row.int32(7)?),
        row.opt_int(8)?,
    ))
}

/// A session store reached through a query executor.
pub struct QueryBackedStore<E> {
    executor: E,
    plans: PlanCache,
}

impl<E: QueryExecutor> QueryBackedStore<E> {
    /// Create a store issuing statements through `executor`.
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

    /// Saved statement plans.
    pub fn plans(&self) -> &PlanCache {
        &self.plans
    }

    /// Run statements for their effect inside one connection. DDL is never
    /// worth a saved plan.
    fn commands(&mut self, statements: &[&Statement], cache_plans: bool) -> Result<()> {
        let plans = &mut self.plans;
        with_connection(&mut self.executor, |executor| {
            for statement in statements {
                trace!(sql = statement.sql, "Session store command");
                let slot = if cache_plans {
                    Some(plans.slot(statement))
                } else {
                    None
                };
                run_command(executor, statement, &[], slot)?;
            }
            Ok(())
        })
    }
}

impl<E: QueryExecutor> SessionStore for QueryBackedStore<E> {
    fn inspect(&mut self) -> Result<StoreStatus> {
        let plans = &mut self.plans;
        let mut status = None;

        let rows = with_connection(&mut self.executor, |executor| {
            run_query(executor, &INSPECT, &[], Some(plans.slot(&INSPECT)), &mut |row| {
                if status.is_none() {
                    status = Some(StoreStatus {
                        relation_count: row.int(0)?,
                        restricted_count: row.opt_int(1)?.unwrap_or(0),
                    });
                }
                Ok(true)
            })
        })?;

        match (rows, status) {
            (1, Some(status)) => Ok(status),
            (rows, _) => Err(StoreError::UnexpectedRowCount {
                query: "session relation inspection".to_string(),
                rows,
            }
            .into()),
        }
    }

    fn create_relations(&mut self) -> Result<()> {
        self.commands(
            &[
                &CREATE_SESSION_PRIVILEGES,
                &CREATE_ORIG_PRIVILEGES,
                &CREATE_SESSION_CONTEXT,
            ],
            false,
        )
    }

    fn truncate(&mut self, relation: Relation) -> Result<()> {
        self.commands(&[truncate_statement(relation)], true)
    }

    fn scan_privileges(
        &mut self,
        on_row: &mut dyn FnMut(PrivilegeRow) -> Result<bool>,
    ) -> Result<usize> {
        let plans = &mut self.plans;
        with_connection(&mut self.executor, |executor| {
            run_query(
                executor,
                &SCAN_PRIVILEGES,
                &[],
                Some(plans.slot(&SCAN_PRIVILEGES)),
                &mut |row| on_row(privilege_row(row)?),
            )
        })
    }

    fn store_privileges(&mut self, row: PrivilegeRow) -> Result<()> {
        let plans = &mut self.plans;
        let params = [
            Value::from(row.scope.scope_type),
            Value::from(row.scope.scope_id),
            Value::Bitmap(row.roles),
            Value::Bitmap(row.privileges),
        ];
        with_connection(&mut self.executor, |executor| {
            run_command(
                executor,
                &INSERT_PRIVILEGES,
                &params,
                Some(plans.slot(&INSERT_PRIVILEGES)),
            )
            .map(|_| ())
        })
    }

    fn store_context(&mut self, context: &SessionContext) -> Result<()> {
        let plans = &mut self.plans;
        let params = [
            Value::from(context.accessor_id),
            Value::from(context.session_id),
            Value::from(context.login_context.scope_type),
            Value::from(context.login_context.scope_id),
            Value::from(context.session_context.scope_type),
            Value::from(context.session_context.scope_id),
            Value::from(context.mapping_context.scope_type),
            Value::from(context.mapping_context.scope_id),
            Value::from(context.parent_session_id),
        ];
        with_connection(&mut self.executor, |executor| {
            run_command(
                executor,
                &TRUNCATE_SESSION_CONTEXT,
                &[],
                Some(plans.slot(&TRUNCATE_SESSION_CONTEXT)),
            )?;
            run_command(
                executor,
                &INSERT_CONTEXT,
                &params,
                Some(plans.slot(&INSERT_CONTEXT)),
            )
            .map(|_| ())
        })
    }

    fn load_context(&mut self) -> Result<Option<SessionContext>> {
        let plans = &mut self.plans;
        let mut context = None;
        with_connection(&mut self.executor, |executor| {
            run_query(
                executor,
                &SELECT_CONTEXT,
                &[],
                Some(plans.slot(&SELECT_CONTEXT)),
                &mut |row| {
                    context = Some(context_row(row)?);
                    Ok(false)
                },
            )
        })?;
        Ok(context)
    }

    fn save_original_privileges(&mut self) -> Result<()> {
        self.commands(&[&TRUNCATE_ORIG_PRIVILEGES, &SAVE_ORIGINAL], true)
    }

    fn restore_original_privileges(&mut self) -> Result<()> {
        self.commands(&[&TRUNCATE_SESSION_PRIVILEGES, &RESTORE_ORIGINAL], true)
    }
}
