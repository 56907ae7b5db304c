//! The query-backed store and hierarchy over a scripted executor.

mod support;

use support::{row, ScriptedExecutor};
use warden_core::error::{Error, StoreError};
use warden_core::traits::{PrivilegeRow, QueryExecutor, Relation, ScopeHierarchy, SessionStore};
use warden_core::types::Value;
use warden_core::{Bitmap, ScopeKey};
use warden_session::{
    FixedConfigSource, QueryBackedStore, QueryHierarchy, Session, SessionState, SharedExecutor,
};

fn inspect_row(relations: i64, restricted: i64) -> Vec<warden_core::types::Row> {
    vec![row(vec![Value::Int(relations), Value::Int(restricted)])]
}

#[test]
fn test_inspect_reads_counts() {
    let executor = ScriptedExecutor::new().respond("pg_class", inspect_row(3, 3));
    let mut store = QueryBackedStore::new(executor);

    let status = store.inspect().unwrap();
    assert_eq!(status.relation_count, 3);
    assert_eq!(status.restricted_count, 3);
    assert_eq!(store.executor().connects, 1);
    assert_eq!(store.executor().finishes, 1);
}

#[test]
fn test_inspect_requires_exactly_one_row() {
    let mut store = QueryBackedStore::new(ScriptedExecutor::new());
    let err = store.inspect().unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::UnexpectedRowCount { rows: 0, .. })
    ));

    let mut rows = inspect_row(0, 0);
    rows.extend(inspect_row(0, 0));
    let mut store = QueryBackedStore::new(ScriptedExecutor::new().respond("pg_class", rows));
    let err = store.inspect().unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::UnexpectedRowCount { rows: 2, .. })
    ));
}

#[test]
fn test_null_restricted_count_reads_as_zero() {
    let executor = ScriptedExecutor::new().respond(
        "pg_class",
        vec![row(vec![Value::Int(0), Value::Null])],
    );
    let mut store = QueryBackedStore::new(executor);
    assert_eq!(store.inspect().unwrap().restricted_count, 0);
}

#[test]
fn test_plans_are_saved_per_statement() {
    let executor = ScriptedExecutor::new().respond("pg_class", inspect_row(3, 3));
    let mut store = QueryBackedStore::new(executor);

    store.inspect().unwrap();
    store.inspect().unwrap();
    store.truncate(Relation::SessionPrivileges).unwrap();
    store.truncate(Relation::SessionPrivileges).unwrap();

    let executor = store.executor();
    assert_eq!(executor.prepares_of("pg_class"), 1);
    assert_eq!(executor.executions_of("pg_class"), 2);
    assert_eq!(executor.prepares_of("truncate table warden_session_privileges"), 1);
    assert_eq!(store.plans().len(), 2);
}

#[test]
fn test_reset_creates_relations_through_sql() {
    let executor = ScriptedExecutor::new().respond("pg_class", inspect_row(0, 0));
    let mut session = Session::new(
        QueryBackedStore::new(executor),
        warden_core::traits::FlatHierarchy,
        FixedConfigSource::new(),
    );

    session.reset().unwrap();

    let executor = session.store().executor();
    assert_eq!(executor.executions_of("create temporary table"), 3);
    assert!(executor
        .executed
        .iter()
        .filter(|e| e.sql.starts_with("create"))
        .all(|e| !e.read_only));
    assert_eq!(session.state(), SessionState::Ready { loaded: false });
}

#[test]
fn test_reset_detects_grants_through_sql() {
    let executor = ScriptedExecutor::new().respond("pg_class", inspect_row(3, 1));
    let mut session = Session::new(
        QueryBackedStore::new(executor),
        warden_core::traits::FlatHierarchy,
        FixedConfigSource::new(),
    );

    let err = session.reset().unwrap_err();
    assert!(err.is_tamper());
    assert_eq!(session.state(), SessionState::TamperDetected);
    assert_eq!(session.store().executor().executions_of("truncate"), 0);
}

#[test]
fn test_lazy_load_maps_rows() {
    let executor = ScriptedExecutor::new()
        .respond("pg_class", inspect_row(3, 3))
        .respond(
            "order by scope_type",
            vec![
                row(vec![
                    Value::Int(1),
                    Value::Int(0),
                    Value::Null,
                    Value::Bitmap(Bitmap::from([1])),
                ]),
                row(vec![
                    Value::Int(3),
                    Value::Int(10),
                    Value::Bitmap(Bitmap::from([7])),
                    Value::Bitmap(Bitmap::from([2, 3])),
                ]),
            ],
        );
    let mut session = Session::new(
        QueryBackedStore::new(executor),
        warden_core::traits::FlatHierarchy,
        FixedConfigSource::new(),
    );
    session.reset().unwrap();

    assert!(session.i_have_global_priv(1).unwrap());
    assert!(session.i_have_priv_in_scope(3, 3, 10).unwrap());
    assert_eq!(
        session.roles_in_scope(ScopeKey::new(1, 0)).unwrap(),
        Some(Bitmap::new())
    );
    assert_eq!(session.store().executor().executions_of("order by scope_type"), 1);
}

#[test]
fn test_unordered_store_rows_fail_the_load() {
    let executor = ScriptedExecutor::new()
        .respond("pg_class", inspect_row(3, 3))
        .respond(
            "order by scope_type",
            vec![
                row(vec![Value::Int(3), Value::Int(10), Value::Null, Value::Null]),
                row(vec![Value::Int(1), Value::Int(0), Value::Null, Value::Null]),
            ],
        );
    let mut session = Session::new(
        QueryBackedStore::new(executor),
        warden_core::traits::FlatHierarchy,
        FixedConfigSource::new(),
    );
    session.reset().unwrap();

    let err = session.i_have_global_priv(1).unwrap_err();
    assert!(matches!(err, Error::Cache(_)));
    assert!(session.cache().is_empty());
    // The connection is released even though the load failed
    let executor = session.store().executor();
    assert_eq!(executor.connects, executor.finishes);
}

#[test]
fn test_store_writes_bind_parameters() {
    let mut store = QueryBackedStore::new(ScriptedExecutor::new());
    store
        .store_privileges(PrivilegeRow::new((3, 10), Bitmap::from([7]), Bitmap::from([2])))
        .unwrap();

    let execution = store
        .executor()
        .executed
        .iter()
        .find(|e| e.sql.starts_with("insert into warden_session_privileges"))
        .cloned()
        .unwrap();
    assert_eq!(
        execution.params,
        vec![
            Value::Int(3),
            Value::Int(10),
            Value::Bitmap(Bitmap::from([7])),
            Value::Bitmap(Bitmap::from([2])),
        ]
    );
}

#[test]
fn test_context_round_trips_through_rows() {
    let context_row = row(vec![
        Value::Int(42),
        Value::Int(7),
        Value::Int(1),
        Value::Int(0),
        Value::Int(3),
        Value::Int(10),
        Value::Int(1),
        Value::Int(0),
        Value::Null,
    ]);
    let executor =
        ScriptedExecutor::new().respond("from warden_session_context", vec![context_row]);
    let mut store = QueryBackedStore::new(executor);

    let context = store.load_context().unwrap().unwrap();
    assert_eq!(context.accessor_id, 42);
    assert_eq!(context.session_id, 7);
    assert_eq!(context.session_context, ScopeKey::new(3, 10));
    assert_eq!(context.parent_session_id, None);

    store.store_context(&context).unwrap();
    let executor = store.executor();
    assert_eq!(executor.executions_of("truncate table warden_session_context"), 1);
    let insert = executor
        .executed
        .iter()
        .find(|e| e.sql.starts_with("insert into warden_session_context"))
        .unwrap();
    assert_eq!(insert.params.len(), 9);
    assert_eq!(insert.params[8], Value::Null);
}

#[test]
fn test_connect_failure_propagates() {
    let mut executor = ScriptedExecutor::new();
    executor.fail_connect = true;
    let mut store = QueryBackedStore::new(executor);

    let err = store.create_relations().unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::ConnectFailed(_))));
}

#[test]
fn test_execute_failure_still_finishes() {
    let mut executor = ScriptedExecutor::new();
    executor.fail_on = Some("truncate".to_string());
    let mut store = QueryBackedStore::new(executor);

    let err = store.truncate(Relation::SessionContext).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::ExecuteFailed { .. })));
    assert_eq!(store.executor().finishes, 1);
}

#[test]
fn test_query_hierarchy_skips_self_and_stops_early() {
    let executor = ScriptedExecutor::new().respond(
        "all_superior_scopes",
        vec![
            row(vec![Value::Int(3), Value::Int(10)]),
            row(vec![Value::Int(4), Value::Int(1)]),
            row(vec![Value::Int(5), Value::Int(1)]),
        ],
    );
    let mut hierarchy = QueryHierarchy::new(executor);

    let mut seen = Vec::new();
    hierarchy
        .superiors_of(ScopeKey::new(3, 10), &mut |superior| {
            seen.push(superior);
            superior != ScopeKey::new(4, 1)
        })
        .unwrap();

    assert_eq!(seen, vec![ScopeKey::new(4, 1)]);
    let execution = &hierarchy.executor().executed[0];
    assert_eq!(execution.params, vec![Value::Int(3), Value::Int(10)]);
    assert!(execution.read_only);
}

#[test]
fn test_store_and_hierarchy_share_an_executor() {
    let executor = SharedExecutor::new(
        ScriptedExecutor::new()
            .respond("pg_class", inspect_row(3, 3))
            .respond(
                "order by scope_type",
                vec![row(vec![
                    Value::Int(5),
                    Value::Int(1),
                    Value::Null,
                    Value::Bitmap(Bitmap::from([9])),
                ])],
            )
            .respond(
                "all_superior_scopes",
                vec![
                    row(vec![Value::Int(4), Value::Int(1)]),
                    row(vec![Value::Int(5), Value::Int(1)]),
                ],
            ),
    );

    let mut session = Session::new(
        QueryBackedStore::new(executor.clone()),
        QueryHierarchy::new(executor),
        FixedConfigSource::new(),
    );
    session.reset().unwrap();

    assert!(session.i_have_priv_in_scope_or_superior(9, 3, 10).unwrap());
    assert!(!session.i_have_priv_in_scope_or_superior(8, 3, 10).unwrap());
    assert!(session.i_have_priv_in_superior_scope(9, 4, 1).unwrap());
}

#[test]
fn test_scripted_executor_counts_stopped_rows() {
    let mut executor = ScriptedExecutor::new().respond(
        "select",
        vec![row(vec![Value::Int(1)]), row(vec![Value::Int(2)])],
    );
    let plan = executor.prepare("select 1", &[]).unwrap();
    let processed = executor.execute(plan, &[], true, &mut |_| Ok(false)).unwrap();
    assert_eq!(processed, 1);
}
