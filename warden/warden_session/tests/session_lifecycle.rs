//! Reset, tamper detection and session context.

use warden_core::error::{Error, SessionError, StoreError};
use warden_core::traits::{PrivilegeRow, Relation, SessionStore};
use warden_core::{Bitmap, ScopeKey};
use warden_session::{
    ClosureHierarchy, FixedConfigSource, InMemorySessionStore, Session, SessionState,
    ERROR_ON_UNINITIALIZED_PARAM,
};

fn new_session(store: &InMemorySessionStore) -> Session<InMemorySessionStore, ClosureHierarchy> {
    Session::new(store.clone(), ClosureHierarchy::new(), FixedConfigSource::new())
}

#[test]
fn test_reset_creates_absent_relations() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);
    assert_eq!(session.state(), SessionState::Uninitialized);

    session.reset().unwrap();

    for relation in Relation::ALL {
        assert!(store.has_relation(relation));
    }
    assert_eq!(session.state(), SessionState::Ready { loaded: false });
    assert!(session.is_ready());
}

#[test]
fn test_reset_truncates_existing_relations() {
    let mut store = InMemorySessionStore::new();
    store.create_relations().unwrap();
    store
        .store_privileges(PrivilegeRow::new((1, 0), Bitmap::new(), Bitmap::from([3])))
        .unwrap();

    let mut session = new_session(&store);
    session.reset().unwrap();

    assert_eq!(store.privilege_row_count(), 0);
    assert!(!session.i_have_global_priv(3).unwrap());
}

#[test]
fn test_granted_relation_is_tamper() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);
    session.reset().unwrap();

    store.grant(Relation::SessionPrivileges, "mallory").unwrap();
    let err = session.reset().unwrap_err();

    assert!(err.is_tamper());
    assert!(matches!(
        err,
        Error::Session(SessionError::ExternalAccess {
            relations: 3,
            restricted: 2
        })
    ));
    assert!(err.to_string().contains("bypass row-level security"));
    assert_eq!(session.state(), SessionState::TamperDetected);
}

#[test]
fn test_partial_relations_are_tamper() {
    let store = InMemorySessionStore::new();
    store.create_relation(Relation::SessionPrivileges);

    let mut session = new_session(&store);
    let err = session.reset().unwrap_err();

    assert!(matches!(
        err,
        Error::Session(SessionError::UnexpectedRelationCount {
            found: 1,
            expected: 3
        })
    ));
    assert_eq!(session.state(), SessionState::TamperDetected);
}

#[test]
fn test_tampered_session_refuses_work_until_clean_reset() {
    let store = InMemorySessionStore::new();
    store.create_relation(Relation::SessionContext);

    let mut session = new_session(&store);
    assert!(session.reset().is_err());

    let err = session
        .add_scope_privileges(1, 0, &Bitmap::new(), &Bitmap::from([1]))
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::Tampered)));

    let err = session.i_have_global_priv(1).unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::Tampered)));

    store.drop_relation(Relation::SessionContext);
    session.reset().unwrap();
    assert!(session.is_ready());
}

#[test]
fn test_writes_before_reset_fail() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);

    let err = session
        .add_scope_privileges(1, 0, &Bitmap::new(), &Bitmap::from([1]))
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::NotReady)));

    let err = session
        .update_scope_privileges(1, 0, &Bitmap::new(), &Bitmap::from([1]))
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::NotReady)));
}

#[test]
fn test_store_failure_propagates_and_leaves_session_uninitialized() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);

    store.fail_next("connection reset");
    let err = session.reset().unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::ConnectFailed(_))));
    assert!(!err.is_tamper());
    assert_eq!(session.state(), SessionState::Uninitialized);
}

#[test]
fn test_session_context_survives_privilege_reset() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);
    session.reset().unwrap();

    let context = session
        .set_session_context(
            42,
            7,
            ScopeKey::global(),
            ScopeKey::new(3, 10),
            ScopeKey::global(),
            Some(7),
        )
        .unwrap();
    assert_eq!(context.parent_session_id, None);

    session.reset_privileges().unwrap();
    assert_eq!(session.get_session_context().unwrap(), Some(context.clone()));

    // A second session over the same store reads the persisted context
    let mut other = new_session(&store);
    other.reset_privileges().unwrap();
    assert_eq!(other.get_session_context().unwrap(), Some(context));

    session.reset().unwrap();
    assert_eq!(session.get_session_context().unwrap(), None);
}

#[test]
fn test_save_and_restore_original_privileges() {
    let store = InMemorySessionStore::new();
    let mut session = new_session(&store);
    session.reset().unwrap();

    session
        .stage_privileges(PrivilegeRow::new((1, 0), Bitmap::new(), Bitmap::from([4])))
        .unwrap();
    session.save_original_privileges().unwrap();
    assert!(session.i_have_global_priv(4).unwrap());

    session
        .stage_privileges(PrivilegeRow::new((1, 0), Bitmap::new(), Bitmap::from([5])))
        .unwrap();
    assert!(!session.i_have_global_priv(4).unwrap());
    assert!(session.i_have_global_priv(5).unwrap());

    session.restore_original_privileges().unwrap();
    assert!(session.i_have_global_priv(4).unwrap());
    assert!(!session.i_have_global_priv(5).unwrap());
}

#[test]
fn test_uninitialized_policy_from_fixed_source() {
    let store = InMemorySessionStore::new();
    let config = FixedConfigSource::new().with(ERROR_ON_UNINITIALIZED_PARAM, false);
    let mut session = Session::new(store, ClosureHierarchy::new(), config);

    assert!(!session.i_have_global_priv(1).unwrap());
    assert!(!session.i_have_priv_in_scope(1, 3, 10).unwrap());
    assert_eq!(session.get_result_counts(), (2, 0));
}
