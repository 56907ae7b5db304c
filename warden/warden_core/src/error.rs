//! Error types for the Warden session privilege system.
//!
//! Errors are organized by subsystem. The root error type, `Error`, wraps
//! each subsystem error so that callers can handle failures uniformly.
//!
//! Only a handful of conditions are errors at all: predicate evaluation
//! degrades to `false` for every miss once a session is ready. What
//! remains here is fatal to the enclosing operation.

use thiserror::Error;

/// Root error type for the Warden system.
#[derive(Debug, Error)]
pub enum Error {
    /// Session lifecycle errors, including tamper detection
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Persistent session store and query execution errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Privilege cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error reports a suspected attempt to forge privileges.
    pub fn is_tamper(&self) -> bool {
        matches!(
            self,
            Error::Session(
                SessionError::UnexpectedRelationCount { .. } | SessionError::ExternalAccess { .. }
            )
        )
    }
}

/// Errors raised by the session lifecycle controller and the predicate
/// evaluator.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The staging relations exist in a number other than zero or the
    /// full set.
    #[error(
        "Unexpected count of session relations: found {found}, expected 0 or {expected}; \
         this indicates an attempt to bypass row-level security"
    )]
    UnexpectedRelationCount {
        /// Number of relations found
        found: i64,

        /// Number of relations the session owns when initialized
        expected: i64,
    },

    /// The staging relations are visible to principals other than the
    /// session itself.
    #[error(
        "Unexpected access to session relations: {restricted} of {relations} are restricted; \
         this indicates an attempt to bypass row-level security"
    )]
    ExternalAccess {
        /// Number of relations inspected
        relations: i64,

        /// Number of relations carrying no external grants
        restricted: i64,
    },

    /// A privilege check or privilege push happened before `reset`
    #[error("Attempt to check privileges before the session was reset")]
    NotReady,

    /// An earlier reset detected tampering; the session must be reset again
    #[error("Session is unusable after tamper detection; reset required")]
    Tampered,
}

/// Errors from the persistent session store and the query executor
/// underneath it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connecting to the query executor failed
    #[error("Failed to connect to query executor: {0}")]
    ConnectFailed(String),

    /// Releasing the query executor connection failed
    #[error("Failed to finish query executor connection: {0}")]
    FinishFailed(String),

    /// Preparing a statement failed
    #[error("Failed to prepare query '{query}': {reason}")]
    PrepareFailed {
        /// Statement text
        query: String,

        /// Reason reported by the executor
        reason: String,
    },

    /// Executing a statement failed
    #[error("Failed to execute query '{query}': {reason}")]
    ExecuteFailed {
        /// Statement text
        query: String,

        /// Reason reported by the executor
        reason: String,
    },

    /// A query returned a number of rows the caller cannot interpret
    #[error("Unexpected row count from {query}: {rows}")]
    UnexpectedRowCount {
        /// Short name of the query
        query: String,

        /// Rows processed
        rows: usize,
    },

    /// A row did not have the expected shape
    #[error("Bad row: {0}")]
    BadRow(String),

    /// A relation the store expected to exist is missing
    #[error("Relation not found: {0}")]
    RelationNotFound(String),
}

/// Errors related to the privilege cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An entry was added out of ascending scope order
    #[error("Scope {key} added out of order (last added {last})")]
    OutOfOrder {
        /// Key being added
        key: crate::scope::ScopeKey,

        /// Greatest key already in the cache
        last: crate::scope::ScopeKey,
    },

    /// Growing the cache failed
    #[error("Failed to grow privilege cache to {0} entries")]
    GrowFailed(usize),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// A parameter has the wrong type
    #[error("Parameter {name} is not a {expected}")]
    WrongType {
        /// Parameter name
        name: String,

        /// Expected type name
        expected: &'static str,
    },
}

/// Result type used throughout the Warden system.
pub type Result<T> = std::result::Result<T, Error>;
