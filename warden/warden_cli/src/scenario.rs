//! Scenario files.
//!
//! A scenario describes a session's stored privileges, the scope hierarchy
//! and a list of privilege checks, in TOML:
//!
//! ```toml
//! [config.warden]
//! error_on_uninitialized_session = true
//!
//! [context]
//! accessor_id = 42
//! session_id = 7
//!
//! [[privileges]]
//! scope = [1, 0]
//! privileges = [5]
//!
//! [[superiors]]
//! scope = [3, 10]
//! superior = [4, 1]
//!
//! [[checks]]
//! predicate = "global"
//! privilege = 5
//! expect = true
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_core::traits::PrivilegeRow;
use warden_core::{Bitmap, Config, ConfigValue, ScopeKey};
use warden_session::{ClosureHierarchy, InMemorySessionStore, Session};

/// Errors reading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        /// Scenario path
        path: String,

        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not a valid scenario
    #[error("Invalid scenario {path}: {reason}")]
    Parse {
        /// Scenario path
        path: String,

        /// Parser message
        reason: String,
    },

    /// A check needs a scope and has none
    #[error("Check #{index} ({predicate}) needs a scope")]
    MissingScope {
        /// Position of the check, from 1
        index: usize,

        /// Predicate of the check
        predicate: Predicate,
    },

    /// A personal check has no accessor and the scenario no context
    #[error("Check #{index} (personal) needs an accessor or a session context")]
    MissingAccessor {
        /// Position of the check, from 1
        index: usize,
    },
}

/// Session context of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub accessor_id: i32,
    pub session_id: i64,
    #[serde(default = "global_scope")]
    pub login_context: (i32, i32),
    #[serde(default = "global_scope")]
    pub session_context: (i32, i32),
    #[serde(default = "global_scope")]
    pub mapping_context: (i32, i32),
    #[serde(default)]
    pub parent_session_id: Option<i64>,
}

fn global_scope() -> (i32, i32) {
    let global = ScopeKey::global();
    (global.scope_type, global.scope_id)
}

/// Privileges stored for one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub scope: (i32, i32),
    #[serde(default)]
    pub roles: Bitmap,
    #[serde(default)]
    pub privileges: Bitmap,
}

/// A direct superior edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperiorEdge {
    pub scope: (i32, i32),
    pub superior: (i32, i32),
}

/// The privilege predicates a check can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Global,
    Personal,
    Scope,
    ScopeOrGlobal,
    Superior,
    ScopeOrSuperior,
    ScopeOrSuperiorOrGlobal,
}

impl Predicate {
    fn needs_scope(self) -> bool {
        !matches!(self, Self::Global | Self::Personal)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "global",
            Self::Personal => "personal",
            Self::Scope => "scope",
            Self::ScopeOrGlobal => "scope_or_global",
            Self::Superior => "superior",
            Self::ScopeOrSuperior => "scope_or_superior",
            Self::ScopeOrSuperiorOrGlobal => "scope_or_superior_or_global",
        };
        f.write_str(name)
    }
}

/// One privilege check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub predicate: Predicate,
    pub privilege: u32,
    #[serde(default)]
    pub scope: Option<(i32, i32)>,
    #[serde(default)]
    pub accessor_id: Option<i32>,
    #[serde(default)]
    pub expect: Option<bool>,
}

impl Check {
    /// Short description, e.g. `scope_or_global(9 in (3,10))`.
    pub fn label(&self) -> String {
        match (self.predicate, self.scope, self.accessor_id) {
            (Predicate::Personal, _, Some(accessor)) => {
                format!("personal({} for {})", self.privilege, accessor)
            }
            (predicate, Some(scope), _) => {
                format!("{}({} in {})", predicate, self.privilege, ScopeKey::from(scope))
            }
            (predicate, None, _) => format!("{}({})", predicate, self.privilege),
        }
    }
}

/// A parsed scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Configuration visible to the session.
    #[serde(default)]
    pub config: ConfigValue,

    /// Skip the session reset, to exercise the uninitialized policy.
    #[serde(default)]
    pub skip_reset: bool,

    #[serde(default)]
    pub context: Option<ScenarioContext>,

    #[serde(default)]
    pub privileges: Vec<Grant>,

    #[serde(default)]
    pub superiors: Vec<SuperiorEdge>,

    #[serde(default)]
    pub checks: Vec<Check>,
}

/// Outcome of one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub check: String,
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
}

impl CheckOutcome {
    /// Whether the result matches the expectation, if there is one.
    pub fn passed(&self) -> bool {
        self.expected.map_or(true, |expected| expected == self.result)
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
    pub false_count: u64,
    pub true_count: u64,
}

impl Report {
    /// Checks whose result contradicts their expectation.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }
}

impl Scenario {
    /// Parse a scenario from TOML text.
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = toml::from_str(text).map_err(|e| ScenarioError::Parse {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&text, &display)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        for (position, check) in self.checks.iter().enumerate() {
            let index = position + 1;
            if check.predicate.needs_scope() && check.scope.is_none() {
                return Err(ScenarioError::MissingScope {
                    index,
                    predicate: check.predicate,
                });
            }
            if check.predicate == Predicate::Personal
                && check.accessor_id.is_none()
                && self.context.is_none()
            {
                return Err(ScenarioError::MissingAccessor { index });
            }
        }
        Ok(())
    }

    /// The scenario's configuration.
    pub fn config(&self) -> Config {
        Config {
            root: self.config.clone(),
        }
    }

    /// Layer `overlay` over the scenario's configuration; its keys win.
    pub fn overlay_config(&mut self, overlay: Config) {
        let mut config = self.config();
        config.merge(overlay);
        self.config = config.root;
    }

    /// Build the scope hierarchy.
    pub fn hierarchy(&self) -> ClosureHierarchy {
        ClosureHierarchy::from_edges(
            self.superiors
                .iter()
                .map(|edge| (ScopeKey::from(edge.scope), ScopeKey::from(edge.superior))),
        )
    }

    /// Run every check against a fresh session.
    ///
    /// Stored privileges are staged through the session, so the checks
    /// exercise the lazy load from the store. A scenario that skips the
    /// reset stages nothing.
    pub fn run(&self) -> warden_core::Result<Report> {
        let store = InMemorySessionStore::new();
        let mut session = Session::new(store, self.hierarchy(), self.config());

        if !self.skip_reset {
            session.reset()?;
            if let Some(context) = &self.context {
                session.set_session_context(
                    context.accessor_id,
                    context.session_id,
                    context.login_context.into(),
                    context.session_context.into(),
                    context.mapping_context.into(),
                    context.parent_session_id,
                )?;
            }
            for grant in &self.privileges {
                session.stage_privileges(PrivilegeRow::new(
                    grant.scope,
                    grant.roles.clone(),
                    grant.privileges.clone(),
                ))?;
            }
        }

        let default_accessor = self.context.as_ref().map(|c| c.accessor_id);
        let mut outcomes = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let (scope_type, scope_id) = check.scope.unwrap_or_else(global_scope);
            let result = match check.predicate {
                Predicate::Global => session.i_have_global_priv(check.privilege)?,
                Predicate::Personal => {
                    let accessor = check.accessor_id.or(default_accessor).unwrap_or_default();
                    session.i_have_personal_priv(check.privilege, accessor)?
                }
                Predicate::Scope => {
                    session.i_have_priv_in_scope(check.privilege, scope_type, scope_id)?
                }
                Predicate::ScopeOrGlobal => {
                    session.i_have_priv_in_scope_or_global(check.privilege, scope_type, scope_id)?
                }
                Predicate::Superior => {
                    session.i_have_priv_in_superior_scope(check.privilege, scope_type, scope_id)?
                }
                Predicate::ScopeOrSuperior => {
                    session.i_have_priv_in_scope_or_superior(check.privilege, scope_type, scope_id)?
                }
                Predicate::ScopeOrSuperiorOrGlobal => session
                    .i_have_priv_in_scope_or_superior_or_global(
                        check.privilege,
                        scope_type,
                        scope_id,
                    )?,
            };
            outcomes.push(CheckOutcome {
                check: check.label(),
                result,
                expected: check.expect,
            });
        }

        let (false_count, true_count) = session.get_result_counts();
        Ok(Report {
            outcomes,
            false_count,
            true_count,
        })
    }
}
