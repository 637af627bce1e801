//! Parsing and execution of SQL*Plus style scripts.
//!
//! A script is split into statements with [`SqlScript::parse`], which also
//! folds `WHENEVER SQLERROR` and `SET SERVEROUTPUT` directives into the
//! policy of each statement. [`SqlScript::execute`] then runs them against
//! any [`ScriptConnection`].

pub mod app;
pub mod db;
pub mod error;
pub mod utils;

pub use db::query::{
    Delimiter, Directive, ExecutionPolicy, ScriptConnection, ScriptExecutor, ScriptOutcome,
    ScriptResource, SqlDialect, SqlScript, Statement, StatementFailure,
};
pub use db::{ConnectionInfo, DatabaseConnection, ExecutionContext};
pub use error::{DatabaseError, Result, ScriptError};
