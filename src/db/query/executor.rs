use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::db::session::ExecutionContext;
use crate::error::{DatabaseError, Result, ScriptError};

use super::{
    AdminRequest, AdminResponse, DbmsOutput, QueryResult, ScriptResource, SqlScript, Statement,
};

/// What the executor needs from a database session.
pub trait ScriptConnection {
    /// Runs one statement.
    fn execute(&mut self, sql: &str) -> std::result::Result<QueryResult, DatabaseError>;

    /// Issues an administrative call, such as reading the server output buffer.
    fn call(&mut self, request: AdminRequest)
        -> std::result::Result<AdminResponse, DatabaseError>;
}

/// Forensic report for a statement that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    pub resource: Option<ScriptResource>,
    pub line_number: usize,
    pub sql: String,
    pub sql_state: Option<String>,
    pub error_code: i32,
    /// Message of the deepest error in the chain.
    pub message: String,
    pub fatal: bool,
}

impl StatementFailure {
    pub fn new(
        resource: Option<&ScriptResource>,
        statement: &Statement,
        error: &DatabaseError,
        fatal: bool,
    ) -> Self {
        let root_cause = error.root_cause();
        Self {
            resource: resource.cloned(),
            line_number: statement.line_number(),
            sql: statement.sql().to_string(),
            sql_state: root_cause.sql_state.clone(),
            error_code: root_cause.error_code,
            message: root_cause.message.trim().to_string(),
            fatal,
        }
    }

    fn heading(&self) -> String {
        match (&self.resource, self.fatal) {
            (None, false) => "Script error (non-fatal)".to_string(),
            (None, true) => "Script failed".to_string(),
            (Some(resource), false) => {
                format!("Migration {} had a non-fatal error", resource.name)
            }
            (Some(resource), true) => format!("Migration {} failed", resource.name),
        }
    }
}

impl fmt::Display for StatementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = self.heading();
        writeln!(f, "{}", heading)?;
        writeln!(f, "{}", "-".repeat(heading.chars().count()))?;
        writeln!(
            f,
            "SQL State  : {}",
            self.sql_state.as_deref().unwrap_or("")
        )?;
        writeln!(f, "Error Code : {}", self.error_code)?;
        if !self.message.is_empty() {
            writeln!(f, "Message    : {}", self.message)?;
        }
        if let Some(resource) = &self.resource {
            match &resource.location {
                Some(location) => writeln!(f, "Location   : {} ({})", resource.name, location)?,
                None => writeln!(f, "Location   : {}", resource.name)?,
            }
        }
        writeln!(f, "Line       : {}", self.line_number)?;
        write!(f, "Statement  : {}", self.sql)
    }
}

/// Summary of a script that ran to the end.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub results: Vec<QueryResult>,
    /// Failures that were logged and skipped.
    pub warnings: Vec<StatementFailure>,
}

impl ScriptOutcome {
    pub fn executed(&self) -> usize {
        self.results.len()
    }
}

pub struct ScriptExecutor;

impl ScriptExecutor {
    /// Runs every statement in order. A failing statement aborts the run
    /// when its own fail-on-exception flag is set; otherwise it is logged
    /// as a warning and the next statement runs.
    pub fn execute<C>(conn: &mut C, script: &SqlScript) -> Result<ScriptOutcome>
    where
        C: ScriptConnection + ?Sized,
    {
        let started_at = Local::now();
        let start = Instant::now();
        let mut context = ExecutionContext::default();
        let mut results: Vec<QueryResult> = Vec::new();
        let mut warnings: Vec<StatementFailure> = Vec::new();

        for statement in script.statements() {
            match Self::execute_statement(conn, statement, &mut context) {
                Ok(result) => results.push(result),
                Err(error) => {
                    let failure =
                        Self::handle_exception(script.resource(), statement, &error, &context)?;
                    warnings.push(failure);
                }
            }
        }

        let outcome = ScriptOutcome {
            started_at,
            elapsed: start.elapsed(),
            results,
            warnings,
        };
        info!(
            "Executed {} of {} statements ({} non-fatal errors) in {:.3}s",
            outcome.executed(),
            script.len(),
            outcome.warnings.len(),
            outcome.elapsed.as_secs_f64()
        );
        Ok(outcome)
    }

    fn execute_statement<C>(
        conn: &mut C,
        statement: &Statement,
        context: &mut ExecutionContext,
    ) -> std::result::Result<QueryResult, DatabaseError>
    where
        C: ScriptConnection + ?Sized,
    {
        context.set_fail_on_exception(statement.fail_on_exception());

        if !statement.echo_output() {
            return conn.execute(statement.sql());
        }

        DbmsOutput::enable(conn)?;
        let executed = conn.execute(statement.sql());
        let drained = DbmsOutput::drain(conn);
        let disabled = DbmsOutput::disable(conn);

        match executed {
            Ok(mut result) => {
                result.server_output = drained?;
                disabled?;
                Ok(result)
            }
            Err(error) => {
                if let Err(output_error) = drained.and(disabled) {
                    warn!(
                        "Unable to read server output after failure at line {}: {}",
                        statement.line_number(),
                        output_error
                    );
                }
                Err(error)
            }
        }
    }

    fn handle_exception(
        resource: Option<&ScriptResource>,
        statement: &Statement,
        error: &DatabaseError,
        context: &ExecutionContext,
    ) -> Result<StatementFailure> {
        if context.fail_on_exception() {
            let failure = StatementFailure::new(resource, statement, error, true);
            return Err(ScriptError::Abort(Box::new(failure)));
        }

        let failure = StatementFailure::new(resource, statement, error, false);
        warn!("{}", failure);
        Ok(failure)
    }
}
