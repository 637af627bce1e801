use tracing::debug;

use crate::error::{Result, ScriptError};

use super::builder::StatementBuilder;
use super::{
    ExecutionPolicy, ScriptConnection, ScriptExecutor, ScriptOutcome,
    ScriptResource, SqlDialect, Statement,
};

/// A parsed script: the statements to run, in order, each carrying the
/// policy that was in force where it appeared.
#[derive(Debug, Clone)]
pub struct SqlScript {
    resource: Option<ScriptResource>,
    dialect: SqlDialect,
    statements: Vec<Statement>,
}

impl SqlScript {
    pub fn parse(
        source: &str,
        dialect: SqlDialect,
        resource: Option<ScriptResource>,
    ) -> Result<Self> {
        let statements = Self::lines_to_statements(source, dialect)?;
        Ok(Self {
            resource,
            dialect,
            statements,
        })
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn resource(&self) -> Option<&ScriptResource> {
        self.resource.as_ref()
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn execute<C>(&self, conn: &mut C) -> Result<ScriptOutcome>
    where
        C: ScriptConnection + ?Sized,
    {
        ScriptExecutor::execute(conn, self)
    }

    /// Sql text of every statement, in execution order.
    pub fn sql_texts(&self) -> Vec<&str> {
        self.statements.iter().map(Statement::sql).collect()
    }

    fn lines_to_statements(source: &str, dialect: SqlDialect) -> Result<Vec<Statement>> {
        let rules = dialect.rules();
        let mut policy = ExecutionPolicy::default();
        let mut statements: Vec<Statement> = Vec::new();
        let mut builder = StatementBuilder::new(rules);
        let mut last_line = 0usize;

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            last_line = line_number;

            if builder.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                builder.set_line_number(line_number);
            }

            builder.add_line(line);

            if builder.can_discard() {
                debug!(
                    "Discarding line {}: {}",
                    builder.line_number(),
                    builder.text().trim()
                );
                builder = StatementBuilder::new(rules);
            } else if builder.is_terminated() {
                Self::add_statement(&mut statements, &builder, &mut policy);
                builder = StatementBuilder::new(rules);
            }
        }

        // Last statement may lack its delimiter.
        if !builder.is_empty() && !builder.can_discard() {
            if let Some(reason) = builder.incomplete_reason() {
                return Err(ScriptError::parse_boundary(
                    last_line,
                    format!(
                        "{} in statement starting at line {}",
                        reason,
                        builder.line_number()
                    ),
                ));
            }
            Self::add_statement(&mut statements, &builder, &mut policy);
        }

        Ok(statements)
    }

    fn add_statement(
        statements: &mut Vec<Statement>,
        builder: &StatementBuilder,
        policy: &mut ExecutionPolicy,
    ) {
        if let Some(directive) = builder.directive() {
            directive.apply(policy);
            debug!(
                "Found directive at line {}: {}",
                builder.line_number(),
                builder.text().trim()
            );
            return;
        }

        statements.push(builder.to_statement(*policy));
    }
}

