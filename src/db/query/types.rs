use std::time::Duration;

/// Terminator that ends a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub symbol: String,
    /// The terminator only counts when it stands alone on its line.
    pub alone_on_line: bool,
}

impl Delimiter {
    pub fn new(symbol: &str, alone_on_line: bool) -> Self {
        Self {
            symbol: symbol.to_string(),
            alone_on_line,
        }
    }

    pub fn semicolon() -> Self {
        Self::new(";", false)
    }

    /// `/` on a line of its own, as used after PL/SQL blocks.
    pub fn slash() -> Self {
        Self::new("/", true)
    }
}

/// Script-level policy, snapshotted into every statement at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub fail_on_exception: bool,
    pub echo_output: bool,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            fail_on_exception: true,
            echo_output: false,
        }
    }
}

/// In-script instruction that changes the policy of the statements after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `WHENEVER SQLERROR CONTINUE` / `WHENEVER SQLERROR EXIT FAILURE`
    ExceptionPolicy { fail_on_exception: bool },
    /// `SET SERVEROUTPUT ON` / `SET SERVEROUTPUT OFF`
    OutputEcho { enabled: bool },
}

impl Directive {
    pub fn apply(&self, policy: &mut ExecutionPolicy) {
        match *self {
            Directive::ExceptionPolicy { fail_on_exception } => {
                policy.fail_on_exception = fail_on_exception;
            }
            Directive::OutputEcho { enabled } => {
                policy.echo_output = enabled;
            }
        }
    }
}

/// A statement ready to be sent to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    line_number: usize,
    sql: String,
    fail_on_exception: bool,
    echo_output: bool,
}

impl Statement {
    pub fn new(line_number: usize, sql: &str, policy: ExecutionPolicy) -> Self {
        Self {
            line_number,
            sql: sql.to_string(),
            fail_on_exception: policy.fail_on_exception,
            echo_output: policy.echo_output,
        }
    }

    /// 1-based line of the script where the statement starts.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn fail_on_exception(&self) -> bool {
        self.fail_on_exception
    }

    pub fn echo_output(&self) -> bool {
        self.echo_output
    }
}

/// Where a script came from, for error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptResource {
    pub name: String,
    pub location: Option<String>,
}

impl ScriptResource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

/// Administrative calls used to drive the server output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    EnableOutput,
    FetchOutput { max_lines: u32 },
    DisableOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminResponse {
    Done,
    Lines(Vec<Option<String>>),
}

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub sql: String,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub execution_time: Duration,
    pub message: String,
    pub is_select: bool,
    /// Server output lines drained after the statement ran.
    pub server_output: Vec<String>,
}

impl QueryResult {
    pub fn new_select(
        sql: &str,
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<String>>,
        execution_time: Duration,
    ) -> Self {
        let row_count = rows.len();
        Self {
            sql: sql.to_string(),
            columns,
            rows,
            row_count,
            execution_time,
            message: format!("{} rows fetched", row_count),
            is_select: true,
            server_output: Vec::new(),
        }
    }

    pub fn new_dml(
        sql: &str,
        affected_rows: u64,
        execution_time: Duration,
        statement_type: &str,
    ) -> Self {
        Self {
            sql: sql.to_string(),
            columns: vec![],
            rows: vec![],
            row_count: affected_rows as usize,
            execution_time,
            message: format!("{} {} row(s) affected", statement_type, affected_rows),
            is_select: false,
            server_output: Vec::new(),
        }
    }

    pub fn new_executed(sql: &str, execution_time: Duration) -> Self {
        Self {
            sql: sql.to_string(),
            columns: vec![],
            rows: vec![],
            row_count: 0,
            execution_time,
            message: "Statement executed successfully".to_string(),
            is_select: false,
            server_output: Vec::new(),
        }
    }
}
