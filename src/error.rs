//! Error types for script parsing and execution.

use thiserror::Error;

use crate::db::query::StatementFailure;

/// An error reported by the database, possibly followed by further errors
/// the driver chained behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DatabaseError {
    pub sql_state: Option<String>,
    pub error_code: i32,
    pub message: String,
    #[source]
    pub next: Option<Box<DatabaseError>>,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            sql_state: None,
            error_code: 0,
            message: message.into(),
            next: None,
        }
    }

    pub fn with_code(mut self, sql_state: Option<&str>, error_code: i32) -> Self {
        self.sql_state = sql_state.map(str::to_string);
        self.error_code = error_code;
        self
    }

    pub fn chain(mut self, next: DatabaseError) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    /// The last error in the chain.
    pub fn root_cause(&self) -> &DatabaseError {
        let mut current = self;
        while let Some(next) = current.next.as_deref() {
            current = next;
        }
        current
    }
}

impl From<oracle::Error> for DatabaseError {
    fn from(err: oracle::Error) -> Self {
        let mut errors = vec![Self::from_message(&err.to_string())];
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            errors.push(Self::from_message(&cause.to_string()));
            source = cause.source();
        }
        errors
            .into_iter()
            .rev()
            .reduce(|next, error| error.chain(next))
            .unwrap_or_else(|| Self::from_message(&err.to_string()))
    }
}

impl DatabaseError {
    /// Builds an error from driver text, picking up the `ORA-nnnnn` code
    /// when the message starts with one.
    pub fn from_message(text: &str) -> Self {
        let message = text.trim().to_string();
        let error_code = message
            .strip_prefix("ORA-")
            .map(|rest| {
                rest.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
            })
            .and_then(|digits| digits.parse::<i32>().ok())
            .unwrap_or(0);
        Self {
            sql_state: sql_state_for(error_code).map(str::to_string),
            error_code,
            message,
            next: None,
        }
    }
}

/// SQLSTATE class for an Oracle error code, following Oracle's published
/// mapping of ORA ranges to SQLSTATE values. Unmapped server errors fall in
/// class 72000 (SQL execute phase error).
fn sql_state_for(error_code: i32) -> Option<&'static str> {
    let state = match error_code {
        c if c <= 0 => return None,
        1403 | 1095 => "02000",
        1427 => "21000",
        1401 | 12899 => "22001",
        1426 | 1438 | 1455 | 1457 => "22003",
        1476 => "22012",
        1722 => "22018",
        1800..=1899 => "22008",
        1 | 1400 | 2290..=2299 => "23000",
        1001..=1003 => "24000",
        1017 | 1045 => "28000",
        8177 => "40001",
        22..=28 | 900..=999 | 1031 | 1490..=1493 | 1700..=1799 | 1900..=2099
        | 2140..=2289 | 2420..=2424 | 2450..=2499 | 3276..=3299 | 4040..=4059
        | 4070..=4099 => "42000",
        _ => "72000",
    };
    Some(state)
}

/// Errors that stop a script.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The tokenizer could not find where a statement ends.
    #[error("Unable to parse script at line {line}: {message}")]
    ParseBoundary { line: usize, message: String },

    /// A statement failed while its fail-on-exception policy was in force.
    #[error("{0}")]
    Abort(Box<StatementFailure>),

    /// Connecting or talking to the database outside of a statement failed.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScriptError {
    pub fn parse_boundary(line: usize, message: impl Into<String>) -> Self {
        ScriptError::ParseBoundary {
            line,
            message: message.into(),
        }
    }

    /// The failure report, when this error aborted a script.
    pub fn failure(&self) -> Option<&StatementFailure> {
        match self {
            ScriptError::Abort(failure) => Some(failure.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
