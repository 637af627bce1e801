use std::time::Instant;

use oracle::sql_type::OracleType;
use oracle::{Connection, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::query::{
    AdminRequest, AdminResponse, ColumnInfo, QueryResult, ScriptConnection,
};
use crate::error::DatabaseError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub host: String,
    pub port: u16,
    pub service_name: String,
}

impl ConnectionInfo {
    pub fn new(username: &str, password: &str, host: &str, port: u16, service_name: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            service_name: service_name.to_string(),
        }
    }

    pub fn connection_string(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.service_name)
    }

    pub fn display_string(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.service_name
        )
    }

    /// Securely clear the password from memory by overwriting with zeros
    /// then releasing the allocation.
    pub fn clear_password(&mut self) {
        // SAFETY: zeros are valid UTF-8
        let bytes = unsafe { self.password.as_bytes_mut() };
        for b in bytes.iter_mut() {
            unsafe { std::ptr::write_volatile(b, 0) };
        }
        self.password.clear();
        self.password.shrink_to_fit();
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 1521,
            service_name: "ORCL".to_string(),
        }
    }
}

/// One database session for the lifetime of a script run. The session is
/// closed when this value is dropped.
pub struct DatabaseConnection {
    connection: Connection,
    info: ConnectionInfo,
}

impl DatabaseConnection {
    pub fn connect(mut info: ConnectionInfo) -> Result<Self, DatabaseError> {
        let conn_str = info.connection_string();
        let connection = Connection::connect(&info.username, &info.password, &conn_str)?;
        // Password is not needed once the session is open.
        info.clear_password();
        debug!("Connected to {}", info.display_string());

        Ok(Self { connection, info })
    }

    pub fn set_auto_commit(&mut self, enabled: bool) {
        self.connection.set_autocommit(enabled);
    }

    pub fn commit(&self) -> Result<(), DatabaseError> {
        self.connection.commit()?;
        Ok(())
    }

    pub fn rollback(&self) -> Result<(), DatabaseError> {
        self.connection.rollback()?;
        Ok(())
    }

    fn execute_select(&self, sql: &str, start: Instant) -> Result<QueryResult, DatabaseError> {
        let mut stmt = self.connection.statement(sql).build()?;
        let result_set = stmt.query(&[])?;

        let column_info: Vec<ColumnInfo> = result_set
            .column_info()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                data_type: format!("{:?}", col.oracle_type()),
            })
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for row_result in result_set {
            let row: Row = row_result?;
            let mut row_data: Vec<String> = Vec::new();
            for i in 0..column_info.len() {
                let value: Option<String> = row.get(i).unwrap_or(None);
                row_data.push(value.unwrap_or_else(|| "NULL".to_string()));
            }
            rows.push(row_data);
        }

        Ok(QueryResult::new_select(
            sql,
            column_info,
            rows,
            start.elapsed(),
        ))
    }

    fn execute_dml(
        &self,
        sql: &str,
        start: Instant,
        statement_type: &str,
    ) -> Result<QueryResult, DatabaseError> {
        let stmt = self.connection.execute(sql, &[])?;
        let affected_rows = stmt.row_count()?;
        Ok(QueryResult::new_dml(
            sql,
            affected_rows,
            start.elapsed(),
            statement_type,
        ))
    }

    /// Reads up to `max_lines` lines with `DBMS_OUTPUT.GET_LINE`.
    fn fetch_output_lines(&self, max_lines: u32) -> Result<Vec<Option<String>>, DatabaseError> {
        let mut lines: Vec<Option<String>> = Vec::new();
        let mut stmt = self
            .connection
            .statement("BEGIN DBMS_OUTPUT.GET_LINE(:line, :status); END;")
            .build()?;

        stmt.bind("line", &OracleType::Varchar2(32767))?;
        stmt.bind("status", &OracleType::Number(0, 0))?;

        for _ in 0..max_lines.max(1) {
            stmt.execute(&[])?;
            let status: i32 = stmt.bind_value("status")?;
            if status != 0 {
                break;
            }
            let line: Option<String> = stmt.bind_value("line")?;
            lines.push(line);
        }

        Ok(lines)
    }
}

impl ScriptConnection for DatabaseConnection {
    fn execute(&mut self, sql: &str) -> Result<QueryResult, DatabaseError> {
        let start = Instant::now();
        let sql_upper = sql.trim_start().to_uppercase();

        if sql_upper.starts_with("SELECT") || sql_upper.starts_with("WITH") {
            self.execute_select(sql, start)
        } else if sql_upper.starts_with("INSERT") {
            self.execute_dml(sql, start, "INSERT")
        } else if sql_upper.starts_with("UPDATE") {
            self.execute_dml(sql, start, "UPDATE")
        } else if sql_upper.starts_with("DELETE") {
            self.execute_dml(sql, start, "DELETE")
        } else if sql_upper.starts_with("MERGE") {
            self.execute_dml(sql, start, "MERGE")
        } else {
            self.connection.execute(sql, &[])?;
            Ok(QueryResult::new_executed(sql, start.elapsed()))
        }
    }

    fn call(&mut self, request: AdminRequest) -> Result<AdminResponse, DatabaseError> {
        match request {
            AdminRequest::EnableOutput => {
                self.connection
                    .execute("BEGIN DBMS_OUTPUT.ENABLE(NULL); END;", &[])?;
                Ok(AdminResponse::Done)
            }
            AdminRequest::DisableOutput => {
                self.connection.execute("BEGIN DBMS_OUTPUT.DISABLE; END;", &[])?;
                Ok(AdminResponse::Done)
            }
            AdminRequest::FetchOutput { max_lines } => {
                Ok(AdminResponse::Lines(self.fetch_output_lines(max_lines)?))
            }
        }
    }
}

impl Drop for DatabaseConnection {
    fn drop(&mut self) {
        if let Err(err) = self.connection.close() {
            warn!(
                "Failed to close session {}: {}",
                self.info.display_string(),
                err
            );
        }
    }
}
