use tracing::{info, warn};

use crate::error::DatabaseError;

use super::{AdminRequest, AdminResponse, ScriptConnection};

/// Lines requested per fetch. A shorter page means the buffer is empty.
pub const MAX_LINES_PER_FETCH: u32 = 1000;

/// Upper bound on fetches for one statement, in case the server never
/// reports an empty buffer.
const MAX_FETCH_ROUNDS: usize = 10_000;

/// Drives the server output buffer (`DBMS_OUTPUT` on Oracle).
pub struct DbmsOutput;

impl DbmsOutput {
    pub fn enable<C>(conn: &mut C) -> Result<(), DatabaseError>
    where
        C: ScriptConnection + ?Sized,
    {
        conn.call(AdminRequest::EnableOutput).map(|_| ())
    }

    pub fn disable<C>(conn: &mut C) -> Result<(), DatabaseError>
    where
        C: ScriptConnection + ?Sized,
    {
        conn.call(AdminRequest::DisableOutput).map(|_| ())
    }

    pub fn fetch<C>(conn: &mut C, max_lines: u32) -> Result<Vec<Option<String>>, DatabaseError>
    where
        C: ScriptConnection + ?Sized,
    {
        match conn.call(AdminRequest::FetchOutput { max_lines })? {
            AdminResponse::Lines(lines) => Ok(lines),
            AdminResponse::Done => Ok(Vec::new()),
        }
    }

    /// Reads pages until the buffer runs dry, logging every non-empty line.
    pub fn drain<C>(conn: &mut C) -> Result<Vec<String>, DatabaseError>
    where
        C: ScriptConnection + ?Sized,
    {
        let mut output: Vec<String> = Vec::new();

        for _ in 0..MAX_FETCH_ROUNDS {
            let lines = Self::fetch(conn, MAX_LINES_PER_FETCH)?;
            let fetched = lines.len();

            for line in lines.into_iter().flatten() {
                if line.is_empty() {
                    continue;
                }
                info!("{}", line);
                output.push(line);
            }

            if fetched < MAX_LINES_PER_FETCH as usize {
                return Ok(output);
            }
        }

        warn!(
            "Stopped reading server output after {} fetches of {} lines",
            MAX_FETCH_ROUNDS, MAX_LINES_PER_FETCH
        );
        Ok(output)
    }
}
