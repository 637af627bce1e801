/// Mutable state of one script run, owned by the run and passed down by
/// reference. Each statement records its own policy here just before it
/// executes.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    fail_on_exception: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            fail_on_exception: true,
        }
    }
}

impl ExecutionContext {
    /// Whether an error in the statement now executing stops the script.
    pub fn fail_on_exception(&self) -> bool {
        self.fail_on_exception
    }

    pub fn set_fail_on_exception(&mut self, fail_on_exception: bool) {
        self.fail_on_exception = fail_on_exception;
    }
}
