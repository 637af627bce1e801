use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use sqlplus_script::app::App;
use tracing::{error, info};

fn main() -> ExitCode {
    let app = App::new();
    app.init_logging();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        error!("Usage: sqlplus-script <script.sql>...");
        return ExitCode::from(2);
    }

    for path in &paths {
        match app.run_script(path) {
            Ok(outcome) => info!(
                "{}: {} statements run, {} non-fatal errors, started {}",
                path.display(),
                outcome.executed(),
                outcome.warnings.len(),
                outcome.started_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Err(err) => {
                error!("{}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
