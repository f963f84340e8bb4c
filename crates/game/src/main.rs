mod app;

use std::process::ExitCode;

fn main() -> ExitCode {
    match app::build_app() {
        Ok(wiring) => app::run(wiring),
        Err(err) => {
            // Tracing is initialised before the config is read.
            tracing::error!(error = %err, "config_invalid");
            ExitCode::FAILURE
        }
    }
}
