//! Inkmark replay tool
//!
//! Runs a JSON script of pointer events and editor commands through a
//! `Session` backed by an in-memory store, then prints the resulting marks,
//! history flags and viewport matrix as JSON.
//!
//! ```text
//! RUST_LOG=debug inkmark-replay session.json
//! ```

mod script;

use script::{ReplayError, Script};
use std::process::ExitCode;

fn load(path: &str) -> Result<Script, ReplayError> {
    let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_string(),
        source,
    })?;
    Script::from_json(&json)
}

fn replay(path: &str) -> Result<String, ReplayError> {
    let script = load(path)?;
    log::info!("Replaying {} steps from {}", script.steps.len(), path);
    let report = script::run(script)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: inkmark-replay <script.json>");
        return ExitCode::from(2);
    };

    match replay(&path) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
