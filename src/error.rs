use camino::Utf8PathBuf;
use thiserror::Error;

use crate::path::HexPath;

/// Errors surfaced before any command runs: loading the `Hexmake` file,
/// validating it, and planning the build.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Could not open Hexmake file: {0}")]
    SpecFile(#[from] std::io::Error),

    #[error("Could not parse Hexmake file: {0}")]
    SpecParse(#[from] serde_json::Error),

    #[error("Rule #{0} declares no outputs")]
    NoOutputs(usize),

    #[error("Output `{0}` is not in `out/`")]
    OutputNotInOut(HexPath),

    #[error("Output `{0}` is declared by more than one rule")]
    DuplicateOutput(HexPath),

    #[error("No rule produces `{0}`")]
    UnknownOutput(HexPath),

    #[error("Dependency cycle through the rule producing `{0}`")]
    CycleDetected(HexPath),
}

/// Failure of a single task. Any one of these aborts the whole run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Input `{0}` does not exist")]
    MissingInput(HexPath),

    #[error("Command failed ({status}); sandbox kept at `{sandbox}`")]
    CommandFailed {
        status: std::process::ExitStatus,
        sandbox: Utf8PathBuf,
    },

    #[error("Declared output `{0}` was not produced by the commands")]
    MissingDeclaredOutput(HexPath),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Worker panicked: {0}")]
    Panicked(String),
}
