//! The `Hexmake` build specification: serde data model, file loading and
//! structural validation.

use std::fs::read_to_string;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::SpecError;
use crate::path::HexPath;

/// The file name looked up in the workspace root.
pub const SPEC_FILE: &str = "Hexmake";

/// One rule in a `Hexmake` file: commands that turn the staged inputs into
/// the declared outputs. Immutable after parsing; the order of outputs,
/// inputs and commands is significant.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Rule {
    pub outputs: Vec<HexPath>,
    pub inputs: Vec<HexPath>,
    pub commands: Vec<String>,
}

/// An entire `Hexmake` file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct Spec {
    /// Environment variables whose values will participate in cache keys
    /// once content-addressed caching lands. Parsed and carried, not yet
    /// read by the executor.
    #[serde(default)]
    pub environ: Vec<String>,
    pub rules: Vec<Arc<Rule>>,
}

impl Spec {
    /// Load and parse the `Hexmake` file in the current directory.
    pub fn load() -> Result<Spec, SpecError> {
        let source = read_to_string(SPEC_FILE)?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Structural checks that must pass before planning: every rule
    /// declares at least one output, and every output lives under `out/`.
    pub fn validate(&self) -> Result<(), SpecError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.outputs.is_empty() {
                return Err(SpecError::NoOutputs(index));
            }

            for output in &rule.outputs {
                if !output.is_output() {
                    return Err(SpecError::OutputNotInOut(output.clone()));
                }
            }
        }

        Ok(())
    }
}
