//! Runs one rule inside a fresh sandbox.
//!
//! Inputs are staged into the sandbox so that commands which read files not
//! listed in the `Hexmake` file tend to fail, declared outputs are published
//! back into the real `out/` tree only after every command succeeded.

use std::fs;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::TaskError;
use crate::io::{copy_file, copy_tree};
use crate::sandbox::SandboxManager;
use crate::spec::Rule;

/// Executes rules against a workspace root. In production the root is the
/// current directory; tests point it at a scratch workspace.
pub struct RuleExecutor<'a> {
    workspace: Utf8PathBuf,
    sandboxes: &'a SandboxManager,
}

impl<'a> RuleExecutor<'a> {
    pub fn new(workspace: impl Into<Utf8PathBuf>, sandboxes: &'a SandboxManager) -> Self {
        RuleExecutor {
            workspace: workspace.into(),
            sandboxes,
        }
    }

    /// Run one rule to completion: allocate a sandbox, stage the inputs,
    /// run the commands, publish the outputs. Any failure leaves the
    /// sandbox in place for inspection.
    pub fn execute(&self, rule: &Rule) -> Result<(), TaskError> {
        let sandbox = self.sandboxes.make_build_dir()?;

        self.stage_inputs(rule, &sandbox)?;
        self.prepare_output_dirs(rule, &sandbox)?;
        self.run_commands(rule, &sandbox)?;
        self.publish_outputs(rule, &sandbox)?;

        Ok(())
    }

    /// Mirror every declared input into the sandbox, preserving relative
    /// paths. Directory inputs are copied recursively.
    fn stage_inputs(&self, rule: &Rule, sandbox: &Utf8Path) -> Result<(), TaskError> {
        for input in &rule.inputs {
            let src = self.workspace.join(input.as_path());
            let dst = sandbox.join(input.as_path());

            if src.is_file() {
                copy_file(&src, &dst)?;
            } else if src.is_dir() {
                copy_tree(&src, &dst)?;
            } else {
                return Err(TaskError::MissingInput(input.clone()));
            }
        }

        Ok(())
    }

    /// Ensure the parent directory exists for each output the commands are
    /// about to write.
    fn prepare_output_dirs(&self, rule: &Rule, sandbox: &Utf8Path) -> Result<(), TaskError> {
        for output in &rule.outputs {
            if let Some(parent) = output.parent() {
                fs::create_dir_all(sandbox.join(parent))?;
            }
        }

        Ok(())
    }

    /// Run the rule's commands in declared order, echoing each one before
    /// it starts. The shell inherits stdout and stderr, so build output
    /// interleaves with ours at line boundaries.
    fn run_commands(&self, rule: &Rule, sandbox: &Utf8Path) -> Result<(), TaskError> {
        for command in &rule.commands {
            println!("{command}");

            let status = Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(sandbox)
                .status()?;

            if !status.success() {
                return Err(TaskError::CommandFailed {
                    status,
                    sandbox: sandbox.to_owned(),
                });
            }
        }

        Ok(())
    }

    /// Copy each declared output from the sandbox to its real destination,
    /// replacing whatever was there. `fs::copy` carries permissions along.
    fn publish_outputs(&self, rule: &Rule, sandbox: &Utf8Path) -> Result<(), TaskError> {
        for output in &rule.outputs {
            let staged = sandbox.join(output.as_path());
            if !staged.is_file() {
                return Err(TaskError::MissingDeclaredOutput(output.clone()));
            }

            let dst = self.workspace.join(output.as_path());
            if dst.is_dir() {
                fs::remove_dir_all(&dst)?;
            } else if dst.is_file() {
                fs::remove_file(&dst)?;
            }

            copy_file(&staged, &dst)?;
        }

        Ok(())
    }
}
