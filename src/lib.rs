#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod conduct;
mod error;
mod exec;
mod graph;
mod io;
mod path;
mod plan;
mod sandbox;
mod spec;

pub use crate::conduct::conduct;
pub use crate::error::{SpecError, TaskError};
pub use crate::exec::RuleExecutor;
pub use crate::graph::{TaskGraph, TaskId, TaskNode};
pub use crate::io::as_overhead;
pub use crate::path::{HexPath, OUT_ROOT, SCRATCH_ROOT};
pub use crate::plan::plan;
pub use crate::sandbox::SandboxManager;
pub use crate::spec::{Rule, SPEC_FILE, Spec};
