//! Translates a spec and a list of requested targets into a [`TaskGraph`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SpecError;
use crate::graph::{TaskGraph, TaskId};
use crate::path::HexPath;
use crate::spec::Spec;

/// Plan the minimal set of tasks needed to produce `targets`, wired with
/// dependency edges.
///
/// Nodes come back in creation order, which for a given spec and target
/// list is deterministic: targets are visited as supplied, inputs in
/// declared order, and a rule reached more than once keeps its first node.
pub fn plan(spec: &Spec, targets: &[HexPath]) -> Result<TaskGraph, SpecError> {
    let mut planner = Planner::new(spec)?;

    for target in targets {
        planner.ensure_task(target)?;
    }

    Ok(planner.graph)
}

struct Planner<'a> {
    spec: &'a Spec,
    /// Which rule (by index into the spec) owns each output path.
    rule_by_output: HashMap<HexPath, usize>,
    /// One task per rule, however many of its outputs are requested.
    task_for_rule: HashMap<usize, TaskId>,
    /// Rules on the recursion stack; re-entering one means the spec has a
    /// dependency cycle.
    in_progress: Vec<usize>,
    graph: TaskGraph,
}

impl<'a> Planner<'a> {
    fn new(spec: &'a Spec) -> Result<Self, SpecError> {
        let mut rule_by_output = HashMap::new();

        for (index, rule) in spec.rules.iter().enumerate() {
            for output in &rule.outputs {
                if rule_by_output.insert(output.clone(), index).is_some() {
                    return Err(SpecError::DuplicateOutput(output.clone()));
                }
            }
        }

        Ok(Planner {
            spec,
            rule_by_output,
            task_for_rule: HashMap::new(),
            in_progress: Vec::new(),
            graph: TaskGraph::default(),
        })
    }

    /// Ensure a task exists for the rule producing `target`, creating it
    /// and its transitive dependencies on first sight. Source paths plan to
    /// nothing.
    fn ensure_task(&mut self, target: &HexPath) -> Result<Option<TaskId>, SpecError> {
        if !target.is_output() {
            return Ok(None);
        }

        let Some(&index) = self.rule_by_output.get(target) else {
            return Err(SpecError::UnknownOutput(target.clone()));
        };

        if self.in_progress.contains(&index) {
            return Err(SpecError::CycleDetected(target.clone()));
        }

        if let Some(&task) = self.task_for_rule.get(&index) {
            return Ok(Some(task));
        }

        let rule = Arc::clone(&self.spec.rules[index]);
        let task = self.graph.add_node(rule.clone());

        // Registered before recursing over the inputs, so that a rule
        // reached again through another of its own outputs reuses this
        // node instead of spawning a second one.
        self.task_for_rule.insert(index, task);

        self.in_progress.push(index);
        for input in &rule.inputs {
            if let Some(dep) = self.ensure_task(input)? {
                self.graph.add_dependency(task, dep);
            }
        }
        self.in_progress.pop();

        Ok(Some(task))
    }
}
