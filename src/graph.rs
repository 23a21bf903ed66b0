//! The build graph: vertices wrap rules, edges are index-based.
//!
//! The graph is mutated only while the planner constructs it. Once planning
//! finishes it is frozen and shared read-only with the worker pool; the one
//! field workers touch is the atomic pending counter on each vertex.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::path::HexPath;
use crate::spec::Rule;

/// Index of a vertex within its [`TaskGraph`], assigned in creation order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TaskId(pub(crate) usize);

/// A vertex standing for one rule's execution.
#[derive(Debug)]
pub struct TaskNode {
    rule: Arc<Rule>,
    depends_on: Vec<TaskId>,
    needed_by: Vec<TaskId>,
    pending: AtomicUsize,
}

impl TaskNode {
    fn new(rule: Arc<Rule>) -> TaskNode {
        TaskNode {
            rule,
            depends_on: Vec::new(),
            needed_by: Vec::new(),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    /// The path this task is best known by: its first declared output. The
    /// planner only creates nodes for rules reached through one of their
    /// outputs, so the list is never empty here.
    pub fn label(&self) -> &HexPath {
        &self.rule.outputs[0]
    }

    /// Number of dependencies that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Record that one dependency finished; returns the new count. Called
    /// from worker threads; reaching zero makes this task ready.
    pub fn dependency_finished(&self) -> usize {
        self.pending.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Tasks this one waits for, in insertion order.
    pub fn depends_on(&self) -> &[TaskId] {
        &self.depends_on
    }

    /// Tasks waiting for this one, in insertion order.
    pub fn needed_by(&self) -> &[TaskId] {
        &self.needed_by
    }
}

/// The set of tasks needed for one run, in planner creation order.
#[derive(Default, Debug)]
pub struct TaskGraph {
    nodes: Vec<TaskNode>,
}

impl TaskGraph {
    pub(crate) fn add_node(&mut self, rule: Arc<Rule>) -> TaskId {
        let id = TaskId(self.nodes.len());
        self.nodes.push(TaskNode::new(rule));
        id
    }

    /// Wire `task` to wait for `dep`. A duplicate edge is silently ignored.
    pub(crate) fn add_dependency(&mut self, task: TaskId, dep: TaskId) {
        if self.nodes[task.0].depends_on.contains(&dep) {
            return;
        }

        self.nodes[task.0].depends_on.push(dep);
        self.nodes[dep.0].needed_by.push(task);
        self.nodes[task.0].pending.fetch_add(1, Ordering::SeqCst);
    }

    pub fn node(&self, id: TaskId) -> &TaskNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.nodes.len()).map(TaskId)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.iter()
    }
}
