//! Dependency-driven parallel execution of a [`TaskGraph`].
//!
//! A bounded pool of workers pulls ready tasks from a shared channel. Every
//! finished task releases one completion permit to the conducting thread
//! and decrements the pending count of its dependents, enqueueing any that
//! become ready. The first failure latches a flag and floods the pool with
//! a shutdown sentinel; commands already running finish naturally, but
//! nothing new is dispatched.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use console::style;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::error::TaskError;
use crate::graph::{TaskGraph, TaskId};
use crate::spec::Rule;

/// Messages flowing through the ready queue. Workers re-send `Shutdown` on
/// receipt so the sentinel sweeps the whole pool.
enum Signal {
    Task(TaskId),
    Shutdown,
}

/// Run every task in `graph`, at most `jobs` at a time, respecting
/// dependency edges. Returns true iff every task succeeded.
///
/// The rule-running closure is what a worker invokes per task; production
/// wires it to [`RuleExecutor::execute`](crate::RuleExecutor::execute).
pub fn conduct<F>(graph: &TaskGraph, jobs: usize, run_rule: F) -> bool
where
    F: Fn(&Rule) -> Result<(), TaskError> + Sync,
{
    let total = graph.len();
    if total == 0 {
        return true;
    }

    let (ready_tx, ready_rx) = unbounded::<Signal>();
    let (done_tx, done_rx) = unbounded::<()>();
    let failed = AtomicBool::new(false);

    for id in graph.ids() {
        if graph.node(id).pending() == 0 {
            let _ = ready_tx.send(Signal::Task(id));
        }
    }

    thread::scope(|scope| {
        for _ in 0..jobs.max(1) {
            let ready_tx = ready_tx.clone();
            let ready_rx = ready_rx.clone();
            let done_tx = done_tx.clone();
            let failed = &failed;
            let run_rule = &run_rule;

            scope.spawn(move || {
                worker_loop(graph, run_rule, ready_tx, ready_rx, done_tx, failed);
            });
        }

        // One permit arrives per finished task. Stop waiting the moment a
        // failure is recorded; permits from tasks still in flight drain
        // into the unbounded channel.
        for _ in 0..total {
            if done_rx.recv().is_err() || failed.load(Ordering::SeqCst) {
                break;
            }
        }

        let _ = ready_tx.send(Signal::Shutdown);
    });

    !failed.load(Ordering::SeqCst)
}

fn worker_loop<F>(
    graph: &TaskGraph,
    run_rule: &F,
    ready_tx: Sender<Signal>,
    ready_rx: Receiver<Signal>,
    done_tx: Sender<()>,
    failed: &AtomicBool,
) where
    F: Fn(&Rule) -> Result<(), TaskError> + Sync,
{
    while let Ok(signal) = ready_rx.recv() {
        let id = match signal {
            Signal::Task(id) => id,
            Signal::Shutdown => {
                let _ = ready_tx.send(Signal::Shutdown);
                return;
            }
        };

        let node = graph.node(id);
        let result =
            catch_unwind(AssertUnwindSafe(|| run_rule(node.rule()))).unwrap_or_else(|panic| {
                let message = if let Some(text) = panic.downcast_ref::<&str>() {
                    (*text).to_string()
                } else if let Some(text) = panic.downcast_ref::<String>() {
                    text.clone()
                } else {
                    String::from("unknown panic payload")
                };

                Err(TaskError::Panicked(message))
            });

        match result {
            Ok(()) => {
                let _ = done_tx.send(());

                for successor in node.needed_by() {
                    if graph.node(*successor).dependency_finished() == 0 {
                        let _ = ready_tx.send(Signal::Task(*successor));
                    }
                }
            }
            Err(error) => {
                eprintln!(
                    "{}",
                    style(format!("Task `{}` failed: {error}", node.label())).red()
                );

                failed.store(true, Ordering::SeqCst);
                let _ = ready_tx.send(Signal::Shutdown);
                let _ = done_tx.send(());
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::path::HexPath;
    use crate::plan::plan;
    use crate::spec::Spec;

    /// Conduct the graph while recording the label of every executed task.
    fn conduct_recording(graph: &TaskGraph, jobs: usize, fail: &[&str]) -> (bool, Vec<String>) {
        let ran = Mutex::new(Vec::new());

        let ok = conduct(graph, jobs, |rule| {
            let label = rule.outputs[0].to_string();
            ran.lock().unwrap().push(label.clone());

            if fail.contains(&label.as_str()) {
                return Err(TaskError::MissingInput(HexPath::from("injected")));
            }

            Ok(())
        });

        (ok, ran.into_inner().unwrap())
    }

    fn position(ran: &[String], label: &str) -> usize {
        ran.iter().position(|l| l == label).unwrap()
    }

    fn rule(outputs: &[&str], inputs: &[&str]) -> Arc<Rule> {
        Arc::new(Rule {
            outputs: outputs.iter().copied().map(HexPath::from).collect(),
            inputs: inputs.iter().copied().map(HexPath::from).collect(),
            commands: vec![],
        })
    }

    fn diamond_spec() -> Spec {
        Spec {
            environ: vec![],
            rules: vec![
                rule(&["out/top"], &["out/left", "out/right"]),
                rule(&["out/left"], &["out/base"]),
                rule(&["out/right"], &["out/base"]),
                rule(&["out/base"], &["base.c"]),
            ],
        }
    }

    #[test]
    fn test_runs_every_task_exactly_once() {
        let spec = diamond_spec();
        let graph = plan(&spec, &[HexPath::from("out/top")]).unwrap();

        let (ok, ran) = conduct_recording(&graph, 4, &[]);

        assert!(ok);
        assert_eq!(ran.len(), 4);

        let mut sorted = ran.clone();
        sorted.sort();
        assert_eq!(sorted, ["out/base", "out/left", "out/right", "out/top"]);
    }

    #[test]
    fn test_dependencies_run_before_dependents() {
        let spec = diamond_spec();
        let graph = plan(&spec, &[HexPath::from("out/top")]).unwrap();

        let (ok, ran) = conduct_recording(&graph, 4, &[]);

        assert!(ok);
        assert!(position(&ran, "out/base") < position(&ran, "out/left"));
        assert!(position(&ran, "out/base") < position(&ran, "out/right"));
        assert!(position(&ran, "out/left") < position(&ran, "out/top"));
        assert!(position(&ran, "out/right") < position(&ran, "out/top"));
    }

    #[test]
    fn test_single_worker_runs_in_topological_order() {
        let spec = Spec {
            environ: vec![],
            rules: vec![
                rule(&["out/c"], &["out/b"]),
                rule(&["out/b"], &["out/a"]),
                rule(&["out/a"], &["a.c"]),
            ],
        };
        let graph = plan(&spec, &[HexPath::from("out/c")]).unwrap();

        let (ok, ran) = conduct_recording(&graph, 1, &[]);

        assert!(ok);
        assert_eq!(ran, ["out/a", "out/b", "out/c"]);
    }

    #[test]
    fn test_failure_skips_dependents() {
        let spec = diamond_spec();
        let graph = plan(&spec, &[HexPath::from("out/top")]).unwrap();

        let (ok, ran) = conduct_recording(&graph, 4, &["out/base"]);

        assert!(!ok);
        assert_eq!(ran, ["out/base"]);
    }

    #[test]
    fn test_failure_mid_graph_aborts_the_run() {
        let spec = Spec {
            environ: vec![],
            rules: vec![
                rule(&["out/c"], &["out/b"]),
                rule(&["out/b"], &["out/a"]),
                rule(&["out/a"], &["a.c"]),
            ],
        };
        let graph = plan(&spec, &[HexPath::from("out/c")]).unwrap();

        let (ok, ran) = conduct_recording(&graph, 2, &["out/b"]);

        assert!(!ok);
        assert_eq!(ran, ["out/a", "out/b"]);
    }

    #[test]
    fn test_panic_counts_as_failure() {
        let spec = Spec {
            environ: vec![],
            rules: vec![rule(&["out/a"], &[])],
        };
        let graph = plan(&spec, &[HexPath::from("out/a")]).unwrap();

        let ok = conduct(&graph, 2, |_| panic!("boom"));

        assert!(!ok);
    }

    #[test]
    fn test_empty_graph_succeeds() {
        let graph = TaskGraph::default();
        assert!(conduct(&graph, 4, |_| Ok(())));
    }

    #[test]
    fn test_independent_tasks_all_run() {
        let spec = Spec {
            environ: vec![],
            rules: vec![
                rule(&["out/a"], &[]),
                rule(&["out/b"], &[]),
                rule(&["out/c"], &[]),
            ],
        };
        let graph = plan(
            &spec,
            &[
                HexPath::from("out/a"),
                HexPath::from("out/b"),
                HexPath::from("out/c"),
            ],
        )
        .unwrap();

        let (ok, ran) = conduct_recording(&graph, 8, &[]);

        assert!(ok);
        assert_eq!(ran.len(), 3);
    }
}
