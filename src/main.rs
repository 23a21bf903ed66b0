use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use camino::Utf8Path;
use clap::Parser;
use console::style;

use hexmake::{
    HexPath, RuleExecutor, SandboxManager, Spec, SpecError, TaskGraph, as_overhead, conduct, plan,
};

/// Command-line arguments for Hexmake
#[derive(Parser)]
#[command(version)]
#[command(arg_required_else_help = true)]
#[command(about = "Run a multi-step artifact build")]
#[command(
    long_about = r#"Hexmake runs a multi-step build. You give it a file describing all the
possible build steps along with their inputs and outputs. The tool will then
chain them together to produce the outputs you ask for, running independent
steps in parallel. Every step runs in a fresh sandbox directory, and its
outputs are published into `out/` only when all of its commands succeed.
"#
)]
#[command(
    after_long_help = r#"The tool expects a Hexmake file to exist in the current directory.
A Hexmake file looks like this:

```json
{
  "rules": [
    {
      "outputs": [
        "out/main"
      ],
      "inputs": [
        "main.c"
      ],
      "commands": [
        "cc -o out/main main.c"
      ]
    }
  ]
}
```
"#
)]
struct Args {
    /// The output paths to build
    targets: Vec<String>,

    /// List every buildable output path and exit
    #[arg(long)]
    list_targets: bool,

    /// Number of rules to run in parallel
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let spec = match load_spec() {
        Ok(spec) => spec,
        Err(error) => return invocation_error(error),
    };

    if args.list_targets {
        list_targets(&spec);
        return ExitCode::SUCCESS;
    }

    if args.targets.is_empty() {
        eprintln!("{}", style("Error: no targets requested").red());
        return ExitCode::from(2);
    }

    let targets: Vec<HexPath> = args
        .targets
        .iter()
        .map(|target| HexPath::from(target.as_str()))
        .collect();

    let s = Instant::now();
    let graph = match plan(&spec, &targets) {
        Ok(graph) => graph,
        Err(error) => return invocation_error(error),
    };
    eprintln!("Planned {} tasks {}", graph.len(), as_overhead(s));

    let jobs = args.jobs.unwrap_or_else(default_jobs);
    if run_build(&graph, jobs) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Load, parse and validate the `Hexmake` file in the current directory.
fn load_spec() -> Result<Spec, SpecError> {
    let spec = Spec::load()?;
    spec.validate()?;
    Ok(spec)
}

/// List every output path that some rule produces, sorted.
fn list_targets(spec: &Spec) {
    let mut outputs: Vec<&HexPath> = spec
        .rules
        .iter()
        .flat_map(|rule| rule.outputs.iter())
        .collect();
    outputs.sort();
    outputs.dedup();

    for output in outputs {
        println!("{output}");
    }
}

/// Wipe the scratch tree and conduct the planned build.
fn run_build(graph: &TaskGraph, jobs: usize) -> bool {
    eprintln!(
        "Running {} with {} workers.",
        style("Hexmake").red(),
        style(jobs).blue()
    );

    let s = Instant::now();
    let sandboxes = SandboxManager::new(Utf8Path::new("."));
    if let Err(error) = sandboxes.clean() {
        eprintln!(
            "{}",
            style(format!("Could not reset the scratch directory: {error}")).red()
        );
        return false;
    }
    eprintln!("Cleaned the scratch directory {}", as_overhead(s));

    let executor = RuleExecutor::new(".", &sandboxes);

    let s = Instant::now();
    let ok = conduct(graph, jobs, |rule| executor.execute(rule));
    if ok {
        eprintln!("Built {} tasks {}", graph.len(), as_overhead(s));
    }

    ok
}

fn invocation_error(error: SpecError) -> ExitCode {
    eprintln!("{}", style(format!("Error: {error}")).red());
    ExitCode::from(2)
}

fn default_jobs() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
