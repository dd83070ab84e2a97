use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tlm_core::{KERNEL_VERSION, MessageHandler, Severity};
use tlm_project::{ModelDocument, ProjectError, SimulationDef, build_model};
use tlm_results::{
    ResultsError, RunManifest, RunOutcome, RunSpec, RunStore, Series, SeriesSet, compare_series, read_csv,
};
use tlm_sim::{ComponentSystem, Essentials, Member, SimError, SimOutcome};

#[derive(Parser)]
#[command(name = "tlm-cli")]
#[command(about = "TLM co-simulation kernel - headless model runner", long_about = None)]
struct Cli {
    /// Also print debug messages from the kernel
    #[arg(long, global = true)]
    debug: bool,

    /// Measure wall time of initialize and simulate
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, build and initialize a model without running it
    Validate {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
    },
    /// Run a model and store the selected series
    Run {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
        /// Stop time in seconds (overrides the model)
        #[arg(long)]
        stop: Option<f64>,
        /// Top-level timestep in seconds (overrides the model)
        #[arg(long)]
        timestep: Option<f64>,
        /// Series to store, as component.port.slot (repeatable)
        #[arg(long = "save")]
        save: Vec<String>,
        /// Run store directory (defaults to .tlm/runs next to the model)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the component hierarchy of a model
    Tree {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
        /// Show resolved timesteps of nested systems
        #[arg(long)]
        timesteps: bool,
        /// Show parameter values and bindings
        #[arg(long)]
        params: bool,
    },
    /// List the registered component types
    Components,
    /// Run a model and compare it with a reference CSV
    Test {
        /// Path to the model YAML or JSON file
        model_path: PathBuf,
        /// Reference series (time column plus component.port.slot columns)
        reference: PathBuf,
        /// Tolerance relative to the reference magnitude
        #[arg(long, default_value_t = 1e-3)]
        tol: f64,
    },
}

type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Series label '{label}' is not component.port.slot")]
    BadLabel { label: String },

    #[error("{count} series differ from the reference")]
    Mismatch { count: usize },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.timing {
        tlm_core::timing::enable_timing();
    }
    let mut essentials = Essentials::new();

    let result = match cli.command {
        Commands::Validate { model_path } => cmd_validate(&mut essentials, &model_path),
        Commands::Run {
            model_path,
            stop,
            timestep,
            save,
            out,
        } => cmd_run(&mut essentials, &model_path, stop, timestep, &save, out.as_deref()),
        Commands::Tree {
            model_path,
            timesteps,
            params,
        } => cmd_tree(&mut essentials, &model_path, timesteps, params),
        Commands::Components => {
            cmd_components(&essentials);
            Ok(())
        }
        Commands::Test {
            model_path,
            reference,
            tol,
        } => cmd_test(&mut essentials, &model_path, &reference, tol),
    };

    print_messages(essentials.messages(), cli.debug);
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(()) if essentials.messages().has_errors() => ExitCode::FAILURE,
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn print_messages(messages: &MessageHandler, debug: bool) {
    for message in messages.drain() {
        if message.severity == Severity::Debug && !debug {
            continue;
        }
        println!("{message}");
    }
}

fn apply_overrides(simulation: &mut SimulationDef, stop: Option<f64>, timestep: Option<f64>) {
    if let Some(stop) = stop {
        simulation.stop = stop;
    }
    if let Some(timestep) = timestep {
        simulation.timestep = timestep;
    }
}

fn run_spec(simulation: &SimulationDef) -> RunSpec {
    RunSpec {
        start: simulation.start,
        stop: simulation.stop,
        timestep: simulation.timestep,
        log_samples: simulation.log_samples,
    }
}

fn run_outcome(outcome: &SimOutcome) -> RunOutcome {
    match outcome {
        SimOutcome::Completed { time, steps } => RunOutcome::Completed {
            time: *time,
            steps: *steps,
        },
        SimOutcome::Stopped { time, reason } => RunOutcome::Stopped {
            time: *time,
            reason: reason.clone(),
        },
    }
}

fn simulate(essentials: &mut Essentials, model: &ModelDocument) -> CliResult<(ComponentSystem, SimOutcome)> {
    let sim = &model.simulation;
    let mut system = build_model(essentials, model)?;
    system.initialize(sim.start, sim.stop)?;
    let outcome = system.simulate(sim.stop)?;
    system.finalize()?;
    Ok((system, outcome))
}

fn parse_label(label: &str) -> CliResult<(String, String, String)> {
    Series::parse_label(label).ok_or_else(|| CliError::BadLabel {
        label: label.to_string(),
    })
}

fn collect_series(system: &ComponentSystem, labels: &[String]) -> CliResult<SeriesSet> {
    let mut set = SeriesSet {
        times: system.log_times().to_vec(),
        series: Vec::new(),
    };
    for label in labels {
        let (component, port, slot) = parse_label(label)?;
        let values = system.log_series(&component, &port, &slot)?;
        set.series.push(Series::new(&component, &port, &slot, values));
    }
    Ok(set)
}

fn cmd_validate(essentials: &mut Essentials, model_path: &Path) -> CliResult<()> {
    println!("Validating model: {}", model_path.display());
    let model = tlm_project::load(model_path)?;
    let mut system = build_model(essentials, &model)?;
    system.initialize(model.simulation.start, model.simulation.stop)?;
    system.finalize()?;
    println!(
        "✓ Model is valid ({} members, {} connections)",
        system.members().len(),
        system.connections().len()
    );
    Ok(())
}

fn cmd_run(
    essentials: &mut Essentials,
    model_path: &Path,
    stop: Option<f64>,
    timestep: Option<f64>,
    save: &[String],
    out: Option<&Path>,
) -> CliResult<()> {
    let mut model = tlm_project::load(model_path)?;
    apply_overrides(&mut model.simulation, stop, timestep);
    println!("Running model: {}", model.name);
    println!(
        "  t = {} .. {} s, dt = {} s",
        model.simulation.start, model.simulation.stop, model.simulation.timestep
    );

    let (system, outcome) = simulate(essentials, &model)?;
    match &outcome {
        SimOutcome::Completed { time, steps } => println!("✓ Completed {steps} steps, t = {time}"),
        SimOutcome::Stopped { time, reason } => println!("! Stopped at t = {time}: {reason}"),
    }
    if let Some(wall) = system.simulation_wall_time() {
        println!("  Simulation wall time: {wall:.3} s");
    }

    let set = collect_series(&system, save)?;
    let store = match out {
        Some(dir) => RunStore::new(dir.to_path_buf())?,
        None => RunStore::for_model(model_path)?,
    };
    let manifest = RunManifest::new(
        &model,
        run_spec(&model.simulation),
        run_outcome(&outcome),
        KERNEL_VERSION,
    );
    let dir = store.save_run(&manifest, &set)?;
    tracing::info!(run_id = %manifest.run_id, series = set.series.len(), "stored run");
    println!("  Time points: {}", set.times.len());
    println!("  Saved run {} to {}", manifest.run_id, dir.display());
    Ok(())
}

fn print_tree(system: &ComponentSystem, depth: usize, timesteps: bool, params: bool) {
    let indent = "  ".repeat(depth);
    for member in system.members() {
        match member {
            Member::Component(c) => {
                println!("{indent}{} ({}, {})", c.name(), c.type_name(), c.cqs().as_str());
                if params {
                    for p in c.parameters().iter() {
                        match &p.binding {
                            Some(binding) => println!("{indent}    {} -> {binding}", p.name),
                            None => println!("{indent}    {} = {} {}", p.name, p.value, p.unit),
                        }
                    }
                }
            }
            Member::System(sub) => {
                let mut line = format!("{indent}{} [subsystem, {}]", sub.name(), sub.cqs().as_str());
                if timesteps {
                    line.push_str(&format!("  dt = {} s", sub.timestep()));
                    if sub.inherits_timestep() {
                        line.push_str(" (inherited)");
                    }
                }
                println!("{line}");
                if params {
                    for (name, value) in sub.system_parameters() {
                        println!("{indent}    ${name} = {value}");
                    }
                }
                print_tree(sub, depth + 1, timesteps, params);
            }
        }
    }
}

fn cmd_tree(essentials: &mut Essentials, model_path: &Path, timesteps: bool, params: bool) -> CliResult<()> {
    let model = tlm_project::load(model_path)?;
    let mut system = build_model(essentials, &model)?;
    // timesteps and subsystem causality are resolved at initialize
    let resolved = system.initialize(model.simulation.start, model.simulation.stop).is_ok();
    if resolved {
        system.finalize()?;
    }

    let mut header = system.name().to_string();
    if timesteps {
        header.push_str(&format!("  dt = {} s", system.timestep()));
    }
    println!("{header}");
    if params {
        for (name, value) in system.system_parameters() {
            println!("    ${name} = {value}");
        }
    }
    print_tree(&system, 1, timesteps, params);
    if !resolved {
        println!("(model does not initialize; timesteps and causalities are unresolved)");
    }
    Ok(())
}

fn cmd_components(essentials: &Essentials) {
    println!("Component types:");
    for entry in essentials.component_types() {
        println!("  {:<46} {}  {}", entry.type_name, entry.cqs.as_str(), entry.description);
    }
    println!("Libraries:");
    for library in essentials.libraries() {
        println!("  {} (kernel {})", library.name, library.kernel_version);
    }
}

fn cmd_test(essentials: &mut Essentials, model_path: &Path, reference_path: &Path, tol: f64) -> CliResult<()> {
    let model = tlm_project::load(model_path)?;
    let reference = read_csv(File::open(reference_path)?)?;
    println!(
        "Testing {} against {} ({} series, tol = {tol})",
        model.name,
        reference_path.display(),
        reference.series.len()
    );

    let (system, outcome) = simulate(essentials, &model)?;
    if let SimOutcome::Stopped { time, reason } = &outcome {
        println!("! Stopped at t = {time}: {reason}");
    }

    let mut actual = SeriesSet {
        times: system.log_times().to_vec(),
        series: Vec::new(),
    };
    for r in &reference.series {
        if let Ok(values) = system.log_series(&r.component, &r.port, &r.slot) {
            actual.series.push(Series::new(&r.component, &r.port, &r.slot, values));
        }
    }

    let deviations = compare_series(&actual, &reference, tol);
    let failed = deviations.iter().filter(|d| !d.within).count();
    for d in &deviations {
        let mark = if d.within { "✓" } else { "✗" };
        println!("  {mark} {}  max error {:.3e} at t = {}", d.label, d.max_error, d.time);
    }
    if failed > 0 {
        return Err(CliError::Mismatch { count: failed });
    }
    println!("✓ All series within tolerance");
    Ok(())
}
