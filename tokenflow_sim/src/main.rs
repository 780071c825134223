//! TokenFlow event-log generator CLI
//!
//! Plays out built-in process scenarios and writes synthetic event logs.

use clap::{Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokenflow_core::{Event, EventGenerator, GeneratorConfig, Playout, PlayoutConfig};
use tokenflow_env::FlowContext;
use tokenflow_sim::scenarios::{Scenario, ScenarioId};
use tokenflow_sim::{
    AgentSimulator, IsolatedRunner, LogExport, SimConfig, SimContext, SimError,
    DEFAULT_STEPS_PER_EVENT,
};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Batch playout of independent traces
    Playout,
    /// Streaming generator, one process after the other
    Stream,
    /// Round-robin agents over shared resources
    Agents,
    /// One parallel worker per process
    Isolated,
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Playout => "playout",
            Mode::Stream => "stream",
            Mode::Agents => "agents",
            Mode::Isolated => "isolated",
        }
    }
}

/// TokenFlow synthetic event-log generator
#[derive(Parser, Debug)]
#[command(name = "tokenflow-sim")]
#[command(about = "Generate synthetic event logs by playing out Petri nets", long_about = None)]
struct Args {
    /// Scenario to run (order_process, online_order, mutualistic)
    #[arg(short = 'S', long, default_value = "order_process")]
    scenario: String,

    /// Generation mode
    #[arg(short, long, value_enum, default_value = "playout")]
    mode: Mode,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Traces per process (playout mode)
    #[arg(short, long, default_value = "100")]
    traces: usize,

    /// Events per process (stream, agents and isolated modes)
    #[arg(short, long, default_value = "100")]
    events: usize,

    /// Maximum visible transitions per trace
    #[arg(long, default_value = "1000")]
    max_trace_length: usize,

    /// Keep only traces that reach the final marking
    #[arg(long)]
    require_final: bool,

    /// Accept markings covering the final marking
    #[arg(long)]
    superset: bool,

    /// Playout configuration file (JSON); overrides the playout flags
    #[arg(long)]
    config: Option<String>,

    /// Virtual time budget in hours (agents mode)
    #[arg(short, long, default_value = "8")]
    duration: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output on stdout
    #[arg(long)]
    json: bool,

    /// Export the generated log to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn playout_config(args: &Args, ctx: &SimContext) -> Result<PlayoutConfig, SimError> {
    if let Some(path) = &args.config {
        let json = std::fs::read_to_string(path)?;
        return Ok(PlayoutConfig::from_json(&json)?);
    }
    let config = PlayoutConfig::default()
        .with_num_traces(args.traces)
        .with_max_trace_length(args.max_trace_length)
        .with_initial_timestamp(ctx.wall_clock())
        .with_require_final_marking(args.require_final)
        .with_superset_accepted(args.superset);
    config.validate()?;
    Ok(config)
}

fn generator_config(args: &Args) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_max_trace_length(args.max_trace_length)
        .with_require_final_marking(args.require_final)
        .with_superset_accepted(args.superset)
}

fn run_playout(args: &Args, scenario: Scenario, ctx: Arc<SimContext>) -> Result<Vec<Event>, SimError> {
    let config = playout_config(args, &ctx)?;
    let mut events = Vec::new();

    for (stream, (name, model)) in scenario.processes.into_iter().enumerate() {
        let mut rng = ctx.derive_rng(stream as u64);
        let log = Playout::new(model, config.clone())?.run(&mut rng)?;
        info!("{}: {} cases, {} events", name, log.len(), log.event_count());
        events.extend(log.into_events().into_iter().map(|e| e.with_agent(name.as_str())));
    }
    Ok(events)
}

fn run_stream(args: &Args, scenario: Scenario, ctx: Arc<SimContext>) -> Vec<Event> {
    let mut registry = tokenflow_core::ResourceRegistry::new();
    for resource in scenario.resources {
        registry.register(resource);
    }

    let mut events = Vec::new();
    for (stream, (name, model)) in scenario.processes.into_iter().enumerate() {
        let flow: Arc<dyn FlowContext> = ctx.clone();
        let mut generator = EventGenerator::new(model, generator_config(args), flow, stream as u64);
        let before = events.len();

        while events.len() - before < args.events {
            match generator.next_event_within(DEFAULT_STEPS_PER_EVENT, Some(&registry)) {
                Some(event) => events.push(event.with_agent(name.as_str())),
                None => {
                    debug!("{}: no event within {} steps", name, DEFAULT_STEPS_PER_EVENT);
                    break;
                }
            }
        }
        info!("{}: {} events (prefix {})", name, events.len() - before, generator.prefix());
    }
    events
}

fn run_agents(args: &Args, scenario: Scenario, seed: u64) -> Vec<Event> {
    let config = SimConfig::default()
        .with_seed(seed)
        .with_max_events(args.events)
        .with_max_trace_length(args.max_trace_length)
        .with_max_duration(Duration::from_secs_f64(args.duration.max(0.0) * 3600.0));

    let mut sim = AgentSimulator::new(config);
    for (name, model) in scenario.processes {
        sim.add_process(name, model);
    }
    for resource in scenario.resources {
        sim.register_resource(resource);
    }

    let report = sim.run();
    for (agent, count) in &report.per_agent {
        info!("  {}: {} events", agent, count);
    }
    info!(
        "{:?} after {} ticks ({:.1}h virtual)",
        report.termination,
        report.ticks,
        report.elapsed.as_secs_f64() / 3600.0
    );
    report.events
}

fn run_isolated(args: &Args, scenario: Scenario, ctx: Arc<SimContext>) -> Result<Vec<Event>, SimError> {
    let runtime = tokio::runtime::Runtime::new()?;
    let runner = IsolatedRunner::new(ctx).with_generator_config(generator_config(args));
    runtime.block_on(runner.run(scenario.processes, args.events))
}

fn run(args: &Args, scenario_id: ScenarioId, seed: u64) -> Result<LogExport, SimError> {
    let scenario = scenario_id.build()?;
    let ctx = SimContext::shared(seed);

    let events = match args.mode {
        Mode::Playout => run_playout(args, scenario, ctx)?,
        Mode::Stream => run_stream(args, scenario, ctx),
        Mode::Agents => run_agents(args, scenario, seed),
        Mode::Isolated => run_isolated(args, scenario, ctx)?,
    };

    let mut export = LogExport::new(scenario_id.name(), seed, args.mode.name());
    export.extend(&events);
    Ok(export)
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let scenario: ScenarioId = args.scenario.parse().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available scenarios: order_process, online_order, mutualistic");
        std::process::exit(1);
    });

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    if !args.json {
        info!("TokenFlow event-log generator v{}", env!("CARGO_PKG_VERSION"));
        info!("{} ({}) mode={} seed={}", scenario.name(), scenario.description(), args.mode.name(), seed);
    }

    let export = match run(&args, scenario, seed) {
        Ok(export) => export,
        Err(e) => {
            error!("✗ {} failed: {}", scenario.name(), e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.export {
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} events to {}", export.events.len(), path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.json {
        match export.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize log: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("✓ {} events in {} cases", export.events.len(), export.case_count);
    }
}
