//! AgentSimulator - cooperative multi-agent playout over shared resources.

use crate::agent::ProcessAgent;
use crate::context::SimContext;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokenflow_core::{Event, EventGenerator, GeneratorConfig, ProcessModel, Resource, ResourceRegistry};
use tokenflow_env::{FlowContext, InstanceId};
use tracing::{debug, info};

/// Configuration for a multi-agent run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Events each agent produces before it stops
    pub max_events_per_agent: usize,

    /// Time budget, measured on the simulator's context clock
    pub max_duration: Duration,

    /// Virtual time between two scheduler rounds (ignored on a real clock)
    pub tick_interval: Duration,

    /// Generator steps an agent may take per round
    pub steps_per_tick: usize,

    /// Bound on visible transitions per trace
    pub max_trace_length: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_events_per_agent: 100,
            max_duration: Duration::from_secs(8 * 3600),
            tick_interval: Duration::from_secs(1),
            steps_per_tick: 64,
            max_trace_length: 10_000,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_events(mut self, n: usize) -> Self {
        self.max_events_per_agent = n;
        self
    }

    pub fn with_max_duration(mut self, d: Duration) -> Self {
        self.max_duration = d;
        self
    }

    pub fn with_max_trace_length(mut self, n: usize) -> Self {
        self.max_trace_length = n;
        self
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTermination {
    /// Every agent produced its quota.
    QuotaReached,
    /// The time budget ran out first.
    DeadlineElapsed,
    /// Every agent still short of its quota can never emit again.
    Exhausted,
}

/// Outcome of [`AgentSimulator::run`].
#[derive(Debug, Clone)]
pub struct SimReport {
    /// All events, in the order they were emitted
    pub events: Vec<Event>,
    pub ticks: u64,
    pub elapsed: Duration,
    /// Event count per agent name
    pub per_agent: BTreeMap<String, usize>,
    pub termination: SimTermination,
}

/// The multi-agent simulator.
///
/// Agents take turns in a fixed round-robin order, one attempt each per
/// round, so shared resources are only touched by one agent at a time.
///
/// The deadline is measured on the context's clock. With a [`SimContext`]
/// the simulator drives that clock itself, one `tick_interval` per round;
/// any other context (e.g. `SystemContext`) keeps its own time.
pub struct AgentSimulator {
    /// Configuration
    pub config: SimConfig,

    /// Context every agent draws its time and randomness from
    pub context: Arc<dyn FlowContext>,

    /// Virtual clock advanced per round, when the context is simulated
    clock: Option<Arc<SimContext>>,

    /// Context time at which the simulator was created
    started: Duration,

    agents: Vec<ProcessAgent>,

    registry: ResourceRegistry,

    tick_count: u64,
}

impl AgentSimulator {
    /// A simulator on a fresh virtual clock seeded from `config.seed`.
    pub fn new(config: SimConfig) -> Self {
        let clock = SimContext::shared(config.seed);
        let context: Arc<dyn FlowContext> = clock.clone();
        let mut sim = Self::with_context(config, context);
        sim.clock = Some(clock);
        sim
    }

    /// A simulator on an external context, e.g. the system clock.
    pub fn with_context(config: SimConfig, context: Arc<dyn FlowContext>) -> Self {
        Self {
            config,
            started: context.now(),
            context,
            clock: None,
            agents: Vec::new(),
            registry: ResourceRegistry::new(),
            tick_count: 0,
        }
    }

    /// Time spent since the simulator was created, on the context clock.
    pub fn elapsed(&self) -> Duration {
        self.context.now().saturating_sub(self.started)
    }

    /// Adds an agent for `model`. The agent's random stream is its index.
    pub fn add_process(&mut self, name: impl Into<String>, model: ProcessModel) -> InstanceId {
        let stream = self.agents.len() as u64;
        let config = GeneratorConfig::default().with_max_trace_length(self.config.max_trace_length);
        let generator = EventGenerator::new(model, config, Arc::clone(&self.context), stream);

        let id = InstanceId::from_seed(self.config.seed.wrapping_add(stream));
        self.agents.push(ProcessAgent::new(id, name, generator));
        id
    }

    /// Registers a resource all agents compete for.
    pub fn register_resource(&mut self, resource: Arc<Resource>) {
        info!("Registered shared resource: {}", resource);
        self.registry.register(resource);
    }

    pub fn agents(&self) -> &[ProcessAgent] {
        &self.agents
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Runs one scheduler round: every unfinished agent makes one attempt,
    /// then a virtual clock advances by one tick.
    pub fn tick(&mut self) -> Vec<Event> {
        let quota = self.config.max_events_per_agent;
        let budget = self.config.steps_per_tick;
        let mut emitted = Vec::new();

        for agent in self.agents.iter_mut().filter(|a| !a.is_done(quota)) {
            if let Some(event) = agent.attempt(&self.registry, budget) {
                emitted.push(event);
            }
        }

        if let Some(clock) = &self.clock {
            clock.advance_time(self.config.tick_interval);
        }
        self.tick_count += 1;
        emitted
    }

    /// Runs until every agent reached its quota or the time budget is spent.
    pub fn run(&mut self) -> SimReport {
        let quota = self.config.max_events_per_agent;
        let mut events = Vec::new();

        let termination = loop {
            if self.agents.iter().all(|a| a.is_done(quota)) {
                if self.agents.iter().all(|a| a.event_count() >= quota) {
                    break SimTermination::QuotaReached;
                }
                break SimTermination::Exhausted;
            }
            if self.elapsed() >= self.config.max_duration {
                break SimTermination::DeadlineElapsed;
            }

            events.extend(self.tick());

            if self.tick_count % 3600 == 0 {
                debug!(
                    "t={:?} | events={} | {}",
                    self.elapsed(),
                    events.len(),
                    self.registry
                        .iter()
                        .map(|r| r.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        };

        let per_agent: BTreeMap<String, usize> = self
            .agents
            .iter()
            .map(|a| (a.name.clone(), a.event_count()))
            .collect();

        info!(
            "Simulation finished after {} ticks ({:?}) with {} events",
            self.tick_count,
            termination,
            events.len()
        );

        SimReport {
            events,
            ticks: self.tick_count,
            elapsed: self.elapsed(),
            per_agent,
            termination,
        }
    }
}
