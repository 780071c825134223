//! TokenFlow simulation harness
//!
//! Runs process models as a whole system rather than one net at a time:
//! - **Agents**: one streaming generator per process, scheduled round-robin
//!   against a shared resource registry on a virtual clock
//! - **Isolated workers**: one blocking task per process, joined in order
//! - **Randomness**: every source derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    AgentSimulator                     │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │ SimContext (virtual clock + seeded streams)     │  │
//! │  └─────────────────────────────────────────────────┘  │
//! │       │                         │                     │
//! │  ┌────▼─────┐              ┌────▼─────┐               │
//! │  │  Agent   │    tick      │  Agent   │    ...        │
//! │  │ welding  │──────────────│ painting │               │
//! │  └────┬─────┘              └────┬─────┘               │
//! │       │                         │                     │
//! │  ┌────▼─────────────────────────▼────┐                │
//! │  │        ResourceRegistry           │                │
//! │  │   (robot arm, capacity 1)         │                │
//! │  └───────────────────────────────────┘                │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tokenflow_sim::{AgentSimulator, SimConfig};
//! use tokenflow_sim::scenarios::ScenarioId;
//!
//! let scenario = ScenarioId::Mutualistic.build()?;
//! let mut sim = AgentSimulator::new(SimConfig { seed: 42, ..Default::default() });
//! for (name, model) in scenario.processes {
//!     sim.add_process(name, model);
//! }
//! for resource in scenario.resources {
//!     sim.register_resource(resource);
//! }
//! let report = sim.run();
//! ```

mod agent;
mod context;
mod error;
mod exporter;
mod runner;
mod world;
pub mod scenarios;

pub use agent::ProcessAgent;
pub use context::SimContext;
pub use error::SimError;
pub use exporter::{EventRecord, LogExport};
pub use runner::{IsolatedRunner, DEFAULT_STEPS_PER_EVENT};
pub use world::{AgentSimulator, SimConfig, SimReport, SimTermination};
