//! TokenFlow Core - Petri-net playout engines for synthetic event logs
//!
//! This library turns process models into event logs:
//! 1. **Semantics**: which transitions are enabled and how firing moves tokens
//! 2. **Batch playout**: N independent traces, filtered by an acceptance policy
//! 3. **Streaming generation**: an endless event stream that respects shared,
//!    capacity-limited resources
//!
//! Nets are validated once at construction; simulation never meets a
//! dangling or ill-typed arc.

pub mod acceptance;
pub mod attributes;
pub mod error;
pub mod event;
pub mod executor;
pub mod generator;
pub mod hook;
pub mod marking;
pub mod net;
pub mod playout;
pub mod resource;
pub mod semantics;

// Re-export key types for convenience
pub use acceptance::{AcceptancePolicy, Choice};
pub use attributes::{AttributeValue, Attributes};
pub use error::{FireError, NetError, PlayoutError};
pub use event::{Case, Event, EventLog};
pub use executor::{Termination, TraceExecutor, TraceOutcome, TraceStep};
pub use generator::{Advance, EventGenerator, GeneratorConfig};
pub use hook::FiringHook;
pub use marking::Marking;
pub use net::{Net, NetBuilder, PlaceId, ProcessModel, Transition, TransitionId, TransitionSpec};
pub use playout::{Playout, PlayoutConfig, PlayoutStats, RetryPolicy};
pub use resource::{Resource, ResourceRegistry};
pub use semantics::{ClassicSemantics, Semantics, SemanticsKind};
