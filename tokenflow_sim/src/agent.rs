//! ProcessAgent - one process model driven by its own event generator.

use tokenflow_core::{Advance, Event, EventGenerator, ResourceRegistry};
use tokenflow_env::InstanceId;
use tracing::debug;

/// An autonomous agent executing one business process.
pub struct ProcessAgent {
    /// Unique agent identity
    pub id: InstanceId,

    /// Name recorded on every event of this agent
    pub name: String,

    generator: EventGenerator,

    /// Events emitted so far
    events: Vec<Event>,

    /// Set once the generator can never emit again
    exhausted: bool,
}

impl ProcessAgent {
    pub fn new(id: InstanceId, name: impl Into<String>, generator: EventGenerator) -> Self {
        Self {
            id,
            name: name.into(),
            generator,
            events: Vec::new(),
            exhausted: false,
        }
    }

    /// Runs the generator for at most `budget` steps against the shared
    /// registry. Returns the first event emitted, tagged with the agent name.
    pub fn attempt(&mut self, registry: &ResourceRegistry, budget: usize) -> Option<Event> {
        if self.exhausted {
            return None;
        }

        for _ in 0..budget {
            match self.generator.advance(Some(registry)) {
                Advance::Emitted(event) => {
                    let event = event.with_agent(self.name.as_str());
                    self.events.push(event.clone());
                    return Some(event);
                }
                Advance::Blocked(t) => {
                    let name = self
                        .generator
                        .model()
                        .net
                        .transition(t)
                        .map(|t| t.name().to_string())
                        .unwrap_or_default();
                    debug!("{}: {} waits for a resource", self.name, name);
                    // Retry on the next tick
                    return None;
                }
                Advance::Exhausted => {
                    debug!("{}: nothing enabled from the initial marking", self.name);
                    self.exhausted = true;
                    return None;
                }
                Advance::Fired(_) | Advance::TraceEnded { .. } => {}
            }
        }
        None
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// True once the agent reached `quota` events or can emit no more.
    pub fn is_done(&self, quota: usize) -> bool {
        self.exhausted || self.events.len() >= quota
    }

    pub fn generator(&self) -> &EventGenerator {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::scenarios::order_process;
    use tokenflow_core::GeneratorConfig;

    fn agent(seed: u64) -> ProcessAgent {
        let ctx = SimContext::shared(seed);
        let generator =
            EventGenerator::new(order_process().unwrap(), GeneratorConfig::default(), ctx, 0);
        ProcessAgent::new(InstanceId::from_seed(0), "order", generator)
    }

    #[test]
    fn test_attempt_tags_events() {
        let mut agent = agent(42);
        let registry = ResourceRegistry::new();

        let event = agent.attempt(&registry, 16).unwrap();
        assert_eq!(event.activity, "Receive Order");
        assert_eq!(event.agent_id.as_deref(), Some("order"));
        assert_eq!(agent.event_count(), 1);
    }

    #[test]
    fn test_budget_bounds_work() {
        let mut agent = agent(42);
        let registry = ResourceRegistry::new();

        // the fourth event closes the case; the next step only rolls over
        for _ in 0..4 {
            assert!(agent.attempt(&registry, 1).is_some());
        }
        assert!(agent.attempt(&registry, 1).is_none());
        assert!(agent.attempt(&registry, 1).is_some());
        assert!(!agent.is_done(10));
        assert!(agent.is_done(5));
    }
}
