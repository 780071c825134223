//! Streaming event generator.
//!
//! An [`EventGenerator`] plays out traces back to back, forever. Each call to
//! [`EventGenerator::advance`] performs exactly one step of the state
//! machine below and reports what happened:
//!
//! ```text
//!   bound reached / nothing enabled --> TraceEnded (reset marking, next case)
//!   nothing enabled at initial marking --> Exhausted
//!   Stop drawn at final marking -----> TraceEnded { accepted: true }
//!   resource unavailable ------------> Blocked   (state unchanged)
//!   fired silent / visible ----------> Fired / Emitted(event)
//! ```
//!
//! Resources are claimed only here, all or nothing, right before firing;
//! batch playout only checks that they have a free unit. Releases are
//! stamped with the cursor time.

use crate::acceptance::{AcceptancePolicy, Choice};
use crate::event::{advance_timestamp, Event};
use crate::marking::Marking;
use crate::net::{ProcessModel, TransitionId};
use crate::resource::ResourceRegistry;
use crate::semantics::{Semantics, SemanticsKind};

use chrono::{DateTime, Utc};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokenflow_env::{FlowContext, InstanceId};
use tracing::{error, trace};

/// Streaming generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Bound on visible transitions per trace.
    pub max_trace_length: usize,
    pub initial_case_id: u64,
    /// Cursor start (context wall clock if unset).
    pub initial_timestamp: Option<DateTime<Utc>>,
    pub require_final_marking: bool,
    pub superset_accepted: bool,
    pub semantics: SemanticsKind,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_trace_length: 10_000,
            initial_case_id: 0,
            initial_timestamp: None,
            require_final_marking: false,
            superset_accepted: false,
            semantics: SemanticsKind::Classic,
        }
    }
}

impl GeneratorConfig {
    pub fn with_max_trace_length(mut self, n: usize) -> Self {
        self.max_trace_length = n;
        self
    }

    pub fn with_initial_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.initial_timestamp = Some(ts);
        self
    }

    pub fn with_require_final_marking(mut self, require: bool) -> Self {
        self.require_final_marking = require;
        self
    }

    pub fn with_superset_accepted(mut self, accepted: bool) -> Self {
        self.superset_accepted = accepted;
        self
    }
}

/// Result of one generator step.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// A visible transition fired.
    Emitted(Event),
    /// A silent transition fired.
    Fired(TransitionId),
    /// The drawn transition needs a resource with no free unit.
    Blocked(TransitionId),
    /// The current trace is over; the next call starts case `case_id + 1`.
    TraceEnded { case_id: u64, accepted: bool },
    /// Nothing is enabled from the initial marking; no event will ever come.
    Exhausted,
}

pub struct EventGenerator {
    model: ProcessModel,
    semantics: Arc<dyn Semantics>,
    policy: AcceptancePolicy,
    max_trace_length: usize,
    ctx: Arc<dyn FlowContext>,
    rng: ChaCha8Rng,
    prefix: InstanceId,
    case_id: u64,
    marking: Marking,
    cursor: DateTime<Utc>,
    visible_count: usize,
}

impl EventGenerator {
    /// Creates a generator whose randomness comes from `ctx` stream `stream`.
    pub fn new(
        model: ProcessModel,
        config: GeneratorConfig,
        ctx: Arc<dyn FlowContext>,
        stream: u64,
    ) -> Self {
        let mut rng = ctx.derive_rng(stream);
        let prefix = InstanceId::from_rng(&mut rng);
        let cursor = config.initial_timestamp.unwrap_or_else(|| ctx.wall_clock());
        let policy = AcceptancePolicy::new(
            model.final_marking.clone(),
            config.require_final_marking,
            config.superset_accepted,
        );

        Self {
            marking: model.initial_marking.clone(),
            semantics: config.semantics.engine(),
            max_trace_length: config.max_trace_length,
            case_id: config.initial_case_id,
            model,
            policy,
            ctx,
            rng,
            prefix,
            cursor,
            visible_count: 0,
        }
    }

    pub fn with_semantics(mut self, semantics: Arc<dyn Semantics>) -> Self {
        self.semantics = semantics;
        self
    }

    pub fn model(&self) -> &ProcessModel {
        &self.model
    }

    pub fn case_id(&self) -> u64 {
        self.case_id
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    /// Short id prefixed to every case id of this generator.
    pub fn prefix(&self) -> String {
        self.prefix.short()
    }

    /// Visible transitions fired in the current trace.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Case id as recorded on events, e.g. `"3f9a1c2e_4"`.
    pub fn case_label(&self) -> String {
        format!("{}_{}", self.prefix.short(), self.case_id)
    }

    /// Performs one step. Resources are resolved through `resources` when
    /// given, otherwise through each transition's own references. A drawn
    /// transition that cannot claim everything it takes is `Blocked`.
    pub fn advance(&mut self, resources: Option<&ResourceRegistry>) -> Advance {
        let net = Arc::clone(&self.model.net);
        let enabled = self.semantics.enabled_transitions(&net, &self.marking);

        if enabled.is_empty() && self.visible_count == 0 && self.marking == self.model.initial_marking
        {
            return Advance::Exhausted;
        }

        if self.visible_count >= self.max_trace_length || enabled.is_empty() {
            let accepted = self.policy.accepts(&self.marking);
            return self.end_trace(accepted);
        }

        let transition = match self.policy.select(&enabled, &self.marking, &mut self.rng) {
            Some(Choice::Fire(t)) => t,
            // Stop is only offered at the final marking
            Some(Choice::Stop) | None => return self.end_trace(true),
        };
        let Some(t) = net.transition(transition) else {
            return self.end_trace(false);
        };

        if !t.resources_available(resources) || !t.claim(resources) {
            return Advance::Blocked(transition);
        }

        self.marking = match self.semantics.execute(transition, &net, &self.marking) {
            Ok(next) => next,
            Err(e) => {
                t.unclaim(resources);
                error!("{}: {}", self.model.name(), e);
                return self.end_trace(false);
            }
        };
        if t.is_visible() {
            self.visible_count += 1;
            self.cursor = advance_timestamp(self.cursor, t.duration());
        }
        t.settle(resources, self.cursor);
        if let Some(hook) = t.hook() {
            hook.on_fire(&self.marking, self.case_id, t);
        }

        if !t.is_visible() {
            return Advance::Fired(transition);
        }
        match Event::from_transition(t, self.case_label(), self.cursor) {
            Some(event) => Advance::Emitted(event),
            None => Advance::Fired(transition),
        }
    }

    /// Advances until an event comes out. Returns `None` only when the
    /// generator is exhausted.
    ///
    /// This does not return while the drawn transitions stay blocked; use
    /// [`EventGenerator::next_event_within`] when that can happen.
    pub fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.advance(None) {
                Advance::Emitted(event) => return Some(event),
                Advance::Exhausted => return None,
                _ => {}
            }
        }
    }

    /// Like `next_event`, giving up after `max_steps` steps.
    pub fn next_event_within(
        &mut self,
        max_steps: usize,
        resources: Option<&ResourceRegistry>,
    ) -> Option<Event> {
        for _ in 0..max_steps {
            match self.advance(resources) {
                Advance::Emitted(event) => return Some(event),
                Advance::Exhausted => return None,
                _ => {}
            }
        }
        None
    }

    /// Starts the next case. An unacceptable trace also restarts the cursor
    /// from the wall clock.
    fn end_trace(&mut self, accepted: bool) -> Advance {
        let ended = self.case_id;
        trace!(
            "{}: case {} ended at {} (accepted: {})",
            self.model.name(),
            self.case_label(),
            self.model.net.format_marking(&self.marking),
            accepted
        );

        if !accepted {
            self.cursor = self.ctx.wall_clock();
        }
        self.case_id += 1;
        self.marking = self.model.initial_marking.clone();
        self.visible_count = 0;

        Advance::TraceEnded {
            case_id: ended,
            accepted,
        }
    }
}

impl Iterator for EventGenerator {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.next_event()
    }
}
