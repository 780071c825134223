//! The Semantics Engine: what "enabled" means and how firing changes a marking.
//!
//! Engines are stateless. They know nothing about resources, timestamps or
//! hooks; the executor and the generator layer those on top.

use crate::error::FireError;
use crate::marking::Marking;
use crate::net::{Net, TransitionId};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pluggable firing rule.
pub trait Semantics: Send + Sync {
    /// Engine name (for logging).
    fn name(&self) -> &'static str;

    fn is_enabled(&self, transition: TransitionId, net: &Net, marking: &Marking) -> bool;

    /// Fires `transition` on a copy of `marking`.
    ///
    /// Fails if the transition is not enabled; the input is never mutated.
    fn execute(
        &self,
        transition: TransitionId,
        net: &Net,
        marking: &Marking,
    ) -> Result<Marking, FireError>;

    /// Fires `transition` regardless of enabling, tolerating over-consumption.
    fn weak_execute(&self, transition: TransitionId, net: &Net, marking: &Marking) -> Marking;

    /// All enabled transitions, in net declaration order.
    fn enabled_transitions(&self, net: &Net, marking: &Marking) -> Vec<TransitionId> {
        net.transitions()
            .iter()
            .map(|t| t.id())
            .filter(|&t| self.is_enabled(t, net, marking))
            .collect()
    }
}

/// Classic place/transition net semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicSemantics;

impl Semantics for ClassicSemantics {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn is_enabled(&self, transition: TransitionId, net: &Net, marking: &Marking) -> bool {
        net.contains_transition(transition)
            && net
                .incoming_arcs(transition)
                .all(|arc| marking.get(arc.place()) >= arc.weight())
    }

    fn execute(
        &self,
        transition: TransitionId,
        net: &Net,
        marking: &Marking,
    ) -> Result<Marking, FireError> {
        let Some(t) = net.transition(transition) else {
            return Err(FireError::ForeignTransition(net.name().to_string()));
        };
        if !self.is_enabled(transition, net, marking) {
            return Err(FireError::NotEnabled(t.name().to_string()));
        }
        Ok(self.weak_execute(transition, net, marking))
    }

    fn weak_execute(&self, transition: TransitionId, net: &Net, marking: &Marking) -> Marking {
        let mut next = marking.clone();
        for arc in net.incoming_arcs(transition) {
            next.consume(arc.place(), arc.weight());
        }
        for arc in net.outgoing_arcs(transition) {
            next.add(arc.place(), arc.weight());
        }
        next
    }
}

/// Engine selection as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticsKind {
    #[default]
    Classic,
}

impl SemanticsKind {
    pub fn engine(&self) -> Arc<dyn Semantics> {
        match self {
            SemanticsKind::Classic => Arc::new(ClassicSemantics),
        }
    }
}
