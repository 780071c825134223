//! Acceptance policy and transition selection.

use crate::marking::Marking;
use crate::net::TransitionId;

use rand::Rng;

/// Decides whether a marking completes a trace.
#[derive(Debug, Clone, Default)]
pub struct AcceptancePolicy {
    final_marking: Option<Marking>,
    require_final_marking: bool,
    superset_accepted: bool,
}

/// Outcome of one selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Fire(TransitionId),
    /// End the trace here (only offered once the final marking is reached).
    Stop,
}

impl AcceptancePolicy {
    pub fn new(
        final_marking: Option<Marking>,
        require_final_marking: bool,
        superset_accepted: bool,
    ) -> Self {
        Self {
            final_marking,
            require_final_marking,
            superset_accepted,
        }
    }

    pub fn final_marking(&self) -> Option<&Marking> {
        self.final_marking.as_ref()
    }

    pub fn require_final_marking(&self) -> bool {
        self.require_final_marking
    }

    pub fn superset_accepted(&self) -> bool {
        self.superset_accepted
    }

    /// True if `marking` equals the final marking, or covers it when
    /// supersets are accepted. Always false without a final marking.
    pub fn reached(&self, marking: &Marking) -> bool {
        match &self.final_marking {
            Some(fm) => marking == fm || (self.superset_accepted && fm.is_covered_by(marking)),
            None => false,
        }
    }

    /// True if a trace ending in `marking` may be kept.
    pub fn accepts(&self, marking: &Marking) -> bool {
        !self.require_final_marking || self.reached(marking)
    }

    /// Draws the next step.
    ///
    /// Once the final marking is reached, `Stop` joins the candidates with
    /// the same weight as each enabled transition. Returns `None` only when
    /// nothing is enabled and the final marking is not reached.
    pub fn select<R: Rng + ?Sized>(
        &self,
        enabled: &[TransitionId],
        marking: &Marking,
        rng: &mut R,
    ) -> Option<Choice> {
        let stop_offered = self.reached(marking);
        let candidates = enabled.len() + usize::from(stop_offered);
        if candidates == 0 {
            return None;
        }

        let pick = rng.gen_range(0..candidates);
        Some(match enabled.get(pick) {
            Some(&t) => Choice::Fire(t),
            None => Choice::Stop,
        })
    }
}
