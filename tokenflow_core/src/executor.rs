//! Single-trace playout.

use crate::acceptance::{AcceptancePolicy, Choice};
use crate::error::FireError;
use crate::marking::Marking;
use crate::net::{Net, TransitionId};
use crate::semantics::Semantics;

use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// Why a trace stopped. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing can fire. The acceptance policy decides whether the
    /// marking left behind is acceptable.
    Deadlock,
    /// The visible-transition bound was hit.
    BoundReached,
    /// `Stop` was drawn at the final marking.
    Stopped,
}

/// One firing: the marking it fired from and the transition.
#[derive(Debug, Clone)]
pub struct TraceStep {
    pub marking: Marking,
    pub transition: TransitionId,
}

#[derive(Debug, Clone)]
pub struct TraceOutcome {
    pub steps: Vec<TraceStep>,
    pub final_marking: Marking,
    pub visible_count: usize,
    /// Sum of the durations of the visible transitions fired.
    pub elapsed: Duration,
    pub termination: Termination,
}

impl TraceOutcome {
    /// Fired transitions that are recorded as events, in firing order.
    pub fn visible_transitions<'a>(
        &'a self,
        net: &'a Net,
    ) -> impl Iterator<Item = TransitionId> + 'a {
        self.steps
            .iter()
            .map(|s| s.transition)
            .filter(move |&t| net.transition(t).is_some_and(|t| t.is_visible()))
    }
}

/// Plays out a single trace from a marking.
pub struct TraceExecutor<'a> {
    net: &'a Net,
    semantics: &'a dyn Semantics,
    policy: &'a AcceptancePolicy,
    max_trace_length: usize,
}

impl<'a> TraceExecutor<'a> {
    pub fn new(
        net: &'a Net,
        semantics: &'a dyn Semantics,
        policy: &'a AcceptancePolicy,
        max_trace_length: usize,
    ) -> Self {
        Self {
            net,
            semantics,
            policy,
            max_trace_length,
        }
    }

    /// Fires transitions until a stop, a deadlock or the visible bound.
    ///
    /// Firing is strict: an error here means the semantics reported a
    /// transition enabled and then refused to fire it.
    pub fn run<R: Rng + ?Sized>(
        &self,
        initial: &Marking,
        rng: &mut R,
    ) -> Result<TraceOutcome, FireError> {
        let mut marking = initial.clone();
        let mut steps = Vec::new();
        let mut visible_count = 0;
        let mut elapsed = Duration::ZERO;

        let termination = loop {
            if visible_count >= self.max_trace_length {
                break Termination::BoundReached;
            }

            let mut enabled = self.semantics.enabled_transitions(self.net, &marking);
            // no free unit of a required resource means it cannot fire
            enabled.retain(|&t| {
                self.net
                    .transition(t)
                    .is_some_and(|t| t.resources_available(None))
            });
            if enabled.is_empty() {
                break Termination::Deadlock;
            }

            let transition = match self.policy.select(&enabled, &marking, rng) {
                Some(Choice::Fire(t)) => t,
                Some(Choice::Stop) => break Termination::Stopped,
                None => break Termination::Deadlock,
            };

            let next = self.semantics.execute(transition, self.net, &marking)?;
            if let Some(t) = self.net.transition(transition) {
                if t.is_visible() {
                    visible_count += 1;
                    elapsed += t.duration();
                }
            }
            steps.push(TraceStep {
                marking: std::mem::replace(&mut marking, next),
                transition,
            });
        };

        trace!(
            "trace ended after {} firings ({:?}) at {}",
            steps.len(),
            termination,
            self.net.format_marking(&marking)
        );

        Ok(TraceOutcome {
            steps,
            final_marking: marking,
            visible_count,
            elapsed,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{NetBuilder, TransitionSpec};
    use crate::resource::Resource;
    use crate::semantics::ClassicSemantics;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// P1 -> A(10 min) -> P2
    fn single_step() -> (Net, Marking, Marking) {
        let mut b = NetBuilder::new("single");
        let p1 = b.add_place("P1");
        let p2 = b.add_place("P2");
        let a = b.add_transition(
            TransitionSpec::visible("A", "A").duration(Duration::from_secs(600)),
        );
        b.add_arc(p1, a).add_arc(a, p2);
        let net = b.build().unwrap();
        let im = Marking::new().with(p1, 1);
        let fm = Marking::new().with(p2, 1);
        (net, im, fm)
    }

    #[test]
    fn test_single_step_reaches_final() {
        let (net, im, fm) = single_step();
        let policy = AcceptancePolicy::new(Some(fm.clone()), true, false);
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let out = exec.run(&im, &mut rng).unwrap();
        assert_eq!(out.steps.len(), 1);
        assert_eq!(out.visible_count, 1);
        assert_eq!(out.elapsed, Duration::from_secs(600));
        assert_eq!(out.final_marking, fm);
        assert_eq!(out.steps[0].marking, im);
        // nothing is enabled at P2, reached or not
        assert_eq!(out.termination, Termination::Deadlock);
        assert!(policy.accepts(&out.final_marking));
    }

    #[test]
    fn test_stop_drawn_while_enabled() {
        // p -> a -> p with the final marking equal to the initial one
        let mut b = NetBuilder::new("idle");
        let p = b.add_place("p");
        let a = b.add_transition(TransitionSpec::visible("a", "A"));
        b.add_arc(p, a).add_arc(a, p);
        let net = b.build().unwrap();
        let im = Marking::new().with(p, 1);
        let policy = AcceptancePolicy::new(Some(im.clone()), true, false);
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 1_000);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let out = exec.run(&im, &mut rng).unwrap();
        assert_eq!(out.termination, Termination::Stopped);
        assert_eq!(out.final_marking, im);
    }

    #[test]
    fn test_exhausted_resource_deadlocks() {
        let mut b = NetBuilder::new("resourced");
        let p1 = b.add_place("P1");
        let p2 = b.add_place("P2");
        let t = b.add_transition(
            TransitionSpec::visible("T", "T").resource(Resource::shared("broken", 0)),
        );
        b.add_arc(p1, t).add_arc(t, p2);
        let net = b.build().unwrap();
        let im = Marking::new().with(p1, 1);
        let policy = AcceptancePolicy::new(Some(Marking::new().with(p2, 1)), true, false);
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let out = exec.run(&im, &mut rng).unwrap();
        assert_eq!(out.termination, Termination::Deadlock);
        assert!(out.steps.is_empty());
        assert_eq!(out.final_marking, im);
        assert!(!policy.accepts(&out.final_marking));
    }

    #[test]
    fn test_deadlock_without_final() {
        let (net, im, _) = single_step();
        let policy = AcceptancePolicy::default();
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let out = exec.run(&im, &mut rng).unwrap();
        assert_eq!(out.termination, Termination::Deadlock);
        assert_eq!(out.visible_count, 1);
    }

    #[test]
    fn test_bound_counts_visible_only() {
        // loop: p -> tau -> q -> A -> p
        let mut b = NetBuilder::new("loop");
        let p = b.add_place("p");
        let q = b.add_place("q");
        let tau = b.add_transition(TransitionSpec::new("tau"));
        let a = b.add_transition(TransitionSpec::visible("a", "A"));
        b.add_arc(p, tau).add_arc(tau, q).add_arc(q, a).add_arc(a, p);
        let net = b.build().unwrap();

        let policy = AcceptancePolicy::default();
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let out = exec.run(&Marking::new().with(p, 1), &mut rng).unwrap();
        assert_eq!(out.termination, Termination::BoundReached);
        assert_eq!(out.visible_count, 5);
        assert_eq!(out.steps.len(), 10);
        assert_eq!(out.visible_transitions(&net).count(), 5);
    }

    #[test]
    fn test_zero_bound_fires_nothing() {
        let (net, im, _) = single_step();
        let policy = AcceptancePolicy::default();
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let out = exec.run(&im, &mut rng).unwrap();
        assert!(out.steps.is_empty());
        assert_eq!(out.final_marking, im);
    }

    #[test]
    fn test_same_seed_same_trace() {
        // two competing branches from one token
        let mut b = NetBuilder::new("choice");
        let start = b.add_place("start");
        let end = b.add_place("end");
        for name in ["x", "y", "z"] {
            let t = b.add_transition(TransitionSpec::visible(name, name));
            b.add_arc(start, t).add_arc(t, end);
        }
        let net = b.build().unwrap();
        let policy = AcceptancePolicy::default();
        let exec = TraceExecutor::new(&net, &ClassicSemantics, &policy, 10);
        let im = Marking::new().with(start, 1);

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| exec.run(&im, &mut rng).unwrap().steps[0].transition)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
