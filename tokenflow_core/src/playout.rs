//! Batch playout: repeated single-trace runs collected into an event log.

use crate::acceptance::AcceptancePolicy;
use crate::error::PlayoutError;
use crate::event::{advance_timestamp, Case, Event, EventLog};
use crate::executor::{TraceExecutor, TraceOutcome};
use crate::net::ProcessModel;
use crate::semantics::{Semantics, SemanticsKind};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many attempts a playout makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Exactly `num_traces` attempts; keep whichever are accepted.
    Fixed,
    /// Attempt until `num_traces` are accepted. Gives up once `num_traces`
    /// attempts produced no accepted trace at all.
    ReachabilityGated,
}

/// Batch playout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoutConfig {
    pub num_traces: usize,
    /// Bound on visible transitions per trace.
    pub max_trace_length: usize,
    /// Timestamp the cursor starts from (now if unset).
    pub initial_timestamp: Option<DateTime<Utc>>,
    pub initial_case_id: u64,
    pub semantics: SemanticsKind,
    pub require_final_marking: bool,
    pub superset_accepted: bool,
    /// Derived from `require_final_marking` when unset.
    pub retry: Option<RetryPolicy>,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        Self {
            num_traces: 1000,
            max_trace_length: 1000,
            initial_timestamp: None,
            initial_case_id: 0,
            semantics: SemanticsKind::Classic,
            require_final_marking: false,
            superset_accepted: false,
            retry: None,
        }
    }
}

impl PlayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, PlayoutError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_num_traces(mut self, n: usize) -> Self {
        self.num_traces = n;
        self
    }

    pub fn with_max_trace_length(mut self, n: usize) -> Self {
        self.max_trace_length = n;
        self
    }

    pub fn with_initial_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.initial_timestamp = Some(ts);
        self
    }

    pub fn with_initial_case_id(mut self, id: u64) -> Self {
        self.initial_case_id = id;
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

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Gated retry when a final marking is required, fixed otherwise,
    /// unless set explicitly.
    pub fn effective_retry(&self) -> RetryPolicy {
        self.retry.unwrap_or(if self.require_final_marking {
            RetryPolicy::ReachabilityGated
        } else {
            RetryPolicy::Fixed
        })
    }

    pub fn validate(&self) -> Result<(), PlayoutError> {
        if self.num_traces == 0 {
            return Err(PlayoutError::InvalidConfig(
                "num_traces must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Attempt accounting of one playout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayoutStats {
    pub attempts: usize,
    pub accepted: usize,
}

/// Runs a batch playout of one process model.
pub struct Playout {
    model: ProcessModel,
    config: PlayoutConfig,
    semantics: Arc<dyn Semantics>,
    policy: AcceptancePolicy,
}

impl Playout {
    pub fn new(model: ProcessModel, config: PlayoutConfig) -> Result<Self, PlayoutError> {
        config.validate()?;
        if config.require_final_marking && model.final_marking.is_none() {
            return Err(PlayoutError::MissingFinalMarking);
        }

        let policy = AcceptancePolicy::new(
            model.final_marking.clone(),
            config.require_final_marking,
            config.superset_accepted,
        );
        Ok(Self {
            semantics: config.semantics.engine(),
            model,
            config,
            policy,
        })
    }

    /// Replaces the engine chosen by the configuration.
    pub fn with_semantics(mut self, semantics: Arc<dyn Semantics>) -> Self {
        self.semantics = semantics;
        self
    }

    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }

    pub fn model(&self) -> &ProcessModel {
        &self.model
    }

    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<EventLog, PlayoutError> {
        let traces = self.run_traces(rng)?;
        Ok(self.to_event_log(&traces))
    }

    /// Accepted traces, without conversion.
    pub fn run_traces<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<TraceOutcome>, PlayoutError> {
        self.run_with_stats(rng).map(|(traces, _)| traces)
    }

    pub fn run_with_stats<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(Vec<TraceOutcome>, PlayoutStats), PlayoutError> {
        let target = self.config.num_traces;
        let retry = self.config.effective_retry();
        let executor = TraceExecutor::new(
            &self.model.net,
            self.semantics.as_ref(),
            &self.policy,
            self.config.max_trace_length,
        );

        let mut accepted = Vec::new();
        let mut stats = PlayoutStats::default();

        while accepted.len() < target {
            if stats.attempts >= target {
                match retry {
                    RetryPolicy::Fixed => break,
                    RetryPolicy::ReachabilityGated if accepted.is_empty() => {
                        warn!(
                            "{}: final marking unreachable after {} attempts",
                            self.model.name(),
                            stats.attempts
                        );
                        return Err(PlayoutError::FinalMarkingUnreachable {
                            attempts: stats.attempts,
                        });
                    }
                    RetryPolicy::ReachabilityGated => {}
                }
            }

            let outcome = executor.run(&self.model.initial_marking, rng)?;
            stats.attempts += 1;
            if self.policy.accepts(&outcome.final_marking) {
                stats.accepted += 1;
                accepted.push(outcome);
            } else {
                debug!(
                    "rejected trace ending at {}",
                    self.model.net.format_marking(&outcome.final_marking)
                );
            }
        }

        info!(
            "{}: {} of {} traces accepted ({} engine, {:?})",
            self.model.name(),
            stats.accepted,
            stats.attempts,
            self.semantics.name(),
            retry
        );
        Ok((accepted, stats))
    }

    /// Converts traces into cases.
    ///
    /// Trace `i` becomes case `initial_case_id + i`. One timestamp cursor
    /// runs through the whole log, advanced by each visible transition's
    /// duration; an event carries the cursor after the advance.
    pub fn to_event_log(&self, traces: &[TraceOutcome]) -> EventLog {
        let net = &self.model.net;
        let mut cursor = self.config.initial_timestamp.unwrap_or_else(Utc::now);
        let mut log = EventLog::new();

        for (i, trace) in traces.iter().enumerate() {
            let mut case = Case::new((self.config.initial_case_id + i as u64).to_string());
            for id in trace.visible_transitions(net) {
                let Some(transition) = net.transition(id) else {
                    continue;
                };
                cursor = advance_timestamp(cursor, transition.duration());
                if let Some(event) = Event::from_transition(transition, case.case_id.as_str(), cursor)
                {
                    case.events.push(event);
                }
            }
            log.push_case(case);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marking::Marking;
    use crate::net::{NetBuilder, TransitionSpec};
    use crate::resource::Resource;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    /// P1 -> A -> P2
    fn single_step() -> ProcessModel {
        let mut b = NetBuilder::new("single");
        let p1 = b.add_place("P1");
        let p2 = b.add_place("P2");
        let a = b.add_transition(TransitionSpec::visible("A", "A"));
        b.add_arc(p1, a).add_arc(a, p2);
        let net = b.build().unwrap();
        ProcessModel::new(
            net,
            Marking::new().with(p1, 1),
            Some(Marking::new().with(p2, 1)),
        )
    }

    /// start -> {ok | bad}: only `ok` reaches the final marking
    fn branching() -> ProcessModel {
        let mut b = NetBuilder::new("branching");
        let start = b.add_place("start");
        let good = b.add_place("good");
        let dead = b.add_place("dead");
        let ok = b.add_transition(TransitionSpec::visible("ok", "Ok"));
        let bad = b.add_transition(TransitionSpec::visible("bad", "Bad"));
        b.add_arc(start, ok)
            .add_arc(ok, good)
            .add_arc(start, bad)
            .add_arc(bad, dead);
        let net = b.build().unwrap();
        ProcessModel::new(
            net,
            Marking::new().with(start, 1),
            Some(Marking::new().with(good, 1)),
        )
    }

    #[test]
    fn test_single_step_log() {
        let config = PlayoutConfig::default()
            .with_num_traces(3)
            .with_initial_timestamp(epoch())
            .with_initial_case_id(5)
            .with_require_final_marking(true);
        let playout = Playout::new(single_step(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let log = playout.run(&mut rng).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.event_count(), 3);

        let first = &log.cases[0];
        assert_eq!(first.case_id, "5");
        assert_eq!(first.events[0].activity, "A");
        assert_eq!(first.events[0].timestamp, epoch() + chrono::Duration::minutes(10));

        // cursor runs on across cases
        assert_eq!(log.cases[2].case_id, "7");
        assert_eq!(log.cases[2].events[0].timestamp, epoch() + chrono::Duration::minutes(30));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let config = PlayoutConfig::default()
            .with_num_traces(50)
            .with_initial_timestamp(epoch());
        let playout = Playout::new(branching(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let log = playout.run(&mut rng).unwrap();
        let stamps: Vec<_> = log.events().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_fixed_keeps_only_accepted() {
        let config = PlayoutConfig::default()
            .with_num_traces(200)
            .with_require_final_marking(true)
            .with_retry(RetryPolicy::Fixed);
        let playout = Playout::new(branching(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let (traces, stats) = playout.run_with_stats(&mut rng).unwrap();
        assert_eq!(stats.attempts, 200);
        assert_eq!(stats.accepted, traces.len());
        assert!(traces.len() < 200);
        assert!(traces.len() > 50);
        assert!(traces.iter().all(|t| playout.policy.accepts(&t.final_marking)));
    }

    #[test]
    fn test_gated_collects_target() {
        let config = PlayoutConfig::default()
            .with_num_traces(40)
            .with_require_final_marking(true);
        assert_eq!(config.effective_retry(), RetryPolicy::ReachabilityGated);
        let playout = Playout::new(branching(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let (traces, stats) = playout.run_with_stats(&mut rng).unwrap();
        assert_eq!(traces.len(), 40);
        assert!(stats.attempts >= 40);
    }

    #[test]
    fn test_gated_unreachable_is_error() {
        let mut model = single_step();
        let unreachable = model.net.marking([("P1", 5)]);
        model.final_marking = Some(unreachable);

        let config = PlayoutConfig::default()
            .with_num_traces(10)
            .with_require_final_marking(true);
        let playout = Playout::new(model, config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        match playout.run(&mut rng) {
            Err(PlayoutError::FinalMarkingUnreachable { attempts }) => assert_eq!(attempts, 10),
            other => panic!("expected unreachable, got {:?}", other.map(|l| l.len())),
        }
    }

    #[test]
    fn test_require_without_final_marking_rejected() {
        let mut model = single_step();
        model.final_marking = None;
        let config = PlayoutConfig::default().with_require_final_marking(true);
        assert!(matches!(
            Playout::new(model, config),
            Err(PlayoutError::MissingFinalMarking)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = PlayoutConfig::from_json(
            r#"{ "num_traces": 7, "require_final_marking": true, "retry": "fixed" }"#,
        )
        .unwrap();
        assert_eq!(config.num_traces, 7);
        assert_eq!(config.max_trace_length, 1000);
        assert_eq!(config.effective_retry(), RetryPolicy::Fixed);

        assert!(matches!(
            PlayoutConfig::from_json(r#"{ "num_traces": 0 }"#),
            Err(PlayoutError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlayoutConfig::from_json("not json"),
            Err(PlayoutError::ConfigParse(_))
        ));
    }

    /// P1 -> T -> P2 where T needs a resource with no units at all
    fn exhausted_resource() -> ProcessModel {
        let mut b = NetBuilder::new("resourced");
        let p1 = b.add_place("P1");
        let p2 = b.add_place("P2");
        let t = b.add_transition(
            TransitionSpec::visible("T", "T")
                .duration(Duration::from_secs(60))
                .resource(Resource::shared("broken", 0)),
        );
        b.add_arc(p1, t).add_arc(t, p2);
        let net = b.build().unwrap();
        ProcessModel::new(
            net,
            Marking::new().with(p1, 1),
            Some(Marking::new().with(p2, 1)),
        )
    }

    #[test]
    fn test_exhausted_resource_never_fires() {
        let config = PlayoutConfig::default().with_num_traces(5);
        let playout = Playout::new(exhausted_resource(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let (traces, stats) = playout.run_with_stats(&mut rng).unwrap();
        assert_eq!(stats.attempts, 5);
        assert!(traces.iter().all(|t| t.steps.is_empty()));
        assert_eq!(playout.to_event_log(&traces).event_count(), 0);
    }

    #[test]
    fn test_exhausted_resource_gated_is_unreachable() {
        let config = PlayoutConfig::default()
            .with_num_traces(3)
            .with_require_final_marking(true);
        let playout = Playout::new(exhausted_resource(), config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        match playout.run(&mut rng) {
            Err(PlayoutError::FinalMarkingUnreachable { attempts }) => assert_eq!(attempts, 3),
            other => panic!("expected unreachable, got {:?}", other.map(|l| l.event_count())),
        }
    }

    #[test]
    fn test_same_seed_same_log() {
        let config = PlayoutConfig::default()
            .with_num_traces(25)
            .with_initial_timestamp(epoch());
        let playout = Playout::new(branching(), config).unwrap();

        let a = playout.run(&mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        let b = playout.run(&mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
    }
}
