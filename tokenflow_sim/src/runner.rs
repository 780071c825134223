//! IsolatedRunner - fork-join execution of independent processes.
//!
//! Each process runs on its own blocking worker with its own generator and
//! random stream. Resources named by a net are replaced by detached copies
//! owned by that worker, so no mutable state crosses workers and two
//! processes naming the same resource do not contend for it. Results are
//! joined in process order, so output is independent of thread scheduling.

use crate::error::SimError;

use std::sync::Arc;
use tokenflow_core::{
    Advance, Event, EventGenerator, EventLog, GeneratorConfig, Playout, PlayoutConfig,
    ProcessModel, ResourceRegistry,
};
use tokenflow_env::FlowContext;
use tracing::{debug, info};

/// Step budget per requested event before a worker gives up.
pub const DEFAULT_STEPS_PER_EVENT: usize = 10_000;

pub struct IsolatedRunner {
    ctx: Arc<dyn FlowContext>,
    generator: GeneratorConfig,
    steps_per_event: usize,
}

impl IsolatedRunner {
    pub fn new(ctx: Arc<dyn FlowContext>) -> Self {
        Self {
            ctx,
            generator: GeneratorConfig::default(),
            steps_per_event: DEFAULT_STEPS_PER_EVENT,
        }
    }

    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    pub fn with_steps_per_event(mut self, steps: usize) -> Self {
        self.steps_per_event = steps;
        self
    }

    /// Streams up to `events_per_process` events from every process in
    /// parallel and concatenates them in process order.
    ///
    /// A worker whose transitions stay blocked stops after its step budget
    /// and contributes fewer events.
    pub async fn run(
        &self,
        processes: Vec<(String, ProcessModel)>,
        events_per_process: usize,
    ) -> Result<Vec<Event>, SimError> {
        let budget = events_per_process.saturating_mul(self.steps_per_event);
        let mut tasks = Vec::with_capacity(processes.len());

        for (stream, (name, model)) in processes.into_iter().enumerate() {
            let ctx = Arc::clone(&self.ctx);
            let config = self.generator.clone();

            tasks.push(tokio::task::spawn_blocking(move || {
                let resources = ResourceRegistry::detached(model.net.resources());
                let mut generator = EventGenerator::new(model, config, ctx, stream as u64);
                let mut events = Vec::with_capacity(events_per_process);

                for _ in 0..budget {
                    if events.len() >= events_per_process {
                        break;
                    }
                    match generator.advance(Some(&resources)) {
                        Advance::Emitted(event) => events.push(event.with_agent(name.as_str())),
                        Advance::Exhausted => break,
                        _ => {}
                    }
                }

                debug!("{} generated {} events", name, events.len());
                events
            }));
        }

        let mut log = Vec::new();
        for task in tasks {
            log.extend(task.await?);
        }

        info!("Isolated run completed with {} events", log.len());
        Ok(log)
    }

    /// Runs one batch playout per process in parallel.
    pub async fn run_playouts(
        &self,
        processes: Vec<(String, ProcessModel)>,
        config: PlayoutConfig,
    ) -> Result<Vec<EventLog>, SimError> {
        let mut tasks = Vec::with_capacity(processes.len());

        for (stream, (name, model)) in processes.into_iter().enumerate() {
            let mut rng = self.ctx.derive_rng(stream as u64);
            let config = config.clone();

            tasks.push(tokio::task::spawn_blocking(move || {
                let log = Playout::new(model, config)?.run(&mut rng)?;
                debug!("{} played out {} cases", name, log.len());
                Ok::<_, SimError>(log)
            }));
        }

        let mut logs = Vec::with_capacity(tasks.len());
        for task in tasks {
            logs.push(task.await??);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::scenarios::{online_order, order_process, ScenarioId};
    use tokenflow_core::{PlayoutError, Resource};

    fn runner(seed: u64) -> IsolatedRunner {
        IsolatedRunner::new(SimContext::shared(seed))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_results_joined_in_process_order() {
        let processes = vec![
            ("order".to_string(), order_process().unwrap()),
            ("shop".to_string(), online_order().unwrap()),
        ];

        let events = runner(42).run(processes, 25).await.unwrap();
        assert_eq!(events.len(), 50);
        assert!(events[..25].iter().all(|e| e.agent_id.as_deref() == Some("order")));
        assert!(events[25..].iter().all(|e| e.agent_id.as_deref() == Some("shop")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deterministic_across_runs() {
        let run = || async {
            let processes = vec![
                ("a".to_string(), online_order().unwrap()),
                ("b".to_string(), online_order().unwrap()),
            ];
            runner(9).run(processes, 40).await.unwrap()
        };

        let first: Vec<_> = run().await.into_iter().map(|e| (e.activity, e.timestamp)).collect();
        let second: Vec<_> = run().await.into_iter().map(|e| (e.activity, e.timestamp)).collect();
        assert_eq!(first, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_workers_do_not_share_the_arm() {
        let run = || async {
            let scenario = ScenarioId::Mutualistic.build().unwrap();
            let arm = Arc::clone(&scenario.resources[0]);
            let events = runner(3)
                .with_steps_per_event(50)
                .run(scenario.processes, 200)
                .await
                .unwrap();
            (arm, events)
        };

        let (arm, events) = run().await;
        // every worker got its own arm, the scenario's was never touched
        assert_eq!(events.len(), 400);
        assert_eq!(arm.available(), 1);
        assert!(arm.last_release().is_none());

        let (_, again) = run().await;
        let key = |e: &Event| (e.activity.clone(), e.timestamp);
        assert_eq!(
            events.iter().map(key).collect::<Vec<_>>(),
            again.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_blocked_worker_gives_up() {
        let model = {
            let mut b = tokenflow_core::NetBuilder::new("blocked");
            let p = b.add_place("p");
            let q = b.add_place("q");
            let t = b.add_transition(
                tokenflow_core::TransitionSpec::visible("t", "T")
                    .resource(Resource::shared("broken", 0)),
            );
            b.add_arc(p, t).add_arc(t, q);
            let net = b.build().unwrap();
            ProcessModel::new(net, tokenflow_core::Marking::new().with(p, 1), None)
        };

        let events = runner(1)
            .with_steps_per_event(10)
            .run(vec![("blocked".to_string(), model)], 5)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_playouts() {
        let processes = vec![
            ("order".to_string(), order_process().unwrap()),
            ("shop".to_string(), online_order().unwrap()),
        ];
        let config = PlayoutConfig::default()
            .with_num_traces(20)
            .with_require_final_marking(true);

        let logs = runner(5).run_playouts(processes, config).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].len(), 20);
        assert_eq!(logs[0].event_count(), 80);
        assert_eq!(logs[1].len(), 20);
    }

    #[tokio::test]
    async fn test_playout_errors_propagate() {
        let mut model = order_process().unwrap();
        model.final_marking = None;
        let config = PlayoutConfig::default().with_require_final_marking(true);

        let err = runner(5)
            .run_playouts(vec![("order".to_string(), model)], config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Playout(PlayoutError::MissingFinalMarking)
        ));
    }
}
