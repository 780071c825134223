//! Playout Demo - one net, two ways of generating a log
//! =====================================================
//!
//! Builds a small order-to-cash net by hand, then:
//! - runs a seeded batch playout of 5 traces
//! - streams 10 events from the generator against the system clock
//!
//! Run:
//! ```bash
//! cargo run --example playout_demo
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tokenflow_core::{
    EventGenerator, GeneratorConfig, Marking, NetBuilder, Playout, PlayoutConfig, ProcessModel,
    TransitionSpec,
};
use tokenflow_env::SystemContext;

fn build_model() -> Result<ProcessModel, Box<dyn std::error::Error>> {
    let mut b = NetBuilder::new("Order to Cash");
    let start = b.add_place("start");
    let ordered = b.add_place("ordered");
    let billed = b.add_place("billed");
    let end = b.add_place("end");

    let order = b.add_transition(
        TransitionSpec::visible("t_order", "Place Order").duration(Duration::from_secs(120)),
    );
    let route = b.add_transition(TransitionSpec::new("tau_route"));
    let invoice = b.add_transition(
        TransitionSpec::visible("t_invoice", "Send Invoice")
            .duration(Duration::from_secs(30 * 60))
            .attribute("channel", "email"),
    );
    let remind = b.add_transition(
        TransitionSpec::visible("t_remind", "Send Reminder").duration(Duration::from_secs(3600)),
    );
    let pay = b.add_transition(TransitionSpec::visible("t_pay", "Receive Payment"));

    b.add_arc(start, order)
        .add_arc(order, ordered)
        .add_arc(ordered, route)
        .add_arc(route, billed)
        .add_arc(ordered, invoice)
        .add_arc(invoice, billed)
        .add_arc(billed, remind)
        .add_arc(remind, billed)
        .add_arc(billed, pay)
        .add_arc(pay, end);

    let net = b.build()?;
    Ok(ProcessModel::new(
        net,
        Marking::new().with(start, 1),
        Some(Marking::new().with(end, 1)),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Playout Demo");
    println!("============\n");

    let model = build_model()?;

    // Batch playout, reproducible through the seed
    let config = PlayoutConfig::default()
        .with_num_traces(5)
        .with_max_trace_length(20)
        .with_require_final_marking(true);
    let playout = Playout::new(model.clone(), config)?;
    let log = playout.run(&mut ChaCha8Rng::seed_from_u64(42))?;

    for case in &log.cases {
        let activities: Vec<_> = case.activities().collect();
        println!("case {}: {}", case.case_id, activities.join(" -> "));
    }
    println!("\n{} cases, {} events\n", log.len(), log.event_count());

    // Streaming generation against the real clock
    let generator = EventGenerator::new(model, GeneratorConfig::default(), SystemContext::shared(), 0);
    for event in generator.take(10) {
        println!("{}  {:<16} {}", event.timestamp_iso(), event.case_id, event.activity);
    }

    Ok(())
}
