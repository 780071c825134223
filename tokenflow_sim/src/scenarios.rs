//! Built-in process models.

use std::sync::Arc;
use std::time::Duration;

use tokenflow_core::{Marking, NetBuilder, NetError, ProcessModel, Resource, TransitionSpec};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Linear four-step order handling
    OrderProcess,

    /// Web shop checkout with loops and customer attributes
    OnlineOrder,

    /// Welding and painting competing for one robot arm
    Mutualistic,
}

/// The processes of a scenario plus the resources they share.
pub struct Scenario {
    pub id: ScenarioId,
    /// (agent name, model)
    pub processes: Vec<(String, ProcessModel)>,
    pub resources: Vec<Arc<Resource>>,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::OrderProcess,
            ScenarioId::OnlineOrder,
            ScenarioId::Mutualistic,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::OrderProcess => "order_process",
            ScenarioId::OnlineOrder => "online_order",
            ScenarioId::Mutualistic => "mutualistic",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::OrderProcess => "Receive, check payment, confirm, complete",
            ScenarioId::OnlineOrder => "Online shop order: search, login retries, card checks",
            ScenarioId::Mutualistic => "Welding and painting processes sharing one robot arm",
        }
    }

    /// Builds fresh models (and fresh resources) for the scenario.
    pub fn build(&self) -> Result<Scenario, NetError> {
        let (processes, resources) = match self {
            ScenarioId::OrderProcess => (vec![("order".to_string(), order_process()?)], vec![]),
            ScenarioId::OnlineOrder => (vec![("shop".to_string(), online_order()?)], vec![]),
            ScenarioId::Mutualistic => {
                let arm = Resource::robot_arm();
                let processes = mutualistic(&arm)?;
                (processes, vec![arm])
            }
        };
        Ok(Scenario {
            id: *self,
            processes,
            resources,
        })
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "order_process" | "orderprocess" | "order" => Ok(ScenarioId::OrderProcess),
            "online_order" | "onlineorder" | "shop" => Ok(ScenarioId::OnlineOrder),
            "mutualistic" | "robot_arm" => Ok(ScenarioId::Mutualistic),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// start -> Receive -> Check Payment -> Confirm -> Complete -> end
pub fn order_process() -> Result<ProcessModel, NetError> {
    let mut b = NetBuilder::new("Order Process");
    let places: Vec<_> = [
        "start",
        "order_received",
        "payment_pending",
        "order_confirmed",
        "end",
    ]
    .into_iter()
    .map(|name| b.add_place(name))
    .collect();

    let steps = [
        ("t_receive", "Receive Order"),
        ("t_check", "Check Payment"),
        ("t_confirm", "Confirm Order"),
        ("t_complete", "Complete Order"),
    ];
    for (i, (name, label)) in steps.into_iter().enumerate() {
        let t = b.add_transition(TransitionSpec::visible(name, label));
        b.add_arc(places[i], t).add_arc(t, places[i + 1]);
    }

    let net = b.build()?;
    Ok(ProcessModel::new(
        net,
        Marking::new().with(places[0], 1),
        Some(Marking::new().with(places[4], 1)),
    ))
}

/// Online shop order with an alternative-article branch, a login retry loop
/// and a card check loop running in parallel with shipping entry.
pub fn online_order() -> Result<ProcessModel, NetError> {
    let mut b = NetBuilder::new("Online Order");
    let p: Vec<_> = [
        "Ready for Order",
        "Open Online-Shop",
        "Show Results",
        "Alternatives article found",
        "Article selected",
        "Ready to Pay",
        "Enter Order Data",
        "Input mask for shipping details opened",
        "Input mask for credit card details opened",
        "Credit card details entered",
        "Credit card details checked",
        "Credit card details verified",
        "Address and shipping method entered",
        "Order completed",
    ]
    .into_iter()
    .map(|name| b.add_place(name))
    .collect();

    let customer = |spec: TransitionSpec| {
        spec.attribute("location", "Leipzig")
            .attribute("name", "Erika Mustermann")
            .attribute("address", "Heidestrasse 17, 51147 Leipzig")
    };
    let mut add = |name: &str, label: &str, duration: Duration| {
        b.add_transition(customer(TransitionSpec::visible(name, label).duration(duration)))
    };

    let t1 = add("t1", "Open Online-Shop", secs(5));
    let t2 = add("t2", "Start searching", mins(20));
    let t3 = add("t3", "Search alternative article", mins(15));
    let t4 = add("t4", "Select alternative article", secs(5));
    let t5 = add("t5", "Select Article", secs(5));
    let t6 = add("t6", "Added to shopping cart", secs(5));
    let t7 = add("t7", "Enter login data", mins(1));
    let t8 = add("t8", "Login data is incorrect", secs(5));
    let t9 = add("t9", "Login data is correct", secs(35));
    let t10 = add("t10", "Enter address and shipping method", mins(5));
    let t11 = add("t11", "Enter credit card details", mins(2));
    let t12 = add("t12", "Mark credit card details as verified", secs(5));
    let t13 = add("t13", "Confirm order", secs(5));
    let t14 = add("t14", "Check credit card details", mins(2));
    let t15 = add("t15", "Mark credit card details as incorrect", secs(5));

    b.add_arc(p[0], t1)
        .add_arc(t1, p[1])
        .add_arc(p[1], t2)
        .add_arc(t2, p[2])
        .add_arc(p[2], t3)
        .add_arc(p[2], t5)
        .add_arc(t3, p[3])
        .add_arc(p[3], t4)
        .add_arc(t4, p[4])
        .add_arc(t5, p[4])
        .add_arc(p[4], t6)
        .add_arc(t6, p[5])
        .add_arc(p[5], t7)
        .add_arc(t7, p[6])
        .add_arc(p[6], t8)
        .add_arc(t8, p[5])
        .add_arc(p[6], t9)
        .add_arc(t9, p[8])
        .add_arc(t9, p[7])
        .add_arc(p[8], t11)
        .add_arc(t11, p[9])
        .add_arc(p[9], t14)
        .add_arc(t14, p[10])
        .add_arc(p[10], t12)
        .add_arc(p[10], t15)
        .add_arc(t15, p[8])
        .add_arc(p[7], t10)
        .add_arc(t10, p[12])
        .add_arc(p[12], t13)
        .add_arc(t12, p[11])
        .add_arc(p[11], t13)
        .add_arc(t13, p[13]);

    let net = b.build()?;
    Ok(ProcessModel::new(
        net,
        Marking::new().with(p[0], 1),
        Some(Marking::new().with(p[13], 1)),
    ))
}

/// Welding and painting, both needing `arm` for their middle steps.
///
/// Each process takes the arm when its robot step starts and hands it back
/// when it reports the robot available again, so at most one of them holds
/// it at any time.
pub fn mutualistic(arm: &Arc<Resource>) -> Result<Vec<(String, ProcessModel)>, NetError> {
    let welding = {
        let mut b = NetBuilder::new("Welding Process");
        let p: Vec<_> = ["ready", "robot checked", "welded", "robot reported", "packaged"]
            .into_iter()
            .map(|name| b.add_place(name))
            .collect();

        let t1 = b.add_transition(
            TransitionSpec::visible("t1", "Check Robot Availability").duration(secs(5)),
        );
        let t2 = b.add_transition(
            TransitionSpec::visible("t2", "Weld components on welding robot")
                .duration(mins(20))
                .acquires(Arc::clone(arm)),
        );
        let t3 = b.add_transition(
            TransitionSpec::visible("t3", "Report robot availability")
                .duration(secs(5))
                .releases(Arc::clone(arm)),
        );
        let t4 = b.add_transition(
            TransitionSpec::visible("t4", "Package Welded Components").duration(secs(5)),
        );
        for (i, t) in [t1, t2, t3, t4].into_iter().enumerate() {
            b.add_arc(p[i], t).add_arc(t, p[i + 1]);
        }

        let net = b.build()?;
        ProcessModel::new(
            net,
            Marking::new().with(p[0], 1),
            Some(Marking::new().with(p[4], 1)),
        )
    };

    let painting = {
        let mut b = NetBuilder::new("Painting Process");
        let p: Vec<_> = ["ready", "robot checked", "remodelled", "painted", "robot reported"]
            .into_iter()
            .map(|name| b.add_place(name))
            .collect();

        let t1 = b.add_transition(
            TransitionSpec::visible("t1", "Check Robot Availability").duration(secs(5)),
        );
        let t2 = b.add_transition(
            TransitionSpec::visible("t2", "Remodel Robot for Painting")
                .duration(mins(20))
                .acquires(Arc::clone(arm)),
        );
        let t3 = b.add_transition(
            TransitionSpec::visible("t3", "Paint Components on robot").duration(mins(15)),
        );
        let t4 = b.add_transition(
            TransitionSpec::visible("t4", "Report robot availability")
                .duration(secs(5))
                .releases(Arc::clone(arm)),
        );
        for (i, t) in [t1, t2, t3, t4].into_iter().enumerate() {
            b.add_arc(p[i], t).add_arc(t, p[i + 1]);
        }

        let net = b.build()?;
        ProcessModel::new(
            net,
            Marking::new().with(p[0], 1),
            Some(Marking::new().with(p[4], 1)),
        )
    };

    Ok(vec![
        ("welding".to_string(), welding),
        ("painting".to_string(), painting),
    ])
}
