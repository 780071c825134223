//! Firing hooks: side effects run right after a transition fires.
//!
//! Resource bookkeeping is not a hook. Transitions declare what they take
//! and give back (`TransitionSpec::acquires` / `releases`) and the generator
//! arbitrates those through the shared registry before the hook runs.

use crate::marking::Marking;
use crate::net::Transition;

/// Side effect invoked with the resulting marking, the case id and the
/// transition that just fired.
///
/// Any `Fn(&Marking, u64, &Transition) + Send + Sync` closure is a hook.
pub trait FiringHook: Send + Sync {
    fn on_fire(&self, marking: &Marking, case_id: u64, transition: &Transition);
}

impl<F> FiringHook for F
where
    F: Fn(&Marking, u64, &Transition) + Send + Sync,
{
    fn on_fire(&self, marking: &Marking, case_id: u64, transition: &Transition) {
        self(marking, case_id, transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{NetBuilder, TransitionSpec};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_hook_sees_case_id() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        let mut b = NetBuilder::new("closure");
        let t = b.add_transition(TransitionSpec::new("t").hook(
            move |_m: &Marking, case_id: u64, _t: &Transition| {
                sink.store(case_id, Ordering::SeqCst);
            },
        ));
        let net = b.build().unwrap();

        let transition = net.transition(t).unwrap();
        transition.hook().unwrap().on_fire(&Marking::new(), 17, transition);
        assert_eq!(seen.load(Ordering::SeqCst), 17);
    }

    #[test]
    fn test_hook_sees_transition_name() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        let mut b = NetBuilder::new("named");
        let t = b.add_transition(TransitionSpec::visible("weld", "Weld").hook(
            move |_m: &Marking, _case: u64, t: &Transition| {
                sink.lock().unwrap().push(t.name().to_string());
            },
        ));
        let net = b.build().unwrap();

        let transition = net.transition(t).unwrap();
        transition.hook().unwrap().on_fire(&Marking::new(), 0, transition);
        assert_eq!(*names.lock().unwrap(), vec!["weld".to_string()]);
    }
}
