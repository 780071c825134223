//! The Net Model: places, transitions and weighted arcs.
//!
//! A [`Net`] is built once through a [`NetBuilder`] and is read-only during
//! simulation. Arcs live in a single authoritative list; the per-node
//! incoming/outgoing indices are derived from it at build time so that
//! neighbour lookups are O(1) without mutual ownership between arcs and nodes.

use crate::attributes::{AttributeValue, Attributes};
use crate::error::NetError;
use crate::hook::FiringHook;
use crate::marking::Marking;
use crate::resource::{Resource, ResourceRegistry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Duration of a transition when none is given.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_secs(10 * 60);

/// Identity of one net. Node ids carry it so membership is checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(Uuid);

impl NetId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceId {
    net: NetId,
    index: u32,
}

impl PlaceId {
    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionId {
    net: NetId,
    index: u32,
}

impl TransitionId {
    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// An arc endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Place(PlaceId),
    Transition(TransitionId),
}

impl From<PlaceId> for Node {
    fn from(id: PlaceId) -> Self {
        Node::Place(id)
    }
}

impl From<TransitionId> for Node {
    fn from(id: TransitionId) -> Self {
        Node::Transition(id)
    }
}

impl Node {
    fn net(&self) -> NetId {
        match self {
            Node::Place(p) => p.net,
            Node::Transition(t) => t.net,
        }
    }
}

/// Direction of an arc relative to its transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    /// Place -> transition (consumes tokens)
    Input,
    /// Transition -> place (produces tokens)
    Output,
}

/// A directed, weighted edge between a place and a transition.
///
/// The place/transition split is enforced by construction: a validated arc
/// can never join two places or two transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetArc {
    place: PlaceId,
    transition: TransitionId,
    direction: ArcDirection,
    weight: u32,
}

impl NetArc {
    pub fn place(&self) -> PlaceId {
        self.place
    }

    pub fn transition(&self) -> TransitionId {
        self.transition
    }

    pub fn direction(&self) -> ArcDirection {
        self.direction
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn source(&self) -> Node {
        match self.direction {
            ArcDirection::Input => Node::Place(self.place),
            ArcDirection::Output => Node::Transition(self.transition),
        }
    }

    pub fn target(&self) -> Node {
        match self.direction {
            ArcDirection::Input => Node::Transition(self.transition),
            ArcDirection::Output => Node::Place(self.place),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Place {
    id: PlaceId,
    name: String,
}

impl Place {
    pub fn id(&self) -> PlaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A transition of a simulation net.
///
/// Silent transitions (`label == None`) fire like any other but are never
/// recorded as events.
pub struct Transition {
    id: TransitionId,
    name: String,
    label: Option<String>,
    duration: Duration,
    attributes: Attributes,
    resources: Vec<Arc<Resource>>,
    acquires: Vec<Arc<Resource>>,
    releases: Vec<Arc<Resource>>,
    hook: Option<Arc<dyn FiringHook>>,
}

impl Transition {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.label.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Resources taken, one unit each, when this transition fires.
    pub fn acquired_resources(&self) -> &[Arc<Resource>] {
        &self.acquires
    }

    /// Resources given back when this transition fires.
    pub fn released_resources(&self) -> &[Arc<Resource>] {
        &self.releases
    }

    pub fn hook(&self) -> Option<&Arc<dyn FiringHook>> {
        self.hook.as_ref()
    }

    /// True if every required resource has a free unit. Resources resolve
    /// through `registry` when given.
    pub fn resources_available(&self, registry: Option<&ResourceRegistry>) -> bool {
        self.resources
            .iter()
            .all(|r| ResourceRegistry::resolve_in(registry, r).is_available())
    }

    /// Takes one unit of every acquired resource, or none at all.
    ///
    /// Each unit is taken with a single atomic acquire, so two claimants
    /// racing for the last unit cannot both succeed.
    pub fn claim(&self, registry: Option<&ResourceRegistry>) -> bool {
        for (i, resource) in self.acquires.iter().enumerate() {
            if !ResourceRegistry::resolve_in(registry, resource).acquire() {
                for taken in &self.acquires[..i] {
                    ResourceRegistry::resolve_in(registry, taken).give_back();
                }
                return false;
            }
        }
        true
    }

    /// Gives back what a successful `claim` took, for a firing that did
    /// not happen.
    pub(crate) fn unclaim(&self, registry: Option<&ResourceRegistry>) {
        for resource in &self.acquires {
            ResourceRegistry::resolve_in(registry, resource).give_back();
        }
    }

    /// Releases every released resource at `at`.
    pub fn settle(&self, registry: Option<&ResourceRegistry>, at: DateTime<Utc>) {
        for resource in &self.releases {
            ResourceRegistry::resolve_in(registry, resource).release(at);
        }
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("duration", &self.duration)
            .field("attributes", &self.attributes)
            .field(
                "resources",
                &self.resources.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field(
                "acquires",
                &self.acquires.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field(
                "releases",
                &self.releases.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Builder for one transition.
pub struct TransitionSpec {
    name: String,
    label: Option<String>,
    duration: Duration,
    attributes: Attributes,
    resources: Vec<Arc<Resource>>,
    acquires: Vec<Arc<Resource>>,
    releases: Vec<Arc<Resource>>,
    hook: Option<Arc<dyn FiringHook>>,
}

impl TransitionSpec {
    /// A silent transition named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            duration: DEFAULT_TRANSITION_DURATION,
            attributes: Attributes::new(),
            resources: Vec::new(),
            acquires: Vec::new(),
            releases: Vec::new(),
            hook: None,
        }
    }

    /// A visible transition recorded under `label`.
    pub fn visible(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name).label(label)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.label = None;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Merges `attributes`, overwriting existing keys.
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Requires a free unit of `resource` without taking it.
    pub fn resource(mut self, resource: Arc<Resource>) -> Self {
        self.resources.push(resource);
        self
    }

    /// Requires and takes one unit of `resource` when fired.
    pub fn acquires(mut self, resource: Arc<Resource>) -> Self {
        self.resources.push(Arc::clone(&resource));
        self.acquires.push(resource);
        self
    }

    /// Gives one unit of `resource` back when fired.
    pub fn releases(mut self, resource: Arc<Resource>) -> Self {
        self.releases.push(resource);
        self
    }

    pub fn hook(mut self, hook: impl FiringHook + 'static) -> Self {
        let hook: Arc<dyn FiringHook> = Arc::new(hook);
        self.hook = Some(hook);
        self
    }
}

/// Accumulates places, transitions and arcs, then validates them into a [`Net`].
pub struct NetBuilder {
    id: NetId,
    name: String,
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs: Vec<(Node, Node, u32)>,
}

impl NetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NetId::new(),
            name: name.into(),
            places: Vec::new(),
            transitions: Vec::new(),
            arcs: Vec::new(),
        }
    }

    pub fn add_place(&mut self, name: impl Into<String>) -> PlaceId {
        let id = PlaceId {
            net: self.id,
            index: self.places.len() as u32,
        };
        self.places.push(Place {
            id,
            name: name.into(),
        });
        id
    }

    pub fn add_transition(&mut self, spec: TransitionSpec) -> TransitionId {
        let id = TransitionId {
            net: self.id,
            index: self.transitions.len() as u32,
        };
        self.transitions.push(Transition {
            id,
            name: spec.name,
            label: spec.label,
            duration: spec.duration,
            attributes: spec.attributes,
            resources: spec.resources,
            acquires: spec.acquires,
            releases: spec.releases,
            hook: spec.hook,
        });
        id
    }

    /// Adds an arc of weight 1.
    pub fn add_arc(&mut self, from: impl Into<Node>, to: impl Into<Node>) -> &mut Self {
        self.add_weighted_arc(from, to, 1)
    }

    pub fn add_weighted_arc(
        &mut self,
        from: impl Into<Node>,
        to: impl Into<Node>,
        weight: u32,
    ) -> &mut Self {
        self.arcs.push((from.into(), to.into(), weight));
        self
    }

    /// Validates the accumulated structure and freezes it.
    pub fn build(self) -> Result<Net, NetError> {
        let mut seen = HashSet::new();
        for place in &self.places {
            if !seen.insert(place.name.as_str()) {
                return Err(NetError::DuplicatePlace(place.name.clone()));
            }
        }
        let mut seen = HashSet::new();
        for transition in &self.transitions {
            if !seen.insert(transition.name.as_str()) {
                return Err(NetError::DuplicateTransition(transition.name.clone()));
            }
        }

        let mut arcs = Vec::with_capacity(self.arcs.len());
        for (i, &(from, to, weight)) in self.arcs.iter().enumerate() {
            for node in [from, to] {
                if node.net() != self.id {
                    return Err(NetError::ForeignNode {
                        arc: i,
                        node: self.describe(node),
                    });
                }
                if !self.contains(node) {
                    return Err(NetError::UnknownNode {
                        arc: i,
                        node: self.describe(node),
                    });
                }
            }
            if weight == 0 {
                return Err(NetError::ZeroWeight { arc: i });
            }

            let arc = match (from, to) {
                (Node::Place(place), Node::Transition(transition)) => NetArc {
                    place,
                    transition,
                    direction: ArcDirection::Input,
                    weight,
                },
                (Node::Transition(transition), Node::Place(place)) => NetArc {
                    place,
                    transition,
                    direction: ArcDirection::Output,
                    weight,
                },
                (Node::Place(_), Node::Place(_)) => {
                    return Err(NetError::PlaceToPlace {
                        arc: i,
                        source_node: self.describe(from),
                        target_node: self.describe(to),
                    })
                }
                (Node::Transition(_), Node::Transition(_)) => {
                    return Err(NetError::TransitionToTransition {
                        arc: i,
                        source_node: self.describe(from),
                        target_node: self.describe(to),
                    })
                }
            };
            arcs.push(arc);
        }

        // Derived adjacency
        let mut place_in = vec![Vec::new(); self.places.len()];
        let mut place_out = vec![Vec::new(); self.places.len()];
        let mut transition_in = vec![Vec::new(); self.transitions.len()];
        let mut transition_out = vec![Vec::new(); self.transitions.len()];
        for (i, arc) in arcs.iter().enumerate() {
            match arc.direction {
                ArcDirection::Input => {
                    place_out[arc.place.index()].push(i);
                    transition_in[arc.transition.index()].push(i);
                }
                ArcDirection::Output => {
                    transition_out[arc.transition.index()].push(i);
                    place_in[arc.place.index()].push(i);
                }
            }
        }

        Ok(Net {
            id: self.id,
            name: self.name,
            places: self.places,
            transitions: self.transitions,
            arcs,
            place_in,
            place_out,
            transition_in,
            transition_out,
        })
    }

    fn contains(&self, node: Node) -> bool {
        match node {
            Node::Place(p) => p.index() < self.places.len(),
            Node::Transition(t) => t.index() < self.transitions.len(),
        }
    }

    fn describe(&self, node: Node) -> String {
        match node {
            Node::Place(p) => match self.places.get(p.index()).filter(|_| p.net == self.id) {
                Some(place) => format!("place '{}'", place.name),
                None => format!("place #{}", p.index),
            },
            Node::Transition(t) => {
                match self.transitions.get(t.index()).filter(|_| t.net == self.id) {
                    Some(transition) => format!("transition '{}'", transition.name),
                    None => format!("transition #{}", t.index),
                }
            }
        }
    }
}

/// An immutable Petri net.
#[derive(Debug)]
pub struct Net {
    id: NetId,
    name: String,
    places: Vec<Place>,
    transitions: Vec<Transition>,
    arcs: Vec<NetArc>,
    place_in: Vec<Vec<usize>>,
    place_out: Vec<Vec<usize>>,
    transition_in: Vec<Vec<usize>>,
    transition_out: Vec<Vec<usize>>,
}

impl Net {
    pub fn id(&self) -> NetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn arcs(&self) -> &[NetArc] {
        &self.arcs
    }

    /// Every resource a transition requires, takes or gives back, in
    /// declaration order. The same resource may appear more than once.
    pub fn resources(&self) -> impl Iterator<Item = &Arc<Resource>> + '_ {
        self.transitions
            .iter()
            .flat_map(|t| t.resources.iter().chain(&t.acquires).chain(&t.releases))
    }

    /// True if `transition` was created by this net's builder.
    pub fn contains_transition(&self, transition: TransitionId) -> bool {
        transition.net == self.id && transition.index() < self.transitions.len()
    }

    pub fn contains_place(&self, place: PlaceId) -> bool {
        place.net == self.id && place.index() < self.places.len()
    }

    pub fn place(&self, id: PlaceId) -> Option<&Place> {
        self.contains_place(id).then(|| &self.places[id.index()])
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.contains_transition(id)
            .then(|| &self.transitions[id.index()])
    }

    pub fn place_by_name(&self, name: &str) -> Option<PlaceId> {
        self.places.iter().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn transition_by_name(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
    }

    /// Input arcs of a transition (empty for foreign transitions).
    pub fn incoming_arcs(&self, transition: TransitionId) -> impl Iterator<Item = &NetArc> + '_ {
        self.arcs_of(self.contains_transition(transition), &self.transition_in, transition.index())
    }

    /// Output arcs of a transition (empty for foreign transitions).
    pub fn outgoing_arcs(&self, transition: TransitionId) -> impl Iterator<Item = &NetArc> + '_ {
        self.arcs_of(self.contains_transition(transition), &self.transition_out, transition.index())
    }

    /// Arcs producing into a place.
    pub fn place_incoming_arcs(&self, place: PlaceId) -> impl Iterator<Item = &NetArc> + '_ {
        self.arcs_of(self.contains_place(place), &self.place_in, place.index())
    }

    /// Arcs consuming from a place.
    pub fn place_outgoing_arcs(&self, place: PlaceId) -> impl Iterator<Item = &NetArc> + '_ {
        self.arcs_of(self.contains_place(place), &self.place_out, place.index())
    }

    /// Input places of a transition.
    pub fn preset(&self, transition: TransitionId) -> Vec<PlaceId> {
        self.incoming_arcs(transition).map(|a| a.place).collect()
    }

    /// Output places of a transition.
    pub fn postset(&self, transition: TransitionId) -> Vec<PlaceId> {
        self.outgoing_arcs(transition).map(|a| a.place).collect()
    }

    /// Places adjacent to a transition through any arc.
    pub fn neighbourhood(&self, transition: TransitionId) -> HashSet<PlaceId> {
        self.preset(transition)
            .into_iter()
            .chain(self.postset(transition))
            .collect()
    }

    fn arcs_of<'a>(
        &'a self,
        member: bool,
        index: &'a [Vec<usize>],
        i: usize,
    ) -> impl Iterator<Item = &'a NetArc> + 'a {
        let slots: &[usize] = if member { &index[i] } else { &[] };
        slots.iter().map(move |&a| &self.arcs[a])
    }

    /// Builds a marking from place names; unknown names are ignored.
    pub fn marking<'n>(&self, counts: impl IntoIterator<Item = (&'n str, u32)>) -> Marking {
        counts
            .into_iter()
            .filter_map(|(name, count)| self.place_by_name(name).map(|p| (p, count)))
            .collect()
    }

    /// Renders a marking with place names, e.g. `[p1:1, p3:2]`.
    pub fn format_marking(&self, marking: &Marking) -> String {
        let parts: Vec<String> = marking
            .iter()
            .map(|(p, c)| match self.place(p) {
                Some(place) => format!("{}:{}", place.name, c),
                None => format!("#{}:{}", p.index, c),
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }
}

/// A net together with its initial and optional final marking.
#[derive(Debug, Clone)]
pub struct ProcessModel {
    pub net: Arc<Net>,
    pub initial_marking: Marking,
    pub final_marking: Option<Marking>,
}

impl ProcessModel {
    pub fn new(net: Net, initial_marking: Marking, final_marking: Option<Marking>) -> Self {
        Self {
            net: Arc::new(net),
            initial_marking,
            final_marking,
        }
    }

    pub fn name(&self) -> &str {
        self.net.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step() -> (NetBuilder, PlaceId, TransitionId, PlaceId) {
        let mut b = NetBuilder::new("two-step");
        let p1 = b.add_place("p1");
        let t = b.add_transition(TransitionSpec::visible("t", "A"));
        let p2 = b.add_place("p2");
        (b, p1, t, p2)
    }

    #[test]
    fn test_build_indexes_arcs() {
        let (mut b, p1, t, p2) = two_step();
        b.add_arc(p1, t).add_weighted_arc(t, p2, 3);
        let net = b.build().unwrap();

        let inputs: Vec<_> = net.incoming_arcs(t).collect();
        let outputs: Vec<_> = net.outgoing_arcs(t).collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].source(), Node::Place(p1));
        assert_eq!(outputs[0].target(), Node::Place(p2));
        assert_eq!(outputs[0].weight(), 3);

        assert_eq!(net.place_outgoing_arcs(p1).count(), 1);
        assert_eq!(net.place_incoming_arcs(p2).count(), 1);
        assert_eq!(net.preset(t), vec![p1]);
        assert_eq!(net.postset(t), vec![p2]);
        assert_eq!(net.neighbourhood(t).len(), 2);
    }

    #[test]
    fn test_rejects_place_to_place() {
        let (mut b, p1, _, p2) = two_step();
        b.add_arc(p1, p2);
        assert!(matches!(b.build(), Err(NetError::PlaceToPlace { arc: 0, .. })));
    }

    #[test]
    fn test_rejects_transition_to_transition() {
        let (mut b, _, t, _) = two_step();
        let t2 = b.add_transition(TransitionSpec::new("t2"));
        b.add_arc(t, t2);
        assert!(matches!(
            b.build(),
            Err(NetError::TransitionToTransition { .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_node() {
        let (mut b, _, t, _) = two_step();
        let mut other = NetBuilder::new("other");
        let foreign = other.add_place("x");
        b.add_arc(foreign, t);
        assert!(matches!(b.build(), Err(NetError::ForeignNode { .. })));
    }

    #[test]
    fn test_rejects_zero_weight() {
        let (mut b, p1, t, _) = two_step();
        b.add_weighted_arc(p1, t, 0);
        assert_eq!(b.build().unwrap_err(), NetError::ZeroWeight { arc: 0 });
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let (mut b, _, _, _) = two_step();
        b.add_place("p1");
        assert_eq!(
            b.build().unwrap_err(),
            NetError::DuplicatePlace("p1".to_string())
        );
    }

    #[test]
    fn test_transition_defaults() {
        let (b, _, t, _) = two_step();
        let net = b.build().unwrap();
        let transition = net.transition(t).unwrap();
        assert_eq!(transition.label(), Some("A"));
        assert_eq!(transition.duration(), DEFAULT_TRANSITION_DURATION);
        assert!(transition.resources_available(None));
        assert!(transition.claim(None));
    }

    #[test]
    fn test_claim_is_all_or_nothing() {
        let arm = Resource::shared("arm", 1);
        let oven = Resource::shared("oven", 1);
        oven.acquire();

        let mut b = NetBuilder::new("claims");
        let both = b.add_transition(
            TransitionSpec::new("both")
                .acquires(Arc::clone(&arm))
                .acquires(Arc::clone(&oven)),
        );
        let net = b.build().unwrap();
        let transition = net.transition(both).unwrap();

        assert!(!transition.resources_available(None));
        assert!(!transition.claim(None));
        assert_eq!(arm.available(), 1);
        assert!(arm.last_release().is_none());
        assert_eq!(net.resources().count(), 4);
    }

    #[test]
    fn test_racing_claims_take_the_last_unit_once() {
        let arm = Resource::shared("arm", 1);
        let mut b = NetBuilder::new("race");
        let take = b.add_transition(TransitionSpec::new("take").acquires(Arc::clone(&arm)));
        let net = Arc::new(b.build().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let net = Arc::clone(&net);
                std::thread::spawn(move || {
                    let t = net.transition(take).unwrap();
                    t.resources_available(None) && t.claim(None)
                })
            })
            .collect();

        let won = handles.into_iter().map(|h| h.join().unwrap()).filter(|&w| w).count();
        assert_eq!(won, 1);
        assert_eq!(arm.available(), 0);
    }

    #[test]
    fn test_claim_and_settle_through_registry() {
        let private = Resource::shared("arm", 1);
        let shared = Resource::shared("arm", 1);
        let mut registry = ResourceRegistry::new();
        registry.register(Arc::clone(&shared));

        let mut b = NetBuilder::new("arm");
        let take = b.add_transition(TransitionSpec::new("take").acquires(Arc::clone(&private)));
        let give = b.add_transition(TransitionSpec::new("give").releases(Arc::clone(&private)));
        let net = b.build().unwrap();
        let (take, give) = (net.transition(take).unwrap(), net.transition(give).unwrap());

        assert!(take.claim(Some(&registry)));
        assert_eq!(shared.available(), 0);
        assert_eq!(private.available(), 1);
        assert!(!take.claim(Some(&registry)));

        let at = Utc::now();
        give.settle(Some(&registry), at);
        assert_eq!(shared.available(), 1);
        assert_eq!(shared.last_release(), Some(at));
        assert!(private.last_release().is_none());
    }

    #[test]
    fn test_marking_by_name_and_format() {
        let (b, p1, _, _) = two_step();
        let net = b.build().unwrap();
        let m = net.marking([("p1", 2), ("missing", 1)]);
        assert_eq!(m.get(p1), 2);
        assert_eq!(m.len(), 1);
        assert_eq!(net.format_marking(&m), "[p1:2]");
    }

    #[test]
    fn test_foreign_transition_has_no_arcs() {
        let (b, _, _, _) = two_step();
        let net = b.build().unwrap();
        let (other, _, foreign, _) = two_step();
        drop(other);
        assert!(!net.contains_transition(foreign));
        assert_eq!(net.incoming_arcs(foreign).count(), 0);
    }
}
