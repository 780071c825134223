//! Capacity-limited shared resources.
//!
//! A [`Resource`] is the only piece of state shared across trace boundaries
//! and across agents. Its available count moves only through
//! [`Resource::acquire`] (-1, refused at 0) and [`Resource::release`]
//! (+1, capped at capacity), so `0 <= available <= capacity` holds at every
//! point of a simulation, including when isolated workers run on threads.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// A named unit with a fixed capacity.
#[derive(Debug)]
pub struct Resource {
    name: String,
    capacity: u32,
    available: AtomicU32,
    last_release: Mutex<Option<DateTime<Utc>>>,
}

impl Resource {
    /// Creates a resource with all units available.
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
            available: AtomicU32::new(capacity),
            last_release: Mutex::new(None),
        }
    }

    /// Creates an Arc-wrapped resource for sharing.
    pub fn shared(name: impl Into<String>, capacity: u32) -> Arc<Self> {
        Arc::new(Self::new(name, capacity))
    }

    /// A single welding/painting robot arm.
    pub fn robot_arm() -> Arc<Self> {
        Self::shared("Robot Arm (Welding/Painting)", 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently free.
    pub fn available(&self) -> u32 {
        self.available.load(Ordering::SeqCst)
    }

    pub fn is_available(&self) -> bool {
        self.available() > 0
    }

    /// Takes one unit. Returns false (and changes nothing) when none is free.
    pub fn acquire(&self) -> bool {
        self.available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |a| a.checked_sub(1))
            .is_ok()
    }

    /// Returns one unit, never exceeding capacity, and records the release
    /// time. Returns false if the resource was already fully available.
    pub fn release(&self, at: DateTime<Utc>) -> bool {
        let returned = self.give_back();

        let mut last = self.last_release.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(at);

        returned
    }

    /// Undoes an acquire that never led to a firing. Not a release.
    pub(crate) fn give_back(&self) -> bool {
        self.available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |a| {
                (a < self.capacity).then_some(a + 1)
            })
            .is_ok()
    }

    /// A fresh, fully available resource with the same name and capacity.
    pub fn detached(&self) -> Arc<Self> {
        Self::shared(self.name.clone(), self.capacity)
    }

    /// Timestamp of the latest release, if any.
    pub fn last_release(&self) -> Option<DateTime<Utc>> {
        *self.last_release.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.available(), self.capacity)
    }
}

/// Catalogue of shared resources, keyed by name.
///
/// When a registry is consulted, a registered resource takes precedence over
/// the reference a transition was built with.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Arc<Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a resource under its name.
    pub fn register(&mut self, resource: Arc<Resource>) {
        self.resources.insert(resource.name().to_string(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Resource>> {
        self.resources.get(name)
    }

    /// A registry of detached copies, one per distinct name. Nothing done
    /// through it is visible to the originals.
    pub fn detached<'a>(resources: impl IntoIterator<Item = &'a Arc<Resource>>) -> Self {
        let mut registry = Self::new();
        for resource in resources {
            if registry.get(resource.name()).is_none() {
                registry.register(resource.detached());
            }
        }
        registry
    }

    /// Resolves a transition's resource through the registry.
    pub fn resolve<'a>(&'a self, resource: &'a Arc<Resource>) -> &'a Arc<Resource> {
        self.resources.get(resource.name()).unwrap_or(resource)
    }

    /// Resolves through `registry` when there is one, else keeps the
    /// transition's own reference.
    pub fn resolve_in<'a>(
        registry: Option<&'a ResourceRegistry>,
        resource: &'a Arc<Resource>,
    ) -> &'a Arc<Resource> {
        match registry {
            Some(registry) => registry.resolve(resource),
            None => resource,
        }
    }

    /// True if every required resource has a free unit.
    pub fn all_available(&self, required: &[Arc<Resource>]) -> bool {
        required.iter().all(|r| self.resolve(r).is_available())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
