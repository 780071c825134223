//! Core environment context trait for TokenFlow engines.

use chrono::{DateTime, Utc};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the playout engines can run
/// both against the system clock and inside a deterministic simulation.
///
/// # Implementations
///
/// - **Production**: `SystemContext` - wraps `Instant`, `Utc::now()`, OS entropy
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Selection of the next transition is the only nondeterministic input of a
/// playout. Every random source handed to a generator or agent comes from
/// `derive_rng`, so a seeded context replays identical event sequences.
pub trait FlowContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for scheduler deadlines. In simulation, this is the virtual clock.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used to start fresh trace cursors.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Derives an independent random source for one generator or agent.
    ///
    /// The implementation combines the global seed with `stream` to derive
    /// unique but reproducible sources.
    ///
    /// # Arguments
    /// * `stream` - A value to combine with the global seed
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
