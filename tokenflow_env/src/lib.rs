//! TokenFlow Environment Abstraction Layer
//!
//! This crate lets the playout engines run against both the **system clock**
//! and a **deterministic simulation** without changing engine code.
//!
//! # Core Concept
//!
//! Every source of non-determinism a playout touches is routed through
//! [`FlowContext`]:
//! - Time (`now()`, `wall_clock()`)
//! - Randomness (`derive_rng()`)
//!
//! By deriving all entropy from a single 64-bit seed, any generated log
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use tokenflow_env::{FlowContext, SystemContext};
//!
//! let ctx = SystemContext::shared();
//! let mut rng = ctx.derive_rng(0);
//! let started = ctx.wall_clock();
//! ```

mod context;
mod system_impl;
mod types;

pub use context::FlowContext;
pub use system_impl::SystemContext;
pub use types::InstanceId;
