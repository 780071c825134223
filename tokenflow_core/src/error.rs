//! Error types for the TokenFlow engines.

use thiserror::Error;

/// Structural defects detected while building a [`crate::Net`].
///
/// A malformed net is rejected up front so that no simulation step ever has
/// to deal with a dangling or ill-typed arc.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("Arc #{arc} references a node of another net: {node}")]
    ForeignNode { arc: usize, node: String },

    #[error("Arc #{arc} references an unknown node: {node}")]
    UnknownNode { arc: usize, node: String },

    #[error("Arc #{arc} connects two places ({source_node} -> {target_node})")]
    PlaceToPlace {
        arc: usize,
        source_node: String,
        target_node: String,
    },

    #[error("Arc #{arc} connects two transitions ({source_node} -> {target_node})")]
    TransitionToTransition {
        arc: usize,
        source_node: String,
        target_node: String,
    },

    #[error("Arc #{arc} has weight 0")]
    ZeroWeight { arc: usize },

    #[error("Duplicate place name: {0}")]
    DuplicatePlace(String),

    #[error("Duplicate transition name: {0}")]
    DuplicateTransition(String),
}

/// Misuse of the semantics engine.
///
/// Distinct from any marking, so a rejected firing is never mistaken for a
/// legitimate empty marking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("Transition not enabled: {0}")]
    NotEnabled(String),

    #[error("Transition does not belong to net {0}")]
    ForeignTransition(String),
}

/// Errors surfaced by the batch playout.
#[derive(Debug, Error)]
pub enum PlayoutError {
    /// No trace reached the final marking within the attempt budget.
    #[error("Final marking unreachable: 0 traces accepted after {attempts} attempts")]
    FinalMarkingUnreachable { attempts: usize },

    #[error("A final marking is required but the process model has none")]
    MissingFinalMarking,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Fire(#[from] FireError),
}
