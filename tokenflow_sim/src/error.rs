//! Error type of the simulation harness.

use thiserror::Error;
use tokenflow_core::{NetError, PlayoutError};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Playout(#[from] PlayoutError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}
