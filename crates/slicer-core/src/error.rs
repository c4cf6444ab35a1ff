//! Error kinds for the path-planning core: one enum per failure domain
//! rather than a single catch-all.

use thiserror::Error;

/// Errors raised while constructing a beading strategy. The wall generator
/// never fails on geometry (degenerate input just yields an empty result),
/// but an unrecognized or unsupported strategy configuration is a hard stop
/// for that layer's walls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("beading strategy unavailable for the given parameters")]
    StrategyUnavailable,
}

/// Errors raised while mutating or querying the print operation tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("child already has a parent")]
    AlreadyParented,
    #[error("attaching this child would create a cycle")]
    Cycle,
    #[error("node is not a child of the given parent")]
    NotAChild,
}

/// Errors surfaced from the exporter stage up to the driver. An exporter
/// I/O failure does not corrupt in-memory plan state and does not stop
/// other layers from being processed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("exporter I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
