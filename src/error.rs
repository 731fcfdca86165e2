//! Construction-time failures
//!
//! Nothing in the per-tick path returns these. Missing tiles, empty quadrants and
//! unroutable events are ordinary states and surface as `Option` or are dropped.

use crate::sim::EntityId;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("mass must be positive and finite, got {mass}")]
    InvalidMass { mass: f64 },
    #[error("material `{name}` is invalid: {reason}")]
    InvalidMaterial { name: String, reason: &'static str },
    #[error("entity size must be positive and larger than its insets")]
    InvalidSize,
    #[error("tile size must be positive and finite, got {width}x{height}")]
    InvalidTileSize { width: f64, height: f64 },
    #[error("material `{0}` is already registered")]
    DuplicateMaterial(String),
    #[error("no entity with id {0:?}")]
    UnknownEntity(EntityId),
    #[error("failed to parse configuration")]
    Config(#[from] serde_json::Error),
}
