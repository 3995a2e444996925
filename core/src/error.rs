use crate::types::TileCoord;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("Unknown building prefab '{id}'")]
    UnknownPrefab { id: String },

    #[error("Save '{save_id}' not found")]
    SaveNotFound { save_id: String },

    #[error("tick() called on paused engine")]
    ClockPaused,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

/// Why a placement was refused. No tile or balance is mutated when
/// any of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Invalid placement at {anchor}: {reason}")]
    InvalidPlacement {
        anchor: TileCoord,
        reason: InvalidReason,
    },

    #[error("Insufficient funds: cost {cost}, balance {balance}")]
    InsufficientFunds { cost: i64, balance: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The anchor or part of the footprint falls outside the grid.
    OutOfBounds,
    /// A required tile already has an occupant.
    Occupied(TileCoord),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "footprint leaves the grid"),
            Self::Occupied(at) => write!(f, "tile {at} is occupied"),
        }
    }
}
