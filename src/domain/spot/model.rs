//! Spot domain entity

use serde::{Deserialize, Serialize};

/// Occupancy state of a spot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    /// Single-letter code used in storage
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Available => "A",
            Self::Occupied => "O",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::Available),
            "O" => Some(Self::Occupied),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Occupied => write!(f, "Occupied"),
        }
    }
}

/// Parking spot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    /// Unique spot ID, increasing with insertion order
    pub id: i32,
    pub lot_id: i32,
    /// Sequential number inside the lot, starting at 1
    pub number: i32,
    pub label: String,
    pub status: SpotStatus,
}

impl Spot {
    pub fn label_for(number: i32) -> String {
        format!("S{:03}", number)
    }

    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }
}
