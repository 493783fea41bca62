//! Letters to submit and offices to remove over the course of a run.
//!
//! ```yaml
//! letters:
//!   - kind: ordinary
//!     priority: 1
//!     origin: 1
//!     destination: 3
//!     payload: invoice
//!   - kind: urgent
//!     priority: 5
//!     origin: 2
//!     destination: 1
//!     payload: notice
//!     at: 4
//! offices:
//!   - id: 9
//!     capacity: 3
//!     neighbors: [1, 2]
//!     at: 2
//! removals:
//!   - office: 2
//!     at: 10
//! takes:
//!   - letter: 1
//!     office: 3
//!     at: 6
//! undeliverable:
//!   - letter: 2
//!     at: 8
//! ```
//!
//! `at` is the tick before which the action is applied (defaults to 0, before the first tick).
//! Actions due at the same tick run in the order: offices, removals, letters, takes, undeliverable.

use postal_network::{LetterId, OfficeId};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub letters: Vec<LetterConfig>,
    #[serde(default)]
    pub offices: Vec<OfficeConfig>,
    #[serde(default)]
    pub removals: Vec<RemovalConfig>,
    #[serde(default)]
    pub takes: Vec<TakeConfig>,
    #[serde(default)]
    pub undeliverable: Vec<UndeliverableConfig>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LetterConfig {
    pub kind: String,
    pub priority: u32,
    pub origin: OfficeId,
    pub destination: OfficeId,
    pub payload: String,
    #[serde(default)]
    pub at: u64,
}

/// An office added while the network runs.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OfficeConfig {
    pub id: OfficeId,
    pub capacity: usize,
    #[serde(default)]
    pub neighbors: Vec<OfficeId>,
    #[serde(default)]
    pub at: u64,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RemovalConfig {
    pub office: OfficeId,
    #[serde(default)]
    pub at: u64,
}

/// An attempt to take a letter at an office.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TakeConfig {
    pub letter: LetterId,
    pub office: OfficeId,
    #[serde(default)]
    pub at: u64,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UndeliverableConfig {
    pub letter: LetterId,
    #[serde(default)]
    pub at: u64,
}

impl Manifest {
    /// Returns `true` if anything is scheduled at or after `tick`.
    pub fn pending(&self, tick: u64) -> bool {
        self.letters.iter().any(|letter| letter.at >= tick)
            || self.offices.iter().any(|office| office.at >= tick)
            || self.removals.iter().any(|removal| removal.at >= tick)
            || self.takes.iter().any(|take| take.at >= tick)
            || self.undeliverable.iter().any(|mark| mark.at >= tick)
    }
}
