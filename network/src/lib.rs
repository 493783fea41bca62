//! Route letters hop-by-hop through a capacity-bounded network of offices.
//!
//! A [Network] owns a dynamic set of [office::Office]s and an append-only ledger of
//! [letter::Letter]s. Each office holds its resident letters in a
//! [postal_utils::PriorityQueue] (highest priority first) and lists the neighbors it forwards
//! to, in order of preference.
//!
//! The network only advances when [Network::tick] is called. Each tick delivers letters sitting at
//! their destination, then forwards the rest one hop each, moving no more than
//! [Config::max_moves_per_tick] letters in total. Letters never revisit an office, and a letter
//! that stays stuck too long is marked undeliverable.
//!
//! Every state change is written to an injected [audit::Sink]. [Network::ledger] and
//! [Network::status] give read-only views at any time.
//!
//! # Example
//!
//! ```rust
//! use postal_network::{audit::Memory, letter::State, Config, Network};
//!
//! let mut network = Network::new(Config::default(), Memory::default()).unwrap();
//! network.add_office(1, 3, vec![2]).unwrap();
//! network.add_office(2, 3, vec![1]).unwrap();
//!
//! let id = network.add_letter("ordinary", 1, 1, 2, "hello").unwrap();
//! network.tick().unwrap();
//!
//! let letter = network.letter(id).unwrap();
//! assert_eq!(letter.state(), State::Delivered);
//! assert_eq!(letter.location(), 2);
//! ```
//!
//! # Status
//!
//! `postal-network` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use postal_utils::priority_queue;
use thiserror::Error;

pub mod audit;
pub mod letter;
pub mod metrics;
mod network;
pub use network::{Config, Network, Tick, MAX_MOVES_PER_TICK, QUEUE_CAPACITY, STARVATION_LIMIT};
pub mod office;
pub mod report;
pub mod topology;

/// Caller-chosen identifier of an office.
pub type OfficeId = u32;

/// Identifier assigned to a letter on submission (the first letter gets 1).
pub type LetterId = u64;

/// Errors that can occur when interacting with a [Network].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("memory allocation failed")]
    MemoryAllocation,
    #[error("office not found: {0}")]
    OfficeNotFound(OfficeId),
    #[error("letter not found: {0}")]
    LetterNotFound(LetterId),
    #[error("letter {letter} is not queued at office {office}")]
    NotQueued { letter: LetterId, office: OfficeId },
    #[error("office {0} is at capacity")]
    CapacityExceeded(OfficeId),
    #[error("office already exists: {0}")]
    InvalidOfficeId(OfficeId),
    #[error("malformed topology at line {line}")]
    MalformedTopology { line: usize },
    #[error("queue error: {0}")]
    Queue(priority_queue::Error),
}

impl From<priority_queue::Error> for Error {
    fn from(err: priority_queue::Error) -> Self {
        match err {
            priority_queue::Error::Allocation => Self::MemoryAllocation,
            other => Self::Queue(other),
        }
    }
}
