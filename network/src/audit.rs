//! Append-only audit trail of everything that happens to a [crate::Network].
//!
//! Every state change is described by an [Event], stamped with a sequence number, and handed to a
//! [Sink] as an [Entry]. Sequence numbers start at 1 and increase by one per entry; there is no
//! wall-clock component.
//!
//! Sinks cannot fail a network operation. [Writer] reports I/O errors through `tracing` and moves
//! on.

use crate::{LetterId, OfficeId};
use std::{fmt, io};
use tracing::error;

/// Something that happened inside the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Initialized,
    Shutdown,
    OfficeAdded {
        office: OfficeId,
        capacity: usize,
    },
    OfficeRemoved {
        office: OfficeId,
    },
    LetterAdded {
        letter: LetterId,
        origin: OfficeId,
        destination: OfficeId,
    },
    Forwarded {
        letter: LetterId,
        from: OfficeId,
        to: OfficeId,
    },
    Redirected {
        letter: LetterId,
        from: OfficeId,
        to: OfficeId,
    },
    Delivered {
        letter: LetterId,
        office: OfficeId,
    },
    Undeliverable {
        letter: LetterId,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Initialized => write!(f, "post system initialized"),
            Event::Shutdown => write!(f, "post system shutdown"),
            Event::OfficeAdded { office, capacity } => {
                write!(f, "added office {office} with capacity {capacity}")
            }
            Event::OfficeRemoved { office } => write!(f, "removed office {office}"),
            Event::LetterAdded {
                letter,
                origin,
                destination,
            } => write!(
                f,
                "added letter {letter} from office {origin} to office {destination}"
            ),
            Event::Forwarded { letter, from, to } => {
                write!(f, "letter {letter} moved from office {from} to office {to}")
            }
            Event::Redirected { letter, from, to } => write!(
                f,
                "letter {letter} redirected from office {from} to office {to}"
            ),
            Event::Delivered { letter, office } => {
                write!(f, "letter {letter} delivered at office {office}")
            }
            Event::Undeliverable { letter } => write!(f, "letter {letter} marked undeliverable"),
        }
    }
}

/// An [Event] with its position in the trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub sequence: u64,
    pub event: Event,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06} {}", self.sequence, self.event)
    }
}

/// Destination for audit entries.
pub trait Sink {
    fn record(&mut self, entry: &Entry);
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn record(&mut self, entry: &Entry) {
        (**self).record(entry)
    }
}

/// Keeps every entry in memory.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    entries: Vec<Entry>,
}

impl Memory {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Recorded events, without sequence numbers.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().map(|entry| &entry.event)
    }
}

impl Sink for Memory {
    fn record(&mut self, entry: &Entry) {
        self.entries.push(entry.clone());
    }
}

/// Writes one line per entry to any [io::Write], flushing after each.
pub struct Writer<W: io::Write> {
    inner: W,
}

impl<W: io::Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Sink for Writer<W> {
    fn record(&mut self, entry: &Entry) {
        let result = writeln!(self.inner, "{entry}").and_then(|_| self.inner.flush());
        if let Err(err) = result {
            error!(?err, sequence = entry.sequence, "failed to write audit entry");
        }
    }
}
