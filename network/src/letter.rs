//! Letters routed through the network and the handles offices queue them by.

use crate::{LetterId, OfficeId};
use bytes::Bytes;
use std::{cmp::Ordering, fmt};

/// Lifecycle of a [Letter].
///
/// [State::InTransit] is the only non-terminal state. Once a letter is [State::Delivered] or
/// [State::Undeliverable] it never changes state again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    InTransit,
    Delivered,
    Undeliverable,
}

impl State {
    /// Returns `true` for [State::Delivered] and [State::Undeliverable].
    pub fn is_terminal(self) -> bool {
        !matches!(self, State::InTransit)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::InTransit => write!(f, "In transit"),
            State::Delivered => write!(f, "Delivered"),
            State::Undeliverable => write!(f, "Undeliverable"),
        }
    }
}

/// A job routed from `origin` to `destination`, one hop at a time.
#[derive(Clone, Debug)]
pub struct Letter {
    id: LetterId,
    kind: String,
    priority: u32,
    origin: OfficeId,
    destination: OfficeId,
    payload: Bytes,

    state: State,
    location: OfficeId,
    visited: Vec<OfficeId>,
    stalls: usize,
}

impl Letter {
    pub(crate) fn new(
        id: LetterId,
        kind: String,
        priority: u32,
        origin: OfficeId,
        destination: OfficeId,
        payload: Bytes,
    ) -> Self {
        Self {
            id,
            kind,
            priority,
            origin,
            destination,
            payload,
            state: State::InTransit,
            location: origin,
            visited: vec![origin],
            stalls: 0,
        }
    }

    pub fn id(&self) -> LetterId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn origin(&self) -> OfficeId {
        self.origin
    }

    pub fn destination(&self) -> OfficeId {
        self.destination
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Office the letter currently sits at (or last sat at, once terminal).
    pub fn location(&self) -> OfficeId {
        self.location
    }

    /// Every office the letter has been forwarded through, starting with its origin.
    pub fn visited(&self) -> &[OfficeId] {
        &self.visited
    }

    /// Number of ticks in which the letter was considered for forwarding but had nowhere to go.
    pub fn stalls(&self) -> usize {
        self.stalls
    }

    /// Returns `true` if the letter is in transit and sitting at its destination.
    pub fn arrived(&self) -> bool {
        self.state == State::InTransit && self.location == self.destination
    }

    pub(crate) fn ticket(&self) -> Ticket {
        Ticket {
            letter: self.id,
            priority: self.priority,
        }
    }

    /// Move to a neighbor as part of routing.
    pub(crate) fn hop(&mut self, to: OfficeId) {
        self.location = to;
        self.visited.push(to);
    }

    /// Move to another office without counting it as a routing step.
    pub(crate) fn relocate(&mut self, to: OfficeId) {
        self.location = to;
    }

    pub(crate) fn stall(&mut self) -> usize {
        self.stalls += 1;
        self.stalls
    }

    pub(crate) fn deliver(&mut self) {
        debug_assert_eq!(self.state, State::InTransit);
        self.state = State::Delivered;
    }

    pub(crate) fn abandon(&mut self) {
        debug_assert_eq!(self.state, State::InTransit);
        self.state = State::Undeliverable;
    }
}

/// Handle stored in an office queue in place of the [Letter] itself.
///
/// The priority is copied in so the queue can order tickets without reaching back into the
/// ledger. Two tickets with the same priority are only told apart by `letter`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub letter: LetterId,
    pub priority: u32,
}

/// Orders tickets so the numerically highest priority is extracted first.
pub fn by_priority(a: &Ticket, b: &Ticket) -> Ordering {
    b.priority.cmp(&a.priority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_utils::PriorityQueue;

    #[test]
    fn test_new_letter() {
        let letter = Letter::new(7, "ordinary".into(), 3, 1, 4, Bytes::from_static(b"data"));
        assert_eq!(letter.state(), State::InTransit);
        assert_eq!(letter.location(), 1);
        assert_eq!(letter.visited(), &[1]);
        assert!(!letter.arrived());
        assert_eq!(
            letter.ticket(),
            Ticket {
                letter: 7,
                priority: 3
            }
        );
    }

    #[test]
    fn test_hop_and_relocate() {
        let mut letter = Letter::new(1, "urgent".into(), 1, 1, 3, Bytes::from_static(b"x"));
        letter.hop(2);
        letter.relocate(5);
        letter.hop(3);
        assert_eq!(letter.visited(), &[1, 2, 3]);
        assert!(letter.arrived());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!State::InTransit.is_terminal());
        assert!(State::Delivered.is_terminal());
        assert!(State::Undeliverable.is_terminal());
        assert_eq!(State::InTransit.to_string(), "In transit");
    }

    #[test]
    fn test_highest_priority_first() {
        let mut queue = PriorityQueue::new(4, by_priority).unwrap();
        for (letter, priority) in [(1, 1), (2, 5), (3, 0), (4, 3)] {
            queue.push(Ticket { letter, priority }).unwrap();
        }
        let order: Vec<_> = std::iter::from_fn(|| queue.pop().ok())
            .map(|ticket| ticket.letter)
            .collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }
}
