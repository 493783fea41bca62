//! Capacity-bounded nodes holding a priority queue of resident letters.

use crate::{
    letter::{by_priority, Ticket},
    Error, LetterId, OfficeId,
};
use postal_utils::PriorityQueue;

/// A node in the routing graph.
///
/// Neighbors may name offices that are not (or no longer) part of the network. Those entries are
/// skipped when forwarding.
#[derive(Clone, Debug)]
pub struct Office {
    id: OfficeId,
    capacity: usize,
    resident: PriorityQueue<Ticket>,
    neighbors: Vec<OfficeId>,
}

impl Office {
    pub(crate) fn new(
        id: OfficeId,
        capacity: usize,
        neighbors: Vec<OfficeId>,
        queue_capacity: usize,
    ) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidParameter("office capacity must be greater than zero"));
        }
        Ok(Self {
            id,
            capacity,
            resident: PriorityQueue::new(queue_capacity, by_priority)?,
            neighbors,
        })
    }

    pub fn id(&self) -> OfficeId {
        self.id
    }

    /// Maximum number of letters that may reside here at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of letters currently resident.
    pub fn load(&self) -> usize {
        self.resident.len()
    }

    pub fn has_room(&self) -> bool {
        self.resident.len() < self.capacity
    }

    /// Neighbor ids in routing preference order.
    pub fn neighbors(&self) -> &[OfficeId] {
        &self.neighbors
    }

    /// Resident letters in queue storage order.
    pub fn residents(&self) -> impl Iterator<Item = LetterId> + '_ {
        self.resident.iter().map(|ticket| ticket.letter)
    }

    /// Highest-priority resident letter, if any.
    pub fn next(&self) -> Option<LetterId> {
        self.resident.peek().ok().map(|ticket| ticket.letter)
    }

    pub(crate) fn queue(&self) -> &PriorityQueue<Ticket> {
        &self.resident
    }

    pub(crate) fn admit(&mut self, ticket: Ticket) -> Result<(), Error> {
        if !self.has_room() {
            return Err(Error::CapacityExceeded(self.id));
        }
        self.resident.push(ticket)?;
        Ok(())
    }

    /// Remove a letter by identity (never by priority, which is not unique).
    pub(crate) fn evict(&mut self, letter: LetterId) -> Result<Ticket, Error> {
        self.resident
            .remove_where(|ticket| ticket.letter == letter)
            .map_err(|_| Error::NotQueued {
                letter,
                office: self.id,
            })
    }

    /// Make room for `additional` admissions without allocating during them.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.resident.reserve(additional)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(letter: LetterId, priority: u32) -> Ticket {
        Ticket { letter, priority }
    }

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(
            Office::new(1, 0, vec![], 10),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_admit_respects_capacity() {
        let mut office = Office::new(1, 2, vec![2], 1).unwrap();
        office.admit(ticket(1, 1)).unwrap();
        office.admit(ticket(2, 4)).unwrap();
        assert!(!office.has_room());
        assert!(matches!(
            office.admit(ticket(3, 9)),
            Err(Error::CapacityExceeded(1))
        ));
        assert_eq!(office.load(), 2);
        assert_eq!(office.next(), Some(2));
    }

    #[test]
    fn test_evict_by_identity() {
        let mut office = Office::new(1, 4, vec![], 4).unwrap();
        office.admit(ticket(1, 2)).unwrap();
        office.admit(ticket(2, 2)).unwrap();
        office.admit(ticket(3, 2)).unwrap();

        assert_eq!(office.evict(3).unwrap(), ticket(3, 2));
        assert_eq!(office.evict(1).unwrap(), ticket(1, 2));
        assert_eq!(office.residents().collect::<Vec<_>>(), vec![2]);
        assert!(matches!(
            office.evict(1),
            Err(Error::NotQueued {
                letter: 1,
                office: 1
            })
        ));
    }
}
