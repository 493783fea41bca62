//! Read-only views over a [crate::Network]: the letter ledger and an occupancy summary.

use crate::{
    letter::{Letter, State},
    office::Office,
    OfficeId,
};
use std::fmt;

/// Every letter ever accepted, rendered as a tab-separated table.
#[derive(Clone, Copy, Debug)]
pub struct Ledger<'a> {
    letters: &'a [Letter],
}

impl<'a> Ledger<'a> {
    pub(crate) fn new(letters: &'a [Letter]) -> Self {
        Self { letters }
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Letter> {
        self.letters.iter()
    }
}

impl fmt::Display for Ledger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID\tType\tPriority\tFrom\tTo\tState\tCurrent Office")?;
        for letter in self.letters {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                letter.id(),
                letter.kind(),
                letter.priority(),
                letter.origin(),
                letter.destination(),
                letter.state(),
                letter.location()
            )?;
        }
        Ok(())
    }
}

/// Occupancy of a single office.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupancy {
    pub office: OfficeId,
    pub load: usize,
    pub capacity: usize,
    pub neighbors: Vec<OfficeId>,
}

/// Aggregate letter counts plus per-office occupancy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub letters: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub undeliverable: usize,
    pub offices: Vec<Occupancy>,
}

impl Status {
    pub(crate) fn new(offices: &[Office], letters: &[Letter]) -> Self {
        let mut status = Self {
            letters: letters.len(),
            offices: offices
                .iter()
                .map(|office| Occupancy {
                    office: office.id(),
                    load: office.load(),
                    capacity: office.capacity(),
                    neighbors: office.neighbors().to_vec(),
                })
                .collect(),
            ..Default::default()
        };
        for letter in letters {
            match letter.state() {
                State::InTransit => status.in_transit += 1,
                State::Delivered => status.delivered += 1,
                State::Undeliverable => status.undeliverable += 1,
            }
        }
        status
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "offices: {}", self.offices.len())?;
        writeln!(
            f,
            "letters: {} (in transit: {}, delivered: {}, undeliverable: {})",
            self.letters, self.in_transit, self.delivered, self.undeliverable
        )?;
        for occupancy in &self.offices {
            let neighbors: Vec<_> = occupancy.neighbors.iter().map(|n| n.to_string()).collect();
            writeln!(
                f,
                "  office {}: {}/{} letters, neighbors: {}",
                occupancy.office,
                occupancy.load,
                occupancy.capacity,
                neighbors.join(", ")
            )?;
        }
        Ok(())
    }
}
