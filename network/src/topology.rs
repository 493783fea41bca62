//! Load a network layout from a list of undirected links.
//!
//! # Format
//!
//! One link per line, two office ids separated by whitespace:
//!
//! ```text
//! 1 2
//! 2 3
//! 3 1
//! ```
//!
//! Blank lines are skipped and self-links are ignored. Offices are created in the order they are
//! first mentioned, and each office prefers its neighbors in that same order.

use crate::{audit::Sink, Error, Network, OfficeId};
use std::{collections::HashSet, str::FromStr};
use tracing::debug;

/// Offices and their neighbor lists, in first-mention order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Topology {
    offices: Vec<(OfficeId, Vec<OfficeId>)>,
}

impl Topology {
    /// Parse a link list (see the module docs for the format).
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut order: Vec<OfficeId> = Vec::new();
        let mut links: HashSet<(OfficeId, OfficeId)> = HashSet::new();
        for (number, text) in input.lines().enumerate() {
            let line = number + 1;
            if text.trim().is_empty() {
                continue;
            }
            let mut fields = text.split_whitespace();
            let (Some(a), Some(b), None) = (fields.next(), fields.next(), fields.next()) else {
                return Err(Error::MalformedTopology { line });
            };
            let a = a.parse::<OfficeId>().map_err(|_| Error::MalformedTopology { line })?;
            let b = b.parse::<OfficeId>().map_err(|_| Error::MalformedTopology { line })?;
            for id in [a, b] {
                if !order.contains(&id) {
                    order.push(id);
                }
            }
            if a != b {
                links.insert((a, b));
                links.insert((b, a));
            }
        }

        let offices = order
            .iter()
            .map(|&id| {
                let neighbors = order
                    .iter()
                    .copied()
                    .filter(|&other| links.contains(&(id, other)))
                    .collect();
                (id, neighbors)
            })
            .collect();
        Ok(Self { offices })
    }

    pub fn len(&self) -> usize {
        self.offices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }

    /// Offices with their neighbors, in first-mention order.
    pub fn offices(&self) -> impl Iterator<Item = (OfficeId, &[OfficeId])> {
        self.offices
            .iter()
            .map(|(id, neighbors)| (*id, neighbors.as_slice()))
    }

    /// Add every office to `network`, each with the same `capacity`.
    pub fn apply<S: Sink>(&self, network: &mut Network<S>, capacity: usize) -> Result<(), Error> {
        for (id, neighbors) in &self.offices {
            network.add_office(*id, capacity, neighbors.clone())?;
        }
        debug!(offices = self.offices.len(), capacity, "applied topology");
        Ok(())
    }
}

impl FromStr for Topology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
