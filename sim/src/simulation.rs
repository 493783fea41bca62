//! Automatic processing: apply scheduled actions and tick until nothing is left in transit.

use crate::manifest::Manifest;
use postal_network::{audit::Sink, Network};
use tracing::{debug, info, warn};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Ticks executed.
    pub ticks: u64,
    /// Letters from the manifest the network refused.
    pub rejected: usize,
    /// Whether letters were still in transit when the tick budget ran out.
    pub exhausted: bool,
}

/// Run `network` for at most `max_ticks` ticks, applying `manifest` as it goes.
///
/// Before tick `n` (counting from 0), every action scheduled `at: n` is applied: offices are
/// added, then removed, then letters are submitted, taken and marked undeliverable. A letter the
/// network refuses (full origin, unknown office) is logged and counted as rejected. Any other
/// action that fails is logged and skipped. The run stops early once nothing is in transit and
/// nothing else is scheduled.
pub fn run<S: Sink>(
    network: &mut Network<S>,
    manifest: &Manifest,
    max_ticks: u64,
    report_every: u64,
) -> Result<Summary, postal_network::Error> {
    let mut rejected = 0;
    let mut ticks = 0;
    while ticks < max_ticks {
        for office in manifest.offices.iter().filter(|o| o.at == ticks) {
            let neighbors = office.neighbors.clone();
            if let Err(err) = network.add_office(office.id, office.capacity, neighbors) {
                warn!(office = office.id, ?err, "failed to add office");
            }
        }
        for removal in manifest.removals.iter().filter(|r| r.at == ticks) {
            if let Err(err) = network.remove_office(removal.office) {
                warn!(office = removal.office, ?err, "failed to remove office");
            }
        }
        for letter in manifest.letters.iter().filter(|l| l.at == ticks) {
            if let Err(err) = network.add_letter(
                letter.kind.clone(),
                letter.priority,
                letter.origin,
                letter.destination,
                letter.payload.clone(),
            ) {
                warn!(
                    origin = letter.origin,
                    destination = letter.destination,
                    ?err,
                    "failed to submit letter"
                );
                rejected += 1;
            }
        }
        for take in manifest.takes.iter().filter(|t| t.at == ticks) {
            match network.try_take(take.letter, take.office) {
                Ok(taken) => debug!(
                    letter = take.letter,
                    office = take.office,
                    taken,
                    "tried to take letter"
                ),
                Err(err) => warn!(
                    letter = take.letter,
                    office = take.office,
                    ?err,
                    "failed to take letter"
                ),
            }
        }
        for mark in manifest.undeliverable.iter().filter(|m| m.at == ticks) {
            match network.mark_undeliverable(mark.letter) {
                Ok(changed) => debug!(letter = mark.letter, changed, "marked letter undeliverable"),
                Err(err) => warn!(letter = mark.letter, ?err, "failed to mark letter undeliverable"),
            }
        }
        if !network.in_transit() && !manifest.pending(ticks + 1) {
            break;
        }

        let tick = network.tick()?;
        ticks = tick.number;
        if report_every > 0 && ticks % report_every == 0 {
            let status = network.status();
            info!(
                tick = ticks,
                in_transit = status.in_transit,
                delivered = status.delivered,
                undeliverable = status.undeliverable,
                "progress"
            );
        }
    }

    let exhausted = network.in_transit();
    info!(ticks, rejected, exhausted, "processing finished");
    Ok(Summary {
        ticks,
        rejected,
        exhausted,
    })
}
