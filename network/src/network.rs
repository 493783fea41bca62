//! Implementation of the postal [Network].

use crate::{
    audit::{Entry, Event, Sink},
    letter::{Letter, State, Ticket},
    metrics::Metrics,
    office::Office,
    report::{Ledger, Status},
    Error, LetterId, OfficeId,
};
use bytes::Bytes;
use prometheus_client::registry::Registry;
use tracing::{debug, info, warn};

/// Default cap on letters moved (delivered or forwarded) in a single tick.
pub const MAX_MOVES_PER_TICK: usize = 2;

/// Default number of visited offices (or attempts with no candidate neighbor) after which a letter
/// that cannot be forwarded is given up on.
pub const STARVATION_LIMIT: usize = 8;

/// Default initial capacity of each office's queue.
pub const QUEUE_CAPACITY: usize = 10;

/// Configuration for a [Network].
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of letters moved per tick, across the arrival and forwarding passes.
    pub max_moves_per_tick: usize,

    /// A letter that cannot be forwarded is marked undeliverable once its visited trail or its
    /// count of attempts with no candidate neighbor exceeds this.
    pub starvation_limit: usize,

    /// Initial capacity of each office's queue (grows on demand).
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_moves_per_tick: MAX_MOVES_PER_TICK,
            starvation_limit: STARVATION_LIMIT,
            queue_capacity: QUEUE_CAPACITY,
        }
    }
}

/// Observable effects of one call to [Network::tick].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tick {
    /// 1-based tick number.
    pub number: u64,
    /// Letters delivered or forwarded (never more than [Config::max_moves_per_tick]).
    pub moved: usize,
    /// Audit events recorded during the tick, in order.
    pub events: Vec<Event>,
}

/// A capacity-bounded network of offices routing letters toward their destinations.
///
/// The network is a single-writer simulation: it only advances when [Network::tick] is called and
/// performs no internal locking. Callers sharing a network across threads must serialize access
/// themselves.
///
/// Offices are kept in insertion order. That order decides where letters go when an office is
/// removed. Letters are never dropped: the ledger keeps every letter ever accepted, whatever its
/// state.
pub struct Network<S: Sink> {
    cfg: Config,
    offices: Vec<Office>,
    letters: Vec<Letter>,
    next_letter: LetterId,

    sink: S,
    sequence: u64,
    ticks: u64,
    captured: Option<Vec<Event>>,

    metrics: Metrics,
}

impl<S: Sink> Network<S> {
    /// Create an empty network that records its audit trail to `sink`.
    pub fn new(cfg: Config, sink: S) -> Result<Self, Error> {
        if cfg.max_moves_per_tick == 0 {
            return Err(Error::InvalidParameter(
                "max moves per tick must be greater than zero",
            ));
        }
        if cfg.queue_capacity == 0 {
            return Err(Error::InvalidParameter(
                "queue capacity must be greater than zero",
            ));
        }

        let mut network = Self {
            cfg,
            offices: Vec::new(),
            letters: Vec::new(),
            next_letter: 1,
            sink,
            sequence: 0,
            ticks: 0,
            captured: None,
            metrics: Metrics::default(),
        };
        network.record(Event::Initialized);
        Ok(network)
    }

    /// Register the network's metrics with `registry`.
    pub fn register(&self, registry: &mut Registry) {
        self.metrics.register(registry);
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record shutdown and return the sink.
    pub fn close(mut self) -> S {
        self.record(Event::Shutdown);
        info!(
            offices = self.offices.len(),
            letters = self.letters.len(),
            ticks = self.ticks,
            "network closed"
        );
        self.sink
    }

    /// Offices in insertion order.
    pub fn offices(&self) -> &[Office] {
        &self.offices
    }

    pub fn office(&self, id: OfficeId) -> Option<&Office> {
        self.offices.iter().find(|office| office.id() == id)
    }

    /// Every letter ever accepted, in submission order.
    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    pub fn letter(&self, id: LetterId) -> Option<&Letter> {
        self.letter_index(id).map(|index| &self.letters[index])
    }

    /// Returns `true` while any letter is still in transit.
    pub fn in_transit(&self) -> bool {
        self.letters
            .iter()
            .any(|letter| letter.state() == State::InTransit)
    }

    /// Snapshot of every letter (does not mutate the network).
    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.letters)
    }

    /// Aggregate counts plus per-office occupancy.
    pub fn status(&self) -> Status {
        Status::new(&self.offices, &self.letters)
    }

    /// Add an office with the given capacity and neighbor preference order.
    pub fn add_office(
        &mut self,
        id: OfficeId,
        capacity: usize,
        neighbors: Vec<OfficeId>,
    ) -> Result<(), Error> {
        if self.position(id).is_some() {
            return Err(Error::InvalidOfficeId(id));
        }
        let office = Office::new(id, capacity, neighbors, self.cfg.queue_capacity)?;
        self.offices
            .try_reserve(1)
            .map_err(|_| Error::MemoryAllocation)?;
        self.offices.push(office);
        self.metrics.offices.inc();

        debug!(office = id, capacity, "added office");
        self.record(Event::OfficeAdded {
            office: id,
            capacity,
        });
        Ok(())
    }

    /// Remove an office, draining its queue first.
    ///
    /// Resident letters leave in priority order. A letter whose origin or destination is the
    /// removed office becomes undeliverable. Any other letter moves to the first surviving office
    /// (in insertion order) with room, or becomes undeliverable if none has room.
    ///
    /// The drain is planned before anything changes: if the operation fails, no office or letter
    /// has been modified.
    pub fn remove_office(&mut self, id: OfficeId) -> Result<(), Error> {
        let index = self.position(id).ok_or(Error::OfficeNotFound(id))?;

        // Plan against a copy of the queue and projected loads
        let mut drain = self.offices[index].queue().clone();
        let mut loads: Vec<usize> = self.offices.iter().map(Office::load).collect();
        let mut plan: Vec<(Ticket, Option<usize>)> = Vec::with_capacity(drain.len());
        while let Ok(ticket) = drain.pop() {
            let letter = self
                .letter(ticket.letter)
                .ok_or(Error::LetterNotFound(ticket.letter))?;
            let target = if letter.origin() == id || letter.destination() == id {
                None
            } else {
                self.offices
                    .iter()
                    .enumerate()
                    .position(|(i, office)| i != index && loads[i] < office.capacity())
            };
            if let Some(target) = target {
                loads[target] += 1;
            }
            plan.push((ticket, target));
        }

        // Reserve room in every target so the moves below cannot fail
        for (i, office) in self.offices.iter_mut().enumerate() {
            if i != index && loads[i] > office.load() {
                office.reserve(loads[i] - office.load())?;
            }
        }

        for (ticket, target) in plan {
            let letter = ticket.letter;
            match target {
                Some(target) => {
                    self.offices[target].admit(ticket)?;
                    let to = self.offices[target].id();
                    if let Some(index) = self.letter_index(letter) {
                        self.letters[index].relocate(to);
                    }
                    self.metrics.redirected.inc();
                    debug!(letter, from = id, to, "redirected letter");
                    self.record(Event::Redirected {
                        letter,
                        from: id,
                        to,
                    });
                }
                None => {
                    if let Some(index) = self.letter_index(letter) {
                        self.abandon(index);
                    }
                }
            }
        }

        self.offices.remove(index);
        self.metrics.offices.dec();
        debug!(office = id, "removed office");
        self.record(Event::OfficeRemoved { office: id });
        Ok(())
    }

    /// Submit a letter at `origin`, returning its id.
    ///
    /// Fails with [Error::CapacityExceeded] if `origin` is full, in which case no letter is
    /// created and no id is consumed.
    pub fn add_letter(
        &mut self,
        kind: impl Into<String>,
        priority: u32,
        origin: OfficeId,
        destination: OfficeId,
        payload: impl Into<Bytes>,
    ) -> Result<LetterId, Error> {
        let kind = kind.into();
        let payload = payload.into();
        if kind.is_empty() {
            return Err(Error::InvalidParameter("letter kind must not be empty"));
        }
        if payload.is_empty() {
            return Err(Error::InvalidParameter("letter payload must not be empty"));
        }
        let from = self.position(origin).ok_or(Error::OfficeNotFound(origin))?;
        if self.position(destination).is_none() {
            return Err(Error::OfficeNotFound(destination));
        }
        if !self.offices[from].has_room() {
            return Err(Error::CapacityExceeded(origin));
        }
        self.letters
            .try_reserve(1)
            .map_err(|_| Error::MemoryAllocation)?;

        let id = self.next_letter;
        let letter = Letter::new(id, kind, priority, origin, destination, payload);
        self.offices[from].admit(letter.ticket())?;
        self.letters.push(letter);
        self.next_letter += 1;
        self.metrics.submitted.inc();

        debug!(letter = id, priority, origin, destination, "added letter");
        self.record(Event::LetterAdded {
            letter: id,
            origin,
            destination,
        });
        Ok(id)
    }

    /// Deliver a letter if it is in transit and sitting at its destination, which must be `office`.
    ///
    /// Returns `Ok(false)` (and changes nothing) for unknown letters, terminal letters and letters
    /// that are elsewhere.
    pub fn try_take(&mut self, letter: LetterId, office: OfficeId) -> Result<bool, Error> {
        let Some(index) = self.letter_index(letter) else {
            return Ok(false);
        };
        let candidate = &self.letters[index];
        if !candidate.arrived() || candidate.destination() != office {
            return Ok(false);
        }
        let position = self.position(office).ok_or(Error::OfficeNotFound(office))?;
        self.offices[position].evict(letter)?;
        self.letters[index].deliver();
        self.metrics.delivered.inc();

        debug!(letter, office, "delivered letter");
        self.record(Event::Delivered { letter, office });
        Ok(true)
    }

    /// Give up on a letter still in transit, removing it from its office's queue.
    ///
    /// Terminal states are sticky: returns `Ok(false)` without changes if the letter was already
    /// delivered or undeliverable.
    pub fn mark_undeliverable(&mut self, letter: LetterId) -> Result<bool, Error> {
        let index = self
            .letter_index(letter)
            .ok_or(Error::LetterNotFound(letter))?;
        if self.letters[index].state().is_terminal() {
            debug!(letter, state = %self.letters[index].state(), "letter already terminal");
            return Ok(false);
        }
        let location = self.letters[index].location();
        if let Some(position) = self.position(location) {
            self.offices[position].evict(letter)?;
        }
        self.abandon(index);
        Ok(true)
    }

    /// Advance the network by one tick.
    ///
    /// First every in-transit letter already at its destination is delivered. Then every other
    /// in-transit letter, in submission order, is forwarded to the first neighbor of its current
    /// office that exists, is not in its visited trail and has room. A hop that lands on the
    /// destination delivers the letter immediately. No more than [Config::max_moves_per_tick]
    /// letters move in total; the tick stops as soon as that many have.
    ///
    /// A letter whose office has no present, unvisited neighbor accrues a stall (waiting on a full
    /// neighbor does not). Once its visited trail or its stall count exceeds
    /// [Config::starvation_limit] and it fails to move, it is marked undeliverable.
    pub fn tick(&mut self) -> Result<Tick, Error> {
        self.ticks += 1;
        self.metrics.ticks.inc();
        self.captured = Some(Vec::new());
        let result = self.advance();
        let events = self.captured.take().unwrap_or_default();
        let moved = result?;
        debug!(tick = self.ticks, moved, "processed tick");
        Ok(Tick {
            number: self.ticks,
            moved,
            events,
        })
    }

    fn advance(&mut self) -> Result<usize, Error> {
        let limit = self.cfg.max_moves_per_tick;
        let mut moved = 0;

        // Arrival pass
        for index in 0..self.letters.len() {
            if moved >= limit {
                return Ok(moved);
            }
            let letter = &self.letters[index];
            if !letter.arrived() {
                continue;
            }
            let (id, destination) = (letter.id(), letter.destination());
            if self.try_take(id, destination)? {
                moved += 1;
            }
        }

        // Forwarding pass
        for index in 0..self.letters.len() {
            if moved >= limit {
                break;
            }
            let letter = &self.letters[index];
            if letter.state() != State::InTransit || letter.arrived() {
                continue;
            }
            if self.forward(index)? {
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Try to move the letter at `index` one hop. Returns whether it moved.
    fn forward(&mut self, index: usize) -> Result<bool, Error> {
        let (id, from, destination) = {
            let letter = &self.letters[index];
            (letter.id(), letter.location(), letter.destination())
        };
        let Some(current) = self.position(from) else {
            warn!(letter = id, office = from, "letter at unknown office");
            self.abandon(index);
            return Ok(false);
        };

        let visited = self.letters[index].visited();
        let mut routable = false;
        let next = self.offices[current]
            .neighbors()
            .iter()
            .copied()
            .filter(|neighbor| *neighbor != from && !visited.contains(neighbor))
            .filter_map(|neighbor| self.office(neighbor))
            .inspect(|_| routable = true)
            .find(|office| office.has_room())
            .map(Office::id);
        let Some(to) = next else {
            // Only a letter with no candidate neighbor at all accrues a stall
            let stalls = if routable {
                self.letters[index].stalls()
            } else {
                self.letters[index].stall()
            };
            let visited = self.letters[index].visited().len();
            let limit = self.cfg.starvation_limit;
            debug!(letter = id, office = from, routable, stalls, visited, "no route for letter");
            if visited > limit || stalls > limit {
                self.mark_undeliverable(id)?;
            }
            return Ok(false);
        };
        let target = self.position(to).ok_or(Error::OfficeNotFound(to))?;

        // A letter is never resident in two queues at once
        let ticket = self.offices[current].evict(id)?;
        if let Err(err) = self.offices[target].admit(ticket) {
            self.offices[current].admit(ticket)?;
            return Err(err);
        }
        self.letters[index].hop(to);
        self.metrics.hops.inc();
        debug!(letter = id, from, to, "forwarded letter");
        self.record(Event::Forwarded {
            letter: id,
            from,
            to,
        });

        if to == destination {
            self.try_take(id, to)?;
        }
        Ok(true)
    }

    /// Mark an in-transit letter undeliverable. The caller is responsible for its queue slot.
    fn abandon(&mut self, index: usize) {
        let letter = &mut self.letters[index];
        letter.abandon();
        let id = letter.id();
        self.metrics.undeliverable.inc();
        debug!(letter = id, "marked letter undeliverable");
        self.record(Event::Undeliverable { letter: id });
    }

    fn record(&mut self, event: Event) {
        self.sequence += 1;
        if let Some(captured) = self.captured.as_mut() {
            captured.push(event.clone());
        }
        self.sink.record(&Entry {
            sequence: self.sequence,
            event,
        });
    }

    fn position(&self, id: OfficeId) -> Option<usize> {
        self.offices.iter().position(|office| office.id() == id)
    }

    fn letter_index(&self, id: LetterId) -> Option<usize> {
        // Ids are dense: the n-th accepted letter has id n
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        (index < self.letters.len()).then_some(index)
    }
}
