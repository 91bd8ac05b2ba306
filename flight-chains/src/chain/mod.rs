//! Append-only chain arena.
//!
//! A chain is an itinerary in progress: an ordered sequence of flights from
//! a start airport. Chains are stored as a tree of immutable nodes, each
//! holding its parent's id and the single flight it added. Extending a
//! chain never touches its ancestors, so siblings share their common
//! prefix and every intermediate chain keeps a stable identity.

mod error;

use chrono::NaiveDate;

use crate::domain::{AirportCode, ConnectionWindow, Cost, Flight, FlightId};

pub use error::ConstraintViolation;

/// Identity of a chain within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u32);

impl ChainId {
    pub const ROOT: ChainId = ChainId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The limits every chain in a search must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLimits {
    /// Total budget; every prefix of a chain must cost no more.
    pub budget: Cost,
    /// Allowed day offsets between consecutive flights.
    pub window: ConnectionWindow,
    /// When set, a flight may depart any airport within this many
    /// kilometres of where the previous flight landed.
    pub max_transfer_km: Option<f64>,
}

impl ChainLimits {
    pub fn new(budget: Cost, window: ConnectionWindow) -> Self {
        Self {
            budget,
            window,
            max_transfer_km: None,
        }
    }

    pub fn with_max_transfer_km(mut self, km: f64) -> Self {
        self.max_transfer_km = Some(km);
        self
    }
}

/// A node of the chain tree.
///
/// The root node holds no flight; it positions the search at the start
/// airport on the anchor date.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    parent: Option<ChainId>,
    flight: Option<Flight>,
    cost: Cost,
    airport: AirportCode,
    date: NaiveDate,
    origin: AirportCode,
    depth: u32,
}

impl ChainNode {
    pub fn parent(&self) -> Option<ChainId> {
        self.parent
    }

    /// The flight this node added to its parent.
    pub fn flight(&self) -> Option<&Flight> {
        self.flight.as_ref()
    }

    /// Cumulative cost of every flight in the chain.
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// The airport the chain currently ends at.
    pub fn airport(&self) -> AirportCode {
        self.airport
    }

    /// Date of the last flight, or the anchor date for the root.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The airport the chain started from.
    pub fn origin(&self) -> AirportCode {
        self.origin
    }

    /// Number of flights in the chain.
    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Lineage record joining a chain to the flight it added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainFlight {
    pub chain: ChainId,
    pub flight: FlightId,
    /// Zero-based position of the flight within the route.
    pub position: usize,
}

/// Maps ids of a grafted tree onto the tree it was grafted into.
#[derive(Debug, Clone)]
pub struct GraftMap(Vec<ChainId>);

impl GraftMap {
    pub fn get(&self, id: ChainId) -> Option<ChainId> {
        self.0.get(id.index()).copied()
    }
}

/// Arena of chain nodes rooted at one start airport.
#[derive(Debug, Clone)]
pub struct ChainTree {
    nodes: Vec<ChainNode>,
}

impl ChainTree {
    /// Create a tree holding only the root chain.
    pub fn new(origin: AirportCode, anchor: NaiveDate) -> Self {
        Self {
            nodes: vec![ChainNode {
                parent: None,
                flight: None,
                cost: Cost::ZERO,
                airport: origin,
                date: anchor,
                origin,
                depth: 0,
            }],
        }
    }

    pub fn root(&self) -> ChainId {
        ChainId::ROOT
    }

    /// The chain with no flights, at the origin on the anchor date.
    pub fn root_node(&self) -> &ChainNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: ChainId) -> Option<&ChainNode> {
        self.nodes.get(id.index())
    }

    fn node(&self, id: ChainId) -> Result<&ChainNode, ConstraintViolation> {
        self.get(id).ok_or(ConstraintViolation::UnknownChain(id))
    }

    /// Append a chain made of `parent` plus `flight`.
    ///
    /// `transfer_km` is the distance between the parent's airport and the
    /// flight's source, needed only when they differ.
    pub fn extend(
        &mut self,
        parent: ChainId,
        flight: Flight,
        limits: &ChainLimits,
        transfer_km: Option<f64>,
    ) -> Result<ChainId, ConstraintViolation> {
        let node = self.node(parent)?;

        if flight.source != node.airport {
            let within = match (limits.max_transfer_km, transfer_km) {
                (Some(max), Some(km)) => km <= max,
                _ => false,
            };
            if !within {
                return Err(ConstraintViolation::Discontinuous {
                    from: node.airport,
                    to: flight.source,
                });
            }
        }

        if !limits.window.admits(node.date, flight.date) {
            return Err(ConstraintViolation::OutsideWindow {
                previous: node.date,
                next: flight.date,
            });
        }

        let cost = node
            .cost
            .checked_add(flight.cost)
            .filter(|cost| *cost <= limits.budget)
            .ok_or(ConstraintViolation::OverBudget {
                cost: node.cost + flight.cost,
                budget: limits.budget,
            })?;

        let child = ChainNode {
            parent: Some(parent),
            flight: Some(flight),
            cost,
            airport: flight.destination,
            date: flight.date,
            origin: node.origin,
            depth: node.depth + 1,
        };

        let id = ChainId(self.nodes.len() as u32);
        self.nodes.push(child);
        Ok(id)
    }

    /// Append every non-root chain of `other` under this tree's root.
    ///
    /// Relative order is kept. Both trees must share origin and anchor.
    pub fn graft(&mut self, other: ChainTree) -> Result<GraftMap, ConstraintViolation> {
        let ours = &self.nodes[0];
        let theirs = &other.nodes[0];
        if ours.origin != theirs.origin || ours.date != theirs.date {
            return Err(ConstraintViolation::RootMismatch);
        }

        let mut map = Vec::with_capacity(other.nodes.len());
        map.push(ChainId::ROOT);

        for mut node in other.nodes.into_iter().skip(1) {
            // Parents precede children in an append-only arena.
            node.parent = node.parent.map(|p| map[p.index()]);
            map.push(ChainId(self.nodes.len() as u32));
            self.nodes.push(node);
        }

        Ok(GraftMap(map))
    }

    /// Flights of a chain in insertion order.
    pub fn flights(&self, id: ChainId) -> Vec<Flight> {
        let mut flights: Vec<Flight> = self
            .ancestry(id)
            .filter_map(|(_, node)| node.flight)
            .collect();
        flights.reverse();
        flights
    }

    /// Lineage records of a chain in insertion order.
    pub fn lineage(&self, id: ChainId) -> Vec<ChainFlight> {
        let mut records: Vec<(ChainId, FlightId)> = self
            .ancestry(id)
            .filter_map(|(chain, node)| node.flight.map(|f| (chain, f.id)))
            .collect();
        records.reverse();
        records
            .into_iter()
            .enumerate()
            .map(|(position, (chain, flight))| ChainFlight {
                chain,
                flight,
                position,
            })
            .collect()
    }

    /// The start airport followed by every destination, in order.
    pub fn airports(&self, id: ChainId) -> Vec<AirportCode> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut airports = vec![node.origin];
        airports.extend(self.flights(id).iter().map(|f| f.destination));
        airports
    }

    /// Walk from `id` up to the root.
    fn ancestry(&self, id: ChainId) -> impl Iterator<Item = (ChainId, &ChainNode)> {
        let mut next = self.get(id).map(|_| id);
        std::iter::from_fn(move || {
            let current = next?;
            let node = &self.nodes[current.index()];
            next = node.parent;
            Some((current, node))
        })
    }

    /// Re-check every invariant of a stored chain from its flights.
    pub fn verify(&self, id: ChainId, limits: &ChainLimits) -> Result<(), ConstraintViolation> {
        let node = self.node(id)?;
        let root = &self.nodes[0];
        let flights = self.flights(id);

        let total: Cost = flights.iter().map(|f| f.cost).sum();
        if total != node.cost {
            return Err(ConstraintViolation::CostMismatch {
                recorded: node.cost,
                actual: total,
            });
        }

        let mut airport = root.airport;
        let mut date = root.date;
        let mut spent = Cost::ZERO;
        for flight in &flights {
            if flight.source != airport && limits.max_transfer_km.is_none() {
                return Err(ConstraintViolation::Discontinuous {
                    from: airport,
                    to: flight.source,
                });
            }
            if !limits.window.admits(date, flight.date) {
                return Err(ConstraintViolation::OutsideWindow {
                    previous: date,
                    next: flight.date,
                });
            }
            spent = spent + flight.cost;
            if spent > limits.budget {
                return Err(ConstraintViolation::OverBudget {
                    cost: spent,
                    budget: limits.budget,
                });
            }
            airport = flight.destination;
            date = flight.date;
        }

        Ok(())
    }

    /// Number of chains, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Ids of every chain in creation order, root first.
    pub fn ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        (0..self.nodes.len()).map(|i| ChainId(i as u32))
    }
}
