//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::rc::Rc;

use derive_new::new;
use serde::{Deserialize, Serialize};

// Forwarding table entry handed over to the forwarding path.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, new)]
#[derive(Deserialize, Serialize)]
pub struct RouteEntry {
    // Destination interface address.
    pub destination: Ipv4Addr,
    // Outbound device.
    pub ifindex: u32,
    // Local interface address used as source.
    pub source: Ipv4Addr,
    // Address of the first-hop neighbor.
    pub gateway: Ipv4Addr,
}

/// Routing table sink consumed by the forwarding path.
pub trait RoutingTable {
    /// Removes every entry from the table.
    fn clear(&mut self);

    /// Adds a single entry to the table.
    fn insert(&mut self, entry: RouteEntry);
}

/// Routing table kept in memory and shareable between the route builder
/// (writer) and the forwarding path (reader).
#[derive(Clone, Debug, Default)]
pub struct SharedRoutingTable {
    entries: Rc<RefCell<BTreeSet<RouteEntry>>>,
}

// ===== impl SharedRoutingTable =====

impl SharedRoutingTable {
    // Returns a copy of the current entries, in destination order.
    pub fn entries(&self) -> Vec<RouteEntry> {
        self.entries.borrow().iter().copied().collect()
    }

    // Looks up the entry for the given destination address.
    pub fn lookup(&self, destination: Ipv4Addr) -> Option<RouteEntry> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.destination == destination)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl RoutingTable for SharedRoutingTable {
    fn clear(&mut self) {
        self.entries.borrow_mut().clear();
    }

    fn insert(&mut self, entry: RouteEntry) {
        self.entries.borrow_mut().insert(entry);
    }
}
