//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_new::new;
use satroute_utils::sim::{Scheduler, SimTime};
use satroute_utils::southbound::{RouteEntry, RoutingTable};
use serde::{Deserialize, Serialize};

use crate::config::RouteCfg;
use crate::debug::Debug;
use crate::error::Error;
use crate::lsdb::{AddressTable, LsaEntries, RouteRebuild};
use crate::packet::lsa::Lsa;
use crate::precomputed::{ChangeKey, PrecomputedTable};
use crate::spf::{self, Graph, Spt, VertexId};
use crate::tasks;
use crate::tasks::TimerEvent;

/// Receives the duration of every route computation.
pub trait CalcTimeObserver {
    fn calc_time(&mut self, node_id: u32, timestamp: SimTime, duration_ns: f64);
}

/// Clock used to measure how long route computations take.
pub trait CpuClock {
    /// Returns a monotonic reading. Only differences between readings are
    /// meaningful.
    fn now(&self) -> Duration;
}

// Measures route computations in real (wall-clock) time.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

// Ground station attachment change, as signalled by the link switching layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct TopologyChange {
    pub ground_station: VertexId,
    pub satellite: VertexId,
}

// Converts LSDB snapshots into forwarding tables.
pub struct RouteBuilder {
    config: RouteCfg,
    table: Box<dyn RoutingTable>,
    calc_time: Box<dyn CalcTimeObserver>,
    cpu_clock: Box<dyn CpuClock>,
    scheduler: Rc<dyn Scheduler<TimerEvent>>,
    // Computation time of the last installed table.
    last_route_calc_time: Option<SimTime>,
    // Tables waiting for their simulated computation delay to elapse, along
    // with the time they were computed at.
    pending: BTreeMap<u64, (SimTime, Vec<RouteEntry>)>,
    next_table_id: u64,
    // Satellite each ground station was attached to, according to the LSDB
    // contents of the last rebuild.
    ground_attachments: BTreeMap<VertexId, VertexId>,
    // Attachment changes signalled since the last rebuild.
    topology_changes: BTreeSet<ChangeKey>,
    // Signalled attachments not yet confirmed by the LSDB.
    signalled_attachments: BTreeMap<VertexId, VertexId>,
    // Time step of the last installed precomputed table.
    precomputed_time: Option<u32>,
}

// ===== impl WallClock =====

impl Default for WallClock {
    fn default() -> WallClock {
        WallClock {
            origin: Instant::now(),
        }
    }
}

impl CpuClock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

// ===== impl RouteBuilder =====

impl RouteBuilder {
    pub fn new(
        config: RouteCfg,
        table: Box<dyn RoutingTable>,
        calc_time: Box<dyn CalcTimeObserver>,
        scheduler: Rc<dyn Scheduler<TimerEvent>>,
    ) -> RouteBuilder {
        RouteBuilder {
            config,
            table,
            calc_time,
            cpu_clock: Box::new(WallClock::default()),
            scheduler,
            last_route_calc_time: None,
            pending: Default::default(),
            next_table_id: 0,
            ground_attachments: Default::default(),
            topology_changes: Default::default(),
            signalled_attachments: Default::default(),
            precomputed_time: None,
        }
    }

    // Replaces the clock used to measure route computations.
    pub fn set_cpu_clock(&mut self, cpu_clock: Box<dyn CpuClock>) {
        self.cpu_clock = cpu_clock;
    }

    // Installs a table whose simulated computation delay has elapsed.
    pub fn process_apply(&mut self, table_id: u64) {
        if let Some((calc_time, routes)) = self.pending.remove(&table_id) {
            self.apply(calc_time, routes);
        }
    }

    // Records a ground station attachment change. It's taken into account
    // by the next rebuild.
    pub fn topology_changed(&mut self, change: TopologyChange) {
        if self.config.precomputed.is_none() {
            return;
        }

        // The LSA confirming the change must not load the same table again.
        let old = self
            .signalled_attachments
            .insert(change.ground_station, change.satellite)
            .or_else(|| {
                self.ground_attachments.get(&change.ground_station).copied()
            });
        Debug::GroundAttachmentChange(
            change.ground_station,
            old,
            change.satellite,
        )
        .log();
        self.topology_changes.insert(ChangeKey::Attachment {
            ground: change.ground_station,
            satellite: change.satellite,
        });
    }

    pub fn config(&self) -> &RouteCfg {
        &self.config
    }

    pub fn last_route_calc_time(&self) -> Option<SimTime> {
        self.last_route_calc_time
    }

    // Number of computed tables waiting to be installed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // Installs a computed table, unless a table computed more recently was
    // installed already.
    fn apply(&mut self, calc_time: SimTime, routes: Vec<RouteEntry>) {
        if let Some(last_calc_time) = self.last_route_calc_time
            && calc_time < last_calc_time
        {
            Debug::RouteTableStale(calc_time, last_calc_time).log();
            return;
        }

        Debug::RouteTableApply(calc_time, routes.len()).log();
        self.table.clear();
        for route in routes {
            self.table.insert(route);
        }
        self.last_route_calc_time = Some(calc_time);
    }

    fn rebuild_spf(
        &mut self,
        graph: &Graph,
        node_id: VertexId,
        addresses: &AddressTable,
        now: SimTime,
    ) -> Result<(), Error> {
        // Wait until enough routers are known.
        let required = self.config.node_count();
        if graph.vertex_count() < required {
            Debug::SpfSkipped(graph.vertex_count(), required).log();
            return Ok(());
        }

        // Run SPF and measure how long it takes.
        let start = self.cpu_clock.now();
        let spt = spf::run(graph, node_id);
        let duration = self.cpu_clock.now().saturating_sub(start);
        Debug::SpfRun(spt.len(), duration).log();

        let routes = compute_table(graph, &spt, node_id, addresses)?;

        if self.config.simulated_delay {
            // The new table only becomes active once the computation time
            // has elapsed in simulated time.
            self.calc_time
                .calc_time(node_id, now, duration.as_nanos() as f64);
            Debug::RouteTableDelay(now, duration).log();
            let table_id = self.next_table_id;
            self.next_table_id += 1;
            self.pending.insert(table_id, (now, routes));
            tasks::route_apply_timer(
                self.scheduler.as_ref(),
                table_id,
                duration,
            );
        } else {
            self.calc_time.calc_time(node_id, now, 0.0);
            self.apply(now, routes);
        }

        Ok(())
    }

    fn rebuild_precomputed(
        &mut self,
        graph: &Graph,
        base_path: &Path,
        node_id: VertexId,
        addresses: &AddressTable,
        now: SimTime,
    ) -> Result<(), Error> {
        // Detect ground station attachment changes.
        let mut changes = std::mem::take(&mut self.topology_changes);
        for (ground, satellite) in graph.ground_attachments(&self.config) {
            let old = self.ground_attachments.insert(ground, satellite);
            if old == Some(satellite) {
                continue;
            }
            if self.signalled_attachments.get(&ground) == Some(&satellite) {
                self.signalled_attachments.remove(&ground);
                continue;
            }
            Debug::GroundAttachmentChange(ground, old, satellite).log();
            changes.insert(ChangeKey::Attachment { ground, satellite });
        }

        // The initial table supersedes any change seen before it.
        if self.precomputed_time.is_none() {
            changes = BTreeSet::from([ChangeKey::Initial]);
            self.signalled_attachments.clear();
        }

        for change in changes {
            let path = change.file_path(base_path, node_id);
            let table = PrecomputedTable::load(&path, node_id)?;
            self.install_precomputed(&path, table, graph, addresses, now)?;
        }

        Ok(())
    }

    fn install_precomputed(
        &mut self,
        path: &Path,
        table: PrecomputedTable,
        graph: &Graph,
        addresses: &AddressTable,
        now: SimTime,
    ) -> Result<(), Error> {
        // Ignore tables older than the one currently installed.
        if let Some(last_time_step) = self.precomputed_time
            && table.time_step < last_time_step
        {
            Debug::PrecomputedIgnore(path, table.time_step, last_time_step)
                .log();
            return Ok(());
        }

        let mut routes = vec![];
        for route in &table.routes {
            let destination = Ipv4Addr::from(route.dst);
            let nexthop = Ipv4Addr::from(route.next_hop);
            let nbr_addr = addresses
                .get(&nexthop)
                .ok_or(Error::NexthopAddrNotFound(destination, nexthop))?;

            // The destination's LSA might not have been received yet.
            let Some(dst_addrs) = graph
                .addresses
                .get(&route.dst)
                .filter(|dst_addrs| !dst_addrs.is_empty())
            else {
                Debug::PrecomputedRouteSkip(route.dst).log();
                continue;
            };
            for dst_addr in dst_addrs {
                routes.push(RouteEntry::new(
                    *dst_addr,
                    route.out_iface,
                    nbr_addr.local_addr,
                    nbr_addr.gateway_addr,
                ));
            }
        }

        Debug::PrecomputedLoad(path, table.time_step, routes.len()).log();
        self.precomputed_time = Some(table.time_step);
        self.apply(now, routes);

        Ok(())
    }
}

impl RouteRebuild for RouteBuilder {
    fn rebuild(
        &mut self,
        lsdb: &LsaEntries,
        delta: &[Arc<Lsa>],
        router_id: Ipv4Addr,
        addresses: &AddressTable,
    ) -> Result<(), Error> {
        Debug::RouteRebuild(lsdb.len(), delta.len()).log();
        let now = self.scheduler.now();

        // An empty LSDB means the node was reset.
        if lsdb.is_empty() {
            Debug::RouteTableClear.log();
            self.table.clear();
            self.last_route_calc_time = Some(now);
            self.pending.clear();
            self.ground_attachments.clear();
            self.topology_changes.clear();
            self.signalled_attachments.clear();
            self.precomputed_time = None;
            return Ok(());
        }

        let graph = Graph::build(lsdb);
        let node_id = u32::from(router_id);
        match self.config.precomputed.clone() {
            Some(precomputed) => self.rebuild_precomputed(
                &graph,
                &precomputed.base_path,
                node_id,
                addresses,
                now,
            ),
            None => self.rebuild_spf(&graph, node_id, addresses, now),
        }
    }
}

// ===== impl CalcTimeObserver =====

impl<F> CalcTimeObserver for F
where
    F: FnMut(u32, SimTime, f64),
{
    fn calc_time(
        &mut self,
        node_id: u32,
        timestamp: SimTime,
        duration_ns: f64,
    ) {
        self(node_id, timestamp, duration_ns)
    }
}

// ===== global functions =====

// Computes the forwarding entries towards every destination reachable
// through the shortest-path tree.
//
// Destinations absent from the tree are skipped. A destination or first hop
// without a known address means the address table and the LSDB disagree,
// which is reported as an error.
pub fn compute_table(
    graph: &Graph,
    spt: &Spt,
    root: VertexId,
    addresses: &AddressTable,
) -> Result<Vec<RouteEntry>, Error> {
    let mut routes = vec![];

    for dest_id in spt.keys().copied() {
        if dest_id == root {
            continue;
        }
        let Some(first_hop) = spf::first_hop(spt, root, dest_id) else {
            continue;
        };

        let destination = Ipv4Addr::from(dest_id);
        let nexthop = Ipv4Addr::from(first_hop);
        let nbr_addr = addresses
            .get(&nexthop)
            .ok_or(Error::NexthopAddrNotFound(destination, nexthop))?;
        let dst_addrs = graph
            .addresses
            .get(&dest_id)
            .filter(|dst_addrs| !dst_addrs.is_empty())
            .ok_or(Error::DestinationAddrNotFound(destination))?;

        for dst_addr in dst_addrs {
            routes.push(RouteEntry::new(
                *dst_addr,
                nbr_addr.ifindex,
                nbr_addr.local_addr,
                nbr_addr.gateway_addr,
            ));
        }
    }

    Ok(routes)
}
