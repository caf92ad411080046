//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::net::Ipv4Addr;
use std::rc::Rc;

use bytes::Bytes;
use satroute_utils::sim::Scheduler;
use satroute_utils::southbound::RoutingTable;
use tracing::debug_span;

use crate::config::{LsdbCfg, RouteCfg};
use crate::debug::Debug;
use crate::error::Error;
use crate::lsdb::{AddressTable, LsaFlood, Lsdb};
use crate::packet::{LsUpdate, PacketBase};
use crate::packet::lsa::{Lsa, LsaBody};
use crate::route::{CalcTimeObserver, CpuClock, RouteBuilder, TopologyChange};
use crate::tasks::TimerEvent;

// Routing core of a single node: its LSDB and the route builder fed by it.
pub struct Router {
    pub lsdb: Lsdb<RouteBuilder>,
}

// ===== impl Router =====

impl Router {
    pub fn new(
        router_id: Ipv4Addr,
        lsdb_cfg: LsdbCfg,
        route_cfg: RouteCfg,
        scheduler: Rc<dyn Scheduler<TimerEvent>>,
        flood: Box<dyn LsaFlood>,
        table: Box<dyn RoutingTable>,
        calc_time: Box<dyn CalcTimeObserver>,
    ) -> Router {
        let route_builder =
            RouteBuilder::new(route_cfg, table, calc_time, scheduler.clone());
        let lsdb =
            Lsdb::new(router_id, lsdb_cfg, route_builder, scheduler, flood);
        Router { lsdb }
    }

    // Replaces the clock used to measure route computations.
    pub fn with_cpu_clock(mut self, cpu_clock: Box<dyn CpuClock>) -> Self {
        self.lsdb.rebuild_handler_mut().set_cpu_clock(cpu_clock);
        self
    }

    pub fn router_id(&self) -> Ipv4Addr {
        self.lsdb.router_id()
    }

    // Processes the LSAs of a bulk update delivered by the flooding layer.
    //
    // Instances that aren't more recent than the database copy are
    // discarded. The routing table is rebuilt once all LSAs are processed,
    // and only if the LSDB contents changed.
    pub fn process_update(&mut self, pkt: LsUpdate) -> Result<(), Error> {
        let span = debug_span!("node", router_id = %self.router_id());
        let _span_guard = span.enter();

        for lsa in pkt.lsas {
            if let Some(old_lsa) = self.lsdb.get_by_hdr(&lsa.hdr)
                && !self.lsdb.check_newer(&lsa.hdr, &old_lsa.hdr)
            {
                Debug::LsaDiscard(&lsa.hdr).log();
                continue;
            }
            self.lsdb.add(lsa);
        }

        if self.lsdb.rebuild_required() {
            self.lsdb.update_route()?;
        }

        Ok(())
    }

    // Decodes and processes a raw bulk update.
    pub fn process_packet(&mut self, mut buf: Bytes) -> Result<(), Error> {
        let pkt = LsUpdate::decode(&mut buf)?;
        self.process_update(pkt)
    }

    // Originates a new instance of the local router-LSA. The returned LSA
    // should be flooded to all neighbors.
    pub fn originate(&mut self, body: LsaBody) -> Result<Lsa, Error> {
        let span = debug_span!("node", router_id = %self.router_id());
        let _span_guard = span.enter();

        let lsa = self.lsdb.originate(body)?;
        if self.lsdb.rebuild_required() {
            self.lsdb.update_route()?;
        }

        Ok(lsa)
    }

    // Replaces the node's interface addresses, resetting the LSDB.
    pub fn reset_interfaces(
        &mut self,
        addresses: AddressTable,
    ) -> Result<(), Error> {
        let span = debug_span!("node", router_id = %self.router_id());
        let _span_guard = span.enter();

        self.lsdb.reset_interfaces(addresses)
    }

    // Signals a ground station attachment change and rebuilds the routing
    // table.
    pub fn topology_changed(
        &mut self,
        change: TopologyChange,
    ) -> Result<(), Error> {
        let span = debug_span!("node", router_id = %self.router_id());
        let _span_guard = span.enter();

        self.lsdb.rebuild_handler_mut().topology_changed(change);
        self.lsdb.update_route()
    }

    // Processes a timer event fired by the scheduler.
    pub fn process_timer(&mut self, event: TimerEvent) {
        let span = debug_span!("node", router_id = %self.router_id());
        let _span_guard = span.enter();

        match event {
            TimerEvent::LsaExpiry { key, generated_at } => {
                self.lsdb.process_expiry(&key, generated_at);
            }
            TimerEvent::RouteApply { table_id } => {
                self.lsdb.rebuild_handler_mut().process_apply(table_id);
            }
        }
    }

    pub fn route_builder(&self) -> &RouteBuilder {
        self.lsdb.rebuild_handler()
    }
}
