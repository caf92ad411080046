//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::sync::Arc;

use derive_new::new;
use satroute_utils::sim::{Scheduler, TimerId};
use serde::{Deserialize, Serialize};

use crate::config::LsdbCfg;
use crate::debug::{Debug, LsaFlushReason};
use crate::error::Error;
use crate::packet::lsa::{Lsa, LsaBody, LsaHdr, LsaKey, Options};
use crate::tasks;
use crate::tasks::TimerEvent;

// Architectural Constants.
pub const LSA_MAX_AGE: u16 = 3600;
pub const LSA_MAX_AGE_DIFF: u16 = 900;
pub const LSA_INIT_SEQ_NO: u32 = 1;
pub const LSA_MAX_SEQ_NO: u32 = u32::MAX;

// LSAs stored in the LSDB, in key order.
pub type LsaEntries = BTreeMap<LsaKey, LsaEntry>;

// Interface addresses towards each neighbor, keyed by the neighbor's router
// ID.
pub type AddressTable = BTreeMap<Ipv4Addr, NbrAddr>;

#[derive(Debug)]
pub struct LsaEntry {
    // LSA data.
    pub data: Arc<Lsa>,
    // Simulation time (in seconds) at which this instance was generated. It's
    // the only source of truth for the LSA age.
    pub generated_at: u32,
    // Expiry timer that triggers when the LSA age reaches MaxAge.
    pub expiry_timer: Option<TimerId>,
}

// Local and remote addresses of the link towards a neighbor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct NbrAddr {
    // Outbound device.
    pub ifindex: u32,
    // Local interface address.
    pub local_addr: Ipv4Addr,
    // Neighbor's interface address.
    pub gateway_addr: Ipv4Addr,
}

/// Consumer of LSDB snapshots, in charge of recomputing the routing table.
pub trait RouteRebuild {
    /// Called with the full LSDB, the LSAs added since the previous call,
    /// the local router ID and the current address table.
    fn rebuild(
        &mut self,
        lsdb: &LsaEntries,
        delta: &[Arc<Lsa>],
        router_id: Ipv4Addr,
        addresses: &AddressTable,
    ) -> Result<(), Error>;
}

/// Flooding layer entry point, used to reflood LSAs that reached MaxAge.
pub trait LsaFlood {
    fn flood(&mut self, lsas: &[Lsa], src: Ipv4Addr, dst: Ipv4Addr);
}

// Link-State Database of a single node.
pub struct Lsdb<R: RouteRebuild> {
    router_id: Ipv4Addr,
    config: LsdbCfg,
    entries: LsaEntries,
    // LSAs added since the last route rebuild.
    delta: Vec<Arc<Lsa>>,
    // Last sequence number used by a self-originated LSA.
    seq_no: u32,
    addresses: AddressTable,
    rebuild_required: bool,
    rebuild: R,
    scheduler: Rc<dyn Scheduler<TimerEvent>>,
    flood: Box<dyn LsaFlood>,
}

// ===== impl LsaEntry =====

impl LsaEntry {
    // Returns the LSA age at the given time, capped at `max_age`.
    pub fn age(&self, now: u32, max_age: u16) -> u16 {
        let age = now.saturating_sub(self.generated_at);
        std::cmp::min(age, max_age.into()) as u16
    }
}

// ===== impl Lsdb =====

impl<R> Lsdb<R>
where
    R: RouteRebuild,
{
    pub fn new(
        router_id: Ipv4Addr,
        config: LsdbCfg,
        rebuild: R,
        scheduler: Rc<dyn Scheduler<TimerEvent>>,
        flood: Box<dyn LsaFlood>,
    ) -> Lsdb<R> {
        Lsdb {
            router_id,
            config,
            entries: Default::default(),
            delta: Default::default(),
            seq_no: LSA_INIT_SEQ_NO - 1,
            addresses: Default::default(),
            rebuild_required: false,
            rebuild,
            scheduler,
            flood,
        }
    }

    // Adds an LSA to the LSDB, replacing the existing instance (if any).
    //
    // No freshness check is performed: the caller is expected to deliver only
    // instances that are more recent than the database copy.
    pub fn add(&mut self, mut lsa: Lsa) {
        let now = self.now();
        let max_age = self.config.max_age;
        let key = lsa.hdr.key();
        let generated_at = now.saturating_sub(lsa.hdr.age.into());
        lsa.hdr.generated_at = generated_at;
        let lsa = Arc::new(lsa);

        // Remove old instance of the LSA.
        let content_change = match self.entries.remove(&key) {
            Some(old_lse) => {
                if let Some(timer) = old_lse.expiry_timer {
                    self.scheduler.cancel(timer);
                }
                let old_lsa = self.live_lsa(&old_lse, now);
                !lsa_same_contents(&old_lsa, &lsa, max_age)
            }
            None => true,
        };
        Debug::LsaInstall(&lsa.hdr, content_change).log();

        // Keep allocating sequence numbers above the ones seen in the network
        // for our own LSAs.
        if lsa.hdr.adv_rtr == self.router_id && lsa.hdr.seq_no > self.seq_no {
            self.seq_no = lsa.hdr.seq_no;
        }

        // Add LSA entry to LSDB.
        let expiry_timer = tasks::lsa_expiry_timer(
            self.scheduler.as_ref(),
            key,
            generated_at,
            max_age,
        );
        let lse = LsaEntry {
            data: lsa.clone(),
            generated_at,
            expiry_timer,
        };
        self.entries.insert(key, lse);
        self.delta.push(lsa);

        if content_change {
            self.rebuild_required = true;
        }
    }

    // Returns the LSA identified by `key`, with its age refreshed.
    pub fn get(&self, key: &LsaKey) -> Option<Lsa> {
        let now = self.now();
        self.entries.get(key).map(|lse| self.live_lsa(lse, now))
    }

    pub fn get_by_hdr(&self, hdr: &LsaHdr) -> Option<Lsa> {
        self.get(&hdr.key())
    }

    // Removes the LSA identified by `key`, returning it.
    pub fn remove(&mut self, key: &LsaKey) -> Option<Lsa> {
        let now = self.now();
        let lse = self.entries.remove(key)?;
        Debug::LsaRemove(key).log();

        if let Some(timer) = lse.expiry_timer {
            self.scheduler.cancel(timer);
        }
        self.rebuild_required = true;

        Some(self.live_lsa(&lse, now))
    }

    pub fn remove_by_hdr(&mut self, hdr: &LsaHdr) -> Option<Lsa> {
        self.remove(&hdr.key())
    }

    // Erases the whole LSDB and rebuilds the routing table from the (now
    // empty) database.
    pub fn clear(&mut self) -> Result<(), Error> {
        Debug::LsdbClear(self.entries.len()).log();

        for lse in std::mem::take(&mut self.entries).into_values() {
            if let Some(timer) = lse.expiry_timer {
                self.scheduler.cancel(timer);
            }
        }
        self.delta.clear();
        self.rebuild_required = true;

        self.update_route()
    }

    // Replaces the address table. The LSDB is cleared since the LSAs learned
    // through the old interfaces can't be trusted anymore.
    pub fn reset_interfaces(
        &mut self,
        addresses: AddressTable,
    ) -> Result<(), Error> {
        self.addresses = addresses;
        self.clear()
    }

    // Hands the current LSDB over to the route rebuild handler and drains the
    // accumulated delta.
    pub fn update_route(&mut self) -> Result<(), Error> {
        let result = self.rebuild.rebuild(
            &self.entries,
            &self.delta,
            self.router_id,
            &self.addresses,
        );
        self.delta.clear();
        self.rebuild_required = false;
        result
    }

    // Processes the expiry of an LSA, reflooding it at MaxAge.
    pub fn process_expiry(&mut self, key: &LsaKey, generated_at: u32) {
        let now = self.now();
        let max_age = self.config.max_age;

        // Ignore timers armed for instances that were replaced since.
        let Some(lse) = self.entries.get_mut(key) else {
            return;
        };
        if lse.generated_at != generated_at {
            return;
        }
        lse.expiry_timer = None;
        if lse.age(now, max_age) < max_age {
            return;
        }

        let lsa = self.live_lsa(&self.entries[key], now);
        Debug::LsaFlush(&lsa.hdr, LsaFlushReason::Expiry).log();
        self.flood
            .flood(&[lsa], Ipv4Addr::UNSPECIFIED, Ipv4Addr::BROADCAST);
    }

    // Allocates the sequence number of the next self-originated LSA.
    pub fn next_seq_no(&mut self) -> Result<u32, Error> {
        if self.seq_no == LSA_MAX_SEQ_NO {
            return Err(Error::SeqNoExhausted(self.router_id));
        }
        self.seq_no += 1;
        Ok(self.seq_no)
    }

    // Originates a new instance of the local router-LSA and adds it to the
    // LSDB. The caller is responsible for flooding it.
    pub fn originate(&mut self, body: LsaBody) -> Result<Lsa, Error> {
        if body.links.len() > LsaBody::MAX_LINKS {
            return Err(Error::LsaTooManyLinks(body.links.len()));
        }
        let seq_no = self.next_seq_no()?;
        let lsa = Lsa::new(
            0,
            Options::E,
            self.router_id,
            self.router_id,
            seq_no,
            self.now(),
            body,
        );
        Debug::LsaOriginate(&lsa.hdr).log();
        self.add(lsa.clone());

        Ok(lsa)
    }

    // Returns whether LSA `a` is more recent than LSA `b`.
    pub fn check_newer(&self, a: &LsaHdr, b: &LsaHdr) -> bool {
        check_newer(a, b, &self.config)
    }

    // Returns an iterator over all LSAs, with their ages refreshed.
    pub fn iter(&self) -> impl Iterator<Item = Lsa> + '_ {
        let now = self.now();
        self.entries.values().map(move |lse| self.live_lsa(lse, now))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rebuild_required(&self) -> bool {
        self.rebuild_required
    }

    pub fn delta(&self) -> &[Arc<Lsa>] {
        &self.delta
    }

    pub fn router_id(&self) -> Ipv4Addr {
        self.router_id
    }

    pub fn config(&self) -> &LsdbCfg {
        &self.config
    }

    pub fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    pub fn rebuild_handler(&self) -> &R {
        &self.rebuild
    }

    pub fn rebuild_handler_mut(&mut self) -> &mut R {
        &mut self.rebuild
    }

    fn now(&self) -> u32 {
        self.scheduler.now().as_secs_u32()
    }

    fn live_lsa(&self, lse: &LsaEntry, now: u32) -> Lsa {
        let mut lsa = (*lse.data).clone();
        lsa.hdr.age = lse.age(now, self.config.max_age);
        lsa.hdr.generated_at = lse.generated_at;
        lsa
    }
}

// ===== impl LsaFlood =====

impl<F> LsaFlood for F
where
    F: FnMut(&[Lsa], Ipv4Addr, Ipv4Addr),
{
    fn flood(&mut self, lsas: &[Lsa], src: Ipv4Addr, dst: Ipv4Addr) {
        self(lsas, src, dst)
    }
}

// ===== global functions =====

// Compares which LSA is more recent according to the rules specified in
// Section 13.1 of RFC 2328.
//
// When the instances can't be told apart, `Ordering::Equal` is returned and
// neither one is considered more recent than the other.
pub fn lsa_compare(a: &LsaHdr, b: &LsaHdr, config: &LsdbCfg) -> Ordering {
    let cmp = a.seq_no.cmp(&b.seq_no);
    if cmp != Ordering::Equal {
        return cmp;
    }

    let cmp = a.cksum.cmp(&b.cksum);
    if cmp != Ordering::Equal {
        return cmp;
    }

    let a_maxage = a.is_maxage(config.max_age);
    let b_maxage = b.is_maxage(config.max_age);
    if a_maxage && !b_maxage {
        return Ordering::Greater;
    } else if !a_maxage && b_maxage {
        return Ordering::Less;
    }

    if a.age.abs_diff(b.age) > config.max_age_diff {
        return b.age.cmp(&a.age);
    }

    Ordering::Equal
}

// Returns whether LSA `a` is more recent than LSA `b`.
pub fn check_newer(a: &LsaHdr, b: &LsaHdr, config: &LsdbCfg) -> bool {
    lsa_compare(a, b, config) == Ordering::Greater
}

// Compares two LSAs according to the rules specified in Section 13.2 of RFC
// 2328. Its purpose is to determine if the contents of the LSAs are identical.
pub fn lsa_same_contents(a: &Lsa, b: &Lsa, max_age: u16) -> bool {
    if a.hdr.options != b.hdr.options {
        return false;
    }

    if a.hdr.is_maxage(max_age) ^ b.hdr.is_maxage(max_age) {
        return false;
    }

    if a.hdr.length != b.hdr.length {
        return false;
    }

    a.body == b.body
}
