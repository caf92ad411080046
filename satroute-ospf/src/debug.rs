//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::path::Path;
use std::time::Duration;

use satroute_utils::sim::SimTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::packet::lsa::{LsaHdr, LsaKey};

// Routing core debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // LSDB maintenance
    LsaInstall(&'a LsaHdr, bool),
    LsaOriginate(&'a LsaHdr),
    LsaDiscard(&'a LsaHdr),
    LsaRemove(&'a LsaKey),
    LsaFlush(&'a LsaHdr, LsaFlushReason),
    LsdbClear(usize),
    // Route computation
    RouteRebuild(usize, usize),
    SpfSkipped(usize, usize),
    SpfRun(usize, Duration),
    RouteTableApply(SimTime, usize),
    RouteTableDelay(SimTime, Duration),
    RouteTableStale(SimTime, SimTime),
    RouteTableClear,
    // Precomputed routes
    GroundAttachmentChange(u32, Option<u32>, u32),
    PrecomputedLoad(&'a Path, u32, usize),
    PrecomputedIgnore(&'a Path, u32, u32),
    PrecomputedRouteSkip(u32),
}

// Reason why an LSA is being reflooded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsaFlushReason {
    Expiry,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::LsaInstall(lsa_hdr, content_change) => {
                // Parent span(s): node
                debug_span!("lsdb").in_scope(|| {
                    debug!(?lsa_hdr, %content_change, "{}", self);
                })
            }
            Debug::LsaOriginate(lsa_hdr) | Debug::LsaDiscard(lsa_hdr) => {
                // Parent span(s): node
                debug_span!("lsdb").in_scope(|| {
                    debug!(?lsa_hdr, "{}", self);
                })
            }
            Debug::LsaRemove(lsa_key) => {
                // Parent span(s): node
                debug_span!("lsdb").in_scope(|| {
                    debug!(%lsa_key, "{}", self);
                })
            }
            Debug::LsaFlush(lsa_hdr, reason) => {
                // Parent span(s): node
                debug_span!("lsdb").in_scope(|| {
                    debug!(?lsa_hdr, %reason, "{}", self);
                })
            }
            Debug::LsdbClear(count) => {
                // Parent span(s): node
                debug_span!("lsdb").in_scope(|| {
                    debug!(%count, "{}", self);
                })
            }
            Debug::RouteRebuild(lsdb_size, delta_size) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%lsdb_size, %delta_size, "{}", self);
                })
            }
            Debug::SpfSkipped(vertices, required) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%vertices, %required, "{}", self);
                })
            }
            Debug::SpfRun(vertices, duration) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%vertices, ?duration, "{}", self);
                })
            }
            Debug::RouteTableApply(calc_time, routes) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%calc_time, %routes, "{}", self);
                })
            }
            Debug::RouteTableDelay(calc_time, delay) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%calc_time, ?delay, "{}", self);
                })
            }
            Debug::RouteTableStale(calc_time, last_calc_time) => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!(%calc_time, %last_calc_time, "{}", self);
                })
            }
            Debug::RouteTableClear => {
                // Parent span(s): node
                debug_span!("route").in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::GroundAttachmentChange(ground, old, new) => {
                // Parent span(s): node
                debug_span!("precomputed").in_scope(|| {
                    debug!(%ground, ?old, %new, "{}", self);
                })
            }
            Debug::PrecomputedLoad(path, time_step, routes) => {
                // Parent span(s): node
                debug_span!("precomputed").in_scope(|| {
                    let path = path.display();
                    debug!(%path, %time_step, %routes, "{}", self);
                })
            }
            Debug::PrecomputedIgnore(path, time_step, last_time_step) => {
                // Parent span(s): node
                debug_span!("precomputed").in_scope(|| {
                    debug!(
                        path = %path.display(),
                        %time_step,
                        %last_time_step,
                        "{}",
                        self
                    );
                })
            }
            Debug::PrecomputedRouteSkip(destination) => {
                // Parent span(s): node
                debug_span!("precomputed").in_scope(|| {
                    debug!(%destination, "{}", self);
                })
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::LsaInstall(..) => {
                write!(f, "installing LSA")
            }
            Debug::LsaOriginate(..) => {
                write!(f, "originating LSA")
            }
            Debug::LsaDiscard(..) => {
                write!(f, "discarding LSA: not more recent than database copy")
            }
            Debug::LsaRemove(..) => {
                write!(f, "removing LSA")
            }
            Debug::LsaFlush(..) => {
                write!(f, "reflooding LSA")
            }
            Debug::LsdbClear(..) => {
                write!(f, "clearing LSDB")
            }
            Debug::RouteRebuild(..) => {
                write!(f, "rebuilding routing table")
            }
            Debug::SpfSkipped(..) => {
                write!(f, "not enough routers in the LSDB, deferring SPF")
            }
            Debug::SpfRun(..) => {
                write!(f, "SPF run")
            }
            Debug::RouteTableApply(..) => {
                write!(f, "installing routing table")
            }
            Debug::RouteTableDelay(..) => {
                write!(f, "delaying routing table installation")
            }
            Debug::RouteTableStale(..) => {
                write!(f, "discarding stale routing table")
            }
            Debug::RouteTableClear => {
                write!(f, "clearing routing table")
            }
            Debug::GroundAttachmentChange(..) => {
                write!(f, "ground station attachment changed")
            }
            Debug::PrecomputedLoad(..) => {
                write!(f, "loaded precomputed routing table")
            }
            Debug::PrecomputedIgnore(..) => {
                write!(f, "ignoring outdated precomputed routing table")
            }
            Debug::PrecomputedRouteSkip(..) => {
                write!(f, "skipping precomputed route: destination unknown")
            }
        }
    }
}

impl std::fmt::Display for LsaFlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsaFlushReason::Expiry => write!(f, "expiry"),
        }
    }
}
