//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::time::Duration;

use satroute_utils::sim::{Scheduler, TimerId};
use serde::{Deserialize, Serialize};

use crate::packet::lsa::LsaKey;

//
// Node timers diagram:
//
//                              +--------------+
//   lsa_expiry_timer (Nx) ->   |              |
//                              |     lsdb     | -> flood (1x)
//                              |              |
//                              +--------------+
//                                    |
//                            rebuild | (1x)
//                                    V
//                              +--------------+
//   route_apply_timer (Nx) ->  |    route     | -> routing table (1x)
//                              |   builder    | -> calc time (1x)
//                              +--------------+
//
// All timers are events of the external scheduler. Once fired, they're fed
// back to the node through `Router::process_timer`.
//

// Timer events of a single node.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum TimerEvent {
    // The LSA identified by `key` reached MaxAge. `generated_at` identifies
    // the instance the timer was armed for.
    LsaExpiry { key: LsaKey, generated_at: u32 },
    // The routing table parked under `table_id` is ready to be installed.
    RouteApply { table_id: u64 },
}

// ===== global functions =====

// LSA expiry timer.
//
// Returns `None` when the LSA is already at MaxAge.
pub(crate) fn lsa_expiry_timer(
    scheduler: &dyn Scheduler<TimerEvent>,
    key: LsaKey,
    generated_at: u32,
    max_age: u16,
) -> Option<TimerId> {
    let now = scheduler.now().as_secs_u32();
    let expires_at = generated_at.saturating_add(max_age.into());
    if expires_at <= now {
        return None;
    }

    let timeout = Duration::from_secs((expires_at - now).into());
    let event = TimerEvent::LsaExpiry { key, generated_at };
    Some(scheduler.schedule(timeout, event))
}

// Delayed routing table installation timer.
pub(crate) fn route_apply_timer(
    scheduler: &dyn Scheduler<TimerEvent>,
    table_id: u64,
    delay: Duration,
) -> TimerId {
    scheduler.schedule(delay, TimerEvent::RouteApply { table_id })
}
