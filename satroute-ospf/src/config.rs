//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::lsdb::{LSA_MAX_AGE, LSA_MAX_AGE_DIFF};

// LSDB configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LsdbCfg {
    // Age (in seconds) at which an LSA is considered expired.
    pub max_age: u16,
    // Largest age gap (in seconds) tolerated between two instances of the
    // same LSA before the younger one is considered more recent.
    pub max_age_diff: u16,
}

// Route builder configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteCfg {
    pub satellite_count: u32,
    pub ground_station_count: u32,
    // Delay the installation of computed tables by the time the computation
    // took.
    pub simulated_delay: bool,
    // Read forwarding tables from precomputed files instead of running SPF.
    pub precomputed: Option<PrecomputedCfg>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrecomputedCfg {
    pub base_path: PathBuf,
}

// ===== impl LsdbCfg =====

impl Default for LsdbCfg {
    fn default() -> LsdbCfg {
        LsdbCfg {
            max_age: LSA_MAX_AGE,
            max_age_diff: LSA_MAX_AGE_DIFF,
        }
    }
}

// ===== impl RouteCfg =====

impl RouteCfg {
    // Minimum number of routers that must be present in the LSDB before
    // routes are computed.
    pub fn node_count(&self) -> usize {
        self.satellite_count as usize + self.ground_station_count as usize
    }

    pub fn is_ground_station(&self, node_id: u32) -> bool {
        node_id >= self.satellite_count
            && node_id - self.satellite_count < self.ground_station_count
    }
}

impl Default for RouteCfg {
    fn default() -> RouteCfg {
        RouteCfg {
            satellite_count: 0,
            ground_station_count: 0,
            simulated_delay: false,
            precomputed: None,
        }
    }
}
