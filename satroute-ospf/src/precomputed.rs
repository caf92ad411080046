//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::path::{Path, PathBuf};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::spf::VertexId;

// Event that selects which set of precomputed tables applies.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum ChangeKey {
    // Initial topology.
    Initial,
    // A ground station got attached to a different satellite.
    Attachment {
        ground: VertexId,
        satellite: VertexId,
    },
}

// Precomputed forwarding entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct PrecomputedRoute {
    pub src: VertexId,
    pub dst: VertexId,
    pub next_hop: VertexId,
    pub out_iface: u32,
    pub in_iface: u32,
}

// Precomputed forwarding table of a single node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PrecomputedTable {
    // Time step (in seconds) the table was computed for.
    pub time_step: u32,
    pub routes: Vec<PrecomputedRoute>,
}

// ===== impl ChangeKey =====

impl ChangeKey {
    // Returns the path of the file holding the table of `node_id` for this
    // change.
    pub fn file_path(&self, base_path: &Path, node_id: VertexId) -> PathBuf {
        base_path
            .join("config_topology")
            .join("network_state")
            .join(self.to_string())
            .join(format!("node_{}.txt", node_id))
    }
}

impl std::fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKey::Initial => write!(f, "time_0"),
            ChangeKey::Attachment { ground, satellite } => {
                write!(f, "{},{}", ground, satellite)
            }
        }
    }
}

// ===== impl PrecomputedTable =====

impl PrecomputedTable {
    // Reads and parses a precomputed table file, keeping only the routes
    // originating at `node_id`.
    pub fn load(path: &Path, node_id: VertexId) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|error| {
            Error::PrecomputedRouteIo(path.to_owned(), error)
        })?;
        Self::parse(path, &content, node_id)
    }

    // Parses the contents of a precomputed table file.
    //
    // Lines starting with `#` are comments. The first data line holds the
    // time step, and every following line a `src,dst,nextHop,outInterface,
    // inInterface` row.
    pub fn parse(
        path: &Path,
        content: &str,
        node_id: VertexId,
    ) -> Result<Self, Error> {
        let parse_error = |line: usize, reason: String| {
            Error::PrecomputedRouteParse(path.to_owned(), line, reason)
        };

        let mut time_step = None;
        let mut routes = vec![];
        for (idx, line) in content.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // The first data line is the time step marker.
            if time_step.is_none() {
                let value = line.parse::<u32>().map_err(|error| {
                    parse_error(lineno, format!("invalid time step: {error}"))
                })?;
                time_step = Some(value);
                continue;
            }

            let fields = line
                .split(',')
                .map(|field| field.trim().parse::<u32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| {
                    parse_error(lineno, format!("invalid field: {error}"))
                })?;
            let [src, dst, next_hop, out_iface, in_iface] = fields[..] else {
                return Err(parse_error(
                    lineno,
                    format!("expected 5 fields, found {}", fields.len()),
                ));
            };
            if src != node_id {
                continue;
            }
            routes.push(PrecomputedRoute::new(
                src, dst, next_hop, out_iface, in_iface,
            ));
        }

        let Some(time_step) = time_step else {
            return Err(parse_error(0, "missing time step".to_owned()));
        };

        Ok(PrecomputedTable { time_step, routes })
    }
}
