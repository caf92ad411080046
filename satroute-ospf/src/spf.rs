//
// Copyright (c) The Satroute Core Contributors
//
// See LICENSE for license details.
//

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::config::RouteCfg;
use crate::lsdb::LsaEntries;
use crate::packet::lsa::LsaTypeCode;

// Integer router identifier, as derived from the router ID.
pub type VertexId = u32;

// Shortest-path tree, keyed by vertex ID.
pub type Spt = BTreeMap<VertexId, Vertex>;

// Adjacency graph built from the router-LSAs of the LSDB.
//
// Only routers that originated a router-LSA are vertices. Links towards
// routers whose LSA wasn't received yet are kept in the adjacency lists but
// never followed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Graph {
    pub adjacency: BTreeMap<VertexId, Vec<VertexId>>,
    pub costs: BTreeMap<VertexId, BTreeMap<VertexId, u32>>,
    // Interface addresses of each router, as described by its own links.
    pub addresses: BTreeMap<VertexId, BTreeSet<Ipv4Addr>>,
}

// SPT vertex.
#[derive(Clone, Copy, Debug, Eq, PartialEq, new)]
#[derive(Deserialize, Serialize)]
pub struct Vertex {
    pub id: VertexId,
    pub distance: u32,
    // Predecessor on the shortest path from the root.
    pub parent: Option<VertexId>,
}

// ===== impl Graph =====

impl Graph {
    // Builds the graph from scratch using every router-LSA of the LSDB.
    pub fn build(lsdb: &LsaEntries) -> Graph {
        let mut graph = Graph::default();

        for lse in lsdb.values() {
            let lsa = &lse.data;
            if lsa.hdr.lsa_type.type_code() != Some(LsaTypeCode::Router) {
                continue;
            }

            let vertex_id = u32::from(lsa.hdr.adv_rtr);
            graph.adjacency.entry(vertex_id).or_default();
            for link in &lsa.body.links {
                graph.add_link(
                    vertex_id,
                    u32::from(link.nbr_id),
                    link.metric.into(),
                    link.local_addr,
                );
            }
        }

        graph
    }

    // Adds a directed link. When the same pair of routers is connected more
    // than once, the lowest cost is kept.
    pub fn add_link(
        &mut self,
        from: VertexId,
        to: VertexId,
        cost: u32,
        local_addr: Ipv4Addr,
    ) {
        let nbrs = self.adjacency.entry(from).or_default();
        if !nbrs.contains(&to) {
            nbrs.push(to);
        }
        self.costs
            .entry(from)
            .or_default()
            .entry(to)
            .and_modify(|old| *old = std::cmp::min(*old, cost))
            .or_insert(cost);
        self.addresses.entry(from).or_default().insert(local_addr);
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn contains(&self, vertex_id: VertexId) -> bool {
        self.adjacency.contains_key(&vertex_id)
    }

    pub fn cost(&self, from: VertexId, to: VertexId) -> Option<u32> {
        self.costs.get(&from)?.get(&to).copied()
    }

    // Returns the satellite each ground station is attached to, as described
    // by the first link of the ground station's router-LSA.
    pub fn ground_attachments(
        &self,
        config: &RouteCfg,
    ) -> BTreeMap<VertexId, VertexId> {
        self.adjacency
            .iter()
            .filter(|(vertex_id, _)| config.is_ground_station(**vertex_id))
            .filter_map(|(vertex_id, nbrs)| {
                nbrs.first().map(|satellite| (*vertex_id, *satellite))
            })
            .collect()
    }
}

// ===== global functions =====

// Computes the shortest-path tree rooted at `root` using Dijkstra's
// algorithm.
//
// Candidates are kept ordered by (distance, vertex ID), so ties are broken by
// the lowest vertex ID. A path only replaces another when strictly shorter.
pub fn run(graph: &Graph, root: VertexId) -> Spt {
    // Initialize SPT and candidate list.
    let mut spt = Spt::new();
    let mut cand_list: BTreeMap<(u32, VertexId), Vertex> = BTreeMap::new();
    let mut cand_dist: BTreeMap<VertexId, u32> = BTreeMap::new();
    cand_list.insert((0, root), Vertex::new(root, 0, None));
    cand_dist.insert(root, 0);

    // Main SPF loop.
    while let Some(((distance, vertex_id), vertex)) = cand_list.pop_first() {
        // Add vertex to SPT.
        cand_dist.remove(&vertex_id);
        spt.insert(vertex_id, vertex);

        let Some(nbrs) = graph.adjacency.get(&vertex_id) else {
            continue;
        };
        for nbr_id in nbrs {
            let nbr_id = *nbr_id;

            // Skip routers that didn't originate an LSA yet.
            if !graph.contains(nbr_id) {
                continue;
            }

            // Check if the neighbor is already on the shortest-path tree.
            if spt.contains_key(&nbr_id) {
                continue;
            }

            let Some(cost) = graph.cost(vertex_id, nbr_id) else {
                continue;
            };
            let nbr_distance = distance.saturating_add(cost);

            // Check if this vertex is already present on the candidate list.
            if let Some(cand_distance) = cand_dist.get(&nbr_id).copied() {
                match nbr_distance.cmp(&cand_distance) {
                    Ordering::Less => {
                        cand_list.remove(&(cand_distance, nbr_id));
                    }
                    Ordering::Equal | Ordering::Greater => {
                        continue;
                    }
                }
            }
            cand_list.insert(
                (nbr_distance, nbr_id),
                Vertex::new(nbr_id, nbr_distance, Some(vertex_id)),
            );
            cand_dist.insert(nbr_id, nbr_distance);
        }
    }

    spt
}

// Walks the predecessor chain from `dest` back to `root`, returning the first
// hop of the path.
pub fn first_hop(
    spt: &Spt,
    root: VertexId,
    dest: VertexId,
) -> Option<VertexId> {
    let mut vertex = spt.get(&dest)?;
    loop {
        let parent = vertex.parent?;
        if parent == root {
            return Some(vertex.id);
        }
        vertex = spt.get(&parent)?;
    }
}
