//! graph.rs — core HNSW graph implementation.

use crate::{
    math::Metric,
    node::{Node, NodeId, MAX_LINKS_PER_LVL},
    rand_level::draw_level,
};

use ordered_float::OrderedFloat;
use rand::{rngs::StdRng, SeedableRng};
use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// In-memory HNSW graph.
pub struct Graph {
    pub nodes: Vec<Node>,
    pub(crate) levels: Vec<Vec<NodeId>>,
    pub(crate) max_level: usize,
    pub(crate) entry: Option<NodeId>,
    /// Mapping from external ids to internal NodeId.
    pub(crate) by_ext: HashMap<u64, NodeId>,
    rng: StdRng,
}

/// Outcome of [`Graph::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Updated,
}

impl Graph {
    /// Empty graph; `seed = None` draws levels from fresh entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: Vec::new(),
            levels: vec![Vec::new()], // ensure level-0 exists
            max_level: 0,
            entry: None,
            by_ext: HashMap::new(),
            rng,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes whose top layer is each level, ground layer first.
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels.iter().map(Vec::len).collect()
    }

    /// Check whether an ext_id exists.
    #[inline]
    pub fn contains_ext(&self, ext_id: u64) -> bool {
        self.by_ext.contains_key(&ext_id)
    }

    /// Safe accessor: neighbors of `nid` on `layer` (empty slice if absent).
    #[inline]
    fn neighbors(&self, nid: NodeId, layer: usize) -> &[NodeId] {
        match self.nodes.get(nid).and_then(|n| n.links.get(layer)) {
            Some(adj) => adj,
            None => &[],
        }
    }

    /// Insert a vector + external id. An existing id is updated in place.
    pub fn add<M: Metric>(
        &mut self,
        vec: Vec<f32>,
        ext_id: u64,
        metric: &M,
        m: usize,
        ef_construction: usize,
    ) -> AddOutcome {
        if let Some(nid) = self.by_ext.get(&ext_id).copied() {
            self.update(nid, vec, metric, m, ef_construction);
            return AddOutcome::Updated;
        }

        let lvl = draw_level(m.max(2) as f64, &mut self.rng);
        let node_id = self.nodes.len();

        self.nodes.push(Node::new(ext_id, lvl, vec));
        self.by_ext.insert(ext_id, node_id);
        while self.levels.len() <= lvl {
            self.levels.push(Vec::new());
        }
        self.levels[lvl].push(node_id);

        let Some(old_entry) = self.entry else {
            self.entry = Some(node_id);
            self.max_level = lvl;
            return AddOutcome::Inserted;
        };

        let old_max = self.max_level;
        let top = lvl.min(old_max);
        let ep = self.descend(old_entry, node_id, old_max, top, metric);
        self.link(node_id, ep, top, metric, m, ef_construction);

        // Raise the tower only after linking so searches above never see a
        // half-wired entry point.
        if lvl > old_max {
            self.max_level = lvl;
            self.entry = Some(node_id);
        }
        AddOutcome::Inserted
    }

    /// Replace the stored vector of `nid` and rebuild its outgoing links.
    fn update<M: Metric>(
        &mut self,
        nid: NodeId,
        vec: Vec<f32>,
        metric: &M,
        m: usize,
        ef_construction: usize,
    ) {
        self.nodes[nid].vec = vec;
        if self.nodes.len() == 1 {
            return;
        }
        let Some(entry) = self.entry else { return };
        let top = self.nodes[nid].level().min(self.max_level);
        let ep = self.descend(entry, nid, self.max_level, top, metric);
        self.link(nid, ep, top, metric, m, ef_construction);
    }

    /// Greedy walk from `ep` on layers `from..to` (exclusive) towards node `target`.
    fn descend<M: Metric>(
        &self,
        mut ep: NodeId,
        target: NodeId,
        from: usize,
        to: usize,
        metric: &M,
    ) -> NodeId {
        let q = &self.nodes[target].vec;
        for l in (to + 1..=from).rev() {
            ep = self.greedy_idx(ep, q, l, metric);
        }
        ep
    }

    /// Wire `nid` into layers `top..=0`, starting the beam at `ep`.
    /// Existing outgoing links on those layers are replaced.
    fn link<M: Metric>(
        &mut self,
        nid: NodeId,
        mut ep: NodeId,
        top: usize,
        metric: &M,
        m: usize,
        ef_construction: usize,
    ) {
        let ef = ef_construction.max(m.max(1));
        for l in (0..=top).rev() {
            let mut cand = {
                let q = &self.nodes[nid].vec;
                self.ef_search_idx(ep, q, ef, l, metric)
            };
            cand.retain(|&(c, _)| c != nid);
            self.nodes[nid].links[l].clear();
            if cand.is_empty() {
                continue;
            }
            cand.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
            ep = cand[0].0;

            let cap = max_links(m, l);
            let selected = self.select_neighbors(&cand, cap, metric);
            self.connect(nid, &selected, cap, l, metric);
        }
    }

    /// Public k-NN search (returns `(ext_id, dist)`).
    pub fn knn<M: Metric>(&self, query: &[f32], k: usize, metric: &M, ef: usize) -> Vec<(u64, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let Some(mut ep) = self.entry else {
            return Vec::new();
        };

        for l in (1..=self.max_level).rev() {
            ep = self.greedy_idx(ep, query, l, metric);
        }

        let mut cand = self.ef_search_idx(ep, query, ef.max(k), 0, metric);
        cand.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        cand.truncate(k);
        cand.into_iter().map(|(nid, dist)| (self.nodes[nid].ext_id, dist)).collect()
    }

    /* ---------------- internal helpers ----------------------------------- */

    fn greedy_idx<M: Metric>(&self, mut curr: NodeId, q: &[f32], layer: usize, metric: &M) -> NodeId {
        let mut best = metric.distance(&self.nodes[curr].vec, q);
        loop {
            let mut improved = false;
            for &nb in self.neighbors(curr, layer) {
                let d = metric.distance(&self.nodes[nb].vec, q);
                if d < best {
                    best = d;
                    curr = nb;
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        curr
    }

    /// ef-search core — returns Vec of (NodeId, distance), unordered.
    fn ef_search_idx<M: Metric>(
        &self,
        entry: NodeId,
        query: &[f32],
        ef: usize,
        layer: usize,
        metric: &M,
    ) -> Vec<(NodeId, f32)> {
        let mut visited = HashSet::with_capacity(ef * 2);
        let mut top: BinaryHeap<(OrderedFloat<f32>, NodeId)> = BinaryHeap::new();
        let mut to_visit: BinaryHeap<(Reverse<OrderedFloat<f32>>, NodeId)> = BinaryHeap::new();

        let d0 = metric.distance(&self.nodes[entry].vec, query);
        visited.insert(entry);
        top.push((OrderedFloat(d0), entry));
        to_visit.push((Reverse(OrderedFloat(d0)), entry));

        while let Some((Reverse(OrderedFloat(dc)), curr)) = to_visit.pop() {
            let worst = top.peek().map(|x| x.0.into_inner()).unwrap_or(f32::INFINITY);
            if dc > worst && top.len() >= ef {
                break;
            }
            for &nb in self.neighbors(curr, layer) {
                if !visited.insert(nb) {
                    continue;
                }
                let d = metric.distance(&self.nodes[nb].vec, query);
                let worst = top.peek().map(|x| x.0.into_inner()).unwrap_or(f32::INFINITY);
                if top.len() < ef || d < worst {
                    to_visit.push((Reverse(OrderedFloat(d)), nb));
                    top.push((OrderedFloat(d), nb));
                    if top.len() > ef {
                        top.pop();
                    }
                }
            }
        }
        top.into_iter().map(|(od, nid)| (nid, od.into_inner())).collect()
    }

    /// HNSW neighbour heuristic over `cand` (sorted ascending by distance
    /// to the base vector): keep `c` only if it is closer to the base than
    /// to every neighbour already kept.
    fn select_neighbors<M: Metric>(
        &self,
        cand: &[(NodeId, f32)],
        max: usize,
        metric: &M,
    ) -> SmallVec<[NodeId; MAX_LINKS_PER_LVL]> {
        let mut selected = SmallVec::<[NodeId; MAX_LINKS_PER_LVL]>::new();
        for &(c, d) in cand {
            if selected.len() >= max {
                break;
            }
            let cv = &self.nodes[c].vec;
            let ok = selected
                .iter()
                .all(|&s| d < metric.distance(cv, &self.nodes[s].vec));
            if ok {
                selected.push(c);
            }
        }
        selected
    }

    fn connect<M: Metric>(
        &mut self,
        nid: NodeId,
        selected: &[NodeId],
        max_links: usize,
        layer: usize,
        metric: &M,
    ) {
        // Forward (nid -> selected)
        {
            let adj = &mut self.nodes[nid].links[layer];
            for &s in selected {
                if s != nid && !adj.contains(&s) {
                    adj.push(s);
                }
            }
        }

        // Back-edges (selected -> nid)
        for &s in selected {
            if layer >= self.nodes[s].links.len() {
                continue;
            }
            let adj = &mut self.nodes[s].links[layer];
            if adj.contains(&nid) {
                continue;
            }
            adj.push(nid);
            if adj.len() > max_links {
                self.prune(s, layer, max_links, metric);
            }
        }
    }

    /// Shrink the adjacency of `nid` on `layer` back to `max` links.
    fn prune<M: Metric>(&mut self, nid: NodeId, layer: usize, max: usize, metric: &M) {
        let adj = std::mem::take(&mut self.nodes[nid].links[layer]);
        let base = &self.nodes[nid].vec;
        let mut cand: Vec<(NodeId, f32)> = adj
            .iter()
            .map(|&c| (c, metric.distance(&self.nodes[c].vec, base)))
            .collect();
        cand.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        let keep = self.select_neighbors(&cand, max, metric);
        self.nodes[nid].links[layer] = keep.into_vec();
    }
}

/// Layer 0 is twice as dense as the upper layers.
#[inline]
pub(crate) fn max_links(m: usize, layer: usize) -> usize {
    if layer == 0 {
        m * 2
    } else {
        m
    }
}
