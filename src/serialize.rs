//! (feature = "serde") snapshot helpers.
//!
//! A node's level is not stored; it is derived as `links.len() - 1`.
//! The metric is recorded by name and checked on restore.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{IngestError, Result},
    graph::Graph,
    math::Metric,
    node::{Node, NodeId},
    Hnsw,
};

#[derive(Serialize, Deserialize)]
struct SerNode {
    ext_id: u64,
    vec: Vec<f32>,
    links: Vec<Vec<NodeId>>,
}

#[derive(Serialize, Deserialize)]
struct SerIndex {
    metric: String,
    dims: usize,
    m: usize,
    ef_construction: usize,
    ef: usize,
    max_elements: usize,
    entry: Option<NodeId>,
    nodes: Vec<SerNode>,
}

/// Serialize the index into JSON bytes.
pub fn to_bytes<M: Metric>(idx: &Hnsw<M>) -> Result<Vec<u8>> {
    let nodes: Vec<SerNode> = idx
        .graph
        .nodes
        .iter()
        .map(|n| SerNode {
            ext_id: n.ext_id,
            vec: n.vec.clone(),
            links: n.links.clone(),
        })
        .collect();

    let ser = SerIndex {
        metric: M::NAME.to_owned(),
        dims: idx.dims,
        m: idx.m,
        ef_construction: idx.ef_construction,
        ef: idx.ef,
        max_elements: idx.max_elements,
        entry: idx.graph.entry,
        nodes,
    };

    serde_json::to_vec(&ser).map_err(|e| IngestError::Serialize(e.to_string()))
}

/// Restore an index from JSON bytes produced by `to_bytes`.
pub fn from_slice<M: Metric + Default>(bytes: &[u8]) -> Result<Hnsw<M>> {
    let snap: SerIndex =
        serde_json::from_slice(bytes).map_err(|e| IngestError::Serialize(e.to_string()))?;

    if snap.metric != M::NAME {
        return Err(IngestError::Serialize(format!(
            "snapshot metric {:?} does not match {:?}",
            snap.metric,
            M::NAME
        )));
    }
    if snap.nodes.len() > snap.max_elements {
        return Err(IngestError::CapacityExceeded {
            capacity: snap.max_elements,
            current: 0,
            requested: snap.nodes.len(),
        });
    }

    let n = snap.nodes.len();
    let mut g = Graph::new(None);
    for sn in snap.nodes {
        if sn.vec.len() != snap.dims {
            return Err(IngestError::DimensionMismatch {
                expected: snap.dims,
                found: sn.vec.len(),
            });
        }
        if sn.links.iter().flatten().any(|&nb| nb >= n) {
            return Err(IngestError::Serialize(format!(
                "node {} links past the end of the graph",
                sn.ext_id
            )));
        }
        let node_id = g.nodes.len();
        let level = sn.links.len().saturating_sub(1);
        let mut node = Node::new(sn.ext_id, level, sn.vec);
        node.links = sn.links;
        if node.links.is_empty() {
            node.links.push(Vec::new());
        }

        while g.levels.len() <= level {
            g.levels.push(Vec::new());
        }
        g.levels[level].push(node_id);
        g.by_ext.insert(node.ext_id, node_id);
        g.nodes.push(node);
    }

    g.max_level = g.levels.len() - 1;
    g.entry = match snap.entry {
        Some(e) if e < n && g.nodes[e].level() == g.max_level => Some(e),
        _ => g.levels[g.max_level].first().copied(),
    };

    Ok(Hnsw {
        dims: snap.dims,
        m: snap.m,
        ef_construction: snap.ef_construction,
        ef: snap.ef,
        max_elements: snap.max_elements,
        metric: M::default(),
        graph: g,
    })
}
