//! node.rs — node definition for the HNSW graph.

pub type NodeId = usize;

/// Inline capacity for one layer's adjacency list; larger `M` spills to heap.
pub(crate) const MAX_LINKS_PER_LVL: usize = 32;

pub struct Node {
    pub(crate) ext_id: u64,
    pub(crate) vec: Vec<f32>,
    pub(crate) links: Vec<Vec<NodeId>>,
}

impl Node {
    pub fn new(ext_id: u64, level: usize, vec: Vec<f32>) -> Self {
        Self {
            ext_id,
            vec,
            links: vec![Vec::new(); level + 1],
        }
    }

    /// Highest layer this node participates in.
    #[inline]
    pub fn level(&self) -> usize {
        self.links.len().saturating_sub(1)
    }
}
