//! Arena-backed search tree.
//!
//! ```text
//! index:   0        1     2     3        4     5
//!        [root] → [f3]  [f4]  [f5]  →  [f4]  [f7]   ...
//!                              └── children of node 3
//! ```
//!
//! Nodes live in one `Vec` and refer to each other by index. A node's parent
//! is fixed at creation; nodes are only ever appended, never removed or
//! modified afterwards. All children of one parent are appended under a
//! single write lock, so sibling order equals the order passed in and
//! concurrent expansions of different parents cannot interleave.

use super::candidates::Hypothesis;
use flowrec_core::{FlowrecError, FlowrecResult};
use parking_lot::RwLock;

pub const ROOT: usize = 0;

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub parent: Option<usize>,
    pub height: usize,
    /// Position among the parent's children
    pub rank: usize,
    /// `None` only for the root
    pub data: Option<Hypothesis>,
    pub children: Vec<usize>,
}

#[derive(Debug)]
pub struct SearchTree {
    nodes: RwLock<Vec<TreeNode>>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    /// Tree holding only the data-less root.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(vec![TreeNode {
                parent: None,
                height: 0,
                rank: 0,
                data: None,
                children: Vec::new(),
            }]),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `hypotheses` as children of `parent`, in order.
    pub fn append_children(
        &self,
        parent: usize,
        hypotheses: Vec<Hypothesis>,
    ) -> FlowrecResult<Vec<usize>> {
        let mut nodes = self.nodes.write();
        let (height, first_rank) = match nodes.get(parent) {
            Some(node) => (node.height + 1, node.children.len()),
            None => {
                return Err(FlowrecError::Invariant(format!(
                    "parent node {} does not exist",
                    parent
                )))
            }
        };

        let mut added = Vec::with_capacity(hypotheses.len());
        for (offset, hypothesis) in hypotheses.into_iter().enumerate() {
            let idx = nodes.len();
            nodes.push(TreeNode {
                parent: Some(parent),
                height,
                rank: first_rank + offset,
                data: Some(hypothesis),
                children: Vec::new(),
            });
            added.push(idx);
        }
        nodes[parent].children.extend_from_slice(&added);
        Ok(added)
    }

    /// Hypothesis stored at a non-root node.
    pub fn hypothesis(&self, idx: usize) -> FlowrecResult<Hypothesis> {
        let nodes = self.nodes.read();
        let node = nodes
            .get(idx)
            .ok_or_else(|| FlowrecError::Invariant(format!("node {} does not exist", idx)))?;
        node.data
            .clone()
            .ok_or_else(|| FlowrecError::Invariant(format!("node {} carries no hypothesis", idx)))
    }

    /// Hypotheses from the root down to `idx` (empty for the root).
    pub fn chain(&self, idx: usize) -> FlowrecResult<Vec<Hypothesis>> {
        Ok(self.walk(idx)?.into_iter().map(|(h, _)| h).collect())
    }

    /// Sibling ranks from the root down to `idx`; a deterministic ordering
    /// key independent of arena indices.
    pub fn rank_path(&self, idx: usize) -> FlowrecResult<Vec<usize>> {
        Ok(self.walk(idx)?.into_iter().map(|(_, r)| r).collect())
    }

    fn walk(&self, idx: usize) -> FlowrecResult<Vec<(Hypothesis, usize)>> {
        let nodes = self.nodes.read();
        let mut path = Vec::new();
        let mut current = idx;

        while current != ROOT {
            if path.len() > nodes.len() {
                return Err(FlowrecError::Invariant(format!(
                    "parent chain from node {} does not reach the root",
                    idx
                )));
            }
            let node = nodes.get(current).ok_or_else(|| {
                FlowrecError::Invariant(format!("node {} does not exist", current))
            })?;
            let data = node.data.clone().ok_or_else(|| {
                FlowrecError::Invariant(format!("node {} carries no hypothesis", current))
            })?;
            path.push((data, node.rank));
            current = node.parent.ok_or_else(|| {
                FlowrecError::Invariant(format!("node {} has no parent", current))
            })?;
        }

        path.reverse();
        Ok(path)
    }

    pub fn nodes_at_height(&self, height: usize) -> Vec<usize> {
        self.nodes
            .read()
            .iter()
            .enumerate()
            .filter(|(_, n)| n.height == height)
            .map(|(i, _)| i)
            .collect()
    }

    /// Non-root nodes without children.
    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .read()
            .iter()
            .enumerate()
            .filter(|(i, n)| *i != ROOT && n.children.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn children(&self, idx: usize) -> Vec<usize> {
        self.nodes
            .read()
            .get(idx)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Largest child count of any node.
    pub fn max_children(&self) -> usize {
        self.nodes
            .read()
            .iter()
            .map(|n| n.children.len())
            .max()
            .unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.nodes.read().iter().map(|n| n.height).max().unwrap_or(0)
    }
}
