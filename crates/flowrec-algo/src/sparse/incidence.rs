//! Signed node-by-flow incidence matrix.
//!
//! ```text
//! A[i,j] = +1    if flow j enters node i   (node i is its destination)
//! A[i,j] = -1    if flow j leaves node i   (node i is its source)
//! A[i,j] =  0    otherwise
//! ```
//!
//! Conservation at every node is then simply `A · x = 0`. Columns of boundary
//! flows (only a source or only a destination) carry a single nonzero.

use flowrec_core::{node_order, Flow, FlowrecError, NodeId};
use nalgebra::DMatrix;
use sprs::{CsMat, CsMatView, TriMat};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from incidence matrix construction
#[derive(Debug, Error)]
pub enum IncidenceError {
    #[error("No flows supplied")]
    NoFlows,

    #[error("{0} has neither a source nor a destination")]
    NoEndpoints(String),

    #[error("Unknown node id: {0}")]
    UnknownNode(String),
}

impl From<IncidenceError> for FlowrecError {
    fn from(err: IncidenceError) -> Self {
        FlowrecError::Input(err.to_string())
    }
}

/// Sparse incidence matrix in CSR format (rows = nodes, columns = flows).
#[derive(Debug, Clone)]
pub struct IncidenceMatrix {
    matrix: CsMat<f64>,
    /// Node ids in row order
    node_order: Vec<NodeId>,
    node_to_idx: HashMap<NodeId, usize>,
}

impl IncidenceMatrix {
    /// Infer nodes from the flow list and build the matrix.
    ///
    /// Rows follow the first-seen order of node ids; columns follow the flow
    /// order.
    pub fn from_flows(flows: &[Flow]) -> Result<Self, IncidenceError> {
        if flows.is_empty() {
            return Err(IncidenceError::NoFlows);
        }

        let node_order = node_order(flows);
        let node_to_idx: HashMap<NodeId, usize> = node_order
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.clone(), idx))
            .collect();

        let mut triplets = TriMat::new((node_order.len(), flows.len()));

        for (col, flow) in flows.iter().enumerate() {
            if flow.source.is_none() && flow.destination.is_none() {
                return Err(IncidenceError::NoEndpoints(flow.label()));
            }
            if let Some(source) = &flow.source {
                let row = *node_to_idx
                    .get(source)
                    .ok_or_else(|| IncidenceError::UnknownNode(source.to_string()))?;
                triplets.add_triplet(row, col, -1.0);
            }
            if let Some(destination) = &flow.destination {
                let row = *node_to_idx
                    .get(destination)
                    .ok_or_else(|| IncidenceError::UnknownNode(destination.to_string()))?;
                triplets.add_triplet(row, col, 1.0);
            }
        }

        Ok(Self {
            matrix: triplets.to_csr(),
            node_order,
            node_to_idx,
        })
    }

    /// Get matrix view for linear algebra operations.
    pub fn view(&self) -> CsMatView<'_, f64> {
        self.matrix.view()
    }

    /// Get element A[i,j] by matrix indices.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix.get(i, j).copied().unwrap_or(0.0)
    }

    pub fn n_nodes(&self) -> usize {
        self.node_order.len()
    }

    pub fn n_flows(&self) -> usize {
        self.matrix.cols()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn node_id(&self, idx: usize) -> Option<&NodeId> {
        self.node_order.get(idx)
    }

    pub fn node_index(&self, node: &NodeId) -> Option<usize> {
        self.node_to_idx.get(node).copied()
    }

    pub fn node_order(&self) -> &[NodeId] {
        &self.node_order
    }

    /// Node residuals `A · x` (the disbalance vector).
    pub fn residuals(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n_nodes()];
        for (row, vec) in self.matrix.outer_iterator().enumerate() {
            out[row] = vec.iter().map(|(col, &v)| v * x[col]).sum();
        }
        out
    }

    /// Euclidean norm of `A · x`.
    pub fn disbalance(&self, x: &[f64]) -> f64 {
        self.residuals(x).iter().map(|r| r * r).sum::<f64>().sqrt()
    }

    /// Dense copy for the small dense algebra of the global test.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n_nodes(), self.n_flows());
        for (row, vec) in self.matrix.outer_iterator().enumerate() {
            for (col, &v) in vec.iter() {
                dense[(row, col)] = v;
            }
        }
        dense
    }
}
