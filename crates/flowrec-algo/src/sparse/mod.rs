//! # Sparse Matrix Infrastructure
//!
//! Process networks are sparse: each flow touches at most two nodes, so the
//! incidence matrix has at most two nonzeros per column regardless of size.
//!
//! - [`incidence`]: Signed node-by-flow incidence matrix
//!
//! ## Usage
//!
//! ```ignore
//! use flowrec_algo::sparse::IncidenceMatrix;
//!
//! let inc = IncidenceMatrix::from_flows(&flows)?;
//! println!("{} nodes, {} flows, disbalance {:.4}",
//!          inc.n_nodes(),
//!          inc.n_flows(),
//!          inc.disbalance(&measured));
//! ```

pub mod incidence;

pub use incidence::{IncidenceError, IncidenceMatrix};
