//! Node Dispatcher Module
//!
//! The server side of the hop protocol. Each node runs one long-lived
//! dispatcher that accepts hops, transactions and sequence-number requests
//! over HTTP, executes locally-owned steps through the catalog executor, and
//! transparently forwards everything else to the owning peer.
//!
//! ## Submodules
//! - **`protocol`**: wire DTOs and endpoint constants for inter-node traffic.
//! - **`transport`**: the outbound RPC seam (`HopTransport`) and its HTTP
//!   implementation.
//! - **`dispatcher`**: per-node service state and the hop/transaction paths.
//! - **`gate`**: origin-ordered admission of sequence-numbered hops.
//! - **`dependency`**: the per-node dependency graph and its cycle check.
//! - **`handlers`**: axum request handlers wired up by the node binary.

pub mod dependency;
pub mod dispatcher;
pub mod gate;
pub mod handlers;
pub mod protocol;
pub mod transport;
