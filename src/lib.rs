//! Partitioned Library Catalog Library
//!
//! This library crate defines the core modules of a catalog split across
//! three autonomous nodes, together with the protocol by which one logical
//! transaction spans node boundaries. It is the foundation for the node
//! binary (`main.rs`) and the scenario driver (`bin/workload.rs`).
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`partition`**: The placement layer. Pure functions mapping entity ids
//!   to their owning node and enumerating fan-out peers in a fixed order.
//! - **`catalog`**: The per-node state layer. Holds the Book/User/Loan
//!   records of one partition and applies named actions to them under the
//!   executor's business rules.
//! - **`transaction`**: The client side of the protocol. Builds hop lists
//!   for high-level operations and drives them with first-hop-abort, bounded
//!   retry and a pluggable delivery-ordering policy.
//! - **`node`**: The server side. Accepts hops, sequence-number requests and
//!   whole transactions over HTTP, forwards foreign hops to their owning
//!   peer, and gates commit on the dependency tracker's cycle check.

pub mod catalog;
pub mod node;
pub mod partition;
pub mod transaction;
