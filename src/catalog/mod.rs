//! Per-Node Catalog Layer
//!
//! Each partition owns one `CatalogStore` holding the Book, User and Loan
//! records of its id range, and one `ActionExecutor` that applies named
//! actions against that store.
//!
//! ## Core Concepts
//! - **Ownership**: records are mutated exclusively by the node holding the
//!   partition for the relevant id range. No other component touches a store
//!   directly.
//! - **Action contract**: the executor exposes a single dispatch surface
//!   (`execute(action, prior_return) -> ActionResult`) so the dispatcher can
//!   stay agnostic of individual business rules.
//! - **Replica writes**: `add_loan` and `update_loan` are companion actions
//!   that replay another node's primary write using the loan id it returned.

pub mod executor;
pub mod store;
pub mod types;
