//! Transaction Model and Coordinator
//!
//! A transaction is an ordered list of node-local hops; the coordinator is
//! the client-side driver that builds one per high-level catalog operation
//! and pushes its hops to their owning nodes.
//!
//! ## Execution contract
//! 1. Hop 1 is sent synchronously; a failure aborts the whole transaction
//!    with no retry ("the transaction never truly began").
//! 2. Each later hop is retried up to a bounded budget with a fixed pause
//!    between attempts, carrying the latest return value forward.
//! 3. Exhausting the budget aborts the remainder. Already-applied hops are
//!    never compensated; callers observe the partial state.
//!
//! The origin-ordered variant additionally obtains a sequence number from the
//! coordinator's home node and tags every hop with it, letting destination
//! nodes admit hops in issue order. The two variants share one coordinator
//! type parameterized by an [`ordering::OrderingPolicy`].

pub mod coordinator;
pub mod ordering;
pub mod types;

#[cfg(test)]
mod tests;
