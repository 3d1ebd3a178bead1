use crate::catalog::types::{Action, ReturnValue};
use crate::partition::NodeName;
use serde::{Deserialize, Serialize};

/// One node-local step of a transaction.
///
/// Hops within a transaction are totally ordered by `hop_id`; the hop with
/// the lowest id is the no-retry first hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub hop_id: u32,
    pub node: NodeName,
    pub action: Action,
}

/// Immutable description of one logical client operation.
///
/// Created per invocation, never persisted, never deduplicated across
/// clients. `sequence_number` is set once by the origin-ordered coordinator
/// before the first hop is dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: u64,
    pub kind: String,
    pub hops: Vec<Hop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

impl Transaction {
    pub fn new(transaction_id: u64, kind: impl Into<String>, hops: Vec<Hop>) -> Self {
        Self {
            transaction_id,
            kind: kind.into(),
            hops,
            sequence_number: None,
        }
    }
}

/// Aggregate result of driving a transaction to its end.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Completed {
        transaction_id: u64,
        return_value: Option<ReturnValue>,
    },
    Aborted {
        transaction_id: u64,
        failed_hop: u32,
        message: String,
    },
}

impl TransactionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TransactionOutcome::Completed { .. })
    }
}
