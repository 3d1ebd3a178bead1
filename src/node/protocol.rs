//! Node Wire Protocol
//!
//! Defines the Data Transfer Objects and endpoints used for client-to-node
//! and node-to-node communication. Messages are serialized as JSON and sent
//! over HTTP; each logical exchange is one POST round trip.

use crate::catalog::types::ReturnValue;
use crate::transaction::types::Hop;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Hop-at-a-time submission; also the path peers forward hops on.
pub const ENDPOINT_HOP: &str = "/hop";
/// Dedicated exchange for obtaining an origin-ordering token.
pub const ENDPOINT_SEQUENCE: &str = "/sequence";
/// Legacy whole-transaction submission.
pub const ENDPOINT_TRANSACTION: &str = "/transaction";

// --- Data Transfer Objects ---

/// One hop in flight, together with everything the executing node needs:
/// the transaction it belongs to (for dependency tracking), the return value
/// of an earlier hop (for data-dependent replica actions) and the ordering
/// token under the origin-ordered policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopEnvelope {
    pub transaction_id: u64,
    pub hop: Hop,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<ReturnValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
}

/// Reply to a sequence-number request. The counter is node-local and
/// monotonic; it is not coordinated across nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SequenceResponse {
    pub sequence_number: u64,
}

/// Commit/abort decision sent back immediately after the first hop of a
/// legacy whole-transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Commit,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReply {
    pub transaction_id: u64,
    pub decision: Decision,
    pub message: String,
}
