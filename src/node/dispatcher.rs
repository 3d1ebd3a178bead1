use super::dependency::DependencyTracker;
use super::gate::SequenceGate;
use super::protocol::{Decision, HopEnvelope, TransactionReply};
use super::transport::HopTransport;
use crate::catalog::executor::ActionExecutor;
use crate::catalog::store::CatalogStore;
use crate::catalog::types::{ActionResult, ReturnValue};
use crate::partition::NodeName;
use crate::transaction::types::Transaction;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Long-lived per-node service behind the wire endpoints.
///
/// Owns everything that used to be ambient node state: the sequence counter,
/// the dependency tracker and the ordered-admission gate are initialized at
/// startup and reached only through this type.
pub struct NodeDispatcher<T> {
    name: NodeName,
    executor: ActionExecutor,
    tracker: DependencyTracker,
    sequence: AtomicU64,
    gate: Option<SequenceGate>,
    transport: T,
}

impl<T: HopTransport + 'static> NodeDispatcher<T> {
    /// `ordered` enables the sequence gate, i.e. origin-ordered delivery of
    /// sequence-numbered hops.
    pub fn new(
        name: NodeName,
        store: Arc<CatalogStore>,
        transport: T,
        ordered: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            executor: ActionExecutor::new(name, store),
            tracker: DependencyTracker::new(),
            sequence: AtomicU64::new(0),
            gate: ordered.then(SequenceGate::new),
            transport,
        })
    }

    pub fn name(&self) -> NodeName {
        self.name
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        self.executor.store()
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    /// Atomically issues the next node-local ordering token.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Processes one hop envelope: executes it locally if this node owns the
    /// hop's target, otherwise forwards it verbatim to the owning peer and
    /// relays the peer's result. Forwarding recurses through dispatchers, so
    /// a hop reaches its owner regardless of which node was contacted first.
    pub async fn handle_hop(&self, envelope: HopEnvelope) -> Result<ActionResult> {
        if envelope.hop.node != self.name {
            tracing::info!(
                "{}: forwarding hop {} of transaction {} to {}",
                self.name,
                envelope.hop.hop_id,
                envelope.transaction_id,
                envelope.hop.node
            );
            return self.transport.send_hop(envelope.hop.node, &envelope).await;
        }

        match (&self.gate, envelope.sequence_number) {
            (Some(gate), Some(sequence_number)) => {
                gate.register(sequence_number);
                gate.wait_turn(sequence_number).await;
                let result = self.execute_local(&envelope);
                gate.release(sequence_number);
                Ok(result)
            }
            _ => Ok(self.execute_local(&envelope)),
        }
    }

    /// Runs the action and registers the step with the dependency tracker.
    /// A cycle in the accumulated history overrides the action's own result.
    fn execute_local(&self, envelope: &HopEnvelope) -> ActionResult {
        let result = self
            .executor
            .execute(&envelope.hop.action, envelope.return_value.as_ref());
        self.tracker
            .record(envelope.transaction_id, envelope.hop.hop_id);
        if self.tracker.has_cycle() {
            tracing::warn!(
                "{}: cycle detected after hop {} of transaction {}",
                self.name,
                envelope.hop.hop_id,
                envelope.transaction_id
            );
            return ActionResult::failed("SC cycle detected");
        }
        result
    }

    /// Legacy whole-transaction path: runs or forwards hop 1, answers the
    /// client with a commit/abort decision right away, then drives the
    /// remaining hops in a background task without further client
    /// interaction, threading each return value into the next hop.
    pub async fn handle_transaction(self: Arc<Self>, transaction: Transaction) -> TransactionReply {
        let transaction_id = transaction.transaction_id;
        let Some(first) = transaction.hops.first().cloned() else {
            return TransactionReply {
                transaction_id,
                decision: Decision::Abort,
                message: "Transaction has no hops".to_string(),
            };
        };
        let first_forwarded = first.node != self.name;
        let first_hop_id = first.hop_id;

        let envelope = HopEnvelope {
            transaction_id,
            hop: first,
            return_value: None,
            sequence_number: transaction.sequence_number,
        };
        let first_result = match self.handle_hop(envelope).await {
            Ok(result) => result,
            Err(e) => {
                return TransactionReply {
                    transaction_id,
                    decision: Decision::Abort,
                    message: e.to_string(),
                };
            }
        };
        if !first_result.is_success() {
            return TransactionReply {
                transaction_id,
                decision: Decision::Abort,
                message: first_result.message,
            };
        }

        if first_forwarded {
            // The driving node keeps every hop of a transaction it drives in
            // its own history; local executions record themselves.
            self.tracker.record(transaction_id, first_hop_id);
        }

        let dispatcher = self.clone();
        let return_value = first_result.return_value;
        tokio::spawn(async move {
            dispatcher.run_remaining_hops(transaction, return_value).await;
        });

        TransactionReply {
            transaction_id,
            decision: Decision::Commit,
            message: first_result.message,
        }
    }

    async fn run_remaining_hops(
        &self,
        transaction: Transaction,
        mut return_value: Option<ReturnValue>,
    ) {
        for hop in transaction.hops.iter().skip(1) {
            let forwarded = hop.node != self.name;
            let envelope = HopEnvelope {
                transaction_id: transaction.transaction_id,
                hop: hop.clone(),
                return_value,
                sequence_number: transaction.sequence_number,
            };
            match self.handle_hop(envelope).await {
                Ok(result) if result.is_success() => {
                    if forwarded {
                        // Local executions record their own edge; forwarded
                        // hops are still part of this node's history.
                        self.tracker.record(transaction.transaction_id, hop.hop_id);
                    }
                    if result.return_value.is_some() {
                        return_value = result.return_value;
                    }
                }
                Ok(result) => {
                    tracing::warn!(
                        "{}: transaction {} stopped at hop {}: {}",
                        self.name,
                        transaction.transaction_id,
                        hop.hop_id,
                        result.message
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        "{}: transaction {} stopped at hop {}: {}",
                        self.name,
                        transaction.transaction_id,
                        hop.hop_id,
                        e
                    );
                    return;
                }
            }
        }

        if self.tracker.has_cycle() {
            tracing::warn!(
                "{}: cycle detected after transaction {}",
                self.name,
                transaction.transaction_id
            );
        } else {
            tracing::info!(
                "{}: transaction {} completed",
                self.name,
                transaction.transaction_id
            );
        }
    }
}
