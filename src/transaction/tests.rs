//! Transaction Module Tests
//!
//! Exercises the coordinator's execution contract against a scripted
//! transport: first-hop abort, the bounded retry budget, return-value
//! threading and sequence-number assignment.

#[cfg(test)]
mod tests {
    use crate::catalog::types::ActionResult;
    use crate::node::protocol::{Decision, HopEnvelope, TransactionReply};
    use crate::node::transport::HopTransport;
    use crate::partition::NodeName;
    use crate::transaction::coordinator::{Coordinator, RetryPolicy, new_book};
    use crate::transaction::ordering::{BestEffort, OriginOrdered};
    use crate::transaction::types::{Transaction, TransactionOutcome};
    use anyhow::Result;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// What the coordinator put on the wire, in send order.
    #[derive(Debug, Clone, PartialEq)]
    struct SentHop {
        node: NodeName,
        hop_id: u32,
        sequence_number: Option<u64>,
        loan_id: Option<u64>,
    }

    /// Transport that answers each node from a scripted queue of results.
    /// Nodes without a script answer with a plain success.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        results: Arc<Mutex<HashMap<NodeName, VecDeque<ActionResult>>>>,
        log: Arc<Mutex<Vec<SentHop>>>,
        submitted: Arc<Mutex<Vec<(NodeName, Transaction)>>>,
        sequence: Arc<AtomicU64>,
    }

    impl ScriptedTransport {
        fn script(&self, node: NodeName, results: Vec<ActionResult>) {
            self.results
                .lock()
                .unwrap()
                .insert(node, results.into_iter().collect());
        }

        fn sends_to(&self, node: NodeName) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|sent| sent.node == node)
                .count()
        }

        fn log(&self) -> Vec<SentHop> {
            self.log.lock().unwrap().clone()
        }
    }

    impl HopTransport for ScriptedTransport {
        async fn send_hop(&self, node: NodeName, envelope: &HopEnvelope) -> Result<ActionResult> {
            self.log.lock().unwrap().push(SentHop {
                node,
                hop_id: envelope.hop.hop_id,
                sequence_number: envelope.sequence_number,
                loan_id: envelope.return_value.map(|rv| rv.loan_id),
            });
            let scripted = self
                .results
                .lock()
                .unwrap()
                .get_mut(&node)
                .and_then(|queue| queue.pop_front());
            Ok(scripted.unwrap_or_else(|| ActionResult::success("ok")))
        }

        async fn request_sequence(&self, _node: NodeName) -> Result<u64> {
            Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn submit_transaction(
            &self,
            node: NodeName,
            transaction: &Transaction,
        ) -> Result<TransactionReply> {
            let transaction_id = transaction.transaction_id;
            self.submitted
                .lock()
                .unwrap()
                .push((node, transaction.clone()));
            Ok(TransactionReply {
                transaction_id,
                decision: Decision::Commit,
                message: "ok".to_string(),
            })
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(1),
        }
    }

    fn member(transport: ScriptedTransport) -> Coordinator<ScriptedTransport, BestEffort> {
        Coordinator::new(1002, NodeName::LibraryA, transport, BestEffort).with_retry(fast_retry())
    }

    fn borrowed(loan_id: u64) -> ActionResult {
        ActionResult::success_with(
            "borrowed",
            crate::catalog::types::ReturnValue { loan_id },
        )
    }

    // ============================================================
    // FIRST-HOP ABORT
    // ============================================================

    #[tokio::test]
    async fn failed_first_hop_aborts_with_no_retry_and_no_later_sends() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![ActionResult::failed("not available")]);
        let coordinator = member(transport.clone());

        let outcome = coordinator
            .borrow_book(1, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransactionOutcome::Aborted {
                transaction_id: 1,
                failed_hop: 1,
                message: "not available".to_string(),
            }
        );
        // Exactly one send, to the book's owner; hops 2 and 3 never went out.
        assert_eq!(transport.log().len(), 1);
        assert_eq!(transport.sends_to(NodeName::LibraryB), 1);
    }

    // ============================================================
    // BOUNDED RETRY
    // ============================================================

    #[tokio::test]
    async fn later_hop_stops_after_exactly_max_retries_attempts() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![borrowed(42)]);
        transport.script(
            NodeName::LibraryA,
            vec![
                ActionResult::failed("down"),
                ActionResult::failed("down"),
                ActionResult::failed("down"),
                ActionResult::failed("never reached"),
            ],
        );
        let coordinator = member(transport.clone());

        let outcome = coordinator
            .borrow_book(2, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            TransactionOutcome::Aborted { failed_hop: 2, .. }
        ));
        assert_eq!(transport.sends_to(NodeName::LibraryA), 3);
        // The remaining hop is never attempted after the budget runs out.
        assert_eq!(transport.sends_to(NodeName::LibraryC), 0);
    }

    #[tokio::test]
    async fn later_hop_that_recovers_within_the_budget_completes() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![borrowed(42)]);
        transport.script(
            NodeName::LibraryA,
            vec![
                ActionResult::failed("down"),
                ActionResult::failed("down"),
                borrowed(42),
            ],
        );
        let coordinator = member(transport.clone());

        let outcome = coordinator
            .borrow_book(3, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert_eq!(transport.sends_to(NodeName::LibraryA), 3);
        assert_eq!(transport.sends_to(NodeName::LibraryC), 1);
    }

    // ============================================================
    // RETURN-VALUE THREADING AND HOP LAYOUT
    // ============================================================

    #[tokio::test]
    async fn fan_out_hops_carry_the_first_hops_loan_id_in_peer_order() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![borrowed(7)]);
        let coordinator = member(transport.clone());

        let outcome = coordinator
            .borrow_book(4, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert!(outcome.is_completed());
        let log = transport.log();
        assert_eq!(log.len(), 3);
        // Hop 1 at the owner, hops 2 and 3 at the peers in {A,B,C} order.
        assert_eq!(log[0].node, NodeName::LibraryB);
        assert_eq!(log[0].loan_id, None);
        assert_eq!(log[1].node, NodeName::LibraryA);
        assert_eq!(log[1].loan_id, Some(7));
        assert_eq!(log[2].node, NodeName::LibraryC);
        assert_eq!(log[2].loan_id, Some(7));
    }

    #[tokio::test]
    async fn single_hop_operations_target_the_expected_node() {
        let transport = ScriptedTransport::default();
        let coordinator = member(transport.clone());

        coordinator.track_loans(5).await.unwrap();
        coordinator.delete_book(6, 3001).await.unwrap();
        coordinator.query_user(7, 1004).await.unwrap();

        let log = transport.log();
        assert_eq!(log[0].node, NodeName::LibraryA); // home
        assert_eq!(log[1].node, NodeName::LibraryC); // book 3001's owner
        assert_eq!(log[2].node, NodeName::LibraryA); // home
    }

    // ============================================================
    // ORIGIN-ORDERED VARIANT
    // ============================================================

    #[tokio::test]
    async fn origin_ordered_coordinator_tags_every_hop_with_one_sequence_number() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![borrowed(1), borrowed(2)]);
        let coordinator = Coordinator::new(
            1002,
            NodeName::LibraryA,
            transport.clone(),
            OriginOrdered::new(),
        )
        .with_retry(fast_retry());

        let first = coordinator
            .borrow_book(1, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();
        let second = coordinator
            .borrow_book(2, 2003, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert!(first.is_completed());
        assert!(second.is_completed());

        let log = transport.log();
        assert_eq!(log.len(), 6);
        // Strictly increasing tokens; every hop of a transaction shares one.
        assert!(log[..3].iter().all(|sent| sent.sequence_number == Some(1)));
        assert!(log[3..].iter().all(|sent| sent.sequence_number == Some(2)));
    }

    #[tokio::test]
    async fn best_effort_coordinator_sends_untagged_hops() {
        let transport = ScriptedTransport::default();
        transport.script(NodeName::LibraryB, vec![borrowed(1)]);
        let coordinator = member(transport.clone());

        coordinator
            .borrow_book(1, 2002, "2023-02-01", "2023-03-01")
            .await
            .unwrap();

        assert!(transport.log().iter().all(|sent| sent.sequence_number.is_none()));
        assert_eq!(transport.sequence.load(Ordering::SeqCst), 0);
    }

    // ============================================================
    // LEGACY SUBMISSION
    // ============================================================

    #[tokio::test]
    async fn legacy_submit_hands_the_whole_transaction_to_the_first_hops_node() {
        let transport = ScriptedTransport::default();
        let coordinator = member(transport.clone());

        let book = new_book(2004, "Book 4", "Author 4", "2023-01-01", "Fiction");
        let transaction = Transaction::new(
            3,
            "add_book",
            vec![crate::transaction::types::Hop {
                hop_id: 1,
                node: NodeName::LibraryB,
                action: crate::catalog::types::Action::AddBook { book },
            }],
        );

        let reply = coordinator.submit(transaction).await.unwrap();

        assert_eq!(reply.decision, Decision::Commit);
        let submitted = transport.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, NodeName::LibraryB);
        assert_eq!(submitted[0].1.hops.len(), 1);
    }
}
