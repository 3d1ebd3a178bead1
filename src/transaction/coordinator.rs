use super::ordering::OrderingPolicy;
use super::types::{Hop, Transaction, TransactionOutcome};
use crate::catalog::types::{Action, Book, BookStatus, ReturnValue, User};
use crate::node::protocol::{HopEnvelope, TransactionReply};
use crate::node::transport::HopTransport;
use crate::partition::{self, NodeName};
use anyhow::Result;
use std::time::Duration;

/// Retry budget for non-first hops: a fixed attempt count with a fixed pause
/// between attempts. No backoff, no deadline.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(300),
        }
    }
}

/// Client-side driver of the hop protocol.
///
/// One coordinator belongs to one client at one home node. It executes its
/// own transactions strictly sequentially, blocking on every round trip;
/// concurrency comes from independent coordinators.
pub struct Coordinator<T, P> {
    client_id: u64,
    home: NodeName,
    transport: T,
    ordering: P,
    retry: RetryPolicy,
}

impl<T: HopTransport, P: OrderingPolicy> Coordinator<T, P> {
    pub fn new(client_id: u64, home: NodeName, transport: T, ordering: P) -> Self {
        Self {
            client_id,
            home,
            transport,
            ordering,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    pub fn home(&self) -> NodeName {
        self.home
    }

    // --- High-level operations ---

    pub async fn add_user(&self, transaction_id: u64, user: User) -> Result<TransactionOutcome> {
        let hop = Hop {
            hop_id: 1,
            node: self.home,
            action: Action::AddUser { user },
        };
        self.run(Transaction::new(transaction_id, "add_user", vec![hop]))
            .await
    }

    pub async fn add_book(&self, transaction_id: u64, book: Book) -> Result<TransactionOutcome> {
        let hop = Hop {
            hop_id: 1,
            node: self.home,
            action: Action::AddBook { book },
        };
        self.run(Transaction::new(transaction_id, "add_book", vec![hop]))
            .await
    }

    pub async fn delete_book(
        &self,
        transaction_id: u64,
        book_id: u64,
    ) -> Result<TransactionOutcome> {
        let hop = Hop {
            hop_id: 1,
            node: partition::resolve(book_id),
            action: Action::DeleteBook { book_id },
        };
        self.run(Transaction::new(transaction_id, "delete_book", vec![hop]))
            .await
    }

    pub async fn query_user(
        &self,
        transaction_id: u64,
        user_id: u64,
    ) -> Result<TransactionOutcome> {
        let hop = Hop {
            hop_id: 1,
            node: self.home,
            action: Action::QueryUser { user_id },
        };
        self.run(Transaction::new(transaction_id, "query_user", vec![hop]))
            .await
    }

    pub async fn track_loans(&self, transaction_id: u64) -> Result<TransactionOutcome> {
        let hop = Hop {
            hop_id: 1,
            node: self.home,
            action: Action::TrackLoans,
        };
        self.run(Transaction::new(transaction_id, "track_loans", vec![hop]))
            .await
    }

    /// Borrowing fans out: hop 1 creates the loan at the book's owner, hops 2
    /// and 3 replicate it (with the generated loan id) to the other two
    /// partitions, in `peers` order.
    pub async fn borrow_book(
        &self,
        transaction_id: u64,
        book_id: u64,
        borrow_date: &str,
        due_date: &str,
    ) -> Result<TransactionOutcome> {
        let owner = partition::resolve(book_id);
        let [second, third] = partition::peers(owner);
        let replica = |node: NodeName| Hop {
            hop_id: 0,
            node,
            action: Action::AddLoan {
                book_id,
                user_id: self.client_id,
                borrow_date: borrow_date.to_string(),
                due_date: due_date.to_string(),
            },
        };

        let hops = vec![
            Hop {
                hop_id: 1,
                node: owner,
                action: Action::BorrowBook {
                    book_id,
                    user_id: self.client_id,
                    borrow_date: borrow_date.to_string(),
                    due_date: due_date.to_string(),
                },
            },
            Hop { hop_id: 2, ..replica(second) },
            Hop { hop_id: 3, ..replica(third) },
        ];
        self.run(Transaction::new(transaction_id, "borrow_book", hops))
            .await
    }

    /// Returning mirrors borrowing: hop 1 closes the loan at the owner, hops
    /// 2 and 3 close the replica rows named by hop 1's return value.
    pub async fn return_book(
        &self,
        transaction_id: u64,
        book_id: u64,
        return_date: &str,
    ) -> Result<TransactionOutcome> {
        let owner = partition::resolve(book_id);
        let [second, third] = partition::peers(owner);
        let replica = |hop_id: u32, node: NodeName| Hop {
            hop_id,
            node,
            action: Action::UpdateLoan {
                return_date: return_date.to_string(),
            },
        };

        let hops = vec![
            Hop {
                hop_id: 1,
                node: owner,
                action: Action::ReturnBook {
                    book_id,
                    return_date: return_date.to_string(),
                },
            },
            replica(2, second),
            replica(3, third),
        ];
        self.run(Transaction::new(transaction_id, "return_book", hops))
            .await
    }

    // --- Execution ---

    /// Drives a transaction hop by hop. See the module docs for the contract.
    pub async fn run(&self, mut transaction: Transaction) -> Result<TransactionOutcome> {
        let ticket = self.ordering.open_ticket(&self.transport, self.home).await?;
        transaction.sequence_number = ticket.sequence_number;

        let first = transaction
            .hops
            .first()
            .ok_or_else(|| anyhow::anyhow!("Transaction {} has no hops", transaction.transaction_id))?
            .clone();

        let envelope = HopEnvelope {
            transaction_id: transaction.transaction_id,
            hop: first.clone(),
            return_value: None,
            sequence_number: transaction.sequence_number,
        };
        let first_result = self.transport.send_hop(first.node, &envelope).await;
        // The ordering lock covers exactly "assign sequence number, dispatch
        // first hop".
        drop(ticket);

        let first_result = match first_result {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    "Transaction {} aborted at first hop {}: {}",
                    transaction.transaction_id,
                    first.node,
                    e
                );
                return Ok(TransactionOutcome::Aborted {
                    transaction_id: transaction.transaction_id,
                    failed_hop: first.hop_id,
                    message: e.to_string(),
                });
            }
        };
        if !first_result.is_success() {
            tracing::warn!(
                "Transaction {} aborted at first hop {}: {}",
                transaction.transaction_id,
                first.node,
                first_result.message
            );
            return Ok(TransactionOutcome::Aborted {
                transaction_id: transaction.transaction_id,
                failed_hop: first.hop_id,
                message: first_result.message,
            });
        }
        tracing::info!(
            "Transaction {}: first hop at {} completed",
            transaction.transaction_id,
            first.node
        );

        let mut return_value = first_result.return_value;
        for hop in &transaction.hops[1..] {
            match self.send_with_retry(&transaction, hop, return_value).await {
                Some(result) => {
                    if result.return_value.is_some() {
                        return_value = result.return_value;
                    }
                }
                None => {
                    tracing::warn!(
                        "Transaction {} aborted: hop {} at {} exhausted {} attempts",
                        transaction.transaction_id,
                        hop.hop_id,
                        hop.node,
                        self.retry.max_retries
                    );
                    return Ok(TransactionOutcome::Aborted {
                        transaction_id: transaction.transaction_id,
                        failed_hop: hop.hop_id,
                        message: format!("Retry budget exhausted at {}", hop.node),
                    });
                }
            }
        }

        tracing::info!(
            "Transaction {} completed successfully",
            transaction.transaction_id
        );
        Ok(TransactionOutcome::Completed {
            transaction_id: transaction.transaction_id,
            return_value,
        })
    }

    /// Sends one non-first hop until it succeeds or the budget runs out.
    /// Transport failures count as failed attempts.
    async fn send_with_retry(
        &self,
        transaction: &Transaction,
        hop: &Hop,
        return_value: Option<ReturnValue>,
    ) -> Option<crate::catalog::types::ActionResult> {
        let envelope = HopEnvelope {
            transaction_id: transaction.transaction_id,
            hop: hop.clone(),
            return_value,
            sequence_number: transaction.sequence_number,
        };

        for attempt in 1..=self.retry.max_retries {
            match self.transport.send_hop(hop.node, &envelope).await {
                Ok(result) if result.is_success() => return Some(result),
                Ok(result) => {
                    tracing::warn!(
                        "Hop {} at {} failed (attempt {}/{}): {}",
                        hop.hop_id,
                        hop.node,
                        attempt,
                        self.retry.max_retries,
                        result.message
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Hop {} at {} unreachable (attempt {}/{}): {}",
                        hop.hop_id,
                        hop.node,
                        attempt,
                        self.retry.max_retries,
                        e
                    );
                }
            }
            if attempt < self.retry.max_retries {
                tokio::time::sleep(self.retry.retry_delay).await;
            }
        }
        None
    }

    /// Legacy whole-transaction submission: hands the entire hop list to the
    /// first hop's node and returns its commit/abort decision. The node
    /// drives the remaining hops itself.
    pub async fn submit(&self, transaction: Transaction) -> Result<TransactionReply> {
        let first = transaction
            .hops
            .first()
            .ok_or_else(|| anyhow::anyhow!("Transaction {} has no hops", transaction.transaction_id))?;
        self.transport
            .submit_transaction(first.node, &transaction)
            .await
    }
}

/// Convenience constructor for the catalog row a librarian registers.
pub fn new_book(
    book_id: u64,
    title: &str,
    author: &str,
    publication_date: &str,
    category: &str,
) -> Book {
    Book {
        book_id,
        title: title.to_string(),
        author: author.to_string(),
        publication_date: publication_date.to_string(),
        category: category.to_string(),
        status: BookStatus::Available,
        loan_id: None,
    }
}
