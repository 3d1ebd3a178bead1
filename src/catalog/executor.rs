use super::store::CatalogStore;
use super::types::*;
use crate::partition::NodeName;
use std::sync::Arc;

/// Applies named actions to one node's local store.
///
/// Every action returns an [`ActionResult`]; business-rule violations come
/// back as `Failed` results, never as errors, so the dispatcher can relay
/// them verbatim.
pub struct ActionExecutor {
    node: NodeName,
    store: Arc<CatalogStore>,
}

impl ActionExecutor {
    pub fn new(node: NodeName, store: Arc<CatalogStore>) -> Self {
        Self { node, store }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Dispatches one action. `prior` carries the return value of an earlier
    /// hop for the data-dependent replica actions.
    pub fn execute(&self, action: &Action, prior: Option<&ReturnValue>) -> ActionResult {
        tracing::debug!("Executing {} at {}", action.name(), self.node);

        match action {
            Action::AddBook { book } => self.add_book(book),
            Action::AddUser { user } => self.add_user(user),
            Action::DeleteBook { book_id } => self.delete_book(*book_id),
            Action::BorrowBook {
                book_id,
                user_id,
                borrow_date,
                due_date,
            } => self.borrow_book(*book_id, *user_id, borrow_date, due_date),
            Action::AddLoan {
                book_id,
                user_id,
                borrow_date,
                due_date,
            } => self.add_loan(*book_id, *user_id, borrow_date, due_date, prior),
            Action::ReturnBook {
                book_id,
                return_date,
            } => self.return_book(*book_id, return_date),
            Action::UpdateLoan { return_date } => self.update_loan(return_date, prior),
            Action::QueryUser { user_id } => self.query_user(*user_id),
            Action::QueryBook { book_id } => self.query_book(*book_id),
            Action::TrackLoans => self.track_loans(),
        }
    }

    fn add_book(&self, book: &Book) -> ActionResult {
        if self.store.insert_book_if_absent(book.clone()) {
            ActionResult::success(format!("Book {} added", book.book_id))
        } else {
            ActionResult::failed(format!("Book {} already exists", book.book_id))
        }
    }

    fn add_user(&self, user: &User) -> ActionResult {
        if self.store.insert_user_if_absent(user.clone()) {
            ActionResult::success(format!("User {} added", user.user_id))
        } else {
            ActionResult::failed(format!("User {} already exists", user.user_id))
        }
    }

    fn delete_book(&self, book_id: u64) -> ActionResult {
        if self.store.remove_book(book_id) {
            ActionResult::success(format!("Book {} deleted", book_id))
        } else {
            ActionResult::failed(format!("Book {} doesn't exist", book_id))
        }
    }

    fn borrow_book(
        &self,
        book_id: u64,
        user_id: u64,
        borrow_date: &str,
        due_date: &str,
    ) -> ActionResult {
        if self.store.book(book_id).is_none() {
            return ActionResult::failed(format!("Book {} does not exist", book_id));
        }

        // The availability check and the transition share one map guard, so a
        // concurrent borrower cannot slip between them. A denied borrow bails
        // out before the loan row exists.
        let loan_id = self.store.allocate_loan_id();
        if !self.store.mark_borrowed(book_id, loan_id) {
            return ActionResult::failed(format!("Book {} is not available", book_id));
        }
        self.store.insert_loan(Loan {
            loan_id,
            book_id,
            user_id,
            borrow_date: borrow_date.to_string(),
            due_date: due_date.to_string(),
            return_date: None,
        });

        ActionResult::success_with(
            format!("User {} borrowed book {}", user_id, book_id),
            ReturnValue { loan_id },
        )
    }

    fn add_loan(
        &self,
        book_id: u64,
        user_id: u64,
        borrow_date: &str,
        due_date: &str,
        prior: Option<&ReturnValue>,
    ) -> ActionResult {
        let Some(ReturnValue { loan_id }) = prior.copied() else {
            return ActionResult::failed("add_loan requires a loan id from a prior hop");
        };

        tracing::info!("Adding replica loan {} at {}", loan_id, self.node);
        self.store.insert_loan(Loan {
            loan_id,
            book_id,
            user_id,
            borrow_date: borrow_date.to_string(),
            due_date: due_date.to_string(),
            return_date: None,
        });

        ActionResult::success_with(format!("Loan {} added", loan_id), ReturnValue { loan_id })
    }

    fn return_book(&self, book_id: u64, return_date: &str) -> ActionResult {
        let Some(book) = self.store.book(book_id) else {
            return ActionResult::failed(format!("Book {} is not borrowed", book_id));
        };
        if book.status == BookStatus::Available || book.loan_id.is_none() {
            return ActionResult::failed(format!("Book {} is now available", book_id));
        }

        let Some(loan_id) = self.store.mark_returned(book_id) else {
            return ActionResult::failed(format!("Book {} is now available", book_id));
        };
        self.store.close_loan(loan_id, return_date);

        ActionResult::success_with(
            format!("Book {} is returned", book_id),
            ReturnValue { loan_id },
        )
    }

    fn update_loan(&self, return_date: &str, prior: Option<&ReturnValue>) -> ActionResult {
        let Some(ReturnValue { loan_id }) = prior.copied() else {
            return ActionResult::failed("update_loan requires a loan id from a prior hop");
        };

        if self.store.close_loan(loan_id, return_date) {
            ActionResult::success_with(format!("Loan {} closed", loan_id), ReturnValue { loan_id })
        } else {
            ActionResult::failed(format!("Loan {} doesn't exist", loan_id))
        }
    }

    fn query_user(&self, user_id: u64) -> ActionResult {
        match self.store.user(user_id) {
            Some(user) => match serde_json::to_value(&user) {
                Ok(data) => {
                    ActionResult::success_with_data(format!("User {} found", user_id), data)
                }
                Err(e) => ActionResult::failed(format!("Failed to serialize user: {}", e)),
            },
            None => ActionResult::failed(format!(
                "User {} is not a member of {}",
                user_id, self.node
            )),
        }
    }

    fn query_book(&self, book_id: u64) -> ActionResult {
        match self.store.book(book_id) {
            Some(book) => match serde_json::to_value(&book) {
                Ok(data) => {
                    ActionResult::success_with_data(format!("Book {} exists", book_id), data)
                }
                Err(e) => ActionResult::failed(format!("Failed to serialize book: {}", e)),
            },
            None => ActionResult::failed(format!("Book {} not found", book_id)),
        }
    }

    fn track_loans(&self) -> ActionResult {
        let open = self.store.open_loans();
        if open.is_empty() {
            return ActionResult::success(format!("All books in {} are available", self.node));
        }
        match serde_json::to_value(&open) {
            Ok(data) => {
                ActionResult::success_with_data(format!("{} open loans", open.len()), data)
            }
            Err(e) => ActionResult::failed(format!("Failed to serialize loans: {}", e)),
        }
    }
}
