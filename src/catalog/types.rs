use crate::partition::NodeName;
use serde::{Deserialize, Serialize};

/// Circulation state of a book.
///
/// A book is `Borrowed` iff its `loan_id` references an open loan (one with
/// no return date). The executor maintains that invariant on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Borrowed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: u64,
    pub title: String,
    pub author: String,
    pub publication_date: String,
    pub category: String,
    pub status: BookStatus,
    pub loan_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub membership: NodeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: u64,
    pub book_id: u64,
    pub user_id: u64,
    pub borrow_date: String,
    pub due_date: String,
    pub return_date: Option<String>,
}

/// A named node-local operation together with its arguments.
///
/// Serialized with an internal `action` tag so the wire form matches the
/// action names clients know (`add_book`, `borrow_book`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    AddBook {
        book: Book,
    },
    AddUser {
        user: User,
    },
    DeleteBook {
        book_id: u64,
    },
    BorrowBook {
        book_id: u64,
        user_id: u64,
        borrow_date: String,
        due_date: String,
    },
    /// Replica companion of `borrow_book`: inserts the loan generated by the
    /// primary hop, whose id arrives via the prior return value.
    AddLoan {
        book_id: u64,
        user_id: u64,
        borrow_date: String,
        due_date: String,
    },
    ReturnBook {
        book_id: u64,
        return_date: String,
    },
    /// Replica companion of `return_book`: closes the loan named by the prior
    /// return value.
    UpdateLoan {
        return_date: String,
    },
    QueryUser {
        user_id: u64,
    },
    QueryBook {
        book_id: u64,
    },
    TrackLoans,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddBook { .. } => "add_book",
            Action::AddUser { .. } => "add_user",
            Action::DeleteBook { .. } => "delete_book",
            Action::BorrowBook { .. } => "borrow_book",
            Action::AddLoan { .. } => "add_loan",
            Action::ReturnBook { .. } => "return_book",
            Action::UpdateLoan { .. } => "update_loan",
            Action::QueryUser { .. } => "query_user",
            Action::QueryBook { .. } => "query_book",
            Action::TrackLoans => "track_loans",
        }
    }
}

/// Outcome tag inspected by the coordinator for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Success,
    Failed,
}

/// Value produced by a hop and threaded into data-dependent later hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValue {
    pub loan_id: u64,
}

/// Structured result of one executed action.
///
/// Business-rule rejections travel here as `status: Failed`, never as a
/// transport fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<ReturnValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            return_value: None,
            data: None,
        }
    }

    pub fn success_with(message: impl Into<String>, return_value: ReturnValue) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            return_value: Some(return_value),
            data: None,
        }
    }

    pub fn success_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            return_value: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failed,
            message: message.into(),
            return_value: None,
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}
