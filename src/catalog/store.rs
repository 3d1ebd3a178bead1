use super::types::*;
use crate::partition::NodeName;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keyed record store behind one node.
///
/// Three concurrent maps, one per entity type, shared by all connection
/// workers of the node. Concurrent hops touching the same record race at this
/// layer; callers must not assume cross-hop atomicity.
pub struct CatalogStore {
    books: DashMap<u64, Book>,
    users: DashMap<u64, User>,
    loans: DashMap<u64, Loan>,
    next_loan_id: AtomicU64,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            users: DashMap::new(),
            loans: DashMap::new(),
            next_loan_id: AtomicU64::new(0),
        }
    }

    /// Installs the seed rows of a partition: three users and three Available
    /// books at `base_id + 1 ..= base_id + 3`.
    pub fn seed(&self, node: NodeName) {
        let base_id = node.base_id();
        for offset in 1..=3u64 {
            let id = base_id + offset;
            self.users.insert(
                id,
                User {
                    user_id: id,
                    name: format!("User {}", offset),
                    email: format!("user{}@example.com", offset),
                    membership: node,
                },
            );
            self.books.insert(
                id,
                Book {
                    book_id: id,
                    title: format!("Book {}", offset),
                    author: format!("Author {}", offset),
                    publication_date: "2023-01-01".to_string(),
                    category: match offset {
                        1 => "Fiction".to_string(),
                        2 => "History".to_string(),
                        _ => "Romance".to_string(),
                    },
                    status: BookStatus::Available,
                    loan_id: None,
                },
            );
        }
    }

    /// Allocates the next node-local loan id.
    pub fn allocate_loan_id(&self) -> u64 {
        self.next_loan_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn book(&self, book_id: u64) -> Option<Book> {
        self.books.get(&book_id).map(|b| b.clone())
    }

    /// Inserts a book only if the id is free. Returns false on a duplicate,
    /// leaving the existing row untouched.
    pub fn insert_book_if_absent(&self, book: Book) -> bool {
        match self.books.entry(book.book_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(book);
                true
            }
        }
    }

    pub fn remove_book(&self, book_id: u64) -> bool {
        self.books.remove(&book_id).is_some()
    }

    /// Transitions a book to Borrowed under the given loan, provided it is
    /// currently Available. The check and the write happen under the same
    /// map guard.
    pub fn mark_borrowed(&self, book_id: u64, loan_id: u64) -> bool {
        match self.books.get_mut(&book_id) {
            Some(mut book) if book.status == BookStatus::Available => {
                book.status = BookStatus::Borrowed;
                book.loan_id = Some(loan_id);
                true
            }
            _ => false,
        }
    }

    /// Frees a Borrowed book, returning the loan id it carried.
    pub fn mark_returned(&self, book_id: u64) -> Option<u64> {
        let mut book = self.books.get_mut(&book_id)?;
        if book.status != BookStatus::Borrowed {
            return None;
        }
        let loan_id = book.loan_id.take();
        book.status = BookStatus::Available;
        loan_id
    }

    pub fn user(&self, user_id: u64) -> Option<User> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    pub fn insert_user_if_absent(&self, user: User) -> bool {
        match self.users.entry(user.user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(user);
                true
            }
        }
    }

    pub fn loan(&self, loan_id: u64) -> Option<Loan> {
        self.loans.get(&loan_id).map(|l| l.clone())
    }

    /// Unconditional loan insert, used by the replica write path.
    pub fn insert_loan(&self, loan: Loan) {
        self.loans.insert(loan.loan_id, loan);
    }

    /// Sets the return date of a loan. Returns false if the replica lacks the
    /// loan row.
    pub fn close_loan(&self, loan_id: u64, return_date: &str) -> bool {
        match self.loans.get_mut(&loan_id) {
            Some(mut loan) => {
                loan.return_date = Some(return_date.to_string());
                true
            }
            None => false,
        }
    }

    /// All loans whose book is currently Borrowed in this store.
    pub fn open_loans(&self) -> Vec<Loan> {
        self.books
            .iter()
            .filter(|book| book.status == BookStatus::Borrowed)
            .filter_map(|book| book.loan_id)
            .filter_map(|loan_id| self.loan(loan_id))
            .collect()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
