//! Delivery-Ordering Policies
//!
//! Strategy seam between the best-effort and origin-ordered coordinator
//! variants. A policy opens a [`DispatchTicket`] before the first hop goes
//! out; the ticket carries the ordering token (if any) and, for the ordered
//! policy, the per-coordinator lock that makes "assign sequence number, send
//! first hop" one atomic unit from the client's perspective.

use crate::node::transport::HopTransport;
use crate::partition::NodeName;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Token handed to the coordinator for one transaction dispatch. Dropping the
/// ticket releases the ordering lock; the coordinator drops it only after the
/// first hop has been dispatched.
pub struct DispatchTicket {
    pub sequence_number: Option<u64>,
    _slot: Option<OwnedMutexGuard<()>>,
}

impl DispatchTicket {
    fn unordered() -> Self {
        Self {
            sequence_number: None,
            _slot: None,
        }
    }
}

pub trait OrderingPolicy: Send + Sync {
    /// Obtains the ordering token for the next transaction, taking whatever
    /// lock the policy needs to keep token order aligned with send order.
    fn open_ticket<T: HopTransport>(
        &self,
        transport: &T,
        home: NodeName,
    ) -> impl Future<Output = Result<DispatchTicket>> + Send;
}

/// Base policy: no token, immediate admission everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct BestEffort;

impl OrderingPolicy for BestEffort {
    async fn open_ticket<T: HopTransport>(
        &self,
        _transport: &T,
        _home: NodeName,
    ) -> Result<DispatchTicket> {
        Ok(DispatchTicket::unordered())
    }
}

/// Origin-ordered policy: serializes sequence-number assignment and first-hop
/// dispatch behind a per-coordinator lock, so two concurrent transactions
/// from the same origin can never interleave their assignments.
#[derive(Clone, Default)]
pub struct OriginOrdered {
    slot: Arc<Mutex<()>>,
}

impl OriginOrdered {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderingPolicy for OriginOrdered {
    async fn open_ticket<T: HopTransport>(
        &self,
        transport: &T,
        home: NodeName,
    ) -> Result<DispatchTicket> {
        let slot = self.slot.clone().lock_owned().await;
        let sequence_number = transport.request_sequence(home).await?;
        tracing::debug!("Obtained sequence number {} from {}", sequence_number, home);
        Ok(DispatchTicket {
            sequence_number: Some(sequence_number),
            _slot: Some(slot),
        })
    }
}
