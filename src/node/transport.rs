//! Outbound RPC Seam
//!
//! `HopTransport` abstracts "send a message to the node named X" for both the
//! coordinator (client role) and the dispatcher (peer forwarding). The
//! production implementation speaks JSON over HTTP against a static peer
//! table; tests substitute scripted or in-process loopback transports.

use super::protocol::{
    ENDPOINT_HOP, ENDPOINT_SEQUENCE, ENDPOINT_TRANSACTION, HopEnvelope, SequenceResponse,
    TransactionReply,
};
use crate::catalog::types::ActionResult;
use crate::partition::NodeName;
use crate::transaction::types::Transaction;
use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;

/// One logical exchange per call; every method blocks until the addressed
/// node responds or the connection fails. There is deliberately no deadline
/// here: retry pacing lives in the coordinator, and a hung peer blocks its
/// caller.
pub trait HopTransport: Send + Sync {
    /// Delivers one hop envelope and returns the executing node's result.
    fn send_hop(
        &self,
        node: NodeName,
        envelope: &HopEnvelope,
    ) -> impl Future<Output = Result<ActionResult>> + Send;

    /// Requests the next ordering token from `node`'s local counter.
    fn request_sequence(&self, node: NodeName) -> impl Future<Output = Result<u64>> + Send;

    /// Submits a whole transaction (legacy path) and returns the commit/abort
    /// decision taken after its first hop.
    fn submit_transaction(
        &self,
        node: NodeName,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<TransactionReply>> + Send;
}

/// JSON-over-HTTP transport backed by a static partition-to-address table.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    servers: HashMap<NodeName, SocketAddr>,
}

impl HttpTransport {
    pub fn new(servers: HashMap<NodeName, SocketAddr>) -> Self {
        Self {
            client: reqwest::Client::new(),
            servers,
        }
    }

    fn url(&self, node: NodeName, endpoint: &str) -> Result<String> {
        let addr = self
            .servers
            .get(&node)
            .ok_or_else(|| anyhow::anyhow!("No address configured for {}", node))?;
        Ok(format!("http://{}{}", addr, endpoint))
    }
}

impl HopTransport for HttpTransport {
    async fn send_hop(&self, node: NodeName, envelope: &HopEnvelope) -> Result<ActionResult> {
        let response = self
            .client
            .post(self.url(node, ENDPOINT_HOP)?)
            .json(envelope)
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn request_sequence(&self, node: NodeName) -> Result<u64> {
        let response = self
            .client
            .post(self.url(node, ENDPOINT_SEQUENCE)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Sequence request to {} failed: {}",
                node,
                response.status()
            ));
        }
        let reply: SequenceResponse = response.json().await?;
        Ok(reply.sequence_number)
    }

    async fn submit_transaction(
        &self,
        node: NodeName,
        transaction: &Transaction,
    ) -> Result<TransactionReply> {
        let response = self
            .client
            .post(self.url(node, ENDPOINT_TRANSACTION)?)
            .json(transaction)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Transaction submission to {} failed: {}",
                node,
                response.status()
            ));
        }
        Ok(response.json().await?)
    }
}
