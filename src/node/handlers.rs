use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::dispatcher::NodeDispatcher;
use super::protocol::{HopEnvelope, SequenceResponse, TransactionReply};
use super::transport::HopTransport;
use crate::catalog::types::ActionResult;
use crate::transaction::types::Transaction;

/// Hop-at-a-time submission. Business failures stay HTTP 200 with a `Failed`
/// status in the body; only a forwarding fault surfaces as a gateway error.
pub async fn handle_hop<T>(
    Extension(dispatcher): Extension<Arc<NodeDispatcher<T>>>,
    Json(envelope): Json<HopEnvelope>,
) -> (StatusCode, Json<ActionResult>)
where
    T: HopTransport + 'static,
{
    match dispatcher.handle_hop(envelope).await {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(e) => {
            tracing::error!("Failed to relay hop: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ActionResult::failed(format!("Relay failed: {}", e))),
            )
        }
    }
}

/// Issues the next ordering token from this node's counter.
pub async fn handle_sequence<T>(
    Extension(dispatcher): Extension<Arc<NodeDispatcher<T>>>,
) -> (StatusCode, Json<SequenceResponse>)
where
    T: HopTransport + 'static,
{
    let sequence_number = dispatcher.next_sequence();
    tracing::debug!("{}: issued sequence number {}", dispatcher.name(), sequence_number);
    (StatusCode::OK, Json(SequenceResponse { sequence_number }))
}

/// Legacy whole-transaction submission; replies with the commit/abort
/// decision taken after hop 1.
pub async fn handle_transaction<T>(
    Extension(dispatcher): Extension<Arc<NodeDispatcher<T>>>,
    Json(transaction): Json<Transaction>,
) -> (StatusCode, Json<TransactionReply>)
where
    T: HopTransport + 'static,
{
    let reply = dispatcher.handle_transaction(transaction).await;
    (StatusCode::OK, Json(reply))
}
