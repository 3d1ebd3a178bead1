use axum::extract::Extension;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use library_cluster::catalog::store::CatalogStore;
use library_cluster::catalog::types::ActionResult;
use library_cluster::node::dispatcher::NodeDispatcher;
use library_cluster::node::handlers::{handle_hop, handle_sequence, handle_transaction};
use library_cluster::node::protocol::{
    ENDPOINT_HOP, ENDPOINT_SEQUENCE, ENDPOINT_TRANSACTION, HopEnvelope, SequenceResponse,
    TransactionReply,
};
use library_cluster::node::transport::HttpTransport;
use library_cluster::partition::NodeName;
use library_cluster::transaction::types::Transaction;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --node <A|B|C> --bind <addr:port> [--peer <A|B|C>=<addr:port>]... [--ordered]",
            args[0]
        );
        eprintln!(
            "Example: {} --node A --bind 127.0.0.1:9000 \\",
            args[0]
        );
        eprintln!("             --peer A=127.0.0.1:9000 --peer B=127.0.0.1:9001 --peer C=127.0.0.1:9002");
        std::process::exit(1);
    }

    let mut node: Option<NodeName> = None;
    let mut bind_addr: Option<SocketAddr> = None;
    let mut peers: HashMap<NodeName, SocketAddr> = HashMap::new();
    let mut ordered = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--node" => {
                node = Some(args[i + 1].parse().map_err(|e| anyhow::anyhow!("{}", e))?);
                i += 2;
            }
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--peer" => {
                let (name, addr) = args[i + 1]
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("--peer expects NAME=ADDR"))?;
                peers.insert(
                    name.parse().map_err(|e| anyhow::anyhow!("{}", e))?,
                    addr.parse()?,
                );
                i += 2;
            }
            "--ordered" => {
                ordered = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let node = node.expect("--node is required");
    let bind_addr = bind_addr.expect("--bind is required");

    tracing::info!("Starting {} on {}", node, bind_addr);
    if ordered {
        tracing::info!("Origin-ordered hop delivery enabled");
    }

    // 1. Local catalog with the partition's seed rows:
    let store = Arc::new(CatalogStore::new());
    store.seed(node);
    tracing::info!(
        "{}: seeded {} books, {} users",
        node,
        store.book_count(),
        store.user_count()
    );

    // 2. Dispatcher with the peer table:
    let transport = HttpTransport::new(peers);
    let dispatcher = NodeDispatcher::new(node, store, transport, ordered);

    // 3. HTTP router:
    let app = Router::new()
        .route(ENDPOINT_HOP, post(handle_hop_http))
        .route(ENDPOINT_SEQUENCE, post(handle_sequence_http))
        .route(ENDPOINT_TRANSACTION, post(handle_transaction_http))
        .layer(Extension(dispatcher));

    tracing::info!("{} listening on {}", node, bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Concrete wrappers over the generic handlers.

async fn handle_hop_http(
    dispatcher: Extension<Arc<NodeDispatcher<HttpTransport>>>,
    envelope: Json<HopEnvelope>,
) -> (StatusCode, Json<ActionResult>) {
    handle_hop::<HttpTransport>(dispatcher, envelope).await
}

async fn handle_sequence_http(
    dispatcher: Extension<Arc<NodeDispatcher<HttpTransport>>>,
) -> (StatusCode, Json<SequenceResponse>) {
    handle_sequence::<HttpTransport>(dispatcher).await
}

async fn handle_transaction_http(
    dispatcher: Extension<Arc<NodeDispatcher<HttpTransport>>>,
    transaction: Json<Transaction>,
) -> (StatusCode, Json<TransactionReply>) {
    handle_transaction::<HttpTransport>(dispatcher, transaction).await
}
