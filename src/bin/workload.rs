//! Scenario driver: replays the reference client workload against a running
//! three-node cluster. Expects all three nodes to be reachable.
//!
//! ```text
//! workload --server A=127.0.0.1:9000 --server B=127.0.0.1:9001 --server C=127.0.0.1:9002 [--ordered]
//! ```

use library_cluster::catalog::types::User;
use library_cluster::node::transport::HttpTransport;
use library_cluster::partition::NodeName;
use library_cluster::transaction::coordinator::{Coordinator, new_book};
use library_cluster::transaction::ordering::{BestEffort, OrderingPolicy, OriginOrdered};
use library_cluster::transaction::types::TransactionOutcome;
use std::collections::HashMap;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut servers: HashMap<NodeName, SocketAddr> = HashMap::new();
    let mut ordered = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                let (name, addr) = args[i + 1]
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("--server expects NAME=ADDR"))?;
                servers.insert(
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

    if servers.len() < 3 {
        eprintln!("Usage: workload --server A=ADDR --server B=ADDR --server C=ADDR [--ordered]");
        std::process::exit(1);
    }

    let transport = HttpTransport::new(servers);
    if ordered {
        run_scenario(&transport, OriginOrdered::new).await
    } else {
        run_scenario(&transport, || BestEffort).await
    }
}

async fn run_scenario<P, F>(transport: &HttpTransport, make_policy: F) -> anyhow::Result<()>
where
    P: OrderingPolicy,
    F: Fn() -> P,
{
    let librarian1 = Coordinator::new(1001, NodeName::LibraryA, transport.clone(), make_policy());
    let librarian2 = Coordinator::new(2001, NodeName::LibraryB, transport.clone(), make_policy());
    let librarian3 = Coordinator::new(3001, NodeName::LibraryC, transport.clone(), make_policy());
    let member1 = Coordinator::new(1002, NodeName::LibraryA, transport.clone(), make_policy());

    // T1: fan-out borrow of a Library B book, then one that cannot exist.
    report(member1.borrow_book(1, 2002, "2023-02-01", "2023-03-01").await?);
    report(member1.borrow_book(8, 4002, "2023-02-01", "2023-03-01").await?);

    // T2: registration at the librarian's home node.
    report(
        librarian1
            .add_user(
                2,
                User {
                    user_id: 1004,
                    name: "User 4".to_string(),
                    email: "user4@example.com".to_string(),
                    membership: NodeName::LibraryA,
                },
            )
            .await?,
    );

    // T3: new catalog row at Library B.
    report(
        librarian2
            .add_book(3, new_book(2004, "Book 4", "Author 4", "2023-01-01", "Fiction"))
            .await?,
    );

    // T4 - T6: single-hop operations.
    report(librarian3.delete_book(4, 3001).await?);
    report(librarian1.query_user(5, 1004).await?);
    report(librarian2.track_loans(6).await?);

    // T7: return the borrowed book, closing the replicas too.
    report(member1.return_book(7, 2002, "2023-02-10").await?);

    Ok(())
}

fn report(outcome: TransactionOutcome) {
    match outcome {
        TransactionOutcome::Completed {
            transaction_id,
            return_value,
        } => match return_value {
            Some(rv) => tracing::info!(
                "## Transaction {} completed successfully (loan {})",
                transaction_id,
                rv.loan_id
            ),
            None => tracing::info!("## Transaction {} completed successfully", transaction_id),
        },
        TransactionOutcome::Aborted {
            transaction_id,
            failed_hop,
            message,
        } => tracing::warn!(
            "## Transaction {} aborted at hop {}: {}",
            transaction_id,
            failed_hop,
            message
        ),
    }
}
