//! Two-role bootstrap demo.
//!
//! Run the server first (or not; the client retries):
//!
//! ```text
//! cargo run --example handshake -- server
//! cargo run --example handshake -- client 127.0.0.1
//! ```

use std::time::Duration;

use anyhow::Result;
use rdma_oob::ctrl::Connecter;
use rdma_oob::{MemoryRegionInfo, QueuePairInfo};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let role = args.next().unwrap_or_else(|| "server".to_owned());
    let service = Connecter::DEFAULT_PORT.to_string();

    let (mut conn, local_qp, local_mr) = match role.as_str() {
        "server" => {
            println!("listening on {}", service);
            let conn = Connecter::listen(&service)?;
            (
                conn,
                QueuePairInfo::new(7, 1000, 0),
                MemoryRegionInfo::new(0x7F00_DEAD_0000, 4096, 0x77),
            )
        }
        "client" => {
            let host = args.next().unwrap_or_else(|| "127.0.0.1".to_owned());
            println!("dialing {}:{}", host, service);
            let conn =
                Connecter::connect_with_retry(&host, &service, Duration::from_millis(200))?;
            (
                conn,
                QueuePairInfo::new(8, 2000, 1),
                MemoryRegionInfo::new(0x7F00_BEEF_0000, 4096, 0x88),
            )
        }
        other => anyhow::bail!("unknown role {:?} (expected server/client)", other),
    };

    let peer_qp = conn.exchange_queue_pair_info(&local_qp)?;
    let peer_mr = conn.exchange_memory_region_info(&local_mr)?;

    println!("peer QP: {}", serde_json::to_string(&peer_qp)?);
    println!("peer MR: {}", serde_json::to_string(&peer_mr)?);
    Ok(())
}
