//! Control-channel round-trip latency probe.
//!
//! Bounces a queue pair record back and forth over a loopback channel
//! and reports the average round-trip time.

use std::thread;

use anyhow::Result;
use quanta::Instant;
use rdma_oob::ctrl::{Connecter, Role};
use rdma_oob::{listen_on, QueuePairInfo};

const ROUNDS: u32 = 10_000;

fn main() -> Result<()> {
    let listener = listen_on("0")?;
    let port = listener.local_addr()?.port().to_string();

    let echo = thread::spawn(move || -> Result<()> {
        let (stream, _) = listener.accept()?;
        let mut conn = Connecter::from_stream(stream, Role::Server);
        for _ in 0..ROUNDS {
            let info = conn.recv_queue_pair_info()?;
            conn.send_queue_pair_info(&info)?;
        }
        Ok(())
    });

    let mut conn = Connecter::connect("127.0.0.1", &port)?;
    let info = QueuePairInfo::new(7, 1000, 0);

    let time = Instant::now();
    for _ in 0..ROUNDS {
        conn.send_queue_pair_info(&info)?;
        let back = conn.recv_queue_pair_info()?;
        assert_eq!(back, info);
    }
    let elapsed = time.elapsed();

    echo.join().unwrap()?;
    println!(
        "{} round trips in {:?} ({:?} each)",
        ROUNDS,
        elapsed,
        elapsed / ROUNDS
    );
    Ok(())
}
