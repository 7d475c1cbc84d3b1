//! TCP-based distributed barrier.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::cluster::Cluster;
use super::connecter::Connecter;
use crate::conn::{listen_on, EstablishError};
use crate::stream::{read_full, write_full};

/// Barrier error type.
#[derive(Debug, Error)]
pub enum BarrierError {
    /// Establishing the rendezvous connections failed.
    #[error(transparent)]
    Establish(#[from] EstablishError),

    /// The release byte could not be transferred.
    #[error("barrier release failed")]
    Io(#[from] io::Error),
}

/// Distributed barrier.
///
/// Synchronize all processes in the cluster.
pub struct Barrier;

impl Barrier {
    /// The default TCP service used by [`Barrier::wait`].
    pub const DEFAULT_SERVICE: &'static str = "13373";

    /// Wait for all processes in the cluster to reach this point of the
    /// code, using the given TCP service.
    ///
    /// ## Synchronization scheme
    ///
    /// The process with rank 0 listens on the given service. All other
    /// processes connect to it, retrying until it is up. Once rank 0 has
    /// accepted all connections, it sends one byte to every peer to let
    /// it proceed.
    pub fn wait_on_service(cluster: &Cluster, service: &str) -> Result<(), BarrierError> {
        if cluster.rank() == 0 {
            let listener = listen_on(service)?;

            let mut streams = Vec::with_capacity(cluster.size() - 1);
            for _ in 1..cluster.size() {
                streams.push(listener.accept().map_err(EstablishError::Accept)?.0);
            }

            for mut stream in streams {
                write_full(&mut stream, &[0u8])?;
            }
        } else {
            let host = &cluster.peers()[0];
            let conn = Connecter::connect_with_retry(host, service, Duration::from_millis(100))?;

            let mut stream = conn.into_stream();
            let mut buf = [0u8; 1];
            if read_full(&mut stream, &mut buf)? != 1 {
                return Err(BarrierError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "barrier channel closed before release",
                )));
            }
        }
        Ok(())
    }

    /// Wait for all processes in the cluster to reach this point of the
    /// code, using the default TCP service.
    pub fn wait(cluster: &Cluster) -> Result<(), BarrierError> {
        Self::wait_on_service(cluster, Self::DEFAULT_SERVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::listen_on;
    use std::thread;

    #[test]
    fn test_barrier_releases_all_ranks() {
        // Reserve a free service for the rendezvous.
        let probe = listen_on("0").unwrap();
        let service = probe.local_addr().unwrap().port().to_string();
        drop(probe);

        let peers = vec!["127.0.0.1".to_owned(); 3];
        let mut workers = Vec::new();
        for rank in 0..3 {
            let peers = peers.clone();
            let service = service.clone();
            workers.push(thread::spawn(move || {
                let cluster = Cluster::new(peers, rank).unwrap();
                Barrier::wait_on_service(&cluster, &service).unwrap();
            }));
        }

        for worker in workers {
            worker.join().unwrap();
        }
    }
}
