//! Cluster configuration for multi-peer bootstraps.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::connecter::Connecter;
use crate::conn::EstablishError;

/// Cluster configuration error type.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Reading the configuration file failed.
    #[error("cannot read cluster configuration")]
    Io(#[from] io::Error),

    /// The TOML configuration did not parse.
    #[error("bad TOML cluster configuration")]
    Toml(#[from] toml::de::Error),

    /// The JSON configuration did not parse.
    #[error("bad JSON cluster configuration")]
    Json(#[from] serde_json::Error),

    /// A rank does not fit the peer list.
    #[error("rank {rank} is out of bounds (size = {size})")]
    RankOutOfBounds { rank: usize, size: usize },

    /// Establishing a control channel to a peer failed.
    #[error(transparent)]
    Establish(#[from] EstablishError),
}

/// On-disk configuration shape shared by the TOML and JSON loaders.
#[derive(Debug, Deserialize)]
struct ClusterConfig {
    cluster: PeerSection,
}

#[derive(Debug, Deserialize)]
struct PeerSection {
    peers: Vec<String>,
}

/// Cluster information: the peer hostnames and this process's rank.
///
/// The rank is supplied by the caller (typically from the command line)
/// rather than guessed from local interfaces, so the same configuration
/// file can be shared by every node.
#[derive(Debug, Clone)]
pub struct Cluster {
    peers: Vec<String>,
    rank: usize,
}

impl Cluster {
    /// Create a cluster from a peer list and this process's rank.
    pub fn new(peers: Vec<String>, rank: usize) -> Result<Self, ClusterError> {
        if rank >= peers.len() {
            return Err(ClusterError::RankOutOfBounds {
                rank,
                size: peers.len(),
            });
        }
        Ok(Cluster { peers, rank })
    }

    /// Load the peer list from a TOML file:
    ///
    /// ```toml
    /// [cluster]
    /// peers = ["10.0.2.1", "10.0.2.2"]
    /// ```
    pub fn load_toml(path: impl AsRef<Path>, rank: usize) -> Result<Self, ClusterError> {
        let raw = fs::read_to_string(path)?;
        let config: ClusterConfig = toml::from_str(&raw)?;
        Self::new(config.cluster.peers, rank)
    }

    /// Load the peer list from a JSON file:
    ///
    /// ```json
    /// { "cluster": { "peers": ["10.0.2.1", "10.0.2.2"] } }
    /// ```
    pub fn load_json(path: impl AsRef<Path>, rank: usize) -> Result<Self, ClusterError> {
        let raw = fs::read_to_string(path)?;
        let config: ClusterConfig = serde_json::from_str(&raw)?;
        Self::new(config.cluster.peers, rank)
    }

    #[inline]
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    /// This process's rank.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of processes in the cluster.
    #[inline]
    pub fn size(&self) -> usize {
        self.peers.len()
    }

    /// The hostname of the peer with the given rank.
    #[inline]
    pub fn get(&self, rank: usize) -> Option<&str> {
        self.peers.get(rank).map(String::as_str)
    }

    /// Build a control channel to the peer with the given rank on the
    /// given TCP service.
    ///
    /// The side with the smaller rank dials and the side with the larger
    /// rank listens, so the two peers may call this simultaneously.
    /// Generally, the service must be vacant on both sides.
    pub fn connect_within(&self, with: usize, service: &str) -> Result<Connecter, ClusterError> {
        if with >= self.size() {
            return Err(ClusterError::RankOutOfBounds {
                rank: with,
                size: self.size(),
            });
        }
        assert_ne!(self.rank, with);

        let conn = if self.rank < with {
            Connecter::connect_with_retry(&self.peers[with], service, Duration::from_millis(200))?
        } else {
            Connecter::listen(service)?
        };
        Ok(conn)
    }
}
