//! Out-of-band bootstrap utilities for RDMA connections.
//!
//! Before two peers can exchange zero-copy RDMA traffic, each must learn
//! the other's queue pair number, local identifier, and remote memory
//! window. This crate provides the TCP control channel used for that
//! exchange: reliable full-length stream I/O ([`read_full`] /
//! [`write_full`]), connection establishment with fallback across
//! resolved candidate addresses ([`listen_on`] / [`connect_to`]), and a
//! fixed-format binary codec for the two metadata records
//! ([`QueuePairInfo`] and [`MemoryRegionInfo`]).
//!
//! Aside from the raw primitives, there are also some higher-level
//! connection management utilities in the [`ctrl`] mod. Most
//! commonly-used ones include role-oriented connection builders
//! ([`ctrl::Connecter`]), cluster configuration ([`ctrl::Cluster`]), and
//! distributed barriers ([`ctrl::Barrier`]).
//!
//! # Example
//!
//! ```no_run
//! use rdma_oob::{connect_to, recv_queue_pair_info, send_queue_pair_info, QueuePairInfo};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = connect_to("10.0.2.1", "13337")?;
//!
//!     let local = QueuePairInfo::new(17, 0x11_2233, 1);
//!     let remote = recv_queue_pair_info(&mut stream)?;
//!     send_queue_pair_info(&mut stream, &local)?;
//!
//!     println!("peer is QP {} at LID {}", remote.qp_num, remote.lid);
//!     Ok(())
//! }
//! ```
//!
//! ## Warning
//!
//! [`QueuePairInfo`] travels in network byte order, but
//! [`MemoryRegionInfo`] travels in the **sender's native byte order**.
//! The channel is only correct between peers of the same endianness; see
//! the [`MemoryRegionInfo`] docs before deploying on mixed hardware.

mod conn;
mod proto;
mod stream;
mod types;

pub use conn::{connect_to, listen_on, EstablishError};
pub use proto::{
    recv_memory_region_info, recv_queue_pair_info, send_memory_region_info,
    send_queue_pair_info, MemoryRegionInfo, ProtocolError, QueuePairInfo,
};
pub use stream::{read_full, write_full};
pub use types::*;

/// Connection management utilities.
pub mod ctrl;
