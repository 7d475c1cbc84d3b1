//! Type aliases for the identifiers carried through the bootstrap.

/// Local identifier (LID) is a [`u16`] that identifies a port on a switch or an HCA in the cluster.
pub type Lid = u16;

/// QP number (QPN) is a [`u32`] that identifies a local queue pair.
pub type Qpn = u32;

/// Remote key (RKey) is a [`u32`] that identifies a remote memory region.
pub type RKey = u32;

/// Rank is a [`u32`] ordinal that identifies a peer's position in a multi-party exchange.
pub type Rank = u32;
