//! The handshake wire protocol.
//!
//! Two fixed-size records travel over the control channel. Neither has a
//! length prefix or any framing: the record size is a compile-time
//! constant known to both peers.
//!
//! | Record | Field | Width | Byte order on wire |
//! |---|---|---|---|
//! | [`QueuePairInfo`] | `lid` | 16-bit | network (big-endian) |
//! | [`QueuePairInfo`] | `qp_num` | 32-bit | network (big-endian) |
//! | [`QueuePairInfo`] | `rank` | 32-bit | network (big-endian) |
//! | [`MemoryRegionInfo`] | `addr` | 64-bit | sender-native |
//! | [`MemoryRegionInfo`] | `len` | 64-bit | sender-native |
//! | [`MemoryRegionInfo`] | `rkey` | 32-bit | sender-native |
//!
//! The protocol imposes no sequencing: records may be exchanged in any
//! order and cardinality the application chooses. There is no version
//! negotiation, no acknowledgement, and no retransmission beyond what
//! [`read_full`]/[`write_full`] already provide.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::{read_full, write_full};
use crate::types::*;

/// Handshake protocol error type.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The underlying stream failed for a reason other than an
    /// interrupted call.
    #[error("control stream I/O failed")]
    Io(#[from] io::Error),

    /// The stream transferred fewer bytes than one full record: the peer
    /// closed early or the stream is corrupted. The connection is
    /// unusable afterwards and must be re-established.
    #[error("record truncated: {got} of {expected} bytes")]
    Truncated { got: usize, expected: usize },
}

/// One peer's queue pair identity: its subnet-local identifier, its
/// queue pair number, and its rank in the exchange.
///
/// The RDMA setup layer populates this immediately before a send;
/// receives populate a fresh value for the caller. Zero-valued `lid` and
/// `qp_num` are valid "null" placeholders, so receivers must not assume
/// them away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePairInfo {
    /// Subnet-local identifier of the peer's RDMA port.
    pub lid: Lid,
    /// Queue pair number.
    pub qp_num: Qpn,
    /// The peer's ordinal in the exchange.
    pub rank: Rank,
}

impl QueuePairInfo {
    /// Size of the record on the wire: fixed-width fields in a fixed
    /// order, no padding.
    pub const WIRE_LEN: usize = 10;

    /// Create a new queue pair record.
    pub fn new(lid: Lid, qp_num: Qpn, rank: Rank) -> Self {
        Self { lid, qp_num, rank }
    }

    fn to_wire(self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0..2].copy_from_slice(&self.lid.to_be_bytes());
        buf[2..6].copy_from_slice(&self.qp_num.to_be_bytes());
        buf[6..10].copy_from_slice(&self.rank.to_be_bytes());
        buf
    }

    fn from_wire(buf: [u8; Self::WIRE_LEN]) -> Self {
        Self {
            lid: Lid::from_be_bytes(buf[0..2].try_into().unwrap()),
            qp_num: Qpn::from_be_bytes(buf[2..6].try_into().unwrap()),
            rank: Rank::from_be_bytes(buf[6..10].try_into().unwrap()),
        }
    }
}

/// A remotely accessible memory window: base address, size in bytes, and
/// the key the remote peer must present to read or write it.
///
/// This record contains remote memory region information only and holds
/// no local RDMA resources.
///
/// Unlike [`QueuePairInfo`], this record travels in the **sender's
/// native byte order**, field bytes unconverted. That matches the
/// original wire format, which assumed all peers share one endianness;
/// a mixed-endianness deployment will decode garbage. Converting these
/// fields to network order would break every peer speaking the current
/// format, so it would have to be a versioned, opt-in format change
/// rather than a quiet fix here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegionInfo {
    /// Base address of the remote window.
    pub addr: u64,
    /// Size of the window in bytes.
    pub len: u64,
    /// Key the remote peer must present to access the window.
    pub rkey: RKey,
}

impl MemoryRegionInfo {
    /// Size of the record on the wire: fixed-width fields in a fixed
    /// order, no padding.
    pub const WIRE_LEN: usize = 20;

    /// Create a new piece of remote memory region data.
    pub fn new(addr: u64, len: u64, rkey: RKey) -> Self {
        Self { addr, len, rkey }
    }

    /// Create a dummy record that can be used as a placeholder.
    pub fn dummy() -> Self {
        Self::new(0, 0, 0)
    }

    fn to_wire(self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0..8].copy_from_slice(&self.addr.to_ne_bytes());
        buf[8..16].copy_from_slice(&self.len.to_ne_bytes());
        buf[16..20].copy_from_slice(&self.rkey.to_ne_bytes());
        buf
    }

    fn from_wire(buf: [u8; Self::WIRE_LEN]) -> Self {
        Self {
            addr: u64::from_ne_bytes(buf[0..8].try_into().unwrap()),
            len: u64::from_ne_bytes(buf[8..16].try_into().unwrap()),
            rkey: RKey::from_ne_bytes(buf[16..20].try_into().unwrap()),
        }
    }
}

/// Send a queue pair record over the control channel.
///
/// `lid` is sent as a network-order 16-bit value, `qp_num` and `rank` as
/// network-order 32-bit values.
pub fn send_queue_pair_info<W: Write>(
    stream: &mut W,
    info: &QueuePairInfo,
) -> Result<(), ProtocolError> {
    let record = info.to_wire();
    let n = write_full(stream, &record)?;
    if n != QueuePairInfo::WIRE_LEN {
        return Err(ProtocolError::Truncated {
            got: n,
            expected: QueuePairInfo::WIRE_LEN,
        });
    }
    Ok(())
}

/// Receive a queue pair record from the control channel.
pub fn recv_queue_pair_info<R: Read>(stream: &mut R) -> Result<QueuePairInfo, ProtocolError> {
    let mut record = [0u8; QueuePairInfo::WIRE_LEN];
    let n = read_full(stream, &mut record)?;
    if n != QueuePairInfo::WIRE_LEN {
        return Err(ProtocolError::Truncated {
            got: n,
            expected: QueuePairInfo::WIRE_LEN,
        });
    }
    Ok(QueuePairInfo::from_wire(record))
}

/// Send a memory region record over the control channel.
///
/// All fields travel in the sender's native byte order; see
/// [`MemoryRegionInfo`] for the compatibility implications.
pub fn send_memory_region_info<W: Write>(
    stream: &mut W,
    info: &MemoryRegionInfo,
) -> Result<(), ProtocolError> {
    let record = info.to_wire();
    let n = write_full(stream, &record)?;
    if n != MemoryRegionInfo::WIRE_LEN {
        return Err(ProtocolError::Truncated {
            got: n,
            expected: MemoryRegionInfo::WIRE_LEN,
        });
    }
    Ok(())
}

/// Receive a memory region record from the control channel.
///
/// No byte-order conversion is applied; the record is meaningful only if
/// the sender shares this host's endianness.
pub fn recv_memory_region_info<R: Read>(stream: &mut R) -> Result<MemoryRegionInfo, ProtocolError> {
    let mut record = [0u8; MemoryRegionInfo::WIRE_LEN];
    let n = read_full(stream, &mut record)?;
    if n != MemoryRegionInfo::WIRE_LEN {
        return Err(ProtocolError::Truncated {
            got: n,
            expected: MemoryRegionInfo::WIRE_LEN,
        });
    }
    Ok(MemoryRegionInfo::from_wire(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qp_info_round_trip() {
        let cases = [
            QueuePairInfo::new(0, 0, 0),
            QueuePairInfo::new(7, 1000, 0),
            QueuePairInfo::new(1, 2, 3),
            QueuePairInfo::new(Lid::MAX, Qpn::MAX, Rank::MAX),
        ];

        for info in cases {
            let mut wire = Vec::new();
            send_queue_pair_info(&mut wire, &info).unwrap();
            assert_eq!(wire.len(), QueuePairInfo::WIRE_LEN);

            let got = recv_queue_pair_info(&mut wire.as_slice()).unwrap();
            assert_eq!(got, info);
        }
    }

    #[test]
    fn test_qp_info_wire_is_big_endian() {
        let info = QueuePairInfo::new(0x1234, 0xDEAD_BEEF, 0x0102_0304);
        let mut wire = Vec::new();
        send_queue_pair_info(&mut wire, &info).unwrap();

        assert_eq!(
            wire,
            [0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_mr_info_round_trip() {
        let cases = [
            MemoryRegionInfo::dummy(),
            MemoryRegionInfo::new(0x7F00_DEAD_0000, 4096, 0x77),
            MemoryRegionInfo::new(u64::MAX, u64::MAX, RKey::MAX),
        ];

        for info in cases {
            let mut wire = Vec::new();
            send_memory_region_info(&mut wire, &info).unwrap();
            assert_eq!(wire.len(), MemoryRegionInfo::WIRE_LEN);

            let got = recv_memory_region_info(&mut wire.as_slice()).unwrap();
            assert_eq!(got, info);
        }
    }

    #[test]
    fn test_mr_info_wire_is_native_endian() {
        // Pins the endianness quirk: the record is the raw native-order
        // field bytes, so it only decodes correctly on a same-endian
        // peer. Do not "fix" this without versioning the format.
        let info = MemoryRegionInfo::new(0x1122_3344_5566_7788, 0x99AA, 0xBBCC_DDEE);
        let mut wire = Vec::new();
        send_memory_region_info(&mut wire, &info).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&info.addr.to_ne_bytes());
        expected.extend_from_slice(&info.len.to_ne_bytes());
        expected.extend_from_slice(&info.rkey.to_ne_bytes());
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_recv_truncated_record() {
        let info = QueuePairInfo::new(9, 9, 9);
        let mut wire = Vec::new();
        send_queue_pair_info(&mut wire, &info).unwrap();

        let err = recv_queue_pair_info(&mut &wire[..4]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Truncated {
                got: 4,
                expected: QueuePairInfo::WIRE_LEN,
            }
        ));
    }

    #[test]
    fn test_send_into_dead_sink() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = send_queue_pair_info(&mut Full, &QueuePairInfo::new(1, 2, 3)).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
