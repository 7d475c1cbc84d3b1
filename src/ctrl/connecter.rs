//! Role-oriented builders for the control channel.

use std::net::TcpStream;
use std::time::Duration;

use crate::conn::{connect_to, listen_on, EstablishError};
use crate::proto::{
    recv_memory_region_info, recv_queue_pair_info, send_memory_region_info,
    send_queue_pair_info, MemoryRegionInfo, ProtocolError, QueuePairInfo,
};

/// Which side of the control channel this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listens and accepts; sends first in exchanges.
    Server,
    /// Dials; receives first in exchanges.
    Client,
}

/// Connection manager that bootstraps one remote peer.
///
/// A `Connecter` owns the established TCP stream and pushes or pulls the
/// handshake records over it. Each instance is used by exactly one
/// logical flow of control; callers that bootstrap several peers
/// concurrently run one `Connecter` per thread.
#[derive(Debug)]
pub struct Connecter {
    role: Role,
    stream: TcpStream,
}

impl Connecter {
    /// The default TCP port to use.
    pub const DEFAULT_PORT: u16 = 13337;

    /// Wait for one peer on the given service and accept it.
    ///
    /// This is the server side of the channel.
    pub fn listen(service: &str) -> Result<Self, EstablishError> {
        let listener = listen_on(service)?;
        let (stream, peer) = listener.accept().map_err(EstablishError::Accept)?;
        log::debug!("accepted control connection from {}", peer);
        Ok(Self {
            role: Role::Server,
            stream,
        })
    }

    /// Connect to a listening peer.
    ///
    /// This is the client side of the channel. Fails immediately if the
    /// peer is not reachable; see [`Connecter::connect_with_retry`] for
    /// the start-order-agnostic variant.
    pub fn connect(host: &str, service: &str) -> Result<Self, EstablishError> {
        let stream = connect_to(host, service)?;
        Ok(Self {
            role: Role::Client,
            stream,
        })
    }

    /// Connect to a listening peer, retrying until it is up.
    ///
    /// Peers generally start in an arbitrary order, so the dialer keeps
    /// knocking every `wait_on_failure` until the server side answers.
    /// There is no attempt limit; a caller that needs one applies an
    /// outer deadline. Resolution failures are returned immediately
    /// since retrying cannot repair a bad service string.
    pub fn connect_with_retry(
        host: &str,
        service: &str,
        wait_on_failure: Duration,
    ) -> Result<Self, EstablishError> {
        loop {
            match connect_to(host, service) {
                Ok(stream) => {
                    return Ok(Self {
                        role: Role::Client,
                        stream,
                    })
                }
                Err(e @ EstablishError::Resolution(..)) => return Err(e),
                Err(e) => log::debug!("peer not reachable yet: {}", e),
            }
            std::thread::sleep(wait_on_failure);
        }
    }

    /// Wrap an already established stream.
    ///
    /// Useful when the caller runs its own accept loop or wants to arm
    /// deadlines on the stream before handing it over.
    pub fn from_stream(stream: TcpStream, role: Role) -> Self {
        Self { role, stream }
    }

    /// The role this endpoint plays.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The underlying stream handle, e.g. for arming read/write
    /// deadlines before an exchange.
    #[inline]
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Consume the connecter and yield the underlying stream.
    #[inline]
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }

    /// Send the local queue pair record to the peer.
    pub fn send_queue_pair_info(&mut self, info: &QueuePairInfo) -> Result<(), ProtocolError> {
        send_queue_pair_info(&mut self.stream, info)
    }

    /// Receive the peer's queue pair record.
    pub fn recv_queue_pair_info(&mut self) -> Result<QueuePairInfo, ProtocolError> {
        recv_queue_pair_info(&mut self.stream)
    }

    /// Send a local memory region record to the peer.
    pub fn send_memory_region_info(&mut self, info: &MemoryRegionInfo) -> Result<(), ProtocolError> {
        send_memory_region_info(&mut self.stream, info)
    }

    /// Receive the peer's memory region record.
    pub fn recv_memory_region_info(&mut self) -> Result<MemoryRegionInfo, ProtocolError> {
        recv_memory_region_info(&mut self.stream)
    }

    /// Exchange queue pair records with the peer.
    ///
    /// The server sends first and the client receives first, so both
    /// sides may call this simultaneously.
    pub fn exchange_queue_pair_info(
        &mut self,
        local: &QueuePairInfo,
    ) -> Result<QueuePairInfo, ProtocolError> {
        match self.role {
            Role::Server => {
                self.send_queue_pair_info(local)?;
                self.recv_queue_pair_info()
            }
            Role::Client => {
                let peer = self.recv_queue_pair_info()?;
                self.send_queue_pair_info(local)?;
                Ok(peer)
            }
        }
    }

    /// Exchange memory region records with the peer.
    ///
    /// Same ordering rule as [`Connecter::exchange_queue_pair_info`].
    pub fn exchange_memory_region_info(
        &mut self,
        local: &MemoryRegionInfo,
    ) -> Result<MemoryRegionInfo, ProtocolError> {
        match self.role {
            Role::Server => {
                self.send_memory_region_info(local)?;
                self.recv_memory_region_info()
            }
            Role::Client => {
                let peer = self.recv_memory_region_info()?;
                self.send_memory_region_info(local)?;
                Ok(peer)
            }
        }
    }
}
