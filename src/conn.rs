//! Control-channel connection establishment.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use thiserror::Error;

/// Connection establishment error type.
#[derive(Debug, Error)]
pub enum EstablishError {
    /// The service or host/service pair could not be resolved into any
    /// candidate address.
    #[error("failed to resolve {0}")]
    Resolution(String, #[source] io::Error),

    /// Every resolved candidate address was tried and binding failed on
    /// all of them. Carries the error of the last attempt.
    #[error("cannot bind to any local address for service {0}")]
    Bind(String, #[source] io::Error),

    /// Every resolved candidate address was tried and connecting failed
    /// on all of them. Carries the error of the last attempt.
    #[error("cannot connect to {0}")]
    Connect(String, #[source] io::Error),

    /// Accepting a peer connection on a bound listener failed.
    #[error("failed to accept a peer connection")]
    Accept(#[source] io::Error),
}

/// Parse a service string into a TCP port.
///
/// Only numeric services are supported: `std::net` has no access to the
/// system services database, so names like `"http"` are rejected here.
fn resolve_service(service: &str) -> Result<u16, EstablishError> {
    service.parse().map_err(|_| {
        EstablishError::Resolution(
            service.to_owned(),
            io::Error::new(io::ErrorKind::InvalidInput, "service is not a numeric port"),
        )
    })
}

/// Open a listening socket for the given service on a wildcard local
/// address.
///
/// The wildcard candidates (IPv4 any, then IPv6 any) are tried in order
/// and the first successful bind wins; the socket of a rejected
/// candidate is closed as it goes out of scope. The returned listener
/// already has its backlog armed ([`TcpListener::bind`] both binds and
/// listens); accepting connections remains the caller's responsibility.
pub fn listen_on(service: &str) -> Result<TcpListener, EstablishError> {
    let port = resolve_service(service)?;
    let candidates = [
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
    ];

    let mut last_err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate addresses");
    for addr in candidates {
        match TcpListener::bind(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                log::debug!("bind to {} failed: {}", addr, e);
                last_err = e;
            }
        }
    }
    Err(EstablishError::Bind(service.to_owned(), last_err))
}

/// Connect to the given host and service.
///
/// The pair is resolved into one or more candidate remote addresses,
/// which are tried in resolver order; the first successful connection
/// wins. The socket of a failed candidate and the resolved address list
/// are released on every path, success or failure.
pub fn connect_to(host: &str, service: &str) -> Result<TcpStream, EstablishError> {
    let port = resolve_service(service)?;
    let spec = format!("{}:{}", host, port);

    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| EstablishError::Resolution(spec.clone(), e))?
        .collect();
    if candidates.is_empty() {
        return Err(EstablishError::Resolution(
            spec,
            io::Error::new(io::ErrorKind::AddrNotAvailable, "resolver returned no addresses"),
        ));
    }

    let mut last_err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate addresses");
    for addr in candidates {
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                log::debug!("connect to {} failed: {}", addr, e);
                last_err = e;
            }
        }
    }
    Err(EstablishError::Connect(spec, last_err))
}
