//! Reliable full-length stream I/O.
//!
//! Stream sockets may transfer fewer bytes than requested per call,
//! especially under load or with large payloads. Every protocol
//! operation in this crate goes through the two primitives here so that
//! no caller ever observes partial, unprocessed state.

use std::io::{self, ErrorKind, Read, Write};

/// Read exactly `buf.len()` bytes from `r`, unless the stream ends first.
///
/// The underlying read is repeated until the buffer is filled or the
/// peer closes the stream, whichever comes first. A read interrupted by
/// a signal is retried transparently. Any other error fails the whole
/// call; the partially filled buffer must then be discarded.
///
/// Returns the number of bytes actually read: `buf.len()` on normal
/// success, less only if the stream ended early.
pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut nread = 0;
    while nread < buf.len() {
        match r.read(&mut buf[nread..]) {
            Ok(0) => break,
            Ok(n) => nread += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(nread)
}

/// Write all of `buf` into `w`.
///
/// The underlying write is repeated until every byte has been accepted.
/// A write interrupted by a signal is retried transparently; a sink
/// that accepts zero bytes fails with [`ErrorKind::WriteZero`]. On
/// success the return value is exactly `buf.len()`; there is no short
/// count except through an error.
pub fn write_full<W: Write>(w: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut nwritten = 0;
    while nwritten < buf.len() {
        match w.write(&buf[nwritten..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "stream refused to accept more bytes",
                ))
            }
            Ok(n) => nwritten += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(nwritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Forwards at most `chunk` bytes per call and fails every other
    /// call with `Interrupted`.
    struct Choppy<T> {
        inner: T,
        chunk: usize,
        tick: bool,
    }

    impl<T> Choppy<T> {
        fn new(inner: T, chunk: usize) -> Self {
            Self {
                inner,
                chunk,
                tick: false,
            }
        }
    }

    impl<R: Read> Read for Choppy<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.tick = !self.tick;
            if self.tick {
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = self.chunk.min(buf.len());
            self.inner.read(&mut buf[..n])
        }
    }

    impl<W: Write> Write for Choppy<W> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tick = !self.tick;
            if self.tick {
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = self.chunk.min(buf.len());
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn test_round_trip() {
        let (mut tx, mut rx) = loopback_pair();
        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();

        let sent = payload.clone();
        let writer = thread::spawn(move || write_full(&mut tx, &sent).unwrap());

        let mut buf = vec![0u8; payload.len()];
        assert_eq!(read_full(&mut rx, &mut buf).unwrap(), payload.len());
        assert_eq!(writer.join().unwrap(), payload.len());
        assert_eq!(buf, payload);
    }

    #[test]
    fn test_zero_length() {
        let (mut tx, mut rx) = loopback_pair();
        assert_eq!(write_full(&mut tx, &[]).unwrap(), 0);
        assert_eq!(read_full(&mut rx, &mut []).unwrap(), 0);
    }

    #[test]
    fn test_short_read_on_eof() {
        let (mut tx, mut rx) = loopback_pair();
        write_full(&mut tx, &[0xAB; 6]).unwrap();
        drop(tx);

        let mut buf = [0u8; 16];
        assert_eq!(read_full(&mut rx, &mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], &[0xAB; 6]);
    }

    #[test]
    fn test_read_retries_after_interrupt() {
        let data = vec![7u8; 40];
        let mut r = Choppy::new(Cursor::new(data.clone()), 3);
        let mut buf = [0u8; 40];
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 40);
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_write_retries_after_interrupt() {
        let mut w = Choppy::new(Vec::new(), 5);
        let data = [0x5Au8; 33];
        assert_eq!(write_full(&mut w, &data).unwrap(), 33);
        assert_eq!(&w.inner[..], &data[..]);
    }

    #[test]
    fn test_write_zero_is_an_error() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_full(&mut Full, &[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
    }
}
