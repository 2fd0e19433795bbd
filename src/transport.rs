//! TCP connection establishment for control and data channels.
//!
//! One attempt per resolved address, in resolver order. No pooling, no
//! keep-alive, no retry and no timeout beyond what the OS applies.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{FtpError, Result};

/// Resolve `host` (DNS name or literal address) and connect to the first
/// address that accepts. Sockets from failed attempts are dropped.
pub fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let target = format!("{host}:{port}");
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| FtpError::Connect {
            target: target.clone(),
            source,
        })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                // Command lines are tiny; don't let Nagle hold them back
                let _ = stream.set_nodelay(true);
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(FtpError::Connect {
        target,
        source: last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn connects_to_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = connect("127.0.0.1", port).unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[test]
    fn refused_port_is_a_connect_error() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        match connect("127.0.0.1", port) {
            Err(FtpError::Connect { target, .. }) => assert_eq!(target, format!("127.0.0.1:{port}")),
            other => panic!("expected connect error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unresolvable_host_is_a_connect_error() {
        assert!(matches!(
            connect("no-such-host.invalid", 21),
            Err(FtpError::Connect { .. })
        ));
    }
}
