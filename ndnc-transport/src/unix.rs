//! Unix-domain stream transport.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;

use log::{debug, trace};

use crate::framing::{ElementFramer, MAX_ELEMENT_SIZE};
use crate::{Transport, TransportError};

/// Forwarder socket used when a URI names no path.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/nfd.sock";

pub struct UnixTransport {
    stream: Option<UnixStream>,
    framer: ElementFramer,
    paused: bool,
}

impl UnixTransport {
    pub fn new() -> Self {
        Self {
            stream: None,
            framer: ElementFramer::new(),
            paused: false,
        }
    }

    /// Connect to the socket at `path`.
    pub fn connect(&mut self, path: &str) -> Result<(), TransportError> {
        let stream = UnixStream::connect(path)?;
        debug!("connected to unix socket {}", path);
        self.stream = Some(stream);
        Ok(())
    }

    /// Create a connected transport from a `unix://` URI, falling back
    /// to the well-known forwarder socket when the URI has no path.
    pub fn create(uri: &str) -> Result<Self, TransportError> {
        let mut transport = Self::new();
        transport.connect_uri(uri)?;
        Ok(transport)
    }
}

fn socket_path_from_uri(uri: &str) -> Result<String, TransportError> {
    let path = uri
        .strip_prefix("unix://")
        .ok_or_else(|| TransportError::InvalidUri(uri.to_string()))?;
    if path.is_empty() {
        Ok(DEFAULT_SOCKET_PATH.to_string())
    } else {
        Ok(path.to_string())
    }
}

impl Transport for UnixTransport {
    fn connect_uri(&mut self, uri: &str) -> Result<(), TransportError> {
        let path = socket_path_from_uri(uri)?;
        self.connect(&path)
    }

    fn send(&mut self, wire: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(wire)?;
        trace!("sent {} bytes", wire.len());
        Ok(())
    }

    fn send_with_header(&mut self, header: &[u8], payload: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.write_all(header)?;
        stream.write_all(payload)?;
        trace!("sent {} + {} bytes", header.len(), payload.len());
        Ok(())
    }

    fn receive(&mut self, on_element: &mut dyn FnMut(&[u8])) -> Result<usize, TransportError> {
        if self.paused {
            return Ok(0);
        }
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let mut chunk = [0u8; MAX_ELEMENT_SIZE];
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(TransportError::Closed);
        }
        self.framer.push(&chunk[..read]);
        let mut delivered = 0;
        while let Some(element) = self.framer.next_element()? {
            on_element(&element);
            delivered += 1;
        }
        Ok(delivered)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(stream) = self.stream.take() {
            stream.shutdown(Shutdown::Both)?;
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Default for UnixTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::thread;

    #[test]
    fn test_socket_path_from_uri() {
        assert_eq!(
            socket_path_from_uri("unix:///run/ndn/nfd.sock").unwrap(),
            "/run/ndn/nfd.sock"
        );
        assert_eq!(
            socket_path_from_uri("unix://").unwrap(),
            DEFAULT_SOCKET_PATH
        );
        assert!(matches!(
            socket_path_from_uri("tcp://localhost"),
            Err(TransportError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_send_and_receive_elements() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let read = peer.read(&mut buf).unwrap();
            assert_eq!(&buf[..read], &[0x08, 0x01, 0x61]);
            // reply with two elements in two writes splitting the second
            peer.write_all(&[0x08, 0x01, 0x62, 0x08]).unwrap();
            peer.write_all(&[0x01, 0x63]).unwrap();
        });

        // connect through the trait, as a face holding `dyn Transport` would
        let mut transport = UnixTransport::new();
        let uri = format!("unix://{}", path.display());
        Transport::connect_uri(&mut transport, &uri).unwrap();
        transport.send(&[0x08, 0x01, 0x61]).unwrap();

        let mut elements = Vec::new();
        while elements.len() < 2 {
            transport
                .receive(&mut |element| elements.push(element.to_vec()))
                .unwrap();
        }
        assert_eq!(elements, vec![vec![0x08, 0x01, 0x62], vec![0x08, 0x01, 0x63]]);

        server.join().unwrap();
        transport.close().unwrap();
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_paused_transport_delivers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pause.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            peer.write_all(&[0x08, 0x01, 0x61]).unwrap();
            peer
        });

        let mut transport = UnixTransport::new();
        transport.connect(path.to_str().unwrap()).unwrap();
        transport.pause();
        let delivered = transport.receive(&mut |_| panic!("paused")).unwrap();
        assert_eq!(delivered, 0);

        transport.resume();
        let mut elements = Vec::new();
        transport
            .receive(&mut |element| elements.push(element.to_vec()))
            .unwrap();
        assert_eq!(elements, vec![vec![0x08, 0x01, 0x61]]);
        drop(server.join().unwrap());
    }

    #[test]
    fn test_send_without_connection_fails() {
        let mut transport = UnixTransport::new();
        assert!(matches!(
            transport.send(&[0x08, 0x00]),
            Err(TransportError::NotConnected)
        ));
    }
}
