//! TCP stream transport.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use log::{debug, trace};

use crate::framing::{ElementFramer, MAX_ELEMENT_SIZE};
use crate::{Transport, TransportError};

/// Forwarder port used when a URI names no port.
pub const DEFAULT_PORT: u16 = 6363;

pub struct TcpTransport {
    stream: Option<TcpStream>,
    framer: ElementFramer,
    paused: bool,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            stream: None,
            framer: ElementFramer::new(),
            paused: false,
        }
    }

    /// Connect to `host:port`.
    pub fn connect(&mut self, addr: impl ToSocketAddrs) -> Result<(), TransportError> {
        let stream = TcpStream::connect(addr)?;
        debug!("connected to tcp endpoint {:?}", stream.peer_addr());
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Create a connected transport from a `tcp://host[:port]` URI,
    /// falling back to the well-known forwarder port.
    pub fn create(uri: &str) -> Result<Self, TransportError> {
        let mut transport = Self::new();
        transport.connect_uri(uri)?;
        Ok(transport)
    }
}

fn endpoint_from_uri(uri: &str) -> Result<(String, u16), TransportError> {
    let authority = uri
        .strip_prefix("tcp://")
        .ok_or_else(|| TransportError::InvalidUri(uri.to_string()))?;
    if authority.is_empty() {
        return Err(TransportError::InvalidUri(uri.to_string()));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| TransportError::InvalidUri(uri.to_string()))?;
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), DEFAULT_PORT)),
    }
}

impl Transport for TcpTransport {
    fn connect_uri(&mut self, uri: &str) -> Result<(), TransportError> {
        let (host, port) = endpoint_from_uri(uri)?;
        self.connect((host.as_str(), port))
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

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}
