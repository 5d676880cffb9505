//! Stream transports for NDN-TLV elements.
//!
//! The codec core only produces and consumes raw byte buffers; this
//! crate moves those buffers over a stream-oriented socket and cuts
//! the received stream back into whole TLV elements. Calls are
//! blocking; the caller owns any threading.

use std::io;

pub mod framing;
pub mod tcp;
pub mod unix;

pub use framing::{ElementFramer, FramingError, MAX_ELEMENT_SIZE};
pub use tcp::TcpTransport;
pub use unix::UnixTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
    #[error("connection closed by peer")]
    Closed,
    #[error("invalid transport URI: {0}")]
    InvalidUri(String),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A connected stream endpoint carrying TLV elements.
pub trait Transport {
    /// Connect (or reconnect) to the endpoint named by a scheme URI
    /// such as `unix:///run/nfd.sock` or `tcp://router:6363`.
    fn connect_uri(&mut self, uri: &str) -> Result<(), TransportError>;

    /// Send one encoded element.
    fn send(&mut self, wire: &[u8]) -> Result<(), TransportError>;

    /// Send an element prefixed by a separately encoded header, as
    /// one contiguous write sequence.
    fn send_with_header(&mut self, header: &[u8], payload: &[u8]) -> Result<(), TransportError>;

    /// Block until bytes arrive, then deliver every complete TLV
    /// element to `on_element`. Returns the number of elements
    /// delivered; returns 0 immediately while paused.
    fn receive(&mut self, on_element: &mut dyn FnMut(&[u8])) -> Result<usize, TransportError>;

    /// Shut down the connection.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Stop delivering received elements until `resume`.
    fn pause(&mut self);

    fn resume(&mut self);

    fn is_connected(&self) -> bool;
}
