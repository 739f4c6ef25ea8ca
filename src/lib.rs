//! Udpscope - UDP datagram decoder
//!
//! Decodes a raw UDP datagram (header + payload) together with its IP-layer
//! pseudo-header context and verifies the RFC 768 Internet checksum. The
//! decode path is a pure, synchronous transformation: payloads are zero-copy
//! views into the caller's buffer, and a checksum mismatch is a successful
//! parse flagged through `checksum_valid`, not an error.

pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;

pub use error::{Error, Result};
pub use protocol::{
    parse, AddressFamily, ParsedPacket, Protocol, PseudoHeader, PseudoHeaderInput, UdpHeader,
};
