//! Protocol decoding
//!
//! The UDP decode pipeline: checksum arithmetic, pseudo-header
//! construction, and header/payload parsing.

pub mod checksum;
pub mod pseudo_header;
pub mod udp;

pub use pseudo_header::{AddressFamily, PseudoHeader, PseudoHeaderInput};
pub use udp::{parse, ParsedPacket, Protocol, UdpHeader};
