//! UDP pseudo-header - RFC 768 / RFC 8200
//!
//! IP-layer context (addresses, protocol, UDP length) assembled purely for
//! checksum computation; never transmitted on the wire.

use crate::{Error, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IPv4 pseudo-header size (RFC 768)
pub const V4_SIZE: usize = 12;

/// IPv6 pseudo-header size (RFC 8200 section 8.1)
pub const V6_SIZE: usize = 40;

/// Caller-supplied pseudo-header descriptor.
///
/// Addresses are raw bytes as extracted from the IP header: 4 bytes for
/// IPv4, 16 for IPv6. `length` is the UDP length as known to the IP layer;
/// it feeds the checksum arithmetic and is not checked against the UDP
/// header's own length field.
#[derive(Debug, Clone, Copy)]
pub struct PseudoHeaderInput<'a> {
    pub source_ip: &'a [u8],
    pub destination_ip: &'a [u8],
    pub protocol: u8,
    pub length: u16,
}

/// Address family of a pseudo-header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format-tagged pseudo-header, selected once at construction by address
/// byte-length. Checksum arithmetic downstream operates on the serialized
/// byte view and is family-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoHeader {
    V4 {
        source_ip: Ipv4Addr,
        destination_ip: Ipv4Addr,
        protocol: u8,
        length: u16,
    },
    V6 {
        source_ip: Ipv6Addr,
        destination_ip: Ipv6Addr,
        protocol: u8,
        length: u16,
    },
}

impl PseudoHeader {
    /// Build from the caller descriptor.
    ///
    /// 4-byte addresses select IPv4, 16-byte addresses IPv6. Any other
    /// length, or a family mismatch between source and destination, is a
    /// caller contract violation and is rejected.
    pub fn build(input: &PseudoHeaderInput<'_>) -> Result<Self> {
        match (input.source_ip.len(), input.destination_ip.len()) {
            (4, 4) => {
                let src: [u8; 4] = input.source_ip.try_into().unwrap();
                let dst: [u8; 4] = input.destination_ip.try_into().unwrap();
                Ok(PseudoHeader::V4 {
                    source_ip: Ipv4Addr::from(src),
                    destination_ip: Ipv4Addr::from(dst),
                    protocol: input.protocol,
                    length: input.length,
                })
            }
            (16, 16) => {
                let src: [u8; 16] = input.source_ip.try_into().unwrap();
                let dst: [u8; 16] = input.destination_ip.try_into().unwrap();
                Ok(PseudoHeader::V6 {
                    source_ip: Ipv6Addr::from(src),
                    destination_ip: Ipv6Addr::from(dst),
                    protocol: input.protocol,
                    length: input.length,
                })
            }
            (source_len, destination_len) => Err(Error::InvalidAddressFamily {
                source_len,
                destination_len,
            }),
        }
    }

    /// Address family tag ("IPv4" / "IPv6" via `as_str`)
    pub fn family(&self) -> AddressFamily {
        match self {
            PseudoHeader::V4 { .. } => AddressFamily::V4,
            PseudoHeader::V6 { .. } => AddressFamily::V6,
        }
    }

    /// Source address from the IP header
    pub fn source_ip(&self) -> IpAddr {
        match self {
            PseudoHeader::V4 { source_ip, .. } => IpAddr::V4(*source_ip),
            PseudoHeader::V6 { source_ip, .. } => IpAddr::V6(*source_ip),
        }
    }

    /// Destination address from the IP header
    pub fn destination_ip(&self) -> IpAddr {
        match self {
            PseudoHeader::V4 { destination_ip, .. } => IpAddr::V4(*destination_ip),
            PseudoHeader::V6 { destination_ip, .. } => IpAddr::V6(*destination_ip),
        }
    }

    /// IP protocol number (17 for UDP)
    pub fn protocol(&self) -> u8 {
        match self {
            PseudoHeader::V4 { protocol, .. } | PseudoHeader::V6 { protocol, .. } => *protocol,
        }
    }

    /// UDP length as declared at the IP layer
    pub fn length(&self) -> u16 {
        match self {
            PseudoHeader::V4 { length, .. } | PseudoHeader::V6 { length, .. } => *length,
        }
    }

    /// Serialize to the canonical checksum layout.
    ///
    /// IPv4 (12 bytes, RFC 768):
    /// ```text
    /// +--------+--------+--------+--------+
    /// |          Source Address           |
    /// +--------+--------+--------+--------+
    /// |        Destination Address        |
    /// +--------+--------+--------+--------+
    /// |  Zero  |Protocol|   UDP Length    |
    /// +--------+--------+--------+--------+
    /// ```
    ///
    /// IPv6 (40 bytes, RFC 8200 section 8.1): source and destination
    /// addresses, 32-bit upper-layer length, three zero bytes, next header.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PseudoHeader::V4 {
                source_ip,
                destination_ip,
                protocol,
                length,
            } => {
                let mut bytes = Vec::with_capacity(V4_SIZE);
                bytes.extend_from_slice(&source_ip.octets());
                bytes.extend_from_slice(&destination_ip.octets());
                bytes.push(0);
                bytes.push(*protocol);
                bytes.extend_from_slice(&length.to_be_bytes());
                bytes
            }
            PseudoHeader::V6 {
                source_ip,
                destination_ip,
                protocol,
                length,
            } => {
                let mut bytes = Vec::with_capacity(V6_SIZE);
                bytes.extend_from_slice(&source_ip.octets());
                bytes.extend_from_slice(&destination_ip.octets());
                bytes.extend_from_slice(&(*length as u32).to_be_bytes());
                bytes.extend_from_slice(&[0, 0, 0]);
                bytes.push(*protocol);
                bytes
            }
        }
    }
}
