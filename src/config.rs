//! Descriptor files
//!
//! A descriptor is a small TOML document carrying the IP-layer context a
//! capture file cannot provide on its own: the addresses and protocol
//! number that go into the checksum pseudo-header.

use crate::protocol::udp::PROTOCOL_NUMBER;
use crate::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use tracing::warn;

/// Pseudo-header context for a decode session
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub source_ip: IpAddr,
    pub destination_ip: IpAddr,
    /// IP protocol number carried in the pseudo-header
    #[serde(default = "default_protocol")]
    pub protocol: u8,
    /// Pseudo-header length override; the datagram's declared length when
    /// absent
    pub length: Option<u16>,
}

fn default_protocol() -> u8 {
    PROTOCOL_NUMBER
}

impl Descriptor {
    /// Source address as raw network-order octets (4 or 16 bytes)
    pub fn source_octets(&self) -> Vec<u8> {
        ip_octets(self.source_ip)
    }

    /// Destination address as raw network-order octets (4 or 16 bytes)
    pub fn destination_octets(&self) -> Vec<u8> {
        ip_octets(self.destination_ip)
    }

    /// Check that the descriptor describes a usable pseudo-header
    pub fn validate(&self) -> Result<()> {
        if self.source_ip.is_ipv4() != self.destination_ip.is_ipv4() {
            return Err(Error::Config(format!(
                "source_ip ({}) and destination_ip ({}) are different address families",
                self.source_ip, self.destination_ip
            )));
        }
        if self.protocol != PROTOCOL_NUMBER {
            warn!(
                "descriptor: protocol {} is not UDP ({})",
                self.protocol, PROTOCOL_NUMBER
            );
        }
        Ok(())
    }
}

fn ip_octets(ip: IpAddr) -> Vec<u8> {
    match ip {
        IpAddr::V4(addr) => addr.octets().to_vec(),
        IpAddr::V6(addr) => addr.octets().to_vec(),
    }
}

/// Load a descriptor from a TOML file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Descriptor> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let descriptor: Descriptor =
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
    descriptor.validate()?;
    Ok(descriptor)
}
