//! UDP datagram decoding - RFC 768
//!
//! Parses the fixed 8-byte header, slices the payload, and verifies the
//! Internet checksum against the caller-supplied pseudo-header.

use crate::protocol::checksum;
use crate::protocol::pseudo_header::{PseudoHeader, PseudoHeaderInput};
use crate::{Error, Result};
use std::fmt;
use tracing::{trace, warn};

/// UDP header size (fixed)
pub const HEADER_SIZE: usize = 8;

/// UDP protocol number for the pseudo-header
pub const PROTOCOL_NUMBER: u8 = 17;

/// Transport protocol tag carried in a parse result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded UDP header, fields converted from network byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    /// Source port (offset 0-1)
    pub source_port: u16,
    /// Destination port (offset 2-3)
    pub destination_port: u16,
    /// Total datagram length, header included (offset 4-5), >= 8
    pub length: u16,
    /// Checksum as transmitted (offset 6-7)
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse the fixed header and slice the payload.
    ///
    /// The buffer must cover the full declared length; bytes beyond it
    /// (link-layer padding) are ignored. Returns the decoded header and the
    /// zero-copy payload view `buffer[8..length]`.
    pub fn parse(buffer: &[u8]) -> Result<(Self, &[u8])> {
        if buffer.len() < HEADER_SIZE {
            // The declared length is reported when bytes 4-5 could be
            // read; never less than the header size itself, so the
            // diagnostic cannot claim an expectation the buffer meets.
            let declared = if buffer.len() >= 6 {
                u16::from_be_bytes([buffer[4], buffer[5]]) as usize
            } else {
                0
            };
            return Err(Error::IncompletePacket {
                expected: declared.max(HEADER_SIZE),
                actual: buffer.len(),
            });
        }

        let length = u16::from_be_bytes([buffer[4], buffer[5]]);
        if (length as usize) < HEADER_SIZE {
            return Err(Error::InvalidLength { declared: length });
        }
        if buffer.len() < length as usize {
            return Err(Error::IncompletePacket {
                expected: length as usize,
                actual: buffer.len(),
            });
        }

        let header = UdpHeader {
            source_port: u16::from_be_bytes([buffer[0], buffer[1]]),
            destination_port: u16::from_be_bytes([buffer[2], buffer[3]]),
            length,
            checksum: u16::from_be_bytes([buffer[6], buffer[7]]),
        };
        Ok((header, &buffer[HEADER_SIZE..length as usize]))
    }

    /// Wire representation of the header
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.source_port.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.destination_port.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.length.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.checksum.to_be_bytes());
        bytes
    }
}

/// Calculate the UDP checksum (RFC 768, RFC 1071): one's-complement sum
/// over the serialized pseudo-header, the header with a zeroed checksum
/// field, and the payload, padded to an even byte count.
pub fn compute_checksum(pseudo: &PseudoHeader, header: &UdpHeader, payload: &[u8]) -> u16 {
    // Checksum field is zeroed for the recomputation
    let mut header_bytes = header.to_bytes();
    header_bytes[6] = 0;
    header_bytes[7] = 0;

    let mut sum = checksum::sum_words(&pseudo.to_bytes(), 0);
    sum = checksum::sum_words(&header_bytes, sum);
    sum = checksum::sum_words(payload, sum);
    checksum::finalize(sum)
}

/// Recompute the checksum and compare it against the transmitted value.
///
/// A transmitted checksum of 0 is compared literally; the IPv4 "checksum
/// not computed" convention is not applied.
pub fn verify_checksum(pseudo: &PseudoHeader, header: &UdpHeader, payload: &[u8]) -> (u16, bool) {
    let computed = compute_checksum(pseudo, header, payload);
    (computed, computed == header.checksum)
}

/// Fully decoded datagram
#[derive(Debug, Clone)]
pub struct ParsedPacket<'a> {
    /// Transport protocol tag (always UDP)
    pub protocol: Protocol,
    pub header: UdpHeader,
    /// Pseudo-header the checksum was verified against
    pub pseudo_header: PseudoHeader,
    /// Zero-copy view into the caller's buffer, `length - 8` bytes
    pub payload: &'a [u8],
    /// Whether the transmitted checksum matches the recomputation
    pub checksum_valid: bool,
}

/// Decode a raw UDP datagram and verify its checksum.
///
/// `raw` is the datagram as captured (header + payload, possibly followed
/// by link-layer padding); `input` carries the IP-layer pseudo-header
/// fields. Structural failures (truncated buffer, bad length field,
/// unrecognized address family) are returned as errors; a checksum
/// mismatch is not an error and is reported through `checksum_valid`.
pub fn parse<'a>(raw: &'a [u8], input: &PseudoHeaderInput<'_>) -> Result<ParsedPacket<'a>> {
    let (header, payload) = UdpHeader::parse(raw)?;
    let pseudo_header = PseudoHeader::build(input)?;

    trace!(
        "UDP: {} -> {}, length {}, {} payload bytes",
        header.source_port,
        header.destination_port,
        header.length,
        payload.len()
    );

    let (computed, checksum_valid) = verify_checksum(&pseudo_header, &header, payload);
    if !checksum_valid {
        warn!(
            "UDP: checksum mismatch: transmitted {:#06x}, computed {:#06x}",
            header.checksum, computed
        );
    }

    Ok(ParsedPacket {
        protocol: Protocol::Udp,
        header,
        pseudo_header,
        payload,
        checksum_valid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::pseudo_header::AddressFamily;
    use std::net::IpAddr;

    const SRC_V4: [u8; 4] = [10, 0, 0, 1];
    const DST_V4: [u8; 4] = [10, 0, 0, 2];
    const SRC_V6: [u8; 16] = [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
    const DST_V6: [u8; 16] = [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2];

    fn v4_input(length: u16) -> PseudoHeaderInput<'static> {
        PseudoHeaderInput {
            source_ip: &SRC_V4,
            destination_ip: &DST_V4,
            protocol: PROTOCOL_NUMBER,
            length,
        }
    }

    fn v6_input(length: u16) -> PseudoHeaderInput<'static> {
        PseudoHeaderInput {
            source_ip: &SRC_V6,
            destination_ip: &DST_V6,
            protocol: PROTOCOL_NUMBER,
            length,
        }
    }

    /// Build a datagram with the checksum filled in by the same engine
    fn make_datagram(payload: &[u8], input: &PseudoHeaderInput<'_>) -> Vec<u8> {
        let length = (HEADER_SIZE + payload.len()) as u16;
        let mut dgram = Vec::with_capacity(length as usize);
        dgram.extend_from_slice(&12345u16.to_be_bytes()); // src_port
        dgram.extend_from_slice(&53u16.to_be_bytes()); // dst_port
        dgram.extend_from_slice(&length.to_be_bytes());
        dgram.extend_from_slice(&[0, 0]); // checksum placeholder
        dgram.extend_from_slice(payload);

        let pseudo = PseudoHeader::build(input).unwrap();
        let (header, _) = UdpHeader::parse(&dgram).unwrap();
        let sum = compute_checksum(&pseudo, &header, payload);
        dgram[6..8].copy_from_slice(&sum.to_be_bytes());
        dgram
    }

    #[test]
    fn test_parse_header_fields() {
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        let result = parse(&dgram, &v4_input(16)).unwrap();

        assert_eq!(result.protocol, Protocol::Udp);
        assert_eq!(result.protocol.to_string(), "UDP");
        assert_eq!(result.header.source_port, 12345);
        assert_eq!(result.header.destination_port, 53);
        assert_eq!(result.header.length, 16);
        assert_eq!(result.payload, b"abcdefgh");
        assert_eq!(
            result.header.length as usize,
            HEADER_SIZE + result.payload.len()
        );
    }

    #[test]
    fn test_parse_echoes_pseudo_header() {
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        let result = parse(&dgram, &v4_input(16)).unwrap();

        assert_eq!(result.pseudo_header.family(), AddressFamily::V4);
        assert_eq!(
            result.pseudo_header.source_ip(),
            "10.0.0.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            result.pseudo_header.destination_ip(),
            "10.0.0.2".parse::<IpAddr>().unwrap()
        );
        assert_eq!(result.pseudo_header.protocol(), 17);
        assert_eq!(result.pseudo_header.length(), 16);
    }

    #[test]
    fn test_checksum_known_value() {
        // Hand-computed RFC 1071 sum for this fixture: pseudo-header
        // words 0x1424, header words 0x307e, payload words 0x19194;
        // folded and complemented this is 0x29c8
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        assert_eq!(&dgram[6..8], &0x29c8u16.to_be_bytes());
    }

    #[test]
    fn test_checksum_roundtrip_v4() {
        let dgram = make_datagram(b"test", &v4_input(12));
        let result = parse(&dgram, &v4_input(12)).unwrap();
        assert!(result.checksum_valid);
    }

    #[test]
    fn test_checksum_roundtrip_v6() {
        let dgram = make_datagram(b"test", &v6_input(12));
        let result = parse(&dgram, &v6_input(12)).unwrap();
        assert!(result.checksum_valid);
        assert_eq!(result.pseudo_header.family(), AddressFamily::V6);
    }

    #[test]
    fn test_checksum_differs_between_families() {
        let v4 = make_datagram(b"test", &v4_input(12));
        let v6 = make_datagram(b"test", &v6_input(12));
        assert_ne!(&v4[6..8], &v6[6..8]);
    }

    #[test]
    fn test_corrupted_payload_fails_checksum() {
        let mut dgram = make_datagram(b"test", &v4_input(12));
        dgram[10] ^= 0x01;
        let result = parse(&dgram, &v4_input(12)).unwrap();
        assert!(!result.checksum_valid);
    }

    #[test]
    fn test_corrupted_header_fails_checksum() {
        let mut dgram = make_datagram(b"test", &v4_input(12));
        dgram[0] ^= 0x01; // source port
        let result = parse(&dgram, &v4_input(12)).unwrap();
        assert!(!result.checksum_valid);
    }

    #[test]
    fn test_zero_checksum_not_special_cased() {
        let mut dgram = make_datagram(b"test", &v4_input(12));
        dgram[6] = 0;
        dgram[7] = 0;
        let result = parse(&dgram, &v4_input(12)).unwrap();
        assert!(!result.checksum_valid);
    }

    #[test]
    fn test_zero_length_payload() {
        let dgram = make_datagram(&[], &v4_input(8));
        let result = parse(&dgram, &v4_input(8)).unwrap();

        assert_eq!(result.header.length, 8);
        assert!(result.payload.is_empty());
        assert!(result.checksum_valid);
    }

    #[test]
    fn test_trailing_padding_ignored() {
        let mut dgram = make_datagram(b"test", &v4_input(12));
        dgram.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]); // link-layer pad
        let result = parse(&dgram, &v4_input(12)).unwrap();

        assert_eq!(result.payload, b"test");
        assert!(result.checksum_valid);
    }

    #[test]
    fn test_odd_payload_pad_idempotence() {
        let input = v4_input(13);
        let pseudo = PseudoHeader::build(&input).unwrap();
        let header = UdpHeader {
            source_port: 12345,
            destination_port: 53,
            length: 13,
            checksum: 0,
        };

        let odd = compute_checksum(&pseudo, &header, b"hello");
        let padded = compute_checksum(&pseudo, &header, b"hello\0");
        assert_eq!(odd, padded);
    }

    #[test]
    fn test_odd_payload_roundtrip() {
        let dgram = make_datagram(b"hello", &v4_input(13));
        let result = parse(&dgram, &v4_input(13)).unwrap();
        assert!(result.checksum_valid);
        assert_eq!(result.payload, b"hello");
    }

    #[test]
    fn test_incomplete_buffer() {
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        let err = parse(&dgram[..10], &v4_input(16)).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_incomplete_header_reports_declared_length() {
        // 6 or 7 bytes: the length field is readable and is reported.
        // 6 is the first size where that holds.
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        let err = UdpHeader::parse(&dgram[..7]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: 16,
                actual: 7
            }
        ));

        let err = UdpHeader::parse(&dgram[..6]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: 16,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_incomplete_header_below_length_field() {
        // Fewer than 6 bytes: the length field itself is unreadable and
        // the header size stands in. 5 is the last size where that holds.
        let dgram = make_datagram(b"abcdefgh", &v4_input(16));
        let err = UdpHeader::parse(&dgram[..5]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: HEADER_SIZE,
                actual: 5
            }
        ));

        let err = UdpHeader::parse(&[0x30, 0x39, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: HEADER_SIZE,
                actual: 3
            }
        ));

        let err = UdpHeader::parse(&[]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: HEADER_SIZE,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_truncated_header_never_reports_below_header_size() {
        // 7 bytes declaring length 7: the readable declared value cannot
        // be the expectation, the header size is
        let err = UdpHeader::parse(&[0x30, 0x39, 0x00, 0x35, 0x00, 0x07, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompletePacket {
                expected: HEADER_SIZE,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_length_field_below_header_size() {
        let mut dgram = make_datagram(b"test", &v4_input(12));
        dgram[4..6].copy_from_slice(&7u16.to_be_bytes());
        let err = UdpHeader::parse(&dgram).unwrap_err();
        assert!(matches!(err, Error::InvalidLength { declared: 7 }));
    }

    #[test]
    fn test_parse_rejects_bad_address_family() {
        let dgram = make_datagram(b"test", &v4_input(12));
        let input = PseudoHeaderInput {
            source_ip: &[10, 0, 0],
            destination_ip: &DST_V4,
            protocol: PROTOCOL_NUMBER,
            length: 12,
        };
        assert!(matches!(
            parse(&dgram, &input),
            Err(Error::InvalidAddressFamily { .. })
        ));
    }

    #[test]
    fn test_header_to_bytes_roundtrip() {
        let dgram = make_datagram(b"test", &v4_input(12));
        let (header, _) = UdpHeader::parse(&dgram).unwrap();
        assert_eq!(header.to_bytes(), &dgram[..HEADER_SIZE]);
    }

    #[test]
    fn test_verify_checksum_reports_computed_value() {
        let dgram = make_datagram(b"test", &v4_input(12));
        let pseudo = PseudoHeader::build(&v4_input(12)).unwrap();
        let (header, payload) = UdpHeader::parse(&dgram).unwrap();

        let (computed, valid) = verify_checksum(&pseudo, &header, payload);
        assert!(valid);
        assert_eq!(computed, header.checksum);
    }
}
