//! Internet checksum - RFC 1071
//!
//! One's-complement arithmetic shared by the UDP checksum path.

/// Accumulate 16-bit big-endian words into a running one's-complement sum.
///
/// An odd trailing byte is padded with a zero byte (RFC 1071 section 4.1).
/// When chaining calls over multiple slices, every slice but the last must
/// have an even length, otherwise the word boundaries shift.
pub fn sum_words(data: &[u8], mut sum: u32) -> u32 {
    for i in (0..data.len()).step_by(2) {
        let word = if i + 1 < data.len() {
            u16::from_be_bytes([data[i], data[i + 1]])
        } else {
            u16::from_be_bytes([data[i], 0])
        };
        sum = sum.wrapping_add(word as u32);
    }
    sum
}

/// Fold a 32-bit accumulator to 16 bits and take the one's complement.
pub fn finalize(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_words_even() {
        let sum = sum_words(&[0x00, 0x01, 0xf2, 0x03], 0);
        assert_eq!(sum, 0x0001 + 0xf203);
    }

    #[test]
    fn test_sum_words_odd_pads_with_zero() {
        // [0xab] is summed as the word 0xab00
        assert_eq!(sum_words(&[0xab], 0), 0xab00);
        assert_eq!(sum_words(&[0x01, 0x02, 0xab], 0), 0x0102 + 0xab00);
    }

    #[test]
    fn test_sum_words_empty() {
        assert_eq!(sum_words(&[], 0), 0);
        assert_eq!(sum_words(&[], 42), 42);
    }

    #[test]
    fn test_sum_words_chained_equals_contiguous() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc];
        let whole = sum_words(&data, 0);
        let chained = sum_words(&data[4..], sum_words(&data[..4], 0));
        assert_eq!(whole, chained);
    }

    #[test]
    fn test_finalize_folds_carry() {
        // 0xFFFF + 0x0001 carries out of bit 16 and folds back in
        assert_eq!(finalize(0x0001_0000), !1u16);
        assert_eq!(finalize(0xFFFF), 0);
    }

    #[test]
    fn test_rfc1071_worked_example() {
        // Example from RFC 1071 section 3: checksum of these eight bytes
        // is 0x220d
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(finalize(sum_words(&data, 0)), 0x220d);
    }

    #[test]
    fn test_checksum_of_data_with_checksum_is_zero() {
        // Appending the computed checksum to the data makes the whole
        // buffer sum to zero
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let checksum = finalize(sum_words(&data, 0));

        let mut with_checksum = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x00];
        with_checksum.extend_from_slice(&checksum.to_be_bytes());
        assert_eq!(finalize(sum_words(&with_checksum, 0)), 0);
    }
}
