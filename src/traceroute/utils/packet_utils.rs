use pnet::packet::icmp::IcmpTypes;

pub const ICMP_ECHO_REQUEST: u8 = IcmpTypes::EchoRequest.0;
pub const ICMP_ECHO_REPLY: u8 = IcmpTypes::EchoReply.0;
pub const ICMP_DESTINATION_UNREACHABLE: u8 = IcmpTypes::DestinationUnreachable.0;
pub const ICMP_TIME_EXCEEDED: u8 = IcmpTypes::TimeExceeded.0;

pub const IPV4_HEADER_LENGTH: usize = 20;
pub const ICMP_HEADER_LENGTH: usize = 8;
pub const TIMESTAMP_LENGTH: usize = 8;
pub const ECHO_REQUEST_LENGTH: usize = ICMP_HEADER_LENGTH + TIMESTAMP_LENGTH;

/// 16-bit ones' complement sum of `buffer` (RFC 1071), carries folded back in.
///
/// Words are read in network byte order. A trailing odd byte is summed as if the
/// buffer were padded with one zero byte.
pub fn ones_complement_sum(buffer: &[u8]) -> u16 {
    let mut sum: u64 = 0;

    let mut words = buffer.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u64;
    }

    if let [last_byte] = words.remainder() {
        sum += u16::from_be_bytes([*last_byte, 0]) as u64;
    }

    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }

    sum as u16
}

/// Internet checksum (RFC 1071) of `buffer`.
///
/// The returned value is meant to be written with `to_be_bytes`, which gives the same
/// wire bytes on every platform.
pub fn internet_checksum(buffer: &[u8]) -> u16 {
    !ones_complement_sum(buffer)
}

/// `true` when `buffer`, checksum field included, sums to `0xFFFF`.
pub fn is_checksum_valid(buffer: &[u8]) -> bool {
    ones_complement_sum(buffer) == 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1071_example() {
        // RFC 1071 section 3 sample words
        let buffer = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(ones_complement_sum(&buffer), 0xddf2);
        assert_eq!(internet_checksum(&buffer), 0x220d);
    }

    #[test]
    fn empty_buffer() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }
}
