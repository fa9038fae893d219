use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::EchoRequestPacket;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ipv4::Ipv4Packet;

use crate::traceroute::error::TracerouteError;
use crate::traceroute::probe::{ProbeReply, ReplyKind};
use crate::traceroute::utils::packet_utils::{
    ICMP_ECHO_REQUEST, ICMP_HEADER_LENGTH, IPV4_HEADER_LENGTH, TIMESTAMP_LENGTH,
};

/// Shortest datagram we can decode: IPv4 header and ICMP header.
pub const MIN_REPLY_LENGTH: usize = IPV4_HEADER_LENGTH + ICMP_HEADER_LENGTH;

const ECHO_TIMESTAMP_OFFSET: usize = MIN_REPLY_LENGTH;
const QUOTED_ECHO_REQUEST_OFFSET: usize = MIN_REPLY_LENGTH + IPV4_HEADER_LENGTH;
const QUOTED_TIMESTAMP_OFFSET: usize = QUOTED_ECHO_REQUEST_OFFSET + ICMP_HEADER_LENGTH;

/// Decodes an IPv4 datagram (20 byte header, no options) carrying an ICMP message.
///
/// Only a datagram shorter than [`MIN_REPLY_LENGTH`] is rejected; anything else is
/// decoded best effort.
pub fn parse_reply(datagram: &[u8]) -> Result<ProbeReply, TracerouteError> {
    let truncated = || TracerouteError::TruncatedReply {
        len: datagram.len(),
        min: MIN_REPLY_LENGTH,
    };

    if datagram.len() < MIN_REPLY_LENGTH {
        return Err(truncated());
    }

    let ipv4_packet = Ipv4Packet::new(&datagram[..IPV4_HEADER_LENGTH]).ok_or_else(truncated)?;
    let icmp_bytes = &datagram[IPV4_HEADER_LENGTH..];
    let icmp_packet = IcmpPacket::new(icmp_bytes).ok_or_else(truncated)?;
    // identifier and sequence number sit at the same place for every ICMP type
    let echo_header = EchoReplyPacket::new(icmp_bytes).ok_or_else(truncated)?;

    let icmp_type = icmp_packet.get_icmp_type().0;
    let (quoted_identifier, timestamp) = match ReplyKind::from(icmp_type) {
        ReplyKind::EchoReply => (None, read_timestamp(datagram, ECHO_TIMESTAMP_OFFSET)),
        ReplyKind::TimeExceeded | ReplyKind::DestinationUnreachable => (
            read_quoted_identifier(datagram),
            read_timestamp(datagram, QUOTED_TIMESTAMP_OFFSET),
        ),
        ReplyKind::Other(_) => (None, None),
    };

    Ok(ProbeReply {
        from_address: ipv4_packet.get_source(),
        icmp_type,
        icmp_code: icmp_packet.get_icmp_code().0,
        checksum: icmp_packet.get_checksum(),
        identifier: echo_header.get_identifier(),
        sequence_number: echo_header.get_sequence_number(),
        quoted_identifier,
        timestamp,
    })
}

fn read_quoted_identifier(datagram: &[u8]) -> Option<u16> {
    let quoted = datagram.get(QUOTED_ECHO_REQUEST_OFFSET..)?;
    let echo_request = EchoRequestPacket::new(quoted)?;
    if echo_request.get_icmp_type().0 != ICMP_ECHO_REQUEST {
        return None;
    }

    Some(echo_request.get_identifier())
}

fn read_timestamp(datagram: &[u8], offset: usize) -> Option<f64> {
    let bytes = datagram.get(offset..offset + TIMESTAMP_LENGTH)?;
    let bytes: [u8; TIMESTAMP_LENGTH] = bytes.try_into().ok()?;
    Some(f64::from_be_bytes(bytes))
}
