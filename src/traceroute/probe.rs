use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;

pub use generator::build_probe;
pub use parser::parse_reply;

use crate::traceroute::utils::packet_utils::{
    ECHO_REQUEST_LENGTH, ICMP_DESTINATION_UNREACHABLE, ICMP_ECHO_REPLY, ICMP_ECHO_REQUEST,
    ICMP_TIME_EXCEEDED,
};

pub mod generator;
pub mod parser;

/// An ICMP echo request carrying its send time, as put on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeRequest {
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_number: u16,
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
}

impl ProbeRequest {
    pub const LENGTH: usize = ECHO_REQUEST_LENGTH;

    pub fn new(identifier: u16, sequence_number: u16, timestamp: f64) -> Self {
        Self {
            icmp_type: ICMP_ECHO_REQUEST,
            icmp_code: 0,
            checksum: 0,
            identifier,
            sequence_number,
            timestamp,
        }
    }
}

/// Classification of an ICMP message type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    EchoReply,
    DestinationUnreachable,
    TimeExceeded,
    Other(u8),
}

impl From<u8> for ReplyKind {
    fn from(icmp_type: u8) -> Self {
        match icmp_type {
            ICMP_ECHO_REPLY => ReplyKind::EchoReply,
            ICMP_DESTINATION_UNREACHABLE => ReplyKind::DestinationUnreachable,
            ICMP_TIME_EXCEEDED => ReplyKind::TimeExceeded,
            other => ReplyKind::Other(other),
        }
    }
}

/// Decoded view of a datagram received on the raw ICMP socket.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeReply {
    pub(crate) from_address: Ipv4Addr,
    pub(crate) icmp_type: u8,
    pub(crate) icmp_code: u8,
    pub(crate) checksum: u16,
    pub(crate) identifier: u16,
    pub(crate) sequence_number: u16,
    pub(crate) quoted_identifier: Option<u16>,
    pub(crate) timestamp: Option<f64>,
}

impl ProbeReply {
    pub fn from_address(&self) -> Ipv4Addr {
        self.from_address
    }

    pub fn icmp_type(&self) -> u8 {
        self.icmp_type
    }

    pub fn icmp_code(&self) -> u8 {
        self.icmp_code
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Identifier of the echo request quoted inside a time exceeded or
    /// destination unreachable message.
    pub fn quoted_identifier(&self) -> Option<u16> {
        self.quoted_identifier
    }

    /// Send time found in the echoed (or quoted) probe payload.
    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn kind(&self) -> ReplyKind {
        ReplyKind::from(self.icmp_type)
    }

    /// Whether this reply answers a probe sent with `identifier`.
    ///
    /// Echo requests never answer anything, whoever sent them. Other replies whose
    /// owner cannot be told apart are accepted.
    pub fn answers(&self, identifier: u16) -> bool {
        match self.kind() {
            ReplyKind::EchoReply => self.identifier == identifier,
            ReplyKind::TimeExceeded | ReplyKind::DestinationUnreachable => self
                .quoted_identifier
                .map_or(true, |quoted_identifier| quoted_identifier == identifier),
            ReplyKind::Other(icmp_type) => icmp_type != ICMP_ECHO_REQUEST,
        }
    }
}

impl Display for ProbeReply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type={} code={} from={} id={} seq={}",
            self.icmp_type, self.icmp_code, self.from_address, self.identifier, self.sequence_number
        )
    }
}
