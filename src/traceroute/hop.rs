use std::fmt::{Display, Formatter};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::traceroute::probe::ReplyKind;

pub const TIMEOUT: &str = "Timeout";
pub const HOSTNAME_NOT_RETURNABLE: &str = "hostname not returnable";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    EchoReply,
    DestinationUnreachable,
    TimeExceeded,
    Timeout,
    /// An ICMP type the tracer does not interpret, kept apart from `Timeout`.
    Unclassified(u8),
}

impl From<ReplyKind> for ResponseCode {
    fn from(reply_kind: ReplyKind) -> Self {
        match reply_kind {
            ReplyKind::EchoReply => ResponseCode::EchoReply,
            ReplyKind::DestinationUnreachable => ResponseCode::DestinationUnreachable,
            ReplyKind::TimeExceeded => ResponseCode::TimeExceeded,
            ReplyKind::Other(icmp_type) => ResponseCode::Unclassified(icmp_type),
        }
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseCode::EchoReply => write!(f, "0"),
            ResponseCode::DestinationUnreachable => write!(f, "3"),
            ResponseCode::TimeExceeded => write!(f, "11"),
            ResponseCode::Timeout => write!(f, "{TIMEOUT}"),
            ResponseCode::Unclassified(icmp_type) => write!(f, "Unclassified({icmp_type})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HopHostname {
    Resolved(String),
    NotReturnable,
    Timeout,
}

impl Display for HopHostname {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HopHostname::Resolved(hostname) => write!(f, "{hostname}"),
            HopHostname::NotReturnable => write!(f, "{HOSTNAME_NOT_RETURNABLE}"),
            HopHostname::Timeout => write!(f, "{TIMEOUT}"),
        }
    }
}

/// One row of the trace: what answered a probe sent with TTL `hop`.
#[derive(Clone, Debug, PartialEq)]
pub struct HopRecord {
    hop: u8,
    attempt: u16,
    address: Option<Ipv4Addr>,
    hostname: HopHostname,
    response_code: ResponseCode,
    rtt: Option<Duration>,
}

impl HopRecord {
    pub fn replied(
        hop: u8,
        attempt: u16,
        address: Ipv4Addr,
        hostname: HopHostname,
        response_code: ResponseCode,
        rtt: Duration,
    ) -> Self {
        Self {
            hop,
            attempt,
            address: Some(address),
            hostname,
            response_code,
            rtt: Some(rtt),
        }
    }

    pub fn timed_out(hop: u8, attempt: u16) -> Self {
        Self {
            hop,
            attempt,
            address: None,
            hostname: HopHostname::Timeout,
            response_code: ResponseCode::Timeout,
            rtt: None,
        }
    }

    pub fn hop(&self) -> u8 {
        self.hop
    }

    pub fn attempt(&self) -> u16 {
        self.attempt
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    /// The address column: the responder, or `Timeout`.
    pub fn ip(&self) -> String {
        self.address
            .map(|address| address.to_string())
            .unwrap_or_else(|| TIMEOUT.to_string())
    }

    pub fn hostname(&self) -> &HopHostname {
        &self.hostname
    }

    pub fn response_code(&self) -> ResponseCode {
        self.response_code
    }

    pub fn rtt(&self) -> Option<Duration> {
        self.rtt
    }

    pub fn is_destination_reached(&self) -> bool {
        self.response_code == ResponseCode::EchoReply
    }
}

impl Display for HopRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rtt = self
            .rtt
            .map(|rtt| format!("{:.3} ms", rtt.as_secs_f64() * 1000f64))
            .unwrap_or_else(|| String::from("*"));

        let hop = self.hop.to_string();
        let attempt = self.attempt.to_string();
        write!(
            f,
            "{}",
            table_row(&hop, &attempt, &self.ip(), &self.hostname.to_string(), &self.response_code.to_string(), &rtt)
        )
    }
}

/// Append-only, ordered list of [`HopRecord`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HopTable {
    records: Vec<HopRecord>,
}

impl HopTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hop_record: HopRecord) {
        self.records.push(hop_record);
    }

    pub fn records(&self) -> &[HopRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &HopRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn reached_destination(&self) -> bool {
        self.records
            .last()
            .is_some_and(HopRecord::is_destination_reached)
    }

    pub fn into_records(self) -> Vec<HopRecord> {
        self.records
    }
}

impl Display for HopTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", table_header())?;
        for hop_record in &self.records {
            writeln!(f, "{hop_record}")?;
        }

        Ok(())
    }
}

pub fn table_header() -> String {
    table_row("Hop", "Try", "IP", "Hostname", "Response Code", "RTT")
}

fn table_row(hop: &str, attempt: &str, ip: &str, hostname: &str, response_code: &str, rtt: &str) -> String {
    format!("{hop:<5} {attempt:<5} {ip:<16} {hostname:<45} {response_code:<17} {rtt}")
}
