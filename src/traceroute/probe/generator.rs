use std::time::{SystemTime, UNIX_EPOCH};

use crate::traceroute::probe::ProbeRequest;
use crate::traceroute::utils::bytes::ToBytes;
use crate::traceroute::utils::packet_utils::internet_checksum;

/// Builds the 16 byte echo request for `identifier`/`sequence_number`, stamped with
/// the current time.
pub fn build_probe(identifier: u16, sequence_number: u16) -> Vec<u8> {
    build_probe_at(identifier, sequence_number, now_as_secs_f64())
}

/// Same as [`build_probe`] with an explicit send timestamp (seconds since the epoch).
pub fn build_probe_at(identifier: u16, sequence_number: u16, timestamp: f64) -> Vec<u8> {
    let mut echo_request = ProbeRequest::new(identifier, sequence_number, timestamp);
    echo_request.checksum = internet_checksum(&echo_request.to_bytes());
    echo_request.to_bytes()
}

pub(crate) fn now_as_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
