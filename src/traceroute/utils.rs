pub mod bytes;
pub mod dns;
pub mod packet_utils;

/// ICMP identifier derived from the running process, as `ping` does.
pub fn process_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}
