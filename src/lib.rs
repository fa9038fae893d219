pub use traceroute::builder::TracerouteBuilder;
pub use traceroute::error::TracerouteError;
pub use traceroute::hop::{HopHostname, HopRecord, HopTable, ResponseCode};
pub use traceroute::probe::{build_probe, parse_reply, ProbeReply, ProbeRequest};
pub use traceroute::terminal::TracerouteTerminal;
pub use traceroute::utils;
pub use traceroute::utils::dns::dns_lookup_first_ipv4_addr;
pub use traceroute::Traceroute;

pub mod traceroute;
