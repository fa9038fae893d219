use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerouteError {
    #[error("{0}: Hostname not resolvable.")]
    HostnameNotResolved(String),
    /// Opening a raw ICMP socket failed, usually for lack of `CAP_NET_RAW`.
    #[error("Unable to open a raw ICMP socket: {0}")]
    RawSocket(#[source] io::Error),
    #[error("Truncated reply: {len} bytes received, at least {min} required")]
    TruncatedReply { len: usize, min: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
