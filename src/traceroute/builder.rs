use std::net::Ipv4Addr;
use std::time::Duration;

use crate::traceroute::async_socket::{ProbeSocketFactory, RawIcmpSocketFactory};
use crate::traceroute::error::TracerouteError;
use crate::traceroute::utils::dns::{ReverseResolver, StubReverseResolver};
use crate::traceroute::utils::process_identifier;
use crate::Traceroute;

pub struct TracerouteBuilder {
    destination_address: Option<Ipv4Addr>,
    max_ttl: u8,
    tries_per_hop: u16,
    max_wait_probe: Duration,
    identifier: Option<u16>,
    sequence_number: u16,
    is_active_dns_lookup: bool,
    socket_factory: Option<Box<dyn ProbeSocketFactory>>,
    reverse_resolver: Option<Box<dyn ReverseResolver>>,
}

impl TracerouteBuilder {
    pub const DEFAULT_MAX_TTL: u8 = 60;
    pub const DEFAULT_TRIES_PER_HOP: u16 = 1;
    pub const DEFAULT_MAX_WAIT_PROBE: Duration = Duration::from_secs(2);
    pub const DEFAULT_SEQUENCE_NUMBER: u16 = 1;
    pub const DEFAULT_IS_ACTIVE_DNS_LOOKUP: bool = true;

    pub fn new() -> Self {
        Self {
            destination_address: None,
            max_ttl: Self::DEFAULT_MAX_TTL,
            tries_per_hop: Self::DEFAULT_TRIES_PER_HOP,
            max_wait_probe: Self::DEFAULT_MAX_WAIT_PROBE,
            identifier: None,
            sequence_number: Self::DEFAULT_SEQUENCE_NUMBER,
            is_active_dns_lookup: Self::DEFAULT_IS_ACTIVE_DNS_LOOKUP,
            socket_factory: None,
            reverse_resolver: None,
        }
    }

    pub fn destination_address(mut self, destination_address: Ipv4Addr) -> Self {
        self.destination_address = Some(destination_address);
        self
    }

    pub fn max_ttl(mut self, max_ttl: u8) -> Self {
        self.max_ttl = max_ttl;
        self
    }

    pub fn tries_per_hop(mut self, tries_per_hop: u16) -> Self {
        self.tries_per_hop = tries_per_hop;
        self
    }

    pub fn max_wait_probe(mut self, max_wait_probe: Duration) -> Self {
        self.max_wait_probe = max_wait_probe;
        self
    }

    /// ICMP identifier stamped on every probe. Defaults to the process id.
    pub fn identifier(mut self, identifier: u16) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn sequence_number(mut self, sequence_number: u16) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn active_dns_lookup(mut self, active_dns_lookup: bool) -> Self {
        self.is_active_dns_lookup = active_dns_lookup;
        self
    }

    pub fn socket_factory(mut self, socket_factory: Box<dyn ProbeSocketFactory>) -> Self {
        self.socket_factory = Some(socket_factory);
        self
    }

    pub fn reverse_resolver(mut self, reverse_resolver: Box<dyn ReverseResolver>) -> Self {
        self.reverse_resolver = Some(reverse_resolver);
        self
    }

    pub fn build(self) -> Result<Traceroute, TracerouteError> {
        let Some(destination_address) = self.destination_address else {
            return Err(TracerouteError::InvalidConfiguration(String::from(
                "Destination address required!",
            )));
        };

        if self.max_ttl == 0 {
            return Err(TracerouteError::InvalidConfiguration(String::from(
                "max ttl must be at least 1",
            )));
        }

        if self.tries_per_hop == 0 {
            return Err(TracerouteError::InvalidConfiguration(String::from(
                "tries per hop must be at least 1",
            )));
        }

        if self.max_wait_probe.is_zero() {
            return Err(TracerouteError::InvalidConfiguration(String::from(
                "max wait per probe must be greater than zero",
            )));
        }

        let socket_factory = self
            .socket_factory
            .unwrap_or_else(|| Box::new(RawIcmpSocketFactory));

        let reverse_resolver = if self.is_active_dns_lookup {
            Some(
                self.reverse_resolver
                    .unwrap_or_else(|| Box::new(StubReverseResolver::new())),
            )
        } else {
            None
        };

        Ok(Traceroute::new(
            destination_address,
            self.max_ttl,
            self.tries_per_hop,
            self.max_wait_probe,
            self.identifier.unwrap_or_else(process_identifier),
            self.sequence_number,
            socket_factory,
            reverse_resolver,
        ))
    }
}

impl Default for TracerouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}
