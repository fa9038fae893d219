use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use async_trait::async_trait;
use domain::base::Name;
use domain::resolv::StubResolver;
use log::debug;

/// Reverse name lookup of a hop address.
#[async_trait]
pub trait ReverseResolver: Send + Sync {
    /// `None` when the address has no name or the lookup failed.
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String>;
}

/// [`ReverseResolver`] backed by the system's stub resolver configuration.
pub struct StubReverseResolver {
    resolver: StubResolver,
}

impl StubReverseResolver {
    pub fn new() -> Self {
        Self {
            resolver: StubResolver::new(),
        }
    }
}

impl Default for StubReverseResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReverseResolver for StubReverseResolver {
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String> {
        let found_addrs = match self.resolver.lookup_addr(IpAddr::V4(address)).await {
            Ok(found_addrs) => found_addrs,
            Err(error) => {
                debug!("reverse lookup of {address} failed: {error}");
                return None;
            }
        };

        found_addrs
            .iter()
            .next()
            .map(|name| name.to_string().trim_end_matches('.').to_string())
            .filter(|name| !name.is_empty())
    }
}

/// Resolves `hostname` to its first IPv4 address. A literal IPv4 address is
/// returned as is.
pub async fn dns_lookup_first_ipv4_addr(hostname: &str) -> Option<Ipv4Addr> {
    if let Ok(ipv4_addr) = Ipv4Addr::from_str(hostname) {
        return Some(ipv4_addr);
    }

    let qname = match Name::<Vec<u8>>::from_str(hostname) {
        Ok(qname) => qname,
        Err(error) => {
            debug!("{hostname} is not a valid domain name: {error}");
            return None;
        }
    };

    let resolver = StubResolver::new();
    let found_hosts = match resolver.lookup_host(&qname).await {
        Ok(found_hosts) => found_hosts,
        Err(error) => {
            debug!("lookup of {hostname} failed: {error}");
            return None;
        }
    };

    found_hosts.iter().find_map(|ip_addr| match ip_addr {
        IpAddr::V4(ipv4_addr) => Some(ipv4_addr),
        IpAddr::V6(_) => None,
    })
}
