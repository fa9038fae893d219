#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::pending;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use icmp_traceroute::traceroute::async_socket::{ProbeSocket, ProbeSocketFactory};
use icmp_traceroute::traceroute::utils::dns::ReverseResolver;
use icmp_traceroute::utils::packet_utils::internet_checksum;

pub const DESTINATION: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
pub const LOCAL_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
pub const IDENTIFIER: u16 = 0x1234;

pub fn router(ttl: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, ttl)
}

/// What the network does with one probe.
#[derive(Clone, Debug)]
pub enum Event {
    EchoReply(Ipv4Addr),
    TimeExceeded(Ipv4Addr),
    DestinationUnreachable(Ipv4Addr),
    /// The probe itself, as a raw socket sees it when tracing a local address.
    OwnRequest,
    Raw(Vec<u8>),
    RecvError,
    /// Nothing arrives for this long.
    Delay(Duration),
}

enum Received {
    Datagram(Vec<u8>),
    Error,
    Delay(Duration),
}

/// In-memory network: for every TTL, a queue of per-attempt event lists.
/// An attempt without a scripted entry never gets an answer.
#[derive(Default)]
pub struct ScriptedNetwork {
    script: Mutex<HashMap<u8, VecDeque<Vec<Event>>>>,
    sent: Mutex<Vec<(u8, Vec<u8>)>>,
    opened_sockets: Mutex<usize>,
    open_error: Mutex<Option<io::ErrorKind>>,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_attempt(&self, ttl: u8, events: Vec<Event>) {
        self.script
            .lock()
            .unwrap()
            .entry(ttl)
            .or_default()
            .push_back(events);
    }

    pub fn fail_open(&self, kind: io::ErrorKind) {
        *self.open_error.lock().unwrap() = Some(kind);
    }

    /// TTLs of the probes sent, in order.
    pub fn sent_ttls(&self) -> Vec<u8> {
        self.sent.lock().unwrap().iter().map(|(ttl, _)| *ttl).collect()
    }

    pub fn sent_probes(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().iter().map(|(_, probe)| probe.clone()).collect()
    }

    pub fn opened_sockets(&self) -> usize {
        *self.opened_sockets.lock().unwrap()
    }

    fn next_attempt(&self, ttl: u8) -> Vec<Event> {
        self.script
            .lock()
            .unwrap()
            .get_mut(&ttl)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default()
    }
}

pub struct ScriptedSocketFactory {
    network: Arc<ScriptedNetwork>,
}

impl ScriptedSocketFactory {
    pub fn new(network: &Arc<ScriptedNetwork>) -> Box<Self> {
        Box::new(Self { network: Arc::clone(network) })
    }
}

impl ProbeSocketFactory for ScriptedSocketFactory {
    fn open(&self) -> io::Result<Box<dyn ProbeSocket>> {
        if let Some(kind) = *self.network.open_error.lock().unwrap() {
            return Err(io::Error::from(kind));
        }

        *self.network.opened_sockets.lock().unwrap() += 1;
        Ok(Box::new(ScriptedSocket {
            network: Arc::clone(&self.network),
            ttl: Mutex::new(None),
            inbox: Mutex::new(VecDeque::new()),
        }))
    }
}

struct ScriptedSocket {
    network: Arc<ScriptedNetwork>,
    ttl: Mutex<Option<u8>>,
    inbox: Mutex<VecDeque<Received>>,
}

#[async_trait]
impl ProbeSocket for ScriptedSocket {
    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        *self.ttl.lock().unwrap() = Some(ttl as u8);
        Ok(())
    }

    async fn send_to(&self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let ttl = self
            .ttl
            .lock()
            .unwrap()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "ttl not set"))?;
        self.network.sent.lock().unwrap().push((ttl, buf.to_vec()));

        let mut inbox = self.inbox.lock().unwrap();
        for event in self.network.next_attempt(ttl) {
            inbox.push_back(match event {
                Event::EchoReply(from) => Received::Datagram(echo_reply_to(from, buf)),
                Event::TimeExceeded(from) => {
                    Received::Datagram(icmp_error(from, 11, 0, destination, buf))
                }
                Event::DestinationUnreachable(from) => {
                    Received::Datagram(icmp_error(from, 3, 3, destination, buf))
                }
                Event::OwnRequest => Received::Datagram(looped_back(destination, buf)),
                Event::Raw(datagram) => Received::Datagram(datagram),
                Event::RecvError => Received::Error,
                Event::Delay(duration) => Received::Delay(duration),
            });
        }

        Ok(buf.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let received = self.inbox.lock().unwrap().pop_front();
            match received {
                Some(Received::Datagram(datagram)) => {
                    buf[..datagram.len()].copy_from_slice(&datagram);
                    return Ok(datagram.len());
                }
                Some(Received::Error) => {
                    return Err(io::Error::from(io::ErrorKind::ConnectionRefused))
                }
                Some(Received::Delay(duration)) => tokio::time::sleep(duration).await,
                None => return pending().await,
            }
        }
    }
}

#[derive(Default)]
pub struct StaticResolver {
    names: HashMap<Ipv4Addr, String>,
}

impl StaticResolver {
    pub fn with(names: &[(Ipv4Addr, &str)]) -> Box<Self> {
        Box::new(Self {
            names: names
                .iter()
                .map(|(address, name)| (*address, name.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl ReverseResolver for StaticResolver {
    async fn reverse_lookup(&self, address: Ipv4Addr) -> Option<String> {
        self.names.get(&address).cloned()
    }
}

pub fn ipv4_header(source: Ipv4Addr, destination: Ipv4Addr, payload_length: usize) -> Vec<u8> {
    let total_length = (20 + payload_length) as u16;
    let mut header = vec![0x45, 0];
    header.extend_from_slice(&total_length.to_be_bytes());
    header.extend_from_slice(&[0, 0, 0, 0, 64, 1, 0, 0]);
    header.extend_from_slice(&source.octets());
    header.extend_from_slice(&destination.octets());
    header
}

fn with_checksum(mut icmp_message: Vec<u8>) -> Vec<u8> {
    icmp_message[2..4].copy_from_slice(&[0, 0]);
    let checksum = internet_checksum(&icmp_message);
    icmp_message[2..4].copy_from_slice(&checksum.to_be_bytes());
    icmp_message
}

/// The probe echoed back by `from` as an echo reply.
pub fn echo_reply_to(from: Ipv4Addr, probe: &[u8]) -> Vec<u8> {
    let mut icmp_message = probe.to_vec();
    icmp_message[0] = 0;
    let icmp_message = with_checksum(icmp_message);

    let mut datagram = ipv4_header(from, LOCAL_ADDRESS, icmp_message.len());
    datagram.extend_from_slice(&icmp_message);
    datagram
}

/// `probe` as sent from this host to `destination`, unchanged.
pub fn looped_back(destination: Ipv4Addr, probe: &[u8]) -> Vec<u8> {
    let mut datagram = ipv4_header(LOCAL_ADDRESS, destination, probe.len());
    datagram.extend_from_slice(probe);
    datagram
}

/// An echo reply carrying `identifier`, as another ping on the host would receive.
pub fn echo_reply(from: Ipv4Addr, identifier: u16, sequence_number: u16, timestamp: f64) -> Vec<u8> {
    let mut icmp_message = vec![0, 0, 0, 0];
    icmp_message.extend_from_slice(&identifier.to_be_bytes());
    icmp_message.extend_from_slice(&sequence_number.to_be_bytes());
    icmp_message.extend_from_slice(&timestamp.to_be_bytes());
    let icmp_message = with_checksum(icmp_message);

    let mut datagram = ipv4_header(from, LOCAL_ADDRESS, icmp_message.len());
    datagram.extend_from_slice(&icmp_message);
    datagram
}

/// ICMP error message from `from` quoting `quoted` behind the original IPv4 header.
pub fn icmp_error(
    from: Ipv4Addr,
    icmp_type: u8,
    icmp_code: u8,
    destination: Ipv4Addr,
    quoted: &[u8],
) -> Vec<u8> {
    let mut icmp_message = vec![icmp_type, icmp_code, 0, 0, 0, 0, 0, 0];
    icmp_message.extend(ipv4_header(LOCAL_ADDRESS, destination, quoted.len()));
    icmp_message.extend_from_slice(quoted);
    let icmp_message = with_checksum(icmp_message);

    let mut datagram = ipv4_header(from, LOCAL_ADDRESS, icmp_message.len());
    datagram.extend_from_slice(&icmp_message);
    datagram
}
