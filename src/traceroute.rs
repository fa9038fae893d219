use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_stream::stream;
use futures::{pin_mut, Stream, StreamExt};
use log::{debug, info, warn};
use tokio::time::{timeout, Instant};

use crate::traceroute::async_socket::{ProbeSocket, ProbeSocketFactory};
use crate::traceroute::error::TracerouteError;
use crate::traceroute::hop::{HopHostname, HopRecord, HopTable, ResponseCode};
use crate::traceroute::probe::{build_probe, parse_reply, ProbeReply};
use crate::traceroute::utils::dns::ReverseResolver;

pub mod async_socket;
pub mod builder;
pub mod error;
pub mod hop;
pub mod probe;
pub mod terminal;
pub mod utils;

enum AttemptOutcome {
    Replied { reply: ProbeReply, rtt: Duration },
    TimedOut,
    Abandoned(io::Error),
}

/// ICMP echo traceroute towards a single IPv4 destination.
///
/// Probes are sent one at a time with TTL 1, 2, ... up to `max_ttl`; each attempt
/// uses its own socket and waits at most `max_wait_probe` for a reply. The trace
/// ends at the first echo reply or once `max_ttl` has been probed.
pub struct Traceroute {
    destination_address: Ipv4Addr,
    max_ttl: u8,
    tries_per_hop: u16,
    max_wait_probe: Duration,
    identifier: u16,
    sequence_number: u16,
    socket_factory: Box<dyn ProbeSocketFactory>,
    reverse_resolver: Option<Box<dyn ReverseResolver>>,
}

impl Traceroute {
    const RECV_BUFFER_SIZE: usize = 1024;

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        destination_address: Ipv4Addr,
        max_ttl: u8,
        tries_per_hop: u16,
        max_wait_probe: Duration,
        identifier: u16,
        sequence_number: u16,
        socket_factory: Box<dyn ProbeSocketFactory>,
        reverse_resolver: Option<Box<dyn ReverseResolver>>,
    ) -> Self {
        Self {
            destination_address,
            max_ttl,
            tries_per_hop,
            max_wait_probe,
            identifier,
            sequence_number,
            socket_factory,
            reverse_resolver,
        }
    }

    pub fn destination_address(&self) -> Ipv4Addr {
        self.destination_address
    }

    pub fn max_ttl(&self) -> u8 {
        self.max_ttl
    }

    /// Streams hop records as they are discovered.
    ///
    /// A fatal error is yielded once and ends the stream.
    pub fn trace(self) -> impl Stream<Item = Result<HopRecord, TracerouteError>> {
        stream! {
            info!(
                "tracing {} (max ttl {}, {} tries per hop, wait {:?})",
                self.destination_address, self.max_ttl, self.tries_per_hop, self.max_wait_probe
            );

            for ttl in 1..=self.max_ttl {
                for attempt in 1..=self.tries_per_hop {
                    let attempt_outcome = match self.probe(ttl).await {
                        Ok(attempt_outcome) => attempt_outcome,
                        Err(error) => {
                            yield Err(error);
                            return;
                        }
                    };

                    match attempt_outcome {
                        AttemptOutcome::Replied { reply, rtt } => {
                            let hop_record = self.build_hop_record(ttl, attempt, reply, rtt).await;
                            let is_destination_reached = hop_record.is_destination_reached();
                            yield Ok(hop_record);

                            if is_destination_reached {
                                info!("{} reached at ttl {ttl}", self.destination_address);
                                return;
                            }
                            break;
                        }
                        AttemptOutcome::TimedOut => {
                            debug!("ttl={ttl} attempt={attempt}: no reply within {:?}", self.max_wait_probe);
                            yield Ok(HopRecord::timed_out(ttl, attempt));
                        }
                        AttemptOutcome::Abandoned(error) => {
                            warn!("ttl={ttl} attempt={attempt}: probe abandoned: {error}");
                        }
                    }
                }
            }

            info!("{} not reached within {} hops", self.destination_address, self.max_ttl);
        }
    }

    /// Runs the whole trace and returns the hop table.
    pub async fn run(self) -> Result<HopTable, TracerouteError> {
        let mut hop_table = HopTable::new();

        let trace = self.trace();
        pin_mut!(trace);
        while let Some(hop_record) = trace.next().await {
            hop_table.push(hop_record?);
        }

        Ok(hop_table)
    }

    async fn probe(&self, ttl: u8) -> Result<AttemptOutcome, TracerouteError> {
        let socket = self
            .socket_factory
            .open()
            .map_err(TracerouteError::RawSocket)?;

        if let Err(error) = socket.set_ttl(ttl as u32) {
            return Ok(AttemptOutcome::Abandoned(error));
        }

        let echo_request = build_probe(self.identifier, self.sequence_number);
        let sent_at = Instant::now();
        if let Err(error) = socket.send_to(&echo_request, self.destination_address).await {
            return Ok(AttemptOutcome::Abandoned(error));
        }
        debug!("ttl={ttl}: echo request sent to {}", self.destination_address);

        Ok(self.wait_reply(socket.as_ref(), ttl, sent_at).await)
    }

    /// Waits for a reply to our probe, spending at most `max_wait_probe` overall.
    /// Datagrams that belong to someone else are dropped and the wait resumes with
    /// whatever time is left.
    async fn wait_reply(&self, socket: &dyn ProbeSocket, ttl: u8, sent_at: Instant) -> AttemptOutcome {
        let mut buffer = [0u8; Self::RECV_BUFFER_SIZE];
        let mut time_left = self.max_wait_probe;

        loop {
            let started_wait = Instant::now();
            let received = timeout(time_left, socket.recv(&mut buffer)).await;
            time_left = time_left.saturating_sub(started_wait.elapsed());

            let len = match received {
                Err(_elapsed) => return AttemptOutcome::TimedOut,
                Ok(Err(error)) => return AttemptOutcome::Abandoned(error),
                Ok(Ok(len)) => len,
            };

            match parse_reply(&buffer[..len]) {
                Ok(reply) if reply.answers(self.identifier) => {
                    debug!("ttl={ttl}: {reply}");
                    return AttemptOutcome::Replied { reply, rtt: sent_at.elapsed() };
                }
                Ok(reply) => debug!("ttl={ttl}: ignoring foreign reply {reply}"),
                Err(error) => debug!("ttl={ttl}: ignoring datagram: {error}"),
            }

            if time_left.is_zero() {
                return AttemptOutcome::TimedOut;
            }
        }
    }

    async fn build_hop_record(&self, ttl: u8, attempt: u16, reply: ProbeReply, rtt: Duration) -> HopRecord {
        let address = reply.from_address();
        let hostname = self.lookup_hostname(address).await;
        let response_code = ResponseCode::from(reply.kind());
        HopRecord::replied(ttl, attempt, address, hostname, response_code, rtt)
    }

    async fn lookup_hostname(&self, address: Ipv4Addr) -> HopHostname {
        let Some(reverse_resolver) = &self.reverse_resolver else {
            return HopHostname::Resolved(address.to_string());
        };

        match reverse_resolver.reverse_lookup(address).await {
            Some(hostname) => HopHostname::Resolved(hostname),
            None => HopHostname::NotReturnable,
        }
    }
}
