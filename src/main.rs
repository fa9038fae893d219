use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;

use icmp_traceroute::{dns_lookup_first_ipv4_addr, TracerouteBuilder, TracerouteError, TracerouteTerminal};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(name = "traceroute")]
#[command(bin_name = "traceroute")]
struct TracerouteOptions {
    #[arg(required = true, index = 1)]
    host: String,

    /// Set the max number of hops (max TTL to be reached)
    #[arg(short, long, default_value_t = 60, value_parser=clap::value_parser!(u8).range(1..=255))]
    max_hops: u8,

    /// Set the number of probes per each hop
    #[arg(short = 'q', long, default_value_t = 1, value_parser=clap::value_parser!(u16).range(1..=10))]
    tries: u16,

    /// Wait for a probe no more than <WAIT>
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "2s")]
    wait: Duration,

    /// ICMP identifier of the probes (defaults to the process id)
    #[arg(short, long)]
    identifier: Option<u16>,

    /// Do not resolve IP addresses to their domain names
    #[arg(short = 'n', long = "numeric")]
    numeric: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match run(TracerouteOptions::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(traceroute_options: TracerouteOptions) -> Result<(), TracerouteError> {
    let hostname = traceroute_options.host;

    let ip_addr = dns_lookup_first_ipv4_addr(&hostname)
        .await
        .ok_or_else(|| TracerouteError::HostnameNotResolved(hostname.clone()))?;

    let mut traceroute_builder = TracerouteBuilder::new()
        .destination_address(ip_addr)
        .max_ttl(traceroute_options.max_hops)
        .tries_per_hop(traceroute_options.tries)
        .max_wait_probe(traceroute_options.wait)
        .active_dns_lookup(!traceroute_options.numeric);

    if let Some(identifier) = traceroute_options.identifier {
        traceroute_builder = traceroute_builder.identifier(identifier);
    }

    let traceroute = traceroute_builder.build()?;

    println!("traceroute to {ip_addr} ({hostname}), {} hops max", traceroute_options.max_hops);
    let traceroute_terminal = TracerouteTerminal::new(traceroute);
    let hop_table = traceroute_terminal.print_trace().await?;

    if !hop_table.reached_destination() {
        println!("{hostname} not reached within {} hops", traceroute_options.max_hops);
    }

    Ok(())
}
