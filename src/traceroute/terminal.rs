use futures::{pin_mut, StreamExt};

use crate::traceroute::error::TracerouteError;
use crate::traceroute::hop::{table_header, HopTable};
use crate::Traceroute;

/// Prints each hop of a [`Traceroute`] as soon as it is known.
pub struct TracerouteTerminal {
    traceroute: Traceroute,
}

impl TracerouteTerminal {
    pub fn new(traceroute: Traceroute) -> Self {
        Self { traceroute }
    }

    pub async fn print_trace(self) -> Result<HopTable, TracerouteError> {
        let mut hop_table = HopTable::new();

        println!("{}", table_header());
        let trace = self.traceroute.trace();
        pin_mut!(trace);
        while let Some(hop_record) = trace.next().await {
            let hop_record = hop_record?;
            println!("{hop_record}");
            hop_table.push(hop_record);
        }

        Ok(hop_table)
    }
}
