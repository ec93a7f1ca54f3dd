//! Command-line argument structures for the `asnmp-respond` tool.

use clap::Parser;
use std::net::SocketAddr;

use crate::receiver::DEFAULT_NAME;

/// Arguments for the responder.
#[derive(Debug, Parser)]
#[command(name = "asnmp-respond", version, about)]
pub struct RespondArgs {
    /// Address to listen on.
    #[arg(short = 'b', long = "bind", default_value = "0.0.0.0:1161")]
    pub bind: SocketAddr,

    /// Receiver name used in log output.
    #[arg(short = 'n', long = "name", default_value = DEFAULT_NAME)]
    pub name: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Logging flags.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    /// Enable debug logging (async_snmp_receiver=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Enable trace logging (async_snmp_receiver=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Filter directive selected by the flags.
    pub fn filter(&self) -> &'static str {
        if self.trace {
            "async_snmp_receiver=trace"
        } else if self.debug {
            "async_snmp_receiver=debug"
        } else {
            "async_snmp_receiver=warn"
        }
    }

    /// Initialize tracing based on debug/trace flags.
    ///
    /// Events go to stderr so stdout stays free for the event report.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(self.filter()))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = RespondArgs::parse_from(["asnmp-respond"]);
        assert_eq!(args.bind, "0.0.0.0:1161".parse::<SocketAddr>().unwrap());
        assert_eq!(args.name, DEFAULT_NAME);
        assert_eq!(args.output.filter(), "async_snmp_receiver=warn");
    }

    #[test]
    fn test_trace_wins_over_debug() {
        let args = RespondArgs::parse_from(["asnmp-respond", "-d", "--trace", "--bind", "[::1]:0"]);
        assert!(args.bind.is_ipv6());
        assert_eq!(args.output.filter(), "async_snmp_receiver=trace");
    }
}
