use std::net::IpAddr;
use std::net::SocketAddr;

use bytesize::ByteSize;
use clap::Parser;

use super::framer_config::FramerConfig;
use super::network::Network;
use crate::protocol::error::ConfigError;
use crate::protocol::size_cap::SizeCapPolicy;

/// The `neptune-framing` program accepts peer connections and frames their
/// byte streams into protocol messages, logging what arrives.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// Specify network, `main`, `testnet`, or `regtest`
    #[clap(long, short, default_value = "main")]
    pub network: Network,

    /// IP on which to listen for peer connections.
    #[clap(short, long, default_value = "127.0.0.1")]
    pub listen_addr: IpAddr,

    /// Port on which to listen for peer connections. Defaults to the
    /// network's standard port.
    #[clap(long)]
    pub peer_port: Option<u16>,

    /// Consensus maximum block size currently in force. Defaults to the
    /// network's genesis limit.
    ///
    /// Units: B (bytes), K (kilobytes), M (megabytes), G (gigabytes)
    ///
    /// E.g. --max-block-size 8M
    #[clap(long, value_name = "SIZE")]
    pub max_block_size: Option<ByteSize>,

    /// How far ahead of the current block-size limit messages are still
    /// accepted, in percent. Messages are capped at the next size the limit
    /// may be raised to.
    #[clap(long, default_value = "5", value_name = "PERCENT")]
    pub raise_percent: u64,

    /// The misbehavior score at which a peer is disconnected.
    #[clap(
        long,
        default_value = "100",
        value_name = "VALUE",
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub ban_threshold: u32,

    /// Number of bytes requested from the socket per read.
    #[clap(long, default_value = "65536", value_name = "BYTES")]
    pub read_buffer_size: usize,

    /// Enable tokio tracing for consumption by the tokio-console application
    /// note: this will attempt to connect to localhost:6669
    #[clap(long, name = "tokio-console", default_value = "false")]
    pub tokio_console: bool,
}

impl Args {
    pub fn own_listen_address(&self) -> SocketAddr {
        SocketAddr::new(
            self.listen_addr,
            self.peer_port.unwrap_or_else(|| self.network.default_port()),
        )
    }

    pub fn max_block_size(&self) -> u64 {
        self.max_block_size
            .map(|size| size.as_u64())
            .unwrap_or_else(|| self.network.default_max_block_size())
    }

    /// Validated framer configuration derived from these arguments.
    pub fn framer_config(&self) -> Result<FramerConfig, ConfigError> {
        FramerConfig::new(
            self.network,
            SizeCapPolicy::from_raise_percent(self.raise_percent)?,
            self.ban_threshold,
            self.read_buffer_size,
        )
    }
}

impl Default for Args {
    fn default() -> Self {
        let empty: Vec<String> = vec![];
        Self::parse_from(empty)
    }
}
