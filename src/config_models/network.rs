use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;

use crate::protocol::header::NetworkMagic;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default, EnumIter, strum::EnumIs,
)]
#[non_exhaustive]
pub enum Network {
    /// Main net.
    #[default]
    Main,

    /// Public test network.
    Testnet,

    /// Network for individual unit and integration tests. Never connects to
    /// the outside world.
    RegTest,
}

impl Network {
    /// The four bytes every message on this network starts with.
    ///
    /// A peer from another network, or speaking another protocol, is rejected
    /// at its first header.
    pub fn magic(&self) -> NetworkMagic {
        match self {
            Network::Main => [0xf9, 0xbe, 0xb4, 0xd9],
            Network::Testnet => [0x0b, 0x11, 0x09, 0x07],
            Network::RegTest => [0xfa, 0xbf, 0xb5, 0xda],
        }
    }

    /// Consensus maximum block size at genesis, in bytes.
    pub fn default_max_block_size(&self) -> u64 {
        1_000_000
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Network::Main => 8333,
            Network::Testnet => 18333,
            Network::RegTest => 18444,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Network::Main => "main",
            Network::Testnet => "testnet",
            Network::RegTest => "regtest",
        };
        write!(f, "{}", string)
    }
}

impl FromStr for Network {
    type Err = String;
    fn from_str(input: &str) -> Result<Network, Self::Err> {
        match input {
            "main" => Ok(Network::Main),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::RegTest),
            _ => Err(format!("Failed to parse {} as network", input)),
        }
    }
}
