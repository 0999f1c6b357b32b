use serde::Deserialize;
use serde::Serialize;

use super::network::Network;
use crate::protocol::error::ConfigError;
use crate::protocol::framer::ReceiveFramer;
use crate::protocol::misbehavior::PeerStandings;
use crate::protocol::size_cap::SizeCapPolicy;

/// Everything a connection needs to frame and judge a peer's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramerConfig {
    pub network: Network,
    pub size_cap: SizeCapPolicy,
    pub ban_threshold: u32,
    pub read_buffer_size: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            size_cap: SizeCapPolicy::default(),
            ban_threshold: crate::protocol::misbehavior::DEFAULT_BAN_THRESHOLD,
            read_buffer_size: 64 * 1024,
        }
    }
}

impl FramerConfig {
    pub fn new(
        network: Network,
        size_cap: SizeCapPolicy,
        ban_threshold: u32,
        read_buffer_size: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            network,
            size_cap,
            ban_threshold,
            read_buffer_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration deserialized from elsewhere is not trusted blindly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.size_cap.validate()?;
        if self.ban_threshold == 0 {
            return Err(ConfigError::ZeroBanThreshold);
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::ZeroReadBuffer);
        }

        Ok(())
    }

    pub fn new_framer(&self) -> ReceiveFramer {
        ReceiveFramer::new(self.network.magic(), self.size_cap)
    }

    pub fn new_standings(&self) -> Result<PeerStandings, ConfigError> {
        PeerStandings::new(self.ban_threshold)
    }
}
