use anyhow::bail;
use anyhow::Result;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config_models::framer_config::FramerConfig;
use crate::protocol::error::ConfigError;
use crate::protocol::error::FramingError;
use crate::protocol::framer::ReceiveFramer;
use crate::protocol::misbehavior::MisbehaviorSink;
use crate::protocol::misbehavior::PeerId;
use crate::protocol::sanity;
use crate::protocol::size_cap::ChainState;

/// What one connection delivered before it ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub bytes_read: u64,
    pub messages_received: u64,
    pub sanity_violations: u64,

    /// Bytes buffered toward a message the peer never finished.
    pub truncated_bytes: usize,
}

/// Inbound half of a peer connection: reads the socket, frames messages and
/// checks each one before handing it on.
#[derive(Debug)]
pub struct PeerConnection {
    peer_id: PeerId,
    framer: ReceiveFramer,
    read_buffer_size: usize,
    stats: ConnectionStats,
}

impl PeerConnection {
    /// Fails on an invalid `config`. An empty read buffer in particular
    /// would make every read look like a hang-up.
    pub fn new(peer_id: PeerId, config: &FramerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            peer_id,
            framer: config.new_framer(),
            read_buffer_size: config.read_buffer_size,
            stats: ConnectionStats::default(),
        })
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn framer(&self) -> &ReceiveFramer {
        &self.framer
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Read from `reader` until the peer hangs up, sends a stream that cannot
    /// be framed, or is banned by `sink`.
    ///
    /// A clean hang-up returns the connection's statistics. The other two
    /// endings are errors; a framing violation can be recovered from the
    /// error with `downcast_ref::<FramingError>()`.
    pub async fn run<R>(
        &mut self,
        mut reader: R,
        chain: &impl ChainState,
        sink: &mut impl MisbehaviorSink,
    ) -> Result<ConnectionStats>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.read_buffer_size];

        loop {
            let read = reader.read(&mut buf).await?;
            if read == 0 {
                self.stats.truncated_bytes = self.framer.bytes_pending();
                if self.stats.truncated_bytes > 0 {
                    debug!(
                        "{} hung up with {} bytes of an unfinished message",
                        self.peer_id, self.stats.truncated_bytes
                    );
                }
                info!("{} closed the connection", self.peer_id);
                return Ok(self.stats);
            }
            self.stats.bytes_read += read as u64;

            let outcome = self.framer.ingest(&buf[..read], chain);

            // Messages completed ahead of a violation are still handled.
            if outcome.has_complete && self.dispatch_complete(sink) {
                bail!("{} is banned, closing connection", self.peer_id);
            }

            if !outcome.ok {
                let reason = self
                    .framer
                    .last_error()
                    .copied()
                    .unwrap_or(FramingError::Poisoned);
                warn!("{} sent a stream that cannot be framed: {reason}", self.peer_id);
                return Err(anyhow::Error::new(reason)
                    .context(format!("closing connection to {}", self.peer_id)));
            }

            if sink.should_disconnect(self.peer_id) {
                bail!("{} is banned, closing connection", self.peer_id);
            }
        }
    }

    /// Dispatch queued messages in order. Returns true, leaving the rest
    /// undispatched, as soon as `sink` wants the peer gone.
    fn dispatch_complete(&mut self, sink: &mut impl MisbehaviorSink) -> bool {
        while let Some(message) = self.framer.pop_message() {
            self.stats.messages_received += 1;
            match sanity::dispatch(&message, self.peer_id, sink) {
                Ok(()) => debug!(
                    "{} sent '{}' ({} bytes)",
                    self.peer_id,
                    message.command(),
                    message.payload().len()
                ),
                Err(_) => self.stats.sanity_violations += 1,
            }

            if sink.should_disconnect(self.peer_id) {
                return true;
            }
        }

        false
    }
}
