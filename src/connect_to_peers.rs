use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;
use anyhow::Result;
use futures::FutureExt;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config_models::framer_config::FramerConfig;
use crate::peer_loop::ConnectionStats;
use crate::peer_loop::PeerConnection;
use crate::protocol::misbehavior::PeerId;
use crate::protocol::misbehavior::SharedStandings;
use crate::protocol::size_cap::FixedBlockSize;

/// Accepts incoming TCP connections and runs a [`PeerConnection`] for each.
#[derive(Debug)]
pub struct PeerListener {
    listener: TcpListener,
    config: FramerConfig,
    chain: FixedBlockSize,
    standings: SharedStandings,
    next_peer_id: u64,
}

impl PeerListener {
    pub async fn bind(
        listen_address: SocketAddr,
        config: FramerConfig,
        max_block_size: u64,
    ) -> Result<Self> {
        config.validate()?;
        let standings = config.new_standings()?;

        let listener = TcpListener::bind(listen_address).await.with_context(|| {
            format!(
                "Failed to bind to local TCP port {listen_address}. \
                Is an instance of this program already running?"
            )
        })?;
        info!("Now listening for peer connections on {listen_address}");

        Ok(Self {
            listener,
            config,
            chain: FixedBlockSize(max_block_size),
            standings: Arc::new(Mutex::new(standings)),
            next_peer_id: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn standings(&self) -> SharedStandings {
        Arc::clone(&self.standings)
    }

    /// Accept connections until the listening socket fails.
    pub async fn run(mut self) -> Result<i32> {
        loop {
            let (stream, peer_address) = self.listener.accept().await?;
            let peer_id = PeerId(self.next_peer_id);
            self.next_peer_id += 1;

            let config = self.config;
            let chain = self.chain;
            let standings = self.standings();
            tokio::spawn(async move {
                match answer_peer(stream, peer_address, peer_id, config, chain, standings).await {
                    Ok(stats) => debug!("{peer_id} at {peer_address} done: {stats:?}"),
                    Err(e) => info!("Connection to {peer_address} closed: {e:#}"),
                }
            });
        }
    }
}

/// Frame everything an incoming peer sends until the connection ends.
///
/// The peer's standing is dropped afterwards, whether the task returned or
/// panicked.
pub(crate) async fn answer_peer<S>(
    stream: S,
    peer_address: SocketAddr,
    peer_id: PeerId,
    config: FramerConfig,
    chain: FixedBlockSize,
    standings: SharedStandings,
) -> Result<ConnectionStats>
where
    S: AsyncRead + std::fmt::Debug + Unpin,
{
    info!("Established incoming TCP connection with {peer_address} as {peer_id}");

    let mut sink = Arc::clone(&standings);
    let mut connection = PeerConnection::new(peer_id, &config)?;
    let panic_result = std::panic::AssertUnwindSafe(connection.run(stream, &chain, &mut sink))
        .catch_unwind()
        .await;

    close_peer_connection(&standings, peer_id);

    match panic_result {
        Ok(inner_ret) => inner_ret,
        Err(_err) => {
            error!("Peer task (incoming) for {peer_address} panicked");
            anyhow::bail!("peer task for {peer_address} panicked")
        }
    }
}

fn close_peer_connection(standings: &SharedStandings, peer_id: PeerId) {
    let mut standings = standings.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(standing) = standings.standing(peer_id) {
        debug!("{peer_id} left with standing {standing}");
    }
    standings.clear(peer_id);
}
