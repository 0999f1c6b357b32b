//! Reporting channel for protocol violations, and an in-memory ledger that
//! turns those reports into a ban decision.
//!
//! The framer itself never reports here: its violations are fatal and end the
//! connection. Reports come from the dispatcher, which sees message contents.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::error::ConfigError;

pub const DEFAULT_BAN_THRESHOLD: u32 = 100;

/// Identifies a connection for the purpose of keeping score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer={}", self.0)
    }
}

pub trait MisbehaviorSink {
    fn report(&mut self, peer_id: PeerId, severity: u32);

    /// Whether the reports so far warrant dropping the peer. Sinks that only
    /// record never ask for it.
    fn should_disconnect(&self, _peer_id: PeerId) -> bool {
        false
    }
}

impl<S: MisbehaviorSink + ?Sized> MisbehaviorSink for &mut S {
    fn report(&mut self, peer_id: PeerId, severity: u32) {
        (**self).report(peer_id, severity);
    }

    fn should_disconnect(&self, peer_id: PeerId) -> bool {
        (**self).should_disconnect(peer_id)
    }
}

/// One ledger shared by every connection task.
pub type SharedStandings = Arc<Mutex<PeerStandings>>;

impl MisbehaviorSink for SharedStandings {
    fn report(&mut self, peer_id: PeerId, severity: u32) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .report(peer_id, severity);
    }

    fn should_disconnect(&self, peer_id: PeerId) -> bool {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_banned(peer_id)
    }
}

/// Accumulated misbehavior of one peer. The higher, the worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStanding {
    pub score: u32,
    pub latest_report: Option<(u32, SystemTime)>,
}

impl PeerStanding {
    fn new() -> Self {
        Self {
            score: 0,
            latest_report: None,
        }
    }

    fn punish(&mut self, severity: u32) {
        self.score = self.score.saturating_add(severity);
        self.latest_report = Some((severity, SystemTime::now()));
    }
}

impl Display for PeerStanding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.score)
    }
}

/// Misbehavior scores of all peers seen so far.
//
// Disconnection policy lives with the caller; this only answers
// [PeerStandings::is_banned].
#[derive(Debug, Clone)]
pub struct PeerStandings {
    standings: HashMap<PeerId, PeerStanding>,
    ban_threshold: u32,
}

impl Default for PeerStandings {
    fn default() -> Self {
        Self {
            standings: HashMap::new(),
            ban_threshold: DEFAULT_BAN_THRESHOLD,
        }
    }
}

impl PeerStandings {
    /// A zero threshold would ban every peer before it misbehaved.
    pub fn new(ban_threshold: u32) -> Result<Self, ConfigError> {
        if ban_threshold == 0 {
            return Err(ConfigError::ZeroBanThreshold);
        }

        Ok(Self {
            standings: HashMap::new(),
            ban_threshold,
        })
    }

    pub fn standing(&self, peer_id: PeerId) -> Option<&PeerStanding> {
        self.standings.get(&peer_id)
    }

    pub fn score(&self, peer_id: PeerId) -> u32 {
        self.standings.get(&peer_id).map_or(0, |s| s.score)
    }

    pub fn is_banned(&self, peer_id: PeerId) -> bool {
        self.score(peer_id) >= self.ban_threshold
    }

    pub fn ban_threshold(&self) -> u32 {
        self.ban_threshold
    }

    /// Forget everything about a peer.
    pub fn clear(&mut self, peer_id: PeerId) {
        self.standings.remove(&peer_id);
    }
}

impl MisbehaviorSink for PeerStandings {
    fn report(&mut self, peer_id: PeerId, severity: u32) {
        let standing = self.standings.entry(peer_id).or_insert_with(PeerStanding::new);
        let was_banned = standing.score >= self.ban_threshold;
        standing.punish(severity);
        debug!("{peer_id} misbehaved (severity {severity}), score now {standing}");

        if !was_banned && standing.score >= self.ban_threshold {
            warn!(
                "{peer_id} reached ban threshold {} with score {standing}",
                self.ban_threshold
            );
        }
    }

    fn should_disconnect(&self, peer_id: PeerId) -> bool {
        self.is_banned(peer_id)
    }
}
