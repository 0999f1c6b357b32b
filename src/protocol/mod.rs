//! Receive path of the peer-to-peer wire protocol.
//!
//! Bytes from a connection go into a [`ReceiveFramer`], which checks each
//! header against the network magic and the [`SizeCapPolicy`] and queues
//! complete [`IncomingMessage`]s. Content checks happen afterwards, in
//! [`sanity`], and are reported through a [`MisbehaviorSink`].

pub mod codec;
pub mod error;
pub mod framer;
pub mod header;
pub mod message;
pub mod misbehavior;
pub mod queue;
pub mod sanity;
pub mod size_cap;

pub use error::FramingError;
pub use framer::IngestOutcome;
pub use framer::ReceiveFramer;
pub use header::Command;
pub use header::MessageHeader;
pub use header::HEADER_SIZE;
pub use message::IncomingMessage;
pub use misbehavior::MisbehaviorSink;
pub use misbehavior::PeerId;
pub use misbehavior::PeerStandings;
pub use misbehavior::SharedStandings;
pub use queue::MessageQueue;
pub use size_cap::ChainState;
pub use size_cap::SizeCapPolicy;
