//! Dispatcher-side checks on completed messages.
//!
//! Everything here looks at what the framer deliberately ignores: the
//! checksum, the command text, and whether the payload length fits what the
//! command carries. Violations cost the peer standing but are not fatal.

use tracing::debug;

use super::header::payload_checksum;
use super::header::Checksum;
use super::message::IncomingMessage;
use super::misbehavior::MisbehaviorSink;
use super::misbehavior::PeerId;

pub trait Sanction {
    fn severity(&self) -> u32;
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SanityViolation {
    #[error("checksum mismatch: declared {}, computed {}", hex::encode(.declared), hex::encode(.computed))]
    ChecksumMismatch {
        declared: Checksum,
        computed: Checksum,
    },

    #[error("malformed command {0:?}")]
    MalformedCommand(String),

    #[error("'{command}' carries {actual} payload bytes, expected {expected}")]
    UnexpectedPayloadLength {
        command: String,
        expected: usize,
        actual: usize,
    },
}

impl Sanction for SanityViolation {
    fn severity(&self) -> u32 {
        match self {
            SanityViolation::ChecksumMismatch { .. } => 10,
            SanityViolation::MalformedCommand(_) => 10,
            SanityViolation::UnexpectedPayloadLength { .. } => 20,
        }
    }
}

/// Payload length dictated by the command, for commands that have one.
///
/// Unknown commands return `None` and are left alone.
pub fn expected_payload_length(command: &str) -> Option<usize> {
    match command {
        "verack" | "getaddr" | "mempool" | "sendheaders" | "filterclear" => Some(0),
        "ping" | "pong" | "feefilter" => Some(8),
        _ => None,
    }
}

pub fn check_message(message: &IncomingMessage) -> Result<(), SanityViolation> {
    if !message.header().command.is_well_formed() {
        return Err(SanityViolation::MalformedCommand(
            message.command().to_owned(),
        ));
    }

    let computed = payload_checksum(message.payload());
    if computed != message.declared_checksum() {
        return Err(SanityViolation::ChecksumMismatch {
            declared: message.declared_checksum(),
            computed,
        });
    }

    if let Some(expected) = expected_payload_length(message.command()) {
        let actual = message.payload().len();
        if actual != expected {
            return Err(SanityViolation::UnexpectedPayloadLength {
                command: message.command().to_owned(),
                expected,
                actual,
            });
        }
    }

    Ok(())
}

/// Check `message` and report any violation against `peer_id`.
pub fn dispatch(
    message: &IncomingMessage,
    peer_id: PeerId,
    sink: &mut impl MisbehaviorSink,
) -> Result<(), SanityViolation> {
    check_message(message).inspect_err(|violation| {
        debug!("{peer_id} sent bad '{}': {violation}", message.command());
        sink.report(peer_id, violation.severity());
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use assert2::assert;
    use assert2::let_assert;

    use super::*;
    use crate::protocol::framer::ReceiveFramer;
    use crate::protocol::header::CHECKSUM_OFFSET;
    use crate::protocol::header::COMMAND_OFFSET;
    use crate::protocol::header::HEADER_SIZE;
    use crate::protocol::misbehavior::PeerStandings;
    use crate::protocol::size_cap::FixedBlockSize;
    use crate::protocol::size_cap::SizeCapPolicy;
    use crate::tests::shared::encode_message;
    use crate::tests::shared::TEST_MAGIC;

    fn frame_one(bytes: &[u8]) -> IncomingMessage {
        let mut framer = ReceiveFramer::new(TEST_MAGIC, SizeCapPolicy::default());
        let outcome = framer.ingest(bytes, &FixedBlockSize(1_000_000));
        assert!(outcome.ok);
        framer.pop_message().unwrap()
    }

    #[test]
    fn well_formed_ping_passes() {
        let msg = frame_one(&encode_message(TEST_MAGIC, "ping", &11u64.to_le_bytes()));
        assert!(check_message(&msg) == Ok(()));
    }

    #[test]
    fn unknown_command_passes() {
        let msg = frame_one(&encode_message(TEST_MAGIC, "xthinblock", &[1, 2, 3]));
        assert!(check_message(&msg) == Ok(()));
    }

    #[test]
    fn verack_with_payload_is_misbehavior() {
        let msg = frame_one(&encode_message(TEST_MAGIC, "verack", &[0]));
        let mut standings = PeerStandings::default();

        let_assert!(
            Err(SanityViolation::UnexpectedPayloadLength { expected, actual, .. }) =
                dispatch(&msg, PeerId(42), &mut standings)
        );
        assert!(expected == 0);
        assert!(actual == 1);
        assert!(standings.score(PeerId(42)) > 0);
    }

    #[test]
    fn ping_with_two_nonces_is_misbehavior() {
        let mut payload = 11u64.to_le_bytes().to_vec();
        payload.extend(11u64.to_le_bytes());
        let msg = frame_one(&encode_message(TEST_MAGIC, "ping", &payload));
        let mut standings = PeerStandings::default();

        assert!(dispatch(&msg, PeerId(42), &mut standings).is_err());
        assert!(standings.score(PeerId(42)) > 0);
        assert!(!standings.is_banned(PeerId(42)));
    }

    #[test]
    fn corrupted_checksum_is_misbehavior() {
        let mut bytes = encode_message(TEST_MAGIC, "tx", &[5; 60]);
        bytes[CHECKSUM_OFFSET..HEADER_SIZE].copy_from_slice(&[0; 4]);
        let msg = frame_one(&bytes);

        let_assert!(Err(SanityViolation::ChecksumMismatch { declared, .. }) = check_message(&msg));
        assert!(declared == [0; 4]);
    }

    #[test]
    fn malformed_command_is_misbehavior() {
        let mut bytes = encode_message(TEST_MAGIC, "tx", &[]);
        bytes[COMMAND_OFFSET + 3] = b'x';
        let msg = frame_one(&bytes);

        let_assert!(Err(violation) = check_message(&msg));
        assert!(violation == SanityViolation::MalformedCommand("tx".to_owned()));
        assert!(violation.severity() > 0);
    }

    #[test]
    fn clean_messages_cost_nothing() {
        let msg = frame_one(&encode_message(TEST_MAGIC, "verack", &[]));
        let mut standings = PeerStandings::default();
        assert!(dispatch(&msg, PeerId(1), &mut standings).is_ok());
        assert!(standings.standing(PeerId(1)).is_none());
    }
}
