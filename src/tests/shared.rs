use itertools::Itertools;

use crate::protocol::framer::ReceiveFramer;
use crate::protocol::header::Command;
use crate::protocol::header::MessageHeader;
use crate::protocol::header::NetworkMagic;
use crate::protocol::size_cap::ChainState;

/// Main-net magic; what every test framer is configured with.
pub const TEST_MAGIC: NetworkMagic = [0xf9, 0xbe, 0xb4, 0xd9];

/// Header and payload as they would appear on the wire.
pub fn encode_message(magic: NetworkMagic, command: &str, payload: &[u8]) -> Vec<u8> {
    let command = Command::new(command).unwrap();
    let header = MessageHeader::for_payload(magic, command, payload);

    let mut bytes = header.encode().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// Turn arbitrary numbers into sorted, deduplicated split points within
/// `0..=len`.
pub fn split_points(raw: &[usize], len: usize) -> Vec<usize> {
    raw.iter()
        .map(|p| p % (len + 1))
        .sorted()
        .dedup()
        .collect()
}

/// Feed `bytes` to the framer, cutting at `points`. Returns false as soon as
/// the framer reports a fatal violation.
pub fn feed_in_chunks(
    framer: &mut ReceiveFramer,
    bytes: &[u8],
    points: &[usize],
    chain: &impl ChainState,
) -> bool {
    let mut start = 0;
    for &end in points.iter().chain(std::iter::once(&bytes.len())) {
        if !framer.ingest(&bytes[start..end], chain).ok {
            return false;
        }
        start = end;
    }

    true
}
