//! The fixed-size message header that precedes every payload on the wire.
//!
//! Layout (24 bytes):
//!
//! ```text
//! magic(4) || command(12, ASCII, zero-padded) || payload_length(4, LE) || checksum(4)
//! ```

use std::fmt::Display;

use sha2::Digest;
use sha2::Sha256;

use super::error::FramingError;

pub const MAGIC_SIZE: usize = 4;
pub const COMMAND_SIZE: usize = 12;
pub const CHECKSUM_SIZE: usize = 4;

pub const COMMAND_OFFSET: usize = MAGIC_SIZE;
pub const MESSAGE_SIZE_OFFSET: usize = COMMAND_OFFSET + COMMAND_SIZE;
pub const CHECKSUM_OFFSET: usize = MESSAGE_SIZE_OFFSET + 4;
pub const HEADER_SIZE: usize = CHECKSUM_OFFSET + CHECKSUM_SIZE;

const _: () = assert!(HEADER_SIZE == 24);

pub type NetworkMagic = [u8; MAGIC_SIZE];
pub type Checksum = [u8; CHECKSUM_SIZE];

/// A message type identifier, kept exactly as it appeared on the wire.
///
/// Unknown or oddly-formatted commands are legal at the framing layer, so no
/// validation happens on construction from wire bytes. Use
/// [`Command::is_well_formed`] where the distinction matters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command([u8; COMMAND_SIZE]);

impl Command {
    /// Build a command from its textual name, zero-padding to
    /// [`COMMAND_SIZE`]. Returns `None` if the name is too long.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.as_bytes();
        if name.len() > COMMAND_SIZE {
            return None;
        }

        let mut raw = [0u8; COMMAND_SIZE];
        raw[..name.len()].copy_from_slice(name);
        Some(Self(raw))
    }

    pub fn from_raw(raw: [u8; COMMAND_SIZE]) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &[u8; COMMAND_SIZE] {
        &self.0
    }

    /// The text before the first NUL byte.
    ///
    /// Hostile peers may send arbitrary bytes here; in that case only the
    /// longest valid UTF-8 prefix is returned.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(COMMAND_SIZE);
        let text = &self.0[..end];
        match std::str::from_utf8(text) {
            Ok(s) => s,
            Err(e) => std::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// Printable ASCII, then nothing but NUL padding.
    pub fn is_well_formed(&self) -> bool {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(COMMAND_SIZE);
        let (text, padding) = self.0.split_at(end);
        !text.is_empty()
            && text.iter().all(|b| (b' '..=b'~').contains(b))
            && padding.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Command({:?})", self.as_str())
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Truncated double-SHA-256 digest of a payload.
pub fn payload_checksum(payload: &[u8]) -> Checksum {
    let digest = Sha256::digest(Sha256::digest(payload));
    let mut checksum = [0u8; CHECKSUM_SIZE];
    checksum.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    checksum
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub network_magic: NetworkMagic,
    pub command: Command,
    pub payload_length: u32,
    pub checksum: Checksum,
}

impl MessageHeader {
    /// Header describing `payload`, with its length and checksum filled in.
    ///
    /// # Panics
    ///
    /// Panics if the payload is longer than `u32::MAX` bytes, which no
    /// network permits.
    pub fn for_payload(network_magic: NetworkMagic, command: Command, payload: &[u8]) -> Self {
        let payload_length =
            u32::try_from(payload.len()).expect("payload length must fit in 32 bits");
        Self {
            network_magic,
            command,
            payload_length,
            checksum: payload_checksum(payload),
        }
    }

    /// Parse a header from exactly [`HEADER_SIZE`] bytes.
    ///
    /// Only the magic is validated. The checksum cannot be checked before the
    /// payload arrives, and unrecognized commands are left for the dispatcher.
    pub fn decode(
        bytes: &[u8; HEADER_SIZE],
        expected_magic: NetworkMagic,
    ) -> Result<Self, FramingError> {
        let mut network_magic = [0u8; MAGIC_SIZE];
        network_magic.copy_from_slice(&bytes[..COMMAND_OFFSET]);
        if network_magic != expected_magic {
            return Err(FramingError::BadMagic {
                expected: expected_magic,
                found: network_magic,
            });
        }

        let mut command = [0u8; COMMAND_SIZE];
        command.copy_from_slice(&bytes[COMMAND_OFFSET..MESSAGE_SIZE_OFFSET]);

        let mut length = [0u8; 4];
        length.copy_from_slice(&bytes[MESSAGE_SIZE_OFFSET..CHECKSUM_OFFSET]);

        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&bytes[CHECKSUM_OFFSET..HEADER_SIZE]);

        Ok(Self {
            network_magic,
            command: Command(command),
            payload_length: u32::from_le_bytes(length),
            checksum,
        })
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..COMMAND_OFFSET].copy_from_slice(&self.network_magic);
        bytes[COMMAND_OFFSET..MESSAGE_SIZE_OFFSET].copy_from_slice(self.command.raw());
        bytes[MESSAGE_SIZE_OFFSET..CHECKSUM_OFFSET]
            .copy_from_slice(&self.payload_length.to_le_bytes());
        bytes[CHECKSUM_OFFSET..HEADER_SIZE].copy_from_slice(&self.checksum);
        bytes
    }
}
