use super::header::Checksum;
use super::header::MessageHeader;

/// A message whose header has been parsed, with its payload (possibly still
/// partial) attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    header: MessageHeader,
    payload: Vec<u8>,
}

impl IncomingMessage {
    /// Reserves exactly the declared payload length. Callers must have
    /// checked that length against the size cap first.
    pub(crate) fn with_header(header: MessageHeader) -> Self {
        let capacity = header.payload_length as usize;
        Self {
            header,
            payload: Vec::with_capacity(capacity),
        }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn command(&self) -> &str {
        self.header.command.as_str()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// The checksum the peer declared. It has not been verified.
    pub fn declared_checksum(&self) -> Checksum {
        self.header.checksum
    }

    pub fn declared_length(&self) -> u32 {
        self.header.payload_length
    }

    pub fn complete(&self) -> bool {
        self.payload.len() == self.header.payload_length as usize
    }

    pub(crate) fn remaining(&self) -> usize {
        self.header.payload_length as usize - self.payload.len()
    }

    /// Append as much of `bytes` as the payload still needs; returns the
    /// number of bytes taken.
    pub(crate) fn fill(&mut self, bytes: &[u8]) -> usize {
        let take = self.remaining().min(bytes.len());
        self.payload.extend_from_slice(&bytes[..take]);
        take
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::protocol::header::Command;

    fn message(payload_length: u32) -> IncomingMessage {
        IncomingMessage::with_header(MessageHeader {
            network_magic: [1, 2, 3, 4],
            command: Command::new("block").unwrap(),
            payload_length,
            checksum: [9, 9, 9, 9],
        })
    }

    #[test]
    fn empty_payload_is_complete_immediately() {
        let msg = message(0);
        assert!(msg.complete());
        assert!(msg.payload().is_empty());
    }

    #[test]
    fn fill_never_overruns_declared_length() {
        let mut msg = message(5);
        assert_eq!(3, msg.fill(&[1, 2, 3]));
        assert!(!msg.complete());
        assert_eq!(2, msg.fill(&[4, 5, 6, 7]));
        assert!(msg.complete());
        assert_eq!(0, msg.fill(&[8]));
        assert_eq!([1u8, 2, 3, 4, 5].as_slice(), msg.payload());
    }

    #[test]
    fn capacity_matches_declared_length() {
        let msg = message(1000);
        assert!(msg.payload.capacity() >= 1000);
        assert_eq!(1000, msg.remaining());
        assert_eq!([9, 9, 9, 9], msg.declared_checksum());
        assert_eq!("block", msg.command());
    }
}
