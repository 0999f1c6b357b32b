use super::header::NetworkMagic;

/// Violations that make a connection's byte stream unusable.
///
/// There is no resynchronization: once one of these is returned, the framer
/// refuses further input and the connection should be torn down.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("bad network magic: expected {}, found {}", hex::encode(.expected), hex::encode(.found))]
    BadMagic {
        expected: NetworkMagic,
        found: NetworkMagic,
    },

    #[error("declared payload of {declared} bytes exceeds cap of {cap} bytes")]
    PayloadTooLarge { declared: u64, cap: u64 },

    #[error("framer was fed bytes after a fatal framing violation")]
    Poisoned,
}

impl FramingError {
    /// Errors caused by the peer's bytes, as opposed to misuse of the framer.
    pub fn is_peer_fault(&self) -> bool {
        !matches!(self, Self::Poisoned)
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("raise schedule denominator must be positive")]
    ZeroDenominator,

    #[error("raise schedule {numerator}/{denominator} would lower the cap below the block size")]
    ShrinkingRaise { numerator: u64, denominator: u64 },

    #[error("ban threshold must be positive")]
    ZeroBanThreshold,

    #[error("read buffer size must be positive")]
    ZeroReadBuffer,
}
