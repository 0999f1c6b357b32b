//! Incremental receive framer.
//!
//! Turns byte chunks of any size and any boundary into a queue of complete
//! messages. Feeding the same bytes split at different points always yields
//! the same messages in the same order.
//!
//! The framer is owned by a single connection and is never shared. It does no
//! I/O and never blocks; waiting for more bytes happens in the caller.

use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::error::FramingError;
use super::header::MessageHeader;
use super::header::NetworkMagic;
use super::header::HEADER_SIZE;
use super::message::IncomingMessage;
use super::queue::MessageQueue;
use super::size_cap::ChainState;
use super::size_cap::SizeCapPolicy;

/// Result of a single [`ReceiveFramer::ingest`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// False only after a fatal framing violation. The connection must be
    /// dropped.
    pub ok: bool,

    /// At least one fully assembled message is waiting in the queue.
    pub has_complete: bool,
}

#[derive(Debug, Clone)]
pub struct ReceiveFramer {
    network_magic: NetworkMagic,
    size_cap: SizeCapPolicy,

    header_buf: [u8; HEADER_SIZE],
    header_len: usize,

    // `Some` exactly while awaiting payload bytes; `header_len` is then zero.
    in_progress: Option<IncomingMessage>,

    queue: MessageQueue,
    failure: Option<FramingError>,
}

impl ReceiveFramer {
    pub fn new(network_magic: NetworkMagic, size_cap: SizeCapPolicy) -> Self {
        Self {
            network_magic,
            size_cap,
            header_buf: [0u8; HEADER_SIZE],
            header_len: 0,
            in_progress: None,
            queue: MessageQueue::new(),
            failure: None,
        }
    }

    /// Consume `bytes` and report whether the stream is still healthy.
    ///
    /// `chain` is consulted for every header parsed during this call, so a
    /// change of the consensus limit between calls takes effect immediately.
    pub fn ingest(&mut self, bytes: &[u8], chain: &impl ChainState) -> IngestOutcome {
        let ok = match self.try_ingest(bytes, chain) {
            Ok(_) => true,
            Err(e) => {
                debug!("rejecting stream: {e}");
                false
            }
        };

        IngestOutcome {
            ok,
            has_complete: !self.queue.is_empty(),
        }
    }

    /// Like [`Self::ingest`], but returns the number of messages completed
    /// by this call or the violation that ended the stream.
    pub fn try_ingest(
        &mut self,
        bytes: &[u8],
        chain: &impl ChainState,
    ) -> Result<usize, FramingError> {
        if self.failure.is_some() {
            return Err(FramingError::Poisoned);
        }

        let mut rest = bytes;
        let mut completed = 0;

        while !rest.is_empty() {
            if let Some(message) = self.in_progress.as_mut() {
                let taken = message.fill(rest);
                rest = &rest[taken..];

                if message.complete() {
                    if let Some(message) = self.in_progress.take() {
                        self.enqueue(message);
                        completed += 1;
                    }
                }
                continue;
            }

            let take = (HEADER_SIZE - self.header_len).min(rest.len());
            self.header_buf[self.header_len..self.header_len + take].copy_from_slice(&rest[..take]);
            self.header_len += take;
            rest = &rest[take..];

            if self.header_len < HEADER_SIZE {
                break;
            }
            self.header_len = 0;

            let message = self.start_message(chain)?;
            if message.complete() {
                self.enqueue(message);
                completed += 1;
            } else {
                self.in_progress = Some(message);
            }
        }

        Ok(completed)
    }

    /// Decode the assembled header and vet its declared length against the
    /// current cap before a single payload byte is buffered.
    fn start_message(&mut self, chain: &impl ChainState) -> Result<IncomingMessage, FramingError> {
        let header = match MessageHeader::decode(&self.header_buf, self.network_magic) {
            Ok(header) => header,
            Err(e) => return Err(self.poison(e)),
        };

        let cap = self.size_cap.current_cap(chain);
        let declared = u64::from(header.payload_length);
        if declared > cap {
            return Err(self.poison(FramingError::PayloadTooLarge { declared, cap }));
        }

        trace!(
            "header for '{}' declares {} payload bytes (cap {})",
            header.command,
            declared,
            cap
        );
        Ok(IncomingMessage::with_header(header))
    }

    fn enqueue(&mut self, message: IncomingMessage) {
        trace!(
            "completed '{}' with {} payload bytes",
            message.command(),
            message.payload().len()
        );
        self.queue.push(message);
    }

    fn poison(&mut self, error: FramingError) -> FramingError {
        warn!("fatal framing violation: {error}");
        self.failure = Some(error);
        error
    }

    pub fn pop_message(&mut self) -> Option<IncomingMessage> {
        self.queue.pop_front()
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut MessageQueue {
        &mut self.queue
    }

    /// The message currently receiving payload bytes, if any.
    pub fn in_progress(&self) -> Option<&IncomingMessage> {
        self.in_progress.as_ref()
    }

    /// Bytes held toward the next message: a partial header or a partial
    /// payload, never both.
    pub fn bytes_pending(&self) -> usize {
        match &self.in_progress {
            Some(message) => message.payload().len(),
            None => self.header_len,
        }
    }

    pub fn last_error(&self) -> Option<&FramingError> {
        self.failure.as_ref()
    }

    pub fn is_poisoned(&self) -> bool {
        self.failure.is_some()
    }

    pub fn network_magic(&self) -> NetworkMagic {
        self.network_magic
    }

    pub fn size_cap(&self) -> &SizeCapPolicy {
        &self.size_cap
    }
}
