//! Adapter that lets a [`ReceiveFramer`] drive a `tokio_util` framed stream.

use bytes::BufMut;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tokio_util::codec::Encoder;

use super::error::FramingError;
use super::framer::ReceiveFramer;
use super::header::Command;
use super::header::MessageHeader;
use super::header::HEADER_SIZE;
use super::message::IncomingMessage;
use super::size_cap::ChainState;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO Error({0})")]
    Io(#[from] std::io::Error),

    #[error("FramingError({0})")]
    Framing(#[from] FramingError),

    #[error("stream ended with {pending} bytes of an unfinished message")]
    Truncated { pending: usize },

    #[error("outgoing payload of {0} bytes does not fit the length field")]
    OversizedOutgoing(usize),
}

/// A message to be written by the outbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub command: Command,
    pub payload: Vec<u8>,
}

#[derive(Debug)]
pub struct FramerCodec<C> {
    framer: ReceiveFramer,
    chain: C,
}

impl<C: ChainState> FramerCodec<C> {
    pub fn new(framer: ReceiveFramer, chain: C) -> Self {
        Self { framer, chain }
    }

    pub fn framer(&self) -> &ReceiveFramer {
        &self.framer
    }

    pub fn into_framer(self) -> ReceiveFramer {
        self.framer
    }
}

impl<C: ChainState> Decoder for FramerCodec<C> {
    type Item = IncomingMessage;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // The framer keeps its own partial state, so everything buffered can
        // be handed over at once.
        if !src.is_empty() {
            let chunk = src.split();
            self.framer.try_ingest(&chunk, &self.chain)?;
        }

        Ok(self.framer.pop_message())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        match self.framer.bytes_pending() {
            0 => Ok(None),
            pending => Err(CodecError::Truncated { pending }),
        }
    }
}

impl<C> Encoder<OutgoingMessage> for FramerCodec<C> {
    type Error = CodecError;

    fn encode(&mut self, item: OutgoingMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if u32::try_from(item.payload.len()).is_err() {
            return Err(CodecError::OversizedOutgoing(item.payload.len()));
        }

        let header =
            MessageHeader::for_payload(self.framer.network_magic(), item.command, &item.payload);
        dst.reserve(HEADER_SIZE + item.payload.len());
        dst.put_slice(&header.encode());
        dst.put_slice(&item.payload);
        Ok(())
    }
}
