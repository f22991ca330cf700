//! Framing of backend messages out of arbitrary byte chunks.
use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{BackendMessage, BackendProtocol, ProtocolError};
use crate::common::verbose;

/// Message type plus length.
const HEADER: usize = 1 + 4;

/// Stateful backend message framer.
///
/// Chunks are fed with [`decode`][BackendMessageDecoder::decode] in socket order, a message
/// can be split anywhere across chunks, including inside its length prefix.
///
/// Only the bytes of a message split across chunks are copied, into the pending buffer.
/// Messages fully contained in a chunk are sliced out of it without copying.
#[derive(Debug, Default)]
pub struct BackendMessageDecoder {
    pending: BytesMut,
}

impl BackendMessageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bytes carried over to the next chunk.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Feed a chunk, returns a lazy iterator of every complete message.
    ///
    /// Unconsumed bytes are retained when the iterator is dropped, including messages that
    /// were complete but not yet yielded. After a [`ProtocolError`] the iterator is fused.
    pub fn decode(&mut self, chunk: Bytes) -> Decode<'_> {
        Decode { pending: &mut self.pending, chunk, failed: false }
    }
}

/// Iterator returned by [`BackendMessageDecoder::decode`].
#[derive(Debug)]
pub struct Decode<'a> {
    pending: &'a mut BytesMut,
    chunk: Bytes,
    failed: bool,
}

impl Decode<'_> {
    /// Take up to `want` bytes from the chunk into the pending buffer.
    fn fill_pending(&mut self, want: usize) {
        let take = want.min(self.chunk.len());
        self.pending.put(self.chunk.split_to(take));
    }

    /// Complete the message that started in an earlier chunk.
    fn next_pending(&mut self) -> Option<Result<Bytes, ProtocolError>> {
        if self.pending.len() < HEADER {
            self.fill_pending(HEADER - self.pending.len());
            if self.pending.len() < HEADER {
                return None;
            }
        }

        let total = match frame_len(&self.pending) {
            Ok(len) => len,
            Err(err) => return Some(Err(err)),
        };

        if self.pending.len() < total {
            self.fill_pending(total - self.pending.len());
            if self.pending.len() < total {
                return None;
            }
        }

        Some(Ok(self.pending.split_to(total).freeze()))
    }

    fn next_frame(&mut self) -> Option<Result<Bytes, ProtocolError>> {
        if !self.pending.is_empty() {
            return self.next_pending();
        }

        if self.chunk.len() < HEADER {
            self.fill_pending(HEADER);
            return None;
        }

        let total = match frame_len(&self.chunk) {
            Ok(len) => len,
            Err(err) => return Some(Err(err)),
        };

        if self.chunk.len() < total {
            self.fill_pending(total);
            return None;
        }

        Some(Ok(self.chunk.split_to(total)))
    }
}

impl Iterator for Decode<'_> {
    type Item = Result<BackendMessage, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = match self.next_frame()? {
            Ok(mut frame) => {
                let msgtype = frame.get_u8();
                frame.advance(4);
                BackendMessage::decode(msgtype, frame)
            }
            Err(err) => Err(err),
        };

        match &result {
            Ok(_message) => {
                verbose!(msgtype = %(_message.msgtype() as char), "Backend message");
            }
            Err(_) => self.failed = true,
        }

        Some(result)
    }
}

impl Drop for Decode<'_> {
    fn drop(&mut self) {
        if !self.failed && !self.chunk.is_empty() {
            self.pending.put(std::mem::take(&mut self.chunk));
        }
    }
}

/// Returns the full envelope length, message type included.
fn frame_len(header: &[u8]) -> Result<usize, ProtocolError> {
    let msgtype = header[0];
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    if len < 4 {
        return Err(ProtocolError::InvalidLength { msgtype, len });
    }
    Ok(1 + len as usize)
}
