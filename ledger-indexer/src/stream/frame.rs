//! Length-prefixed frames
//!
//! Each frame is a 4-byte big-endian length whose top bit is reserved,
//! followed by that many bytes. A zero length or end of input at a frame
//! boundary ends the stream.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::core::error::{DecodeError, IndexerResult};

const LENGTH_MASK: u32 = 0x7fff_ffff;

/// Default upper bound on a single frame
pub const DEFAULT_MAX_FRAME: usize = 256 * 1024 * 1024;

pub struct FrameReader<R> {
    reader: R,
    max_frame: usize,
    frames: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_frame(reader, DEFAULT_MAX_FRAME)
    }

    pub fn with_max_frame(reader: R, max_frame: usize) -> Self {
        Self {
            reader,
            max_frame,
            frames: 0,
        }
    }

    /// Frames read so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Next frame, or `None` at end of stream
    pub async fn next_frame(&mut self) -> IndexerResult<Option<Bytes>> {
        let mut header = [0u8; 4];
        let mut filled = 0;
        while filled < header.len() {
            let n = self.reader.read(&mut header[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(DecodeError::UnexpectedEof {
                    offset: filled,
                    needed: header.len() - filled,
                }
                .into());
            }
            filled += n;
        }

        let len = (u32::from_be_bytes(header) & LENGTH_MASK) as usize;
        if len == 0 {
            return Ok(None);
        }
        if len > self.max_frame {
            return Err(DecodeError::LengthExceeded {
                kind: "frame",
                len,
                max: self.max_frame,
            }
            .into());
        }

        let mut frame = BytesMut::zeroed(len);
        let mut read = 0;
        while read < len {
            let n = self.reader.read(&mut frame[read..]).await?;
            if n == 0 {
                return Err(DecodeError::UnexpectedEof {
                    offset: read,
                    needed: len - read,
                }
                .into());
            }
            read += n;
        }

        self.frames += 1;
        Ok(Some(frame.freeze()))
    }
}
