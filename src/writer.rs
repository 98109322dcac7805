//! A generic writer pairing a byte stream with a frame codec.

use crate::error::Result;
use crate::framing::FrameCodec;
use std::io::Write;

/// A writer for streaming frames onto a byte stream.
///
/// Generic over a [`FrameCodec`] strategy, which defines the header or
/// delimiter written around each payload.
pub struct FrameWriter<W: Write, C: FrameCodec> {
    writer: W,
    codec: C,
}

impl<W: Write, C: FrameCodec> FrameWriter<W, C> {
    /// Creates a new `FrameWriter`.
    pub fn new(writer: W, codec: C) -> Self {
        Self { writer, codec }
    }

    /// Writes one frame to the stream.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.codec.serialize(payload, &mut self.writer)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
