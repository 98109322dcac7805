//! A generic reader pairing a byte stream with a frame codec.

use crate::error::Result;
use crate::framing::FrameCodec;
use std::io::Read;

/// A reader for streaming frames out of a byte stream.
///
/// This reader is generic over a [`FrameCodec`] strategy, which defines how
/// each frame is parsed from the stream. Frames can be pulled one at a time
/// with [`read_frame`](Self::read_frame), or drained with a closure via
/// [`process_all`](Self::process_all).
///
/// ```rust
/// # use framecodec::{FrameReader, CrlfCodec};
/// # use std::io::Cursor;
/// let mut reader = FrameReader::new(Cursor::new(b"hello\r\nworld\r\n".to_vec()), CrlfCodec::new());
///
/// while let Some(frame) = reader.read_frame()? {
///     println!("frame: {} bytes", frame.len());
/// }
/// # Ok::<(), framecodec::Error>(())
/// ```
pub struct FrameReader<R: Read, C: FrameCodec> {
    reader: R,
    codec: C,
}

impl<R: Read, C: FrameCodec> FrameReader<R, C> {
    /// Creates a new `FrameReader` with the given stream and codec.
    pub fn new(reader: R, codec: C) -> Self {
        Self { reader, codec }
    }

    /// Reads the next frame. Returns `Ok(Some(frame))` on success,
    /// `Ok(None)` on soft end-of-stream.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        self.codec.deserialize(&mut self.reader)
    }

    /// Processes every remaining frame in the stream with a closure.
    ///
    /// The closure should return `Ok(())` to continue or an error to stop;
    /// iteration also stops at soft end-of-stream.
    pub fn process_all<F>(&mut self, mut processor: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        while let Some(frame) = self.read_frame()? {
            processor(&frame)?;
        }
        Ok(())
    }

    /// The codec, for strategies that carry state (e.g.
    /// [`ElasticRawCodec::reset`](crate::framing::ElasticRawCodec::reset)).
    pub fn codec_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    /// Consumes the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
