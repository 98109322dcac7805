//! # framecodec
//!
//! Interchangeable frame codecs for converting a continuous,
//! partially-delivered byte transport (a TCP socket or equivalent stream)
//! into discrete, length-bounded message frames, plus the inverse encoders
//! that write frames back onto such a stream.
//!
//! ## Overview
//!
//! `framecodec` provides a trait-based family of framing strategies over
//! generic `std::io::Read`/`Write` streams. The strategies handle partial
//! reads, blocking/timeout semantics, delimiter scanning, length-prefixed
//! headers with multiple header widths, maximum-size enforcement, and the
//! graceful-vs-abnormal end-of-stream distinction, with optional buffer
//! pooling for high-throughput deserialization.
//!
//! ## Key Features
//!
//! * **Interchangeable Strategies**: length-header (1/2/4-octet big-endian,
//!   optionally inclusive), CRLF, STX/ETX, custom single terminator, and
//!   raw/elastic EOF-terminated framing behind one [`FrameCodec`] trait
//! * **Soft End-of-Stream as Data**: a clean close between frames is
//!   `Ok(None)`, a distinct outcome callers branch on rather than an error
//! * **Bounded Everything**: every variant enforces a configurable maximum
//!   message size and reports the limit in its overflow diagnostics
//! * **Buffer Pooling**: accumulation buffers can be pooled and reused
//!   without aliasing; pooled backing arrays never escape to callers
//! * **Failure Side Channel**: every deserialization failure is delivered
//!   once to an optional reporter callback with the partial buffer and
//!   offset, then raised
//!
//! ## Quick Start
//!
//! ```rust
//! use framecodec::{CrlfCodec, FrameReader, FrameWriter};
//! use std::io::Cursor;
//!
//! fn main() -> framecodec::Result<()> {
//!     // Write two CRLF-delimited frames.
//!     let mut wire = Vec::new();
//!     let mut writer = FrameWriter::new(Cursor::new(&mut wire), CrlfCodec::new());
//!     writer.write_frame(b"hello")?;
//!     writer.write_frame(b"world")?;
//!
//!     // Read them back until soft end-of-stream.
//!     let mut reader = FrameReader::new(Cursor::new(wire), CrlfCodec::new());
//!     while let Some(frame) = reader.read_frame()? {
//!         println!("frame: {} bytes", frame.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! The crate is synchronous and blocking by design: `deserialize` blocks
//! the calling thread on stream reads, and no internal threads are
//! spawned. A codec instance (and its pool) must be driven by exactly one
//! logical reader at a time; per-read timeouts are configured on the
//! underlying stream and surface as [`Error::Timeout`].

pub mod buffer;
pub mod error;
pub mod event;
pub mod factory;
pub mod framing;
pub mod reader;
pub mod writer;

// Re-export the main public API for user convenience.
pub use buffer::{BufferHandle, BufferPool, FrameBuffer};
pub use error::{Error, Result};
pub use event::{ErrorReporter, FailureEvent};
pub use framing::{
    CrlfCodec, ElasticRawCodec, FrameCodec, LengthHeaderCodec, RawCodec, StxEtxCodec,
    TerminatorCodec, DEFAULT_MAX_MESSAGE_SIZE, ETX, STX,
};
pub use reader::FrameReader;
pub use writer::FrameWriter;
