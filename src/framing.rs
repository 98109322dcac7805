//! Defines the framing strategies that turn a continuous byte stream into
//! discrete frames, and write frames back.
//!
//! Every codec is a small strategy value implementing [`FrameCodec`]:
//! `serialize` writes one frame's header/delimiter plus payload, and
//! `deserialize` blocks until one full frame is available, the stream ends
//! cleanly between frames (`Ok(None)`), or a failure occurs. Partial reads
//! are looped internally; read timeouts surface as [`Error::Timeout`].

use std::io::{self, Read, Write};

use log::debug;

use crate::buffer::{BufferSource, FrameBuffer};
use crate::error::{Error, Result};
use crate::event::{self, ErrorReporter};

/// Default maximum message size in octets.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2_048_000;

/// Start-of-text marker used by [`StxEtxCodec`].
pub const STX: u8 = 0x02;

/// End-of-text marker used by [`StxEtxCodec`].
pub const ETX: u8 = 0x03;

//--- FrameCodec Trait ---

/// A strategy that converts between frames and their wire representation on
/// a byte stream.
///
/// A codec owns no socket; it borrows the stream for the duration of one
/// call. A single codec instance (and its buffer pool) must be driven by
/// exactly one logical reader at a time.
pub trait FrameCodec {
    /// Writes one frame (header/delimiter plus payload) to the stream.
    /// Size violations are detected before anything is written, so no
    /// partial frame is ever emitted.
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()>;

    /// Reads the next frame from the stream.
    ///
    /// Returns `Ok(Some(payload))` with the framing stripped, or `Ok(None)`
    /// when the stream closed cleanly between frames (soft end-of-stream, a
    /// routine outcome the caller must branch on, not an error).
    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>>;
}

//--- Shared read helpers ---

fn map_read_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout(e),
        _ => Error::Io(e),
    }
}

/// Reads a single byte; `Ok(None)` means end-of-stream.
fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_read_error(e)),
        }
    }
}

/// Fills `buf`, looping over partial reads. Returns the number of bytes
/// obtained, which is less than `buf.len()` only if the stream ended.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_read_error(e)),
        }
    }
    Ok(filled)
}

/// Accumulates into `buf` until it holds `total` bytes or the stream ends.
/// Returns the accumulated length; on error the partial bytes remain in
/// `buf` for diagnostics.
fn fill_to<R: Read>(reader: &mut R, buf: &mut FrameBuffer, total: usize) -> Result<usize> {
    while buf.len() < total {
        let remaining = total - buf.len();
        let n = loop {
            match reader.read(&mut buf.spare_mut()[..remaining]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_read_error(e)),
            }
        };
        if n == 0 {
            break;
        }
        buf.advance(n);
    }
    Ok(buf.len())
}

/// One bulk read into the buffer's spare capacity. Returns the byte count;
/// zero means end-of-stream.
fn read_spare<R: Read>(reader: &mut R, buf: &mut FrameBuffer) -> Result<usize> {
    loop {
        match reader.read(buf.spare_mut()) {
            Ok(n) => {
                buf.advance(n);
                return Ok(n);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_read_error(e)),
        }
    }
}

//--- Shared failure formatting ---

fn length_overflow(length: u64, max: usize) -> Error {
    Error::overflow(
        format!("Message length {length} exceeds max message length: {max}"),
        max,
    )
}

fn delimiter_overflow(delimiter: &str, max: usize) -> Error {
    Error::overflow(
        format!("{delimiter} not found before max message length: {max}"),
        max,
    )
}

fn terminator_overflow(terminator: u8, max: usize) -> Error {
    Error::overflow(
        format!("Terminator '{terminator:#04x}' not found before max message length: {max}"),
        max,
    )
}

fn raw_overflow(max: usize) -> Error {
    Error::overflow(
        format!("Socket was not closed before max message length: {max}"),
        max,
    )
}

/// Offset carried on failure events: `None` until the first payload byte.
fn payload_offset(buf: &FrameBuffer) -> Option<usize> {
    if buf.is_empty() {
        None
    } else {
        Some(buf.len())
    }
}

/// How a delimiter scan ended.
enum ScanOutcome {
    Frame,
    SoftEnd,
}

/// How a raw accumulation ended.
enum RawOutcome {
    SoftEnd,
    FrameAtEof,
    FrameAtTimeout,
}

//--- LengthHeaderCodec ---

/// Length-prefixed framing: `[BE unsigned header | payload]`, header width
/// 1, 2, or 4 octets.
///
/// When to use: binary peers that state the payload length up front; the
/// only variant that can carry arbitrary payload bytes (no delimiter to
/// collide with).
///
/// Header values are unsigned end to end: a 4-octet header with the top bit
/// set never goes negative, and the effective length ceiling is
/// `min(max_message_size, u32::MAX)`.
pub struct LengthHeaderCodec {
    header_width: usize,
    inclusive: bool,
    max_message_size: usize,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl LengthHeaderCodec {
    /// Creates a codec with the given header width in octets. Widths other
    /// than 1, 2, or 4 fail with [`Error::InvalidConfiguration`].
    pub fn new(header_width: usize) -> Result<Self> {
        match header_width {
            1 | 2 | 4 => Ok(Self {
                header_width,
                inclusive: false,
                max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
                buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
                reporter: None,
            }),
            other => Err(Error::invalid_configuration(format!(
                "unsupported header width: {other} (must be 1, 2, or 4)"
            ))),
        }
    }

    /// Caps the payload length this codec will encode or decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// When set, the encoded header value counts its own width: a frame of
    /// `n` payload bytes carries `n + width` in the header, and deserialize
    /// subtracts the width back out.
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Accumulates payloads through a pool of up to `pool_size` reusable
    /// buffers instead of allocating per message.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }

    fn header_range(&self) -> u64 {
        match self.header_width {
            1 => u64::from(u8::MAX),
            2 => u64::from(u16::MAX),
            _ => u64::from(u32::MAX),
        }
    }
}

impl std::fmt::Debug for LengthHeaderCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LengthHeaderCodec")
            .field("header_width", &self.header_width)
            .field("inclusive", &self.inclusive)
            .field("max_message_size", &self.max_message_size)
            .field("buffers", &self.buffers)
            .field("reporter", &self.reporter.as_ref().map(|_| "<reporter>"))
            .finish()
    }
}

impl FrameCodec for LengthHeaderCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        if payload.len() > self.max_message_size {
            return Err(length_overflow(payload.len() as u64, self.max_message_size));
        }
        let header_value = payload.len() as u64
            + if self.inclusive {
                self.header_width as u64
            } else {
                0
            };
        if header_value > self.header_range() {
            return Err(Error::malformed(format!(
                "Message length {header_value} does not fit in a {}-octet header",
                self.header_width
            )));
        }
        let bytes = (header_value as u32).to_be_bytes();
        writer.write_all(&bytes[4 - self.header_width..])?;
        writer.write_all(payload)?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        let width = self.header_width;
        let mut header = [0u8; 4];
        let n = match read_full(reader, &mut header[..width]) {
            Ok(n) => n,
            Err(e) => {
                event::report(&self.reporter, &e, &[], None);
                return Err(e);
            }
        };
        if n == 0 {
            // Clean close between frames.
            return Ok(None);
        }
        if n < width {
            let e = Error::closed_after(n, width);
            event::report(&self.reporter, &e, &header[..n], None);
            return Err(e);
        }

        let mut value = [0u8; 4];
        value[4 - width..].copy_from_slice(&header[..width]);
        let raw = u32::from_be_bytes(value);
        debug!("message length is {raw}");

        let length = if self.inclusive {
            if (raw as usize) < width {
                let e = Error::malformed(format!(
                    "Inclusive header value {raw} is smaller than the header width {width}"
                ));
                event::report(&self.reporter, &e, &header[..width], None);
                return Err(e);
            }
            raw - width as u32
        } else {
            raw
        };
        if length as usize > self.max_message_size {
            let e = length_overflow(u64::from(length), self.max_message_size);
            event::report(&self.reporter, &e, &header[..width], None);
            return Err(e);
        }

        let total = length as usize;
        let mut lease = self.buffers.acquire_sized(total);
        let filled = {
            let buf = self.buffers.buffer_mut(&mut lease);
            fill_to(reader, buf, total)
        };
        match filled {
            Ok(got) if got == total => Ok(Some(self.buffers.extract(lease))),
            Ok(got) => {
                let e = Error::closed_after(got, total);
                let buf = self.buffers.buffer_mut(&mut lease);
                event::report(&self.reporter, &e, buf.filled(), Some(got));
                self.buffers.release(lease);
                Err(e)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = Some(buf.len());
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}

//--- Delimiter family ---

/// CRLF-delimited framing: `[payload | '\r' | '\n']`, terminator excluded
/// from the payload.
///
/// When to use: text-oriented peers (the classic telnet-style line
/// protocol). Payload bytes must not contain the CRLF pair.
pub struct CrlfCodec {
    max_message_size: usize,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl CrlfCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
            reporter: None,
        }
    }

    /// Caps the payload length this codec will decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// Accumulates payloads through a pool of up to `pool_size` reusable
    /// buffers instead of allocating per message.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }
}

impl Default for CrlfCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn scan_crlf<R: Read>(reader: &mut R, buf: &mut FrameBuffer, max: usize) -> Result<ScanOutcome> {
    // A bare CR is stashed here until the next byte decides whether it
    // terminates the frame or belongs to the payload.
    let mut pending_cr = false;
    loop {
        let byte = match read_byte(reader)? {
            Some(byte) => byte,
            None => {
                if buf.is_empty() && !pending_cr {
                    return Ok(ScanOutcome::SoftEnd);
                }
                return Err(Error::closed_mid_frame(buf.len() + usize::from(pending_cr)));
            }
        };
        if pending_cr {
            if byte == b'\n' {
                return Ok(ScanOutcome::Frame);
            }
            pending_cr = false;
            if !buf.push(b'\r') {
                return Err(delimiter_overflow("CRLF", max));
            }
        }
        if byte == b'\r' {
            pending_cr = true;
            continue;
        }
        if !buf.push(byte) {
            return Err(delimiter_overflow("CRLF", max));
        }
    }
}

impl FrameCodec for CrlfCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        writer.write_all(payload)?;
        writer.write_all(b"\r\n")?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        let max = self.max_message_size;
        let mut lease = self.buffers.acquire();
        let outcome = {
            let buf = self.buffers.buffer_mut(&mut lease);
            scan_crlf(reader, buf, max)
        };
        match outcome {
            Ok(ScanOutcome::Frame) => Ok(Some(self.buffers.extract(lease))),
            Ok(ScanOutcome::SoftEnd) => {
                self.buffers.release(lease);
                Ok(None)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = payload_offset(buf);
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}

/// STX/ETX framing: `[0x02 | payload | 0x03]`.
///
/// When to use: legacy device protocols that bracket every message in
/// control characters. Payload bytes must not contain ETX.
pub struct StxEtxCodec {
    max_message_size: usize,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl StxEtxCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
            reporter: None,
        }
    }

    /// Caps the payload length this codec will decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// Reuses up to `pool_size` pooled buffers across calls.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }
}

impl Default for StxEtxCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn scan_stx_etx<R: Read>(reader: &mut R, buf: &mut FrameBuffer, max: usize) -> Result<ScanOutcome> {
    match read_byte(reader)? {
        None => return Ok(ScanOutcome::SoftEnd),
        Some(STX) => {}
        Some(_) => return Err(Error::malformed("Expected STX to begin message")),
    }
    loop {
        match read_byte(reader)? {
            None => return Err(Error::closed_mid_frame(buf.len())),
            Some(ETX) => return Ok(ScanOutcome::Frame),
            Some(byte) => {
                if !buf.push(byte) {
                    return Err(delimiter_overflow("ETX", max));
                }
            }
        }
    }
}

impl FrameCodec for StxEtxCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        writer.write_all(&[STX])?;
        writer.write_all(payload)?;
        writer.write_all(&[ETX])?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        let max = self.max_message_size;
        let mut lease = self.buffers.acquire();
        let outcome = {
            let buf = self.buffers.buffer_mut(&mut lease);
            scan_stx_etx(reader, buf, max)
        };
        match outcome {
            Ok(ScanOutcome::Frame) => Ok(Some(self.buffers.extract(lease))),
            Ok(ScanOutcome::SoftEnd) => {
                self.buffers.release(lease);
                Ok(None)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = payload_offset(buf);
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}

/// Single-terminator framing: `[payload | terminator]`, one configurable
/// terminator octet.
///
/// Consecutive terminators are significant: the input `"s\n\n"` yields the
/// frame `"s"`, then a zero-length frame, then soft end-of-stream. An empty
/// message between two terminators is a frame, not a close.
pub struct TerminatorCodec {
    terminator: u8,
    max_message_size: usize,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl TerminatorCodec {
    pub fn new(terminator: u8) -> Self {
        Self {
            terminator,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
            reporter: None,
        }
    }

    /// Caps the payload length this codec will decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// Reuses up to `pool_size` pooled buffers across calls.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }
}

fn scan_terminator<R: Read>(
    reader: &mut R,
    buf: &mut FrameBuffer,
    terminator: u8,
    max: usize,
) -> Result<ScanOutcome> {
    loop {
        match read_byte(reader)? {
            None => {
                if buf.is_empty() {
                    return Ok(ScanOutcome::SoftEnd);
                }
                return Err(Error::closed_mid_frame(buf.len()));
            }
            Some(byte) if byte == terminator => return Ok(ScanOutcome::Frame),
            Some(byte) => {
                if !buf.push(byte) {
                    return Err(terminator_overflow(terminator, max));
                }
            }
        }
    }
}

impl FrameCodec for TerminatorCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        writer.write_all(payload)?;
        writer.write_all(&[self.terminator])?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        let max = self.max_message_size;
        let terminator = self.terminator;
        let mut lease = self.buffers.acquire();
        let outcome = {
            let buf = self.buffers.buffer_mut(&mut lease);
            scan_terminator(reader, buf, terminator, max)
        };
        match outcome {
            Ok(ScanOutcome::Frame) => Ok(Some(self.buffers.extract(lease))),
            Ok(ScanOutcome::SoftEnd) => {
                self.buffers.release(lease);
                Ok(None)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = payload_offset(buf);
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}

//--- Raw family ---

fn read_raw<R: Read>(
    reader: &mut R,
    buf: &mut FrameBuffer,
    max: usize,
    timeout_as_end: bool,
) -> Result<RawOutcome> {
    loop {
        if buf.is_full() {
            // One-byte probe distinguishes a peer that closed exactly at
            // the cap from one that kept sending.
            return match read_byte(reader) {
                Ok(None) => Ok(RawOutcome::FrameAtEof),
                Ok(Some(_)) => Err(raw_overflow(max)),
                Err(Error::Timeout(_)) if timeout_as_end => Ok(RawOutcome::FrameAtTimeout),
                Err(e) => Err(e),
            };
        }
        match read_spare(reader, buf) {
            Ok(0) => {
                if buf.is_empty() {
                    return Ok(RawOutcome::SoftEnd);
                }
                return Ok(RawOutcome::FrameAtEof);
            }
            Ok(_) => {}
            Err(Error::Timeout(e)) => {
                if timeout_as_end && !buf.is_empty() {
                    return Ok(RawOutcome::FrameAtTimeout);
                }
                return Err(Error::Timeout(e));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Raw framing: a frame is whatever bytes arrive until the peer closes the
/// connection.
///
/// When to use: one-shot request/response raw sockets. EOF is the frame
/// boundary, so an abnormal close cannot be distinguished from a normal
/// one and never occurs in this family.
pub struct RawCodec {
    max_message_size: usize,
    timeout_as_end: bool,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl RawCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout_as_end: false,
            buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
            reporter: None,
        }
    }

    /// Caps the payload length this codec will decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// When set, a read timeout with at least one byte accumulated
    /// completes the frame instead of failing. A timeout with nothing
    /// accumulated still fails [`Error::Timeout`].
    pub fn timeout_as_end(mut self, timeout_as_end: bool) -> Self {
        self.timeout_as_end = timeout_as_end;
        self
    }

    /// Accumulates payloads through a pool of up to `pool_size` reusable
    /// buffers instead of allocating per message.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }
}

impl Default for RawCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec for RawCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        writer.write_all(payload)?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        let max = self.max_message_size;
        let timeout_as_end = self.timeout_as_end;
        let mut lease = self.buffers.acquire();
        let outcome = {
            let buf = self.buffers.buffer_mut(&mut lease);
            read_raw(reader, buf, max, timeout_as_end)
        };
        match outcome {
            Ok(RawOutcome::FrameAtEof) | Ok(RawOutcome::FrameAtTimeout) => {
                Ok(Some(self.buffers.extract(lease)))
            }
            Ok(RawOutcome::SoftEnd) => {
                self.buffers.release(lease);
                Ok(None)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = payload_offset(buf);
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}

/// EOF-terminated framing over a transport that multiplexes logical closes:
/// the first end-of-stream terminates the current frame, and a subsequent
/// `deserialize` reports soft end-of-stream rather than re-reading.
///
/// The distinction matters to reconnect logic: `Ok(None)` here is routine
/// ("no more frames, no partial frame in flight"), where a length or
/// delimiter codec ending mid-frame is an error. Call [`reset`](Self::reset)
/// to serve a new logical stream with the same codec value.
pub struct ElasticRawCodec {
    max_message_size: usize,
    timeout_as_end: bool,
    eof_seen: bool,
    buffers: BufferSource,
    reporter: Option<ErrorReporter>,
}

impl ElasticRawCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout_as_end: false,
            eof_seen: false,
            buffers: BufferSource::new(DEFAULT_MAX_MESSAGE_SIZE, 0),
            reporter: None,
        }
    }

    /// Caps the payload length this codec will decode.
    pub fn max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self.buffers = BufferSource::new(max, self.buffers.pool_size());
        self
    }

    /// When set, a read timeout with at least one byte accumulated
    /// completes the frame instead of failing.
    pub fn timeout_as_end(mut self, timeout_as_end: bool) -> Self {
        self.timeout_as_end = timeout_as_end;
        self
    }

    /// Accumulates payloads through a pool of up to `pool_size` reusable
    /// buffers instead of allocating per message.
    pub fn pooled(mut self, pool_size: usize) -> Self {
        self.buffers = BufferSource::new(self.max_message_size, pool_size);
        self
    }

    /// Registers the failure-event sink.
    pub fn reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(crate::event::FailureEvent<'_>) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Rearms the codec after a soft end-of-stream so it can deserialize
    /// from a new logical stream.
    pub fn reset(&mut self) {
        self.eof_seen = false;
    }
}

impl Default for ElasticRawCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec for ElasticRawCodec {
    fn serialize<W: Write>(&self, payload: &[u8], writer: &mut W) -> Result<()> {
        writer.write_all(payload)?;
        Ok(())
    }

    fn deserialize<R: Read>(&mut self, reader: &mut R) -> Result<Option<Vec<u8>>> {
        if self.eof_seen {
            return Ok(None);
        }
        let max = self.max_message_size;
        let timeout_as_end = self.timeout_as_end;
        let mut lease = self.buffers.acquire();
        let outcome = {
            let buf = self.buffers.buffer_mut(&mut lease);
            read_raw(reader, buf, max, timeout_as_end)
        };
        match outcome {
            Ok(RawOutcome::FrameAtEof) => {
                self.eof_seen = true;
                Ok(Some(self.buffers.extract(lease)))
            }
            // A timeout-completed frame did not observe EOF; keep reading
            // on the next call.
            Ok(RawOutcome::FrameAtTimeout) => Ok(Some(self.buffers.extract(lease))),
            Ok(RawOutcome::SoftEnd) => {
                self.eof_seen = true;
                self.buffers.release(lease);
                Ok(None)
            }
            Err(e) => {
                let buf = self.buffers.buffer_mut(&mut lease);
                let offset = payload_offset(buf);
                event::report(&self.reporter, &e, buf.filled(), offset);
                self.buffers.release(lease);
                Err(e)
            }
        }
    }
}
