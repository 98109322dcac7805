//! Pre-configured codec constructors.
//!
//! Convenience functions selecting a codec variant with its conventional
//! configuration; each has a `*_limited` form taking an explicit maximum
//! message size. Anything beyond that (pooling, inclusive headers, failure
//! reporters) is configured through the codec's own builder methods.

use crate::error::Result;
use crate::framing::{
    CrlfCodec, ElasticRawCodec, LengthHeaderCodec, RawCodec, StxEtxCodec, TerminatorCodec,
};

/// CRLF-delimited frames.
pub fn crlf() -> CrlfCodec {
    CrlfCodec::new()
}

pub fn crlf_limited(max_message_size: usize) -> CrlfCodec {
    CrlfCodec::new().max_message_size(max_message_size)
}

/// Newline-terminated frames.
pub fn lf() -> TerminatorCodec {
    TerminatorCodec::new(b'\n')
}

pub fn lf_limited(max_message_size: usize) -> TerminatorCodec {
    TerminatorCodec::new(b'\n').max_message_size(max_message_size)
}

/// Frames terminated by a caller-supplied octet.
pub fn terminator(byte: u8) -> TerminatorCodec {
    TerminatorCodec::new(byte)
}

pub fn terminator_limited(byte: u8, max_message_size: usize) -> TerminatorCodec {
    TerminatorCodec::new(byte).max_message_size(max_message_size)
}

/// STX/ETX-bracketed frames.
pub fn stx_etx() -> StxEtxCodec {
    StxEtxCodec::new()
}

pub fn stx_etx_limited(max_message_size: usize) -> StxEtxCodec {
    StxEtxCodec::new().max_message_size(max_message_size)
}

/// Length-header frames; `header_width` must be 1, 2, or 4 octets.
pub fn length_header(header_width: usize) -> Result<LengthHeaderCodec> {
    LengthHeaderCodec::new(header_width)
}

pub fn length_header_limited(
    header_width: usize,
    max_message_size: usize,
) -> Result<LengthHeaderCodec> {
    Ok(LengthHeaderCodec::new(header_width)?.max_message_size(max_message_size))
}

/// EOF-terminated frames.
pub fn raw() -> RawCodec {
    RawCodec::new()
}

pub fn raw_limited(max_message_size: usize) -> RawCodec {
    RawCodec::new().max_message_size(max_message_size)
}

/// EOF-terminated frames with elastic soft-close semantics.
pub fn elastic_raw() -> ElasticRawCodec {
    ElasticRawCodec::new()
}

pub fn elastic_raw_limited(max_message_size: usize) -> ElasticRawCodec {
    ElasticRawCodec::new().max_message_size(max_message_size)
}
