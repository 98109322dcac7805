use framecodec::*;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

/// A writer that fails with BrokenPipe after `fail_after` bytes.
struct FailingWriter {
    written: usize,
    fail_after: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written >= self.fail_after {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "Simulated I/O error",
            ));
        }
        let remaining = self.fail_after - self.written;
        let n = remaining.min(buf.len());
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader that serves a prefix of bytes and then times out forever.
struct TimeoutReader {
    data: Vec<u8>,
    pos: usize,
}

impl TimeoutReader {
    fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            pos: 0,
        }
    }
}

impl Read for TimeoutReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read deadline"));
        }
        let n = (self.data.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn io_error_propagates_from_serialize() {
    // A write error from the underlying stream must surface as Error::Io.
    let mut writer = FailingWriter {
        written: 0,
        fail_after: 2,
    };
    let codec = LengthHeaderCodec::new(4).unwrap();
    match codec.serialize(b"This frame will not fit", &mut writer) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn invalid_header_width_fails_at_construction() {
    match LengthHeaderCodec::new(3) {
        Err(Error::InvalidConfiguration { message }) => {
            assert!(message.contains('3'), "message: {message}");
        }
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
}

#[test]
fn header_truncated_after_three_of_four() {
    let mut codec = LengthHeaderCodec::new(4).unwrap();
    match codec.deserialize(&mut Cursor::new(vec![0, 0, 0])) {
        Err(Error::AbnormalClose { message, read }) => {
            assert_eq!(read, 3);
            assert!(message.contains("3 of 4"), "message: {message}");
        }
        other => panic!("expected AbnormalClose, got {other:?}"),
    }
}

#[test]
fn payload_truncated_after_one_of_two() {
    // Declares 2 payload bytes, delivers 1.
    let mut codec = LengthHeaderCodec::new(1).unwrap();
    match codec.deserialize(&mut Cursor::new(vec![2, b'x'])) {
        Err(Error::AbnormalClose { message, read }) => {
            assert_eq!(read, 1);
            assert!(message.contains("1 of 2"), "message: {message}");
        }
        other => panic!("expected AbnormalClose, got {other:?}"),
    }
}

#[test]
fn declared_length_over_limit_is_overflow() {
    let mut codec = LengthHeaderCodec::new(4).unwrap().max_message_size(16);
    let mut wire = 17u32.to_be_bytes().to_vec();
    wire.extend_from_slice(&[0u8; 17]);
    match codec.deserialize(&mut Cursor::new(wire)) {
        Err(Error::Overflow { message, limit }) => {
            assert_eq!(limit, 16);
            assert_eq!(message, "Message length 17 exceeds max message length: 16");
        }
        other => panic!("expected Overflow, got {other:?}"),
    }
}

#[test]
fn serialize_rejects_oversized_payload_before_writing() {
    let codec = LengthHeaderCodec::new(4).unwrap().max_message_size(4);
    let mut out = Vec::new();
    assert!(matches!(
        codec.serialize(b"12345", &mut out),
        Err(Error::Overflow { .. })
    ));
    // No partial frame was emitted.
    assert!(out.is_empty());
}

#[test]
fn header_range_exhaustiveness() {
    let one = LengthHeaderCodec::new(1).unwrap();
    let mut out = Vec::new();
    assert!(one.serialize(&vec![0u8; 255], &mut out).is_ok());
    out.clear();
    assert!(matches!(
        one.serialize(&vec![0u8; 256], &mut out),
        Err(Error::Malformed { .. })
    ));

    let two = LengthHeaderCodec::new(2).unwrap();
    out.clear();
    assert!(two.serialize(&vec![0u8; 65_535], &mut out).is_ok());
    out.clear();
    assert!(matches!(
        two.serialize(&vec![0u8; 65_536], &mut out),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn inclusive_mode_shifts_range_down_by_width() {
    let codec = LengthHeaderCodec::new(1).unwrap().inclusive(true);
    let mut out = Vec::new();
    assert!(codec.serialize(&vec![0u8; 254], &mut out).is_ok());
    out.clear();
    assert!(matches!(
        codec.serialize(&vec![0u8; 255], &mut out),
        Err(Error::Malformed { .. })
    ));
}

#[test]
fn inclusive_header_smaller_than_width_is_malformed() {
    // Inclusive header value 1 cannot even cover its own 2-octet width.
    let mut codec = LengthHeaderCodec::new(2).unwrap().inclusive(true);
    match codec.deserialize(&mut Cursor::new(vec![0x00, 0x01])) {
        Err(Error::Malformed { message }) => {
            assert!(message.contains("smaller than the header width"), "message: {message}");
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn crlf_overflow_names_the_limit() {
    let mut codec = CrlfCodec::new().max_message_size(4);
    match codec.deserialize(&mut Cursor::new(b"abcdefgh\r\n".to_vec())) {
        Err(Error::Overflow { message, limit }) => {
            assert_eq!(limit, 4);
            assert_eq!(message, "CRLF not found before max message length: 4");
        }
        other => panic!("expected Overflow, got {other:?}"),
    }
}

#[test]
fn crlf_payload_at_limit_still_fits() {
    let mut codec = CrlfCodec::new().max_message_size(4);
    let frame = codec
        .deserialize(&mut Cursor::new(b"abcd\r\n".to_vec()))
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"abcd");
}

#[test]
fn crlf_close_mid_frame_is_abnormal() {
    let mut codec = CrlfCodec::new();
    match codec.deserialize(&mut Cursor::new(b"ab".to_vec())) {
        Err(Error::AbnormalClose { read, .. }) => assert_eq!(read, 2),
        other => panic!("expected AbnormalClose, got {other:?}"),
    }
}

#[test]
fn crlf_clean_close_between_frames_is_soft_end() {
    let mut codec = CrlfCodec::new();
    let mut stream = Cursor::new(b"ab\r\n".to_vec());
    assert_eq!(codec.deserialize(&mut stream).unwrap().unwrap(), b"ab");
    assert!(codec.deserialize(&mut stream).unwrap().is_none());
}

#[test]
fn stx_etx_requires_stx() {
    let mut codec = StxEtxCodec::new();
    match codec.deserialize(&mut Cursor::new(b"abc\x03".to_vec())) {
        Err(Error::Malformed { message }) => {
            assert_eq!(message, "Expected STX to begin message");
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn stx_etx_overflow_names_the_limit() {
    let mut codec = StxEtxCodec::new().max_message_size(2);
    let mut wire = vec![STX];
    wire.extend_from_slice(b"abc");
    wire.push(ETX);
    match codec.deserialize(&mut Cursor::new(wire)) {
        Err(Error::Overflow { message, limit }) => {
            assert_eq!(limit, 2);
            assert_eq!(message, "ETX not found before max message length: 2");
        }
        other => panic!("expected Overflow, got {other:?}"),
    }
}

#[test]
fn stx_etx_close_mid_scan_carries_offset() {
    let mut codec = StxEtxCodec::new();
    let mut wire = vec![STX];
    wire.extend_from_slice(b"abc");
    match codec.deserialize(&mut Cursor::new(wire)) {
        Err(Error::AbnormalClose { read, .. }) => assert_eq!(read, 3),
        other => panic!("expected AbnormalClose, got {other:?}"),
    }
}

#[test]
fn terminator_overflow_names_terminator_and_limit() {
    let mut codec = TerminatorCodec::new(0xFE).max_message_size(4);
    match codec.deserialize(&mut Cursor::new(b"abcdefgh".to_vec())) {
        Err(Error::Overflow { message, limit }) => {
            assert_eq!(limit, 4);
            assert_eq!(
                message,
                "Terminator '0xfe' not found before max message length: 4"
            );
        }
        other => panic!("expected Overflow, got {other:?}"),
    }
}

#[test]
fn raw_overflow_when_peer_keeps_sending() {
    let mut codec = RawCodec::new().max_message_size(4);
    match codec.deserialize(&mut Cursor::new(b"abcde".to_vec())) {
        Err(Error::Overflow { message, limit }) => {
            assert_eq!(limit, 4);
            assert_eq!(message, "Socket was not closed before max message length: 4");
        }
        other => panic!("expected Overflow, got {other:?}"),
    }
}

#[test]
fn raw_close_exactly_at_limit_is_a_frame() {
    let mut codec = RawCodec::new().max_message_size(4);
    let frame = codec
        .deserialize(&mut Cursor::new(b"abcd".to_vec()))
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"abcd");
}

#[test]
fn timeout_is_translated() {
    let mut codec = CrlfCodec::new();
    let mut stream = TimeoutReader::new(b"par");
    match codec.deserialize(&mut stream) {
        Err(e @ Error::Timeout(_)) => assert_eq!(e.to_string(), "Read timed out"),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[test]
fn raw_timeout_as_end_completes_partial_frame() {
    let mut codec = RawCodec::new().timeout_as_end(true);
    let mut stream = TimeoutReader::new(b"par");
    let frame = codec.deserialize(&mut stream).unwrap().unwrap();
    assert_eq!(frame, b"par");

    // With nothing accumulated a timeout still fails.
    let mut stream = TimeoutReader::new(b"");
    assert!(matches!(
        codec.deserialize(&mut stream),
        Err(Error::Timeout(_))
    ));
}

#[test]
fn reporter_sees_failure_before_it_is_raised() {
    let events: Arc<Mutex<Vec<(String, Vec<u8>, Option<usize>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut codec = StxEtxCodec::new().reporter(move |event: FailureEvent<'_>| {
        sink.lock().unwrap().push((
            event.cause.to_string(),
            event.buffer.to_vec(),
            event.offset,
        ));
    });

    // Close mid-scan: the event carries the partial frame and its offset.
    let mut wire = vec![STX];
    wire.extend_from_slice(b"ab");
    assert!(codec.deserialize(&mut Cursor::new(wire)).is_err());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let (message, partial, offset) = &events[0];
    assert!(message.contains("closed"), "message: {message}");
    assert_eq!(partial, b"ab");
    assert_eq!(*offset, Some(2));
}

#[test]
fn reporter_offset_is_sentinel_for_header_failures() {
    let events: Arc<Mutex<Vec<(Vec<u8>, Option<usize>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut codec = LengthHeaderCodec::new(4)
        .unwrap()
        .reporter(move |event: FailureEvent<'_>| {
            sink.lock()
                .unwrap()
                .push((event.buffer.to_vec(), event.offset));
        });

    assert!(codec.deserialize(&mut Cursor::new(vec![0, 0, 1])).is_err());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let (partial, offset) = &events[0];
    assert_eq!(partial, &vec![0, 0, 1]);
    assert_eq!(*offset, None);
}

#[test]
fn reporter_is_not_called_on_soft_end_of_stream() {
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let mut codec = CrlfCodec::new().reporter(move |_event: FailureEvent<'_>| {
        *sink.lock().unwrap() += 1;
    });

    assert!(codec.deserialize(&mut Cursor::new(Vec::new())).unwrap().is_none());
    assert_eq!(*count.lock().unwrap(), 0);
}
