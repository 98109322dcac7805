use thiserror::Error;

/// Custom error types for the framecodec library.
///
/// Soft end-of-stream is deliberately absent: a stream that closes cleanly
/// between frames is reported as `Ok(None)` from
/// [`FrameCodec::deserialize`](crate::framing::FrameCodec::deserialize),
/// never as an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O errors from std::io operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame would exceed the configured maximum message size: a
    /// header-declared length too large, no delimiter found within the
    /// limit, or a raw stream not closed within the limit. The message
    /// always embeds the configured limit.
    #[error("{message}")]
    Overflow { message: String, limit: usize },

    /// Structurally invalid input, such as an STX/ETX frame that does not
    /// begin with STX, or a payload whose length does not fit the header's
    /// unsigned range at encode time.
    #[error("{message}")]
    Malformed { message: String },

    /// The stream terminated while a frame was partially accumulated.
    /// `read` is the number of bytes obtained before the close.
    #[error("{message}")]
    AbnormalClose { message: String, read: usize },

    /// A bounded read exceeded its deadline.
    #[error("Read timed out")]
    Timeout(#[source] std::io::Error),

    /// The codec was constructed with an unsupported header width or
    /// contradictory options. Raised at construction, never at call time.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl Error {
    /// Create a new `Overflow` error with a descriptive message and the
    /// configured limit.
    pub fn overflow(message: impl Into<String>, limit: usize) -> Self {
        Self::Overflow {
            message: message.into(),
            limit,
        }
    }

    /// Create a new `Malformed` error with a descriptive message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create an `AbnormalClose` error for a stream that closed after
    /// `read` of `expected` bytes.
    pub fn closed_after(read: usize, expected: usize) -> Self {
        Self::AbnormalClose {
            message: format!("Stream closed after {read} of {expected} bytes"),
            read,
        }
    }

    /// Create an `AbnormalClose` error for a stream that closed mid-frame
    /// when the expected total is unknown (delimiter scans).
    pub fn closed_mid_frame(read: usize) -> Self {
        Self::AbnormalClose {
            message: format!("Stream closed while reading frame; {read} bytes read"),
            read,
        }
    }

    /// Create a new `InvalidConfiguration` error with a descriptive message.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;
