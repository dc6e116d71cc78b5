//! Error types
//!
//! Errors are split by the layer that produces them: `MediaError` for
//! anything wrong with the caller's bitstream, `TransportError` for
//! failures reported by the session that carries the finished packets.

use std::fmt;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug)]
pub enum Error {
    /// Malformed or unsupported media input
    Media(MediaError),
    /// Failure reported by the transport session
    Transport(TransportError),
}

/// Errors raised while parsing or packetizing media
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Access unit too short to hold a start code and a NAL header
    AccessUnitTooShort(usize),
    /// Prefix is not a valid Annex-B start code
    InvalidStartCode,
    /// NAL unit type that cannot be packetized here
    UnsupportedNalType(u8),
    /// SPS/PPS access unit does not match the expected layout
    MalformedParameterSet(&'static str),
    /// Empty payload handed to a packetizer
    EmptyPayload,
    /// Video tag body could not be decoded
    InvalidAvcPacket,
    /// Audio tag body could not be decoded
    InvalidAacPacket,
}

/// Errors reported by a transport session
#[derive(Debug)]
pub enum TransportError {
    /// No active session
    NotConnected,
    /// Outgoing queue is full
    QueueFull,
    /// I/O failure in the underlying connection
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Media(e) => write!(f, "Media error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::AccessUnitTooShort(len) => {
                write!(f, "Access unit too short: {} bytes", len)
            }
            MediaError::InvalidStartCode => write!(f, "Invalid Annex-B start code"),
            MediaError::UnsupportedNalType(t) => write!(f, "Unsupported NAL unit type: {}", t),
            MediaError::MalformedParameterSet(reason) => {
                write!(f, "Malformed parameter set: {}", reason)
            }
            MediaError::EmptyPayload => write!(f, "Empty payload"),
            MediaError::InvalidAvcPacket => write!(f, "Invalid AVC packet"),
            MediaError::InvalidAacPacket => write!(f, "Invalid AAC packet"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotConnected => write!(f, "Not connected"),
            TransportError::QueueFull => write!(f, "Send queue full"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Media(e) => Some(e),
            Error::Transport(e) => Some(e),
        }
    }
}

impl std::error::Error for MediaError {}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MediaError> for Error {
    fn from(e: MediaError) -> Self {
        Error::Media(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_display() {
        assert_eq!(
            MediaError::UnsupportedNalType(6).to_string(),
            "Unsupported NAL unit type: 6"
        );
        assert_eq!(
            MediaError::AccessUnitTooShort(2).to_string(),
            "Access unit too short: 2 bytes"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = MediaError::EmptyPayload.into();
        assert!(matches!(err, Error::Media(MediaError::EmptyPayload)));

        let err: Error = TransportError::QueueFull.into();
        assert_eq!(err.to_string(), "Transport error: Send queue full");
    }

    #[test]
    fn test_io_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err = Error::from(TransportError::from(io));
        let source = std::error::Error::source(&err).unwrap();
        assert!(std::error::Error::source(source).is_some());
    }
}
