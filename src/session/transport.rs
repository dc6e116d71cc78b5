//! Transport boundary
//!
//! The muxer never touches the network. Finished tags are wrapped in a
//! [`PacketEnvelope`] and handed to a [`Transport`], which owns the
//! connection, the chunking and the actual write.

use bytes::Bytes;

use crate::error::TransportError;
use crate::media::flv::TagType;

/// Media channel an envelope travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Video,
    Audio,
}

impl Channel {
    /// RTMP message type id (8 = audio, 9 = video)
    pub fn message_type_id(&self) -> u8 {
        match self {
            Channel::Audio => TagType::Audio.type_id(),
            Channel::Video => TagType::Video.type_id(),
        }
    }
}

impl From<TagType> for Channel {
    fn from(tag_type: TagType) -> Self {
        match tag_type {
            TagType::Video => Channel::Video,
            TagType::Audio => Channel::Audio,
        }
    }
}

/// Chunk message header size class
///
/// A hint for the transport: the AVC sequence header goes out with a medium
/// header, everything else with a large one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSize {
    /// Type 0: full 11-byte message header
    Large,
    /// Type 1: 7-byte header, message stream id omitted
    Medium,
}

impl HeaderSize {
    /// Chunk header `fmt` field
    pub fn fmt(&self) -> u8 {
        match self {
            HeaderSize::Large => 0,
            HeaderSize::Medium => 1,
        }
    }

    /// Message header length in bytes
    pub fn header_len(&self) -> usize {
        match self {
            HeaderSize::Large => 11,
            HeaderSize::Medium => 7,
        }
    }
}

/// Transport-ready wrapper around a tag body
#[derive(Debug, Clone)]
pub struct PacketEnvelope {
    /// Media channel
    pub channel: Channel,
    /// Chunk stream id the channel is multiplexed on
    pub chunk_stream_id: u32,
    /// Header size class hint
    pub header_size: HeaderSize,
    /// Message stream id of the publishing session
    pub stream_id: u32,
    /// Timestamp in milliseconds
    pub timestamp: u32,
    /// FLV tag body
    pub body: Bytes,
}

impl PacketEnvelope {
    /// RTMP message type id for the body
    pub fn message_type_id(&self) -> u8 {
        self.channel.message_type_id()
    }

    /// Body size in bytes
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// A publishing session able to carry finished packets
///
/// Implementations are not expected to be safe for concurrent sends; the
/// muxer calls them from a single writer.
pub trait Transport {
    /// Whether a session is currently established
    fn is_connected(&self) -> bool;

    /// Send one envelope, optionally requesting reliable delivery
    fn send(&mut self, envelope: PacketEnvelope, reliable: bool) -> Result<(), TransportError>;

    /// Message stream id stamped into every envelope
    fn stream_id(&self) -> u32;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&mut self, envelope: PacketEnvelope, reliable: bool) -> Result<(), TransportError> {
        (**self).send(envelope, reliable)
    }

    fn stream_id(&self) -> u32 {
        (**self).stream_id()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(&mut self, envelope: PacketEnvelope, reliable: bool) -> Result<(), TransportError> {
        (**self).send(envelope, reliable)
    }

    fn stream_id(&self) -> u32 {
        (**self).stream_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_message_type() {
        assert_eq!(Channel::Audio.message_type_id(), 8);
        assert_eq!(Channel::Video.message_type_id(), 9);
        assert_eq!(Channel::from(TagType::Video), Channel::Video);
        assert_eq!(Channel::from(TagType::Audio), Channel::Audio);
    }

    #[test]
    fn test_header_size() {
        assert_eq!(HeaderSize::Large.fmt(), 0);
        assert_eq!(HeaderSize::Medium.fmt(), 1);
        assert_eq!(HeaderSize::Large.header_len(), 11);
        assert_eq!(HeaderSize::Medium.header_len(), 7);
    }

    #[test]
    fn test_envelope_accessors() {
        let envelope = PacketEnvelope {
            channel: Channel::Audio,
            chunk_stream_id: 5,
            header_size: HeaderSize::Large,
            stream_id: 1,
            timestamp: 23,
            body: Bytes::from_static(&[0xAF, 0x00, 0x21]),
        };
        assert_eq!(envelope.message_type_id(), 8);
        assert_eq!(envelope.size(), 3);
    }
}
