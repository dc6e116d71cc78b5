//! Tag dispatcher
//!
//! Wraps finished tags into envelopes and hands them to the transport.
//! A missing connection is not an error: live frames produced while the
//! session is down are dropped, never queued or retried.

use crate::error::{Result, TransportError};
use crate::media::flv::{MediaTag, TagType};
use crate::session::{Channel, HeaderSize, PacketEnvelope, Transport};

use super::config::MuxerConfig;

/// What happened to a dispatched tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The transport accepted the envelope
    Sent,
    /// No session was available; the tag was discarded
    Dropped,
}

/// Sends media tags over a transport session
#[derive(Debug)]
pub struct TagDispatcher<T> {
    transport: T,
    config: MuxerConfig,
}

impl<T: Transport> TagDispatcher<T> {
    /// Create a dispatcher owning the given session
    pub fn new(transport: T, config: MuxerConfig) -> Self {
        Self { transport, config }
    }

    /// Build the envelope a tag would be sent in
    pub fn envelope(&self, tag: MediaTag) -> PacketEnvelope {
        let chunk_stream_id = match tag.tag_type {
            TagType::Video => self.config.video_chunk_stream_id,
            TagType::Audio => self.config.audio_chunk_stream_id,
        };
        // Only the AVC decoder configuration rides a medium header; the AAC
        // config goes out like any other audio sample
        let header_size = if tag.is_video() && tag.is_sequence_header {
            HeaderSize::Medium
        } else {
            HeaderSize::Large
        };

        PacketEnvelope {
            channel: Channel::from(tag.tag_type),
            chunk_stream_id,
            header_size,
            stream_id: self.transport.stream_id(),
            timestamp: tag.timestamp,
            body: tag.data,
        }
    }

    /// Send a tag. The tag body moves into the transport.
    ///
    /// Returns `Dropped` when the session is not connected; transport
    /// failures other than that are returned to the caller.
    pub fn dispatch(&mut self, tag: MediaTag) -> Result<DispatchOutcome> {
        if !self.transport.is_connected() {
            tracing::debug!(
                channel = ?tag.tag_type,
                timestamp = tag.timestamp,
                "Not connected, dropping tag"
            );
            return Ok(DispatchOutcome::Dropped);
        }

        let envelope = self.envelope(tag);
        let (channel, timestamp, size) = (envelope.channel, envelope.timestamp, envelope.size());

        match self.transport.send(envelope, self.config.reliable) {
            Ok(()) => {
                tracing::trace!(
                    channel = ?channel,
                    timestamp = timestamp,
                    size = size,
                    "Tag sent"
                );
                Ok(DispatchOutcome::Sent)
            }
            Err(TransportError::NotConnected) => {
                tracing::debug!(
                    channel = ?channel,
                    timestamp = timestamp,
                    "Session went away, dropping tag"
                );
                Ok(DispatchOutcome::Dropped)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport (e.g. to close it)
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::error::Error;

    /// In-memory transport recording every send
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        pub connected: bool,
        pub stream_id: u32,
        pub sent: Vec<(PacketEnvelope, bool)>,
        pub fail_with: Option<fn() -> TransportError>,
    }

    impl RecordingTransport {
        pub fn connected(stream_id: u32) -> Self {
            Self {
                connected: true,
                stream_id,
                ..Default::default()
            }
        }
    }

    impl Transport for RecordingTransport {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send(
            &mut self,
            envelope: PacketEnvelope,
            reliable: bool,
        ) -> std::result::Result<(), TransportError> {
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            self.sent.push((envelope, reliable));
            Ok(())
        }

        fn stream_id(&self) -> u32 {
            self.stream_id
        }
    }

    fn slice_tag(timestamp: u32) -> MediaTag {
        let body = Bytes::from_static(&[0x27, 0x01, 0, 0, 0, 0, 0, 0, 1, 0x41]);
        MediaTag::video(timestamp, body, false, false)
    }

    #[test]
    fn test_dispatch_video_sample() {
        let mut dispatcher =
            TagDispatcher::new(RecordingTransport::connected(3), MuxerConfig::default());

        let outcome = dispatcher.dispatch(slice_tag(1000)).unwrap();
        assert_eq!(outcome, DispatchOutcome::Sent);

        let (envelope, reliable) = &dispatcher.transport().sent[0];
        assert!(*reliable);
        assert_eq!(envelope.channel, Channel::Video);
        assert_eq!(envelope.chunk_stream_id, 0x04);
        assert_eq!(envelope.header_size, HeaderSize::Large);
        assert_eq!(envelope.stream_id, 3);
        assert_eq!(envelope.timestamp, 1000);
        assert_eq!(envelope.body.len(), 10);
    }

    #[test]
    fn test_sequence_header_header_sizes() {
        let mut dispatcher =
            TagDispatcher::new(RecordingTransport::connected(1), MuxerConfig::default());

        let avc = MediaTag::video(0, Bytes::from_static(&[0x17, 0x00, 0, 0, 0, 0x01]), true, true);
        let aac = MediaTag::audio(0, Bytes::from_static(&[0xAF, 0x00, 0x12, 0x08]), true);
        dispatcher.dispatch(avc).unwrap();
        dispatcher.dispatch(aac).unwrap();

        let sent = &dispatcher.transport().sent;
        assert_eq!(sent[0].0.channel, Channel::Video);
        assert_eq!(sent[0].0.header_size, HeaderSize::Medium);
        assert_eq!(sent[0].0.message_type_id(), 9);

        assert_eq!(sent[1].0.channel, Channel::Audio);
        assert_eq!(sent[1].0.chunk_stream_id, 0x05);
        assert_eq!(sent[1].0.header_size, HeaderSize::Large);
        assert_eq!(sent[1].0.message_type_id(), 8);
    }

    #[test]
    fn test_not_connected_drops_silently() {
        let mut dispatcher =
            TagDispatcher::new(RecordingTransport::default(), MuxerConfig::default());

        let outcome = dispatcher.dispatch(slice_tag(0)).unwrap();
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(dispatcher.transport().sent.is_empty());
    }

    #[test]
    fn test_not_connected_during_send_drops() {
        let mut transport = RecordingTransport::connected(1);
        transport.fail_with = Some(|| TransportError::NotConnected);
        let mut dispatcher = TagDispatcher::new(transport, MuxerConfig::default());

        assert_eq!(dispatcher.dispatch(slice_tag(0)).unwrap(), DispatchOutcome::Dropped);
    }

    #[test]
    fn test_transport_error_propagates() {
        let mut transport = RecordingTransport::connected(1);
        transport.fail_with = Some(|| TransportError::QueueFull);
        let mut dispatcher = TagDispatcher::new(transport, MuxerConfig::default());

        assert!(matches!(
            dispatcher.dispatch(slice_tag(0)),
            Err(Error::Transport(TransportError::QueueFull))
        ));
    }

    #[test]
    fn test_unreliable_config_and_custom_channels() {
        let config = MuxerConfig::default().reliable(false).chunk_stream_ids(6, 7);
        let mut dispatcher = TagDispatcher::new(RecordingTransport::connected(1), config);

        dispatcher.dispatch(slice_tag(0)).unwrap();

        let (envelope, reliable) = &dispatcher.transport().sent[0];
        assert!(!*reliable);
        assert_eq!(envelope.chunk_stream_id, 6);
    }

    #[test]
    fn test_borrowed_transport() {
        let mut transport = RecordingTransport::connected(9);
        {
            let mut dispatcher = TagDispatcher::new(&mut transport, MuxerConfig::default());
            dispatcher.dispatch(slice_tag(5)).unwrap();
        }
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].0.stream_id, 9);
    }
}
