//! Channel-backed transport
//!
//! Bridges the synchronous muxer to an async connection task: envelopes are
//! pushed into a bounded `tokio::sync::mpsc` channel with `try_send`, so the
//! writer never blocks, and a task holding the receiver does the network I/O.
//!
//! ```no_run
//! use flv_mux::session::ChannelTransport;
//!
//! # async fn example() {
//! let (transport, mut packets) = ChannelTransport::open(1, 256);
//!
//! tokio::spawn(async move {
//!     while let Some(packet) = packets.recv().await {
//!         // write packet.envelope to the connection
//!         let _ = packet;
//!     }
//! });
//! # drop(transport);
//! # }
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::TransportError;

use super::transport::{PacketEnvelope, Transport};

/// An envelope queued for the connection task
#[derive(Debug, Clone)]
pub struct OutboundPacket {
    /// The packet
    pub envelope: PacketEnvelope,
    /// Whether reliable delivery was requested
    pub reliable: bool,
}

/// Transport that queues envelopes for an async consumer
#[derive(Debug)]
pub struct ChannelTransport {
    tx: Option<mpsc::Sender<OutboundPacket>>,
    stream_id: u32,
}

impl ChannelTransport {
    /// Open a session with the given message stream id and queue capacity.
    ///
    /// Returns the transport and the receiving end for the connection task.
    pub fn open(stream_id: u32, capacity: usize) -> (Self, mpsc::Receiver<OutboundPacket>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tracing::debug!(stream_id = stream_id, capacity = capacity, "Channel transport opened");

        let transport = Self {
            tx: Some(tx),
            stream_id,
        };

        (transport, rx)
    }

    /// Close the session. The receiver sees the end of the stream once
    /// queued packets are drained.
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            tracing::debug!(stream_id = self.stream_id, "Channel transport closed");
        }
    }

    /// Remaining queue capacity (0 when closed)
    pub fn capacity(&self) -> usize {
        self.tx.as_ref().map_or(0, |tx| tx.capacity())
    }
}

impl Transport for ChannelTransport {
    fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn send(&mut self, envelope: PacketEnvelope, reliable: bool) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::NotConnected)?;

        tx.try_send(OutboundPacket { envelope, reliable })
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::QueueFull,
                TrySendError::Closed(_) => TransportError::NotConnected,
            })
    }

    fn stream_id(&self) -> u32 {
        self.stream_id
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::session::transport::{Channel, HeaderSize};

    fn envelope(timestamp: u32) -> PacketEnvelope {
        PacketEnvelope {
            channel: Channel::Video,
            chunk_stream_id: 4,
            header_size: HeaderSize::Large,
            stream_id: 1,
            timestamp,
            body: Bytes::from_static(&[0x27, 0x01, 0x00, 0x00, 0x00]),
        }
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (mut transport, mut rx) = ChannelTransport::open(7, 8);
        assert!(transport.is_connected());
        assert_eq!(transport.stream_id(), 7);

        transport.send(envelope(40), true).unwrap();

        let packet = rx.recv().await.unwrap();
        assert_eq!(packet.envelope.timestamp, 40);
        assert!(packet.reliable);
    }

    #[test]
    fn test_queue_full() {
        let (mut transport, mut rx) = ChannelTransport::open(1, 1);
        transport.send(envelope(0), true).unwrap();
        assert_eq!(transport.capacity(), 0);

        assert!(matches!(
            transport.send(envelope(1), true),
            Err(TransportError::QueueFull)
        ));

        let packet = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(packet.envelope.timestamp, 0);
        assert_eq!(transport.capacity(), 1);
    }

    #[test]
    fn test_close() {
        let (mut transport, mut rx) = ChannelTransport::open(1, 4);
        transport.send(envelope(0), false).unwrap();
        transport.close();

        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send(envelope(1), true),
            Err(TransportError::NotConnected)
        ));

        // Already queued packets still drain
        let packet = tokio_test::block_on(rx.recv()).unwrap();
        assert!(!packet.reliable);
        assert!(tokio_test::block_on(rx.recv()).is_none());
    }

    #[test]
    fn test_receiver_dropped() {
        let (mut transport, rx) = ChannelTransport::open(1, 4);
        drop(rx);

        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send(envelope(0), true),
            Err(TransportError::NotConnected)
        ));
    }
}
