//! Publishing session boundary
//!
//! The [`Transport`] trait is all the muxer knows about the connection.
//! [`ChannelTransport`] is a ready-made implementation that hands packets
//! to an async task over a bounded channel.

pub mod channel;
pub mod transport;

pub use channel::{ChannelTransport, OutboundPacket};
pub use transport::{Channel, HeaderSize, PacketEnvelope, Transport};
