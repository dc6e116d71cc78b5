//! flv-mux: H.264/AAC to FLV tag muxer for RTMP publishing
//!
//! This library turns encoder output into FLV tag bodies ready to be sent
//! as RTMP audio/video messages:
//! - Annex-B start code detection and NAL unit classification
//! - AVC decoder configuration records built from SPS/PPS
//! - Length-prefixed (AVCC) video tags with keyframe marking
//! - AAC audio tags, config vs. raw frame decided by payload length
//! - Dispatch of finished packets to a pluggable transport session
//!
//! Connection setup, handshakes and the network write belong to the
//! [`session::Transport`] implementation.
//!
//! # Example
//!
//! ```no_run
//! use flv_mux::muxer::{MuxerConfig, StreamMuxer};
//! use flv_mux::session::ChannelTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (transport, mut packets) = ChannelTransport::open(1, 256);
//!
//!     tokio::spawn(async move {
//!         while let Some(packet) = packets.recv().await {
//!             println!("{:?} {} bytes", packet.envelope.channel, packet.envelope.size());
//!         }
//!     });
//!
//!     let mut muxer = StreamMuxer::new(transport, MuxerConfig::default());
//!     muxer.write_audio(&[0x12, 0x10], 0)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod media;
pub mod muxer;
pub mod session;
pub mod stats;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use muxer::{DispatchOutcome, MuxerConfig, StreamMuxer, TagDispatcher};
pub use session::{ChannelTransport, PacketEnvelope, Transport};
