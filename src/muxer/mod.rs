//! H.264/AAC to FLV tag muxing
//!
//! ```text
//! access unit ──► demux ──► AvcConfig / build_nalu_tag ──┐
//!                                                        ├──► TagDispatcher ──► Transport
//! AAC payload ──► build_audio_tag ───────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod stream;

pub use config::MuxerConfig;
pub use dispatcher::{DispatchOutcome, TagDispatcher};
pub use stream::StreamMuxer;
