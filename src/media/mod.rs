//! Media packetization
//!
//! This module provides:
//! - Annex-B NAL unit demuxing and splitting
//! - AVC decoder configuration records and H.264 video tags
//! - AAC audio tags
//! - FLV tag model and read-back helpers

pub mod aac;
pub mod flv;
pub mod h264;
pub mod nal;

pub use aac::{build_audio_tag, AacPacketType, AudioSpecificConfig};
pub use flv::{AudioTagHeader, MediaTag, TagType, VideoFrameType};
pub use h264::{avcc_units, build_nalu_tag, AvcConfig, AvcPacket, AvcPacketType, NaluType};
pub use nal::{demux, split_annexb, NalUnit};
