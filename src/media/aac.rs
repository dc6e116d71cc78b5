//! AAC audio packetization
//!
//! RTMP transports AAC audio in raw format (without ADTS headers).
//!
//! AAC Audio Packet Structure:
//! ```text
//! +-----------+---------+----------+----------+---------+
//! |SoundFormat|SoundRate|SoundSize |SoundType | AACType | AACData
//! | (4 bits)  | (2 bits)| (1 bit)  | (1 bit)  | (1 byte)|
//! +-----------+---------+----------+----------+---------+
//! ```
//!
//! Every tag this crate writes starts with `0xAF 0x00`. Whether the payload
//! is an AudioSpecificConfig or a raw frame is decided by its length alone:
//! a 2-byte payload is the config and is always stamped with timestamp 0.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};

use super::flv::MediaTag;

/// SoundFormat/rate/size/type byte: AAC, 44.1 kHz, 16-bit, stereo
pub const AAC_AUDIO_HEADER: u8 = 0xAF;

/// Length of an AudioSpecificConfig payload as delivered by encoders
pub const AUDIO_SPECIFIC_CONFIG_LEN: usize = 2;

/// AAC packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    /// Sequence header (AudioSpecificConfig)
    SequenceHeader = 0,
    /// Raw AAC frame data
    Raw = 1,
}

impl AacPacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AacPacketType::SequenceHeader),
            1 => Some(AacPacketType::Raw),
            _ => None,
        }
    }
}

/// Sampling frequencies addressable by a 4-bit index
const SAMPLING_FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// AudioSpecificConfig (the 2-byte AAC sequence header payload)
///
/// ```text
/// audioObjectType (5) | samplingFrequencyIndex (4) | channelConfiguration (4)
/// | frameLengthFlag (1) | dependsOnCoreCoder (1) | extensionFlag (1)
/// ```
#[derive(Debug, Clone)]
pub struct AudioSpecificConfig {
    /// Audio object type (2 = AAC LC)
    pub audio_object_type: u8,
    pub sampling_frequency_index: u8,
    /// Sampling frequency in Hz
    pub sampling_frequency: u32,
    /// Channel configuration (1 = mono, 2 = stereo, 7 = 7.1)
    pub channel_configuration: u8,
    /// Set for 960-sample frames
    pub frame_length_flag: bool,
    pub raw: Bytes,
}

impl AudioSpecificConfig {
    /// Parse the config payload handed over by an encoder.
    ///
    /// Only the leading 16 bits are read. An explicit 24-bit frequency
    /// (index 15) cannot fit there and is rejected along with the reserved
    /// indexes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let bits = match data {
            [b0, b1, ..] => u16::from_be_bytes([*b0, *b1]),
            _ => return Err(MediaError::InvalidAacPacket.into()),
        };

        let audio_object_type = (bits >> 11) as u8;
        let sampling_frequency_index = ((bits >> 7) & 0x0F) as u8;
        let sampling_frequency = SAMPLING_FREQUENCIES
            .get(sampling_frequency_index as usize)
            .copied()
            .ok_or(MediaError::InvalidAacPacket)?;

        Ok(AudioSpecificConfig {
            audio_object_type,
            sampling_frequency_index,
            sampling_frequency,
            channel_configuration: ((bits >> 3) & 0x0F) as u8,
            frame_length_flag: bits & 0x04 != 0,
            raw: Bytes::copy_from_slice(data),
        })
    }

    /// Human readable profile name
    pub fn profile_name(&self) -> &'static str {
        match self.audio_object_type {
            1 => "AAC Main",
            2 => "AAC LC",
            3 => "AAC SSR",
            4 => "AAC LTP",
            5 => "HE-AAC",
            29 => "HE-AAC v2",
            _ => "Unknown",
        }
    }

    /// Channel count, 0 when the layout is signalled elsewhere
    pub fn channels(&self) -> u8 {
        match self.channel_configuration {
            7 => 8,
            n @ 1..=6 => n,
            _ => 0,
        }
    }

    pub fn samples_per_frame(&self) -> u32 {
        if self.frame_length_flag {
            960
        } else {
            1024
        }
    }

    /// Duration of one frame in milliseconds
    pub fn frame_duration_ms(&self) -> f64 {
        self.samples_per_frame() as f64 * 1000.0 / self.sampling_frequency as f64
    }
}

/// Is this payload an AudioSpecificConfig rather than a raw frame?
pub fn is_sequence_header_payload(payload: &[u8]) -> bool {
    payload.len() == AUDIO_SPECIFIC_CONFIG_LEN
}

/// Packetize an AAC payload into an audio tag.
///
/// ```text
/// [0xAF][0x00][payload...]
/// ```
///
/// A 2-byte payload is treated as the AudioSpecificConfig: its tag is
/// marked as a sequence header and its timestamp forced to 0.
pub fn build_audio_tag(payload: &[u8], timestamp: u32) -> Result<MediaTag> {
    if payload.is_empty() {
        return Err(MediaError::EmptyPayload.into());
    }

    let is_header = is_sequence_header_payload(payload);
    let timestamp = if is_header { 0 } else { timestamp };

    let mut body = BytesMut::with_capacity(2 + payload.len());
    body.put_u8(AAC_AUDIO_HEADER);
    body.put_u8(AacPacketType::SequenceHeader as u8);
    body.put_slice(payload);

    Ok(MediaTag::audio(timestamp, body.freeze(), is_header))
}
