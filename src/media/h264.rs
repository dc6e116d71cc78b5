//! H.264 video tags
//!
//! Slices travel as AVCC: each NAL unit is prefixed with its length instead
//! of an Annex-B start code. A video tag body is
//!
//! ```text
//! [frame type | codec id] [AVCPacketType] [composition time SI24] [data]
//!       0x17 / 0x27        0 = config        always 0 when written
//!                          1 = NAL units
//!                          2 = end of sequence
//! ```
//!
//! and the decoder configuration sent before the first slice is
//!
//! ```text
//! [version = 1] [profile] [compat] [level] [0xFF: 4-byte lengths]
//! [0xE1: one SPS] [sps len u16] [sps] [0x01: one PPS] [pps len u16] [pps]
//! ```
//!
//! Written tags always hold exactly one NAL unit with a 4-byte length.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{MediaError, Result};

use super::flv::{MediaTag, VideoFrameType, CODEC_ID_AVC};
use super::nal::{split_annexb, NalUnit};

/// Frame type + codec byte for an AVC keyframe
pub const AVC_KEYFRAME: u8 = 0x17;
/// Frame type + codec byte for an AVC inter frame
pub const AVC_INTER_FRAME: u8 = 0x27;

/// Size of the video tag header written before an AVCC length prefix
const VIDEO_TAG_HEADER_LEN: usize = 5;
/// Length prefix size written before every NAL unit
const NALU_LENGTH_SIZE: usize = 4;

/// AVC packet type (second byte of a video tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    /// AVCDecoderConfigurationRecord
    SequenceHeader = 0,
    /// One or more length-prefixed NAL units
    Nalu = 1,
    EndOfSequence = 2,
}

impl AvcPacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AvcPacketType::SequenceHeader),
            1 => Some(AvcPacketType::Nalu),
            2 => Some(AvcPacketType::EndOfSequence),
            _ => None,
        }
    }
}

/// NAL unit types seen in encoder output
///
/// Data partitions and the reserved range are not produced by the encoders
/// this crate is fed from and classify as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    /// Non-IDR slice
    Slice = 1,
    /// IDR slice (keyframe)
    Idr = 5,
    /// Supplemental enhancement information
    Sei = 6,
    /// Sequence parameter set
    Sps = 7,
    /// Picture parameter set
    Pps = 8,
    /// Access unit delimiter
    Aud = 9,
    Filler = 12,
}

impl NaluType {
    /// Classify a NAL header byte by its low 5 bits
    pub fn from_byte(header: u8) -> Option<Self> {
        Some(match header & 0x1F {
            1 => NaluType::Slice,
            5 => NaluType::Idr,
            6 => NaluType::Sei,
            7 => NaluType::Sps,
            8 => NaluType::Pps,
            9 => NaluType::Aud,
            12 => NaluType::Filler,
            _ => return None,
        })
    }

    pub fn is_keyframe(&self) -> bool {
        *self == NaluType::Idr
    }

    /// Coded picture data that becomes a video tag
    pub fn is_slice(&self) -> bool {
        matches!(self, NaluType::Slice | NaluType::Idr)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Sps | NaluType::Pps)
    }
}

/// A video tag body read back into its parts
#[derive(Debug, Clone)]
pub enum AvcPacket {
    SequenceHeader(AvcConfig),
    Nalu {
        /// Frame type nibble said keyframe
        keyframe: bool,
        /// Signed composition time offset in milliseconds
        composition_time: i32,
        /// Length-prefixed NAL units, see [`avcc_units`]
        nalus: Bytes,
    },
    EndOfSequence,
}

/// AVCDecoderConfigurationRecord, the payload of the video sequence header
#[derive(Debug, Clone)]
pub struct AvcConfig {
    /// profile_idc, `sps[1]`
    pub profile: u8,
    /// constraint flags, `sps[2]`
    pub compatibility: u8,
    /// level_idc, `sps[3]` (31 means 3.1)
    pub level: u8,
    pub nalu_length_size: u8,
    /// SPS units, NAL header included
    pub sps: Vec<Bytes>,
    /// PPS units, NAL header included
    pub pps: Vec<Bytes>,
    /// Serialized record
    pub raw: Bytes,
}

impl AvcConfig {
    /// Build a configuration record from a single SPS and PPS NAL unit.
    ///
    /// Both slices start at the NAL header byte (no start code). The
    /// profile, compatibility and level bytes are copied from `sps[1..4]`.
    pub fn from_parameter_sets(sps: &[u8], pps: &[u8]) -> Result<Self> {
        if sps.len() < 4 {
            return Err(MediaError::MalformedParameterSet("SPS shorter than 4 bytes").into());
        }
        if pps.is_empty() {
            return Err(MediaError::MalformedParameterSet("empty PPS").into());
        }
        let sps_len = u16::try_from(sps.len())
            .map_err(|_| MediaError::MalformedParameterSet("SPS longer than 65535 bytes"))?;
        let pps_len = u16::try_from(pps.len())
            .map_err(|_| MediaError::MalformedParameterSet("PPS longer than 65535 bytes"))?;

        let mut record = BytesMut::with_capacity(11 + sps.len() + pps.len());
        record.put_u8(0x01); // configurationVersion
        record.put_u8(sps[1]); // AVCProfileIndication
        record.put_u8(sps[2]); // profile_compatibility
        record.put_u8(sps[3]); // AVCLevelIndication
        record.put_u8(0xFF); // lengthSizeMinusOne = 3

        record.put_u8(0xE1); // numOfSequenceParameterSets = 1
        record.put_u16(sps_len);
        record.put_slice(sps);

        record.put_u8(0x01); // numOfPictureParameterSets
        record.put_u16(pps_len);
        record.put_slice(pps);

        Ok(AvcConfig {
            profile: sps[1],
            compatibility: sps[2],
            level: sps[3],
            nalu_length_size: NALU_LENGTH_SIZE as u8,
            sps: vec![Bytes::copy_from_slice(sps)],
            pps: vec![Bytes::copy_from_slice(pps)],
            raw: record.freeze(),
        })
    }

    /// Build a configuration record from an Annex-B access unit carrying
    /// exactly one SPS and one PPS.
    ///
    /// Units are picked by type, so PPS length and start code sizes are
    /// free; other unit types (AUD, SEI) are ignored.
    pub fn from_access_unit(access_unit: &[u8]) -> Result<Self> {
        let units = split_annexb(access_unit)?;

        let sps = single_unit(&units, NaluType::Sps)?
            .ok_or(MediaError::MalformedParameterSet("no SPS unit"))?;
        let pps = single_unit(&units, NaluType::Pps)?
            .ok_or(MediaError::MalformedParameterSet("no PPS unit"))?;

        Self::from_parameter_sets(sps.payload, pps.payload)
    }

    /// Read an AVCDecoderConfigurationRecord back
    pub fn parse(record: Bytes) -> Result<Self> {
        let raw = record.clone();
        let mut data = record;

        if data.remaining() < 6 || data.get_u8() != 0x01 {
            return Err(MediaError::InvalidAvcPacket.into());
        }

        let profile = data.get_u8();
        let compatibility = data.get_u8();
        let level = data.get_u8();
        let nalu_length_size = (data.get_u8() & 0x03) + 1;

        let sps_count = data.get_u8() & 0x1F;
        let sps = read_parameter_sets(&mut data, sps_count)?;

        if !data.has_remaining() {
            return Err(MediaError::InvalidAvcPacket.into());
        }
        let pps_count = data.get_u8();
        let pps = read_parameter_sets(&mut data, pps_count)?;

        Ok(AvcConfig {
            profile,
            compatibility,
            level,
            nalu_length_size,
            sps,
            pps,
            raw,
        })
    }

    /// Wrap the record in an AVC sequence header tag (timestamp 0).
    pub fn sequence_header_tag(&self) -> MediaTag {
        let mut body = BytesMut::with_capacity(VIDEO_TAG_HEADER_LEN + self.raw.len());
        body.put_u8(AVC_KEYFRAME);
        body.put_u8(AvcPacketType::SequenceHeader as u8);
        body.put_slice(&[0x00, 0x00, 0x00]); // composition time
        body.put_slice(&self.raw);

        MediaTag::video(0, body.freeze(), true, true)
    }

    /// Profile name for logging
    pub fn profile_name(&self) -> &'static str {
        const PROFILES: &[(u8, &str)] = &[
            (66, "Baseline"),
            (77, "Main"),
            (88, "Extended"),
            (100, "High"),
            (110, "High 10"),
            (122, "High 4:2:2"),
            (244, "High 4:4:4 Predictive"),
        ];

        PROFILES
            .iter()
            .find(|(idc, _)| *idc == self.profile)
            .map_or("Unknown", |&(_, name)| name)
    }

    /// Level as "major.minor"
    pub fn level_string(&self) -> String {
        format!("{}.{}", self.level / 10, self.level % 10)
    }
}

/// Find the only unit of `nalu_type`, rejecting duplicates.
fn single_unit<'a>(units: &[NalUnit<'a>], nalu_type: NaluType) -> Result<Option<NalUnit<'a>>> {
    let mut found = units.iter().filter(|u| u.nalu_type() == Some(nalu_type));
    let first = found.next().copied();
    if found.next().is_some() {
        let reason = match nalu_type {
            NaluType::Sps => "more than one SPS unit",
            _ => "more than one PPS unit",
        };
        return Err(MediaError::MalformedParameterSet(reason).into());
    }
    Ok(first)
}

/// Read `count` u16-length-prefixed parameter sets
fn read_parameter_sets(data: &mut Bytes, count: u8) -> Result<Vec<Bytes>> {
    let mut sets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if data.remaining() < 2 {
            return Err(MediaError::InvalidAvcPacket.into());
        }
        let len = data.get_u16() as usize;
        if data.remaining() < len {
            return Err(MediaError::InvalidAvcPacket.into());
        }
        sets.push(data.split_to(len));
    }
    Ok(sets)
}

/// Packetize a single slice NAL unit into a video tag.
///
/// ```text
/// [0x17|0x27][0x01][00 00 00][length u32 BE][NAL unit...]
/// ```
pub fn build_nalu_tag(unit: &NalUnit<'_>, timestamp: u32) -> Result<MediaTag> {
    let nalu = unit.payload;
    if nalu.is_empty() {
        return Err(MediaError::EmptyPayload.into());
    }

    let keyframe = match unit.nalu_type() {
        Some(t) if t.is_slice() => t.is_keyframe(),
        _ => return Err(MediaError::UnsupportedNalType(unit.type_id()).into()),
    };
    let length = u32::try_from(nalu.len()).map_err(|_| MediaError::InvalidAvcPacket)?;

    let mut body = BytesMut::with_capacity(VIDEO_TAG_HEADER_LEN + NALU_LENGTH_SIZE + nalu.len());
    body.put_u8(if keyframe { AVC_KEYFRAME } else { AVC_INTER_FRAME });
    body.put_u8(AvcPacketType::Nalu as u8);
    body.put_slice(&[0x00, 0x00, 0x00]); // composition time
    body.put_u32(length);
    body.put_slice(nalu);

    Ok(MediaTag::video(timestamp, body.freeze(), keyframe, false))
}

impl AvcPacket {
    /// Parse a whole video tag body, starting at the frame type/codec byte.
    ///
    /// Only AVC bodies are understood.
    pub fn parse(mut body: Bytes) -> Result<Self> {
        if body.remaining() < VIDEO_TAG_HEADER_LEN {
            return Err(MediaError::InvalidAvcPacket.into());
        }

        let marker = body.get_u8();
        if marker & 0x0F != CODEC_ID_AVC {
            return Err(MediaError::InvalidAvcPacket.into());
        }
        let packet_type = body.get_u8();
        // SI24, sign-extended through the top byte
        let composition_time = ((body.get_uint(3) as i32) << 8) >> 8;

        match AvcPacketType::from_byte(packet_type) {
            Some(AvcPacketType::SequenceHeader) => {
                Ok(AvcPacket::SequenceHeader(AvcConfig::parse(body)?))
            }
            Some(AvcPacketType::Nalu) => Ok(AvcPacket::Nalu {
                keyframe: VideoFrameType::from_byte(marker)
                    .is_some_and(|frame_type| frame_type.is_keyframe()),
                composition_time,
                nalus: body,
            }),
            Some(AvcPacketType::EndOfSequence) => Ok(AvcPacket::EndOfSequence),
            None => Err(MediaError::InvalidAvcPacket.into()),
        }
    }

    pub fn is_keyframe(&self) -> bool {
        match self {
            AvcPacket::SequenceHeader(_) => true,
            AvcPacket::Nalu { keyframe, .. } => *keyframe,
            AvcPacket::EndOfSequence => false,
        }
    }

    pub fn is_sequence_header(&self) -> bool {
        matches!(self, AvcPacket::SequenceHeader(_))
    }
}

/// Iterate over 4-byte length-prefixed NAL units.
///
/// Stops at the first unit whose length runs past the end of `data`.
pub fn avcc_units(data: &[u8]) -> AvccUnits<'_> {
    AvccUnits { rest: data }
}

/// Iterator returned by [`avcc_units`]
#[derive(Debug, Clone)]
pub struct AvccUnits<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for AvccUnits<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (prefix, rest) = self.rest.split_first_chunk::<NALU_LENGTH_SIZE>()?;
        let len = u32::from_be_bytes(*prefix) as usize;
        if rest.len() < len {
            self.rest = &[];
            return None;
        }

        let (unit, rest) = rest.split_at(len);
        self.rest = rest;
        Some(unit)
    }
}
