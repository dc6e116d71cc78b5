//! Annex-B NAL unit demuxing
//!
//! Encoders hand over H.264 in Annex-B form: every NAL unit is preceded by a
//! start code, either `00 00 01` or `00 00 00 01`.
//!
//! ```text
//! +-------------------+-------------+----------------+
//! | 00 00 (00) 01     | NAL header  | NAL payload... |
//! | start code (3|4)  | F|NRI|Type  |                |
//! +-------------------+-------------+----------------+
//! ```
//!
//! [`demux`] handles the common case of one NAL unit per access unit;
//! [`split_annexb`] walks a buffer holding several (e.g. SPS followed by PPS).

use crate::error::{MediaError, Result};

use super::h264::NaluType;

/// A NAL unit borrowed from an access unit, start code stripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Length of the start code that preceded this unit (3 or 4)
    pub prefix_len: usize,
    /// NAL header byte and payload, never including the start code
    pub payload: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// Raw `nal_unit_type` (low 5 bits of the header byte), 0 when empty
    pub fn type_id(&self) -> u8 {
        self.payload.first().map_or(0, |header| header & 0x1F)
    }

    /// Parsed NAL unit type
    pub fn nalu_type(&self) -> Option<NaluType> {
        self.payload.first().copied().and_then(NaluType::from_byte)
    }

    /// Whether this slice opens a new picture.
    ///
    /// True when `first_mb_in_slice` is 0. The field is ue(v) coded right
    /// after the NAL header, where 0 is a single set bit. Always false for
    /// units that are not slices.
    pub fn starts_picture(&self) -> bool {
        self.nalu_type().is_some_and(|t| t.is_slice())
            && self.payload.get(1).is_some_and(|b| b & 0x80 != 0)
    }
}

/// Determine the start code length at the beginning of `data`.
///
/// The third byte decides: `0x01` means a 3-byte code, `0x00` a 4-byte one.
/// The leading zero bytes are validated rather than assumed.
pub fn start_code_len(data: &[u8]) -> Result<usize> {
    if data.len() < 3 {
        return Err(MediaError::AccessUnitTooShort(data.len()).into());
    }
    if data[0] != 0x00 || data[1] != 0x00 {
        return Err(MediaError::InvalidStartCode.into());
    }

    match data[2] {
        0x01 => Ok(3),
        0x00 if data.len() < 4 => Err(MediaError::AccessUnitTooShort(data.len()).into()),
        0x00 if data[3] == 0x01 => Ok(4),
        _ => Err(MediaError::InvalidStartCode.into()),
    }
}

/// Strip the start code from a single access unit and classify it.
///
/// Only SPS, IDR slice and non-IDR slice units are accepted; anything else is
/// reported as [`MediaError::UnsupportedNalType`].
pub fn demux(access_unit: &[u8]) -> Result<NalUnit<'_>> {
    let prefix_len = start_code_len(access_unit)?;
    if access_unit.len() <= prefix_len {
        return Err(MediaError::AccessUnitTooShort(access_unit.len()).into());
    }

    let unit = NalUnit {
        prefix_len,
        payload: &access_unit[prefix_len..],
    };

    match unit.nalu_type() {
        Some(NaluType::Sps | NaluType::Idr | NaluType::Slice) => Ok(unit),
        _ => Err(MediaError::UnsupportedNalType(unit.type_id()).into()),
    }
}

/// Locate every start code in `data` as `(offset, length)` pairs.
fn find_start_codes(data: &[u8]) -> Vec<(usize, usize)> {
    let mut codes = Vec::new();
    let mut i = 0;

    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            // A zero right before `00 00 01` belongs to a 4-byte code
            if i > 0 && data[i - 1] == 0x00 {
                codes.push((i - 1, 4));
            } else {
                codes.push((i, 3));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    codes
}

/// Split an Annex-B buffer into its NAL units.
///
/// The buffer must begin with a start code. Empty units between adjacent
/// start codes are skipped and trailing zero bytes are trimmed from each
/// unit; a NAL unit always ends in its RBSP stop bit, so they cannot be data.
pub fn split_annexb(data: &[u8]) -> Result<Vec<NalUnit<'_>>> {
    // Validates the leading code, including the too-short cases
    start_code_len(data)?;

    let codes = find_start_codes(data);
    match codes.first() {
        Some(&(0, _)) => {}
        _ => return Err(MediaError::InvalidStartCode.into()),
    }

    let mut units = Vec::with_capacity(codes.len());
    for (idx, &(offset, prefix_len)) in codes.iter().enumerate() {
        let start = offset + prefix_len;
        let end = codes.get(idx + 1).map_or(data.len(), |&(next, _)| next);

        let mut payload = &data[start..end];
        while let [rest @ .., 0x00] = payload {
            payload = rest;
        }

        if !payload.is_empty() {
            units.push(NalUnit {
                prefix_len,
                payload,
            });
        }
    }

    if units.is_empty() {
        return Err(MediaError::AccessUnitTooShort(data.len()).into());
    }

    Ok(units)
}
