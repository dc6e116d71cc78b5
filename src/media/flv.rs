//! FLV media tags
//!
//! The muxer emits FLV tag *bodies*: the RTMP message payload is an FLV tag
//! without the 11-byte tag header, so only the codec headers and the
//! elementary stream data are produced here.
//!
//! Video tag body:
//! ```text
//! +----------+----------+
//! | FrameType| CodecID  | AVCPacketType | CompositionTime | Data
//! | (4 bits) | (4 bits) |
//! +----------+----------+
//! ```
//!
//! Audio tag body:
//! ```text
//! +-----------+---------+----------+----------+
//! |SoundFormat|SoundRate|SoundSize |SoundType | AACPacketType | Data
//! | (4 bits)  | (2 bits)| (1 bit)  | (1 bit)  |
//! +-----------+---------+----------+----------+
//! ```

use bytes::Bytes;

/// CodecID of AVC in the low nibble of a video tag
pub const CODEC_ID_AVC: u8 = 7;

/// SoundFormat of AAC in the high nibble of an audio tag
pub const SOUND_FORMAT_AAC: u8 = 10;

/// Tag type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Audio,
    Video,
}

impl TagType {
    /// FLV tag type / RTMP message type id
    pub fn type_id(&self) -> u8 {
        match self {
            TagType::Audio => 8,
            TagType::Video => 9,
        }
    }
}

/// Frame type nibble of a video tag
///
/// The muxer only ever writes keyframes and inter frames; the other FLV
/// frame types are read back as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    Keyframe = 1,
    InterFrame = 2,
}

impl VideoFrameType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b >> 4 {
            1 => Some(VideoFrameType::Keyframe),
            2 => Some(VideoFrameType::InterFrame),
            _ => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        *self == VideoFrameType::Keyframe
    }
}

/// Decoded first byte of an audio tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTagHeader {
    /// SoundFormat (10 = AAC)
    pub sound_format: u8,
    /// Nominal sample rate in Hz. AAC always signals 44100 here and carries
    /// the real rate in its AudioSpecificConfig.
    pub sample_rate: u32,
    /// 8 or 16
    pub sample_bits: u8,
    pub stereo: bool,
}

impl AudioTagHeader {
    pub fn from_byte(b: u8) -> Self {
        let sample_rate = match (b >> 2) & 0x03 {
            0 => 5512,
            1 => 11025,
            2 => 22050,
            _ => 44100,
        };

        Self {
            sound_format: b >> 4,
            sample_rate,
            sample_bits: if b & 0x02 != 0 { 16 } else { 8 },
            stereo: b & 0x01 != 0,
        }
    }

    pub fn is_aac(&self) -> bool {
        self.sound_format == SOUND_FORMAT_AAC
    }
}

/// A packetized media tag, ready for dispatch
#[derive(Debug, Clone)]
pub struct MediaTag {
    /// Tag type
    pub tag_type: TagType,
    /// Timestamp in milliseconds
    pub timestamp: u32,
    /// Tag body (codec headers + payload)
    pub data: Bytes,
    /// IDR slice or AVC sequence header (always false for audio)
    pub is_keyframe: bool,
    /// AVC decoder configuration record or AAC AudioSpecificConfig
    pub is_sequence_header: bool,
}

impl MediaTag {
    /// Create a new video tag
    pub fn video(timestamp: u32, data: Bytes, is_keyframe: bool, is_sequence_header: bool) -> Self {
        Self {
            tag_type: TagType::Video,
            timestamp,
            data,
            is_keyframe,
            is_sequence_header,
        }
    }

    /// Create a new audio tag
    pub fn audio(timestamp: u32, data: Bytes, is_sequence_header: bool) -> Self {
        Self {
            tag_type: TagType::Audio,
            timestamp,
            data,
            is_keyframe: false,
            is_sequence_header,
        }
    }

    pub fn is_video(&self) -> bool {
        self.tag_type == TagType::Video
    }

    pub fn is_audio(&self) -> bool {
        self.tag_type == TagType::Audio
    }

    /// First body byte, if the tag has one
    fn marker(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Frame type written into a video body
    pub fn video_frame_type(&self) -> Option<VideoFrameType> {
        self.marker()
            .filter(|_| self.is_video())
            .and_then(VideoFrameType::from_byte)
    }

    /// CodecID written into a video body
    pub fn codec_id(&self) -> Option<u8> {
        self.marker().filter(|_| self.is_video()).map(|b| b & 0x0F)
    }

    /// Sound header written into an audio body
    pub fn audio_header(&self) -> Option<AudioTagHeader> {
        self.marker()
            .filter(|_| self.is_audio())
            .map(AudioTagHeader::from_byte)
    }

    /// Size of the tag body in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_frame_type() {
        assert_eq!(VideoFrameType::from_byte(0x17), Some(VideoFrameType::Keyframe));
        assert_eq!(VideoFrameType::from_byte(0x27), Some(VideoFrameType::InterFrame));
        // disposable and generated keyframes never come out of the muxer
        assert_eq!(VideoFrameType::from_byte(0x37), None);
        assert_eq!(VideoFrameType::from_byte(0x00), None);

        assert!(VideoFrameType::Keyframe.is_keyframe());
        assert!(!VideoFrameType::InterFrame.is_keyframe());
    }

    #[test]
    fn test_aac_header_byte() {
        let header = AudioTagHeader::from_byte(0xAF);
        assert!(header.is_aac());
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.sample_bits, 16);
        assert!(header.stereo);

        let mp3_mono = AudioTagHeader::from_byte(0x2A);
        assert!(!mp3_mono.is_aac());
        assert_eq!(mp3_mono.sample_rate, 22050);
        assert!(!mp3_mono.stereo);
    }

    #[test]
    fn test_tag_type_id() {
        assert_eq!(TagType::Audio.type_id(), 8);
        assert_eq!(TagType::Video.type_id(), 9);
    }

    #[test]
    fn test_media_tag_video_construction() {
        let tag = MediaTag::video(1000, Bytes::from_static(&[0x17, 0x01]), true, false);
        assert!(tag.is_video());
        assert!(!tag.is_audio());
        assert_eq!(tag.timestamp, 1000);
        assert!(tag.is_keyframe);
        assert_eq!(tag.video_frame_type(), Some(VideoFrameType::Keyframe));
        assert_eq!(tag.codec_id(), Some(CODEC_ID_AVC));
        assert!(tag.audio_header().is_none());
    }

    #[test]
    fn test_media_tag_audio_construction() {
        let tag = MediaTag::audio(0, Bytes::from_static(&[0xAF, 0x00, 0x12, 0x10]), true);
        assert!(tag.is_audio());
        assert!(tag.is_sequence_header);
        assert!(!tag.is_keyframe);
        assert!(tag.audio_header().unwrap().is_aac());
        assert!(tag.video_frame_type().is_none());
        assert!(tag.codec_id().is_none());
        assert_eq!(tag.size(), 4);
    }

    #[test]
    fn test_media_tag_empty_data() {
        let empty_video = MediaTag::video(0, Bytes::new(), false, false);
        assert!(empty_video.video_frame_type().is_none());
        assert!(empty_video.codec_id().is_none());

        let empty_audio = MediaTag::audio(0, Bytes::new(), false);
        assert!(empty_audio.audio_header().is_none());
    }
}
