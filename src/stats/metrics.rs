//! Statistics for a muxed stream

use std::time::{Duration, Instant};

use crate::media::flv::MediaTag;

/// Per-stream muxer statistics
#[derive(Debug, Clone)]
pub struct MuxerStats {
    /// Time the muxer was created
    pub started_at: Instant,
    /// Video tags handed to the transport
    pub video_tags: u64,
    /// Audio tags handed to the transport
    pub audio_tags: u64,
    /// Keyframe tags handed to the transport (sequence headers excluded)
    pub keyframes: u64,
    /// Sequence header tags handed to the transport
    pub sequence_headers: u64,
    /// Tags dropped (not connected, no sequence header yet, stream disabled)
    pub dropped_tags: u64,
    /// Total tag body bytes handed to the transport
    pub bytes_sent: u64,
    /// Last video timestamp sent
    pub last_video_ts: u32,
    /// Last audio timestamp sent
    pub last_audio_ts: u32,
}

impl Default for MuxerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MuxerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            video_tags: 0,
            audio_tags: 0,
            keyframes: 0,
            sequence_headers: 0,
            dropped_tags: 0,
            bytes_sent: 0,
            last_video_ts: 0,
            last_audio_ts: 0,
        }
    }

    /// Account for a tag the transport accepted
    pub fn record_sent(&mut self, tag: &MediaTag) {
        self.bytes_sent += tag.data.len() as u64;

        if tag.is_sequence_header {
            self.sequence_headers += 1;
        } else if tag.is_keyframe {
            self.keyframes += 1;
        }

        if tag.is_video() {
            self.video_tags += 1;
            self.last_video_ts = tag.timestamp;
        } else {
            self.audio_tags += 1;
            self.last_audio_ts = tag.timestamp;
        }
    }

    /// Account for a tag that never reached the transport
    pub fn record_dropped(&mut self) {
        self.dropped_tags += 1;
    }

    /// Time since the muxer was created
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Bitrate in bits per second over the whole stream
    pub fn bitrate(&self) -> u64 {
        Self::bitrate_over(self.bytes_sent, self.duration())
    }

    fn bitrate_over(bytes: u64, duration: Duration) -> u64 {
        let secs = duration.as_secs();
        if secs > 0 {
            (bytes * 8) / secs
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_stats_new() {
        let stats = MuxerStats::new();
        assert_eq!(stats.video_tags, 0);
        assert_eq!(stats.audio_tags, 0);
        assert_eq!(stats.keyframes, 0);
        assert_eq!(stats.dropped_tags, 0);
        assert_eq!(stats.bytes_sent, 0);
    }

    #[test]
    fn test_record_sent() {
        let mut stats = MuxerStats::new();

        stats.record_sent(&MediaTag::video(0, Bytes::from_static(&[0x17, 0x00]), true, true));
        let idr = Bytes::from_static(&[0x17, 0x01, 0x00]);
        stats.record_sent(&MediaTag::video(40, idr, true, false));
        stats.record_sent(&MediaTag::video(80, Bytes::from_static(&[0x27, 0x01]), false, false));
        stats.record_sent(&MediaTag::audio(23, Bytes::from_static(&[0xAF, 0x00, 0x21]), false));

        assert_eq!(stats.video_tags, 3);
        assert_eq!(stats.audio_tags, 1);
        assert_eq!(stats.sequence_headers, 1);
        assert_eq!(stats.keyframes, 1);
        assert_eq!(stats.bytes_sent, 10);
        assert_eq!(stats.last_video_ts, 80);
        assert_eq!(stats.last_audio_ts, 23);
    }

    #[test]
    fn test_record_dropped() {
        let mut stats = MuxerStats::new();
        stats.record_dropped();
        stats.record_dropped();
        assert_eq!(stats.dropped_tags, 2);
        assert_eq!(stats.video_tags, 0);
    }

    #[test]
    fn test_bitrate() {
        // 1,000,000 bytes * 8 bits / 10 seconds = 800,000 bps
        assert_eq!(
            MuxerStats::bitrate_over(1_000_000, Duration::from_secs(10)),
            800_000
        );
        assert_eq!(MuxerStats::bitrate_over(1_000_000, Duration::ZERO), 0);
    }
}
