//! Muxer configuration

/// Chunk stream id conventionally used for video by librtmp publishers
pub const DEFAULT_VIDEO_CHUNK_STREAM_ID: u32 = 0x04;

/// Chunk stream id conventionally used for audio by librtmp publishers
pub const DEFAULT_AUDIO_CHUNK_STREAM_ID: u32 = 0x05;

/// Muxer configuration options
#[derive(Debug, Clone)]
pub struct MuxerConfig {
    /// Chunk stream id for video envelopes
    pub video_chunk_stream_id: u32,

    /// Chunk stream id for audio envelopes
    pub audio_chunk_stream_id: u32,

    /// Request reliable delivery for every send
    pub reliable: bool,

    /// Mux the video elementary stream
    pub video_enabled: bool,

    /// Mux the audio elementary stream
    pub audio_enabled: bool,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            video_chunk_stream_id: DEFAULT_VIDEO_CHUNK_STREAM_ID,
            audio_chunk_stream_id: DEFAULT_AUDIO_CHUNK_STREAM_ID,
            reliable: true,
            video_enabled: true,
            audio_enabled: true,
        }
    }
}

impl MuxerConfig {
    /// Set the chunk stream ids for video and audio
    pub fn chunk_stream_ids(mut self, video: u32, audio: u32) -> Self {
        self.video_chunk_stream_id = video;
        self.audio_chunk_stream_id = audio;
        self
    }

    /// Set whether sends request reliable delivery
    pub fn reliable(mut self, reliable: bool) -> Self {
        self.reliable = reliable;
        self
    }

    /// Discard all video input
    pub fn disable_video(mut self) -> Self {
        self.video_enabled = false;
        self
    }

    /// Discard all audio input
    pub fn disable_audio(mut self) -> Self {
        self.audio_enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MuxerConfig::default();

        assert_eq!(config.video_chunk_stream_id, 0x04);
        assert_eq!(config.audio_chunk_stream_id, 0x05);
        assert!(config.reliable);
        assert!(config.video_enabled);
        assert!(config.audio_enabled);
    }

    #[test]
    fn test_builder_chaining() {
        let config = MuxerConfig::default()
            .chunk_stream_ids(6, 7)
            .reliable(false)
            .disable_audio();

        assert_eq!(config.video_chunk_stream_id, 6);
        assert_eq!(config.audio_chunk_stream_id, 7);
        assert!(!config.reliable);
        assert!(config.video_enabled);
        assert!(!config.audio_enabled);
    }

    #[test]
    fn test_builder_disable_video() {
        let config = MuxerConfig::default().disable_video();

        assert!(!config.video_enabled);
        assert!(config.audio_enabled);
    }
}
