//! Stream muxer
//!
//! Entry point for encoder output: takes Annex-B video access units and AAC
//! payloads, packetizes them and dispatches the resulting tags.
//!
//! The AVC sequence header is sent once per stream. Slices that arrive
//! before it has reached the transport are dropped, so a player never sees
//! a slice it has no decoder configuration for.

use crate::error::Result;
use crate::media::aac::{self, AudioSpecificConfig};
use crate::media::flv::MediaTag;
use crate::media::h264::{build_nalu_tag, AvcConfig, NaluType};
use crate::media::nal::demux;
use crate::session::Transport;
use crate::stats::MuxerStats;

use super::config::MuxerConfig;
use super::dispatcher::{DispatchOutcome, TagDispatcher};

/// H.264 + AAC to FLV tag muxer for one publishing stream
///
/// # Example
/// ```no_run
/// use flv_mux::muxer::{MuxerConfig, StreamMuxer};
/// use flv_mux::session::ChannelTransport;
///
/// # fn example(sps_pps: &[u8], idr: &[u8]) -> flv_mux::Result<()> {
/// let (transport, _packets) = ChannelTransport::open(1, 256);
/// let mut muxer = StreamMuxer::new(transport, MuxerConfig::default());
///
/// muxer.write_video(sps_pps, 0)?;
/// muxer.write_video(idr, 0)?;
/// muxer.write_audio(&[0x12, 0x10], 0)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StreamMuxer<T> {
    dispatcher: TagDispatcher<T>,
    avc_config: Option<AvcConfig>,
    audio_config: Option<AudioSpecificConfig>,
    sequence_header_sent: bool,
    stats: MuxerStats,
}

impl<T: Transport> StreamMuxer<T> {
    /// Create a muxer publishing over `transport`
    pub fn new(transport: T, config: MuxerConfig) -> Self {
        Self::with_dispatcher(TagDispatcher::new(transport, config))
    }

    /// Create a muxer around an existing dispatcher
    pub fn with_dispatcher(dispatcher: TagDispatcher<T>) -> Self {
        Self {
            dispatcher,
            avc_config: None,
            audio_config: None,
            sequence_header_sent: false,
            stats: MuxerStats::new(),
        }
    }

    /// Write one H.264 access unit (a single NAL unit with its start code).
    ///
    /// An SPS unit must also carry the PPS; it produces the sequence header.
    /// Malformed input is returned as an error and nothing is sent, even
    /// when the unit would have been dropped anyway.
    pub fn write_video(&mut self, access_unit: &[u8], timestamp: u32) -> Result<DispatchOutcome> {
        let unit = demux(access_unit)?;

        match unit.nalu_type() {
            Some(NaluType::Sps) => {
                let config = AvcConfig::from_access_unit(access_unit)?;
                self.write_sequence_header(config)
            }
            _ => {
                let tag = build_nalu_tag(&unit, timestamp)?;
                self.write_slice(tag)
            }
        }
    }

    fn write_sequence_header(&mut self, config: AvcConfig) -> Result<DispatchOutcome> {
        if !self.dispatcher.config().video_enabled {
            return Ok(self.drop_tag());
        }
        if self.sequence_header_sent {
            tracing::trace!("Sequence header already sent, ignoring SPS");
            return Ok(self.drop_tag());
        }

        if self.avc_config.is_none() {
            tracing::info!(
                profile = config.profile_name(),
                level = %config.level_string(),
                sps_len = config.sps[0].len(),
                pps_len = config.pps[0].len(),
                "AVC decoder configuration built"
            );
        }
        // The first configuration seen is the one the stream keeps
        let tag = self.avc_config.get_or_insert(config).sequence_header_tag();

        let outcome = self.dispatch(tag)?;
        if outcome == DispatchOutcome::Sent {
            tracing::debug!("AVC sequence header sent");
            self.sequence_header_sent = true;
        }
        Ok(outcome)
    }

    fn write_slice(&mut self, tag: MediaTag) -> Result<DispatchOutcome> {
        if !self.dispatcher.config().video_enabled {
            return Ok(self.drop_tag());
        }
        if !self.sequence_header_sent {
            tracing::warn!(
                timestamp = tag.timestamp,
                keyframe = tag.is_keyframe,
                "No sequence header sent yet, dropping slice"
            );
            return Ok(self.drop_tag());
        }

        self.dispatch(tag)
    }

    /// Write one AAC payload: the 2-byte AudioSpecificConfig or a raw frame.
    pub fn write_audio(&mut self, payload: &[u8], timestamp: u32) -> Result<DispatchOutcome> {
        let tag = aac::build_audio_tag(payload, timestamp)?;

        if !self.dispatcher.config().audio_enabled {
            return Ok(self.drop_tag());
        }

        if tag.is_sequence_header && self.audio_config.is_none() {
            match AudioSpecificConfig::parse(payload) {
                Ok(config) => {
                    tracing::info!(
                        profile = config.profile_name(),
                        sample_rate = config.sampling_frequency,
                        channels = config.channels(),
                        "AAC audio configuration"
                    );
                    self.audio_config = Some(config);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Could not decode AudioSpecificConfig");
                }
            }
        }

        self.dispatch(tag)
    }

    fn drop_tag(&mut self) -> DispatchOutcome {
        self.stats.record_dropped();
        DispatchOutcome::Dropped
    }

    fn dispatch(&mut self, tag: MediaTag) -> Result<DispatchOutcome> {
        // Stats need the tag after the body has moved into the transport
        let accounting = tag.clone();
        let outcome = self.dispatcher.dispatch(tag)?;

        match outcome {
            DispatchOutcome::Sent => self.stats.record_sent(&accounting),
            DispatchOutcome::Dropped => self.stats.record_dropped(),
        }
        Ok(outcome)
    }

    /// Whether the AVC sequence header has reached the transport
    pub fn has_sent_sequence_header(&self) -> bool {
        self.sequence_header_sent
    }

    /// Decoder configuration built from the first SPS/PPS unit
    pub fn avc_config(&self) -> Option<&AvcConfig> {
        self.avc_config.as_ref()
    }

    /// AudioSpecificConfig seen in the first AAC config payload
    pub fn audio_config(&self) -> Option<&AudioSpecificConfig> {
        self.audio_config.as_ref()
    }

    /// Get statistics
    pub fn stats(&self) -> &MuxerStats {
        &self.stats
    }

    /// Borrow the dispatcher
    pub fn dispatcher(&self) -> &TagDispatcher<T> {
        &self.dispatcher
    }

    /// Mutably borrow the dispatcher
    pub fn dispatcher_mut(&mut self) -> &mut TagDispatcher<T> {
        &mut self.dispatcher
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.dispatcher.into_transport()
    }
}
