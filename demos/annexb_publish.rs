//! Mux an Annex-B H.264 file into FLV tags
//!
//! Run with: cargo run --example annexb_publish <FILE.h264> [FPS]
//!
//! Produce an input file with ffmpeg:
//!   ffmpeg -i input.mp4 -c:v libx264 -bsf:v h264_mp4toannexb -an -f h264 out.h264
//!
//! The muxer runs on the calling thread and pushes envelopes into a
//! `ChannelTransport`; a tokio task stands in for the network connection
//! and tallies what it receives.

use std::collections::HashMap;

use flv_mux::media::{split_annexb, NaluType};
use flv_mux::muxer::{MuxerConfig, StreamMuxer};
use flv_mux::session::{Channel, ChannelTransport};

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

fn print_usage() {
    eprintln!("Usage: annexb_publish <FILE.h264> [FPS]");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        print_usage();
        std::process::exit(1);
    };
    let fps: u32 = match args.get(2) {
        Some(s) => s.parse()?,
        None => 30,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flv_mux=debug".parse()?)
                .add_directive("annexb_publish=debug".parse()?),
        )
        .init();

    let data = tokio::fs::read(path).await?;
    let units = split_annexb(&data)?;
    tracing::info!(path = %path, units = units.len(), "Loaded Annex-B stream");

    // Room for every unit, the muxer loop never yields
    let (transport, mut packets) = ChannelTransport::open(1, units.len() + 1);

    // Stand-in for the connection task
    let consumer = tokio::spawn(async move {
        let mut totals: HashMap<Channel, (u64, u64)> = HashMap::new();
        while let Some(packet) = packets.recv().await {
            let entry = totals.entry(packet.envelope.channel).or_default();
            entry.0 += 1;
            entry.1 += packet.envelope.size() as u64;
            tracing::trace!(
                channel = ?packet.envelope.channel,
                timestamp = packet.envelope.timestamp,
                size = packet.envelope.size(),
                "Packet received"
            );
        }
        totals
    });

    let mut muxer = StreamMuxer::new(transport, MuxerConfig::default());
    let frame_duration = 1000 / fps.max(1);
    let mut pictures = 0u32;
    let mut pending_sps: Option<Vec<u8>> = None;

    for unit in &units {
        match unit.nalu_type() {
            Some(NaluType::Sps) => {
                let mut au = START_CODE.to_vec();
                au.extend_from_slice(unit.payload);
                pending_sps = Some(au);
            }
            // The muxer expects the PPS inside the SPS access unit
            Some(NaluType::Pps) => {
                if let Some(mut au) = pending_sps.take() {
                    au.extend_from_slice(&START_CODE);
                    au.extend_from_slice(unit.payload);
                    muxer.write_video(&au, 0)?;
                }
            }
            Some(t) if t.is_slice() => {
                // Every slice of a picture shares its timestamp
                if unit.starts_picture() {
                    pictures += 1;
                }
                let timestamp = pictures.saturating_sub(1) * frame_duration;

                let mut au = START_CODE.to_vec();
                au.extend_from_slice(unit.payload);
                muxer.write_video(&au, timestamp)?;
            }
            other => {
                tracing::debug!(nalu_type = ?other, "Skipping NAL unit");
            }
        }
    }

    let stats = muxer.stats().clone();
    muxer.into_transport().close();
    let totals = consumer.await?;

    println!("Pictures:     {}", pictures);
    println!("Video tags:   {}", stats.video_tags);
    println!("Keyframes:    {}", stats.keyframes);
    println!("Dropped tags: {}", stats.dropped_tags);
    println!("Bytes sent:   {}", stats.bytes_sent);
    for (channel, (count, bytes)) in &totals {
        println!("{:?}: {} packets, {} bytes", channel, count, bytes);
    }

    Ok(())
}
