//! Removes the echo of a far-end recording from a near-end recording.
//!
//! ```sh
//! cargo run --example process_wav -- near.wav far.wav out.wav
//! ```
//!
//! Both inputs must share sample rate and channel count. The output is
//! written as 32-bit float WAV.

use std::env;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing_subscriber::EnvFilter;
use webrtc_aec3::{Processor, ProcessorConfig};

fn read_samples(path: &str) -> Result<(WavSpec, Vec<f32>), Box<dyn std::error::Error>> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<_, _>>()?
        }
    };
    Ok((spec, samples))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let [_, near_path, far_path, out_path] = args.as_slice() else {
        return Err("usage: process_wav <near.wav> <far.wav> <out.wav>".into());
    };

    let (near_spec, near) = read_samples(near_path)?;
    let (far_spec, mut far) = read_samples(far_path)?;
    if near_spec.sample_rate != far_spec.sample_rate || near_spec.channels != far_spec.channels {
        return Err("near-end and far-end recordings must have the same format".into());
    }
    // Silence past the end of the far-end recording.
    far.resize(near.len(), 0.0);

    let config = ProcessorConfig {
        sample_rate: near_spec.sample_rate,
        num_channels: u32::from(near_spec.channels),
    };
    let mut processor = Processor::new(&config)?;
    println!(
        "webrtc-aec3 {}: {} Hz, {} channel(s), {} samples per frame",
        webrtc_aec3::get_version(),
        config.sample_rate,
        config.num_channels,
        config.optimal_num_frames()
    );

    processor.process_reference_buffer(&far)?;
    let mut output = vec![0.0f32; near.len()];
    let frames = processor.process_capture_buffer(&near, Some(&far), &mut output)?;
    println!("Processed {frames} frames");

    let out_spec = WavSpec {
        channels: near_spec.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(out_path, out_spec)?;
    for sample in output {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
