use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use webrtc_aec3::{EchoSuppressor, FixedAttenuation, Processor, ProcessorConfig};

const ECHO_GAIN: f32 = 0.6;

struct TestAudio {
    sample_rate: u32,
    num_channels: u16,
    interleaved_samples: Vec<f32>,
}

fn test_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("webrtc-aec3-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create test directory");
    dir
}

/// Writes `num_frames` of a sine tone per channel, with a small phase offset per channel.
fn write_tone(path: &Path, sample_rate: u32, num_channels: u16, freq: f32, num_frames: usize) {
    let spec = WavSpec {
        channels: num_channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).expect("Failed to create WAV file");
    for frame in 0..num_frames {
        for ch in 0..num_channels {
            let t = frame as f32 / sample_rate as f32;
            let phase = ch as f32 * 0.25;
            let sample = 0.5 * (2.0 * std::f32::consts::PI * freq * t + phase).sin();
            writer.write_sample(sample).expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV file");
}

fn load_wav_audio(path: impl AsRef<Path>) -> TestAudio {
    let reader = WavReader::open(path).expect("Failed to open WAV file");
    let spec = reader.spec();
    let interleaved_samples = reader
        .into_samples::<f32>()
        .map(|s| s.expect("Failed to read sample"))
        .collect();

    TestAudio {
        sample_rate: spec.sample_rate,
        num_channels: spec.channels,
        interleaved_samples,
    }
}

/// Near-end = speech tone + attenuated copy of the far-end tone.
fn mix_echo(speech: &[f32], far_end: &[f32]) -> Vec<f32> {
    speech
        .iter()
        .zip(far_end)
        .map(|(s, f)| s + ECHO_GAIN * f)
        .collect()
}

/// Streams a stereo 48 kHz recording through the processor in 10 ms blocks,
/// interleaving reference and capture calls the way an audio callback does,
/// and checks every output sample against the closed-form attenuation.
#[test]
fn process_stereo_recording_in_blocks() {
    let dir = test_dir();
    let speech_path = dir.join("speech_48k_stereo.wav");
    let far_path = dir.join("far_48k_stereo.wav");
    write_tone(&speech_path, 48_000, 2, 220.0, 4_800);
    write_tone(&far_path, 48_000, 2, 1_000.0, 4_800);

    let speech = load_wav_audio(&speech_path);
    let far = load_wav_audio(&far_path);
    let near = mix_echo(&speech.interleaved_samples, &far.interleaved_samples);

    let config = ProcessorConfig {
        sample_rate: speech.sample_rate,
        num_channels: u32::from(speech.num_channels),
    };
    let mut processor = Processor::new(&config).expect("Failed to create processor");

    let block_size = config.frame_len(config.optimal_num_frames());
    let mut output = vec![0.0f32; near.len()];
    for ((near_block, far_block), out_block) in near
        .chunks(block_size)
        .zip(far.interleaved_samples.chunks(block_size))
        .zip(output.chunks_mut(block_size))
    {
        processor
            .process_reference(far_block)
            .expect("Failed to process reference");
        processor
            .process_stream(near_block, far_block, out_block)
            .expect("Failed to process block");
    }

    for ((&out, &n), &f) in output
        .iter()
        .zip(&near)
        .zip(&far.interleaved_samples)
    {
        assert!(approx::abs_diff_eq!(out, n - 0.1 * f, epsilon = 1e-6));
    }
}

/// The fixed law removes exactly 0.1 of the far-end signal, so the residual
/// echo energy must shrink by (0.5 / 0.6)^2 relative to the raw capture.
#[test]
fn residual_echo_is_reduced() {
    let dir = test_dir();
    let far_path = dir.join("far_16k_mono.wav");
    write_tone(&far_path, 16_000, 1, 500.0, 16_000);
    let far = load_wav_audio(&far_path).interleaved_samples;

    // Echo only, no near-end speech.
    let near = mix_echo(&vec![0.0; far.len()], &far);

    let mut processor = Processor::new(&ProcessorConfig::default()).unwrap();
    let mut output = vec![0.0f32; near.len()];
    let frames = processor
        .process_capture_buffer(&near, Some(&far), &mut output)
        .unwrap();
    assert_eq!(frames, 100);

    let energy = |samples: &[f32]| samples.iter().map(|s| s * s).sum::<f32>();
    let ratio = energy(&output) / energy(&near);
    let expected = ((ECHO_GAIN - 0.1) / ECHO_GAIN).powi(2);
    assert!(approx::relative_eq!(ratio, expected, max_relative = 1e-3));
}

/// Whole-buffer helpers and per-frame calls must agree on the same input.
#[test]
fn buffer_helpers_match_per_frame_calls() {
    let dir = test_dir();
    let near_path = dir.join("near_32k_mono.wav");
    let far_path = dir.join("far_32k_mono.wav");
    write_tone(&near_path, 32_000, 1, 300.0, 3_250);
    write_tone(&far_path, 32_000, 1, 700.0, 3_250);
    let near = load_wav_audio(&near_path);
    let far = load_wav_audio(&far_path).interleaved_samples;

    let config = ProcessorConfig::default().with_sample_rate(near.sample_rate);
    let mut buffered = Processor::new(&config).unwrap();
    let mut per_frame = Processor::new(&config).unwrap();

    let mut buffered_out = vec![0.0f32; far.len()];
    assert_eq!(buffered.process_reference_buffer(&far).unwrap(), 10);
    assert_eq!(
        buffered
            .process_capture_buffer(&near.interleaved_samples, Some(&far), &mut buffered_out)
            .unwrap(),
        10
    );

    let frame_len = config.optimal_num_frames();
    let mut per_frame_out = near.interleaved_samples.clone();
    for (capture, far_frame) in per_frame_out
        .chunks_exact_mut(frame_len)
        .zip(far.chunks_exact(frame_len))
    {
        per_frame.process_stream_in_place(capture, far_frame).unwrap();
    }

    assert_eq!(buffered_out, per_frame_out);
}

/// A processor built around an explicit suppressor behaves like the default one.
#[test]
fn explicit_default_suppressor_matches_new() {
    let config = ProcessorConfig::default();
    let mut default = Processor::new(&config).unwrap();
    let mut explicit = Processor::with_suppressor(&config, FixedAttenuation::new(0.1)).unwrap();

    let near = [0.9f32, 0.1, -0.4, 0.7];
    let far = [0.2f32, -0.8, 0.5, 0.0];
    let mut a = [0.0f32; 4];
    let mut b = [0.0f32; 4];
    default.process_stream(&near, &far, &mut a).unwrap();
    explicit.process_stream(&near, &far, &mut b).unwrap();

    assert_eq!(a, b);
    assert_eq!(explicit.suppressor().factor(), 0.1);
}

/// A suppressor that counts reference frames, standing in for an adaptive filter.
struct ReferenceCounter {
    inner: FixedAttenuation,
    frames: usize,
}

impl EchoSuppressor for ReferenceCounter {
    fn attenuate(&mut self, near_end: &[f32], far_end: &[f32], output: &mut [f32]) {
        self.inner.attenuate(near_end, far_end, output);
    }

    fn attenuate_in_place(&mut self, capture: &mut [f32], far_end: &[f32]) {
        self.inner.attenuate_in_place(capture, far_end);
    }

    fn attenuate_far_in_place(&mut self, near_end: &[f32], playback: &mut [f32]) {
        self.inner.attenuate_far_in_place(near_end, playback);
    }

    fn observe_reference(&mut self, _reference: &[f32]) {
        self.frames += 1;
    }
}

#[test]
fn custom_suppressor_receives_reference_frames() {
    let suppressor = ReferenceCounter {
        inner: FixedAttenuation::default(),
        frames: 0,
    };
    let mut processor =
        Processor::with_suppressor(&ProcessorConfig::default(), suppressor).unwrap();

    for _ in 0..5 {
        processor.process_reference(&[0.1; 160]).unwrap();
    }
    processor.suppressor_mut().frames += 1;

    assert_eq!(processor.suppressor().frames, 6);
}

/// Creates the processor on one thread and drives it from a dedicated
/// "audio" thread, one frame after another.
#[test]
fn processor_runs_on_audio_thread() {
    let config = ProcessorConfig::default().with_sample_rate(48_000);
    let mut processor = Processor::new(&config).unwrap();
    let frame_len = config.frame_len(config.optimal_num_frames());

    let outputs = std::thread::spawn(move || {
        let far = vec![0.5f32; frame_len];
        let mut outputs = Vec::new();
        for i in 0..50 {
            let near = vec![i as f32 * 0.01; frame_len];
            let mut out = vec![0.0f32; frame_len];
            processor.process_reference(&far).unwrap();
            processor.process_stream(&near, &far, &mut out).unwrap();
            outputs.push(out[0]);
        }
        outputs
    })
    .join()
    .expect("Audio thread panicked");

    for (i, out) in outputs.into_iter().enumerate() {
        assert!(approx::abs_diff_eq!(out, i as f32 * 0.01 - 0.05, epsilon = 1e-6));
    }
}

#[cfg(feature = "serde")]
#[test]
fn config_loads_from_json() {
    let config: ProcessorConfig =
        serde_json::from_str(r#"{ "sample_rate": 32000, "num_channels": 2 }"#).unwrap();
    assert_eq!(
        config,
        ProcessorConfig {
            sample_rate: 32_000,
            num_channels: 2
        }
    );
    assert!(Processor::new(&config).is_ok());
}
