/// Config-driven construction and offline rendering with WAV fixtures on disk
use irverb::impulse_store::IMPULSE_HEADROOM;
use irverb::{render_file, reverb, RenderConfig, Reverb, ReverbConfig, ReverbError};
use std::path::Path;
use tempfile::tempdir;

const SAMPLE_RATE: u32 = 44100;

fn write_wav_i16(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Interleaved stereo impulse of `frames` frames with a spike at frame 0
fn stereo_impulse(frames: usize) -> Vec<i16> {
    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let v = if i == 0 { 32767 } else { (1000.0 * 0.99f32.powi(i as i32)) as i16 };
        samples.push(v);
        samples.push(v / 2);
    }
    samples
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("irverb.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_reverb_from_toml_config() {
    let dir = tempdir().unwrap();
    let irs = dir.path().join("irs");
    std::fs::create_dir(&irs).unwrap();
    write_wav_i16(&irs.join("small.wav"), SAMPLE_RATE, 2, &stereo_impulse(300));
    write_wav_i16(&irs.join("big.wav"), SAMPLE_RATE, 1, &vec![100; 1024]);

    let config_path = write_config(
        dir.path(),
        r#"
block_size = 256
impulse_dir = "irs"

[presets]
small = "small.wav"
big = "big.wav"

[parameters]
preset = "small"
wet_mix = 0.5
"#,
    );

    let config = ReverbConfig::load(&config_path).unwrap();
    let (mut controller, mut engine) = reverb(&config).unwrap();
    assert!(controller.store().is_loaded("small"));
    assert!(controller.store().is_loaded("big"));
    assert_eq!(engine.block_size(), 256);
    assert_eq!(engine.partition_count(), 2);
    assert_eq!(engine.mix().wet_mix, 0.5);

    // Mono asset, exact multiple of the block size
    controller.set_preset("big").unwrap();
    let input = vec![0.0; 256];
    let mut left = vec![0.0; 256];
    let mut right = vec![0.0; 256];
    engine.process(&[&input], &mut left, &mut right).unwrap();
    assert_eq!(engine.partition_count(), 4);
    assert_eq!(engine.generation(), controller.generation());
}

#[test]
fn test_sample_rate_mismatch_fails_construction() {
    let dir = tempdir().unwrap();
    write_wav_i16(&dir.path().join("ok.wav"), SAMPLE_RATE, 2, &stereo_impulse(64));
    write_wav_i16(&dir.path().join("bad.wav"), 48000, 2, &stereo_impulse(64));

    let config_path = write_config(
        dir.path(),
        r#"
impulse_dir = "."

[presets]
ok = "ok.wav"
bad = "bad.wav"

[parameters]
preset = "ok"
"#,
    );
    let config = ReverbConfig::load(&config_path).unwrap();

    // Fails even though the initial preset itself is fine
    match reverb(&config) {
        Err(ReverbError::SampleRateMismatch {
            preset,
            expected,
            found,
        }) => {
            assert_eq!(preset, "bad");
            assert_eq!(expected, 44100);
            assert_eq!(found, 48000);
        }
        other => panic!("expected sample rate mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_asset_fails_construction() {
    let dir = tempdir().unwrap();
    let mut config = ReverbConfig::default();
    config.impulse_dir = dir.path().to_path_buf();
    assert!(matches!(reverb(&config), Err(ReverbError::Wav(_))));
}

#[test]
fn test_render_file_with_tail() {
    let dir = tempdir().unwrap();
    write_wav_i16(&dir.path().join("ir.wav"), SAMPLE_RATE, 2, &stereo_impulse(200));

    let mut config = ReverbConfig::from_toml_str(
        r#"
block_size = 64

[presets]
room = "ir.wav"

[parameters]
preset = "room"
dry_mix = 0.0
wet_mix = 1.0
"#,
    )
    .unwrap();
    config.impulse_dir = dir.path().to_path_buf();

    // 100 frames of mono input with a click at the start
    let input_path = dir.path().join("in.wav");
    let mut click = vec![0i16; 100];
    click[0] = 16384;
    write_wav_i16(&input_path, SAMPLE_RATE, 1, &click);

    let output_path = dir.path().join("out.wav");
    let mut reverb = Reverb::new(&config).unwrap();
    let stats = render_file(&input_path, &output_path, &mut reverb, &RenderConfig::default()).unwrap();

    // 2 input blocks + 4 tail blocks
    assert_eq!(stats.blocks, 6);
    assert_eq!(stats.frames, 384);

    let mut out = hound::WavReader::open(&output_path).unwrap();
    let spec = out.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    let samples: Vec<f32> = out.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(samples.len(), 384 * 2);

    // Click (0.5) through the spike (32767 at 16-bit headroom scale)
    let scale = IMPULSE_HEADROOM / 65536.0;
    let expected = 0.5 * 32767.0 * scale;
    assert!((samples[0] - expected).abs() < 1e-6);
    assert!((samples[1] - 0.5 * 16383.0 * scale).abs() < 1e-6);
    assert!((stats.peak - expected).abs() < 1e-6);
}

#[test]
fn test_render_rejects_wrong_input_rate() {
    let dir = tempdir().unwrap();
    write_wav_i16(&dir.path().join("ir.wav"), SAMPLE_RATE, 2, &stereo_impulse(10));
    let mut config = ReverbConfig::from_toml_str(
        r#"
[presets]
room = "ir.wav"

[parameters]
preset = "room"
"#,
    )
    .unwrap();
    config.impulse_dir = dir.path().to_path_buf();

    let input_path = dir.path().join("in.wav");
    write_wav_i16(&input_path, 22050, 1, &[0; 10]);

    let mut reverb = Reverb::new(&config).unwrap();
    let result = render_file(
        &input_path,
        &dir.path().join("out.wav"),
        &mut reverb,
        &RenderConfig::default(),
    );
    assert!(matches!(result, Err(ReverbError::Config(_))));
}
