use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::config::Config;

/// Stand-in for the kokoro binary: `sh -c <script>` sees the synthesis
/// arguments as `$1..$4`, with the output path in `$4`.
pub fn fake_command(script: &str) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        script.to_string(),
        "kokoro".to_string(),
    ]
}

pub fn test_config(temp_dir: &Path, command: Vec<String>) -> Config {
    Config {
        command,
        timeout: Duration::from_secs(10),
        max_text_length: 100,
        allowed_voices: vec!["af_heart".to_string(), "default_voice".to_string()],
        default_voice: "af_heart".to_string(),
        temp_dir: temp_dir.to_path_buf(),
        ..Config::default()
    }
}

/// A tenth of a second of 16-bit mono silence.
pub fn write_wav_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("fixture.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec).unwrap();
    for _ in 0..2205 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    path
}
