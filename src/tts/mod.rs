pub mod kokoro;
pub mod temp;

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AppError;

pub use kokoro::KokoroCommand;
pub use temp::{ensure_temp_dir, TempAudio, TempAudioStream};

/// File name offered to clients for every synthesized clip.
pub const DOWNLOAD_NAME: &str = "tts_output.wav";

pub struct TtsService {
    engine: KokoroCommand,
    temp_dir: PathBuf,
    cleanup: bool,
}

impl TtsService {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: KokoroCommand::new(&config.command, config.timeout),
            temp_dir: config.temp_dir.clone(),
            cleanup: config.cleanup_files,
        }
    }

    /// Synthesize `text` into a fresh temp file.
    ///
    /// The returned guard owns the file; if synthesis fails the guard is
    /// dropped here and the partial output removed.
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<TempAudio, AppError> {
        let audio = TempAudio::allocate(&self.temp_dir, self.cleanup);

        self.engine.synthesize(text, voice, audio.path()).await?;
        inspect(audio.path()).await;

        Ok(audio)
    }

    pub async fn probe(&self) -> Result<(), AppError> {
        self.engine.probe().await?;
        Ok(())
    }
}

/// Log the WAV header of a finished file. Non-WAV output is passed through as-is.
async fn inspect(path: &Path) {
    let path = path.to_path_buf();
    let described = tokio::task::spawn_blocking(move || {
        hound::WavReader::open(&path).map(|reader| (reader.spec(), reader.duration()))
    })
    .await;

    match described {
        Ok(Ok((spec, frames))) => tracing::debug!(
            "Synthesized {:.2}s of audio ({} Hz, {} ch, {} bit)",
            frames as f32 / spec.sample_rate as f32,
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        ),
        Ok(Err(e)) => tracing::warn!("Output is not a readable WAV file: {}", e),
        Err(e) => tracing::warn!("Failed to inspect output: {}", e),
    }
}
