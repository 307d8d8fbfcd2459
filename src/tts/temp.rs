use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// A request-scoped WAV file in the temp directory.
///
/// The file is removed when the guard is dropped, on every exit path, unless
/// cleanup has been disabled in the configuration.
#[derive(Debug)]
pub struct TempAudio {
    path: PathBuf,
    cleanup: bool,
}

impl TempAudio {
    pub fn allocate(dir: &Path, cleanup: bool) -> Self {
        let path = dir.join(format!("kokoro_tts_{}.wav", Uuid::new_v4()));
        Self { path, cleanup }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        if !self.cleanup {
            tracing::debug!("Keeping temporary file: {}", self.path.display());
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Cleaned up temporary file: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to clean up file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Streams a finished [`TempAudio`] file and deletes it once the stream is dropped.
pub struct TempAudioStream {
    inner: ReaderStream<File>,
    _audio: TempAudio,
}

impl TempAudioStream {
    /// Open the file, returning the stream and the file length in bytes.
    pub async fn open(audio: TempAudio) -> io::Result<(Self, u64)> {
        let file = File::open(audio.path()).await?;
        let len = file.metadata().await?.len();
        let stream = Self {
            inner: ReaderStream::new(file),
            _audio: audio,
        };
        Ok((stream, len))
    }
}

impl Stream for TempAudioStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Create the temp directory if needed and check that it is writable.
pub fn ensure_temp_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        tracing::info!("Using existing temp directory: {}", dir.display());
    } else {
        std::fs::create_dir_all(dir)?;
        tracing::info!("Created temp directory: {}", dir.display());
    }

    let probe = dir.join("test_write.tmp");
    std::fs::write(&probe, b"test")?;
    std::fs::remove_file(&probe)?;

    Ok(())
}
