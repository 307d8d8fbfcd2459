use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::SynthesisError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Invokes the Kokoro command-line tool as a subprocess.
///
/// The command line is `<program> [args...] --voice=<voice> --text=<text> -o <path>`.
/// Voice and text are joined to their flags so text starting with `-` is not
/// mistaken for an option.
pub struct KokoroCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl KokoroCommand {
    pub fn new(command: &[String], timeout: Duration) -> Self {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => ("kokoro".to_string(), Vec::new()),
        };

        Self {
            program,
            args,
            timeout,
        }
    }

    /// Run a synthesis, guaranteeing on success that `output` exists and is non-empty.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> Result<(), SynthesisError> {
        let mut cmd = self.command();
        cmd.arg(format!("--voice={}", voice))
            .arg(format!("--text={}", text))
            .arg("-o")
            .arg(output);

        tracing::info!(
            "Running {}: voice={} chars={} output={}",
            self.program,
            voice,
            text.chars().count(),
            output.display()
        );

        let result = run(cmd, self.timeout).await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::error!("Kokoro command failed ({}): {}", result.status, stderr);
            return Err(SynthesisError::Failed {
                status: result.status,
                stderr,
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => {
                tracing::error!("Output file is empty: {}", output.display());
                Err(SynthesisError::EmptyOutput(output.display().to_string()))
            }
            Err(_) => {
                tracing::error!("Output file was not created: {}", output.display());
                Err(SynthesisError::MissingOutput(output.display().to_string()))
            }
        }
    }

    /// Check that the tool can be started at all by asking it for `--help`.
    pub async fn probe(&self) -> Result<(), SynthesisError> {
        let mut cmd = self.command();
        cmd.arg("--help");

        let result = run(cmd, PROBE_TIMEOUT).await?;
        if !result.status.success() {
            return Err(SynthesisError::Failed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches processes a launcher spawned
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

async fn run(mut cmd: Command, limit: Duration) -> Result<Output, SynthesisError> {
    let child = cmd.spawn().map_err(SynthesisError::Spawn)?;
    let pid = child.id();

    let wait = child.wait_with_output();
    tokio::pin!(wait);

    match tokio::time::timeout(limit, &mut wait).await {
        Ok(result) => result.map_err(SynthesisError::Spawn),
        Err(_) => {
            tracing::error!("Kokoro command timed out after {:?}", limit);
            // The group goes first; dropping `wait` then kills and reaps the child.
            kill_process_group(pid);
            Err(SynthesisError::Timeout(limit))
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!("Failed to kill process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
