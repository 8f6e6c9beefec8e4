//! Converter process execution.
//!
//! Runs Cpp2IL as a child process, waits a bounded time, then discovers
//! the produced artifacts by scanning the output root. Exit status is
//! logged but never trusted: the directory contents decide success.
//!
//! Captured output goes through pipes only when the child cannot outlive
//! the run. A converter left running after the timeout writes into
//! [`ConversionRequest::log_path`] instead, since a pipe whose reader is gone
//! would kill it on the next write.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ImporterConfig, TimeoutPolicy};
use crate::error::ImportError;
use crate::filesystem::FsUtils;
use crate::models::{ConversionOutput, ConversionRequest, WaitOutcome};

/// Runs one conversion and reports its artifacts.
#[async_trait]
pub trait ConversionRunner: Send + Sync {
    /// Invoke the converter described by `request`.
    ///
    /// Returns [`ImportError::ConversionEmpty`] when nothing usable was produced.
    async fn run_conversion(
        &self,
        request: &ConversionRequest,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ImportError>;
}

/// Scan `output_root` (non-recursive) for artifacts with `extension`.
pub async fn scan_output(
    output_root: &Path,
    extension: &str,
    outcome: WaitOutcome,
    duration_ms: u64,
) -> Result<ConversionOutput, ImportError> {
    let files = FsUtils::list_files(output_root, false, Some(extension)).await?;
    if files.is_empty() {
        return Err(ImportError::ConversionEmpty {
            output_root: output_root.to_path_buf(),
        });
    }

    let output = ConversionOutput {
        output_root: output_root.to_path_buf(),
        files,
        outcome,
        duration_ms,
    };
    info!(
        count = output.files.len(),
        files = ?output.file_names(),
        "Conversion output discovered"
    );
    Ok(output)
}

/// Where the child's stdout and stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputSink {
    Discard,
    Pipe,
    LogFile,
}

/// Runs the real Cpp2IL executable.
#[derive(Debug, Clone)]
pub struct Cpp2IlRunner {
    timeout: Duration,
    timeout_policy: TimeoutPolicy,
    capture_output: bool,
    clean_output_root: bool,
    artifact_extension: String,
}

impl Cpp2IlRunner {
    /// Create a runner from importer settings.
    pub fn new(config: &ImporterConfig) -> Self {
        Self {
            timeout: config.timeout(),
            timeout_policy: config.timeout_policy,
            capture_output: config.capture_output,
            clean_output_root: config.clean_output_root,
            artifact_extension: config.artifact_extension.clone(),
        }
    }

    fn output_sink(&self) -> OutputSink {
        match (self.capture_output, self.timeout_policy) {
            (false, _) => OutputSink::Discard,
            (true, TimeoutPolicy::Terminate) => OutputSink::Pipe,
            (true, TimeoutPolicy::Continue) => OutputSink::LogFile,
        }
    }

    /// Spawn the child and wait on it, the timeout, or cancellation.
    async fn spawn_and_wait(
        &self,
        request: &ConversionRequest,
        cancel: CancellationToken,
    ) -> Result<WaitOutcome, ImportError> {
        let mut cmd = Command::new(&request.converter);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let mut log = None;
        let (stdout_cfg, stderr_cfg) = match self.output_sink() {
            OutputSink::Discard => (Stdio::null(), Stdio::null()),
            OutputSink::Pipe => (Stdio::piped(), Stdio::piped()),
            OutputSink::LogFile => {
                let path = request.log_path();
                let file = tokio::fs::File::create(&path).await?.into_std().await;
                let err = file.try_clone()?;
                log = Some(path);
                (Stdio::from(file), Stdio::from(err))
            }
        };

        cmd.args(request.arguments())
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .stderr(stderr_cfg)
            .kill_on_drop(self.timeout_policy == TimeoutPolicy::Terminate);

        if !request.working_dir.as_os_str().is_empty() {
            cmd.current_dir(&request.working_dir);
        }

        info!(
            converter = %request.converter.display(),
            args = %request.command_line(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Spawning Cpp2IL"
        );

        let mut child = cmd.spawn().map_err(|source| ImportError::ConverterSpawn {
            path: request.converter.clone(),
            source,
        })?;

        if let Some(out) = child.stdout.take() {
            forward_lines(out, "stdout");
        }
        if let Some(err) = child.stderr.take() {
            forward_lines(err, "stderr");
        }

        tokio::select! {
            result = child.wait() => {
                let status = result?;
                if let Some(path) = &log {
                    forward_log(path).await;
                }
                if !status.success() {
                    warn!(code = ?status.code(), "Cpp2IL exited with failure status");
                }
                Ok(WaitOutcome::Exited { code: status.code() })
            }
            _ = tokio::time::sleep(self.timeout) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                match self.timeout_policy {
                    TimeoutPolicy::Continue => {
                        warn!(
                            timeout_ms,
                            log = ?log.as_deref().map(Path::display),
                            "Cpp2IL still running after timeout, inspecting output"
                        );
                        Ok(WaitOutcome::StillRunning)
                    }
                    TimeoutPolicy::Terminate => {
                        error!(timeout_ms, "Cpp2IL timed out, killing");
                        let _ = child.kill().await;
                        Err(ImportError::ConversionTimedOut { timeout_ms })
                    }
                }
            }
            _ = cancel.cancelled() => {
                info!("Conversion cancelled, killing Cpp2IL");
                let _ = child.kill().await;
                Err(ImportError::Cancelled)
            }
        }
    }
}

#[async_trait]
impl ConversionRunner for Cpp2IlRunner {
    async fn run_conversion(
        &self,
        request: &ConversionRequest,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ImportError> {
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        tokio::fs::create_dir_all(&request.output_root)
            .await
            .map_err(|source| ImportError::DirectorySetup {
                path: request.output_root.clone(),
                source,
            })?;

        if self.clean_output_root {
            let removed =
                FsUtils::remove_matching(&request.output_root, &self.artifact_extension).await?;
            debug!(removed, "Cleared stale artifacts from output root");
        }

        let start = Instant::now();
        let outcome = self.spawn_and_wait(request, cancel).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        scan_output(
            &request.output_root,
            &self.artifact_extension,
            outcome,
            duration_ms,
        )
        .await
    }
}

/// Forward each line of a child stream to the debug log.
fn forward_lines<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(stream, line = %line, "Cpp2IL output");
        }
    });
}

/// Replay a finished converter's log file into the debug log.
async fn forward_log(path: &Path) {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            for line in String::from_utf8_lossy(&bytes).lines() {
                debug!(stream = "log", line = %line, "Cpp2IL output");
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Could not read Cpp2IL log"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(root: &Path, converter: PathBuf) -> ConversionRequest {
        ConversionRequest {
            converter,
            working_dir: root.to_path_buf(),
            output_root: root.join("out"),
            exe_name: "Game".to_string(),
            game_path: root.join("game"),
            skip_analysis: true,
            attempt_il_to_dll: false,
            parallel: false,
            throw_safety_out_window: false,
            suppress_attributes: true,
        }
    }

    #[test]
    fn test_pipes_only_when_child_cannot_outlive_run() {
        let sink = |capture_output, timeout_policy| {
            Cpp2IlRunner::new(&ImporterConfig {
                capture_output,
                timeout_policy,
                ..Default::default()
            })
            .output_sink()
        };
        assert_eq!(sink(true, TimeoutPolicy::Continue), OutputSink::LogFile);
        assert_eq!(sink(true, TimeoutPolicy::Terminate), OutputSink::Pipe);
        assert_eq!(sink(false, TimeoutPolicy::Continue), OutputSink::Discard);
        assert_eq!(sink(false, TimeoutPolicy::Terminate), OutputSink::Discard);
    }

    #[tokio::test]
    async fn test_scan_output_empty_is_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("log.txt"), "x").expect("write");

        let err = scan_output(temp.path(), "dll", WaitOutcome::StillRunning, 0)
            .await
            .expect_err("empty");
        assert_eq!(err.reason(), "no conversion output");
    }

    #[tokio::test]
    async fn test_scan_output_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("B.dll"), "b").expect("write");
        std::fs::write(temp.path().join("A.dll"), "a").expect("write");

        let out = scan_output(temp.path(), "dll", WaitOutcome::Exited { code: Some(0) }, 5)
            .await
            .expect("scan");
        assert_eq!(out.file_names(), vec!["A.dll", "B.dll"]);
        assert_eq!(out.duration_ms, 5);
    }

    #[tokio::test]
    async fn test_cancelled_before_spawn() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = Cpp2IlRunner::new(&ImporterConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner
            .run_conversion(&request(temp.path(), temp.path().join("none")), cancel)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, ImportError::Cancelled));
        assert!(!temp.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = Cpp2IlRunner::new(&ImporterConfig::default());

        let err = runner
            .run_conversion(
                &request(temp.path(), temp.path().join("missing/Cpp2IL.exe")),
                CancellationToken::new(),
            )
            .await
            .expect_err("spawn");
        assert!(matches!(err, ImportError::ConverterSpawn { .. }));
    }
}
