//! Running the external inference tool.
use crate::config::ToolConfig;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("failed waiting for inference process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("inference exited with {status}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("inference timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buf).await {
            log::debug!("reading inference output: {e}");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    // SAFETY: killpg only takes integers; the group id is the child's pid
    if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } != 0 {
        log::debug!("killpg {pid}: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// SIGKILL the child's whole process group, then reap the child.
///
/// The child leads its own group, so workers it started go down with it.
async fn kill_tree(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_group(pid);
    }
    // `kill` also waits; it fails only when the child was already reaped
    if let Err(e) = child.kill().await {
        log::debug!("kill inference process: {e}");
    }
}

/// Run `<program> [<script>] <args>` to completion, bounded by `config.timeout`.
///
/// The bound covers both the exit and the end of output: a worker that outlives the
/// tool while holding its stdout or stderr counts against the same timeout. On
/// timeout the tool's process group gets SIGKILL and the pipe readers are abandoned.
pub async fn run_tool(config: &ToolConfig, args: &[OsString]) -> Result<ToolOutput, InvokeError> {
    let mut command = Command::new(&config.program);
    if let Some(script) = &config.script {
        command.arg(script);
    }
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    if let Some(dir) = &config.working_dir {
        command.current_dir(dir);
    }

    log::debug!("spawning {:?}", command.as_std());
    let mut child = command.spawn().map_err(|source| InvokeError::Spawn {
        program: config.program.clone(),
        source,
    })?;
    let pid = child.id();
    log::info!(
        "inference started (pid {:?}, timeout {:?})",
        pid,
        config.timeout
    );

    let mut stdout_task = tokio::spawn(drain(child.stdout.take()));
    let mut stderr_task = tokio::spawn(drain(child.stderr.take()));

    let finished = async {
        let status = child.wait().await.map_err(InvokeError::Wait)?;
        let (stdout, stderr) = tokio::join!(&mut stdout_task, &mut stderr_task);
        Ok::<_, InvokeError>(ToolOutput {
            status,
            stdout: stdout.unwrap_or_default(),
            stderr: stderr.unwrap_or_default(),
        })
    };
    let result = tokio::time::timeout(config.timeout, finished).await;

    match result {
        Ok(Ok(output)) if output.status.success() => {
            log::info!("inference finished with {}", output.status);
            Ok(output)
        }
        Ok(Ok(ToolOutput { status, stderr, .. })) => {
            log::warn!("inference failed ({status}): {}", stderr.trim_end());
            Err(InvokeError::Failed { status, stderr })
        }
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(e)
        }
        Err(_) => {
            log::warn!("inference exceeded {:?}, killing", config.timeout);
            kill_tree(&mut child, pid).await;
            stdout_task.abort();
            stderr_task.abort();
            Err(InvokeError::TimedOut(config.timeout))
        }
    }
}
