//! Local executor - 로컬 서브프로세스 실행
//!
//! 출력 버퍼 상한을 넘으면 프로세스를 종료하고 에러를 반환합니다.
//! 0이 아닌 종료 코드와 spawn 실패도 에러입니다.

use async_trait::async_trait;
use shellgate_foundation::{Error, Result, DEFAULT_MAX_OUTPUT_BYTES};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// 로컬 명령 실행기
#[async_trait]
pub trait LocalExecutor: Send + Sync {
    /// 명령을 실행하고 stdout을 반환
    async fn run(&self, command: &str, working_dir: Option<&Path>) -> Result<String>;
}

/// `sh -c` (Windows: `cmd /C`) 기반 실행기
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    max_output_bytes: usize,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl ShellExecutor {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    fn shell_command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait]
impl LocalExecutor for ShellExecutor {
    async fn run(&self, command: &str, working_dir: Option<&Path>) -> Result<String> {
        let mut cmd = Self::shell_command(command);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::execution(format!("Failed to spawn process: {}", e), None))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output_bytes;

        let (stdout, stderr) = tokio::join!(read_limited(stdout, limit), read_limited(stderr, limit));
        let (stdout_buf, stdout_overflow) = stdout?;
        let (stderr_buf, stderr_overflow) = stderr?;

        if stdout_overflow || stderr_overflow {
            let _ = child.kill().await;
            return Err(Error::execution(
                format!("Output exceeded maximum buffer size of {} bytes", limit),
                None,
            ));
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::execution(format!("Process error: {}", e), None))?;

        let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
        debug!(exit = ?status.code(), bytes = stdout.len(), "Local command finished");

        if status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&stderr_buf);
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        let message = match status.code() {
            Some(code) if detail.is_empty() => format!("Command failed with exit code {}", code),
            Some(code) => format!("Command failed with exit code {}: {}", code, detail),
            None => format!("Command terminated by signal: {}", detail),
        };

        Err(Error::execution(message, status.code()))
    }
}

/// 상한까지 읽고, 상한을 넘었는지 함께 반환
async fn read_limited<R>(reader: Option<R>, limit: usize) -> Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok((buf, false));
    };

    // 상한 + 1 바이트까지 읽어 초과 여부 판단
    let mut limited = reader.take(limit as u64 + 1);
    limited.read_to_end(&mut buf).await?;

    if buf.len() > limit {
        buf.truncate(limit);
        return Ok((buf, true));
    }
    Ok((buf, false))
}
