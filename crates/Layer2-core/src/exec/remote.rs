//! Remote executor - SSH 원격 실행
//!
//! 시스템 `ssh`/`scp` 바이너리를 호출합니다. 전송 계층 실패(ssh 종료 코드 255)는
//! `Error::Remote`, 원격 명령의 실패는 `Error::Execution`으로 구분됩니다.

use async_trait::async_trait;
use shellgate_foundation::{Error, RemoteHostConfig, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// ssh가 연결 실패 시 반환하는 종료 코드
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// 원격 명령 실행기
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// 원격 셸에서 명령 실행 후 stdout 반환
    async fn execute_command(&self, command: &str) -> Result<String>;

    /// 로컬 파일을 원격으로 전송
    async fn upload_file(&self, local: &Path, remote: &str) -> Result<()>;

    /// 원격 파일을 로컬로 전송
    async fn download_file(&self, remote: &str, local: &Path) -> Result<()>;

    /// 감사 로그용 호스트 이름
    fn host(&self) -> &str;
}

/// 원격 작업 디렉토리를 명령에 반영
pub fn with_remote_workdir(command: &str, dir: &Path) -> Result<String> {
    let dir = dir.to_string_lossy();
    let quoted = shlex::try_quote(&dir)
        .map_err(|e| Error::InvalidInput(format!("Invalid working directory '{}': {}", dir, e)))?;
    Ok(format!("cd {} && {}", quoted, command))
}

// ============================================================================
// SshExecutor
// ============================================================================

/// OpenSSH 클라이언트 기반 실행기
#[derive(Debug, Clone)]
pub struct SshExecutor {
    config: RemoteHostConfig,
    ssh: PathBuf,
    scp: PathBuf,
}

impl SshExecutor {
    /// PATH에서 ssh/scp를 찾아 생성
    pub fn new(config: RemoteHostConfig) -> Result<Self> {
        let ssh = which::which("ssh")
            .map_err(|e| Error::Remote(format!("ssh client not found: {}", e)))?;
        let scp = which::which("scp")
            .map_err(|e| Error::Remote(format!("scp client not found: {}", e)))?;
        Ok(Self::with_binaries(config, ssh, scp))
    }

    pub fn with_binaries(config: RemoteHostConfig, ssh: PathBuf, scp: PathBuf) -> Self {
        Self { config, ssh, scp }
    }

    pub fn config(&self) -> &RemoteHostConfig {
        &self.config
    }

    /// 공통 접속 옵션
    fn connection_options(&self, port_flag: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            port_flag.to_string(),
            self.config.port.to_string(),
        ];
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }
        args
    }

    pub(crate) fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.connection_options("-p");
        args.push(self.config.destination());
        args.push("--".to_string());
        args.push(command.to_string());
        args
    }

    pub(crate) fn scp_args(&self, from: String, to: String) -> Vec<String> {
        let mut args = self.connection_options("-P");
        args.push("-q".to_string());
        args.push(from);
        args.push(to);
        args
    }

    fn remote_spec(&self, path: &str) -> Result<String> {
        let quoted = shlex::try_quote(path)
            .map_err(|e| Error::InvalidInput(format!("Invalid remote path '{}': {}", path, e)))?;
        Ok(format!("{}:{}", self.config.destination(), quoted))
    }

    async fn run(&self, program: &Path, args: Vec<String>) -> Result<String> {
        debug!(program = %program.display(), host = %self.config.host, "Running remote transport");

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Remote(format!("Failed to start {}: {}", program.display(), e)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(SSH_TRANSPORT_FAILURE) | None => Err(Error::Remote(format!(
                "{}: {}",
                self.config.destination(),
                if stderr.is_empty() { "connection failed" } else { stderr.as_str() }
            ))),
            Some(code) => Err(Error::execution(
                if stderr.is_empty() {
                    format!("Command failed with exit code {}", code)
                } else {
                    format!("Command failed with exit code {}: {}", code, stderr)
                },
                Some(code),
            )),
        }
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute_command(&self, command: &str) -> Result<String> {
        self.run(&self.ssh, self.ssh_args(command)).await
    }

    async fn upload_file(&self, local: &Path, remote: &str) -> Result<()> {
        let from = local.to_string_lossy().into_owned();
        let to = self.remote_spec(remote)?;
        self.run(&self.scp, self.scp_args(from, to)).await.map(|_| ())
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<()> {
        let from = self.remote_spec(remote)?;
        let to = local.to_string_lossy().into_owned();
        self.run(&self.scp, self.scp_args(from, to)).await.map(|_| ())
    }

    fn host(&self) -> &str {
        &self.config.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SshExecutor {
        let mut config = RemoteHostConfig::new("web01").user("ops");
        config.port = 2222;
        config.identity_file = Some(PathBuf::from("/keys/id_ed25519"));
        SshExecutor::with_binaries(config, PathBuf::from("ssh"), PathBuf::from("scp"))
    }

    #[test]
    fn test_ssh_args() {
        let args = executor().ssh_args("uptime");
        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-p",
                "2222",
                "-i",
                "/keys/id_ed25519",
                "ops@web01",
                "--",
                "uptime"
            ]
        );
    }

    #[test]
    fn test_scp_uses_capital_port_flag_and_quotes_remote_path() {
        let exec = executor();
        let to = exec.remote_spec("/srv/my app/config.yml").unwrap();
        let path = to.strip_prefix("ops@web01:").unwrap();
        assert_eq!(shlex::split(path), Some(vec!["/srv/my app/config.yml".to_string()]));

        let args = exec.scp_args("local.yml".into(), to.clone());
        assert_eq!(args[2], "-P");
        assert_eq!(args[3], "2222");
        assert_eq!(args.last(), Some(&to));
    }

    #[test]
    fn test_remote_workdir_is_quoted() {
        let cmd = with_remote_workdir("ls", Path::new("/var/www/my site")).unwrap();
        assert_eq!(
            shlex::split(&cmd),
            Some(vec![
                "cd".to_string(),
                "/var/www/my site".to_string(),
                "&&".to_string(),
                "ls".to_string()
            ])
        );
    }

    #[test]
    fn test_host() {
        assert_eq!(executor().host(), "web01");
    }
}
