//! Audit Logger - 감사 로그 기록 및 조회
//!
//! JSON Lines 형식의 append-only 파일에 기록합니다.
//! 매 기록마다 파일을 append 모드로 열고 닫으며, 핸들을 유지하지 않습니다.
//! 여러 프로세스가 동시에 기록할 때 항목 간 순서는 보장되지 않습니다.

use super::types::{AuditEntry, AuditQuery, AuditTrail};
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 명령어 로그 기본 파일명
pub const COMMAND_LOG_FILE: &str = "commands.log";

/// 차단 로그 기본 파일명
pub const BLOCKED_LOG_FILE: &str = "blocked.log";

// ============================================================================
// AuditLogger
// ============================================================================

/// 감사 로거 설정
#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    /// 로그 디렉토리
    pub dir: PathBuf,

    /// 명령어 로그 파일명
    pub command_log: String,

    /// 차단 로그 파일명
    pub blocked_log: String,

    /// 기록 활성화
    pub enabled: bool,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellgate")
            .join("logs");

        Self {
            dir,
            command_log: COMMAND_LOG_FILE.to_string(),
            blocked_log: BLOCKED_LOG_FILE.to_string(),
            enabled: true,
        }
    }
}

impl AuditLoggerConfig {
    /// 특정 디렉토리를 사용하는 설정
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }
}

/// 감사 로거
///
/// ## 사용법
///
/// ```ignore
/// use shellgate_foundation::audit::{AuditLogger, AuditEntry, AuditAction};
///
/// let logger = AuditLogger::new(AuditLoggerConfig::default());
/// logger.log(&AuditEntry::new(AuditAction::CommandStarted, "local", "ls -la"))?;
/// ```
#[derive(Debug, Clone)]
pub struct AuditLogger {
    config: AuditLoggerConfig,
}

impl AuditLogger {
    pub fn new(config: AuditLoggerConfig) -> Self {
        Self { config }
    }

    /// 기록하지 않는 로거 (테스트, --no-audit)
    pub fn disabled() -> Self {
        Self {
            config: AuditLoggerConfig {
                enabled: false,
                ..Default::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &AuditLoggerConfig {
        &self.config
    }

    /// 로그 파일 경로
    pub fn path(&self, trail: AuditTrail) -> PathBuf {
        let file = match trail {
            AuditTrail::Commands => &self.config.command_log,
            AuditTrail::Blocked => &self.config.blocked_log,
        };
        self.config.dir.join(file)
    }

    /// 감사 로그 기록
    pub fn log(&self, entry: &AuditEntry) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.path(entry.trail());
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        append_line(&path, &line)?;
        debug!(action = %entry.action, path = %path.display(), "Audit entry written");
        Ok(())
    }

    /// 기록 실패를 호출자에게 전파하지 않는 버전
    ///
    /// 감사 로그 기록 실패로 명령 실행 결과가 바뀌지 않아야 하는 경로에서 사용합니다.
    pub fn log_or_warn(&self, entry: &AuditEntry) {
        if let Err(e) = self.log(entry) {
            warn!(action = %entry.action, "Failed to write audit entry: {}", e);
        }
    }

    /// 감사 로그 조회 (최근 항목이 뒤에 오도록 시간순 반환)
    pub fn read(&self, trail: AuditTrail, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let path = self.path(trail);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&path)?;
        let mut entries = Vec::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) if query.matches(&entry) => entries.push(entry),
                Ok(_) => {}
                // 동시 기록으로 깨진 줄은 건너뜀
                Err(e) => warn!(line = idx + 1, "Skipping malformed audit line: {}", e),
            }
        }

        if let Some(limit) = query.limit {
            if entries.len() > limit {
                entries.drain(..entries.len() - limit);
            }
        }

        Ok(entries)
    }
}

/// 로컬 호스트 이름 (감사 로그의 host 필드용)
pub fn local_host() -> Option<String> {
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Config(format!(
                "Failed to create audit directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::types::AuditAction;
    use tempfile::TempDir;

    fn logger_in(dir: &TempDir) -> AuditLogger {
        AuditLogger::new(AuditLoggerConfig::in_dir(dir.path()))
    }

    #[test]
    fn test_log_appends_lines() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);

        logger
            .log(&AuditEntry::new(AuditAction::CommandStarted, "local", "ls"))
            .unwrap();
        logger
            .log(
                &AuditEntry::new(AuditAction::CommandSucceeded, "local", "ls")
                    .with_duration(3)
                    .with_exit_code(0),
            )
            .unwrap();

        let content = std::fs::read_to_string(logger.path(AuditTrail::Commands)).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(!logger.path(AuditTrail::Blocked).exists());
    }

    #[test]
    fn test_blocked_entries_use_separate_file() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);

        logger
            .log(
                &AuditEntry::new(AuditAction::CommandBlocked, "remote", "rm -rf /")
                    .with_rule("filesystem.root-delete"),
            )
            .unwrap();

        assert!(!logger.path(AuditTrail::Commands).exists());
        let blocked = logger.read(AuditTrail::Blocked, &AuditQuery::new()).unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].rule.as_deref(), Some("filesystem.root-delete"));
    }

    #[test]
    fn test_read_applies_filter_and_limit() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);

        for i in 0..5 {
            let cmd = format!("echo {}", i);
            logger
                .log(&AuditEntry::new(AuditAction::CommandStarted, "local", &cmd))
                .unwrap();
            logger
                .log(&AuditEntry::new(AuditAction::CommandSucceeded, "local", &cmd))
                .unwrap();
        }

        let query = AuditQuery::new()
            .with_actions(vec![AuditAction::CommandSucceeded])
            .with_limit(2);
        let entries = logger.read(AuditTrail::Commands, &query).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command, "echo 3");
        assert_eq!(entries[1].command, "echo 4");
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let logger = logger_in(&dir);

        logger
            .log(&AuditEntry::new(AuditAction::CommandStarted, "local", "ls"))
            .unwrap();
        append_line(&logger.path(AuditTrail::Commands), "{not json\n").unwrap();

        let entries = logger.read(AuditTrail::Commands, &AuditQuery::new()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let logger = AuditLogger::disabled();
        assert!(!logger.is_enabled());
        logger
            .log(&AuditEntry::new(AuditAction::CommandStarted, "local", "ls"))
            .unwrap();
    }
}
