//! Execution Proxy - 모드별 명령 실행, 감사 기록, 결과 생성
//!
//! ## 실행 흐름
//!
//! ```text
//! execute_command(cmd)
//!   ├─ guard 검사 ── 경고: 진단 스트림 / 차단: blocked.log + Error::Blocked
//!   ├─ "started" 기록 (commands.log)
//!   ├─ dispatch ── Local: LocalExecutor / Remote: RemoteExecutor
//!   ├─ 실패: "failed" 기록 후 에러 반환 (재시도 없음)
//!   └─ 성공: "succeeded" 기록 후 ExecutionResult 반환
//! ```
//!
//! 출력 모드는 메시지가 어디로 가는지만 바꾸며 검사와 실행에는 영향이 없습니다.
//! 이 계층에는 타임아웃이 없습니다. 필요하면 호출자가 `tokio::time::timeout`으로 감쌉니다.

use super::local::LocalExecutor;
use super::remote::{with_remote_workdir, RemoteExecutor};
use super::response::{format_json_response, Outcome};
use super::sink::OutputSink;
use crate::guard::{CommandGuard, GuardResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shellgate_foundation::{
    local_host, AuditAction, AuditEntry, AuditLogger, Error, ExecutionMode, OutputMode, Result,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

// ============================================================================
// Options / Result
// ============================================================================

/// 실행 옵션
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// guard 검사 생략 (내부 호출 전용)
    pub skip_guard: bool,

    /// 감사 기록 생략
    pub skip_logging: bool,

    /// 작업 디렉토리
    pub working_directory: Option<PathBuf>,

    /// 출력 모드
    pub output_mode: OutputMode,

    /// JSON 응답 필드 허용 목록
    pub json_fields: Option<Vec<String>>,

    /// guard 통과 후 `→ [mode] cmd` 진행 메시지 출력
    pub announce: bool,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_guard(mut self) -> Self {
        self.skip_guard = true;
        self
    }

    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn json_fields(mut self, fields: Vec<String>) -> Self {
        self.json_fields = Some(fields);
        self
    }

    pub fn announce(mut self) -> Self {
        self.announce = true;
        self
    }
}

/// 1회 실행 결과 (생성 후 불변)
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub is_local: bool,
    pub exit_code: i32,
}

// ============================================================================
// ExecutionProxy
// ============================================================================

/// 실행 프록시
pub struct ExecutionProxy {
    guard: Arc<CommandGuard>,
    mode: ExecutionMode,
    local: Arc<dyn LocalExecutor>,
    remote: Option<Arc<dyn RemoteExecutor>>,
    audit: AuditLogger,
    sink: OutputSink,
}

impl ExecutionProxy {
    /// 로컬 모드 프록시 생성
    pub fn new(guard: Arc<CommandGuard>, local: Arc<dyn LocalExecutor>, audit: AuditLogger) -> Self {
        Self {
            guard,
            mode: ExecutionMode::Local,
            local,
            remote: None,
            audit,
            sink: OutputSink::Console,
        }
    }

    /// 원격 실행기 설정 (모드는 Remote로 전환)
    pub fn with_remote(mut self, remote: Arc<dyn RemoteExecutor>) -> Self {
        self.remote = Some(remote);
        self.mode = ExecutionMode::Remote;
        self
    }

    /// 실행 모드 지정
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// 경고 출력 채널
    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn is_local(&self) -> bool {
        self.mode.is_local()
    }

    pub fn guard(&self) -> &Arc<CommandGuard> {
        &self.guard
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteExecutor>> {
        self.remote.as_ref()
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// guard 검사만 수행 (실행 없음)
    pub fn check(&self, command: &str) -> GuardResult {
        self.guard.check_command(command)
    }

    /// 대상 호스트 (감사 로그용)
    fn target_host(&self) -> Option<String> {
        match self.mode {
            ExecutionMode::Local => local_host(),
            ExecutionMode::Remote => self.remote.as_ref().map(|r| r.host().to_string()),
        }
    }

    fn audit_entry(&self, action: AuditAction, command: &str) -> AuditEntry {
        let entry = AuditEntry::new(action, self.mode.as_str(), command);
        match self.target_host() {
            Some(host) => entry.with_host(host),
            None => entry,
        }
    }

    /// 명령 실행
    pub async fn execute_command(
        &self,
        command: &str,
        options: &ExecOptions,
    ) -> Result<ExecutionResult> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::InvalidInput("Empty command".to_string()));
        }

        // 1. Guard
        if !options.skip_guard {
            self.enforce_guard(command, options)?;
        }
        if options.announce {
            self.sink
                .progress(options.output_mode, &format!("→ [{}] {}", self.mode, command));
        }

        // 2. Started
        if !options.skip_logging {
            self.audit
                .log_or_warn(&self.audit_entry(AuditAction::CommandStarted, command));
        }

        // 3. Dispatch
        debug!(mode = %self.mode, command, "Dispatching command");
        let started = Instant::now();
        let outcome = self.dispatch(command, options).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                // 5. Result
                if !options.skip_logging {
                    self.audit.log_or_warn(
                        &self
                            .audit_entry(AuditAction::CommandSucceeded, command)
                            .with_duration(duration_ms)
                            .with_exit_code(0)
                            .with_output_bytes(output.len()),
                    );
                }
                info!(mode = %self.mode, duration_ms, "Command succeeded");

                Ok(ExecutionResult {
                    output,
                    duration_ms,
                    timestamp: Utc::now(),
                    command: command.to_string(),
                    is_local: self.is_local(),
                    exit_code: 0,
                })
            }
            Err(e) => {
                // 4. Error (재시도 없음)
                let e = e.with_duration(duration_ms);
                if !options.skip_logging {
                    let mut entry = self
                        .audit_entry(AuditAction::CommandFailed, command)
                        .with_duration(duration_ms)
                        .with_message(e.to_string());
                    if let Some(code) = e.exit_code() {
                        entry = entry.with_exit_code(code);
                    }
                    self.audit.log_or_warn(&entry);
                }
                warn!(mode = %self.mode, duration_ms, "Command failed: {}", e);
                Err(e)
            }
        }
    }

    /// JSON 경로
    ///
    /// 실행 에러는 `success: false` 응답으로 변환됩니다.
    /// 차단과 입력 에러는 그대로 `Err`로 반환됩니다.
    pub async fn execute_json(&self, command: &str, options: &ExecOptions) -> Result<Value> {
        let fields = options.json_fields.as_deref();
        match self.execute_command(command, options).await {
            Ok(result) => Ok(format_json_response(Outcome::Success(&result), fields)),
            Err(e) if e.is_blocked() || matches!(e, Error::InvalidInput(_)) => Err(e),
            Err(e) => Ok(format_json_response(
                Outcome::Failure {
                    command: command.trim(),
                    error: &e,
                    is_local: self.is_local(),
                },
                fields,
            )),
        }
    }

    fn enforce_guard(&self, command: &str, options: &ExecOptions) -> Result<()> {
        let verdict = self.guard.check_command(command);

        for warning in verdict.warnings() {
            warn!(rule = %warning.rule, "{}", warning.message);
            self.sink.eprintln(&format!("⚠ {}", warning));
        }

        let Some(primary) = verdict.primary() else {
            return Ok(());
        };

        warn!(rule = %primary.rule, command, "Command blocked: {}", primary.message);
        if !options.skip_logging {
            self.audit.log_or_warn(
                &self
                    .audit_entry(AuditAction::CommandBlocked, command)
                    .with_rule(primary.rule.clone())
                    .with_message(primary.message.clone()),
            );
        }

        Err(Error::Blocked {
            command: command.to_string(),
            reason: primary.message.clone(),
            rule: verdict.rule.clone(),
            reasons: verdict.reason_messages(),
        })
    }

    async fn dispatch(&self, command: &str, options: &ExecOptions) -> Result<String> {
        match self.mode {
            ExecutionMode::Local => {
                self.local
                    .run(command, options.working_directory.as_deref())
                    .await
            }
            ExecutionMode::Remote => {
                let remote = self.remote.as_ref().ok_or_else(|| {
                    Error::Remote("Remote mode is active but no remote host is configured".into())
                })?;
                match &options.working_directory {
                    Some(dir) => {
                        let wrapped = with_remote_workdir(command, dir)?;
                        remote.execute_command(&wrapped).await
                    }
                    None => remote.execute_command(command).await,
                }
            }
        }
    }
}
