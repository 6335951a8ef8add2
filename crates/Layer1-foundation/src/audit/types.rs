//! Audit Log Types - 감사 로그 타입 정의
//!
//! 명령어 실행 시작/결과/에러 및 차단 기록을 위한 타입들입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Audit Entry ID
// ============================================================================

/// 감사 로그 엔트리 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl AuditId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Audit Action Type
// ============================================================================

/// 감사 대상 액션 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// 명령어 실행 시작 (dispatch 직전)
    CommandStarted,
    /// 명령어 실행 성공
    CommandSucceeded,
    /// 명령어 실행 실패
    CommandFailed,
    /// Guard에 의한 차단
    CommandBlocked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommandStarted => "command_started",
            Self::CommandSucceeded => "command_succeeded",
            Self::CommandFailed => "command_failed",
            Self::CommandBlocked => "command_blocked",
        }
    }

    /// 위험도 레벨 (0-10)
    pub fn risk_level(&self) -> u8 {
        match self {
            Self::CommandStarted => 2,
            Self::CommandSucceeded => 1,
            Self::CommandFailed => 4,
            Self::CommandBlocked => 8,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Audit Trail
// ============================================================================

/// 감사 로그 파일 구분
///
/// 일반 명령어 로그와 차단 로그는 별도 파일로 관리됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTrail {
    /// 시작/결과/에러 기록
    Commands,
    /// 차단된 명령어 기록
    Blocked,
}

// ============================================================================
// Audit Entry
// ============================================================================

/// 감사 로그 엔트리 (JSON 한 줄로 기록됨)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// 고유 ID
    pub id: AuditId,

    /// 발생 시간
    pub timestamp: DateTime<Utc>,

    /// 액션 타입
    pub action: AuditAction,

    /// 실행 모드 ("local" / "remote")
    pub mode: String,

    /// 실행 대상 호스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// 명령어 원문
    pub command: String,

    /// 소요 시간 (밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// 종료 코드
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// 출력 크기 (바이트). 출력 본문은 기록하지 않음
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_bytes: Option<usize>,

    /// 에러 메시지 또는 차단 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// 차단 규칙 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// 위험도 (0-10)
    pub risk_level: u8,
}

impl AuditEntry {
    /// 새 엔트리 생성
    pub fn new(action: AuditAction, mode: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: AuditId::new(),
            timestamp: Utc::now(),
            action,
            mode: mode.into(),
            host: None,
            command: command.into(),
            duration_ms: None,
            exit_code: None,
            output_bytes: None,
            message: None,
            rule: None,
            risk_level: action.risk_level(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_output_bytes(mut self, bytes: usize) -> Self {
        self.output_bytes = Some(bytes);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// 이 엔트리가 기록될 파일
    pub fn trail(&self) -> AuditTrail {
        match self.action {
            AuditAction::CommandBlocked => AuditTrail::Blocked,
            _ => AuditTrail::Commands,
        }
    }
}

// ============================================================================
// Audit Query
// ============================================================================

/// 감사 로그 조회 조건
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// 액션 필터 (비어 있으면 전체)
    pub actions: Vec<AuditAction>,

    /// 명령어 부분 문자열 필터
    pub command_contains: Option<String>,

    /// 최대 개수 (최근 항목부터)
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions(mut self, actions: Vec<AuditAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_command_contains(mut self, needle: impl Into<String>) -> Self {
        self.command_contains = Some(needle.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 엔트리가 조건에 맞는지 확인
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if !self.actions.is_empty() && !self.actions.contains(&entry.action) {
            return false;
        }
        if let Some(needle) = &self.command_contains {
            if !entry.command.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}
