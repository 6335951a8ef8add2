//! Error types for Shellgate
//!
//! 게이트웨이 전체의 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Shellgate 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 안전 검사 관련
    // ========================================================================
    /// Guard가 차단한 명령어. 재시도 대상이 아님
    #[error("Command blocked: {reason}")]
    Blocked {
        command: String,
        reason: String,
        rule: Option<String>,
        /// 차단 사유와 경고를 포함한 전체 사유 목록
        reasons: Vec<String>,
    },

    // ========================================================================
    // 플러그인 관련
    // ========================================================================
    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        exit_code: Option<i32>,
        duration_ms: u64,
    },

    #[error("Remote error: {0}")]
    Remote(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Guard 차단 여부
    pub fn is_blocked(&self) -> bool {
        matches!(self, Error::Blocked { .. })
    }

    /// 실행 에러 생성 헬퍼
    pub fn execution(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Error::Execution {
            message: message.into(),
            exit_code,
            duration_ms: 0,
        }
    }

    /// Execution 에러에 소요 시간 기록
    pub fn with_duration(self, elapsed_ms: u64) -> Self {
        match self {
            Error::Execution {
                message, exit_code, ..
            } => Error::Execution {
                message,
                exit_code,
                duration_ms: elapsed_ms,
            },
            other => other,
        }
    }

    /// 프로세스 종료 코드 (알 수 있는 경우)
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Execution { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
