//! Audit System - 감사 로깅 시스템
//!
//! 명령어 실행 시작/결과/에러, 차단 이벤트를 append-only 파일에 기록합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AuditLogger                             │
//! │  log(entry) ──┬──► commands.log  (started / result / error) │
//! │               └──► blocked.log   (guard 차단)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 감사 대상 이벤트
//!
//! | 이벤트 | 파일 | 위험도 |
//! |--------|------|-------|
//! | 실행 시작 | commands.log | 2 |
//! | 실행 성공 | commands.log | 1 |
//! | 실행 실패 | commands.log | 4 |
//! | 차단 | blocked.log | 8 |

pub mod logger;
pub mod types;

// Re-exports
pub use logger::{local_host, AuditLogger, AuditLoggerConfig, BLOCKED_LOG_FILE, COMMAND_LOG_FILE};
pub use types::{AuditAction, AuditEntry, AuditId, AuditQuery, AuditTrail};
