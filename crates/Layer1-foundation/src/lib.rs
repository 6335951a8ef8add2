//! # shellgate-foundation
//!
//! Foundation layer for Shellgate:
//! - Error: 게이트웨이 전체 에러 분류 (Blocked, Plugin, Execution ...)
//! - Audit: append-only 감사 로그 (명령어 로그 / 차단 로그)
//! - Config: 통합 설정 (GatewayConfig, 실행/출력 모드)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Entry Adapter (CLI / tool call)                        │
//! │                     │                                   │
//! │                     ▼                                   │
//! │          Plugin Registry ──► Command Safety Guard       │
//! │                     │                                   │
//! │                     ▼                                   │
//! │             Execution Proxy ──► AuditLogger             │
//! │          ┌─────────┴─────────┐                         │
//! │          ▼                   ▼                         │
//! │   Local Executor      Remote Executor                  │
//! │   (sh -c)             (ssh)                            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    AuditSettings, ConfigDir, ExecutionMode, GatewayConfig, OutputMode, RemoteHostConfig,
    DEFAULT_MAX_OUTPUT_BYTES, GATEWAY_CONFIG_FILE,
};

// ============================================================================
// Audit (감사 로깅)
// ============================================================================
pub use audit::{
    local_host, AuditAction, AuditEntry, AuditId, AuditLogger, AuditLoggerConfig, AuditQuery,
    AuditTrail,
};

