//! Config - 통합 설정 관리
//!
//! - `gateway.rs` - GatewayConfig 통합 설정 (모드, 원격 호스트, 플러그인, 감사 로그)
//! - `dir.rs` - 글로벌/프로젝트 config.json 위치와 읽기/쓰기

mod dir;
mod gateway;

pub use dir::{ConfigDir, CONFIG_DIR_NAME, GATEWAY_CONFIG_FILE};
pub use gateway::{
    AuditSettings, ExecutionMode, GatewayConfig, OutputMode, RemoteHostConfig,
    DEFAULT_MAX_OUTPUT_BYTES, ENV_LOCAL, ENV_MODE,
};
