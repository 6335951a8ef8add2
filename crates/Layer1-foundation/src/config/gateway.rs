//! Gateway Config - 통합 설정
//!
//! 글로벌(`<config_dir>/shellgate/config.json`)과 프로젝트(`.shellgate/config.json`)
//! 설정을 병합하고, 환경 변수로 덮어씁니다.

use super::dir::ConfigDir;
use crate::audit::AuditLoggerConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 실행 모드 환경 변수 (`local` / `remote`)
pub const ENV_MODE: &str = "SHELLGATE_MODE";

/// 로컬 실행 강제 환경 변수 (`1` / `true`)
pub const ENV_LOCAL: &str = "SHELLGATE_LOCAL";

/// 로컬 실행 출력 버퍼 기본 상한 (10 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// Modes
// ============================================================================

/// 명령어 실행 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// 로컬 서브프로세스
    Local,
    /// 원격 (SSH)
    Remote,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "ssh" => Ok(Self::Remote),
            other => Err(Error::Config(format!("Unknown execution mode: {}", other))),
        }
    }
}

/// 출력 모드
///
/// 진행/진단 메시지를 어디로 보낼지와 JSON 출력 여부만 결정합니다.
/// 안전 검사와 실행 동작에는 영향이 없습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// 진행 메시지와 결과를 stdout으로
    #[default]
    Raw,
    /// 결과만 stdout, 경고는 진단 스트림으로
    Quiet,
    /// pretty-printed JSON 응답
    Json,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Quiet => "quiet",
            Self::Json => "json",
        }
    }

    /// 진행 메시지를 stdout에 쓰는지 여부
    pub fn progress_to_stdout(&self) -> bool {
        matches!(self, Self::Raw)
    }
}

impl std::str::FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "quiet" => Ok(Self::Quiet),
            "json" => Ok(Self::Json),
            other => Err(Error::Config(format!("Unknown output mode: {}", other))),
        }
    }
}

// ============================================================================
// Gateway Config (통합)
// ============================================================================

/// Shellgate 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 실행 모드 (미지정 시 원격 호스트 설정 유무로 결정)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,

    /// 원격 호스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteHostConfig>,

    /// 활성화된 플러그인 목록 (영속화)
    #[serde(default)]
    pub enabled_plugins: Vec<String>,

    /// 감사 로그 설정
    #[serde(default)]
    pub audit: AuditSettings,

    /// 기본 출력 모드
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_mode: Option<OutputMode>,

    /// JSON 응답 필드 허용 목록
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_fields: Option<Vec<String>>,

    /// 로컬 실행 출력 버퍼 상한 (바이트)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_bytes: Option<usize>,
}

fn default_version() -> u32 {
    1
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Default::default()
        }
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드 후 환경 변수 적용
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = ConfigDir::global() {
            if let Some(global_config) = global.read()? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = ConfigDir::current_project() {
            if let Some(project_config) = project.read()? {
                config.merge(project_config);
            }
        }

        // 3. 환경 변수
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// 한 디렉토리에서만 로드 (병합/환경 변수 없음)
    pub fn load_from(dir: &ConfigDir) -> Result<Self> {
        Ok(dir.read()?.unwrap_or_else(Self::new))
    }

    pub fn save_to(&self, dir: &ConfigDir) -> Result<()> {
        dir.write(self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: GatewayConfig) {
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if other.remote.is_some() {
            self.remote = other.remote;
        }
        if !other.enabled_plugins.is_empty() {
            self.enabled_plugins = other.enabled_plugins;
        }
        self.audit.merge(other.audit);
        if other.output_mode.is_some() {
            self.output_mode = other.output_mode;
        }
        if other.json_fields.is_some() {
            self.json_fields = other.json_fields;
        }
        if other.max_output_bytes.is_some() {
            self.max_output_bytes = other.max_output_bytes;
        }
    }

    /// 환경 변수 적용 (조회 함수 주입으로 테스트 가능)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = Some(mode.parse()?);
        }
        if let Some(local) = lookup(ENV_LOCAL) {
            if matches!(local.trim(), "1" | "true" | "yes") {
                self.mode = Some(ExecutionMode::Local);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Effective values
    // ========================================================================

    /// 실제 실행 모드
    pub fn effective_mode(&self) -> ExecutionMode {
        self.mode.unwrap_or(if self.remote.is_some() {
            ExecutionMode::Remote
        } else {
            ExecutionMode::Local
        })
    }

    pub fn effective_output_mode(&self) -> OutputMode {
        self.output_mode.unwrap_or_default()
    }

    pub fn effective_max_output_bytes(&self) -> usize {
        self.max_output_bytes.unwrap_or(DEFAULT_MAX_OUTPUT_BYTES)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn remote(mut self, remote: RemoteHostConfig) -> Self {
        self.remote = Some(remote);
        self
    }
}

// ============================================================================
// Remote Host Config
// ============================================================================

/// 원격 호스트 접속 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHostConfig {
    /// 호스트 이름 또는 IP
    pub host: String,

    /// 사용자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// 포트 (기본: 22)
    #[serde(default = "default_port")]
    pub port: u16,

    /// 개인 키 파일
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
}

fn default_port() -> u16 {
    22
}

impl RemoteHostConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: default_port(),
            identity_file: None,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// ssh 대상 문자열 (user@host)
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

// ============================================================================
// Audit Settings
// ============================================================================

/// 감사 로그 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSettings {
    /// 기록 활성화 (미지정 시 활성)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// 로그 디렉토리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// 명령어 로그 파일명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_log: Option<String>,

    /// 차단 로그 파일명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_log: Option<String>,
}

impl AuditSettings {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    fn merge(&mut self, other: AuditSettings) {
        if other.enabled.is_some() {
            self.enabled = other.enabled;
        }
        if other.dir.is_some() {
            self.dir = other.dir;
        }
        if other.command_log.is_some() {
            self.command_log = other.command_log;
        }
        if other.blocked_log.is_some() {
            self.blocked_log = other.blocked_log;
        }
    }

    /// AuditLogger 설정으로 변환
    pub fn to_logger_config(&self) -> AuditLoggerConfig {
        let mut config = AuditLoggerConfig::default();
        config.enabled = self.is_enabled();
        if let Some(dir) = &self.dir {
            config.dir = dir.clone();
        }
        if let Some(file) = &self.command_log {
            config.command_log = file.clone();
        }
        if let Some(file) = &self.blocked_log {
            config.blocked_log = file.clone();
        }
        config
    }
}
