//! Config Directory - config.json 위치와 읽기/쓰기
//!
//! 글로벌: `<config_dir>/shellgate/config.json`
//! 프로젝트: `<root>/.shellgate/config.json`

use super::gateway::GatewayConfig;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// 설정 디렉토리 이름
pub const CONFIG_DIR_NAME: &str = "shellgate";

/// 설정 파일명
pub const GATEWAY_CONFIG_FILE: &str = "config.json";

/// config.json 하나를 담는 디렉토리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn global() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?;
        Ok(Self::new(base.join(CONFIG_DIR_NAME)))
    }

    pub fn project(root: &Path) -> Self {
        Self::new(root.join(format!(".{}", CONFIG_DIR_NAME)))
    }

    /// 현재 작업 디렉토리 기준 프로젝트 설정
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(&cwd))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(GATEWAY_CONFIG_FILE)
    }

    /// 파일이 없으면 None, 파싱 실패는 에러
    pub fn read(&self) -> Result<Option<GatewayConfig>> {
        let path = self.config_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// 임시 파일에 쓴 뒤 rename (중간 상태의 config.json 방지)
    pub fn write(&self, config: &GatewayConfig) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            Error::Config(format!("Failed to create {}: {}", self.root.display(), e))
        })?;

        let path = self.config_path();
        let staging = self.root.join(format!("{}.tmp", GATEWAY_CONFIG_FILE));
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&staging, content)
            .and_then(|_| std::fs::rename(&staging, &path))
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}
