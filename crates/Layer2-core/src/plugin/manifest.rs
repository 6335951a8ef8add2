//! Plugin Manifest - 플러그인 메타데이터 정의

use serde::{Deserialize, Serialize};

/// 플러그인 버전
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for PluginVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// 플러그인 매니페스트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// 고유 이름 (레지스트리 키)
    pub name: String,

    pub version: PluginVersion,

    pub description: String,

    /// 의존하는 플러그인 이름 (로드 시 이미 로드되어 있어야 함)
    pub dependencies: Vec<String>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: PluginVersion::default(),
            description: String::new(),
            dependencies: vec![],
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: PluginVersion) -> Self {
        self.version = version;
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 빌더 패턴: 의존성 추가
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }
}
