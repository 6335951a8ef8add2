//! Plugin State Store - 활성화된 플러그인 목록 영속화
//!
//! 레지스트리는 활성 집합이 바뀔 때마다 `save_enabled`를 호출합니다.
//! 실제 저장 위치는 구현체가 결정합니다.

use parking_lot::Mutex;
use shellgate_foundation::{ConfigDir, GatewayConfig, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// 활성 플러그인 집합 저장소
pub trait PluginStateStore: Send + Sync {
    /// 저장된 활성 플러그인 이름
    fn load_enabled(&self) -> Result<Vec<String>>;

    /// 활성 플러그인 이름 저장
    fn save_enabled(&self, enabled: &[String]) -> Result<()>;
}

// ============================================================================
// ConfigPluginState - config.json의 enabledPlugins
// ============================================================================

/// 설정 파일의 `enabledPlugins` 필드에 저장
#[derive(Debug, Clone)]
pub struct ConfigPluginState {
    dir: ConfigDir,
}

impl ConfigPluginState {
    pub fn new(dir: ConfigDir) -> Self {
        Self { dir }
    }

    /// 글로벌 설정 디렉토리 사용
    pub fn global() -> Result<Self> {
        Ok(Self::new(ConfigDir::global()?))
    }
}

impl PluginStateStore for ConfigPluginState {
    fn load_enabled(&self) -> Result<Vec<String>> {
        Ok(GatewayConfig::load_from(&self.dir)?.enabled_plugins)
    }

    fn save_enabled(&self, enabled: &[String]) -> Result<()> {
        // 다른 설정 필드는 유지
        let mut config = GatewayConfig::load_from(&self.dir)?;
        config.enabled_plugins = enabled.to_vec();
        config.save_to(&self.dir)?;
        debug!(count = enabled.len(), "Persisted enabled plugins");
        Ok(())
    }
}

// ============================================================================
// MemoryPluginState - 테스트/임시 세션용
// ============================================================================

/// 메모리 저장소
#[derive(Debug, Default)]
pub struct MemoryPluginState {
    enabled: Mutex<Vec<String>>,
    saves: AtomicUsize,
}

impl MemoryPluginState {
    pub fn new(initial: Vec<String>) -> Self {
        Self {
            enabled: Mutex::new(initial),
            saves: AtomicUsize::new(0),
        }
    }

    /// 마지막으로 저장된 목록
    pub fn snapshot(&self) -> Vec<String> {
        self.enabled.lock().clone()
    }

    /// save_enabled 호출 횟수
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl PluginStateStore for MemoryPluginState {
    fn load_enabled(&self) -> Result<Vec<String>> {
        Ok(self.snapshot())
    }

    fn save_enabled(&self, enabled: &[String]) -> Result<()> {
        *self.enabled.lock() = enabled.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellgate_foundation::ExecutionMode;
    use tempfile::TempDir;

    #[test]
    fn test_config_state_preserves_other_fields() {
        let dir = TempDir::new().unwrap();
        let config_dir = ConfigDir::new(dir.path());
        GatewayConfig::new()
            .mode(ExecutionMode::Remote)
            .save_to(&config_dir)
            .unwrap();

        let state = ConfigPluginState::new(config_dir.clone());
        assert!(state.load_enabled().unwrap().is_empty());

        state
            .save_enabled(&["proxy".to_string(), "docker".to_string()])
            .unwrap();

        assert_eq!(state.load_enabled().unwrap(), vec!["proxy", "docker"]);
        let config = GatewayConfig::load_from(&config_dir).unwrap();
        assert_eq!(config.mode, Some(ExecutionMode::Remote));
    }

    #[test]
    fn test_memory_state_counts_saves() {
        let state = MemoryPluginState::new(vec!["proxy".into()]);
        assert_eq!(state.load_enabled().unwrap(), vec!["proxy"]);

        state.save_enabled(&["proxy".into(), "files".into()]).unwrap();
        assert_eq!(state.save_count(), 1);
        assert_eq!(state.snapshot().len(), 2);
    }
}
