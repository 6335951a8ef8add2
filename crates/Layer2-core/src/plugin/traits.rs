//! Plugin traits - 핵심 플러그인 인터페이스

use super::command::Command;
use super::manifest::PluginManifest;
use crate::exec::OutputSink;
use crate::guard::GuardRule;
use async_trait::async_trait;
use shellgate_foundation::{ExecutionMode, Result};

// ============================================================================
// PluginContext - 생명주기 훅에 제공되는 컨텍스트
// ============================================================================

/// 플러그인 컨텍스트
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// 현재 실행 모드
    mode: ExecutionMode,

    /// 진단 메시지 출력 채널
    sink: OutputSink,
}

impl Default for PluginContext {
    fn default() -> Self {
        Self::new(ExecutionMode::Local, OutputSink::Console)
    }
}

impl PluginContext {
    pub fn new(mode: ExecutionMode, sink: OutputSink) -> Self {
        Self { mode, sink }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn is_local(&self) -> bool {
        self.mode.is_local()
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }
}

// ============================================================================
// Plugin Trait - 모든 플러그인이 구현해야 하는 인터페이스
// ============================================================================

/// 플러그인 트레이트
///
/// 플러그인은 컴파일 타임에 등록됩니다 (`plugins::builtin_plugins`).
/// 인스턴스는 로드된 동안 레지스트리가 소유합니다.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 플러그인 매니페스트 반환
    fn manifest(&self) -> PluginManifest;

    /// 제공하는 명령어 목록
    fn commands(&self) -> Vec<Command>;

    /// 추가 guard 규칙 (활성화된 동안 적용)
    fn guard_rules(&self) -> Vec<GuardRule> {
        vec![]
    }

    /// 활성화 시 호출 (명령어 등록 직후)
    async fn on_load(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// 비활성화 시 호출 (명령어 제거 직전)
    async fn on_unload(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}
