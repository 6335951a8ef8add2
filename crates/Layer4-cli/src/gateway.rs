//! Gateway bootstrap - 설정 로드와 구성 요소 조립
//!
//! CLI 호출 한 번에 하나의 Gateway를 만듭니다.
//! 설정 우선순위: CLI 플래그 > 환경 변수 > 프로젝트 설정 > 글로벌 설정

use shellgate_core::{
    builtin_plugins, CommandContext, CommandGuard, ConfigPluginState, ExecOptions,
    ExecutionProxy, OutputSink, PluginContext, PluginRegistry, RemoteExecutor, ShellExecutor,
    SshExecutor,
};
use shellgate_foundation::{
    AuditLogger, Error, ExecutionMode, GatewayConfig, OutputMode, Result,
};
use std::sync::Arc;
use tracing::debug;

/// CLI 전역 플래그
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub local: bool,
    pub output_mode: Option<OutputMode>,
    pub fields: Option<Vec<String>>,
    pub no_audit: bool,
}

impl Overrides {
    /// 설정에 CLI 플래그 반영
    pub fn apply(&self, config: &mut GatewayConfig) {
        if self.local {
            config.mode = Some(ExecutionMode::Local);
        }
        if let Some(mode) = self.output_mode {
            config.output_mode = Some(mode);
        }
        if let Some(fields) = &self.fields {
            config.json_fields = Some(fields.clone());
        }
        if self.no_audit {
            config.audit.enabled = Some(false);
        }
    }
}

/// 조립된 게이트웨이
pub struct Gateway {
    pub config: GatewayConfig,
    pub registry: PluginRegistry,
    guard: Arc<CommandGuard>,
    audit: AuditLogger,
    remote: Option<Arc<dyn RemoteExecutor>>,
}

impl Gateway {
    /// 설정을 로드하고 내장 플러그인을 등록
    pub async fn bootstrap(overrides: &Overrides) -> Result<Self> {
        let mut config = GatewayConfig::load()?;
        overrides.apply(&mut config);
        Self::from_config(config, Arc::new(ConfigPluginState::global()?)).await
    }

    pub async fn from_config(
        config: GatewayConfig,
        state: Arc<dyn shellgate_core::PluginStateStore>,
    ) -> Result<Self> {
        let mode = config.effective_mode();
        let remote = match (mode, &config.remote) {
            (ExecutionMode::Local, _) => None,
            (ExecutionMode::Remote, Some(host)) => {
                Some(Arc::new(SshExecutor::new(host.clone())?) as Arc<dyn RemoteExecutor>)
            }
            (ExecutionMode::Remote, None) => {
                return Err(Error::Config(
                    "Remote mode requires a `remote` host in config.json (or use --local)".into(),
                ))
            }
        };
        debug!(mode = %mode, "Gateway mode resolved");

        let guard = Arc::new(CommandGuard::new());
        let registry = PluginRegistry::new(
            guard.clone(),
            PluginContext::new(mode, OutputSink::console()),
        )
        .with_state_store(state);
        registry.load_all(builtin_plugins()).await?;

        let audit = AuditLogger::new(config.audit.to_logger_config());

        Ok(Self {
            config,
            registry,
            guard,
            audit,
            remote,
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.config.effective_mode()
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// 실행 옵션 (출력 모드, JSON 필드)
    pub fn options(&self) -> ExecOptions {
        let options = ExecOptions::new().output_mode(self.config.effective_output_mode());
        match &self.config.json_fields {
            Some(fields) => options.json_fields(fields.clone()),
            None => options,
        }
    }

    /// 주어진 sink로 출력하는 실행 프록시
    pub fn proxy(&self, sink: OutputSink) -> ExecutionProxy {
        let local = Arc::new(ShellExecutor::new(self.config.effective_max_output_bytes()));
        let proxy = ExecutionProxy::new(self.guard.clone(), local, self.audit.clone())
            .with_mode(self.mode())
            .with_sink(sink);
        match &self.remote {
            Some(remote) => proxy.with_remote(remote.clone()),
            None => proxy,
        }
    }

    /// 핸들러 실행 컨텍스트
    pub fn context(&self, sink: OutputSink) -> CommandContext {
        CommandContext::new(Arc::new(self.proxy(sink.clone())), sink, self.options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellgate_core::MemoryPluginState;
    use shellgate_foundation::RemoteHostConfig;

    fn local_config() -> GatewayConfig {
        let mut config = GatewayConfig::new().mode(ExecutionMode::Local);
        config.audit.enabled = Some(false);
        config
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = GatewayConfig::new().remote(RemoteHostConfig::new("prod"));
        Overrides {
            local: true,
            output_mode: Some(OutputMode::Json),
            fields: Some(vec!["success".into()]),
            no_audit: true,
        }
        .apply(&mut config);

        assert_eq!(config.effective_mode(), ExecutionMode::Local);
        assert_eq!(config.effective_output_mode(), OutputMode::Json);
        assert!(!config.audit.is_enabled());
    }

    #[tokio::test]
    async fn test_remote_mode_without_host_fails() {
        let config = GatewayConfig::new().mode(ExecutionMode::Remote);
        let result = Gateway::from_config(config, Arc::new(MemoryPluginState::default())).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_local_gateway_loads_builtins() {
        let gateway = Gateway::from_config(local_config(), Arc::new(MemoryPluginState::default()))
            .await
            .unwrap();

        assert_eq!(gateway.mode(), ExecutionMode::Local);
        assert_eq!(gateway.registry.get_all_plugins().await.len(), 4);
        assert!(gateway.proxy(OutputSink::capture()).is_local());
    }
}
