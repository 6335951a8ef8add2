//! End-to-end gateway scenarios: registry → command → guard → proxy → audit

use async_trait::async_trait;
use shellgate_core::{
    builtin_plugins, CommandContext, CommandGuard, ConfigPluginState, ExecOptions,
    ExecutionProxy, LocalExecutor, MemoryPluginState, OutputSink, PluginContext, PluginError,
    PluginRegistry, ShellExecutor,
};
use shellgate_foundation::{
    AuditLogger, AuditLoggerConfig, AuditQuery, AuditTrail, ConfigDir, Error, GatewayConfig,
    OutputMode, Result,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// 호출 횟수를 세는 실행기
#[derive(Default)]
struct CountingExecutor {
    calls: AtomicUsize,
}

impl CountingExecutor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalExecutor for CountingExecutor {
    async fn run(&self, command: &str, _working_dir: Option<&Path>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}\n", command))
    }
}

struct Gateway {
    registry: PluginRegistry,
    ctx: CommandContext,
    executor: Arc<CountingExecutor>,
    audit: AuditLogger,
    _dir: TempDir,
}

async fn gateway(mode: OutputMode) -> Gateway {
    let dir = TempDir::new().unwrap();
    let guard = Arc::new(CommandGuard::new());
    let executor = Arc::new(CountingExecutor::default());
    let audit = AuditLogger::new(AuditLoggerConfig::in_dir(dir.path()));
    let sink = OutputSink::capture();

    let registry = PluginRegistry::new(guard.clone(), PluginContext::default())
        .with_state_store(Arc::new(MemoryPluginState::default()));
    registry.load_all(builtin_plugins()).await.unwrap();

    let proxy = ExecutionProxy::new(guard, executor.clone(), audit.clone()).with_sink(sink.clone());
    let ctx = CommandContext::new(
        Arc::new(proxy),
        sink,
        ExecOptions::new().output_mode(mode),
    );

    Gateway {
        registry,
        ctx,
        executor,
        audit,
        _dir: dir,
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn builtin_table_enables_only_core_plugin() {
    let gw = gateway(OutputMode::Raw).await;

    assert_eq!(gw.registry.enabled_plugins().await, vec!["proxy"]);
    assert!(gw.registry.is_loaded("docker").await);
    assert!(gw.registry.resolve_command("x").await.is_some());
    assert!(gw.registry.resolve_command("ps").await.is_none());
}

#[tokio::test]
async fn blocked_command_never_reaches_executor() {
    let gw = gateway(OutputMode::Raw).await;

    let err = gw
        .registry
        .run_command("exec", &gw.ctx, &args(&["rm", "-rf", "/"]))
        .await
        .unwrap_err();

    assert!(err.is_blocked());
    assert_eq!(gw.executor.calls(), 0);

    let blocked = gw
        .audit
        .read(AuditTrail::Blocked, &AuditQuery::new())
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].command, "rm -rf /");
}

#[tokio::test]
async fn blocked_command_is_an_error_in_json_mode() {
    let gw = gateway(OutputMode::Json).await;

    let err = gw
        .registry
        .run_command("run", &gw.ctx, &args(&["mkfs.ext4 /dev/sda1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Blocked { .. }));
    assert!(gw.ctx.sink.captured_stdout().is_empty());
    assert_eq!(gw.executor.calls(), 0);
}

#[tokio::test]
async fn alias_runs_the_same_command() {
    let gw = gateway(OutputMode::Quiet).await;

    gw.registry
        .run_command("x", &gw.ctx, &args(&["uptime"]))
        .await
        .unwrap();

    assert_eq!(gw.ctx.sink.captured_stdout(), "uptime\n");
    assert_eq!(gw.executor.calls(), 1);

    let commands = gw
        .audit
        .read(AuditTrail::Commands, &AuditQuery::new())
        .unwrap();
    assert_eq!(commands.len(), 2);
}

#[tokio::test]
async fn unknown_command_is_reported() {
    let gw = gateway(OutputMode::Raw).await;

    let err = gw
        .registry
        .run_command("deploy", &gw.ctx, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CommandNotFound(ref name) if name == "deploy"));
}

#[tokio::test]
async fn plugin_guard_rules_apply_while_enabled() {
    let gw = gateway(OutputMode::Quiet).await;
    let volume_rm = args(&["docker volume rm pgdata"]);

    gw.registry.enable("docker").await.unwrap();
    let err = gw
        .registry
        .run_command("exec", &gw.ctx, &volume_rm)
        .await
        .unwrap_err();
    assert!(err.is_blocked());
    assert_eq!(gw.executor.calls(), 0);

    gw.registry.disable("docker").await.unwrap();
    gw.registry
        .run_command("exec", &gw.ctx, &volume_rm)
        .await
        .unwrap();
    assert_eq!(gw.executor.calls(), 1);
}

#[tokio::test]
async fn core_plugin_cannot_be_disabled() {
    let gw = gateway(OutputMode::Raw).await;
    gw.registry.enable("files").await.unwrap();

    let err = gw.registry.disable("proxy").await.unwrap_err();
    assert!(matches!(err, PluginError::Protected(_)));

    let err = gw.registry.unload("proxy").await.unwrap_err();
    assert!(matches!(err, PluginError::Protected(_)));
    assert!(gw.registry.is_enabled("proxy").await);
}

#[tokio::test]
async fn tool_listing_follows_enabled_plugins() {
    let gw = gateway(OutputMode::Raw).await;
    let names = |tools: Vec<shellgate_core::ToolDescriptor>| {
        tools.into_iter().map(|t| t.name).collect::<Vec<_>>()
    };

    assert_eq!(
        names(gw.registry.tool_commands().await),
        vec!["check_command", "execute_command"]
    );

    gw.registry.enable("system").await.unwrap();
    let tools = names(gw.registry.tool_commands().await);
    assert!(tools.contains(&"system_status".to_string()));
    assert!(gw.registry.resolve_tool("system_status").await.is_some());
}

#[tokio::test]
async fn enabled_set_persists_through_config_file() {
    let dir = TempDir::new().unwrap();
    let config_dir = ConfigDir::new(dir.path());

    {
        let registry = PluginRegistry::new(Arc::new(CommandGuard::new()), PluginContext::default())
            .with_state_store(Arc::new(ConfigPluginState::new(config_dir.clone())));
        registry.load_all(builtin_plugins()).await.unwrap();
        registry.enable("files").await.unwrap();
    }

    let saved = GatewayConfig::load_from(&config_dir).unwrap().enabled_plugins;
    assert_eq!(saved, vec!["files", "proxy"]);

    let registry = PluginRegistry::new(Arc::new(CommandGuard::new()), PluginContext::default())
        .with_state_store(Arc::new(ConfigPluginState::new(config_dir)));
    registry.load_all(builtin_plugins()).await.unwrap();
    assert_eq!(registry.enabled_plugins().await, vec!["proxy", "files"]);
    assert!(registry.resolve_command("upload").await.is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn local_json_execution_with_real_shell() {
    let dir = TempDir::new().unwrap();
    let proxy = ExecutionProxy::new(
        Arc::new(CommandGuard::new()),
        Arc::new(ShellExecutor::default()),
        AuditLogger::new(AuditLoggerConfig::in_dir(dir.path())),
    );

    let value = proxy
        .execute_json(
            "echo \"test output\"",
            &ExecOptions::new().output_mode(OutputMode::Json),
        )
        .await
        .unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["command"], "echo \"test output\"");
    assert_eq!(value["output"], "test output\n");
    assert_eq!(value["metadata"]["isLocal"], true);
    assert_eq!(value["metadata"]["exitCode"], 0);
    assert!(value.get("error").is_none());
}
