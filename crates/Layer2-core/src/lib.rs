//! shellgate-core: Core Runtime for Shellgate
//!
//! Layer2 - 명령 실행 게이트웨이
//!
//! # 주요 모듈
//!
//! - `guard`: 명령어 안전 검사 (내장 차단 규칙 + 플러그인 확장 규칙)
//! - `plugin`: 플러그인 레지스트리 (로드/활성화/의존성/명령어 테이블)
//! - `exec`: 실행 프록시 (guard → 감사 로그 → 로컬/원격 실행)
//! - `plugins`: 내장 플러그인 (proxy, system, docker, files)
//!
//! # 사용 예시
//!
//! ```ignore
//! use shellgate_core::{builtin_plugins, CommandGuard, ExecutionProxy, PluginRegistry};
//!
//! let guard = Arc::new(CommandGuard::new());
//! let registry = PluginRegistry::new(guard.clone(), PluginContext::default());
//! registry.load_all(builtin_plugins()).await?;
//!
//! let proxy = ExecutionProxy::new(guard, Arc::new(ShellExecutor::default()), audit);
//! let result = proxy.execute_command("uptime", &ExecOptions::new()).await?;
//! ```

pub mod exec;
pub mod guard;
pub mod plugin;
pub mod plugins;

// Re-exports: Guard
pub use guard::{
    builtin_rules, suspicious_rules, CommandGuard, GuardFinding, GuardResult, GuardRule, Severity,
};

// Re-exports: Plugin
pub use plugin::{
    tool_input_schema, Command, CommandContext, CommandHandler, ConfigPluginState,
    DependencyGraph, MemoryPluginState, Plugin, PluginContext, PluginError, PluginInfo,
    PluginManifest, PluginRegistry, PluginStateStore, PluginVersion, ResolvedCommand,
    ToolDescriptor, CORE_PLUGIN,
};

// Re-exports: Exec
pub use exec::{
    format_json_response, ExecOptions, ExecutionProxy, ExecutionResult, LocalExecutor, Outcome,
    OutputSink, RemoteExecutor, ShellExecutor, SshExecutor,
};

// Re-exports: Plugins
pub use plugins::builtin_plugins;
