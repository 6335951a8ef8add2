//! proxy - 핵심 플러그인 (비활성화 불가)
//!
//! - `exec` (x, run): guard 검사 후 현재 모드로 실행
//! - `check` (guard): guard 판정만 출력

use crate::guard::GuardResult;
use crate::plugin::{Command, CommandContext, CommandHandler, Plugin, PluginManifest, CORE_PLUGIN};
use async_trait::async_trait;
use shellgate_foundation::{Error, OutputMode, Result};

/// 인자를 하나의 셸 명령으로 합침
pub(crate) fn join_command(args: &[String], usage: &str) -> Result<String> {
    let command = args.join(" ");
    if command.trim().is_empty() {
        return Err(Error::InvalidInput(format!("Usage: {}", usage)));
    }
    Ok(command)
}

// ============================================================================
// Handlers
// ============================================================================

struct ExecHandler;

#[async_trait]
impl CommandHandler for ExecHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        let command = join_command(args, "exec <command...>")?;
        ctx.emit(&command).await
    }
}

struct CheckHandler;

impl CheckHandler {
    fn render(verdict: &GuardResult) -> String {
        let mut lines = Vec::new();
        match verdict.primary() {
            Some(primary) => lines.push(format!("✗ Blocked: {}", primary)),
            None => lines.push("✓ Allowed".to_string()),
        }
        for warning in verdict.warnings() {
            lines.push(format!("⚠ {}", warning));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl CommandHandler for CheckHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        let command = join_command(args, "check <command...>")?;
        let verdict = ctx.proxy.check(&command);

        match ctx.output_mode() {
            OutputMode::Json => ctx.sink.println(&serde_json::to_string_pretty(&verdict)?),
            _ => ctx.sink.println(&Self::render(&verdict)),
        }
        Ok(())
    }
}

// ============================================================================
// ProxyPlugin
// ============================================================================

/// 핵심 실행 플러그인
#[derive(Debug, Default)]
pub struct ProxyPlugin;

impl ProxyPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for ProxyPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new(CORE_PLUGIN)
            .with_description("Guarded command execution (local or remote)")
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("exec", ExecHandler)
                .with_alias("x")
                .with_alias("run")
                .with_description("Execute a command through the safety guard")
                .with_usage("exec <command...>")
                .with_tool("execute_command"),
            Command::new("check", CheckHandler)
                .with_alias("guard")
                .with_description("Evaluate a command against the guard without running it")
                .with_usage("check <command...>")
                .with_tool("check_command"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ExecOptions, ExecutionProxy, LocalExecutor, OutputSink};
    use crate::guard::CommandGuard;
    use shellgate_foundation::AuditLogger;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl LocalExecutor for Counting {
        async fn run(&self, command: &str, _dir: Option<&Path>) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("ran: {}\n", command))
        }
    }

    fn context(executor: Arc<Counting>, mode: OutputMode) -> CommandContext {
        let proxy = ExecutionProxy::new(Arc::new(CommandGuard::new()), executor, AuditLogger::disabled());
        CommandContext::new(
            Arc::new(proxy),
            OutputSink::capture(),
            ExecOptions::new().output_mode(mode),
        )
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_exec_joins_arguments() {
        let executor = Arc::new(Counting::default());
        let ctx = context(executor.clone(), OutputMode::Quiet);

        ExecHandler.handle(&ctx, &args(&["ls", "-la"])).await.unwrap();
        assert_eq!(ctx.sink.captured_stdout(), "ran: ls -la\n");
        assert_eq!(executor.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exec_requires_command() {
        let ctx = context(Arc::new(Counting::default()), OutputMode::Raw);
        let err = ExecHandler.handle(&ctx, &[]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_check_never_executes() {
        let executor = Arc::new(Counting::default());
        let ctx = context(executor.clone(), OutputMode::Raw);

        CheckHandler.handle(&ctx, &args(&["rm", "-rf", "/"])).await.unwrap();
        assert!(ctx.sink.captured_stdout().starts_with("✗ Blocked"));
        assert_eq!(executor.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_check_json_output() {
        let ctx = context(Arc::new(Counting::default()), OutputMode::Json);
        CheckHandler.handle(&ctx, &args(&["ls"])).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&ctx.sink.captured_stdout()).unwrap();
        assert_eq!(value["isBlocked"], false);
    }

    #[test]
    fn test_commands_expose_tools() {
        let tools: Vec<_> = ProxyPlugin::new()
            .commands()
            .into_iter()
            .filter_map(|c| c.tool_name)
            .collect();
        assert_eq!(tools, vec!["execute_command", "check_command"]);
    }
}
