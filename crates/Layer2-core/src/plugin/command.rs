//! Command - 플러그인이 제공하는 명령어와 핸들러

use crate::exec::{ExecOptions, ExecutionProxy, ExecutionResult, OutputSink};
use async_trait::async_trait;
use shellgate_foundation::{OutputMode, Result};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// CommandContext - 핸들러 실행 컨텍스트
// ============================================================================

/// 핸들러에 주입되는 실행 컨텍스트
///
/// 출력은 항상 `sink`를 통해 씁니다. 도구 호출 브리지는 Capture sink를 넘깁니다.
#[derive(Clone)]
pub struct CommandContext {
    pub proxy: Arc<ExecutionProxy>,
    pub sink: OutputSink,
    pub options: ExecOptions,
}

impl CommandContext {
    pub fn new(proxy: Arc<ExecutionProxy>, sink: OutputSink, options: ExecOptions) -> Self {
        Self {
            proxy,
            sink,
            options,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.options.output_mode
    }

    /// 실행 후 결과만 반환 (출력 없음)
    pub async fn execute(&self, command: &str) -> Result<ExecutionResult> {
        self.proxy.execute_command(command, &self.options).await
    }

    /// 실행 후 출력 모드에 맞게 결과를 씀
    ///
    /// JSON 모드에서 실행 에러는 `success: false` 응답으로 출력되고 `Ok`를 반환합니다.
    /// 차단은 모든 모드에서 `Err`입니다.
    pub async fn emit(&self, command: &str) -> Result<()> {
        match self.output_mode() {
            OutputMode::Json => {
                let value = self.proxy.execute_json(command, &self.options).await?;
                self.sink.println(&serde_json::to_string_pretty(&value)?);
            }
            _ => {
                let options = self.options.clone().announce();
                let result = self.proxy.execute_command(command, &options).await?;
                self.sink.print(&result.output);
            }
        }
        Ok(())
    }
}

// ============================================================================
// CommandHandler / Command
// ============================================================================

/// 명령어 핸들러
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()>;
}

/// 명령어 정의
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub usage: Option<String>,
    /// 외부 도구 이름 (CLI `call` / 도구 목록 노출용)
    pub tool_name: Option<String>,
    handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("tool_name", &self.tool_name)
            .finish()
    }
}

impl Command {
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: vec![],
            description: String::new(),
            usage: None,
            tool_name: None,
            handler: Arc::new(handler),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// 이름과 별칭 전체
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub async fn run(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        self.handler.handle(ctx, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::LocalExecutor;
    use crate::guard::CommandGuard;
    use shellgate_foundation::AuditLogger;
    use std::path::Path;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
            ctx.sink.println(&args.join(","));
            Ok(())
        }
    }

    struct Fixed;

    #[async_trait]
    impl LocalExecutor for Fixed {
        async fn run(&self, _command: &str, _dir: Option<&Path>) -> Result<String> {
            Ok("fixed\n".into())
        }
    }

    fn context(mode: OutputMode) -> CommandContext {
        let sink = OutputSink::capture();
        let proxy = ExecutionProxy::new(
            Arc::new(CommandGuard::new()),
            Arc::new(Fixed),
            AuditLogger::disabled(),
        )
        .with_sink(sink.clone());
        CommandContext::new(Arc::new(proxy), sink, ExecOptions::new().output_mode(mode))
    }

    #[test]
    fn test_keys_include_aliases() {
        let cmd = Command::new("exec", Noop).with_alias("x").with_alias("run");
        assert_eq!(cmd.keys().collect::<Vec<_>>(), vec!["exec", "x", "run"]);
    }

    #[tokio::test]
    async fn test_run_invokes_handler() {
        let ctx = context(OutputMode::Raw);
        let cmd = Command::new("echo", Noop);
        cmd.run(&ctx, &["a".into(), "b".into()]).await.unwrap();
        assert_eq!(ctx.sink.captured_stdout(), "a,b\n");
    }

    #[tokio::test]
    async fn test_emit_quiet_prints_only_output() {
        let ctx = context(OutputMode::Quiet);
        ctx.emit("uptime").await.unwrap();
        assert_eq!(ctx.sink.captured_stdout(), "fixed\n");
        assert!(ctx.sink.captured_stderr().contains("→ [local] uptime"));
    }

    #[tokio::test]
    async fn test_emit_blocked_prints_no_progress() {
        let ctx = context(OutputMode::Raw);
        let err = ctx.emit("rm -rf /").await.unwrap_err();
        assert!(err.is_blocked());
        assert!(!ctx.sink.captured_stdout().contains("→"));
        assert!(!ctx.sink.captured_stderr().contains("→"));

        ctx.emit("uptime").await.unwrap();
        assert_eq!(ctx.sink.captured_stdout(), "→ [local] uptime\nfixed\n");
    }

    #[tokio::test]
    async fn test_emit_json_prints_response() {
        let ctx = context(OutputMode::Json);
        ctx.emit("uptime").await.unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&ctx.sink.captured_stdout()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["output"], "fixed\n");
    }
}
