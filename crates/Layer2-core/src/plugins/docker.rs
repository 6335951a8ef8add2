//! docker - 컨테이너 관리 명령어
//!
//! 활성화되어 있는 동안 볼륨을 삭제하는 명령을 추가로 차단합니다.

use super::proxy::join_command;
use crate::guard::GuardRule;
use crate::plugin::{
    Command, CommandContext, CommandHandler, Plugin, PluginContext, PluginManifest, CORE_PLUGIN,
};
use async_trait::async_trait;
use shellgate_foundation::{Error, Result};
use tracing::{error, warn};

/// 기본 로그 줄 수
const DEFAULT_LOG_LINES: u32 = 100;

/// 인자를 셸 단어로 인용
fn quote_args(args: &[String]) -> Result<String> {
    shlex::try_join(args.iter().map(String::as_str))
        .map_err(|e| Error::InvalidInput(format!("Invalid argument: {}", e)))
}

// ============================================================================
// Handlers
// ============================================================================

struct PsHandler;

#[async_trait]
impl CommandHandler for PsHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        let command = if args.is_empty() {
            "docker ps".to_string()
        } else {
            format!("docker ps {}", quote_args(args)?)
        };
        ctx.emit(&command).await
    }
}

struct LogsHandler;

#[async_trait]
impl CommandHandler for LogsHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        let usage = || Error::InvalidInput("Usage: logs <container> [lines]".to_string());
        let container = args.first().ok_or_else(usage)?;
        let lines = match args.get(1) {
            Some(n) => n.parse::<u32>().map_err(|_| usage())?,
            None => DEFAULT_LOG_LINES,
        };

        let command = format!(
            "docker logs --tail {} {}",
            lines,
            quote_args(std::slice::from_ref(container))?
        );
        ctx.emit(&command).await
    }
}

struct RestartHandler;

#[async_trait]
impl CommandHandler for RestartHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        join_command(args, "restart <container...>")?;
        ctx.emit(&format!("docker restart {}", quote_args(args)?)).await
    }
}

// ============================================================================
// DockerPlugin
// ============================================================================

/// Docker 플러그인
#[derive(Debug)]
pub struct DockerPlugin {
    rules: Vec<GuardRule>,
}

impl Default for DockerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerPlugin {
    pub fn new() -> Self {
        let specs: [(&str, &[&str], &str); 2] = [
            (
                "docker.compose-down-volumes",
                &[r"\bdocker[\s-]compose\s+(?:-\S+\s+)*down\b[^;&|]*\s(?:-v|--volumes)\b"],
                "Compose teardown would delete named volumes",
            ),
            (
                "docker.volume-rm",
                &[r"\bdocker\s+volume\s+(?:rm|remove)\b"],
                "Docker volume removal deletes persistent data",
            ),
        ];

        let rules = specs
            .into_iter()
            .filter_map(|(id, patterns, message)| {
                match GuardRule::block(id, "container", patterns.iter().copied(), message) {
                    Ok(rule) => Some(rule.with_hint("Remove volumes manually after taking a backup")),
                    Err(e) => {
                        error!(rule = id, "Invalid docker guard pattern: {}", e);
                        None
                    }
                }
            })
            .collect();

        Self { rules }
    }
}

#[async_trait]
impl Plugin for DockerPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("docker")
            .with_description("Container listing, logs and restarts")
            .with_dependency(CORE_PLUGIN)
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("ps", PsHandler)
                .with_description("List containers")
                .with_usage("ps [docker ps options...]")
                .with_tool("docker_ps"),
            Command::new("logs", LogsHandler)
                .with_description("Show the last lines of a container's logs")
                .with_usage("logs <container> [lines]")
                .with_tool("docker_logs"),
            Command::new("restart", RestartHandler)
                .with_description("Restart one or more containers")
                .with_usage("restart <container...>")
                .with_tool("docker_restart"),
        ]
    }

    fn guard_rules(&self) -> Vec<GuardRule> {
        self.rules.clone()
    }

    async fn on_load(&self, ctx: &PluginContext) -> Result<()> {
        // 원격 모드에서는 대상 호스트의 docker를 사용
        if ctx.is_local() && which::which("docker").is_err() {
            warn!("docker binary not found in PATH; docker commands will fail locally");
            ctx.sink()
                .eprintln("⚠ docker binary not found in PATH; docker commands will fail locally");
        }
        Ok(())
    }
}
