//! system - 대상 호스트 상태 요약
//!
//! `status` (st): uptime, 디스크, 메모리 정보를 동시에 수집합니다.
//! 일부 항목이 실패해도 나머지는 출력됩니다.

use crate::plugin::{Command, CommandContext, CommandHandler, Plugin, PluginManifest};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use shellgate_foundation::{Error, OutputMode, Result};
use tracing::debug;

/// (라벨, 명령)
const STATUS_FACTS: &[(&str, &str)] = &[
    ("uptime", "uptime"),
    ("disk", "df -h /"),
    ("memory", "free -m"),
];

struct StatusHandler;

#[async_trait]
impl CommandHandler for StatusHandler {
    async fn handle(&self, ctx: &CommandContext, _args: &[String]) -> Result<()> {
        ctx.sink.progress(
            ctx.output_mode(),
            &format!("→ [{}] collecting system status", ctx.proxy.mode()),
        );

        let results = join_all(STATUS_FACTS.iter().map(|(label, command)| async move {
            (*label, ctx.execute(command).await)
        }))
        .await;

        let failures = results.iter().filter(|(_, r)| r.is_err()).count();
        if failures == results.len() {
            // 전부 실패하면 첫 에러를 반환
            if let Some((_, Err(e))) = results.into_iter().next() {
                return Err(e);
            }
            return Err(Error::Internal("No status facts collected".to_string()));
        }
        debug!(failures, "System status collected");

        match ctx.output_mode() {
            OutputMode::Json => {
                let mut facts = Map::new();
                for (label, result) in results {
                    let value = match result {
                        Ok(r) => json!({ "success": true, "output": r.output.trim_end() }),
                        Err(e) => json!({ "success": false, "error": e.to_string() }),
                    };
                    facts.insert(label.to_string(), value);
                }
                ctx.sink
                    .println(&serde_json::to_string_pretty(&Value::Object(facts))?);
            }
            _ => {
                for (label, result) in results {
                    ctx.sink.println(&format!("== {} ==", label));
                    match result {
                        Ok(r) => ctx.sink.println(r.output.trim_end()),
                        Err(e) => ctx.sink.println(&format!("unavailable: {}", e)),
                    }
                }
            }
        }
        Ok(())
    }
}

/// 시스템 상태 플러그인
#[derive(Debug, Default)]
pub struct SystemPlugin;

impl SystemPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for SystemPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("system").with_description("Uptime, disk and memory summary")
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("status", StatusHandler)
            .with_alias("st")
            .with_description("Show uptime, disk and memory of the target host")
            .with_usage("status")
            .with_tool("system_status")]
    }
}
