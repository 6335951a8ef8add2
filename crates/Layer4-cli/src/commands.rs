//! CLI subcommands

use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};
use shellgate_core::{CommandContext, OutputSink, PluginInfo};
use shellgate_foundation::{AuditEntry, AuditQuery, AuditTrail, Error, OutputMode, Result};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Plugin commands
// ============================================================================

/// 플러그인 명령어 실행 (`shellgate exec uptime`, `shellgate ps` ...)
pub async fn run_command(gateway: &Gateway, name: &str, args: &[String]) -> Result<()> {
    let ctx = gateway.context(OutputSink::console());
    gateway.registry.run_command(name, &ctx, args).await
}

// ============================================================================
// plugins list | enable | disable
// ============================================================================

fn format_plugin_row(plugin: &PluginInfo) -> String {
    let status = match (plugin.enabled, plugin.protected) {
        (true, true) => "enabled (core)",
        (true, false) => "enabled",
        (false, _) => "disabled",
    };
    format!(
        "{:<10} {:<8} {:<16} {}",
        plugin.name,
        plugin.version.to_string(),
        status,
        plugin.commands.join(", ")
    )
}

pub async fn list_plugins(gateway: &Gateway, json: bool) -> Result<()> {
    let plugins = gateway.registry.get_all_plugins().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(());
    }

    println!("{:<10} {:<8} {:<16} {}", "NAME", "VERSION", "STATUS", "COMMANDS");
    println!("{}", "-".repeat(60));
    for plugin in &plugins {
        println!("{}", format_plugin_row(plugin));
    }
    Ok(())
}

pub async fn enable_plugin(gateway: &Gateway, name: &str) -> Result<()> {
    gateway.registry.enable(name).await?;
    info!("Plugin enabled: {}", name);
    println!("✓ Enabled plugin: {}", name);
    Ok(())
}

pub async fn disable_plugin(gateway: &Gateway, name: &str) -> Result<()> {
    gateway.registry.disable(name).await?;
    info!("Plugin disabled: {}", name);
    println!("✓ Disabled plugin: {}", name);
    Ok(())
}

// ============================================================================
// tools / call
// ============================================================================

/// 외부 도구 목록 (JSON)
pub async fn list_tools(gateway: &Gateway) -> Result<()> {
    let tools = gateway.registry.tool_commands().await;
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

/// 도구 입력
#[derive(Debug, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub args: Vec<String>,
}

/// 도구 호출 응답
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub tool: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 도구 이름으로 명령어 실행. 출력은 수집되어 응답에 담김
pub async fn call_tool(gateway: &Gateway, tool: &str, input: &str) -> ToolCallResponse {
    let sink = OutputSink::capture();
    let outcome = invoke_tool(gateway, tool, input, &sink).await;

    ToolCallResponse {
        tool: tool.to_string(),
        success: outcome.is_ok(),
        stdout: sink.captured_stdout(),
        stderr: sink.captured_stderr(),
        error: outcome.err().map(|e| e.to_string()),
    }
}

async fn invoke_tool(gateway: &Gateway, tool: &str, input: &str, sink: &OutputSink) -> Result<()> {
    let input: ToolInput = if input.trim().is_empty() {
        ToolInput::default()
    } else {
        serde_json::from_str(input)
            .map_err(|e| Error::InvalidInput(format!("Tool input must be {{\"args\": [..]}}: {}", e)))?
    };

    let resolved = gateway
        .registry
        .resolve_tool(tool)
        .await
        .ok_or_else(|| Error::CommandNotFound(tool.to_string()))?;

    // raw 모드의 진행 메시지가 결과에 섞이지 않도록 quiet 사용
    let mut options = gateway.options();
    if options.output_mode == OutputMode::Raw {
        options.output_mode = OutputMode::Quiet;
    }
    let ctx = CommandContext::new(Arc::new(gateway.proxy(sink.clone())), sink.clone(), options);
    resolved.command.run(&ctx, &input.args).await
}

// ============================================================================
// audit
// ============================================================================

fn format_audit_entry(entry: &AuditEntry) -> String {
    let mut line = format!(
        "{} {:<18} {:<6} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.action.as_str(),
        entry.mode,
        entry.command
    );
    if let Some(code) = entry.exit_code {
        line.push_str(&format!(" [exit {}]", code));
    }
    if let Some(ms) = entry.duration_ms {
        line.push_str(&format!(" ({}ms)", ms));
    }
    if let Some(rule) = &entry.rule {
        line.push_str(&format!(" rule={}", rule));
    }
    if let Some(message) = &entry.message {
        line.push_str(&format!(" - {}", message));
    }
    line
}

pub fn show_audit(gateway: &Gateway, blocked: bool, limit: usize, json: bool) -> Result<()> {
    let trail = if blocked {
        AuditTrail::Blocked
    } else {
        AuditTrail::Commands
    };
    let entries = gateway
        .audit()
        .read(trail, &AuditQuery::new().with_limit(limit))?;

    if entries.is_empty() {
        if !json {
            println!("No audit entries in {}", gateway.audit().path(trail).display());
        }
        return Ok(());
    }

    for entry in &entries {
        if json {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            println!("{}", format_audit_entry(entry));
        }
    }
    Ok(())
}
