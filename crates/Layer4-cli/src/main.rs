//! Shellgate CLI - Main entry point

mod commands;
mod gateway;

use clap::{CommandFactory, Parser, Subcommand};
use gateway::{Gateway, Overrides};
use shellgate_foundation::{Error, OutputMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shellgate - guarded command execution on the local machine or a remote host
#[derive(Parser, Debug)]
#[command(name = "shellgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Force local execution (ignores the configured remote host)
    #[arg(long, global = true)]
    local: bool,

    /// Print results as JSON
    #[arg(long, global = true, conflicts_with = "quiet")]
    json: bool,

    /// Print only command output; progress goes to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Comma-separated JSON fields to keep (e.g. success,output)
    #[arg(long, global = true, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Do not write audit logs
    #[arg(long, global = true)]
    no_audit: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage plugins
    Plugins {
        #[command(subcommand)]
        action: PluginsAction,
    },
    /// List commands exposed as external tools (JSON)
    Tools,
    /// Invoke a tool by name with JSON input
    Call {
        /// Tool name (see `shellgate tools`)
        tool: String,

        /// Tool input, e.g. '{"args":["uptime"]}'
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Show recent audit log entries
    Audit {
        /// Show the blocked-command log instead of the command log
        #[arg(long)]
        blocked: bool,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Run a plugin command (exec, check, status, ps, upload ...)
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Subcommand, Debug)]
enum PluginsAction {
    /// List loaded plugins
    List,
    /// Enable a plugin (and its dependencies)
    Enable { name: String },
    /// Disable a plugin
    Disable { name: String },
}

impl Args {
    fn overrides(&self) -> Overrides {
        let output_mode = if self.json {
            Some(OutputMode::Json)
        } else if self.quiet {
            Some(OutputMode::Quiet)
        } else {
            None
        };
        Overrides {
            local: self.local,
            output_mode,
            fields: self.fields.clone(),
            no_audit: self.no_audit,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, stdout는 명령 출력 전용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let Some(command) = args.command.as_ref() else {
        Args::command().print_help()?;
        return Ok(());
    };

    let gateway = Gateway::bootstrap(&args.overrides()).await?;
    let json = gateway.config.effective_output_mode() == OutputMode::Json;

    let outcome = match command {
        Command::Plugins { action } => match action {
            PluginsAction::List => commands::list_plugins(&gateway, json).await,
            PluginsAction::Enable { name } => commands::enable_plugin(&gateway, name).await,
            PluginsAction::Disable { name } => commands::disable_plugin(&gateway, name).await,
        },
        Command::Tools => commands::list_tools(&gateway).await,
        Command::Call { tool, input } => {
            let response = commands::call_tool(&gateway, tool, input).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Audit { blocked, limit } => commands::show_audit(&gateway, *blocked, *limit, json),
        Command::External(argv) => match argv.split_first() {
            Some((name, rest)) => commands::run_command(&gateway, name, rest).await,
            None => Err(Error::InvalidInput("No command given".to_string())),
        },
    };

    if let Err(e) = outcome {
        std::process::exit(report(&e, json));
    }
    Ok(())
}

/// 에러 출력 후 종료 코드 반환
fn report(error: &Error, json: bool) -> i32 {
    match error {
        Error::Blocked {
            command,
            reason,
            rule,
            reasons,
        } => {
            if json {
                let value = serde_json::json!({
                    "success": false,
                    "blocked": true,
                    "command": command,
                    "error": reason,
                    "rule": rule,
                    "reasons": reasons,
                });
                println!("{}", value);
            } else {
                eprint!("{}", format_blocked(command, reason, rule.as_deref(), reasons));
            }
            2
        }
        other => {
            eprintln!("✗ {}", other);
            other.exit_code().filter(|code| *code != 0).unwrap_or(1)
        }
    }
}

/// 차단 보고 (텍스트 모드)
fn format_blocked(command: &str, reason: &str, rule: Option<&str>, reasons: &[String]) -> String {
    let mut report = format!("✗ Blocked: {}\n  reason: {}\n", command, reason);
    if let Some(rule) = rule {
        report.push_str(&format!("  rule:   {}\n", rule));
    }
    for extra in reasons.iter().skip(1) {
        report.push_str(&format!("  also:   {}\n", extra));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_report_names_command_and_rule() {
        let report = format_blocked(
            "rm -rf /",
            "Recursive deletion of the root filesystem or a system directory",
            Some("filesystem.root-delete"),
            &["Recursive deletion of the root filesystem or a system directory".to_string()],
        );

        assert_eq!(
            report,
            "✗ Blocked: rm -rf /\n  \
             reason: Recursive deletion of the root filesystem or a system directory\n  \
             rule:   filesystem.root-delete\n"
        );
    }

    #[test]
    fn test_blocked_report_lists_extra_reasons() {
        let report = format_blocked(
            "docker volume rm data",
            "Docker volume deletion",
            Some("docker.volume-rm"),
            &["Docker volume deletion".to_string(), "plugin rule".to_string()],
        );
        assert!(report.ends_with("  also:   plugin rule\n"));
        assert!(!report.contains("also:   Docker volume deletion"));
    }

    #[test]
    fn test_blocked_exit_code() {
        let err = Error::Blocked {
            command: "mkfs /dev/sda".into(),
            reason: "Filesystem creation".into(),
            rule: None,
            reasons: vec![],
        };
        assert_eq!(report(&err, true), 2);
        assert_eq!(report(&Error::execution("exit 3", Some(3)), false), 3);
        assert_eq!(report(&Error::CommandNotFound("deploy".into()), false), 1);
    }
}
