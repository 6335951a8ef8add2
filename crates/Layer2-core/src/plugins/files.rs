//! files - 파일 전송
//!
//! 원격 모드에서는 원격 실행기의 scp 전송을, 로컬 모드에서는 파일 복사를 사용합니다.

use crate::plugin::{Command, CommandContext, CommandHandler, Plugin, PluginManifest, CORE_PLUGIN};
use async_trait::async_trait;
use serde_json::json;
use shellgate_foundation::{Error, OutputMode, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upload,
    Download,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Upload => "upload",
            Direction::Download => "download",
        }
    }
}

/// 로컬 모드 전송 (단순 복사)
async fn copy_local(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(from, to).await?;
    Ok(())
}

async fn transfer(ctx: &CommandContext, direction: Direction, args: &[String]) -> Result<()> {
    let usage = match direction {
        Direction::Upload => "upload <local> <remote>",
        Direction::Download => "download <remote> <local>",
    };
    let [source, destination] = args else {
        return Err(Error::InvalidInput(format!("Usage: {}", usage)));
    };

    ctx.sink.progress(
        ctx.output_mode(),
        &format!(
            "→ [{}] {} {} → {}",
            ctx.proxy.mode(),
            direction.verb(),
            source,
            destination
        ),
    );

    let started = Instant::now();
    if ctx.proxy.is_local() {
        copy_local(Path::new(source), Path::new(destination)).await?;
    } else {
        let remote = ctx
            .proxy
            .remote()
            .ok_or_else(|| Error::Remote("Remote mode requires a configured host".to_string()))?;
        match direction {
            Direction::Upload => remote.upload_file(Path::new(source), destination).await?,
            Direction::Download => remote.download_file(source, Path::new(destination)).await?,
        }
    }
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(direction = direction.verb(), source = %source, destination = %destination, duration_ms, "File transferred");

    match ctx.output_mode() {
        OutputMode::Json => {
            let value = json!({
                "success": true,
                "direction": direction.verb(),
                "source": source,
                "destination": destination,
                "isLocal": ctx.proxy.is_local(),
                "durationMs": duration_ms,
            });
            ctx.sink.println(&serde_json::to_string_pretty(&value)?);
        }
        _ => ctx
            .sink
            .println(&format!("✓ {} → {} ({}ms)", source, destination, duration_ms)),
    }
    Ok(())
}

struct UploadHandler;

#[async_trait]
impl CommandHandler for UploadHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        transfer(ctx, Direction::Upload, args).await
    }
}

struct DownloadHandler;

#[async_trait]
impl CommandHandler for DownloadHandler {
    async fn handle(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        transfer(ctx, Direction::Download, args).await
    }
}

/// 파일 전송 플러그인
#[derive(Debug, Default)]
pub struct FilesPlugin;

impl FilesPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for FilesPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("files")
            .with_description("File upload and download")
            .with_dependency(CORE_PLUGIN)
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("upload", UploadHandler)
                .with_description("Copy a local file to the target host")
                .with_usage("upload <local> <remote>")
                .with_tool("upload_file"),
            Command::new("download", DownloadHandler)
                .with_description("Copy a file from the target host")
                .with_usage("download <remote> <local>")
                .with_tool("download_file"),
        ]
    }
}
