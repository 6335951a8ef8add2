//! # Plugin System
//!
//! 명령어를 제공하는 플러그인의 등록/활성화/의존성 관리
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PluginRegistry                       │
//! │  ┌────────────┬────────────┬────────────┬────────────┐  │
//! │  │ proxy      │ system     │ docker     │ files      │  │
//! │  │ (core)     │            │ → proxy    │ → proxy    │  │
//! │  └────────────┴────────────┴────────────┴────────────┘  │
//! │         │ commands / aliases          │ guard rules      │
//! │         ▼                             ▼                  │
//! │   command table                CommandGuard extensions   │
//! │         │                                                │
//! │         └──► PluginStateStore (enabledPlugins)           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! 플러그인은 컴파일 타임 테이블(`plugins::builtin_plugins`)로 등록되며
//! 런타임에 코드를 동적으로 로드하지 않습니다.
//!
//! ## 예시
//!
//! ```ignore
//! let registry = PluginRegistry::new(guard.clone(), PluginContext::default())
//!     .with_state_store(Arc::new(ConfigPluginState::global()?));
//! registry.load_all(builtin_plugins()).await?;
//! registry.enable("docker").await?;
//!
//! if let Some(resolved) = registry.resolve_command("ps").await {
//!     resolved.command.run(&ctx, &args).await?;
//! }
//! ```

mod command;
mod error;
mod graph;
mod manifest;
mod registry;
mod store;
mod traits;

pub use command::{Command, CommandContext, CommandHandler};
pub use error::{PluginError, Result};
pub use graph::DependencyGraph;
pub use manifest::{PluginManifest, PluginVersion};
pub use registry::{
    tool_input_schema, PluginInfo, PluginRegistry, ResolvedCommand, ToolDescriptor, CORE_PLUGIN,
};
pub use store::{ConfigPluginState, MemoryPluginState, PluginStateStore};
pub use traits::{Plugin, PluginContext};
