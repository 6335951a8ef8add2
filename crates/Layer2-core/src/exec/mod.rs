//! # Execution
//!
//! 명령 실행 계층
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     ExecutionProxy                         │
//! │   CommandGuard ──► AuditLogger ──► dispatch               │
//! │                                     ├─ LocalExecutor      │
//! │                                     │   (ShellExecutor)   │
//! │                                     └─ RemoteExecutor     │
//! │                                         (SshExecutor)     │
//! └───────────────────────────────────────────────────────────┘
//! ```

mod local;
mod proxy;
mod remote;
mod response;
mod sink;

pub use local::{LocalExecutor, ShellExecutor};
pub use proxy::{ExecOptions, ExecutionProxy, ExecutionResult};
pub use remote::{with_remote_workdir, RemoteExecutor, SshExecutor};
pub use response::{filter_fields, format_json_response, iso_timestamp, Outcome};
pub use sink::{CaptureBuffer, OutputSink};
