//! Builtin Plugins - 내장 플러그인
//!
//! ## 플러그인 목록
//!
//! - `proxy` - exec / check (핵심, 비활성화 불가)
//! - `system` - status
//! - `docker` - ps / logs / restart, 볼륨 삭제 차단 규칙
//! - `files` - upload / download

pub mod docker;
pub mod files;
pub mod proxy;
pub mod system;

pub use docker::DockerPlugin;
pub use files::FilesPlugin;
pub use proxy::ProxyPlugin;
pub use system::SystemPlugin;

use crate::plugin::Plugin;
use std::sync::Arc;

/// 컴파일 타임 등록 테이블
///
/// `PluginRegistry::load_all`에 넘기면 의존성 순서로 로드됩니다.
pub fn builtin_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(ProxyPlugin::new()) as Arc<dyn Plugin>,
        Arc::new(SystemPlugin::new()),
        Arc::new(DockerPlugin::new()),
        Arc::new(FilesPlugin::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_are_unique() {
        let names: HashSet<String> = builtin_plugins()
            .iter()
            .map(|p| p.manifest().name)
            .collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains("proxy"));
    }

    #[test]
    fn test_builtin_command_keys_do_not_collide() {
        let mut keys = HashSet::new();
        for plugin in builtin_plugins() {
            for command in plugin.commands() {
                for key in command.keys() {
                    assert!(keys.insert(key.to_string()), "duplicate command key {}", key);
                }
            }
        }
    }
}
