//! Error types for the plugin registry
//!
//! 모든 생명주기 에러는 상태 변경 전에 검증되어 반환됩니다.
//! shellgate_foundation::Error와의 변환을 지원합니다.

use shellgate_foundation::Error as FoundationError;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Plugin lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    /// Same name loaded twice
    #[error("Plugin '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// Dependency graph has no topological order
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// Declared dependency is not loaded
    #[error("Plugin '{plugin}' depends on '{dependency}', which is not loaded")]
    MissingDependency { plugin: String, dependency: String },

    #[error("Plugin '{0}' is not loaded")]
    NotLoaded(String),

    /// Core plugin cannot be disabled or unloaded
    #[error("Plugin '{0}' is a core plugin and cannot be disabled")]
    Protected(String),

    #[error("Cannot disable '{plugin}': enabled plugins depend on it ({})", .dependents.join(", "))]
    DependentsEnabled {
        plugin: String,
        dependents: Vec<String>,
    },

    #[error("Cannot unload '{plugin}': loaded plugins depend on it ({})", .dependents.join(", "))]
    DependentsLoaded {
        plugin: String,
        dependents: Vec<String>,
    },

    /// on_load / on_unload hook failed
    #[error("Plugin '{plugin}' {hook} hook failed: {message}")]
    Hook {
        plugin: String,
        hook: &'static str,
        message: String,
    },
}

// ============================================================================
// shellgate_foundation::Error 변환
// ============================================================================

impl From<PluginError> for FoundationError {
    fn from(err: PluginError) -> Self {
        FoundationError::Plugin(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = PluginError::CircularDependency(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
    }

    #[test]
    fn test_conversion_to_foundation_error() {
        let err: FoundationError = PluginError::Protected("proxy".into()).into();
        assert!(matches!(err, FoundationError::Plugin(ref msg) if msg.contains("proxy")));
    }
}
