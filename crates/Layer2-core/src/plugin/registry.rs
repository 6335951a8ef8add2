//! Plugin Registry - 플러그인 생명주기와 명령어 테이블
//!
//! ## 상태 전이
//!
//! ```text
//! unloaded ──load──► loaded ──enable──► enabled ⇄ disabled ──unload──► unloaded
//! ```
//!
//! 모든 변경 연산은 검증을 먼저 끝낸 뒤 상태를 바꿉니다. 검증에 실패하면 아무것도 바뀌지 않습니다.
//! 상태는 하나의 `RwLock` 뒤에 있으며 변경 연산은 쓰기 락을 잡은 채 끝까지 진행됩니다.

use super::command::{Command, CommandContext};
use super::error::{PluginError, Result};
use super::graph::DependencyGraph;
use super::manifest::{PluginManifest, PluginVersion};
use super::store::{MemoryPluginState, PluginStateStore};
use super::traits::{Plugin, PluginContext};
use crate::guard::{CommandGuard, GuardRule};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 항상 활성화되어 있는 핵심 플러그인
pub const CORE_PLUGIN: &str = "proxy";

// ============================================================================
// Public views
// ============================================================================

/// 명령어 조회 결과
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    /// 소유 플러그인
    pub plugin: String,
    pub command: Command,
}

/// 플러그인 요약 (목록 출력용)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub version: PluginVersion,
    pub description: String,
    pub dependencies: Vec<String>,
    pub enabled: bool,
    pub protected: bool,
    pub commands: Vec<String>,
}

/// 외부 도구로 노출되는 명령어
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub command: String,
    pub plugin: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// 도구 입력 스키마 (`{args: string[]}`)
pub fn tool_input_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "args": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["args"]
    })
}

// ============================================================================
// Internal state
// ============================================================================

struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    manifest: PluginManifest,
    load_order: usize,
}

#[derive(Default)]
struct RegistryState {
    plugins: HashMap<String, PluginEntry>,
    load_counter: usize,
    /// 활성 집합 (로드되지 않은 이름도 보존됨)
    enabled: HashSet<String>,
    /// 이름/별칭 → 명령어
    commands: HashMap<String, Arc<ResolvedCommand>>,
}

impl RegistryState {
    fn is_active(&self, name: &str) -> bool {
        self.plugins.contains_key(name) && self.enabled.contains(name)
    }

    fn graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for entry in self.ordered_entries() {
            graph.add_node(entry.manifest.name.clone(), &entry.manifest.dependencies);
        }
        graph
    }

    fn ordered_entries(&self) -> Vec<&PluginEntry> {
        let mut entries: Vec<&PluginEntry> = self.plugins.values().collect();
        entries.sort_by_key(|e| e.load_order);
        entries
    }

    /// 명령어 등록. 이미 있는 키는 건너뛰고 경고 (먼저 등록한 쪽이 유지)
    fn register_commands(&mut self, plugin: &str, commands: Vec<Command>) -> Vec<String> {
        let mut inserted = Vec::new();
        for command in commands {
            let resolved = Arc::new(ResolvedCommand {
                plugin: plugin.to_string(),
                command,
            });
            let keys: Vec<String> = resolved.command.keys().map(String::from).collect();
            for key in keys {
                if let Some(existing) = self.commands.get(&key) {
                    warn!(
                        "Command '{}' from plugin '{}' conflicts with '{}' from plugin '{}'; keeping the first",
                        key, plugin, existing.command.name, existing.plugin
                    );
                    continue;
                }
                self.commands.insert(key.clone(), Arc::clone(&resolved));
                inserted.push(key);
            }
        }
        inserted
    }

    fn remove_keys(&mut self, keys: &[String]) {
        for key in keys {
            self.commands.remove(key);
        }
    }

    fn remove_plugin_commands(&mut self, plugin: &str) {
        self.commands.retain(|_, resolved| resolved.plugin != plugin);
    }

    /// 비활성화로 비게 된 키를 남은 활성 플러그인으로 다시 채움
    fn backfill_commands(&mut self) {
        let active: Vec<(String, Vec<Command>)> = self
            .ordered_entries()
            .into_iter()
            .filter(|e| self.enabled.contains(&e.manifest.name))
            .map(|e| (e.manifest.name.clone(), e.plugin.commands()))
            .collect();

        for (plugin, commands) in active {
            for command in commands {
                let resolved = Arc::new(ResolvedCommand {
                    plugin: plugin.clone(),
                    command,
                });
                let keys: Vec<String> = resolved.command.keys().map(String::from).collect();
                for key in keys {
                    if !self.commands.contains_key(&key) {
                        debug!(key = %key, plugin = %plugin, "Command key reassigned");
                        self.commands.insert(key, Arc::clone(&resolved));
                    }
                }
            }
        }
    }

    fn enabled_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.enabled.iter().cloned().collect();
        names.sort();
        names
    }

    fn guard_extensions(&self) -> Vec<GuardRule> {
        self.ordered_entries()
            .into_iter()
            .filter(|e| self.enabled.contains(&e.manifest.name))
            .flat_map(|e| e.plugin.guard_rules())
            .collect()
    }
}

// ============================================================================
// PluginRegistry
// ============================================================================

/// 플러그인 레지스트리
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
    guard: Arc<CommandGuard>,
    context: PluginContext,
    store: Arc<dyn PluginStateStore>,
}

impl PluginRegistry {
    /// 새 레지스트리 생성 (핵심 플러그인만 활성 집합에 포함)
    pub fn new(guard: Arc<CommandGuard>, context: PluginContext) -> Self {
        let mut state = RegistryState::default();
        state.enabled.insert(CORE_PLUGIN.to_string());

        Self {
            state: RwLock::new(state),
            guard,
            context,
            store: Arc::new(MemoryPluginState::default()),
        }
    }

    /// 활성 집합 저장소 지정. 저장된 목록으로 활성 집합을 초기화합니다
    pub fn with_state_store(mut self, store: Arc<dyn PluginStateStore>) -> Self {
        match store.load_enabled() {
            Ok(saved) => {
                let state = self.state.get_mut();
                state.enabled.extend(saved);
            }
            Err(e) => warn!("Failed to read enabled plugins, using defaults: {}", e),
        }
        self.store = store;
        self
    }

    pub fn guard(&self) -> &Arc<CommandGuard> {
        &self.guard
    }

    // ========================================================================
    // load / unload
    // ========================================================================

    /// 플러그인 로드
    ///
    /// 활성 집합에 이미 있는 플러그인은 로드 직후 활성화됩니다.
    pub async fn load(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let manifest = plugin.manifest();
        let name = manifest.name.clone();
        let mut state = self.state.write().await;

        if state.plugins.contains_key(&name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let mut graph = state.graph();
        graph.add_node(name.clone(), &manifest.dependencies);
        graph
            .topological_order()
            .map_err(PluginError::CircularDependency)?;

        if let Some(dep) = manifest
            .dependencies
            .iter()
            .find(|dep| !state.plugins.contains_key(dep.as_str()))
        {
            return Err(PluginError::MissingDependency {
                plugin: name,
                dependency: dep.clone(),
            });
        }

        state.load_counter += 1;
        let load_order = state.load_counter;
        info!("Loaded plugin: {} (v{})", name, manifest.version);
        state.plugins.insert(
            name.clone(),
            PluginEntry {
                plugin,
                manifest,
                load_order,
            },
        );

        if state.enabled.contains(&name) {
            self.activate_saved(&mut state, &name).await;
        }
        Ok(())
    }

    /// 여러 플러그인을 의존성 순서로 로드 (컴파일 타임 등록 테이블용)
    ///
    /// 전체를 먼저 검증하고, 하나라도 문제가 있으면 아무것도 로드하지 않습니다.
    pub async fn load_all(&self, plugins: Vec<Arc<dyn Plugin>>) -> Result<()> {
        let mut batch: HashMap<String, Arc<dyn Plugin>> = HashMap::new();
        let graph = {
            let state = self.state.read().await;
            let mut graph = state.graph();
            for plugin in plugins {
                let manifest = plugin.manifest();
                if state.plugins.contains_key(&manifest.name)
                    || batch.contains_key(&manifest.name)
                {
                    return Err(PluginError::AlreadyLoaded(manifest.name));
                }
                graph.add_node(manifest.name.clone(), &manifest.dependencies);
                batch.insert(manifest.name, plugin);
            }
            graph
        };

        if let Some((plugin, dependency)) = graph.missing_dependencies().first() {
            return Err(PluginError::MissingDependency {
                plugin: plugin.to_string(),
                dependency: dependency.to_string(),
            });
        }

        let order = graph
            .topological_order()
            .map_err(PluginError::CircularDependency)?;

        for name in order {
            if let Some(plugin) = batch.remove(&name) {
                self.load(plugin).await?;
            }
        }
        Ok(())
    }

    /// 플러그인 언로드 (활성 상태면 먼저 비활성화)
    pub async fn unload(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.plugins.contains_key(name) {
            return Err(PluginError::NotLoaded(name.to_string()));
        }
        if name == CORE_PLUGIN {
            return Err(PluginError::Protected(name.to_string()));
        }

        let dependents: Vec<String> = state
            .graph()
            .dependents(name)
            .into_iter()
            .map(String::from)
            .collect();
        if !dependents.is_empty() {
            return Err(PluginError::DependentsLoaded {
                plugin: name.to_string(),
                dependents,
            });
        }

        if state.is_active(name) {
            self.deactivate(&mut state, name).await;
            self.refresh_guard(&state);
            self.persist(&state);
        }

        state.plugins.remove(name);
        info!("Unloaded plugin: {}", name);
        Ok(())
    }

    // ========================================================================
    // enable / disable
    // ========================================================================

    /// 플러그인 활성화 (의존 플러그인을 먼저 활성화)
    pub async fn enable(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.plugins.contains_key(name) {
            return Err(PluginError::NotLoaded(name.to_string()));
        }
        if state.is_active(name) {
            return Ok(());
        }

        let graph = state.graph();
        let order = graph
            .closure_order(name)
            .map_err(PluginError::CircularDependency)?;

        // 의존 대상은 로드되어 있어야 함 (자동 로드 없음)
        for node in &order {
            if let Some(dep) = graph
                .dependencies(node)
                .iter()
                .find(|dep| !state.plugins.contains_key(dep.as_str()))
            {
                return Err(PluginError::MissingDependency {
                    plugin: node.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let pending: Vec<String> = order
            .into_iter()
            .filter(|n| !state.is_active(n))
            .collect();

        let mut outcome = Ok(());
        let mut changed = false;
        for plugin in &pending {
            match self.activate(&mut state, plugin).await {
                Ok(()) => changed = true,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if changed {
            self.refresh_guard(&state);
            self.persist(&state);
        }
        outcome
    }

    /// 플러그인 비활성화
    pub async fn disable(&self, name: &str) -> Result<()> {
        if name == CORE_PLUGIN {
            return Err(PluginError::Protected(name.to_string()));
        }

        let mut state = self.state.write().await;

        if !state.plugins.contains_key(name) {
            return Err(PluginError::NotLoaded(name.to_string()));
        }
        if !state.is_active(name) {
            return Ok(());
        }

        let dependents: Vec<String> = state
            .graph()
            .dependents(name)
            .into_iter()
            .filter(|d| state.is_active(d))
            .map(String::from)
            .collect();
        if !dependents.is_empty() {
            return Err(PluginError::DependentsEnabled {
                plugin: name.to_string(),
                dependents,
            });
        }

        self.deactivate(&mut state, name).await;
        self.refresh_guard(&state);
        self.persist(&state);
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// 이름 또는 별칭으로 명령어 조회
    pub async fn resolve_command(&self, name: &str) -> Option<ResolvedCommand> {
        let state = self.state.read().await;
        state.commands.get(name).map(|r| r.as_ref().clone())
    }

    /// 명령어 실행
    pub async fn run_command(
        &self,
        name: &str,
        ctx: &CommandContext,
        args: &[String],
    ) -> shellgate_foundation::Result<()> {
        let resolved = self
            .resolve_command(name)
            .await
            .ok_or_else(|| shellgate_foundation::Error::CommandNotFound(name.to_string()))?;
        debug!(command = %resolved.command.name, plugin = %resolved.plugin, "Running command");
        resolved.command.run(ctx, args).await
    }

    /// 외부 도구 이름으로 명령어 조회
    pub async fn resolve_tool(&self, tool: &str) -> Option<ResolvedCommand> {
        let state = self.state.read().await;
        state
            .commands
            .values()
            .find(|r| r.command.tool_name.as_deref() == Some(tool))
            .map(|r| r.as_ref().clone())
    }

    /// 활성 명령어 목록 (플러그인 로드 순, 중복 제거)
    pub async fn commands(&self) -> Vec<ResolvedCommand> {
        let state = self.state.read().await;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut resolved: Vec<(usize, ResolvedCommand)> = state
            .commands
            .values()
            .filter(|r| seen.insert((r.plugin.clone(), r.command.name.clone())))
            .map(|r| {
                let order = state
                    .plugins
                    .get(&r.plugin)
                    .map(|e| e.load_order)
                    .unwrap_or(usize::MAX);
                (order, r.as_ref().clone())
            })
            .collect();
        resolved.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.command.name.cmp(&b.1.command.name))
        });
        resolved.into_iter().map(|(_, r)| r).collect()
    }

    /// 외부 도구로 노출되는 명령어
    pub async fn tool_commands(&self) -> Vec<ToolDescriptor> {
        self.commands()
            .await
            .into_iter()
            .filter_map(|r| {
                let tool = r.command.tool_name.clone()?;
                Some(ToolDescriptor {
                    name: tool,
                    command: r.command.name.clone(),
                    plugin: r.plugin,
                    description: r.command.description.clone(),
                    input_schema: tool_input_schema(),
                })
            })
            .collect()
    }

    /// 활성 플러그인이 제공하는 guard 규칙 (로드 순)
    pub async fn aggregated_guard_extensions(&self) -> Vec<GuardRule> {
        self.state.read().await.guard_extensions()
    }

    /// 로드된 플러그인 전체 (로드 순)
    pub async fn get_all_plugins(&self) -> Vec<PluginInfo> {
        let state = self.state.read().await;
        state
            .ordered_entries()
            .into_iter()
            .map(|e| {
                let name = e.manifest.name.clone();
                PluginInfo {
                    enabled: state.is_active(&name),
                    protected: name == CORE_PLUGIN,
                    version: e.manifest.version.clone(),
                    description: e.manifest.description.clone(),
                    dependencies: e.manifest.dependencies.clone(),
                    commands: e.plugin.commands().into_iter().map(|c| c.name).collect(),
                    name,
                }
            })
            .collect()
    }

    /// 활성 플러그인 이름 (로드 순)
    pub async fn enabled_plugins(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .ordered_entries()
            .into_iter()
            .filter(|e| state.enabled.contains(&e.manifest.name))
            .map(|e| e.manifest.name.clone())
            .collect()
    }

    pub async fn is_enabled(&self, name: &str) -> bool {
        self.state.read().await.is_active(name)
    }

    pub async fn is_loaded(&self, name: &str) -> bool {
        self.state.read().await.plugins.contains_key(name)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// 명령어 등록 → on_load. 훅이 실패하면 등록을 되돌림
    async fn activate(&self, state: &mut RegistryState, name: &str) -> Result<()> {
        let Some(plugin) = state.plugins.get(name).map(|e| Arc::clone(&e.plugin)) else {
            return Err(PluginError::NotLoaded(name.to_string()));
        };

        let inserted = state.register_commands(name, plugin.commands());

        if let Err(e) = plugin.on_load(&self.context).await {
            state.remove_keys(&inserted);
            if name != CORE_PLUGIN {
                state.enabled.remove(name);
            }
            warn!("Plugin {} failed to load: {}", name, e);
            return Err(PluginError::Hook {
                plugin: name.to_string(),
                hook: "on_load",
                message: e.to_string(),
            });
        }

        state.enabled.insert(name.to_string());
        info!("Enabled plugin: {}", name);
        Ok(())
    }

    /// 로드 시점에 저장된 활성 상태 복원 (의존 플러그인 포함)
    async fn activate_saved(&self, state: &mut RegistryState, name: &str) {
        let order = match state.graph().closure_order(name) {
            Ok(order) => order,
            Err(cycle) => {
                warn!("Cannot restore plugin {}: {}", name, cycle.join(" -> "));
                return;
            }
        };

        let mut changed = false;
        for plugin in order {
            if plugin != name && state.is_active(&plugin) {
                continue;
            }
            let newly_enabled = !state.enabled.contains(&plugin);
            if let Err(e) = self.activate(state, &plugin).await {
                // 로드는 유지, 비활성 상태로 남음
                warn!("{}", e);
                if name != CORE_PLUGIN {
                    state.enabled.remove(name);
                }
                changed = true;
                break;
            }
            changed |= newly_enabled;
        }

        self.refresh_guard(state);
        if changed {
            self.persist(state);
        }
    }

    /// on_unload → 명령어 제거 → 활성 집합에서 제거
    async fn deactivate(&self, state: &mut RegistryState, name: &str) {
        if let Some(plugin) = state.plugins.get(name).map(|e| Arc::clone(&e.plugin)) {
            if let Err(e) = plugin.on_unload(&self.context).await {
                // 비활성화는 계속 진행
                warn!("Plugin {} on_unload failed: {}", name, e);
            }
        }

        state.remove_plugin_commands(name);
        state.enabled.remove(name);
        state.backfill_commands();
        info!("Disabled plugin: {}", name);
    }

    fn refresh_guard(&self, state: &RegistryState) {
        let rules = state.guard_extensions();
        debug!(count = rules.len(), "Guard extensions refreshed");
        self.guard.replace_extensions(rules);
    }

    /// 메모리 상태는 이미 반영됨. 저장 실패는 경고만 남김
    fn persist(&self, state: &RegistryState) {
        if let Err(e) = self.store.save_enabled(&state.enabled_names()) {
            warn!("Failed to persist enabled plugins: {}", e);
        }
    }
}
