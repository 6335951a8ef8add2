//! Guard rules - 차단/경고 규칙 정의와 내장 규칙 테이블
//!
//! 내장 차단 규칙은 우선순위 순서대로 나열된 데이터 테이블입니다.
//! 순서를 바꾸면 어떤 규칙이 대표 차단 사유가 되는지가 달라집니다.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::error;

// ============================================================================
// Severity
// ============================================================================

/// 규칙 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 실행 차단
    Block,
    /// 경고만 표시하고 실행 허용
    Warn,
}

// ============================================================================
// GuardRule
// ============================================================================

/// 명령어 분류 규칙 (등록 후 불변)
#[derive(Debug, Clone)]
pub struct GuardRule {
    id: String,
    category: String,
    patterns: Vec<Regex>,
    message: String,
    hint: Option<String>,
    severity: Severity,
}

impl GuardRule {
    /// 새 규칙 생성. 패턴이 하나라도 잘못되면 에러
    pub fn new<I, S>(
        id: impl Into<String>,
        category: impl Into<String>,
        patterns: I,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: id.into(),
            category: category.into(),
            patterns,
            message: message.into(),
            hint: None,
            severity,
        })
    }

    /// 차단 규칙
    pub fn block<I, S>(
        id: impl Into<String>,
        category: impl Into<String>,
        patterns: I,
        message: impl Into<String>,
    ) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(id, category, patterns, message, Severity::Block)
    }

    /// 경고 규칙
    pub fn warn<I, S>(
        id: impl Into<String>,
        category: impl Into<String>,
        patterns: I,
        message: impl Into<String>,
    ) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(id, category, patterns, message, Severity::Warn)
    }

    /// 해결 방법 안내
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Block
    }

    /// 패턴 중 하나라도 일치하면 true
    pub fn matches(&self, command: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(command))
    }
}

// ============================================================================
// Built-in rule tables
// ============================================================================

struct RuleSpec {
    id: &'static str,
    category: &'static str,
    patterns: &'static [&'static str],
    message: &'static str,
    hint: Option<&'static str>,
}

// 시스템 디렉토리 목록 (rm 대상)
const ROOT_TARGET: &str = r"(?:/|/\*|~/?|\$HOME/?|\$\{HOME\}/?|/(?:bin|boot|dev|etc|home|lib|lib64|opt|proc|root|sbin|srv|sys|usr|var)/?\*?)";

// 블록 디바이스 이름
const BLOCK_DEVICE: &str = r"/dev/(?:sd[a-z]|hd[a-z]|vd[a-z]|xvd[a-z]|nvme\d|mmcblk\d|disk\d)";

/// 내장 차단 규칙 (우선순위 순)
///
/// filesystem → disk → container → service → network → system-file → power → fork-bomb
const BLOCKING_TABLE: &[RuleSpec] = &[
    // 파일시스템 파괴
    RuleSpec {
        id: "filesystem.root-delete",
        category: "filesystem",
        patterns: &[
            // ROOT_TARGET 치환 (아래 compile 참고)
            r"\brm\s+(?:-{1,2}[\w-]+\s+)*-(?:[a-zA-Z]*[rR][a-zA-Z]*|-recursive)\s+(?:-{1,2}[\w-]+\s+)*{ROOT}(?:$|[\s;&|)])",
        ],
        message: "Recursive deletion of the root filesystem or a system directory",
        hint: Some("Target a specific subdirectory instead of a top-level path"),
    },
    RuleSpec {
        id: "filesystem.find-delete",
        category: "filesystem",
        patterns: &[r"\bfind\s+/\s[^;&|]*-delete\b", r"\bfind\s+/\s[^;&|]*-exec\s+rm\b"],
        message: "Mass deletion starting from the filesystem root",
        hint: Some("Restrict find to a specific directory"),
    },
    RuleSpec {
        id: "filesystem.format",
        category: "filesystem",
        patterns: &[r"\bmkfs(?:\.\w+)?\s", r"\bmke2fs\s"],
        message: "Filesystem format",
        hint: None,
    },
    RuleSpec {
        id: "filesystem.root-permissions",
        category: "filesystem",
        patterns: &[
            r"\bchmod\s+(?:-\w+\s+)*-[a-zA-Z]*R[a-zA-Z]*\s+(?:-\w+\s+)*[0-7]{3,4}\s+/(?:$|[\s;&|])",
            r"\bchown\s+(?:-\w+\s+)*-[a-zA-Z]*R[a-zA-Z]*\s+(?:-\w+\s+)*\S+\s+/(?:$|[\s;&|])",
        ],
        message: "Recursive permission change on the root filesystem",
        hint: None,
    },
    // 디스크 디바이스 쓰기
    RuleSpec {
        id: "disk.dd-device",
        category: "disk",
        patterns: &[r"\bdd\s[^;&|]*\bof={DEV}"],
        message: "Raw write to a disk device",
        hint: Some("Write to an image file instead of a block device"),
    },
    RuleSpec {
        id: "disk.redirect-device",
        category: "disk",
        patterns: &[r">\s*{DEV}"],
        message: "Output redirected onto a disk device",
        hint: None,
    },
    RuleSpec {
        id: "disk.wipe",
        category: "disk",
        patterns: &[r"\b(?:wipefs|shred|blkdiscard)\s[^;&|]*/dev/"],
        message: "Disk wipe",
        hint: None,
    },
    // 컨테이너/오케스트레이션 대량 삭제
    RuleSpec {
        id: "container.system-prune",
        category: "container",
        patterns: &[
            r"\bdocker\s+system\s+prune\b[^;&|]*\s(?:-[a-zA-Z]*a[a-zA-Z]*|--all|--volumes)\b",
        ],
        message: "Docker system prune removes all unused images, containers and volumes",
        hint: Some("Prune specific resources (docker image prune, docker container prune)"),
    },
    RuleSpec {
        id: "container.volume-prune",
        category: "container",
        patterns: &[r"\bdocker\s+volume\s+prune\b"],
        message: "Docker volume prune deletes persistent data",
        hint: None,
    },
    RuleSpec {
        id: "container.mass-remove",
        category: "container",
        patterns: &[
            r"\bdocker\s+(?:rm|rmi|container\s+rm|image\s+rm|kill|stop)\b[^;&|]*\$\(\s*docker\s+(?:ps|images|container\s+ls|image\s+ls)\b[^)]*\s-[a-zA-Z]*q",
        ],
        message: "Removal of every container or image on the host",
        hint: Some("Name the containers to remove explicitly"),
    },
    RuleSpec {
        id: "orchestration.delete-all",
        category: "container",
        patterns: &[
            r"\bkubectl\s+delete\b[^;&|]*\s(?:--all|-A|--all-namespaces)\b",
            r"\bkubectl\s+delete\s+(?:ns|namespace|namespaces)\b",
        ],
        message: "Mass deletion of Kubernetes resources",
        hint: None,
    },
    // 핵심 서비스 중단
    RuleSpec {
        id: "service.stop-critical",
        category: "service",
        patterns: &[
            r"\bsystemctl\s+(?:stop|disable|mask|kill)\s+(?:--\S+\s+)*(?:[\w@.-]+\s+)*(?:docker|containerd|sshd?|networking|NetworkManager|systemd-networkd|systemd-resolved|firewalld|kubelet)(?:\.service|\.socket)?(?:$|[\s;&|])",
            r"\bservice\s+(?:docker|containerd|sshd?|networking|network-manager)\s+stop\b",
        ],
        message: "Stopping a critical system service",
        hint: Some("Use 'restart' instead of 'stop' if the service must keep running"),
    },
    RuleSpec {
        id: "service.kill-critical",
        category: "service",
        patterns: &[
            r"\b(?:killall|pkill)\s+(?:-\w+\s+)*(?:sshd|dockerd|containerd|systemd|init)\b",
            r"\bkill\s+(?:-9|-KILL|-SIGKILL)\s+(?:-1|1)(?:$|[\s;&|])",
        ],
        message: "Killing a critical system process",
        hint: None,
    },
    // 네트워크/방화벽 중단
    RuleSpec {
        id: "network.firewall-flush",
        category: "network",
        patterns: &[
            r"\bip6?tables\s+(?:-t\s+\w+\s+)?(?:-F|--flush)(?:$|[\s;&|])",
            r"\bip6?tables\s+(?:-t\s+\w+\s+)?-P\s+INPUT\s+DROP\b",
            r"\bnft\s+flush\s+ruleset\b",
            r"\bufw\s+(?:disable|reset)\b",
        ],
        message: "Firewall rules flushed or disabled",
        hint: None,
    },
    RuleSpec {
        id: "network.interface-down",
        category: "network",
        patterns: &[
            r"\bifconfig\s+\S+\s+down(?:$|[\s;&|])",
            r"\bifdown\s+\S+",
            r"\bip\s+link\s+set\s+(?:dev\s+)?\S+\s+down(?:$|[\s;&|])",
        ],
        message: "Network interface taken down (remote access would be lost)",
        hint: None,
    },
    // 시스템 파일 변조
    RuleSpec {
        id: "system-file.tamper",
        category: "system-file",
        patterns: &[
            r">\s*/etc/(?:passwd|shadow|group|gshadow|sudoers|fstab|hosts)\b",
            r"\b(?:rm|mv|shred|truncate)\s[^;&|]*/etc/(?:passwd|shadow|group|gshadow|sudoers|fstab)\b",
            r"\b(?:chmod|chown)\s[^;&|]*/etc/(?:passwd|shadow|sudoers)\b",
        ],
        message: "Modification of a critical system file",
        hint: Some("Use the dedicated tools (visudo, usermod, passwd) instead"),
    },
    // 종료/재부팅
    RuleSpec {
        id: "power.shutdown",
        category: "power",
        patterns: &[
            r"(?:^\s*|[;&|(]\s*|\bsudo\s+|\bexec\s+)(?:shutdown|reboot|halt|poweroff)\b",
            r"(?:^\s*|[;&|(]\s*|\bsudo\s+)(?:tel)?init\s+[06](?:$|[\s;&|])",
            r"\bsystemctl\s+(?:reboot|poweroff|halt|kexec|emergency|rescue)\b",
        ],
        message: "System shutdown or reboot",
        hint: None,
    },
    // Fork bomb
    RuleSpec {
        id: "fork-bomb",
        category: "fork-bomb",
        patterns: &[
            r":\s*\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
            r"\bfork\s+while\s+fork\b",
        ],
        message: "Fork bomb signature",
        hint: None,
    },
];

/// 의심 패턴 (경고만, 차단하지 않음)
const SUSPICIOUS_TABLE: &[RuleSpec] = &[
    RuleSpec {
        id: "suspicious.pipe-to-shell",
        category: "suspicious",
        patterns: &[r"\b(?:curl|wget)\b[^|;&]*\|\s*(?:sudo\s+)?(?:ba|z|k|da)?sh\b"],
        message: "Downloaded content is piped straight into a shell",
        hint: Some("Download the script first and review it before running"),
    },
    RuleSpec {
        id: "suspicious.decode-exec",
        category: "suspicious",
        patterns: &[r"\bbase64\s+(?:-d|--decode)\b[^|;&]*\|\s*(?:sudo\s+)?(?:ba|z)?sh\b"],
        message: "Decoded payload is executed by a shell",
        hint: None,
    },
    RuleSpec {
        id: "suspicious.eval-remote",
        category: "suspicious",
        patterns: &[r#"\beval\s+["']?\$\(\s*(?:curl|wget)\b"#],
        message: "Remote content is evaluated",
        hint: None,
    },
    RuleSpec {
        id: "suspicious.world-writable",
        category: "suspicious",
        patterns: &[r"\bchmod\s+(?:-\w+\s+)*0?777\b"],
        message: "World-writable permissions",
        hint: Some("Grant the narrowest permissions that work (e.g. 755 or 644)"),
    },
    RuleSpec {
        id: "suspicious.reverse-shell",
        category: "suspicious",
        patterns: &[r"\b(?:nc|ncat|netcat)\s+(?:-\w+\s+)*-[a-zA-Z]*e\b", r"/dev/tcp/"],
        message: "Possible reverse shell",
        hint: None,
    },
    RuleSpec {
        id: "suspicious.history-wipe",
        category: "suspicious",
        patterns: &[r"\bhistory\s+-c\b", r">\s*~/\.(?:bash|zsh)_history\b"],
        message: "Shell history is being cleared",
        hint: None,
    },
];

static BUILTIN_RULES: OnceLock<Vec<GuardRule>> = OnceLock::new();
static SUSPICIOUS_RULES: OnceLock<Vec<GuardRule>> = OnceLock::new();

/// 내장 차단 규칙 (우선순위 순)
pub fn builtin_rules() -> &'static [GuardRule] {
    BUILTIN_RULES.get_or_init(|| compile_table(BLOCKING_TABLE, Severity::Block))
}

/// 내장 경고 규칙
pub fn suspicious_rules() -> &'static [GuardRule] {
    SUSPICIOUS_RULES.get_or_init(|| compile_table(SUSPICIOUS_TABLE, Severity::Warn))
}

fn compile_table(specs: &[RuleSpec], severity: Severity) -> Vec<GuardRule> {
    specs
        .iter()
        .filter_map(|spec| {
            let patterns = spec.patterns.iter().map(|p| expand_placeholders(p));
            match GuardRule::new(spec.id, spec.category, patterns, spec.message, severity) {
                Ok(rule) => Some(match spec.hint {
                    Some(hint) => rule.with_hint(hint),
                    None => rule,
                }),
                Err(e) => {
                    error!(rule = spec.id, "Invalid built-in guard pattern: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn expand_placeholders(pattern: &str) -> String {
    pattern
        .replace("{ROOT}", ROOT_TARGET)
        .replace("{DEV}", BLOCK_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_patterns_compile() {
        assert_eq!(builtin_rules().len(), BLOCKING_TABLE.len());
        assert_eq!(suspicious_rules().len(), SUSPICIOUS_TABLE.len());
        assert!(builtin_rules().iter().all(GuardRule::is_blocking));
        assert!(suspicious_rules().iter().all(|r| !r.is_blocking()));
    }

    #[test]
    fn test_builtin_category_priority_order() {
        let order = [
            "filesystem",
            "disk",
            "container",
            "service",
            "network",
            "system-file",
            "power",
            "fork-bomb",
        ];

        let mut last = 0;
        for rule in builtin_rules() {
            let pos = order
                .iter()
                .position(|c| *c == rule.category())
                .unwrap_or_else(|| panic!("unknown category {}", rule.category()));
            assert!(pos >= last, "rule {} is out of priority order", rule.id());
            last = pos;
        }
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let mut ids: Vec<&str> = builtin_rules()
            .iter()
            .chain(suspicious_rules())
            .map(GuardRule::id)
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let rule = GuardRule::block("bad", "test", ["(unclosed"], "bad pattern");
        assert!(rule.is_err());
    }

    #[test]
    fn test_rule_matches_any_pattern() {
        let rule = GuardRule::warn("x", "test", ["^foo", "bar$"], "foo or bar")
            .unwrap()
            .with_hint("avoid foo");
        assert!(rule.matches("foo baz"));
        assert!(rule.matches("baz bar"));
        assert!(!rule.matches("baz"));
        assert_eq!(rule.hint(), Some("avoid foo"));
        assert_eq!(rule.severity(), Severity::Warn);
    }
}
