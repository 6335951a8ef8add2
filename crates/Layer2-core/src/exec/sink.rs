//! Output Sink - 핸들러 출력 채널
//!
//! 핸들러는 stdout/stderr에 직접 쓰지 않고 주입된 sink에 씁니다.
//! 도구 호출 브리지는 `Capture` sink를 넘겨 출력을 수집합니다.

use parking_lot::Mutex;
use shellgate_foundation::OutputMode;
use std::io::Write;
use std::sync::Arc;

/// Capture sink 버퍼
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    stdout: String,
    stderr: String,
}

/// 출력 채널
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    /// 프로세스 stdout/stderr
    #[default]
    Console,
    /// 메모리 버퍼
    Capture(Arc<Mutex<CaptureBuffer>>),
}

impl OutputSink {
    pub fn console() -> Self {
        Self::Console
    }

    pub fn capture() -> Self {
        Self::Capture(Arc::new(Mutex::new(CaptureBuffer::default())))
    }

    /// 결과 출력 (개행 추가 없음)
    pub fn print(&self, text: &str) {
        match self {
            Self::Console => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            Self::Capture(buf) => buf.lock().stdout.push_str(text),
        }
    }

    pub fn println(&self, text: &str) {
        match self {
            Self::Console => {
                let _ = writeln!(std::io::stdout().lock(), "{}", text);
            }
            Self::Capture(buf) => {
                let mut buf = buf.lock();
                buf.stdout.push_str(text);
                buf.stdout.push('\n');
            }
        }
    }

    /// 진단 스트림 출력
    pub fn eprintln(&self, text: &str) {
        match self {
            Self::Console => {
                let _ = writeln!(std::io::stderr().lock(), "{}", text);
            }
            Self::Capture(buf) => {
                let mut buf = buf.lock();
                buf.stderr.push_str(text);
                buf.stderr.push('\n');
            }
        }
    }

    /// 진행 메시지. raw 모드에서만 stdout, 나머지는 진단 스트림
    pub fn progress(&self, mode: OutputMode, text: &str) {
        if mode.progress_to_stdout() {
            self.println(text);
        } else {
            self.eprintln(text);
        }
    }

    /// 수집된 stdout (Console이면 빈 문자열)
    pub fn captured_stdout(&self) -> String {
        match self {
            Self::Console => String::new(),
            Self::Capture(buf) => buf.lock().stdout.clone(),
        }
    }

    /// 수집된 stderr (Console이면 빈 문자열)
    pub fn captured_stderr(&self) -> String {
        match self {
            Self::Console => String::new(),
            Self::Capture(buf) => buf.lock().stderr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_separates_streams() {
        let sink = OutputSink::capture();
        sink.print("a");
        sink.println("b");
        sink.eprintln("warn");

        assert_eq!(sink.captured_stdout(), "ab\n");
        assert_eq!(sink.captured_stderr(), "warn\n");
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = OutputSink::capture();
        let clone = sink.clone();
        clone.println("from clone");
        assert_eq!(sink.captured_stdout(), "from clone\n");
    }

    #[test]
    fn test_progress_routing_follows_mode() {
        let sink = OutputSink::capture();
        sink.progress(OutputMode::Raw, "raw");
        sink.progress(OutputMode::Quiet, "quiet");
        sink.progress(OutputMode::Json, "json");

        assert_eq!(sink.captured_stdout(), "raw\n");
        assert_eq!(sink.captured_stderr(), "quiet\njson\n");
    }

    #[test]
    fn test_console_has_nothing_captured() {
        let sink = OutputSink::console();
        assert!(sink.captured_stdout().is_empty());
    }
}
