//! JSON response formatting
//!
//! 자동화 호출자가 기대하는 응답 형태:
//!
//! ```text
//! {
//!   "success": bool,
//!   "command": string,
//!   "duration": number,
//!   "timestamp": ISO-8601,
//!   "output": string,
//!   "error": string,            // 실패 시에만
//!   "metadata": { "isLocal": bool, "exitCode": number }
//! }
//! ```

use super::proxy::ExecutionResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use shellgate_foundation::Error;

/// 포맷 대상
#[derive(Debug)]
pub enum Outcome<'a> {
    Success(&'a ExecutionResult),
    Failure {
        command: &'a str,
        error: &'a Error,
        is_local: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseMetadata {
    is_local: bool,
    exit_code: i32,
}

#[derive(Debug, Serialize)]
struct JsonResponse<'a> {
    success: bool,
    command: &'a str,
    duration: u64,
    timestamp: String,
    output: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    metadata: ResponseMetadata,
}

/// ISO-8601 (밀리초, Z 접미사)
pub fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 실행 결과나 에러를 JSON 응답으로 변환
///
/// `fields`가 주어지면 해당 최상위 키만 남깁니다. `metadata`는 통째로 포함/제외됩니다.
pub fn format_json_response(outcome: Outcome<'_>, fields: Option<&[String]>) -> Value {
    let response = match outcome {
        Outcome::Success(result) => JsonResponse {
            success: true,
            command: &result.command,
            duration: result.duration_ms,
            timestamp: iso_timestamp(&result.timestamp),
            output: &result.output,
            error: None,
            metadata: ResponseMetadata {
                is_local: result.is_local,
                exit_code: result.exit_code,
            },
        },
        Outcome::Failure {
            command,
            error,
            is_local,
        } => {
            let duration = match error {
                Error::Execution { duration_ms, .. } => *duration_ms,
                _ => 0,
            };
            JsonResponse {
                success: false,
                command,
                duration,
                timestamp: iso_timestamp(&Utc::now()),
                output: "",
                error: Some(error.to_string()),
                metadata: ResponseMetadata {
                    is_local,
                    exit_code: error.exit_code().unwrap_or(1),
                },
            }
        }
    };

    let value = match serde_json::to_value(&response) {
        Ok(value) => value,
        // 위 구조체는 항상 직렬화 가능
        Err(e) => serde_json::json!({ "success": false, "error": e.to_string() }),
    };

    match fields {
        Some(fields) if !fields.is_empty() => filter_fields(value, fields),
        _ => value,
    }
}

/// 허용 목록에 있는 최상위 키만 유지
pub fn filter_fields(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Object(map) => {
            let filtered: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| fields.iter().any(|f| f == key))
                .collect();
            Value::Object(filtered)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ExecutionResult {
        ExecutionResult {
            output: "hello\n".into(),
            duration_ms: 12,
            timestamp: Utc::now(),
            command: "echo hello".into(),
            is_local: true,
            exit_code: 0,
        }
    }

    #[test]
    fn test_success_shape() {
        let result = result();
        let json = format_json_response(Outcome::Success(&result), None);

        assert_eq!(json["success"], true);
        assert_eq!(json["command"], "echo hello");
        assert_eq!(json["duration"], 12);
        assert_eq!(json["output"], "hello\n");
        assert!(json.get("error").is_none());
        assert_eq!(json["metadata"]["isLocal"], true);
        assert_eq!(json["metadata"]["exitCode"], 0);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_failure_shape() {
        let error = Error::execution("Command failed with exit code 2", Some(2)).with_duration(40);
        let json = format_json_response(
            Outcome::Failure {
                command: "false",
                error: &error,
                is_local: false,
            },
            None,
        );

        assert_eq!(json["success"], false);
        assert_eq!(json["duration"], 40);
        assert_eq!(json["output"], "");
        assert!(json["error"].as_str().unwrap().contains("exit code 2"));
        assert_eq!(json["metadata"]["isLocal"], false);
        assert_eq!(json["metadata"]["exitCode"], 2);
    }

    #[test]
    fn test_field_allow_list() {
        let result = result();
        let fields = vec!["output".to_string(), "duration".to_string()];
        let json = format_json_response(Outcome::Success(&result), Some(fields.as_slice()));

        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(json["output"], "hello\n");
        assert_eq!(json["duration"], 12);
    }

    #[test]
    fn test_metadata_is_atomic() {
        let result = result();
        let fields = vec!["metadata".to_string(), "isLocal".to_string()];
        let json = format_json_response(Outcome::Success(&result), Some(fields.as_slice()));

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(json["metadata"]["isLocal"], true);
        assert_eq!(json["metadata"]["exitCode"], 0);
    }

    #[test]
    fn test_empty_allow_list_keeps_everything() {
        let result = result();
        let fields: Vec<String> = Vec::new();
        let json = format_json_response(Outcome::Success(&result), Some(fields.as_slice()));
        assert_eq!(json.as_object().unwrap().len(), 6);
    }
}
