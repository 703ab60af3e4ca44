//! JSON shapes exchanged with the analysis service.
use chrono::{DateTime, NaiveDateTime, Utc};
use desk_core::{GatewayError, Job, JobKind, JobPage, JobPatch, JobState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct SubmitBody<'a> {
    pub query_text: &'a str,
    pub query_type: JobKind,
    pub ticker: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareBody<'a> {
    pub tickers: &'a [String],
    pub period: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireJob {
    id: u64,
    query_text: String,
    #[serde(default = "default_kind")]
    query_type: JobKind,
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    status: JobState,
    #[serde(default)]
    error_message: Option<String>,
    created_at: String,
    #[serde(default)]
    completed_at: Option<String>,
}

fn default_kind() -> JobKind {
    JobKind::General
}

impl WireJob {
    pub(crate) fn into_job(self) -> Result<Job, String> {
        let created_at = parse_timestamp(&self.created_at)?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;
        let ticker = self.ticker.filter(|ticker| !ticker.trim().is_empty());

        let mut job = Job::pending(self.id, self.query_text, self.query_type, ticker, created_at);
        job.apply_patch(&JobPatch {
            state: self.status,
            result: self.result,
            error_message: self.error_message,
            completed_at,
        });
        Ok(job)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePage {
    total: u64,
    #[serde(default)]
    queries: Vec<WireJob>,
}

impl WirePage {
    pub(crate) fn into_page(self) -> Result<JobPage, String> {
        let items = self
            .queries
            .into_iter()
            .map(WireJob::into_job)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage {
            total: self.total,
            items,
        })
    }
}

/// Accepts RFC 3339, or a naive ISO-8601 timestamp taken to be UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("bad timestamp {raw:?}: {err}"))
}

/// A success status whose body could not be decoded.
pub(crate) fn malformed(status: u16, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::Server {
        status,
        message: format!("Unexpected response from the analysis service: {detail}"),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    loc: Vec<Value>,
    msg: String,
}

impl FieldError {
    fn describe(&self) -> String {
        let field = self
            .loc
            .iter()
            .filter(|part| part.as_str() != Some("body"))
            .map(|part| match part {
                Value::String(name) => name.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        if field.is_empty() {
            self.msg.clone()
        } else {
            format!("{field}: {}", self.msg)
        }
    }
}

/// Maps a non-success response to the gateway error taxonomy.
pub(crate) fn classify_failure(status: u16, reason: Option<&str>, body: &[u8]) -> GatewayError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail);

    let fallback = || match reason {
        Some(reason) => format!("HTTP {status} {reason}"),
        None => format!("HTTP {status}"),
    };
    let (message, is_field_list) = match detail {
        Some(Detail::Text(text)) if !text.trim().is_empty() => (text, false),
        Some(Detail::Fields(fields)) if !fields.is_empty() => (
            fields
                .iter()
                .map(FieldError::describe)
                .collect::<Vec<_>>()
                .join("; "),
            true,
        ),
        _ => (fallback(), false),
    };

    match status {
        404 => GatewayError::NotFound(message),
        400 | 422 if is_field_list => GatewayError::Validation(message),
        _ => GatewayError::Server { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30:05").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-01T12:30:05.250000").unwrap(),
            expected + chrono::Duration::milliseconds(250)
        );
        assert_eq!(
            parse_timestamp("2024-03-01T14:30:05+02:00").unwrap(),
            expected
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn completed_wire_job_keeps_result() {
        let wire: WireJob = serde_json::from_value(json!({
            "id": 4,
            "user_id": 1,
            "query_text": "Analyze",
            "query_type": "analyze",
            "ticker": "AAPL",
            "result": {"signal": "BUY"},
            "status": "completed",
            "error_message": null,
            "created_at": "2024-03-01T12:00:00Z",
            "completed_at": "2024-03-01T12:00:09Z"
        }))
        .unwrap();
        let job = wire.into_job().unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.result, Some(json!({"signal": "BUY"})));
        assert_eq!(job.ticker.as_deref(), Some("AAPL"));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn string_detail_is_used_verbatim() {
        let err = classify_failure(
            503,
            Some("Service Unavailable"),
            br#"{"detail":"AI features are disabled"}"#,
        );
        assert_eq!(
            err,
            GatewayError::Server {
                status: 503,
                message: "AI features are disabled".into()
            }
        );
    }

    #[test]
    fn field_errors_are_joined() {
        let body = json!({"detail": [
            {"loc": ["body", "query_text"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["body", "ticker"], "msg": "str type expected", "type": "type_error.str"}
        ]});
        let err = classify_failure(422, None, body.to_string().as_bytes());
        assert_eq!(
            err,
            GatewayError::Validation(
                "query_text: field required; ticker: str type expected".into()
            )
        );
    }

    #[test]
    fn missing_detail_falls_back_to_status_line() {
        assert_eq!(
            classify_failure(502, Some("Bad Gateway"), b"<html>oops</html>"),
            GatewayError::Server {
                status: 502,
                message: "HTTP 502 Bad Gateway".into()
            }
        );
        assert_eq!(
            classify_failure(404, Some("Not Found"), br#"{"detail":"Query not found"}"#),
            GatewayError::NotFound("Query not found".into())
        );
    }
}
