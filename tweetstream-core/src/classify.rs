//! Record classification: data envelope, notice envelope, or decode error.
//!
//! The decode is an explicit tagged union over field presence. A record with
//! a `data` field is a data envelope; otherwise the first notice field found
//! in [`NoticeKind::PRIORITY`] order decides the notice kind. Anything else is
//! a decode error. Absent optional fields and explicit `null` are treated
//! alike; a present `data: null` is rejected.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Map, Value};
use tweetstream_types::{DecodeErrorKind, StreamError};

use crate::types::{
    Classified, DataMessage, MatchingRule, NoticeBody, NoticeKind, SystemNotice, Tweet,
};

/// Classify one record.
///
/// Returns `Ok(None)` for keep-alive lines (empty or whitespace only).
///
/// # Errors
/// Returns a `StreamError::Decode` describing why a non-empty record could
/// not be classified.
pub fn classify(line: &[u8]) -> Result<Option<Classified>, StreamError> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let text = std::str::from_utf8(trimmed)
        .map_err(|e| StreamError::decode(DecodeErrorKind::InvalidUtf8, e.to_string(), line))?;
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StreamError::decode(DecodeErrorKind::MalformedJson, e.to_string(), line))?;
    let Value::Object(mut obj) = value else {
        return Err(StreamError::decode(
            DecodeErrorKind::NotAnObject,
            "expected a json object",
            line,
        ));
    };

    if let Some(data) = obj.remove("data") {
        return decode_data(data, obj, line).map(|m| Some(Classified::Data(m)));
    }

    for kind in NoticeKind::PRIORITY {
        for name in kind.wire_names() {
            if let Some(body) = obj.remove(*name) {
                return decode_notice(kind, body, line).map(|n| Some(Classified::Notice(n)));
            }
        }
    }

    let fields: Vec<&str> = obj.keys().map(String::as_str).collect();
    Err(StreamError::decode(
        DecodeErrorKind::UnrecognizedEnvelope,
        format!("no data or notice field (fields: {fields:?})"),
        line,
    ))
}

fn invalid(detail: impl Into<String>, line: &[u8]) -> StreamError {
    StreamError::decode(DecodeErrorKind::InvalidPayload, detail, line)
}

fn decode_data(
    data: Value,
    mut rest: Map<String, Value>,
    line: &[u8],
) -> Result<DataMessage, StreamError> {
    let tweets: Vec<Tweet> = match data {
        Value::Object(_) => vec![
            serde_json::from_value(data).map_err(|e| invalid(format!("data: {e}"), line))?,
        ],
        Value::Array(items) if !items.is_empty() => {
            serde_json::from_value(Value::Array(items))
                .map_err(|e| invalid(format!("data: {e}"), line))?
        }
        Value::Array(_) => return Err(invalid("data: empty array", line)),
        other => {
            return Err(invalid(
                format!("data: expected object or array, got {}", type_name(&other)),
                line,
            ));
        }
    };

    let matching_rules: Vec<MatchingRule> = match rest.remove("matching_rules") {
        None | Some(Value::Null) => Vec::new(),
        Some(v @ Value::Array(_)) => {
            serde_json::from_value(v).map_err(|e| invalid(format!("matching_rules: {e}"), line))?
        }
        Some(other) => {
            return Err(invalid(
                format!("matching_rules: expected array, got {}", type_name(&other)),
                line,
            ));
        }
    };

    let includes = match rest.remove("includes") {
        None | Some(Value::Null) => None,
        Some(v @ Value::Object(_)) => Some(v),
        Some(other) => {
            return Err(invalid(
                format!("includes: expected object, got {}", type_name(&other)),
                line,
            ));
        }
    };

    let errors = match rest.remove("errors") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(invalid(
                format!("errors: expected array, got {}", type_name(&other)),
                line,
            ));
        }
    };

    Ok(DataMessage {
        tweets,
        matching_rules,
        includes,
        errors,
    })
}

#[derive(Deserialize)]
struct WireNotice {
    message: String,
    sent: String,
}

fn decode_notice(
    kind: NoticeKind,
    body: Value,
    line: &[u8],
) -> Result<SystemNotice, StreamError> {
    let wire: WireNotice =
        serde_json::from_value(body).map_err(|e| invalid(format!("{kind}: {e}"), line))?;
    let sent = DateTime::parse_from_rfc3339(&wire.sent).map_err(|e| {
        StreamError::decode(
            DecodeErrorKind::InvalidTimestamp,
            format!("{kind}.sent {:?}: {e}", wire.sent),
            line,
        )
    })?;
    Ok(SystemNotice::new(
        kind,
        NoticeBody {
            message: wire.message,
            sent,
        },
    ))
}

const fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
